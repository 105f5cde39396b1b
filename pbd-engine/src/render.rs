// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Debug rendering collaborator
//!
//! The engine never talks to a graphics backend directly. Systems that want
//! to visualise internal state draw through a [`DebugRenderer`] supplied by
//! the application; [`NoopRenderer`] is used when none is installed.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Color = Color::splat(1.0);

    /// Create a color from its channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Create a color with every channel set to `value`
    pub const fn splat(value: f32) -> Self {
        Color::new(value, value, value, value)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Sink for immediate-mode debug primitives
pub trait DebugRenderer: Send {
    /// Queue a line segment for this frame
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Color, thickness: f32);
}

/// Renderer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl DebugRenderer for NoopRenderer {
    fn draw_line(&mut self, _from: Vec3, _to: Vec3, _color: Color, _thickness: f32) {}
}

/// Shared renderers, so the application can keep a handle to what the world draws into
impl<R: DebugRenderer> DebugRenderer for Arc<Mutex<R>> {
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Color, thickness: f32) {
        let mut renderer = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        renderer.draw_line(from, to, color, thickness);
    }
}

/// A line recorded by [`LineRecorder`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Start point
    pub from: Vec3,
    /// End point
    pub to: Vec3,
    /// Line color
    pub color: Color,
    /// Line thickness
    pub thickness: f32,
}

/// Renderer that keeps every line in memory
///
/// Useful for headless runs and tests.
#[derive(Debug, Default, Clone)]
pub struct LineRecorder {
    /// Lines drawn so far, in draw order
    pub lines: Vec<DebugLine>,
}

impl LineRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every recorded line
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl DebugRenderer for LineRecorder {
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Color, thickness: f32) {
        self.lines.push(DebugLine {
            from,
            to,
            color,
            thickness,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_splat() {
        assert_eq!(Color::splat(1.0), Color::WHITE);
        assert_eq!(Color::default(), Color::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_recorder_keeps_draw_order() {
        let mut recorder = LineRecorder::new();
        recorder.draw_line(Vec3::ZERO, Vec3::X, Color::WHITE, 0.1);
        recorder.draw_line(Vec3::X, Vec3::Y, Color::WHITE, 0.2);

        assert_eq!(recorder.lines.len(), 2);
        assert_eq!(recorder.lines[1].from, Vec3::X);
        assert_eq!(recorder.lines[1].thickness, 0.2);

        recorder.clear();
        assert!(recorder.lines.is_empty());
    }

    #[test]
    fn test_shared_recorder() {
        let shared = Arc::new(Mutex::new(LineRecorder::new()));
        let mut handle = Arc::clone(&shared);
        handle.draw_line(Vec3::ZERO, Vec3::Y, Color::WHITE, 0.1);

        assert_eq!(shared.lock().unwrap().lines.len(), 1);
    }
}
