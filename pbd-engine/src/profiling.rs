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
//! Frame profiling
//!
//! A [`Profiler`] is owned by the world and lent to systems through their
//! context. Sections are opened with [`Profiler::begin`] and closed with
//! [`Profiler::end`]; the most recent duration per label is kept and also
//! emitted at `trace` level. A disabled profiler ignores every call.
//!
//! ```
//! use pbd_engine::profiling::Profiler;
//!
//! let mut profiler = Profiler::new();
//! profiler.begin("solve");
//! let elapsed = profiler.end("solve");
//! assert!(elapsed.is_some());
//! assert_eq!(profiler.last("solve"), elapsed);
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Named section timer
#[derive(Debug, Default)]
pub struct Profiler {
    enabled: bool,
    open: HashMap<&'static str, Instant>,
    last: HashMap<&'static str, Duration>,
}

impl Profiler {
    /// Create an enabled profiler
    pub fn new() -> Self {
        Profiler {
            enabled: true,
            ..Default::default()
        }
    }

    /// Create a profiler that records nothing
    pub fn disabled() -> Self {
        Profiler::default()
    }

    /// Check if sections are being recorded
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn recording on or off
    ///
    /// Disabling drops any open sections.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.open.clear();
        }
    }

    /// Open a section, restarting it if already open
    pub fn begin(&mut self, label: &'static str) {
        if self.enabled {
            self.open.insert(label, Instant::now());
        }
    }

    /// Close a section and return its duration
    ///
    /// Returns `None` if the profiler is disabled or the section was never opened.
    pub fn end(&mut self, label: &'static str) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let elapsed = self.open.remove(label)?.elapsed();
        self.last.insert(label, elapsed);
        log::trace!("{label}: {:.3} ms", elapsed.as_secs_f64() * 1000.0);
        Some(elapsed)
    }

    /// Duration of the most recently closed section with this label
    pub fn last(&self, label: &str) -> Option<Duration> {
        self.last.get(label).copied()
    }

    /// Iterate over every recorded `(label, duration)` pair
    pub fn measurements(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.last.iter().map(|(label, duration)| (*label, *duration))
    }

    /// Forget all recorded durations
    pub fn reset(&mut self) {
        self.open.clear();
        self.last.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_records_nothing() {
        let mut profiler = Profiler::disabled();
        profiler.begin("frame");
        assert_eq!(profiler.end("frame"), None);
        assert_eq!(profiler.last("frame"), None);
        assert!(!profiler.is_enabled());
    }

    #[test]
    fn test_end_without_begin() {
        let mut profiler = Profiler::new();
        assert_eq!(profiler.end("never"), None);
    }

    #[test]
    fn test_sections_are_independent() {
        let mut profiler = Profiler::new();
        profiler.begin("outer");
        profiler.begin("inner");
        assert!(profiler.end("inner").is_some());
        assert!(profiler.last("outer").is_none());
        assert!(profiler.end("outer").is_some());
        assert_eq!(profiler.measurements().count(), 2);

        profiler.reset();
        assert_eq!(profiler.measurements().count(), 0);
    }

    #[test]
    fn test_disabling_drops_open_sections() {
        let mut profiler = Profiler::new();
        profiler.begin("frame");
        profiler.set_enabled(false);
        profiler.set_enabled(true);
        assert_eq!(profiler.end("frame"), None);
    }
}
