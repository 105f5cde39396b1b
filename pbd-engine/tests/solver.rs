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
//! Constraint resolution behaviour of the Gauss-Seidel solver

use glam::Vec2;
use pbd_engine::ecs::{EntityId, World};
use pbd_engine::pbd::{
    Constraint, ConstraintKind, DistanceConstraint, GaussSeidelSolver, PbdParticle,
};

fn particle_world(positions: &[Vec2]) -> (World, Vec<EntityId>) {
    let mut world = World::new();
    let entities = positions
        .iter()
        .map(|&p| {
            let entity = world.create_entity();
            *world.add_component::<PbdParticle>(entity) = PbdParticle::new(p);
            entity
        })
        .collect();
    (world, entities)
}

fn penetration(world: &World, a: EntityId, b: EntityId, distance: f32) -> f32 {
    let gap = world
        .component::<PbdParticle>(a)
        .position
        .distance(world.component::<PbdParticle>(b).position);
    (distance - gap).max(0.0)
}

#[test]
fn penetration_strictly_decreases_and_converges() {
    let (mut world, e) = particle_world(&[Vec2::ZERO, Vec2::new(0.5, 0.0)]);
    let constraints = vec![Constraint::collision(e[0], e[1], 2.0).with_stiffness(0.5).unwrap()];
    let mut solver = GaussSeidelSolver::new();

    let mut previous = penetration(&world, e[0], e[1], 2.0);
    for _ in 0..20 {
        solver.solve(1, &constraints, world.components_mut());
        let current = penetration(&world, e[0], e[1], 2.0);
        if previous > 1e-4 {
            assert!(current < previous, "penetration stalled at {previous} -> {current}");
        } else {
            assert!(current <= previous, "penetration grew from {previous} to {current}");
        }
        previous = current;
    }
    assert!(previous < 1e-4);
}

#[test]
fn chain_of_overlaps_converges() {
    let positions: Vec<Vec2> = (0..6).map(|i| Vec2::new(i as f32 * 0.5, 0.0)).collect();
    let (mut world, e) = particle_world(&positions);
    let constraints: Vec<Constraint> = (0..e.len())
        .flat_map(|i| (i + 1..e.len()).map(move |j| (i, j)))
        .map(|(i, j)| Constraint::collision(e[i], e[j], 1.0))
        .collect();

    GaussSeidelSolver::new().solve(200, &constraints, world.components_mut());

    for i in 0..e.len() {
        for j in i + 1..e.len() {
            assert!(penetration(&world, e[i], e[j], 1.0) < 1e-3);
        }
    }
}

#[test]
fn rigid_rod_to_static_particle_is_exact() {
    let (mut world, e) = particle_world(&[Vec2::new(0.0, 3.0), Vec2::ZERO]);
    let mut rod =
        Constraint::new(vec![e[0], e[1]], ConstraintKind::Equality, DistanceConstraint::new(1.0)).unwrap();
    rod.set_stiffness(1.0).unwrap();
    world.get_component::<PbdParticle>(e[1]).invmass = 0.0;

    let stats = GaussSeidelSolver::new().solve(1, &[rod], world.components_mut());

    assert_eq!(stats.projections, 1);
    assert!((world.component::<PbdParticle>(e[0]).position - Vec2::new(0.0, 1.0)).length() < 1e-6);
}

#[test]
fn zero_stiffness_changes_nothing() {
    let (mut world, e) = particle_world(&[Vec2::ZERO, Vec2::new(0.5, 0.0)]);
    let constraints = vec![Constraint::collision(e[0], e[1], 2.0).with_stiffness(0.0).unwrap()];

    GaussSeidelSolver::new().solve(10, &constraints, world.components_mut());

    assert_eq!(world.component::<PbdParticle>(e[0]).position, Vec2::ZERO);
    assert_eq!(world.component::<PbdParticle>(e[1]).position, Vec2::new(0.5, 0.0));
}

#[test]
fn stiffness_correction_bounds() {
    let e = [EntityId::new(0), EntityId::new(1)];
    let rigid = Constraint::collision(e[0], e[1], 1.0);
    assert_eq!(rigid.corrected_stiffness(), 1.0);

    for s in [0.0, 0.1, 0.5, 0.9, 1.0] {
        let k = Constraint::collision(e[0], e[1], 1.0)
            .with_stiffness(s)
            .unwrap()
            .corrected_stiffness();
        assert!((0.0..=1.0).contains(&k));
        assert!(k >= s);
    }
}

#[test]
fn solving_order_is_list_order() {
    // The second constraint sees the first one's correction within the same pass
    let (mut world, e) = particle_world(&[Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.5, 0.0)]);
    world.get_component::<PbdParticle>(e[0]).invmass = 0.0;
    let constraints = vec![
        Constraint::collision(e[0], e[1], 2.0),
        Constraint::collision(e[1], e[2], 1.0),
    ];

    GaussSeidelSolver::new().solve(1, &constraints, world.components_mut());

    // e1 was pushed to 2.0, so the second pair overlapped by 0.5
    let p1 = world.component::<PbdParticle>(e[1]).position;
    let p2 = world.component::<PbdParticle>(e[2]).position;
    assert!((p1 - Vec2::new(1.75, 0.0)).length() < 1e-6);
    assert!((p2 - Vec2::new(2.75, 0.0)).length() < 1e-6);
}
