//! Integration tests for mask-ecs through the public API.

use std::collections::BTreeSet;

use mask_ecs::{EcsError, Entity, World};

// ============================================================================
// Test Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    dx: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Player;

type TestWorld = World<1024>;

// ============================================================================
// Walkthrough
// ============================================================================

#[test]
fn test_position_velocity_walkthrough() {
    let mut world = TestWorld::new();

    let e1 = world.create_entity().unwrap();
    let e2 = world.create_entity().unwrap();
    let e3 = world.create_entity().unwrap();

    for (slot, entity) in [e1, e2, e3].into_iter().enumerate() {
        assert_eq!(entity.index() as usize, slot);
        assert_eq!(entity.generation().get(), 0);
    }

    world.add_component(e1, Position { x: 1 }).unwrap();
    world.add_component(e3, Position { x: 1 }).unwrap();
    world.add_component(e1, Velocity { dx: 5 }).unwrap();

    let positioned: Vec<Entity> = world.view::<(Position,)>().unwrap().collect();
    assert_eq!(positioned, vec![e1, e3]);

    let moving: Vec<Entity> = world.view::<(Position, Velocity)>().unwrap().collect();
    assert_eq!(moving, vec![e1]);

    assert_eq!(world.count_entities(), 3);
    world.destroy_entity(e2).unwrap();
    assert_eq!(world.count_entities(), 2);

    let e4 = world.create_entity().unwrap();
    assert_eq!(e4.index(), 1);
    assert!(e4.generation() > e2.generation());
    assert!(!world.is_valid(e2));
    assert!(world.is_valid(e4));

    let positioned: Vec<Entity> = world.view::<(Position,)>().unwrap().collect();
    assert_eq!(positioned, vec![e1, e3]);
}

// ============================================================================
// Handle Properties
// ============================================================================

#[test]
fn test_handles_unique_over_time() {
    let mut world = TestWorld::new();
    let mut seen = BTreeSet::new();
    let mut handles = Vec::new();

    let mut current = world.create_entity().unwrap();
    for _ in 0..50 {
        assert!(seen.insert(current));
        handles.push(current);
        world.destroy_entity(current).unwrap();
        current = world.create_entity().unwrap();
        assert_eq!(current.index(), 0);
    }

    for stale in handles {
        assert!(!world.is_valid(stale));
        assert!(stale.generation() < current.generation());
    }
    assert!(world.is_valid(current));
}

#[test]
fn test_sentinel_handle_is_never_valid() {
    let mut world = TestWorld::new();
    world.create_entity().unwrap();

    assert!(!world.is_valid(Entity::DANGLING));
    assert_eq!(
        world.destroy_entity(Entity::DANGLING),
        Err(EcsError::InvalidEntity(Entity::DANGLING))
    );
}

#[test]
fn test_count_tracks_creates_minus_destroys() {
    let mut world = TestWorld::new();
    let mut alive: Vec<Entity> = Vec::new();
    let mut created = 0usize;
    let mut destroyed = 0usize;

    for round in 0..200usize {
        if round % 3 == 2 && !alive.is_empty() {
            let victim = alive.remove(round % alive.len());
            world.destroy_entity(victim).unwrap();
            destroyed += 1;
        } else {
            alive.push(world.create_entity().unwrap());
            created += 1;
        }
        assert_eq!(world.count_entities(), created - destroyed);
    }

    let mut listed: Vec<Entity> = world.view::<()>().unwrap().collect();
    listed.sort();
    alive.sort();
    assert_eq!(listed, alive);
}

// ============================================================================
// Presence Properties
// ============================================================================

#[test]
fn test_presence_follows_add_and_remove() {
    let mut world = TestWorld::new();
    let e = world.create_entity().unwrap();

    assert_eq!(world.try_get_component::<Velocity>(e), Ok(None));

    world.add_component(e, Velocity { dx: 2 }).unwrap();
    assert_eq!(
        world.try_get_component::<Velocity>(e),
        Ok(Some(&Velocity { dx: 2 }))
    );

    world.remove_component::<Velocity>(e).unwrap();
    assert_eq!(world.try_get_component::<Velocity>(e), Ok(None));
    assert!(matches!(
        world.get_component::<Velocity>(e),
        Err(EcsError::MissingComponent { .. })
    ));
}

#[test]
fn test_view_matches_brute_force() {
    let mut world = TestWorld::new();
    let mut entities = Vec::new();

    for i in 0..60i32 {
        let e = world.create_entity().unwrap();
        if i % 2 == 0 {
            world.add_component(e, Position { x: i }).unwrap();
        }
        if i % 3 == 0 {
            world.add_component(e, Velocity { dx: i }).unwrap();
        }
        if i % 5 == 0 {
            world.add_tag::<Player>(e).unwrap();
        }
        entities.push(e);
    }
    for e in entities.iter().copied().filter(|e| e.index() % 7 == 0) {
        world.destroy_entity(e).unwrap();
    }

    let expected: Vec<Entity> = entities
        .iter()
        .copied()
        .filter(|&e| {
            world.is_valid(e)
                && world.has_component::<Position>(e)
                && world.has_component::<Velocity>(e)
                && world.has_component::<Player>(e)
        })
        .collect();
    let viewed: Vec<Entity> = world
        .view::<(Player, Velocity, Position)>()
        .unwrap()
        .collect();

    assert_eq!(viewed, expected);
    assert!(viewed.windows(2).all(|w| w[0].index() < w[1].index()));
}

#[test]
fn test_view_with_no_matches() {
    let mut world = TestWorld::new();
    let e = world.create_entity().unwrap();
    world.add_component(e, Position { x: 0 }).unwrap();

    assert_eq!(world.view::<(Position, Velocity)>().unwrap().next(), None);
}

#[test]
fn test_entity_limit_is_an_error() {
    let mut world = World::<3>::new();
    for _ in 0..3 {
        world.create_entity().unwrap();
    }
    assert_eq!(
        world.create_entity(),
        Err(EcsError::EntityLimit { limit: 3 })
    );
    assert_eq!(world.count_entities(), 3);
}
