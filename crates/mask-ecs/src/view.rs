//! Views - filtered walks over the slot table.
//!
//! A view turns a set of component types into a required [`ComponentMask`]
//! and yields, in ascending slot order, every live entity whose mask is a
//! superset of it. The empty set `()` yields every live entity.
//!
//! # Basic Usage
//!
//! ```ignore
//! for entity in world.view::<(Position, Velocity)>()? {
//!     let pos = world.get_component::<Position>(entity)?;
//!     let vel = world.get_component::<Velocity>(entity)?;
//!     println!("{entity:?} at {} moving {}", pos.x, vel.dx);
//! }
//! ```
//!
//! [`View`] borrows the world, so entities cannot be created or destroyed
//! while it is being consumed. To mutate components while walking, use a
//! detached [`ViewCursor`]:
//!
//! ```ignore
//! let mut cursor = world.view_cursor::<(Position, Velocity)>()?;
//! while let Some(entity) = cursor.advance(&world) {
//!     let dx = world.get_component::<Velocity>(entity)?.dx;
//!     world.get_component_mut::<Position>(entity)?.x += dx;
//! }
//! ```

use std::{fmt, iter::FusedIterator, marker::PhantomData};

use smallvec::{SmallVec, smallvec};

use crate::{
    World,
    component::{Component, ComponentId, ComponentRegistry},
    entity::Entity,
    error::EcsResult,
    mask::ComponentMask,
    slots::SlotTable,
};

// ============================================================================
// ComponentSet - Type Lists
// ============================================================================

/// A list of component types, written as a tuple.
///
/// Implemented for `()` and tuples of up to eight components. Resolving a
/// set assigns ids to types the registry has not seen yet.
pub trait ComponentSet {
    /// Ids of every type in the set, in tuple order.
    fn component_ids(registry: &mut ComponentRegistry) -> EcsResult<SmallVec<[ComponentId; 8]>>;

    /// Required mask for the set.
    fn mask(registry: &mut ComponentRegistry) -> EcsResult<ComponentMask> {
        Ok(Self::component_ids(registry)?.into_iter().collect())
    }
}

impl ComponentSet for () {
    fn component_ids(_registry: &mut ComponentRegistry) -> EcsResult<SmallVec<[ComponentId; 8]>> {
        Ok(SmallVec::new())
    }
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn component_ids(
                registry: &mut ComponentRegistry,
            ) -> EcsResult<SmallVec<[ComponentId; 8]>> {
                Ok(smallvec![$(registry.id_of::<$name>()?),+])
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

// ============================================================================
// Signature - Named Component Combinations
// ============================================================================

/// A reusable name for a component combination.
///
/// ```ignore
/// const MOVING: Signature<(Position, Velocity)> = Signature::new();
/// for entity in world.view_signature(&MOVING)? { /* ... */ }
/// ```
pub struct Signature<Q: ComponentSet>(PhantomData<fn() -> Q>);

impl<Q: ComponentSet> Signature<Q> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    /// Resolve the required mask against a world's registry.
    pub fn mask<const MAX_ENTITIES: usize>(
        &self,
        world: &World<MAX_ENTITIES>,
    ) -> EcsResult<ComponentMask> {
        world.resolve_mask::<Q>()
    }
}

impl<Q: ComponentSet> Default for Signature<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: ComponentSet> Clone for Signature<Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ComponentSet> Copy for Signature<Q> {}

impl<Q: ComponentSet> fmt::Debug for Signature<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature<{}>", std::any::type_name::<Q>())
    }
}

// ============================================================================
// View - Borrowing Iterator
// ============================================================================

/// Lazy, single-pass iterator over live entities matching a mask.
pub struct View<'w> {
    slots: &'w SlotTable,
    required: ComponentMask,
    index: usize,
}

impl<'w> View<'w> {
    pub(crate) fn new(slots: &'w SlotTable, required: ComponentMask) -> Self {
        Self {
            slots,
            required,
            index: 0,
        }
    }

    /// Mask every yielded entity is guaranteed to contain.
    #[must_use]
    pub const fn required(&self) -> ComponentMask {
        self.required
    }
}

impl Iterator for View<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            let record = self.slots.record(self.index)?;
            self.index += 1;

            if record.is_live() && record.mask.contains_all(self.required) {
                return Some(record.entity);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len().saturating_sub(self.index)))
    }
}

impl FusedIterator for View<'_> {}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("required", &self.required)
            .field("index", &self.index)
            .finish()
    }
}

// ============================================================================
// ViewCursor - Detached Walk
// ============================================================================

/// A view position that does not borrow the world.
///
/// Each [`advance`](Self::advance) re-reads the live slot table, so
/// components may be mutated between steps. Creating or destroying entities
/// mid-walk is memory safe but may skip entities or yield recycled slots.
#[derive(Clone, Debug)]
pub struct ViewCursor {
    required: ComponentMask,
    /// Next slot index to test.
    next_index: usize,
    /// Last yielded entity, or [`Entity::DANGLING`].
    current: Entity,
    finished: bool,
}

impl ViewCursor {
    #[must_use]
    pub const fn new(required: ComponentMask) -> Self {
        Self {
            required,
            next_index: 0,
            current: Entity::DANGLING,
            finished: false,
        }
    }

    /// Move to the next matching entity.
    ///
    /// Returns `None` once the end of the slot table is reached; the cursor
    /// then stays at the end until [`reset`](Self::reset).
    pub fn advance<const MAX_ENTITIES: usize>(
        &mut self,
        world: &World<MAX_ENTITIES>,
    ) -> Option<Entity> {
        if self.finished {
            return None;
        }

        let slots = world.slots();
        while let Some(record) = slots.record(self.next_index) {
            self.next_index += 1;
            if record.is_live() && record.mask.contains_all(self.required) {
                self.current = record.entity;
                return Some(record.entity);
            }
        }

        self.current = Entity::DANGLING;
        self.finished = true;
        None
    }

    /// Entity at the cursor: the last one yielded, or [`Entity::DANGLING`]
    /// before the first step and after the end.
    #[must_use]
    pub const fn current(&self) -> Entity {
        self.current
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub const fn required(&self) -> ComponentMask {
        self.required
    }

    /// Restart from the first slot.
    pub fn reset(&mut self) {
        self.next_index = 0;
        self.current = Entity::DANGLING;
        self.finished = false;
    }
}

// ============================================================================
// Tests
// ============================================================================
