//! World - the storage engine tying slots, registry and pools together.
//!
//! Every component type gets one fixed-capacity pool of `MAX_ENTITIES`
//! values, addressed by the entity's slot index. An entity owns a component
//! exactly when the matching bit of its slot mask is set.
//!
//! # Destructors
//!
//! Component destructors are never run: not on `remove_component`, not when
//! a component is overwritten, not on `destroy_entity`, and not when the
//! world is dropped. Only the presence bit and the slot lifecycle change.
//! Components that own heap memory, files or other resources leak them.

use std::{cell::RefCell, fmt, ptr::NonNull};

use crate::{
    component::{Component, ComponentId, ComponentInfo, ComponentRegistry},
    entity::Entity,
    error::{EcsError, EcsResult},
    mask::ComponentMask,
    slots::SlotTable,
    storage::Pool,
    view::{ComponentSet, Signature, View, ViewCursor},
};

/// Default pool capacity: 262,144 entities.
pub const DEFAULT_MAX_ENTITIES: usize = 0x4_0000;

/// The ECS world - container for all entities and components.
///
/// `MAX_ENTITIES` fixes the capacity of every component pool and therefore
/// the number of slots the world can hand out.
pub struct World<const MAX_ENTITIES: usize = DEFAULT_MAX_ENTITIES> {
    /// Entity records and free list.
    slots: SlotTable,
    /// Component type registry. Views resolve ids through a shared borrow.
    components: RefCell<ComponentRegistry>,
    /// Pools indexed by component id.
    pools: Vec<Pool>,
}

impl<const MAX_ENTITIES: usize> Default for World<MAX_ENTITIES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX_ENTITIES: usize> World<MAX_ENTITIES> {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        const {
            assert!(
                MAX_ENTITIES < u32::MAX as usize,
                "MAX_ENTITIES must leave room for the sentinel slot index"
            );
        }

        Self {
            slots: SlotTable::new(),
            components: RefCell::new(ComponentRegistry::new()),
            pools: Vec::new(),
        }
    }

    /// Create a world with a pre-sized slot table.
    #[must_use]
    pub fn with_capacity(entity_capacity: usize) -> Self {
        let mut world = Self::new();
        world.slots = SlotTable::with_capacity(entity_capacity.min(MAX_ENTITIES));
        world
    }

    /// Capacity of every component pool.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        MAX_ENTITIES
    }

    // ==================== Entity Operations ====================

    /// Create an entity with no components.
    ///
    /// Recycles the most recently destroyed slot if there is one.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        if self.slots.next_index() >= MAX_ENTITIES {
            tracing::warn!(limit = MAX_ENTITIES, "entity limit reached");
            return Err(EcsError::EntityLimit {
                limit: MAX_ENTITIES,
            });
        }

        let entity = self.slots.create();
        tracing::trace!(%entity, "created entity");
        Ok(entity)
    }

    /// Destroy an entity and release its slot.
    ///
    /// Component values are left in their pools without being dropped.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.slots.destroy(entity)?;
        tracing::trace!(%entity, "destroyed entity");
        Ok(())
    }

    /// Check if a handle refers to a live entity.
    #[must_use]
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.slots.is_valid(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn count_entities(&self) -> usize {
        self.slots.alive_count()
    }

    /// Iterate over every live entity in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.alive()
    }

    /// Component mask of a live entity.
    pub fn mask(&self, entity: Entity) -> EcsResult<ComponentMask> {
        self.slots.mask(entity)
    }

    pub(crate) fn slots(&self) -> &SlotTable {
        &self.slots
    }

    // ==================== Component Registry ====================

    /// Number of component types that have been assigned an id.
    #[must_use]
    pub fn count_component_types(&self) -> usize {
        self.components.borrow().len()
    }

    /// Assign (or look up) the id for `T`.
    pub fn register_component<T: Component>(&mut self) -> EcsResult<ComponentId> {
        self.components.get_mut().id_of::<T>()
    }

    /// Get the component ID for a type, if one was assigned.
    #[must_use]
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.components.borrow().get_id::<T>()
    }

    /// Metadata for an assigned id.
    #[must_use]
    pub fn component_info(&self, id: ComponentId) -> Option<ComponentInfo> {
        self.components.borrow().get_info(id).cloned()
    }

    /// Snapshot of every registered component type, in id order.
    ///
    /// Returned by value so no registry borrow outlives the call; a later
    /// [`view`](Self::view) may still assign new ids.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentInfo> {
        self.components.borrow().iter().cloned().collect()
    }

    // ==================== Component Operations ====================

    /// Attach a component, returning a reference to the stored value.
    ///
    /// If the entity already has a `T`, the old value is overwritten without
    /// being dropped.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<&mut T> {
        self.add_component_with(entity, || value)
    }

    /// Attach a component built by `init`.
    ///
    /// `init` runs before the entity's mask is touched, so if it panics the
    /// entity is left without the component.
    pub fn add_component_with<T: Component>(
        &mut self,
        entity: Entity,
        init: impl FnOnce() -> T,
    ) -> EcsResult<&mut T> {
        if !self.slots.is_valid(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }

        let info = self.components.get_mut().register::<T>()?;
        let id = info.id();
        let value = init();

        let column = pool_at(&mut self.pools, id).materialize(info, MAX_ENTITIES);
        let component = column.write(entity.index() as usize, value);

        self.slots.mask_mut(entity)?.set(id);
        tracing::trace!(%entity, component = info.name(), "added component");

        Ok(component)
    }

    /// Mark an entity with a zero-sized tag without allocating storage.
    ///
    /// A later [`add_component`](Self::add_component) of the same type
    /// materializes a pool; both access patterns keep working.
    pub fn add_tag<T: Component>(&mut self, entity: Entity) -> EcsResult<()> {
        const {
            assert!(
                std::mem::size_of::<T>() == 0,
                "tags must be zero-sized; use add_component for data"
            );
        }

        if !self.slots.is_valid(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }

        let id = self.components.get_mut().id_of::<T>()?;
        if pool_at(&mut self.pools, id).reserve() {
            tracing::debug!(
                component = std::any::type_name::<T>(),
                "reserved tag pool"
            );
        }

        self.slots.mask_mut(entity)?.set(id);
        tracing::trace!(%entity, component = std::any::type_name::<T>(), "added tag");
        Ok(())
    }

    /// Get a component the entity is known to have.
    pub fn get_component<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        let id = self.require::<T>(entity)?;
        // SAFETY: the mask bit is set, so a T was written at this slot
        Ok(unsafe { &*self.component_ptr::<T>(id, entity) })
    }

    /// Get a component the entity is known to have, mutably.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        let id = self.require::<T>(entity)?;
        // SAFETY: the mask bit is set, so a T was written at this slot;
        // &mut self guarantees exclusive access
        Ok(unsafe { &mut *self.component_ptr::<T>(id, entity) })
    }

    /// Get a component if the entity has it.
    ///
    /// Absence is `Ok(None)`; an invalid handle is still an error.
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> EcsResult<Option<&T>> {
        let Some(id) = self.present::<T>(entity)? else {
            return Ok(None);
        };
        // SAFETY: the mask bit is set, so a T was written at this slot
        Ok(Some(unsafe { &*self.component_ptr::<T>(id, entity) }))
    }

    /// Mutable counterpart of [`try_get_component`](Self::try_get_component).
    pub fn try_get_component_mut<T: Component>(
        &mut self,
        entity: Entity,
    ) -> EcsResult<Option<&mut T>> {
        let Some(id) = self.present::<T>(entity)? else {
            return Ok(None);
        };
        // SAFETY: the mask bit is set; &mut self guarantees exclusive access
        Ok(Some(unsafe { &mut *self.component_ptr::<T>(id, entity) }))
    }

    /// Check if an entity has a component. False for invalid handles.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.present::<T>(entity).is_ok_and(|id| id.is_some())
    }

    /// Detach a component.
    ///
    /// Only the mask bit is cleared; the stored bytes stay in the pool until
    /// a later `add_component` overwrites them.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<()> {
        let mask = self.slots.mask_mut(entity)?;
        if let Some(id) = self.components.get_mut().get_id::<T>() {
            mask.clear(id);
            tracing::trace!(
                %entity,
                component = std::any::type_name::<T>(),
                "removed component"
            );
        }
        Ok(())
    }

    // ==================== Views ====================

    /// Iterate over live entities that have every component in `Q`.
    ///
    /// `Q` is a tuple such as `(Position, Velocity)`; `()` matches every live
    /// entity. Types never seen before are assigned ids here.
    pub fn view<Q: ComponentSet>(&self) -> EcsResult<View<'_>> {
        let required = self.resolve_mask::<Q>()?;
        Ok(View::new(&self.slots, required))
    }

    /// View over a named [`Signature`].
    pub fn view_signature<Q: ComponentSet>(&self, _signature: &Signature<Q>) -> EcsResult<View<'_>> {
        self.view::<Q>()
    }

    /// Detached cursor over the same entities as [`view`](Self::view).
    pub fn view_cursor<Q: ComponentSet>(&self) -> EcsResult<ViewCursor> {
        Ok(ViewCursor::new(self.resolve_mask::<Q>()?))
    }

    pub(crate) fn resolve_mask<Q: ComponentSet>(&self) -> EcsResult<ComponentMask> {
        Q::mask(&mut self.components.borrow_mut())
    }

    // ==================== Internals ====================

    /// Id of `T` if the entity currently owns one.
    fn present<T: Component>(&self, entity: Entity) -> EcsResult<Option<ComponentId>> {
        let mask = self.slots.mask(entity)?;
        Ok(self
            .component_id::<T>()
            .filter(|&id| mask.test(id)))
    }

    fn require<T: Component>(&self, entity: Entity) -> EcsResult<ComponentId> {
        self.present::<T>(entity)?
            .ok_or(EcsError::MissingComponent {
                entity,
                component: std::any::type_name::<T>(),
            })
    }

    /// Pointer to `entity`'s `T` value. The caller must have checked the mask.
    fn component_ptr<T: Component>(&self, id: ComponentId, entity: Entity) -> *mut T {
        match self.pools.get(id.index() as usize).and_then(Pool::column) {
            Some(column) => column.slot_ptr(entity.index() as usize).cast::<T>(),
            // Tag that never got a buffer
            None if std::mem::size_of::<T>() == 0 => NonNull::<T>::dangling().as_ptr(),
            None => unreachable!(
                "{} bit set without a materialized pool",
                std::any::type_name::<T>()
            ),
        }
    }
}

/// Pool slot for `id`, growing the vector with unallocated placeholders.
fn pool_at(pools: &mut Vec<Pool>, id: ComponentId) -> &mut Pool {
    let index = id.index() as usize;
    if index >= pools.len() {
        pools.resize_with(index + 1, Pool::default);
    }
    &mut pools[index]
}

impl<const MAX_ENTITIES: usize> fmt::Debug for World<MAX_ENTITIES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.count_entities())
            .field("slots", &self.slots.len())
            .field("components", &self.count_component_types())
            .field("capacity", &MAX_ENTITIES)
            .finish()
    }
}
