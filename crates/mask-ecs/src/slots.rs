//! Slot table - entity records plus a LIFO free list.
//!
//! Each slot stores the exact handle it last issued and the entity's
//! component mask. Destroyed slots keep counting generations so recycled
//! handles never collide with stale ones.

use crate::{
    entity::Entity,
    error::{EcsError, EcsResult},
    mask::ComponentMask,
};

/// One entry of the slot table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRecord {
    /// Handle currently stored for the slot. Carries the sentinel index
    /// while the slot is on the free list.
    pub entity: Entity,
    /// Components the entity owns.
    pub mask: ComponentMask,
}

impl SlotRecord {
    /// Whether the slot holds a live entity.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.entity.is_sentinel()
    }
}

/// Ordered entity records with slot recycling.
#[derive(Debug, Default)]
pub struct SlotTable {
    records: Vec<SlotRecord>,
    /// Freed slot indices, most recently freed last.
    free_list: Vec<u32>,
}

impl SlotTable {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Create a table with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity / 4),
        }
    }

    /// Slot index the next [`create`](Self::create) would use.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.free_list
            .last()
            .map_or(self.records.len(), |&index| index as usize)
    }

    /// Allocate an entity, recycling the most recently freed slot first.
    pub fn create(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            let record = &mut self.records[index as usize];
            record.entity = record.entity.recycled_at(index);
            record.mask.reset();
            return record.entity;
        }

        let entity = Entity::from_index(self.records.len() as u32);
        self.records.push(SlotRecord {
            entity,
            mask: ComponentMask::EMPTY,
        });
        entity
    }

    /// Release a live entity's slot.
    pub fn destroy(&mut self, entity: Entity) -> EcsResult<()> {
        let record = self.record_mut(entity)?;
        record.mask.reset();
        record.entity = record.entity.invalidated();
        self.free_list.push(entity.index());
        Ok(())
    }

    /// Check if a handle refers to a live entity.
    #[must_use]
    pub fn is_valid(&self, entity: Entity) -> bool {
        if entity.is_sentinel() {
            return false;
        }
        self.records
            .get(entity.index() as usize)
            .is_some_and(|record| record.entity == entity)
    }

    /// Mask of a live entity.
    pub fn mask(&self, entity: Entity) -> EcsResult<ComponentMask> {
        if !self.is_valid(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        Ok(self.records[entity.index() as usize].mask)
    }

    /// Mutable mask of a live entity.
    pub fn mask_mut(&mut self, entity: Entity) -> EcsResult<&mut ComponentMask> {
        Ok(&mut self.record_mut(entity)?.mask)
    }

    fn record_mut(&mut self, entity: Entity) -> EcsResult<&mut SlotRecord> {
        if !self.is_valid(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        Ok(&mut self.records[entity.index() as usize])
    }

    /// Record at a raw slot index, live or free.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<&SlotRecord> {
        self.records.get(index)
    }

    #[must_use]
    pub fn records(&self) -> &[SlotRecord] {
        &self.records
    }

    /// Total number of slots, live and free.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of slots waiting to be recycled.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free_list.len()
    }

    /// Number of live entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.records.len() - self.free_list.len()
    }

    /// Iterate over live entities in slot order.
    pub fn alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.records
            .iter()
            .filter(|record| record.is_live())
            .map(|record| record.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentId;

    #[test]
    fn test_create_appends() {
        let mut slots = SlotTable::new();

        let e1 = slots.create();
        let e2 = slots.create();

        assert_eq!(e1.index(), 0);
        assert_eq!(e2.index(), 1);
        assert_eq!(e1.generation().get(), 0);
        assert!(slots.is_valid(e1));
        assert!(slots.is_valid(e2));
        assert_eq!(slots.alive_count(), 2);
    }

    #[test]
    fn test_destroy_invalidates() {
        let mut slots = SlotTable::new();

        let e1 = slots.create();
        slots.destroy(e1).unwrap();

        assert!(!slots.is_valid(e1));
        assert_eq!(slots.alive_count(), 0);
        assert_eq!(slots.free_len(), 1);
        assert!(!slots.record(0).unwrap().is_live());
    }

    #[test]
    fn test_double_destroy_fails() {
        let mut slots = SlotTable::new();

        let e1 = slots.create();
        slots.destroy(e1).unwrap();

        assert_eq!(slots.destroy(e1), Err(EcsError::InvalidEntity(e1)));
        assert_eq!(slots.free_len(), 1);
    }

    #[test]
    fn test_recycle_is_lifo() {
        let mut slots = SlotTable::new();

        let e0 = slots.create();
        let e1 = slots.create();
        let _e2 = slots.create();

        slots.destroy(e0).unwrap();
        slots.destroy(e1).unwrap();
        assert_eq!(slots.next_index(), 1);

        let first = slots.create();
        let second = slots.create();
        assert_eq!(first.index(), 1);
        assert_eq!(second.index(), 0);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_recycle_clears_mask() {
        let mut slots = SlotTable::new();

        let e0 = slots.create();
        slots.mask_mut(e0).unwrap().set(ComponentId::from_raw(3));
        slots.destroy(e0).unwrap();

        let e1 = slots.create();
        assert_eq!(e1.index(), e0.index());
        assert!(slots.mask(e1).unwrap().is_empty());
    }

    #[test]
    fn test_generation_strictly_increases() {
        let mut slots = SlotTable::new();

        let mut previous = slots.create();
        for _ in 0..10 {
            slots.destroy(previous).unwrap();
            let next = slots.create();
            assert_eq!(next.index(), previous.index());
            assert!(next.generation() > previous.generation());
            assert!(!slots.is_valid(previous));
            previous = next;
        }
    }

    #[test]
    fn test_out_of_range_and_sentinel_invalid() {
        let mut slots = SlotTable::new();
        slots.create();

        assert!(!slots.is_valid(Entity::from_index(5)));
        assert!(!slots.is_valid(Entity::DANGLING));
        assert!(slots.mask(Entity::DANGLING).is_err());
    }

    #[test]
    fn test_alive_skips_free_slots() {
        let mut slots = SlotTable::new();

        let e0 = slots.create();
        let e1 = slots.create();
        let e2 = slots.create();
        slots.destroy(e1).unwrap();

        let alive: Vec<Entity> = slots.alive().collect();
        assert_eq!(alive, vec![e0, e2]);
    }
}
