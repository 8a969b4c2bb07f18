//! Component storage - fixed-capacity, type-erased pools indexed by slot.
//!
//! Each [`Column`] owns one allocation sized for `capacity` values of a
//! single component type. The allocation never grows or moves, so a
//! reference handed out for one slot stays at the same address for as long
//! as the column lives.
//!
//! Columns do not know which slots hold live values (the slot table masks
//! do), so they never run destructors. Overwriting a slot or dropping the
//! column leaks whatever the old values owned.

use std::{alloc::Layout, ptr::NonNull};

use crate::component::ComponentInfo;

/// Fixed-capacity storage for one component type.
pub(crate) struct Column {
    /// Pointer to the data array. Aligned and dangling for zero-sized types.
    data: NonNull<u8>,
    /// Number of values the allocation can hold.
    capacity: usize,
    /// Component type information.
    info: ComponentInfo,
}

impl Column {
    /// Allocate a column able to hold `capacity` values.
    #[must_use]
    pub fn with_capacity(info: ComponentInfo, capacity: usize) -> Self {
        if capacity == 0 || info.is_zero_sized() {
            return Self {
                data: Self::dangling(&info),
                capacity,
                info,
            };
        }

        let layout = Self::array_layout(&info, capacity);

        // SAFETY: Layout is valid and non-zero
        let data = unsafe {
            let ptr = std::alloc::alloc(layout);
            if ptr.is_null() {
                std::alloc::handle_alloc_error(layout);
            }
            NonNull::new_unchecked(ptr)
        };

        Self {
            data,
            capacity,
            info,
        }
    }

    /// Get the capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the component info.
    #[must_use]
    pub const fn info(&self) -> &ComponentInfo {
        &self.info
    }

    /// Raw pointer to the value slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the column's capacity.
    #[must_use]
    pub fn slot_ptr(&self, index: usize) -> *mut u8 {
        assert!(
            index < self.capacity,
            "slot {index} out of bounds for {} pool of capacity {}",
            self.info.name(),
            self.capacity
        );
        // SAFETY: index < capacity, so the offset stays inside the allocation
        unsafe { self.data.as_ptr().add(index * self.info.size()) }
    }

    /// Move `value` into the slot at `index` without dropping what was there.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the capacity or if `T` is not the
    /// column's component type.
    pub fn write<T: 'static>(&mut self, index: usize, value: T) -> &mut T {
        assert!(
            self.info.is::<T>(),
            "type mismatch: {} written to {} pool",
            std::any::type_name::<T>(),
            self.info.name()
        );
        let ptr = self.slot_ptr(index).cast::<T>();
        // SAFETY: ptr is in bounds and aligned for T; the previous contents
        // are treated as dead bytes
        unsafe {
            ptr.write(value);
            &mut *ptr
        }
    }

    /// Get a reference to the value at the given index.
    ///
    /// # Safety
    ///
    /// - A value of type `T` must have been written at `index`.
    /// - `T` must match the column's component type.
    #[must_use]
    pub unsafe fn get_unchecked<T: 'static>(&self, index: usize) -> &T {
        debug_assert!(self.info.is::<T>(), "Type mismatch in Column::get");
        // SAFETY: Caller ensures the slot is initialized and the type matches
        unsafe { &*self.slot_ptr(index).cast::<T>() }
    }

    /// Get a pointer to the start of the data array.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    fn dangling(info: &ComponentInfo) -> NonNull<u8> {
        // Alignment is never zero, so this is a non-null, aligned address
        NonNull::new(std::ptr::without_provenance_mut(info.align())).unwrap_or(NonNull::dangling())
    }

    /// Calculate the array layout for `count` components.
    fn array_layout(info: &ComponentInfo, count: usize) -> Layout {
        let size = info.size().checked_mul(count).expect("Layout overflow");
        Layout::from_size_align(size, info.align()).expect("Layout overflow")
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if self.capacity > 0 && !self.info.is_zero_sized() {
            let layout = Self::array_layout(&self.info, self.capacity);
            // SAFETY: data was allocated with this layout
            unsafe {
                std::alloc::dealloc(self.data.as_ptr(), layout);
            }
        }
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("component", &self.info.name())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Storage state for one component id.
#[derive(Debug, Default)]
pub(crate) enum Pool {
    /// No type has touched this id yet. Keeps the pool vector aligned with ids.
    #[default]
    Unallocated,
    /// Id is in use for presence only; no buffer.
    Reserved,
    /// Buffer allocated.
    Materialized(Column),
}

impl Pool {
    #[must_use]
    pub const fn is_materialized(&self) -> bool {
        matches!(self, Self::Materialized(_))
    }

    #[must_use]
    pub const fn column(&self) -> Option<&Column> {
        match self {
            Self::Materialized(column) => Some(column),
            _ => None,
        }
    }

    /// Mark the id as used by a tag. Materialized pools stay as they are.
    ///
    /// Returns `true` if the state changed.
    pub fn reserve(&mut self) -> bool {
        if matches!(self, Self::Unallocated) {
            *self = Self::Reserved;
            return true;
        }
        false
    }

    /// Ensure a buffer exists, allocating one of `capacity` values if needed.
    pub fn materialize(&mut self, info: &ComponentInfo, capacity: usize) -> &mut Column {
        if !self.is_materialized() {
            tracing::debug!(
                component = info.name(),
                capacity,
                "materializing component pool"
            );
            *self = Self::Materialized(Column::with_capacity(info.clone(), capacity));
        }
        match self {
            Self::Materialized(column) => column,
            _ => unreachable!("pool was just materialized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComponentId;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Marker;

    fn position_info() -> ComponentInfo {
        ComponentInfo::of::<Position>(ComponentId::from_raw(0))
    }

    #[test]
    fn test_column_write_get() {
        let mut col = Column::with_capacity(position_info(), 8);

        col.write(0, Position { x: 1.0, y: 2.0 });
        col.write(5, Position { x: 3.0, y: 4.0 });

        // SAFETY: Slots 0 and 5 were written with Position
        unsafe {
            assert_eq!(
                col.get_unchecked::<Position>(0),
                &Position { x: 1.0, y: 2.0 }
            );
            assert_eq!(
                col.get_unchecked::<Position>(5),
                &Position { x: 3.0, y: 4.0 }
            );
        }
    }

    #[test]
    fn test_column_overwrite() {
        let mut col = Column::with_capacity(position_info(), 4);

        col.write(2, Position { x: 1.0, y: 1.0 });
        let value = col.write(2, Position { x: 9.0, y: 9.0 });
        value.x += 1.0;

        // SAFETY: Slot 2 was written with Position
        unsafe {
            assert_eq!(col.get_unchecked::<Position>(2).x, 10.0);
        }
    }

    #[test]
    fn test_column_address_is_stable() {
        let mut col = Column::with_capacity(position_info(), 16);
        let before = std::ptr::from_mut(col.write(3, Position { x: 0.0, y: 0.0 }));

        for i in 0..16 {
            col.write(i, Position { x: i as f32, y: 0.0 });
        }

        let after = col.slot_ptr(3).cast::<Position>();
        assert_eq!(before, after);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_column_out_of_bounds_panics() {
        let mut col = Column::with_capacity(position_info(), 2);
        col.write(2, Position { x: 0.0, y: 0.0 });
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn test_column_rejects_foreign_type() {
        let info = ComponentInfo::of::<u8>(ComponentId::from_raw(2));
        let mut col = Column::with_capacity(info, 1);
        col.write(0, [0u64; 4]);
    }

    #[test]
    fn test_zero_sized_column() {
        let info = ComponentInfo::of::<Marker>(ComponentId::from_raw(1));
        let mut col = Column::with_capacity(info, 4);

        col.write(3, Marker);
        // SAFETY: Marker is zero-sized and was written at slot 3
        unsafe {
            assert_eq!(col.get_unchecked::<Marker>(3), &Marker);
        }
        assert_eq!(col.as_ptr() as usize % std::mem::align_of::<Marker>(), 0);
    }

    #[test]
    fn test_pool_states() {
        let info = position_info();
        let mut pool = Pool::default();
        assert!(matches!(pool, Pool::Unallocated));

        assert!(pool.reserve());
        assert!(matches!(pool, Pool::Reserved));
        assert!(!pool.reserve());

        pool.materialize(&info, 4).write(1, Position { x: 1.0, y: 0.0 });
        assert!(pool.is_materialized());
        assert!(!pool.reserve());
        assert_eq!(pool.column().unwrap().capacity(), 4);
    }

    #[test]
    fn test_materialize_keeps_existing_buffer() {
        let info = position_info();
        let mut pool = Pool::default();

        let first = pool.materialize(&info, 4).as_ptr();
        let second = pool.materialize(&info, 4).as_ptr();
        assert_eq!(first, second);
    }
}
