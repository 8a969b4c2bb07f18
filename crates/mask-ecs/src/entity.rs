//! Entity handles with generational identity.
//!
//! A handle packs a slot index (high 32 bits) and a generation counter
//! (low 32 bits) into one `u64`. The slot table stores the exact handle it
//! last issued for each slot, so validating a handle is a bounds check plus a
//! single 64-bit comparison.
//!
//! Generation wraparound is not handled: after 2^32 recycles of the same slot
//! a stale handle could validate again.

use std::fmt;

/// Slot index stored in the high half of an invalidated handle.
pub(crate) const SENTINEL_INDEX: u32 = u32::MAX;

const INDEX_SHIFT: u32 = 32;
const GENERATION_MASK: u64 = 0xFFFF_FFFF;

/// Generation counter to detect stale entity references.
/// Advanced each time an entity slot is destroyed or recycled.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u32);

impl Generation {
    /// Create a new generation (starts at 0).
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Increment the generation counter.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Get the raw generation value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// An opaque handle to an entity.
///
/// Handles are plain values: copying one never keeps the entity alive, and a
/// handle captured before its entity was destroyed reports invalid forever
/// after (barring generation wraparound).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u64);

impl Entity {
    /// A handle that is never valid.
    ///
    /// Also marks the terminal position of a [`ViewCursor`](crate::ViewCursor).
    pub const DANGLING: Entity = Entity(u64::MAX);

    /// Handle for a freshly allocated slot (generation 0).
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self((index as u64) << INDEX_SHIFT)
    }

    /// Slot index encoded in the handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        (self.0 >> INDEX_SHIFT) as u32
    }

    /// Generation encoded in the handle.
    #[must_use]
    pub const fn generation(self) -> Generation {
        Generation((self.0 & GENERATION_MASK) as u32)
    }

    /// Same slot index, generation advanced by one.
    #[must_use]
    pub const fn next_generation(self) -> Self {
        let generation = self.generation().next().get() as u64;
        Self((self.0 & !GENERATION_MASK) | generation)
    }

    /// Handle for `index` that continues this handle's generation count.
    ///
    /// Used when a freed slot is recycled: the stored handle carries the
    /// sentinel index, so the real index has to be restored.
    #[must_use]
    pub(crate) const fn recycled_at(self, index: u32) -> Self {
        Self(((index as u64) << INDEX_SHIFT) | (self.0 & GENERATION_MASK)).next_generation()
    }

    /// Mark the slot as unoccupied.
    ///
    /// The slot index becomes the sentinel so that no captured handle can
    /// compare equal, and the generation keeps counting.
    #[must_use]
    pub const fn invalidated(self) -> Self {
        Self(((SENTINEL_INDEX as u64) << INDEX_SHIFT) | (self.0 & GENERATION_MASK)).next_generation()
    }

    /// Whether the slot index field is the sentinel.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.index() == SENTINEL_INDEX
    }

    /// Raw 64-bit representation.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from its raw representation.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "Entity(dead,v{})", self.generation().get())
        } else {
            write!(f, "Entity({}v{})", self.index(), self.generation().get())
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation().get())
    }
}
