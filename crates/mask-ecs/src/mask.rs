//! Fixed-width component membership masks.

use std::{fmt, ops::BitOr};

use crate::component::ComponentId;

/// Maximum number of distinct component types a world can hold.
///
/// Equal to the bit width of [`ComponentMask`].
pub const MAX_COMPONENTS: usize = u64::BITS as usize;

/// Set of component ids, one bit per id.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Mask containing a single component.
    #[must_use]
    pub const fn of(id: ComponentId) -> Self {
        Self(bit(id))
    }

    #[inline]
    pub fn set(&mut self, id: ComponentId) {
        self.0 |= bit(id);
    }

    #[inline]
    pub fn clear(&mut self, id: ComponentId) {
        self.0 &= !bit(id);
    }

    #[inline]
    #[must_use]
    pub const fn test(self, id: ComponentId) -> bool {
        self.0 & bit(id) != 0
    }

    /// Remove every component.
    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Whether every bit of `required` is also set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of components in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Iterate over the ids in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ComponentId> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                return None;
            }
            let bit = rest.trailing_zeros();
            rest &= rest - 1;
            Some(ComponentId::from_raw(bit))
        })
    }
}

/// Single-bit word for `id`. Ids past the mask width are a caller bug.
#[inline]
const fn bit(id: ComponentId) -> u64 {
    debug_assert!(
        (id.index() as usize) < MAX_COMPONENTS,
        "component id out of mask range"
    );
    1 << id.index()
}

impl BitOr for ComponentMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl FromIterator<ComponentId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for id in iter {
            mask.set(id);
        }
        mask
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentMask({:#066b})", self.0)
    }
}
