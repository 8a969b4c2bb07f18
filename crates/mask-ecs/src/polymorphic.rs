//! Polymorphic components - one slot holding any implementation of a trait.
//!
//! Useful when a component is best modelled as "some `Behavior`" and the
//! concrete type is chosen at runtime:
//!
//! ```ignore
//! trait Behavior { fn take_turn(&mut self) -> u32; }
//!
//! type Brain = Polymorphic<dyn Behavior, 64>;
//!
//! let brain = world.add_component(entity, Brain::new())?;
//! brain.emplace(Wander { steps: 3 }, |s| s);
//! let steps = brain.get_mut().map(|s| s.take_turn());
//! ```
//!
//! The `upcast` argument of [`Polymorphic::emplace`] is the unsizing
//! coercion from `&mut S` to `&mut B`; for trait objects `|s| s` is enough.
//! The result must be the value it was given: `emplace` checks address,
//! size and alignment and panics on anything else.

use std::{any::TypeId, fmt};

/// A boxed `B` whose concrete type is at most `MAX_SIZE` bytes.
pub struct Polymorphic<B: ?Sized + 'static, const MAX_SIZE: usize> {
    value: Option<Box<B>>,
    /// Concrete type of `value`.
    concrete: Option<TypeId>,
}

impl<B: ?Sized + 'static, const MAX_SIZE: usize> Polymorphic<B, MAX_SIZE> {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: None,
            concrete: None,
        }
    }

    /// Store `value`, dropping whatever was stored before.
    ///
    /// # Panics
    ///
    /// Panics if `upcast` returns anything other than its argument. The
    /// previous value is kept in that case.
    pub fn emplace<S: 'static>(&mut self, value: S, upcast: fn(&mut S) -> &mut B) -> &mut S {
        const {
            assert!(
                std::mem::size_of::<S>() <= MAX_SIZE,
                "implementation does not fit the polymorphic slot"
            );
        }

        let raw = Box::into_raw(Box::new(value));
        // SAFETY: raw is a live allocation owned by this function until it is
        // handed to a Box again below
        let base: *mut B = upcast(unsafe { &mut *raw });

        // SAFETY: base came from a reference returned by safe code
        let same_value = std::ptr::addr_eq(base, raw)
            && unsafe { std::mem::size_of_val(&*base) } == std::mem::size_of::<S>()
            && unsafe { std::mem::align_of_val(&*base) } == std::mem::align_of::<S>();
        if !same_value {
            // SAFETY: raw came from Box::into_raw and has not been reclaimed
            drop(unsafe { Box::from_raw(raw) });
            panic!(
                "upcast for {} must return the value it was given",
                std::any::type_name::<S>()
            );
        }

        self.concrete = Some(TypeId::of::<S>());
        // SAFETY: base addresses the allocation behind raw and its metadata
        // describes S's layout, so the Box frees it correctly
        let stored = self.value.insert(unsafe { Box::from_raw(base) });
        // SAFETY: the checks above prove `stored` is the S just allocated
        unsafe { &mut *std::ptr::from_mut::<B>(&mut **stored).cast::<S>() }
    }

    /// Drop the stored value and store `value` instead.
    pub fn replace<S: 'static>(&mut self, value: S, upcast: fn(&mut S) -> &mut B) -> &mut S {
        self.destroy();
        self.emplace(value, upcast)
    }

    /// Drop the stored value, leaving the slot empty.
    pub fn destroy(&mut self) {
        self.value = None;
        self.concrete = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<&B> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut B> {
        self.value.as_deref_mut()
    }

    /// Whether the stored value is exactly an `S`.
    #[must_use]
    pub fn holds<S: 'static>(&self) -> bool {
        self.concrete == Some(TypeId::of::<S>())
    }

    /// The stored value as its concrete type.
    #[must_use]
    pub fn downcast<S: 'static>(&self) -> Option<&S> {
        if !self.holds::<S>() {
            return None;
        }
        let base = self.value.as_deref()?;
        // SAFETY: the TypeId check proves the box was built from an S
        Some(unsafe { &*std::ptr::from_ref::<B>(base).cast::<S>() })
    }

    /// Mutable counterpart of [`downcast`](Self::downcast).
    #[must_use]
    pub fn downcast_mut<S: 'static>(&mut self) -> Option<&mut S> {
        if !self.holds::<S>() {
            return None;
        }
        let base = self.value.as_deref_mut()?;
        // SAFETY: the TypeId check proves the box was built from an S
        Some(unsafe { &mut *std::ptr::from_mut::<B>(base).cast::<S>() })
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl<B: ?Sized + 'static, const MAX_SIZE: usize> Default for Polymorphic<B, MAX_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized + 'static, const MAX_SIZE: usize> fmt::Debug for Polymorphic<B, MAX_SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polymorphic")
            .field("occupied", &self.value.is_some())
            .field("max_size", &MAX_SIZE)
            .finish()
    }
}
