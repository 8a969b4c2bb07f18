//! Component type registration and metadata.
//!
//! Components are data types that can be attached to entities.
//! Each world owns a [`ComponentRegistry`] that hands out small, dense ids
//! on first use. Ids index both the membership mask and the pool vector.

use std::{alloc::Layout, any::TypeId, fmt};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{
    error::{EcsError, EcsResult},
    mask::{ComponentMask, MAX_COMPONENTS},
};

/// Marker trait for types that can be used as components.
///
/// Any `'static` type qualifies. Component values are moved into raw pool
/// memory, so they must not rely on a stable address before insertion.
pub trait Component: 'static {}

// Blanket implementation for all suitable types
impl<T: 'static> Component for T {}

/// Unique identifier for a component type within one registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Create a component ID from a raw value.
    ///
    /// Only registries mint ids, so every id stays below [`MAX_COMPONENTS`].
    #[must_use]
    pub(crate) const fn from_raw(id: u32) -> Self {
        debug_assert!((id as usize) < MAX_COMPONENTS, "component id out of mask range");
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Bit position in a [`ComponentMask`] and index into the pool vector.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Mask with only this component set.
    #[must_use]
    pub const fn mask(self) -> ComponentMask {
        ComponentMask::of(self)
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Runtime information about a component type.
#[derive(Clone)]
pub struct ComponentInfo {
    /// Unique ID for this component type.
    id: ComponentId,
    /// Type name for debugging.
    name: &'static str,
    /// Memory layout of the component.
    layout: Layout,
    /// Rust TypeId for type checking.
    type_id: TypeId,
}

impl ComponentInfo {
    /// Create component info for a concrete type.
    #[must_use]
    pub fn of<T: Component>(id: ComponentId) -> Self {
        Self {
            id,
            name: std::any::type_name::<T>(),
            layout: Layout::new::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Get the size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.layout.size()
    }

    /// Get the alignment requirement.
    #[must_use]
    pub const fn align(&self) -> usize {
        self.layout.align()
    }

    /// Zero-sized types never need a buffer.
    #[must_use]
    pub const fn is_zero_sized(&self) -> bool {
        self.layout.size() == 0
    }

    /// Check if this info is for the given type.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

/// Registry for component types.
///
/// Maps Rust types to `ComponentId`s and stores metadata about each type.
/// Ids start at 0, grow by one per new type and are never reused. Two
/// registries never share ids.
#[derive(Default)]
pub struct ComponentRegistry {
    /// Map from TypeId to ComponentId.
    type_to_id: HashMap<TypeId, ComponentId, FxBuildHasher>,
    /// Component info indexed by ComponentId.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id for `T`, assigning the next free one on first use.
    pub fn id_of<T: Component>(&mut self) -> EcsResult<ComponentId> {
        self.register::<T>().map(ComponentInfo::id)
    }

    /// Metadata for `T`, registering it on first use.
    pub fn register<T: Component>(&mut self) -> EcsResult<&ComponentInfo> {
        let type_id = TypeId::of::<T>();

        if let Some(&id) = self.type_to_id.get(&type_id) {
            // Ids are dense indices into `infos`
            return Ok(&self.infos[id.as_raw() as usize]);
        }

        if self.infos.len() >= MAX_COMPONENTS {
            tracing::warn!(
                component = std::any::type_name::<T>(),
                limit = MAX_COMPONENTS,
                "component type limit reached"
            );
            return Err(EcsError::ComponentLimit {
                limit: MAX_COMPONENTS,
            });
        }

        let id = ComponentId(self.infos.len() as u32);
        let info = ComponentInfo::of::<T>(id);
        tracing::debug!(id = id.as_raw(), component = info.name(), "registered component");

        self.type_to_id.insert(type_id, id);
        self.infos.push(info);

        Ok(&self.infos[id.as_raw() as usize])
    }

    /// Get the component ID for a type, if registered.
    #[must_use]
    pub fn get_id<T: Component>(&self) -> Option<ComponentId> {
        self.type_to_id.get(&TypeId::of::<T>()).copied()
    }

    /// Get component info by ID.
    #[must_use]
    pub fn get_info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.as_raw() as usize)
    }

    /// Get the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterate over all registered component infos, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("count", &self.len())
            .field("components", &self.infos)
            .finish()
    }
}
