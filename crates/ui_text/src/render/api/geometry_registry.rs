//! Reference counting for named shared geometry
//!
//! Backends embed a [`GeometryRegistry`] to implement
//! [`super::GeometryService`]: the registry owns the counts, the backend
//! supplies the closures that actually create and destroy buffers.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::handles::{BufferHandle, GeometryHandle};
use super::services::{GeometryDefinition, GraphicsResult};

struct GeometryEntry {
    handle: GeometryHandle,
    ref_count: usize,
}

/// Name-keyed reference counts for shared vertex buffers
#[derive(Default)]
pub struct GeometryRegistry {
    entries: Mutex<HashMap<String, GeometryEntry>>,
}

impl GeometryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference to `definition.name`, calling `create` on first use
    pub fn acquire<F>(&self, definition: &GeometryDefinition, create: F) -> GraphicsResult<GeometryHandle>
    where
        F: FnOnce(&GeometryDefinition) -> GraphicsResult<BufferHandle>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get_mut(&definition.name) {
            entry.ref_count += 1;
            log::trace!("Geometry '{}' refs -> {}", definition.name, entry.ref_count);
            return Ok(entry.handle);
        }

        let vertex_buffer = create(definition)?;
        let handle = GeometryHandle { vertex_buffer, vertex_count: definition.vertex_count };
        entries.insert(definition.name.clone(), GeometryEntry { handle, ref_count: 1 });
        log::debug!(
            "Created shared geometry '{}' ({} vertices, {} bytes)",
            definition.name,
            definition.vertex_count,
            definition.vertex_data.len()
        );
        Ok(handle)
    }

    /// Drop a reference to `name`, calling `destroy` when it was the last one
    ///
    /// Returns `true` if the geometry was destroyed. Unknown names are ignored.
    pub fn release<F>(&self, name: &str, destroy: F) -> bool
    where
        F: FnOnce(BufferHandle),
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(entry) = entries.get_mut(name) else {
            log::debug!("Release of unknown geometry '{}' ignored", name);
            return false;
        };

        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            log::trace!("Geometry '{}' refs -> {}", name, entry.ref_count);
            return false;
        }

        if let Some(entry) = entries.remove(name) {
            destroy(entry.handle.vertex_buffer);
            log::debug!("Destroyed shared geometry '{}'", name);
        }
        true
    }

    /// Current reference count for `name` (0 if absent)
    pub fn ref_count(&self, name: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |entry| entry.ref_count)
    }

    /// Number of live geometries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no geometry is live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
