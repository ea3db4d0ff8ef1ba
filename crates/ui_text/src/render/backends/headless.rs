//! In-memory GPU backend
//!
//! Keeps every texture, buffer and descriptor set in slot maps on the CPU.
//! Useful for tests, offline tools and anything that needs the text pipeline
//! without a Vulkan device. Failures can be injected per service to exercise
//! error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::foundation::collections::{key_to_raw, raw_to_key, HandleMap};
use crate::render::api::{
    BufferHandle, DescriptorService, DescriptorSetHandle, GeometryDefinition, GeometryHandle,
    GeometryRegistry, GeometryService, GraphicsError, GraphicsResult, SamplerMode, TextureFormat,
    TextureHandle, TextureService,
};

struct HeadlessTexture {
    width: u32,
    height: u32,
    format: TextureFormat,
    pixels: Vec<u8>,
}

struct HeadlessBuffer {
    data: Vec<u8>,
    vertex_count: u32,
}

/// Texture bound into a descriptor set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBinding {
    /// Bound texture
    pub texture: TextureHandle,
    /// Sampler filtering
    pub sampler: SamplerMode,
    /// Binding slot
    pub binding: u32,
}

/// CPU-side implementation of the GPU service traits
#[derive(Default)]
pub struct HeadlessGpu {
    textures: Mutex<HandleMap<HeadlessTexture>>,
    buffers: Mutex<HandleMap<HeadlessBuffer>>,
    descriptor_sets: Mutex<HandleMap<Option<DescriptorBinding>>>,
    geometry: GeometryRegistry,
    fail_textures: AtomicBool,
    fail_buffers: AtomicBool,
    fail_descriptors: AtomicBool,
}

impl HeadlessGpu {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent texture creation fail
    pub fn set_fail_texture_creation(&self, fail: bool) {
        self.fail_textures.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent buffer uploads fail
    pub fn set_fail_buffer_upload(&self, fail: bool) {
        self.fail_buffers.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent descriptor set allocation fail
    pub fn set_fail_descriptor_allocation(&self, fail: bool) {
        self.fail_descriptors.store(fail, Ordering::Relaxed);
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of live vertex buffers
    pub fn buffer_count(&self) -> usize {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of live descriptor sets
    pub fn descriptor_set_count(&self) -> usize {
        self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// References held on the named shared geometry
    pub fn geometry_ref_count(&self, name: &str) -> usize {
        self.geometry.ref_count(name)
    }

    /// Dimensions and format of a live texture
    pub fn texture_info(&self, handle: TextureHandle) -> Option<(u32, u32, TextureFormat)> {
        let textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        textures
            .get(raw_to_key(handle.0))
            .map(|texture| (texture.width, texture.height, texture.format))
    }

    /// Copy of a live texture's pixels
    pub fn texture_pixels(&self, handle: TextureHandle) -> Option<Vec<u8>> {
        let textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        textures.get(raw_to_key(handle.0)).map(|texture| texture.pixels.clone())
    }

    /// Copy of a live buffer's bytes
    pub fn buffer_data(&self, handle: BufferHandle) -> Option<Vec<u8>> {
        let buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.get(raw_to_key(handle.0)).map(|buffer| buffer.data.clone())
    }

    /// Texture written into a descriptor set, if any
    pub fn descriptor_binding(&self, set: DescriptorSetHandle) -> Option<DescriptorBinding> {
        let sets = self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner);
        sets.get(raw_to_key(set.0)).copied().flatten()
    }

    fn upload_buffer(&self, definition: &GeometryDefinition) -> GraphicsResult<BufferHandle> {
        if self.fail_buffers.load(Ordering::Relaxed) {
            return Err(GraphicsError::BufferUpload(format!("injected failure for '{}'", definition.name)));
        }

        let expected = definition.vertex_stride as usize * definition.vertex_count as usize;
        if definition.vertex_data.len() != expected {
            return Err(GraphicsError::BufferUpload(format!(
                "'{}' has {} bytes, expected {}",
                definition.name,
                definition.vertex_data.len(),
                expected
            )));
        }

        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        let key = buffers.insert(HeadlessBuffer {
            data: definition.vertex_data.clone(),
            vertex_count: definition.vertex_count,
        });
        log::trace!("Headless buffer {:?} holds {} vertices", key, definition.vertex_count);
        Ok(BufferHandle(key_to_raw(key)))
    }

    fn destroy_buffer(&self, handle: BufferHandle) {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(buffer) = buffers.remove(raw_to_key(handle.0)) {
            log::trace!("Headless buffer {:#x} ({} vertices) destroyed", handle.0, buffer.vertex_count);
        }
    }
}

impl TextureService for HeadlessGpu {
    fn create_texture(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> GraphicsResult<TextureHandle> {
        if self.fail_textures.load(Ordering::Relaxed) {
            return Err(GraphicsError::TextureCreation("injected failure".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(GraphicsError::TextureCreation(format!("invalid extent {}x{}", width, height)));
        }

        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(GraphicsError::InvalidTextureData { expected, actual: pixels.len() });
        }

        let mut textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        let key = textures.insert(HeadlessTexture { width, height, format, pixels: pixels.to_vec() });
        Ok(TextureHandle(key_to_raw(key)))
    }

    fn destroy_texture(&self, handle: TextureHandle) {
        let mut textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        if textures.remove(raw_to_key(handle.0)).is_none() {
            log::debug!("Destroy of unknown texture {:#x} ignored", handle.0);
        }
    }
}

impl GeometryService for HeadlessGpu {
    fn get_or_create_geometry(&self, definition: &GeometryDefinition) -> GraphicsResult<GeometryHandle> {
        self.geometry.acquire(definition, |def| self.upload_buffer(def))
    }

    fn release_geometry(&self, name: &str) {
        self.geometry.release(name, |buffer| self.destroy_buffer(buffer));
    }
}

impl DescriptorService for HeadlessGpu {
    fn allocate_descriptor_set(&self) -> GraphicsResult<DescriptorSetHandle> {
        if self.fail_descriptors.load(Ordering::Relaxed) {
            return Err(GraphicsError::DescriptorAllocation("injected failure".to_string()));
        }
        let mut sets = self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(DescriptorSetHandle(key_to_raw(sets.insert(None))))
    }

    fn update_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        texture: TextureHandle,
        sampler: SamplerMode,
        binding: u32,
    ) -> GraphicsResult<()> {
        let texture_live = self
            .textures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(raw_to_key(texture.0));
        if !texture_live {
            return Err(GraphicsError::UnknownHandle { kind: "texture", raw: texture.0 });
        }

        let mut sets = self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = sets
            .get_mut(raw_to_key(set.0))
            .ok_or(GraphicsError::UnknownHandle { kind: "descriptor set", raw: set.0 })?;
        *slot = Some(DescriptorBinding { texture, sampler, binding });
        Ok(())
    }

    fn free_descriptor_set(&self, set: DescriptorSetHandle) {
        let mut sets = self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner);
        if sets.remove(raw_to_key(set.0)).is_none() {
            log::debug!("Free of unknown descriptor set {:#x} ignored", set.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_rejects_mismatched_pixel_data() {
        let gpu = HeadlessGpu::new();
        let err = gpu.create_texture(&[0; 15], 4, 4, TextureFormat::R8Unorm).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidTextureData { expected: 16, actual: 15 }));
        assert_eq!(gpu.texture_count(), 0);
    }

    #[test]
    fn texture_lifecycle() {
        let gpu = HeadlessGpu::new();
        let handle = gpu.create_texture(&[7; 8], 4, 2, TextureFormat::R8Unorm).unwrap();
        assert_eq!(gpu.texture_info(handle), Some((4, 2, TextureFormat::R8Unorm)));
        assert_eq!(gpu.texture_pixels(handle), Some(vec![7; 8]));

        gpu.destroy_texture(handle);
        gpu.destroy_texture(handle);
        assert_eq!(gpu.texture_count(), 0);
    }

    #[test]
    fn geometry_is_shared_by_name() {
        let gpu = HeadlessGpu::new();
        let def = GeometryDefinition::from_vertices("quads", &[[1.0f32, 2.0]; 4]);

        let a = gpu.get_or_create_geometry(&def).unwrap();
        let b = gpu.get_or_create_geometry(&def).unwrap();
        assert_eq!(a, b);
        assert_eq!(gpu.buffer_count(), 1);
        assert_eq!(gpu.buffer_data(a.vertex_buffer).map(|d| d.len()), Some(32));

        gpu.release_geometry("quads");
        assert_eq!(gpu.buffer_count(), 1);
        gpu.release_geometry("quads");
        assert_eq!(gpu.buffer_count(), 0);
        assert_eq!(gpu.geometry_ref_count("quads"), 0);
    }

    #[test]
    fn descriptor_set_records_binding() {
        let gpu = HeadlessGpu::new();
        let texture = gpu.create_texture(&[0; 4], 2, 2, TextureFormat::R8Unorm).unwrap();
        let set = gpu.allocate_descriptor_set().unwrap();
        assert_eq!(gpu.descriptor_binding(set), None);

        gpu.update_descriptor_set(set, texture, SamplerMode::Nearest, 0).unwrap();
        assert_eq!(
            gpu.descriptor_binding(set),
            Some(DescriptorBinding { texture, sampler: SamplerMode::Nearest, binding: 0 })
        );

        gpu.free_descriptor_set(set);
        assert_eq!(gpu.descriptor_set_count(), 0);
    }

    #[test]
    fn binding_a_destroyed_texture_fails() {
        let gpu = HeadlessGpu::new();
        let texture = gpu.create_texture(&[0; 4], 2, 2, TextureFormat::R8Unorm).unwrap();
        gpu.destroy_texture(texture);
        let set = gpu.allocate_descriptor_set().unwrap();
        let err = gpu.update_descriptor_set(set, texture, SamplerMode::Nearest, 0).unwrap_err();
        assert!(matches!(err, GraphicsError::UnknownHandle { kind: "texture", .. }));
    }

    #[test]
    fn injected_failures() {
        let gpu = HeadlessGpu::new();
        gpu.set_fail_descriptor_allocation(true);
        assert!(gpu.allocate_descriptor_set().is_err());
        gpu.set_fail_buffer_upload(true);
        let def = GeometryDefinition::from_vertices("q", &[[0.0f32; 2]; 4]);
        assert!(gpu.get_or_create_geometry(&def).is_err());
        assert_eq!(gpu.geometry_ref_count("q"), 0);
    }
}
