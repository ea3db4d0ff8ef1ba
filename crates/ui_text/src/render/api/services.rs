//! GPU service traits

use super::handles::{
    DescriptorSetHandle, GeometryHandle, SamplerMode, TextureFormat, TextureHandle,
};

/// Result type for GPU service operations
pub type GraphicsResult<T> = Result<T, GraphicsError>;

/// Errors reported by GPU services
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// Texture could not be created or uploaded
    #[error("Texture creation failed: {0}")]
    TextureCreation(String),

    /// Vertex data could not be uploaded
    #[error("Buffer upload failed: {0}")]
    BufferUpload(String),

    /// Descriptor set could not be allocated or written
    #[error("Descriptor set allocation failed: {0}")]
    DescriptorAllocation(String),

    /// Pixel data does not match the requested dimensions
    #[error("Invalid texture data: expected {expected} bytes, got {actual}")]
    InvalidTextureData {
        /// Bytes implied by width, height and format
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Handle does not refer to a live resource
    #[error("Unknown {kind} handle: {raw:#x}")]
    UnknownHandle {
        /// Resource kind ("texture", "descriptor set", ...)
        kind: &'static str,
        /// Raw handle value
        raw: u64,
    },
}

/// Vertex data for a named piece of shared geometry
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDefinition {
    /// Identity used for reference counting
    pub name: String,
    /// Raw vertex bytes
    pub vertex_data: Vec<u8>,
    /// Size of one vertex in bytes
    pub vertex_stride: u32,
    /// Number of vertices
    pub vertex_count: u32,
}

impl GeometryDefinition {
    /// Build a definition from a slice of plain-old-data vertices
    pub fn from_vertices<V: bytemuck::Pod>(name: impl Into<String>, vertices: &[V]) -> Self {
        Self {
            name: name.into(),
            vertex_data: bytemuck::cast_slice(vertices).to_vec(),
            vertex_stride: std::mem::size_of::<V>() as u32,
            vertex_count: vertices.len() as u32,
        }
    }
}

/// Texture creation and destruction
pub trait TextureService: Send + Sync {
    /// Create a texture from tightly packed pixel rows
    fn create_texture(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> GraphicsResult<TextureHandle>;

    /// Destroy a texture; unknown handles are ignored
    fn destroy_texture(&self, handle: TextureHandle);
}

/// Reference-counted shared geometry
pub trait GeometryService: Send + Sync {
    /// Return the buffer for `definition.name`, uploading it on first use
    ///
    /// Every successful call must be balanced by one [`GeometryService::release_geometry`].
    fn get_or_create_geometry(&self, definition: &GeometryDefinition) -> GraphicsResult<GeometryHandle>;

    /// Drop one reference; the buffer is destroyed when none remain
    fn release_geometry(&self, name: &str);
}

/// Descriptor set allocation for the glyph pipeline layout
pub trait DescriptorService: Send + Sync {
    /// Allocate a descriptor set using the glyph layout
    fn allocate_descriptor_set(&self) -> GraphicsResult<DescriptorSetHandle>;

    /// Bind a texture to the set
    fn update_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        texture: TextureHandle,
        sampler: SamplerMode,
        binding: u32,
    ) -> GraphicsResult<()>;

    /// Return the set to its pool; unknown handles are ignored
    fn free_descriptor_set(&self, set: DescriptorSetHandle);
}

/// Everything the text subsystem needs from the graphics backend
pub trait GpuServices: TextureService + GeometryService + DescriptorService {}

impl<T> GpuServices for T where T: TextureService + GeometryService + DescriptorService + ?Sized {}

