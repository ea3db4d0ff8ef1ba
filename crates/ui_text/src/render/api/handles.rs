//! Opaque GPU resource handles

use ash::vk;

/// Handle to a texture owned by a [`super::TextureService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to a GPU vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a descriptor set owned by a [`super::DescriptorService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetHandle(pub u64);

/// Handle to a graphics pipeline owned by the host renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineHandle(pub u64);

/// Shared geometry acquired through a [`super::GeometryService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle {
    /// Vertex buffer holding the geometry
    pub vertex_buffer: BufferHandle,
    /// Number of vertices in the buffer
    pub vertex_count: u32,
}

/// Pixel formats supported for texture upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Single 8-bit normalized channel (glyph coverage)
    R8Unorm,
}

impl TextureFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::R8Unorm => 1,
        }
    }

    /// Matching Vulkan format
    pub const fn to_vk(self) -> vk::Format {
        match self {
            Self::R8Unorm => vk::Format::R8_UNORM,
        }
    }
}

/// Sampler filtering used when binding a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerMode {
    /// Nearest-neighbour sampling (pixel exact glyphs)
    Nearest,
    /// Bilinear sampling
    Linear,
}

impl SamplerMode {
    /// Matching Vulkan filter
    pub const fn to_vk(self) -> vk::Filter {
        match self {
            Self::Nearest => vk::Filter::NEAREST,
            Self::Linear => vk::Filter::LINEAR,
        }
    }
}
