//! Vulkan (ash) backend for the text services

pub mod atlas_texture;
pub mod error;
pub mod text_backend;
pub mod upload;
pub mod vertex_buffer;

pub use atlas_texture::AtlasTexture;
pub use error::{VulkanError, VulkanResult};
pub use text_backend::{VulkanTextBackend, PUSH_CONSTANT_STAGES};
pub use upload::UploadContext;
pub use vertex_buffer::VertexBuffer;
