//! Collaborator interfaces consumed by the text subsystem
//!
//! The font cache and text renderables never talk to Vulkan directly. They
//! go through the service traits defined here, which the host engine
//! implements (see [`crate::render::backends`] for the bundled backends).

pub mod geometry_registry;
pub mod handles;
pub mod services;

pub use geometry_registry::GeometryRegistry;
pub use handles::{
    BufferHandle, DescriptorSetHandle, GeometryHandle, PipelineHandle, SamplerMode, TextureFormat,
    TextureHandle,
};
pub use services::{
    DescriptorService, GeometryDefinition, GeometryService, GpuServices, GraphicsError, GraphicsResult,
    TextureService,
};
