//! GPU backends implementing the [`crate::render::api`] service traits

pub mod headless;
pub mod vulkan;

pub use headless::{DescriptorBinding, HeadlessGpu};
pub use vulkan::{VulkanError, VulkanResult, VulkanTextBackend};
