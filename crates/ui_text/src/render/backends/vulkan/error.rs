//! Vulkan backend errors

use ash::vk;
use thiserror::Error;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Object creation failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Wrap an API failure with what was being attempted
pub(crate) fn failed(what: &'static str) -> impl Fn(vk::Result) -> VulkanError {
    move |e| VulkanError::InitializationFailed(format!("Failed to {}: {:?}", what, e))
}
