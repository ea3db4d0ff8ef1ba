//! Host-visible vertex buffers for shared glyph geometry

use std::sync::Arc;

use ash::vk;

use super::error::VulkanResult;
use super::upload::UploadContext;

/// Vertex buffer written once from the CPU
pub struct VertexBuffer {
    device: Arc<ash::Device>,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
}

impl VertexBuffer {
    /// Allocate a buffer and copy `bytes` into it
    pub fn new(context: &UploadContext, bytes: &[u8]) -> VulkanResult<Self> {
        let (buffer, memory) = context.create_buffer(
            bytes.len().max(1) as vk::DeviceSize,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        let vertex_buffer = Self { device: Arc::clone(context.device()), buffer, memory };

        if !bytes.is_empty() {
            context.write_mapped(memory, bytes)?;
        }
        Ok(vertex_buffer)
    }

    /// Raw buffer for `vkCmdBindVertexBuffers`
    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
