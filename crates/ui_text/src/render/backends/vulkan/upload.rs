//! Device handles and one-shot upload helpers shared by Vulkan resources

use std::sync::{Arc, Mutex, PoisonError};

use ash::vk;

use super::error::{failed, VulkanError, VulkanResult};

/// Device, queue and command pool used for resource uploads
///
/// Queue submission is serialized behind an internal lock, so uploads may be
/// issued from any thread.
pub struct UploadContext {
    device: Arc<ash::Device>,
    instance: Arc<ash::Instance>,
    physical_device: vk::PhysicalDevice,
    command_pool: vk::CommandPool,
    queue: Mutex<vk::Queue>,
}

impl UploadContext {
    /// Wrap existing device objects; the caller keeps ownership of the pool
    pub fn new(
        device: Arc<ash::Device>,
        instance: Arc<ash::Instance>,
        physical_device: vk::PhysicalDevice,
        command_pool: vk::CommandPool,
        queue: vk::Queue,
    ) -> Self {
        Self { device, instance, physical_device, command_pool, queue: Mutex::new(queue) }
    }

    /// Logical device
    pub fn device(&self) -> &Arc<ash::Device> {
        &self.device
    }

    /// Find a memory type matching `type_filter` with `properties`
    pub fn find_memory_type(&self, type_filter: u32, properties: vk::MemoryPropertyFlags) -> VulkanResult<u32> {
        let memory_properties = unsafe {
            self.instance.get_physical_device_memory_properties(self.physical_device)
        };

        (0..memory_properties.memory_type_count)
            .find(|&i| {
                (type_filter & (1 << i)) != 0
                    && memory_properties.memory_types[i as usize].property_flags.contains(properties)
            })
            .ok_or(VulkanError::NoSuitableMemoryType)
    }

    /// Create a buffer with bound memory
    pub fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<(vk::Buffer, vk::DeviceMemory)> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { self.device.create_buffer(&buffer_info, None).map_err(failed("create buffer"))? };

        let requirements = unsafe { self.device.get_buffer_memory_requirements(buffer) };
        let memory = match self
            .find_memory_type(requirements.memory_type_bits, properties)
            .and_then(|index| self.allocate(requirements.size, index))
        {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { self.device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        if let Err(e) = unsafe { self.device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                self.device.destroy_buffer(buffer, None);
                self.device.free_memory(memory, None);
            }
            return Err(failed("bind buffer memory")(e));
        }

        Ok((buffer, memory))
    }

    /// Allocate device memory of `size` bytes from `memory_type_index`
    pub fn allocate(&self, size: vk::DeviceSize, memory_type_index: u32) -> VulkanResult<vk::DeviceMemory> {
        let allocate_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(size)
            .memory_type_index(memory_type_index);
        unsafe { self.device.allocate_memory(&allocate_info, None).map_err(failed("allocate memory")) }
    }

    /// Copy `bytes` into host-visible, host-coherent `memory`
    pub fn write_mapped(&self, memory: vk::DeviceMemory, bytes: &[u8]) -> VulkanResult<()> {
        unsafe {
            let data_ptr = self
                .device
                .map_memory(memory, 0, bytes.len() as vk::DeviceSize, vk::MemoryMapFlags::empty())
                .map_err(failed("map memory"))? as *mut u8;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), data_ptr, bytes.len());
            self.device.unmap_memory(memory);
        }
        Ok(())
    }

    /// Record commands into a one-time buffer, submit and wait for completion
    pub fn submit_one_time<F>(&self, record: F) -> VulkanResult<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let allocate_info = vk::CommandBufferAllocateInfo::builder()
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_pool(self.command_pool)
            .command_buffer_count(1);

        // Pool and queue access must be externally synchronized
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);

        let command_buffers = unsafe {
            self.device
                .allocate_command_buffers(&allocate_info)
                .map_err(failed("allocate command buffer"))?
        };
        let command_buffer = command_buffers[0];

        let result = self.record_and_submit(*queue, command_buffer, record);
        unsafe { self.device.free_command_buffers(self.command_pool, &command_buffers) };
        result
    }

    fn record_and_submit<F>(&self, queue: vk::Queue, command_buffer: vk::CommandBuffer, record: F) -> VulkanResult<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(failed("begin command buffer"))?;
        }

        record(&self.device, command_buffer);

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::builder().command_buffers(&command_buffers);
        unsafe {
            self.device.end_command_buffer(command_buffer).map_err(failed("end command buffer"))?;
            self.device
                .queue_submit(queue, &[submit_info.build()], vk::Fence::null())
                .map_err(failed("submit queue"))?;
            self.device.queue_wait_idle(queue).map_err(VulkanError::Api)
        }
    }
}
