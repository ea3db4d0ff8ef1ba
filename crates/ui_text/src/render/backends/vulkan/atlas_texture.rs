//! Single-level sampled images for glyph atlases

use std::sync::Arc;

use ash::vk;

use super::error::{failed, VulkanResult};
use super::upload::UploadContext;

const COLOR_SUBRESOURCE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

/// Device-local image with a view, uploaded once through a staging buffer
pub struct AtlasTexture {
    device: Arc<ash::Device>,
    image: vk::Image,
    image_view: vk::ImageView,
    memory: vk::DeviceMemory,
}

impl AtlasTexture {
    /// Create the image and upload `pixels` (tightly packed rows of `format`)
    pub fn upload(context: &UploadContext, pixels: &[u8], extent: vk::Extent2D, format: vk::Format) -> VulkanResult<Self> {
        let device = Arc::clone(context.device());

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe { device.create_image(&image_create_info, None).map_err(failed("create image"))? };

        // From here on, partially built state is cleaned up by Drop
        let mut texture = Self {
            device,
            image,
            image_view: vk::ImageView::null(),
            memory: vk::DeviceMemory::null(),
        };

        let requirements = unsafe { texture.device.get_image_memory_requirements(image) };
        let memory_type = context.find_memory_type(requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        texture.memory = context.allocate(requirements.size, memory_type)?;
        unsafe {
            texture
                .device
                .bind_image_memory(image, texture.memory, 0)
                .map_err(failed("bind image memory"))?;
        }

        Self::copy_from_staging(context, image, extent, pixels)?;

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(COLOR_SUBRESOURCE);
        texture.image_view = unsafe {
            texture
                .device
                .create_image_view(&view_info, None)
                .map_err(failed("create image view"))?
        };

        log::debug!("Uploaded {}x{} {:?} atlas image", extent.width, extent.height, format);
        Ok(texture)
    }

    fn copy_from_staging(context: &UploadContext, image: vk::Image, extent: vk::Extent2D, pixels: &[u8]) -> VulkanResult<()> {
        let (staging_buffer, staging_memory) = context.create_buffer(
            pixels.len() as vk::DeviceSize,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let result = context.write_mapped(staging_memory, pixels).and_then(|()| {
            context.submit_one_time(|device, command_buffer| unsafe {
                Self::record_copy(device, command_buffer, staging_buffer, image, extent);
            })
        });

        unsafe {
            context.device().destroy_buffer(staging_buffer, None);
            context.device().free_memory(staging_memory, None);
        }
        result
    }

    /// UNDEFINED -> TRANSFER_DST, copy, TRANSFER_DST -> SHADER_READ_ONLY
    unsafe fn record_copy(
        device: &ash::Device,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        image: vk::Image,
        extent: vk::Extent2D,
    ) {
        let to_transfer = vk::ImageMemoryBarrier::builder()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(COLOR_SUBRESOURCE)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_transfer.build()],
        );

        let region = vk::BufferImageCopy::builder()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 });
        device.cmd_copy_buffer_to_image(
            command_buffer,
            buffer,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region.build()],
        );

        let to_shader = vk::ImageMemoryBarrier::builder()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(COLOR_SUBRESOURCE)
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_shader.build()],
        );
    }

    /// Image view for descriptor writes
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }
}

impl Drop for AtlasTexture {
    fn drop(&mut self) {
        unsafe {
            if self.image_view != vk::ImageView::null() {
                self.device.destroy_image_view(self.image_view, None);
            }
            self.device.destroy_image(self.image, None);
            if self.memory != vk::DeviceMemory::null() {
                self.device.free_memory(self.memory, None);
            }
        }
    }
}
