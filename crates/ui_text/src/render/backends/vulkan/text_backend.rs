//! Vulkan implementation of the text GPU services
//!
//! Owns the glyph descriptor set layout, a descriptor pool, one sampler per
//! [`SamplerMode`] and every atlas image and vertex buffer created through
//! it. The host renderer creates the glyph pipeline from
//! [`VulkanTextBackend::create_pipeline_layout`] and records emitted draws
//! with [`VulkanTextBackend::record_draws`].

use std::sync::{Arc, Mutex, PoisonError};

use ash::vk;

use super::atlas_texture::AtlasTexture;
use super::error::{failed, VulkanError, VulkanResult};
use super::upload::UploadContext;
use super::vertex_buffer::VertexBuffer;
use crate::foundation::collections::{key_to_raw, raw_to_key, HandleMap};
use crate::render::api::{
    BufferHandle, DescriptorService, DescriptorSetHandle, GeometryDefinition, GeometryHandle,
    GeometryRegistry, GeometryService, GraphicsError, GraphicsResult, SamplerMode, TextureFormat,
    TextureHandle, TextureService,
};
use crate::render::commands::{DrawCommand, GlyphPushConstants};

/// Stages reading the glyph push constants
pub const PUSH_CONSTANT_STAGES: vk::ShaderStageFlags =
    vk::ShaderStageFlags::from_raw(vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw());

/// Text GPU services backed by an ash device
pub struct VulkanTextBackend {
    context: UploadContext,
    set_layout: vk::DescriptorSetLayout,
    descriptor_pool: vk::DescriptorPool,
    nearest_sampler: vk::Sampler,
    linear_sampler: vk::Sampler,
    textures: Mutex<HandleMap<AtlasTexture>>,
    buffers: Mutex<HandleMap<VertexBuffer>>,
    descriptor_sets: Mutex<HandleMap<vk::DescriptorSet>>,
    geometry: GeometryRegistry,
}

impl VulkanTextBackend {
    /// Create the backend's layout, pool and samplers
    ///
    /// `max_descriptor_sets` bounds the number of simultaneously active text
    /// renderables.
    pub fn new(
        device: Arc<ash::Device>,
        instance: Arc<ash::Instance>,
        physical_device: vk::PhysicalDevice,
        command_pool: vk::CommandPool,
        queue: vk::Queue,
        max_descriptor_sets: u32,
    ) -> VulkanResult<Self> {
        let context = UploadContext::new(device, instance, physical_device, command_pool, queue);
        let device = Arc::clone(context.device());

        let bindings = [vk::DescriptorSetLayoutBinding::builder()
            .binding(crate::render::systems::text::ATLAS_BINDING)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT)
            .build()];
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);
        let set_layout = unsafe {
            device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(failed("create descriptor set layout"))?
        };

        let pool_sizes = [vk::DescriptorPoolSize::builder()
            .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(max_descriptor_sets)
            .build()];
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(max_descriptor_sets)
            .pool_sizes(&pool_sizes);
        let descriptor_pool = match unsafe { device.create_descriptor_pool(&pool_info, None) } {
            Ok(pool) => pool,
            Err(e) => {
                unsafe { device.destroy_descriptor_set_layout(set_layout, None) };
                return Err(VulkanError::Api(e));
            }
        };

        let samplers = Self::create_sampler(&device, SamplerMode::Nearest)
            .and_then(|nearest| match Self::create_sampler(&device, SamplerMode::Linear) {
                Ok(linear) => Ok((nearest, linear)),
                Err(e) => {
                    unsafe { device.destroy_sampler(nearest, None) };
                    Err(e)
                }
            });
        let (nearest_sampler, linear_sampler) = match samplers {
            Ok(samplers) => samplers,
            Err(e) => {
                unsafe {
                    device.destroy_descriptor_pool(descriptor_pool, None);
                    device.destroy_descriptor_set_layout(set_layout, None);
                }
                return Err(e);
            }
        };

        log::info!("Vulkan text backend ready ({} descriptor sets)", max_descriptor_sets);
        Ok(Self {
            context,
            set_layout,
            descriptor_pool,
            nearest_sampler,
            linear_sampler,
            textures: Mutex::new(HandleMap::new()),
            buffers: Mutex::new(HandleMap::new()),
            descriptor_sets: Mutex::new(HandleMap::new()),
            geometry: GeometryRegistry::new(),
        })
    }

    fn create_sampler(device: &ash::Device, mode: SamplerMode) -> VulkanResult<vk::Sampler> {
        let filter = mode.to_vk();
        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(filter)
            .min_filter(filter)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .min_lod(0.0)
            .max_lod(0.0);
        unsafe { device.create_sampler(&sampler_info, None).map_err(failed("create sampler")) }
    }

    fn sampler(&self, mode: SamplerMode) -> vk::Sampler {
        match mode {
            SamplerMode::Nearest => self.nearest_sampler,
            SamplerMode::Linear => self.linear_sampler,
        }
    }

    /// Layout of descriptor set 0 in the glyph pipeline
    pub fn descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.set_layout
    }

    /// Push constant range matching [`GlyphPushConstants`]
    pub fn push_constant_range() -> vk::PushConstantRange {
        vk::PushConstantRange::builder()
            .stage_flags(PUSH_CONSTANT_STAGES)
            .offset(0)
            .size(std::mem::size_of::<GlyphPushConstants>() as u32)
            .build()
    }

    /// Pipeline layout for the glyph shaders; the caller owns the result
    pub fn create_pipeline_layout(&self) -> VulkanResult<vk::PipelineLayout> {
        let set_layouts = [self.set_layout];
        let push_constant_ranges = [Self::push_constant_range()];
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);
        unsafe {
            self.context
                .device()
                .create_pipeline_layout(&layout_info, None)
                .map_err(failed("create pipeline layout"))
        }
    }

    /// Vulkan descriptor set behind a handle
    pub fn raw_descriptor_set(&self, set: DescriptorSetHandle) -> Option<vk::DescriptorSet> {
        let sets = self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner);
        sets.get(raw_to_key(set.0)).copied()
    }

    /// Vulkan buffer behind a handle
    pub fn raw_vertex_buffer(&self, buffer: BufferHandle) -> Option<vk::Buffer> {
        let buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.get(raw_to_key(buffer.0)).map(VertexBuffer::buffer)
    }

    /// Record glyph draws into `command_buffer`
    ///
    /// The glyph pipeline must already be bound. Vertex buffer and
    /// descriptor set binds are skipped when unchanged from the previous
    /// command; commands with unknown handles are dropped.
    ///
    /// # Safety
    ///
    /// `command_buffer` must be in the recording state inside a render pass
    /// compatible with the bound pipeline, and `pipeline_layout` must be the
    /// layout of that pipeline.
    pub unsafe fn record_draws<I>(
        &self,
        command_buffer: vk::CommandBuffer,
        pipeline_layout: vk::PipelineLayout,
        commands: I,
    ) -> usize
    where
        I: IntoIterator<Item = DrawCommand>,
    {
        let device = self.context.device();
        let mut bound_buffer = None;
        let mut bound_set = None;
        let mut recorded = 0;

        for command in commands {
            let (Some(buffer), Some(set)) = (
                self.raw_vertex_buffer(command.vertex_buffer),
                self.raw_descriptor_set(command.descriptor_set),
            ) else {
                log::warn!("Skipping draw with stale handles {:?}", command.vertex_buffer);
                continue;
            };

            if bound_buffer != Some(buffer) {
                device.cmd_bind_vertex_buffers(command_buffer, 0, &[buffer], &[0]);
                bound_buffer = Some(buffer);
            }
            if bound_set != Some(set) {
                device.cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    pipeline_layout,
                    0,
                    &[set],
                    &[],
                );
                bound_set = Some(set);
            }

            device.cmd_push_constants(
                command_buffer,
                pipeline_layout,
                PUSH_CONSTANT_STAGES,
                0,
                command.push_constants.as_bytes(),
            );
            device.cmd_draw(command_buffer, command.vertex_count, 1, command.first_vertex, 0);
            recorded += 1;
        }
        recorded
    }

    fn destroy_buffer(&self, handle: BufferHandle) {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.remove(raw_to_key(handle.0));
    }
}

impl TextureService for VulkanTextBackend {
    fn create_texture(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> GraphicsResult<TextureHandle> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if pixels.len() != expected || expected == 0 {
            return Err(GraphicsError::InvalidTextureData { expected, actual: pixels.len() });
        }

        let texture = AtlasTexture::upload(&self.context, pixels, vk::Extent2D { width, height }, format.to_vk())
            .map_err(|e| GraphicsError::TextureCreation(e.to_string()))?;

        let mut textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(TextureHandle(key_to_raw(textures.insert(texture))))
    }

    fn destroy_texture(&self, handle: TextureHandle) {
        let mut textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        if textures.remove(raw_to_key(handle.0)).is_none() {
            log::debug!("Destroy of unknown texture {:#x} ignored", handle.0);
        }
    }
}

impl GeometryService for VulkanTextBackend {
    fn get_or_create_geometry(&self, definition: &GeometryDefinition) -> GraphicsResult<GeometryHandle> {
        self.geometry.acquire(definition, |def| {
            let buffer = VertexBuffer::new(&self.context, &def.vertex_data)
                .map_err(|e| GraphicsError::BufferUpload(e.to_string()))?;
            let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(BufferHandle(key_to_raw(buffers.insert(buffer))))
        })
    }

    fn release_geometry(&self, name: &str) {
        self.geometry.release(name, |buffer| self.destroy_buffer(buffer));
    }
}

impl DescriptorService for VulkanTextBackend {
    fn allocate_descriptor_set(&self) -> GraphicsResult<DescriptorSetHandle> {
        let set_layouts = [self.set_layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.descriptor_pool)
            .set_layouts(&set_layouts);

        let mut sets = self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner);
        let allocated = unsafe { self.context.device().allocate_descriptor_sets(&alloc_info) }
            .map_err(|e| GraphicsError::DescriptorAllocation(VulkanError::Api(e).to_string()))?;
        let set = allocated
            .first()
            .copied()
            .ok_or_else(|| GraphicsError::DescriptorAllocation("driver returned no set".to_string()))?;
        Ok(DescriptorSetHandle(key_to_raw(sets.insert(set))))
    }

    fn update_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        texture: TextureHandle,
        sampler: SamplerMode,
        binding: u32,
    ) -> GraphicsResult<()> {
        let raw_set = self
            .raw_descriptor_set(set)
            .ok_or(GraphicsError::UnknownHandle { kind: "descriptor set", raw: set.0 })?;

        let textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        let atlas = textures
            .get(raw_to_key(texture.0))
            .ok_or(GraphicsError::UnknownHandle { kind: "texture", raw: texture.0 })?;

        let image_infos = [vk::DescriptorImageInfo::builder()
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_view(atlas.image_view())
            .sampler(self.sampler(sampler))
            .build()];
        let writes = [vk::WriteDescriptorSet::builder()
            .dst_set(raw_set)
            .dst_binding(binding)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos)
            .build()];
        unsafe { self.context.device().update_descriptor_sets(&writes, &[]) };
        Ok(())
    }

    fn free_descriptor_set(&self, set: DescriptorSetHandle) {
        let mut sets = self.descriptor_sets.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(raw_set) = sets.remove(raw_to_key(set.0)) else {
            log::debug!("Free of unknown descriptor set {:#x} ignored", set.0);
            return;
        };
        if let Err(e) = unsafe { self.context.device().free_descriptor_sets(self.descriptor_pool, &[raw_set]) } {
            log::warn!("Failed to free descriptor set: {:?}", e);
        }
    }
}

impl Drop for VulkanTextBackend {
    fn drop(&mut self) {
        let device = Arc::clone(self.context.device());
        unsafe {
            if let Err(e) = device.device_wait_idle() {
                log::warn!("device_wait_idle failed during text backend shutdown: {:?}", e);
            }
        }

        self.descriptor_sets.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
        self.textures.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
        self.buffers.get_mut().unwrap_or_else(PoisonError::into_inner).clear();

        unsafe {
            device.destroy_sampler(self.nearest_sampler, None);
            device.destroy_sampler(self.linear_sampler, None);
            device.destroy_descriptor_pool(self.descriptor_pool, None);
            device.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constant_range_covers_glyph_block() {
        let range = VulkanTextBackend::push_constant_range();
        assert_eq!(range.offset, 0);
        assert_eq!(range.size, 96);
        assert!(range.stage_flags.contains(vk::ShaderStageFlags::VERTEX));
        assert!(range.stage_flags.contains(vk::ShaderStageFlags::FRAGMENT));
    }
}
