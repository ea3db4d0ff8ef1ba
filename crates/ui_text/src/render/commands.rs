//! Draw commands emitted by text renderables
//!
//! The renderer is a passive consumer: every command carries pre-computed
//! matrices and resource handles, so recording one is a push-constant write
//! plus a `vkCmdDraw`.

use ash::vk;
use bitflags::bitflags;

use crate::foundation::math::{to_cols_array, Mat4, Vec4};
use crate::render::api::{BufferHandle, DescriptorSetHandle, PipelineHandle};

bitflags! {
    /// Render passes a draw command participates in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderPassMask: u32 {
        /// Main scene pass
        const SCENE = 1 << 0;
        /// Screen-space UI overlay pass
        const UI_OVERLAY = 1 << 1;
        /// Off-screen pass (render-to-texture)
        const OFFSCREEN = 1 << 2;
    }
}

impl Default for RenderPassMask {
    fn default() -> Self {
        Self::UI_OVERLAY
    }
}

/// Push constant block for one glyph quad
///
/// Layout matches `GlyphPushConstants` in `text.vert` (96 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPushConstants {
    /// Column-major clip-space transform of the unit quad
    pub transform: [[f32; 4]; 4],
    /// RGBA tint multiplied with atlas coverage
    pub tint_color: [f32; 4],
    /// UV offset (xy) and scale (zw) applied to baked vertex UVs
    pub uv_rect: [f32; 4],
}

unsafe impl bytemuck::Pod for GlyphPushConstants {}
unsafe impl bytemuck::Zeroable for GlyphPushConstants {}

impl GlyphPushConstants {
    /// UV rect that leaves pre-baked vertex UVs untouched
    pub const IDENTITY_UV_RECT: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

    /// Opaque white tint
    pub const OPAQUE_WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    /// Push constants for a glyph with baked UVs
    pub fn new(transform: &Mat4, tint: Vec4) -> Self {
        Self {
            transform: to_cols_array(transform),
            tint_color: [tint.x, tint.y, tint.z, tint.w],
            uv_rect: Self::IDENTITY_UV_RECT,
        }
    }

    /// Raw bytes for `vkCmdPushConstants`
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// One GPU draw of a window of a shared vertex buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Pipeline to bind
    pub pipeline: PipelineHandle,
    /// Shared vertex buffer
    pub vertex_buffer: BufferHandle,
    /// First vertex of the window
    pub first_vertex: u32,
    /// Number of vertices drawn
    pub vertex_count: u32,
    /// Primitive topology of the window
    pub topology: vk::PrimitiveTopology,
    /// Per-draw constants
    pub push_constants: GlyphPushConstants,
    /// Descriptor set binding the atlas
    pub descriptor_set: DescriptorSetHandle,
    /// Passes this draw belongs to
    pub render_pass_mask: RenderPassMask,
    /// Sort priority within a pass (higher draws later)
    pub priority: i32,
}

/// Per-frame state supplied by the host renderer when collecting draws
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    /// Pipeline used for glyph quads
    pub pipeline: PipelineHandle,
    /// Projection applied on top of each glyph world transform
    pub view_projection: Mat4,
    /// Passes the emitted draws belong to
    pub render_pass_mask: RenderPassMask,
    /// Sort priority for the emitted draws
    pub priority: i32,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            pipeline: PipelineHandle::default(),
            view_projection: Mat4::identity(),
            render_pass_mask: RenderPassMask::default(),
            priority: 0,
        }
    }
}

impl RenderContext {
    /// Context for a UI overlay drawn in pixel units
    ///
    /// Text space is y-up with the origin at the bottom-left of the
    /// viewport; the projection maps it to Vulkan clip space (y-down).
    pub fn screen_space(pipeline: PipelineHandle, width: f32, height: f32) -> Self {
        let ortho = Mat4::new_orthographic(0.0, width, 0.0, height, -1.0, 1.0);
        let flip_y = Mat4::new_nonuniform_scaling(&crate::foundation::math::Vec3::new(1.0, -1.0, 1.0));
        Self {
            pipeline,
            view_projection: flip_y * ortho,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn push_constants_are_96_bytes() {
        assert_eq!(std::mem::size_of::<GlyphPushConstants>(), 96);
        let pc = GlyphPushConstants::new(&Mat4::identity(), Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(pc.as_bytes().len(), 96);
        assert_eq!(pc.uv_rect, GlyphPushConstants::IDENTITY_UV_RECT);
    }

    #[test]
    fn screen_space_maps_corners_to_vulkan_clip() {
        let ctx = RenderContext::screen_space(PipelineHandle(1), 800.0, 600.0);
        let bottom_left = ctx.view_projection.transform_point(&Point3::new(0.0, 0.0, 0.0));
        let top_right = ctx.view_projection.transform_point(&Point3::new(800.0, 600.0, 0.0));
        assert_relative_eq!(bottom_left.x, -1.0);
        assert_relative_eq!(bottom_left.y, 1.0);
        assert_relative_eq!(top_right.x, 1.0);
        assert_relative_eq!(top_right.y, -1.0);
    }

    #[test]
    fn default_mask_is_ui_overlay() {
        assert_eq!(RenderContext::default().render_pass_mask, RenderPassMask::UI_OVERLAY);
    }
}
