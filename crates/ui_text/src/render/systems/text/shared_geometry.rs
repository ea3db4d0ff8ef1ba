//! Shared glyph quad geometry
//!
//! One vertex buffer per font resource holds a quad for every glyph in the
//! atlas, so drawing a glyph is just selecting a 4-vertex window of it.
//!
//! # Quad layout
//!
//! Each quad spans local coordinates (-1,-1)..(1,1) (y-up) and is emitted
//! as a triangle strip in the order **bottom-left, top-left, bottom-right,
//! top-right**. Atlas V grows downward, so the top edge samples
//! `uv_top_left.y`.

use ash::vk;

use super::atlas_packer::UvRect;
use super::font_resource::GlyphInfo;

/// Vertex of a glyph quad: unit-quad position plus baked atlas UV
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphVertex {
    /// Position in the normalized quad
    pub position: [f32; 2],
    /// Atlas texture coordinate
    pub uv: [f32; 2],
}

unsafe impl bytemuck::Pod for GlyphVertex {}
unsafe impl bytemuck::Zeroable for GlyphVertex {}

impl GlyphVertex {
    /// Vulkan vertex input binding description for glyph vertices
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Vulkan vertex input attribute descriptions (position, uv)
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32_SFLOAT,
                offset: 8, // after position
            },
        ]
    }
}

/// Topology the shared quads are laid out for
pub const GLYPH_TOPOLOGY: vk::PrimitiveTopology = vk::PrimitiveTopology::TRIANGLE_STRIP;

/// Builds the per-font quad buffer
pub struct SharedGeometryBuilder;

impl SharedGeometryBuilder {
    /// One quad per UV rect, in input order
    ///
    /// The vertex at `4 * i + k` belongs to glyph `i`.
    pub fn build(uv_rects: &[UvRect]) -> Vec<GlyphVertex> {
        let mut vertices = Vec::with_capacity(uv_rects.len() * GlyphInfo::VERTICES_PER_GLYPH as usize);

        for rect in uv_rects {
            let (u0, v0) = (rect.top_left.x, rect.top_left.y);
            let (u1, v1) = (rect.bottom_right.x, rect.bottom_right.y);

            vertices.extend_from_slice(&[
                // Bottom-left
                GlyphVertex { position: [-1.0, -1.0], uv: [u0, v1] },
                // Top-left
                GlyphVertex { position: [-1.0, 1.0], uv: [u0, v0] },
                // Bottom-right
                GlyphVertex { position: [1.0, -1.0], uv: [u1, v1] },
                // Top-right
                GlyphVertex { position: [1.0, 1.0], uv: [u1, v0] },
            ]);
        }

        vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    fn rect(u0: f32, v0: f32, u1: f32, v1: f32) -> UvRect {
        UvRect { top_left: Vec2::new(u0, v0), bottom_right: Vec2::new(u1, v1) }
    }

    #[test]
    fn four_vertices_per_glyph() {
        let rects = [rect(0.0, 0.0, 0.1, 0.1), rect(0.2, 0.0, 0.3, 0.1), rect(0.0, 0.5, 0.1, 0.6)];
        assert_eq!(SharedGeometryBuilder::build(&rects).len(), 12);
        assert!(SharedGeometryBuilder::build(&[]).is_empty());
    }

    #[test]
    fn quad_corners_follow_strip_order() {
        let vertices = SharedGeometryBuilder::build(&[rect(0.25, 0.5, 0.75, 1.0)]);
        assert_eq!(vertices[0], GlyphVertex { position: [-1.0, -1.0], uv: [0.25, 1.0] });
        assert_eq!(vertices[1], GlyphVertex { position: [-1.0, 1.0], uv: [0.25, 0.5] });
        assert_eq!(vertices[2], GlyphVertex { position: [1.0, -1.0], uv: [0.75, 1.0] });
        assert_eq!(vertices[3], GlyphVertex { position: [1.0, 1.0], uv: [0.75, 0.5] });
    }

    #[test]
    fn glyph_window_addresses_its_own_uvs() {
        let rects = [rect(0.0, 0.0, 0.1, 0.1), rect(0.4, 0.4, 0.5, 0.5)];
        let vertices = SharedGeometryBuilder::build(&rects);
        let window = &vertices[4..8];
        assert!(window.iter().all(|v| v.uv[0] >= 0.4 && v.uv[1] >= 0.4));
    }

    #[test]
    fn vertex_layout_matches_shader_inputs() {
        assert_eq!(std::mem::size_of::<GlyphVertex>(), 16);
        assert_eq!(GlyphVertex::binding_description().stride, 16);
        let attributes = GlyphVertex::attribute_descriptions();
        assert_eq!(attributes[1].offset, 8);
        assert_eq!(attributes[1].location, 1);
    }
}
