//! Glyph positioning
//!
//! Turns a string into one transform per glyph. Each glyph's quad in the
//! shared geometry spans (-1, -1)..(1, 1); its local transform scales and
//! moves that unit quad onto the glyph's box in text space.
//!
//! # Layout Coordinate System
//!
//! - Origin (0, 0) is on the baseline at the pen start of the first character
//! - +X axis points right
//! - +Y axis points up
//!
//! The element's anchor picks a point of the text block (width = summed
//! advances, height = line height, top = ascender) that lands on the
//! element position.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::font_resource::{FontMetrics, GlyphInfo};
use crate::foundation::math::{translate_scale_2d, Mat4, Vec2};

/// Anchor point for positioning a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anchor {
    /// Top-left corner
    #[default]
    TopLeft,
    /// Top-center
    TopCenter,
    /// Top-right corner
    TopRight,
    /// Middle-left
    MiddleLeft,
    /// Center of the block
    Center,
    /// Middle-right
    MiddleRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-center
    BottomCenter,
    /// Bottom-right corner
    BottomRight,
}

impl Anchor {
    /// Get the normalized anchor position (0.0 to 1.0), y measured downward
    pub fn to_normalized(&self) -> (f32, f32) {
        match self {
            Anchor::TopLeft => (0.0, 0.0),
            Anchor::TopCenter => (0.5, 0.0),
            Anchor::TopRight => (1.0, 0.0),
            Anchor::MiddleLeft => (0.0, 0.5),
            Anchor::Center => (0.5, 0.5),
            Anchor::MiddleRight => (1.0, 0.5),
            Anchor::BottomLeft => (0.0, 1.0),
            Anchor::BottomCenter => (0.5, 1.0),
            Anchor::BottomRight => (1.0, 1.0),
        }
    }
}

/// Placement of a text element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementTransform {
    /// Where the anchor point lands
    pub position: Vec2,
    /// Which point of the text block is placed at `position`
    pub anchor: Anchor,
    /// Scale applied around the anchor point
    pub scale: Vec2,
}

impl Default for ElementTransform {
    fn default() -> Self {
        Self { position: Vec2::zeros(), anchor: Anchor::TopLeft, scale: Vec2::new(1.0, 1.0) }
    }
}

/// Measured extent of a single line of text
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    /// Sum of glyph advances
    pub width: f32,
    /// Font line height
    pub height: f32,
}

/// Position of one glyph within a laid out string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    /// Character being placed
    pub ch: char,
    /// Glyph table entry for `ch`
    pub glyph: GlyphInfo,
    /// Pen position before this glyph
    pub cumulative_advance: f32,
    /// Unit quad to glyph box, in text space
    pub local_transform: Mat4,
    /// Unit quad to glyph box, in element space
    pub world_transform: Mat4,
}

/// Stateless glyph layout
pub struct GlyphLayoutEngine;

impl GlyphLayoutEngine {
    /// Lazily compute one placement per character present in `glyph_table`
    ///
    /// Characters missing from the table are skipped and do not advance the pen.
    pub fn compute_glyph_transforms<'a>(
        text: &'a str,
        glyph_table: &'a HashMap<char, GlyphInfo>,
        metrics: &FontMetrics,
        element: &ElementTransform,
    ) -> impl Iterator<Item = GlyphPlacement> + 'a {
        let size = Self::measure(text, glyph_table, metrics);
        let element_matrix = Self::element_matrix(element, size, metrics);

        text.chars()
            .scan(0.0f32, move |pen, ch| {
                let Some(glyph) = glyph_table.get(&ch).copied() else {
                    return Some(None);
                };
                let cumulative_advance = *pen;
                *pen += glyph.advance;

                let local_transform = Self::glyph_local_transform(&glyph, cumulative_advance);
                Some(Some(GlyphPlacement {
                    ch,
                    glyph,
                    cumulative_advance,
                    local_transform,
                    world_transform: element_matrix * local_transform,
                }))
            })
            .flatten()
    }

    /// Width and height of `text` laid out on one line
    pub fn measure(text: &str, glyph_table: &HashMap<char, GlyphInfo>, metrics: &FontMetrics) -> TextSize {
        let width = text
            .chars()
            .filter_map(|ch| glyph_table.get(&ch))
            .map(|glyph| glyph.advance)
            .sum();
        TextSize { width, height: metrics.line_height }
    }

    /// Text-space point selected by `anchor`
    pub fn anchor_point(anchor: Anchor, size: TextSize, metrics: &FontMetrics) -> Vec2 {
        let (ax, ay) = anchor.to_normalized();
        Vec2::new(ax * size.width, metrics.ascender - ay * size.height)
    }

    /// Text space to element space: anchor point to origin, scale, then move to position
    pub fn element_matrix(element: &ElementTransform, size: TextSize, metrics: &FontMetrics) -> Mat4 {
        let anchor = Self::anchor_point(element.anchor, size, metrics);
        translate_scale_2d(element.position, element.scale) * translate_scale_2d(-anchor, Vec2::new(1.0, 1.0))
    }

    /// Unit quad to the glyph's box with the pen at `cumulative_advance`
    pub fn glyph_local_transform(glyph: &GlyphInfo, cumulative_advance: f32) -> Mat4 {
        let half = Vec2::new(glyph.width * 0.5, glyph.height * 0.5);
        let center = Vec2::new(
            cumulative_advance + glyph.bearing_x + half.x,
            glyph.bearing_y - half.y,
        );
        translate_scale_2d(center, half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const METRICS: FontMetrics = FontMetrics { ascender: 12.0, descender: -4.0, line_height: 20.0, raster_scale: 1.0 };

    fn glyph(index: u32, width: f32, height: f32, bearing_x: f32, advance: f32) -> GlyphInfo {
        GlyphInfo {
            glyph_index: index,
            uv_top_left: Vec2::zeros(),
            uv_bottom_right: Vec2::new(0.1, 0.1),
            width,
            height,
            bearing_x,
            bearing_y: height,
            advance,
        }
    }

    fn hi_table() -> HashMap<char, GlyphInfo> {
        HashMap::from([
            ('H', glyph(0, 8.0, 12.0, 1.0, 10.0)),
            ('i', glyph(1, 2.0, 10.0, 0.0, 4.0)),
            (' ', glyph(2, 0.0, 0.0, 0.0, 5.0)),
        ])
    }

    fn corner(m: &Mat4, x: f32, y: f32) -> (f32, f32) {
        let p = m.transform_point(&Point3::new(x, y, 0.0));
        (p.x, p.y)
    }

    #[test]
    fn cumulative_advance_sums_previous_glyphs() {
        let table = hi_table();
        let placements: Vec<_> =
            GlyphLayoutEngine::compute_glyph_transforms("Hi", &table, &METRICS, &ElementTransform::default())
                .collect();

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].ch, 'H');
        assert_relative_eq!(placements[0].cumulative_advance, 0.0);
        assert_relative_eq!(placements[1].cumulative_advance, 10.0);
    }

    #[test]
    fn local_transform_covers_glyph_box() {
        let table = hi_table();
        let placements: Vec<_> =
            GlyphLayoutEngine::compute_glyph_transforms("Hi", &table, &METRICS, &ElementTransform::default())
                .collect();

        // H: left = 0 + 1, right = 9, top = 12, bottom = 0
        let (l, b) = corner(&placements[0].local_transform, -1.0, -1.0);
        let (r, t) = corner(&placements[0].local_transform, 1.0, 1.0);
        assert_relative_eq!(l, 1.0);
        assert_relative_eq!(r, 9.0);
        assert_relative_eq!(t, 12.0);
        assert_relative_eq!(b, 0.0);

        // i starts at pen 10 with no bearing
        let (l, _) = corner(&placements[1].local_transform, -1.0, -1.0);
        let (r, t) = corner(&placements[1].local_transform, 1.0, 1.0);
        assert_relative_eq!(l, 10.0);
        assert_relative_eq!(r, 12.0);
        assert_relative_eq!(t, 10.0);
    }

    #[test]
    fn unknown_characters_are_skipped_without_advance() {
        let table = hi_table();
        let placements: Vec<_> =
            GlyphLayoutEngine::compute_glyph_transforms("H\u{e9}i", &table, &METRICS, &ElementTransform::default())
                .collect();
        assert_eq!(placements.iter().map(|p| p.ch).collect::<String>(), "Hi");
        assert_relative_eq!(placements[1].cumulative_advance, 10.0);
    }

    #[test]
    fn whitespace_advances_and_is_placed() {
        let table = hi_table();
        let placements: Vec<_> =
            GlyphLayoutEngine::compute_glyph_transforms("H i", &table, &METRICS, &ElementTransform::default())
                .collect();
        assert_eq!(placements.len(), 3);
        assert!(placements[1].glyph.is_blank());
        assert_relative_eq!(placements[2].cumulative_advance, 15.0);
    }

    #[test]
    fn empty_text_yields_nothing() {
        let table = hi_table();
        let count =
            GlyphLayoutEngine::compute_glyph_transforms("", &table, &METRICS, &ElementTransform::default()).count();
        assert_eq!(count, 0);
    }

    #[test]
    fn measure_sums_advances() {
        let size = GlyphLayoutEngine::measure("Hi H", &hi_table(), &METRICS);
        assert_relative_eq!(size.width, 29.0);
        assert_relative_eq!(size.height, 20.0);
    }

    #[test]
    fn top_left_anchor_puts_block_top_at_position() {
        let table = hi_table();
        let element = ElementTransform { position: Vec2::new(100.0, 50.0), ..ElementTransform::default() };
        let h = GlyphLayoutEngine::compute_glyph_transforms("Hi", &table, &METRICS, &element)
            .next()
            .unwrap();

        // Top of H sits at the ascender, which is the block top
        let (l, t) = corner(&h.world_transform, -1.0, 1.0);
        assert_relative_eq!(l, 101.0);
        assert_relative_eq!(t, 50.0);
    }

    #[test]
    fn anchor_points_span_the_block() {
        let size = TextSize { width: 14.0, height: 20.0 };
        let center = GlyphLayoutEngine::anchor_point(Anchor::Center, size, &METRICS);
        assert_relative_eq!(center.x, 7.0);
        assert_relative_eq!(center.y, 2.0);

        let bottom_right = GlyphLayoutEngine::anchor_point(Anchor::BottomRight, size, &METRICS);
        assert_relative_eq!(bottom_right.x, 14.0);
        assert_relative_eq!(bottom_right.y, -8.0);
    }

    #[test]
    fn scale_applies_around_anchor() {
        let table = hi_table();
        let element = ElementTransform {
            position: Vec2::new(10.0, 10.0),
            anchor: Anchor::BottomLeft,
            scale: Vec2::new(2.0, 2.0),
        };
        let i = GlyphLayoutEngine::compute_glyph_transforms("Hi", &table, &METRICS, &element)
            .nth(1)
            .unwrap();

        // i's left edge is 10 units right of the anchor, doubled
        let (l, b) = corner(&i.world_transform, -1.0, -1.0);
        assert_relative_eq!(l, 30.0);
        // baseline is 8 units above the block bottom, doubled
        assert_relative_eq!(b, 26.0);
    }
}
