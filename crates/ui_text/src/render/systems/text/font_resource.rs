//! Cached GPU-resident font data
//!
//! A [`FontResource`] is built once by the font cache and is read-only from
//! then on, so any number of renderables can read it without locking.

use std::collections::HashMap;

use super::error::{FontError, FontResult};
use super::font_definition::FontKey;
use crate::foundation::math::Vec2;
use crate::render::api::{GeometryHandle, TextureHandle};

/// Information about a single glyph in the atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphInfo {
    /// Dense index; the glyph's quad starts at vertex `glyph_index * 4`
    pub glyph_index: u32,
    /// UV coordinates in atlas texture (normalized 0.0-1.0) - top-left corner
    pub uv_top_left: Vec2,
    /// UV coordinates in atlas texture (normalized 0.0-1.0) - bottom-right corner
    pub uv_bottom_right: Vec2,
    /// Bitmap width in pixels
    pub width: f32,
    /// Bitmap height in pixels
    pub height: f32,
    /// Offset from pen position to the bitmap's left edge
    pub bearing_x: f32,
    /// Offset from baseline up to the bitmap's top edge (negative below the baseline)
    pub bearing_y: f32,
    /// Horizontal advance for cursor positioning
    pub advance: f32,
}

impl GlyphInfo {
    /// Vertices per glyph quad in the shared geometry
    pub const VERTICES_PER_GLYPH: u32 = 4;

    /// First vertex of this glyph's quad in the shared geometry
    pub const fn first_vertex(&self) -> u32 {
        self.glyph_index * Self::VERTICES_PER_GLYPH
    }

    /// Whether the glyph has no visible pixels (space, missing glyphs)
    pub fn is_blank(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Font-wide measurements at the rasterized size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Distance from baseline to the top of the tallest glyphs (positive)
    pub ascender: f32,
    /// Distance from baseline to the bottom of descenders (negative)
    pub descender: f32,
    /// Distance between consecutive baselines (positive)
    pub line_height: f32,
    /// Pixels per font design unit (positive)
    pub raster_scale: f32,
}

impl FontMetrics {
    /// Metrics estimated from the font size alone
    pub fn estimated(size: f32, line_height_factor: f32, raster_scale: f32) -> Self {
        Self {
            ascender: size * 0.8,
            descender: -size * 0.2,
            line_height: size * line_height_factor,
            raster_scale,
        }
    }
}

/// Atlas texture, shared quad geometry and glyph table for one font definition
#[derive(Debug)]
pub struct FontResource {
    key: FontKey,
    name: String,
    geometry_name: String,
    atlas_texture: TextureHandle,
    atlas_size: (u32, u32),
    shared_geometry: GeometryHandle,
    glyph_table: HashMap<char, GlyphInfo>,
    metrics: FontMetrics,
}

impl FontResource {
    pub(crate) fn new(
        key: FontKey,
        geometry_name: String,
        atlas_texture: TextureHandle,
        atlas_size: (u32, u32),
        shared_geometry: GeometryHandle,
        glyph_table: HashMap<char, GlyphInfo>,
        metrics: FontMetrics,
    ) -> Self {
        Self {
            name: key.to_string(),
            key,
            geometry_name,
            atlas_texture,
            atlas_size,
            shared_geometry,
            glyph_table,
            metrics,
        }
    }

    /// Cache key this resource was created for
    pub fn key(&self) -> &FontKey {
        &self.key
    }

    /// Printable cache key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name the shared geometry is registered under
    ///
    /// Includes the atlas layout, since the baked UVs depend on it.
    pub fn geometry_name(&self) -> &str {
        &self.geometry_name
    }

    /// Single-channel atlas texture
    pub fn atlas_texture(&self) -> TextureHandle {
        self.atlas_texture
    }

    /// Atlas dimensions in pixels
    pub fn atlas_size(&self) -> (u32, u32) {
        self.atlas_size
    }

    /// Shared vertex buffer with one quad per glyph
    pub fn shared_geometry(&self) -> GeometryHandle {
        self.shared_geometry
    }

    /// Glyph lookup table
    pub fn glyph_table(&self) -> &HashMap<char, GlyphInfo> {
        &self.glyph_table
    }

    /// Number of glyphs (and quads) in this resource
    pub fn glyph_count(&self) -> usize {
        self.glyph_table.len()
    }

    /// Get glyph information for a character
    pub fn glyph(&self, ch: char) -> FontResult<&GlyphInfo> {
        self.glyph_table.get(&ch).ok_or(FontError::GlyphNotFound(ch))
    }

    /// Font-wide metrics
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }
}
