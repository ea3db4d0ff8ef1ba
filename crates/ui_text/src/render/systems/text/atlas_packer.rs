//! Row-based (shelf) glyph packing
//!
//! Glyphs are placed left to right in the order supplied, wrapping to a new
//! row when the current one is full. The atlas never grows: running out of
//! rows is an [`FontError::AtlasOverflow`].

use std::path::Path;

use super::error::{FontError, FontResult};
use super::glyph_rasterizer::RasterizedGlyph;
use crate::foundation::math::Vec2;

/// Normalized atlas rectangle of one glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    /// Top-left corner (u, v)
    pub top_left: Vec2,
    /// Bottom-right corner (u, v)
    pub bottom_right: Vec2,
}

/// Packed single-channel atlas and per-glyph UVs
#[derive(Debug, Clone)]
pub struct PackedAtlas {
    /// Atlas width in pixels
    pub width: u32,
    /// Atlas height in pixels
    pub height: u32,
    /// Row-major 8-bit coverage, `width * height` bytes
    pub pixels: Vec<u8>,
    /// UV rectangle per input glyph, in input order
    pub uv_rects: Vec<UvRect>,
}

impl PackedAtlas {
    /// Write the atlas as an 8-bit grayscale PNG for inspection
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        image::save_buffer(path, &self.pixels, self.width, self.height, image::ColorType::L8)
    }
}

/// Shelf packer for a fixed-size atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasPacker {
    width: u32,
    height: u32,
    padding: u32,
}

impl AtlasPacker {
    /// Packer for a `width` x `height` atlas with `padding` pixels between glyphs
    pub const fn new(width: u32, height: u32, padding: u32) -> Self {
        Self { width, height, padding }
    }

    /// Atlas dimensions
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixels between glyphs and around the atlas border
    pub const fn padding(&self) -> u32 {
        self.padding
    }

    /// Pack `glyphs` in order, copying their bitmaps into a new atlas
    pub fn pack(&self, glyphs: &[RasterizedGlyph]) -> FontResult<PackedAtlas> {
        let atlas_width = self.width as usize;
        let atlas_height = self.height as usize;
        let padding = self.padding as usize;

        let mut pixels = vec![0u8; atlas_width * atlas_height];
        let mut uv_rects = Vec::with_capacity(glyphs.len());

        let mut cursor_x = padding;
        let mut cursor_y = padding;
        let mut row_height = 0usize;

        for glyph in glyphs {
            let (width, height) = (glyph.width, glyph.height);

            if cursor_x > padding && cursor_x + width + padding > atlas_width {
                cursor_x = padding;
                cursor_y += row_height + padding;
                row_height = 0;
            }

            // Trailing padding may fall off the atlas edge
            if cursor_x + width > atlas_width || cursor_y + height > atlas_height {
                return Err(FontError::AtlasOverflow {
                    glyph: glyph.ch,
                    atlas_width: self.width,
                    atlas_height: self.height,
                });
            }

            if width > 0 {
                for (row, src) in glyph.bitmap.chunks_exact(width).take(height).enumerate() {
                    let dst = (cursor_y + row) * atlas_width + cursor_x;
                    pixels[dst..dst + width].copy_from_slice(src);
                }
            }

            uv_rects.push(UvRect {
                top_left: Vec2::new(
                    cursor_x as f32 / atlas_width as f32,
                    cursor_y as f32 / atlas_height as f32,
                ),
                bottom_right: Vec2::new(
                    (cursor_x + width) as f32 / atlas_width as f32,
                    (cursor_y + height) as f32 / atlas_height as f32,
                ),
            });

            cursor_x += width + padding;
            row_height = row_height.max(height);
        }

        log::debug!(
            "Packed {} glyphs into {}x{} atlas ({} pixel rows used)",
            glyphs.len(),
            self.width,
            self.height,
            cursor_y + row_height
        );

        Ok(PackedAtlas {
            width: self.width,
            height: self.height,
            pixels,
            uv_rects,
        })
    }
}
