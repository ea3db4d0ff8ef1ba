//! Deterministic rasterizer and fixtures for text tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::{FontError, FontResult};
use super::font_definition::{CharacterRange, FontDefinition};
use super::font_resource::FontMetrics;
use super::glyph_rasterizer::{GlyphRasterizer, RasterizedFont, RasterizedGlyph};
use crate::assets::FontSource;

/// Bytes the fixed rasterizer accepts as a "font"
pub const TEST_FONT_BYTES: &[u8] = b"ui_text test font";

/// Rasterizer producing synthetic glyphs without a real font file
///
/// Space is blank; every other character gets a solid box whose size depends
/// on the codepoint. Individual glyphs can be overridden.
#[derive(Default)]
pub struct FixedRasterizer {
    overrides: HashMap<char, RasterizedGlyph>,
    calls: Arc<AtomicUsize>,
}

impl FixedRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glyph(mut self, ch: char, width: usize, height: usize, bearing_x: f32, advance: f32) -> Self {
        self.overrides.insert(
            ch,
            RasterizedGlyph {
                ch,
                width,
                height,
                bitmap: vec![255; width * height],
                bearing_x,
                bearing_y: height as f32,
                advance,
            },
        );
        self
    }

    /// Counter of `rasterize_font` calls, shared with the rasterizer
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn metrics(size: f32) -> FontMetrics {
        FontMetrics { ascender: size * 0.75, descender: -size * 0.25, line_height: size * 1.25, raster_scale: 1.0 }
    }

    fn glyph(&self, ch: char) -> RasterizedGlyph {
        if let Some(glyph) = self.overrides.get(&ch) {
            return glyph.clone();
        }
        if ch == ' ' {
            return RasterizedGlyph::placeholder(ch, 4.0);
        }
        let width = 3 + (ch as usize % 4);
        let height = 5 + (ch as usize % 3);
        RasterizedGlyph {
            ch,
            width,
            height,
            bitmap: vec![ch as u8; width * height],
            bearing_x: 1.0,
            bearing_y: height as f32,
            advance: width as f32 + 2.0,
        }
    }
}

impl GlyphRasterizer for FixedRasterizer {
    fn rasterize_font(
        &self,
        font_data: &[u8],
        size_in_points: f32,
        range: CharacterRange,
    ) -> FontResult<RasterizedFont> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if font_data != TEST_FONT_BYTES {
            return Err(FontError::Parse("not a test font".to_string()));
        }
        Ok(RasterizedFont {
            metrics: Self::metrics(size_in_points),
            glyphs: range.chars().map(|ch| self.glyph(ch)).collect(),
        })
    }
}

pub fn test_source(name: &str) -> FontSource {
    FontSource::memory(name, TEST_FONT_BYTES.to_vec())
}

pub fn test_font(name: &str, size: f32) -> FontDefinition {
    FontDefinition::new(test_source(name), size).unwrap()
}
