//! Glyph rasterization
//!
//! Turns TrueType/OpenType bytes into grayscale coverage bitmaps and metrics
//! using the `fontdue` library.

use fontdue::{Font, FontSettings, LineMetrics};

use super::error::{FontError, FontResult};
use super::font_definition::CharacterRange;
use super::font_resource::FontMetrics;

/// Line height as a multiple of the font size when the font has no
/// horizontal line metrics
const FALLBACK_LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Coverage bitmap and metrics for one character
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    /// Character this glyph represents
    pub ch: char,
    /// Bitmap width in pixels
    pub width: usize,
    /// Bitmap height in pixels
    pub height: usize,
    /// Row-major 8-bit coverage, `width * height` bytes
    pub bitmap: Vec<u8>,
    /// Offset from the pen position to the bitmap's left edge
    pub bearing_x: f32,
    /// Offset from the baseline up to the bitmap's top edge
    pub bearing_y: f32,
    /// Horizontal pen advance
    pub advance: f32,
}

impl RasterizedGlyph {
    /// Zero-size glyph that only advances the pen
    pub fn placeholder(ch: char, advance: f32) -> Self {
        Self {
            ch,
            width: 0,
            height: 0,
            bitmap: Vec::new(),
            bearing_x: 0.0,
            bearing_y: 0.0,
            advance: advance.max(0.0),
        }
    }

    /// Whether the glyph has visible pixels
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// All glyphs of a character range plus font-wide metrics
#[derive(Debug, Clone)]
pub struct RasterizedFont {
    /// Font-wide measurements at the rasterized size
    pub metrics: FontMetrics,
    /// Glyphs in character-range order
    pub glyphs: Vec<RasterizedGlyph>,
}

/// Source of glyph bitmaps for atlas generation
pub trait GlyphRasterizer: Send + Sync {
    /// Rasterize every character of `range` at `size_in_points`
    ///
    /// Glyphs are returned in `range.chars()` order. Characters the font
    /// lacks are replaced by zero-size placeholders.
    fn rasterize_font(
        &self,
        font_data: &[u8],
        size_in_points: f32,
        range: CharacterRange,
    ) -> FontResult<RasterizedFont>;
}

/// Rasterizer backed by `fontdue`
///
/// Sizes in points are rasterized 1:1 as pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontdueRasterizer;

impl FontdueRasterizer {
    /// Create a new rasterizer
    pub const fn new() -> Self {
        Self
    }

    /// Rasterize a single character
    pub fn rasterize(&self, font_data: &[u8], size_in_points: f32, ch: char) -> FontResult<RasterizedGlyph> {
        let font = Self::parse(font_data, size_in_points)?;
        Ok(Self::rasterize_glyph(&font, size_in_points, ch))
    }

    fn parse(font_data: &[u8], size_in_points: f32) -> FontResult<Font> {
        let settings = FontSettings {
            scale: size_in_points,
            ..FontSettings::default()
        };
        Font::from_bytes(font_data, settings).map_err(|e| FontError::Parse(format!("fontdue error: {}", e)))
    }

    fn rasterize_glyph(font: &Font, size_in_points: f32, ch: char) -> RasterizedGlyph {
        let (metrics, bitmap) = font.rasterize(ch, size_in_points);

        // Index 0 is .notdef: keep its advance so layout spacing survives
        if font.lookup_glyph_index(ch) == 0 {
            log::warn!("{}; substituting blank glyph", FontError::GlyphNotFound(ch));
            return RasterizedGlyph::placeholder(ch, metrics.advance_width);
        }

        RasterizedGlyph {
            ch,
            width: metrics.width,
            height: metrics.height,
            bitmap,
            bearing_x: metrics.xmin as f32,
            bearing_y: (metrics.ymin + metrics.height as i32) as f32,
            advance: metrics.advance_width.max(0.0),
        }
    }

    fn font_metrics(font: &Font, size_in_points: f32) -> FontMetrics {
        let raster_scale = size_in_points / font.units_per_em();
        Self::metrics_from_lines(font.horizontal_line_metrics(size_in_points), size_in_points, raster_scale)
    }

    fn metrics_from_lines(lines: Option<LineMetrics>, size_in_points: f32, raster_scale: f32) -> FontMetrics {
        match lines {
            Some(line) if line.ascent > 0.0 && line.new_line_size > 0.0 => FontMetrics {
                ascender: line.ascent,
                descender: line.descent.min(-f32::EPSILON),
                line_height: line.new_line_size,
                raster_scale,
            },
            _ => {
                log::warn!("Font has no usable line metrics, estimating from size {}", size_in_points);
                FontMetrics::estimated(size_in_points, FALLBACK_LINE_HEIGHT_FACTOR, raster_scale)
            }
        }
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn rasterize_font(
        &self,
        font_data: &[u8],
        size_in_points: f32,
        range: CharacterRange,
    ) -> FontResult<RasterizedFont> {
        let font = Self::parse(font_data, size_in_points)?;
        let metrics = Self::font_metrics(&font, size_in_points);

        log::info!("Rasterizing {} glyphs at {}px", range.len(), size_in_points);
        let glyphs: Vec<_> = range
            .chars()
            .map(|ch| {
                let glyph = Self::rasterize_glyph(&font, size_in_points, ch);
                log::trace!("Glyph {:?}: {}x{} adv {}", ch, glyph.width, glyph.height, glyph.advance);
                glyph
            })
            .collect();

        Ok(RasterizedFont { metrics, glyphs })
    }
}
