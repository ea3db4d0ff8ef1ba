//! Text rendering system
//!
//! Font atlas generation, shared glyph geometry and per-glyph draw emission.
//!
//! # Architecture
//!
//! - **GlyphRasterizer**: TrueType bytes to coverage bitmaps (`fontdue`)
//! - **AtlasPacker**: shelf packing into a fixed-size R8 atlas
//! - **SharedGeometryBuilder**: one quad per glyph, 4 vertices each
//! - **FontResourceCache**: reference-counted sharing of atlas + geometry
//! - **GlyphLayoutEngine**: per-glyph transforms for a line of text
//! - **TextRenderable**: activation lifecycle and draw command emission

pub mod atlas_packer;
pub mod error;
pub mod font_cache;
pub mod font_definition;
pub mod font_resource;
pub mod glyph_rasterizer;
pub mod shared_geometry;
pub mod text_config;
pub mod text_layout;
pub mod text_renderable;

#[cfg(test)]
pub(crate) mod test_support;

pub use atlas_packer::{AtlasPacker, PackedAtlas, UvRect};
pub use error::{FontError, FontResult};
pub use font_cache::FontResourceCache;
pub use font_definition::{CharacterRange, FontDefinition, FontKey};
pub use font_resource::{FontMetrics, FontResource, GlyphInfo};
pub use glyph_rasterizer::{FontdueRasterizer, GlyphRasterizer, RasterizedFont, RasterizedGlyph};
pub use shared_geometry::{GlyphVertex, SharedGeometryBuilder, GLYPH_TOPOLOGY};
pub use text_config::TextConfig;
pub use text_layout::{Anchor, ElementTransform, GlyphLayoutEngine, GlyphPlacement, TextSize};
pub use text_renderable::{TextRenderable, TextState, ATLAS_BINDING};
