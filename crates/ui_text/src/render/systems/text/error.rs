//! Errors raised by the font pipeline

use crate::render::api::GraphicsError;

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Font bytes could not be retrieved from their source
    #[error("Failed to load font '{source_name}': {reason}")]
    Load {
        /// Unique name of the font source
        source_name: String,
        /// Underlying cause
        reason: String,
    },

    /// Font bytes are not a valid TrueType/OpenType font
    #[error("Failed to parse font: {0}")]
    Parse(String),

    /// Packed glyphs do not fit in the atlas
    #[error("Glyph '{glyph}' does not fit in {atlas_width}x{atlas_height} atlas")]
    AtlasOverflow {
        /// First glyph that did not fit
        glyph: char,
        /// Atlas width in pixels
        atlas_width: u32,
        /// Atlas height in pixels
        atlas_height: u32,
    },

    /// Requested character is not part of the font resource
    #[error("Character '{0}' not found in atlas")]
    GlyphNotFound(char),

    /// Font definition parameters are invalid
    #[error("Invalid font definition: {0}")]
    InvalidDefinition(String),

    /// Font definition changed while a renderable is active
    #[error("Font definition cannot change while the text is active")]
    ConfigurationLocked,

    /// GPU collaborator failed
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}
