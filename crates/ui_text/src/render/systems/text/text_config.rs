//! Text subsystem configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::atlas_packer::AtlasPacker;
use super::error::FontResult;
use super::font_definition::{CharacterRange, FontDefinition};
use crate::assets::FontSource;
use crate::config::Config;

/// Atlas and default-font settings for the font cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Atlas texture width in pixels
    pub atlas_width: u32,
    /// Atlas texture height in pixels
    pub atlas_height: u32,
    /// Empty pixels between packed glyphs
    pub glyph_padding: u32,
    /// Font file used when a renderable has no font of its own
    pub default_font_path: Option<PathBuf>,
    /// Size of the default font
    pub default_font_size: f32,
    /// Characters rasterized for the default font
    pub default_character_range: CharacterRange,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            atlas_width: 512,
            atlas_height: 512,
            glyph_padding: 1,
            default_font_path: None,
            default_font_size: 16.0,
            default_character_range: CharacterRange::AsciiPrintable,
        }
    }
}

impl Config for TextConfig {}

impl TextConfig {
    /// Packer for the configured atlas
    pub fn packer(&self) -> AtlasPacker {
        AtlasPacker::new(self.atlas_width, self.atlas_height, self.glyph_padding)
    }

    /// Default font definition built from `source`
    pub fn default_font(&self, source: FontSource) -> FontResult<FontDefinition> {
        FontDefinition::with_range(source, self.default_font_size, self.default_character_range)
    }

    /// Default font definition for the configured font file, if any
    pub fn default_font_from_file(&self) -> Option<FontResult<FontDefinition>> {
        self.default_font_path
            .as_ref()
            .map(|path| self.default_font(FontSource::file(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ui_text_config_{}_{}.{}", std::process::id(), ext, ext))
    }

    #[test]
    fn defaults_describe_a_512_atlas() {
        let config = TextConfig::default();
        assert_eq!(config.packer().dimensions(), (512, 512));
        assert!(config.default_font_from_file().is_none());
    }

    #[test]
    fn toml_round_trip() {
        let path = temp_path("toml");
        let config = TextConfig {
            atlas_width: 1024,
            default_font_path: Some(PathBuf::from("resources/fonts/ui.ttf")),
            default_character_range: CharacterRange::Span { first: '0', last: '9' },
            ..TextConfig::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = TextConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn ron_round_trip() {
        let path = temp_path("ron");
        let config = TextConfig { glyph_padding: 3, ..TextConfig::default() };
        config.save_to_file(&path).unwrap();
        let loaded = TextConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: TextConfig = toml::from_str("atlas_height = 256").unwrap();
        assert_eq!(config.atlas_height, 256);
        assert_eq!(config.atlas_width, 512);
        assert_eq!(config.default_font_size, 16.0);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = TextConfig::default().save_to_file("config.yaml").unwrap_err();
        assert!(matches!(err, crate::config::ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loaded = TextConfig::load_or_default("/no/such/dir/text.toml").unwrap();
        assert_eq!(loaded, TextConfig::default());
    }
}
