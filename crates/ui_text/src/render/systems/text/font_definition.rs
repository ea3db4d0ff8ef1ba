//! Font definitions and cache keys

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{FontError, FontResult};
use crate::assets::FontSource;

/// Set of codepoints rasterized into an atlas
///
/// Iteration order is ascending codepoint order; it fixes both the packing
/// order and the glyph indices of a font resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterRange {
    /// Printable ASCII, `' '` (32) through `'~'` (126)
    #[default]
    AsciiPrintable,
    /// Inclusive sub-span of printable ASCII
    Span {
        /// First character
        first: char,
        /// Last character (inclusive)
        last: char,
    },
}

impl CharacterRange {
    /// First printable ASCII character (space)
    pub const ASCII_FIRST: char = ' ';
    /// Last printable ASCII character (tilde)
    pub const ASCII_LAST: char = '~';

    /// Inclusive bounds of the range
    pub const fn bounds(self) -> (char, char) {
        match self {
            Self::AsciiPrintable => (Self::ASCII_FIRST, Self::ASCII_LAST),
            Self::Span { first, last } => (first, last),
        }
    }

    /// Characters in the range, ascending
    pub fn chars(self) -> impl Iterator<Item = char> {
        let (first, last) = self.bounds();
        first..=last
    }

    /// Number of characters in the range
    pub fn len(self) -> usize {
        let (first, last) = self.bounds();
        (last as usize + 1).saturating_sub(first as usize)
    }

    /// Whether the range holds no characters
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Whether `ch` is part of the range
    pub fn contains(self, ch: char) -> bool {
        let (first, last) = self.bounds();
        (first..=last).contains(&ch)
    }

    /// Check the range is non-empty and inside printable ASCII
    pub fn validate(self) -> FontResult<()> {
        let (first, last) = self.bounds();
        if first > last {
            return Err(FontError::InvalidDefinition(format!(
                "empty character range {:?}..={:?}",
                first, last
            )));
        }
        if first < Self::ASCII_FIRST || last > Self::ASCII_LAST {
            return Err(FontError::InvalidDefinition(format!(
                "character range {:?}..={:?} leaves printable ASCII",
                first, last
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CharacterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (first, last) = self.bounds();
        write!(f, "{}-{}", first as u32, last as u32)
    }
}

/// Desired font configuration: source, size and character set
///
/// Immutable once built. Equal definitions share one cached font resource.
#[derive(Debug, Clone)]
pub struct FontDefinition {
    source: FontSource,
    size_in_points: f32,
    character_range: CharacterRange,
}

impl FontDefinition {
    /// Printable ASCII definition at `size_in_points`
    pub fn new(source: FontSource, size_in_points: f32) -> FontResult<Self> {
        Self::with_range(source, size_in_points, CharacterRange::AsciiPrintable)
    }

    /// Definition with an explicit character range
    pub fn with_range(
        source: FontSource,
        size_in_points: f32,
        character_range: CharacterRange,
    ) -> FontResult<Self> {
        if !size_in_points.is_finite() || size_in_points <= 0.0 {
            return Err(FontError::InvalidDefinition(format!(
                "font size must be positive, got {}",
                size_in_points
            )));
        }
        character_range.validate()?;

        Ok(Self { source, size_in_points, character_range })
    }

    /// Where the font bytes come from
    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// Rasterization size
    pub fn size_in_points(&self) -> f32 {
        self.size_in_points
    }

    /// Characters included in the atlas
    pub fn character_range(&self) -> CharacterRange {
        self.character_range
    }

    /// Cache key for this definition
    pub fn key(&self) -> FontKey {
        FontKey {
            source_name: self.source.unique_name(),
            size_bits: self.size_in_points.to_bits(),
            character_range: self.character_range,
        }
    }
}

impl PartialEq for FontDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

/// Identity of a cached font resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    source_name: String,
    size_bits: u32,
    character_range: CharacterRange,
}

impl FontKey {
    /// Font size encoded in the key
    pub fn size_in_points(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

impl fmt::Display for FontKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}pt[{}]",
            self.source_name,
            self.size_in_points(),
            self.character_range
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> FontSource {
        FontSource::memory("test-font", vec![0u8; 4])
    }

    #[test]
    fn ascii_printable_has_95_characters() {
        let range = CharacterRange::AsciiPrintable;
        assert_eq!(range.len(), 95);
        assert_eq!(range.chars().count(), 95);
        assert_eq!(range.chars().next(), Some(' '));
        assert_eq!(range.chars().last(), Some('~'));
        assert!(range.contains('A'));
        assert!(!range.contains('\n'));
    }

    #[test]
    fn span_outside_ascii_is_rejected() {
        let range = CharacterRange::Span { first: 'a', last: 'é' };
        assert!(matches!(range.validate(), Err(FontError::InvalidDefinition(_))));
        let reversed = CharacterRange::Span { first: 'z', last: 'a' };
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn non_positive_size_is_rejected() {
        assert!(FontDefinition::new(source(), 0.0).is_err());
        assert!(FontDefinition::new(source(), -3.0).is_err());
        assert!(FontDefinition::new(source(), f32::NAN).is_err());
        assert!(FontDefinition::new(source(), 16.0).is_ok());
    }

    #[test]
    fn equal_fields_give_equal_keys() {
        let a = FontDefinition::new(source(), 16.0).unwrap();
        let b = FontDefinition::new(source(), 16.0).unwrap();
        let c = FontDefinition::new(source(), 18.0).unwrap();
        let d = FontDefinition::with_range(source(), 16.0, CharacterRange::Span { first: '0', last: '9' })
            .unwrap();

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_ne!(a.key(), d.key());
        assert_eq!(a, b);
    }

    #[test]
    fn key_display_names_source_size_and_range() {
        let key = FontDefinition::new(source(), 16.0).unwrap().key();
        assert_eq!(key.to_string(), "memory:test-font@16pt[32-126]");
    }
}
