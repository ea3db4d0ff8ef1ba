//! Font byte sources
//!
//! A [`FontSource`] names where raw TrueType/OpenType bytes come from. The
//! unique name doubles as the font part of the font cache key, so two sources
//! with the same name are assumed to hold identical bytes.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::render::systems::text::{FontError, FontResult};

/// Where the bytes of a font come from
#[derive(Clone)]
pub enum FontSource {
    /// Font compiled into the binary, typically via `include_bytes!`
    Embedded {
        /// Resource name used as cache identity
        name: &'static str,
        /// Raw font bytes
        data: &'static [u8],
    },
    /// Font file on disk, read on every atlas build
    File(PathBuf),
    /// Font bytes already resident in memory
    Memory {
        /// Name used as cache identity
        name: String,
        /// Raw font bytes
        data: Arc<[u8]>,
    },
}

impl FontSource {
    /// Embedded font source
    pub const fn embedded(name: &'static str, data: &'static [u8]) -> Self {
        Self::Embedded { name, data }
    }

    /// Font file source
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// In-memory font source
    pub fn memory(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory { name: name.into(), data: data.into() }
    }

    /// Stable identity of this source, used in cache keys
    pub fn unique_name(&self) -> String {
        match self {
            Self::Embedded { name, .. } => format!("embedded:{}", name),
            Self::File(path) => format!("file:{}", path.display()),
            Self::Memory { name, .. } => format!("memory:{}", name),
        }
    }

    /// Retrieve the raw font bytes
    ///
    /// Fails with [`FontError::Load`] if the bytes cannot be retrieved.
    pub fn load_font_data(&self) -> FontResult<Cow<'_, [u8]>> {
        match self {
            Self::Embedded { data, .. } => Ok(Cow::Borrowed(*data)),
            Self::Memory { data, .. } => Ok(Cow::Borrowed(&data[..])),
            Self::File(path) => std::fs::read(path).map(Cow::Owned).map_err(|e| FontError::Load {
                source_name: self.unique_name(),
                reason: e.to_string(),
            }),
        }
    }
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded { name, data } => f
                .debug_struct("Embedded")
                .field("name", name)
                .field("bytes", &data.len())
                .finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Memory { name, data } => f
                .debug_struct("Memory")
                .field("name", name)
                .field("bytes", &data.len())
                .finish(),
        }
    }
}

impl PartialEq for FontSource {
    fn eq(&self, other: &Self) -> bool {
        self.unique_name() == other.unique_name()
    }
}

impl Eq for FontSource {}
