//! # UI Text
//!
//! Font atlas management and per-glyph draw emission for a Vulkan UI.
//!
//! ## Features
//!
//! - **Font Atlases**: TrueType rasterization (`fontdue`) into single-channel atlases
//! - **Shared Geometry**: one quad buffer per font, four vertices per glyph
//! - **Resource Sharing**: reference-counted cache keyed by font definition
//! - **Draw Commands**: one pre-transformed draw per visible glyph
//! - **Backends**: ash/Vulkan, plus a headless backend for tools and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ui_text::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gpu = Arc::new(HeadlessGpu::new());
//!     let config = TextConfig::default();
//!     let cache = Arc::new(FontResourceCache::new(gpu, &config));
//!
//!     let font = FontDefinition::new(FontSource::file("resources/fonts/ui.ttf"), 16.0)?;
//!     let mut label = TextRenderable::new(Arc::clone(&cache), font);
//!     label.set_text("Score: 100");
//!     label.activate()?;
//!
//!     let context = RenderContext::screen_space(PipelineHandle(0), 1280.0, 720.0);
//!     for command in label.draw_commands(&context) {
//!         println!("draw {} vertices from {}", command.vertex_count, command.first_vertex);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod render;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        assets::FontSource,
        config::{Config, ConfigError},
        foundation::math::{Mat4, Vec2, Vec4},
        render::{
            api::{GpuServices, PipelineHandle},
            backends::{HeadlessGpu, VulkanTextBackend},
            commands::{DrawCommand, RenderContext, RenderPassMask},
            systems::text::{
                Anchor, CharacterRange, ElementTransform, FontDefinition, FontError, FontResourceCache,
                FontResult, TextConfig, TextRenderable, TextState,
            },
        },
    };
}
