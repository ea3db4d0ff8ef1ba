//! Rendering: collaborator interfaces, draw commands, backends and the text system

pub mod api;
pub mod backends;
pub mod commands;
pub mod systems;

pub use commands::{DrawCommand, GlyphPushConstants, RenderContext, RenderPassMask};
