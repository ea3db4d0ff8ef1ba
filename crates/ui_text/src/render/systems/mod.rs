//! Rendering systems

pub mod text;
