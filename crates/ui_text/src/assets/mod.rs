//! Asset sources consumed by the text subsystem

pub mod font_source;

pub use font_source::FontSource;
