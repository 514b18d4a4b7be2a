//! Colour palettes for the TUI.

mod colors;

pub use colors::Theme;
