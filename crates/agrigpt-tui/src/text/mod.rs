//! Text rendering utilities.
//!
//! - [`render_markdown`] turns assistant replies into styled, wrapped Lines
//! - [`wrap_text`] wraps plain text for the transcript
//! - [`truncate_to_width`] fits labels into fixed-width cells

mod markdown;
mod styles;
mod width;
mod wrap;

pub use markdown::render_markdown;
pub use width::truncate_to_width;
pub use wrap::wrap_text;
