//! UI widgets for the TUI.
//!
//! - [`Header`] - Top bar with topic, chat id and busy state
//! - [`Transcript`] - Welcome screen or message history
//! - [`AttachmentStrip`] - Pending photo with its actions
//! - [`ComposerBar`] - Auto-growing input
//! - [`Sidebar`] - Topics and session details
//! - [`FooterHints`] - Bottom keybinding hints
//! - [`HelpOverlay`] - Key reference popup

mod attachment_strip;
mod composer_bar;
mod footer_hints;
mod header;
mod help;
mod sidebar;
mod transcript;

pub use attachment_strip::AttachmentStrip;
pub use composer_bar::ComposerBar;
pub use footer_hints::FooterHints;
pub use header::Header;
pub use help::HelpOverlay;
pub use sidebar::Sidebar;
pub use transcript::Transcript;

/// Busy spinner frames.
pub(crate) const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[cfg(test)]
pub(crate) fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            out.push_str(buf[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}
