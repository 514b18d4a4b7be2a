//! Key reference overlay.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::theme::Theme;

const HELP_TEXT: &str = "
  Compose
    Enter             Send message
    Shift+Enter       New line (also Ctrl+J)
    1-3               Send a suggestion (blank chat)
    Ctrl+D            Voice input on/off

  Photos
    Ctrl+O            Attach an image file
    Ctrl+U            Use photo
    Ctrl+R            Retake (discard photo)

  Chat
    Ctrl+T            Switch topic
    Ctrl+N            New chat
    Up/Down           Scroll transcript

  Layout
    Ctrl+B            Show/hide sidebar
    Alt+Left/Right    Resize sidebar
    F1                This help
    Esc / Ctrl+C      Quit

  [Press any key to close]
";

/// Create a centered rect with fixed dimensions.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Help overlay widget.
pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for HelpOverlay<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = HELP_TEXT.lines().count() as u16 + 2;
        let overlay = centered_fixed(54, height, area);
        Clear.render(overlay, buf);

        let block = Block::default()
            .title(" Help ")
            .title_style(
                Style::default()
                    .fg(self.theme.primary)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused))
            .style(Style::default().fg(self.theme.text).bg(self.theme.base));

        Paragraph::new(HELP_TEXT).block(block).render(overlay, buf);
    }
}
