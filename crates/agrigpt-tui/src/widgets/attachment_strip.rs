//! One-line strip describing the pending photo.

use agrigpt_engine::PendingAttachment;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::Theme;

/// Pending attachment strip.
pub struct AttachmentStrip<'a> {
    pending: &'a PendingAttachment,
    theme: &'a Theme,
}

impl<'a> AttachmentStrip<'a> {
    pub fn new(pending: &'a PendingAttachment, theme: &'a Theme) -> Self {
        Self { pending, theme }
    }
}

/// Human-readable byte count.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

impl Widget for AttachmentStrip<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let file = &self.pending.file;
        let key = Style::default().fg(self.theme.primary);
        let label = Style::default().fg(self.theme.subtext);

        let line = Line::from(vec![
            Span::styled("Photo: ", Style::default().fg(self.theme.info)),
            Span::styled(file.name.clone(), Style::default().fg(self.theme.text)),
            Span::styled(
                format!(" ({}, {})  ", file.mime, format_size(file.len())),
                label,
            ),
            Span::styled("[Ctrl+U]", key),
            Span::styled(" use photo  ", label),
            Span::styled("[Ctrl+R]", key),
            Span::styled(" retake", label),
        ]);

        Paragraph::new(line)
            .style(Style::default().bg(self.theme.overlay))
            .render(area, buf);
    }
}
