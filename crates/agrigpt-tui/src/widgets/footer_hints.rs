//! Bottom bar of keybinding hints: `[Enter] send │ [Ctrl+O] attach │ …`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::Theme;

/// A single keybinding hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    /// The key or key combination (e.g., "Ctrl+O").
    pub key: &'static str,
    /// What it does (e.g., "attach").
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

/// Footer hints widget.
pub struct FooterHints<'a> {
    hints: &'a [KeyHint],
    theme: &'a Theme,
}

impl<'a> FooterHints<'a> {
    pub fn new(hints: &'a [KeyHint], theme: &'a Theme) -> Self {
        Self { hints, theme }
    }

    /// Hints while composing.
    ///
    /// Photo actions replace the attach hint once a photo is pending, and the
    /// suggestion shortcut shows on a blank page.
    pub fn compose_hints(has_attachment: bool, blank_page: bool) -> Vec<KeyHint> {
        let mut hints = vec![KeyHint::new("Enter", "send")];
        if has_attachment {
            hints.push(KeyHint::new("Ctrl+U", "use photo"));
            hints.push(KeyHint::new("Ctrl+R", "retake"));
        } else {
            hints.push(KeyHint::new("Ctrl+O", "attach"));
        }
        if blank_page {
            hints.push(KeyHint::new("1-3", "suggestion"));
        }
        hints.extend([
            KeyHint::new("Ctrl+D", "voice"),
            KeyHint::new("Ctrl+T", "topic"),
            KeyHint::new("Ctrl+N", "new chat"),
            KeyHint::new("F1", "help"),
        ]);
        hints
    }

    /// Hints while typing an attachment path.
    pub fn attach_prompt_hints() -> Vec<KeyHint> {
        vec![
            KeyHint::new("Enter", "attach"),
            KeyHint::new("Esc", "cancel"),
        ]
    }
}

impl Widget for FooterHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (i, hint) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", Style::default().fg(self.theme.muted)));
            }
            spans.push(Span::styled("[", Style::default().fg(self.theme.muted)));
            spans.push(Span::styled(hint.key, Style::default().fg(self.theme.primary)));
            spans.push(Span::styled("] ", Style::default().fg(self.theme.muted)));
            spans.push(Span::styled(hint.action, Style::default().fg(self.theme.subtext)));
        }

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::buffer_text;

    #[test]
    fn test_compose_hints_follow_attachment() {
        let plain = FooterHints::compose_hints(false, true);
        assert!(plain.contains(&KeyHint::new("Ctrl+O", "attach")));
        assert!(plain.contains(&KeyHint::new("1-3", "suggestion")));

        let photo = FooterHints::compose_hints(true, false);
        assert!(photo.contains(&KeyHint::new("Ctrl+U", "use photo")));
        assert!(!photo.contains(&KeyHint::new("Ctrl+O", "attach")));
        assert!(!photo.contains(&KeyHint::new("1-3", "suggestion")));
    }

    #[test]
    fn test_render_brackets_keys() {
        let theme = Theme::default();
        let hints = FooterHints::attach_prompt_hints();
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        FooterHints::new(&hints, &theme).render(area, &mut buf);
        assert!(buffer_text(&buf).starts_with("[Enter] attach │ [Esc] cancel"));
    }
}
