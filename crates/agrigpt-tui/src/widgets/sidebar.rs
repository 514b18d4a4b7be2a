//! Sidebar with topics and session details.

use agrigpt_engine::{ConversationPage, Topic};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::text::truncate_to_width;
use crate::theme::Theme;

/// Sidebar widget.
pub struct Sidebar<'a> {
    page: &'a ConversationPage,
    theme: &'a Theme,
}

impl<'a> Sidebar<'a> {
    pub fn new(page: &'a ConversationPage, theme: &'a Theme) -> Self {
        Self { page, theme }
    }

    fn heading(&self, text: &'static str) -> Line<'static> {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(self.theme.subtext)
                .add_modifier(Modifier::BOLD),
        ))
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let value = |text: &str| {
            Line::from(Span::styled(
                format!(" {}", truncate_to_width(text, width.saturating_sub(1))),
                Style::default().fg(self.theme.text),
            ))
        };

        let mut lines = vec![self.heading("Topics")];
        for topic in Topic::ALL {
            let active = topic == self.page.topic();
            let (marker, style) = if active {
                (
                    "▶ ",
                    Style::default()
                        .fg(self.theme.primary)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default().fg(self.theme.subtext))
            };
            lines.push(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(
                    truncate_to_width(topic.display_name(), width.saturating_sub(2)),
                    style,
                ),
            ]));
        }
        lines.push(Line::from(Span::styled(
            " Ctrl+T to switch",
            Style::default().fg(self.theme.muted),
        )));

        lines.push(Line::from(""));
        lines.push(self.heading("Chat"));
        lines.push(value(self.page.chat_id().unwrap_or("new chat")));
        lines.push(value(&format!("{} messages", self.page.messages().len())));

        lines.push(Line::from(""));
        lines.push(self.heading("Signed in as"));
        match self.page.user_email() {
            Some(email) => lines.push(value(&email)),
            None => lines.push(Line::from(Span::styled(
                " not signed in",
                Style::default().fg(self.theme.error),
            ))),
        }
        lines
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(self.theme.border))
            .style(Style::default().bg(self.theme.surface));
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.lines(usize::from(inner.width))).render(inner, buf);
    }
}
