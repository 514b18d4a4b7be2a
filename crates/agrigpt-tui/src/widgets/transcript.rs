//! Transcript pane.
//!
//! Shows the welcome screen with numbered suggestions while the chat is empty,
//! otherwise the message history pinned to the bottom.

use agrigpt_engine::{ConversationPage, Message, MessageSource};
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::text::{render_markdown, wrap_text};
use crate::theme::Theme;

use super::SPINNER;

/// Indent of message bodies under their author line.
const BODY_INDENT: &str = "  ";

/// Transcript widget.
pub struct Transcript<'a> {
    page: &'a ConversationPage,
    theme: &'a Theme,
    scroll: usize,
    tick: usize,
}

impl<'a> Transcript<'a> {
    pub fn new(page: &'a ConversationPage, theme: &'a Theme) -> Self {
        Self {
            page,
            theme,
            scroll: 0,
            tick: 0,
        }
    }

    /// Lines scrolled up from the bottom.
    #[must_use]
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    #[must_use]
    pub fn tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }

    /// All transcript lines for a pane `width` cells wide.
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        if self.page.messages().is_empty() && !self.page.is_submitting() {
            return self.welcome_lines(width);
        }

        let body_width = width.saturating_sub(BODY_INDENT.len());
        let mut lines = Vec::new();
        for message in self.page.messages() {
            lines.push(self.author_line(message));
            match message.source {
                MessageSource::User => self.push_user_body(&mut lines, message, body_width),
                MessageSource::System => {
                    for line in render_markdown(&message.text, body_width, self.theme) {
                        lines.push(indent(line));
                    }
                }
            }
            lines.push(Line::from(""));
        }

        if self.page.is_submitting() {
            lines.push(Line::from(Span::styled(
                format!("{BODY_INDENT}{} Thinking…", SPINNER[self.tick % SPINNER.len()]),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines
    }

    fn welcome_lines(&self, width: usize) -> Vec<Line<'static>> {
        let topic = self.page.topic();
        let mut lines = vec![
            Line::from(Span::styled(
                "Welcome to AgriGPT",
                Style::default()
                    .fg(self.theme.primary)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        let intro = if topic.offers_photo_capture() {
            format!(
                "Ask anything about {topic}, or attach a photo of the affected plant for a diagnosis."
            )
        } else {
            format!("Ask anything about {topic}.")
        };
        for line in wrap_text(&intro, width) {
            lines.push(Line::from(Span::styled(
                line,
                Style::default().fg(self.theme.subtext),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Try asking:",
            Style::default().fg(self.theme.text),
        )));
        for (i, suggestion) in self.page.suggestions().iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{BODY_INDENT}[{}] ", i + 1),
                    Style::default().fg(self.theme.primary),
                ),
                Span::styled(*suggestion, Style::default().fg(self.theme.secondary)),
            ]));
        }
        lines
    }

    fn author_line(&self, message: &Message) -> Line<'static> {
        let (name, color) = match message.source {
            MessageSource::User => ("You", self.theme.user),
            MessageSource::System => ("AgriGPT", self.theme.primary),
        };
        let time = message.timestamp.with_timezone(&Local).format("%H:%M");
        Line::from(vec![
            Span::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" · {time}"), Style::default().fg(self.theme.muted)),
        ])
    }

    fn push_user_body(&self, lines: &mut Vec<Line<'static>>, message: &Message, width: usize) {
        if message.image.is_some() {
            lines.push(Line::from(Span::styled(
                format!("{BODY_INDENT}[photo attached]"),
                Style::default().fg(self.theme.info),
            )));
        }
        if message.text.is_empty() {
            return;
        }
        for line in wrap_text(&message.text, width) {
            lines.push(Line::from(Span::styled(
                format!("{BODY_INDENT}{line}"),
                Style::default().fg(self.theme.text),
            )));
        }
    }
}

fn indent(line: Line<'static>) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    spans.push(Span::raw(BODY_INDENT));
    spans.extend(line.spans);
    Line::from(spans)
}

impl Widget for Transcript<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.lines(usize::from(area.width));
        let height = usize::from(area.height);

        let max_scroll = lines.len().saturating_sub(height);
        let end = lines.len() - self.scroll.min(max_scroll);
        let start = end.saturating_sub(height);

        Paragraph::new(lines[start..end].to_vec())
            .style(Style::default().bg(self.theme.base))
            .render(area, buf);
    }
}
