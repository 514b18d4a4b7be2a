//! Top bar: `● AgriGPT │ Citrus Crop │ chat 65f0… │ | Thinking…`

use agrigpt_engine::Topic;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::text::truncate_to_width;
use crate::theme::Theme;

use super::SPINNER;

/// Widest chat id shown before truncation.
const CHAT_ID_WIDTH: usize = 12;

/// Header widget.
pub struct Header<'a> {
    topic: Topic,
    chat_id: Option<&'a str>,
    submitting: bool,
    listening: bool,
    tick: usize,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(topic: Topic, theme: &'a Theme) -> Self {
        Self {
            topic,
            chat_id: None,
            submitting: false,
            listening: false,
            tick: 0,
            theme,
        }
    }

    #[must_use]
    pub fn chat_id(mut self, chat_id: Option<&'a str>) -> Self {
        self.chat_id = chat_id;
        self
    }

    /// Show the spinner while a submission is in flight.
    #[must_use]
    pub fn submitting(mut self, submitting: bool, tick: usize) -> Self {
        self.submitting = submitting;
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn listening(mut self, listening: bool) -> Self {
        self.listening = listening;
        self
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sep = || Span::styled(" │ ", Style::default().fg(self.theme.muted));
        let mut spans = vec![
            Span::styled("● ", Style::default().fg(self.theme.primary)),
            Span::styled(
                "AgriGPT",
                Style::default()
                    .fg(self.theme.text)
                    .add_modifier(Modifier::BOLD),
            ),
            sep(),
            Span::styled(
                self.topic.display_name(),
                Style::default().fg(self.theme.secondary),
            ),
            sep(),
        ];

        match self.chat_id {
            Some(id) => spans.push(Span::styled(
                format!("chat {}", truncate_to_width(id, CHAT_ID_WIDTH)),
                Style::default().fg(self.theme.subtext),
            )),
            None => spans.push(Span::styled(
                "new chat",
                Style::default().fg(self.theme.muted),
            )),
        }

        if self.listening {
            spans.push(sep());
            spans.push(Span::styled(
                "Listening…",
                Style::default().fg(self.theme.warning),
            ));
        }

        if self.submitting {
            spans.push(sep());
            spans.push(Span::styled(
                format!("{} Thinking…", SPINNER[self.tick % SPINNER.len()]),
                Style::default().fg(self.theme.info),
            ));
        }

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}
