//! Composer input bar.
//!
//! Grows with the draft up to the composer's row cap, then scrolls to keep the
//! cursor visible. Also hosts the attachment path prompt.

use agrigpt_engine::Composer;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// Input bar widget.
pub struct ComposerBar<'a> {
    composer: &'a Composer,
    placeholder: &'a str,
    path_prompt: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> ComposerBar<'a> {
    pub fn new(composer: &'a Composer, placeholder: &'a str, theme: &'a Theme) -> Self {
        Self {
            composer,
            placeholder,
            path_prompt: None,
            theme,
        }
    }

    /// Show the attachment path prompt instead of the draft.
    #[must_use]
    pub fn path_prompt(mut self, path: Option<&'a str>) -> Self {
        self.path_prompt = path;
        self
    }

    /// Height of the bar including borders.
    pub fn height(&self) -> u16 {
        if self.path_prompt.is_some() {
            3
        } else {
            self.composer.rows() + 2
        }
    }

    fn cursor_style(&self) -> Style {
        Style::default()
            .fg(self.theme.text)
            .add_modifier(Modifier::REVERSED)
    }

    /// Split the draft into rows of at most `width` chars, marking the cursor.
    /// Returns the rows and the index of the row holding the cursor.
    fn draft_rows(&self, width: usize) -> (Vec<Line<'static>>, usize) {
        let text_style = Style::default().fg(self.theme.text);
        let cursor = self.composer.cursor();
        let width = width.max(1);

        let mut rows = Vec::new();
        let mut cursor_row = 0;
        let mut index = 0;
        for logical in self.composer.draft().split('\n') {
            let chars: Vec<char> = logical.chars().collect();
            let chunks: Vec<&[char]> = if chars.is_empty() {
                vec![&chars[..]]
            } else {
                chars.chunks(width).collect()
            };
            let last = chunks.len() - 1;

            for (i, chunk) in chunks.into_iter().enumerate() {
                let start = index;
                let end = start + chunk.len();
                let holds_cursor = (start..end).contains(&cursor) || (i == last && cursor == end);

                if holds_cursor {
                    cursor_row = rows.len();
                    let at = cursor - start;
                    let before: String = chunk[..at].iter().collect();
                    let (under, after): (String, String) = match chunk.get(at) {
                        Some(c) => (c.to_string(), chunk[at + 1..].iter().collect()),
                        None => (" ".to_string(), String::new()),
                    };
                    rows.push(Line::from(vec![
                        Span::styled(before, text_style),
                        Span::styled(under, self.cursor_style()),
                        Span::styled(after, text_style),
                    ]));
                } else {
                    rows.push(Line::from(Span::styled(
                        chunk.iter().collect::<String>(),
                        text_style,
                    )));
                }
                index = end;
            }
            // The newline itself.
            index += 1;
        }
        (rows, cursor_row)
    }

    fn placeholder_line(&self) -> Line<'static> {
        Line::from(vec![
            Span::styled(" ", self.cursor_style()),
            Span::styled(
                self.placeholder.to_string(),
                Style::default().fg(self.theme.muted),
            ),
        ])
    }
}

impl Widget for ComposerBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let busy = self.composer.is_disabled();
        let (title, border) = if self.path_prompt.is_some() {
            (" Attach image ", self.theme.border_focused)
        } else if self.composer.is_listening() {
            (" Listening… ", self.theme.warning)
        } else if busy {
            (" Waiting for answer… ", self.theme.border)
        } else {
            (" Message ", self.theme.border_focused)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(Style::default().fg(border))
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        let prompt = Span::styled("> ", Style::default().fg(self.theme.primary));
        let text_width = usize::from(inner.width.saturating_sub(2));

        if let Some(path) = self.path_prompt {
            let line = Line::from(vec![
                Span::styled("path: ", Style::default().fg(self.theme.primary)),
                Span::styled(path.to_string(), Style::default().fg(self.theme.text)),
                Span::styled(" ", self.cursor_style()),
            ]);
            Paragraph::new(line).render(inner, buf);
            return;
        }

        let (rows, cursor_row) = if self.composer.draft().is_empty() {
            (vec![self.placeholder_line()], 0)
        } else {
            self.draft_rows(text_width)
        };

        let height = usize::from(inner.height.max(1));
        let scroll = (cursor_row + 1).saturating_sub(height);
        let lines: Vec<Line<'static>> = rows
            .into_iter()
            .enumerate()
            .skip(scroll)
            .take(height)
            .map(|(i, row)| {
                let lead = if i == 0 { prompt.clone() } else { Span::raw("  ") };
                let mut spans = vec![lead];
                spans.extend(row.spans);
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
