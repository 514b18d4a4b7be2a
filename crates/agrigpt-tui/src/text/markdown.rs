//! Markdown rendering for assistant replies, via pulldown-cmark.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use crate::theme::Theme;

use super::styles::MarkdownStyles;
use super::wrap::wrap_lines;

/// Longest horizontal rule drawn for `---`.
const MAX_RULE_WIDTH: usize = 40;

/// Render markdown to styled Lines wrapped to `width` cells.
///
/// Trailing blank lines are dropped.
pub fn render_markdown(input: &str, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = MarkdownRenderer::new(MarkdownStyles::from_theme(theme), width);
    renderer.run(Parser::new_ext(input, options));

    let mut lines = wrap_lines(renderer.lines, width);
    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }
    lines
}

struct MarkdownRenderer {
    lines: Vec<Line<'static>>,
    styles: MarkdownStyles,
    width: usize,
    /// Nested inline styles, innermost last.
    style_stack: Vec<Style>,
    current: Vec<Span<'static>>,
    /// One entry per open list: the next number, or `None` for bullets.
    lists: Vec<Option<u64>>,
    pending_marker: Option<String>,
    in_code_block: bool,
    in_blockquote: bool,
}

impl MarkdownRenderer {
    fn new(styles: MarkdownStyles, width: usize) -> Self {
        Self {
            lines: Vec::new(),
            styles,
            width,
            style_stack: Vec::new(),
            current: Vec::new(),
            lists: Vec::new(),
            pending_marker: None,
            in_code_block: false,
            in_blockquote: false,
        }
    }

    fn run<'a>(&mut self, parser: impl Iterator<Item = Event<'a>>) {
        for event in parser {
            self.handle_event(event);
        }
        self.flush_line();
    }

    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_line();
                self.style_stack.push(self.heading_style(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush_line();
                self.style_stack.pop();
                self.blank_line();
            }

            Event::Start(Tag::Emphasis) => self.style_stack.push(self.styles.emphasis),
            Event::Start(Tag::Strong) => self.style_stack.push(self.styles.strong),
            Event::Start(Tag::Link { .. }) => self.style_stack.push(self.styles.link),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Link) => {
                self.style_stack.pop();
            }

            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_line();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                self.blank_line();
            }

            Event::Start(Tag::List(start)) => {
                self.flush_line();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            Event::Start(Tag::Item) => {
                self.flush_line();
                self.pending_marker = Some(self.next_marker());
            }
            Event::End(TagEnd::Item) => self.flush_line(),
            Event::TaskListMarker(checked) => {
                let marker = self.pending_marker.take().unwrap_or_default();
                let checkbox = if checked { "[x] " } else { "[ ] " };
                self.pending_marker = Some(format!("{marker}{checkbox}"));
            }

            Event::Start(Tag::BlockQuote) => {
                self.flush_line();
                self.in_blockquote = true;
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush_line();
                self.in_blockquote = false;
            }

            Event::End(TagEnd::Paragraph) => {
                self.flush_line();
                // Tight list items end without a gap.
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }

            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                self.take_marker();
                self.current
                    .push(Span::styled(code.into_string(), self.styles.code));
            }
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                let width = self.width.clamp(1, MAX_RULE_WIDTH);
                self.lines
                    .push(Line::from(Span::styled("─".repeat(width), self.styles.rule)));
                self.blank_line();
            }

            _ => {}
        }
    }

    fn next_marker(&mut self) -> String {
        let indent = "  ".repeat(self.lists.len().saturating_sub(1));
        match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{indent}{n}. ");
                *n += 1;
                marker
            }
            _ => format!("{indent}• "),
        }
    }

    fn take_marker(&mut self) {
        if let Some(marker) = self.pending_marker.take() {
            self.current
                .push(Span::styled(marker, self.styles.list_marker));
        }
        if self.in_blockquote && self.current.is_empty() {
            self.current
                .push(Span::styled("│ ", self.styles.blockquote));
        }
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.lines.push(Line::from(Span::styled(
                    format!("  {line}"),
                    self.styles.code_block,
                )));
            }
            return;
        }

        self.take_marker();
        let style = self.current_style();
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn current_style(&self) -> Style {
        let base = if self.in_blockquote {
            self.styles.text.patch(self.styles.blockquote)
        } else {
            self.styles.text
        };
        self.style_stack.iter().fold(base, |acc, s| acc.patch(*s))
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        match level {
            HeadingLevel::H1 => self.styles.h1,
            HeadingLevel::H2 => self.styles.h2,
            _ => self.styles.h3,
        }
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::from(""));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Modifier;

    fn texts(md: &str, width: usize) -> Vec<String> {
        render_markdown(md, width, &Theme::default())
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(render_markdown("", 80, &Theme::default()).is_empty());
    }

    #[test]
    fn test_paragraphs_separated_without_trailing_blank() {
        assert_eq!(
            texts("Water deeply.\n\nMulch the base.", 80),
            vec!["Water deeply.", "", "Mulch the base."]
        );
    }

    #[test]
    fn test_heading_is_styled() {
        let lines = render_markdown("# Citrus canker", 80, &Theme::default());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn test_bullet_and_numbered_lists() {
        let md = "- Prune infected twigs\n- Spray copper\n\n1. Test soil\n2. Add lime";
        assert_eq!(
            texts(md, 80),
            vec![
                "• Prune infected twigs",
                "• Spray copper",
                "",
                "1. Test soil",
                "2. Add lime",
            ]
        );
    }

    #[test]
    fn test_task_list_checkbox() {
        assert_eq!(
            texts("- [x] Applied\n- [ ] Pending", 80),
            vec!["• [x] Applied", "• [ ] Pending"]
        );
    }

    #[test]
    fn test_inline_code_and_code_block() {
        let lines = texts("Mix `2 g/L`.\n\n```\nNPK 19:19:19\n```", 80);
        assert_eq!(lines[0], "Mix 2 g/L.");
        assert!(lines.contains(&"  NPK 19:19:19".to_string()));
    }

    #[test]
    fn test_rule_is_bounded() {
        let lines = texts("above\n\n---\n\nbelow", 100);
        assert!(lines.contains(&"─".repeat(MAX_RULE_WIDTH)));
    }

    #[test]
    fn test_long_paragraph_wraps() {
        let lines = texts(
            "Citrus greening spreads through the Asian citrus psyllid, so control the insect first.",
            24,
        );
        assert!(lines.len() > 2);
        assert!(lines.iter().all(|l| l.chars().count() <= 24));
    }

    #[test]
    fn test_blockquote_prefix() {
        let lines = texts("> Do not spray at noon", 80);
        assert_eq!(lines[0], "│ Do not spray at noon");
    }
}
