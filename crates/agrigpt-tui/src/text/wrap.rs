//! Wrapping for plain strings and styled Lines.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::width::visual_width;

/// Wrap plain text to `width` cells. Explicit newlines start new lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(String::from).collect();
    }
    text.split('\n')
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

/// Wrap styled Lines to `width` cells, keeping each character's style.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let line_width: usize = line.spans.iter().map(|s| visual_width(&s.content)).sum();
    if line_width <= width {
        return vec![line];
    }

    let styled: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |ch| (ch, span.style)))
        .collect();
    let plain: String = styled.iter().map(|(ch, _)| *ch).collect();

    let mut out = Vec::new();
    let mut pos = 0;
    for piece in textwrap::wrap(&plain, width) {
        // textwrap drops the whitespace it breaks on; skip it in the source too.
        while pos < styled.len() && styled[pos].0.is_whitespace() && !piece.starts_with(styled[pos].0)
        {
            pos += 1;
        }

        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style: Option<Style> = None;
        for expected in piece.chars() {
            let (ch, style) = styled.get(pos).copied().unwrap_or((expected, Style::default()));
            pos += 1;
            if let Some(prev) = run_style.filter(|s| *s != style) {
                spans.push(Span::styled(std::mem::take(&mut run), prev));
            }
            run_style = Some(style);
            run.push(ch);
        }
        if let Some(s) = run_style {
            spans.push(Span::styled(run, s));
        }
        out.push(Line::from(spans));
    }

    if out.is_empty() {
        out.push(Line::from(""));
    }
    out
}
