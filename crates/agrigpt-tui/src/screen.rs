//! Top-level layout of the chat screen.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::{App, InputMode, NoticeKind};
use crate::widgets::{
    AttachmentStrip, ComposerBar, FooterHints, Header, HelpOverlay, Sidebar, Transcript,
};

/// Render the whole UI into `buf`.
pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;
    let sidebar_width = app.sidebar.visible_width(area.width);

    let [sidebar_area, main_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(sidebar_width), Constraint::Min(0)])
        .areas(area);

    if sidebar_width > 0 {
        Sidebar::new(&app.page, theme).render(sidebar_area, buf);
    }

    let page = &app.page;
    let composer = page.composer();
    let path_prompt = match &app.mode {
        InputMode::AttachPath(path) => Some(path.as_str()),
        InputMode::Compose => None,
    };
    let bar = ComposerBar::new(composer, page.topic().placeholder(), theme).path_prompt(path_prompt);

    let notice_height = u16::from(app.notice.is_some());
    let strip_height = u16::from(composer.attachment().is_some() && path_prompt.is_none());

    let [header_area, transcript_area, notice_area, strip_area, composer_area, footer_area] =
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(notice_height),
                Constraint::Length(strip_height),
                Constraint::Length(bar.height()),
                Constraint::Length(1),
            ])
            .areas(main_area);

    Header::new(page.topic(), theme)
        .chat_id(page.chat_id())
        .submitting(page.is_submitting(), app.tick)
        .listening(composer.is_listening())
        .render(header_area, buf);

    Transcript::new(page, theme)
        .scroll(app.transcript_scroll)
        .tick(app.tick)
        .render(transcript_area, buf);

    if let Some(notice) = &app.notice {
        let color = match notice.kind {
            NoticeKind::Info => theme.info,
            NoticeKind::Error => theme.error,
        };
        Paragraph::new(Line::from(Span::styled(
            notice.text.clone(),
            Style::default().fg(color),
        )))
        .render(notice_area, buf);
    }

    if strip_height > 0 {
        if let Some(pending) = composer.attachment() {
            AttachmentStrip::new(pending, theme).render(strip_area, buf);
        }
    }

    bar.render(composer_area, buf);

    let hints = if path_prompt.is_some() {
        FooterHints::attach_prompt_hints()
    } else {
        FooterHints::compose_hints(
            composer.attachment().is_some(),
            page.messages().is_empty() && composer.draft().is_empty(),
        )
    };
    FooterHints::new(&hints, theme).render(footer_area, buf);

    if app.show_help {
        HelpOverlay::new(theme).render(area, buf);
    }
}
