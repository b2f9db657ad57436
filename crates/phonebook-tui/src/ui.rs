use phonebook_core::FeedState;
use phonebook_core::format::format_date;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, ConversationView, InputLine, InputMode, Screen};
use crate::views::{card_lines, message_lines};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Gate => render_gate(app, frame, body_area),
        Screen::Dashboard => render_dashboard(app, frame, body_area),
        Screen::Chat | Screen::Studio => render_conversation(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.attach_input.is_some() {
        render_attach_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(" Phonebook ", Style::default().fg(Color::Cyan).bold())];

    if app.screen != Screen::Gate {
        for (key, screen, label) in [
            ("1", Screen::Dashboard, "Dashboard"),
            ("2", Screen::Chat, "Chat"),
            ("3", Screen::Studio, "Studio"),
        ] {
            let style = if app.screen == screen {
                Style::default().fg(Color::Black).bg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!(" {} {} ", key, label), style));
        }
    }

    spans.push(Span::raw(" "));
    spans.push(Span::styled(app.api_base().to_string(), Style::default().fg(Color::Gray)));
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Gate => " LOCKED ",
        Screen::Dashboard => " NEWS ",
        Screen::Chat => " CHAT ",
        Screen::Studio => " STUDIO ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let pairs: Vec<(&'static str, &'static str)> = match (app.screen, app.input_mode) {
        (Screen::Gate, _) => vec![("Enter", "unlock"), ("Esc", "quit")],
        (_, InputMode::Editing) if app.attach_input.is_some() => {
            vec![("Enter", "attach"), ("Esc", "cancel")]
        }
        (Screen::Chat, InputMode::Editing) => {
            vec![("Enter", "send"), ("Tab", "mode"), ("Esc", "done")]
        }
        (_, InputMode::Editing) => vec![("Enter", "send"), ("Esc", "done")],
        (Screen::Dashboard, InputMode::Normal) => vec![
            ("j/k", "card"),
            ("Enter", "expand"),
            ("y", "copy link"),
            ("1-3", "screen"),
            ("q", "quit"),
        ],
        (Screen::Chat, InputMode::Normal) => vec![
            ("i", "type"),
            ("m", "mode"),
            ("j/k", "select"),
            ("y", "copy"),
            ("r", "regenerate"),
            ("C", "clear"),
            ("1-3", "screen"),
            ("q", "quit"),
        ],
        (Screen::Studio, InputMode::Normal) => vec![
            ("i", "type"),
            ("a", "attach"),
            ("x", "detach"),
            ("j/k", "select"),
            ("y", "copy"),
            ("r", "regenerate"),
            ("C", "clear"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.extend(hint(key, label));
    }

    // Gate errors are drawn in the popup instead
    if let Some(toast) = app.toast.as_ref().filter(|_| app.screen != Screen::Gate) {
        let color = if toast.is_error { Color::Red } else { Color::Green };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(toast.text.clone(), Style::default().fg(color).bold()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_gate(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 7;
    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(popup_width) / 2,
        area.y + area.height.saturating_sub(popup_height) / 2,
        popup_width,
        popup_height.min(area.height),
    );

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Phonebook ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if inner.height < 3 {
        return;
    }

    let instructions = Paragraph::new("Enter the passphrase to continue.")
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    // Input is masked
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let masked = "*".repeat(app.gate_input.text.chars().count().min(inner.width as usize));
    frame.render_widget(
        Paragraph::new(masked).style(Style::default().fg(Color::Cyan)),
        input_area,
    );
    let cursor_x = app.gate_input.cursor.min(input_area.width.saturating_sub(1) as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    if let Some(toast) = &app.toast {
        if inner.height > 4 {
            let status = Paragraph::new(toast.text.clone()).style(Style::default().fg(Color::Red).bold());
            frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
        }
    }
}

/// Topic plus the digest's date, when the feed has one
fn dashboard_title(topic: &str, generated_at: Option<&str>) -> String {
    match generated_at.map(format_date).filter(|d| !d.is_empty()) {
        Some(date) => format!(" News: {} · {} ", topic, date),
        None => format!(" News: {} ", topic),
    }
}

fn render_dashboard(app: &mut App, frame: &mut Frame, area: Rect) {
    let animation_frame = app.animation_frame;
    let dashboard = &mut app.dashboard;
    let generated_at = dashboard.feed.digest().and_then(|d| d.generated_at.as_deref());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(dashboard_title(&dashboard.topic, generated_at));
    let inner_height = block.inner(area).height;
    let inner_width = block.inner(area).width;

    let text = match dashboard.feed.state() {
        FeedState::Loading => Text::from(Span::styled(
            format!("beep boop{}", ".".repeat(animation_frame as usize % 3 + 1)),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )),
        FeedState::Empty => Text::from(Span::styled(
            "No news right now.",
            Style::default().fg(Color::Gray),
        )),
        FeedState::Ready(_) => {
            let mut lines: Vec<Line<'static>> = Vec::new();
            let mut selected_start = 0;
            let mut selected_end = 0;

            for (i, article) in dashboard.feed.articles().iter().enumerate() {
                let selected = i == dashboard.selected;
                if selected {
                    selected_start = wrapped_height(&lines, inner_width);
                }
                let card = card_lines(article, dashboard.expanded.contains(&i));
                lines.extend(mark(card, selected));
                if selected {
                    selected_end = wrapped_height(&lines, inner_width);
                }
                lines.push(Line::default());
            }

            dashboard.scroll = keep_visible(dashboard.scroll, selected_start, selected_end, inner_height);
            Text::from(lines)
        }
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((dashboard.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_conversation(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && app.attach_input.is_none();
    let animation_frame = app.animation_frame;
    let output_dir = app.output_dir().display().to_string();
    let view = match app.screen {
        Screen::Studio => &mut app.studio,
        _ => &mut app.chat,
    };

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    render_messages(view, frame, chat_area, animation_frame, &output_dir);
    render_input(view, frame, input_area, editing);
}

fn render_messages(
    view: &mut ConversationView,
    frame: &mut Frame,
    area: Rect,
    animation_frame: u8,
    output_dir: &str,
) {
    let title = if view.is_studio() {
        format!(" Studio: saving to {} ", output_dir)
    } else {
        format!(" Chat: {} ", view.mode.display_name())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    let inner = block.inner(area);

    let messages = view.conversation.messages();
    let text = if messages.is_empty() {
        let hint = if view.is_studio() {
            "Describe an image to generate, or press a to attach one to edit."
        } else {
            "Look up a company, a person, or the news. Press i to start typing."
        };
        Text::from(Span::styled(hint, Style::default().fg(Color::Gray)))
    } else {
        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut selected_span = (0, 0);

        for (i, message) in messages.iter().enumerate() {
            let selected = view.selected == Some(i);
            let start = wrapped_height(&lines, inner.width);
            lines.extend(mark(message_lines(message, animation_frame), selected));
            if selected {
                selected_span = (start, wrapped_height(&lines, inner.width));
            }
            lines.push(Line::default());
        }

        let total = wrapped_height(&lines, inner.width);
        let max_scroll = total.saturating_sub(inner.height as usize) as u16;
        view.scroll = if view.follow {
            max_scroll
        } else if view.selected.is_some() {
            keep_visible(view.scroll, selected_span.0, selected_span.1, inner.height)
        } else {
            view.scroll.min(max_scroll)
        };
        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((view.scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input(view: &ConversationView, frame: &mut Frame, area: Rect, editing: bool) {
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let mut title = format!(" {} ", view.mode.display_name());
    if let Some(path) = &view.attachment {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        title.push_str(&format!("[attached: {}] ", name));
    }
    if view.is_pending() {
        title.push_str("(waiting) ");
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    if view.input.is_empty() && !editing {
        let placeholder = Paragraph::new(view.mode.placeholder())
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    render_input_line(frame, area, block, &view.input, inner_width, editing);
}

/// Input box with horizontal scrolling that keeps the cursor visible
fn render_input_line(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    input: &InputLine,
    inner_width: usize,
    show_cursor: bool,
) {
    let scroll_offset = if inner_width == 0 {
        0
    } else if input.cursor >= inner_width {
        input.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = input.text.chars().skip(scroll_offset).take(inner_width).collect();
    let paragraph = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(paragraph, area);

    if show_cursor {
        let cursor_x = (input.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_attach_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let Some(input) = &app.attach_input else {
        return;
    };

    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = 3;
    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(popup_width) / 2,
        area.y + area.height.saturating_sub(popup_height) / 2,
        popup_width,
        popup_height.min(area.height),
    );

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Image to edit (path) ");
    let inner_width = popup_width.saturating_sub(2) as usize;
    render_input_line(frame, popup_area, block, input, inner_width, true);
}

/// Prefix each line with a selection bar when `selected`
fn mark(lines: Vec<Line<'static>>, selected: bool) -> Vec<Line<'static>> {
    let (bar, style) = if selected {
        ("▌ ", Style::default().fg(Color::Magenta))
    } else {
        ("  ", Style::default())
    };
    lines
        .into_iter()
        .map(|mut line| {
            line.spans.insert(0, Span::styled(bar, style));
            line
        })
        .collect()
}

/// Rows the lines take once wrapped to `width`. Approximate: counts
/// characters, not word breaks.
fn wrapped_height(lines: &[Line], width: u16) -> usize {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum()
}

/// Smallest scroll change that puts rows `start..end` on screen
fn keep_visible(scroll: u16, start: usize, end: usize, height: u16) -> u16 {
    let (scroll, height) = (scroll as usize, height as usize);
    let scroll = if start < scroll {
        start
    } else if end > scroll + height {
        // Prefer showing the start of a block taller than the screen
        end.saturating_sub(height).min(start)
    } else {
        scroll
    };
    scroll.min(u16::MAX as usize) as u16
}
