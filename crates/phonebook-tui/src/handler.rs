use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputLine, InputMode, Screen};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.screen == Screen::Gate {
        handle_gate(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_gate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_gate(),
        KeyCode::Esc => app.should_quit = true,
        _ => {
            edit_line(&mut app.gate_input, key);
        }
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Screen switching and quit work everywhere outside of text entry
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('1') => return app.switch_to(Screen::Dashboard),
        KeyCode::Char('2') => return app.switch_to(Screen::Chat),
        KeyCode::Char('3') => return app.switch_to(Screen::Studio),
        _ => {}
    }

    match app.screen {
        Screen::Dashboard => handle_dashboard_normal(app, key),
        Screen::Chat | Screen::Studio => handle_conversation_normal(app, key),
        Screen::Gate => {}
    }
}

fn handle_dashboard_normal(app: &mut App, key: KeyEvent) {
    let dashboard = &mut app.dashboard;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => dashboard.select_next(),
        KeyCode::Char('k') | KeyCode::Up => dashboard.select_prev(),
        KeyCode::Char('g') => dashboard.selected = 0,
        KeyCode::Char('G') => {
            dashboard.selected = dashboard.feed.articles().len().saturating_sub(1);
        }
        KeyCode::Enter | KeyCode::Char(' ') => dashboard.toggle_expanded(),
        KeyCode::Char('y') => {
            if let Some(url) = dashboard.selected_url() {
                app.copy_text(&url, "Link copied");
            }
        }
        _ => {}
    }
}

fn handle_conversation_normal(app: &mut App, key: KeyEvent) {
    let studio = app.screen == Screen::Studio;

    match key.code {
        // Start typing
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,

        // Mode cycling (chat only)
        KeyCode::Char('m') | KeyCode::Tab if !studio => app.chat.cycle_mode(),

        // Studio attachment
        KeyCode::Char('a') if studio => app.begin_attach(),
        KeyCode::Char('x') if studio => {
            if app.studio.attachment.take().is_some() {
                app.show_info("Attachment removed");
            }
        }

        // Message selection
        KeyCode::Char('j') | KeyCode::Down => with_view(app, |v| v.select_next()),
        KeyCode::Char('k') | KeyCode::Up => with_view(app, |v| v.select_prev()),
        KeyCode::Esc => with_view(app, |v| v.deselect()),
        KeyCode::Char('G') | KeyCode::End => with_view(app, |v| v.deselect()),

        // Scrolling
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            with_view(app, |v| v.scroll_down(10))
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            with_view(app, |v| v.scroll_up(10))
        }
        KeyCode::PageDown => with_view(app, |v| v.scroll_down(10)),
        KeyCode::PageUp => with_view(app, |v| v.scroll_up(10)),

        // Message actions
        KeyCode::Char('y') => {
            let text = app.active_view().and_then(|v| v.selected_text());
            match text {
                Some(text) => {
                    app.copy_text(&text, "Copied to clipboard");
                }
                None => app.show_info("Select a message with j/k first"),
            }
        }
        KeyCode::Char('r') => {
            if !app.regenerate() {
                let pending = app.active_view().is_some_and(|v| v.is_pending());
                if pending {
                    app.show_info("Wait for the current request to finish");
                } else {
                    app.show_info("Select a bot reply to regenerate");
                }
            }
        }
        KeyCode::Char('C') => {
            with_view(app, |v| v.clear());
            app.show_info("Conversation cleared");
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if app.attach_input.is_some() {
        handle_attach_editing(app, key);
        return;
    }

    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Tab if app.screen == Screen::Chat => app.chat.cycle_mode(),
        KeyCode::Enter => {
            let pending = app.active_view().is_some_and(|v| v.is_pending());
            if app.send() {
                app.input_mode = InputMode::Normal;
            } else if pending {
                app.show_info("Wait for the current request to finish");
            }
        }
        _ => {
            let changed = app
                .active_view_mut()
                .is_some_and(|v| edit_line(&mut v.input, key));
            if changed {
                with_view(app, |v| v.persist());
            }
        }
    }
}

fn handle_attach_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_attach(),
        KeyCode::Enter => app.confirm_attach(),
        _ => {
            if let Some(input) = app.attach_input.as_mut() {
                edit_line(input, key);
            }
        }
    }
}

/// Cursor editing shared by every text box. Returns true if the text changed.
fn edit_line(input: &mut InputLine, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            input.backspace();
            true
        }
        KeyCode::Delete => {
            input.delete();
            true
        }
        KeyCode::Left => {
            input.left();
            false
        }
        KeyCode::Right => {
            input.right();
            false
        }
        KeyCode::Home => {
            input.home();
            false
        }
        KeyCode::End => {
            input.end();
            false
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.clear();
            true
        }
        KeyCode::Char(c) => {
            input.insert(c);
            true
        }
        _ => false,
    }
}

fn with_view(app: &mut App, f: impl FnOnce(&mut crate::app::ConversationView)) {
    if let Some(view) = app.active_view_mut() {
        f(view);
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => match app.screen {
            Screen::Dashboard => app.dashboard.select_next(),
            _ => with_view(app, |v| v.scroll_down(3)),
        },
        MouseEventKind::ScrollUp => match app.screen {
            Screen::Dashboard => app.dashboard.select_prev(),
            _ => with_view(app, |v| v.scroll_up(3)),
        },
        _ => {}
    }
}
