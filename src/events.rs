use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // The range editor captures all typing while open
    if app.range_input.is_some() {
        handle_range_input(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        // Direct view access
        KeyCode::Char('1') => app.set_view(View::Feed),
        KeyCode::Char('2') => app.set_view(View::Nodes),
        KeyCode::Char('3') => app.set_view(View::Decisions),
        KeyCode::Char('4') => app.set_view(View::Charts),
        KeyCode::Char('5') => app.set_view(View::Map),

        // Navigation (up/down for items, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Time window
        KeyCode::Char('w') => app.cycle_window(),
        KeyCode::Char('c') => app.start_custom_range(),

        // Chart and map
        KeyCode::Char('m') => app.cycle_metric(),
        KeyCode::Char('n') => app.cycle_node_filter(),

        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('e') => app.export(),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

/// Handle key input while the custom range editor is open
fn handle_range_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.apply_range_input(),
        KeyCode::Esc => app.cancel_range_input(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            if let Some(input) = app.range_input.as_mut() {
                input.toggle_focus();
            }
        }
        KeyCode::Backspace => {
            if let Some(input) = app.range_input.as_mut() {
                input.pop();
            }
        }
        KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '-' | ':' | 'T' | ' ') => {
            if let Some(input) = app.range_input.as_mut() {
                input.push(c);
            }
        }
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RangeField;
    use crate::dashboard::{Dashboard, DashboardOptions};
    use crate::data::ConnectionTracker;
    use crate::source::ApiGateway;
    use crate::ui::Theme;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn app() -> App {
        let tracker = Arc::new(ConnectionTracker::new());
        let gateway = ApiGateway::builder()
            .base_url("http://127.0.0.1:9")
            .tracker(tracker.clone())
            .build()
            .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let dashboard = Dashboard::new(Arc::new(gateway), tracker, tx, DashboardOptions::default());
        App::new(dashboard, rx, std::env::temp_dir(), Theme::dark())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_number_keys_select_views() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('4')));
        assert_eq!(app.current_view, View::Charts);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Map);
        handle_key_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.current_view, View::Feed);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_range_editor_captures_typing() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('c')));
        assert!(app.range_input.is_some());

        // 'q' is not a valid range character and must not quit
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        handle_key_event(&mut app, key(KeyCode::Char('2')));
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert!(app.running);

        let input = app.range_input.as_ref().unwrap();
        assert_eq!(input.start, "2");
        assert_eq!(input.focus, RangeField::End);

        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(app.range_input.is_none());
        assert!(app.dashboard.selection().is_draft());
    }
}
