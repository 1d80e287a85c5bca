//! Input handling and keybindings

use crate::app::App;
use crate::render::HitTarget;
use crate::screen::contains;
use crate::ui::{self, SearchItem, SuggestionItem, TopbarItem};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use docnav_core::{PageEvent, ScrollBehavior, SearchEvent, SearchKey};

/// Result of handling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Rows moved per wheel notch
const WHEEL_ROWS: isize = 3;

/// Handle a key event
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<Action> {
    if !matches!(key.code, KeyCode::Modifier(_)) {
        app.clear_status_message();
    }

    // Handle Ctrl+C
    if matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    ) {
        app.quit();
        return Ok(Action::Quit);
    }

    // Ctrl+K opens or closes the search panel from anywhere
    if matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('k'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    ) {
        app.search(SearchEvent::ToggleOpen);
        return Ok(Action::Continue);
    }

    if app.page.search().is_focused() {
        handle_search_key(app, key);
        return Ok(Action::Continue);
    }

    if app.toc_focus {
        return Ok(handle_toc_key(app, key));
    }

    Ok(handle_content_key(app, key))
}

/// Keys while the search input has focus
fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key {
        KeyEvent {
            code: KeyCode::Esc, ..
        } => {
            app.search(SearchEvent::Key(SearchKey::Escape));
        }
        KeyEvent {
            code: KeyCode::Enter,
            modifiers,
            ..
        } => {
            let shift = modifiers.contains(KeyModifiers::SHIFT);
            app.search(SearchEvent::Key(SearchKey::Enter { shift }));
        }
        KeyEvent {
            code: KeyCode::Up, ..
        } => {
            app.search(SearchEvent::Key(SearchKey::Up));
        }
        KeyEvent {
            code: KeyCode::Down,
            ..
        } => {
            app.search(SearchEvent::Key(SearchKey::Down));
        }
        KeyEvent {
            code: KeyCode::Tab, ..
        } => {
            app.search(SearchEvent::Blur);
        }
        KeyEvent {
            code: KeyCode::Delete,
            ..
        } => {
            if let Some(index) = app.page.search().suggestion_index() {
                app.search(SearchEvent::SuggestionRemove(index));
            }
        }
        KeyEvent {
            code: KeyCode::Backspace,
            ..
        } => {
            let mut value = app.page.search().input().to_string();
            if value.pop().is_some() {
                app.search(SearchEvent::Input(value));
            }
        }
        KeyEvent {
            code: KeyCode::Char('u'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => {
            app.search(SearchEvent::Clear);
        }
        KeyEvent {
            code: KeyCode::Char('l'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => {
            app.search(SearchEvent::ClearRecent);
        }
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers,
            ..
        } if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            let key = match c.to_digit(10) {
                Some(digit) => SearchKey::Digit(digit as u8),
                None => SearchKey::Other,
            };
            if app.search(SearchEvent::Key(key)) {
                return;
            }
            let mut value = app.page.search().input().to_string();
            value.push(c);
            app.search(SearchEvent::Input(value));
        }
        _ => {}
    }
}

/// Keys while the navigation panel has focus
fn handle_toc_key(app: &mut App, key: KeyEvent) -> Action {
    match key {
        KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            ..
        } => {
            app.quit();
            return Action::Quit;
        }
        KeyEvent {
            code: KeyCode::Down,
            ..
        }
        | KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.toc_move(1),
        KeyEvent {
            code: KeyCode::Up, ..
        }
        | KeyEvent {
            code: KeyCode::Char('k'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.toc_move(-1),
        KeyEvent {
            code: KeyCode::Char('g'),
            modifiers: KeyModifiers::NONE,
            ..
        }
        | KeyEvent {
            code: KeyCode::Home,
            ..
        } => app.toc_move(isize::MIN),
        KeyEvent {
            code: KeyCode::Char('G'),
            ..
        }
        | KeyEvent {
            code: KeyCode::End, ..
        } => app.toc_move(isize::MAX),
        KeyEvent {
            code: KeyCode::Enter,
            ..
        } => {
            let entry = app.toc_selected;
            app.activate_toc_entry(entry);
        }
        KeyEvent {
            code: KeyCode::Esc, ..
        }
        | KeyEvent {
            code: KeyCode::Tab, ..
        } => app.blur_toc(),
        _ => {}
    }
    Action::Continue
}

/// Keys while reading
fn handle_content_key(app: &mut App, key: KeyEvent) -> Action {
    let page_rows = app.screen.page_rows().max(1) as isize;
    let motion = ScrollBehavior::for_motion(app.screen.reduced_motion);

    match key {
        KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            ..
        } => {
            app.quit();
            return Action::Quit;
        }
        KeyEvent {
            code: KeyCode::Down,
            ..
        }
        | KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.scroll_by(1),
        KeyEvent {
            code: KeyCode::Up, ..
        }
        | KeyEvent {
            code: KeyCode::Char('k'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.scroll_by(-1),
        KeyEvent {
            code: KeyCode::Char('d'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => app.scroll_by(page_rows / 2),
        KeyEvent {
            code: KeyCode::Char('u'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => app.scroll_by(-page_rows / 2),
        KeyEvent {
            code: KeyCode::PageDown,
            ..
        }
        | KeyEvent {
            code: KeyCode::Char(' '),
            ..
        } => app.scroll_by(page_rows),
        KeyEvent {
            code: KeyCode::PageUp,
            ..
        } => app.scroll_by(-page_rows),
        KeyEvent {
            code: KeyCode::Char('g'),
            modifiers: KeyModifiers::NONE,
            ..
        }
        | KeyEvent {
            code: KeyCode::Home,
            ..
        } => app.scroll_to(0, motion),
        KeyEvent {
            code: KeyCode::Char('G'),
            ..
        }
        | KeyEvent {
            code: KeyCode::End, ..
        } => app.scroll_to(usize::MAX, motion),
        KeyEvent {
            code: KeyCode::Tab, ..
        } => app.focus_toc(),
        KeyEvent {
            code: KeyCode::Char('o'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.toggle_toc(),
        KeyEvent {
            code: KeyCode::Char('/'),
            ..
        } => {
            let event = if app.page.search().is_open() {
                SearchEvent::Focus
            } else {
                SearchEvent::Open
            };
            app.search(event);
        }
        KeyEvent {
            code: KeyCode::Char('n'),
            modifiers: KeyModifiers::NONE,
            ..
        } => {
            app.search(SearchEvent::Next);
        }
        KeyEvent {
            code: KeyCode::Char('N'),
            ..
        } => {
            app.search(SearchEvent::Prev);
        }
        KeyEvent {
            code: KeyCode::Esc, ..
        } => {
            if app.page.search().is_open() {
                app.search(SearchEvent::Close);
            } else if app.page.nav_open() {
                app.dispatch(PageEvent::CloseNav);
            }
        }
        KeyEvent {
            code: KeyCode::Char('t'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.toggle_theme(),
        KeyEvent {
            code: KeyCode::Char('z'),
            modifiers: KeyModifiers::NONE,
            ..
        }
        | KeyEvent {
            code: KeyCode::Enter,
            ..
        } => app.toggle_current_section(),
        KeyEvent {
            code: KeyCode::Char('Z'),
            ..
        } => app.toggle_all(),
        KeyEvent {
            code: KeyCode::Char('y'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.copy_current_link(),
        KeyEvent {
            code: KeyCode::Char('r'),
            modifiers: KeyModifiers::NONE,
            ..
        } => {
            if let Err(e) = app.reload_document() {
                log::error!("{:#}", e);
                app.set_status_message(format!("Reload failed: {}", e));
            }
        }
        _ => {}
    }
    Action::Continue
}

/// Handle mouse events
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Result<()> {
    let MouseEvent { kind, column, row, .. } = mouse;

    match kind {
        MouseEventKind::Down(MouseButton::Left) => handle_mouse_down(app, column, row),
        MouseEventKind::Drag(MouseButton::Left) => app.nav_scrollbar_drag(row),
        MouseEventKind::Up(MouseButton::Left) => app.nav_scrollbar_release(),
        MouseEventKind::Moved => {
            let inside = app.screen.areas.toc.is_some_and(|toc| contains(toc, column, row));
            app.nav_hover(inside);
        }
        MouseEventKind::ScrollDown => handle_scroll(app, column, row, WHEEL_ROWS),
        MouseEventKind::ScrollUp => handle_scroll(app, column, row, -WHEEL_ROWS),
        _ => {}
    }

    Ok(())
}

/// Handle scroll wheel event
fn handle_scroll(app: &mut App, x: u16, y: u16, delta: isize) {
    match app.screen.areas.toc {
        Some(toc) if contains(toc, x, y) => {
            let offset = app.screen.toc_scroll.saturating_add_signed(delta);
            app.set_toc_scroll(offset);
        }
        _ => app.scroll_by(delta),
    }
}

/// Handle mouse down event; overlays are tested before what lies under them
fn handle_mouse_down(app: &mut App, x: u16, y: u16) {
    if let Some(item) = ui::suggestion_at(app, x, y) {
        let event = match item {
            SuggestionItem::Pick(index) => SearchEvent::SuggestionPick(index),
            SuggestionItem::Remove(index) => SearchEvent::SuggestionRemove(index),
            SuggestionItem::ClearRecent => SearchEvent::ClearRecent,
        };
        app.search(event);
        return;
    }

    let in_search_bar = app.screen.areas.search.is_some_and(|bar| contains(bar, x, y));
    if in_search_bar {
        let event = match ui::search_item_at(app, x, y) {
            Some(SearchItem::Input) | None => SearchEvent::Focus,
            Some(SearchItem::Prev) => SearchEvent::Prev,
            Some(SearchItem::Next) => SearchEvent::Next,
            Some(SearchItem::Clear) => SearchEvent::Clear,
        };
        app.search(event);
        return;
    }

    let topbar_item = ui::topbar_item_at(app, x, y);
    if app.page.search().is_open() && topbar_item != Some(TopbarItem::Search) {
        // Pressing anywhere outside the panel closes it
        app.search(SearchEvent::Close);
    }

    if let Some(item) = topbar_item {
        match item {
            TopbarItem::Nav => app.toggle_toc(),
            TopbarItem::ToggleAll => app.toggle_all(),
            TopbarItem::Search => {
                app.search(SearchEvent::ToggleOpen);
            }
            TopbarItem::Theme => app.toggle_theme(),
        }
        return;
    }

    if let Some(toc) = app.screen.areas.toc {
        if contains(toc, x, y) {
            if app.screen.areas.toc_track().is_some_and(|track| contains(track, x, y)) {
                app.nav_scrollbar_press(y);
            } else if let Some(entry) = app.screen.toc_entry_at(x, y) {
                app.activate_toc_entry(entry);
            }
            return;
        }
        if app.screen.narrow {
            // Backdrop of the overlay
            app.blur_toc();
            return;
        }
    }

    let Some((content_row, col)) = app.screen.content_row_at(x, y) else {
        return;
    };
    let target = app.screen.rendered.hit(content_row, col);
    match target {
        Some(HitTarget::CopyLink(control)) => app.copy_link(control),
        Some(HitTarget::SectionHeader { section, header }) => {
            app.click_section_header(section, header)
        }
        None => {}
    }
}
