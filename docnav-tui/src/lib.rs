//! docnav TUI - Terminal user interface components
//!
//! This crate hosts a [`docnav_core::Page`] on a terminal:
//! - App state and the host side of the page commands
//! - Event loop and input handling
//! - Layout of the page tree into terminal lines
//! - Navigation panel, search bar and status bar
//! - Theme system

pub mod app;
pub mod input;
pub mod render;
pub mod screen;
pub mod terminal;
pub mod theme;
pub mod ui;

#[cfg(feature = "watch")]
pub mod watcher;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyEventKind};
use std::time::{Duration, Instant};

// Re-export main types
pub use app::App;

/// Longest sleep between loop turns
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Run the TUI application
pub fn run(mut app: App) -> Result<()> {
    let mut terminal = terminal::init().context("Failed to initialize terminal")?;

    // Main event loop
    let result = run_loop(&mut terminal, &mut app);

    // Always restore terminal, even if run_loop fails
    terminal::restore().context("Failed to restore terminal")?;

    result
}

fn run_loop(terminal: &mut terminal::Tui, app: &mut App) -> Result<()> {
    let size = terminal.size().context("Failed to read terminal size")?;
    app.resize(size.width, size.height);
    app.start();

    loop {
        app.update(Instant::now());

        terminal
            .draw(|frame| ui::draw(frame, app))
            .context("Failed to draw frame")?;

        if app.should_quit {
            break;
        }

        if crossterm::event::poll(poll_timeout(app)).context("Failed to poll events")? {
            match crossterm::event::read().context("Failed to read event")? {
                // Only handle key press events, ignore release
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if input::handle_input(app, key)? == input::Action::Quit {
                        break;
                    }
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse)?,
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }
    }

    Ok(())
}

/// How long the loop may sleep before something is due
fn poll_timeout(app: &App) -> Duration {
    if app.is_animating() {
        return app::FRAME_INTERVAL;
    }
    match app.next_deadline() {
        Some(due) => due.saturating_duration_since(Instant::now()).min(IDLE_POLL),
        None => IDLE_POLL,
    }
}
