//! UI rendering
//!
//! Control positions are computed by the `*_items` functions so drawing and
//! mouse hit testing agree.

use std::ops::Range;

use docnav_core::config::ThemeVariant;
use docnav_core::copy_link::TOOLTIP_TEXT;
use docnav_core::search::NO_RESULTS;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::render::{COLUMN_WIDTH, ROW_HEIGHT};

/// Clickable controls in the top bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopbarItem {
    Nav,
    ToggleAll,
    Search,
    Theme,
}

/// Clickable controls in the search bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchItem {
    Input,
    Prev,
    Next,
    Clear,
}

/// Rows of the recent-query popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionItem {
    Pick(usize),
    Remove(usize),
    ClearRecent,
}

const SEARCH_PROMPT: &str = " / ";
const MAX_SUGGESTION_WIDTH: u16 = 48;

fn theme_label(variant: ThemeVariant) -> &'static str {
    match variant {
        ThemeVariant::Dark => "[◐ Dark]",
        ThemeVariant::Light => "[◑ Light]",
    }
}

/// Top bar controls with their column ranges and labels
pub fn topbar_items(app: &App) -> Vec<(Range<u16>, TopbarItem, String)> {
    let area = app.screen.areas.topbar;
    let mut items = Vec::new();

    let nav = "☰ Contents".to_string();
    let nav_end = area.x + 1 + nav.width() as u16;
    items.push((area.x + 1..nav_end, TopbarItem::Nav, nav));

    let right = [
        (TopbarItem::ToggleAll, format!("[{}]", app.page.toggle_all_label().text())),
        (TopbarItem::Search, "[/ Search]".to_string()),
        (TopbarItem::Theme, theme_label(app.theme_variant).to_string()),
    ];
    let total: u16 = right.iter().map(|(_, label)| label.width() as u16 + 1).sum();
    let mut x = (area.x + area.width).saturating_sub(total).max(nav_end + 1);
    for (item, label) in right {
        let end = x + label.width() as u16;
        if end > area.x + area.width {
            break;
        }
        items.push((x..end, item, label));
        x = end + 1;
    }
    items
}

pub fn topbar_item_at(app: &App, x: u16, y: u16) -> Option<TopbarItem> {
    let area = app.screen.areas.topbar;
    if y != area.y {
        return None;
    }
    topbar_items(app)
        .into_iter()
        .find(|(cols, _, _)| cols.contains(&x))
        .map(|(_, item, _)| item)
}

/// Search bar controls, right to left from the clear control
pub fn search_items(app: &App) -> Vec<(Range<u16>, SearchItem)> {
    let Some(area) = app.screen.areas.search else {
        return Vec::new();
    };
    let end = area.x + area.width;
    let clear = end.saturating_sub(2);
    let next = end.saturating_sub(4);
    let prev = end.saturating_sub(6);
    let input_start = area.x + SEARCH_PROMPT.width() as u16;
    vec![
        (input_start..input_end(app, area), SearchItem::Input),
        (prev..prev + 1, SearchItem::Prev),
        (next..next + 1, SearchItem::Next),
        (clear..clear + 1, SearchItem::Clear),
    ]
}

/// Column where the count and buttons begin
fn input_end(app: &App, area: Rect) -> u16 {
    let count = count_label(app);
    (area.x + area.width).saturating_sub(8 + count.width() as u16)
}

fn count_label(app: &App) -> String {
    let search = app.page.search();
    let count = search.count_display();
    if count.is_empty() {
        search.status_text().to_string()
    } else {
        count
    }
}

pub fn search_item_at(app: &App, x: u16, y: u16) -> Option<SearchItem> {
    let area = app.screen.areas.search?;
    if y != area.y {
        return None;
    }
    search_items(app)
        .into_iter()
        .find(|(cols, _)| cols.contains(&x))
        .map(|(_, item)| item)
}

/// Popup listing recent queries below the search bar
pub fn suggestions_rect(app: &App) -> Option<Rect> {
    let search = app.page.search();
    let bar = app.screen.areas.search?;
    if !search.suggestions_visible() || search.suggestions().is_empty() {
        return None;
    }
    let frame_bottom = app.screen.areas.status.y;
    let x = bar.x + SEARCH_PROMPT.width() as u16 - 1;
    let width = MAX_SUGGESTION_WIDTH.min(bar.width.saturating_sub(x - bar.x));
    let height = (search.suggestions().len() as u16 + 3)
        .min(frame_bottom.saturating_sub(bar.y + 1));
    (width > 4 && height > 2).then(|| Rect::new(x, bar.y + 1, width, height))
}

pub fn suggestion_at(app: &App, x: u16, y: u16) -> Option<SuggestionItem> {
    let rect = suggestions_rect(app)?;
    let inner = Rect::new(
        rect.x + 1,
        rect.y + 1,
        rect.width.saturating_sub(2),
        rect.height.saturating_sub(2),
    );
    if !crate::screen::contains(inner, x, y) {
        return None;
    }
    let row = usize::from(y - inner.y);
    let count = app.page.search().suggestions().len();
    if row < count {
        if x + 2 >= inner.x + inner.width {
            Some(SuggestionItem::Remove(row))
        } else {
            Some(SuggestionItem::Pick(row))
        }
    } else if row == count {
        Some(SuggestionItem::ClearRecent)
    } else {
        None
    }
}

/// Draw the UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    app.relayout();

    render_topbar(frame, app);
    render_content(frame, app);
    render_toc(frame, app);
    render_search(frame, app);
    render_tooltip(frame, app);
    render_status_bar(frame, app);
}

fn render_topbar(frame: &mut Frame, app: &App) {
    let area = app.screen.areas.topbar;
    frame.render_widget(Paragraph::new("").style(app.theme.topbar), area);

    let items = topbar_items(app);
    let nav_end = items.first().map_or(area.x, |(cols, _, _)| cols.end);
    let right_start = items.get(1).map_or(area.x + area.width, |(cols, _, _)| cols.start);

    for (cols, item, label) in &items {
        let mut style = app.theme.topbar_button;
        if *item == TopbarItem::Nav && app.toc_visible() {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if *item == TopbarItem::Search && app.page.search().is_open() {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let rect = Rect::new(cols.start, area.y, cols.end - cols.start, 1);
        frame.render_widget(Paragraph::new(label.as_str()).style(style), rect);
    }

    // Title between the two groups
    let title = app.page.title().map(str::to_string).unwrap_or_else(|| app.doc.display_name());
    let start = nav_end + 2;
    let end = right_start.saturating_sub(1);
    if end > start {
        let rect = Rect::new(start, area.y, end - start, 1);
        frame.render_widget(
            Paragraph::new(title).style(app.theme.topbar.add_modifier(Modifier::BOLD)),
            rect,
        );
    }
}

fn render_content(frame: &mut Frame, app: &App) {
    let area = app.screen.areas.content;
    let rendered = &app.screen.rendered;
    let start = app.screen.scroll.min(rendered.len());
    let end = (start + app.screen.page_rows()).min(rendered.len());
    let lines: Vec<Line> = rendered.lines[start..end].to_vec();

    frame.render_widget(Paragraph::new(lines).style(app.theme.base), area);

    if app.page.search().empty_state_visible() {
        let row = (end - start) as u16 + 1;
        let y = area.y + row.min(area.height.saturating_sub(1));
        let rect = Rect::new(area.x, y, area.width, 1);
        frame.render_widget(Paragraph::new(NO_RESULTS).style(app.theme.muted), rect);
    }
}

fn render_toc(frame: &mut Frame, app: &App) {
    let Some(area) = app.screen.areas.toc else {
        return;
    };
    let active = app.page.tracker().active_entry();

    let toc_lines: Vec<Line> = app
        .page
        .toc()
        .entries()
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let indent = "  ".repeat(usize::from(entry.depth.level()).saturating_sub(2));
            let text = format!("{}{}", indent, entry.text);

            if app.toc_focus && idx == app.toc_selected {
                Line::from(text).style(app.theme.toc_selected)
            } else if Some(idx) == active {
                Line::from(text).style(app.theme.toc_active)
            } else {
                Line::from(text).style(app.theme.base)
            }
        })
        .collect();

    let title = if app.toc_focus { "Contents [focused]" } else { "Contents" };
    let border_style = if app.toc_focus {
        app.theme.toc_active
    } else {
        Style::default().fg(app.theme.toc_border)
    };

    let toc_widget = Paragraph::new(toc_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .style(app.theme.base.bg(app.theme.toc_bg))
        .scroll((app.screen.toc_scroll as u16, 0));

    if app.screen.narrow {
        frame.render_widget(Clear, area);
    }
    frame.render_widget(toc_widget, area);
    render_nav_scrollbar(frame, app);
}

fn render_nav_scrollbar(frame: &mut Frame, app: &App) {
    if !app.nav_scrollbar.is_visible() {
        return;
    }
    let (Some(track), Some(thumb)) = (app.screen.areas.toc_track(), app.nav_thumb()) else {
        return;
    };
    let first = (thumb.top / ROW_HEIGHT).floor() as u16;
    let last = ((thumb.top + thumb.size) / ROW_HEIGHT).ceil() as u16;

    let buf = frame.buffer_mut();
    for row in 0..track.height {
        let (symbol, style) = if row >= first && row < last {
            ("┃", app.theme.scrollbar_thumb)
        } else {
            ("│", app.theme.scrollbar_track)
        };
        if let Some(cell) = buf.cell_mut((track.x, track.y + row)) {
            cell.set_symbol(symbol).set_style(style);
        }
    }
}

fn render_search(frame: &mut Frame, app: &App) {
    let Some(area) = app.screen.areas.search else {
        return;
    };
    let search = app.page.search();
    frame.render_widget(Paragraph::new("").style(app.theme.search_input), area);

    let prompt_rect = Rect::new(area.x, area.y, SEARCH_PROMPT.width() as u16, 1);
    frame.render_widget(
        Paragraph::new(SEARCH_PROMPT).style(app.theme.search_input.add_modifier(Modifier::BOLD)),
        prompt_rect,
    );

    let items = search_items(app);
    for (cols, item) in &items {
        let rect = Rect::new(cols.start, area.y, cols.end.saturating_sub(cols.start), 1);
        let widget = match item {
            SearchItem::Input => {
                // Keep the end of a long input in view
                let input = search.input();
                let room = usize::from(rect.width.saturating_sub(1));
                let skip = input.width().saturating_sub(room);
                let shown: String = input.chars().skip(skip).collect();
                Paragraph::new(shown).style(app.theme.search_input)
            }
            SearchItem::Prev | SearchItem::Next => {
                let symbol = if *item == SearchItem::Prev { "▲" } else { "▼" };
                let style = if search.nav_disabled() {
                    app.theme.muted
                } else {
                    app.theme.topbar_button
                };
                Paragraph::new(symbol).style(style)
            }
            SearchItem::Clear => Paragraph::new("✕").style(app.theme.topbar_button),
        };
        frame.render_widget(widget, rect);
    }

    let count = count_label(app);
    let count_start = input_end(app, area) + 1;
    let style = if !search.status_text().is_empty() {
        app.theme.error
    } else {
        app.theme.muted
    };
    frame.render_widget(
        Paragraph::new(count.clone()).style(style),
        Rect::new(count_start, area.y, count.width() as u16, 1),
    );

    if search.is_focused() {
        let input_start = area.x + SEARCH_PROMPT.width() as u16;
        let room = input_end(app, area).saturating_sub(input_start).saturating_sub(1);
        let cursor = input_start + (search.input().width() as u16).min(room);
        frame.set_cursor_position((cursor, area.y));
    }

    render_suggestions(frame, app);
}

fn render_suggestions(frame: &mut Frame, app: &App) {
    let Some(rect) = suggestions_rect(app) else {
        return;
    };
    let search = app.page.search();
    let width = usize::from(rect.width.saturating_sub(2));

    let mut lines: Vec<Line> = search
        .suggestions()
        .iter()
        .enumerate()
        .map(|(i, term)| {
            let label = format!("{} {}", i + 1, term);
            let pad = width.saturating_sub(label.width() + 2);
            let style = if search.suggestion_index() == Some(i) {
                app.theme.suggestion_selected
            } else {
                app.theme.suggestion
            };
            Line::from(vec![
                Span::styled(format!("{}{}", label, " ".repeat(pad)), style),
                Span::styled(" ×", app.theme.muted),
            ])
        })
        .collect();
    lines.push(Line::from(Span::styled("Clear recent", app.theme.link)));

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Recent"))
            .style(app.theme.suggestion),
        rect,
    );
}

fn render_tooltip(frame: &mut Frame, app: &App) {
    let Some(tooltip) = app.page.feedback().tooltip() else {
        return;
    };
    let frame_area = frame.area();
    let label = format!(" {} ", TOOLTIP_TEXT);
    let width = (label.width() as u16).min(frame_area.width);

    let col = (tooltip.x / COLUMN_WIDTH).max(0.0) as u16;
    let row = (tooltip.y / ROW_HEIGHT).max(0.0) as u16;
    let content = app.screen.areas.content;
    let y = if row > content.y { row - 1 } else { row + 1 };
    let x = col.min(frame_area.width.saturating_sub(width));
    if y >= app.screen.areas.status.y {
        return;
    }

    let rect = Rect::new(x, y, width, 1);
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(label).style(app.theme.tooltip), rect);
}

fn render_status_bar(frame: &mut Frame, app: &App) {
    let area = app.screen.areas.status;
    let filename = app.doc.display_name();
    let section_count = app.page.sections().len();

    let active = app
        .page
        .tracker()
        .active_entry()
        .and_then(|i| app.page.toc().get(i))
        .map(|entry| format!("  § {}", entry.text))
        .unwrap_or_default();

    let toc_indicator = if app.toc_visible() {
        if app.toc_focus {
            " [TOC*]"
        } else {
            " [TOC]"
        }
    } else {
        ""
    };

    let theme_str = match app.theme_variant {
        ThemeVariant::Dark => "DARK",
        ThemeVariant::Light => "LIGHT",
    };

    #[cfg(feature = "watch")]
    let watch_str = if app.watcher.is_some() {
        if app.doc.dirty_on_disk {
            "  [DIRTY]"
        } else {
            "  [WATCH]"
        }
    } else {
        ""
    };
    #[cfg(not(feature = "watch"))]
    let watch_str = "";

    let message = app
        .status_message
        .as_deref()
        .map(|m| format!("  {}", m))
        .unwrap_or_default();

    let status_text = format!(
        " docnav  {}  {} sections{}{}  [{}]{}{}",
        filename, section_count, active, toc_indicator, theme_str, watch_str, message
    );

    let status = Paragraph::new(Line::from(vec![Span::styled(
        status_text,
        Style::default()
            .fg(app.theme.status_bar_fg)
            .bg(app.theme.status_bar_bg)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(app.theme.status_bar_bg));

    frame.render_widget(status, area);
}
