//! Screen layout and the [`Viewport`] the page controllers read
//!
//! Rows map to [`ROW_HEIGHT`] units measured from the top of the terminal.

use std::rc::Rc;

use docnav_core::config::{TocConfig, TocSide};
use docnav_core::{Bounds, NodeId, Viewport};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::render::{RenderedPage, ROW_HEIGHT};

/// Below this width the navigation panel becomes an overlay
pub const NARROW_WIDTH: u16 = 80;

/// Where each part of the screen is drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Areas {
    pub topbar: Rect,
    /// Search bar, when the search panel is open
    pub search: Option<Rect>,
    /// Navigation panel including its border
    pub toc: Option<Rect>,
    /// Text area of the document
    pub content: Rect,
    pub status: Rect,
}

impl Areas {
    /// Rows inside the navigation panel border
    pub fn toc_inner(&self) -> Option<Rect> {
        self.toc.map(|toc| Rect {
            x: toc.x + 1,
            y: toc.y + 1,
            width: toc.width.saturating_sub(2),
            height: toc.height.saturating_sub(2),
        })
    }

    /// The navigation scrollbar runs down the panel's right border
    pub fn toc_track(&self) -> Option<Rect> {
        self.toc_inner().map(|inner| Rect {
            x: inner.x + inner.width,
            y: inner.y,
            width: 1,
            height: inner.height,
        })
    }
}

/// What is on screen right now
#[derive(Debug, Clone, Default)]
pub struct Screen {
    pub areas: Areas,
    pub narrow: bool,
    pub rendered: Rc<RenderedPage>,
    /// First content row shown
    pub scroll: usize,
    /// First navigation entry shown
    pub toc_scroll: usize,
    pub toc_len: usize,
    pub reduced_motion: bool,
}

/// Whether a rect contains a cell
pub fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Split the terminal into areas
///
/// `show_toc` applies to wide terminals, `nav_open` to narrow ones.
pub fn compute_layout(
    area: Rect,
    toc: &TocConfig,
    show_toc: bool,
    nav_open: bool,
    search_open: bool,
) -> (Areas, bool) {
    let narrow = area.width < NARROW_WIDTH;

    let mut constraints = vec![Constraint::Length(1)];
    if search_open {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(1));
    constraints.push(Constraint::Length(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let topbar = rows[0];
    let (search, main, status) = if search_open {
        (Some(rows[1]), rows[2], rows[3])
    } else {
        (None, rows[1], rows[2])
    };

    let toc_width = toc.width.clamp(12, main.width.max(12));
    let (toc_rect, content) = if !toc.enabled {
        (None, main)
    } else if narrow {
        let overlay = nav_open.then(|| {
            let width = toc_width.min(main.width);
            let x = match toc.side {
                TocSide::Left => main.x,
                TocSide::Right => main.x + main.width - width,
            };
            Rect { x, width, ..main }
        });
        (overlay, main)
    } else if show_toc {
        let chunks = match toc.side {
            TocSide::Left => Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(toc_width), Constraint::Min(1)])
                .split(main),
            TocSide::Right => Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(1), Constraint::Length(toc_width)])
                .split(main),
        };
        match toc.side {
            TocSide::Left => (Some(chunks[0]), chunks[1]),
            TocSide::Right => (Some(chunks[1]), chunks[0]),
        }
    } else {
        (None, main)
    };

    // One column of padding on each side of the text
    let content = Rect {
        x: content.x + 1,
        width: content.width.saturating_sub(2).max(1),
        ..content
    };

    (
        Areas {
            topbar,
            search,
            toc: toc_rect,
            content,
            status,
        },
        narrow,
    )
}

impl Screen {
    /// Rows of document text that fit
    pub fn page_rows(&self) -> usize {
        usize::from(self.areas.content.height)
    }

    /// Largest useful scroll offset
    pub fn max_scroll(&self) -> usize {
        self.rendered.len().saturating_sub(self.page_rows())
    }

    /// Entries that fit in the navigation panel
    pub fn toc_rows(&self) -> usize {
        self.areas.toc_inner().map_or(0, |inner| usize::from(inner.height))
    }

    pub fn max_toc_scroll(&self) -> usize {
        self.toc_len.saturating_sub(self.toc_rows())
    }

    /// Content row under a terminal cell
    pub fn content_row_at(&self, x: u16, y: u16) -> Option<(usize, u16)> {
        let content = self.areas.content;
        let padded = Rect {
            x: content.x.saturating_sub(1),
            width: content.width + 2,
            ..content
        };
        if !contains(padded, x, y) {
            return None;
        }
        let row = self.scroll + usize::from(y - content.y);
        (row < self.rendered.len()).then(|| (row, x.saturating_sub(content.x)))
    }

    /// Navigation entry under a terminal cell
    pub fn toc_entry_at(&self, x: u16, y: u16) -> Option<usize> {
        let inner = self.areas.toc_inner()?;
        if !contains(inner, x, y) {
            return None;
        }
        let entry = self.toc_scroll + usize::from(y - inner.y);
        (entry < self.toc_len).then_some(entry)
    }

    /// Screen row a content row is drawn on, possibly off screen
    fn screen_row(&self, row: usize) -> f64 {
        f64::from(self.areas.content.y) + row as f64 - self.scroll as f64
    }
}

impl Viewport for Screen {
    fn header_height(&self) -> f64 {
        f64::from(self.areas.content.y) * ROW_HEIGHT
    }

    fn top_of(&self, node: NodeId) -> Option<f64> {
        self.rendered
            .row_of(node)
            .map(|row| self.screen_row(row) * ROW_HEIGHT)
    }

    fn nav_bounds(&self) -> Option<Bounds> {
        let inner = self.areas.toc_inner()?;
        let top = f64::from(inner.y) * ROW_HEIGHT;
        Some(Bounds::new(top, top + f64::from(inner.height) * ROW_HEIGHT))
    }

    fn nav_entry_bounds(&self, entry: usize) -> Option<Bounds> {
        let inner = self.areas.toc_inner()?;
        if entry >= self.toc_len {
            return None;
        }
        let row = f64::from(inner.y) + entry as f64 - self.toc_scroll as f64;
        Some(Bounds::new(row * ROW_HEIGHT, (row + 1.0) * ROW_HEIGHT))
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}
