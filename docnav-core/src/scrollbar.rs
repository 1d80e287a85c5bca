//! Geometry and visibility of the navigation panel's scrollbar

use std::time::{Duration, Instant};

/// Smallest thumb drawn, in viewport units
pub const MIN_THUMB: f64 = 20.0;
pub const HIDE_DELAY: Duration = Duration::from_millis(600);
pub const LEAVE_HIDE_DELAY: Duration = Duration::from_millis(150);

/// Scroll state of the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Height of everything in the panel
    pub content: f64,
    /// Visible height of the panel
    pub viewport: f64,
    pub offset: f64,
}

impl ScrollMetrics {
    pub fn max_offset(&self) -> f64 {
        (self.content - self.viewport).max(0.0)
    }

    /// True when the content fits without scrolling
    pub fn fits(&self) -> bool {
        self.content <= self.viewport + 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thumb {
    /// Distance from the top of the track
    pub top: f64,
    pub size: f64,
}

impl Thumb {
    pub fn contains(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.size
    }
}

/// Thumb for a track of height `track`; `None` when no scrollbar is shown
pub fn thumb(metrics: ScrollMetrics, track: f64) -> Option<Thumb> {
    if metrics.fits() || track <= 0.0 {
        return None;
    }
    let size = ((metrics.viewport / metrics.content) * track).round().max(MIN_THUMB);
    let max_top = (track - size).max(0.0);
    let max_offset = metrics.max_offset();
    let top = if max_offset <= 0.0 {
        0.0
    } else {
        ((metrics.offset / max_offset) * max_top).round()
    };
    Some(Thumb { top, size })
}

/// Panel offset after dragging the thumb by `delta` from where it was grabbed
pub fn drag_offset(
    start_offset: f64,
    delta: f64,
    metrics: ScrollMetrics,
    track: f64,
    thumb_size: f64,
) -> f64 {
    let max_top = (track - thumb_size).max(0.0);
    let max_offset = metrics.max_offset();
    let moved = if max_top > 0.0 {
        (delta / max_top) * max_offset
    } else {
        0.0
    };
    (start_offset + moved).clamp(0.0, max_offset)
}

/// Panel offset that centers the thumb on a click at `y` on the track
pub fn track_click_offset(y: f64, metrics: ScrollMetrics, track: f64, thumb_size: f64) -> f64 {
    let max_top = (track - thumb_size).max(0.0);
    let max_offset = metrics.max_offset();
    let target = (y - thumb_size / 2.0).clamp(0.0, max_top);
    if max_top > 0.0 {
        (target / max_top) * max_offset
    } else {
        0.0
    }
}

/// Shows the scrollbar while the panel is scrolled, hovered or dragged
#[derive(Debug, Default, Clone)]
pub struct ScrollbarVisibility {
    visible: bool,
    hovering: bool,
    dragging: bool,
    hide_at: Option<Instant>,
}

impl ScrollbarVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_scroll(&mut self, now: Instant) {
        self.visible = true;
        self.hide_at = Some(now + HIDE_DELAY);
    }

    pub fn on_enter(&mut self) {
        self.hovering = true;
        self.visible = true;
    }

    pub fn on_leave(&mut self, now: Instant) {
        self.hovering = false;
        self.hide_at = Some(now + LEAVE_HIDE_DELAY);
    }

    pub fn on_drag_start(&mut self) {
        self.dragging = true;
        self.visible = true;
    }

    pub fn on_drag_end(&mut self, now: Instant) {
        self.dragging = false;
        self.hide_at = Some(now + HIDE_DELAY);
    }

    pub fn tick(&mut self, now: Instant) {
        if self.hide_at.is_some_and(|at| at <= now) {
            self.hide_at = None;
            if !self.hovering && !self.dragging {
                self.visible = false;
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.hide_at
    }
}
