//! The seam between page controllers and whatever displays the page
//!
//! Controllers read live layout through [`Viewport`] and ask the host to do
//! things by returning [`Command`]s.

use crate::dom::NodeId;

/// A vertical extent in viewport units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }
}

/// Read access to the live layout
pub trait Viewport {
    /// Height of the fixed header bar
    fn header_height(&self) -> f64;

    /// Top edge of a node relative to the viewport top, if it is laid out
    fn top_of(&self, node: NodeId) -> Option<f64>;

    /// Visible extent of the navigation panel
    fn nav_bounds(&self) -> Option<Bounds>;

    /// Extent of a navigation entry, in the same coordinates as [`Viewport::nav_bounds`]
    fn nav_entry_bounds(&self, entry: usize) -> Option<Bounds>;

    fn prefers_reduced_motion(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

impl ScrollBehavior {
    pub fn for_motion(reduced_motion: bool) -> Self {
        if reduced_motion {
            Self::Instant
        } else {
            Self::Smooth
        }
    }
}

/// Where the scrolled-to node should end up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
    Nearest,
}

/// Work the host performs on behalf of a controller
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    ScrollIntoView {
        node: NodeId,
        block: ScrollBlock,
        behavior: ScrollBehavior,
    },
    /// Scroll the navigation panel just enough to show an entry
    RevealNavEntry {
        entry: usize,
        behavior: ScrollBehavior,
    },
    /// Record `#<fragment>` in session history without navigating
    PushHash(String),
    CloseNavOverlay,
    /// Schedule a call to the animation-frame handler
    RequestAnimationFrame,
}
