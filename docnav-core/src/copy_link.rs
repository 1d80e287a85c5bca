//! Copying shareable section links

use std::time::{Duration, Instant};

use crate::clipboard::ClipboardChain;
use crate::dom::{Dom, NodeId};
use crate::ids::SECTION_CLASS;
use crate::location::Location;

pub const TOOLTIP_TEXT: &str = "Link Copied!";
pub const TOOLTIP_DURATION: Duration = Duration::from_millis(900);
pub const COPIED_DURATION: Duration = Duration::from_millis(1200);
pub const COPIED_CLASS: &str = "is-copied";

/// Link to the section enclosing `control`; sections without id have none
pub fn section_link(dom: &Dom, location: &Location, control: NodeId) -> Option<String> {
    let section = dom.closest(control, |el| el.has_class(SECTION_CLASS))?;
    let id = dom.id_of(section)?;
    Some(location.link_to(id))
}

/// A visible "Link Copied!" tooltip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tooltip {
    pub x: f64,
    pub y: f64,
    pub until: Instant,
}

/// Transient feedback after a successful copy
#[derive(Debug, Default)]
pub struct CopyFeedback {
    tooltip: Option<Tooltip>,
    copied: Option<(NodeId, Instant)>,
}

impl CopyFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the tooltip at (x, y) and mark `control` as copied
    pub fn show(&mut self, dom: &mut Dom, control: NodeId, x: f64, y: f64, now: Instant) {
        self.tooltip = Some(Tooltip {
            x,
            y,
            until: now + TOOLTIP_DURATION,
        });
        if let Some((previous, _)) = self.copied.take() {
            if previous != control {
                dom.toggle_class(previous, COPIED_CLASS, false);
            }
        }
        dom.toggle_class(control, COPIED_CLASS, true);
        self.copied = Some((control, now + COPIED_DURATION));
    }

    /// Expire timed-out feedback
    pub fn tick(&mut self, dom: &mut Dom, now: Instant) {
        if self.tooltip.is_some_and(|t| t.until <= now) {
            self.tooltip = None;
        }
        if let Some((control, until)) = self.copied {
            if until <= now {
                dom.toggle_class(control, COPIED_CLASS, false);
                self.copied = None;
            }
        }
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.tooltip
    }

    pub fn copied_control(&self) -> Option<NodeId> {
        self.copied.map(|(control, _)| control)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let tooltip = self.tooltip.map(|t| t.until);
        let copied = self.copied.map(|(_, until)| until);
        match (tooltip, copied) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Copy the link of the section holding `control`; true when it reached a clipboard
///
/// The tooltip is offset from the pointer the way the page shows it.
#[allow(clippy::too_many_arguments)]
pub fn copy_section_link(
    dom: &mut Dom,
    location: &Location,
    clipboard: &mut ClipboardChain,
    feedback: &mut CopyFeedback,
    control: NodeId,
    x: f64,
    y: f64,
    now: Instant,
) -> bool {
    let Some(url) = section_link(dom, location, control) else {
        log::debug!("copy link ignored: section has no id");
        return false;
    };
    if !clipboard.copy(&url) {
        log::warn!("could not copy {}", url);
        return false;
    }
    log::debug!("copied {}", url);
    feedback.show(dom, control, x + 10.0, y - 10.0, now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::tests::FakeClipboard;
    use crate::clipboard::ClipboardWriter;

    fn page() -> (Dom, NodeId, NodeId) {
        let mut dom = Dom::new();
        let html = dom.root();
        let mut buttons = Vec::new();
        for id in [Some("intro"), None] {
            let section = dom.create_element("section");
            dom.set_attr(section, "class", SECTION_CLASS);
            if let Some(id) = id {
                dom.set_attr(section, "id", id);
            }
            let button = dom.create_element("button");
            dom.set_attr(button, "data-copy-link", "");
            dom.append_child(html, section);
            dom.append_child(section, button);
            buttons.push(button);
        }
        (dom, buttons[0], buttons[1])
    }

    fn chain(fake: &FakeClipboard) -> ClipboardChain {
        let primary: Box<dyn ClipboardWriter> = Box::new(fake.clone());
        ClipboardChain::new(Some(primary), None)
    }

    #[test]
    fn test_section_link_maps_null_origin() {
        let (dom, with_id, without_id) = page();
        let loc = Location::new("null", "/home/me/manual.md", "");
        assert_eq!(
            section_link(&dom, &loc, with_id).as_deref(),
            Some("file:///home/me/manual.md#intro")
        );
        assert_eq!(section_link(&dom, &loc, without_id), None);
    }

    #[test]
    fn test_copy_shows_feedback_then_expires() {
        let (mut dom, button, _) = page();
        let loc = Location::new("https://docs.example.com", "/m/", "");
        let fake = FakeClipboard::default();
        let mut clipboard = chain(&fake);
        let mut feedback = CopyFeedback::new();
        let t0 = Instant::now();

        assert!(copy_section_link(
            &mut dom,
            &loc,
            &mut clipboard,
            &mut feedback,
            button,
            100.0,
            50.0,
            t0
        ));
        assert_eq!(fake.written.borrow().as_slice(), ["https://docs.example.com/m/#intro"]);
        let tip = feedback.tooltip().unwrap();
        assert_eq!((tip.x, tip.y), (110.0, 40.0));
        assert!(dom.has_class(button, COPIED_CLASS));

        feedback.tick(&mut dom, t0 + Duration::from_millis(900));
        assert!(feedback.tooltip().is_none());
        assert!(dom.has_class(button, COPIED_CLASS));

        feedback.tick(&mut dom, t0 + Duration::from_millis(1200));
        assert!(!dom.has_class(button, COPIED_CLASS));
        assert_eq!(feedback.next_deadline(), None);
    }

    #[test]
    fn test_failed_copy_reports_nothing() {
        let (mut dom, button, without_id) = page();
        let loc = Location::new("null", "/m.md", "");
        let fake = FakeClipboard {
            fail: true,
            ..Default::default()
        };
        let mut clipboard = chain(&fake);
        let mut feedback = CopyFeedback::new();
        let now = Instant::now();

        assert!(!copy_section_link(
            &mut dom,
            &loc,
            &mut clipboard,
            &mut feedback,
            button,
            0.0,
            0.0,
            now
        ));
        assert!(!copy_section_link(
            &mut dom,
            &loc,
            &mut clipboard,
            &mut feedback,
            without_id,
            0.0,
            0.0,
            now
        ));
        assert!(feedback.tooltip().is_none());
        assert!(!dom.has_class(button, COPIED_CLASS));
    }

    #[test]
    fn test_new_copy_clears_previous_mark() {
        let mut dom = Dom::new();
        let a = dom.create_element("button");
        let b = dom.create_element("button");
        let mut feedback = CopyFeedback::new();
        let now = Instant::now();
        feedback.show(&mut dom, a, 0.0, 0.0, now);
        feedback.show(&mut dom, b, 0.0, 0.0, now);
        assert!(!dom.has_class(a, COPIED_CLASS));
        assert!(dom.has_class(b, COPIED_CLASS));
        assert_eq!(feedback.copied_control(), Some(b));
    }
}
