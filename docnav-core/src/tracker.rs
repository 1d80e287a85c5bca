//! Scroll-driven active TOC entry tracking

use crate::config::TrackerConfig;
use crate::dom::{Dom, NodeId};
use crate::toc::Toc;
use crate::view::{Bounds, Command, ScrollBehavior, Viewport};

/// Vertical position of the activation line for a given header height
pub fn activation_line(header_height: f64, offset: f64) -> f64 {
    let header_height = if header_height.is_finite() {
        header_height
    } else {
        0.0
    };
    header_height + offset
}

/// Index of the last entry whose top has crossed the activation line
///
/// `tops` must be in document order. Entries that are not laid out (`None`)
/// are skipped. Scanning stops at the first entry still below the line, and
/// the first entry wins when none has crossed.
pub fn active_index<I>(tops: I, line: f64, tolerance: f64) -> usize
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut current = 0;
    for (index, top) in tops.into_iter().enumerate() {
        let Some(top) = top else {
            continue;
        };
        if top - line <= tolerance {
            current = index;
        } else {
            break;
        }
    }
    current
}

/// Whether `item` sticks out of `panel` once `padding` is taken off both edges
pub fn needs_reveal(panel: Bounds, item: Bounds, padding: f64) -> bool {
    item.top < panel.top + padding || item.bottom > panel.bottom - padding
}

/// Things that make the tracker look at the layout again
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerEvent {
    Scroll,
    Resize,
    /// The URL fragment changed; layout settles on the next turn
    HashChange,
    AnimationFrame,
    NextTurn,
}

#[derive(Clone, Copy, Debug)]
struct TrackedItem {
    entry: usize,
    node: NodeId,
}

/// Keeps exactly one TOC entry active while the page scrolls
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    config: TrackerConfig,
    items: Vec<TrackedItem>,
    active: Option<usize>,
    header_height: f64,
    frame_pending: bool,
    deferred_pending: bool,
    recomputes: usize,
}

impl ScrollTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
            active: None,
            header_height: 0.0,
            frame_pending: false,
            deferred_pending: false,
            recomputes: 0,
        }
    }

    /// Resolve TOC targets against the page and compute the initial active entry
    pub fn attach(&mut self, dom: &Dom, toc: &Toc, view: &dyn Viewport) -> Vec<Command> {
        self.items = toc
            .entries()
            .iter()
            .enumerate()
            .filter_map(|(entry, e)| {
                dom.get_element_by_id(&e.target)
                    .map(|node| TrackedItem { entry, node })
            })
            .collect();
        self.active = None;
        self.frame_pending = false;
        self.deferred_pending = false;
        self.header_height = view.header_height();

        if self.items.is_empty() {
            log::debug!("no TOC targets resolved; tracker idle");
            return Vec::new();
        }
        self.recompute(view)
    }

    pub fn handle(&mut self, event: TrackerEvent, view: &dyn Viewport) -> Vec<Command> {
        match event {
            TrackerEvent::Resize => {
                self.header_height = view.header_height();
                self.schedule_frame()
            }
            TrackerEvent::Scroll => self.schedule_frame(),
            TrackerEvent::HashChange => {
                self.deferred_pending = true;
                Vec::new()
            }
            TrackerEvent::AnimationFrame => {
                if !std::mem::take(&mut self.frame_pending) {
                    return Vec::new();
                }
                self.recompute(view)
            }
            TrackerEvent::NextTurn => {
                if !std::mem::take(&mut self.deferred_pending) {
                    return Vec::new();
                }
                self.recompute(view)
            }
        }
    }

    fn schedule_frame(&mut self) -> Vec<Command> {
        if self.frame_pending || self.items.is_empty() {
            return Vec::new();
        }
        self.frame_pending = true;
        vec![Command::RequestAnimationFrame]
    }

    fn recompute(&mut self, view: &dyn Viewport) -> Vec<Command> {
        if self.items.is_empty() {
            return Vec::new();
        }
        self.recomputes += 1;

        let line = self.activation_line();
        let tops = self.items.iter().map(|item| view.top_of(item.node));
        let index = active_index(tops, line, self.config.tolerance);
        let entry = self.items[index].entry;
        self.active = Some(entry);

        let (Some(panel), Some(item)) = (view.nav_bounds(), view.nav_entry_bounds(entry)) else {
            return Vec::new();
        };
        if !needs_reveal(panel, item, self.config.nav_padding) {
            return Vec::new();
        }
        vec![Command::RevealNavEntry {
            entry,
            behavior: ScrollBehavior::for_motion(view.prefers_reduced_motion()),
        }]
    }

    /// Index of the active TOC entry
    pub fn active_entry(&self) -> Option<usize> {
        self.active
    }

    /// Element targeted by the active entry
    pub fn active_node(&self) -> Option<NodeId> {
        let active = self.active?;
        self.items
            .iter()
            .find(|item| item.entry == active)
            .map(|item| item.node)
    }

    pub fn activation_line(&self) -> f64 {
        activation_line(self.header_height, self.config.activation_offset)
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame_pending
    }

    /// How many times the layout has been scanned
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::{TocDepth, TocEntry};
    use std::collections::HashMap;

    struct FakeView {
        header: f64,
        tops: HashMap<NodeId, f64>,
        nav: Option<Bounds>,
        entries: Vec<Bounds>,
        reduced: bool,
    }

    impl Viewport for FakeView {
        fn header_height(&self) -> f64 {
            self.header
        }
        fn top_of(&self, node: NodeId) -> Option<f64> {
            self.tops.get(&node).copied()
        }
        fn nav_bounds(&self) -> Option<Bounds> {
            self.nav
        }
        fn nav_entry_bounds(&self, entry: usize) -> Option<Bounds> {
            self.entries.get(entry).copied()
        }
        fn prefers_reduced_motion(&self) -> bool {
            self.reduced
        }
    }

    fn page(ids: &[&str]) -> (Dom, Toc, Vec<NodeId>) {
        let mut dom = Dom::new();
        let mut nodes = Vec::new();
        let mut entries = Vec::new();
        for id in ids {
            let h = dom.create_element("h3");
            dom.set_attr(h, "id", *id);
            let root = dom.root();
            dom.append_child(root, h);
            nodes.push(h);
            entries.push(TocEntry {
                target: id.to_string(),
                depth: TocDepth::Three,
                text: id.to_string(),
            });
        }
        let toc = Toc::from_entries(entries);
        (dom, toc, nodes)
    }

    fn view(nodes: &[NodeId], tops: &[f64]) -> FakeView {
        FakeView {
            header: 60.0,
            tops: nodes.iter().copied().zip(tops.iter().copied()).collect(),
            nav: None,
            entries: Vec::new(),
            reduced: false,
        }
    }

    #[test]
    fn test_active_index_basics() {
        let line = activation_line(60.0, 16.0);
        assert_eq!(line, 76.0);
        let tops = [Some(-200.0), Some(40.0), Some(78.0), Some(300.0)];
        assert_eq!(active_index(tops, line, 2.0), 2);
        assert_eq!(active_index([Some(500.0), Some(900.0)], line, 2.0), 0);
        assert_eq!(active_index(Vec::<Option<f64>>::new(), line, 2.0), 0);
    }

    #[test]
    fn test_active_index_stops_at_first_failure() {
        // Out-of-order input: the scan never looks past the first miss
        let tops = [Some(0.0), Some(500.0), Some(0.0)];
        assert_eq!(active_index(tops, 76.0, 2.0), 0);
    }

    #[test]
    fn test_active_index_skips_unlaid_entries() {
        let tops = [Some(0.0), None, Some(10.0), Some(400.0)];
        assert_eq!(active_index(tops, 76.0, 2.0), 2);
    }

    #[test]
    fn test_activation_is_monotonic_in_scroll() {
        let positions = [0.0, 120.0, 480.0, 900.0, 1400.0];
        let line = activation_line(48.0, 16.0);
        let mut last = 0;
        for scroll in (0..2000).step_by(7) {
            let scroll = scroll as f64;
            let tops = positions.iter().map(|p| Some(p - scroll));
            let index = active_index(tops, line, 2.0);
            assert!(index >= last, "index went backwards at scroll {}", scroll);
            last = index;
        }
        assert_eq!(last, positions.len() - 1);
    }

    #[test]
    fn test_non_finite_header_counts_as_zero() {
        assert_eq!(activation_line(f64::NAN, 16.0), 16.0);
    }

    #[test]
    fn test_needs_reveal() {
        let panel = Bounds::new(100.0, 400.0);
        assert!(!needs_reveal(panel, Bounds::new(150.0, 170.0), 12.0));
        assert!(needs_reveal(panel, Bounds::new(105.0, 125.0), 12.0));
        assert!(needs_reveal(panel, Bounds::new(380.0, 395.0), 12.0));
    }

    #[test]
    fn test_attach_computes_initial_entry() {
        let (dom, toc, nodes) = page(&["a", "b", "c"]);
        let v = view(&nodes, &[10.0, 70.0, 600.0]);
        let mut tracker = ScrollTracker::new(TrackerConfig::default());
        tracker.attach(&dom, &toc, &v);
        assert_eq!(tracker.active_entry(), Some(1));
        assert_eq!(tracker.active_node(), Some(nodes[1]));
    }

    #[test]
    fn test_scroll_is_coalesced_per_frame() {
        let (dom, toc, nodes) = page(&["a", "b"]);
        let mut v = view(&nodes, &[100.0, 600.0]);
        let mut tracker = ScrollTracker::new(TrackerConfig::default());
        tracker.attach(&dom, &toc, &v);
        let baseline = tracker.recompute_count();

        let first = tracker.handle(TrackerEvent::Scroll, &v);
        assert_eq!(first, vec![Command::RequestAnimationFrame]);
        for _ in 0..10 {
            assert!(tracker.handle(TrackerEvent::Scroll, &v).is_empty());
        }
        assert_eq!(tracker.recompute_count(), baseline);

        v.tops.insert(nodes[0], -500.0);
        v.tops.insert(nodes[1], 0.0);
        tracker.handle(TrackerEvent::AnimationFrame, &v);
        assert_eq!(tracker.recompute_count(), baseline + 1);
        assert_eq!(tracker.active_entry(), Some(1));

        // No pending frame: nothing to do
        tracker.handle(TrackerEvent::AnimationFrame, &v);
        assert_eq!(tracker.recompute_count(), baseline + 1);
    }

    #[test]
    fn test_hash_change_is_deferred() {
        let (dom, toc, nodes) = page(&["a", "b"]);
        let mut v = view(&nodes, &[100.0, 600.0]);
        let mut tracker = ScrollTracker::new(TrackerConfig::default());
        tracker.attach(&dom, &toc, &v);

        assert!(tracker.handle(TrackerEvent::HashChange, &v).is_empty());
        assert_eq!(tracker.active_entry(), Some(0));

        v.tops.insert(nodes[0], -100.0);
        v.tops.insert(nodes[1], 20.0);
        tracker.handle(TrackerEvent::NextTurn, &v);
        assert_eq!(tracker.active_entry(), Some(1));
    }

    #[test]
    fn test_resize_rereads_header() {
        let (dom, toc, nodes) = page(&["a", "b"]);
        let mut v = view(&nodes, &[0.0, 100.0]);
        let mut tracker = ScrollTracker::new(TrackerConfig::default());
        tracker.attach(&dom, &toc, &v);
        assert_eq!(tracker.active_entry(), Some(0));

        v.header = 90.0;
        tracker.handle(TrackerEvent::Resize, &v);
        tracker.handle(TrackerEvent::AnimationFrame, &v);
        assert_eq!(tracker.activation_line(), 106.0);
        assert_eq!(tracker.active_entry(), Some(1));
    }

    #[test]
    fn test_reveal_only_when_outside_panel() {
        let (dom, toc, nodes) = page(&["a", "b"]);
        let mut v = view(&nodes, &[0.0, 10.0]);
        v.nav = Some(Bounds::new(0.0, 100.0));
        v.entries = vec![Bounds::new(20.0, 40.0), Bounds::new(120.0, 140.0)];
        let mut tracker = ScrollTracker::new(TrackerConfig::default());

        let commands = tracker.attach(&dom, &toc, &v);
        assert_eq!(
            commands,
            vec![Command::RevealNavEntry {
                entry: 1,
                behavior: ScrollBehavior::Smooth
            }]
        );

        v.entries[1] = Bounds::new(50.0, 70.0);
        v.reduced = true;
        tracker.handle(TrackerEvent::Scroll, &v);
        assert!(tracker.handle(TrackerEvent::AnimationFrame, &v).is_empty());

        v.entries[1] = Bounds::new(95.0, 115.0);
        tracker.handle(TrackerEvent::Scroll, &v);
        assert_eq!(
            tracker.handle(TrackerEvent::AnimationFrame, &v),
            vec![Command::RevealNavEntry {
                entry: 1,
                behavior: ScrollBehavior::Instant
            }]
        );
    }

    #[test]
    fn test_missing_targets_are_ignored() {
        let (dom, _, nodes) = page(&["a"]);
        let toc = Toc::from_entries(vec![
            TocEntry {
                target: "ghost".into(),
                depth: TocDepth::Two,
                text: "Ghost".into(),
            },
            TocEntry {
                target: "a".into(),
                depth: TocDepth::Three,
                text: "A".into(),
            },
        ]);
        let v = view(&nodes, &[500.0]);
        let mut tracker = ScrollTracker::new(TrackerConfig::default());
        tracker.attach(&dom, &toc, &v);
        assert_eq!(tracker.active_entry(), Some(1));
    }

    #[test]
    fn test_empty_toc_is_idle() {
        let dom = Dom::new();
        let v = view(&[], &[]);
        let mut tracker = ScrollTracker::new(TrackerConfig::default());
        assert!(tracker.attach(&dom, &Toc::default(), &v).is_empty());
        assert!(tracker.handle(TrackerEvent::Scroll, &v).is_empty());
        assert_eq!(tracker.active_entry(), None);
    }
}
