//! In-page match highlighting
//!
//! Highlighting only ever touches text nodes: each occurrence of the needle
//! is split out of its text node and wrapped in a `mark` element. The
//! replaced text node is kept aside in [`Snapshots`] under the element that
//! was being highlighted; reverting puts it back and frees the pieces, so a
//! highlight/revert pair leaves the element byte-for-byte as it was and the
//! arena does not grow from one query to the next.

use std::collections::HashMap;
use std::ops::Range;

use crate::dom::{Dom, NodeId, NodeKind};

pub const MARK_TAG: &str = "mark";
pub const ACTIVE_MARK_CLASS: &str = "mark--active";

/// Elements whose text is eligible for highlighting
pub const HIGHLIGHT_TAGS: [&str; 5] = ["h2", "h3", "h4", "p", "li"];

fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Lower-case `text` one char at a time, keeping char boundaries aligned
/// with the input
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Byte ranges of non-overlapping, case-insensitive occurrences of `needle`
///
/// `needle` is folded here too, so callers may pass it in any case.
pub fn match_ranges(text: &str, needle: &str) -> Vec<Range<usize>> {
    let needle: Vec<char> = needle.chars().map(fold_char).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let chars: Vec<(usize, char)> = text.char_indices().map(|(i, c)| (i, fold_char(c))).collect();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + needle.len() <= chars.len() {
        let hit = chars[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|((_, c), n)| c == n);
        if hit {
            let start = chars[i].0;
            let end = chars
                .get(i + needle.len())
                .map(|(offset, _)| *offset)
                .unwrap_or(text.len());
            ranges.push(start..end);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    ranges
}

/// A piece of text after splitting around matches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

/// Split `text` into alternating plain and matched pieces; empty pieces are dropped
pub fn segments<'a>(text: &'a str, needle: &str) -> Vec<Segment<'a>> {
    let mut out = Vec::new();
    let mut last = 0;
    for range in match_ranges(text, needle) {
        if range.start > last {
            out.push(Segment::Plain(&text[last..range.start]));
        }
        out.push(Segment::Match(&text[range.clone()]));
        last = range.end;
    }
    if last < text.len() {
        out.push(Segment::Plain(&text[last..]));
    }
    out
}

/// A text node that was split around its matches
#[derive(Debug, Clone)]
struct Split {
    /// The untouched text node, detached while the pieces stand in for it
    original: NodeId,
    pieces: Vec<NodeId>,
}

/// What highlighting changed below each element, so it can be undone
///
/// Keyed by element identity. Entries whose owner has been dropped from the
/// document are never restored and are discarded by [`Snapshots::prune`].
#[derive(Debug, Default, Clone)]
pub struct Snapshots {
    saved: HashMap<NodeId, Vec<Split>>,
}

impl Snapshots {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, owner: NodeId, original: NodeId, pieces: Vec<NodeId>) {
        self.saved
            .entry(owner)
            .or_default()
            .push(Split { original, pieces });
    }

    /// Put the original text nodes back and free the pieces; returns false
    /// when nothing was saved or `owner` has left the document
    pub fn restore(&mut self, dom: &mut Dom, owner: NodeId) -> bool {
        let Some(splits) = self.saved.remove(&owner) else {
            return false;
        };
        if !dom.is_attached(owner) {
            release(dom, splits);
            return false;
        }
        // Newest first, so a split of an earlier piece unwinds before that piece
        for split in splits.into_iter().rev() {
            let Some(&first) = split.pieces.first() else {
                dom.free_subtree(split.original);
                continue;
            };
            dom.insert_before(first, split.original);
            for piece in split.pieces {
                dom.free_subtree(piece);
            }
        }
        true
    }

    /// Forget snapshots of elements that are no longer in the document
    pub fn prune(&mut self, dom: &mut Dom) {
        let stale: Vec<NodeId> = self
            .saved
            .keys()
            .copied()
            .filter(|owner| !dom.is_attached(*owner))
            .collect();
        for owner in stale {
            if let Some(splits) = self.saved.remove(&owner) {
                release(dom, splits);
            }
        }
    }

    pub fn contains(&self, owner: NodeId) -> bool {
        self.saved.contains_key(&owner)
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn clear(&mut self) {
        self.saved.clear();
    }
}

/// Free the originals of an abandoned entry; the pieces belong to the
/// detached owner
fn release(dom: &mut Dom, splits: Vec<Split>) {
    for split in splits {
        dom.free_subtree(split.original);
    }
}

/// Highlight targets below `section`, in document order
pub fn highlight_targets(dom: &Dom, section: NodeId) -> Vec<NodeId> {
    dom.query_all(section, |el| HIGHLIGHT_TAGS.iter().any(|tag| el.is(tag)))
}

fn inside_mark(dom: &Dom, text: NodeId) -> bool {
    dom.parent(text)
        .and_then(|parent| dom.closest(parent, |el| el.is(MARK_TAG)))
        .is_some()
}

/// Wrap every occurrence of `needle` in text below `element`; returns the
/// number of marks created
pub fn highlight_element(
    dom: &mut Dom,
    snapshots: &mut Snapshots,
    element: NodeId,
    needle: &str,
) -> usize {
    if needle.is_empty() {
        return 0;
    }

    let text_nodes: Vec<NodeId> = dom
        .descendants(element)
        .filter(|&node| match dom.kind(node) {
            NodeKind::Text(text) => !text.trim().is_empty(),
            NodeKind::Element(_) => false,
        })
        .filter(|&node| !inside_mark(dom, node))
        .collect();

    let mut created = 0;
    for node in text_nodes {
        let Some(text) = dom.text(node).map(str::to_owned) else {
            continue;
        };
        let pieces = segments(&text, needle);
        if !pieces.iter().any(|s| matches!(s, Segment::Match(_))) {
            continue;
        }

        let replacements: Vec<NodeId> = pieces
            .into_iter()
            .map(|piece| match piece {
                Segment::Plain(plain) => dom.create_text(plain),
                Segment::Match(matched) => {
                    created += 1;
                    let mark = dom.create_element(MARK_TAG);
                    let inner = dom.create_text(matched);
                    dom.append_child(mark, inner);
                    mark
                }
            })
            .collect();
        dom.replace_with(node, &replacements);
        snapshots.record(element, node, replacements);
    }
    created
}

/// Highlight every target element of a section
pub fn highlight_section(
    dom: &mut Dom,
    snapshots: &mut Snapshots,
    section: NodeId,
    needle: &str,
) -> usize {
    highlight_targets(dom, section)
        .into_iter()
        .map(|target| highlight_element(dom, snapshots, target, needle))
        .sum()
}

/// Revert highlighting below a section
pub fn clear_section(dom: &mut Dom, snapshots: &mut Snapshots, section: NodeId) {
    for target in highlight_targets(dom, section) {
        // Restoring an outer target detaches inner ones, which then no-op
        snapshots.restore(dom, target);
    }
}

/// All marks below `root`, in document order
pub fn collect_marks(dom: &Dom, root: NodeId) -> Vec<NodeId> {
    dom.query_all(root, |el| el.is(MARK_TAG))
}
