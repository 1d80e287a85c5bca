//! Collapsible page sections
//!
//! The collapsed flag lives on the section element (`data-collapsed`) and is
//! mirrored to the header's `aria-expanded`; every state change goes through
//! [`Sections::set_expanded`] so the two never disagree.

use crate::dom::{Dom, Element, NodeId};
use crate::ids::SECTION_CLASS;

pub const COLLAPSIBLE_ATTR: &str = "data-collapsible";
pub const COLLAPSED_ATTR: &str = "data-collapsed";
pub const HEADER_CLASS: &str = "doc-section__header";
pub const BODY_CLASS: &str = "doc-section__body";
pub const COPY_LINK_ATTR: &str = "data-copy-link";

/// One `.doc-section` element and its parts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section {
    pub node: NodeId,
    pub header: Option<NodeId>,
    pub body: Option<NodeId>,
    pub collapsible: bool,
}

/// Keys a focused section header reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderKey {
    Enter,
    Space,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionEvent {
    /// Pointer activation somewhere inside a header
    HeaderClick { section: usize, target: NodeId },
    /// Key pressed while `focused` has focus inside a header
    HeaderKey {
        section: usize,
        key: HeaderKey,
        focused: NodeId,
    },
    ToggleAll,
    /// Make sure the content holding `node` is visible
    ExpandFor(NodeId),
    /// The URL fragment now names `fragment`
    ExpandFromHash(String),
}

/// Label state of the toggle-all control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleAllLabel {
    pub all_expanded: bool,
}

impl ToggleAllLabel {
    pub fn text(self) -> &'static str {
        if self.all_expanded {
            "Collapse all"
        } else {
            "Expand all"
        }
    }

    pub fn aria_label(self) -> &'static str {
        if self.all_expanded {
            "Collapse all sections"
        } else {
            "Expand all sections"
        }
    }
}

fn is_interactive(el: &Element) -> bool {
    el.is("button") || el.is("a") || el.has_attr(COPY_LINK_ATTR)
}

/// All sections of a page, in document order
#[derive(Clone, Debug, Default)]
pub struct Sections {
    sections: Vec<Section>,
}

impl Sections {
    /// Find the sections under `content_root` and wire up header attributes
    pub fn init(dom: &mut Dom, content_root: NodeId) -> Self {
        let nodes = dom.query_all(content_root, |el| el.has_class(SECTION_CLASS));
        let mut sections = Vec::with_capacity(nodes.len());

        for node in nodes {
            let header = dom.query(node, |el| el.has_class(HEADER_CLASS));
            let body = dom.query(node, |el| el.has_class(BODY_CLASS));
            let collapsible = dom
                .element(node)
                .is_some_and(|el| el.has_attr(COLLAPSIBLE_ATTR));

            if let (true, Some(header)) = (collapsible, header) {
                let collapsed = dom.attr(node, COLLAPSED_ATTR) == Some("true");
                dom.set_attr(header, "role", "button");
                dom.set_attr(header, "tabindex", "0");
                dom.set_attr(header, "aria-expanded", bool_str(!collapsed));

                if let Some(body) = body {
                    let body_id = match dom.id_of(body) {
                        Some(id) => id.to_string(),
                        None => {
                            let id = format!("{}-body", dom.id_of(node).unwrap_or("section"));
                            dom.set_attr(body, "id", id.clone());
                            id
                        }
                    };
                    dom.set_attr(header, "aria-controls", body_id);
                }
            }

            sections.push(Section {
                node,
                header,
                body,
                collapsible,
            });
        }

        Self { sections }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Index of the section whose element is `node`
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.sections.iter().position(|s| s.node == node)
    }

    /// Index of the section enclosing `node` (inclusive)
    pub fn section_of(&self, dom: &Dom, node: NodeId) -> Option<usize> {
        let section = dom.closest(node, |el| el.has_class(SECTION_CLASS))?;
        self.position(section)
    }

    fn collapsible_of(&self, dom: &Dom, node: NodeId) -> Option<usize> {
        let section = dom.closest(node, |el| {
            el.has_class(SECTION_CLASS) && el.has_attr(COLLAPSIBLE_ATTR)
        })?;
        self.position(section)
    }

    pub fn is_collapsed(&self, dom: &Dom, index: usize) -> bool {
        self.sections
            .get(index)
            .is_some_and(|s| dom.attr(s.node, COLLAPSED_ATTR) == Some("true"))
    }

    /// Set the collapsed flag and mirror it onto the header
    pub fn set_expanded(&self, dom: &mut Dom, index: usize, expand: bool) {
        let Some(section) = self.sections.get(index) else {
            return;
        };
        dom.set_attr(section.node, COLLAPSED_ATTR, bool_str(!expand));
        if let Some(header) = section.header {
            dom.set_attr(header, "aria-expanded", bool_str(expand));
        }
    }

    /// Flip a section; returns whether it is now expanded
    pub fn toggle(&self, dom: &mut Dom, index: usize) -> bool {
        let expand = self.is_collapsed(dom, index);
        self.set_expanded(dom, index, expand);
        expand
    }

    /// Expand a collapsed section; returns whether anything changed
    pub fn expand_if_collapsed(&self, dom: &mut Dom, index: usize) -> bool {
        if !self.is_collapsed(dom, index) {
            return false;
        }
        self.set_expanded(dom, index, true);
        true
    }

    /// True when no collapsible section is collapsed
    pub fn all_expanded(&self, dom: &Dom) -> bool {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.collapsible)
            .all(|(i, _)| !self.is_collapsed(dom, i))
    }

    /// Collapse everything if all are expanded, otherwise expand everything.
    /// Returns the new aggregate state (true = expanded).
    pub fn toggle_all(&self, dom: &mut Dom) -> bool {
        let expand = !self.all_expanded(dom);
        for (index, _) in self.sections.iter().enumerate().filter(|(_, s)| s.collapsible) {
            self.set_expanded(dom, index, expand);
        }
        expand
    }

    pub fn toggle_all_label(&self, dom: &Dom) -> ToggleAllLabel {
        ToggleAllLabel {
            all_expanded: self.all_expanded(dom),
        }
    }

    /// Expand the collapsible section holding `node`, if it is collapsed
    pub fn expand_enclosing(&self, dom: &mut Dom, node: NodeId) -> Option<usize> {
        let index = self.collapsible_of(dom, node)?;
        self.expand_if_collapsed(dom, index).then_some(index)
    }

    /// Expand the section holding the element named by a URL fragment
    pub fn expand_from_hash(&self, dom: &mut Dom, fragment: &str) -> Option<usize> {
        let id = fragment.strip_prefix('#').unwrap_or(fragment);
        let target = dom.get_element_by_id(id)?;
        self.expand_enclosing(dom, target)
    }

    /// Apply an event; returns the sections whose state changed
    pub fn handle(&self, dom: &mut Dom, event: SectionEvent) -> Vec<usize> {
        match event {
            SectionEvent::HeaderClick { section, target } => {
                if !self.is_toggle_target(dom, section)
                    || dom.closest(target, is_interactive).is_some()
                {
                    return Vec::new();
                }
                self.toggle(dom, section);
                vec![section]
            }
            SectionEvent::HeaderKey {
                section,
                key,
                focused,
            } => {
                if key == HeaderKey::Other
                    || !self.is_toggle_target(dom, section)
                    || dom.closest(focused, is_interactive).is_some()
                {
                    return Vec::new();
                }
                self.toggle(dom, section);
                vec![section]
            }
            SectionEvent::ToggleAll => {
                let before: Vec<bool> =
                    (0..self.len()).map(|i| self.is_collapsed(dom, i)).collect();
                self.toggle_all(dom);
                (0..self.len())
                    .filter(|&i| before[i] != self.is_collapsed(dom, i))
                    .collect()
            }
            SectionEvent::ExpandFor(node) => self.expand_enclosing(dom, node).into_iter().collect(),
            SectionEvent::ExpandFromHash(fragment) => {
                self.expand_from_hash(dom, &fragment).into_iter().collect()
            }
        }
    }

    fn is_toggle_target(&self, _dom: &Dom, index: usize) -> bool {
        self.sections
            .get(index)
            .is_some_and(|s| s.collapsible && s.header.is_some())
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
