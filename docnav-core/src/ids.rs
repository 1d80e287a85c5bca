//! Unique heading identifiers

use std::collections::HashSet;

use crate::dom::{Dom, NodeId};
use crate::slug::{slugify, FALLBACK_SLUG};

/// Class carried by every page section
pub const SECTION_CLASS: &str = "doc-section";

/// Heading tags that receive identifiers
pub const ID_HEADING_TAGS: [&str; 3] = ["h2", "h3", "h4"];

/// Identifiers in use on a page
#[derive(Debug, Default, Clone)]
pub struct IdRegistry {
    used: HashSet<String>,
}

impl IdRegistry {
    /// Seed the registry with every id currently on the page
    pub fn from_dom(dom: &Dom) -> Self {
        Self {
            used: dom.all_ids().into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    pub fn insert(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Return `base` or the first free `base-N` (N from 2) and reserve it
    pub fn claim(&mut self, base: &str) -> String {
        let base = if base.is_empty() { FALLBACK_SLUG } else { base };
        let mut id = base.to_string();
        let mut n = 2;
        while self.used.contains(&id) {
            id = format!("{}-{}", base, n);
            n += 1;
        }
        self.used.insert(id.clone());
        id
    }
}

/// Give every heading under `content_root` a page-unique id
///
/// Existing ids are left alone. A top-level heading inside an identified
/// section becomes `<section-id>-title`; everything else gets a slug of its
/// text. Returns the headings that were assigned, in document order.
pub fn ensure_heading_ids(dom: &mut Dom, content_root: NodeId) -> Vec<(NodeId, String)> {
    let mut registry = IdRegistry::from_dom(dom);
    let headings = dom.query_all(content_root, |el| ID_HEADING_TAGS.contains(&el.tag()));
    let mut assigned = Vec::new();

    for heading in headings {
        if let Some(existing) = dom.id_of(heading) {
            registry.insert(existing);
            continue;
        }

        let section_id = dom
            .closest(heading, |el| el.has_class(SECTION_CLASS))
            .and_then(|section| dom.id_of(section))
            .map(str::to_string);

        let id = match section_id {
            Some(section_id) if dom.is_tag(heading, "h2") => {
                registry.claim(&format!("{}-title", section_id))
            }
            _ => registry.claim(&slugify(&dom.text_content(heading))),
        };

        log::trace!("assigned heading id {}", id);
        dom.set_attr(heading, "id", id.clone());
        assigned.push((heading, id));
    }

    assigned
}
