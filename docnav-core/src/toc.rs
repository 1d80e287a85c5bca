//! Table of Contents extraction from the page tree

use crate::dom::{Dom, NodeId};
use crate::ids::SECTION_CLASS;

/// Nesting depth of a TOC entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TocDepth {
    Two,
    Three,
}

impl TocDepth {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h2" => Some(Self::Two),
            "h3" => Some(Self::Three),
            _ => None,
        }
    }

    /// Class applied to the navigation link
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Two => "toc__depth-2",
            Self::Three => "toc__depth-3",
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// One navigation entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Id of the element the entry scrolls to
    pub target: String,
    pub depth: TocDepth,
    pub text: String,
}

impl TocEntry {
    pub fn href(&self) -> String {
        format!("#{}", self.target)
    }
}

/// Entries in document order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Toc {
    entries: Vec<TocEntry>,
}

impl Toc {
    pub fn from_entries(entries: Vec<TocEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&TocEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry targeting `id`
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.target == id)
    }
}

/// Build the TOC from `h2`/`h3` headings under `content_root`
///
/// Run after [`crate::ids::ensure_heading_ids`]. A `h2` inside an identified
/// section targets the section, so navigation lands on the section container.
pub fn build_toc(dom: &Dom, content_root: NodeId) -> Toc {
    let headings = dom.query_all(content_root, |el| TocDepth::from_tag(el.tag()).is_some());

    let entries = headings
        .into_iter()
        .filter_map(|heading| {
            let depth = dom.element(heading).and_then(|el| TocDepth::from_tag(el.tag()))?;
            let section_id = dom
                .closest(heading, |el| el.has_class(SECTION_CLASS))
                .and_then(|section| dom.id_of(section));

            let target = match (depth, section_id) {
                (TocDepth::Two, Some(section_id)) => section_id,
                _ => dom.id_of(heading)?,
            };

            Some(TocEntry {
                target: target.to_string(),
                depth,
                text: dom.text_content(heading).trim().to_string(),
            })
        })
        .collect();

    Toc { entries }
}
