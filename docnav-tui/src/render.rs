//! Page layout into terminal lines, and the render cache
//!
//! One terminal row is [`ROW_HEIGHT`] viewport units tall, so the page
//! controllers see the same coordinate space a browser would give them.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::rc::Rc;

use docnav_core::config::ThemeVariant;
use docnav_core::copy_link::COPIED_CLASS;
use docnav_core::dom::{Dom, Element, NodeId, NodeKind};
use docnav_core::highlight::{ACTIVE_MARK_CLASS, MARK_TAG};
use docnav_core::ids::SECTION_CLASS;
use docnav_core::search::HIDDEN_ATTR;
use docnav_core::sections::{Sections, BODY_CLASS, COPY_LINK_ATTR, HEADER_CLASS};
use docnav_core::Page;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// Viewport units per terminal row
pub const ROW_HEIGHT: f64 = 16.0;
/// Viewport units per terminal column
pub const COLUMN_WIDTH: f64 = 8.0;

const COPY_LABEL: &str = "[#]";
const COPIED_LABEL: &str = "[✓]";

const INLINE_TAGS: [&str; 12] = [
    "a", "br", "code", "del", "em", "img", "input", MARK_TAG, "span", "strong", "sub", "sup",
];

/// Key for render cache
#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub struct RenderKey {
    pub doc_rev: u64,
    pub generation: u64,
    pub width: u16,
    pub theme: ThemeVariant,
}

/// Something clickable in the content area
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    SectionHeader { section: usize, header: NodeId },
    CopyLink(NodeId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HitRegion {
    pub row: usize,
    pub cols: Range<u16>,
    pub target: HitTarget,
}

/// Laid-out page
#[derive(Clone, Debug, Default)]
pub struct RenderedPage {
    pub lines: Vec<Line<'static>>,
    node_rows: HashMap<NodeId, usize>,
    hits: Vec<HitRegion>,
}

impl RenderedPage {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First row a node is drawn on; `None` when it is not drawn
    pub fn row_of(&self, node: NodeId) -> Option<usize> {
        self.node_rows.get(&node).copied()
    }

    /// Innermost target at a content row and column
    pub fn hit(&self, row: usize, col: u16) -> Option<HitTarget> {
        self.hits
            .iter()
            .filter(|h| h.row == row && h.cols.contains(&col))
            .min_by_key(|h| h.cols.len())
            .map(|h| h.target)
    }

    /// Row and first column of a drawn copy control
    pub fn control_position(&self, control: NodeId) -> Option<(usize, u16)> {
        self.hits
            .iter()
            .find(|h| h.target == HitTarget::CopyLink(control))
            .map(|h| (h.row, h.cols.start))
    }
}

/// LRU cache for rendered pages
pub struct RendererCache {
    cache: lru::LruCache<RenderKey, Rc<RenderedPage>>,
}

impl RendererCache {
    pub fn new() -> Self {
        Self {
            cache: lru::LruCache::new(NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    pub fn get_or_render(
        &mut self,
        key: RenderKey,
        render: impl FnOnce() -> RenderedPage,
    ) -> Rc<RenderedPage> {
        if let Some(page) = self.cache.get(&key) {
            return Rc::clone(page);
        }
        log::trace!("rendering {:?}", key);
        let page = Rc::new(render());
        self.cache.put(key, Rc::clone(&page));
        page
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RendererCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Lay out the page's content for a content area `width` columns wide
pub fn render_page(page: &Page, width: u16, theme: &Theme) -> RenderedPage {
    let mut renderer = Renderer {
        dom: page.dom(),
        sections: page.sections(),
        theme,
        width: usize::from(width.max(1)),
        out: RenderedPage::default(),
        prefixes: Vec::new(),
        spans: Vec::new(),
        col: 0,
        pending_space: None,
        pending_nodes: Vec::new(),
        list_depth: 0,
        pre: false,
        last_blank: false,
    };
    renderer.block(page.content_root());
    renderer.flush();

    let mut out = renderer.out;
    while out.lines.last().is_some_and(|line| line.width() == 0) {
        out.lines.pop();
    }
    out
}

/// Text drawn before each line of a nested block
struct PrefixLevel {
    first: String,
    rest: String,
    style: Style,
    used: bool,
}

impl PrefixLevel {
    fn new(first: impl Into<String>, rest: impl Into<String>, style: Style) -> Self {
        Self {
            first: first.into(),
            rest: rest.into(),
            style,
            used: false,
        }
    }

    fn current(&self) -> &str {
        if self.used {
            &self.rest
        } else {
            &self.first
        }
    }
}

struct Renderer<'a> {
    dom: &'a Dom,
    sections: &'a Sections,
    theme: &'a Theme,
    width: usize,
    out: RenderedPage,
    prefixes: Vec<PrefixLevel>,
    /// Content of the line being built
    spans: Vec<Span<'static>>,
    col: usize,
    pending_space: Option<Style>,
    /// Inline elements whose row is known once their first word lands
    pending_nodes: Vec<NodeId>,
    list_depth: usize,
    pre: bool,
    last_blank: bool,
}

fn is_inline(el: &Element) -> bool {
    INLINE_TAGS.contains(&el.tag())
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Split into alternating whitespace and word runs
fn tokens(text: &str) -> Vec<(bool, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut space = None;
    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        match space {
            Some(prev) if prev != is_space => {
                out.push((prev, &text[start..i]));
                start = i;
            }
            _ => {}
        }
        space = Some(is_space);
    }
    if let Some(prev) = space {
        out.push((prev, &text[start..]));
    }
    out
}

impl<'a> Renderer<'a> {
    fn row(&self) -> usize {
        self.out.lines.len()
    }

    fn prefix_width(&self) -> usize {
        self.prefixes.iter().map(|p| p.current().width()).sum()
    }

    fn avail(&self) -> usize {
        self.width.saturating_sub(self.prefix_width()).max(1)
    }

    fn record(&mut self, node: NodeId) {
        let row = self.row();
        self.out.node_rows.entry(node).or_insert(row);
    }

    fn resolve_pending(&mut self) {
        let row = self.row();
        for node in self.pending_nodes.drain(..) {
            self.out.node_rows.entry(node).or_insert(row);
        }
    }

    /// Push a finished line with the current prefixes
    fn emit(&mut self, content: Vec<Span<'static>>) {
        self.last_blank = content.is_empty();
        let mut spans = Vec::with_capacity(self.prefixes.len() + content.len());
        for level in &mut self.prefixes {
            let text = level.current().to_string();
            level.used = true;
            if !text.is_empty() {
                spans.push(Span::styled(text, level.style));
            }
        }
        spans.extend(content);
        self.out.lines.push(Line::from(spans));
    }

    fn flush(&mut self) {
        if self.spans.is_empty() && self.pending_nodes.is_empty() {
            return;
        }
        self.resolve_pending();
        let spans = std::mem::take(&mut self.spans);
        self.emit(spans);
        self.col = 0;
        self.pending_space = None;
    }

    fn break_line(&mut self) {
        self.resolve_pending();
        let spans = std::mem::take(&mut self.spans);
        self.emit(spans);
        self.last_blank = false;
        self.col = 0;
        self.pending_space = None;
    }

    fn blank(&mut self) {
        self.flush();
        if self.list_depth > 0 || self.out.lines.is_empty() || self.last_blank {
            return;
        }
        self.emit(Vec::new());
    }

    fn push_span(&mut self, text: &str, style: Style) {
        if let Some(last) = self.spans.last_mut() {
            if last.style == style {
                let mut merged = last.content.to_string();
                merged.push_str(text);
                last.content = merged.into();
                return;
            }
        }
        self.spans.push(Span::styled(text.to_string(), style));
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if self.pre {
            for (i, part) in text.split('\n').enumerate() {
                if i > 0 {
                    self.break_line();
                }
                if !part.is_empty() {
                    self.resolve_pending();
                    self.push_span(part, style);
                    self.col += part.width();
                }
            }
            return;
        }

        for (is_space, token) in tokens(text) {
            if is_space {
                if self.col > 0 {
                    self.pending_space = Some(style);
                }
            } else {
                self.place_word(token, style);
            }
        }
    }

    fn place_word(&mut self, word: &str, style: Style) {
        let width = word.width();
        let mut space = self.pending_space.take().filter(|_| self.col > 0);
        if self.col > 0 && self.col + usize::from(space.is_some()) + width > self.avail() {
            self.flush();
            space = None;
        }
        if let Some(space_style) = space {
            self.push_span(" ", space_style);
            self.col += 1;
        }
        self.resolve_pending();

        if width <= self.avail() {
            self.push_span(word, style);
            self.col += width;
            return;
        }

        // Longer than a whole line: hard-wrap by character
        let mut chunk = String::new();
        for c in word.chars() {
            let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if self.col + w > self.avail() && self.col > 0 {
                self.push_span(&chunk, style);
                chunk.clear();
                self.flush();
            }
            chunk.push(c);
            self.col += w;
        }
        if !chunk.is_empty() {
            self.push_span(&chunk, style);
        }
    }

    fn block(&mut self, node: NodeId) {
        let dom = self.dom;
        let el = match dom.kind(node) {
            NodeKind::Text(text) => {
                self.push_text(text, self.theme.base);
                return;
            }
            NodeKind::Element(el) => el,
        };
        if el.has_attr(HIDDEN_ATTR) {
            return;
        }
        if is_inline(el) {
            self.inline(node, self.theme.base);
            return;
        }

        let tag = el.tag();
        if let Some(level) = heading_level(tag) {
            self.flush();
            self.record(node);
            self.inline_children(node, self.theme.heading_style(level));
            self.blank();
            return;
        }

        match tag {
            "section" if el.has_class(SECTION_CLASS) => self.section(node),
            "p" => {
                self.flush();
                self.record(node);
                self.inline_children(node, self.theme.base);
                self.blank();
            }
            "ul" | "ol" => self.list(node, tag == "ol"),
            "pre" => self.pre(node),
            "blockquote" => {
                self.flush();
                self.record(node);
                self.prefixes.push(PrefixLevel::new("│ ", "│ ", self.theme.quote));
                self.children_blocks(node);
                self.flush();
                self.prefixes.pop();
                self.blank();
            }
            "table" => self.table(node),
            "hr" => {
                self.flush();
                self.record(node);
                let rule = "─".repeat(self.avail());
                self.emit(vec![Span::styled(rule, self.theme.muted)]);
                self.blank();
            }
            "div" if el.has_class("footnote") => {
                self.flush();
                self.record(node);
                let label = el.id().and_then(|id| id.strip_prefix("fn-")).unwrap_or("");
                let first = format!("[{}] ", label);
                let rest = " ".repeat(first.width());
                self.prefixes.push(PrefixLevel::new(first, rest, self.theme.muted));
                self.children_blocks(node);
                self.flush();
                self.prefixes.pop();
                self.blank();
            }
            _ => {
                self.flush();
                self.record(node);
                self.children_blocks(node);
                self.flush();
            }
        }
    }

    fn children_blocks(&mut self, node: NodeId) {
        let dom = self.dom;
        for &child in dom.children(node) {
            self.block(child);
        }
    }

    fn inline_children(&mut self, node: NodeId, style: Style) {
        let dom = self.dom;
        for &child in dom.children(node) {
            match dom.element(child) {
                Some(el) if !is_inline(el) => self.block(child),
                _ => self.inline(child, style),
            }
        }
    }

    fn inline_style(&self, el: &Element, style: Style) -> Style {
        match el.tag() {
            "em" => style.add_modifier(Modifier::ITALIC),
            "strong" => style.add_modifier(Modifier::BOLD),
            "del" => style.add_modifier(Modifier::CROSSED_OUT),
            "code" => style.patch(self.theme.code),
            "a" => style.patch(self.theme.link),
            MARK_TAG if el.has_class(ACTIVE_MARK_CLASS) => style.patch(self.theme.mark_active),
            MARK_TAG => style.patch(self.theme.mark),
            _ => style,
        }
    }

    fn inline(&mut self, node: NodeId, style: Style) {
        let dom = self.dom;
        let el = match dom.kind(node) {
            NodeKind::Text(text) => {
                self.push_text(text, style);
                return;
            }
            NodeKind::Element(el) => el,
        };
        if el.has_attr(HIDDEN_ATTR) {
            return;
        }
        self.pending_nodes.push(node);

        match el.tag() {
            "br" => self.break_line(),
            "img" => {
                let alt = el.attr("alt").filter(|a| !a.is_empty()).unwrap_or("image");
                self.push_text(&format!("[image: {}]", alt), self.theme.muted);
            }
            "input" if el.attr("type") == Some("checkbox") => {
                let label = if el.has_attr("checked") { "[x]" } else { "[ ]" };
                self.push_text(label, self.theme.list_marker);
            }
            "sup" => {
                self.push_text("[", self.theme.muted);
                self.inline_children(node, self.theme.muted);
                self.push_text("]", self.theme.muted);
            }
            _ => {
                let style = self.inline_style(el, style);
                self.inline_children(node, style);
            }
        }
    }

    fn list(&mut self, node: NodeId, ordered: bool) {
        self.flush();
        self.record(node);
        let dom = self.dom;
        let mut number: u64 = dom
            .attr(node, "start")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        self.list_depth += 1;
        for &item in dom.children(node) {
            if !dom.is_tag(item, "li") {
                self.block(item);
                continue;
            }
            if dom.element(item).is_some_and(|el| el.has_attr(HIDDEN_ATTR)) {
                continue;
            }
            let marker = if ordered {
                format!("{}. ", number)
            } else {
                "• ".to_string()
            };
            number += 1;
            let rest = " ".repeat(marker.width());
            self.prefixes.push(PrefixLevel::new(marker, rest, self.theme.list_marker));
            self.record(item);
            self.inline_children(item, self.theme.base);
            self.flush();
            if self.prefixes.last().is_some_and(|p| !p.used) {
                self.emit(Vec::new());
            }
            self.prefixes.pop();
        }
        self.list_depth -= 1;
        self.blank();
    }

    fn pre(&mut self, node: NodeId) {
        self.flush();
        self.record(node);
        self.prefixes.push(PrefixLevel::new("  ", "  ", Style::default()));
        self.pre = true;
        self.inline_children(node, self.theme.code);
        self.pre = false;
        self.flush();
        self.prefixes.pop();
        self.blank();
    }

    fn table(&mut self, node: NodeId) {
        self.flush();
        self.record(node);
        let dom = self.dom;

        let rows: Vec<(NodeId, bool, Vec<String>)> = dom
            .query_all(node, |el| el.is("tr"))
            .into_iter()
            .map(|tr| {
                let header = dom.closest(tr, |el| el.is("thead")).is_some();
                let cells = dom
                    .children(tr)
                    .iter()
                    .filter(|cell| dom.element(**cell).is_some())
                    .map(|cell| dom.text_content(*cell).trim().to_string())
                    .collect();
                (tr, header, cells)
            })
            .collect();

        let columns = rows.iter().map(|(_, _, cells)| cells.len()).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for (_, _, cells) in &rows {
            for (i, cell) in cells.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        for (tr, header, cells) in &rows {
            self.record(*tr);
            let style = if *header {
                self.theme.base.add_modifier(Modifier::BOLD)
            } else {
                self.theme.base
            };
            let mut spans = Vec::new();
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", self.theme.muted));
                }
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let pad = width.saturating_sub(cell.width());
                spans.push(Span::styled(format!("{}{}", cell, " ".repeat(pad)), style));
            }
            self.emit(spans);
            if *header {
                let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
                self.emit(vec![Span::styled(rule.join("─┼─"), self.theme.muted)]);
            }
        }
        self.blank();
    }

    fn section(&mut self, node: NodeId) {
        self.flush();
        self.record(node);
        let dom = self.dom;
        let index = self.sections.position(node);
        let collapsed = index.is_some_and(|i| self.sections.is_collapsed(dom, i));
        let collapsible = index
            .and_then(|i| self.sections.get(i))
            .is_some_and(|s| s.collapsible);

        for &child in dom.children(node) {
            match dom.element(child) {
                Some(el) if el.has_class(HEADER_CLASS) => {
                    self.section_header(child, index, collapsible, collapsed)
                }
                Some(el) if el.has_class(BODY_CLASS) => {
                    if !collapsed {
                        self.record(child);
                        self.children_blocks(child);
                        self.flush();
                    }
                }
                _ => self.block(child),
            }
        }
        self.blank();
    }

    fn section_header(
        &mut self,
        header: NodeId,
        section: Option<usize>,
        collapsible: bool,
        collapsed: bool,
    ) {
        self.flush();
        let dom = self.dom;
        let first_row = self.row();
        self.record(header);

        let glyph = match (collapsible, collapsed) {
            (false, _) => "  ",
            (true, true) => "▸ ",
            (true, false) => "▾ ",
        };
        self.push_span(glyph, self.theme.section_header);
        self.col = glyph.width();

        let mut control = None;
        for &child in dom.children(header) {
            if dom.element(child).is_some_and(|el| el.has_attr(COPY_LINK_ATTR)) {
                control = Some(child);
                continue;
            }
            let style = if dom.is_tag(child, "h2") {
                self.theme.heading_style(2)
            } else {
                self.theme.base
            };
            self.inline(child, style);
        }

        if let Some(control) = control {
            let (label, style) = if dom.has_class(control, COPIED_CLASS) {
                (COPIED_LABEL, self.theme.copy_control_copied)
            } else {
                (COPY_LABEL, self.theme.copy_control)
            };
            if self.col + 2 + label.width() > self.avail() {
                self.flush();
            } else {
                self.push_span("  ", Style::default());
                self.col += 2;
            }
            self.record(control);
            let start = (self.prefix_width() + self.col) as u16;
            self.push_span(label, style);
            self.col += label.width();
            let row = self.row();
            self.out.hits.push(HitRegion {
                row,
                cols: start..start + label.width() as u16,
                target: HitTarget::CopyLink(control),
            });
        }
        self.flush();

        if let Some(section) = section {
            for row in first_row..self.row() {
                self.out.hits.push(HitRegion {
                    row,
                    cols: 0..u16::MAX,
                    target: HitTarget::SectionHeader { section, header },
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docnav_core::markup::build_page;
    use docnav_core::{ClipboardChain, Location, MemoryStore, PageSettings};

    const MANUAL: &str = "# Manual\n\
\n\
Intro text.\n\
\n\
## Getting Started {#intro .collapsed}\n\
\n\
Welcome aboard.\n\
\n\
## Setup {#setup}\n\
\n\
Install the tool:\n\
\n\
- first step\n\
- second step\n\
\n\
```sh\n\
docnav manual.md\n\
```\n\
\n\
> quoted line\n";

    fn page(source: &str) -> Page {
        Page::new(
            build_page(source),
            Location::new("null", "/docs/manual.md", ""),
            Box::new(MemoryStore::new()),
            ClipboardChain::disabled(),
            PageSettings::default(),
            true,
        )
    }

    struct NoLayout;

    impl docnav_core::Viewport for NoLayout {
        fn header_height(&self) -> f64 {
            ROW_HEIGHT
        }
        fn top_of(&self, _node: NodeId) -> Option<f64> {
            None
        }
        fn nav_bounds(&self) -> Option<docnav_core::Bounds> {
            None
        }
        fn nav_entry_bounds(&self, _entry: usize) -> Option<docnav_core::Bounds> {
            None
        }
        fn prefers_reduced_motion(&self) -> bool {
            true
        }
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(rendered: &RenderedPage) -> Vec<String> {
        rendered.lines.iter().map(text).collect()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("a  b"), vec![(false, "a"), (true, "  "), (false, "b")]);
        assert_eq!(tokens(" x"), vec![(true, " "), (false, "x")]);
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_collapsed_section_shows_header_only() {
        let page = page(MANUAL);
        let rendered = render_page(&page, 60, &Theme::dark());
        let lines = texts(&rendered);

        assert!(lines.iter().any(|l| l == "▸ Getting Started  [#]"));
        assert!(!lines.iter().any(|l| l.contains("Welcome aboard.")));
        assert!(lines.iter().any(|l| l == "▾ Setup  [#]"));
        assert!(lines.iter().any(|l| l == "• first step"));
        assert!(lines.iter().any(|l| l == "  docnav manual.md"));
        assert!(lines.iter().any(|l| l == "│ quoted line"));

        let intro = page.dom().get_element_by_id("intro").unwrap();
        let body = page.sections().get(0).unwrap().body.unwrap();
        assert!(rendered.row_of(intro).is_some());
        assert_eq!(rendered.row_of(body), None);
    }

    #[test]
    fn test_header_hits_and_copy_control() {
        let page = page(MANUAL);
        let rendered = render_page(&page, 60, &Theme::dark());
        let setup = page.sections().get(1).unwrap();
        let header = setup.header.unwrap();
        let row = rendered.row_of(header).unwrap();

        assert_eq!(
            rendered.hit(row, 0),
            Some(HitTarget::SectionHeader { section: 1, header })
        );
        let control = page
            .dom()
            .query(header, |el| el.has_attr(COPY_LINK_ATTR))
            .unwrap();
        let (control_row, col) = rendered.control_position(control).unwrap();
        assert_eq!(control_row, row);
        assert_eq!(col, "▾ Setup  ".width() as u16);
        assert_eq!(rendered.hit(row, col + 1), Some(HitTarget::CopyLink(control)));
    }

    #[test]
    fn test_wrapping_keeps_prefix() {
        let page = page("- one two three four five six\n");
        let rendered = render_page(&page, 14, &Theme::dark());
        assert_eq!(texts(&rendered), vec!["• one two", "  three four", "  five six"]);
    }

    #[test]
    fn test_long_words_hard_wrap() {
        let page = page("abcdefghij\n");
        let rendered = render_page(&page, 4, &Theme::dark());
        assert_eq!(texts(&rendered), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_hidden_sections_are_skipped() {
        let mut page = page(MANUAL);
        let setup = page.dom().get_element_by_id("setup").unwrap();
        let rendered = render_page(&page, 60, &Theme::dark());
        assert!(rendered.row_of(setup).is_some());

        let view = NoLayout;
        let now = std::time::Instant::now();
        page.handle(
            docnav_core::PageEvent::Search(docnav_core::SearchEvent::Input("welcome".into())),
            &view,
            now,
        );
        page.tick(&view, now + std::time::Duration::from_secs(1));

        let rendered = render_page(&page, 60, &Theme::dark());
        assert_eq!(rendered.row_of(setup), None);
        let lines = texts(&rendered);
        assert!(lines.iter().any(|l| l.contains("Welcome aboard.")));

        let mark = page.search().matches()[0];
        let row = rendered.row_of(mark).unwrap();
        let theme = Theme::dark();
        let marked = rendered.lines[row]
            .spans
            .iter()
            .find(|s| s.content.as_ref() == "Welcome")
            .unwrap();
        assert_eq!(marked.style, theme.base.patch(theme.mark_active));
    }

    #[test]
    fn test_cache_reuses_renders() {
        let page = page(MANUAL);
        let theme = Theme::dark();
        let mut cache = RendererCache::new();
        let key = RenderKey {
            doc_rev: 1,
            generation: page.dom().generation(),
            width: 60,
            theme: ThemeVariant::Dark,
        };
        let mut renders = 0;
        let first = cache.get_or_render(key, || {
            renders += 1;
            render_page(&page, 60, &theme)
        });
        let second = cache.get_or_render(key, || {
            renders += 1;
            render_page(&page, 60, &theme)
        });
        assert_eq!(renders, 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
