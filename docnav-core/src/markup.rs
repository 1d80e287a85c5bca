//! Markdown to page tree
//!
//! Produces the structure the page controllers expect:
//!
//! ```text
//! article#doc.doc
//!   (content before the first `##`)
//!   section.doc-section[data-collapsible][data-collapsed]#<id>
//!     div.doc-section__header > h2 + button[data-copy-link]
//!     div.doc-section__body > ...
//! ```
//!
//! `## Title {#id .collapsed .static}` sets the section id, starts it
//! collapsed, or makes it non-collapsible. Attributes on other headings land
//! on the heading itself.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::dom::{Dom, NodeId};
use crate::ids::SECTION_CLASS;
use crate::sections::{BODY_CLASS, COLLAPSED_ATTR, COLLAPSIBLE_ATTR, COPY_LINK_ATTR, HEADER_CLASS};

pub const CONTENT_ID: &str = "doc";
pub const CONTENT_CLASS: &str = "doc";

/// The built page
#[derive(Debug, Clone)]
pub struct PageMarkup {
    pub dom: Dom,
    /// The `article#doc` element
    pub content_root: NodeId,
    /// Text of the first `#` heading
    pub title: Option<String>,
}

struct Builder {
    dom: Dom,
    article: NodeId,
    /// Open elements; the bottom entry is always the article
    stack: Vec<NodeId>,
    /// Elements pushed by each open `Start` event
    opened: Vec<usize>,
    section_heading: bool,
    in_table_head: bool,
    title: Option<String>,
    title_node: Option<NodeId>,
}

fn options() -> Options {
    Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// Parse Markdown into a page tree
pub fn build_page(source: &str) -> PageMarkup {
    let mut dom = Dom::new();
    let article = dom.create_element("article");
    dom.set_attr(article, "id", CONTENT_ID);
    dom.set_attr(article, "class", CONTENT_CLASS);
    let root = dom.root();
    dom.append_child(root, article);

    let mut builder = Builder {
        dom,
        article,
        stack: vec![article],
        opened: Vec::new(),
        section_heading: false,
        in_table_head: false,
        title: None,
        title_node: None,
    };

    for event in Parser::new_ext(source, options()) {
        builder.event(event);
    }

    let title = builder.title.take();
    PageMarkup {
        dom: builder.dom,
        content_root: article,
        title,
    }
}

impl Builder {
    fn top(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.article)
    }

    /// Create `tag` under the current element and make it current
    fn open(&mut self, tag: &str) -> NodeId {
        let node = self.dom.create_element(tag);
        let parent = self.top();
        self.dom.append_child(parent, node);
        self.stack.push(node);
        node
    }

    fn text(&mut self, text: &str) {
        let node = self.dom.create_text(text);
        let parent = self.top();
        self.dom.append_child(parent, node);
    }

    fn leaf(&mut self, tag: &str) -> NodeId {
        let node = self.dom.create_element(tag);
        let parent = self.top();
        self.dom.append_child(parent, node);
        node
    }

    /// True when the current element is the article or a section body
    fn at_section_level(&self) -> bool {
        let top = self.top();
        top == self.article || self.dom.has_class(top, BODY_CLASS)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => {
                let pushed = self.start(tag);
                self.opened.push(pushed);
            }
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let (Some(title), Some(node)) = (&mut self.title, self.title_node) {
                    if self.stack.contains(&node) {
                        title.push_str(&text);
                    }
                }
                self.text(&text);
            }
            Event::Code(code) => {
                self.open("code");
                self.text(&code);
                self.stack.pop();
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => self.text(&math),
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => {
                self.leaf("br");
            }
            Event::Rule => {
                self.leaf("hr");
            }
            Event::FootnoteReference(label) => {
                let sup = self.open("sup");
                self.dom.set_attr(sup, "class", "footnote-ref");
                let link = self.open("a");
                self.dom.set_attr(link, "href", format!("#fn-{}", &*label));
                self.text(&label);
                self.stack.pop();
                self.stack.pop();
            }
            Event::TaskListMarker(checked) => {
                let input = self.leaf("input");
                self.dom.set_attr(input, "type", "checkbox");
                self.dom.set_attr(input, "disabled", "");
                if checked {
                    self.dom.set_attr(input, "checked", "");
                }
            }
        }
    }

    /// Open elements for a start tag; returns how many were pushed
    fn start(&mut self, tag: Tag<'_>) -> usize {
        match tag {
            Tag::Heading {
                level: HeadingLevel::H2,
                id,
                classes,
                ..
            } if self.at_section_level() => {
                self.open_section(id.as_deref(), classes.iter().map(|c| &**c).collect());
                1
            }
            Tag::Heading {
                level, id, classes, ..
            } => {
                let node = self.open(heading_tag(level));
                if let Some(id) = id {
                    self.dom.set_attr(node, "id", &*id);
                }
                if !classes.is_empty() {
                    let joined: Vec<&str> = classes.iter().map(|c| &**c).collect();
                    self.dom.set_attr(node, "class", joined.join(" "));
                }
                if level == HeadingLevel::H1 && self.title.is_none() {
                    self.title = Some(String::new());
                    self.title_node = Some(node);
                }
                1
            }
            Tag::Paragraph => {
                self.open("p");
                1
            }
            Tag::BlockQuote(_) => {
                self.open("blockquote");
                1
            }
            Tag::CodeBlock(kind) => {
                self.open("pre");
                let code = self.open("code");
                if let CodeBlockKind::Fenced(lang) = kind {
                    let lang = lang.split_whitespace().next().unwrap_or_default();
                    if !lang.is_empty() {
                        self.dom.set_attr(code, "class", format!("language-{}", lang));
                    }
                }
                2
            }
            Tag::List(Some(start)) => {
                let list = self.open("ol");
                if start != 1 {
                    self.dom.set_attr(list, "start", start.to_string());
                }
                1
            }
            Tag::List(None) => {
                self.open("ul");
                1
            }
            Tag::Item => {
                self.open("li");
                1
            }
            Tag::FootnoteDefinition(label) => {
                let div = self.open("div");
                self.dom.set_attr(div, "class", "footnote");
                self.dom.set_attr(div, "id", format!("fn-{}", &*label));
                1
            }
            Tag::Table(_) => {
                self.open("table");
                1
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open("thead");
                self.open("tr");
                2
            }
            Tag::TableRow => {
                self.open("tr");
                1
            }
            Tag::TableCell => {
                self.open(if self.in_table_head { "th" } else { "td" });
                1
            }
            Tag::Emphasis => {
                self.open("em");
                1
            }
            Tag::Strong => {
                self.open("strong");
                1
            }
            Tag::Strikethrough => {
                self.open("del");
                1
            }
            Tag::Link { dest_url, title, .. } => {
                let link = self.open("a");
                self.dom.set_attr(link, "href", &*dest_url);
                if !title.is_empty() {
                    self.dom.set_attr(link, "title", &*title);
                }
                1
            }
            Tag::Image { dest_url, title, .. } => {
                let img = self.open("img");
                self.dom.set_attr(img, "src", &*dest_url);
                if !title.is_empty() {
                    self.dom.set_attr(img, "title", &*title);
                }
                1
            }
            Tag::HtmlBlock => 0,
            _ => {
                self.open("div");
                1
            }
        }
    }

    fn end(&mut self, tag: TagEnd) {
        let pushed = self.opened.pop().unwrap_or(0);

        if let TagEnd::Image = tag {
            // Alt text arrives as children; `img` keeps it as an attribute
            let img = self.top();
            let alt = self.dom.text_content(img);
            self.dom.replace_children(img, Vec::new());
            self.dom.set_attr(img, "alt", alt);
        }
        if let TagEnd::TableHead = tag {
            self.in_table_head = false;
        }
        if let TagEnd::Heading(_) = tag {
            if self.title_node.is_some_and(|node| self.stack.last() == Some(&node)) {
                self.title_node = None;
                if let Some(title) = &mut self.title {
                    *title = title.trim().to_string();
                }
            }
        }

        for _ in 0..pushed {
            if self.stack.len() > 1 {
                self.stack.pop();
            }
        }

        if self.section_heading {
            if let TagEnd::Heading(HeadingLevel::H2) = tag {
                self.finish_section_header();
            }
        }
    }

    /// Close any open section and start a new one headed by an `h2`
    fn open_section(&mut self, id: Option<&str>, classes: Vec<&str>) {
        self.stack.truncate(1);

        let section = self.open("section");
        self.dom.set_attr(section, "class", SECTION_CLASS);
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            self.dom.set_attr(section, "id", id);
        }
        if !classes.contains(&"static") {
            self.dom.set_attr(section, COLLAPSIBLE_ATTR, "");
            let collapsed = classes.contains(&"collapsed");
            self.dom.set_attr(section, COLLAPSED_ATTR, if collapsed { "true" } else { "false" });
        }

        let header = self.open("div");
        self.dom.set_attr(header, "class", HEADER_CLASS);
        let h2 = self.open("h2");
        let rest: Vec<&str> = classes
            .into_iter()
            .filter(|c| *c != "static" && *c != "collapsed")
            .collect();
        if !rest.is_empty() {
            self.dom.set_attr(h2, "class", rest.join(" "));
        }
        self.section_heading = true;
    }

    /// After the section `h2`: add the copy control, then open the body
    fn finish_section_header(&mut self) {
        self.section_heading = false;

        let button = self.leaf("button");
        self.dom.set_attr(button, "type", "button");
        self.dom.set_attr(button, COPY_LINK_ATTR, "");
        self.dom.set_attr(button, "aria-label", "Copy link to section");

        // header
        self.stack.pop();
        let body = self.open("div");
        self.dom.set_attr(body, "class", BODY_CLASS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Sections;

    const MANUAL: &str = "# Taskiba Manual\n\
\n\
Intro paragraph.\n\
\n\
## Getting Started {#intro .collapsed}\n\
\n\
Welcome aboard.\n\
\n\
### Install\n\
\n\
- one\n\
- two\n\
\n\
## Setup {#setup}\n\
\n\
```sh\n\
docnav manual.md\n\
```\n\
\n\
## Legal {.static}\n\
\n\
Fine print.\n";

    fn sections_of(page: &PageMarkup) -> Vec<NodeId> {
        page.dom
            .query_all(page.content_root, |el| el.has_class(SECTION_CLASS))
    }

    #[test]
    fn test_article_root_and_title() {
        let page = build_page(MANUAL);
        assert_eq!(page.dom.id_of(page.content_root), Some("doc"));
        assert!(page.dom.has_class(page.content_root, "doc"));
        assert_eq!(page.title.as_deref(), Some("Taskiba Manual"));

        let first = page.dom.children(page.content_root)[0];
        assert!(page.dom.is_tag(first, "h1"));
    }

    #[test]
    fn test_sections_are_built_from_h2() {
        let page = build_page(MANUAL);
        let sections = sections_of(&page);
        assert_eq!(sections.len(), 3);

        let intro = sections[0];
        assert_eq!(page.dom.id_of(intro), Some("intro"));
        assert_eq!(page.dom.attr(intro, COLLAPSED_ATTR), Some("true"));
        assert!(page.dom.element(intro).unwrap().has_attr(COLLAPSIBLE_ATTR));

        let kids = page.dom.children(intro);
        assert_eq!(kids.len(), 2);
        assert!(page.dom.has_class(kids[0], HEADER_CLASS));
        assert!(page.dom.has_class(kids[1], BODY_CLASS));

        let header_kids = page.dom.children(kids[0]);
        assert!(page.dom.is_tag(header_kids[0], "h2"));
        assert_eq!(page.dom.text_content(header_kids[0]), "Getting Started");
        assert!(page.dom.element(header_kids[1]).unwrap().has_attr(COPY_LINK_ATTR));

        let body_text = page.dom.text_content(kids[1]);
        assert!(body_text.contains("Welcome aboard."));
        assert!(body_text.contains("Install"));

        assert_eq!(page.dom.attr(sections[1], COLLAPSED_ATTR), Some("false"));
        assert!(!page.dom.element(sections[2]).unwrap().has_attr(COLLAPSIBLE_ATTR));
        assert_eq!(page.dom.id_of(sections[2]), None);
    }

    #[test]
    fn test_nested_blocks_stay_in_their_section() {
        let page = build_page(MANUAL);
        let sections = sections_of(&page);
        let setup_code = page.dom.query(sections[1], |el| el.is("code")).unwrap();
        assert_eq!(page.dom.attr(setup_code, "class"), Some("language-sh"));
        assert!(page.dom.query(sections[0], |el| el.is("li")).is_some());
        assert!(page.dom.query(sections[1], |el| el.is("li")).is_none());
    }

    #[test]
    fn test_heading_attributes_on_deeper_levels() {
        let page = build_page("## A\n\n### Custom {#my-id .note}\n");
        let h3 = page.dom.query(page.content_root, |el| el.is("h3")).unwrap();
        assert_eq!(page.dom.id_of(h3), Some("my-id"));
        assert!(page.dom.has_class(h3, "note"));
    }

    #[test]
    fn test_h2_in_blockquote_is_not_a_section() {
        let page = build_page("> ## Quoted\n\ntext\n");
        assert!(sections_of(&page).is_empty());
        assert!(page.dom.query(page.content_root, |el| el.is("h2")).is_some());
    }

    #[test]
    fn test_inline_markup_and_images() {
        let page = build_page(
            "## S\n\nSome *em* and `code` with [link](https://x.y \"T\") ![alt text](a.png)\n",
        );
        let root = page.content_root;
        let a = page.dom.query(root, |el| el.is("a")).unwrap();
        assert_eq!(page.dom.attr(a, "href"), Some("https://x.y"));
        assert_eq!(page.dom.attr(a, "title"), Some("T"));
        let img = page.dom.query(root, |el| el.is("img")).unwrap();
        assert_eq!(page.dom.attr(img, "alt"), Some("alt text"));
        assert!(page.dom.children(img).is_empty());
        assert!(page.dom.query(root, |el| el.is("em")).is_some());
    }

    #[test]
    fn test_sections_init_on_built_page() {
        let mut page = build_page(MANUAL);
        let sections = Sections::init(&mut page.dom, page.content_root);
        assert_eq!(sections.len(), 3);
        let header = sections.get(0).unwrap().header.unwrap();
        assert_eq!(page.dom.attr(header, "aria-controls"), Some("intro-body"));
        assert!(sections.is_collapsed(&page.dom, 0));
    }
}
