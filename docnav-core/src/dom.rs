//! Arena-backed document tree
//!
//! The page is held as a flat arena of nodes addressed by [`NodeId`].
//! Detaching a node only unlinks it from its parent; the subtree stays
//! allocated until [`Dom::free_subtree`] hands its slots back for reuse.

/// Handle to a node in a [`Dom`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element: tag name plus attributes in insertion order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(key, _)| key != name);
        self.attrs.len() != before
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `id` attribute, if present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Add or remove a class
    pub fn toggle_class(&mut self, class: &str, on: bool) {
        let mut classes: Vec<String> = self
            .attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);

        if on && !present {
            classes.push(class.to_string());
        } else if !on && present {
            classes.retain(|c| c != class);
        } else {
            return;
        }

        if classes.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", classes.join(" "));
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    live: bool,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            live: true,
        }
    }
}

/// The document tree
#[derive(Clone, Debug)]
pub struct Dom {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    generation: u64,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create a tree holding only the `html` root element
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Element(Element::new("html")))],
            free: Vec::new(),
            root: NodeId(0),
            generation: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Bumped on every mutation; hosts key their layout caches on it
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Node::new(kind);
                id
            }
            None => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(Node::new(kind));
                id
            }
        }
    }

    /// Detach `node` and give its whole subtree back to the arena
    ///
    /// Ids into the freed subtree must not be used again: later calls to
    /// `create_*` hand the same slots out.
    pub fn free_subtree(&mut self, node: NodeId) {
        if node == self.root || !self.nodes[node.0].live {
            return;
        }
        self.detach(node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let slot = &mut self.nodes[current.0];
            if !slot.live {
                continue;
            }
            stack.append(&mut slot.children);
            slot.kind = NodeKind::Text(String::new());
            slot.parent = None;
            slot.live = false;
            self.free.push(current);
        }
        self.touch();
    }

    /// Number of slots in the arena, free or not
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of allocated nodes, attached or not
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.touch();
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn is_tag(&self, node: NodeId, tag: &str) -> bool {
        self.element(node).is_some_and(|el| el.is(tag))
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(Element::id)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    /// Set an attribute; a no-op on text nodes
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.remove_attr(name);
        }
    }

    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if let Some(el) = self.element_mut(node) {
            el.toggle_class(class, on);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.touch();
    }

    /// Unlink a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
            self.touch();
        }
    }

    /// Put `replacements` where `node` was, in order, and detach `node`
    pub fn replace_with(&mut self, node: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.nodes[node.0].parent else {
            return;
        };
        for &r in replacements {
            self.detach(r);
        }
        let Some(pos) = self.nodes[parent.0].children.iter().position(|&c| c == node) else {
            return;
        };

        self.nodes[parent.0]
            .children
            .splice(pos..=pos, replacements.iter().copied());
        self.nodes[node.0].parent = None;
        for &r in replacements {
            self.nodes[r.0].parent = Some(parent);
        }
        self.touch();
    }

    /// Insert `node` as the sibling right before `reference`
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        self.detach(node);
        let Some(parent) = self.nodes[reference.0].parent else {
            return;
        };
        let Some(pos) = self.nodes[parent.0].children.iter().position(|&c| c == reference) else {
            return;
        };
        self.nodes[parent.0].children.insert(pos, node);
        self.nodes[node.0].parent = Some(parent);
        self.touch();
    }

    /// Detach all current children of `parent` and adopt `children` instead
    pub fn replace_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        let old = std::mem::take(&mut self.nodes[parent.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
        for child in children {
            self.append_child(parent, child);
        }
        self.touch();
    }

    /// Ancestors starting at `node` itself
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: Some(node),
        }
    }

    /// Nearest inclusive ancestor that is an element matching `pred`
    pub fn closest(&self, node: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.ancestors(node)
            .find(|&n| self.element(n).is_some_and(&pred))
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.ancestors(node).last() == Some(self.root)
    }

    /// Pre-order walk of the subtree below `node`, excluding `node`
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(node).to_vec();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// Descendant elements of `scope` matching `pred`, in document order
    pub fn query_all(&self, scope: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|&n| self.element(n).is_some_and(&pred))
            .collect()
    }

    /// First descendant element of `scope` matching `pred`
    pub fn query(&self, scope: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(scope)
            .find(|&n| self.element(n).is_some_and(&pred))
    }

    /// First attached element carrying the given id
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        if self.id_of(self.root) == Some(id) {
            return Some(self.root);
        }
        self.query(self.root, |el| el.id() == Some(id))
    }

    /// Every non-empty id attribute on an attached element
    pub fn all_ids(&self) -> Vec<String> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter_map(|n| self.id_of(n).map(str::to_string))
            .collect()
    }

    /// Concatenated text of every text node in the subtree
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.text(node) {
            return text.to_string();
        }
        self.descendants(node)
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Copy a subtree; the copy is detached
    pub fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let kind = self.nodes[node.0].kind.clone();
        let copy = self.push(kind);
        let children = self.nodes[node.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// Serialize a node and its subtree as HTML
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialize the children of a node as HTML
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            NodeKind::Text(text) => escape_into(text, out, false),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(el.tag());
                for (name, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, out, true);
                    out.push('"');
                }
                out.push('>');
                if is_void(el.tag()) {
                    return;
                }
                for &child in self.children(node) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(el.tag());
                out.push('>');
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img" | "input" | "meta" | "link")
}

fn escape_into(text: &str, out: &mut String, attr: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(node).iter().rev().copied());
        Some(node)
    }
}
