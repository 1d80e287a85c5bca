//! Substring search over page sections
//!
//! Input is debounced; a commit hides non-matching sections, expands and
//! highlights matching ones, and collects the marks for next/previous
//! navigation. The engine moves through [`SearchPhase`]s and only ever
//! commits the most recent input.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::config::SearchConfig;
use crate::dom::{Dom, NodeId};
use crate::highlight::{self, fold_case, Snapshots, ACTIVE_MARK_CLASS};
use crate::recent::RecentQueries;
use crate::sections::Sections;
use crate::store::KeyValueStore;
use crate::view::{Command, ScrollBehavior, ScrollBlock};

/// Attribute set on sections filtered out by the current query
pub const HIDDEN_ATTR: &str = "hidden";

pub const NO_RESULTS: &str = "No results";

/// Trimmed, lower-cased form used for comparing and matching queries
pub fn normalize_query(raw: &str) -> String {
    fold_case(raw.trim())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    /// A commit of `value` is scheduled for `due`
    Debounced { value: String, due: Instant },
    Committed,
}

/// Keys pressed while the search input has focus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchKey {
    Up,
    Down,
    Enter { shift: bool },
    Escape,
    /// A digit key, `0..=9`
    Digit(u8),
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchEvent {
    /// The input now holds this value
    Input(String),
    Focus,
    Blur,
    Key(SearchKey),
    /// Pick the visible suggestion at this index
    SuggestionPick(usize),
    SuggestionRemove(usize),
    ClearRecent,
    /// The clear control: empty the input and revert at once
    Clear,
    Next,
    Prev,
    Open,
    Close,
    ToggleOpen,
}

/// What an event produced
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    pub commands: Vec<Command>,
    /// The event was consumed and must not reach the input as text
    pub handled: bool,
}

impl SearchOutcome {
    fn handled() -> Self {
        Self {
            commands: Vec::new(),
            handled: true,
        }
    }

    fn with(commands: Vec<Command>) -> Self {
        Self {
            commands,
            handled: true,
        }
    }
}

/// Page state the engine reads and writes
pub struct SearchContext<'a> {
    pub dom: &'a mut Dom,
    pub sections: &'a Sections,
    pub store: &'a mut dyn KeyValueStore,
    /// Where marks are collected from
    pub content_root: NodeId,
    pub reduced_motion: bool,
}

#[derive(Debug)]
pub struct SearchEngine {
    config: SearchConfig,
    recent: RecentQueries,
    phase: SearchPhase,
    input: String,
    input_at_focus: Option<String>,
    open: bool,
    last_query: String,
    has_query: bool,
    matches: Vec<NodeId>,
    active: Option<usize>,
    hits: usize,
    commits: usize,
    suggestions: Vec<String>,
    suggest_visible: bool,
    suggest_index: Option<usize>,
    suggest_hide_due: Option<Instant>,
    snapshots: Snapshots,
    text_cache: HashMap<NodeId, String>,
    auto_expanded: HashSet<usize>,
}

impl SearchEngine {
    pub fn new(config: SearchConfig, recent: RecentQueries) -> Self {
        Self {
            config,
            recent,
            phase: SearchPhase::Idle,
            input: String::new(),
            input_at_focus: None,
            open: false,
            last_query: String::new(),
            has_query: false,
            matches: Vec::new(),
            active: None,
            hits: 0,
            commits: 0,
            suggestions: Vec::new(),
            suggest_visible: false,
            suggest_index: None,
            suggest_hide_due: None,
            snapshots: Snapshots::new(),
            text_cache: HashMap::new(),
            auto_expanded: HashSet::new(),
        }
    }

    pub fn handle(
        &mut self,
        event: SearchEvent,
        ctx: &mut SearchContext<'_>,
        now: Instant,
    ) -> SearchOutcome {
        match event {
            SearchEvent::Input(value) => {
                self.input = value;
                self.schedule(now);
                if self.is_focused() {
                    self.show_suggestions(ctx.store);
                }
                SearchOutcome::handled()
            }
            SearchEvent::Focus => {
                self.focus(ctx.store);
                SearchOutcome::handled()
            }
            SearchEvent::Blur => {
                self.blur(ctx.store);
                self.suggest_hide_due = Some(now + self.config.suggest_hide_delay());
                SearchOutcome::handled()
            }
            SearchEvent::Key(key) => self.key(key, ctx, now),
            SearchEvent::SuggestionPick(index) => {
                let Some(term) = self.suggestions.get(index).cloned() else {
                    return SearchOutcome::default();
                };
                self.fill(term, now);
                self.recent.add(ctx.store, &self.input);
                if !self.is_focused() {
                    self.focus(ctx.store);
                }
                self.hide_suggestions();
                SearchOutcome::handled()
            }
            SearchEvent::SuggestionRemove(index) => {
                if let Some(term) = self.suggestions.get(index).cloned() {
                    self.recent.remove(ctx.store, &term);
                }
                self.show_suggestions(ctx.store);
                SearchOutcome::handled()
            }
            SearchEvent::ClearRecent => {
                self.recent.clear(ctx.store);
                self.suggestions.clear();
                self.hide_suggestions();
                SearchOutcome::handled()
            }
            SearchEvent::Clear => {
                self.input.clear();
                self.phase = SearchPhase::Idle;
                self.commit(ctx, "");
                if !self.is_focused() {
                    self.focus(ctx.store);
                }
                self.show_suggestions(ctx.store);
                SearchOutcome::handled()
            }
            SearchEvent::Next => SearchOutcome::with(self.step(ctx, 1)),
            SearchEvent::Prev => SearchOutcome::with(self.step(ctx, -1)),
            SearchEvent::Open => {
                self.open(ctx.store);
                SearchOutcome::handled()
            }
            SearchEvent::Close => {
                self.close(ctx.store);
                SearchOutcome::handled()
            }
            SearchEvent::ToggleOpen => {
                if self.open {
                    self.close(ctx.store);
                } else {
                    self.open(ctx.store);
                }
                SearchOutcome::handled()
            }
        }
    }

    fn key(&mut self, key: SearchKey, ctx: &mut SearchContext<'_>, now: Instant) -> SearchOutcome {
        let suggesting = self.suggest_visible && !self.suggestions.is_empty();
        match key {
            SearchKey::Up | SearchKey::Down if suggesting => {
                let delta = if key == SearchKey::Down { 1 } else { -1 };
                self.move_suggestion(delta);
                SearchOutcome::handled()
            }
            SearchKey::Up | SearchKey::Down => SearchOutcome::default(),
            SearchKey::Enter { shift } => {
                if let (true, Some(index)) = (suggesting, self.suggest_index) {
                    if let Some(term) = self.suggestions.get(index).cloned() {
                        self.fill(term, now);
                        self.recent.add(ctx.store, &self.input);
                        self.hide_suggestions();
                        return SearchOutcome::handled();
                    }
                }
                let commands = if self.matches.is_empty() {
                    Vec::new()
                } else {
                    self.step(ctx, if shift { -1 } else { 1 })
                };
                self.recent.add(ctx.store, &self.input);
                SearchOutcome::with(commands)
            }
            SearchKey::Escape => {
                self.close(ctx.store);
                SearchOutcome::handled()
            }
            SearchKey::Digit(digit) => {
                if !self.input.trim().is_empty() || !(1..=5).contains(&digit) {
                    return SearchOutcome::default();
                }
                let list = self.recent.load(ctx.store);
                match list.into_iter().nth(usize::from(digit) - 1) {
                    Some(term) => {
                        self.fill(term, now);
                        self.hide_suggestions();
                        SearchOutcome::handled()
                    }
                    None => SearchOutcome::default(),
                }
            }
            SearchKey::Other => SearchOutcome::default(),
        }
    }

    /// Fire expired timers; returns true when a commit ran
    pub fn tick(&mut self, ctx: &mut SearchContext<'_>, now: Instant) -> bool {
        if self.suggest_hide_due.is_some_and(|due| due <= now) {
            self.suggest_hide_due = None;
            self.hide_suggestions();
        }

        let due_value = match &self.phase {
            SearchPhase::Debounced { value, due } if *due <= now => Some(value.clone()),
            _ => None,
        };
        match due_value {
            Some(value) => self.commit(ctx, &value),
            None => false,
        }
    }

    /// Earliest pending timer, for hosts that sleep between events
    pub fn next_deadline(&self) -> Option<Instant> {
        let debounce = match &self.phase {
            SearchPhase::Debounced { due, .. } => Some(*due),
            _ => None,
        };
        match (debounce, self.suggest_hide_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn schedule(&mut self, now: Instant) {
        if let SearchPhase::Debounced { .. } = self.phase {
            log::trace!("search debounce restarted");
        }
        self.phase = SearchPhase::Debounced {
            value: self.input.clone(),
            due: now + self.config.debounce(),
        };
    }

    fn fill(&mut self, term: String, now: Instant) {
        self.input = term;
        self.schedule(now);
    }

    /// Run a query now; returns false when it equals the last committed one
    pub fn commit(&mut self, ctx: &mut SearchContext<'_>, raw: &str) -> bool {
        let value = normalize_query(raw);
        self.phase = if value.is_empty() {
            SearchPhase::Idle
        } else {
            SearchPhase::Committed
        };
        if value == self.last_query {
            return false;
        }
        self.last_query = value.clone();
        self.commits += 1;

        self.revert(ctx);

        if value.is_empty() {
            for section in ctx.sections.iter() {
                ctx.dom.remove_attr(section.node, HIDDEN_ATTR);
            }
            let mut restore: Vec<usize> = self.auto_expanded.drain().collect();
            restore.sort_unstable();
            for index in restore {
                ctx.sections.set_expanded(ctx.dom, index, false);
            }
            self.hits = 0;
            self.refresh(ctx, false);
            log::debug!("search cleared");
        } else {
            let mut hits = 0;
            for (index, section) in ctx.sections.iter().enumerate() {
                let hit = self.section_text(ctx.dom, section.node).contains(&value);
                if hit {
                    ctx.dom.remove_attr(section.node, HIDDEN_ATTR);
                    hits += 1;
                    if ctx.sections.expand_if_collapsed(ctx.dom, index) {
                        self.auto_expanded.insert(index);
                    }
                    highlight::highlight_section(
                        ctx.dom,
                        &mut self.snapshots,
                        section.node,
                        &value,
                    );
                } else {
                    ctx.dom.set_attr(section.node, HIDDEN_ATTR, "");
                }
            }
            self.hits = hits;
            self.refresh(ctx, true);
            log::debug!(
                "search {:?}: {} sections, {} matches",
                value,
                hits,
                self.matches.len()
            );
        }

        if self.is_focused() {
            self.show_suggestions(ctx.store);
        }
        true
    }

    /// Undo the last highlight; the marks are freed, so forget them first
    fn revert(&mut self, ctx: &mut SearchContext<'_>) {
        self.matches.clear();
        self.active = None;
        for section in ctx.sections.iter() {
            highlight::clear_section(ctx.dom, &mut self.snapshots, section.node);
        }
        self.snapshots.prune(ctx.dom);
    }

    fn section_text(&mut self, dom: &Dom, section: NodeId) -> &str {
        self.text_cache
            .entry(section)
            .or_insert_with(|| fold_case(&dom.text_content(section)))
    }

    fn refresh(&mut self, ctx: &mut SearchContext<'_>, has_query: bool) {
        self.has_query = has_query;
        self.matches = highlight::collect_marks(ctx.dom, ctx.content_root);
        self.active = None;
        if !self.matches.is_empty() {
            self.set_active(ctx, 0, false);
        }
    }

    fn set_active(
        &mut self,
        ctx: &mut SearchContext<'_>,
        index: isize,
        scroll: bool,
    ) -> Vec<Command> {
        if self.matches.is_empty() {
            self.active = None;
            return Vec::new();
        }
        let len = self.matches.len() as isize;
        let index = index.rem_euclid(len) as usize;

        if let Some(previous) = self.active.and_then(|i| self.matches.get(i)) {
            ctx.dom.toggle_class(*previous, ACTIVE_MARK_CLASS, false);
        }
        let mark = self.matches[index];
        ctx.dom.toggle_class(mark, ACTIVE_MARK_CLASS, true);
        self.active = Some(index);

        if !scroll {
            return Vec::new();
        }
        vec![Command::ScrollIntoView {
            node: mark,
            block: ScrollBlock::Center,
            behavior: ScrollBehavior::for_motion(ctx.reduced_motion),
        }]
    }

    fn step(&mut self, ctx: &mut SearchContext<'_>, delta: isize) -> Vec<Command> {
        if self.matches.is_empty() {
            return Vec::new();
        }
        let current = self.active.map(|i| i as isize).unwrap_or(-1);
        self.set_active(ctx, current + delta, true)
    }

    fn focus(&mut self, store: &dyn KeyValueStore) {
        self.suggest_hide_due = None;
        self.input_at_focus = Some(self.input.clone());
        self.show_suggestions(store);
    }

    /// Leave the input; an edited value is recorded like a committed change
    fn blur(&mut self, store: &mut dyn KeyValueStore) {
        if let Some(before) = self.input_at_focus.take() {
            if before != self.input {
                self.recent.add(store, &self.input);
            }
        }
    }

    fn open(&mut self, store: &dyn KeyValueStore) {
        self.open = true;
        if !self.is_focused() {
            self.focus(store);
        }
    }

    fn close(&mut self, store: &mut dyn KeyValueStore) {
        self.open = false;
        self.blur(store);
        self.suggest_hide_due = None;
        self.hide_suggestions();
    }

    fn show_suggestions(&mut self, store: &dyn KeyValueStore) {
        self.suggestions = self.recent.filtered(store, &self.input);
        self.suggest_visible = !self.suggestions.is_empty();
        self.suggest_index = None;
    }

    fn hide_suggestions(&mut self) {
        self.suggest_visible = false;
        self.suggest_index = None;
    }

    fn move_suggestion(&mut self, delta: isize) {
        let max = self.suggestions.len() as isize - 1;
        let current = self.suggest_index.map(|i| i as isize).unwrap_or(-1);
        let next = (current + delta).clamp(-1, max);
        self.suggest_index = usize::try_from(next).ok();
    }

    /// A user toggled this section; clearing the search leaves it alone
    pub fn forget_auto_expanded(&mut self, section: usize) {
        self.auto_expanded.remove(&section);
    }

    /// Drop everything tied to the current tree and re-run the input at `now`
    pub fn invalidate(&mut self, now: Instant) {
        self.text_cache.clear();
        self.snapshots.clear();
        self.auto_expanded.clear();
        self.matches.clear();
        self.active = None;
        self.hits = 0;
        self.has_query = false;
        self.last_query.clear();
        if !self.input.trim().is_empty() {
            self.phase = SearchPhase::Debounced {
                value: self.input.clone(),
                due: now,
            };
        } else {
            self.phase = SearchPhase::Idle;
        }
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_focused(&self) -> bool {
        self.input_at_focus.is_some()
    }

    /// Normalized query of the last commit
    pub fn query(&self) -> &str {
        &self.last_query
    }

    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }

    pub fn active_match(&self) -> Option<usize> {
        self.active
    }

    /// Sections left visible by the last commit
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Number of commits that actually ran
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// `"<i>/<n>"`, or empty with no matches
    pub fn count_display(&self) -> String {
        match self.active {
            Some(index) if !self.matches.is_empty() => {
                format!("{}/{}", index + 1, self.matches.len())
            }
            _ => String::new(),
        }
    }

    pub fn status_text(&self) -> &'static str {
        if self.has_query && self.matches.is_empty() {
            NO_RESULTS
        } else {
            ""
        }
    }

    /// No section is left to show. Text outside the highlight targets can
    /// keep a section visible without producing a single mark.
    pub fn empty_state_visible(&self) -> bool {
        self.has_query && self.hits == 0
    }

    pub fn has_query(&self) -> bool {
        self.has_query
    }

    pub fn nav_disabled(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestions_visible(&self) -> bool {
        self.suggest_visible
    }

    pub fn suggestion_index(&self) -> Option<usize> {
        self.suggest_index
    }

    pub fn recent(&self) -> &RecentQueries {
        &self.recent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SECTION_CLASS;
    use crate::sections::{BODY_CLASS, COLLAPSED_ATTR, COLLAPSIBLE_ATTR, HEADER_CLASS};
    use crate::store::MemoryStore;
    use std::time::Duration;

    struct Page {
        dom: Dom,
        root: NodeId,
        sections: Sections,
        store: MemoryStore,
        engine: SearchEngine,
    }

    impl Page {
        /// sections: (id, collapsed, heading, paragraph)
        fn new(layout: &[(&str, bool, &str, &str)]) -> Self {
            let mut dom = Dom::new();
            let root = dom.create_element("article");
            let html = dom.root();
            dom.append_child(html, root);
            for (id, collapsed, heading, para) in layout {
                let section = dom.create_element("section");
                dom.set_attr(section, "class", SECTION_CLASS);
                dom.set_attr(section, "id", *id);
                dom.set_attr(section, COLLAPSIBLE_ATTR, "");
                dom.set_attr(section, COLLAPSED_ATTR, if *collapsed { "true" } else { "false" });
                let header = dom.create_element("div");
                dom.set_attr(header, "class", HEADER_CLASS);
                let h2 = dom.create_element("h2");
                let h2_text = dom.create_text(*heading);
                let body = dom.create_element("div");
                dom.set_attr(body, "class", BODY_CLASS);
                let p = dom.create_element("p");
                let p_text = dom.create_text(*para);
                dom.append_child(root, section);
                dom.append_child(section, header);
                dom.append_child(header, h2);
                dom.append_child(h2, h2_text);
                dom.append_child(section, body);
                dom.append_child(body, p);
                dom.append_child(p, p_text);
            }
            let sections = Sections::init(&mut dom, root);
            let engine =
                SearchEngine::new(SearchConfig::default(), RecentQueries::new("docnav", 5));
            Self {
                dom,
                root,
                sections,
                store: MemoryStore::new(),
                engine,
            }
        }

        fn send(&mut self, event: SearchEvent, now: Instant) -> SearchOutcome {
            let mut ctx = SearchContext {
                dom: &mut self.dom,
                sections: &self.sections,
                store: &mut self.store,
                content_root: self.root,
                reduced_motion: false,
            };
            self.engine.handle(event, &mut ctx, now)
        }

        fn tick(&mut self, now: Instant) -> bool {
            let mut ctx = SearchContext {
                dom: &mut self.dom,
                sections: &self.sections,
                store: &mut self.store,
                content_root: self.root,
                reduced_motion: false,
            };
            self.engine.tick(&mut ctx, now)
        }

        fn search(&mut self, query: &str, now: Instant) {
            self.send(SearchEvent::Input(query.to_string()), now);
            self.tick(now + Duration::from_millis(120));
        }

        fn hidden(&self, index: usize) -> bool {
            let node = self.sections.get(index).unwrap().node;
            self.dom.attr(node, HIDDEN_ATTR).is_some()
        }

        fn recent(&self) -> Vec<String> {
            self.engine.recent().load(&self.store)
        }
    }

    fn two_sections() -> Page {
        Page::new(&[
            ("intro", true, "Getting Started", "Welcome aboard."),
            ("setup", false, "Setup", "Install the tool."),
        ])
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  StArT "), "start");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn test_intro_setup_scenario() {
        let mut page = two_sections();
        let before = page.dom.inner_html(page.root);
        let t0 = Instant::now();

        page.search("start", t0);
        assert!(!page.hidden(0));
        assert!(page.hidden(1));
        assert!(!page.sections.is_collapsed(&page.dom, 0));
        assert_eq!(page.engine.count_display(), "1/1");
        let mark = page.engine.matches()[0];
        assert_eq!(page.dom.text_content(mark), "Start");
        assert!(page.dom.has_class(mark, ACTIVE_MARK_CLASS));

        page.send(SearchEvent::Clear, t0 + Duration::from_secs(1));
        assert!(!page.hidden(0));
        assert!(!page.hidden(1));
        assert!(page.sections.is_collapsed(&page.dom, 0));
        assert!(!page.sections.is_collapsed(&page.dom, 1));
        assert!(page.engine.matches().is_empty());
        assert_eq!(page.dom.inner_html(page.root), before);
    }

    #[test]
    fn test_user_toggle_survives_clear() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.search("start", t0);

        // The user collapses and re-expands #intro while searching
        page.sections.toggle(&mut page.dom, 0);
        page.sections.toggle(&mut page.dom, 0);
        page.engine.forget_auto_expanded(0);

        page.send(SearchEvent::Clear, t0 + Duration::from_secs(1));
        assert!(!page.sections.is_collapsed(&page.dom, 0));
    }

    #[test]
    fn test_debounce_commits_only_last_value() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.send(SearchEvent::Input("a".into()), t0);
        page.send(SearchEvent::Input("ab".into()), t0 + Duration::from_millis(50));
        assert!(!page.tick(t0 + Duration::from_millis(130)));
        page.send(SearchEvent::Input("abc".into()), t0 + Duration::from_millis(100));
        assert!(!page.tick(t0 + Duration::from_millis(200)));
        assert!(page.tick(t0 + Duration::from_millis(220)));

        assert_eq!(page.engine.commit_count(), 1);
        assert_eq!(page.engine.query(), "abc");
        assert_eq!(page.engine.phase(), &SearchPhase::Committed);
    }

    #[test]
    fn test_same_query_is_noop() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.search("setup", t0);
        page.search("  SETUP ", t0 + Duration::from_secs(1));
        assert_eq!(page.engine.commit_count(), 1);
    }

    #[test]
    fn test_no_results() {
        let mut page = two_sections();
        page.search("zebra", Instant::now());
        assert_eq!(page.engine.count_display(), "");
        assert_eq!(page.engine.status_text(), NO_RESULTS);
        assert!(page.engine.empty_state_visible());
        assert!(page.engine.nav_disabled());
        assert!(page.hidden(0) && page.hidden(1));

        let t1 = Instant::now() + Duration::from_secs(1);
        page.search("", t1);
        assert_eq!(page.engine.status_text(), "");
        assert!(!page.engine.empty_state_visible());
    }

    #[test]
    fn test_match_outside_highlight_targets_keeps_section() {
        let mut page = two_sections();
        let body = page.sections.get(1).unwrap().body.unwrap();
        let pre = page.dom.create_element("pre");
        let code = page.dom.create_element("code");
        let text = page.dom.create_text("cargo build");
        page.dom.append_child(body, pre);
        page.dom.append_child(pre, code);
        page.dom.append_child(code, text);

        page.search("cargo", Instant::now());
        assert!(page.hidden(0));
        assert!(!page.hidden(1));
        assert_eq!(page.engine.hits(), 1);
        assert!(page.engine.matches().is_empty());
        assert_eq!(page.engine.status_text(), NO_RESULTS);
        assert!(!page.engine.empty_state_visible());
    }

    #[test]
    fn test_next_prev_wrap_and_scroll() {
        let mut page = Page::new(&[("a", false, "Tool one", "tool two tool three")]);
        let t0 = Instant::now();
        page.search("tool", t0);
        assert_eq!(page.engine.count_display(), "1/3");

        let out = page.send(SearchEvent::Next, t0);
        assert_eq!(page.engine.count_display(), "2/3");
        assert_eq!(
            out.commands,
            vec![Command::ScrollIntoView {
                node: page.engine.matches()[1],
                block: ScrollBlock::Center,
                behavior: ScrollBehavior::Smooth,
            }]
        );
        page.send(SearchEvent::Next, t0);
        page.send(SearchEvent::Next, t0);
        assert_eq!(page.engine.count_display(), "1/3");
        page.send(SearchEvent::Prev, t0);
        assert_eq!(page.engine.count_display(), "3/3");

        let active: Vec<_> = page
            .engine
            .matches()
            .iter()
            .filter(|&&m| page.dom.has_class(m, ACTIVE_MARK_CLASS))
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn test_enter_navigates_and_records_recent() {
        let mut page = Page::new(&[("a", false, "Tool one", "tool two")]);
        let t0 = Instant::now();
        page.send(SearchEvent::Focus, t0);
        page.search("tool", t0);

        page.send(SearchEvent::Key(SearchKey::Enter { shift: false }), t0);
        assert_eq!(page.engine.count_display(), "2/2");
        page.send(SearchEvent::Key(SearchKey::Enter { shift: true }), t0);
        assert_eq!(page.engine.count_display(), "1/2");
        assert_eq!(page.recent(), vec!["tool"]);
    }

    #[test]
    fn test_suggestions_navigation_and_pick() {
        let mut page = two_sections();
        let t0 = Instant::now();
        for term in ["setup", "start", "install"] {
            page.engine.recent().add(&mut page.store, term);
        }

        page.send(SearchEvent::Focus, t0);
        assert!(page.engine.suggestions_visible());
        assert_eq!(page.engine.suggestions(), ["install", "start", "setup"]);

        page.send(SearchEvent::Input("s".into()), t0);
        assert_eq!(page.engine.suggestions(), ["install", "start", "setup"]);
        page.send(SearchEvent::Input("st".into()), t0);
        assert_eq!(page.engine.suggestions(), ["install", "start"]);

        page.send(SearchEvent::Key(SearchKey::Up), t0);
        assert_eq!(page.engine.suggestion_index(), None);
        for _ in 0..5 {
            page.send(SearchEvent::Key(SearchKey::Down), t0);
        }
        assert_eq!(page.engine.suggestion_index(), Some(1));

        page.send(SearchEvent::Key(SearchKey::Enter { shift: false }), t0);
        assert_eq!(page.engine.input(), "start");
        assert!(!page.engine.suggestions_visible());
        page.tick(t0 + Duration::from_millis(120));
        assert_eq!(page.engine.count_display(), "1/1");
        assert_eq!(page.recent()[0], "start");
    }

    #[test]
    fn test_digit_reruns_recent_only_on_empty_input() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.engine.recent().add(&mut page.store, "setup");
        page.engine.recent().add(&mut page.store, "start");
        page.send(SearchEvent::Focus, t0);

        let out = page.send(SearchEvent::Key(SearchKey::Digit(2)), t0);
        assert!(out.handled);
        assert_eq!(page.engine.input(), "setup");

        let out = page.send(SearchEvent::Key(SearchKey::Digit(1)), t0);
        assert!(!out.handled);
        assert_eq!(page.engine.input(), "setup");

        page.send(SearchEvent::Input(String::new()), t0);
        assert!(!page.send(SearchEvent::Key(SearchKey::Digit(4)), t0).handled);
        assert!(!page.send(SearchEvent::Key(SearchKey::Digit(0)), t0).handled);
    }

    #[test]
    fn test_blur_hides_after_grace_and_focus_cancels() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.engine.recent().add(&mut page.store, "setup");
        page.send(SearchEvent::Focus, t0);
        assert!(page.engine.suggestions_visible());

        page.send(SearchEvent::Blur, t0);
        page.tick(t0 + Duration::from_millis(60));
        assert!(page.engine.suggestions_visible());
        page.send(SearchEvent::Focus, t0 + Duration::from_millis(80));
        page.tick(t0 + Duration::from_millis(500));
        assert!(page.engine.suggestions_visible());

        page.send(SearchEvent::Blur, t0 + Duration::from_secs(1));
        page.tick(t0 + Duration::from_millis(1120));
        assert!(!page.engine.suggestions_visible());
    }

    #[test]
    fn test_blur_after_edit_records_recent() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.send(SearchEvent::Focus, t0);
        page.send(SearchEvent::Input("install".into()), t0);
        page.send(SearchEvent::Blur, t0);
        assert_eq!(page.recent(), vec!["install"]);

        page.send(SearchEvent::Focus, t0);
        page.send(SearchEvent::Blur, t0);
        assert_eq!(page.recent().len(), 1);
    }

    #[test]
    fn test_remove_and_clear_recent() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.engine.recent().add(&mut page.store, "a");
        page.engine.recent().add(&mut page.store, "b");
        page.send(SearchEvent::Focus, t0);

        page.send(SearchEvent::SuggestionRemove(0), t0);
        assert_eq!(page.engine.suggestions(), ["a"]);
        page.send(SearchEvent::ClearRecent, t0);
        assert!(page.engine.suggestions().is_empty());
        assert!(!page.engine.suggestions_visible());
        assert!(page.recent().is_empty());
    }

    #[test]
    fn test_clear_cancels_pending_commit() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.search("start", t0);
        page.send(SearchEvent::Input("setu".into()), t0 + Duration::from_secs(1));
        page.send(SearchEvent::Clear, t0 + Duration::from_secs(1));
        assert_eq!(page.engine.phase(), &SearchPhase::Idle);
        assert!(!page.tick(t0 + Duration::from_secs(5)));
        assert!(!page.hidden(1));
    }

    #[test]
    fn test_open_close() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.send(SearchEvent::ToggleOpen, t0);
        assert!(page.engine.is_open() && page.engine.is_focused());
        page.send(SearchEvent::Key(SearchKey::Escape), t0);
        assert!(!page.engine.is_open());
        assert!(!page.engine.is_focused());
    }

    #[test]
    fn test_recent_cap_through_enter() {
        let mut page = two_sections();
        let t0 = Instant::now();
        page.send(SearchEvent::Focus, t0);
        for (i, term) in ["q1", "q2", "q3", "q4", "q5", "q6"].iter().enumerate() {
            let now = t0 + Duration::from_secs(i as u64);
            page.search(term, now);
            page.send(SearchEvent::Key(SearchKey::Enter { shift: false }), now);
        }
        assert_eq!(page.recent(), vec!["q6", "q5", "q4", "q3", "q2"]);
    }
}
