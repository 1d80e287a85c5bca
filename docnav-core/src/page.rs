//! One navigable page and the dispatcher that drives its controllers
//!
//! Hosts feed [`PageEvent`]s in, perform the returned [`Command`]s, and call
//! [`Page::tick`] with the current time so timers can fire.

use std::time::Instant;

use crate::clipboard::ClipboardChain;
use crate::config::{Config, SearchConfig, ThemeVariant, TrackerConfig};
use crate::copy_link::{self, CopyFeedback};
use crate::dom::{Dom, NodeId};
use crate::ids::ensure_heading_ids;
use crate::location::Location;
use crate::markup::PageMarkup;
use crate::recent::RecentQueries;
use crate::search::{SearchContext, SearchEngine, SearchEvent, SearchOutcome};
use crate::sections::{SectionEvent, Sections, ToggleAllLabel};
use crate::store::KeyValueStore;
use crate::theme::{apply_theme, ThemePreference};
use crate::toc::{build_toc, Toc};
use crate::tracker::{ScrollTracker, TrackerEvent};
use crate::view::{Command, ScrollBehavior, ScrollBlock, Viewport};

/// The parts of [`Config`] a page needs
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub app_name: String,
    pub theme: Option<ThemeVariant>,
    pub search: SearchConfig,
    pub tracker: TrackerConfig,
}

impl PageSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_name: config.app_name.clone(),
            theme: config.theme,
            search: config.search.clone(),
            tracker: config.tracker,
        }
    }
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PageEvent {
    Scroll,
    Resize,
    AnimationFrame,
    /// The loop came back around after a fragment change
    NextTurn,
    /// The fragment changed from outside (e.g. history navigation)
    HashChange(String),
    /// A TOC entry was activated
    TocActivate(usize),
    Section(SectionEvent),
    /// The toggle-all control; `narrow` hosts also close the navigation overlay
    ToggleAll { narrow: bool },
    Search(SearchEvent),
    /// A copy-link control was activated at (x, y)
    CopyLink { control: NodeId, x: f64, y: f64 },
    ToggleTheme,
    OpenNav,
    CloseNav,
    ToggleNav,
}

pub struct Page {
    dom: Dom,
    content_root: NodeId,
    title: Option<String>,
    toc: Toc,
    tracker: ScrollTracker,
    sections: Sections,
    search: SearchEngine,
    theme_pref: ThemePreference,
    theme: ThemeVariant,
    location: Location,
    feedback: CopyFeedback,
    nav_open: bool,
    store: Box<dyn KeyValueStore>,
    clipboard: ClipboardChain,
}

impl Page {
    pub fn new(
        markup: PageMarkup,
        location: Location,
        store: Box<dyn KeyValueStore>,
        clipboard: ClipboardChain,
        settings: PageSettings,
        system_prefers_dark: bool,
    ) -> Self {
        let PageMarkup {
            mut dom,
            content_root,
            title,
        } = markup;

        let theme_pref = ThemePreference::new(&settings.app_name, settings.theme);
        let theme = theme_pref.resolve(store.as_ref(), system_prefers_dark);
        apply_theme(&mut dom, theme);

        let assigned = ensure_heading_ids(&mut dom, content_root);
        let toc = build_toc(&dom, content_root);
        let sections = Sections::init(&mut dom, content_root);
        log::debug!(
            "page ready: {} ids assigned, {} toc entries, {} sections",
            assigned.len(),
            toc.len(),
            sections.len()
        );

        let recent = RecentQueries::new(&settings.app_name, settings.search.max_recent);

        Self {
            dom,
            content_root,
            title,
            toc,
            tracker: ScrollTracker::new(settings.tracker),
            sections,
            search: SearchEngine::new(settings.search, recent),
            theme_pref,
            theme,
            location,
            feedback: CopyFeedback::new(),
            nav_open: false,
            store,
            clipboard,
        }
    }

    /// First layout is available: honor the start-up fragment and start tracking
    pub fn start(&mut self, view: &dyn Viewport) -> Vec<Command> {
        let mut commands = Vec::new();
        let fragment = self.location.fragment().to_string();
        self.sections.expand_from_hash(&mut self.dom, &fragment);

        if let Some(target) = self.dom.get_element_by_id(&fragment) {
            commands.push(Command::ScrollIntoView {
                node: target,
                block: ScrollBlock::Start,
                behavior: ScrollBehavior::Instant,
            });
        }
        commands.extend(self.tracker.attach(&self.dom, &self.toc, view));
        if !commands.is_empty() {
            // Layout settles after the initial jump
            self.tracker.handle(TrackerEvent::HashChange, view);
        }
        commands
    }

    pub fn handle(&mut self, event: PageEvent, view: &dyn Viewport, now: Instant) -> Vec<Command> {
        match event {
            PageEvent::Scroll => self.tracker.handle(TrackerEvent::Scroll, view),
            PageEvent::Resize => self.tracker.handle(TrackerEvent::Resize, view),
            PageEvent::AnimationFrame => self.on_animation_frame(view),
            PageEvent::NextTurn => self.run_deferred(view),
            PageEvent::HashChange(fragment) => {
                self.location.set_hash(&fragment);
                self.on_hash_change(view)
            }
            PageEvent::TocActivate(index) => self.activate_toc_entry(index, view),
            PageEvent::Section(event) => {
                let user_toggle = matches!(
                    event,
                    SectionEvent::HeaderClick { .. }
                        | SectionEvent::HeaderKey { .. }
                        | SectionEvent::ToggleAll
                );
                let changed = self.sections.handle(&mut self.dom, event);
                self.after_section_change(&changed, user_toggle, view)
            }
            PageEvent::ToggleAll { narrow } => {
                let changed = self.sections.handle(&mut self.dom, SectionEvent::ToggleAll);
                let mut commands = self.after_section_change(&changed, true, view);
                if narrow {
                    self.nav_open = false;
                    commands.push(Command::CloseNavOverlay);
                }
                commands
            }
            PageEvent::Search(event) => self.search_event(event, view, now).commands,
            PageEvent::CopyLink { control, x, y } => self.copy_link(control, x, y, view, now),
            PageEvent::ToggleTheme => {
                self.theme = self.theme_pref.toggle(&mut self.dom, self.store.as_mut());
                log::debug!("theme switched to {}", self.theme.as_str());
                Vec::new()
            }
            PageEvent::OpenNav => {
                self.nav_open = true;
                Vec::new()
            }
            PageEvent::CloseNav => {
                self.nav_open = false;
                vec![Command::CloseNavOverlay]
            }
            PageEvent::ToggleNav => {
                self.nav_open = !self.nav_open;
                if self.nav_open {
                    Vec::new()
                } else {
                    vec![Command::CloseNavOverlay]
                }
            }
        }
    }

    /// Search events, keeping whether the key was consumed
    pub fn search_event(
        &mut self,
        event: SearchEvent,
        view: &dyn Viewport,
        now: Instant,
    ) -> SearchOutcome {
        let generation = self.dom.generation();
        let mut ctx = SearchContext {
            dom: &mut self.dom,
            sections: &self.sections,
            store: self.store.as_mut(),
            content_root: self.content_root,
            reduced_motion: view.prefers_reduced_motion(),
        };
        let mut outcome = self.search.handle(event, &mut ctx, now);
        if self.dom.generation() != generation {
            outcome.commands.extend(self.tracker.handle(TrackerEvent::Resize, view));
        }
        outcome
    }

    /// Fire due timers
    pub fn tick(&mut self, view: &dyn Viewport, now: Instant) -> Vec<Command> {
        let mut ctx = SearchContext {
            dom: &mut self.dom,
            sections: &self.sections,
            store: self.store.as_mut(),
            content_root: self.content_root,
            reduced_motion: view.prefers_reduced_motion(),
        };
        let committed = self.search.tick(&mut ctx, now);
        self.feedback.tick(&mut self.dom, now);

        if committed {
            self.tracker.handle(TrackerEvent::Resize, view)
        } else {
            Vec::new()
        }
    }

    /// Once per drawn frame
    pub fn on_animation_frame(&mut self, view: &dyn Viewport) -> Vec<Command> {
        self.tracker.handle(TrackerEvent::AnimationFrame, view)
    }

    /// On the loop turn after a fragment change
    pub fn run_deferred(&mut self, view: &dyn Viewport) -> Vec<Command> {
        self.tracker.handle(TrackerEvent::NextTurn, view)
    }

    fn on_hash_change(&mut self, view: &dyn Viewport) -> Vec<Command> {
        let fragment = self.location.fragment().to_string();
        self.sections.expand_from_hash(&mut self.dom, &fragment);
        self.tracker.handle(TrackerEvent::HashChange, view)
    }

    fn activate_toc_entry(&mut self, index: usize, view: &dyn Viewport) -> Vec<Command> {
        let Some(id) = self.toc.get(index).map(|entry| entry.target.clone()) else {
            return Vec::new();
        };
        let Some(target) = self.dom.get_element_by_id(&id) else {
            log::debug!("toc target #{} not found", id);
            return Vec::new();
        };

        self.sections.expand_enclosing(&mut self.dom, target);
        self.nav_open = false;
        if self.location.push_hash(&id) {
            self.tracker.handle(TrackerEvent::HashChange, view);
        }
        vec![
            Command::CloseNavOverlay,
            Command::ScrollIntoView {
                node: target,
                block: ScrollBlock::Start,
                behavior: ScrollBehavior::for_motion(view.prefers_reduced_motion()),
            },
            Command::PushHash(id),
        ]
    }

    fn after_section_change(
        &mut self,
        changed: &[usize],
        user_toggle: bool,
        view: &dyn Viewport,
    ) -> Vec<Command> {
        if changed.is_empty() {
            return Vec::new();
        }
        if user_toggle {
            for &index in changed {
                self.search.forget_auto_expanded(index);
            }
        }
        self.tracker.handle(TrackerEvent::Resize, view)
    }

    fn copy_link(
        &mut self,
        control: NodeId,
        x: f64,
        y: f64,
        view: &dyn Viewport,
        now: Instant,
    ) -> Vec<Command> {
        let copied = copy_link::copy_section_link(
            &mut self.dom,
            &self.location,
            &mut self.clipboard,
            &mut self.feedback,
            control,
            x,
            y,
            now,
        );
        if !copied {
            return Vec::new();
        }
        let id = self
            .sections
            .section_of(&self.dom, control)
            .and_then(|index| self.sections.get(index))
            .and_then(|section| self.dom.id_of(section.node))
            .map(str::to_string);
        match id {
            Some(id) if self.location.push_hash(&id) => {
                self.tracker.handle(TrackerEvent::HashChange, view);
                vec![Command::PushHash(id)]
            }
            _ => Vec::new(),
        }
    }

    /// Swap in a freshly built tree, keeping the fragment, theme and search input
    pub fn rebuild(
        &mut self,
        markup: PageMarkup,
        view: &dyn Viewport,
        now: Instant,
    ) -> Vec<Command> {
        let PageMarkup {
            mut dom,
            content_root,
            title,
        } = markup;
        apply_theme(&mut dom, self.theme);
        ensure_heading_ids(&mut dom, content_root);

        self.toc = build_toc(&dom, content_root);
        self.sections = Sections::init(&mut dom, content_root);
        self.dom = dom;
        self.content_root = content_root;
        self.title = title;
        self.search.invalidate(now);
        self.feedback = CopyFeedback::new();

        let fragment = self.location.fragment().to_string();
        self.sections.expand_from_hash(&mut self.dom, &fragment);
        self.tracker.attach(&self.dom, &self.toc, view)
    }

    /// Earliest instant at which [`Page::tick`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.search.next_deadline(), self.feedback.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn content_root(&self) -> NodeId {
        self.content_root
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    pub fn tracker(&self) -> &ScrollTracker {
        &self.tracker
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn theme(&self) -> ThemeVariant {
        self.theme
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn feedback(&self) -> &CopyFeedback {
        &self.feedback
    }

    pub fn nav_open(&self) -> bool {
        self.nav_open
    }

    pub fn toggle_all_label(&self) -> ToggleAllLabel {
        self.sections.toggle_all_label(&self.dom)
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::build_page;
    use crate::store::MemoryStore;
    use crate::view::Bounds;
    use std::collections::HashMap;

    /// Lays out every element at 40 units per node in document order
    struct StackedView {
        tops: HashMap<NodeId, f64>,
        scroll: f64,
    }

    impl StackedView {
        fn new(page: &Page) -> Self {
            let tops = std::iter::once(page.dom().root())
                .chain(page.dom().descendants(page.dom().root()))
                .enumerate()
                .map(|(i, node)| (node, i as f64 * 40.0))
                .collect();
            Self { tops, scroll: 0.0 }
        }
    }

    impl Viewport for StackedView {
        fn header_height(&self) -> f64 {
            16.0
        }
        fn top_of(&self, node: NodeId) -> Option<f64> {
            self.tops.get(&node).map(|top| top - self.scroll)
        }
        fn nav_bounds(&self) -> Option<Bounds> {
            None
        }
        fn nav_entry_bounds(&self, _entry: usize) -> Option<Bounds> {
            None
        }
        fn prefers_reduced_motion(&self) -> bool {
            true
        }
    }

    const SOURCE: &str = "# Manual\n\n## Getting Started {#intro .collapsed}\n\nWelcome.\n\n\
    ### Deep Dive\n\nDetails.\n\n## Setup {#setup}\n\nInstall it.\n";

    fn page(fragment: &str) -> Page {
        Page::new(
            build_page(SOURCE),
            Location::new("null", "/tmp/manual.md", fragment),
            Box::new(MemoryStore::new()),
            ClipboardChain::disabled(),
            PageSettings::default(),
            true,
        )
    }

    #[test]
    fn test_new_assigns_ids_and_builds_toc() {
        let page = page("");
        let targets: Vec<&str> = page.toc().entries().iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["intro", "deep-dive", "setup"]);
        assert_eq!(page.sections().len(), 2);
        assert_eq!(page.theme(), ThemeVariant::Dark);
        assert_eq!(page.dom().attr(page.dom().root(), "data-theme"), Some("dark"));
        assert_eq!(page.title(), Some("Manual"));
    }

    #[test]
    fn test_start_expands_fragment_target() {
        let mut page = page("#deep-dive");
        let view = StackedView::new(&page);
        assert!(page.sections().is_collapsed(page.dom(), 0));

        let commands = page.start(&view);
        assert!(!page.sections().is_collapsed(page.dom(), 0));
        let target = page.dom().get_element_by_id("deep-dive").unwrap();
        assert_eq!(
            commands[0],
            Command::ScrollIntoView {
                node: target,
                block: ScrollBlock::Start,
                behavior: ScrollBehavior::Instant,
            }
        );
        assert_eq!(page.tracker().active_entry(), Some(0));
    }

    #[test]
    fn test_toc_activation() {
        let mut page = page("");
        let view = StackedView::new(&page);
        page.start(&view);
        page.handle(PageEvent::OpenNav, &view, Instant::now());

        let commands = page.handle(PageEvent::TocActivate(1), &view, Instant::now());
        let target = page.dom().get_element_by_id("deep-dive").unwrap();
        assert_eq!(
            commands,
            vec![
                Command::CloseNavOverlay,
                Command::ScrollIntoView {
                    node: target,
                    block: ScrollBlock::Start,
                    behavior: ScrollBehavior::Instant,
                },
                Command::PushHash("deep-dive".into()),
            ]
        );
        assert!(!page.nav_open());
        assert!(!page.sections().is_collapsed(page.dom(), 0));
        assert_eq!(page.location().hash, "#deep-dive");

        assert!(page.handle(PageEvent::TocActivate(99), &view, Instant::now()).is_empty());
    }

    #[test]
    fn test_hash_change_recomputes_next_turn() {
        let mut page = page("");
        let mut view = StackedView::new(&page);
        page.start(&view);
        let before = page.tracker().recompute_count();

        page.handle(PageEvent::HashChange("#setup".into()), &view, Instant::now());
        assert_eq!(page.tracker().recompute_count(), before);

        view.scroll = 10_000.0;
        page.handle(PageEvent::NextTurn, &view, Instant::now());
        assert_eq!(page.tracker().active_entry(), Some(2));
    }

    #[test]
    fn test_toggle_all_narrow_closes_nav() {
        let mut page = page("");
        let view = StackedView::new(&page);
        page.handle(PageEvent::OpenNav, &view, Instant::now());
        assert_eq!(page.toggle_all_label().text(), "Expand all");

        let commands = page.handle(PageEvent::ToggleAll { narrow: true }, &view, Instant::now());
        assert!(commands.contains(&Command::CloseNavOverlay));
        assert!(!page.nav_open());
        assert_eq!(page.toggle_all_label().text(), "Collapse all");
    }

    #[test]
    fn test_toggle_theme_persists() {
        let mut page = page("");
        let view = StackedView::new(&page);
        page.handle(PageEvent::ToggleTheme, &view, Instant::now());
        assert_eq!(page.theme(), ThemeVariant::Light);
        assert_eq!(page.store().get("docnav_theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_rebuild_keeps_fragment_and_reruns_search() {
        let mut page = page("#setup");
        let view = StackedView::new(&page);
        page.start(&view);
        let t0 = Instant::now();
        page.handle(PageEvent::Search(SearchEvent::Input("install".into())), &view, t0);
        page.tick(&view, t0 + std::time::Duration::from_millis(120));
        assert_eq!(page.search().count_display(), "1/1");

        let updated = format!("{}\nInstall again.\n", SOURCE);
        page.rebuild(build_page(&updated), &view, t0 + std::time::Duration::from_secs(1));
        assert!(page.search().matches().is_empty());
        page.tick(&view, t0 + std::time::Duration::from_secs(1));
        assert_eq!(page.search().count_display(), "1/2");
    }
}
