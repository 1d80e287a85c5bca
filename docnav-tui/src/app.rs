//! Application state
//!
//! [`App`] owns the [`Page`] and acts as its host: it lays the page out on
//! the terminal, forwards events, and carries out the commands that come
//! back.

use std::rc::Rc;
use std::time::{Duration, Instant};

use docnav_core::config::{Config, ThemeVariant};
use docnav_core::sections::HeaderKey;
use docnav_core::store::{FileStore, KeyValueStore, MemoryStore};
use docnav_core::{
    ClipboardChain, Command, Document, Location, NodeId, Page, PageEvent, PageSettings,
    ScrollBehavior, ScrollBlock, SearchEvent, SectionEvent,
};
use docnav_core::scrollbar::{self, ScrollMetrics, ScrollbarVisibility};
use ratatui::layout::Rect;

use crate::render::{render_page, RenderKey, RendererCache, COLUMN_WIDTH, ROW_HEIGHT};
use crate::screen::{compute_layout, Screen};
use crate::theme::Theme;

#[cfg(feature = "watch")]
use crate::watcher::FileWatcher;

/// Quiet period before a change on disk is acted on
#[cfg(feature = "watch")]
pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Poll interval while something is animating
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// An in-progress drag of the navigation scrollbar thumb
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavDrag {
    pub start_y: u16,
    pub start_offset: f64,
    pub thumb_size: f64,
}

/// Main application state
pub struct App {
    pub config: Config,
    pub doc: Document,
    pub page: Page,
    pub theme: Theme,
    pub theme_variant: ThemeVariant,
    pub screen: Screen,
    cache: RendererCache,
    terminal_area: Rect,
    /// Docked navigation panel on wide terminals
    pub show_toc: bool,
    pub toc_focus: bool,
    pub toc_selected: usize,
    pub should_quit: bool,
    pub status_message: Option<String>,
    /// Row a smooth scroll is heading for
    scroll_target: Option<usize>,
    pub nav_scrollbar: ScrollbarVisibility,
    pub nav_drag: Option<NavDrag>,
    pub pointer_in_nav: bool,
    frame_requested: bool,
    #[cfg(feature = "watch")]
    pub watcher: Option<FileWatcher>,
}

impl App {
    /// Create a new application instance backed by the user's stores
    pub fn new(config: Config, doc: Document, anchor: Option<&str>) -> Self {
        let store: Box<dyn KeyValueStore> = match FileStore::open_default() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("preferences will not persist: {:#}", e);
                Box::new(MemoryStore::new())
            }
        };
        let clipboard = ClipboardChain::system();
        let prefers_dark = docnav_core::theme::system_prefers_dark();

        #[allow(unused_mut)]
        let mut app = Self::with_parts(config, doc, anchor, store, clipboard, prefers_dark);

        #[cfg(feature = "watch")]
        {
            if app.config.watch.enabled {
                app.watcher = match FileWatcher::new(&app.doc.path) {
                    Ok(watcher) => Some(watcher),
                    Err(e) => {
                        log::warn!("not watching {}: {:#}", app.doc.path.display(), e);
                        None
                    }
                };
            }
        }
        app
    }

    /// Create an instance from explicit parts, with no file watcher
    pub fn with_parts(
        config: Config,
        doc: Document,
        anchor: Option<&str>,
        store: Box<dyn KeyValueStore>,
        clipboard: ClipboardChain,
        system_prefers_dark: bool,
    ) -> Self {
        let location = Location::for_file(&doc.path, anchor);
        let page = Page::new(
            doc.build_page(),
            location,
            store,
            clipboard,
            PageSettings::from_config(&config),
            system_prefers_dark,
        );
        let theme_variant = page.theme();
        let screen = Screen {
            reduced_motion: config.motion.reduced_motion,
            ..Screen::default()
        };

        Self {
            show_toc: config.toc.enabled,
            config,
            doc,
            page,
            theme: Theme::for_variant(theme_variant),
            theme_variant,
            screen,
            cache: RendererCache::new(),
            terminal_area: Rect::default(),
            toc_focus: false,
            toc_selected: 0,
            should_quit: false,
            status_message: None,
            scroll_target: None,
            nav_scrollbar: ScrollbarVisibility::new(),
            nav_drag: None,
            pointer_in_nav: false,
            frame_requested: false,
            #[cfg(feature = "watch")]
            watcher: None,
        }
    }

    /// The terminal changed size
    pub fn resize(&mut self, width: u16, height: u16) {
        let area = Rect::new(0, 0, width, height);
        if area == self.terminal_area {
            return;
        }
        let was_narrow = self.screen.narrow;
        self.terminal_area = area;
        self.relayout();

        // Leaving the overlay layout closes the overlay
        if was_narrow && !self.screen.narrow && self.page.nav_open() {
            self.dispatch(PageEvent::CloseNav);
        }
        self.dispatch(PageEvent::Resize);
    }

    /// First layout is ready
    pub fn start(&mut self) {
        self.relayout();
        let commands = self.page.start(&self.screen);
        self.apply(commands);
    }

    /// Recompute areas and the rendered page from current state
    pub fn relayout(&mut self) {
        if self.page.theme() != self.theme_variant {
            self.theme_variant = self.page.theme();
            self.theme = Theme::for_variant(self.theme_variant);
        }

        let (areas, narrow) = compute_layout(
            self.terminal_area,
            &self.config.toc,
            self.show_toc,
            self.page.nav_open(),
            self.page.search().is_open(),
        );
        self.screen.areas = areas;
        self.screen.narrow = narrow;

        let key = RenderKey {
            doc_rev: self.doc.rev,
            generation: self.page.dom().generation(),
            width: areas.content.width,
            theme: self.theme_variant,
        };
        let page = &self.page;
        let theme = &self.theme;
        self.screen.rendered = self
            .cache
            .get_or_render(key, || render_page(page, areas.content.width, theme));

        self.screen.scroll = self.screen.scroll.min(self.screen.max_scroll());
        self.screen.toc_len = self.page.toc().len();
        self.screen.toc_scroll = self.screen.toc_scroll.min(self.screen.max_toc_scroll());
        self.toc_selected = self.toc_selected.min(self.screen.toc_len.saturating_sub(1));
    }

    /// Feed an event to the page and carry out what it asks for
    pub fn dispatch(&mut self, event: PageEvent) {
        self.relayout();
        let commands = self.page.handle(event, &self.screen, Instant::now());
        self.apply(commands);
        self.relayout();
    }

    /// Feed a search event; returns whether it was consumed
    pub fn search(&mut self, event: SearchEvent) -> bool {
        self.relayout();
        let outcome = self.page.search_event(event, &self.screen, Instant::now());
        self.apply(outcome.commands);
        self.relayout();
        outcome.handled
    }

    pub fn apply(&mut self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }
        self.relayout();
        for command in commands {
            match command {
                Command::ScrollIntoView {
                    node,
                    block,
                    behavior,
                } => self.scroll_into_view(node, block, behavior),
                Command::RevealNavEntry { entry, .. } => self.reveal_nav_entry(entry),
                Command::PushHash(fragment) => log::debug!("history entry #{}", fragment),
                Command::CloseNavOverlay => {
                    if self.screen.narrow {
                        self.toc_focus = false;
                    }
                    self.relayout();
                }
                Command::RequestAnimationFrame => self.frame_requested = true,
            }
        }
    }

    fn scroll_into_view(&mut self, node: NodeId, block: ScrollBlock, behavior: ScrollBehavior) {
        let Some(row) = self.screen.rendered.row_of(node) else {
            log::debug!("scroll target is not laid out");
            return;
        };
        let rows = self.screen.page_rows().max(1);
        let scroll = self.screen.scroll;
        let target = match block {
            ScrollBlock::Start => row,
            ScrollBlock::Center => row.saturating_sub(rows / 2),
            ScrollBlock::Nearest if row < scroll => row,
            ScrollBlock::Nearest if row >= scroll + rows => row + 1 - rows,
            ScrollBlock::Nearest => scroll,
        };
        self.scroll_to(target, behavior);
    }

    /// Scroll the navigation panel so `entry` has a row of margin
    fn reveal_nav_entry(&mut self, entry: usize) {
        let rows = self.screen.toc_rows();
        if rows == 0 {
            return;
        }
        let scroll = self.screen.toc_scroll;
        let margin = usize::from(rows > 2);
        let target = if entry < scroll + margin {
            entry.saturating_sub(margin)
        } else if entry + margin >= scroll + rows {
            entry + margin + 1 - rows
        } else {
            scroll
        };
        self.set_toc_scroll(target);
    }

    pub fn set_toc_scroll(&mut self, offset: usize) {
        let offset = offset.min(self.screen.max_toc_scroll());
        if offset != self.screen.toc_scroll {
            self.screen.toc_scroll = offset;
            self.nav_scrollbar.on_scroll(Instant::now());
        }
    }

    pub fn scroll_to(&mut self, row: usize, behavior: ScrollBehavior) {
        let row = row.min(self.screen.max_scroll());
        if behavior == ScrollBehavior::Smooth && !self.screen.reduced_motion {
            self.scroll_target = (row != self.screen.scroll).then_some(row);
            return;
        }
        self.scroll_target = None;
        self.set_scroll(row);
    }

    /// Scroll by whole rows, immediately
    pub fn scroll_by(&mut self, delta: isize) {
        let row = self.screen.scroll.saturating_add_signed(delta);
        self.scroll_to(row, ScrollBehavior::Instant);
    }

    fn set_scroll(&mut self, row: usize) {
        if row == self.screen.scroll {
            return;
        }
        self.screen.scroll = row;
        let commands = self.page.handle(PageEvent::Scroll, &self.screen, Instant::now());
        self.apply(commands);
    }

    /// Something needs frames at [`FRAME_INTERVAL`]
    pub fn is_animating(&self) -> bool {
        self.scroll_target.is_some() || self.frame_requested
    }

    /// One turn of the loop: animation step, frame callbacks, deferred work, timers
    pub fn update(&mut self, now: Instant) {
        self.relayout();
        self.step_smooth_scroll();

        if std::mem::take(&mut self.frame_requested) {
            let commands = self.page.on_animation_frame(&self.screen);
            self.apply(commands);
        }
        let commands = self.page.run_deferred(&self.screen);
        self.apply(commands);

        self.tick(now);
    }

    fn step_smooth_scroll(&mut self) {
        let Some(target) = self.scroll_target else {
            return;
        };
        let current = self.screen.scroll;
        let distance = target.abs_diff(current);
        let step = (distance / 3).max(1);
        let next = if target > current { current + step } else { current - step };
        if next == target {
            self.scroll_target = None;
        }
        self.set_scroll(next);
    }

    /// Fire due timers
    pub fn tick(&mut self, now: Instant) {
        let commands = self.page.tick(&self.screen, now);
        self.apply(commands);
        self.relayout();
        self.nav_scrollbar.tick(now);

        #[cfg(feature = "watch")]
        self.check_watcher(now);
    }

    #[cfg(feature = "watch")]
    fn check_watcher(&mut self, now: Instant) {
        let changed = match self.watcher.as_mut() {
            Some(watcher) => watcher.check_changed(WATCH_DEBOUNCE, now),
            None => false,
        };
        if !changed {
            return;
        }
        if self.config.watch.auto_reload {
            if let Err(e) = self.reload_document() {
                log::error!("{:#}", e);
                self.set_status_message(format!("Reload failed: {}", e));
            }
        } else {
            self.doc.mark_dirty();
        }
    }

    /// Earliest instant [`App::tick`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        let deadlines = [self.page.next_deadline(), self.nav_scrollbar.next_deadline()];
        #[allow(unused_mut)]
        let mut next = deadlines.into_iter().flatten().min();

        #[cfg(feature = "watch")]
        {
            if let Some(due) = self.watcher.as_ref().and_then(|w| w.next_deadline(WATCH_DEBOUNCE)) {
                next = Some(next.map_or(due, |n| n.min(due)));
            }
        }
        next
    }

    /// Re-read the file and rebuild the page in place
    pub fn reload_document(&mut self) -> anyhow::Result<()> {
        self.doc.reload()?;
        let markup = self.doc.build_page();
        let commands = self.page.rebuild(markup, &self.screen, Instant::now());
        self.relayout();
        self.apply(commands);
        self.dispatch(PageEvent::Resize);
        self.set_status_message("Reloaded".to_string());
        Ok(())
    }

    /// Show or hide the navigation panel for the current layout
    pub fn toggle_toc(&mut self) {
        if self.screen.narrow {
            self.dispatch(PageEvent::ToggleNav);
            self.toc_focus = self.page.nav_open();
        } else {
            self.show_toc = !self.show_toc;
            if !self.show_toc {
                self.toc_focus = false;
            }
            self.dispatch(PageEvent::Resize);
        }
        if self.toc_focus {
            self.toc_selected = self.page.tracker().active_entry().unwrap_or(0);
        }
    }

    /// The navigation panel is on screen
    pub fn toc_visible(&self) -> bool {
        self.screen.areas.toc.is_some()
    }

    /// Move keyboard focus into the navigation panel
    pub fn focus_toc(&mut self) {
        if !self.toc_visible() {
            self.toggle_toc();
        }
        if self.toc_visible() {
            self.toc_focus = true;
            self.toc_selected = self.page.tracker().active_entry().unwrap_or(0);
        }
    }

    pub fn blur_toc(&mut self) {
        self.toc_focus = false;
        if self.screen.narrow && self.page.nav_open() {
            self.dispatch(PageEvent::CloseNav);
        }
    }

    pub fn toc_move(&mut self, delta: isize) {
        let len = self.page.toc().len();
        if len == 0 {
            return;
        }
        self.toc_selected = self.toc_selected.saturating_add_signed(delta).min(len - 1);
        self.reveal_nav_entry(self.toc_selected);
    }

    /// Follow a navigation entry
    pub fn activate_toc_entry(&mut self, entry: usize) {
        self.toc_selected = entry;
        self.dispatch(PageEvent::TocActivate(entry));
        if self.screen.narrow {
            self.toc_focus = false;
        }
    }

    /// Section containing the active heading
    pub fn current_section(&self) -> Option<usize> {
        let node = self.page.tracker().active_node()?;
        self.page.sections().section_of(self.page.dom(), node)
    }

    /// Toggle the section the reader is in, as if its header had focus
    pub fn toggle_current_section(&mut self) {
        let Some(section) = self.current_section() else {
            return;
        };
        let Some(header) = self.page.sections().get(section).and_then(|s| s.header) else {
            return;
        };
        self.dispatch(PageEvent::Section(SectionEvent::HeaderKey {
            section,
            key: HeaderKey::Enter,
            focused: header,
        }));
    }

    pub fn click_section_header(&mut self, section: usize, target: NodeId) {
        self.dispatch(PageEvent::Section(SectionEvent::HeaderClick { section, target }));
    }

    pub fn toggle_all(&mut self) {
        let narrow = self.screen.narrow;
        self.dispatch(PageEvent::ToggleAll { narrow });
    }

    /// Copy the link of the section owning `control`
    pub fn copy_link(&mut self, control: NodeId) {
        self.relayout();
        let (x, y) = match self.screen.rendered.control_position(control) {
            Some((row, col)) => {
                let areas = self.screen.areas;
                let x = f64::from(areas.content.x + col) * COLUMN_WIDTH;
                let y = (f64::from(areas.content.y) + row as f64 - self.screen.scroll as f64)
                    * ROW_HEIGHT;
                (x, y)
            }
            None => (0.0, 0.0),
        };
        self.dispatch(PageEvent::CopyLink { control, x, y });
        if self.page.feedback().copied_control() != Some(control) {
            self.set_status_message("Could not copy link".to_string());
        }
    }

    /// Copy the link of the section the reader is in
    pub fn copy_current_link(&mut self) {
        let control = self.current_section().and_then(|section| {
            let header = self.page.sections().get(section)?.header?;
            self.page
                .dom()
                .query(header, |el| el.has_attr(docnav_core::sections::COPY_LINK_ATTR))
        });
        match control {
            Some(control) => self.copy_link(control),
            None => self.set_status_message("No section link here".to_string()),
        }
    }

    pub fn toggle_theme(&mut self) {
        self.dispatch(PageEvent::ToggleTheme);
        self.relayout();
    }

    fn nav_metrics(&self) -> Option<(ScrollMetrics, f64)> {
        let track = self.screen.areas.toc_track()?;
        let metrics = ScrollMetrics {
            content: self.screen.toc_len as f64 * ROW_HEIGHT,
            viewport: self.screen.toc_rows() as f64 * ROW_HEIGHT,
            offset: self.screen.toc_scroll as f64 * ROW_HEIGHT,
        };
        Some((metrics, f64::from(track.height) * ROW_HEIGHT))
    }

    /// Thumb of the navigation scrollbar in viewport units
    pub fn nav_thumb(&self) -> Option<scrollbar::Thumb> {
        let (metrics, track) = self.nav_metrics()?;
        scrollbar::thumb(metrics, track)
    }

    /// Press on the navigation scrollbar track at terminal row `y`
    pub fn nav_scrollbar_press(&mut self, y: u16) {
        let (Some((metrics, track)), Some(track_rect)) =
            (self.nav_metrics(), self.screen.areas.toc_track())
        else {
            return;
        };
        let Some(thumb) = scrollbar::thumb(metrics, track) else {
            return;
        };
        let local = f64::from(y.saturating_sub(track_rect.y)) * ROW_HEIGHT;
        if thumb.contains(local) {
            self.nav_drag = Some(NavDrag {
                start_y: y,
                start_offset: metrics.offset,
                thumb_size: thumb.size,
            });
            self.nav_scrollbar.on_drag_start();
        } else {
            let offset = scrollbar::track_click_offset(local, metrics, track, thumb.size);
            self.set_toc_scroll((offset / ROW_HEIGHT).round() as usize);
        }
    }

    pub fn nav_scrollbar_drag(&mut self, y: u16) {
        let (Some(drag), Some((metrics, track))) = (self.nav_drag, self.nav_metrics()) else {
            return;
        };
        let delta = (f64::from(y) - f64::from(drag.start_y)) * ROW_HEIGHT;
        let offset =
            scrollbar::drag_offset(drag.start_offset, delta, metrics, track, drag.thumb_size);
        self.set_toc_scroll((offset / ROW_HEIGHT).round() as usize);
    }

    pub fn nav_scrollbar_release(&mut self) {
        if self.nav_drag.take().is_some() {
            self.nav_scrollbar.on_drag_end(Instant::now());
        }
    }

    /// Pointer moved; tracks entering and leaving the navigation panel
    pub fn nav_hover(&mut self, inside: bool) {
        if inside == self.pointer_in_nav {
            return;
        }
        self.pointer_in_nav = inside;
        if inside {
            self.nav_scrollbar.on_enter();
        } else {
            self.nav_scrollbar.on_leave(Instant::now());
        }
    }

    pub fn rendered(&self) -> Rc<crate::render::RenderedPage> {
        Rc::clone(&self.screen.rendered)
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
