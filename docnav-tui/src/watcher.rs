//! File watching for external changes

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Watches the displayed document and reports settled changes
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<()>,
    watched_path: PathBuf,
    last_event: Option<Instant>,
}

/// True when `event` touches `path`, including replace-by-rename saves
fn touches(event: &Event, path: &Path) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    );
    relevant
        && event.paths.iter().any(|p| {
            p == path
                || (p.file_name().is_some()
                    && p.file_name() == path.file_name()
                    && p.parent() == path.parent())
        })
}

impl FileWatcher {
    /// Watch `path` and its parent directory
    pub fn new(path: &Path) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let watched_path = path.to_path_buf();
        let target = watched_path.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches(&event, &target) => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => log::warn!("file watcher error: {}", e),
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch file: {}", path.display()))?;

        // Editors that save through a rename replace the inode
        if let Some(parent) = path.parent() {
            watcher
                .watch(parent, RecursiveMode::NonRecursive)
                .context("Failed to watch parent directory")?;
        }
        log::debug!("watching {}", path.display());

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            watched_path,
            last_event: None,
        })
    }

    /// Drain pending notifications; true once they have been quiet for `debounce`
    pub fn check_changed(&mut self, debounce: Duration, now: Instant) -> bool {
        while self.receiver.try_recv().is_ok() {
            self.last_event = Some(now);
        }

        match self.last_event {
            Some(last) if now.duration_since(last) >= debounce => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    /// When a pending change settles
    pub fn next_deadline(&self, debounce: Duration) -> Option<Instant> {
        self.last_event.map(|last| last + debounce)
    }

    pub fn has_pending(&self) -> bool {
        self.last_event.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.watched_path
    }
}
