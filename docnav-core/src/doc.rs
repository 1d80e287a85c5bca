//! Source document loaded from disk

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::markup::{self, PageMarkup};

/// A Markdown file and the bookkeeping needed to reload it
#[derive(Clone, Debug)]
pub struct Document {
    pub path: PathBuf,
    pub source: String,
    pub loaded_mtime: Option<SystemTime>,
    pub disk_mtime: Option<SystemTime>,
    pub dirty_on_disk: bool,
    pub rev: u64,
}

impl Document {
    /// Load a document from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize path: {}", path.display()))?;

        let source = fs::read_to_string(&abs_path)
            .with_context(|| format!("Failed to read file: {}", abs_path.display()))?;

        let mtime = fs::metadata(&abs_path).ok().and_then(|m| m.modified().ok());

        Ok(Self {
            path: abs_path,
            source,
            loaded_mtime: mtime,
            disk_mtime: mtime,
            dirty_on_disk: false,
            rev: 1,
        })
    }

    /// Build a document from in-memory text
    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            loaded_mtime: None,
            disk_mtime: None,
            dirty_on_disk: false,
            rev: 1,
        }
    }

    /// Reload the document from disk
    pub fn reload(&mut self) -> Result<()> {
        let source = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to reload file: {}", self.path.display()))?;

        let mtime = fs::metadata(&self.path).ok().and_then(|m| m.modified().ok());

        self.source = source;
        self.loaded_mtime = mtime;
        self.disk_mtime = mtime;
        self.dirty_on_disk = false;
        self.rev += 1;
        log::info!("reloaded {} (rev {})", self.path.display(), self.rev);

        Ok(())
    }

    /// Note that the file changed on disk without reloading it
    pub fn mark_dirty(&mut self) {
        self.disk_mtime = fs::metadata(&self.path).ok().and_then(|m| m.modified().ok());
        self.dirty_on_disk = self.disk_mtime != self.loaded_mtime || self.disk_mtime.is_none();
    }

    /// Parse the source into a fresh page tree
    pub fn build_page(&self) -> PageMarkup {
        markup::build_page(&self.source)
    }

    /// File name for display
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_file() -> Result<()> {
        let file = NamedTempFile::new()?;

        let doc = Document::load(file.path())?;
        assert!(doc.source.is_empty());
        assert_eq!(doc.rev, 1);
        assert!(!doc.dirty_on_disk);

        let page = doc.build_page();
        assert!(page.dom.children(page.content_root).is_empty());

        Ok(())
    }

    #[test]
    fn test_load_simple_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"# Manual\n\n## Intro\n\nSome text\n")?;

        let doc = Document::load(file.path())?;
        assert!(doc.path.is_absolute());
        let page = doc.build_page();
        assert_eq!(page.title.as_deref(), Some("Manual"));

        Ok(())
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = Document::load(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(err.to_string().contains("Failed to canonicalize path"));
    }

    #[test]
    fn test_reload_increments_revision() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"Initial content\n")?;
        file.flush()?;

        let mut doc = Document::load(file.path())?;
        assert_eq!(doc.rev, 1);

        file.write_all(b"New content\n")?;
        file.flush()?;

        doc.reload()?;
        assert_eq!(doc.rev, 2);
        assert!(doc.source.contains("New content"));

        Ok(())
    }

    #[test]
    fn test_from_source() {
        let doc = Document::from_source("/tmp/manual.md", "## A\n");
        assert_eq!(doc.display_name(), "manual.md");
        assert_eq!(doc.rev, 1);
    }
}
