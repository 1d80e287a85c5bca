//! Page address and in-page fragment

/// Most fragments kept in session history; older ones are dropped
pub const HISTORY_LIMIT: usize = 64;

/// Where the page was loaded from, plus its current fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Scheme and authority; `"null"` for pages loaded from disk
    pub origin: String,
    pub pathname: String,
    /// Current fragment including the leading `#`, or empty
    pub hash: String,
    history: Vec<String>,
}

impl Location {
    pub fn new(
        origin: impl Into<String>,
        pathname: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        let hash: String = hash.into();
        let mut location = Self {
            origin: origin.into(),
            pathname: pathname.into(),
            hash: String::new(),
            history: Vec::new(),
        };
        location.set_hash(&hash);
        location
    }

    /// A page read from a local file
    pub fn for_file(path: &std::path::Path, fragment: Option<&str>) -> Self {
        let pathname = std::fs::canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .replace('\\', "/");
        let pathname = if pathname.starts_with('/') {
            pathname
        } else {
            format!("/{}", pathname)
        };
        Self::new("null", pathname, fragment.unwrap_or_default())
    }

    /// Fragment without the leading `#`
    pub fn fragment(&self) -> &str {
        self.hash.strip_prefix('#').unwrap_or(&self.hash)
    }

    /// Replace the fragment without recording history
    pub fn set_hash(&mut self, fragment: &str) {
        let id = fragment.strip_prefix('#').unwrap_or(fragment);
        self.hash = if id.is_empty() {
            String::new()
        } else {
            format!("#{}", id)
        };
    }

    /// Record a new history entry for `#<id>`; returns false if the fragment
    /// is already current
    pub fn push_hash(&mut self, id: &str) -> bool {
        let id = id.strip_prefix('#').unwrap_or(id);
        if self.fragment() == id {
            return false;
        }
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(std::mem::take(&mut self.hash));
        self.set_hash(id);
        true
    }

    /// Earlier fragments, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Origin as used in shareable links
    pub fn link_origin(&self) -> &str {
        if self.origin == "null" {
            "file://"
        } else {
            &self.origin
        }
    }

    /// Absolute link to an element id on this page
    pub fn link_to(&self, id: &str) -> String {
        format!("{}{}#{}", self.link_origin(), self.pathname, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_strips_hash() {
        let loc = Location::new("https://docs.example.com", "/manual/", "#setup");
        assert_eq!(loc.fragment(), "setup");
        assert_eq!(loc.hash, "#setup");

        let empty = Location::new("https://docs.example.com", "/", "");
        assert_eq!(empty.fragment(), "");
        assert_eq!(empty.hash, "");
    }

    #[test]
    fn test_push_hash_records_history() {
        let mut loc = Location::new("null", "/tmp/manual.md", "intro");
        assert!(loc.push_hash("setup"));
        assert!(!loc.push_hash("#setup"));
        assert_eq!(loc.hash, "#setup");
        assert_eq!(loc.history(), ["#intro"]);
    }

    #[test]
    fn test_history_is_capped() {
        let mut loc = Location::new("null", "/tmp/manual.md", "");
        for i in 0..HISTORY_LIMIT * 3 {
            assert!(loc.push_hash(&format!("topic-{}", i)));
        }
        assert_eq!(loc.history().len(), HISTORY_LIMIT);
        let oldest = HISTORY_LIMIT * 2 - 1;
        assert_eq!(loc.history()[0], format!("#topic-{}", oldest));
        assert_eq!(loc.fragment(), format!("topic-{}", HISTORY_LIMIT * 3 - 1));
    }

    #[test]
    fn test_links() {
        let file = Location::new("null", "/tmp/manual.md", "");
        assert_eq!(file.link_to("intro"), "file:///tmp/manual.md#intro");

        let web = Location::new("https://docs.example.com", "/manual/", "");
        assert_eq!(web.link_to("setup"), "https://docs.example.com/manual/#setup");
    }
}
