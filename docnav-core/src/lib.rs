//! docnav Core - Page model, navigation controllers, and configuration
//!
//! This crate contains the logic behind a navigable document page,
//! independent of how it is drawn:
//! - Element tree built from Markdown, with collapsible `##` sections
//! - Heading ids, table of contents, and scroll-driven active entry tracking
//! - In-page search with highlighting, match navigation, and recent queries
//! - Theme preference, copy-link feedback, and navigation scrollbar geometry
//! - Configuration management and persisted preferences
//!
//! Hosts drive a [`Page`] with [`PageEvent`]s and carry out the returned
//! [`Command`]s against their own layout, described through [`Viewport`].

pub mod clipboard;
pub mod config;
pub mod copy_link;
pub mod doc;
pub mod dom;
pub mod highlight;
pub mod ids;
pub mod location;
pub mod markup;
pub mod page;
pub mod recent;
pub mod scrollbar;
pub mod search;
pub mod sections;
pub mod slug;
pub mod store;
pub mod theme;
pub mod toc;
pub mod tracker;
pub mod view;

// Re-export commonly used types
pub use clipboard::ClipboardChain;
pub use config::{Config, ThemeVariant};
pub use doc::Document;
pub use dom::{Dom, NodeId};
pub use location::Location;
pub use page::{Page, PageEvent, PageSettings};
pub use search::{SearchEvent, SearchKey};
pub use sections::SectionEvent;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use view::{Bounds, Command, ScrollBehavior, ScrollBlock, Viewport};
