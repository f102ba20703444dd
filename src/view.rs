//! Catalog view types: what the presentation layer selects and what it gets
//! back.

use std::path::PathBuf;

use crate::tool::{ToolEntry, ToolKind};

/// What the UI has selected. The enum itself is the canonical source of
/// depth; only `Path` falls back to counting segments relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Full recursive walk of the storage root.
    AllTools,
    /// A main category by ordinal: direct files plus one subdirectory level.
    Main(u32),
    /// A subcategory by ordinals: that directory's direct contents only.
    Sub { main: u32, sub: u32 },
    /// A raw path (e.g. from a tree widget); guarded and depth-derived.
    Path(PathBuf),
}

/// Active search / type filter.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    /// Case-insensitive substring matched against name, note, and path.
    pub query: Option<String>,
    pub kind: Option<ToolKind>,
}

impl ViewFilter {
    pub fn matches(&self, tool: &ToolEntry) -> bool {
        if let Some(query) = &self.query {
            let query = query.trim().to_lowercase();
            if !query.is_empty() {
                let hit = tool.name.to_lowercase().contains(&query)
                    || tool.note.to_lowercase().contains(&query)
                    || tool.path.to_string_lossy().to_lowercase().contains(&query);
                if !hit {
                    return false;
                }
            }
        }
        if let Some(kind) = self.kind {
            if tool.kind != kind {
                return false;
            }
        }
        true
    }
}

/// One loaded catalog page.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub tools: Vec<ToolEntry>,
    pub label: String,
    pub count: usize,
}

pub(crate) fn apply_filter(filter: &ViewFilter, tools: Vec<ToolEntry>) -> Vec<ToolEntry> {
    tools.into_iter().filter(|tool| filter.matches(tool)).collect()
}
