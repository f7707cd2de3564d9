//! CLI command implementations.

pub mod list;
pub mod reconcile;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::adapters::memory::InMemoryResourceStore;

/// Load a resource fixture file into an in-memory store.
pub(crate) fn load_store(path: &Path) -> Result<InMemoryResourceStore> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read resources from {}", path.display()))?;
    InMemoryResourceStore::from_yaml(&source)
        .with_context(|| format!("Failed to parse resources in {}", path.display()))
}
