pub mod classify;
pub mod normalize;
pub mod references;

use anyhow::{anyhow, Context};
use labref_core::{Database, EngineConfig};
use std::path::Path;

/// Config from `--config`, or the built-in tables.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Database from `--db`, which these commands require.
pub fn open_database(path: Option<&Path>) -> anyhow::Result<Database> {
    let path = path.ok_or_else(|| anyhow!("--db is required for this command"))?;
    Database::open(path).with_context(|| format!("opening database {}", path.display()))
}
