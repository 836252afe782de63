//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::cache::CACHE_DIR;
use crate::Guide;

/// Clean the public directory and cache
pub fn run(guide: &Guide) -> Result<()> {
    if guide.public_dir.exists() {
        fs::remove_dir_all(&guide.public_dir)?;
        tracing::info!("Deleted: {:?}", guide.public_dir);
    }

    let cache_dir = guide.base_dir.join(CACHE_DIR);
    if cache_dir.exists() {
        fs::remove_dir_all(&cache_dir)?;
        tracing::info!("Deleted: {:?}", cache_dir);
    }

    Ok(())
}
