//! Generate static files

use anyhow::Result;
use notify::Watcher;
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::cache::{self, CacheDb};
use crate::content::loader::ContentLoader;
use crate::generator::{self, GeneratedPages, Generator};
use crate::{Guide, CONFIG_FILE};

/// Generate the static site (with incremental support)
pub fn run(guide: &Guide) -> Result<()> {
    run_with_options(guide, false).map(|_| ())
}

/// Generate with force option, reporting the pages that changed
pub fn run_with_options(guide: &Guide, force: bool) -> Result<GeneratedPages> {
    let start = std::time::Instant::now();

    let loader = ContentLoader::new(guide);
    let modules = loader.load_modules()?;
    tracing::info!("Loaded {} modules", modules.len());

    let assets = generator::scan_assets(&guide.content_dir)?;
    let config_path = guide.base_dir.join(CONFIG_FILE);
    let cache = CacheDb::load(&guide.base_dir);

    let mut changeset = cache::detect_changes(&cache, &config_path, &modules, &assets)?;
    if force {
        tracing::info!("Full generation (forced)");
        changeset.full_rebuild = true;
    }

    if !changeset.has_changes() && guide.public_dir.exists() {
        tracing::info!(
            "No changes detected, completed in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        return Ok(GeneratedPages::default());
    }

    tracing::info!("Changes detected: {}", changeset.summary());

    let generator = Generator::new(guide)?;
    let pages = generator.generate_incremental(&modules, &changeset)?;

    let mut new_cache = CacheDb::new();
    cache::update_cache(&mut new_cache, &config_path, &modules, &assets)?;
    new_cache.save(&guide.base_dir)?;

    tracing::info!("Generated in {:.2}s", start.elapsed().as_secs_f64());

    Ok(pages)
}

/// Watch for file changes and regenerate
pub async fn watch(guide: &Guide) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    if guide.content_dir.exists() {
        watcher.watch(&guide.content_dir, notify::RecursiveMode::Recursive)?;
    }

    let config_path = guide.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        watcher.watch(&config_path, notify::RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes (incremental mode). Press Ctrl+C to stop.");

    let mut last_rebuild = std::time::Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(_event) => {
                // Debounce: only rebuild if more than 500ms since last rebuild
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, regenerating...");
                    // Config edits need a fresh Guide
                    let result = Guide::new(&guide.base_dir).and_then(|g| run(&g));
                    if let Err(e) = result {
                        tracing::error!("Generation failed: {}", e);
                    }
                    last_rebuild = std::time::Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}
