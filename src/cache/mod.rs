//! Cache module for incremental generation
//!
//! Tracks a content hash per module source so unchanged module pages are
//! not re-rendered, and a hash per content asset so only new or edited
//! assets are copied. Anything that can affect every page (configuration,
//! generator version, the set of module titles and paths) forces a full
//! rebuild.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use crate::content::ModuleRecord;

/// Cache directory name
pub const CACHE_DIR: &str = ".guidebook-cache";
const CACHE_FILE: &str = "db.json";

/// Represents a cached entry for a module source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    /// Hash of the source file content
    pub content_hash: u64,
    /// Module page path relative to the public dir
    pub output_path: String,
    /// Redirect stub paths relative to the public dir
    #[serde(default)]
    pub redirects: Vec<String>,
}

/// Cache database for tracking module changes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Version of the generator that wrote the cache
    pub generator: String,
    /// Hash of the site config
    pub config_hash: u64,
    /// Hash of every module's id, title and path
    pub links_hash: u64,
    /// Cached entries keyed by source path
    pub modules: HashMap<String, CacheEntry>,
    /// Content hash of each asset, keyed by path relative to the content dir
    #[serde(default)]
    pub assets: HashMap<String, u64>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 2;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_DIR).join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Cache version mismatch, rebuilding cache"),
                Err(e) => tracing::warn!("Ignoring unreadable cache {:?}: {}", cache_path, e),
            }
        }
        Self::default()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            generator: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Change detection result
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Module sources whose page needs rendering
    pub changed: Vec<String>,
    /// Cached entries of modules that no longer exist
    pub deleted: Vec<CacheEntry>,
    /// Redirect stubs a module no longer declares
    pub stale_redirects: Vec<String>,
    /// Assets that are new or whose content changed
    pub assets_changed: Vec<String>,
    /// Assets that no longer exist in the content dir
    pub assets_deleted: Vec<String>,
    /// Whether to regenerate everything
    pub full_rebuild: bool,
}

impl ChangeSet {
    /// Create a changeset indicating full rebuild is needed
    pub fn full_rebuild() -> Self {
        Self {
            full_rebuild: true,
            ..Default::default()
        }
    }

    /// Create an empty changeset (no changes)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if any changes were detected
    pub fn has_changes(&self) -> bool {
        self.full_rebuild
            || !self.changed.is_empty()
            || !self.deleted.is_empty()
            || !self.stale_redirects.is_empty()
            || !self.assets_changed.is_empty()
            || !self.assets_deleted.is_empty()
    }

    /// Whether the module at `source` must be rendered
    pub fn needs_render(&self, source: &str) -> bool {
        self.full_rebuild || self.changed.iter().any(|s| s == source)
    }

    /// Get summary of changes for logging
    pub fn summary(&self) -> String {
        if self.full_rebuild {
            return "full rebuild required".to_string();
        }

        let mut parts = Vec::new();
        if !self.changed.is_empty() {
            parts.push(format!("{} modules changed", self.changed.len()));
        }
        if !self.deleted.is_empty() {
            parts.push(format!("{} modules deleted", self.deleted.len()));
        }
        if !self.stale_redirects.is_empty() {
            parts.push(format!("{} redirects dropped", self.stale_redirects.len()));
        }
        let assets = self.assets_changed.len() + self.assets_deleted.len();
        if assets > 0 {
            parts.push(format!("{} assets changed", assets));
        }

        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Calculate a hash for file content
pub fn hash_content(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Calculate a hash for binary content
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Calculate a hash for a file on disk, 0 when it does not exist
pub fn hash_file(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Hash of the link targets every page may reference
pub fn hash_links(records: &[Arc<ModuleRecord>]) -> u64 {
    let mut links: Vec<(&str, Option<&str>, String)> = records
        .iter()
        .map(|r| (r.id(), r.frontmatter.title.as_deref(), r.path()))
        .collect();
    links.sort();

    let mut hasher = DefaultHasher::new();
    links.hash(&mut hasher);
    hasher.finish()
}

/// Detect changes between the loaded modules and assets and the cached state
pub fn detect_changes(
    cache: &CacheDb,
    config_path: &Path,
    records: &[Arc<ModuleRecord>],
    assets: &HashMap<String, u64>,
) -> Result<ChangeSet> {
    if cache.is_empty() {
        tracing::info!("Cache is empty, full rebuild required");
        return Ok(ChangeSet::full_rebuild());
    }

    let current: HashSet<&str> = records.iter().map(|r| r.source.as_str()).collect();
    let deleted: Vec<CacheEntry> = cache
        .modules
        .iter()
        .filter(|(source, _)| !current.contains(source.as_str()))
        .map(|(source, entry)| {
            tracing::debug!("Deleted module: {}", source);
            entry.clone()
        })
        .collect();

    let stale_redirects = stale_redirects(cache, records);
    let (assets_changed, assets_deleted) = diff_assets(&cache.assets, assets);

    let mut changeset = ChangeSet {
        deleted,
        stale_redirects,
        assets_changed,
        assets_deleted,
        ..ChangeSet::empty()
    };

    let full_rebuild_reason = if cache.generator != env!("CARGO_PKG_VERSION") {
        Some("Generator version changed")
    } else if hash_file(config_path)? != cache.config_hash {
        Some("Config changed")
    } else if hash_links(records) != cache.links_hash {
        Some("Module titles or paths changed")
    } else {
        None
    };

    if let Some(reason) = full_rebuild_reason {
        tracing::info!("{}, full rebuild required", reason);
        changeset.full_rebuild = true;
        return Ok(changeset);
    }

    for record in records {
        let hash = hash_content(&record.raw);
        match cache.modules.get(&record.source) {
            Some(cached) if cached.content_hash == hash => {}
            Some(_) => {
                tracing::debug!("Module changed: {}", record.source);
                changeset.changed.push(record.source.clone());
            }
            None => {
                tracing::debug!("New module: {}", record.source);
                changeset.changed.push(record.source.clone());
            }
        }
    }

    Ok(changeset)
}

/// Redirects that were cached for a module but are no longer declared anywhere
fn stale_redirects(cache: &CacheDb, records: &[Arc<ModuleRecord>]) -> Vec<String> {
    let declared: HashSet<&str> = records
        .iter()
        .flat_map(|r| r.frontmatter.redirects.iter().map(String::as_str))
        .collect();

    let mut stale: Vec<String> = records
        .iter()
        .filter_map(|r| cache.modules.get(&r.source))
        .flat_map(|cached| cached.redirects.iter())
        .filter(|from| !declared.contains(from.as_str()))
        .cloned()
        .collect();
    stale.sort();
    stale.dedup();
    stale
}

/// New or edited assets, and assets that disappeared
fn diff_assets(
    cached: &HashMap<String, u64>,
    current: &HashMap<String, u64>,
) -> (Vec<String>, Vec<String>) {
    let mut changed: Vec<String> = current
        .iter()
        .filter(|(path, hash)| cached.get(path.as_str()) != Some(*hash))
        .map(|(path, _)| path.clone())
        .collect();
    let mut deleted: Vec<String> = cached
        .keys()
        .filter(|path| !current.contains_key(path.as_str()))
        .cloned()
        .collect();
    changed.sort();
    deleted.sort();
    (changed, deleted)
}

/// Update cache with current state
pub fn update_cache(
    cache: &mut CacheDb,
    config_path: &Path,
    records: &[Arc<ModuleRecord>],
    assets: &HashMap<String, u64>,
) -> Result<()> {
    cache.version = CacheDb::VERSION;
    cache.generator = env!("CARGO_PKG_VERSION").to_string();
    cache.config_hash = hash_file(config_path)?;
    cache.links_hash = hash_links(records);
    cache.assets = assets.clone();

    cache.modules = records
        .iter()
        .map(|record| {
            let entry = CacheEntry {
                id: record.id().to_string(),
                content_hash: hash_content(&record.raw),
                output_path: record.path(),
                redirects: record.frontmatter.redirects.clone(),
            };
            (record.source.clone(), entry)
        })
        .collect();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{DerivedFields, Division, ModuleFrontMatter, TableOfContents};
    use tempfile::TempDir;

    fn record(id: &str, raw: &str) -> Arc<ModuleRecord> {
        Arc::new(ModuleRecord {
            frontmatter: ModuleFrontMatter {
                id: Some(id.to_string()),
                title: Some(id.to_uppercase()),
                ..Default::default()
            },
            fields: DerivedFields {
                division: Division::Gold,
            },
            body: String::new(),
            raw: raw.to_string(),
            summary: String::new(),
            toc: TableOfContents::default(),
            source: format!("4_Gold/{}.md", id),
            last_updated: None,
        })
    }

    fn cached(dir: &Path, records: &[Arc<ModuleRecord>]) -> CacheDb {
        let mut cache = CacheDb::new();
        update_cache(&mut cache, &dir.join("_config.yml"), records, &HashMap::new()).unwrap();
        cache
    }

    fn detect(cache: &CacheDb, dir: &Path, records: &[Arc<ModuleRecord>]) -> ChangeSet {
        detect_changes(cache, &dir.join("_config.yml"), records, &cache.assets).unwrap()
    }

    #[test]
    fn test_empty_cache_is_full_rebuild() {
        let dir = TempDir::new().unwrap();
        let changes =
            detect_changes(
            &CacheDb::new(),
            &dir.path().join("_config.yml"),
            &[],
            &HashMap::new(),
        )
        .unwrap();
        assert!(changes.full_rebuild);
    }

    #[test]
    fn test_no_changes() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("dp", "a"), record("graphs", "b")];
        let cache = cached(dir.path(), &records);

        let changes = detect(&cache, dir.path(), &records);
        assert!(!changes.has_changes());
        assert_eq!(changes.summary(), "no changes");
    }

    #[test]
    fn test_changed_module() {
        let dir = TempDir::new().unwrap();
        let cache = cached(dir.path(), &[record("dp", "a"), record("graphs", "b")]);

        let records = vec![record("dp", "a2"), record("graphs", "b")];
        let changes = detect(&cache, dir.path(), &records);
        assert!(!changes.full_rebuild);
        assert_eq!(changes.changed, vec!["4_Gold/dp.md".to_string()]);
        assert!(changes.needs_render("4_Gold/dp.md"));
        assert!(!changes.needs_render("4_Gold/graphs.md"));
        assert_eq!(changes.summary(), "1 modules changed");
    }

    #[test]
    fn test_removed_module_rebuilds_and_reports_deletion() {
        let dir = TempDir::new().unwrap();
        let cache = cached(dir.path(), &[record("dp", "a"), record("graphs", "b")]);

        let records = vec![record("dp", "a")];
        let changes = detect(&cache, dir.path(), &records);
        assert!(changes.full_rebuild);
        assert_eq!(changes.deleted.len(), 1);
        assert_eq!(changes.deleted[0].id, "graphs");
    }

    #[test]
    fn test_deleted_entries_reported() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("dp", "a")];
        let mut cache = cached(dir.path(), &records);
        cache.modules.insert(
            "old.md".to_string(),
            CacheEntry {
                id: "old".to_string(),
                content_hash: 1,
                output_path: "gold/old/".to_string(),
                redirects: Vec::new(),
            },
        );

        let changes = detect(&cache, dir.path(), &records);
        assert_eq!(changes.deleted.len(), 1);
        assert_eq!(changes.deleted[0].output_path, "gold/old/");
        assert_eq!(changes.summary(), "1 modules deleted");
    }

    #[test]
    fn test_config_change_forces_full_rebuild() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("_config.yml");
        let records = vec![record("dp", "a")];
        let cache = cached(dir.path(), &records);

        fs::write(&config_path, "title: New").unwrap();
        let changes = detect(&cache, dir.path(), &records);
        assert!(changes.full_rebuild);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let cache = cached(dir.path(), &[record("dp", "a")]);
        cache.save(dir.path()).unwrap();

        let loaded = CacheDb::load(dir.path());
        assert_eq!(loaded.modules, cache.modules);
        assert_eq!(loaded.links_hash, cache.links_hash);
    }

    #[test]
    fn test_asset_changes() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("dp", "a")];
        let mut cache = cached(dir.path(), &records);
        cache.assets.insert("4_Gold/img/old.png".to_string(), 1);
        cache.assets.insert("4_Gold/img/edited.png".to_string(), 2);

        let mut assets = HashMap::new();
        assets.insert("4_Gold/img/edited.png".to_string(), 3);
        assets.insert("4_Gold/img/new.png".to_string(), 4);

        let changes =
            detect_changes(&cache, &dir.path().join("_config.yml"), &records, &assets).unwrap();
        assert!(!changes.full_rebuild);
        assert!(changes.changed.is_empty());
        assert_eq!(
            changes.assets_changed,
            vec!["4_Gold/img/edited.png", "4_Gold/img/new.png"]
        );
        assert_eq!(changes.assets_deleted, vec!["4_Gold/img/old.png"]);
        assert!(changes.has_changes());
        assert_eq!(changes.summary(), "3 assets changed");
    }

    #[test]
    fn test_dropped_redirects_are_stale() {
        let dir = TempDir::new().unwrap();
        let mut with_redirects = record("dp", "a").as_ref().clone();
        with_redirects.frontmatter.redirects = vec!["old/dp/".to_string(), "dp/".to_string()];
        let cache = cached(dir.path(), &[Arc::new(with_redirects.clone())]);

        with_redirects.raw = "a2".to_string();
        with_redirects.frontmatter.redirects = vec!["dp/".to_string()];
        let changes = detect(&cache, dir.path(), &[Arc::new(with_redirects)]);

        assert_eq!(changes.stale_redirects, vec!["old/dp/"]);
        assert_eq!(changes.changed, vec!["4_Gold/dp.md".to_string()]);
    }
}
