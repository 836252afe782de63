//! Generator module - writes module pages, redirects and the index page

use anyhow::{Context as _, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::cache::{hash_bytes, CacheEntry, ChangeSet};
use crate::content::{Division, ModuleFrontMatter, ModuleRecord};
use crate::helpers::url_for;
use crate::templates::{
    base_context, DivisionData, ModuleIndex, ModuleSummary, ModuleTemplate, PageContext,
    TemplateRenderer,
};
use crate::Guide;

/// Pages touched by one generation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedPages {
    /// Every page may have changed (full rebuild or asset change)
    pub full: bool,
    /// Written or removed page paths relative to the public dir; `""` is the index
    pub paths: Vec<String>,
}

impl GeneratedPages {
    pub fn is_empty(&self) -> bool {
        !self.full && self.paths.is_empty()
    }
}

/// Static site generator using the embedded templates
pub struct Generator {
    guide: Guide,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(guide: &Guide) -> Result<Self> {
        Ok(Self {
            guide: guide.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site
    pub fn generate(&self, modules: &[Arc<ModuleRecord>]) -> Result<GeneratedPages> {
        self.generate_incremental(modules, &ChangeSet::full_rebuild())
    }

    /// Generate only what the changeset requires
    pub fn generate_incremental(
        &self,
        modules: &[Arc<ModuleRecord>],
        changes: &ChangeSet,
    ) -> Result<GeneratedPages> {
        fs::create_dir_all(&self.guide.public_dir)?;
        let mut pages = GeneratedPages {
            full: changes.full_rebuild
                || !changes.assets_changed.is_empty()
                || !changes.assets_deleted.is_empty(),
            paths: Vec::new(),
        };

        for entry in &changes.deleted {
            self.remove_outputs(entry)?;
            pages.paths.push(entry.output_path.clone());
            pages.paths.extend(entry.redirects.iter().cloned());
        }
        self.remove_stale_redirects(modules, &changes.stale_redirects)?;
        pages.paths.extend(changes.stale_redirects.iter().cloned());

        for asset in &changes.assets_deleted {
            self.remove_page_file(&self.guide.public_dir.join(asset))?;
        }
        if changes.full_rebuild {
            self.copy_content_assets()?;
        } else {
            for asset in &changes.assets_changed {
                self.copy_asset(asset)?;
            }
        }

        let index = ModuleIndex::build(&self.guide.config, modules);
        let page = PageContext {
            config: &self.guide.config,
            index: &index,
        };
        let template = ModuleTemplate::new(&self.renderer);

        let mut rendered = 0;
        for module in modules {
            if !changes.needs_render(&module.source) {
                continue;
            }
            let html = template.render(module, &page)?;
            self.write_page(&module.path(), &html)?;
            self.generate_redirects(module)?;
            pages.paths.push(module.path());
            pages.paths.extend(module.frontmatter.redirects.iter().cloned());
            rendered += 1;
            tracing::debug!("Generated module: {}", module.path());
        }
        tracing::info!("Generated {} module pages", rendered);

        self.generate_index_page(modules)?;
        pages.paths.push(String::new());

        Ok(pages)
    }

    /// Write a stub page for every legacy path of a module
    fn generate_redirects(&self, module: &ModuleRecord) -> Result<()> {
        if module.frontmatter.redirects.is_empty() {
            return Ok(());
        }

        let target = url_for(&self.guide.config, &module.path());
        let title = module
            .frontmatter
            .title
            .clone()
            .unwrap_or_else(|| module.id().to_string());

        for from in &module.frontmatter.redirects {
            if !ModuleFrontMatter::is_valid_redirect(from) {
                tracing::warn!("Skipping redirect {:?} of {}", from, module.id());
                continue;
            }
            let mut context = base_context(&self.guide.config);
            context.insert("target", &target);
            context.insert("title", &title);
            let html = self.renderer.render("redirect.html", &context)?;
            self.write_page(from, &html)?;
            tracing::debug!("Generated redirect: {} -> {}", from, target);
        }

        Ok(())
    }

    /// Generate the landing page listing modules by division
    fn generate_index_page(&self, modules: &[Arc<ModuleRecord>]) -> Result<()> {
        let divisions = group_by_division(&self.guide.config, modules);

        let mut context = base_context(&self.guide.config);
        context.insert("divisions", &divisions);
        context.insert("current_path", "/");

        let html = self.renderer.render("index.html", &context)?;
        self.write_page("", &html)?;
        tracing::info!("Generated index page");

        Ok(())
    }

    /// Write `<public>/<path>/index.html`
    fn write_page(&self, path: &str, html: &str) -> Result<()> {
        let output_path = self.output_path(path);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        Ok(())
    }

    fn output_path(&self, path: &str) -> PathBuf {
        // Strip leading slash from path to avoid creating absolute paths
        let clean_path = path.trim_matches('/');
        if clean_path.is_empty() {
            self.guide.public_dir.join("index.html")
        } else {
            self.guide.public_dir.join(clean_path).join("index.html")
        }
    }

    /// Remove the pages of a module that no longer exists
    fn remove_outputs(&self, entry: &CacheEntry) -> Result<()> {
        for path in std::iter::once(&entry.output_path).chain(entry.redirects.iter()) {
            self.remove_page_file(&self.output_path(path))?;
        }
        Ok(())
    }

    /// Remove redirect stubs no module declares, unless a live page took the path
    fn remove_stale_redirects(&self, modules: &[Arc<ModuleRecord>], stale: &[String]) -> Result<()> {
        if stale.is_empty() {
            return Ok(());
        }
        let live: HashSet<String> = modules
            .iter()
            .flat_map(|m| std::iter::once(m.path()).chain(m.frontmatter.redirects.iter().cloned()))
            .map(|path| path.trim_matches('/').to_string())
            .collect();

        for from in stale {
            if !live.contains(from.trim_matches('/')) {
                self.remove_page_file(&self.output_path(from))?;
            }
        }
        Ok(())
    }

    fn remove_page_file(&self, output_path: &Path) -> Result<()> {
        if output_path.exists() {
            fs::remove_file(output_path)?;
            tracing::debug!("Removed: {:?}", output_path);
        }
        if let Some(parent) = output_path.parent() {
            remove_empty_dirs(parent, &self.guide.public_dir);
        }
        Ok(())
    }

    /// Copy every non-markdown file (images, etc.) from the content directory
    fn copy_content_assets(&self) -> Result<()> {
        let assets = asset_paths(&self.guide.content_dir)?;
        for relative in &assets {
            self.copy_asset(relative)?;
        }

        if !assets.is_empty() {
            tracing::info!("Copied {} content assets", assets.len());
        }
        Ok(())
    }

    fn copy_asset(&self, relative: &str) -> Result<()> {
        let dest = self.guide.public_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(self.guide.content_dir.join(relative), &dest)
            .with_context(|| format!("Failed to copy asset {}", relative))?;
        tracing::debug!("Copied asset: {}", relative);
        Ok(())
    }
}

/// Content hash of every asset, keyed by path relative to the content dir
pub fn scan_assets(content_dir: &Path) -> Result<HashMap<String, u64>> {
    asset_paths(content_dir)?
        .into_iter()
        .map(|relative| -> Result<(String, u64)> {
            let bytes = fs::read(content_dir.join(&relative))?;
            Ok((relative, hash_bytes(&bytes)))
        })
        .collect()
}

/// Non-markdown, non-hidden files under the content dir, relative and `/`-separated
fn asset_paths(content_dir: &Path) -> Result<Vec<String>> {
    if !content_dir.exists() {
        return Ok(Vec::new());
    }

    let mut assets = Vec::new();
    for entry in WalkDir::new(content_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || is_markdown(path) || is_hidden(path, content_dir) {
            continue;
        }
        let relative = path.strip_prefix(content_dir)?;
        assets.push(relative.to_string_lossy().replace('\\', "/"));
    }
    assets.sort();
    Ok(assets)
}

/// Modules grouped by division in curriculum order; empty divisions omitted
fn group_by_division(
    config: &crate::config::SiteConfig,
    modules: &[Arc<ModuleRecord>],
) -> Vec<DivisionData> {
    Division::ALL
        .into_iter()
        .filter_map(|division| {
            let summaries: Vec<ModuleSummary> = modules
                .iter()
                .filter(|m| m.division() == division)
                .map(|m| ModuleSummary {
                    id: m.id().to_string(),
                    title: m
                        .frontmatter
                        .title
                        .clone()
                        .unwrap_or_else(|| m.id().to_string()),
                    description: m.frontmatter.description.clone().unwrap_or_default(),
                    path: url_for(config, &m.path()),
                })
                .collect();

            (!summaries.is_empty()).then(|| DivisionData {
                slug: division.slug(),
                label: division.section_label(),
                modules: summaries,
            })
        })
        .collect()
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "mdx" | "markdown")
    )
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .map(|relative| {
            relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        })
        .unwrap_or(false)
}

/// Remove empty directories from `dir` up to (not including) `stop`
fn remove_empty_dirs(dir: &Path, stop: &Path) {
    let mut current = Some(dir);
    while let Some(dir) = current {
        if dir == stop || !dir.starts_with(stop) {
            break;
        }
        // Fails on non-empty directories, which ends the walk
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}
