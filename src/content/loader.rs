//! Content loader - loads module records from the content directory

use anyhow::Result;
use chrono::Local;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

use super::{
    plain_text_excerpt, ContentError, DerivedFields, Division, Frequency, MarkdownRenderer,
    ModuleFrontMatter, ModuleRecord, TableOfContents,
};
use crate::Guide;

/// Loads content from the content directory
pub struct ContentLoader<'a> {
    guide: &'a Guide,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(guide: &'a Guide) -> Self {
        let highlight = &guide.config.highlight;
        let renderer = MarkdownRenderer::with_options(&highlight.theme, highlight.line_number);
        Self { guide, renderer }
    }

    /// Load every module, sorted by division then source path
    ///
    /// Files that cannot become a module are skipped with a warning;
    /// two modules sharing an id is an error.
    pub fn load_modules(&self) -> Result<Vec<Arc<ModuleRecord>>> {
        let content_dir = &self.guide.content_dir;
        if !content_dir.exists() {
            tracing::warn!("Content directory {:?} does not exist", content_dir);
            return Ok(Vec::new());
        }

        let mut modules: Vec<ModuleRecord> = Vec::new();

        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_markdown_file(path) {
                match self.load_module(path) {
                    Ok(module) => modules.push(module),
                    Err(e) => {
                        tracing::warn!("Skipping {:?}: {}", path, e);
                    }
                }
            }
        }

        let mut seen: HashMap<String, String> = HashMap::new();
        for module in &modules {
            if let Some(first) = seen.insert(module.id().to_string(), module.source.clone()) {
                return Err(ContentError::DuplicateId {
                    id: module.id().to_string(),
                    first,
                    second: module.source.clone(),
                }
                .into());
            }
        }

        modules.sort_by(|a, b| {
            a.division()
                .cmp(&b.division())
                .then_with(|| a.source.cmp(&b.source))
        });
        drop_conflicting_redirects(&mut modules);

        Ok(modules.into_iter().map(Arc::new).collect())
    }

    /// Content query: the record of the module with the given id
    pub fn query(&self, id: &str) -> Result<Option<Arc<ModuleRecord>>> {
        Ok(self
            .load_modules()?
            .into_iter()
            .find(|module| module.id() == id))
    }

    /// Load a single module from a file
    fn load_module(&self, path: &Path) -> Result<ModuleRecord> {
        let source = path
            .strip_prefix(&self.guide.content_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path)?;
        let (mut frontmatter, body) =
            ModuleFrontMatter::parse(&content).map_err(|e| ContentError::InvalidFrontMatter {
                source_path: source.clone(),
                message: e.to_string(),
            })?;

        if frontmatter.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            return Err(ContentError::MissingId(source).into());
        }

        if let Some(value) = frontmatter.frequency {
            if Frequency::from_raw(value).is_none() {
                tracing::warn!(
                    "Ignoring frequency {} in {} (expected 0-{})",
                    value,
                    source,
                    Frequency::MAX
                );
                frontmatter.frequency = None;
            }
        }

        frontmatter.redirects.retain(|from| {
            let valid = ModuleFrontMatter::is_valid_redirect(from);
            if !valid {
                tracing::warn!("Ignoring redirect {:?} in {}: not a path inside the site", from, source);
            }
            valid
        });

        let division = division_for(path, &self.guide.content_dir)?;

        let last_updated = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(chrono::DateTime::<Local>::from);

        let html = self.renderer.render(body)?;
        let toc = TableOfContents::from_markdown(body);
        let summary = plain_text_excerpt(body, self.guide.config.description_length);

        tracing::debug!(
            "Loaded module {} from {}",
            frontmatter.id.as_deref().unwrap_or_default(),
            source
        );

        Ok(ModuleRecord {
            frontmatter,
            fields: DerivedFields { division },
            body: html,
            raw: content.clone(),
            summary,
            toc,
            source,
            last_updated,
        })
    }
}

/// Redirects may not overwrite a module page or another module's redirect
fn drop_conflicting_redirects(modules: &mut [ModuleRecord]) {
    let mut claimed: HashSet<String> = modules
        .iter()
        .map(|m| m.path().trim_matches('/').to_string())
        .collect();

    for module in modules.iter_mut() {
        let source = &module.source;
        module.frontmatter.redirects.retain(|from| {
            let free = claimed.insert(from.trim_matches('/').to_string());
            if !free {
                tracing::warn!("Ignoring redirect {:?} in {}: path already in use", from, source);
            }
            free
        });
    }
}

/// The division is named by the module's top-level directory
fn division_for(path: &Path, content_dir: &Path) -> Result<Division, ContentError> {
    let relative = path.strip_prefix(content_dir).unwrap_or(path);
    let mut components = relative.components();
    let top = components
        .next()
        .and_then(|c| c.as_os_str().to_str())
        .unwrap_or_default();

    // A file directly in the content dir has no division directory
    if components.next().is_none() {
        return Err(ContentError::UnknownDivision(top.to_string()));
    }

    Division::from_dir_name(top)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "mdx" || e == "markdown")
        .unwrap_or(false)
}
