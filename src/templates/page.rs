//! The module page template
//!
//! Renders one page per module: the site shell, SEO metadata, and the module
//! layout wrapping the rendered markdown body.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    base_context, LanguageTocData, Memo, PrerequisiteData, SeoData, TemplateRenderer,
};
use crate::config::SiteConfig;
use crate::content::{Language, ModuleInfo, ModuleRecord};
use crate::helpers::{full_url_for, url_for};

/// Title shown in the browser tab and social cards
pub fn seo_title(module: &ModuleInfo) -> String {
    format!("{} ({})", module.title, module.section_label())
}

/// Title and location of a module, for cross-links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLink {
    pub title: String,
    pub path: String,
}

/// Lookup of module links by id
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    links: HashMap<String, ModuleLink>,
}

impl ModuleIndex {
    pub fn build(config: &SiteConfig, records: &[Arc<ModuleRecord>]) -> Self {
        let links = records
            .iter()
            .map(|record| {
                let link = ModuleLink {
                    title: record
                        .frontmatter
                        .title
                        .clone()
                        .unwrap_or_else(|| record.id().to_string()),
                    path: url_for(config, &record.path()),
                };
                (record.id().to_string(), link)
            })
            .collect();
        Self { links }
    }

    pub fn get(&self, id: &str) -> Option<&ModuleLink> {
        self.links.get(id)
    }
}

/// Site-wide data a module page needs beyond its own record
pub struct PageContext<'a> {
    pub config: &'a SiteConfig,
    pub index: &'a ModuleIndex,
}

/// Page template for a single module
pub struct ModuleTemplate<'r> {
    renderer: &'r TemplateRenderer,
    info: Memo<ModuleRecord, ModuleInfo>,
}

impl<'r> ModuleTemplate<'r> {
    pub fn new(renderer: &'r TemplateRenderer) -> Self {
        Self {
            renderer,
            info: Memo::new(),
        }
    }

    /// View-model for a record, recomputed only when the record changes
    pub fn module_info(&self, record: &Arc<ModuleRecord>) -> Arc<ModuleInfo> {
        self.info.get_or_compute(record, ModuleInfo::from_record)
    }

    /// Number of view-model derivations so far
    pub fn derivations(&self) -> usize {
        self.info.computations()
    }

    pub fn render(&self, record: &Arc<ModuleRecord>, page: &PageContext<'_>) -> Result<String> {
        let module = self.module_info(record);
        let config = page.config;

        // Author-written descriptions are plain text and go out verbatim
        let description = if module.description.is_empty() {
            record.summary.clone()
        } else {
            module.description.clone()
        };
        let seo = SeoData {
            title: seo_title(&module),
            description,
            canonical: full_url_for(config, &record.path()),
        };

        let prerequisites: Vec<PrerequisiteData> = module
            .prerequisites
            .iter()
            .map(|id| match page.index.get(id) {
                Some(link) => PrerequisiteData {
                    id: id.clone(),
                    title: link.title.clone(),
                    path: Some(link.path.clone()),
                },
                None => PrerequisiteData {
                    id: id.clone(),
                    title: id.clone(),
                    path: None,
                },
            })
            .collect();

        let languages: Vec<LanguageTocData> = Language::ALL
            .into_iter()
            .map(|lang| LanguageTocData {
                code: lang.as_str(),
                label: lang.label(),
                active: lang == config.default_lang,
                entries: module.toc.entries(lang),
            })
            .collect();

        let mut context = base_context(config);
        context.insert("seo", &seo);
        context.insert("module", module.as_ref());
        context.insert("section_label", module.section_label());
        context.insert(
            "frequency_label",
            &module.frequency.map(|f| f.label()).unwrap_or_default(),
        );
        context.insert(
            "frequency_value",
            &module.frequency.map(|f| f.value()).unwrap_or_default(),
        );
        context.insert("author_count", &record.frontmatter.author.len());
        context.insert("prerequisites", &prerequisites);
        context.insert("languages", &languages);
        context.insert("has_toc", &!module.toc.is_empty());
        context.insert("body", &record.body);
        context.insert(
            "last_updated",
            &record
                .last_updated
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        );
        context.insert("current_path", &record.path());

        self.renderer.render("module.html", &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        plain_text_excerpt, DerivedFields, Division, ModuleFrontMatter, TableOfContents,
    };

    fn record(id: &str, title: &str, division: Division) -> Arc<ModuleRecord> {
        let markdown = "## Overview\n\n<!-- lang: py -->\n## Using bisect\n<!-- /lang -->\n";
        Arc::new(ModuleRecord {
            frontmatter: ModuleFrontMatter {
                id: Some(id.to_string()),
                title: Some(title.to_string()),
                author: vec!["Alice".to_string()],
                description: Some("Find things <fast> & well.".to_string()),
                prerequisites: vec!["intro-sorting".to_string(), "missing".to_string()],
                frequency: Some(2),
                ..Default::default()
            },
            fields: DerivedFields { division },
            body: "<h2 id=\"overview\">Overview</h2><p>Text</p>".to_string(),
            raw: markdown.to_string(),
            summary: plain_text_excerpt(markdown, 160),
            toc: TableOfContents::from_markdown(markdown),
            source: format!("{}.md", id),
            last_updated: None,
        })
    }

    fn sorting() -> Arc<ModuleRecord> {
        record("intro-sorting", "Introduction to Sorting", Division::Bronze)
    }

    #[test]
    fn test_seo_title() {
        let info = ModuleInfo::from_record(&record("dp", "Dynamic Programming", Division::Plat));
        assert_eq!(seo_title(&info), "Dynamic Programming (Platinum)");
    }

    #[test]
    fn test_render_module_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let target = record("binary-search", "Binary Search", Division::Silver);
        let records = vec![sorting(), Arc::clone(&target)];
        let index = ModuleIndex::build(&config, &records);
        let page = PageContext {
            config: &config,
            index: &index,
        };

        let template = ModuleTemplate::new(&renderer);
        let html = template.render(&target, &page).unwrap();

        assert!(html.contains("<title>Binary Search (Silver)</title>"));
        assert!(html.contains(
            r#"<meta name="description" content="Find things &lt;fast&gt; &amp; well.">"#
        ));
        assert!(html.contains(r#"href="http://example.com/silver/binary-search/""#));
        assert!(html.contains(r#"<a href="/bronze/intro-sorting/">Introduction to Sorting</a>"#));
        assert!(html.contains("<li>missing</li>"));
        assert!(html.contains("Not Frequent"));
        assert!(html.contains(r#"<div class="py-4"><div class="markdown"><h2 id="overview">"#));
        assert!(html.contains(r##"href="#using-bisect""##));
        assert!(html.contains(r#"<ol class="toc" data-lang="cpp">"#));
        assert!(html.contains(r#"<ol class="toc" data-lang="py" hidden>"#));
    }

    #[test]
    fn test_view_model_is_memoized_per_record() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let target = sorting();
        let records = vec![Arc::clone(&target)];
        let index = ModuleIndex::build(&config, &records);
        let page = PageContext {
            config: &config,
            index: &index,
        };

        let template = ModuleTemplate::new(&renderer);
        let first = template.render(&target, &page).unwrap();
        let second = template.render(&target, &page).unwrap();
        assert_eq!(first, second);
        assert_eq!(template.derivations(), 1);

        let copy = Arc::new(target.as_ref().clone());
        template.render(&copy, &page).unwrap();
        assert_eq!(template.derivations(), 2);
    }

    #[test]
    fn test_description_falls_back_to_body_excerpt() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let mut record = sorting().as_ref().clone();
        record.frontmatter.description = None;
        let record = Arc::new(record);
        let index = ModuleIndex::default();
        let page = PageContext {
            config: &config,
            index: &index,
        };

        let html = ModuleTemplate::new(&renderer).render(&record, &page).unwrap();
        assert!(html.contains(
            r#"<meta name="description" content="Overview Using bisect">"#
        ));
    }

    #[test]
    fn test_description_comparisons_survive() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let mut record = sorting().as_ref().clone();
        record.frontmatter.description = Some("Compare with a < b and b > c quickly.".to_string());
        let record = Arc::new(record);
        let index = ModuleIndex::default();
        let page = PageContext {
            config: &config,
            index: &index,
        };

        let html = ModuleTemplate::new(&renderer).render(&record, &page).unwrap();
        assert!(html.contains(
            r#"content="Compare with a &lt; b and b &gt; c quickly.""#
        ));
    }

    #[test]
    fn test_fallback_description_is_escaped_once() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let mut record = sorting().as_ref().clone();
        record.frontmatter.description = None;
        record.summary = plain_text_excerpt("Tom & Jerry say \"hi\".", 160);
        let record = Arc::new(record);
        let index = ModuleIndex::default();
        let page = PageContext {
            config: &config,
            index: &index,
        };

        let html = ModuleTemplate::new(&renderer).render(&record, &page).unwrap();
        assert!(html.contains("content=\"Tom &amp; Jerry say \u{201c}hi\u{201d}.\""));
        assert!(!html.contains("&amp;amp;"));
    }
}
