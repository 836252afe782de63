//! Built-in guide templates using the Tera template engine
//!
//! All templates are embedded directly in the binary.

mod memo;
mod page;

pub use memo::Memo;
pub use page::{seo_title, ModuleIndex, ModuleLink, ModuleTemplate, PageContext};

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers::{meta_generator, url_for};

/// Template renderer with embedded guide templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all guide templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Bodies arrive as rendered HTML; templates escape text fields explicitly
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("guide/layout.html")),
            ("module.html", include_str!("guide/module.html")),
            ("index.html", include_str!("guide/index.html")),
            ("redirect.html", include_str!("guide/redirect.html")),
            // Partials
            ("partials/seo.html", include_str!("guide/partials/seo.html")),
            (
                "partials/module_layout.html",
                include_str!("guide/partials/module_layout.html"),
            ),
            ("partials/toc.html", include_str!("guide/partials/toc.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Context shared by every page: the `site` variable
pub fn base_context(config: &SiteConfig) -> Context {
    let mut context = Context::new();
    context.insert("site", &SiteData::from_config(config));
    context
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(crate::helpers::truncate(
        &s,
        length,
        Some(&omission),
    )))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub home: String,
    pub stylesheet: String,
    pub generator: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            home: url_for(config, "/"),
            stylesheet: url_for(config, "css/style.css"),
            generator: meta_generator(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoData {
    pub title: String,
    pub description: String,
    pub canonical: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrerequisiteData {
    pub id: String,
    pub title: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageTocData<'a> {
    pub code: &'static str,
    pub label: &'static str,
    pub active: bool,
    pub entries: &'a [crate::content::TocEntry],
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DivisionData {
    pub slug: &'static str,
    pub label: &'static str,
    pub modules: Vec<ModuleSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_load() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_render_index() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut config = SiteConfig::default();
        config.title = "Guide & Co".to_string();
        let mut context = base_context(&config);
        context.insert(
            "divisions",
            &vec![DivisionData {
                slug: "gold",
                label: "Gold",
                modules: vec![ModuleSummary {
                    id: "dp".to_string(),
                    title: "Dynamic Programming".to_string(),
                    description: "Overlapping subproblems & more".to_string(),
                    path: "/gold/dp/".to_string(),
                }],
            }],
        );

        let html = renderer.render("index.html", &context).unwrap();
        assert!(html.contains("Guide &amp; Co"));
        assert!(html.contains(r#"<section class="division" id="gold">"#));
        assert!(html.contains(r#"<a href="/gold/dp/">Dynamic Programming</a>"#));
        assert!(html.contains("Overlapping subproblems &amp; more"));
        assert!(html.contains(r#"name="generator""#));
    }

    #[test]
    fn test_truncate_chars_filter() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(8));
        let value = truncate_chars_filter(&tera::Value::from("Hello World"), &args).unwrap();
        assert_eq!(value, tera::Value::from("Hello..."));
    }
}
