//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::content::Language;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,

    // Rendering
    /// Language variant whose table of contents is shown first
    pub default_lang: Language,
    #[serde(default)]
    pub highlight: HighlightConfig,
    /// Length of the meta description derived from the body when a module
    /// has none
    pub description_length: usize,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Guide".to_string(),
            description: String::new(),
            author: String::new(),
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),

            default_lang: Language::Cpp,
            highlight: HighlightConfig::default(),
            description_length: 160,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// syntect theme name
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "InspiredGitHub".to_string(),
            line_number: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Guide");
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.default_lang, Language::Cpp);
        assert!(config.highlight.line_number);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: USACO Guide
url: https://guide.example.org
default_lang: java
highlight:
  line_number: false
analytics_id: UA-1
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "USACO Guide");
        assert_eq!(config.url, "https://guide.example.org");
        assert_eq!(config.default_lang, Language::Java);
        assert!(!config.highlight.line_number);
        assert_eq!(config.highlight.theme, "InspiredGitHub");
        assert_eq!(config.public_dir, "public");
        assert!(config.extra.contains_key("analytics_id"));
    }
}
