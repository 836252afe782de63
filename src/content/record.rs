//! Content records, one per module source file

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{Division, ModuleFrontMatter, TableOfContents};

/// Fields derived from where a module lives rather than what it says
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub division: Division,
}

/// Everything the content query returns for one module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub frontmatter: ModuleFrontMatter,
    pub fields: DerivedFields,

    /// Rendered HTML body
    pub body: String,

    /// Raw source text, front-matter included; used for change detection
    pub raw: String,

    /// Plain-text excerpt of the body, used when there is no description
    pub summary: String,

    pub toc: TableOfContents,

    /// Source file path relative to the content directory
    pub source: String,

    pub last_updated: Option<DateTime<Local>>,
}

impl ModuleRecord {
    /// Module id; the loader rejects records without one
    pub fn id(&self) -> &str {
        self.frontmatter.id.as_deref().unwrap_or_default()
    }

    pub fn division(&self) -> Division {
        self.fields.division
    }

    /// Output path of the module page, relative to the site root
    pub fn path(&self) -> String {
        format!("{}/{}/", self.division().slug(), self.id())
    }
}
