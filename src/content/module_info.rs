//! Display view-model derived from a module record

use serde::Serialize;

use super::{Division, Frequency, ModuleRecord, TableOfContents};

/// What the module page shows about a module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub prerequisites: Vec<String>,
    pub frequency: Option<Frequency>,
    pub division: Division,
    pub toc: TableOfContents,
}

impl ModuleInfo {
    /// Pure mapping from a record to its view-model
    pub fn from_record(record: &ModuleRecord) -> Self {
        let fm = &record.frontmatter;
        Self {
            id: record.id().to_string(),
            title: fm.title.clone().unwrap_or_else(|| record.id().to_string()),
            author: fm.author.join(", "),
            description: fm.description.clone().unwrap_or_default(),
            prerequisites: fm.prerequisites.clone(),
            frequency: fm.frequency.and_then(Frequency::from_raw),
            division: record.division(),
            toc: record.toc.clone(),
        }
    }

    pub fn section_label(&self) -> &'static str {
        self.division.section_label()
    }
}
