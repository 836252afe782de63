//! Content module - module records, front-matter and markdown processing

mod division;
mod error;
mod frequency;
mod frontmatter;
pub mod loader;
mod markdown;
mod module_info;
mod record;
mod toc;

pub use division::Division;
pub use error::ContentError;
pub use frequency::Frequency;
pub use frontmatter::ModuleFrontMatter;
pub use markdown::{plain_text_excerpt, MarkdownRenderer};
pub use module_info::ModuleInfo;
pub use record::{DerivedFields, ModuleRecord};
pub use toc::{Language, Slugger, TableOfContents, TocEntry};
