//! List site content

use anyhow::Result;
use indexmap::IndexMap;
use std::sync::Arc;

use crate::content::loader::ContentLoader;
use crate::content::{Division, ModuleRecord};
use crate::Guide;

/// List site content by type
pub fn run(guide: &Guide, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(guide);
    let modules = loader.load_modules()?;

    match content_type {
        "module" | "modules" => {
            println!("Modules ({}):", modules.len());
            for (division, modules) in group(&modules) {
                println!("  {}", division.section_label());
                for module in modules {
                    println!(
                        "    {} - {} [{}]",
                        module.id(),
                        module.frontmatter.title.as_deref().unwrap_or(module.id()),
                        module.source
                    );
                }
            }
        }
        "division" | "divisions" => {
            let groups = group(&modules);
            println!("Divisions ({}):", groups.len());
            for (division, modules) in groups {
                println!("  {} ({})", division.section_label(), modules.len());
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: modules, divisions",
                content_type
            );
        }
    }

    Ok(())
}

/// Group modules by division, keeping load order
fn group(modules: &[Arc<ModuleRecord>]) -> IndexMap<Division, Vec<&ModuleRecord>> {
    let mut groups: IndexMap<Division, Vec<&ModuleRecord>> = IndexMap::new();
    for module in modules {
        groups
            .entry(module.division())
            .or_default()
            .push(module.as_ref());
    }
    groups
}
