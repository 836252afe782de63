//! Create a new module

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::Division;
use crate::Guide;

/// Module template used when the site has no `scaffolds/module.md`
pub(crate) const MODULE_SCAFFOLD: &str = r#"---
id: {{ id }}
title: {{ title }}
author:
description:
prerequisites:
frequency:
---

## Overview
"#;

/// Create a new module file in the directory of its division
///
/// Returns the path of the created file.
pub fn create_module(
    guide: &Guide,
    title: &str,
    division: &str,
    id: Option<&str>,
) -> Result<PathBuf> {
    let division: Division = division.parse()?;
    let id = id
        .map(str::to_string)
        .unwrap_or_else(|| slug::slugify(title));

    let target_dir = division_dir(&guide.content_dir, division)?;
    fs::create_dir_all(&target_dir)?;

    let file_path = target_dir.join(format!("{}.mdx", id));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    // Load scaffold template
    let scaffold_path = guide.base_dir.join("scaffolds").join("module.md");
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else {
        MODULE_SCAFFOLD.to_string()
    };

    let content = scaffold
        .replace("{{ id }}", &yaml_scalar(&id)?)
        .replace("{{ title }}", &yaml_scalar(title)?)
        .replace("{{ division }}", division.slug());

    fs::write(&file_path, content)?;
    println!("Created: {:?}", file_path);

    Ok(file_path)
}

/// A string as a YAML scalar, quoted when plain style would misparse
fn yaml_scalar(value: &str) -> Result<String> {
    Ok(serde_yaml::to_string(value)?.trim_end().to_string())
}

/// Existing directory for a division, or `<n>_<Label>` in curriculum order
fn division_dir(content_dir: &Path, division: Division) -> Result<PathBuf> {
    if content_dir.exists() {
        for entry in fs::read_dir(content_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if Division::from_dir_name(&name.to_string_lossy()).ok() == Some(division) {
                return Ok(entry.path());
            }
        }
    }

    let position = Division::ALL
        .iter()
        .position(|d| *d == division)
        .unwrap_or_default();
    Ok(content_dir.join(format!("{}_{}", position + 1, division.section_label())))
}
