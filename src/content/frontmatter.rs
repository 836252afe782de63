//! Front-matter parsing

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter of a module source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleFrontMatter {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub author: Vec<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub prerequisites: Vec<String>,
    /// Raw rating; out-of-range values are dropped by the loader
    pub frequency: Option<i64>,
    /// Legacy paths that should redirect to this module
    #[serde(deserialize_with = "string_or_vec", default)]
    pub redirects: Vec<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl ModuleFrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    ///
    /// Content without a `---` fenced block yields default front-matter and
    /// the whole input as body.
    pub fn parse(content: &str) -> Result<(Self, &str), serde_yaml::Error> {
        let trimmed = content.trim_start();
        let Some(rest) = trimmed.strip_prefix("---") else {
            return Ok((Self::default(), content));
        };
        let rest = rest.trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            return Ok((Self::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = &rest[end_pos + 4..];
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((Self::default(), remaining));
        }

        let fm = serde_yaml::from_str::<ModuleFrontMatter>(yaml_content)?;
        Ok((fm, remaining))
    }

    /// A redirect must name a directory strictly inside the site root
    pub fn is_valid_redirect(path: &str) -> bool {
        let trimmed = path.trim_matches('/');
        !trimmed.is_empty()
            && !trimmed.contains('\\')
            && trimmed
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_frontmatter() {
        let content = r#"---
id: intro-sorting
title: Introduction to Sorting
author: Darren Yao, Benjamin Qi
description: Arranging collections of elements in order.
prerequisites:
  - intro-ds
  - simulation
frequency: 3
---

# Sorting

Body text.
"#;

        let (fm, remaining) = ModuleFrontMatter::parse(content).unwrap();
        assert_eq!(fm.id.as_deref(), Some("intro-sorting"));
        assert_eq!(fm.title.as_deref(), Some("Introduction to Sorting"));
        assert_eq!(fm.author, vec!["Darren Yao, Benjamin Qi"]);
        assert_eq!(fm.prerequisites, vec!["intro-ds", "simulation"]);
        assert_eq!(fm.frequency, Some(3));
        assert!(remaining.starts_with("# Sorting"));
    }

    #[test]
    fn test_single_string_prerequisite() {
        let content = "---\nid: a\nprerequisites: b\n---\nbody";
        let (fm, _) = ModuleFrontMatter::parse(content).unwrap();
        assert_eq!(fm.prerequisites, vec!["b"]);
    }

    #[test]
    fn test_extra_fields_are_kept() {
        let content = "---\nid: a\nsection: practice\n---\nbody";
        let (fm, _) = ModuleFrontMatter::parse(content).unwrap();
        assert!(fm.extra.contains_key("section"));
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = ModuleFrontMatter::parse("# Just a heading").unwrap();
        assert_eq!(fm, ModuleFrontMatter::default());
        assert_eq!(remaining, "# Just a heading");
    }

    #[test]
    fn test_redirect_validation() {
        assert!(ModuleFrontMatter::is_valid_redirect("/sorting/"));
        assert!(ModuleFrontMatter::is_valid_redirect("old/intro-sorting"));
        assert!(!ModuleFrontMatter::is_valid_redirect("/"));
        assert!(!ModuleFrontMatter::is_valid_redirect(""));
        assert!(!ModuleFrontMatter::is_valid_redirect("../x"));
        assert!(!ModuleFrontMatter::is_valid_redirect("a/./b"));
        assert!(!ModuleFrontMatter::is_valid_redirect("a//b"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let content = "---\nid: [unterminated\n---\nbody";
        assert!(ModuleFrontMatter::parse(content).is_err());
    }
}
