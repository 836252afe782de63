//! Table of contents per language variant

use lazy_static::lazy_static;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::markdown::markdown_options;

lazy_static! {
    static ref LANG_MARKER: Regex =
        Regex::new(r"(?m)^[ \t]*<!--\s*(?:lang:\s*([A-Za-z+]+)|(/lang))\s*-->[ \t]*\r?$").unwrap();
}

/// A language variant the guide is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Java,
    Py,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Cpp, Language::Java, Language::Py];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Py => "py",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::Py => "Python",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpp" | "c++" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "py" | "python" => Ok(Language::Py),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One heading: depth, label and anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub depth: u8,
    pub value: String,
    pub slug: String,
}

/// Headings of a module, one list per language variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOfContents {
    pub cpp: Vec<TocEntry>,
    pub java: Vec<TocEntry>,
    pub py: Vec<TocEntry>,
}

impl TableOfContents {
    /// Build the table of contents of a markdown document
    ///
    /// Headings outside a language section appear in every variant.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut toc = Self::default();
        let mut slugger = Slugger::default();

        for segment in split_language_sections(markdown) {
            for entry in collect_headings(segment.text, &mut slugger) {
                match segment.lang {
                    Some(lang) => toc.entries_mut(lang).push(entry),
                    None => {
                        for lang in Language::ALL {
                            toc.entries_mut(lang).push(entry.clone());
                        }
                    }
                }
            }
        }

        toc
    }

    pub fn entries(&self, lang: Language) -> &[TocEntry] {
        match lang {
            Language::Cpp => &self.cpp,
            Language::Java => &self.java,
            Language::Py => &self.py,
        }
    }

    fn entries_mut(&mut self, lang: Language) -> &mut Vec<TocEntry> {
        match lang {
            Language::Cpp => &mut self.cpp,
            Language::Java => &mut self.java,
            Language::Py => &mut self.py,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cpp.is_empty() && self.java.is_empty() && self.py.is_empty()
    }
}

/// Generates unique heading anchors, `-1`, `-2`, ... on repeats
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let mut base = slug::slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }

        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        slug
    }
}

/// A run of markdown, optionally restricted to one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub lang: Option<Language>,
    pub text: &'a str,
}

/// Split markdown on `<!-- lang: xx -->` / `<!-- /lang -->` markers
///
/// An opening marker implicitly closes a section that is still open.
/// Markers naming an unknown language open a section shared by all variants.
pub fn split_language_sections(markdown: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut current: Option<Language> = None;
    let mut last = 0;

    for caps in LANG_MARKER.captures_iter(markdown) {
        let Some(marker) = caps.get(0) else {
            continue;
        };
        if marker.start() > last {
            segments.push(Segment {
                lang: current,
                text: &markdown[last..marker.start()],
            });
        }
        current = caps.get(1).and_then(|m| m.as_str().parse().ok());
        last = marker.end();
    }

    if last < markdown.len() {
        segments.push(Segment {
            lang: current,
            text: &markdown[last..],
        });
    }

    segments
}

fn collect_headings(markdown: &str, slugger: &mut Slugger) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((level as u8, id.map(|id| id.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, value)) = current.as_mut() {
                    value.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((depth, id, value)) = current.take() {
                    let slug = id.unwrap_or_else(|| slugger.slug(&value));
                    entries.push(TocEntry {
                        depth,
                        value: value.trim().to_string(),
                        slug,
                    });
                }
            }
            _ => {}
        }
    }

    entries
}
