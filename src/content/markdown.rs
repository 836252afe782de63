//! Markdown rendering with syntax highlighting

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::toc::{split_language_sections, Slugger};
use crate::helpers::{html_escape, truncate};

/// Parser options shared by rendering and table-of-contents extraction
pub(crate) fn markdown_options() -> Options {
    // YAML metadata blocks stay off; front-matter is stripped beforehand
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Plain-text summary of a markdown body for meta descriptions
///
/// Only prose is kept: code blocks, raw HTML and language markers are
/// skipped, and whitespace is collapsed.
pub fn plain_text_excerpt(markdown: &str, length: usize) -> String {
    let mut text = String::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(t) | Event::Code(t) if !in_code_block => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => text.push(' '),
            _ => {}
        }
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&text, length, None)
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("InspiredGitHub", true)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render markdown to HTML
    ///
    /// Headings receive anchor ids matching
    /// [`TableOfContents::from_markdown`](super::TableOfContents::from_markdown).
    pub fn render(&self, markdown: &str) -> Result<String> {
        let expanded = expand_language_sections(markdown);
        let parser = Parser::new_ext(&expanded, markdown_options());

        let mut slugger = Slugger::default();
        let mut events: Vec<Event> = Vec::new();

        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        // Index of the open heading's start event and its collected text
        let mut heading: Option<(usize, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            let lang = lang.split_whitespace().next().unwrap_or("").to_string();
                            (!lang.is_empty()).then_some(lang)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let highlighted =
                        self.highlight_code(&code_block_content, code_block_lang.as_deref());
                    events.push(Event::Html(CowStr::from(highlighted)));
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                Event::Start(Tag::Heading { .. }) => {
                    heading = Some((events.len(), String::new()));
                    events.push(event);
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((index, text)) = heading.take() {
                        assign_heading_id(&mut events[index], &text, &mut slugger);
                    }
                    events.push(event);
                }
                Event::Text(ref text) | Event::Code(ref text) => {
                    if let Some((_, heading_text)) = heading.as_mut() {
                        heading_text.push_str(text);
                    }
                    events.push(event);
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(highlighted) if self.line_numbers => self.add_line_numbers(&highlighted, lang),
            Some(highlighted) => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang, highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang,
                html_escape(code)
            ),
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            lang,
            gutter,
            lines.join("\n")
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn assign_heading_id(event: &mut Event<'_>, text: &str, slugger: &mut Slugger) {
    if let Event::Start(Tag::Heading { id, .. }) = event {
        if id.is_none() {
            *id = Some(CowStr::from(slugger.slug(text)));
        }
    }
}

/// Turn language markers into `language-section` blocks
fn expand_language_sections(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    for segment in split_language_sections(markdown) {
        match segment.lang {
            Some(lang) => {
                out.push_str(&format!(
                    "\n<div class=\"language-section\" data-lang=\"{}\">\n\n",
                    lang
                ));
                out.push_str(segment.text);
                out.push_str("\n\n</div>\n");
            }
            None => out.push_str(segment.text),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```cpp\nint main() {}\n```").unwrap();
        assert!(html.contains("highlight cpp"));
        assert!(html.contains("line-number"));
    }

    #[test]
    fn test_code_block_without_line_numbers() {
        let renderer = MarkdownRenderer::with_options("InspiredGitHub", false);
        let html = renderer.render("```py\nprint(1)\n```").unwrap();
        assert!(html.contains(r#"<code class="language-py">"#));
    }

    #[test]
    fn test_heading_ids_match_toc() {
        let markdown = "## Example\n\n<!-- lang: java -->\n## Example\n<!-- /lang -->\n";
        let html = MarkdownRenderer::new().render(markdown).unwrap();
        let toc = crate::content::TableOfContents::from_markdown(markdown);
        for entry in &toc.java {
            assert!(html.contains(&format!(r#"id="{}""#, entry.slug)));
        }
        assert_eq!(toc.java[1].slug, "example-1");
    }

    #[test]
    fn test_plain_text_excerpt_keeps_entities_literal() {
        let excerpt = plain_text_excerpt("Tom & Jerry say \"hi\".", 160);
        assert_eq!(excerpt, "Tom & Jerry say \u{201c}hi\u{201d}.");
    }

    #[test]
    fn test_plain_text_excerpt_skips_code_and_markers() {
        let markdown = "## Idea\n\nUse `lower_bound`.\n\n```cpp\nint x = 1;\n```\n\n<!-- lang: py -->\nPython <em>notes</em>.\n<!-- /lang -->\n";
        assert_eq!(
            plain_text_excerpt(markdown, 160),
            "Idea Use lower_bound. Python notes."
        );
        assert_eq!(plain_text_excerpt(markdown, 10), "Idea Us...");
    }

    #[test]
    fn test_language_section_wrapper() {
        let html = MarkdownRenderer::new()
            .render("<!-- lang: py -->\nSome *python* notes.\n<!-- /lang -->\n")
            .unwrap();
        assert!(html.contains(r#"<div class="language-section" data-lang="py">"#));
        assert!(html.contains("<em>python</em>"));
        assert!(html.contains("</div>"));
    }
}
