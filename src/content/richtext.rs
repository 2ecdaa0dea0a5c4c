//! Rich text sections
//!
//! A post body is an ordered sequence of sections, each a heading plus
//! rich-text paragraphs. Paragraph markup uses Markdown conventions as
//! delivered by the content API; it is rendered for display and stripped
//! for word counting.

use pulldown_cmark::{html, Event, Options, Parser};
use serde::{Deserialize, Serialize};

/// One rich-text paragraph of a section body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub text: String,
}

/// A heading plus its ordered body blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: Vec<Block>,
}

impl Section {
    /// Heading and body as plain text, markup stripped
    pub fn plain_text(&self) -> String {
        let heading = self.heading.trim();
        let body = blocks_to_text(&self.body);
        if heading.is_empty() {
            body
        } else if body.is_empty() {
            heading.to_string()
        } else {
            format!("{} {}", heading, body)
        }
    }

    /// Body blocks rendered to HTML for display
    pub fn body_html(&self) -> String {
        blocks_to_html(&self.body)
    }
}

/// Extract plain text from a sequence of body blocks
///
/// Blocks are joined with a single space; formatting markup contributes
/// nothing to the output.
pub fn blocks_to_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| markup_to_text(&b.text))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a sequence of body blocks to HTML
pub fn blocks_to_html(blocks: &[Block]) -> String {
    let options = Options::ENABLE_STRIKETHROUGH;
    let mut out = String::new();
    for block in blocks {
        let parser = Parser::new_ext(&block.text, options);
        html::push_html(&mut out, parser);
    }
    out
}

/// Strip inline markup from one paragraph
fn markup_to_text(markup: &str) -> String {
    let parser = Parser::new_ext(markup, Options::empty());
    let mut out = String::new();

    for event in parser {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> Block {
        Block {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_markup_stripped_to_words() {
        let blocks = [block("**hello** world")];
        assert_eq!(blocks_to_text(&blocks), "hello world");
    }

    #[test]
    fn test_links_keep_label_only() {
        let blocks = [block("see [the docs](https://example.com) here")];
        assert_eq!(blocks_to_text(&blocks), "see the docs here");
    }

    #[test]
    fn test_inline_code_counts_as_text() {
        let blocks = [block("run `cargo build` first")];
        assert_eq!(blocks_to_text(&blocks), "run cargo build first");
    }

    #[test]
    fn test_blocks_joined_with_space() {
        let blocks = [block("first paragraph"), block("second paragraph")];
        assert_eq!(blocks_to_text(&blocks), "first paragraph second paragraph");
    }

    #[test]
    fn test_empty_blocks_skipped() {
        let blocks = [block("one"), block(""), block("two")];
        assert_eq!(blocks_to_text(&blocks), "one two");
    }

    #[test]
    fn test_section_plain_text_includes_heading() {
        let section = Section {
            heading: "Intro".to_string(),
            body: vec![block("*styled* body")],
        };
        assert_eq!(section.plain_text(), "Intro styled body");
    }

    #[test]
    fn test_section_plain_text_empty_heading() {
        let section = Section {
            heading: String::new(),
            body: vec![block("just body")],
        };
        assert_eq!(section.plain_text(), "just body");
    }

    #[test]
    fn test_body_html_renders_markup() {
        let section = Section {
            heading: "H".to_string(),
            body: vec![block("**bold** and *italic*")],
        };
        let html = section.body_html();
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }
}
