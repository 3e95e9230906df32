//! Reply formatting: raw model text into paragraph blocks with inline
//! emphasis, as structured data a renderer must escape itself.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("emphasis pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Emphasis(String),
    LineBreak,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub inlines: Vec<Inline>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormattedReply {
    pub paragraphs: Vec<Paragraph>,
}

/// Split `raw` on blank lines into paragraphs, turn `**text**` into
/// emphasis, and single newlines into line breaks. Blank paragraphs are
/// dropped; everything else is kept byte for byte.
pub fn format_reply(raw: &str) -> FormattedReply {
    let paragraphs = raw
        .split("\n\n")
        .filter(|paragraph| !paragraph.trim().is_empty())
        .map(format_paragraph)
        .collect();
    FormattedReply { paragraphs }
}

fn format_paragraph(paragraph: &str) -> Paragraph {
    let mut inlines = Vec::new();

    for (i, line) in paragraph.split('\n').enumerate() {
        if i > 0 {
            inlines.push(Inline::LineBreak);
        }

        let mut last = 0;
        for caps in EMPHASIS.captures_iter(line) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                inlines.push(Inline::Text(line[last..whole.start()].to_string()));
            }
            inlines.push(Inline::Emphasis(inner.as_str().to_string()));
            last = whole.end();
        }
        if last < line.len() {
            inlines.push(Inline::Text(line[last..].to_string()));
        }
    }

    Paragraph { inlines }
}

impl Paragraph {
    pub fn plain_text(&self) -> String {
        self.inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text(text) | Inline::Emphasis(text) => text.as_str(),
                Inline::LineBreak => "\n",
            })
            .collect()
    }
}

impl FormattedReply {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Text without markup; paragraphs joined by a blank line.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// `<p>`/`<b>`/`<br/>` markup with every text node HTML-escaped.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for paragraph in &self.paragraphs {
            html.push_str("<p>");
            for inline in &paragraph.inlines {
                match inline {
                    Inline::Text(text) => html.push_str(&escape_html(text)),
                    Inline::Emphasis(text) => {
                        html.push_str("<b>");
                        html.push_str(&escape_html(text));
                        html.push_str("</b>");
                    }
                    Inline::LineBreak => html.push_str("<br/>"),
                }
            }
            html.push_str("</p>");
        }
        html
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn emphasis(s: &str) -> Inline {
        Inline::Emphasis(s.to_string())
    }

    #[test]
    fn test_plain_text_is_single_paragraph() {
        let raw = "Just a plain answer, with punctuation: 1 * 2 = 2.";
        let reply = format_reply(raw);
        assert_eq!(
            reply,
            FormattedReply {
                paragraphs: vec![Paragraph {
                    inlines: vec![text(raw)]
                }]
            }
        );
        assert_eq!(reply.plain_text(), raw);
    }

    #[test]
    fn test_bold_and_paragraphs() {
        let reply = format_reply("**Hi** there\n\nHow can I help?");
        assert_eq!(reply.paragraphs.len(), 2);
        assert_eq!(reply.paragraphs[0].inlines, vec![emphasis("Hi"), text(" there")]);
        assert_eq!(reply.paragraphs[1].inlines, vec![text("How can I help?")]);
    }

    #[test]
    fn test_single_newline_becomes_line_break() {
        let reply = format_reply("line one\nline **two**\nline three");
        assert_eq!(
            reply.paragraphs[0].inlines,
            vec![
                text("line one"),
                Inline::LineBreak,
                text("line "),
                emphasis("two"),
                Inline::LineBreak,
                text("line three"),
            ]
        );
    }

    #[test]
    fn test_emphasis_is_non_greedy_and_single_line() {
        let reply = format_reply("**a** and **b**");
        assert_eq!(
            reply.paragraphs[0].inlines,
            vec![emphasis("a"), text(" and "), emphasis("b")]
        );

        let reply = format_reply("**not\nbold**");
        assert_eq!(
            reply.paragraphs[0].inlines,
            vec![text("**not"), Inline::LineBreak, text("bold**")]
        );
    }

    #[test]
    fn test_blank_paragraphs_are_dropped() {
        let reply = format_reply("\n\nfirst\n\n   \n\nsecond\n\n");
        let texts: Vec<String> = reply.paragraphs.iter().map(Paragraph::plain_text).collect();
        assert_eq!(texts, vec!["first", "second"]);

        assert!(format_reply("").is_empty());
        assert!(format_reply("\n\n  \n\n").is_empty());
    }

    #[test]
    fn test_html_is_escaped() {
        let reply = format_reply("**<script>** & \"quotes\"\nnext");
        assert_eq!(
            reply.to_html(),
            "<p><b>&lt;script&gt;</b> &amp; &quot;quotes&quot;<br/>next</p>"
        );
    }

    #[test]
    fn test_serializes_for_front_end() {
        let reply = format_reply("**Hi**\nthere");
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "paragraphs": [{
                    "inlines": [
                        { "kind": "emphasis", "text": "Hi" },
                        { "kind": "line_break" },
                        { "kind": "text", "text": "there" }
                    ]
                }]
            })
        );
    }
}
