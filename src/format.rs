//! Message presentation adapter
//!
//! Turns a raw answer string into structured paragraph/bullet segments with
//! bold and italic spans, and back into plain text for the voice path. Kept
//! thin on purpose: it carries no state and feeds both the rendering layer
//! and what the output controller may read aloud.

use serde::Serialize;

/// An inline run of styled text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Span {
    Text(String),
    Bold(String),
    Italic(String),
}

impl Span {
    fn plain(&self) -> &str {
        match self {
            Span::Text(s) | Span::Bold(s) | Span::Italic(s) => s,
        }
    }
}

/// One block of a formatted message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Segment {
    Paragraph(Vec<Span>),
    Bullet(Vec<Span>),
}

/// Split a raw answer into paragraphs and `*`-prefixed bullets.
pub fn format_message(text: &str) -> Vec<Segment> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Some(rest) = trimmed.strip_prefix('*') {
                // Bullet marker is a single leading star plus whitespace;
                // the rest may still carry bold/italic markup
                let content = rest.trim_start();
                Some(Segment::Bullet(parse_spans(content)))
            } else {
                Some(Segment::Paragraph(parse_spans(trimmed)))
            }
        })
        .collect()
}

/// Markup-stripped text of a whole message, for spoken playback.
pub fn speakable_text(text: &str) -> String {
    let segments = format_message(text);
    let mut lines = Vec::with_capacity(segments.len());
    for segment in &segments {
        let spans = match segment {
            Segment::Paragraph(spans) | Segment::Bullet(spans) => spans,
        };
        let line: String = spans.iter().map(Span::plain).collect();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Parse `**bold**` and `*italic*` runs; bold binds first.
fn parse_spans(input: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                flush(&mut spans, &mut text);
                spans.push(Span::Bold(after[..end].to_string()));
                rest = &after[end + 2..];
                continue;
            }
        }
        if let Some(after) = rest.strip_prefix('*') {
            if let Some(end) = after.find('*') {
                flush(&mut spans, &mut text);
                spans.push(Span::Italic(after[..end].to_string()));
                rest = &after[end + 1..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            text.push(ch);
        }
        rest = chars.as_str();
    }

    flush(&mut spans, &mut text);
    spans
}

fn flush(spans: &mut Vec<Span>, text: &mut String) {
    if !text.is_empty() {
        spans.push(Span::Text(std::mem::take(text)));
    }
}
