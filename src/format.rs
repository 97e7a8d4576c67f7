//! Inline markup formatter for chat messages
//!
//! Turns the lightweight markup used in flow text into typed spans:
//! `*emphasis*`, `` `code` ``, bare `http(s)://` links, `• ` and `N. ` list
//! lines, and `[IMAGE:file]` markers (two adjacent markers form a pair).

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Asset root used when no other is configured
pub const DEFAULT_ASSET_ROOT: &str = "/images";

static IMAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[IMAGE:([^\]\s]+)\](?:\[IMAGE:([^\]\s]+)\])?").expect("valid image marker pattern")
});

static INLINE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*|`([^`\n]+)`|(https?://[^\s`<>]+)")
        .expect("valid inline token pattern")
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:•\s+(.*)|\d+\.\s+(.*))$").expect("valid list item pattern")
});

/// A resolved image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

/// A typed piece of formatted message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Span {
    Text { text: String },
    Emphasis { text: String },
    Code { text: String },
    /// Rendered so that it opens in a new browsing context
    Link { url: String },
    List { ordered: bool, items: Vec<Vec<Span>> },
    Image { image: ImageRef },
    ImagePair { images: [ImageRef; 2] },
}

impl Span {
    pub fn text(text: impl Into<String>) -> Self {
        Span::Text { text: text.into() }
    }
}

/// Formats message text, resolving image markers under an asset root
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    asset_root: String,
}

impl MessageFormatter {
    pub fn new(asset_root: impl Into<String>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    /// Path of `file` under the asset root. Absolute paths and URLs are kept.
    pub fn asset_path(&self, file: &str) -> String {
        if file.starts_with('/') || file.starts_with("http://") || file.starts_with("https://") {
            file.to_string()
        } else {
            format!("{}/{}", self.asset_root.trim_end_matches('/'), file)
        }
    }

    pub fn format(&self, text: &str) -> Vec<Span> {
        let mut out = Spans::default();
        let mut list: Option<(bool, Vec<Vec<Span>>)> = None;
        let lines: Vec<&str> = text.split('\n').collect();

        for (i, line) in lines.iter().enumerate() {
            if let Some((ordered, item)) = list_item(line) {
                let item = self.inline(item);
                match &mut list {
                    Some((kind, items)) if *kind == ordered => items.push(item),
                    _ => {
                        if let Some((ordered, items)) = list.take() {
                            out.push(Span::List { ordered, items });
                        }
                        list = Some((ordered, vec![item]));
                    }
                }
                continue;
            }

            if let Some((ordered, items)) = list.take() {
                out.push(Span::List { ordered, items });
            }
            out.extend(self.inline(line));
            if i + 1 < lines.len() {
                out.push(Span::text("\n"));
            }
        }

        if let Some((ordered, items)) = list {
            out.push(Span::List { ordered, items });
        }
        out.0
    }

    /// Spans for a single line. Image markers are split out first so their
    /// contents never reach the emphasis/code/link tokenizer.
    fn inline(&self, line: &str) -> Vec<Span> {
        let mut out = Spans::default();
        let mut last = 0;
        for caps in IMAGE_MARKER.captures_iter(line) {
            let Some(whole) = caps.get(0) else { continue };
            if let Some(before) = line.get(last..whole.start()) {
                tokenize(before, &mut out);
            }
            let first = self.image(&caps[1]);
            match caps.get(2) {
                Some(second) => out.push(Span::ImagePair {
                    images: [first, self.image(second.as_str())],
                }),
                None => out.push(Span::Image { image: first }),
            }
            last = whole.end();
        }
        if let Some(rest) = line.get(last..) {
            tokenize(rest, &mut out);
        }
        out.0
    }

    fn image(&self, file: &str) -> ImageRef {
        let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
        ImageRef {
            src: self.asset_path(file),
            alt: stem.replace(['-', '_'], " "),
        }
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ROOT)
    }
}

/// Format `text` against the default asset root
#[cfg(test)]
pub fn format(text: &str) -> Vec<Span> {
    MessageFormatter::default().format(text)
}

fn list_item(line: &str) -> Option<(bool, &str)> {
    let caps = LIST_ITEM.captures(line)?;
    match (caps.get(1), caps.get(2)) {
        (Some(bullet), _) => Some((false, bullet.as_str())),
        (None, Some(numbered)) => Some((true, numbered.as_str())),
        (None, None) => None,
    }
}

fn tokenize(text: &str, out: &mut Spans) {
    let mut last = 0;
    for caps in INLINE_TOKEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(before) = text.get(last..whole.start()) {
            out.push(Span::text(before));
        }
        if let Some(m) = caps.get(1) {
            out.push(Span::Emphasis {
                text: m.as_str().to_string(),
            });
        } else if let Some(m) = caps.get(2) {
            out.push(Span::Code {
                text: m.as_str().to_string(),
            });
        } else if let Some(m) = caps.get(3) {
            let url = trim_url(m.as_str());
            out.push(Span::Link {
                url: url.to_string(),
            });
            if let Some(trailing) = m.as_str().get(url.len()..) {
                out.push(Span::text(trailing));
            }
        }
        last = whole.end();
    }
    if let Some(rest) = text.get(last..) {
        out.push(Span::text(rest));
    }
}

/// Strip sentence punctuation after a bare URL. A closing paren stays when
/// the URL opened one itself.
fn trim_url(raw: &str) -> &str {
    let mut url = raw;
    loop {
        url = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        let Some(stripped) = url.strip_suffix(')') else {
            return url;
        };
        if url.matches(')').count() <= url.matches('(').count() {
            return url;
        }
        url = stripped;
    }
}

/// Span list that merges adjacent text and drops empty text
#[derive(Default)]
struct Spans(Vec<Span>);

impl Spans {
    fn push(&mut self, span: Span) {
        match span {
            Span::Text { text } if text.is_empty() => {}
            Span::Text { text } => match self.0.last_mut() {
                Some(Span::Text { text: prev }) => prev.push_str(&text),
                _ => self.0.push(Span::Text { text }),
            },
            other => self.0.push(other),
        }
    }

    fn extend(&mut self, spans: impl IntoIterator<Item = Span>) {
        for span in spans {
            self.push(span);
        }
    }
}
