//! Structured block documents.
//!
//! A block document is text split into blocks, each annotated with tags that
//! cover either the whole block or a `[start_idx, end_idx)` character span.
//! Importers that understand the structure of their source (headers,
//! paragraphs, links) can return one instead of raw text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BlockDocument {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Document,
}

/// Well known document tag names. Tags may also use any custom name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocTag {
    H1,
    H2,
    H3,
    Paragraph,
    List,
    Link,
}

impl DocTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            DocTag::H1 => "h1",
            DocTag::H2 => "h2",
            DocTag::H3 => "h3",
            DocTag::Paragraph => "paragraph",
            DocTag::List => "list",
            DocTag::Link => "link",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub kind: TagKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Map<String, Value>>,
    /// Inclusive start offset in characters; `None` means the block start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_idx: Option<usize>,
    /// Exclusive end offset in characters; `None` means the block end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_idx: Option<usize>,
}

impl Tag {
    /// Tag covering the whole block.
    pub fn document(name: impl Into<String>) -> Self {
        Self {
            kind: TagKind::Document,
            name: name.into(),
            value: None,
            start_idx: None,
            end_idx: None,
        }
    }

    pub fn doc(tag: DocTag) -> Self {
        Self::document(tag.as_str())
    }

    pub fn with_span(mut self, start_idx: usize, end_idx: usize) -> Self {
        self.start_idx = Some(start_idx);
        self.end_idx = Some(end_idx);
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.value
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Resolves the tag span against `text`, returning `None` if it does not fit.
    pub fn span(&self, text: &str) -> Option<(usize, usize)> {
        let len = text.chars().count();
        let start = self.start_idx.unwrap_or(0);
        let end = self.end_idx.unwrap_or(len);
        (start <= end && end <= len).then_some((start, end))
    }

    /// The tagged slice of `text`.
    pub fn covered<'a>(&self, text: &'a str) -> Option<&'a str> {
        let (start, end) = self.span(text)?;
        let byte_at = |idx: usize| {
            text.char_indices()
                .nth(idx)
                .map_or(text.len(), |(byte, _)| byte)
        };
        Some(&text[byte_at(start)..byte_at(end)])
    }
}

impl Block {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    pub fn tagged(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn spans_are_valid(&self) -> bool {
        self.tags.iter().all(|tag| tag.span(&self.text).is_some())
    }
}

/// A header block followed by a paragraph carrying a link tag.
pub fn example_block_document() -> BlockDocument {
    BlockDocument {
        blocks: vec![
            Block::new("This is the header").tagged(Tag::doc(DocTag::H1)),
            Block::new("This is the first paragraph. It has a link.")
                .tagged(Tag::doc(DocTag::Paragraph))
                .tagged(
                    Tag::doc(DocTag::Link)
                        .with_value("href", "https://example.org")
                        .with_span(36, 42),
                ),
        ],
    }
}
