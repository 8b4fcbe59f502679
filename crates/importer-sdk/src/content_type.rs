use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content types understood by the host platform.
///
/// Serialized as the MIME string, which is what every envelope revision puts
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "text/markdown")]
    Markdown,
    #[serde(rename = "text/plain")]
    Text,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "application/octet-stream")]
    Binary,
    #[serde(rename = "application/vnd.content-blocks+json")]
    BlockJson,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Markdown,
        ContentType::Text,
        ContentType::Png,
        ContentType::Binary,
        ContentType::BlockJson,
    ];

    pub const fn mime(self) -> &'static str {
        match self {
            ContentType::Markdown => "text/markdown",
            ContentType::Text => "text/plain",
            ContentType::Png => "image/png",
            ContentType::Binary => "application/octet-stream",
            ContentType::BlockJson => "application/vnd.content-blocks+json",
        }
    }

    /// True for types whose payload is UTF-8 text.
    pub const fn is_textual(self) -> bool {
        matches!(self, ContentType::Markdown | ContentType::Text)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown content type `{0}`")]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    /// Accepts the full MIME string or a short alias (`mkd`, `txt`, `png`, `bin`, `blocks`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        if let Some(ct) = Self::ALL.into_iter().find(|ct| ct.mime() == needle) {
            return Ok(ct);
        }
        match needle.as_str() {
            "mkd" | "md" | "markdown" => Ok(ContentType::Markdown),
            "txt" | "text" => Ok(ContentType::Text),
            "png" => Ok(ContentType::Png),
            "bin" | "binary" => Ok(ContentType::Binary),
            "blocks" | "block-json" => Ok(ContentType::BlockJson),
            _ => Err(UnknownContentType(s.to_string())),
        }
    }
}
