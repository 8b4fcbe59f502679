use std::io;

use bytes::Bytes;
use thiserror::Error;

use crate::{blocks::BlockDocument, ContentType};

pub type ImportResult = Result<ImportOutput, ImportError>;

/// Payload of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Bytes(Bytes),
    Blocks(BlockDocument),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Content::Text(text) => text.len(),
            Content::Bytes(bytes) => bytes.len(),
            Content::Blocks(doc) => doc.blocks.iter().map(|b| b.text.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutput {
    pub content: Content,
    pub content_type: Option<ContentType>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing required field `{field}`: set it to the file name you would like to import")]
    MissingField { field: &'static str },
    #[error("could not read file `{identifier}` from disk")]
    ReadFailure {
        identifier: String,
        #[source]
        source: io::Error,
    },
}

impl ImportError {
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub fn read(identifier: impl Into<String>, source: io::Error) -> Self {
        Self::ReadFailure {
            identifier: identifier.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ReadFailure { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// Short stable label used for logs and metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::ReadFailure { .. } => "read_failure",
        }
    }
}

pub fn text_output(plain_text: impl Into<String>) -> ImportOutput {
    ImportOutput {
        content: Content::Text(plain_text.into()),
        content_type: Some(ContentType::Text),
    }
}

pub fn markdown_output(markdown: impl Into<String>) -> ImportOutput {
    ImportOutput {
        content: Content::Text(markdown.into()),
        content_type: Some(ContentType::Markdown),
    }
}

pub fn image_output(png: impl Into<Bytes>) -> ImportOutput {
    ImportOutput {
        content: Content::Bytes(png.into()),
        content_type: Some(ContentType::Png),
    }
}

/// Preferred when the importer knows the structure of what it imports.
pub fn block_output(document: BlockDocument) -> ImportOutput {
    ImportOutput {
        content: Content::Blocks(document),
        content_type: Some(ContentType::BlockJson),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::blocks::example_block_document;

    #[test]
    fn helpers_pair_content_with_type() {
        assert_eq!(text_output("hi").content_type, Some(ContentType::Text));
        assert_eq!(markdown_output("# hi").content.as_text(), Some("# hi"));
        let png = image_output(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(png.content_type, Some(ContentType::Png));
        assert_eq!(png.content.len(), 4);
        let blocks = block_output(example_block_document());
        assert_eq!(blocks.content_type, Some(ContentType::BlockJson));
        assert!(blocks.content.as_text().is_none());
    }

    #[test]
    fn read_failure_keeps_cause() {
        let err = ImportError::read("x.txt", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert!(err.source().is_some());
        assert_eq!(err.kind(), "read_failure");
        assert!(!ImportError::missing("identifier").is_not_found());
    }
}
