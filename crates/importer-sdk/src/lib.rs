pub mod blocks;
pub mod content_type;
pub mod envelope;
pub mod manifest;
pub mod output;
pub mod request;

pub use blocks::{example_block_document, Block, BlockDocument, DocTag, Tag, TagKind};
pub use content_type::{ContentType, UnknownContentType};
pub use envelope::{EnvelopeError, HostRevision, UnknownRevision};
pub use manifest::PluginManifest;
pub use output::{
    block_output, image_output, markdown_output, text_output, Content, ImportError, ImportOutput,
    ImportResult,
};
pub use request::{ConfigError, ImportConfig, ImportRequest};

use serde_json::json;

/// Capability advertised by plugins that implement [`Importer`].
pub const CAPABILITY_FILE_IMPORTER: &str = "file-importer";

/// Trait implemented by content importer plugins.
pub trait Importer: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn version(&self) -> semver::Version;
    fn capabilities(&self) -> &'static [&'static str];
    /// Host revision the instance was built for.
    fn revision(&self) -> HostRevision;
    fn run(&self, request: &ImportRequest) -> ImportResult;

    fn manifest(&self) -> PluginManifest {
        let revision = self.revision();
        PluginManifest {
            name: self.name().to_string(),
            version: self.version().to_string(),
            description: None,
            revision: Some(revision.to_string()),
            capabilities: self.capabilities().iter().map(|c| c.to_string()).collect(),
            content_types: ContentType::ALL
                .iter()
                .map(|ct| ct.mime().to_string())
                .collect(),
            config_schema: revision.requires_config().then(|| {
                json!({
                    "type": "object",
                    "properties": { "accessKey": { "type": "string", "minLength": 1 } },
                    "required": ["accessKey"],
                })
            }),
        }
    }
}
