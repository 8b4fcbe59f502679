use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use importer_sdk::{
    ConfigError, Content, HostRevision, ImportConfig, ImportError, ImportOutput, ImportRequest,
    ImportResult, Importer, CAPABILITY_FILE_IMPORTER,
};

use crate::{classify::ContentTypeRules, config::ImporterSettings};

/// Imports files from a local directory.
///
/// Every call reads `<base_dir>/<identifier>` as UTF-8 text and tags it with
/// the type chosen by [`ContentTypeRules`]. The identifier is joined verbatim,
/// so callers are trusted.
#[derive(Debug, Clone)]
pub struct FileImporter {
    base_dir: PathBuf,
    revision: HostRevision,
    config: Option<ImportConfig>,
    rules: ContentTypeRules,
}

impl FileImporter {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        revision: HostRevision,
        config: Option<ImportConfig>,
    ) -> Result<Self, ConfigError> {
        if revision.requires_config() && config.is_none() {
            return Err(ConfigError::MissingAccessKey);
        }
        Ok(Self {
            base_dir: base_dir.into(),
            revision,
            config,
            rules: ContentTypeRules::default(),
        })
    }

    pub fn from_settings(settings: &ImporterSettings) -> Result<Self> {
        settings.validate()?;
        let importer = Self::new(
            settings.data_dir(),
            settings.revision,
            settings.import_config()?,
        )
        .context("failed to construct file importer")?;
        Ok(importer.with_rules(settings.content_type_rules()))
    }

    pub fn with_rules(mut self, rules: ContentTypeRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> Option<&ImportConfig> {
        self.config.as_ref()
    }
}

impl Importer for FileImporter {
    fn name(&self) -> &'static str {
        "file-importer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::parse(crate::version()).unwrap_or_else(|_| semver::Version::new(0, 0, 0))
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[CAPABILITY_FILE_IMPORTER]
    }

    fn revision(&self) -> HostRevision {
        self.revision
    }

    fn run(&self, request: &ImportRequest) -> ImportResult {
        let identifier = request
            .identifier
            .as_deref()
            .ok_or_else(|| ImportError::missing(self.revision.identifier_field()))?;

        let path = self.base_dir.join(identifier);
        let text = fs::read_to_string(&path).map_err(|source| {
            tracing::warn!(
                identifier,
                path = %path.display(),
                error = %source,
                "failed to read import source"
            );
            ImportError::read(identifier, source)
        })?;

        let content_type = self
            .rules
            .classify(identifier, request.default_content_type);
        tracing::debug!(
            identifier,
            content_type = content_type.map(|ct| ct.mime()).unwrap_or("unspecified"),
            bytes = text.len(),
            "file imported"
        );

        Ok(ImportOutput {
            content: Content::Text(text),
            content_type,
        })
    }
}
