use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::ContentType;

/// A single import call as seen by the plugin, independent of envelope revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRequest {
    /// Names the resource to import. Required for a successful import.
    pub identifier: Option<String>,
    /// Used when the identifier suffix does not select a type.
    pub default_content_type: Option<ContentType>,
}

impl ImportRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            default_content_type: None,
        }
    }

    pub fn with_default_content_type(mut self, content_type: ContentType) -> Self {
        self.default_content_type = Some(content_type);
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`accessKey` is required")]
    MissingAccessKey,
    #[error("`accessKey` must not be empty")]
    EmptyAccessKey,
    #[error("`accessKey` must not be whitespace only")]
    BlankAccessKey,
}

/// Plugin instance configuration. A value of this type always holds a non-blank access key.
///
/// Deserialize only: the key is a secret and never goes back out on the wire.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawImportConfig")]
pub struct ImportConfig {
    access_key: String,
}

impl ImportConfig {
    pub fn new(access_key: impl Into<String>) -> Result<Self, ConfigError> {
        let access_key = access_key.into();
        if access_key.is_empty() {
            return Err(ConfigError::EmptyAccessKey);
        }
        if access_key.trim().is_empty() {
            return Err(ConfigError::BlankAccessKey);
        }
        Ok(Self { access_key })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("access_key", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImportConfig {
    #[serde(default)]
    access_key: Option<String>,
}

impl TryFrom<RawImportConfig> for ImportConfig {
    type Error = ConfigError;

    fn try_from(raw: RawImportConfig) -> Result<Self, Self::Error> {
        let key = raw.access_key.ok_or(ConfigError::MissingAccessKey)?;
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_blank_access_key_is_rejected() {
        assert_eq!(ImportConfig::new(""), Err(ConfigError::EmptyAccessKey));
        assert_eq!(ImportConfig::new("  "), Err(ConfigError::BlankAccessKey));
        assert_eq!(
            ImportConfig::new("\t").unwrap_err().to_string(),
            "`accessKey` must not be whitespace only"
        );
        assert_eq!(ImportConfig::new(" k ").unwrap().access_key(), " k ");
        assert_eq!(ImportConfig::new("k").unwrap().access_key(), "k");
    }

    #[test]
    fn deserialization_validates_access_key() {
        let ok: ImportConfig = serde_json::from_str(r#"{"accessKey":"abc"}"#).unwrap();
        assert_eq!(ok.access_key(), "abc");

        let missing = serde_json::from_str::<ImportConfig>("{}").unwrap_err();
        assert!(missing.to_string().contains("is required"));

        let empty = serde_json::from_str::<ImportConfig>(r#"{"accessKey":""}"#).unwrap_err();
        assert!(empty.to_string().contains("must not be empty"));
    }

    #[test]
    fn debug_output_hides_key() {
        let cfg = ImportConfig::new("secret").unwrap();
        assert!(!format!("{cfg:?}").contains("secret"));
    }
}
