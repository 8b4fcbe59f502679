use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON manifest describing a plugin to the host platform.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub revision: Option<String>,
    pub capabilities: Vec<String>,
    pub content_types: Vec<String>,
    pub config_schema: Option<Value>,
}

impl PluginManifest {
    pub fn requires_capability(&self, cap: &str) -> bool {
        self.capabilities.iter().any(|c| c == cap)
    }

    /// Whether instances need an access key before they can run.
    pub fn requires_config(&self) -> bool {
        self.config_schema
            .as_ref()
            .and_then(|schema| schema.get("required"))
            .and_then(Value::as_array)
            .is_some_and(|required| required.iter().any(|f| f == "accessKey"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default() {
        let manifest: PluginManifest = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(manifest.name, "x");
        assert!(manifest.capabilities.is_empty());
        assert!(!manifest.requires_config());
    }

    #[test]
    fn config_schema_drives_requires_config() {
        let manifest = PluginManifest {
            config_schema: Some(serde_json::json!({ "required": ["accessKey"] })),
            capabilities: vec!["file-importer".into()],
            ..Default::default()
        };
        assert!(manifest.requires_config());
        assert!(manifest.requires_capability("file-importer"));
        assert!(!manifest.requires_capability("tagger"));
    }
}
