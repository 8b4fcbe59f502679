use std::{collections::HashSet, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};
use importer_sdk::{ContentType, HostRevision, ImportConfig};
use serde::{Deserialize, Serialize};

use crate::classify::ContentTypeRules;

/// Request bodies larger than this are rejected unless a listener overrides it.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Root configuration structure deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub listeners: Vec<Listener>,
    pub importer: ImporterSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Listener {
    pub name: String,
    pub bind: String,
    pub tls: Option<Tls>,
    pub http: Option<HttpTweaks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tls {
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HttpTweaks {
    pub max_body_bytes: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterSettings {
    /// Directory identifiers are resolved against.
    pub data_dir: String,
    pub revision: HostRevision,
    pub access_key: Option<String>,
    /// Extra suffix rules, checked after the built-in `.mkd`/`.txt` ones.
    pub rules: Vec<SuffixRule>,
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            data_dir: "test_data".into(),
            revision: HostRevision::default(),
            access_key: None,
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuffixRule {
    pub suffix: String,
    pub content_type: ContentType,
}

impl Config {
    /// Validates structural invariants and provides actionable error messages.
    pub fn validate(&self) -> Result<()> {
        if self.listeners.is_empty() {
            bail!("at least one listener is required");
        }
        let mut listener_names = HashSet::new();
        for listener in &self.listeners {
            listener.validate()?;
            if !listener_names.insert(listener.name.clone()) {
                bail!("duplicate listener name `{}`", listener.name);
            }
        }
        self.importer.validate()
    }

    /// Returns parsed listeners with ready-to-bind socket addresses.
    pub fn resolved_listeners(&self) -> Result<Vec<ResolvedListener>> {
        self.listeners
            .iter()
            .map(ResolvedListener::try_from)
            .collect()
    }

    /// Copy safe to print: the access key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = copy.importer.access_key.as_mut() {
            *key = "<redacted>".into();
        }
        copy
    }
}

/// Runtime representation of a listener with parsed socket/tls config.
#[derive(Debug, Clone)]
pub struct ResolvedListener {
    pub name: String,
    pub addr: SocketAddr,
    pub tls: Option<Tls>,
    pub request_timeout: Option<Duration>,
    pub max_body_bytes: usize,
}

impl TryFrom<&Listener> for ResolvedListener {
    type Error = anyhow::Error;

    fn try_from(listener: &Listener) -> Result<Self> {
        let addr = listener.parse_bind_addr()?;
        let http = listener.http.clone().unwrap_or_default();
        Ok(Self {
            name: listener.name.clone(),
            addr,
            tls: listener.tls.clone(),
            request_timeout: http.request_timeout_secs.map(Duration::from_secs),
            max_body_bytes: http.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
        })
    }
}

impl Listener {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("listener name must not be empty");
        }
        self.parse_bind_addr()
            .with_context(|| format!("invalid bind address for listener `{}`", self.name))?;
        if let Some(tls) = &self.tls {
            tls.validate()?;
        }
        if let Some(http) = &self.http {
            if http.request_timeout_secs == Some(0) {
                bail!("listener `{}` request timeout must be positive", self.name);
            }
            if http.max_body_bytes == Some(0) {
                bail!("listener `{}` max_body_bytes must be positive", self.name);
            }
        }
        Ok(())
    }

    pub fn parse_bind_addr(&self) -> Result<SocketAddr> {
        if self.bind.starts_with(':') {
            let addr = format!("0.0.0.0{}", self.bind);
            Ok(SocketAddr::from_str(&addr)?)
        } else {
            Ok(SocketAddr::from_str(&self.bind)?)
        }
    }
}

impl Tls {
    pub fn validate(&self) -> Result<()> {
        if self.cert.trim().is_empty() || self.key.trim().is_empty() {
            bail!("tls cert and key paths must be provided");
        }
        Ok(())
    }
}

impl ImporterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            bail!("importer.data_dir must not be empty");
        }
        for rule in &self.rules {
            if rule.suffix.is_empty() {
                bail!("importer.rules entries need a non-empty suffix");
            }
            if !rule.content_type.is_textual() {
                bail!(
                    "importer.rules suffix `{}` maps to {}, but files are imported as text",
                    rule.suffix,
                    rule.content_type.mime()
                );
            }
        }
        self.import_config()?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Builds the instance config; the current revision decides whether one is mandatory.
    pub fn import_config(&self) -> Result<Option<ImportConfig>> {
        match &self.access_key {
            Some(key) => ImportConfig::new(key.as_str())
                .map(Some)
                .context("invalid importer.access_key"),
            None if self.revision.requires_config() => {
                bail!(
                    "importer.access_key is required for host revision {}",
                    self.revision
                )
            }
            None => Ok(None),
        }
    }

    pub fn content_type_rules(&self) -> ContentTypeRules {
        self.rules
            .iter()
            .fold(ContentTypeRules::default(), |rules, rule| {
                rules.with_rule(rule.suffix.as_str(), rule.content_type)
            })
    }
}
