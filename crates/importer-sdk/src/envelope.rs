//! Wire envelopes of the host platform.
//!
//! The host API changed the shape of the import request/response objects
//! across three revisions. Everything revision specific lives here; the
//! importer itself only sees [`ImportRequest`] and [`ImportResult`].

use std::{error::Error as _, fmt, str::FromStr};

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::{Content, ContentType, ImportError, ImportOutput, ImportRequest, ImportResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostRevision {
    /// `{"data":{"url"}}` in, `{"data":{"data","mimeType"}}` out.
    V1,
    /// Raw data output: `string`/`bytes`/`json` payload keys.
    V2,
    /// Snake case fields, plugin instances must carry an access key.
    #[default]
    V3,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed {revision} request envelope")]
    Malformed {
        revision: HostRevision,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown host revision `{0}` (expected v1, v2 or v3)")]
pub struct UnknownRevision(pub String);

impl HostRevision {
    pub const ALL: [HostRevision; 3] = [HostRevision::V1, HostRevision::V2, HostRevision::V3];

    pub const fn as_str(self) -> &'static str {
        match self {
            HostRevision::V1 => "v1",
            HostRevision::V2 => "v2",
            HostRevision::V3 => "v3",
        }
    }

    /// Name of the request field carrying the identifier.
    pub const fn identifier_field(self) -> &'static str {
        match self {
            HostRevision::V1 => "url",
            HostRevision::V2 | HostRevision::V3 => "identifier",
        }
    }

    /// Whether plugin instances must be constructed with an [`crate::ImportConfig`].
    pub const fn requires_config(self) -> bool {
        matches!(self, HostRevision::V3)
    }

    pub fn decode_request(self, body: &[u8]) -> Result<ImportRequest, EnvelopeError> {
        let malformed = |source| EnvelopeError::Malformed {
            revision: self,
            source,
        };
        let request = match self {
            HostRevision::V1 => serde_json::from_slice::<RequestEnvelope<V1Request>>(body)
                .map_err(malformed)?
                .data
                .into(),
            HostRevision::V2 => serde_json::from_slice::<RequestEnvelope<V2Request>>(body)
                .map_err(malformed)?
                .data
                .into(),
            HostRevision::V3 => serde_json::from_slice::<RequestEnvelope<V3Request>>(body)
                .map_err(malformed)?
                .data
                .into(),
        };
        Ok(request)
    }

    /// Builds the request body a host of this revision would send.
    pub fn encode_request(self, request: &ImportRequest) -> Value {
        let data = match self {
            HostRevision::V1 => json!({
                "url": request.identifier,
                "defaultMimeType": request.default_content_type,
            }),
            HostRevision::V2 => json!({
                "identifier": request.identifier,
                "defaultMimeType": request.default_content_type,
            }),
            HostRevision::V3 => json!({
                "identifier": request.identifier,
                "default_mime_type": request.default_content_type,
            }),
        };
        json!({ "data": data })
    }

    pub fn encode_result(self, result: &ImportResult) -> Value {
        match result {
            Ok(output) => json!({ "data": self.encode_output(output) }),
            Err(err) => {
                self.encode_failure(err.to_string(), err.source().map(ToString::to_string))
            }
        }
    }

    /// Error envelope for failures raised before or during an import.
    pub fn encode_failure(self, message: String, cause: Option<String>) -> Value {
        let error = match self {
            HostRevision::V1 | HostRevision::V2 => json!({
                "message": message,
                "internalMessage": cause,
            }),
            HostRevision::V3 => json!({
                "message": message,
                "cause": cause,
            }),
        };
        json!({ "error": error })
    }

    fn encode_output(self, output: &ImportOutput) -> Value {
        let mut data = Map::new();
        match self {
            HostRevision::V1 => {
                data.insert("data".into(), payload_value(&output.content));
                data.insert("mimeType".into(), json!(output.content_type));
            }
            HostRevision::V2 | HostRevision::V3 => {
                data.insert(
                    payload_key(&output.content).into(),
                    payload_value(&output.content),
                );
                let type_key = if self == HostRevision::V2 {
                    "mimeType"
                } else {
                    "mime_type"
                };
                data.insert(type_key.into(), json!(output.content_type));
            }
        }
        Value::Object(data)
    }
}

impl fmt::Display for HostRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostRevision {
    type Err = UnknownRevision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rev| rev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRevision(s.to_string()))
    }
}

fn payload_key(content: &Content) -> &'static str {
    match content {
        Content::Text(_) => "string",
        Content::Bytes(_) => "bytes",
        Content::Blocks(_) => "json",
    }
}

fn payload_value(content: &Content) -> Value {
    match content {
        Content::Text(text) => Value::String(text.clone()),
        Content::Bytes(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        Content::Blocks(document) => json!(document),
    }
}

#[derive(Deserialize)]
#[serde(bound = "T: Deserialize<'de> + Default")]
struct RequestEnvelope<T> {
    #[serde(default)]
    data: T,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct V1Request {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    default_mime_type: Option<ContentType>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct V2Request {
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    default_mime_type: Option<ContentType>,
}

#[derive(Deserialize, Default)]
struct V3Request {
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    default_mime_type: Option<ContentType>,
}

impl From<V1Request> for ImportRequest {
    fn from(raw: V1Request) -> Self {
        Self {
            identifier: raw.url,
            default_content_type: raw.default_mime_type,
        }
    }
}

impl From<V2Request> for ImportRequest {
    fn from(raw: V2Request) -> Self {
        Self {
            identifier: raw.identifier,
            default_content_type: raw.default_mime_type,
        }
    }
}

impl From<V3Request> for ImportRequest {
    fn from(raw: V3Request) -> Self {
        Self {
            identifier: raw.identifier,
            default_content_type: raw.default_mime_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::{image_output, markdown_output};

    #[test]
    fn decodes_each_revision_shape() {
        let v1 = HostRevision::V1
            .decode_request(br#"{"data":{"url":"roses.mkd","defaultMimeType":"text/plain"}}"#)
            .unwrap();
        assert_eq!(
            v1,
            ImportRequest::new("roses.mkd").with_default_content_type(ContentType::Text)
        );

        let v2 = HostRevision::V2
            .decode_request(br#"{"data":{"identifier":"a.txt"}}"#)
            .unwrap();
        assert_eq!(v2, ImportRequest::new("a.txt"));

        let v3 = HostRevision::V3
            .decode_request(br#"{"data":{"identifier":"a.bin","default_mime_type":"image/png"}}"#)
            .unwrap();
        assert_eq!(v3.default_content_type, Some(ContentType::Png));
    }

    #[test]
    fn absent_data_decodes_to_empty_request() {
        let req = HostRevision::V1.decode_request(b"{}").unwrap();
        assert_eq!(req, ImportRequest::default());
    }

    #[test]
    fn rejects_malformed_bodies() {
        let err = HostRevision::V2.decode_request(b"not json").unwrap_err();
        assert!(err.to_string().contains("v2"));
        assert!(HostRevision::V3
            .decode_request(br#"{"data":{"identifier":7}}"#)
            .is_err());
    }

    #[test]
    fn encoded_request_round_trips_through_decoder() {
        let request = ImportRequest::new("x.txt").with_default_content_type(ContentType::Binary);
        for rev in HostRevision::ALL {
            let body = serde_json::to_vec(&rev.encode_request(&request)).unwrap();
            assert_eq!(rev.decode_request(&body).unwrap(), request);
        }
    }

    #[test]
    fn encodes_success_per_revision() {
        let result: ImportResult = Ok(markdown_output("# roses"));
        assert_eq!(
            HostRevision::V1.encode_result(&result),
            json!({ "data": { "data": "# roses", "mimeType": "text/markdown" } })
        );
        assert_eq!(
            HostRevision::V2.encode_result(&result),
            json!({ "data": { "string": "# roses", "mimeType": "text/markdown" } })
        );
        assert_eq!(
            HostRevision::V3.encode_result(&result),
            json!({ "data": { "string": "# roses", "mime_type": "text/markdown" } })
        );
    }

    #[test]
    fn bytes_are_base64_and_missing_type_is_null() {
        let mut output = image_output(vec![1u8, 2, 3]);
        output.content_type = None;
        assert_eq!(
            HostRevision::V2.encode_result(&Ok(output)),
            json!({ "data": { "bytes": "AQID", "mimeType": null } })
        );
    }

    #[test]
    fn encodes_errors_with_cause() {
        let err = ImportError::read("gone.txt", io::Error::new(io::ErrorKind::NotFound, "nope"));
        let v1 = HostRevision::V1.encode_result(&Err(err));
        assert_eq!(v1["error"]["internalMessage"], "nope");

        let missing = HostRevision::V3.encode_result(&Err(ImportError::missing("identifier")));
        assert!(missing["error"]["message"]
            .as_str()
            .unwrap()
            .contains("identifier"));
        assert_eq!(missing["error"]["cause"], Value::Null);
    }

    #[test]
    fn revision_parsing() {
        assert_eq!("V2".parse::<HostRevision>().unwrap(), HostRevision::V2);
        assert!("v4".parse::<HostRevision>().is_err());
        assert!(HostRevision::V3.requires_config());
        assert!(!HostRevision::V1.requires_config());
    }
}
