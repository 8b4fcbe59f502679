use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context as TaskContext, Poll},
    time::Duration,
};

use anyhow::{Context, Result};
use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use importer_sdk::{ImportError, ImportResult, Importer};
use serde::Serialize;
use tower::{
    timeout::Timeout,
    util::{BoxCloneService, ServiceExt},
    BoxError, Service,
};

use crate::router::{Endpoint, Router, Selection};

pub type HttpRequest = Request<Bytes>;
pub type HttpResponse = Response<Bytes>;
pub type BoxImportService = BoxCloneService<HttpRequest, HttpResponse, BoxError>;

/// Tower service dispatching HTTP requests to an [`Importer`].
#[derive(Clone)]
pub struct ImportService {
    state: Arc<ServiceState>,
}

struct ServiceState {
    importer: Arc<dyn Importer>,
    router: Router,
}

impl ImportService {
    pub fn new(importer: Arc<dyn Importer>) -> Self {
        let router = Router::build(&importer.manifest());
        Self {
            state: Arc::new(ServiceState { importer, router }),
        }
    }

    /// Type-erased service, wrapped in a timeout when `limit` is set.
    pub fn boxed(self, limit: Option<Duration>) -> BoxImportService {
        match limit {
            Some(limit) => BoxCloneService::new(Timeout::new(self, limit)),
            None => BoxCloneService::new(self.map_err(BoxError::from)),
        }
    }
}

impl Service<HttpRequest> for ImportService {
    type Response = HttpResponse;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let state = self.state.clone();
        Box::pin(async move { state.dispatch(req).await })
    }
}

impl ServiceState {
    async fn dispatch(&self, req: HttpRequest) -> Result<HttpResponse> {
        let endpoint = match self.router.select(req.method(), req.uri().path()) {
            Selection::Matched(endpoint) => endpoint,
            Selection::MethodNotAllowed => {
                metrics::counter!("importer_requests_total", "outcome" => "miss").increment(1);
                return text_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
            }
            Selection::NotFound => {
                metrics::counter!("importer_requests_total", "outcome" => "miss").increment(1);
                return text_response(StatusCode::NOT_FOUND, "no matching route");
            }
        };
        tracing::Span::current().record("endpoint", endpoint.name());
        metrics::counter!("importer_requests_total", "outcome" => "hit").increment(1);

        match endpoint {
            Endpoint::ImportFile => self.import_file(req.into_body()).await,
            Endpoint::Manifest => json_response(StatusCode::OK, &self.importer.manifest()),
            Endpoint::Health => text_response(StatusCode::OK, "ok"),
        }
    }

    async fn import_file(&self, body: Bytes) -> Result<HttpResponse> {
        let revision = self.importer.revision();
        let request = match revision.decode_request(&body) {
            Ok(request) => request,
            Err(err) => {
                let cause = std::error::Error::source(&err).map(ToString::to_string);
                tracing::warn!(error = %err, cause = cause.as_deref().unwrap_or_default(), "rejected import request");
                metrics::counter!("importer_imports_total", "result" => "malformed").increment(1);
                let body = revision.encode_failure(err.to_string(), cause);
                return json_response(StatusCode::BAD_REQUEST, &body);
            }
        };

        let importer = self.importer.clone();
        let result = tokio::task::spawn_blocking(move || importer.run(&request))
            .await
            .context("import task failed")?;

        let label = match &result {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        metrics::counter!("importer_imports_total", "result" => label).increment(1);
        json_response(status_for(&result), &revision.encode_result(&result))
    }
}

pub fn status_for(result: &ImportResult) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(ImportError::MissingField { .. }) => StatusCode::BAD_REQUEST,
        Err(err) if err.is_not_found() => StatusCode::NOT_FOUND,
        Err(ImportError::ReadFailure { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<HttpResponse> {
    let bytes = serde_json::to_vec(body).context("failed to serialize response body")?;
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(bytes))
        .context("failed to build response")
}

pub fn text_response(status: StatusCode, msg: &'static str) -> Result<HttpResponse> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Bytes::from_static(msg.as_bytes()))
        .context("failed to build response")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use importer_sdk::{HostRevision, ImportConfig};
    use serde_json::Value;

    use super::*;
    use crate::importer::FileImporter;

    fn fixtures() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test_data")
    }

    fn service(revision: HostRevision) -> ImportService {
        let config = revision
            .requires_config()
            .then(|| ImportConfig::new("test-key").unwrap());
        let importer = FileImporter::new(fixtures(), revision, config).unwrap();
        ImportService::new(Arc::new(importer))
    }

    fn post(body: &str) -> HttpRequest {
        Request::post("/import_file")
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    async fn call_json(svc: ImportService, req: HttpRequest) -> (StatusCode, Value) {
        let resp = svc.oneshot(req).await.unwrap();
        let status = resp.status();
        (status, serde_json::from_slice(resp.body()).unwrap())
    }

    #[tokio::test]
    async fn imports_markdown_through_v3_envelope() {
        let (status, body) = call_json(
            service(HostRevision::V3),
            post(r#"{"data":{"identifier":"roses.mkd"}}"#),
        )
        .await;
        let raw = std::fs::read_to_string(fixtures().join("roses.mkd")).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["string"], Value::String(raw));
        assert_eq!(body["data"]["mime_type"], "text/markdown");
    }

    #[tokio::test]
    async fn imports_text_through_v1_envelope() {
        let (status, body) = call_json(
            service(HostRevision::V1),
            post(r#"{"data":{"url":"king_speech.txt"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["mimeType"], "text/plain");
        assert!(body["data"]["data"]
            .as_str()
            .unwrap()
            .starts_with("In this grave hour"));
    }

    #[tokio::test]
    async fn maps_import_errors_to_status_codes() {
        let (status, body) = call_json(service(HostRevision::V2), post(r#"{"data":{}}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("identifier"));

        let (status, body) = call_json(
            service(HostRevision::V2),
            post(r#"{"data":{"identifier":"missing.txt"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]["internalMessage"].is_string());
    }

    #[tokio::test]
    async fn malformed_envelope_is_bad_request() {
        let (status, body) = call_json(service(HostRevision::V3), post("{")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("v3"));
    }

    #[tokio::test]
    async fn serves_manifest_and_health() {
        let req = Request::get("/manifest").body(Bytes::new()).unwrap();
        let (status, body) = call_json(service(HostRevision::V3), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["revision"], "v3");

        let req = Request::get("/health").body(Bytes::new()).unwrap();
        let resp = service(HostRevision::V1).oneshot(req).await.unwrap();
        assert_eq!(resp.body().as_ref(), b"ok");
    }

    #[tokio::test]
    async fn unknown_routes_miss() {
        let req = Request::get("/nope").body(Bytes::new()).unwrap();
        let resp = service(HostRevision::V1).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = Request::get("/import_file").body(Bytes::new()).unwrap();
        let resp = service(HostRevision::V1).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn boxed_service_with_timeout_still_serves() {
        let svc = service(HostRevision::V2).boxed(Some(Duration::from_secs(5)));
        let resp = svc
            .oneshot(post(r#"{"data":{"identifier":"roses.mkd"}}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
