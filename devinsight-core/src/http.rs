//! HTTP transport backed by `reqwest`
//!
//! Owns the service base URL and a shared client. Metric GETs go through the
//! [`Transport`] seam so the orchestrator can interpret them; analysis
//! submissions are interpreted here directly.

use crate::analyze::{interpret_analyze_response, AnalyzeRequest, AnalyzeResponse};
use crate::error::{FetchError, TransportError};
use crate::fetch::{FetchRequest, RawResponse, Transport};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Talks to a DevInsight analysis service over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport for `base_url`; `timeout` of `None` keeps the client default
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let base_url = parse_base_url(base_url)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::with_source("failed to build HTTP client", e))?;
        Ok(HttpTransport { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path against the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| TransportError::with_source(format!("invalid endpoint: {}", endpoint), e))
    }

    /// Submit a repository for analysis via `POST /analyze`
    pub async fn submit_analysis(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<AnalyzeResponse, FetchError> {
        let fallback = || FetchError::failed(request.failure_message());

        let url = self.endpoint_url("analyze").map_err(|_| fallback())?;
        let form = match request {
            AnalyzeRequest::RepoPath(path) => Form::new().text("repo_path", path.clone()),
            AnalyzeRequest::ZipArchive { file_name, bytes } => {
                let part = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str("application/zip")
                    .map_err(|_| fallback())?;
                Form::new().part("file", part)
            }
        };

        debug!(source = request.source_label(), "submitting repository for analysis");
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "analysis request failed to complete");
                fallback()
            })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|_| fallback())?;
        interpret_analyze_response(request, status, &body)
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        let prepared = self
            .endpoint_url(request.endpoint())
            .map(|url| self.client.get(url).query(&request.query));

        async move {
            let response = prepared?
                .send()
                .await
                .map_err(|e| TransportError::with_source("request failed", e))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::with_source("failed to read response body", e))?;
            Ok(RawResponse {
                status,
                body: body.to_vec(),
            })
        }
    }
}

/// Parse a base URL, ensuring its path ends with `/` so endpoints join beneath it
fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| TransportError::with_source(format!("invalid base URL: {}", raw), e))?;
    if url.cannot_be_a_base() {
        return Err(TransportError::new(format!("invalid base URL: {}", raw)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
