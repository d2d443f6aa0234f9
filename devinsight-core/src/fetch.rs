//! Fetch orchestration
//!
//! Builds a query from the filter state plus per-dataset extras, performs a
//! single request through a [`Transport`], and normalizes the outcome:
//!
//! - `204` or an empty `2xx` body: empty records (not an error)
//! - `2xx` with a body: records decoded for the requested kind
//! - non-`2xx`: [`FetchError`] carrying the server `detail`, or a fallback
//! - transport failure or undecodable body: [`FetchError`] with a
//!   connectivity message
//!
//! Every fetch is a single attempt. There are no retries and no backoff.

use crate::error::{FetchError, TransportError, CONNECTIVITY_MESSAGE, FETCH_FALLBACK_MESSAGE};
use crate::filter::FilterState;
use crate::records::{MetricKind, Records};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, warn};

/// Outcome of a single fetch
pub type FetchResult = Result<Records, FetchError>;

/// Thresholds sent with every hotspot request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotspotParams {
    /// Minimum commits for a file to qualify
    pub churn_threshold: u32,
    /// Minimum complexity for a file to qualify
    pub complexity_threshold: f64,
    /// Number of riskiest files the server considers before paging
    pub top_n: u32,
}

impl Default for HotspotParams {
    fn default() -> Self {
        HotspotParams {
            churn_threshold: 5,
            complexity_threshold: 5.0,
            top_n: 10000,
        }
    }
}

impl HotspotParams {
    fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            (
                "churn_threshold".to_string(),
                self.churn_threshold.to_string(),
            ),
            (
                "complexity_threshold".to_string(),
                self.complexity_threshold.to_string(),
            ),
            ("top_n".to_string(), self.top_n.to_string()),
        ]
    }
}

/// Kind-specific parameters added alongside the filter parameters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DatasetParams {
    pub hotspots: HotspotParams,
}

impl DatasetParams {
    /// Extra query pairs for a kind; churn and complexity take none
    pub fn extras(&self, kind: MetricKind) -> Vec<(String, String)> {
        match kind {
            MetricKind::Hotspots => self.hotspots.query_pairs(),
            MetricKind::Churn | MetricKind::Complexity => Vec::new(),
        }
    }
}

/// A fully parameterized GET against one metric endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub kind: MetricKind,
    /// Query pairs in send order: `page`, `limit`, optional `ext`, then extras
    pub query: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(kind: MetricKind, filter: &FilterState, extras: Vec<(String, String)>) -> Self {
        let mut query = vec![
            ("page".to_string(), filter.page().to_string()),
            ("limit".to_string(), filter.limit().to_string()),
        ];
        if let Some(ext) = filter.ext_param() {
            query.push(("ext".to_string(), ext));
        }
        query.extend(extras);
        FetchRequest { kind, query }
    }

    pub fn endpoint(&self) -> &'static str {
        self.kind.endpoint()
    }

    /// Look up a query value by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of an HTTP response, before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        RawResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network seam: issues one GET and returns the raw response
pub trait Transport {
    fn get(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Issues metric requests and converts every outcome into a [`FetchResult`]
#[derive(Debug, Clone)]
pub struct Orchestrator<T> {
    transport: T,
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(transport: T) -> Self {
        Orchestrator { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform the request once and normalize the outcome
    pub async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        debug!(
            endpoint = request.endpoint(),
            query = ?request.query,
            "issuing metrics request"
        );
        let result = match self.transport.get(request).await {
            Ok(response) => interpret_response(request.kind, &response),
            Err(e) => {
                warn!(endpoint = request.endpoint(), error = %e, "metrics request failed to complete");
                Err(FetchError::connectivity())
            }
        };
        if let Err(ref e) = result {
            warn!(endpoint = request.endpoint(), message = e.message(), "fetch failed");
        }
        result
    }
}

/// Map a raw response onto records or a user-facing failure
pub fn interpret_response(kind: MetricKind, response: &RawResponse) -> FetchResult {
    if response.status == 204 {
        return Ok(Records::empty(kind));
    }

    if response.is_success() {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Records::empty(kind));
        }
        return Records::from_json(kind, &response.body).map_err(|e| {
            debug!(error = %e, "undecodable success body");
            FetchError::failed(CONNECTIVITY_MESSAGE)
        });
    }

    let message = error_detail(&response.body).unwrap_or_else(|| FETCH_FALLBACK_MESSAGE.to_string());
    Err(FetchError::failed(message))
}

/// Extract a non-empty string `detail` from a JSON error body
pub fn error_detail(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<serde_json::Value>,
    }

    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
