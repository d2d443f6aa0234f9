//! DevInsight core library - client state for a repository metrics dashboard

// Global invariants enforced in this crate:
// - Datasets are replaced wholesale, never merged across fetches
// - A response is applied only if it answers the latest reload of its kind
// - Page is always >= 1 and limit is always one of the allowed page sizes
// - Formatting is pure; identical records render identically
// - No clocks are read inside state machines; callers pass `Instant`s in

pub mod analyze;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod format;
pub mod http;
pub mod records;
pub mod registry;
pub mod report;

pub use analyze::{AnalyzeRequest, AnalyzeResponse};
pub use config::ResolvedConfig;
pub use controller::{ViewController, ViewState};
pub use error::{FetchError, TransportError, ValidationError};
pub use fetch::{FetchRequest, Orchestrator, RawResponse, Transport};
pub use filter::{FilterState, PageLimit};
pub use http::HttpTransport;
pub use records::{MetricKind, Records};
pub use registry::{DatasetState, Registry};
pub use report::{render_json, render_text, render_view};
