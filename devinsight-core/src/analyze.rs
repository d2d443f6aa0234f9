//! Repository analysis submission
//!
//! The service ingests a repository either from a local path it can read or
//! from an uploaded ZIP archive. Exactly one source is sent per request.
//! Input problems are reported as [`ValidationError`]s before any request is
//! made.

use crate::error::{FetchError, ValidationError};
use crate::fetch::error_detail;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Pause between a successful submission and opening the metrics view
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

const PATH_FAILURE_MESSAGE: &str = "Failed to analyze repository. Please check your connection.";
const ARCHIVE_FAILURE_MESSAGE: &str = "Failed to upload and analyze repository.";

/// A validated analysis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeRequest {
    /// Path on the service host, sent as the `repo_path` form field
    RepoPath(String),
    /// Archive contents, sent as the `file` form field
    ZipArchive { file_name: String, bytes: Vec<u8> },
}

impl AnalyzeRequest {
    /// Validate user input into a request; exactly one source must be given
    pub fn from_inputs(
        repo_path: Option<&str>,
        archive: Option<&Path>,
    ) -> Result<Self, ValidationError> {
        let repo_path = repo_path.map(str::trim).filter(|p| !p.is_empty());
        match (repo_path, archive) {
            (Some(_), Some(_)) => Err(ValidationError::ConflictingSources),
            (Some(path), None) => Ok(AnalyzeRequest::RepoPath(path.to_string())),
            (None, Some(archive)) => Self::from_archive(archive),
            (None, None) => Err(ValidationError::MissingRepoPath),
        }
    }

    fn from_archive(path: &Path) -> Result<Self, ValidationError> {
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|_| is_zip)
            .ok_or(ValidationError::NotAZipFile)?
            .to_string();

        let bytes = std::fs::read(path).map_err(|e| ValidationError::UnreadableArchive {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(AnalyzeRequest::ZipArchive { file_name, bytes })
    }

    /// What was analyzed, for the success message
    pub fn source_label(&self) -> &str {
        match self {
            AnalyzeRequest::RepoPath(path) => path,
            AnalyzeRequest::ZipArchive { file_name, .. } => file_name,
        }
    }

    /// Message shown when the service cannot be reached
    pub fn failure_message(&self) -> &'static str {
        match self {
            AnalyzeRequest::RepoPath(_) => PATH_FAILURE_MESSAGE,
            AnalyzeRequest::ZipArchive { .. } => ARCHIVE_FAILURE_MESSAGE,
        }
    }
}

/// Body of a successful analysis response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub detail: String,
}

/// Interpret the service's answer to a submission
pub fn interpret_analyze_response(
    request: &AnalyzeRequest,
    status: u16,
    body: &[u8],
) -> Result<AnalyzeResponse, FetchError> {
    if (200..300).contains(&status) {
        return serde_json::from_slice(body)
            .map_err(|_| FetchError::failed(request.failure_message()));
    }
    let message = error_detail(body).unwrap_or_else(|| request.failure_message().to_string());
    Err(FetchError::failed(message))
}
