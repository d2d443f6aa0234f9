//! Metric records served by the analysis service
//!
//! Records are received as opaque JSON and never mutated by the client.
//! Unknown fields (e.g. `authors`, `net_changes`, `complexity_per_line`) are
//! ignored: every display value is derived locally in [`crate::format`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three metric datasets the service exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Hotspots,
    Churn,
    Complexity,
}

impl MetricKind {
    /// All kinds, in tab order
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Hotspots,
        MetricKind::Churn,
        MetricKind::Complexity,
    ];

    /// Endpoint path for this kind, relative to the service base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            MetricKind::Hotspots => "hotspots",
            MetricKind::Churn => "churn-metrics",
            MetricKind::Complexity => "complexity-metrics",
        }
    }

    /// Human-readable tab label
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Hotspots => "Hotspots",
            MetricKind::Churn => "Churn Metrics",
            MetricKind::Complexity => "Complexity Metrics",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Hotspots => "hotspots",
            MetricKind::Churn => "churn",
            MetricKind::Complexity => "complexity",
        }
    }

    /// Position in [`MetricKind::ALL`]
    pub fn index(&self) -> usize {
        match self {
            MetricKind::Hotspots => 0,
            MetricKind::Churn => 1,
            MetricKind::Complexity => 2,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file churn mined from git history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnRecord {
    pub file: String,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
}

/// Per-file complexity computed by the static analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityRecord {
    pub file: String,
    pub complexity: f64,
    pub lines: u64,
    pub functions: u64,
}

/// A file the service classified as both frequently changed and complex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRecord {
    pub file: String,
    pub commits: u64,
    pub complexity: f64,
    /// Server-assigned label, kept verbatim (e.g. `"High 🔥"`)
    pub risk_level: String,
    pub color: String,
}

impl HotspotRecord {
    /// Severity of the server label, if it is one of the known labels
    pub fn risk(&self) -> Option<RiskLevel> {
        RiskLevel::from_label(&self.risk_level)
    }
}

/// Closed set of server risk labels, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Match a server label by its leading word; decorations such as emoji are ignored
    pub fn from_label(label: &str) -> Option<Self> {
        let word = label.split_whitespace().next()?;
        match word.to_ascii_lowercase().as_str() {
            "high" => Some(RiskLevel::High),
            "medium" => Some(RiskLevel::Medium),
            "low" => Some(RiskLevel::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Records of a single dataset, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Records {
    Churn(Vec<ChurnRecord>),
    Complexity(Vec<ComplexityRecord>),
    Hotspots(Vec<HotspotRecord>),
}

impl Records {
    /// An empty record set of the given kind
    pub fn empty(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Churn => Records::Churn(Vec::new()),
            MetricKind::Complexity => Records::Complexity(Vec::new()),
            MetricKind::Hotspots => Records::Hotspots(Vec::new()),
        }
    }

    /// Decode a JSON array body into records of the given kind
    pub fn from_json(kind: MetricKind, body: &[u8]) -> serde_json::Result<Self> {
        Ok(match kind {
            MetricKind::Churn => Records::Churn(serde_json::from_slice(body)?),
            MetricKind::Complexity => Records::Complexity(serde_json::from_slice(body)?),
            MetricKind::Hotspots => Records::Hotspots(serde_json::from_slice(body)?),
        })
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Records::Churn(_) => MetricKind::Churn,
            Records::Complexity(_) => MetricKind::Complexity,
            Records::Hotspots(_) => MetricKind::Hotspots,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Churn(r) => r.len(),
            Records::Complexity(r) => r.len(),
            Records::Hotspots(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
