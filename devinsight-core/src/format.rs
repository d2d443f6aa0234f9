//! Display values derived from metric records
//!
//! Global invariants enforced:
//! - Pure functions, no I/O
//! - Undefined ratios render as `N/A`, never `NaN` or `inf`
//! - The client risk score never feeds back into the server `risk_level`

use crate::records::{ChurnRecord, ComplexityRecord, HotspotRecord};

/// Sentinel rendered for values that are undefined for a record
pub const NOT_APPLICABLE: &str = "N/A";

/// Complexity at or above which a file is banded "High"
pub const HIGH_COMPLEXITY: f64 = 15.0;

/// Complexity at or above which a file is banded "Medium"
pub const MEDIUM_COMPLEXITY: f64 = 8.0;

/// Presentation class for a signed change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    /// Zero or growth
    Positive,
    /// Shrinkage
    Negative,
}

impl ChangeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeClass::Positive => "positive",
            ChangeClass::Negative => "negative",
        }
    }
}

/// Display band for per-file complexity
///
/// Independent of the server's hotspot `risk_level`, which uses its own
/// `churn_threshold`/`complexity_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComplexityBand {
    Low,    // < 8
    Medium, // 8-15
    High,   // >= 15
}

impl ComplexityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityBand::Low => "Low",
            ComplexityBand::Medium => "Medium",
            ComplexityBand::High => "High",
        }
    }
}

/// Net churn: additions minus deletions
pub fn net_churn(record: &ChurnRecord) -> i64 {
    (record.additions as i64).saturating_sub(record.deletions as i64)
}

/// Presentation class for a net change; zero counts as non-negative
pub fn change_class(net: i64) -> ChangeClass {
    if net >= 0 {
        ChangeClass::Positive
    } else {
        ChangeClass::Negative
    }
}

/// Render a net change with an explicit `+` for growth
pub fn format_net(net: i64) -> String {
    if net > 0 {
        format!("+{}", net)
    } else {
        net.to_string()
    }
}

pub fn format_additions(record: &ChurnRecord) -> String {
    format!("+{}", record.additions)
}

pub fn format_deletions(record: &ChurnRecord) -> String {
    format!("-{}", record.deletions)
}

/// Assign the display band for a complexity value
pub fn complexity_band(complexity: f64) -> ComplexityBand {
    if complexity >= HIGH_COMPLEXITY {
        ComplexityBand::High
    } else if complexity >= MEDIUM_COMPLEXITY {
        ComplexityBand::Medium
    } else {
        ComplexityBand::Low
    }
}

/// Render complexity with its band, e.g. `12.5 (Medium)`
pub fn format_complexity(complexity: f64) -> String {
    format!(
        "{} ({})",
        format_number(complexity),
        complexity_band(complexity).as_str()
    )
}

/// Complexity per hundred lines; `None` when the file has no lines
pub fn complexity_ratio(record: &ComplexityRecord) -> Option<f64> {
    if record.lines == 0 {
        return None;
    }
    let ratio = record.complexity / record.lines as f64 * 100.0;
    ratio.is_finite().then_some(ratio)
}

/// Render a ratio with two decimals and a percent sign, or `N/A`
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.2}%", r),
        None => NOT_APPLICABLE.to_string(),
    }
}

/// Client-side hotspot score: commits × complexity
///
/// Informational only. The server-assigned `risk_level` is displayed as-is
/// and is never recomputed from this value.
pub fn risk_score(record: &HotspotRecord) -> f64 {
    record.commits as f64 * record.complexity
}

/// Render a number without rounding; integral values print without a fraction
pub fn format_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        NOT_APPLICABLE.to_string()
    }
}

/// Render a count with thousands separators, e.g. `12,345`
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
