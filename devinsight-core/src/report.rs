//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Records print in server order; the client never re-sorts a page
//! - Byte-for-byte identical output for identical records

use crate::controller::ViewState;
use crate::format::{
    complexity_ratio, format_additions, format_complexity, format_deletions, format_grouped,
    format_net, format_number, format_ratio, net_churn, risk_score,
};
use crate::records::{ChurnRecord, ComplexityRecord, HotspotRecord, MetricKind, Records};

const FILE_WIDTH: usize = 40;

/// Render records as a text table
pub fn render_text(records: &Records) -> String {
    match records {
        Records::Churn(rows) => render_churn(rows),
        Records::Complexity(rows) => render_complexity(rows),
        Records::Hotspots(rows) => render_hotspots(rows),
    }
}

fn render_churn(rows: &[ChurnRecord]) -> String {
    let mut output = format!(
        "{:<40} {:>8} {:>10} {:>10} {:>10}\n",
        "FILE", "COMMITS", "ADDED", "DELETED", "NET"
    );
    for row in rows {
        output.push_str(&format!(
            "{:<40} {:>8} {:>10} {:>10} {:>10}\n",
            truncate_or_pad(&row.file, FILE_WIDTH),
            format_grouped(row.commits),
            format_additions(row),
            format_deletions(row),
            format_net(net_churn(row)),
        ));
    }
    output
}

fn render_complexity(rows: &[ComplexityRecord]) -> String {
    let mut output = format!(
        "{:<40} {:>16} {:>8} {:>10} {:>10}\n",
        "FILE", "COMPLEXITY", "LINES", "FUNCTIONS", "RATIO"
    );
    for row in rows {
        output.push_str(&format!(
            "{:<40} {:>16} {:>8} {:>10} {:>10}\n",
            truncate_or_pad(&row.file, FILE_WIDTH),
            format_complexity(row.complexity),
            format_grouped(row.lines),
            format_grouped(row.functions),
            format_ratio(complexity_ratio(row)),
        ));
    }
    output
}

fn render_hotspots(rows: &[HotspotRecord]) -> String {
    let mut output = format!(
        "{:<40} {:>8} {:>10} {:>12} {}\n",
        "FILE", "COMMITS", "COMPLEXITY", "RISK SCORE", "RISK LEVEL"
    );
    for row in rows {
        output.push_str(&format!(
            "{:<40} {:>8} {:>10} {:>12} {}\n",
            truncate_or_pad(&row.file, FILE_WIDTH),
            format_grouped(row.commits),
            format_number(row.complexity),
            format_number(risk_score(row)),
            row.risk_level,
        ));
    }
    output
}

/// Render records as JSON output
pub fn render_json(records: &Records) -> String {
    serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
}

/// Render the content area of a tab as text
pub fn render_view(kind: MetricKind, view: &ViewState<'_>) -> String {
    match view {
        ViewState::Idle => format!("{}: not loaded\n", kind.label()),
        ViewState::Loading => format!("Loading {}...\n", kind.label()),
        ViewState::Failed(message) => format!("Error: {}\n", message),
        ViewState::Empty(notice) => format!("{}\n{}\n", notice.title, notice.hint),
        ViewState::Table(records) => render_text(records),
    }
}

/// Truncate or pad string to fixed width, counting characters
pub fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::EmptyNotice;

    fn churn_rows() -> Records {
        Records::Churn(vec![
            ChurnRecord {
                file: "src/app.py".to_string(),
                commits: 12,
                additions: 340,
                deletions: 120,
            },
            ChurnRecord {
                file: "src/legacy.py".to_string(),
                commits: 3,
                additions: 10,
                deletions: 95,
            },
        ])
    }

    #[test]
    fn test_churn_table_shows_signed_net() {
        let text = render_text(&churn_rows());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("FILE"));
        assert!(lines[1].starts_with("src/app.py"));
        assert!(lines[1].ends_with("+220"));
        assert!(lines[2].ends_with("-85"));
    }

    #[test]
    fn test_complexity_table_handles_zero_lines() {
        let records = Records::Complexity(vec![
            ComplexityRecord {
                file: "empty.rs".to_string(),
                complexity: 0.0,
                lines: 0,
                functions: 0,
            },
            ComplexityRecord {
                file: "busy.rs".to_string(),
                complexity: 12.5,
                lines: 250,
                functions: 9,
            },
        ]);
        let text = render_text(&records);
        assert!(text.lines().nth(1).unwrap().ends_with("N/A"));
        let busy = text.lines().nth(2).unwrap();
        assert!(busy.contains("12.5 (Medium)"));
        assert!(busy.ends_with("5.00%"));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_hotspot_table_keeps_server_risk_level() {
        let records = Records::Hotspots(vec![HotspotRecord {
            file: "core/engine.go".to_string(),
            commits: 20,
            complexity: 3.5,
            risk_level: "Low Risk".to_string(),
            color: "green".to_string(),
        }]);
        let row = render_text(&records).lines().nth(1).unwrap().to_string();
        assert!(row.contains(" 70 "));
        assert!(row.ends_with("Low Risk"));
    }

    #[test]
    fn test_render_json_is_plain_array() {
        let json = render_json(&churn_rows());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["file"], "src/app.py");
        assert_eq!(render_json(&Records::empty(MetricKind::Hotspots)), "[]");
    }

    #[test]
    fn test_render_view_states() {
        assert_eq!(
            render_view(MetricKind::Churn, &ViewState::Failed("boom")),
            "Error: boom\n"
        );
        let notice = EmptyNotice::for_kind(MetricKind::Hotspots);
        assert_eq!(
            render_view(MetricKind::Hotspots, &ViewState::Empty(notice)),
            "No hotspots found\nTry adjusting the thresholds or file filters\n"
        );
        assert_eq!(
            render_view(MetricKind::Complexity, &ViewState::Loading),
            "Loading Complexity Metrics...\n"
        );
    }

    #[test]
    fn test_truncate_or_pad_is_char_safe() {
        assert_eq!(truncate_or_pad("abc", 5), "abc  ");
        assert_eq!(truncate_or_pad("src/ünïcödé/path.rs", 10), "src/ünï...");
    }
}
