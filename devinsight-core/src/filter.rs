//! Extension filter and pagination state
//!
//! Created at dashboard mount with an empty filter, page 1 and limit 10.
//! Mutated only by explicit user actions; never persisted. Every setter
//! reports whether the state actually changed so the controller can skip
//! reloads for no-op edits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Allowed page sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageLimit {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageLimit {
    pub const ALL: [PageLimit; 4] = [
        PageLimit::Ten,
        PageLimit::TwentyFive,
        PageLimit::Fifty,
        PageLimit::Hundred,
    ];

    pub fn as_u32(&self) -> u32 {
        match self {
            PageLimit::Ten => 10,
            PageLimit::TwentyFive => 25,
            PageLimit::Fifty => 50,
            PageLimit::Hundred => 100,
        }
    }

    /// Next larger page size, wrapping back to the smallest
    pub fn cycle(&self) -> PageLimit {
        match self {
            PageLimit::Ten => PageLimit::TwentyFive,
            PageLimit::TwentyFive => PageLimit::Fifty,
            PageLimit::Fifty => PageLimit::Hundred,
            PageLimit::Hundred => PageLimit::Ten,
        }
    }
}

impl TryFrom<u32> for PageLimit {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(PageLimit::Ten),
            25 => Ok(PageLimit::TwentyFive),
            50 => Ok(PageLimit::Fifty),
            100 => Ok(PageLimit::Hundred),
            other => Err(format!(
                "page size must be one of 10, 25, 50, 100 (got {})",
                other
            )),
        }
    }
}

impl From<PageLimit> for u32 {
    fn from(limit: PageLimit) -> Self {
        limit.as_u32()
    }
}

impl fmt::Display for PageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Current extension filter and pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    raw: String,
    extensions: Vec<String>,
    page: u32,
    limit: PageLimit,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(PageLimit::default())
    }
}

impl FilterState {
    /// Mount-time state: no filter, page 1
    pub fn new(limit: PageLimit) -> Self {
        FilterState {
            raw: String::new(),
            extensions: Vec::new(),
            page: 1,
            limit,
        }
    }

    /// Text exactly as the user typed it
    pub fn raw_extensions(&self) -> &str {
        &self.raw
    }

    /// Normalized extension tokens, in input order
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> PageLimit {
        self.limit
    }

    /// Value for the `ext` query parameter; `None` when unfiltered
    pub fn ext_param(&self) -> Option<String> {
        if self.extensions.is_empty() {
            None
        } else {
            Some(self.extensions.join(","))
        }
    }

    /// Replace the filter text. Returns true if the normalized filter changed.
    pub fn set_extensions(&mut self, text: &str) -> bool {
        self.raw = text.to_string();
        let parsed = parse_extensions(text);
        if parsed == self.extensions {
            return false;
        }
        self.extensions = parsed;
        true
    }

    /// Jump to a page, clamped to at least 1. Returns true if the page changed.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Change the page size; prior page offsets are invalid so the page resets to 1
    pub fn set_limit(&mut self, limit: PageLimit) -> bool {
        if limit == self.limit {
            return false;
        }
        self.limit = limit;
        self.page = 1;
        true
    }

    /// "Previous" is disabled on the first page
    pub fn can_go_previous(&self) -> bool {
        self.page > 1
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    /// The client never knows the last page; an empty result marks the end
    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }
}

/// Split comma-separated extension text into normalized tokens
///
/// Tokens are trimmed, stripped of leading dots and lowercased; empty tokens
/// are dropped. Individual tokens are not validated.
pub fn parse_extensions(text: &str) -> Vec<String> {
    text.split(',')
        .map(|token| token.trim().trim_start_matches('.').trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_defaults() {
        let state = FilterState::default();
        assert_eq!(state.page(), 1);
        assert_eq!(state.limit(), PageLimit::Ten);
        assert!(state.extensions().is_empty());
        assert_eq!(state.ext_param(), None);
    }

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions("py,java,js"), vec!["py", "java", "js"]);
        assert_eq!(parse_extensions(" .PY , ,rs,"), vec!["py", "rs"]);
        assert!(parse_extensions("").is_empty());
        assert!(parse_extensions(" , ").is_empty());
    }

    #[test]
    fn test_set_extensions_reports_change() {
        let mut state = FilterState::default();
        assert!(state.set_extensions("py"));
        assert_eq!(state.ext_param(), Some("py".to_string()));
        // Same normalized filter, different raw text
        assert!(!state.set_extensions("py, "));
        assert_eq!(state.raw_extensions(), "py, ");
        assert!(state.set_extensions(""));
        assert_eq!(state.ext_param(), None);
    }

    #[test]
    fn test_set_page_clamps_to_one() {
        let mut state = FilterState::default();
        assert!(!state.set_page(0));
        assert_eq!(state.page(), 1);
        assert!(state.set_page(7));
        assert_eq!(state.page(), 7);
        assert!(state.set_page(0));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_set_limit_resets_page() {
        let mut state = FilterState::default();
        state.set_page(4);
        assert!(state.set_limit(PageLimit::Fifty));
        assert_eq!(state.page(), 1);
        assert_eq!(state.limit(), PageLimit::Fifty);
        assert!(!state.set_limit(PageLimit::Fifty));
    }

    #[test]
    fn test_previous_disabled_iff_first_page() {
        let mut state = FilterState::default();
        assert!(!state.can_go_previous());
        assert!(!state.previous_page());
        assert_eq!(state.page(), 1);
        assert!(state.next_page());
        assert!(state.can_go_previous());
        assert!(state.previous_page());
        assert!(!state.can_go_previous());
    }

    #[test]
    fn test_page_limit_conversions() {
        for limit in PageLimit::ALL {
            assert_eq!(PageLimit::try_from(limit.as_u32()), Ok(limit));
        }
        assert!(PageLimit::try_from(20).is_err());
        assert_eq!(PageLimit::Hundred.cycle(), PageLimit::Ten);
    }

    #[test]
    fn test_page_limit_serde() {
        let limit: PageLimit = serde_json::from_str("25").unwrap();
        assert_eq!(limit, PageLimit::TwentyFive);
        assert!(serde_json::from_str::<PageLimit>("30").is_err());
        assert_eq!(serde_json::to_string(&PageLimit::Fifty).unwrap(), "50");
    }
}
