//! Dashboard view controller
//!
//! Owns the active tab, the filter/pagination state, and the dataset
//! registry. User actions are translated into reloads through an explicit
//! rule table ([`reload_rule`]); the controller itself never performs I/O.
//! Callers execute the returned [`PendingReload`]s and hand the resulting
//! [`Completion`]s back via [`ViewController::complete`].
//!
//! Global invariants enforced:
//! - Only the active kind is ever reloaded
//! - Activating a different tab always reloads it (filters may have changed)
//! - Inactive datasets keep whatever state they were last left in
//! - Unchanged values never trigger a reload

use crate::debounce::{DebouncePolicy, Debouncer};
use crate::fetch::DatasetParams;
use crate::filter::{FilterState, PageLimit};
use crate::records::{MetricKind, Records};
use crate::registry::{Applied, Completion, DatasetState, PendingReload, Registry};
use std::time::Instant;

/// What the user changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    TabActivated,
    FilterEdited,
    PageChanged,
    LimitChanged,
    Refresh,
}

/// What to do with the active dataset after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadAction {
    None,
    Immediate,
    Debounced,
}

/// The reload rule table
///
/// | change        | value changed | action                      |
/// |---------------|---------------|-----------------------------|
/// | any           | no            | none                        |
/// | tab activated | yes           | immediate                   |
/// | filter edited | yes           | debounced (immediate if 0)  |
/// | page changed  | yes           | immediate                   |
/// | limit changed | yes           | immediate                   |
/// | refresh       | always        | immediate                   |
pub fn reload_rule(change: Change, changed: bool, policy: DebouncePolicy) -> ReloadAction {
    match change {
        Change::Refresh => ReloadAction::Immediate,
        _ if !changed => ReloadAction::None,
        Change::FilterEdited if !policy.is_immediate() => ReloadAction::Debounced,
        Change::TabActivated | Change::FilterEdited | Change::PageChanged | Change::LimitChanged => {
            ReloadAction::Immediate
        }
    }
}

/// Explanation shown when a dataset loads with zero records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyNotice {
    pub title: &'static str,
    pub hint: &'static str,
}

impl EmptyNotice {
    pub fn for_kind(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Hotspots => EmptyNotice {
                title: "No hotspots found",
                hint: "Try adjusting the thresholds or file filters",
            },
            MetricKind::Churn => EmptyNotice {
                title: "No churn data available",
                hint: "Make sure you have analyzed a repository first",
            },
            MetricKind::Complexity => EmptyNotice {
                title: "No complexity data available",
                hint: "Make sure you have analyzed a repository first",
            },
        }
    }
}

/// What the content area should show, in precedence order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewState<'a> {
    /// Never requested
    Idle,
    Loading,
    /// Error message; stale records are not shown
    Failed(&'a str),
    Empty(EmptyNotice),
    Table(&'a Records),
}

/// Construction-time settings for the controller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerSettings {
    pub limit: PageLimit,
    pub params: DatasetParams,
    pub debounce: DebouncePolicy,
}

/// Tab, filter and dataset state for the metrics dashboard
#[derive(Debug, Clone)]
pub struct ViewController {
    active: MetricKind,
    filter: FilterState,
    registry: Registry,
    debouncer: Debouncer,
}

impl Default for ViewController {
    fn default() -> Self {
        ViewController::new(ControllerSettings::default())
    }
}

impl ViewController {
    /// A controller with the hotspots tab active and nothing loaded yet
    pub fn new(settings: ControllerSettings) -> Self {
        ViewController {
            active: MetricKind::Hotspots,
            filter: FilterState::new(settings.limit),
            registry: Registry::new(settings.params),
            debouncer: Debouncer::new(settings.debounce),
        }
    }

    pub fn active(&self) -> MetricKind {
        self.active
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dataset(&self, kind: MetricKind) -> &DatasetState {
        self.registry.state(kind)
    }

    /// Initial load of the active tab
    pub fn mount(&mut self) -> PendingReload {
        self.issue()
    }

    /// Initial load with a chosen starting tab
    pub fn mount_on(&mut self, kind: MetricKind) -> PendingReload {
        self.active = kind;
        self.issue()
    }

    /// Initial load with a chosen starting tab and a prepared filter
    pub fn mount_with(&mut self, kind: MetricKind, filter: FilterState) -> PendingReload {
        self.filter = filter;
        self.mount_on(kind)
    }

    pub fn activate_tab(&mut self, kind: MetricKind) -> Option<PendingReload> {
        let changed = kind != self.active;
        self.active = kind;
        self.apply(Change::TabActivated, changed, None)
    }

    /// Replace the extension filter text. Reload is deferred per the debounce policy.
    pub fn edit_filter(&mut self, text: &str, now: Instant) -> Option<PendingReload> {
        let changed = self.filter.set_extensions(text);
        self.apply(Change::FilterEdited, changed, Some(now))
    }

    pub fn set_page(&mut self, page: u32) -> Option<PendingReload> {
        let changed = self.filter.set_page(page);
        self.apply(Change::PageChanged, changed, None)
    }

    pub fn previous_page(&mut self) -> Option<PendingReload> {
        let changed = self.filter.previous_page();
        self.apply(Change::PageChanged, changed, None)
    }

    pub fn next_page(&mut self) -> Option<PendingReload> {
        let changed = self.filter.next_page();
        self.apply(Change::PageChanged, changed, None)
    }

    pub fn set_limit(&mut self, limit: PageLimit) -> Option<PendingReload> {
        let changed = self.filter.set_limit(limit);
        self.apply(Change::LimitChanged, changed, None)
    }

    /// Reload the active tab unconditionally
    pub fn refresh(&mut self) -> PendingReload {
        self.debouncer.cancel();
        self.issue()
    }

    /// Issue the debounced filter reload once its quiet window has elapsed
    pub fn poll_debounce(&mut self, now: Instant) -> Option<PendingReload> {
        if self.debouncer.fire(now) {
            Some(self.issue())
        } else {
            None
        }
    }

    /// When the pending debounced reload is due, if any
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Apply a finished fetch; superseded completions are dropped
    pub fn complete(&mut self, completion: Completion) -> Applied {
        self.registry.complete(completion)
    }

    /// Renderable state of the active tab
    pub fn view(&self) -> ViewState<'_> {
        match self.registry.state(self.active) {
            DatasetState::NotLoaded => ViewState::Idle,
            DatasetState::Loading => ViewState::Loading,
            DatasetState::Failed(message) => ViewState::Failed(message),
            DatasetState::Loaded(records) if records.is_empty() => {
                ViewState::Empty(EmptyNotice::for_kind(self.active))
            }
            DatasetState::Loaded(records) => ViewState::Table(records),
        }
    }

    fn apply(&mut self, change: Change, changed: bool, now: Option<Instant>) -> Option<PendingReload> {
        match reload_rule(change, changed, self.debouncer.policy()) {
            ReloadAction::None => None,
            ReloadAction::Immediate => {
                // The reload below already uses the latest filter text
                self.debouncer.cancel();
                Some(self.issue())
            }
            ReloadAction::Debounced => {
                self.debouncer.schedule(now.unwrap_or_else(Instant::now));
                None
            }
        }
    }

    fn issue(&mut self) -> PendingReload {
        self.registry.begin_reload(self.active, &self.filter)
    }
}
