//! Per-kind dataset registry
//!
//! Global invariants enforced:
//! - One entry per metric kind; entries never affect each other
//! - Each reload replaces the entry wholesale (no merging with prior records)
//! - Only the most recently issued reload for a kind may complete it; a
//!   completion carrying a stale generation is discarded

use crate::fetch::{DatasetParams, FetchRequest, FetchResult, Orchestrator, Transport};
use crate::filter::FilterState;
use crate::records::{MetricKind, Records};
use tracing::debug;

/// Load state of one dataset
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DatasetState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Records),
    Failed(String),
}

impl DatasetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetState::NotLoaded => "not_loaded",
            DatasetState::Loading => "loading",
            DatasetState::Loaded(_) => "loaded",
            DatasetState::Failed(_) => "failed",
        }
    }

    pub fn records(&self) -> Option<&Records> {
        match self {
            DatasetState::Loaded(records) => Some(records),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DatasetState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifies one issued reload; only the latest ticket per kind is honored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReloadTicket {
    pub kind: MetricKind,
    pub generation: u64,
}

/// A reload that has been issued but not yet performed
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReload {
    pub ticket: ReloadTicket,
    pub request: FetchRequest,
}

impl PendingReload {
    /// Perform the fetch. The registry is untouched until [`Registry::complete`].
    pub async fn execute<T: Transport>(self, orchestrator: &Orchestrator<T>) -> Completion {
        let result = orchestrator.fetch(&self.request).await;
        Completion {
            ticket: self.ticket,
            result,
        }
    }
}

/// A finished fetch waiting to be applied
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub ticket: ReloadTicket,
    pub result: FetchResult,
}

/// Whether a completion was applied or dropped as superseded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Superseded,
}

#[derive(Debug, Clone, Default)]
struct DatasetEntry {
    state: DatasetState,
    generation: u64,
}

/// One dataset entry per metric kind
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: [DatasetEntry; 3],
    params: DatasetParams,
}

impl Registry {
    pub fn new(params: DatasetParams) -> Self {
        Registry {
            entries: Default::default(),
            params,
        }
    }

    pub fn params(&self) -> &DatasetParams {
        &self.params
    }

    pub fn state(&self, kind: MetricKind) -> &DatasetState {
        &self.entries[kind.index()].state
    }

    /// Generation of the most recently issued reload for a kind (0 if never)
    pub fn generation(&self, kind: MetricKind) -> u64 {
        self.entries[kind.index()].generation
    }

    /// Start a reload: the entry becomes Loading and any in-flight reload
    /// for the same kind is superseded
    pub fn begin_reload(&mut self, kind: MetricKind, filter: &FilterState) -> PendingReload {
        let entry = &mut self.entries[kind.index()];
        entry.generation += 1;
        entry.state = DatasetState::Loading;

        let ticket = ReloadTicket {
            kind,
            generation: entry.generation,
        };
        debug!(kind = %kind, generation = ticket.generation, "reload issued");
        PendingReload {
            ticket,
            request: FetchRequest::new(kind, filter, self.params.extras(kind)),
        }
    }

    /// Apply a finished fetch if it belongs to the latest reload of its kind
    pub fn complete(&mut self, completion: Completion) -> Applied {
        let Completion { ticket, result } = completion;
        let entry = &mut self.entries[ticket.kind.index()];
        if ticket.generation != entry.generation {
            debug!(
                kind = %ticket.kind,
                generation = ticket.generation,
                latest = entry.generation,
                "discarding superseded response"
            );
            return Applied::Superseded;
        }

        entry.state = match result {
            Ok(records) => DatasetState::Loaded(records),
            Err(e) => DatasetState::Failed(e.message().to_string()),
        };
        Applied::Applied
    }

    /// Issue, perform and apply a reload in one step
    pub async fn reload<T: Transport>(
        &mut self,
        kind: MetricKind,
        filter: &FilterState,
        orchestrator: &Orchestrator<T>,
    ) -> &DatasetState {
        let pending = self.begin_reload(kind, filter);
        let completion = pending.execute(orchestrator).await;
        self.complete(completion);
        self.state(kind)
    }
}
