//! Problem reporting sinks
//!
//! A build pass clears and reports per-resource problems through a
//! [`ProblemSink`]. The CLI wires in a text or JSON sink; tests use the
//! recording sink to assert on the exact clear/report traffic.

use std::sync::{Arc, Mutex};

use crate::core::diagnostic::Problem;
use crate::core::resource::ResourceId;

/// Receiver of per-resource problem markers
pub trait ProblemSink {
    /// Drop all problems previously reported against a resource
    fn clear(&mut self, resource: &ResourceId);

    /// Report one problem against a resource
    fn report(&mut self, problem: &Problem);
}

/// Sink that prints problems in `file:line: severity: message` form
///
/// Clearing is a no-op: a terminal has no marker store to retract from.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextProblemSink;

impl ProblemSink for TextProblemSink {
    fn clear(&mut self, _resource: &ResourceId) {}

    fn report(&mut self, problem: &Problem) {
        eprintln!(
            "{}:{}: {}: {}",
            problem.resource, problem.line, problem.severity, problem.message
        );
    }
}

/// Sink that prints one JSON object per problem
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProblemSink;

impl ProblemSink for JsonProblemSink {
    fn clear(&mut self, _resource: &ResourceId) {}

    fn report(&mut self, problem: &Problem) {
        match serde_json::to_string(problem) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("Failed to serialize problem: {}", e),
        }
    }
}

/// One clear or report observed by a [`RecordingProblemSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemEvent {
    /// Problems for a resource were cleared
    Cleared(ResourceId),
    /// A problem was reported
    Reported(Problem),
}

/// Sink that records events for later inspection
///
/// Clones share the same store, so a caller can keep one clone for
/// reading while a build owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingProblemSink {
    events: Arc<Mutex<Vec<ProblemEvent>>>,
}

impl RecordingProblemSink {
    /// Create an empty recording sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events in arrival order
    #[must_use]
    pub fn events(&self) -> Vec<ProblemEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Problems reported so far, in arrival order
    #[must_use]
    pub fn reported(&self) -> Vec<Problem> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProblemEvent::Reported(problem) => Some(problem),
                ProblemEvent::Cleared(_) => None,
            })
            .collect()
    }

    /// Resources cleared so far, in arrival order
    #[must_use]
    pub fn cleared(&self) -> Vec<ResourceId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProblemEvent::Cleared(resource) => Some(resource),
                ProblemEvent::Reported(_) => None,
            })
            .collect()
    }
}

impl ProblemSink for RecordingProblemSink {
    fn clear(&mut self, resource: &ResourceId) {
        if let Ok(mut events) = self.events.lock() {
            events.push(ProblemEvent::Cleared(resource.clone()));
        }
    }

    fn report(&mut self, problem: &Problem) {
        if let Ok(mut events) = self.events.lock() {
            events.push(ProblemEvent::Reported(problem.clone()));
        }
    }
}
