//! Error types for graph construction and evaluation.

use crate::vertex::VertexId;

/// Error type detectors report from their evaluation hooks.
///
/// Detector logic is application code, so the failure payload is an opaque
/// boxed error. The engine wraps it in [`GraphError::DetectorFailure`]
/// together with the detector's type name.
pub type DetectorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building or evaluating a graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The graph contains a directed cycle involving the named vertex.
    /// Evaluation is refused before any detector runs.
    #[error("cycle detected involving vertex: {0}")]
    CycleDetected(&'static str),

    /// A topic lookup missed while the graph is configured for
    /// pre-registered topics only.
    #[error("unresolved topic: {0}")]
    UnresolvedTopic(&'static str),

    /// Two registrations were attempted for one topic state type.
    #[error("duplicate topic registration: {0}")]
    DuplicateTopic(&'static str),

    /// The input queue is at its configured capacity.
    #[error("input queue overflow: capacity {capacity}")]
    QueueOverflow {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// A configured storage bound was reached.
    #[error("capacity exceeded: {what} limit is {limit}")]
    CapacityExceeded {
        /// Which bound was hit (vertices, topics, topic values).
        what: &'static str,
        /// The configured limit.
        limit: usize,
    },

    /// An edge references a vertex that is not part of the graph.
    #[error("vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// A type-erased value did not match its target topic's state type.
    ///
    /// The registry keys topics by `TypeId`, so this indicates internal
    /// state corruption rather than bad runtime data.
    #[error("topic type mismatch on {0}")]
    TopicTypeMismatch(&'static str),

    /// A detector reported an error during its evaluation.
    ///
    /// The pass still completes cleanup so the graph remains consistent;
    /// the first failure of the pass is returned.
    #[error("detector {detector} failed: {source}")]
    DetectorFailure {
        /// Type name of the failing detector.
        detector: &'static str,
        /// The error the detector reported.
        #[source]
        source: DetectorError,
    },
}
