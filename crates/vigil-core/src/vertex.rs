//! Vertex identity and per-vertex graph bookkeeping.
//!
//! Vertices live in an arena owned by the graph; edges are `VertexId`
//! pairs stored on adjacency lists, never owning pointers between
//! vertices. Bidirectional topic/detector links are therefore cycle-free
//! at the ownership level even though both directions are recorded.

use std::fmt;

use smallvec::SmallVec;

use crate::detector::DetectorSlot;
use crate::topic::AnyTopic;

/// Unique identifier for a vertex in a graph.
///
/// Ids are allocated monotonically per graph and never reused, so
/// insertion order is recoverable from id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.0)
    }
}

/// Per-pass search state used by the topological sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    /// Not yet visited.
    #[default]
    Clear,
    /// Visit started, successors being explored. Encountering an
    /// `InProgress` vertex during the search means a back edge.
    InProgress,
    /// Visit finished, vertex emitted to the order.
    Done,
}

/// Classification of a vertex, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// A passive typed value slot.
    Topic,
    /// A computation with subscriptions and publications.
    Detector,
}

/// The type-erased payload of a vertex slot.
pub(crate) enum VertexPayload {
    Topic(Box<dyn AnyTopic>),
    Detector(DetectorSlot),
}

/// A vertex owned by the graph: identity, adjacency, search state, payload.
pub(crate) struct VertexSlot {
    pub(crate) id: VertexId,
    /// Type name of the topic state or detector, for diagnostics.
    pub(crate) name: &'static str,
    pub(crate) state: SearchState,
    /// Successors in dataflow order (publisher -> subscriber).
    pub(crate) out_edges: SmallVec<[VertexId; 4]>,
    /// Predecessors, maintained as the mirror of `out_edges`.
    pub(crate) in_edges: SmallVec<[VertexId; 4]>,
    /// Deferred-delivery successors; excluded from the topological sort.
    pub(crate) future_out_edges: SmallVec<[VertexId; 2]>,
    /// Mirror of `future_out_edges`.
    pub(crate) future_in_edges: SmallVec<[VertexId; 2]>,
    pub(crate) payload: VertexPayload,
}

impl VertexSlot {
    pub(crate) fn new_topic(id: VertexId, name: &'static str, topic: Box<dyn AnyTopic>) -> Self {
        Self {
            id,
            name,
            state: SearchState::Clear,
            out_edges: SmallVec::new(),
            in_edges: SmallVec::new(),
            future_out_edges: SmallVec::new(),
            future_in_edges: SmallVec::new(),
            payload: VertexPayload::Topic(topic),
        }
    }

    pub(crate) fn new_detector(id: VertexId, name: &'static str) -> Self {
        Self {
            id,
            name,
            state: SearchState::Clear,
            out_edges: SmallVec::new(),
            in_edges: SmallVec::new(),
            future_out_edges: SmallVec::new(),
            future_in_edges: SmallVec::new(),
            payload: VertexPayload::Detector(DetectorSlot::empty()),
        }
    }

    pub(crate) fn kind(&self) -> VertexKind {
        match self.payload {
            VertexPayload::Topic(_) => VertexKind::Topic,
            VertexPayload::Detector(_) => VertexKind::Detector,
        }
    }

    pub(crate) fn topic_ref(&self) -> Option<&dyn AnyTopic> {
        match &self.payload {
            VertexPayload::Topic(topic) => Some(topic.as_ref()),
            VertexPayload::Detector(_) => None,
        }
    }

    pub(crate) fn topic_mut(&mut self) -> Option<&mut (dyn AnyTopic + 'static)> {
        match &mut self.payload {
            VertexPayload::Topic(topic) => Some(topic.as_mut()),
            VertexPayload::Detector(_) => None,
        }
    }

    pub(crate) fn detector_ref(&self) -> Option<&DetectorSlot> {
        match &self.payload {
            VertexPayload::Detector(slot) => Some(slot),
            VertexPayload::Topic(_) => None,
        }
    }

    pub(crate) fn detector_mut(&mut self) -> Option<&mut DetectorSlot> {
        match &mut self.payload {
            VertexPayload::Detector(slot) => Some(slot),
            VertexPayload::Topic(_) => None,
        }
    }
}

impl fmt::Debug for VertexSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexSlot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("out_edges", &self.out_edges)
            .field("in_edges", &self.in_edges)
            .finish_non_exhaustive()
    }
}
