//! # Vigil Core
//!
//! An embeddable dataflow evaluation engine built around a directed
//! acyclic graph of **topics** (typed value slots) and **detectors**
//! (computations that read a subset of topics and publish to others).
//!
//! This crate provides:
//! - **Graph**: vertex ownership, topological scheduling, single-pass
//!   evaluation with well-defined output visibility and reset semantics
//! - **Topics**: one typed slot per state type per graph, discovered
//!   through a type-indexed registry
//! - **Detectors**: subscription/publication wiring with per-type
//!   evaluation callbacks
//! - **Input queue**: FIFO serialization of external inputs, exactly one
//!   consumed per pass
//!
//! ## Design Principles
//!
//! 1. **Deterministic passes** - one input processed to completion before
//!    the next is admitted
//! 2. **Single-threaded, cooperative** - no internal parallelism, no
//!    blocking, `&mut self` everywhere it matters
//! 3. **Arena ownership** - the graph owns every vertex; edges and
//!    handles are ids, never pointers between vertices
//! 4. **Acyclic by construction** - cycles are detected before any
//!    detector runs; feedback loops go through future publications
//!
//! ## Example
//!
//! ```rust,ignore
//! use vigil_core::Graph;
//!
//! let mut graph = Graph::new();
//! // wire detectors with graph.add_detector(...)
//! graph.push_data(TemperatureSample { celsius: 104.0 })?;
//! while graph.evaluate_if_pending()? {
//!     for item in graph.output_list() {
//!         // forward interesting states to the outside
//!     }
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod detector;
pub mod error;
pub mod graph;
pub mod lag;
pub mod output;
pub mod queue;
pub mod registry;
pub mod state;
pub mod testing;
pub mod topic;
pub mod vertex;


pub use config::GraphConfig;
pub use detector::{
    Detector, DetectorContext, DetectorHandle, FuturePublication, Outputs, Publication,
    Subscriber,
};
pub use error::{DetectorError, GraphError};
pub use graph::Graph;
pub use lag::{Lag, Lagged};
pub use output::OutputItem;
pub use queue::GraphInputQueue;
pub use registry::TopicRegistry;
pub use state::{TopicState, TopicStateId};
pub use topic::{Topic, TopicHandle};
pub use vertex::{SearchState, VertexId, VertexKind};

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
