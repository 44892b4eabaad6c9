//! Helpers for exercising graphs in tests.

use crate::error::GraphError;
use crate::graph::Graph;
use crate::state::TopicState;

/// Pushes one value and runs a single evaluation pass.
///
/// # Errors
///
/// Propagates push and evaluation errors.
pub fn push_and_evaluate<T: TopicState>(graph: &mut Graph, value: T) -> Result<(), GraphError> {
    graph.push_data(value)?;
    graph.evaluate()
}

/// Evaluates until no data is pending; returns the number of passes run.
///
/// Graphs whose detectors keep future-publishing unconditionally will not
/// quiesce; this loop mirrors that behavior rather than masking it.
///
/// # Errors
///
/// Stops at and propagates the first failing pass.
pub fn flush(graph: &mut Graph) -> Result<usize, GraphError> {
    let mut passes = 0;
    while graph.evaluate_if_pending()? {
        passes += 1;
    }
    Ok(passes)
}

/// The most recent `T` in the output list of the last pass, if any.
#[must_use]
pub fn latest_output<T: TopicState>(graph: &Graph) -> Option<&T> {
    graph
        .output_list()
        .iter()
        .rev()
        .find_map(|item| item.downcast_ref::<T>())
}
