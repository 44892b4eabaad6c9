//! FIFO queue of pending external inputs.
//!
//! Each entry is a dispatcher pairing a target topic with one type-erased
//! value. The scheduler consumes exactly one dispatcher per evaluation
//! pass, which is what serializes external events through the graph.

use std::any::Any;
use std::collections::VecDeque;

use crate::error::GraphError;
use crate::state::TopicState;
use crate::vertex::VertexId;

/// Injects one externally queued value into a topic.
pub(crate) struct GraphInputDispatcher {
    pub(crate) topic: VertexId,
    pub(crate) value: Box<dyn Any + Send>,
    pub(crate) state_name: &'static str,
}

impl GraphInputDispatcher {
    pub(crate) fn new<T: TopicState>(topic: VertexId, value: T) -> Self {
        Self {
            topic,
            value: Box::new(value),
            state_name: std::any::type_name::<T>(),
        }
    }
}

impl std::fmt::Debug for GraphInputDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphInputDispatcher")
            .field("topic", &self.topic)
            .field("state_name", &self.state_name)
            .finish_non_exhaustive()
    }
}

/// FIFO of pending input dispatchers; bounded when configured.
#[derive(Debug, Default)]
pub struct GraphInputQueue {
    queue: VecDeque<GraphInputDispatcher>,
    capacity: Option<usize>,
}

impl GraphInputQueue {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
        }
    }

    /// Constructs a dispatcher for `(topic, value)` and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::QueueOverflow`] when the queue is bounded and
    /// full; the caller may retry after draining passes.
    pub(crate) fn enqueue<T: TopicState>(
        &mut self,
        topic: VertexId,
        value: T,
    ) -> Result<(), GraphError> {
        self.enqueue_dispatcher(GraphInputDispatcher::new(topic, value))
    }

    pub(crate) fn enqueue_dispatcher(
        &mut self,
        dispatcher: GraphInputDispatcher,
    ) -> Result<(), GraphError> {
        if let Some(capacity) = self.capacity {
            if self.queue.len() >= capacity {
                return Err(GraphError::QueueOverflow { capacity });
            }
        }
        self.queue.push_back(dispatcher);
        Ok(())
    }

    /// Removes and returns the head dispatcher, or `None` if empty.
    pub(crate) fn dequeue_one(&mut self) -> Option<GraphInputDispatcher> {
        self.queue.pop_front()
    }

    /// Returns true if no input is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
