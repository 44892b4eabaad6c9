//! Output list items: shared snapshots of values published in a pass.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::state::{TopicState, TopicStateId};
use crate::vertex::VertexId;

/// One value published during the most recent completed pass.
///
/// Items own their data (an `Arc` of a clone taken at compose time), so
/// they remain readable after the pass, but the output list itself is
/// replaced when the next pass begins. Items appear in topological order
/// of their topics, then publish order within a topic.
#[derive(Clone)]
pub struct OutputItem {
    topic: VertexId,
    type_id: TypeId,
    state_name: &'static str,
    state_id: TopicStateId,
    value: Arc<dyn Any + Send + Sync>,
}

impl OutputItem {
    pub(crate) fn new<T: TopicState>(topic: VertexId, value: &T) -> Self {
        Self {
            topic,
            type_id: TypeId::of::<T>(),
            state_name: std::any::type_name::<T>(),
            state_id: value.state_id(),
            value: Arc::new(value.clone()),
        }
    }

    /// The vertex id of the topic this value was published to.
    #[must_use]
    pub fn topic(&self) -> VertexId {
        self.topic
    }

    /// Type name of the topic state, for diagnostics.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.state_name
    }

    /// The application-defined state id, or
    /// [`TopicStateId::ANONYMOUS`](crate::TopicStateId::ANONYMOUS).
    #[must_use]
    pub fn state_id(&self) -> TopicStateId {
        self.state_id
    }

    /// Returns true if this item carries a value of type `T`.
    #[must_use]
    pub fn is<T: TopicState>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrows the value as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: TopicState>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns a shared handle to the value as `T`, if that is its type.
    #[must_use]
    pub fn downcast_arc<T: TopicState>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }
}

impl fmt::Debug for OutputItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputItem")
            .field("topic", &self.topic)
            .field("state_name", &self.state_name)
            .field("state_id", &self.state_id)
            .finish_non_exhaustive()
    }
}
