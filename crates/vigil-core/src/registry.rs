//! Type-keyed lookup of the unique topic per state type.

use std::any::TypeId;

use fxhash::FxHashMap;

use crate::error::GraphError;
use crate::state::TopicState;
use crate::vertex::VertexId;

/// A registry of available topics, keyed by state type.
///
/// Graphs use the registry to register and resolve topics with a
/// type-aware API; it is the mechanism behind the one-topic-per-type
/// invariant. The registry holds vertex ids only and performs no
/// ownership.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    by_type: FxHashMap<TypeId, VertexId>,
}

impl TopicRegistry {
    pub(crate) fn new() -> Self {
        Self {
            by_type: FxHashMap::default(),
        }
    }

    /// Returns the vertex id of the topic for `T`, if registered.
    #[must_use]
    pub fn resolve<T: TopicState>(&self) -> Option<VertexId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Registers the topic vertex for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateTopic`] if `T` is already registered.
    pub(crate) fn register<T: TopicState>(&mut self, id: VertexId) -> Result<(), GraphError> {
        let key = TypeId::of::<T>();
        if self.by_type.contains_key(&key) {
            return Err(GraphError::DuplicateTopic(std::any::type_name::<T>()));
        }
        self.by_type.insert(key, id);
        Ok(())
    }

    /// Number of registered topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Returns true if no topic is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
