//! Graph configuration: storage bounds and topic resolution mode.

/// Default input queue capacity used by [`GraphConfig::bounded`].
pub const DEFAULT_BOUNDED_QUEUE_DEPTH: usize = 64;

/// Configuration for a graph's storage bounds.
///
/// The default configuration is the dynamic mode: unbounded storage and
/// lazy topic creation on first resolve. The bounded mode fixes every
/// bound at graph construction and requires all topics to be registered
/// up front; the same evaluation core runs against either.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Upper bound on the vertex count, or `None` for unbounded.
    pub max_vertices: Option<usize>,
    /// Upper bound on the number of registered topics.
    pub max_topics: Option<usize>,
    /// Upper bound on the input queue depth. Exceeding it makes
    /// `push_data` report `QueueOverflow`; the caller may retry later.
    pub max_queue_depth: Option<usize>,
    /// Upper bound on the number of values buffered per topic per pass.
    pub max_topic_values: Option<usize>,
    /// When true, `resolve_topic` does not create topics on miss; all
    /// topics must be pre-registered via `register_topic`.
    pub strict_topics: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::dynamic()
    }
}

impl GraphConfig {
    /// Dynamic mode: unbounded storage, topics created on first resolve.
    #[must_use]
    pub fn dynamic() -> Self {
        Self {
            max_vertices: None,
            max_topics: None,
            max_queue_depth: None,
            max_topic_values: None,
            strict_topics: false,
        }
    }

    /// Capacity-bounded mode with the given vertex and topic limits and
    /// the default queue depth.
    #[must_use]
    pub fn bounded(max_vertices: usize, max_topics: usize) -> Self {
        Self {
            max_vertices: Some(max_vertices),
            max_topics: Some(max_topics),
            max_queue_depth: Some(DEFAULT_BOUNDED_QUEUE_DEPTH),
            max_topic_values: None,
            strict_topics: true,
        }
    }

    /// Sets the input queue depth bound.
    #[must_use]
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = Some(depth);
        self
    }

    /// Sets the per-topic buffer depth bound.
    #[must_use]
    pub fn with_topic_values(mut self, depth: usize) -> Self {
        self.max_topic_values = Some(depth);
        self
    }
}
