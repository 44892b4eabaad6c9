//! The graph: vertex ownership, topological scheduling, evaluation.
//!
//! A [`Graph`] owns every vertex (topics and detectors), maintains a
//! topological evaluation order across topology changes, and drives
//! single-input evaluation passes.
//!
//! Typical control flow:
//! - external events are translated into topic states and handed to
//!   [`push_data`](Graph::push_data);
//! - [`evaluate`](Graph::evaluate) runs in an event loop until
//!   [`has_data_pending`](Graph::has_data_pending) is false;
//! - after each pass, [`output_list`](Graph::output_list) is inspected for
//!   the states that changed and must be passed onwards.
//!
//! # Evaluation pass
//!
//! ```text
//!  push_data(T) ──▶ ┌──────────────────┐
//!                   │  GraphInputQueue │  FIFO, one consumed per pass
//!                   └────────┬─────────┘
//!                            ▼ inject into Topic<T>
//!  ┌─────────────────────────────────────────────────────┐
//!  │ traverse vertices in topological order              │
//!  │   Topic: passive                                    │
//!  │   Detector: runs iff a subscribed topic has data;   │
//!  │             publications land on downstream topics  │
//!  └────────────────────────┬────────────────────────────┘
//!                           ▼
//!               output list: snapshot of every
//!               topic that changed this pass
//! ```
//!
//! Exactly one queued input is consumed per pass, so every external event
//! is processed deterministically and to completion before the next is
//! admitted. Within a pass, published values are visible to strictly
//! later detectors in the order and never to earlier ones.

use std::collections::VecDeque;
use std::marker::PhantomData;

use fxhash::FxHashMap;

use crate::config::GraphConfig;
use crate::detector::{Detector, DetectorContext, DetectorHandle, Outputs};
use crate::error::{DetectorError, GraphError};
use crate::output::OutputItem;
use crate::queue::{GraphInputDispatcher, GraphInputQueue};
use crate::registry::TopicRegistry;
use crate::state::TopicState;
use crate::topic::{AnyTopic, Topic, TopicHandle};
use crate::vertex::{SearchState, VertexId, VertexKind, VertexSlot};

/// A graph of topics and detectors with input/output APIs.
///
/// The graph is the sole owner of its vertices; the registry and all
/// handles hold ids into its arena. All mutation goes through `&mut self`,
/// which is what enforces the single-threaded cooperative model at
/// compile time.
pub struct Graph {
    /// All vertices, keyed by id.
    vertices: FxHashMap<VertexId, VertexSlot>,
    /// Evaluation order: insertion order until sorted, then the
    /// topological order. Stable across unchanged graphs.
    order: Vec<VertexId>,
    /// Type-keyed topic lookup.
    registry: TopicRegistry,
    /// Pending external inputs.
    input_queue: GraphInputQueue,
    /// Snapshot of values published during the last completed pass.
    outputs: Vec<OutputItem>,
    /// Storage bounds and resolution mode.
    config: GraphConfig,
    /// Next vertex id; monotonic, never reused.
    next_vertex_id: u32,
    /// Set by any topology change; forces a re-sort before the next pass.
    needs_sort: bool,
}

impl Graph {
    /// Creates an empty graph in dynamic mode.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Creates an empty graph with the given storage bounds.
    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        tracing::debug!(?config, "graph initialized");
        let input_queue = GraphInputQueue::new(config.max_queue_depth);
        Self {
            vertices: FxHashMap::default(),
            order: Vec::new(),
            registry: TopicRegistry::new(),
            input_queue,
            outputs: Vec::new(),
            config,
            next_vertex_id: 0,
            needs_sort: false,
        }
    }

    // ---- Topic resolution ----

    /// Returns a handle to this graph's unique topic for `T`.
    ///
    /// In dynamic mode, the topic is created and registered on first
    /// resolve and added to the vertex set. In strict (capacity-bounded)
    /// mode a miss is an error: all topics must be pre-registered via
    /// [`register_topic`](Self::register_topic).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnresolvedTopic`] on a strict-mode miss, or
    /// [`GraphError::CapacityExceeded`] when creating the topic would
    /// exceed a configured bound.
    pub fn resolve_topic<T: TopicState>(&mut self) -> Result<TopicHandle<T>, GraphError> {
        let id = self.resolve_topic_vertex::<T>()?;
        Ok(TopicHandle {
            id,
            _marker: PhantomData,
        })
    }

    /// Explicitly creates and registers the topic for `T`.
    ///
    /// This is the setup path for strict mode, where every topic must
    /// exist before detectors are wired or data is pushed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateTopic`] if `T` is already
    /// registered, or [`GraphError::CapacityExceeded`] on a bound.
    pub fn register_topic<T: TopicState>(&mut self) -> Result<TopicHandle<T>, GraphError> {
        if self.registry.resolve::<T>().is_some() {
            return Err(GraphError::DuplicateTopic(std::any::type_name::<T>()));
        }
        let id = self.create_topic::<T>()?;
        Ok(TopicHandle {
            id,
            _marker: PhantomData,
        })
    }

    /// Borrows the topic for `T`, if one is registered.
    #[must_use]
    pub fn topic<T: TopicState>(&self) -> Option<&Topic<T>> {
        let id = self.registry.resolve::<T>()?;
        self.vertices
            .get(&id)?
            .topic_ref()?
            .as_any()
            .downcast_ref::<Topic<T>>()
    }

    pub(crate) fn resolve_topic_vertex<T: TopicState>(&mut self) -> Result<VertexId, GraphError> {
        if let Some(id) = self.registry.resolve::<T>() {
            return Ok(id);
        }
        if self.config.strict_topics {
            return Err(GraphError::UnresolvedTopic(std::any::type_name::<T>()));
        }
        self.create_topic::<T>()
    }

    fn create_topic<T: TopicState>(&mut self) -> Result<VertexId, GraphError> {
        self.check_vertex_capacity()?;
        if let Some(limit) = self.config.max_topics {
            if self.registry.len() >= limit {
                return Err(GraphError::CapacityExceeded {
                    what: "topics",
                    limit,
                });
            }
        }
        let id = self.allocate_vertex_id();
        self.registry.register::<T>(id)?;
        let name = std::any::type_name::<T>();
        self.vertices
            .insert(id, VertexSlot::new_topic(id, name, Box::new(Topic::<T>::new())));
        self.order.push(id);
        self.needs_sort = true;
        Ok(id)
    }

    // ---- Detector management ----

    /// Adds a detector built by `build` against this graph.
    ///
    /// The closure receives a wiring context and returns the detector
    /// value; subscriptions and publications declared through the context
    /// become the detector's edges. On error the half-built vertex and its
    /// edges are removed again (topics created along the way remain
    /// registered).
    ///
    /// ```
    /// use vigil_core::{DetectorError, Graph, Outputs, Subscriber, TopicState};
    ///
    /// #[derive(Clone, Debug)]
    /// struct Celsius(f64);
    /// impl TopicState for Celsius {}
    ///
    /// #[derive(Clone, Debug)]
    /// struct Overheated(bool);
    /// impl TopicState for Overheated {}
    ///
    /// struct OverheatingDetector {
    ///     output: vigil_core::Publication<Overheated>,
    /// }
    ///
    /// impl vigil_core::Detector for OverheatingDetector {}
    ///
    /// impl Subscriber<Celsius> for OverheatingDetector {
    ///     fn evaluate(&mut self, value: &Celsius, out: &mut Outputs) -> Result<(), DetectorError> {
    ///         out.publish(&self.output, Overheated(value.0 > 100.0));
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let mut graph = Graph::new();
    /// graph
    ///     .add_detector(|ctx| {
    ///         ctx.subscribe::<Celsius>()?;
    ///         Ok(OverheatingDetector { output: ctx.publish_to::<Overheated>()? })
    ///     })
    ///     .unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates wiring errors from the context (unresolved topics in
    /// strict mode, capacity bounds) and
    /// [`GraphError::CapacityExceeded`] when the vertex bound is reached.
    pub fn add_detector<D, F>(&mut self, build: F) -> Result<DetectorHandle, GraphError>
    where
        D: Detector,
        F: FnOnce(&mut DetectorContext<'_, D>) -> Result<D, GraphError>,
    {
        self.check_vertex_capacity()?;
        let id = self.allocate_vertex_id();
        let name = std::any::type_name::<D>();
        self.vertices.insert(id, VertexSlot::new_detector(id, name));
        self.order.push(id);
        self.needs_sort = true;

        let mut ctx = DetectorContext {
            graph: self,
            detector: id,
            dispatchers: Vec::new(),
            _marker: PhantomData,
        };
        let built = build(&mut ctx);
        let DetectorContext { dispatchers, .. } = ctx;

        match built {
            Ok(logic) => {
                if let Some(slot) = self.vertices.get_mut(&id).and_then(VertexSlot::detector_mut)
                {
                    slot.logic = Some(Box::new(logic));
                    slot.dispatchers = dispatchers;
                }
                tracing::debug!(detector = name, vertex = %id, "detector attached");
                Ok(DetectorHandle { id })
            }
            Err(error) => {
                self.remove_vertex_internal(id);
                Err(error)
            }
        }
    }

    /// Removes a detector and all of its edges from the graph.
    ///
    /// Topics the detector subscribed or published to stay owned by the
    /// graph until teardown. Must not be called from within a pass (the
    /// exclusive borrow enforces this).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexNotFound`] if the handle does not name
    /// a live detector of this graph.
    pub fn remove_detector(&mut self, handle: DetectorHandle) -> Result<(), GraphError> {
        match self.vertices.get(&handle.id) {
            Some(slot) if slot.kind() == VertexKind::Detector => {}
            _ => return Err(GraphError::VertexNotFound(handle.id)),
        }
        self.remove_vertex_internal(handle.id);
        Ok(())
    }

    // ---- Input ----

    /// Pushes one value for the topic of `T` onto the input queue.
    ///
    /// This is the only way data enters the graph. The value is delivered
    /// on a subsequent [`evaluate`](Self::evaluate) call, in FIFO order,
    /// exactly one queued value per pass.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::QueueOverflow`] when the queue is bounded and
    /// full (the caller may retry after draining passes), plus the
    /// resolution errors of [`resolve_topic`](Self::resolve_topic).
    pub fn push_data<T: TopicState>(&mut self, value: T) -> Result<(), GraphError> {
        let topic = self.resolve_topic_vertex::<T>()?;
        self.input_queue.enqueue(topic, value)
    }

    /// Returns true if at least one input is pending evaluation.
    ///
    /// Useful for flush-all-data loops, since each pass removes only a
    /// single input from the queue.
    #[must_use]
    pub fn has_data_pending(&self) -> bool {
        !self.input_queue.is_empty()
    }

    /// Evaluates the graph if data is pending; returns whether it did.
    ///
    /// # Errors
    ///
    /// Propagates the error of the inner [`evaluate`](Self::evaluate).
    pub fn evaluate_if_pending(&mut self) -> Result<bool, GraphError> {
        if self.has_data_pending() {
            self.evaluate()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ---- Evaluation ----

    /// Runs one evaluation pass, consuming at most one queued input.
    ///
    /// A pass re-sorts the graph if its topology changed, resets all
    /// per-pass state, injects the head of the input queue into its
    /// topic, traverses the vertices in topological order, and composes
    /// the output list from every topic that carries new values.
    ///
    /// A zero-input pass (empty queue) is permitted and produces an empty
    /// output list.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] if the topology has a
    /// directed cycle; the pass aborts before any detector runs and the
    /// queued input stays in place. Returns
    /// [`GraphError::DetectorFailure`] if a detector reported an error;
    /// the traversal and cleanup still complete, so the graph stays
    /// consistent and the output list reflects what was published.
    /// Returns [`GraphError::CapacityExceeded`] when a delivered input or
    /// a publication would exceed the configured per-topic value bound,
    /// and [`GraphError::QueueOverflow`] when a future publication does
    /// not fit the bounded input queue. [`GraphError::VertexNotFound`]
    /// and [`GraphError::TopicTypeMismatch`] indicate internal
    /// inconsistencies and are not expected in normal operation.
    pub fn evaluate(&mut self) -> Result<(), GraphError> {
        if self.needs_sort {
            self.topo_sort()?;
        }

        self.clear_traverse_state();
        self.outputs.clear();

        if let Some(dispatcher) = self.input_queue.dequeue_one() {
            self.execute_input(dispatcher)?;
        }

        let failure = self.traverse_vertices();
        self.compose_output_list();

        failure.map_or(Ok(()), Err)
    }

    /// Values published during the most recent completed pass, in
    /// topological order of their topics. Replaced when the next pass
    /// begins.
    #[must_use]
    pub fn output_list(&self) -> &[OutputItem] {
        &self.outputs
    }

    // ---- Inspection ----

    /// Number of vertices owned by the graph.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The current evaluation order. Until the first sort this is the
    /// insertion order; afterwards a topological order, stable across
    /// unchanged graphs.
    #[must_use]
    pub fn evaluation_order(&self) -> &[VertexId] {
        &self.order
    }

    /// Iterates over every vertex as an `(id, kind)` pair, in the current
    /// evaluation order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, VertexKind)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.vertices.get(id).map(|slot| (slot.id, slot.kind())))
    }

    /// The kind of a vertex, if it exists.
    #[must_use]
    pub fn vertex_kind(&self, id: VertexId) -> Option<VertexKind> {
        self.vertices.get(&id).map(VertexSlot::kind)
    }

    /// The type name behind a vertex, if it exists.
    #[must_use]
    pub fn vertex_name(&self, id: VertexId) -> Option<&'static str> {
        self.vertices.get(&id).map(|slot| slot.name)
    }

    /// The topic registry.
    #[must_use]
    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// The input queue (read-only).
    #[must_use]
    pub fn input_queue(&self) -> &GraphInputQueue {
        &self.input_queue
    }

    /// Returns true if the evaluation order is current (no topology
    /// change since the last sort).
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        !self.needs_sort
    }

    /// The graph's configuration.
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ---- Edge bookkeeping (wiring support) ----

    /// Inserts the edge `from -> to`; idempotent on the pair.
    pub(crate) fn insert_edge(&mut self, from: VertexId, to: VertexId) -> Result<(), GraphError> {
        if from == to {
            let name = self.vertices.get(&from).map_or("unknown", |slot| slot.name);
            return Err(GraphError::CycleDetected(name));
        }
        if !self.vertices.contains_key(&to) {
            return Err(GraphError::VertexNotFound(to));
        }
        let Some(source) = self.vertices.get_mut(&from) else {
            return Err(GraphError::VertexNotFound(from));
        };
        if source.out_edges.contains(&to) {
            return Ok(());
        }
        source.out_edges.push(to);
        if let Some(target) = self.vertices.get_mut(&to) {
            target.in_edges.push(from);
        }
        self.needs_sort = true;
        Ok(())
    }

    /// Records the deferred-delivery edge `from -> to`; idempotent, not
    /// part of the sort.
    pub(crate) fn mark_future_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
    ) -> Result<(), GraphError> {
        if !self.vertices.contains_key(&to) {
            return Err(GraphError::VertexNotFound(to));
        }
        let Some(source) = self.vertices.get_mut(&from) else {
            return Err(GraphError::VertexNotFound(from));
        };
        if source.future_out_edges.contains(&to) {
            return Ok(());
        }
        source.future_out_edges.push(to);
        if let Some(target) = self.vertices.get_mut(&to) {
            target.future_in_edges.push(from);
        }
        Ok(())
    }

    // ---- Internals ----

    fn allocate_vertex_id(&mut self) -> VertexId {
        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id += 1;
        id
    }

    fn check_vertex_capacity(&self) -> Result<(), GraphError> {
        if let Some(limit) = self.config.max_vertices {
            if self.vertices.len() >= limit {
                return Err(GraphError::CapacityExceeded {
                    what: "vertices",
                    limit,
                });
            }
        }
        Ok(())
    }

    fn remove_vertex_internal(&mut self, id: VertexId) {
        let Some(slot) = self.vertices.remove(&id) else {
            return;
        };
        for successor in &slot.out_edges {
            if let Some(target) = self.vertices.get_mut(successor) {
                target.in_edges.retain(|v| *v != id);
            }
        }
        for predecessor in &slot.in_edges {
            if let Some(source) = self.vertices.get_mut(predecessor) {
                source.out_edges.retain(|v| *v != id);
            }
        }
        for successor in &slot.future_out_edges {
            if let Some(target) = self.vertices.get_mut(successor) {
                target.future_in_edges.retain(|v| *v != id);
            }
        }
        for predecessor in &slot.future_in_edges {
            if let Some(source) = self.vertices.get_mut(predecessor) {
                source.future_out_edges.retain(|v| *v != id);
            }
        }
        self.order.retain(|v| *v != id);
        self.needs_sort = true;
    }

    /// Depth-first post-order topological sort.
    ///
    /// Starts from each unvisited vertex in ascending id order (ids are
    /// monotonic, so this is insertion order) and prepends vertices as
    /// their visits finish, yielding a reverse post-order list. Rooting
    /// at insertion order makes the result a pure function of the
    /// topology, so an unchanged graph always re-sorts to the same
    /// order. A back edge (an `InProgress` vertex reached again) means
    /// the graph has a cycle.
    fn topo_sort(&mut self) -> Result<(), GraphError> {
        for slot in self.vertices.values_mut() {
            slot.state = SearchState::Clear;
        }

        let mut roots: Vec<VertexId> = self.vertices.keys().copied().collect();
        roots.sort_unstable();

        let mut sorted: VecDeque<VertexId> = VecDeque::with_capacity(self.vertices.len());
        for root in roots {
            if self.search_state(root)? == SearchState::Clear {
                self.depth_first_visit(root, &mut sorted)?;
            }
        }

        self.order = sorted.into_iter().collect();
        self.needs_sort = false;
        tracing::debug!(vertices = self.order.len(), "evaluation order re-sorted");
        Ok(())
    }

    fn depth_first_visit(
        &mut self,
        root: VertexId,
        sorted: &mut VecDeque<VertexId>,
    ) -> Result<(), GraphError> {
        let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];
        self.set_search_state(root, SearchState::InProgress);

        while let Some(&(vertex, cursor)) = stack.last() {
            let next = self
                .vertices
                .get(&vertex)
                .ok_or(GraphError::VertexNotFound(vertex))?
                .out_edges
                .get(cursor)
                .copied();

            match next {
                Some(successor) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }
                    match self.search_state(successor)? {
                        SearchState::Clear => {
                            self.set_search_state(successor, SearchState::InProgress);
                            stack.push((successor, 0));
                        }
                        SearchState::InProgress => {
                            let name =
                                self.vertices.get(&successor).map_or("unknown", |s| s.name);
                            tracing::error!(vertex = %successor, name, "cycle detected");
                            return Err(GraphError::CycleDetected(name));
                        }
                        SearchState::Done => {}
                    }
                }
                None => {
                    self.set_search_state(vertex, SearchState::Done);
                    sorted.push_front(vertex);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    fn search_state(&self, id: VertexId) -> Result<SearchState, GraphError> {
        self.vertices
            .get(&id)
            .map(|slot| slot.state)
            .ok_or(GraphError::VertexNotFound(id))
    }

    fn set_search_state(&mut self, id: VertexId, state: SearchState) {
        if let Some(slot) = self.vertices.get_mut(&id) {
            slot.state = state;
        }
    }

    /// Resets search states and topic buffers for a fresh pass.
    fn clear_traverse_state(&mut self) {
        for slot in self.vertices.values_mut() {
            slot.state = SearchState::Clear;
            if let Some(topic) = slot.topic_mut() {
                topic.clear_pass_state();
            }
        }
    }

    fn execute_input(&mut self, dispatcher: GraphInputDispatcher) -> Result<(), GraphError> {
        if let Some(limit) = self.config.max_topic_values {
            let count = self
                .vertices
                .get(&dispatcher.topic)
                .and_then(VertexSlot::topic_ref)
                .map_or(0, AnyTopic::value_count);
            if count >= limit {
                return Err(GraphError::CapacityExceeded {
                    what: "topic values",
                    limit,
                });
            }
        }
        let Some(slot) = self.vertices.get_mut(&dispatcher.topic) else {
            return Err(GraphError::VertexNotFound(dispatcher.topic));
        };
        let Some(topic) = slot.topic_mut() else {
            return Err(GraphError::TopicTypeMismatch(dispatcher.state_name));
        };
        topic.publish_erased(dispatcher.value)
    }

    /// Visits the sorted vertex list once, front to back.
    ///
    /// A failing vertex does not stop the traversal; the first failure is
    /// returned after the pass completes so the graph stays consistent.
    fn traverse_vertices(&mut self) -> Option<GraphError> {
        let mut first_failure = None;
        for idx in 0..self.order.len() {
            let id = self.order[idx];
            if let Err(error) = self.process_vertex(id) {
                tracing::warn!(vertex = %id, %error, "vertex processing failed");
                if first_failure.is_none() {
                    first_failure = Some(error);
                }
            }
        }
        first_failure
    }

    /// Processes one vertex of the pass.
    ///
    /// Topics are passive. A detector runs iff at least one subscribed
    /// topic has a new value; its staged publications are installed
    /// immediately afterwards, which is what makes them visible to the
    /// detectors scheduled later in the order.
    fn process_vertex(&mut self, id: VertexId) -> Result<(), GraphError> {
        let runnable = {
            let slot = self
                .vertices
                .get(&id)
                .ok_or(GraphError::VertexNotFound(id))?;
            match slot.detector_ref() {
                None => return Ok(()),
                Some(detector) => detector
                    .dispatchers
                    .iter()
                    .any(|dispatcher| self.topic_has_new_value(dispatcher.topic)),
            }
        };
        if !runnable {
            return Ok(());
        }

        // Move the logic out of the arena so topic storage can be
        // borrowed while the detector runs (take/put-back).
        let (name, mut logic) = {
            let Some(slot) = self.vertices.get_mut(&id) else {
                return Err(GraphError::VertexNotFound(id));
            };
            let name = slot.name;
            let Some(detector) = slot.detector_mut() else {
                return Ok(());
            };
            match detector.logic.take() {
                Some(logic) => (name, logic),
                None => return Ok(()),
            }
        };

        let mut out = Outputs::new();
        logic.begin(&mut out);

        let mut detector_error: Option<DetectorError> = None;
        let mut internal_error: Option<GraphError> = None;
        let dispatcher_count = self
            .vertices
            .get(&id)
            .and_then(VertexSlot::detector_ref)
            .map_or(0, |detector| detector.dispatchers.len());

        for index in 0..dispatcher_count {
            let Some(slot) = self.vertices.get(&id) else {
                internal_error = Some(GraphError::VertexNotFound(id));
                break;
            };
            let Some(detector) = slot.detector_ref() else {
                break;
            };
            let dispatcher = &detector.dispatchers[index];
            let topic_id = dispatcher.topic;
            let Some(topic) = self.vertices.get(&topic_id).and_then(VertexSlot::topic_ref)
            else {
                internal_error = Some(GraphError::VertexNotFound(topic_id));
                break;
            };
            if !topic.has_new_value() {
                continue;
            }
            if let Err(error) = dispatcher.dispatch(topic, logic.as_any_mut(), &mut out) {
                detector_error = Some(error);
                break;
            }
        }

        if detector_error.is_none() && internal_error.is_none() {
            if let Err(error) = logic.complete(&mut out) {
                detector_error = Some(error);
            }
        }

        if let Some(slot) = self.vertices.get_mut(&id).and_then(VertexSlot::detector_mut) {
            slot.logic = Some(logic);
        }

        // Publications made before a failure are kept; partial passes are
        // not rolled back.
        let drained = self.apply_outputs(out);

        if let Some(source) = detector_error {
            return Err(GraphError::DetectorFailure {
                detector: name,
                source,
            });
        }
        if let Some(error) = internal_error {
            return Err(error);
        }
        drained
    }

    /// Installs staged publications into their topics and enqueues future
    /// publications as graph inputs.
    fn apply_outputs(&mut self, out: Outputs) -> Result<(), GraphError> {
        let Outputs { staged, future } = out;
        for value in staged {
            if let Some(limit) = self.config.max_topic_values {
                let count = self
                    .vertices
                    .get(&value.topic)
                    .and_then(VertexSlot::topic_ref)
                    .map_or(0, AnyTopic::value_count);
                if count >= limit {
                    return Err(GraphError::CapacityExceeded {
                        what: "topic values",
                        limit,
                    });
                }
            }
            let Some(slot) = self.vertices.get_mut(&value.topic) else {
                return Err(GraphError::VertexNotFound(value.topic));
            };
            let Some(topic) = slot.topic_mut() else {
                return Err(GraphError::TopicTypeMismatch(value.state_name));
            };
            topic.publish_erased(value.value)?;
        }
        for value in future {
            self.input_queue.enqueue_dispatcher(GraphInputDispatcher {
                topic: value.topic,
                value: value.value,
                state_name: value.state_name,
            })?;
        }
        Ok(())
    }

    fn topic_has_new_value(&self, id: VertexId) -> bool {
        self.vertices
            .get(&id)
            .and_then(VertexSlot::topic_ref)
            .is_some_and(AnyTopic::has_new_value)
    }

    /// Snapshots every topic that changed this pass, in topological
    /// order, publish order within a topic.
    fn compose_output_list(&mut self) {
        for idx in 0..self.order.len() {
            let id = self.order[idx];
            if let Some(topic) = self.vertices.get(&id).and_then(VertexSlot::topic_ref) {
                if topic.has_new_value() {
                    topic.snapshot_into(id, &mut self.outputs);
                }
            }
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("vertex_count", &self.vertices.len())
            .field("topic_count", &self.registry.len())
            .field("pending_inputs", &self.input_queue.len())
            .field("needs_sort", &self.needs_sort)
            .finish_non_exhaustive()
    }
}
