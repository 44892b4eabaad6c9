//! Detectors: the computation vertices of a graph.
//!
//! A detector declares, at construction time against a graph, the topics
//! it subscribes to and the topics it publishes to. Wiring happens through
//! a [`DetectorContext`] handed to the constructor closure of
//! [`Graph::add_detector`](crate::Graph::add_detector): each
//! `subscribe::<T>()` installs a subscription dispatcher and an incoming
//! edge, each `publish_to::<T>()` installs an outgoing edge and yields a
//! typed [`Publication`] handle.
//!
//! During a pass the scheduler runs a detector only when at least one of
//! its subscribed topics carries a new value. The run is
//! [`begin_evaluation`](Detector::begin_evaluation), one dispatch per
//! subscription feeding buffered values in publish order, then
//! [`complete_evaluation`](Detector::complete_evaluation). Values the
//! detector publishes are staged in [`Outputs`] and installed into their
//! topics immediately after the run, which makes them visible to strictly
//! later detectors in the topological order and never to earlier ones.

use std::any::Any;
use std::marker::PhantomData;

use crate::error::{DetectorError, GraphError};
use crate::graph::Graph;
use crate::state::TopicState;
use crate::topic::{AnyTopic, Topic};
use crate::vertex::VertexId;

/// A unit of logic in a graph.
///
/// Implementations additionally implement [`Subscriber<T>`] for every
/// state type they subscribe to. Both hooks default to no-ops; detectors
/// that summarize across multiple values typically accumulate in
/// [`Subscriber::evaluate`] and publish from `complete_evaluation`.
pub trait Detector: Send + 'static {
    /// Called before any `evaluate` call of the pass.
    fn begin_evaluation(&mut self, _out: &mut Outputs) {}

    /// Called after all `evaluate` calls of the pass.
    ///
    /// # Errors
    ///
    /// An error is wrapped in
    /// [`GraphError::DetectorFailure`](crate::GraphError::DetectorFailure)
    /// and returned from the pass after cleanup completes.
    fn complete_evaluation(&mut self, _out: &mut Outputs) -> Result<(), DetectorError> {
        Ok(())
    }
}

/// Per-subscription evaluation entry point.
///
/// Implemented once per subscribed state type; called once per value
/// buffered in the topic this pass, in publish order.
pub trait Subscriber<T: TopicState> {
    /// Reacts to one subscribed value.
    ///
    /// # Errors
    ///
    /// An error aborts the remaining dispatches of this detector for the
    /// pass and is reported as a detector failure.
    fn evaluate(&mut self, value: &T, out: &mut Outputs) -> Result<(), DetectorError>;
}

/// Handle to a detector vertex, returned by
/// [`Graph::add_detector`](crate::Graph::add_detector).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorHandle {
    pub(crate) id: VertexId,
}

impl DetectorHandle {
    /// The vertex id of the detector.
    #[must_use]
    pub fn id(&self) -> VertexId {
        self.id
    }
}

/// Declared same-pass publication to the topic for `T`.
///
/// Obtained from [`DetectorContext::publish_to`]; required by
/// [`Outputs::publish`]. Holding the handle is the proof that the edge
/// detector -> topic exists.
#[derive(Debug)]
pub struct Publication<T: TopicState> {
    pub(crate) topic: VertexId,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

impl<T: TopicState> Clone for Publication<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: TopicState> Copy for Publication<T> {}

/// Declared deferred publication to the topic for `T`.
///
/// Values published through this handle are enqueued on the graph input
/// queue and delivered on a subsequent pass, one per pass. Future edges
/// are excluded from the topological sort, which is what makes feedback
/// loops expressible without a cycle.
#[derive(Debug)]
pub struct FuturePublication<T: TopicState> {
    pub(crate) topic: VertexId,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

impl<T: TopicState> Clone for FuturePublication<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: TopicState> Copy for FuturePublication<T> {}

/// A value staged by a detector, not yet installed in its topic.
pub(crate) struct StagedValue {
    pub(crate) topic: VertexId,
    pub(crate) value: Box<dyn Any + Send>,
    pub(crate) state_name: &'static str,
}

/// Staging surface detectors publish through during a pass.
///
/// Same-pass publications are installed into their topics right after the
/// detector runs; future publications are enqueued as graph inputs.
#[derive(Default)]
pub struct Outputs {
    pub(crate) staged: Vec<StagedValue>,
    pub(crate) future: Vec<StagedValue>,
}

impl Outputs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Publishes `value` to the topic behind `publication` for this pass.
    pub fn publish<T: TopicState>(&mut self, publication: &Publication<T>, value: T) {
        self.staged.push(StagedValue {
            topic: publication.topic,
            value: Box::new(value),
            state_name: std::any::type_name::<T>(),
        });
    }

    /// Defers `value` to a future pass via the graph input queue.
    pub fn publish_on_future<T: TopicState>(
        &mut self,
        publication: &FuturePublication<T>,
        value: T,
    ) {
        self.future.push(StagedValue {
            topic: publication.topic,
            value: Box::new(value),
            state_name: std::any::type_name::<T>(),
        });
    }
}

impl std::fmt::Debug for Outputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outputs")
            .field("staged", &self.staged.len())
            .field("future", &self.future.len())
            .finish()
    }
}

/// Object-safe erasure of a concrete detector type.
///
/// The blanket impl lets the graph store any `D: Detector` uniformly
/// while subscription dispatchers recover `&mut D` by downcast.
pub(crate) trait ErasedDetector: Send {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn begin(&mut self, out: &mut Outputs);

    fn complete(&mut self, out: &mut Outputs) -> Result<(), DetectorError>;
}

impl<D: Detector> ErasedDetector for D {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn begin(&mut self, out: &mut Outputs) {
        self.begin_evaluation(out);
    }

    fn complete(&mut self, out: &mut Outputs) -> Result<(), DetectorError> {
        self.complete_evaluation(out)
    }
}

/// Wires one publisher topic to one subscriber.
///
/// The thunk is monomorphized at subscribe time, when both the state type
/// and the concrete detector type are statically known; at dispatch time
/// it recovers them from the type-erased slots.
pub(crate) struct SubscriptionDispatcher {
    pub(crate) topic: VertexId,
    dispatch: fn(&dyn AnyTopic, &mut dyn Any, &mut Outputs) -> Result<(), DetectorError>,
}

impl SubscriptionDispatcher {
    pub(crate) fn new<T, D>(topic: VertexId) -> Self
    where
        T: TopicState,
        D: Detector + Subscriber<T>,
    {
        Self {
            topic,
            dispatch: dispatch_thunk::<T, D>,
        }
    }

    /// Feeds each buffered value of `topic` to the subscriber.
    pub(crate) fn dispatch(
        &self,
        topic: &dyn AnyTopic,
        detector: &mut dyn Any,
        out: &mut Outputs,
    ) -> Result<(), DetectorError> {
        (self.dispatch)(topic, detector, out)
    }
}

impl std::fmt::Debug for SubscriptionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionDispatcher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

fn dispatch_thunk<T, D>(
    topic: &dyn AnyTopic,
    detector: &mut dyn Any,
    out: &mut Outputs,
) -> Result<(), DetectorError>
where
    T: TopicState,
    D: Detector + Subscriber<T>,
{
    let Some(topic) = topic.as_any().downcast_ref::<Topic<T>>() else {
        return Err("subscription dispatcher bound to a topic of another type".into());
    };
    let Some(detector) = detector.downcast_mut::<D>() else {
        return Err("subscription dispatcher bound to a detector of another type".into());
    };
    for value in topic.current_values() {
        detector.evaluate(value, out)?;
    }
    Ok(())
}

/// Runtime payload of a detector vertex.
///
/// `logic` is an `Option` so the scheduler can move the detector out of
/// the arena while it runs against borrowed topic storage, then put it
/// back (the take/put-back pattern).
pub(crate) struct DetectorSlot {
    pub(crate) logic: Option<Box<dyn ErasedDetector>>,
    pub(crate) dispatchers: Vec<SubscriptionDispatcher>,
}

impl DetectorSlot {
    pub(crate) fn empty() -> Self {
        Self {
            logic: None,
            dispatchers: Vec::new(),
        }
    }
}

/// Wiring surface handed to a detector constructor by
/// [`Graph::add_detector`](crate::Graph::add_detector).
///
/// The context records subscriptions and publications against the vertex
/// allocated for the detector under construction; topics are resolved (and
/// in dynamic mode created) on demand.
pub struct DetectorContext<'g, D> {
    pub(crate) graph: &'g mut Graph,
    pub(crate) detector: VertexId,
    pub(crate) dispatchers: Vec<SubscriptionDispatcher>,
    pub(crate) _marker: PhantomData<fn() -> D>,
}

impl<D: Detector> DetectorContext<'_, D> {
    /// Declares a subscription to the topic for `T`.
    ///
    /// Installs the incoming edge topic -> detector and a dispatcher that
    /// will feed buffered values to `Subscriber::<T>::evaluate`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnresolvedTopic`] in strict mode when the
    /// topic was not pre-registered, or
    /// [`GraphError::CapacityExceeded`] when creating the topic would
    /// exceed a configured bound.
    pub fn subscribe<T: TopicState>(&mut self) -> Result<(), GraphError>
    where
        D: Subscriber<T>,
    {
        let topic = self.graph.resolve_topic_vertex::<T>()?;
        self.graph.insert_edge(topic, self.detector)?;
        self.dispatchers.push(SubscriptionDispatcher::new::<T, D>(topic));
        Ok(())
    }

    /// Declares a same-pass publication to the topic for `T`.
    ///
    /// Installs the outgoing edge detector -> topic.
    ///
    /// # Errors
    ///
    /// Same conditions as [`subscribe`](Self::subscribe).
    pub fn publish_to<T: TopicState>(&mut self) -> Result<Publication<T>, GraphError> {
        let topic = self.graph.resolve_topic_vertex::<T>()?;
        self.graph.insert_edge(self.detector, topic)?;
        Ok(Publication {
            topic,
            _marker: PhantomData,
        })
    }

    /// Declares a deferred publication to the topic for `T`.
    ///
    /// The future edge is recorded for inspection but does not constrain
    /// the topological sort.
    ///
    /// # Errors
    ///
    /// Same conditions as [`subscribe`](Self::subscribe).
    pub fn publish_on_future<T: TopicState>(
        &mut self,
    ) -> Result<FuturePublication<T>, GraphError> {
        let topic = self.graph.resolve_topic_vertex::<T>()?;
        self.graph.mark_future_edge(self.detector, topic)?;
        Ok(FuturePublication {
            topic,
            _marker: PhantomData,
        })
    }
}
