//! The capability marking a type as a legal topic payload.

use std::any::Any;
use std::fmt;

/// Public identifier for topic states that cross the graph boundary.
///
/// Most topic states are anonymous: they only travel between detectors
/// inside one graph. States that are meant to be handed to (or received
/// from) the outside can carry an application-defined id so external code
/// can recognize them in the output list without downcasting every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicStateId(pub i32);

impl TopicStateId {
    /// Id of states that are only used within the graph.
    pub const ANONYMOUS: TopicStateId = TopicStateId(-1);
}

impl fmt::Display for TopicStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicStateId({})", self.0)
    }
}

/// Marker capability for types admissible as topic payloads.
///
/// A type is a legal payload if it opts into this trait. The supertraits
/// carry what the engine needs: `Clone` for output snapshots, `Debug` for
/// diagnostics, `Any + Send + Sync` for the type-erased storage behind
/// topics and output items.
///
/// Topic states should be self-explanatory, self-contained data carriers;
/// a subscriber shouldn't need anything else to act on one.
///
/// ```
/// use vigil_core::TopicState;
///
/// #[derive(Clone, Debug)]
/// struct TemperatureSample {
///     celsius: f64,
/// }
///
/// impl TopicState for TemperatureSample {}
/// ```
pub trait TopicState: Any + Clone + fmt::Debug + Send + Sync {
    /// Returns the public id for this state.
    ///
    /// Defaults to [`TopicStateId::ANONYMOUS`]; override for states that
    /// are part of the application's public number space.
    fn state_id(&self) -> TopicStateId {
        TopicStateId::ANONYMOUS
    }
}
