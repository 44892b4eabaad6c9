//! One-pass lag over a topic, for closing feedback loops.
//!
//! `Lag<T>` republishes every value of the topic for `T` as a
//! [`Lagged<T>`] delivered on a later pass through the input queue:
//!
//! ```text
//!   Topic<T> ──▶ Lag<T> ──(future publish)──▶ Topic<Lagged<T>>
//! ```
//!
//! Because the future edge is excluded from the topological sort, a
//! detector may subscribe to `Lagged<T>` while (transitively) publishing
//! to `T` without creating a cycle, which is the expressive way to build
//! feedback loops instead of ad-hoc detector state.

use crate::detector::{Detector, DetectorHandle, FuturePublication, Outputs, Subscriber};
use crate::error::{DetectorError, GraphError};
use crate::graph::Graph;
use crate::state::TopicState;

/// The one-pass-delayed copy of a `T` produced by [`Lag`].
#[derive(Clone, Debug)]
pub struct Lagged<T: TopicState> {
    /// The value observed on the previous delivering pass.
    pub data: T,
}

impl<T: TopicState> TopicState for Lagged<T> {}

/// Utility detector producing a [`Lagged<T>`] for every `T`.
pub struct Lag<T: TopicState> {
    output: FuturePublication<Lagged<T>>,
}

impl<T: TopicState> Lag<T> {
    /// Attaches a `Lag<T>` detector to `graph`.
    ///
    /// # Errors
    ///
    /// Propagates topic resolution errors from the wiring context.
    pub fn attach(graph: &mut Graph) -> Result<DetectorHandle, GraphError> {
        graph.add_detector(|ctx| {
            ctx.subscribe::<T>()?;
            Ok(Self {
                output: ctx.publish_on_future::<Lagged<T>>()?,
            })
        })
    }
}

impl<T: TopicState> Detector for Lag<T> {}

impl<T: TopicState> Subscriber<T> for Lag<T> {
    fn evaluate(&mut self, value: &T, out: &mut Outputs) -> Result<(), DetectorError> {
        out.publish_on_future(
            &self.output,
            Lagged {
                data: value.clone(),
            },
        );
        Ok(())
    }
}
