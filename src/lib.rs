//! # Contagion
//!
//! Probabilistic Byzantine reliable broadcast in the "scalable" fashion: instead of
//! waiting for acknowledgements from a quorum of the whole network, every process draws
//! small random samples of the participants and counts protocol messages from those
//! samples only. With suitably chosen sample sizes and thresholds, all correct processes
//! deliver the same value for each broadcast with high probability, while each of them
//! talks to only a handful of peers.
//!
//! The crate provides the per-process protocol engine as a pure state machine: the host
//! feeds it inputs and inbound messages, and every call returns a [`Step`] containing the
//! values delivered so far, a log of observed peer misbehavior, and the messages that must
//! be handed to the transport. The engine itself never performs I/O, spawns no tasks and
//! keeps no clocks; message loss is compensated statistically by the sampling regime, not
//! by retries.
//!
//! The protocol itself lives in the [`scalable`] module; see its documentation for the
//! message flow.
//!
//! [`Step`]: struct.Step.html
//! [`scalable`]: scalable/index.html

#![warn(missing_docs)]

mod fault_log;
mod network_info;
mod sampling;
pub mod scalable;
mod traits;

pub use crate::fault_log::{Fault, FaultLog, FaultT};
pub use crate::network_info::NetworkInfo;
pub use crate::traits::{ConsensusProtocol, CpStep, Message, NodeIdT, Step};

use std::collections::BTreeSet;

/// The intended recipient(s) of a protocol message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Target<N> {
    /// The message must be sent to the given node.
    Node(N),
    /// The message must be sent to every node in the set.
    Nodes(BTreeSet<N>),
}

impl<N> Target<N> {
    /// Returns a `TargetedMessage` with this target, and the given message.
    pub fn message<M>(self, message: M) -> TargetedMessage<M, N> {
        TargetedMessage {
            target: self,
            message,
        }
    }
}

/// A message along with its intended recipient(s).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TargetedMessage<M, N> {
    /// The node or set of nodes the message is addressed to.
    pub target: Target<N>,
    /// The content of the message.
    pub message: M,
}
