//! Common supertraits for distributed protocols.

use std::error::Error as StdError;
use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;

use crate::fault_log::{FaultLog, FaultT};
use crate::TargetedMessage;

/// A peer node's unique identifier.
pub trait NodeIdT: Eq + Ord + Clone + Debug + Hash + Send + Sync {}
impl<N> NodeIdT for N where N: Eq + Ord + Clone + Debug + Hash + Send + Sync {}

/// Messages.
pub trait Message: Debug + Send + Sync {}
impl<M> Message for M where M: Debug + Send + Sync {}

/// Result of one step of the local state machine of a distributed protocol. Such a result
/// should be used and never discarded by the client of the protocol.
#[must_use = "The protocol step result must be used."]
#[derive(Debug)]
pub struct Step<M, O, N, F: FaultT> {
    /// The values delivered by this step.
    pub output: Vec<O>,
    /// A list of nodes that are not following the protocol, together with information about
    /// the detected misbehavior.
    pub fault_log: FaultLog<N, F>,
    /// A list of messages that must be sent to other nodes.
    pub messages: Vec<TargetedMessage<M, N>>,
}

impl<M, O, N, F: FaultT> Default for Step<M, O, N, F> {
    fn default() -> Self {
        Step {
            output: Vec::default(),
            fault_log: FaultLog::default(),
            messages: Vec::default(),
        }
    }
}

impl<M, O, N, F: FaultT> Step<M, O, N, F> {
    /// Adds the outputs, fault logs and messages of `other` to `self`.
    pub fn extend(&mut self, other: Self) {
        self.output.extend(other.output);
        self.fault_log.extend(other.fault_log);
        self.messages.extend(other.messages);
    }

    /// Returns `true` if there are no messages, faults or outputs.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.fault_log.is_empty() && self.messages.is_empty()
    }
}

/// The step result of a `ConsensusProtocol` implementation.
pub type CpStep<D> = Step<
    <D as ConsensusProtocol>::Message,
    <D as ConsensusProtocol>::Output,
    <D as ConsensusProtocol>::NodeId,
    <D as ConsensusProtocol>::FaultKind,
>;

/// A distributed protocol that defines a message flow.
///
/// Implementations are driven entirely by the host: it calls `handle_input` with local
/// requests and `handle_message` with every message received from the transport, one at a
/// time, and routes the messages of the returned step. The random number generator passed
/// into both handlers is owned by the host; seeding it once per process keeps the sample
/// draws well mixed.
pub trait ConsensusProtocol: Send + Sync {
    /// Unique node identifier.
    type NodeId: NodeIdT;
    /// The input provided by the user.
    type Input;
    /// The output type.
    type Output;
    /// The messages that need to be exchanged between the instances in the participating
    /// nodes.
    type Message: Message;
    /// The errors that can occur during execution.
    type Error: StdError;
    /// The kinds of message faults that can be detected during execution.
    type FaultKind: FaultT;

    /// Handles an input provided by the user, and returns the resulting step.
    fn handle_input<R: Rng>(
        &mut self,
        input: Self::Input,
        rng: &mut R,
    ) -> Result<CpStep<Self>, Self::Error>
    where
        Self: Sized;

    /// Handles a message received from node `sender_id`.
    fn handle_message<R: Rng>(
        &mut self,
        sender_id: &Self::NodeId,
        message: Self::Message,
        rng: &mut R,
    ) -> Result<CpStep<Self>, Self::Error>
    where
        Self: Sized;

    /// Returns `true` if execution has completed and this instance can be dropped.
    fn terminated(&self) -> bool;

    /// Returns this node's own ID.
    fn our_id(&self) -> &Self::NodeId;
}
