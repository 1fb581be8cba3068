use serde::{Deserialize, Serialize};

/// A value proposed for delivery.
pub type Value = i64;

/// A per-author, monotonically increasing sequence number.
pub type SeqNumber = i64;

/// Identifies one broadcast attempt: the author, the author's sequence number for it, and
/// the proposed value.
///
/// A broadcast is addressed by `(author, seq)`; the value is asserted invariant for that
/// pair. Two attempts that share the pair but differ in the value constitute a duplicated
/// sequence number attack by the author.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MessageData<N> {
    /// The process that authored the broadcast.
    pub author: N,
    /// The author's sequence number for this broadcast.
    pub seq: SeqNumber,
    /// The proposed value.
    pub value: Value,
}

/// The message kinds exchanged during a scalable broadcast.
///
/// Every message carries the full `MessageData` of the broadcast it belongs to, so a
/// single message suffices to make a process aware of the attempt and set up its local
/// state for it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Message<N> {
    /// Asks the sender to be included in the receiver's gossip fan-out for this broadcast.
    GossipSubscribe(MessageData<N>),
    /// Disseminates the author's proposal along the gossip overlay.
    Gossip(MessageData<N>),
    /// Asks to receive the `Echo` the receiver emits for this broadcast.
    EchoSubscribe(MessageData<N>),
    /// A copy of the gossiped value, emitted once per broadcast to all echo subscribers.
    Echo(MessageData<N>),
    /// Asks to receive every `Ready` the receiver emits for this broadcast. Used for both
    /// the ready and the delivery sample; the receiver cannot and need not distinguish.
    ReadySubscribe(MessageData<N>),
    /// Indicates that the sender is prepared to deliver the value.
    Ready(MessageData<N>),
}

impl<N> Message<N> {
    /// Returns the broadcast attempt this message refers to.
    pub fn data(&self) -> &MessageData<N> {
        match self {
            Message::GossipSubscribe(data)
            | Message::Gossip(data)
            | Message::EchoSubscribe(data)
            | Message::Echo(data)
            | Message::ReadySubscribe(data)
            | Message::Ready(data) => data,
        }
    }
}
