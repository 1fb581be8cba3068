use std::collections::{BTreeMap, BTreeSet};

use super::message::{MessageData, Value};

/// Everything a process keeps about one `(author, seq)` broadcast.
///
/// Created lazily on the first message referring to the pair and retained for the rest of
/// the run: late subscribers rely on the cached gossip and echo and on the set of `Ready`
/// values already sent being replayable at any time.
///
/// All bookkeeping is monotone — set insertions and counter increments only — which makes
/// the protocol insensitive to transport reordering. The four samples are drawn once at
/// creation; only `gossip_sample` grows afterwards, by peers subscribing to our gossip.
#[derive(Debug)]
pub(super) struct MessageState<N> {
    /// Peers whose `Echo` has already been counted.
    pub received_echo: BTreeSet<N>,
    /// Values per peer whose `Ready` has already been counted.
    pub received_ready: BTreeMap<N, BTreeSet<Value>>,
    /// Number of counted `Echo`s per value.
    pub echo_stats: BTreeMap<Value, usize>,
    /// Number of counted `Ready`s per value from ready-sample members.
    pub ready_sample_stats: BTreeMap<Value, usize>,
    /// Number of counted `Ready`s per value from delivery-sample members.
    pub delivery_sample_stats: BTreeMap<Value, usize>,
    /// Values for which this process has emitted a `Ready`.
    pub ready_sent: BTreeSet<Value>,
    /// Peers this process forwards the gossip to.
    pub gossip_sample: BTreeSet<N>,
    /// Peers whose `Echo`s count towards the echo threshold.
    pub echo_sample: BTreeSet<N>,
    /// Peers whose `Ready`s count towards the ready threshold.
    pub ready_sample: BTreeSet<N>,
    /// Peers whose `Ready`s count towards the delivery threshold.
    pub delivery_sample: BTreeSet<N>,
    /// Peers that asked to receive this process's `Echo`.
    pub echo_subscribers: BTreeSet<N>,
    /// Peers that asked to receive this process's `Ready`s.
    pub ready_subscribers: BTreeSet<N>,
    /// The first gossip seen or sent for this broadcast; replayed to late gossip
    /// subscribers. Immutable once set.
    pub gossip: Option<MessageData<N>>,
    /// The echo this process sent; replayed to late echo subscribers. Immutable once set.
    pub echo: Option<MessageData<N>>,
    /// Whether the sieve short-circuit has already emitted a `Ready`.
    pub sent_ready_from_sieve: bool,
}

impl<N: Ord> MessageState<N> {
    /// Creates the state for a newly observed broadcast with freshly drawn samples.
    pub fn new(
        gossip_sample: BTreeSet<N>,
        echo_sample: BTreeSet<N>,
        ready_sample: BTreeSet<N>,
        delivery_sample: BTreeSet<N>,
    ) -> Self {
        MessageState {
            received_echo: BTreeSet::new(),
            received_ready: BTreeMap::new(),
            echo_stats: BTreeMap::new(),
            ready_sample_stats: BTreeMap::new(),
            delivery_sample_stats: BTreeMap::new(),
            ready_sent: BTreeSet::new(),
            gossip_sample,
            echo_sample,
            ready_sample,
            delivery_sample,
            echo_subscribers: BTreeSet::new(),
            ready_subscribers: BTreeSet::new(),
            gossip: None,
            echo: None,
            sent_ready_from_sieve: false,
        }
    }
}
