use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::{fmt, result};

use log::{info, warn};
use rand::Rng;

use super::state::MessageState;
use super::{Error, FaultKind, Message, MessageData, Params, Result, SeqNumber, Value};
use crate::sampling;
use crate::{ConsensusProtocol, NetworkInfo, NodeIdT, Target};

/// A value accepted for delivery, together with the broadcast slot it fills.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Delivery<N> {
    /// The process that authored the broadcast.
    pub author: N,
    /// The author's sequence number for the broadcast.
    pub seq: SeqNumber,
    /// The delivered value.
    pub value: Value,
}

/// Scalable broadcast engine instance.
///
/// One engine runs per process and multiplexes all broadcasts, keyed by
/// `(author, seq)`. It is driven serially by the host: `handle_input` starts a broadcast
/// of our own, `handle_message` processes one inbound message. Every call returns a
/// [`Step`](type.Step.html) with the messages to send out; the host must attribute them
/// to this process, so that recipients see our ID as the sender.
#[derive(Debug)]
pub struct Scalable<N> {
    /// Shared network data.
    netinfo: Arc<NetworkInfo<N>>,
    /// Sample sizes and thresholds.
    params: Params,
    /// The sequence number for the next broadcast authored by this process.
    next_seq: SeqNumber,
    /// The values delivered so far, by author and sequence number. Entries are never
    /// overwritten: a conflicting value for an existing entry is a detected attack.
    delivered: BTreeMap<N, BTreeMap<SeqNumber, Value>>,
    /// Per-broadcast protocol state, by author and sequence number. Never evicted.
    states: BTreeMap<N, BTreeMap<SeqNumber, MessageState<N>>>,
}

/// A `Scalable` step, containing at most one delivery per handled `Ready`.
pub type Step<N> = crate::CpStep<Scalable<N>>;

impl<N: NodeIdT> ConsensusProtocol for Scalable<N> {
    type NodeId = N;
    type Input = Value;
    type Output = Delivery<N>;
    type Message = Message<N>;
    type Error = Error;
    type FaultKind = FaultKind;

    fn handle_input<R: Rng>(&mut self, input: Self::Input, rng: &mut R) -> Result<Step<N>> {
        self.broadcast(input, rng)
    }

    fn handle_message<R: Rng>(
        &mut self,
        sender_id: &Self::NodeId,
        message: Message<N>,
        rng: &mut R,
    ) -> Result<Step<N>> {
        self.handle_message(sender_id, message, rng)
    }

    fn terminated(&self) -> bool {
        false
    }

    fn our_id(&self) -> &N {
        self.netinfo.our_id()
    }
}

impl<N: NodeIdT> Scalable<N> {
    /// Creates a new scalable broadcast engine for the node `netinfo.our_id()`.
    pub fn new(netinfo: Arc<NetworkInfo<N>>, params: Params) -> Self {
        Scalable {
            netinfo,
            params,
            next_seq: 0,
            delivered: BTreeMap::new(),
            states: BTreeMap::new(),
        }
    }

    /// Initiates a broadcast of the given value under this process's next sequence number.
    pub fn broadcast<R: Rng>(&mut self, value: Value, rng: &mut R) -> Result<Step<N>> {
        let mut step = Step::default();
        let data = MessageData {
            author: self.our_id().clone(),
            seq: self.next_seq,
            value,
        };
        self.init_message_state(&data, rng, &mut step);
        let state = self.state_mut(&data.author, data.seq);
        state.gossip = Some(data.clone());
        Self::send_to_set(&mut step, &state.gossip_sample, Message::Gossip(data));
        self.next_seq += 1;
        Ok(step)
    }

    /// Handles a message received from `sender_id`.
    ///
    /// This must be called with every message we receive from another node.
    pub fn handle_message<R: Rng>(
        &mut self,
        sender_id: &N,
        message: Message<N>,
        rng: &mut R,
    ) -> Result<Step<N>> {
        if !self.netinfo.is_participant(sender_id) {
            return Err(Error::UnknownSender);
        }
        let mut step = Step::default();
        let data = message.data().clone();
        self.init_message_state(&data, rng, &mut step);
        match message {
            Message::GossipSubscribe(_) => self.handle_gossip_subscribe(sender_id, &data, &mut step),
            Message::Gossip(_) => self.handle_gossip(&data, &mut step),
            Message::EchoSubscribe(_) => self.handle_echo_subscribe(sender_id, &data, &mut step),
            Message::Echo(_) => self.handle_echo(sender_id, &data, &mut step),
            Message::ReadySubscribe(_) => self.handle_ready_subscribe(sender_id, &data, &mut step),
            Message::Ready(_) => self.handle_ready(sender_id, &data, &mut step),
        }
        Ok(step)
    }

    /// Returns the value delivered for the given author and sequence number, if any.
    pub fn delivered_value(&self, author: &N, seq: SeqNumber) -> Option<Value> {
        self.delivered
            .get(author)
            .and_then(|seqs| seqs.get(&seq))
            .cloned()
    }

    /// Creates the state for a broadcast on its first observation: draws the four samples
    /// and subscribes to the peers behind them. The gossip sample receives
    /// `GossipSubscribe`, the echo sample `EchoSubscribe`, and the ready and delivery
    /// samples both receive `ReadySubscribe` — the replay on subscription covers both
    /// roles, and duplicates are idempotent at the receiver.
    fn init_message_state<R: Rng>(
        &mut self,
        data: &MessageData<N>,
        rng: &mut R,
        step: &mut Step<N>,
    ) {
        let params = self.params;
        let netinfo = Arc::clone(&self.netinfo);
        let seqs = self.states.entry(data.author.clone()).or_default();
        if let Entry::Vacant(entry) = seqs.entry(data.seq) {
            let ids = netinfo.all_ids();
            let gossip_sample = sampling::poisson_sample(ids, params.gossip_sample_size, rng);
            let echo_sample = sampling::sample(ids, params.echo_sample_size, rng);
            let ready_sample = sampling::sample(ids, params.ready_sample_size, rng);
            let delivery_sample = sampling::sample(ids, params.delivery_sample_size, rng);
            Self::send_to_set(step, &gossip_sample, Message::GossipSubscribe(data.clone()));
            Self::send_to_set(step, &echo_sample, Message::EchoSubscribe(data.clone()));
            Self::send_to_set(step, &ready_sample, Message::ReadySubscribe(data.clone()));
            Self::send_to_set(step, &delivery_sample, Message::ReadySubscribe(data.clone()));
            entry.insert(MessageState::new(
                gossip_sample,
                echo_sample,
                ready_sample,
                delivery_sample,
            ));
        }
    }

    /// Handles a `GossipSubscribe` message: adds the sender to the gossip sample and
    /// replays the cached gossip, if there is one, to the new subscriber only.
    fn handle_gossip_subscribe(&mut self, sender_id: &N, data: &MessageData<N>, step: &mut Step<N>) {
        let state = self.state_mut(&data.author, data.seq);
        if !state.gossip_sample.insert(sender_id.clone()) {
            return;
        }
        if let Some(gossip) = &state.gossip {
            let msg = Message::Gossip(gossip.clone());
            step.messages.push(Target::Node(sender_id.clone()).message(msg));
        }
    }

    /// Handles a `Gossip` message. Only the first gossip for a broadcast has any effect:
    /// it is cached and forwarded to the gossip sample, our echo is cached and sent to all
    /// echo subscribers, and the sieve is checked. Anyone subscribing later is served from
    /// the caches instead.
    fn handle_gossip(&mut self, data: &MessageData<N>, step: &mut Step<N>) {
        let params = self.params;
        let state = self.state_mut(&data.author, data.seq);
        if state.gossip.is_some() {
            return;
        }
        state.gossip = Some(data.clone());
        Self::send_to_set(step, &state.gossip_sample, Message::Gossip(data.clone()));
        state.echo = Some(data.clone());
        Self::send_to_set(step, &state.echo_subscribers, Message::Echo(data.clone()));
        Self::maybe_send_ready_from_sieve(&params, state, data, step);
    }

    /// Handles an `EchoSubscribe` message: adds the sender to the echo subscribers and
    /// replays the cached echo, if there is one, to the new subscriber only.
    fn handle_echo_subscribe(&mut self, sender_id: &N, data: &MessageData<N>, step: &mut Step<N>) {
        let state = self.state_mut(&data.author, data.seq);
        if !state.echo_subscribers.insert(sender_id.clone()) {
            return;
        }
        if let Some(echo) = &state.echo {
            let msg = Message::Echo(echo.clone());
            step.messages.push(Target::Node(sender_id.clone()).message(msg));
        }
    }

    /// Handles an `Echo` message. Echoes count only once per sender, and only from members
    /// of our echo sample; everything else is dropped.
    fn handle_echo(&mut self, sender_id: &N, data: &MessageData<N>, step: &mut Step<N>) {
        let params = self.params;
        let state = self.state_mut(&data.author, data.seq);
        if !state.echo_sample.contains(sender_id) || state.received_echo.contains(sender_id) {
            return;
        }
        state.received_echo.insert(sender_id.clone());
        *state.echo_stats.entry(data.value).or_insert(0) += 1;
        Self::maybe_send_ready_from_sieve(&params, state, data, step);
    }

    /// Handles a `ReadySubscribe` message: adds the sender to the ready subscribers and
    /// replays a `Ready` for every value we have already sent one for, so that late
    /// subscribers miss nothing.
    fn handle_ready_subscribe(&mut self, sender_id: &N, data: &MessageData<N>, step: &mut Step<N>) {
        let state = self.state_mut(&data.author, data.seq);
        if !state.ready_subscribers.insert(sender_id.clone()) {
            return;
        }
        for value in &state.ready_sent {
            let msg = Message::Ready(MessageData {
                author: data.author.clone(),
                seq: data.seq,
                value: *value,
            });
            step.messages.push(Target::Node(sender_id.clone()).message(msg));
        }
    }

    /// Handles a `Ready` message. A `(sender, value)` pair counts only once. Ready-sample
    /// members push the value towards amplification, delivery-sample members towards
    /// delivery; a sender may play both roles, one, or neither.
    fn handle_ready(&mut self, sender_id: &N, data: &MessageData<N>, step: &mut Step<N>) {
        let params = self.params;
        let value = data.value;
        let state = self.state_mut(&data.author, data.seq);
        if !state
            .received_ready
            .entry(sender_id.clone())
            .or_default()
            .insert(value)
        {
            return;
        }

        if state.ready_sample.contains(sender_id) {
            let stat = state.ready_sample_stats.entry(value).or_insert(0);
            *stat += 1;
            if *stat >= params.ready_threshold && !state.ready_sent.contains(&value) {
                state.ready_sent.insert(value);
                Self::send_to_set(step, &state.ready_subscribers, Message::Ready(data.clone()));
            }
        }

        let counts_for_delivery = state.delivery_sample.contains(sender_id);
        let mut delivery_stat = 0;
        if counts_for_delivery {
            let stat = state.delivery_sample_stats.entry(value).or_insert(0);
            *stat += 1;
            delivery_stat = *stat;
        }

        if counts_for_delivery {
            match self.delivered_value(&data.author, data.seq) {
                Some(delivered) if delivered != value => {
                    warn!("{}: Detected a duplicated seq number attack", self);
                    step.fault_log
                        .append(data.author.clone(), FaultKind::DuplicatedSeqNumber);
                }
                Some(_) => (),
                None => {
                    if delivery_stat >= params.delivery_threshold {
                        self.deliver(data, step);
                    }
                }
            }
        }
    }

    /// The sieve short-circuit: justifies a `Ready` by echo volume alone. Fires at most
    /// once per broadcast, when the current value matches the cached echo and enough
    /// echo-sample members have echoed it, bypassing ready-sample accumulation.
    fn maybe_send_ready_from_sieve(
        params: &Params,
        state: &mut MessageState<N>,
        data: &MessageData<N>,
        step: &mut Step<N>,
    ) {
        if state.sent_ready_from_sieve {
            return;
        }
        let echo_value = match &state.echo {
            Some(echo) => echo.value,
            None => return,
        };
        if data.value != echo_value {
            return;
        }
        let echoes = state.echo_stats.get(&data.value).cloned().unwrap_or(0);
        if echoes < params.echo_threshold {
            return;
        }
        state.ready_sent.insert(data.value);
        Self::send_to_set(step, &state.ready_subscribers, Message::Ready(data.clone()));
        state.sent_ready_from_sieve = true;
    }

    /// Delivers the value: records it, emits the output and logs the acceptance.
    fn deliver(&mut self, data: &MessageData<N>, step: &mut Step<N>) {
        self.delivered
            .entry(data.author.clone())
            .or_default()
            .insert(data.seq, data.value);
        info!(
            "{}: Accepted transaction with seq number {} and value {} from {:?}",
            self, data.seq, data.value, data.author
        );
        step.output.push(Delivery {
            author: data.author.clone(),
            seq: data.seq,
            value: data.value,
        });
    }

    /// Queues `message` for every node in `set`, preserving this process as the sender.
    fn send_to_set(step: &mut Step<N>, set: &BTreeSet<N>, message: Message<N>) {
        if set.is_empty() {
            return;
        }
        step.messages.push(Target::Nodes(set.clone()).message(message));
    }

    /// Returns the state of the given broadcast.
    fn state_mut(&mut self, author: &N, seq: SeqNumber) -> &mut MessageState<N> {
        self.states
            .get_mut(author)
            .and_then(|seqs| seqs.get_mut(&seq))
            // Both entry points initialize the state before dispatching.
            .expect("state exists for every dispatched message")
    }
}

impl<N: NodeIdT> fmt::Display for Scalable<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> result::Result<(), fmt::Error> {
        write!(f, "{:?} Scalable", self.our_id())
    }
}
