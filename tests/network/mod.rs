//! A virtual network of protocol instances.
//!
//! Nodes hold their protocol engine and a queue of unhandled messages. The network is
//! advanced step by step; in every step an adversary may inject messages originating from
//! the nodes it controls and then picks which node handles its next queued message, which
//! lets tests exercise arbitrary delivery schedules.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use contagion::{ConsensusProtocol, CpStep, Fault, NetworkInfo, Step, Target, TargetedMessage};

/// A "node" running an instance of the protocol `D`.
pub struct TestNode<D: ConsensusProtocol> {
    /// This node's own ID.
    id: D::NodeId,
    /// The instance of the protocol.
    algo: D,
    /// Incoming messages from other nodes that this node has not yet handled, with their
    /// sender IDs.
    pub queue: VecDeque<(D::NodeId, D::Message)>,
    /// The values this node has delivered so far.
    outputs: Vec<D::Output>,
    /// The faults this node has observed so far.
    faults: Vec<Fault<D::NodeId, D::FaultKind>>,
}

impl<D: ConsensusProtocol> TestNode<D> {
    /// Returns the list of deliveries this node output so far.
    pub fn outputs(&self) -> &[D::Output] {
        &self.outputs
    }

    /// Returns the faults this node observed so far.
    pub fn faults(&self) -> &[Fault<D::NodeId, D::FaultKind>] {
        &self.faults
    }

    /// Returns the internal protocol instance.
    pub fn instance(&self) -> &D {
        &self.algo
    }

    /// Creates a new test node with the given protocol instance.
    fn new(algo: D) -> TestNode<D> {
        TestNode {
            id: algo.our_id().clone(),
            algo,
            queue: VecDeque::new(),
            outputs: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Inputs a value into the instance and returns the messages it wants to send.
    fn input<R: Rng>(
        &mut self,
        input: D::Input,
        rng: &mut R,
    ) -> Vec<TargetedMessage<D::Message, D::NodeId>> {
        let step = self.algo.handle_input(input, rng).expect("input");
        self.absorb(step)
    }

    /// Handles the first message in the node's queue and returns the messages the
    /// instance wants to send.
    fn handle_message<R: Rng>(&mut self, rng: &mut R) -> Vec<TargetedMessage<D::Message, D::NodeId>> {
        let (from_id, msg) = self.queue.pop_front().expect("message not found");
        debug!("Handling {:?} -> {:?}: {:?}", from_id, self.id, msg);
        let step = self
            .algo
            .handle_message(&from_id, msg, rng)
            .expect("handling message");
        self.absorb(step)
    }

    /// Records the step's outputs and faults and hands back its messages.
    fn absorb(&mut self, step: CpStep<D>) -> Vec<TargetedMessage<D::Message, D::NodeId>> {
        let Step {
            output,
            fault_log,
            messages,
        } = step;
        self.outputs.extend(output);
        self.faults.extend(fault_log);
        messages
    }
}

/// A strategy for picking the next good node to handle a message.
pub enum MessageScheduler {
    /// Picks a random node with a non-empty queue.
    Random,
    /// Picks the first non-idle node.
    First,
}

impl MessageScheduler {
    /// Chooses a node to be the next one to handle a message.
    pub fn pick_node<D: ConsensusProtocol, R: Rng>(
        &self,
        nodes: &BTreeMap<D::NodeId, TestNode<D>>,
        rng: &mut R,
    ) -> D::NodeId {
        match *self {
            MessageScheduler::First => nodes
                .iter()
                .find(|(_, node)| !node.queue.is_empty())
                .map(|(id, _)| id.clone())
                .expect("no more messages in queue"),
            MessageScheduler::Random => {
                let ids: Vec<D::NodeId> = nodes
                    .iter()
                    .filter(|(_, node)| !node.queue.is_empty())
                    .map(|(id, _)| id.clone())
                    .collect();
                ids.choose(rng).expect("no more messages in queue").clone()
            }
        }
    }
}

/// A message, together with the ID of the node that sent it.
pub type MessageWithSender<D> = (
    <D as ConsensusProtocol>::NodeId,
    TargetedMessage<<D as ConsensusProtocol>::Message, <D as ConsensusProtocol>::NodeId>,
);

/// An adversary that can control a set of nodes and pick the next good node to receive a
/// message.
pub trait Adversary<D: ConsensusProtocol> {
    /// Chooses a node to be the next one to handle a message.
    ///
    /// Starvation is illegal: a node that has pending incoming messages must be chosen.
    fn pick_node<R: Rng>(
        &self,
        nodes: &BTreeMap<D::NodeId, TestNode<D>>,
        rng: &mut R,
    ) -> D::NodeId;

    /// Called when a node controlled by the adversary receives a message.
    fn push_message(&mut self, sender_id: D::NodeId, msg: TargetedMessage<D::Message, D::NodeId>);

    /// Produces a list of messages to be sent from the adversary's nodes.
    fn step(&mut self) -> Vec<MessageWithSender<D>>;
}

/// An adversary whose nodes never send any messages.
pub struct SilentAdversary {
    scheduler: MessageScheduler,
}

impl SilentAdversary {
    /// Creates a new silent adversary with the given message scheduler.
    pub fn new(scheduler: MessageScheduler) -> SilentAdversary {
        SilentAdversary { scheduler }
    }
}

impl<D: ConsensusProtocol> Adversary<D> for SilentAdversary {
    fn pick_node<R: Rng>(
        &self,
        nodes: &BTreeMap<D::NodeId, TestNode<D>>,
        rng: &mut R,
    ) -> D::NodeId {
        self.scheduler.pick_node(nodes, rng)
    }

    fn push_message(&mut self, _: D::NodeId, _: TargetedMessage<D::Message, D::NodeId>) {
        // All messages are ignored.
    }

    fn step(&mut self) -> Vec<MessageWithSender<D>> {
        vec![] // No messages are sent.
    }
}

/// A collection of `TestNode`s representing a network.
///
/// The adversary controls the delivery schedule and all faulty nodes; messages addressed
/// to faulty nodes are handed to it instead of being queued.
pub struct TestNetwork<A: Adversary<D>, D: ConsensusProtocol> {
    /// The correct nodes, by ID.
    pub nodes: BTreeMap<D::NodeId, TestNode<D>>,
    adv_ids: BTreeSet<D::NodeId>,
    adversary: A,
}

impl<A: Adversary<D>, D: ConsensusProtocol> TestNetwork<A, D>
where
    D::Message: Clone,
{
    /// Creates a new network with the given correct and adversarial node IDs. The
    /// `new_algo` closure constructs the protocol instance of each correct node; the
    /// adversary is given a chance to send messages right away.
    pub fn new<F>(
        good_ids: &[D::NodeId],
        adv_ids: &[D::NodeId],
        adversary: A,
        new_algo: F,
    ) -> TestNetwork<A, D>
    where
        F: Fn(NetworkInfo<D::NodeId>) -> D,
    {
        let all_ids: Vec<D::NodeId> = good_ids.iter().chain(adv_ids.iter()).cloned().collect();
        let nodes = good_ids
            .iter()
            .map(|id| {
                let netinfo = NetworkInfo::new(id.clone(), all_ids.clone());
                (id.clone(), TestNode::new(new_algo(netinfo)))
            })
            .collect();
        let mut network = TestNetwork {
            nodes,
            adv_ids: adv_ids.iter().cloned().collect(),
            adversary,
        };
        let msgs = network.adversary.step();
        for (sender_id, msg) in msgs {
            network.dispatch_messages(sender_id, vec![msg]);
        }
        network
    }

    /// Performs one iteration of the network: the adversary may send messages of its
    /// choosing, then one node of its choice handles its next queued message.
    ///
    /// Returns the ID of the node that made progress.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> D::NodeId {
        let msgs = self.adversary.step();
        for (sender_id, msg) in msgs {
            self.dispatch_messages(sender_id, vec![msg]);
        }

        let id = self.adversary.pick_node(&self.nodes, rng);
        let msgs = {
            let node = self.nodes.get_mut(&id).expect("node picked by adversary");
            node.handle_message(rng)
        };
        self.dispatch_messages(id.clone(), msgs);

        id
    }

    /// Inputs a value in node `id`.
    pub fn input<R: Rng>(&mut self, id: D::NodeId, value: D::Input, rng: &mut R) {
        let msgs = {
            let node = self.nodes.get_mut(&id).expect("input instance");
            node.input(value, rng)
        };
        self.dispatch_messages(id, msgs);
    }

    /// Returns `true` if no node has pending messages.
    pub fn quiescent(&self) -> bool {
        self.nodes.values().all(|node| node.queue.is_empty())
    }

    /// Pushes the messages into the queues of the intended recipients.
    fn dispatch_messages<Q>(&mut self, sender_id: D::NodeId, msgs: Q)
    where
        Q: IntoIterator<Item = TargetedMessage<D::Message, D::NodeId>>,
    {
        for msg in msgs {
            match msg.target.clone() {
                Target::Node(to_id) => {
                    self.dispatch_to(sender_id.clone(), to_id, msg.message);
                }
                Target::Nodes(to_ids) => {
                    for to_id in to_ids {
                        self.dispatch_to(sender_id.clone(), to_id, msg.message.clone());
                    }
                }
            }
        }
    }

    /// Delivers one message to one recipient, preserving the sender ID. Nodes may send to
    /// themselves, since samples can contain the drawing process.
    fn dispatch_to(&mut self, sender_id: D::NodeId, to_id: D::NodeId, message: D::Message) {
        if self.adv_ids.contains(&to_id) {
            self.adversary
                .push_message(sender_id, Target::Node(to_id).message(message));
        } else if let Some(node) = self.nodes.get_mut(&to_id) {
            node.queue.push_back((sender_id, message));
        } else {
            warn!("Unknown recipient {:?} for message: {:?}", to_id, message);
        }
    }
}
