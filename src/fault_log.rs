//! Functionality for logging faulty node behavior encountered by the protocol.
//!
//! Faults are never raised as errors: the engine records them in the step it returns and
//! keeps processing, so the host can decide what to do with misbehaving peers.

use std::fmt::Debug;

/// Represents the kind of misbehavior a node can be blamed for.
pub trait FaultT: Clone + Debug + PartialEq {}
impl<F> FaultT for F where F: Clone + Debug + PartialEq {}

/// A structure representing the context of a faulty node. This structure describes which
/// node is faulty (`node_id`) and which faulty behavior the node exhibited (`kind`).
#[derive(Clone, Debug, PartialEq)]
pub struct Fault<N, F: FaultT> {
    /// The faulty node's ID.
    pub node_id: N,
    /// The kind of fault the node is blamed for.
    pub kind: F,
}

impl<N, F: FaultT> Fault<N, F> {
    /// Creates a new fault, blaming `node_id` for the `kind`.
    pub fn new(node_id: N, kind: F) -> Self {
        Fault { node_id, kind }
    }
}

/// A structure used to contain reports of faulty node behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct FaultLog<N, F: FaultT>(pub Vec<Fault<N, F>>);

impl<N, F: FaultT> FaultLog<N, F> {
    /// Creates an empty `FaultLog`.
    pub fn new() -> Self {
        FaultLog::default()
    }

    /// Creates a new `Fault` and pushes it onto the fault log.
    pub fn append(&mut self, node_id: N, kind: F) {
        self.0.push(Fault::new(node_id, kind));
    }

    /// Consumes `new_logs`, appending its logs onto the end of `self`.
    pub fn extend(&mut self, new_logs: FaultLog<N, F>) {
        self.0.extend(new_logs.0);
    }

    /// Returns `true` if there are no fault entries in the log.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N, F: FaultT> Default for FaultLog<N, F> {
    fn default() -> Self {
        FaultLog(vec![])
    }
}

impl<N, F: FaultT> IntoIterator for FaultLog<N, F> {
    type Item = Fault<N, F>;
    type IntoIter = std::vec::IntoIter<Fault<N, F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
