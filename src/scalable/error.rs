use std::result;

use thiserror::Error as ThisError;

/// A scalable broadcast error.
#[derive(Clone, PartialEq, Debug, ThisError)]
pub enum Error {
    /// Message received from a node outside the known participant list.
    #[error("Unknown sender")]
    UnknownSender,
}

/// A scalable broadcast result.
pub type Result<T> = result::Result<T, Error>;

/// Represents each reason why a peer could be considered faulty.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum FaultKind {
    /// The author of a broadcast reused a sequence number for a different value.
    #[error("Author reused a sequence number for a different value.")]
    DuplicatedSeqNumber,
}
