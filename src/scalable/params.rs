use serde::{Deserialize, Serialize};

/// Parameters controlling the sampling regime of the scalable broadcast.
///
/// Sample sizes trade message complexity against the probability that all correct
/// processes agree; thresholds trade liveness against safety under Byzantine senders.
/// Sizes exceeding the number of participants are clipped at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Mean size of the Poisson-distributed gossip fan-out sample.
    pub gossip_sample_size: usize,
    /// Size of the sample whose `Echo` messages this process counts.
    pub echo_sample_size: usize,
    /// Number of distinct echo-sample members that must echo a value before the sieve
    /// short-circuit emits a `Ready` for it.
    pub echo_threshold: usize,
    /// Size of the sample whose `Ready` messages count towards amplification.
    pub ready_sample_size: usize,
    /// Number of distinct ready-sample members that must send `Ready` for a value before
    /// this process amplifies it to its own subscribers.
    pub ready_threshold: usize,
    /// Size of the sample whose `Ready` messages count towards delivery.
    pub delivery_sample_size: usize,
    /// Number of distinct delivery-sample members that must send `Ready` for a value
    /// before this process delivers it.
    pub delivery_threshold: usize,
}

impl Default for Params {
    fn default() -> Params {
        Params {
            gossip_sample_size: 4,
            echo_sample_size: 4,
            echo_threshold: 3,
            ready_sample_size: 4,
            ready_threshold: 3,
            delivery_sample_size: 4,
            delivery_threshold: 3,
        }
    }
}
