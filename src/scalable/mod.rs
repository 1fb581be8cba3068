//! # Scalable probabilistic reliable broadcast
//!
//! Allows a network of _N_ processes, a fraction of which may be Byzantine, to agree on a
//! value for each `(author, sequence number)` pair with high probability — without any
//! process contacting more than a few random peers. Unlike quorum-based reliable
//! broadcast, no step ever waits for `N - f` acknowledgements; all counting happens
//! against small random samples, so per-process message complexity is independent of the
//! network size.
//!
//! ## How it works
//!
//! When a process first learns about a broadcast — by authoring it or by receiving any
//! protocol message for its `(author, seq)` pair — it draws four random samples of the
//! participant list and subscribes to them:
//!
//! * a Poisson-sized **gossip sample**, asked (via `GossipSubscribe`) to forward the
//!   gossiped value,
//! * an **echo sample**, asked (via `EchoSubscribe`) to send their `Echo`,
//! * a **ready sample** and a **delivery sample**, both asked via `ReadySubscribe` to
//!   send every `Ready` they emit.
//!
//! The author sends `Gossip` to its gossip sample. On the first `Gossip` it receives, a
//! process forwards it to its own gossip sample and sends an `Echo` to everyone who
//! subscribed to its echo; subsequent gossips for the same pair are ignored, and late
//! subscribers are served from the cached messages. This pull-push combination spreads
//! the value to every correct process with high probability.
//!
//! `Ready` messages arise in two ways. The *sieve* short-circuit emits one as soon as
//! enough members of the echo sample have echoed the value this process itself echoed.
//! *Amplification* emits one when enough members of the ready sample have sent `Ready`
//! for a value. Either way the `Ready` goes to all ready subscribers, at most once per
//! value. A process *delivers* a value once enough members of its delivery sample have
//! sent `Ready` for it — at most one delivery per `(author, seq)`, ever. A later `Ready`
//! carrying a conflicting value for a delivered pair is evidence of an author reusing a
//! sequence number, and is reported in the fault log.
//!
//! Every acceptance decision is a monotone set insertion or counter increment, so the
//! protocol tolerates arbitrary reordering by the transport; lost messages are handled
//! statistically by the sampling regime rather than by retries.

mod error;
mod message;
mod params;
mod scalable;
mod state;

pub use self::error::{Error, FaultKind, Result};
pub use self::message::{Message, MessageData, SeqNumber, Value};
pub use self::params::Params;
pub use self::scalable::{Delivery, Scalable, Step};
