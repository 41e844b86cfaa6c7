//! # cardbox-sync
//!
//! The hybrid storage strategy: local writes stage durable queue entries
//! in the same transaction, a background worker drains them to a remote
//! mirror with bounded backoff, and a factory picks the strategy from
//! configuration.
//!
//! Remote failures never propagate to the mutating caller. The local
//! store is authoritative; the mirror is an eventually consistent,
//! privacy-preserving projection.

pub mod hybrid;
pub mod mirror;
pub mod queue;
pub mod strategy;
pub mod worker;

pub use hybrid::HybridStore;
pub use mirror::memory::InMemoryMirror;
pub use strategy::open_store;
pub use worker::{drain_once, DrainReport};
