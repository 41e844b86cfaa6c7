//! Capability traits at the subsystem seams.

pub mod mirror;
pub mod store;

pub use mirror::{MirrorPayload, RemoteMirror};
pub use store::{CardStore, TagFilter};
