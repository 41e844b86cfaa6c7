//! Mirror backends.
//!
//! The in-memory mirror exists for tests and local development; the HTTP
//! mirror talks to a real remote and is feature gated so offline builds
//! do not pull in a network stack.

pub mod memory;

#[cfg(feature = "remote-http")]
pub mod http;
