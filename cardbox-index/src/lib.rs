//! # cardbox-index
//!
//! The in-memory side of tag filtering: a per-scope inverted index from
//! tag bitmap values to card positions, and a pure set-operation engine
//! that evaluates boolean tag filters in four interchangeable execution
//! modes.
//!
//! The index is built once at store startup and maintained incrementally
//! on every card mutation. The engine never touches storage; it operates
//! on membership facts handed to it.

pub mod bitmap_index;
pub mod setops;

pub use bitmap_index::{IndexRegistry, ScopeIndex};
pub use setops::{BitFilter, UniverseRecord};
