//! # cardbox-core
//!
//! Foundation crate for the Cardbox tagged-card store.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod model;
pub mod scope;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::CardboxConfig;
pub use errors::{CardboxError, CardboxResult};
pub use exec::{ExecMetrics, ExecMode, OperationType, QueryShape};
pub use model::{Card, Tag};
pub use scope::{ScopeKey, UserId, WorkspaceId};
pub use traits::{CardStore, MirrorPayload, RemoteMirror, TagFilter};
