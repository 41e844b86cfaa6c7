//! Isolation keys for multi-tenant scoping.
//!
//! Every card and tag belongs to exactly one `(workspace, owner)` pair and
//! no query or mutation may cross that boundary.
//!
//! # Examples
//!
//! ```
//! use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};
//!
//! let scope = ScopeKey::new(WorkspaceId::new("acme"), UserId::new("u-42")).unwrap();
//! assert_eq!(scope.to_string(), "acme/u-42");
//!
//! let parsed = ScopeKey::parse("acme/u-42").unwrap();
//! assert_eq!(parsed, scope);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Opaque workspace identifier, the primary isolation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkspaceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque owner identifier, the secondary isolation key within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite isolation key: `(workspace, owner)`.
///
/// Construction validates that both components are non-empty; a scope key
/// that exists is always usable as a query boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Workspace the data lives in.
    pub workspace: WorkspaceId,
    /// Owner of the data within the workspace.
    pub owner: UserId,
}

impl ScopeKey {
    /// Build a scope key, rejecting empty components.
    pub fn new(workspace: WorkspaceId, owner: UserId) -> Result<Self, ValidationError> {
        if workspace.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyScopeField { field: "workspace" });
        }
        if owner.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyScopeField { field: "owner" });
        }
        Ok(Self { workspace, owner })
    }

    /// Parse the `{workspace}/{owner}` form produced by `Display`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let Some((workspace, owner)) = s.split_once('/') else {
            return Err(ValidationError::MalformedScope { input: s.to_string() });
        };
        Self::new(WorkspaceId::from(workspace), UserId::from(owner))
    }
}

impl std::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.workspace, self.owner)
    }
}
