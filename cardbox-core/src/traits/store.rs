use serde::{Deserialize, Serialize};

use crate::errors::CardboxResult;
use crate::model::{Card, Tag};
use crate::scope::ScopeKey;

/// Boolean tag filter for card queries.
///
/// Empty-set semantics are asymmetric and load-bearing:
/// - empty `required` means "no narrowing" (all cards pass phase 1),
/// - empty `any_of` means phase 2 is skipped entirely,
/// - empty `exclude` removes nothing.
///
/// A tag name that matches no known tag yields an empty result, never an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    /// Tags a card must all carry.
    #[serde(default)]
    pub required: Vec<String>,
    /// Tags of which a card must carry at least one.
    #[serde(default)]
    pub any_of: Vec<String>,
    /// Tags a card must not carry.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TagFilter {
    /// Match everything in scope.
    pub fn all() -> Self {
        Self::default()
    }

    /// Cards carrying every one of `tags`.
    pub fn required<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Cards carrying at least one of `tags`.
    pub fn any_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any_of: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.any_of.is_empty() && self.exclude.is_empty()
    }

    /// Number of distinct tag names referenced across all three clauses.
    pub fn distinct_tag_count(&self) -> usize {
        let mut names: std::collections::HashSet<&str> = std::collections::HashSet::new();
        names.extend(self.required.iter().map(String::as_str));
        names.extend(self.any_of.iter().map(String::as_str));
        names.extend(self.exclude.iter().map(String::as_str));
        names.len()
    }
}

/// Capability surface every storage strategy implements.
///
/// Callers depend on this trait and the factory, never on a concrete
/// store type.
pub trait CardStore: Send + Sync {
    // --- Queries ---
    /// Cards in scope matching the filter, non-deleted only.
    fn cards_by_tags(&self, scope: &ScopeKey, filter: &TagFilter) -> CardboxResult<Vec<Card>>;
    /// Single card by id; `CardboxError::CardNotFound` when absent or deleted.
    fn card_by_id(&self, scope: &ScopeKey, id: &str) -> CardboxResult<Card>;
    /// All non-deleted tags in scope with live counts, sorted by name.
    fn all_tags(&self, scope: &ScopeKey) -> CardboxResult<Vec<Tag>>;

    // --- Mutations ---
    /// Create or update a card; tag rows and counts follow atomically.
    fn save_card(&self, card: &Card) -> CardboxResult<()>;
    /// Soft-delete a card and decrement the counts of its tags.
    fn delete_card(&self, scope: &ScopeKey, id: &str) -> CardboxResult<()>;
    /// Soft-delete a tag by name.
    fn delete_tag(&self, scope: &ScopeKey, name: &str) -> CardboxResult<()>;

    // --- Capabilities ---
    /// Whether writes are forwarded to a remote mirror.
    fn can_sync(&self) -> bool;
}
