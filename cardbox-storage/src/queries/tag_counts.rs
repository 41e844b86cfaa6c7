//! Tag rows and their denormalized card counts.
//!
//! Tag identity is workspace-level: the id hashes `(workspace, name)` and
//! the schema keeps one row per workspace and name. The owner column
//! records which scope first materialized the tag. Every count-moving
//! function takes the caller's transaction, so counts and card rows move
//! together or not at all. Count arithmetic is relative (`card_count + 1`
//! inside the transaction), so correctness rests on SQLite serializing
//! writers; there is no cross-process lock beyond that.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};

use cardbox_core::errors::{CardboxError, CardboxResult};
use cardbox_core::model::{Card, Tag};
use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};

use crate::crypto::ContentCipher;
use crate::to_storage_err;

use super::card_crud::{self, OptionalRow};

/// Column order shared by every tag SELECT in this module.
const TAG_COLUMNS: &str =
    "id, workspace_id, owner_id, name, bitmap, card_count, sync_version, created, modified, deleted";

/// Insert tag rows for any of `names` the workspace does not have yet,
/// reviving soft-deleted ones in place. Returns the tags this call
/// created or revived, freshly read back so counts and versions are the
/// stored ones.
pub fn ensure_tags(
    tx: &Transaction<'_>,
    scope: &ScopeKey,
    names: &[String],
) -> CardboxResult<Vec<Tag>> {
    let mut materialized = Vec::new();
    for name in names {
        let tag = Tag::new(scope.clone(), name.clone());
        let changed = tx
            .execute(
                "INSERT INTO tags (
                    id, workspace_id, owner_id, name, bitmap, card_count,
                    sync_version, created, modified, deleted
                ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6, ?6, NULL)
                ON CONFLICT(workspace_id, name) DO UPDATE SET
                    deleted = NULL,
                    modified = excluded.modified,
                    sync_version = tags.sync_version + 1
                WHERE tags.deleted IS NOT NULL",
                params![
                    tag.id,
                    scope.workspace.as_str(),
                    scope.owner.as_str(),
                    tag.name,
                    tag.bitmap as i64,
                    tag.created.to_rfc3339(),
                ],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;

        // Rows already live fall through the conflict clause untouched.
        if changed > 0 {
            if let Some(stored) = fetch_tag(tx, scope, name)? {
                materialized.push(stored);
            }
        }
    }
    Ok(materialized)
}

/// Bump the card count of each named tag in the workspace.
pub fn increment_counts(
    tx: &Transaction<'_>,
    scope: &ScopeKey,
    names: &[String],
) -> CardboxResult<()> {
    let now = Utc::now().to_rfc3339();
    for name in names {
        tx.execute(
            "UPDATE tags SET card_count = card_count + 1, modified = ?3
             WHERE workspace_id = ?1 AND name = ?2",
            params![scope.workspace.as_str(), name, now],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Drop the card count of each named tag in the workspace, never below
/// zero.
pub fn decrement_counts(
    tx: &Transaction<'_>,
    scope: &ScopeKey,
    names: &[String],
) -> CardboxResult<()> {
    let now = Utc::now().to_rfc3339();
    for name in names {
        tx.execute(
            "UPDATE tags SET card_count = MAX(0, card_count - 1), modified = ?3
             WHERE workspace_id = ?1 AND name = ?2",
            params![scope.workspace.as_str(), name, now],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Settle counts for a card whose tag list changed from `old_tags` to
/// `new_tags`: removed tags lose one, added tags gain one, tags on both
/// sides are untouched. Returns tags created or revived for the added
/// set.
pub fn update_counts_on_reassignment(
    tx: &Transaction<'_>,
    scope: &ScopeKey,
    old_tags: &[String],
    new_tags: &[String],
) -> CardboxResult<Vec<Tag>> {
    let old: HashSet<&str> = old_tags.iter().map(String::as_str).collect();
    let new: HashSet<&str> = new_tags.iter().map(String::as_str).collect();

    let mut added = Vec::new();
    let mut seen = HashSet::new();
    for tag in new_tags {
        if !old.contains(tag.as_str()) && seen.insert(tag.as_str()) {
            added.push(tag.clone());
        }
    }
    let mut removed = Vec::new();
    let mut seen = HashSet::new();
    for tag in old_tags {
        if !new.contains(tag.as_str()) && seen.insert(tag.as_str()) {
            removed.push(tag.clone());
        }
    }

    let created = ensure_tags(tx, scope, &added)?;
    increment_counts(tx, scope, &added)?;
    decrement_counts(tx, scope, &removed)?;
    Ok(created)
}

/// Insert a brand-new card and settle its tag rows and counts in one
/// call. Returns tags created or revived by this write.
pub fn create_card_with_counts(
    tx: &Transaction<'_>,
    card: &Card,
    cipher: Option<&ContentCipher>,
) -> CardboxResult<Vec<Tag>> {
    let rows = card_crud::upsert_card_row(tx, card, cipher)?;
    if rows == 0 {
        // The id exists under another scope; nothing was written.
        return Err(CardboxError::CardNotFound {
            id: card.id.clone(),
        });
    }
    let created = ensure_tags(tx, &card.scope, &card.tags)?;
    increment_counts(tx, &card.scope, &card.tags)?;
    Ok(created)
}

/// Soft-delete a live tag by name. Returns the refreshed row, or `None`
/// when the workspace has no live tag by that name.
pub fn soft_delete_tag(
    tx: &Transaction<'_>,
    scope: &ScopeKey,
    name: &str,
) -> CardboxResult<Option<Tag>> {
    let now = Utc::now().to_rfc3339();
    let changed = tx
        .execute(
            "UPDATE tags SET deleted = ?3, modified = ?3, sync_version = sync_version + 1
             WHERE workspace_id = ?1 AND name = ?2 AND deleted IS NULL",
            params![scope.workspace.as_str(), name, now],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    if changed == 0 {
        return Ok(None);
    }

    let stored = fetch_tag(tx, scope, name)?;
    if let Some(tag) = &stored {
        if tag.card_count > 0 {
            tracing::warn!(
                workspace = %scope.workspace,
                tag = %tag.name,
                card_count = tag.card_count,
                "soft-deleted a tag still carried by cards"
            );
        }
    }
    Ok(stored)
}

/// Get a single tag by name within a workspace, deleted or not.
pub fn fetch_tag(
    conn: &Connection,
    scope: &ScopeKey,
    name: &str,
) -> CardboxResult<Option<Tag>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE workspace_id = ?1 AND name = ?2"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![scope.workspace.as_str(), name], |row| {
            Ok(row_to_tag(row))
        })
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(Ok(tag)) => Ok(Some(tag)),
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

/// List all live tags in the workspace, sorted by name.
pub fn list_tags(conn: &Connection, scope: &ScopeKey) -> CardboxResult<Vec<Tag>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TAG_COLUMNS} FROM tags
             WHERE workspace_id = ?1 AND deleted IS NULL
             ORDER BY name"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![scope.workspace.as_str()], |row| Ok(row_to_tag(row)))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    rows.into_iter().collect()
}

/// Parse a row in [`TAG_COLUMNS`] order into a Tag.
fn row_to_tag(row: &rusqlite::Row<'_>) -> CardboxResult<Tag> {
    let workspace: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let owner: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let scope = ScopeKey::new(WorkspaceId::new(workspace), UserId::new(owner))?;

    let created_str: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let modified_str: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    let deleted_str: Option<String> = row.get(9).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Tag {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        scope,
        name: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        bitmap: row
            .get::<_, i64>(4)
            .map_err(|e| to_storage_err(e.to_string()))? as u32,
        card_count: row
            .get::<_, i64>(5)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
        sync_version: row
            .get::<_, i64>(6)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
        created: parse_dt(&created_str)?,
        modified: parse_dt(&modified_str)?,
        deleted: deleted_str.as_deref().map(parse_dt).transpose()?,
    })
}

fn parse_dt(s: &str) -> CardboxResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}
