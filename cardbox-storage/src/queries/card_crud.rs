//! Insert, update, fetch, list, soft delete for card rows.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection};

use cardbox_core::errors::{CardboxResult, StorageError};
use cardbox_core::model::Card;
use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};

use crate::crypto::ContentCipher;
use crate::to_storage_err;

/// Column order shared by every card SELECT in this module; the row
/// mapper indexes into it positionally.
const CARD_COLUMNS: &str = "id, workspace_id, owner_id, name, description, encrypted, tags, \
                            tag_ids, tag_bitmaps, sync_version, created, modified, deleted";

/// Insert or update a card row by id.
///
/// The conflict clause refuses to touch a row owned by another scope: a
/// colliding id from a different `(workspace, owner)` changes nothing and
/// the call reports 0 rows. `created` is never overwritten.
pub fn upsert_card_row(
    conn: &Connection,
    card: &Card,
    cipher: Option<&ContentCipher>,
) -> CardboxResult<usize> {
    let tags_json =
        serde_json::to_string(&card.tags).map_err(|e| to_storage_err(e.to_string()))?;
    let tag_ids_json =
        serde_json::to_string(&card.tag_ids).map_err(|e| to_storage_err(e.to_string()))?;
    let tag_bitmaps_json =
        serde_json::to_string(&card.tag_bitmaps).map_err(|e| to_storage_err(e.to_string()))?;
    let description = description_value(card, cipher)?;

    let rows = conn
        .execute(
            "INSERT INTO cards (
                id, workspace_id, owner_id, name, description, encrypted, tags,
                tag_ids, tag_bitmaps, sync_version, created, modified, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                encrypted = excluded.encrypted,
                tags = excluded.tags,
                tag_ids = excluded.tag_ids,
                tag_bitmaps = excluded.tag_bitmaps,
                sync_version = excluded.sync_version,
                modified = excluded.modified,
                deleted = excluded.deleted
            WHERE cards.workspace_id = excluded.workspace_id
              AND cards.owner_id = excluded.owner_id",
            params![
                card.id,
                card.scope.workspace.as_str(),
                card.scope.owner.as_str(),
                card.name,
                description,
                cipher.is_some() as i32,
                tags_json,
                tag_ids_json,
                tag_bitmaps_json,
                card.sync_version as i64,
                card.created.to_rfc3339(),
                card.modified.to_rfc3339(),
                card.deleted.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(rows)
}

/// Get a single card by id within a scope.
///
/// Soft-deleted rows are returned too; callers decide whether a tombstone
/// counts as present.
pub fn fetch_card(
    conn: &Connection,
    scope: &ScopeKey,
    id: &str,
    cipher: Option<&ContentCipher>,
) -> CardboxResult<Option<Card>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE id = ?1 AND workspace_id = ?2 AND owner_id = ?3"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(
            params![id, scope.workspace.as_str(), scope.owner.as_str()],
            |row| Ok(row_to_card(row, cipher)),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(Ok(card)) => Ok(Some(card)),
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

/// List all live cards in a scope, oldest first.
pub fn list_cards(
    conn: &Connection,
    scope: &ScopeKey,
    cipher: Option<&ContentCipher>,
) -> CardboxResult<Vec<Card>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE workspace_id = ?1 AND owner_id = ?2 AND deleted IS NULL
             ORDER BY created, id"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(
            params![scope.workspace.as_str(), scope.owner.as_str()],
            |row| Ok(row_to_card(row, cipher)),
        )
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    rows.into_iter().collect()
}

/// Fetch live cards by id within a scope, oldest first.
///
/// Ids that do not exist (or are soft-deleted) are silently skipped.
pub fn cards_by_ids(
    conn: &Connection,
    scope: &ScopeKey,
    ids: &[String],
    cipher: Option<&ContentCipher>,
) -> CardboxResult<Vec<Card>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (0..ids.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE workspace_id = ?1 AND owner_id = ?2 AND deleted IS NULL
               AND id IN ({placeholders})
             ORDER BY created, id"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let workspace = scope.workspace.as_str();
    let owner = scope.owner.as_str();
    let mut bindings: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(ids.len() + 2);
    bindings.push(&workspace);
    bindings.push(&owner);
    for id in ids {
        bindings.push(id);
    }

    let rows = stmt
        .query_map(bindings.as_slice(), |row| Ok(row_to_card(row, cipher)))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    rows.into_iter().collect()
}

/// Load every live card across all scopes with the description left empty.
///
/// The startup index build needs scopes, positions, and tag projections,
/// not content, so encrypted descriptions stay sealed on disk.
pub fn load_index_rows(conn: &Connection) -> CardboxResult<Vec<Card>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, workspace_id, owner_id, name, tags, tag_ids, tag_bitmaps,
                    sync_version, created, modified
             FROM cards WHERE deleted IS NULL",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| Ok(row_to_index_card(row)))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    rows.into_iter().collect()
}

/// Soft-delete a live card row, stamping `deleted` and `modified` with
/// `when` and bumping `sync_version`. Returns the number of rows touched
/// (0 when the card is absent or already deleted).
pub fn soft_delete_card(
    conn: &Connection,
    scope: &ScopeKey,
    id: &str,
    when: DateTime<Utc>,
) -> CardboxResult<usize> {
    conn.execute(
        "UPDATE cards SET deleted = ?4, modified = ?4, sync_version = sync_version + 1
         WHERE id = ?1 AND workspace_id = ?2 AND owner_id = ?3 AND deleted IS NULL",
        params![
            id,
            scope.workspace.as_str(),
            scope.owner.as_str(),
            when.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

fn description_value(card: &Card, cipher: Option<&ContentCipher>) -> CardboxResult<Value> {
    match cipher {
        Some(cipher) => Ok(Value::Blob(cipher.seal(&card.description)?)),
        None => Ok(Value::Text(card.description.clone())),
    }
}

fn read_description(
    row: &rusqlite::Row<'_>,
    idx: usize,
    encrypted: bool,
    cipher: Option<&ContentCipher>,
) -> CardboxResult<String> {
    match (encrypted, cipher) {
        (true, Some(cipher)) => {
            let sealed: Vec<u8> = row.get(idx).map_err(|e| to_storage_err(e.to_string()))?;
            cipher.open(&sealed)
        }
        (true, None) => Err(StorageError::EncryptionFailed {
            reason: "row is encrypted but no content key is configured".to_string(),
        }
        .into()),
        // Rows written before a key was configured stay readable as-is.
        (false, _) => row.get(idx).map_err(|e| to_storage_err(e.to_string())),
    }
}

/// Parse a row in [`CARD_COLUMNS`] order into a Card.
fn row_to_card(row: &rusqlite::Row<'_>, cipher: Option<&ContentCipher>) -> CardboxResult<Card> {
    let workspace: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let owner: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let scope = ScopeKey::new(WorkspaceId::new(workspace), UserId::new(owner))?;

    let encrypted = row
        .get::<_, i64>(5)
        .map_err(|e| to_storage_err(e.to_string()))?
        != 0;

    let tags_json: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let tag_ids_json: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let tag_bitmaps_json: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    let tags: Vec<String> =
        serde_json::from_str(&tags_json).map_err(|e| to_storage_err(format!("parse tags: {e}")))?;
    let tag_ids: Vec<String> = serde_json::from_str(&tag_ids_json)
        .map_err(|e| to_storage_err(format!("parse tag_ids: {e}")))?;
    let tag_bitmaps: Vec<u32> = serde_json::from_str(&tag_bitmaps_json)
        .map_err(|e| to_storage_err(format!("parse tag_bitmaps: {e}")))?;

    let created_str: String = row.get(10).map_err(|e| to_storage_err(e.to_string()))?;
    let modified_str: String = row.get(11).map_err(|e| to_storage_err(e.to_string()))?;
    let deleted_str: Option<String> = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Card {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        scope,
        name: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        description: read_description(row, 4, encrypted, cipher)?,
        tags,
        tag_ids,
        tag_bitmaps,
        sync_version: row
            .get::<_, i64>(9)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
        created: parse_dt(&created_str)?,
        modified: parse_dt(&modified_str)?,
        deleted: deleted_str.as_deref().map(parse_dt).transpose()?,
    })
}

/// Parse an index-load row (no description, no tombstones) into a Card.
fn row_to_index_card(row: &rusqlite::Row<'_>) -> CardboxResult<Card> {
    let workspace: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let owner: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let scope = ScopeKey::new(WorkspaceId::new(workspace), UserId::new(owner))?;

    let tags_json: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let tag_ids_json: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let tag_bitmaps_json: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let tags: Vec<String> =
        serde_json::from_str(&tags_json).map_err(|e| to_storage_err(format!("parse tags: {e}")))?;
    let tag_ids: Vec<String> = serde_json::from_str(&tag_ids_json)
        .map_err(|e| to_storage_err(format!("parse tag_ids: {e}")))?;
    let tag_bitmaps: Vec<u32> = serde_json::from_str(&tag_bitmaps_json)
        .map_err(|e| to_storage_err(format!("parse tag_bitmaps: {e}")))?;

    let created_str: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    let modified_str: String = row.get(9).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Card {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        scope,
        name: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        description: String::new(),
        tags,
        tag_ids,
        tag_bitmaps,
        sync_version: row
            .get::<_, i64>(7)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
        created: parse_dt(&created_str)?,
        modified: parse_dt(&modified_str)?,
        deleted: None,
    })
}

fn parse_dt(s: &str) -> CardboxResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}

/// Helper trait to make `query_row` return `Option` on not-found.
pub(crate) trait OptionalRow<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalRow<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
