//! v002: durable outbound sync queue.
//!
//! One row per (entity kind, entity id): a newer write replaces the
//! pending row, so the mirror only ever receives the latest state.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS sync_queue (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_kind     TEXT NOT NULL CHECK (entity_kind IN ('card', 'tag')),
    operation       TEXT NOT NULL CHECK (operation IN ('upsert', 'delete')),
    entity_id       TEXT NOT NULL,
    workspace_id    TEXT NOT NULL,
    owner_id        TEXT NOT NULL,
    payload         TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'failed')),
    attempts        INTEGER NOT NULL DEFAULT 0,
    next_attempt_at TEXT,
    last_error      TEXT,
    created         TEXT NOT NULL,
    updated         TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_sync_queue_entity
    ON sync_queue(entity_kind, entity_id);
CREATE INDEX IF NOT EXISTS idx_sync_queue_status
    ON sync_queue(status, next_attempt_at);
";
