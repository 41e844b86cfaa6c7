//! v001: cards and tags tables with scope and uniqueness indexes.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS cards (
    id            TEXT PRIMARY KEY,
    workspace_id  TEXT NOT NULL,
    owner_id      TEXT NOT NULL,
    name          TEXT NOT NULL,
    description   BLOB NOT NULL,
    encrypted     INTEGER NOT NULL DEFAULT 0,
    tags          TEXT NOT NULL,
    tag_ids       TEXT NOT NULL,
    tag_bitmaps   TEXT NOT NULL,
    sync_version  INTEGER NOT NULL DEFAULT 0,
    created       TEXT NOT NULL,
    modified      TEXT NOT NULL,
    deleted       TEXT
);

CREATE INDEX IF NOT EXISTS idx_cards_owner_workspace
    ON cards(owner_id, workspace_id);
CREATE INDEX IF NOT EXISTS idx_cards_workspace_created
    ON cards(workspace_id, created);

CREATE TABLE IF NOT EXISTS tags (
    id            TEXT PRIMARY KEY,
    workspace_id  TEXT NOT NULL,
    owner_id      TEXT NOT NULL,
    name          TEXT NOT NULL,
    bitmap        INTEGER NOT NULL,
    card_count    INTEGER NOT NULL DEFAULT 0,
    sync_version  INTEGER NOT NULL DEFAULT 0,
    created       TEXT NOT NULL,
    modified      TEXT NOT NULL,
    deleted       TEXT,
    UNIQUE (workspace_id, name)
);

CREATE INDEX IF NOT EXISTS idx_tags_owner_workspace
    ON tags(owner_id, workspace_id);
";
