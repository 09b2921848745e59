//! SQL schema for the AIGoal SQLite store.
//!
//! Executed once at connection startup. The schema version is recorded in
//! `PRAGMA user_version` for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Goal ids are assigned as MAX(goal_id) + 1 inside the creating transaction.
-- Goals are never deleted, so ids are never reused.
CREATE TABLE IF NOT EXISTS goals (
    goal_id                 INTEGER PRIMARY KEY,
    title                   TEXT    NOT NULL,
    description             TEXT    NOT NULL,
    ai_suggestion           TEXT    NOT NULL DEFAULT '',
    creator                 TEXT    NOT NULL,   -- 0x-prefixed lowercase hex
    amount                  TEXT    NOT NULL,   -- decimal u128
    status                  INTEGER NOT NULL DEFAULT 0 CHECK (status IN (0, 1, 2)),
    created_at              TEXT    NOT NULL,
    deadline                TEXT    NOT NULL,
    comment_counter         INTEGER NOT NULL DEFAULT 0,
    progress_percentage     INTEGER NOT NULL DEFAULT 0
                            CHECK (progress_percentage BETWEEN 0 AND 100),
    progress_update_counter INTEGER NOT NULL DEFAULT 0
);

-- Witness list in declaration order. A confirmation is recorded by stamping
-- the block that carried it, so confirmations are always a subset of the
-- witnesses and each witness confirms at most once.
CREATE TABLE IF NOT EXISTS witnesses (
    goal_id         INTEGER NOT NULL REFERENCES goals(goal_id),
    position        INTEGER NOT NULL,
    witness         TEXT    NOT NULL,
    confirmed_block INTEGER,
    PRIMARY KEY (goal_id, position),
    UNIQUE (goal_id, witness)
);

CREATE TABLE IF NOT EXISTS progress_updates (
    goal_id             INTEGER NOT NULL REFERENCES goals(goal_id),
    update_id           INTEGER NOT NULL,
    content             TEXT    NOT NULL,
    proof_file_blob_id  TEXT,
    progress_percentage INTEGER NOT NULL,
    creator             TEXT    NOT NULL,
    created_at          TEXT    NOT NULL,
    PRIMARY KEY (goal_id, update_id)
);

CREATE TABLE IF NOT EXISTS comments (
    goal_id    INTEGER NOT NULL REFERENCES goals(goal_id),
    comment_id INTEGER NOT NULL,
    content    TEXT    NOT NULL,
    creator    TEXT    NOT NULL,
    created_at TEXT    NOT NULL,
    PRIMARY KEY (goal_id, comment_id)
);

-- One agent per goal, one goal per agent.
CREATE TABLE IF NOT EXISTS agents (
    agent_id       TEXT    PRIMARY KEY,
    goal_id        INTEGER NOT NULL UNIQUE REFERENCES goals(goal_id),
    name           TEXT    NOT NULL,
    character_json TEXT    NOT NULL DEFAULT '',
    created_at     TEXT    NOT NULL,
    updated_at     TEXT    NOT NULL
);

-- Append-only. One row per committed mutation.
CREATE TABLE IF NOT EXISTS events (
    block_number     INTEGER NOT NULL,
    log_index        INTEGER NOT NULL,
    transaction_hash TEXT    NOT NULL UNIQUE,
    event_name       TEXT    NOT NULL,   -- EventPayload discriminant
    goal_id          INTEGER NOT NULL,
    actor            TEXT    NOT NULL,
    args_json        TEXT    NOT NULL,   -- payload arguments only
    recorded_at      TEXT    NOT NULL,
    PRIMARY KEY (block_number, log_index)
);

CREATE INDEX IF NOT EXISTS goals_creator_idx    ON goals(creator);
CREATE INDEX IF NOT EXISTS goals_status_idx     ON goals(status);
CREATE INDEX IF NOT EXISTS witnesses_witness_idx ON witnesses(witness);
CREATE INDEX IF NOT EXISTS events_actor_idx     ON events(actor);

PRAGMA user_version = 1;
";
