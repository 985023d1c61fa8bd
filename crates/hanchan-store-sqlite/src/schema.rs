//! SQL schema for the hanchan SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    group_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    invite_code TEXT NOT NULL UNIQUE,
    created_by  TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL
);

-- Exactly one of user_id / guest_name is set.
CREATE TABLE IF NOT EXISTS group_members (
    group_id   TEXT NOT NULL REFERENCES groups(group_id) ON DELETE CASCADE,
    user_id    TEXT REFERENCES users(user_id),
    guest_name TEXT,
    role       TEXT NOT NULL DEFAULT 'member',   -- 'admin' | 'member'
    joined_at  TEXT NOT NULL,
    UNIQUE (group_id, user_id),
    CHECK  ((user_id IS NULL) != (guest_name IS NULL))
);

-- One row per group, written with the defaults when the group is created.
CREATE TABLE IF NOT EXISTS group_rules (
    group_id     TEXT PRIMARY KEY REFERENCES groups(group_id) ON DELETE CASCADE,
    game_type    TEXT    NOT NULL DEFAULT '東南',
    start_score  INTEGER NOT NULL,
    return_score INTEGER NOT NULL,
    uma_first    INTEGER NOT NULL,
    uma_second   INTEGER NOT NULL,
    uma_third    INTEGER NOT NULL,
    uma_fourth   INTEGER NOT NULL,
    has_oka      INTEGER NOT NULL,
    updated_at   TEXT    NOT NULL
);

-- group_id NULL means free play; those sessions carry their own rules_json.
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    group_id   TEXT REFERENCES groups(group_id),
    date       TEXT NOT NULL,   -- YYYY-MM-DD
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    rules_json TEXT
);

CREATE TABLE IF NOT EXISTS session_players (
    player_id  TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
    user_id    TEXT REFERENCES users(user_id),
    guest_name TEXT,
    seat_index INTEGER NOT NULL,
    UNIQUE (session_id, seat_index),
    CHECK  ((user_id IS NULL) != (guest_name IS NULL))
);

CREATE TABLE IF NOT EXISTS games (
    game_id     TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
    game_number INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (session_id, game_number)
);

-- raw_score / rank are NULL until entered / derivable.
CREATE TABLE IF NOT EXISTS game_results (
    result_id TEXT PRIMARY KEY,
    game_id   TEXT NOT NULL REFERENCES games(game_id) ON DELETE CASCADE,
    player_id TEXT NOT NULL REFERENCES session_players(player_id) ON DELETE CASCADE,
    seat      INTEGER NOT NULL,
    raw_score INTEGER,
    rank      INTEGER,
    score     INTEGER NOT NULL DEFAULT 0,
    UNIQUE (game_id, player_id)
);

CREATE TABLE IF NOT EXISTS yakuman (
    yakuman_id TEXT PRIMARY KEY,
    game_id    TEXT NOT NULL REFERENCES games(game_id) ON DELETE CASCADE,
    player_id  TEXT NOT NULL REFERENCES session_players(player_id) ON DELETE CASCADE,
    kind       TEXT NOT NULL,   -- Japanese yakuman name
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_group_idx   ON sessions(group_id);
CREATE INDEX IF NOT EXISTS sessions_date_idx    ON sessions(date);
CREATE INDEX IF NOT EXISTS players_user_idx     ON session_players(user_id);
CREATE INDEX IF NOT EXISTS games_session_idx    ON games(session_id);
CREATE INDEX IF NOT EXISTS results_game_idx     ON game_results(game_id);
CREATE INDEX IF NOT EXISTS yakuman_game_idx     ON yakuman(game_id);

PRAGMA user_version = 1;
";
