use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS rooms (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_user_id   INTEGER NOT NULL,
            title           TEXT NOT NULL CHECK (length(title) > 0),
            password        TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_rooms_owner
            ON rooms(owner_user_id);

        CREATE TABLE IF NOT EXISTS nominations (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            room_id         INTEGER NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            name            TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_nominations_room
            ON nominations(room_id);

        CREATE TABLE IF NOT EXISTS nominees (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            nomination_id   INTEGER NOT NULL REFERENCES nominations(id) ON DELETE CASCADE,
            name            TEXT NOT NULL,
            media_file_id   TEXT,
            media_type      TEXT CHECK (media_type IN ('photo', 'video'))
        );

        CREATE INDEX IF NOT EXISTS idx_nominees_nomination
            ON nominees(nomination_id);

        -- nomination_id is denormalised from the nominee and not a foreign key;
        -- rows go away through the nominee cascade.
        CREATE TABLE IF NOT EXISTS votes (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_hash       TEXT NOT NULL,
            nomination_id   INTEGER NOT NULL,
            nominee_id      INTEGER NOT NULL REFERENCES nominees(id) ON DELETE CASCADE,
            created_at      TEXT NOT NULL,
            UNIQUE(user_hash, nomination_id)
        );

        CREATE INDEX IF NOT EXISTS idx_votes_nominee
            ON votes(nominee_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
