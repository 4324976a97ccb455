use ballot_types::models::{MediaKind, Nomination, Nominee, NomineeResult, Room};
use chrono::{DateTime, Utc};

use crate::models::{
    NOMINEE_COLUMNS, ROOM_COLUMNS, nomination_from_row, nominee_from_row, result_from_row,
    room_from_row,
};
use crate::{Database, DbError, Result};

impl Database {
    // -- Rooms --

    pub fn create_room(&self, owner_id: i64, title: &str, password: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rooms (owner_user_id, title, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                (owner_id, title, password, Utc::now()),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first.
    pub fn list_rooms_by_owner(&self, owner_id: i64) -> Result<Vec<Room>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS} FROM rooms WHERE owner_user_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rooms = stmt
                .query_map([owner_id], room_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rooms)
        })
    }

    /// Plain equality on the stored password.
    pub fn get_room_by_credentials(&self, room_id: i64, password: &str) -> Result<Room> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1 AND password = ?2"),
                (room_id, password),
                room_from_row,
            )
            .found()
        })
    }

    pub fn is_room_owner(&self, room_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let owns = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM rooms WHERE id = ?1 AND owner_user_id = ?2)",
                (room_id, user_id),
                |row| row.get(0),
            )?;
            Ok(owns)
        })
    }

    pub fn room_title(&self, room_id: i64) -> Result<String> {
        self.with_conn(|conn| {
            conn.query_row("SELECT title FROM rooms WHERE id = ?1", [room_id], |row| {
                row.get(0)
            })
            .found()
        })
    }

    // -- Nominations --

    pub fn create_nomination(&self, room_id: i64, name: &str, description: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO nominations (room_id, name, description) VALUES (?1, ?2, ?3)",
                (room_id, name, description),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_nominations(&self, room_id: i64) -> Result<Vec<Nomination>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, name, description FROM nominations WHERE room_id = ?1 ORDER BY id",
            )?;
            let nominations = stmt
                .query_map([room_id], nomination_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(nominations)
        })
    }

    /// Returns false when nothing matched. Nominees and their votes go with it.
    pub fn delete_nomination(&self, nomination_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM nominations WHERE id = ?1", [nomination_id])?;
            Ok(affected > 0)
        })
    }

    pub fn is_nomination_owner(&self, nomination_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let owns = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1
                    FROM nominations nom
                    JOIN rooms r ON nom.room_id = r.id
                    WHERE nom.id = ?1 AND r.owner_user_id = ?2
                 )",
                (nomination_id, user_id),
                |row| row.get(0),
            )?;
            Ok(owns)
        })
    }

    pub fn nomination_room_id(&self, nomination_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT room_id FROM nominations WHERE id = ?1",
                [nomination_id],
                |row| row.get(0),
            )
            .found()
        })
    }

    pub fn nomination_in_room(&self, nomination_id: i64, room_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM nominations WHERE id = ?1 AND room_id = ?2)",
                (nomination_id, room_id),
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }

    pub fn nomination_name(&self, nomination_id: i64) -> Result<String> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT name FROM nominations WHERE id = ?1",
                [nomination_id],
                |row| row.get(0),
            )
            .found()
        })
    }

    // -- Nominees --

    pub fn create_nominee(&self, nomination_id: i64, name: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO nominees (nomination_id, name) VALUES (?1, ?2)",
                (nomination_id, name),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_nominees(&self, nomination_id: i64) -> Result<Vec<Nominee>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOMINEE_COLUMNS} FROM nominees WHERE nomination_id = ?1 ORDER BY id"
            ))?;
            let nominees = stmt
                .query_map([nomination_id], nominee_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(nominees)
        })
    }

    /// Returns false when nothing matched. Only this nominee's votes cascade.
    pub fn delete_nominee(&self, nominee_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM nominees WHERE id = ?1", [nominee_id])?;
            Ok(affected > 0)
        })
    }

    pub fn is_nominee_owner(&self, nominee_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let owns = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1
                    FROM nominees n
                    JOIN nominations nom ON n.nomination_id = nom.id
                    JOIN rooms r ON nom.room_id = r.id
                    WHERE n.id = ?1 AND r.owner_user_id = ?2
                 )",
                (nominee_id, user_id),
                |row| row.get(0),
            )?;
            Ok(owns)
        })
    }

    /// Replaces whatever media the nominee had. Returns false for an unknown id.
    pub fn update_nominee_media(
        &self,
        nominee_id: i64,
        file_ref: &str,
        kind: MediaKind,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE nominees SET media_file_id = ?1, media_type = ?2 WHERE id = ?3",
                (file_ref, kind.as_str(), nominee_id),
            )?;
            Ok(affected > 0)
        })
    }

    pub fn nominee_name(&self, nominee_id: i64) -> Result<String> {
        self.with_conn(|conn| {
            conn.query_row("SELECT name FROM nominees WHERE id = ?1", [nominee_id], |row| {
                row.get(0)
            })
            .found()
        })
    }

    /// Resolves `(nomination_id, room_id)` for a nominee in one query.
    pub fn nominee_nomination_and_room(&self, nominee_id: i64) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT n.nomination_id, nom.room_id
                 FROM nominees n
                 JOIN nominations nom ON n.nomination_id = nom.id
                 WHERE n.id = ?1",
                [nominee_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .found()
        })
    }

    // -- Votes / Results --

    /// Upsert keyed on `(user_hash, nomination_id)`: a second vote in the same
    /// nomination overwrites the first.
    ///
    /// The nominee is not checked against `nomination_id` here; callers derive
    /// the nomination from the nominee.
    pub fn record_vote(
        &self,
        user_hash: &str,
        nomination_id: i64,
        nominee_id: i64,
        cast_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (user_hash, nomination_id, nominee_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_hash, nomination_id) DO UPDATE SET
                     nominee_id = excluded.nominee_id,
                     created_at = excluded.created_at",
                (user_hash, nomination_id, nominee_id, cast_at),
            )?;
            Ok(())
        })
    }

    /// Every nominee of the nomination with its vote count, most votes first,
    /// ties by ascending id. Nominees nobody voted for are reported with 0.
    pub fn results_by_nomination(&self, nomination_id: i64) -> Result<Vec<NomineeResult>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT n.id, n.name, COUNT(v.id) AS votes
                 FROM nominees n
                 LEFT JOIN votes v ON v.nominee_id = n.id
                 WHERE n.nomination_id = ?1
                 GROUP BY n.id, n.name
                 ORDER BY votes DESC, n.id ASC",
            )?;
            let results = stmt
                .query_map([nomination_id], result_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(results)
        })
    }
}

/// Maps "no rows" onto [`DbError::NotFound`], keeping other failures as-is.
trait FoundExt<T> {
    fn found(self) -> Result<T>;
}

impl<T> FoundExt<T> for rusqlite::Result<T> {
    fn found(self) -> Result<T> {
        match self {
            Ok(val) => Ok(val),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(DbError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
