//! Row mappers from SQLite rows to the shared domain types. Column order is
//! fixed by the SELECT lists in `queries.rs`.

use ballot_types::models::{Media, MediaKind, Nomination, Nominee, NomineeResult, Room};
use rusqlite::Row;
use rusqlite::types::Type;

pub(crate) const ROOM_COLUMNS: &str = "id, owner_user_id, title, password, created_at";
pub(crate) const NOMINEE_COLUMNS: &str = "id, nomination_id, name, media_file_id, media_type";

pub(crate) fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get(0)?,
        owner_user_id: row.get(1)?,
        title: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn nomination_from_row(row: &Row<'_>) -> rusqlite::Result<Nomination> {
    Ok(Nomination {
        id: row.get(0)?,
        room_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
    })
}

pub(crate) fn nominee_from_row(row: &Row<'_>) -> rusqlite::Result<Nominee> {
    let file_ref: Option<String> = row.get(3)?;
    let kind: Option<String> = row.get(4)?;

    let media = match (file_ref, kind) {
        (Some(file_ref), Some(kind)) if !file_ref.is_empty() => {
            let kind = kind.parse::<MediaKind>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })?;
            Some(Media { file_ref, kind })
        }
        _ => None,
    };

    Ok(Nominee {
        id: row.get(0)?,
        nomination_id: row.get(1)?,
        name: row.get(2)?,
        media,
    })
}

pub(crate) fn result_from_row(row: &Row<'_>) -> rusqlite::Result<NomineeResult> {
    Ok(NomineeResult {
        id: row.get(0)?,
        name: row.get(1)?,
        votes: row.get(2)?,
    })
}
