//! Reply text and button layouts.

use ballot_types::events::{Button, Keyboard, Outbound};
use ballot_types::models::{MediaKind, Nomination, Nominee, NomineeResult};
use ballot_types::payload::ButtonPayload;

/// Transports cap message length; results beyond this are cut.
pub(crate) const MAX_TEXT_CHARS: usize = 4000;

pub(crate) const HELP_TEXT: &str = "Hi! This bot runs votes across nominations inside rooms.\n\n\
Commands:\n\
/create_room Title | Password – create your own room\n\
/my_rooms – list the rooms you own\n\
/room ID Password – join a room as a member\n\
/nominations – show the nominations of the active room (with IDs)\n\
/add_nomination roomID | Title | Description – add a nomination (room owner only)\n\
/add_nominee nominationID | Name – add a nominee\n\
/set_nominee_media nomineeID – attach or replace a nominee's photo/video\n\
/delete_nomination nominationID – delete a nomination\n\
/delete_nominee nomineeID – delete a nominee\n\
/results nominationID – results of one nomination (room owner only)";

pub(crate) fn back_button() -> Button {
    Button::new("⬅️ Back to nominations", ButtonPayload::BackToNominations)
}

pub(crate) fn back_keyboard() -> Keyboard {
    vec![vec![back_button()]]
}

pub(crate) fn nominations_list(chat_id: i64, nominations: &[Nomination], is_owner: bool) -> Outbound {
    if nominations.is_empty() {
        return Outbound::text(chat_id, "This room has no nominations yet.");
    }

    let mut text = String::from("Nominations in this room:\n");
    let mut rows = Vec::with_capacity(nominations.len());

    for nomination in nominations {
        text.push_str(&format!("ID {} — {}\n", nomination.id, nomination.name));

        let mut row = vec![Button::new(
            "🗳 Open",
            ButtonPayload::OpenNomination(nomination.id),
        )];
        if is_owner {
            row.push(Button::new("📊 Results", ButtonPayload::Results(nomination.id)));
        }
        rows.push(row);
    }

    text.push_str("\nUse these IDs in commands:\n");
    text.push_str("/add_nominee nominationID | Name\n");
    text.push_str("/delete_nomination nominationID\n");
    text.push_str("/results nominationID\n");

    Outbound::text_with_buttons(chat_id, text, rows)
}

/// Header, owner controls, then one card per nominee.
pub(crate) fn nominee_cards(
    chat_id: i64,
    nomination_id: i64,
    nomination_name: Option<&str>,
    nominees: &[Nominee],
    is_owner: bool,
) -> Vec<Outbound> {
    let mut out = Vec::with_capacity(nominees.len() + 3);

    let header = match nomination_name {
        Some(name) => format!("🏆 Nomination: {} (ID {})", name, nomination_id),
        None => format!("🏆 Nomination ID {}", nomination_id),
    };
    out.push(Outbound::text(chat_id, header));

    if is_owner {
        out.push(Outbound::text_with_buttons(
            chat_id,
            "Manage this nomination:",
            vec![
                vec![Button::new(
                    "➕ Add nominee",
                    ButtonPayload::AddNominee(nomination_id),
                )],
                vec![back_button()],
            ],
        ));
    }

    if nominees.is_empty() {
        out.push(Outbound::text_with_buttons(
            chat_id,
            "This nomination has no nominees yet.",
            back_keyboard(),
        ));
        return out;
    }

    for nominee in nominees {
        let mut rows = vec![vec![Button::new("✅ Vote", ButtonPayload::Vote(nominee.id))]];
        if is_owner {
            rows.push(vec![
                Button::new("🖼 Media", ButtonPayload::SetMedia(nominee.id)),
                Button::new("🗑 Delete", ButtonPayload::DeleteNominee(nominee.id)),
            ]);
        }
        rows.push(vec![back_button()]);

        let caption = format!(
            "ID {} — {}\n\nPress the button to cast your vote.",
            nominee.id, nominee.name
        );

        let card = match &nominee.media {
            Some(media) if media.kind == MediaKind::Photo => Outbound::Photo {
                chat_id,
                file_ref: media.file_ref.clone(),
                caption,
                buttons: Some(rows),
            },
            Some(media) => Outbound::Video {
                chat_id,
                file_ref: media.file_ref.clone(),
                caption,
                buttons: Some(rows),
            },
            None => Outbound::text_with_buttons(chat_id, caption, rows),
        };
        out.push(card);
    }

    out
}

pub(crate) fn results_text(
    room_id: i64,
    room_title: Option<&str>,
    nomination_id: i64,
    nomination_name: Option<&str>,
    results: &[NomineeResult],
) -> String {
    let room_title = room_title.map_or_else(|| format!("ID {}", room_id), str::to_string);
    let nomination_name =
        nomination_name.map_or_else(|| format!("ID {}", nomination_id), str::to_string);

    let mut text = format!(
        "Voting results\nRoom: {} (ID {})\nNomination: {} (ID {})\n\n",
        room_title, room_id, nomination_name, nomination_id
    );

    if results.is_empty() {
        text.push_str("This nomination has no nominees yet.\n");
    } else {
        for row in results {
            text.push_str(&format!(
                "• {} (ID {}) — {} vote(s)\n",
                row.name, row.id, row.votes
            ));
        }
    }

    truncate(text, MAX_TEXT_CHARS)
}

/// Cuts on a character boundary and marks the cut.
pub(crate) fn truncate(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("\n\n(truncated, too much text)");
    cut
}
