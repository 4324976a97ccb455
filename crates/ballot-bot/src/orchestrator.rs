use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use ballot_db::Database;
use ballot_types::events::{ButtonEvent, InboundEvent, Outbound, TextEvent};
use ballot_types::models::MediaKind;
use ballot_types::payload::ButtonPayload;

use crate::commands::{Command, parse_id, split_loose_args, split_pipe_args, split_room_args};
use crate::error::{BotError, OrNotFound, optional};
use crate::hashing::hash_user_id;
use crate::render;
use crate::session::{Pending, SessionStore};

const JOIN_FIRST: &str = "Join a room first: /room ID Password";
const NO_ROOM_ACCESS: &str = "You don't have access to this room. Join it first with /room.";

type Replies = Result<Vec<Outbound>, BotError>;

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Salt mixed into vote pseudonyms. Changing it orphans existing votes.
    pub vote_salt: String,
    /// File reference sent as a picture with the /start text, if set.
    pub start_photo: Option<String>,
}

/// Turns one inbound event into storage calls, a session update and replies.
///
/// Nothing about permissions is remembered between events: every room-scoped
/// action looks ownership or membership up again.
pub struct Orchestrator {
    db: Arc<Database>,
    sessions: Arc<SessionStore>,
    config: BotConfig,
}

impl Orchestrator {
    pub fn new(db: Arc<Database>, sessions: Arc<SessionStore>, config: BotConfig) -> Self {
        Self {
            db,
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn handle(&self, event: InboundEvent) -> Vec<Outbound> {
        let (user_id, chat_id) = (event.sender_id(), event.chat_id());

        let result = match &event {
            InboundEvent::Text(ev) => self.handle_text(ev),
            InboundEvent::Button(ev) => self.handle_button(ev),
        };

        match result {
            Ok(replies) => replies,
            Err(BotError::Storage(e)) => {
                error!("Storage failure while handling event from {}: {}", user_id, e);
                vec![Outbound::text(chat_id, crate::error::GENERIC_FAILURE)]
            }
            Err(e) => {
                debug!("Rejected event from {}: {}", user_id, e);
                vec![Outbound::text(chat_id, e.user_message())]
            }
        }
    }

    // -- Messages --

    fn handle_text(&self, ev: &TextEvent) -> Replies {
        let session = self.sessions.get(ev.sender_id);

        // Pending expectations go first, media before names.
        if let Some(nominee_id) = session.awaiting_media() {
            if ev.has_media() {
                return self.attach_media(ev, nominee_id);
            }
        }

        if let Some(nomination_id) = session.awaiting_nominee_name() {
            if !ev.is_command && !ev.text.is_empty() {
                return self.create_nominee_from_text(ev, nomination_id);
            }
        }

        if ev.is_command {
            return match Command::parse(&ev.command_name) {
                Some(command) => self.dispatch_command(command, ev),
                None => Ok(vec![Outbound::text(
                    ev.chat_id,
                    "Unknown command. Try /start",
                )]),
            };
        }

        if ev.text.to_lowercase().contains("nomination") {
            return Ok(vec![Outbound::text(
                ev.chat_id,
                "To see the nominations of a room use /nominations (after /room).",
            )]);
        }

        Ok(vec![])
    }

    fn dispatch_command(&self, command: Command, ev: &TextEvent) -> Replies {
        let args = ev.command_args.trim();
        match command {
            Command::Start => Ok(vec![self.start_message(ev.chat_id)]),
            Command::Help => Ok(vec![Outbound::text(
                ev.chat_id,
                "See /start, everything is listed there 🙂",
            )]),
            Command::CreateRoom => self.create_room(ev, args),
            Command::MyRooms => self.my_rooms(ev),
            Command::JoinRoom => self.join_room(ev, args),
            Command::Nominations => {
                let session = self.sessions.get(ev.sender_id);
                match session.active_room {
                    Some(room_id) => self.nominations_list(ev.chat_id, ev.sender_id, room_id),
                    None => Ok(vec![Outbound::text(ev.chat_id, JOIN_FIRST)]),
                }
            }
            Command::AddNomination => self.add_nomination(ev, args),
            Command::AddNominee => self.add_nominee(ev, args),
            Command::SetNomineeMedia => self.set_nominee_media(ev, args),
            Command::DeleteNomination => self.delete_nomination(ev, args),
            Command::DeleteNominee => self.delete_nominee(ev, args),
            Command::Results => self.results_command(ev, args),
        }
    }

    fn start_message(&self, chat_id: i64) -> Outbound {
        match &self.config.start_photo {
            Some(file_ref) => Outbound::Photo {
                chat_id,
                file_ref: file_ref.clone(),
                caption: render::HELP_TEXT.to_string(),
                buttons: None,
            },
            None => Outbound::text(chat_id, render::HELP_TEXT),
        }
    }

    fn create_room(&self, ev: &TextEvent, args: &str) -> Replies {
        if args.is_empty() {
            return Err(BotError::Validation(
                "Usage: /create_room Title | Password\n\nExample:\n/create_room New Year 2025 | secret123"
                    .into(),
            ));
        }

        let parts = split_pipe_args(args, 2);
        let [title, password] = parts[..] else {
            return Err(BotError::Validation(
                "Give both a title and a password, separated by '|'.".into(),
            ));
        };

        let room_id = self.db.create_room(ev.sender_id, title, password)?;
        info!("User {} created room {}", ev.sender_id, room_id);

        Ok(vec![Outbound::text(
            ev.chat_id,
            format!(
                "Room created! 🎉\nID: {}\nTitle: {}\nPassword: {}\n\n\
                 Share the ID and password with the members.\n\
                 To join as a member: /room {} {}",
                room_id, title, password, room_id, password
            ),
        )])
    }

    fn my_rooms(&self, ev: &TextEvent) -> Replies {
        let rooms = self.db.list_rooms_by_owner(ev.sender_id)?;
        if rooms.is_empty() {
            return Ok(vec![Outbound::text(
                ev.chat_id,
                "You don't have any rooms yet. Create one: /create_room Title | Password",
            )]);
        }

        let mut text = String::from("Your rooms:\n");
        for room in &rooms {
            text.push_str(&format!("• ID: {} — {}\n", room.id, room.title));
        }
        text.push_str("\nTo join a room as a member:\n/room ID Password");

        Ok(vec![Outbound::text(ev.chat_id, text)])
    }

    fn join_room(&self, ev: &TextEvent, args: &str) -> Replies {
        if args.is_empty() {
            return Err(BotError::Validation(
                "Usage: /room ID Password\nExample: /room 1 secret123".into(),
            ));
        }

        let Some((raw_id, password)) = split_room_args(args) else {
            return Err(BotError::Validation("Give the room ID and the password.".into()));
        };
        let room_id = parse_id(raw_id, "The room ID")?;

        let room = self
            .db
            .get_room_by_credentials(room_id, password)
            .or_not_found("Room not found or wrong password.")?;

        self.sessions
            .update(ev.sender_id, |s| s.active_room = Some(room.id));
        info!("User {} joined room {}", ev.sender_id, room.id);

        Ok(vec![Outbound::text(
            ev.chat_id,
            format!(
                "You joined the room: {} (ID {})\nNow you can see the nominations with /nominations",
                room.title, room.id
            ),
        )])
    }

    fn add_nomination(&self, ev: &TextEvent, args: &str) -> Replies {
        if args.is_empty() {
            return Err(BotError::Validation(
                "Usage: /add_nomination roomID | Title | Description (optional)\n\n\
                 Example:\n/add_nomination 1 | Best developer | For top-notch code"
                    .into(),
            ));
        }

        let parts = split_pipe_args(args, 3);
        if parts.len() < 2 {
            return Err(BotError::Validation(
                "Give at least the roomID and a title, separated by '|'.".into(),
            ));
        }
        let room_id = parse_id(parts[0], "roomID")?;
        let title = parts[1];
        let description = parts.get(2).copied().unwrap_or_default();

        if !self.db.is_room_owner(room_id, ev.sender_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can add nominations.".into(),
            ));
        }

        let nomination_id = self.db.create_nomination(room_id, title, description)?;
        info!("Nomination {} added to room {}", nomination_id, room_id);

        Ok(vec![Outbound::text(
            ev.chat_id,
            format!(
                "Nomination added ✅ (ID {})\nYou can see all IDs with /nominations.",
                nomination_id
            ),
        )])
    }

    fn add_nominee(&self, ev: &TextEvent, args: &str) -> Replies {
        if args.is_empty() {
            return Err(BotError::Validation(
                "Usage: /add_nominee nominationID | Name\nExample:\n/add_nominee 1 | John Smith"
                    .into(),
            ));
        }

        let parts = split_pipe_args(args, 2);
        let [raw_id, name] = parts[..] else {
            return Err(BotError::Validation(
                "Give the nominationID and a name, separated by '|'.".into(),
            ));
        };
        let nomination_id = parse_id(raw_id, "nominationID")?;

        if !self.db.is_nomination_owner(nomination_id, ev.sender_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can add nominees.".into(),
            ));
        }

        let nominee_id = self.db.create_nominee(nomination_id, name)?;

        Ok(vec![Outbound::text(
            ev.chat_id,
            format!(
                "Nominee added ✅ (ID {})\n\
                 To attach or replace its media, use /set_nominee_media {}",
                nominee_id, nominee_id
            ),
        )])
    }

    fn set_nominee_media(&self, ev: &TextEvent, args: &str) -> Replies {
        if args.is_empty() {
            return Err(BotError::Validation(
                "Usage: /set_nominee_media nomineeID\n\n\
                 After the command, send one photo or video for this nominee.\n\
                 You can repeat the command; the media is replaced."
                    .into(),
            ));
        }

        let nominee_id = parse_id(args, "nomineeID")?;
        self.prime_media(ev.sender_id, nominee_id)?;

        Ok(vec![Outbound::text(
            ev.chat_id,
            "OK! Now send one photo or video for this nominee in your next message.",
        )])
    }

    fn delete_nomination(&self, ev: &TextEvent, args: &str) -> Replies {
        if args.is_empty() {
            return Err(BotError::Validation(
                "Usage: /delete_nomination nominationID\n\n\
                 Nomination IDs are listed by /nominations."
                    .into(),
            ));
        }

        let nomination_id = parse_id(args, "nominationID")?;

        if !self.db.is_nomination_owner(nomination_id, ev.sender_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can delete nominations.".into(),
            ));
        }

        if !self.db.delete_nomination(nomination_id)? {
            return Err(BotError::NotFound("No nomination with that ID.".into()));
        }
        info!("Nomination {} deleted by {}", nomination_id, ev.sender_id);

        Ok(vec![Outbound::text(
            ev.chat_id,
            "Nomination deleted together with its nominees and votes ✅",
        )])
    }

    fn delete_nominee(&self, ev: &TextEvent, args: &str) -> Replies {
        if args.is_empty() {
            return Err(BotError::Validation(
                "Usage: /delete_nominee nomineeID\n\n\
                 The nominee ID is shown on its card when you open the nomination."
                    .into(),
            ));
        }

        let nominee_id = parse_id(args, "nomineeID")?;
        self.remove_nominee(ev.sender_id, nominee_id)?;

        Ok(vec![Outbound::text(
            ev.chat_id,
            "Nominee deleted together with its votes ✅",
        )])
    }

    fn results_command(&self, ev: &TextEvent, args: &str) -> Replies {
        let parts = split_loose_args(args, 2);

        let (room_id, nomination_id) = match parts[..] {
            [] => {
                return Err(BotError::Validation(
                    "Usage:\n\
                     /results nominationID – results of one nomination\n\
                     /results roomID nominationID – the same, naming the room explicitly\n\n\
                     Nomination IDs are listed by /nominations."
                        .into(),
                ));
            }
            [raw_nomination] => {
                let nomination_id = parse_id(raw_nomination, "nominationID")?;
                let room_id = self
                    .db
                    .nomination_room_id(nomination_id)
                    .or_not_found("Nomination not found.")?;
                (room_id, nomination_id)
            }
            [raw_room, raw_nomination, ..] => {
                let room_id = parse_id(raw_room, "roomID")?;
                let nomination_id = parse_id(raw_nomination, "nominationID")?;
                if !self.db.nomination_in_room(nomination_id, room_id)? {
                    return Err(BotError::NotFound(
                        "That nomination doesn't belong to this room.".into(),
                    ));
                }
                (room_id, nomination_id)
            }
        };

        let text = self.results_text(ev.sender_id, room_id, nomination_id)?;
        Ok(vec![Outbound::text(ev.chat_id, text)])
    }

    // -- Multi-step input --

    fn attach_media(&self, ev: &TextEvent, nominee_id: i64) -> Replies {
        self.sessions.update(ev.sender_id, |s| s.pending = Pending::Idle);

        if !self.db.is_nominee_owner(nominee_id, ev.sender_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can change nominee media.".into(),
            ));
        }

        // The last photo entry is the largest size.
        let (file_ref, kind) = match (ev.photo_refs.last(), &ev.video_ref) {
            (Some(photo), _) => (photo, MediaKind::Photo),
            (None, Some(video)) => (video, MediaKind::Video),
            (None, None) => {
                return Err(BotError::Validation(
                    "Send a photo or a video. Command: /set_nominee_media nomineeID".into(),
                ));
            }
        };

        if !self.db.update_nominee_media(nominee_id, file_ref, kind)? {
            return Err(BotError::NotFound("This nominee no longer exists.".into()));
        }
        info!("Attached {} to nominee {}", kind, nominee_id);

        Ok(vec![Outbound::text(ev.chat_id, "Nominee media saved ✅")])
    }

    fn create_nominee_from_text(&self, ev: &TextEvent, nomination_id: i64) -> Replies {
        // Leave the name step no matter what, so bad input can't loop the prompt.
        self.sessions.update(ev.sender_id, |s| s.pending = Pending::Idle);

        let name = ev.text.trim();
        if name.is_empty() {
            return Err(BotError::Validation(
                "The nominee name can't be empty. Press \"Add nominee\" to try again.".into(),
            ));
        }

        if !self.db.is_nomination_owner(nomination_id, ev.sender_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can add nominees.".into(),
            ));
        }

        let nominee_id = self.db.create_nominee(nomination_id, name)?;
        self.sessions.update(ev.sender_id, |s| {
            s.pending = Pending::AwaitingMedia(nominee_id)
        });

        Ok(vec![Outbound::text_with_buttons(
            ev.chat_id,
            format!(
                "Nominee «{}» added ✅\nNow send a photo or video for it in one message (optional).",
                name
            ),
            render::back_keyboard(),
        )])
    }

    // -- Buttons --

    fn handle_button(&self, ev: &ButtonEvent) -> Replies {
        let payload = match ev.payload.parse::<ButtonPayload>() {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Ignoring button from {}: {}", ev.sender_id, e);
                return Ok(vec![]);
            }
        };

        match payload {
            ButtonPayload::BackToNominations => self.back_to_nominations(ev),
            ButtonPayload::OpenNomination(nomination_id) => {
                self.open_nomination(ev, nomination_id)
            }
            ButtonPayload::Vote(nominee_id) => self.vote(ev, nominee_id),
            ButtonPayload::Results(nomination_id) => {
                let room_id = self
                    .db
                    .nomination_room_id(nomination_id)
                    .or_not_found("Nomination not found.")?;
                let text = self.results_text(ev.sender_id, room_id, nomination_id)?;
                Ok(vec![Outbound::text_with_buttons(
                    ev.chat_id,
                    text,
                    render::back_keyboard(),
                )])
            }
            ButtonPayload::AddNominee(nomination_id) => {
                if !self.db.is_nomination_owner(nomination_id, ev.sender_id)? {
                    return Err(BotError::PermissionDenied(
                        "Only the room owner can add nominees.".into(),
                    ));
                }
                self.sessions.update(ev.sender_id, |s| {
                    s.pending = Pending::AwaitingNomineeName(nomination_id)
                });
                Ok(vec![Outbound::text_with_buttons(
                    ev.chat_id,
                    "Send the new nominee's name as one text message.",
                    render::back_keyboard(),
                )])
            }
            ButtonPayload::SetMedia(nominee_id) => {
                self.prime_media(ev.sender_id, nominee_id)?;
                Ok(vec![Outbound::text_with_buttons(
                    ev.chat_id,
                    "OK! Now send one photo or video for this nominee in your next message.",
                    render::back_keyboard(),
                )])
            }
            ButtonPayload::DeleteNominee(nominee_id) => {
                self.remove_nominee(ev.sender_id, nominee_id)?;
                Ok(vec![Outbound::text_with_buttons(
                    ev.chat_id,
                    "Nominee deleted together with its votes ✅\n\
                     Open the nomination again to see the updated list.",
                    render::back_keyboard(),
                )])
            }
        }
    }

    fn back_to_nominations(&self, ev: &ButtonEvent) -> Replies {
        let session = self
            .sessions
            .update(ev.sender_id, |s| {
                s.pending = Pending::Idle;
                *s
            });

        match session.active_room {
            Some(room_id) => self.nominations_list(ev.chat_id, ev.sender_id, room_id),
            None => Ok(vec![Outbound::text(ev.chat_id, JOIN_FIRST)]),
        }
    }

    fn open_nomination(&self, ev: &ButtonEvent, nomination_id: i64) -> Replies {
        let room_id = self
            .db
            .nomination_room_id(nomination_id)
            .or_not_found("This nomination no longer exists.")?;
        self.require_membership(ev.sender_id, room_id)?;

        let name = optional(self.db.nomination_name(nomination_id))?;
        let nominees = self.db.list_nominees(nomination_id)?;
        let is_owner = self.owner_flag(self.db.is_nomination_owner(nomination_id, ev.sender_id));

        Ok(render::nominee_cards(
            ev.chat_id,
            nomination_id,
            name.as_deref(),
            &nominees,
            is_owner,
        ))
    }

    fn vote(&self, ev: &ButtonEvent, nominee_id: i64) -> Replies {
        let (nomination_id, room_id) = self
            .db
            .nominee_nomination_and_room(nominee_id)
            .or_not_found("This nominee no longer exists.")?;
        self.require_membership(ev.sender_id, room_id)?;

        let user_hash = hash_user_id(&self.config.vote_salt, ev.sender_id);
        self.db
            .record_vote(&user_hash, nomination_id, nominee_id, Utc::now())?;
        debug!("Vote recorded in nomination {}", nomination_id);

        let name = optional(self.db.nominee_name(nominee_id))?
            .unwrap_or_else(|| "the selected nominee".to_string());

        let mut replies = vec![Outbound::text(
            ev.chat_id,
            format!("Vote accepted! You voted for: {}", name),
        )];
        replies.extend(self.nominations_list(ev.chat_id, ev.sender_id, room_id)?);
        Ok(replies)
    }

    // -- Shared steps --

    fn nominations_list(&self, chat_id: i64, user_id: i64, room_id: i64) -> Replies {
        let nominations = self.db.list_nominations(room_id)?;
        let is_owner = self.owner_flag(self.db.is_room_owner(room_id, user_id));
        Ok(vec![render::nominations_list(chat_id, &nominations, is_owner)])
    }

    /// Owner-only tally text for a nomination already known to sit in `room_id`.
    fn results_text(&self, user_id: i64, room_id: i64, nomination_id: i64) -> Result<String, BotError> {
        if !self.db.is_room_owner(room_id, user_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can view results.".into(),
            ));
        }

        let room_title = optional(self.db.room_title(room_id))?;
        let nomination_name = optional(self.db.nomination_name(nomination_id))?;
        let results = self.db.results_by_nomination(nomination_id)?;

        Ok(render::results_text(
            room_id,
            room_title.as_deref(),
            nomination_id,
            nomination_name.as_deref(),
            &results,
        ))
    }

    fn prime_media(&self, user_id: i64, nominee_id: i64) -> Result<(), BotError> {
        if !self.db.is_nominee_owner(nominee_id, user_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can change nominee media.".into(),
            ));
        }
        self.sessions
            .update(user_id, |s| s.pending = Pending::AwaitingMedia(nominee_id));
        Ok(())
    }

    fn remove_nominee(&self, user_id: i64, nominee_id: i64) -> Result<(), BotError> {
        if !self.db.is_nominee_owner(nominee_id, user_id)? {
            return Err(BotError::PermissionDenied(
                "Only the room owner can delete nominees.".into(),
            ));
        }
        if !self.db.delete_nominee(nominee_id)? {
            return Err(BotError::NotFound("No nominee with that ID.".into()));
        }
        info!("Nominee {} deleted by {}", nominee_id, user_id);
        Ok(())
    }

    fn require_membership(&self, user_id: i64, room_id: i64) -> Result<(), BotError> {
        if self.sessions.get(user_id).active_room != Some(room_id) {
            return Err(BotError::PermissionDenied(NO_ROOM_ACCESS.into()));
        }
        Ok(())
    }

    /// Owner-only buttons are cosmetic; a failed check just hides them.
    fn owner_flag(&self, check: Result<bool, ballot_db::DbError>) -> bool {
        check.unwrap_or_else(|e| {
            warn!("Ownership check failed, hiding owner controls: {}", e);
            false
        })
    }
}
