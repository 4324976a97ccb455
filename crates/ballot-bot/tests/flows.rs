//! End-to-end interaction flows: inbound events in, replies out, checked
//! against what landed in an in-memory database.

use std::sync::Arc;

use ballot_bot::{BotConfig, Orchestrator, Pending, SessionStore};
use ballot_db::Database;
use ballot_types::events::{ButtonEvent, InboundEvent, Outbound, TextEvent};
use ballot_types::models::MediaKind;

const OWNER: i64 = 100;
const ALICE: i64 = 200;
const BOB: i64 = 300;

struct Harness {
    db: Arc<Database>,
    bot: Orchestrator,
}

impl Harness {
    fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let sessions = Arc::new(SessionStore::new());
        let bot = Orchestrator::new(
            db.clone(),
            sessions,
            BotConfig {
                vote_salt: "test-salt".into(),
                start_photo: None,
            },
        );
        Self { db, bot }
    }

    fn command(&self, user: i64, name: &str, args: &str) -> Vec<Outbound> {
        self.bot.handle(InboundEvent::Text(TextEvent {
            sender_id: user,
            chat_id: user,
            text: format!("/{} {}", name, args),
            is_command: true,
            command_name: name.into(),
            command_args: args.into(),
            ..Default::default()
        }))
    }

    fn text(&self, user: i64, text: &str) -> Vec<Outbound> {
        self.bot.handle(InboundEvent::Text(TextEvent {
            sender_id: user,
            chat_id: user,
            text: text.into(),
            ..Default::default()
        }))
    }

    fn photo(&self, user: i64, sizes: &[&str]) -> Vec<Outbound> {
        self.bot.handle(InboundEvent::Text(TextEvent {
            sender_id: user,
            chat_id: user,
            photo_refs: sizes.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }))
    }

    fn video(&self, user: i64, file_ref: &str) -> Vec<Outbound> {
        self.bot.handle(InboundEvent::Text(TextEvent {
            sender_id: user,
            chat_id: user,
            video_ref: Some(file_ref.into()),
            ..Default::default()
        }))
    }

    fn press(&self, user: i64, payload: &str) -> Vec<Outbound> {
        self.bot.handle(InboundEvent::Button(ButtonEvent {
            sender_id: user,
            chat_id: user,
            message_ref: None,
            payload: payload.into(),
        }))
    }

    fn pending(&self, user: i64) -> Pending {
        self.bot.sessions().get(user).pending
    }

    fn vote_rows(&self, nominee_id: i64) -> i64 {
        self.db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM votes WHERE nominee_id = ?1",
                    [nominee_id],
                    |row| row.get(0),
                )?)
            })
            .unwrap()
    }

    /// Owner creates "Party" with nomination "Best Dish" holding Pizza and Sushi.
    fn party(&self) -> Party {
        self.command(OWNER, "create_room", "Party | pw1");
        let room_id = self.db.list_rooms_by_owner(OWNER).unwrap()[0].id;

        self.command(OWNER, "add_nomination", &format!("{} | Best Dish", room_id));
        let nomination_id = self.db.list_nominations(room_id).unwrap()[0].id;

        self.command(OWNER, "add_nominee", &format!("{} | Pizza", nomination_id));
        self.command(OWNER, "add_nominee", &format!("{} | Sushi", nomination_id));
        let nominees = self.db.list_nominees(nomination_id).unwrap();

        Party {
            room_id,
            nomination_id,
            pizza: nominees[0].id,
            sushi: nominees[1].id,
        }
    }
}

struct Party {
    room_id: i64,
    nomination_id: i64,
    pizza: i64,
    sushi: i64,
}

fn only_text(replies: &[Outbound]) -> &str {
    assert_eq!(replies.len(), 1, "expected one reply, got {:?}", replies);
    replies[0].body()
}

#[test]
fn revote_moves_the_single_vote() {
    let h = Harness::new();
    let party = h.party();

    h.command(ALICE, "room", &format!("{} pw1", party.room_id));
    let replies = h.press(ALICE, &format!("vote:{}", party.pizza));
    assert!(replies[0].body().contains("Pizza"));
    h.press(ALICE, &format!("vote:{}", party.sushi));

    let results = h.db.results_by_nomination(party.nomination_id).unwrap();
    let tally: Vec<(&str, i64)> = results.iter().map(|r| (r.name.as_str(), r.votes)).collect();
    assert_eq!(tally, vec![("Sushi", 1), ("Pizza", 0)]);

    h.command(OWNER, "room", &format!("{} pw1", party.room_id));
    let text = only_text(&h.command(OWNER, "results", &party.nomination_id.to_string())).to_string();
    let sushi_at = text.find("Sushi").unwrap();
    let pizza_at = text.find("Pizza").unwrap();
    assert!(sushi_at < pizza_at);
    assert!(text.contains("1 vote(s)"));
}

#[test]
fn vote_reply_shows_nominations_again() {
    let h = Harness::new();
    let party = h.party();
    h.command(ALICE, "room", &format!("{} | pw1", party.room_id));

    let replies = h.press(ALICE, &format!("vote:{}", party.pizza));
    assert_eq!(replies.len(), 2);
    assert!(replies[1].body().contains("Best Dish"));
    // members see no results button
    assert_eq!(replies[1].buttons().unwrap()[0].len(), 1);
}

#[test]
fn deleting_nominee_drops_its_votes() {
    let h = Harness::new();
    let party = h.party();

    for user in [ALICE, BOB] {
        h.command(user, "room", &format!("{} pw1", party.room_id));
        h.press(user, &format!("vote:{}", party.pizza));
    }
    assert_eq!(h.vote_rows(party.pizza), 2);

    let replies = h.press(OWNER, &format!("delnom:{}", party.pizza));
    assert!(only_text(&replies).contains("deleted"));

    assert_eq!(h.vote_rows(party.pizza), 0);
    let results = h.db.results_by_nomination(party.nomination_id).unwrap();
    assert!(results.iter().all(|r| r.id != party.pizza));

    // deleting again reports absence; the owner chain is gone too
    let again = h.command(OWNER, "delete_nominee", &party.pizza.to_string());
    assert!(only_text(&again).starts_with("Only the room owner"));
}

#[test]
fn voting_requires_joining_the_room() {
    let h = Harness::new();
    let party = h.party();

    let replies = h.press(ALICE, &format!("vote:{}", party.pizza));
    assert!(only_text(&replies).contains("don't have access"));
    assert_eq!(h.vote_rows(party.pizza), 0);

    let wrong = h.command(ALICE, "room", &format!("{} nope", party.room_id));
    assert_eq!(only_text(&wrong), "Room not found or wrong password.");
    assert_eq!(h.bot.sessions().get(ALICE).active_room, None);
}

/// Runs the `/room` command exactly as the create-room reply spells it out.
fn join_as_advertised(h: &Harness, user: i64, create_reply: &[Outbound]) -> Vec<Outbound> {
    let hint = only_text(create_reply)
        .lines()
        .find_map(|line| line.strip_prefix("To join as a member: /room "))
        .unwrap();
    h.command(user, "room", hint)
}

#[test]
fn password_with_pipe_joins_as_advertised() {
    let h = Harness::new();
    let created = h.command(OWNER, "create_room", "Party | a|b");
    let room = &h.db.list_rooms_by_owner(OWNER).unwrap()[0];
    assert_eq!(room.password, "a|b");

    let replies = join_as_advertised(&h, ALICE, &created);
    assert!(only_text(&replies).starts_with("You joined the room: Party"));
    assert_eq!(h.bot.sessions().get(ALICE).active_room, Some(room.id));
}

#[test]
fn password_with_space_joins_as_advertised() {
    let h = Harness::new();
    let created = h.command(OWNER, "create_room", "Party | open sesame");
    let room = &h.db.list_rooms_by_owner(OWNER).unwrap()[0];
    assert_eq!(room.password, "open sesame");

    let replies = join_as_advertised(&h, ALICE, &created);
    assert!(only_text(&replies).starts_with("You joined the room: Party"));
    assert_eq!(h.bot.sessions().get(ALICE).active_room, Some(room.id));

    // only the first word is not enough
    let partial = h.command(BOB, "room", &format!("{} open", room.id));
    assert_eq!(only_text(&partial), "Room not found or wrong password.");
    assert_eq!(h.bot.sessions().get(BOB).active_room, None);
}

#[test]
fn vanished_nominee_is_reported() {
    let h = Harness::new();
    let party = h.party();
    h.command(ALICE, "room", &format!("{} pw1", party.room_id));
    h.db.delete_nominee(party.sushi).unwrap();

    let replies = h.press(ALICE, &format!("vote:{}", party.sushi));
    assert_eq!(only_text(&replies), "This nominee no longer exists.");
}

#[test]
fn results_are_owner_only() {
    let h = Harness::new();
    let party = h.party();
    h.command(ALICE, "room", &format!("{} pw1", party.room_id));

    let by_command = h.command(ALICE, "results", &party.nomination_id.to_string());
    assert_eq!(only_text(&by_command), "Only the room owner can view results.");

    let by_button = h.press(ALICE, &format!("res_nom:{}", party.nomination_id));
    assert_eq!(only_text(&by_button), "Only the room owner can view results.");

    let owner = h.press(OWNER, &format!("res_nom:{}", party.nomination_id));
    assert!(only_text(&owner).starts_with("Voting results"));
    assert_eq!(
        owner[0].buttons().unwrap()[0][0].payload,
        "back:nominations"
    );
}

#[test]
fn two_argument_results_check_the_room() {
    let h = Harness::new();
    let party = h.party();
    h.command(OWNER, "create_room", "Other | pw2");
    let other_room = h
        .db
        .list_rooms_by_owner(OWNER)
        .unwrap()
        .into_iter()
        .find(|r| r.title == "Other")
        .unwrap()
        .id;

    let ok = h.command(
        OWNER,
        "results",
        &format!("{} {}", party.room_id, party.nomination_id),
    );
    assert!(only_text(&ok).contains("Best Dish"));

    let mismatch = h.command(
        OWNER,
        "results",
        &format!("{} {}", other_room, party.nomination_id),
    );
    assert_eq!(
        only_text(&mismatch),
        "That nomination doesn't belong to this room."
    );
}

#[test]
fn non_owner_cannot_modify() {
    let h = Harness::new();
    let party = h.party();

    let replies = h.command(
        ALICE,
        "add_nomination",
        &format!("{} | Sneaky", party.room_id),
    );
    assert_eq!(
        only_text(&replies),
        "Only the room owner can add nominations."
    );
    assert_eq!(h.db.list_nominations(party.room_id).unwrap().len(), 1);

    h.command(ALICE, "delete_nomination", &party.nomination_id.to_string());
    h.press(ALICE, &format!("delnom:{}", party.sushi));
    assert_eq!(h.db.list_nominees(party.nomination_id).unwrap().len(), 2);

    let addnom = h.press(ALICE, &format!("addnom:{}", party.nomination_id));
    assert_eq!(only_text(&addnom), "Only the room owner can add nominees.");
    assert_eq!(h.pending(ALICE), Pending::Idle);
}

#[test]
fn name_flow_creates_nominee_then_waits_for_media() {
    let h = Harness::new();
    let party = h.party();

    h.press(OWNER, &format!("addnom:{}", party.nomination_id));
    assert_eq!(
        h.pending(OWNER),
        Pending::AwaitingNomineeName(party.nomination_id)
    );

    let replies = h.text(OWNER, "  Tacos  ");
    assert!(only_text(&replies).contains("«Tacos»"));

    let nominees = h.db.list_nominees(party.nomination_id).unwrap();
    let tacos = nominees.iter().find(|n| n.name == "Tacos").unwrap().id;
    assert_eq!(h.pending(OWNER), Pending::AwaitingMedia(tacos));

    h.photo(OWNER, &["small", "medium", "large"]);
    assert_eq!(h.pending(OWNER), Pending::Idle);

    let media = h.db.list_nominees(party.nomination_id).unwrap()
        .into_iter()
        .find(|n| n.id == tacos)
        .unwrap()
        .media
        .unwrap();
    assert_eq!(media.file_ref, "large");
    assert_eq!(media.kind, MediaKind::Photo);
}

#[test]
fn blank_name_still_leaves_the_name_step() {
    let h = Harness::new();
    let party = h.party();

    h.press(OWNER, &format!("addnom:{}", party.nomination_id));
    let replies = h.text(OWNER, "   ");
    assert!(only_text(&replies).contains("can't be empty"));
    assert_eq!(h.pending(OWNER), Pending::Idle);
    assert_eq!(h.db.list_nominees(party.nomination_id).unwrap().len(), 2);
}

#[test]
fn commands_are_not_taken_as_names() {
    let h = Harness::new();
    let party = h.party();

    h.press(OWNER, &format!("addnom:{}", party.nomination_id));
    let replies = h.command(OWNER, "my_rooms", "");
    assert!(only_text(&replies).starts_with("Your rooms"));
    assert_eq!(
        h.pending(OWNER),
        Pending::AwaitingNomineeName(party.nomination_id)
    );
}

#[test]
fn media_request_takes_priority_over_name_request() {
    let h = Harness::new();
    let party = h.party();

    h.press(OWNER, &format!("addnom:{}", party.nomination_id));
    h.press(OWNER, &format!("setmedia:{}", party.pizza));
    assert_eq!(h.pending(OWNER), Pending::AwaitingMedia(party.pizza));

    let replies = h.photo(OWNER, &["pizza.jpg"]);
    assert_eq!(only_text(&replies), "Nominee media saved ✅");

    // no nominee was created from the photo
    assert_eq!(h.db.list_nominees(party.nomination_id).unwrap().len(), 2);
    assert_eq!(h.pending(OWNER), Pending::Idle);
}

#[test]
fn text_while_waiting_for_media_falls_through() {
    let h = Harness::new();
    let party = h.party();

    h.command(OWNER, "set_nominee_media", &party.sushi.to_string());
    let replies = h.text(OWNER, "just chatting");
    assert!(replies.is_empty());
    assert_eq!(h.pending(OWNER), Pending::AwaitingMedia(party.sushi));

    h.video(OWNER, "sushi.mp4");
    let sushi = h.db.list_nominees(party.nomination_id).unwrap()
        .into_iter()
        .find(|n| n.id == party.sushi)
        .unwrap();
    assert_eq!(sushi.media.unwrap().kind, MediaKind::Video);
}

#[test]
fn back_clears_pending_input() {
    let h = Harness::new();
    let party = h.party();

    h.press(OWNER, &format!("addnom:{}", party.nomination_id));
    let replies = h.press(OWNER, "back:nominations");
    assert_eq!(h.pending(OWNER), Pending::Idle);
    // owner never joined the room, so gets the hint
    assert_eq!(only_text(&replies), "Join a room first: /room ID Password");

    h.command(OWNER, "room", &format!("{} pw1", party.room_id));
    h.press(OWNER, &format!("setmedia:{}", party.pizza));
    let replies = h.press(OWNER, "back:nominations");
    assert_eq!(h.pending(OWNER), Pending::Idle);
    let list = only_text(&replies);
    assert!(list.contains("Best Dish"));
    assert_eq!(replies[0].buttons().unwrap()[0].len(), 2);
}

#[test]
fn opening_nomination_renders_cards() {
    let h = Harness::new();
    let party = h.party();
    h.db
        .update_nominee_media(party.pizza, "pizza.jpg", MediaKind::Photo)
        .unwrap();

    let denied = h.press(ALICE, &format!("nomination:{}", party.nomination_id));
    assert!(only_text(&denied).contains("don't have access"));

    h.command(ALICE, "room", &format!("{} pw1", party.room_id));
    let cards = h.press(ALICE, &format!("nomination:{}", party.nomination_id));
    // header + two cards, no owner controls
    assert_eq!(cards.len(), 3);
    assert!(cards[0].body().contains("Best Dish"));
    assert!(matches!(&cards[1], Outbound::Photo { file_ref, .. } if file_ref == "pizza.jpg"));
    assert!(matches!(cards[2], Outbound::Text { .. }));

    h.command(OWNER, "room", &format!("{} pw1", party.room_id));
    let owner_cards = h.press(OWNER, &format!("nomination:{}", party.nomination_id));
    assert_eq!(owner_cards.len(), 4);
    assert_eq!(
        owner_cards[1].buttons().unwrap()[0][0].payload,
        format!("addnom:{}", party.nomination_id)
    );
}

#[test]
fn deleting_nomination_cascades() {
    let h = Harness::new();
    let party = h.party();
    h.command(ALICE, "room", &format!("{} pw1", party.room_id));
    h.press(ALICE, &format!("vote:{}", party.sushi));

    let replies = h.command(OWNER, "delete_nomination", &party.nomination_id.to_string());
    assert!(only_text(&replies).contains("deleted"));
    assert!(h.db.list_nominees(party.nomination_id).unwrap().is_empty());
    assert_eq!(h.vote_rows(party.sushi), 0);

    let gone = h.press(ALICE, &format!("nomination:{}", party.nomination_id));
    assert_eq!(only_text(&gone), "This nomination no longer exists.");
}

#[test]
fn validation_errors_carry_usage() {
    let h = Harness::new();

    assert!(only_text(&h.command(ALICE, "create_room", "")).starts_with("Usage"));
    assert_eq!(
        only_text(&h.command(ALICE, "create_room", "OnlyTitle |  ")),
        "Give both a title and a password, separated by '|'."
    );
    assert_eq!(
        only_text(&h.command(ALICE, "room", "abc pw")),
        "The room ID must be a number."
    );
    assert_eq!(
        only_text(&h.command(ALICE, "add_nominee", "x | Name")),
        "nominationID must be a number."
    );
    assert!(only_text(&h.command(ALICE, "results", "")).starts_with("Usage"));
}

#[test]
fn misc_commands_and_free_text() {
    let h = Harness::new();

    assert!(only_text(&h.command(ALICE, "start", "")).contains("/create_room"));
    assert_eq!(
        only_text(&h.command(ALICE, "dance", "")),
        "Unknown command. Try /start"
    );
    assert_eq!(
        only_text(&h.command(ALICE, "nominations", "")),
        "Join a room first: /room ID Password"
    );
    assert!(only_text(&h.command(ALICE, "my_rooms", "")).contains("don't have any rooms"));
    assert!(only_text(&h.text(ALICE, "where are the Nominations?")).contains("/nominations"));
    assert!(h.text(ALICE, "hello").is_empty());
    assert!(h.press(ALICE, "garbage").is_empty());
}

#[test]
fn start_photo_is_used_when_configured() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let bot = Orchestrator::new(
        db,
        Arc::new(SessionStore::new()),
        BotConfig {
            vote_salt: "s".into(),
            start_photo: Some("start.jpg".into()),
        },
    );

    let replies = bot.handle(InboundEvent::Text(TextEvent {
        sender_id: 1,
        chat_id: 1,
        is_command: true,
        command_name: "start".into(),
        ..Default::default()
    }));
    assert!(matches!(&replies[0], Outbound::Photo { file_ref, .. } if file_ref == "start.jpg"));
}

#[test]
fn name_step_rechecks_the_nomination() {
    let h = Harness::new();
    let party = h.party();

    h.press(OWNER, &format!("addnom:{}", party.nomination_id));
    h.command(OWNER, "delete_nomination", &party.nomination_id.to_string());
    assert_eq!(
        h.pending(OWNER),
        Pending::AwaitingNomineeName(party.nomination_id)
    );

    let replies = h.text(OWNER, "Tacos");
    assert!(only_text(&replies).starts_with("Only the room owner"));
    assert_eq!(h.pending(OWNER), Pending::Idle);

    let nominees: i64 = h
        .db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM nominees", [], |row| row.get(0))?))
        .unwrap();
    assert_eq!(nominees, 0);
}

#[test]
fn media_step_rechecks_the_nominee() {
    let h = Harness::new();
    let party = h.party();

    h.press(OWNER, &format!("setmedia:{}", party.pizza));
    assert_eq!(h.pending(OWNER), Pending::AwaitingMedia(party.pizza));
    h.command(OWNER, "delete_nominee", &party.pizza.to_string());

    let replies = h.photo(OWNER, &["small", "large"]);
    assert!(only_text(&replies).starts_with("Only the room owner"));
    assert_eq!(h.pending(OWNER), Pending::Idle);

    let remaining = h.db.list_nominees(party.nomination_id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, party.sushi);
    assert!(remaining[0].media.is_none());
}
