use crate::error::BotError;

/// Text commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    CreateRoom,
    MyRooms,
    JoinRoom,
    Nominations,
    AddNomination,
    AddNominee,
    SetNomineeMedia,
    DeleteNomination,
    DeleteNominee,
    Results,
}

impl Command {
    /// Accepts the bare name as well as `/name` and `/name@botname`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('/');
        let name = name.split('@').next().unwrap_or(name);

        let command = match name {
            "start" => Self::Start,
            "help" => Self::Help,
            "create_room" => Self::CreateRoom,
            "my_rooms" => Self::MyRooms,
            "room" => Self::JoinRoom,
            "nominations" => Self::Nominations,
            "add_nomination" => Self::AddNomination,
            "add_nominee" => Self::AddNominee,
            "set_nominee_media" => Self::SetNomineeMedia,
            "delete_nomination" => Self::DeleteNomination,
            "delete_nominee" => Self::DeleteNominee,
            "results" => Self::Results,
            _ => return None,
        };
        Some(command)
    }
}

/// Splits on `|` into at most `n` segments, trims each one and drops empty
/// segments. The last segment keeps any further pipes.
pub fn split_pipe_args(s: &str, n: usize) -> Vec<&str> {
    s.splitn(n, '|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Splits `/room` arguments into the room ID and the password.
///
/// The ID ends at the first whitespace or `|`; one `|` right after it is
/// skipped. The rest of the line, trimmed, is the password, so passwords may
/// contain spaces and pipes.
pub fn split_room_args(s: &str) -> Option<(&str, &str)> {
    let s = s.trim();
    let end = s.find(|c: char| c.is_whitespace() || c == '|')?;
    let (raw_id, rest) = s.split_at(end);

    let rest = rest.trim_start();
    let password = rest.strip_prefix('|').unwrap_or(rest).trim();
    if raw_id.is_empty() || password.is_empty() {
        return None;
    }
    Some((raw_id, password))
}

/// Pipe-separated when the input contains a pipe, whitespace-separated
/// otherwise. Only for arguments that are all IDs.
pub fn split_loose_args(s: &str, n: usize) -> Vec<&str> {
    if s.contains('|') {
        split_pipe_args(s, n)
    } else {
        s.split_whitespace().take(n).collect()
    }
}

pub fn parse_id(raw: &str, what: &str) -> Result<i64, BotError> {
    raw.trim()
        .parse()
        .map_err(|_| BotError::Validation(format!("{} must be a number.", what)))
}
