use std::fmt;
use std::str::FromStr;

/// Data carried by an inline button and echoed back verbatim when pressed.
///
/// Wire form is `<action>:<argument>`, e.g. `vote:42` or `back:nominations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonPayload {
    /// `nomination:<nomination_id>` — open a nomination and list its nominees
    OpenNomination(i64),
    /// `vote:<nominee_id>`
    Vote(i64),
    /// `res_nom:<nomination_id>` — owner-only tally
    Results(i64),
    /// `addnom:<nomination_id>` — prompt for a new nominee's name
    AddNominee(i64),
    /// `setmedia:<nominee_id>` — wait for a photo or video
    SetMedia(i64),
    /// `delnom:<nominee_id>`
    DeleteNominee(i64),
    /// `back:nominations`
    BackToNominations,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("payload has no ':' separator: {0:?}")]
    MissingSeparator(String),
    #[error("unknown payload action: {0:?}")]
    UnknownAction(String),
    #[error("payload id is not a number: {0:?}")]
    InvalidId(String),
}

impl FromStr for ButtonPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, arg) = s
            .split_once(':')
            .ok_or_else(|| PayloadError::MissingSeparator(s.to_string()))?;

        let id = || {
            arg.parse::<i64>()
                .map_err(|_| PayloadError::InvalidId(arg.to_string()))
        };

        match action {
            "nomination" => Ok(Self::OpenNomination(id()?)),
            "vote" => Ok(Self::Vote(id()?)),
            "res_nom" => Ok(Self::Results(id()?)),
            "addnom" => Ok(Self::AddNominee(id()?)),
            "setmedia" => Ok(Self::SetMedia(id()?)),
            "delnom" => Ok(Self::DeleteNominee(id()?)),
            "back" if arg == "nominations" => Ok(Self::BackToNominations),
            _ => Err(PayloadError::UnknownAction(s.to_string())),
        }
    }
}

impl fmt::Display for ButtonPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenNomination(id) => write!(f, "nomination:{}", id),
            Self::Vote(id) => write!(f, "vote:{}", id),
            Self::Results(id) => write!(f, "res_nom:{}", id),
            Self::AddNominee(id) => write!(f, "addnom:{}", id),
            Self::SetMedia(id) => write!(f, "setmedia:{}", id),
            Self::DeleteNominee(id) => write!(f, "delnom:{}", id),
            Self::BackToNominations => f.write_str("back:nominations"),
        }
    }
}
