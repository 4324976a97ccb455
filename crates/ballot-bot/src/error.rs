use ballot_db::DbError;

/// Failure of a single interaction. Every variant except `Storage` carries
/// the text shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(#[from] DbError),
}

pub const GENERIC_FAILURE: &str = "Something went wrong, please try again.";

impl BotError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::NotFound(msg) | Self::PermissionDenied(msg) | Self::Validation(msg) => msg,
            Self::Storage(_) => GENERIC_FAILURE,
        }
    }
}

/// Turns a storage `NotFound` into a user-facing one; other storage errors
/// stay storage errors.
pub(crate) trait OrNotFound<T> {
    fn or_not_found(self, msg: &str) -> Result<T, BotError>;
}

impl<T> OrNotFound<T> for Result<T, DbError> {
    fn or_not_found(self, msg: &str) -> Result<T, BotError> {
        match self {
            Ok(val) => Ok(val),
            Err(DbError::NotFound) => Err(BotError::NotFound(msg.to_string())),
            Err(e) => Err(BotError::Storage(e)),
        }
    }
}

/// Like [`OrNotFound`], but absence is an ordinary outcome.
pub(crate) fn optional<T>(result: Result<T, DbError>) -> Result<Option<T>, BotError> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(DbError::NotFound) => Ok(None),
        Err(e) => Err(BotError::Storage(e)),
    }
}
