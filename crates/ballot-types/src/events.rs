use serde::{Deserialize, Serialize};

/// Events delivered by the messaging transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A chat message, either plain text, a command, or media
    Text(TextEvent),

    /// A press on one of the buttons we attached to an earlier reply
    Button(ButtonEvent),
}

impl InboundEvent {
    pub fn sender_id(&self) -> i64 {
        match self {
            Self::Text(ev) => ev.sender_id,
            Self::Button(ev) => ev.sender_id,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Text(ev) => ev.chat_id,
            Self::Button(ev) => ev.chat_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextEvent {
    pub sender_id: i64,
    pub chat_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_command: bool,
    #[serde(default)]
    pub command_name: String,
    #[serde(default)]
    pub command_args: String,
    /// Every size the transport offers for one photo, smallest first.
    #[serde(default)]
    pub photo_refs: Vec<String>,
    #[serde(default)]
    pub video_ref: Option<String>,
}

impl TextEvent {
    pub fn has_media(&self) -> bool {
        !self.photo_refs.is_empty() || self.video_ref.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub sender_id: i64,
    pub chat_id: i64,
    #[serde(default)]
    pub message_ref: Option<i64>,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl ToString) -> Self {
        Self {
            label: label.into(),
            payload: payload.to_string(),
        }
    }
}

/// Rows of buttons, top to bottom.
pub type Keyboard = Vec<Vec<Button>>;

/// Replies handed back to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Outbound {
    Text {
        chat_id: i64,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        buttons: Option<Keyboard>,
    },

    Photo {
        chat_id: i64,
        file_ref: String,
        caption: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        buttons: Option<Keyboard>,
    },

    Video {
        chat_id: i64,
        file_ref: String,
        caption: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        buttons: Option<Keyboard>,
    },
}

impl Outbound {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self::Text {
            chat_id,
            text: text.into(),
            buttons: None,
        }
    }

    pub fn text_with_buttons(chat_id: i64, text: impl Into<String>, buttons: Keyboard) -> Self {
        Self::Text {
            chat_id,
            text: text.into(),
            buttons: Some(buttons),
        }
    }

    /// Body text or caption, whichever this reply carries.
    pub fn body(&self) -> &str {
        match self {
            Self::Text { text, .. } => text,
            Self::Photo { caption, .. } | Self::Video { caption, .. } => caption,
        }
    }

    pub fn buttons(&self) -> Option<&Keyboard> {
        match self {
            Self::Text { buttons, .. }
            | Self::Photo { buttons, .. }
            | Self::Video { buttons, .. } => buttons.as_ref(),
        }
    }
}
