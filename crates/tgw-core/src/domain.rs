use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{errors::Error, Result};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric, negative for groups and channels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric, unique per chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four chat kinds Telegram knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatType::Private => "private",
            ChatType::Group => "group",
            ChatType::Supergroup => "supergroup",
            ChatType::Channel => "channel",
        }
    }
}

impl FromStr for ChatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(ChatType::Private),
            "group" => Ok(ChatType::Group),
            "supergroup" => Ok(ChatType::Supergroup),
            "channel" => Ok(ChatType::Channel),
            other => Err(Error::InvalidArgument(format!("unknown chat type: {other}"))),
        }
    }
}

/// Chat photo variants served by `getChat` (160x160 and 640x640).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChatPhotoSize {
    Small,
    #[default]
    Big,
}

impl ChatPhotoSize {
    /// Width requested from `getUserProfilePhotos` for the same variant.
    pub fn width(self) -> u32 {
        match self {
            ChatPhotoSize::Small => 160,
            ChatPhotoSize::Big => 640,
        }
    }
}

/// How an entity accessor looks up its local record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identifier {
    Id(i64),
    Username(String),
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Identifier::Id(id)
    }
}

impl From<UserId> for Identifier {
    fn from(id: UserId) -> Self {
        Identifier::Id(id.0)
    }
}

impl From<ChatId> for Identifier {
    fn from(id: ChatId) -> Self {
        Identifier::Id(id.0)
    }
}

impl From<&str> for Identifier {
    fn from(username: &str) -> Self {
        Identifier::Username(username.trim_start_matches('@').to_string())
    }
}

impl From<String> for Identifier {
    fn from(username: String) -> Self {
        Identifier::from(username.as_str())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Id(id) => write!(f, "{id}"),
            Identifier::Username(name) => write!(f, "@{name}"),
        }
    }
}
