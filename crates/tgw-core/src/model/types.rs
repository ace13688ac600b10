use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::ChatType, Result};

/// One `getUpdates` entry.
///
/// Only `message` updates are modelled; the raw message is kept verbatim so it
/// can be stored and handed to callbacks untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

/// Sender of a message (`User` in Bot API terms).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// The `chat` object embedded in every message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

// Older Bot API versions send `thumb`, newer ones `thumbnail`.
macro_rules! thumb_accessor {
    ($t:ty) => {
        impl $t {
            pub fn thumb_file_id(&self) -> Option<String> {
                self.thumbnail
                    .as_ref()
                    .or(self.thumb.as_ref())
                    .map(|t| t.file_id.clone())
            }
        }
    };
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub thumb: Option<PhotoSize>,
    #[serde(default)]
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub duration: u32,
    #[serde(default)]
    pub performer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub thumb: Option<PhotoSize>,
    #[serde(default)]
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub duration: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub thumb: Option<PhotoSize>,
    #[serde(default)]
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub is_animated: Option<bool>,
    #[serde(default)]
    pub is_video: Option<bool>,
    #[serde(default)]
    pub thumb: Option<PhotoSize>,
    #[serde(default)]
    pub thumbnail: Option<PhotoSize>,
}

thumb_accessor!(Video);
thumb_accessor!(Audio);
thumb_accessor!(Document);
thumb_accessor!(Sticker);

/// Content kinds the dispatcher distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Photo,
    Video,
    Audio,
    Voice,
    Document,
    Sticker,
    Unknown,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Photo => "photo",
            ContentKind::Video => "video",
            ContentKind::Audio => "audio",
            ContentKind::Voice => "voice",
            ContentKind::Document => "document",
            ContentKind::Sticker => "sticker",
            ContentKind::Unknown => "unknown",
        }
    }
}

/// Typed view over a raw message; unmodelled fields are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<ApiUser>,
    pub chat: ApiChat,
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub video: Option<Video>,
    #[serde(default)]
    pub audio: Option<Audio>,
    #[serde(default)]
    pub voice: Option<Voice>,
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub sticker: Option<Sticker>,
}

impl Message {
    pub fn from_raw(raw: &Value) -> Result<Self> {
        Ok(Message::deserialize(raw)?)
    }

    /// First present content field wins, tested in a fixed order.
    pub fn kind(&self) -> ContentKind {
        if self.text.is_some() {
            ContentKind::Text
        } else if self.photo.is_some() {
            ContentKind::Photo
        } else if self.video.is_some() {
            ContentKind::Video
        } else if self.audio.is_some() {
            ContentKind::Audio
        } else if self.voice.is_some() {
            ContentKind::Voice
        } else if self.document.is_some() {
            ContentKind::Document
        } else if self.sticker.is_some() {
            ContentKind::Sticker
        } else {
            ContentKind::Unknown
        }
    }
}

/// `getFile` result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// `getUserProfilePhotos` result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfilePhotos {
    pub total_count: i64,
    pub photos: Vec<Vec<PhotoSize>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatPhoto {
    pub small_file_id: String,
    pub big_file_id: String,
}

/// `getChat` result (the fields this crate reads).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatFullInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub invite_link: Option<String>,
    #[serde(default)]
    pub photo: Option<ChatPhoto>,
    #[serde(default)]
    pub permissions: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
    #[serde(default)]
    pub is_revoked: bool,
    #[serde(default)]
    pub creates_join_request: bool,
    #[serde(default)]
    pub expire_date: Option<i64>,
    #[serde(default)]
    pub member_limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Value {
        json!({
            "message_id": 10,
            "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
            "chat": {"id": 7, "type": "private", "first_name": "Ann"},
            "date": 1_700_000_000
        })
    }

    fn with(field: &str, value: Value) -> Message {
        let mut raw = base();
        raw[field] = value;
        Message::from_raw(&raw).unwrap()
    }

    #[test]
    fn photo_with_caption_is_photo() {
        let mut raw = base();
        raw["caption"] = json!("look");
        raw["photo"] = json!([{"file_id": "a", "width": 90, "height": 90}]);
        let msg = Message::from_raw(&raw).unwrap();
        assert_eq!(msg.kind(), ContentKind::Photo);
    }

    #[test]
    fn text_wins_over_later_fields() {
        let mut raw = base();
        raw["text"] = json!("hi");
        raw["sticker"] = json!({"file_id": "s", "width": 1, "height": 1});
        assert_eq!(Message::from_raw(&raw).unwrap().kind(), ContentKind::Text);
    }

    #[test]
    fn each_media_field_classifies() {
        let voice = with("voice", json!({"file_id": "v", "duration": 3}));
        assert_eq!(voice.kind(), ContentKind::Voice);
        let doc = with("document", json!({"file_id": "d"}));
        assert_eq!(doc.kind(), ContentKind::Document);
        let audio = with("audio", json!({"file_id": "a", "duration": 1}));
        assert_eq!(audio.kind(), ContentKind::Audio);
    }

    #[test]
    fn message_without_content_is_unknown() {
        let mut raw = base();
        raw["new_chat_title"] = json!("renamed");
        assert_eq!(Message::from_raw(&raw).unwrap().kind(), ContentKind::Unknown);
    }

    #[test]
    fn thumbnail_and_legacy_thumb_both_resolve() {
        let legacy: Document = serde_json::from_value(json!({
            "file_id": "d", "thumb": {"file_id": "t1", "width": 1, "height": 1}
        }))
        .unwrap();
        let current: Document = serde_json::from_value(json!({
            "file_id": "d", "thumbnail": {"file_id": "t2", "width": 1, "height": 1}
        }))
        .unwrap();
        assert_eq!(legacy.thumb_file_id().as_deref(), Some("t1"));
        assert_eq!(current.thumb_file_id().as_deref(), Some("t2"));
    }
}
