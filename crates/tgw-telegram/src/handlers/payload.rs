use serde::Serialize;
use serde_json::Value;

use tgw_core::{
    domain::{ChatId, MessageId, UserId},
    model::{ContentKind, Message},
};

/// Photo file ids by array position (Telegram orders sizes smallest first).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PhotoSizes {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VideoPayload {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    pub file_size: Option<u64>,
    pub filename: Option<String>,
    pub thumb: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AudioPayload {
    pub file_id: String,
    pub duration: u32,
    pub performer: Option<String>,
    pub title: Option<String>,
    pub filename: Option<String>,
    pub thumb: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoicePayload {
    pub file_id: String,
    pub duration: u32,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentPayload {
    pub file_id: String,
    pub filename: Option<String>,
    pub file_size: Option<u64>,
    pub thumb: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StickerPayload {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
    pub thumb: Option<String>,
    pub emoji: Option<String>,
    pub set_name: Option<String>,
    pub is_animated: Option<bool>,
    pub is_video: Option<bool>,
}

/// Kind-specific part of a dispatched message.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { text: String },
    Photo { photo_sizes: PhotoSizes },
    Video(VideoPayload),
    Audio(AudioPayload),
    Voice(VoicePayload),
    Document(DocumentPayload),
    Sticker(StickerPayload),
    Unknown,
}

impl MessageContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            MessageContent::Text { .. } => ContentKind::Text,
            MessageContent::Photo { .. } => ContentKind::Photo,
            MessageContent::Video(_) => ContentKind::Video,
            MessageContent::Audio(_) => ContentKind::Audio,
            MessageContent::Voice(_) => ContentKind::Voice,
            MessageContent::Document(_) => ContentKind::Document,
            MessageContent::Sticker(_) => ContentKind::Sticker,
            MessageContent::Unknown => ContentKind::Unknown,
        }
    }

    /// Extract the payload for the message's classified kind.
    pub fn from_message(msg: &Message) -> Self {
        match msg.kind() {
            ContentKind::Text => MessageContent::Text {
                text: msg.text.clone().unwrap_or_default(),
            },
            ContentKind::Photo => {
                let sizes = msg.photo.as_deref().unwrap_or_default();
                let at = |i: usize| sizes.get(i).map(|p| p.file_id.clone());
                MessageContent::Photo {
                    photo_sizes: PhotoSizes {
                        small: at(0),
                        medium: at(1),
                        large: at(2),
                    },
                }
            }
            ContentKind::Video => match &msg.video {
                Some(v) => MessageContent::Video(VideoPayload {
                    file_id: v.file_id.clone(),
                    width: v.width,
                    height: v.height,
                    duration: v.duration,
                    file_size: v.file_size,
                    filename: v.file_name.clone(),
                    thumb: v.thumb_file_id(),
                }),
                None => MessageContent::Unknown,
            },
            ContentKind::Audio => match &msg.audio {
                Some(a) => MessageContent::Audio(AudioPayload {
                    file_id: a.file_id.clone(),
                    duration: a.duration,
                    performer: a.performer.clone(),
                    title: a.title.clone(),
                    filename: a.file_name.clone(),
                    thumb: a.thumb_file_id(),
                }),
                None => MessageContent::Unknown,
            },
            ContentKind::Voice => match &msg.voice {
                Some(v) => MessageContent::Voice(VoicePayload {
                    file_id: v.file_id.clone(),
                    duration: v.duration,
                    file_size: v.file_size,
                }),
                None => MessageContent::Unknown,
            },
            ContentKind::Document => match &msg.document {
                Some(d) => MessageContent::Document(DocumentPayload {
                    file_id: d.file_id.clone(),
                    filename: d.file_name.clone(),
                    file_size: d.file_size,
                    thumb: d.thumb_file_id(),
                }),
                None => MessageContent::Unknown,
            },
            ContentKind::Sticker => match &msg.sticker {
                Some(s) => MessageContent::Sticker(StickerPayload {
                    file_id: s.file_id.clone(),
                    width: s.width,
                    height: s.height,
                    file_size: s.file_size,
                    thumb: s.thumb_file_id(),
                    emoji: s.emoji.clone(),
                    set_name: s.set_name.clone(),
                    is_animated: s.is_animated,
                    is_video: s.is_video,
                }),
                None => MessageContent::Unknown,
            },
            ContentKind::Unknown => MessageContent::Unknown,
        }
    }
}

/// What a handler receives: the common fields plus the kind-specific content.
///
/// Every kind, `unknown` included, has the same shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageEvent {
    pub message_id: MessageId,
    /// Sender id; absent for messages without a `from` (e.g. channel posts).
    pub from: Option<UserId>,
    pub chat: ChatId,
    pub content: MessageContent,
    /// The message exactly as Telegram sent it.
    pub message: Value,
}

impl MessageEvent {
    pub fn new(msg: &Message, raw: Value) -> Self {
        Self {
            message_id: MessageId(msg.message_id),
            from: msg.from.as_ref().map(|u| UserId(u.id)),
            chat: ChatId(msg.chat.id),
            content: MessageContent::from_message(msg),
            message: raw,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }

    /// Sender's first name, read from the raw message.
    pub fn sender_first_name(&self) -> Option<&str> {
        self.message
            .get("from")
            .and_then(|f| f.get("first_name"))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(extra: Value) -> MessageEvent {
        let mut raw = json!({
            "message_id": 1,
            "from": {"id": 5, "first_name": "Bo"},
            "chat": {"id": -9, "type": "group", "title": "g"},
            "date": 1
        });
        for (k, v) in extra.as_object().unwrap() {
            raw[k] = v.clone();
        }
        let msg = Message::from_raw(&raw).unwrap();
        MessageEvent::new(&msg, raw)
    }

    #[test]
    fn photo_sizes_by_position() {
        let ev = event(json!({"photo": [
            {"file_id": "s", "width": 90, "height": 90},
            {"file_id": "m", "width": 320, "height": 320},
            {"file_id": "l", "width": 800, "height": 800}
        ]}));
        assert_eq!(
            ev.content,
            MessageContent::Photo {
                photo_sizes: PhotoSizes {
                    small: Some("s".into()),
                    medium: Some("m".into()),
                    large: Some("l".into()),
                }
            }
        );
        assert_eq!(ev.from, Some(UserId(5)));
        assert_eq!(ev.chat, ChatId(-9));
    }

    #[test]
    fn short_photo_arrays_leave_gaps() {
        let ev = event(json!({"photo": [{"file_id": "only", "width": 90, "height": 90}]}));
        let MessageContent::Photo { photo_sizes } = ev.content else {
            panic!("expected photo");
        };
        assert_eq!(photo_sizes.small.as_deref(), Some("only"));
        assert_eq!(photo_sizes.large, None);
    }

    #[test]
    fn sticker_payload_carries_optional_fields() {
        let ev = event(json!({"sticker": {
            "file_id": "st", "width": 512, "height": 512, "emoji": "🙂",
            "set_name": "pack", "is_animated": false, "is_video": true,
            "thumbnail": {"file_id": "th", "width": 128, "height": 128}
        }}));
        let MessageContent::Sticker(s) = &ev.content else {
            panic!("expected sticker");
        };
        assert_eq!(s.thumb.as_deref(), Some("th"));
        assert_eq!(s.is_video, Some(true));
        assert_eq!(s.file_size, None);
    }

    #[test]
    fn unknown_keeps_common_fields_and_serializes_flat() {
        let ev = event(json!({"location": {"latitude": 1.0, "longitude": 2.0}}));
        assert_eq!(ev.kind(), ContentKind::Unknown);
        assert_eq!(ev.from, Some(UserId(5)));
        assert!(ev.message.get("location").is_some());

        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["content"], json!({"type": "unknown"}));
        assert_eq!(v["chat"], json!(-9));
    }

    #[test]
    fn video_payload_renames_file_name() {
        let ev = event(json!({"video": {
            "file_id": "v", "width": 640, "height": 360, "duration": 12,
            "file_name": "clip.mp4"
        }}));
        let v = serde_json::to_value(&ev.content).unwrap();
        assert_eq!(v["type"], json!("video"));
        assert_eq!(v["filename"], json!("clip.mp4"));
        assert_eq!(v["thumb"], Value::Null);
    }
}
