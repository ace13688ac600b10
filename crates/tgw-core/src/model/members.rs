use serde::{Deserialize, Serialize};

use super::types::ApiUser;

/// Administrator rights; missing flags read as `false`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdministratorRights {
    pub can_manage_chat: bool,
    pub can_delete_messages: bool,
    pub can_manage_video_chats: bool,
    pub can_restrict_members: bool,
    pub can_promote_members: bool,
    pub can_change_info: bool,
    pub can_invite_users: bool,
    pub can_post_messages: Option<bool>,
    pub can_edit_messages: Option<bool>,
    pub can_pin_messages: Option<bool>,
    pub can_manage_topics: Option<bool>,
}

/// Permissions of a restricted member.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictedPermissions {
    pub can_change_info: bool,
    pub can_invite_users: bool,
    pub can_pin_messages: bool,
    pub can_manage_topics: bool,
    pub can_send_messages: bool,
    pub can_send_audios: bool,
    pub can_send_documents: bool,
    pub can_send_photos: bool,
    pub can_send_videos: bool,
    pub can_send_video_notes: bool,
    pub can_send_voice_notes: bool,
    /// Pre-7.0 Bot API flag, superseded by the per-media flags above.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_media_messages: Option<bool>,
    pub can_send_polls: bool,
    pub can_send_other_messages: bool,
    pub can_add_web_page_previews: bool,
}

/// `ChatMember`, discriminated by its `status` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChatMember {
    #[serde(rename = "creator")]
    Owner {
        user: ApiUser,
        #[serde(default)]
        is_anonymous: bool,
        #[serde(default)]
        custom_title: Option<String>,
    },
    Administrator {
        user: ApiUser,
        #[serde(default)]
        can_be_edited: bool,
        #[serde(default)]
        is_anonymous: bool,
        #[serde(default)]
        custom_title: Option<String>,
        #[serde(flatten)]
        rights: AdministratorRights,
    },
    Member {
        user: ApiUser,
    },
    Restricted {
        user: ApiUser,
        #[serde(default)]
        is_member: bool,
        #[serde(default)]
        until_date: i64,
        #[serde(flatten)]
        permissions: RestrictedPermissions,
    },
    Left {
        user: ApiUser,
    },
    #[serde(rename = "kicked")]
    Banned {
        user: ApiUser,
        #[serde(default)]
        until_date: i64,
    },
}

impl ChatMember {
    pub fn user(&self) -> &ApiUser {
        match self {
            ChatMember::Owner { user, .. }
            | ChatMember::Administrator { user, .. }
            | ChatMember::Member { user }
            | ChatMember::Restricted { user, .. }
            | ChatMember::Left { user }
            | ChatMember::Banned { user, .. } => user,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.user().is_bot
    }

    pub fn status(&self) -> &'static str {
        match self {
            ChatMember::Owner { .. } => "creator",
            ChatMember::Administrator { .. } => "administrator",
            ChatMember::Member { .. } => "member",
            ChatMember::Restricted { .. } => "restricted",
            ChatMember::Left { .. } => "left",
            ChatMember::Banned { .. } => "kicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn administrator_rights_are_flattened() {
        let m: ChatMember = serde_json::from_value(json!({
            "status": "administrator",
            "user": {"id": 1, "is_bot": false, "first_name": "A"},
            "can_be_edited": true,
            "can_delete_messages": true,
            "can_pin_messages": false
        }))
        .unwrap();
        let ChatMember::Administrator {
            can_be_edited,
            rights,
            ..
        } = &m
        else {
            panic!("expected administrator, got {m:?}");
        };
        assert!(*can_be_edited);
        assert!(rights.can_delete_messages);
        assert!(!rights.can_manage_chat);
        assert_eq!(rights.can_pin_messages, Some(false));
        assert_eq!(m.status(), "administrator");
    }

    #[test]
    fn creator_and_kicked_map_to_owner_and_banned() {
        let owner: ChatMember = serde_json::from_value(json!({
            "status": "creator",
            "user": {"id": 1, "first_name": "A"},
            "custom_title": "boss"
        }))
        .unwrap();
        assert!(matches!(owner, ChatMember::Owner { ref custom_title, .. } if custom_title.as_deref() == Some("boss")));

        let banned: ChatMember = serde_json::from_value(json!({
            "status": "kicked",
            "user": {"id": 2, "is_bot": true, "first_name": "B"},
            "until_date": 0
        }))
        .unwrap();
        assert!(banned.is_bot());
        assert_eq!(banned.user().id, 2);
    }

    #[test]
    fn restricted_member_reads_per_media_flags() {
        let m: ChatMember = serde_json::from_value(json!({
            "status": "restricted",
            "user": {"id": 3, "first_name": "C"},
            "is_member": true,
            "until_date": 0,
            "can_send_messages": true,
            "can_send_audios": true,
            "can_send_photos": true,
            "can_send_videos": false,
            "can_send_voice_notes": true
        }))
        .unwrap();
        let ChatMember::Restricted { permissions, .. } = &m else {
            panic!("expected restricted, got {m:?}");
        };
        assert!(permissions.can_send_messages);
        assert!(permissions.can_send_audios);
        assert!(permissions.can_send_photos);
        assert!(permissions.can_send_voice_notes);
        assert!(!permissions.can_send_videos);
        assert!(!permissions.can_send_documents);
        assert!(!permissions.can_send_video_notes);
        assert_eq!(permissions.can_send_media_messages, None);

        let legacy: ChatMember = serde_json::from_value(json!({
            "status": "restricted",
            "user": {"id": 4, "first_name": "D"},
            "is_member": false,
            "until_date": 0,
            "can_send_media_messages": false
        }))
        .unwrap();
        let ChatMember::Restricted { permissions, .. } = legacy else {
            panic!("expected restricted");
        };
        assert_eq!(permissions.can_send_media_messages, Some(false));
    }
}
