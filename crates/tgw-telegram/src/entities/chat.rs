use serde_json::{json, Value};

use tgw_core::{
    domain::{ChatId, ChatPhotoSize, ChatType, Identifier, MessageId, UserId},
    errors::Error,
    model::{ChatFullInfo, ChatInviteLink, ChatMember},
    ports::{call_as, resolve_file_url, Params},
    store::{
        records::{ChatRecord, MessageRecord},
        to_document, Collection,
    },
    Result,
};

use super::user::{profile_picture_of, User};
use crate::Context;

pub const MAX_TITLE_CHARS: usize = 128;
pub const MAX_DESCRIPTION_CHARS: usize = 255;

/// A stored chat. Only available when the bot tracks chats.
#[derive(Clone, Debug)]
pub struct Chat {
    ctx: Context,
    record: ChatRecord,
}

impl Chat {
    pub fn load(ctx: Context, ident: impl Into<Identifier>) -> Result<Self> {
        let ident = ident.into();
        let record = ctx
            .db()
            .find_chat(&ident)?
            .ok_or_else(|| Error::NotFound(format!("chat {ident}")))?;
        Ok(Self { ctx, record })
    }

    pub fn id(&self) -> ChatId {
        ChatId(self.record.id)
    }

    pub fn chat_type(&self) -> ChatType {
        self.record.kind
    }

    pub fn is_private(&self) -> bool {
        self.record.kind == ChatType::Private
    }

    pub fn title(&self) -> Option<&str> {
        self.record.title.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.record.username.as_deref()
    }

    /// The chat object as Telegram last sent it.
    pub fn raw(&self) -> &Value {
        &self.record.chat_obj
    }

    pub fn record(&self) -> &ChatRecord {
        &self.record
    }

    /// The user on the other side of a private chat.
    pub fn user(&self) -> Result<User> {
        if !self.is_private() {
            return Err(Error::InvalidArgument(format!(
                "chat {} is a {} chat, not a private one",
                self.record.id,
                self.record.kind.as_str()
            )));
        }
        User::load(self.ctx.clone(), self.id())
    }

    /// Download URL of the chat photo, `None` when the chat has none.
    ///
    /// Private chats use the user's profile photos at the matching width.
    pub async fn get_profile_picture(&self, size: ChatPhotoSize) -> Result<Option<String>> {
        if self.is_private() {
            return profile_picture_of(&self.ctx, UserId(self.record.id), size.width()).await;
        }
        let Some(photo) = self.get_chat().await?.photo else {
            return Ok(None);
        };
        let file_id = match size {
            ChatPhotoSize::Small => photo.small_file_id,
            ChatPhotoSize::Big => photo.big_file_id,
        };
        resolve_file_url(self.ctx.api(), &file_id).await.map(Some)
    }

    pub async fn pin_message(
        &self,
        message_id: MessageId,
        disable_notification: bool,
    ) -> Result<()> {
        self.call(
            "pinChatMessage",
            self.params()
                .with("message_id", message_id.0)
                .with("disable_notification", disable_notification),
        )
        .await
    }

    /// Rename the chat and store the new title locally.
    pub async fn set_title(&mut self, title: &str) -> Result<()> {
        self.require_group("set the title of")?;
        check_len("title", title, MAX_TITLE_CHARS)?;
        self.call("setChatTitle", self.params().with("title", title))
            .await?;

        self.record.title = Some(title.to_string());
        self.patch_chat_obj("title", title);
        self.persist(json!({"title": title, "chat_obj": self.record.chat_obj}))
    }

    pub async fn set_description(&mut self, description: &str) -> Result<()> {
        self.require_group("set the description of")?;
        check_len("description", description, MAX_DESCRIPTION_CHARS)?;
        self.call(
            "setChatDescription",
            self.params().with("description", description),
        )
        .await?;

        self.patch_chat_obj("description", description);
        self.persist(json!({"chat_obj": self.record.chat_obj}))
    }

    pub async fn get_administrators(&self) -> Result<Vec<ChatMember>> {
        call_as(self.ctx.api(), "getChatAdministrators", &self.params()).await
    }

    pub async fn get_chat_member(&self, user_id: UserId) -> Result<ChatMember> {
        call_as(
            self.ctx.api(),
            "getChatMember",
            &self.params().with("user_id", user_id.0),
        )
        .await
    }

    /// Default member permissions (`ChatPermissions`), if the chat reports any.
    pub async fn get_permissions(&self) -> Result<Option<Value>> {
        Ok(self.get_chat().await?.permissions)
    }

    pub async fn set_permissions(&self, permissions: Value) -> Result<()> {
        if !permissions.is_object() {
            return Err(Error::InvalidArgument(
                "chat permissions must be a JSON object".to_string(),
            ));
        }
        self.call(
            "setChatPermissions",
            self.params().with("permissions", permissions),
        )
        .await
    }

    pub async fn get_members_count(&self) -> Result<u64> {
        call_as(self.ctx.api(), "getChatMemberCount", &self.params()).await
    }

    /// Primary invite link, if one was generated.
    pub async fn get_invite_link(&self) -> Result<Option<String>> {
        Ok(self.get_chat().await?.invite_link)
    }

    /// Create an additional invite link.
    ///
    /// With `approval_needed` joins become join requests and `member_limit`
    /// is ignored.
    pub async fn create_invite_link(
        &self,
        expire_date: Option<i64>,
        member_limit: Option<u32>,
        approval_needed: bool,
    ) -> Result<String> {
        self.require_group("create an invite link for")?;
        let mut params = self.params();
        if let Some(expire_date) = expire_date {
            params.push("expire_date", expire_date);
        }
        if approval_needed {
            params.push("creates_join_request", true);
        } else if let Some(limit) = member_limit {
            if !(1..=99_999).contains(&limit) {
                return Err(Error::InvalidArgument(format!(
                    "member limit must be between 1 and 99999, got {limit}"
                )));
            }
            params.push("member_limit", limit);
        }
        let link: ChatInviteLink =
            call_as(self.ctx.api(), "createChatInviteLink", &params).await?;
        Ok(link.invite_link)
    }

    /// Revoke `invite_link`; returns whether Telegram reports it revoked.
    pub async fn revoke_invite_link(&self, invite_link: &str) -> Result<bool> {
        let link: ChatInviteLink = call_as(
            self.ctx.api(),
            "revokeChatInviteLink",
            &self.params().with("invite_link", invite_link),
        )
        .await?;
        Ok(link.is_revoked)
    }

    pub async fn accept_join_request(&self, user_id: UserId) -> Result<()> {
        self.call(
            "approveChatJoinRequest",
            self.params().with("user_id", user_id.0),
        )
        .await
    }

    pub async fn decline_join_request(&self, user_id: UserId) -> Result<()> {
        self.call(
            "declineChatJoinRequest",
            self.params().with("user_id", user_id.0),
        )
        .await
    }

    /// Latest messages posted in this chat, oldest first.
    pub fn get_latest_messages(&self, limit: usize) -> Result<Vec<MessageRecord>> {
        self.ctx.db().latest_messages("chat", self.record.id, limit)
    }

    fn params(&self) -> Params {
        Params::new().with("chat_id", self.record.id)
    }

    async fn call(&self, method: &str, params: Params) -> Result<()> {
        self.ctx.api().call(method, &params).await?;
        Ok(())
    }

    async fn get_chat(&self) -> Result<ChatFullInfo> {
        call_as(self.ctx.api(), "getChat", &self.params()).await
    }

    fn require_group(&self, action: &str) -> Result<()> {
        if self.is_private() {
            return Err(Error::InvalidArgument(format!(
                "cannot {action} a private chat"
            )));
        }
        Ok(())
    }

    fn patch_chat_obj(&mut self, field: &str, value: &str) {
        if let Some(obj) = self.record.chat_obj.as_object_mut() {
            obj.insert(field.to_string(), json!(value));
        }
    }

    fn persist(&self, fields: Value) -> Result<()> {
        self.ctx
            .db()
            .store(Collection::Chats)?
            .update_by_id(self.record.id, to_document(&fields)?)?;
        Ok(())
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::InvalidArgument(format!(
            "chat {field} cannot be longer than {max} characters, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, group_chat, message, private_chat, FakeApi};
    use std::sync::Arc;

    async fn seeded(dir: &std::path::Path, api: Arc<FakeApi>) -> crate::Bot {
        let bot = testing::bot(dir, api.clone()).await;
        let mut group = group_chat(-100, "Room");
        group["username"] = json!("room");
        api.once(
            "getUpdates",
            json!([
                {"update_id": 1, "message": message(1, 7, private_chat(7), 1, json!({"text": "a"}))},
                {"update_id": 2, "message": message(2, 7, group.clone(), 2, json!({"text": "b"}))},
                {"update_id": 3, "message": message(3, 8, group, 3, json!({"text": "c"}))}
            ]),
        );
        bot.check_for_messages().await.unwrap();
        bot
    }

    #[tokio::test]
    async fn load_by_id_and_username() {
        let dir = tempfile::tempdir().unwrap();
        let bot = seeded(dir.path(), FakeApi::new()).await;

        let chat = bot.chat("room").unwrap();
        assert_eq!(chat.id(), ChatId(-100));
        assert_eq!(chat.chat_type(), ChatType::Supergroup);
        assert_eq!(chat.raw()["title"], json!("Room"));
        assert!(chat.user().is_err());

        let private = bot.chat(ChatId(7)).unwrap();
        assert_eq!(private.user().unwrap().id(), UserId(7));

        assert!(matches!(
            bot.chat(ChatId(-999)).err().unwrap(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn private_chat_picture_goes_through_user_photos() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new();
        let bot = seeded(dir.path(), api.clone()).await;
        let chat = bot.chat(ChatId(7)).unwrap();

        api.always(
            "getUserProfilePhotos",
            json!({"total_count": 1, "photos": [[
                {"file_id": "p160", "width": 160, "height": 160},
                {"file_id": "p320", "width": 320, "height": 320},
                {"file_id": "p640", "width": 640, "height": 640},
                {"file_id": "p800", "width": 800, "height": 800}
            ]]}),
        );

        api.once("getFile", json!({"file_id": "p640", "file_path": "p/640.jpg"}));
        let big = chat.get_profile_picture(ChatPhotoSize::Big).await.unwrap();
        assert_eq!(big.as_deref(), Some("https://files.test/p/640.jpg"));

        api.once("getFile", json!({"file_id": "p160", "file_path": "p/160.jpg"}));
        let small = chat.get_profile_picture(ChatPhotoSize::Small).await.unwrap();
        assert_eq!(small.as_deref(), Some("https://files.test/p/160.jpg"));

        let asked: Vec<_> = api
            .calls_to("getFile")
            .iter()
            .map(|p| p.get("file_id").cloned())
            .collect();
        assert_eq!(asked, vec![Some(json!("p640")), Some(json!("p160"))]);
        assert!(api.calls_to("getChat").is_empty());
    }

    #[tokio::test]
    async fn group_picture_reads_get_chat_photo() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new();
        let bot = seeded(dir.path(), api.clone()).await;
        let chat = bot.chat(ChatId(-100)).unwrap();

        api.once(
            "getChat",
            json!({"id": -100, "type": "supergroup", "photo": {"small_file_id": "s", "big_file_id": "b"}}),
        );
        api.once("getFile", json!({"file_id": "s", "file_path": "s.jpg"}));
        let url = chat.get_profile_picture(ChatPhotoSize::Small).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://files.test/s.jpg"));

        api.once("getChat", json!({"id": -100, "type": "supergroup"}));
        assert_eq!(chat.get_profile_picture(ChatPhotoSize::Big).await.unwrap(), None);
        assert!(api.calls_to("getUserProfilePhotos").is_empty());
    }

    #[tokio::test]
    async fn set_title_validates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new();
        let bot = seeded(dir.path(), api.clone()).await;
        api.always("setChatTitle", json!(true));

        let mut chat = bot.chat(ChatId(-100)).unwrap();
        let long = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(matches!(
            chat.set_title(&long).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(api.calls_to("setChatTitle").is_empty());

        chat.set_title("Lobby").await.unwrap();
        let reloaded = bot.chat(ChatId(-100)).unwrap();
        assert_eq!(reloaded.title(), Some("Lobby"));
        assert_eq!(reloaded.raw()["title"], json!("Lobby"));

        let mut private = bot.chat(ChatId(7)).unwrap();
        assert!(matches!(
            private.set_title("nope").await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn set_description_is_stored_in_chat_object() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new();
        let bot = seeded(dir.path(), api.clone()).await;
        api.always("setChatDescription", json!(true));

        let mut chat = bot.chat(ChatId(-100)).unwrap();
        assert!(chat
            .set_description(&"é".repeat(MAX_DESCRIPTION_CHARS))
            .await
            .is_ok());
        assert!(chat
            .set_description(&"é".repeat(MAX_DESCRIPTION_CHARS + 1))
            .await
            .is_err());

        let reloaded = bot.chat(ChatId(-100)).unwrap();
        assert_eq!(
            reloaded.raw()["description"],
            json!("é".repeat(MAX_DESCRIPTION_CHARS))
        );
    }

    #[tokio::test]
    async fn members_are_typed_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new();
        let bot = seeded(dir.path(), api.clone()).await;
        let chat = bot.chat(ChatId(-100)).unwrap();

        api.once(
            "getChatAdministrators",
            json!([
                {"status": "creator", "user": {"id": 7, "first_name": "A"}, "is_anonymous": false},
                {"status": "administrator", "user": {"id": 9, "is_bot": true, "first_name": "B"},
                 "can_be_edited": false, "can_delete_messages": true}
            ]),
        );
        let admins = chat.get_administrators().await.unwrap();
        assert!(matches!(admins[0], ChatMember::Owner { .. }));
        assert!(admins[1].is_bot());

        api.once(
            "getChatMember",
            json!({"status": "kicked", "user": {"id": 8, "first_name": "C"}, "until_date": 0}),
        );
        let member = chat.get_chat_member(UserId(8)).await.unwrap();
        assert!(matches!(member, ChatMember::Banned { .. }));
        assert_eq!(
            api.calls_to("getChatMember")[0].get("user_id"),
            Some(&json!(8))
        );
    }

    #[tokio::test]
    async fn invite_links_respect_approval_flag() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new();
        let bot = seeded(dir.path(), api.clone()).await;
        let chat = bot.chat(ChatId(-100)).unwrap();
        api.always(
            "createChatInviteLink",
            json!({"invite_link": "https://t.me/+abc", "creates_join_request": true}),
        );

        let link = chat.create_invite_link(None, Some(10), true).await.unwrap();
        assert_eq!(link, "https://t.me/+abc");
        let sent = &api.calls_to("createChatInviteLink")[0];
        assert_eq!(sent.get("creates_join_request"), Some(&json!(true)));
        assert_eq!(sent.get("member_limit"), None);

        chat.create_invite_link(Some(1_900_000_000), Some(10), false)
            .await
            .unwrap();
        let sent = &api.calls_to("createChatInviteLink")[1];
        assert_eq!(sent.get("member_limit"), Some(&json!(10)));
        assert_eq!(sent.get("expire_date"), Some(&json!(1_900_000_000)));

        assert!(matches!(
            chat.create_invite_link(None, Some(100_000), false).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(bot
            .chat(ChatId(7))
            .unwrap()
            .create_invite_link(None, None, false)
            .await
            .is_err());

        api.once(
            "revokeChatInviteLink",
            json!({"invite_link": "https://t.me/+abc", "is_revoked": true}),
        );
        assert!(chat.revoke_invite_link("https://t.me/+abc").await.unwrap());

        api.once("getChat", json!({"id": -100, "type": "supergroup", "invite_link": "https://t.me/+main"}));
        assert_eq!(
            chat.get_invite_link().await.unwrap().as_deref(),
            Some("https://t.me/+main")
        );
    }

    #[tokio::test]
    async fn chat_level_calls_carry_chat_id() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new();
        let bot = seeded(dir.path(), api.clone()).await;
        let chat = bot.chat(ChatId(-100)).unwrap();

        api.always("pinChatMessage", json!(true));
        api.always("approveChatJoinRequest", json!(true));
        api.always("declineChatJoinRequest", json!(true));
        api.always("setChatPermissions", json!(true));
        api.once("getChatMemberCount", json!(42));
        api.once(
            "getChat",
            json!({"id": -100, "type": "supergroup", "permissions": {"can_send_messages": true}}),
        );

        chat.pin_message(MessageId(3), true).await.unwrap();
        chat.accept_join_request(UserId(5)).await.unwrap();
        chat.decline_join_request(UserId(6)).await.unwrap();
        assert_eq!(chat.get_members_count().await.unwrap(), 42);
        assert_eq!(
            chat.get_permissions().await.unwrap(),
            Some(json!({"can_send_messages": true}))
        );
        chat.set_permissions(json!({"can_send_messages": false}))
            .await
            .unwrap();
        assert!(chat.set_permissions(json!(false)).await.is_err());

        let pin = &api.calls_to("pinChatMessage")[0];
        assert_eq!(pin.get("chat_id"), Some(&json!(-100)));
        assert_eq!(pin.get("disable_notification"), Some(&json!(true)));
        assert_eq!(
            api.calls_to("declineChatJoinRequest")[0].get("user_id"),
            Some(&json!(6))
        );
    }

    #[tokio::test]
    async fn latest_messages_are_scoped_to_the_chat() {
        let dir = tempfile::tempdir().unwrap();
        let bot = seeded(dir.path(), FakeApi::new()).await;

        let msgs = bot.chat(ChatId(-100)).unwrap().get_latest_messages(1).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].text.as_deref(), Some("c"));

        let all = bot.chat(ChatId(-100)).unwrap().get_latest_messages(10).unwrap();
        let froms: Vec<_> = all.iter().map(|m| m.from).collect();
        assert_eq!(froms, vec![Some(7), Some(8)]);
    }
}
