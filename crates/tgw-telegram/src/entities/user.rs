use tgw_core::{
    domain::{ChatType, Identifier, UserId},
    errors::Error,
    model::{ChatFullInfo, UserProfilePhotos},
    ports::{call_as, resolve_file_url, Params},
    store::records::{MessageRecord, UserRecord},
    Result,
};

use crate::Context;

/// Width picked by [`User::get_profile_picture`] when the caller has no preference.
pub const DEFAULT_PROFILE_PICTURE_SIZE: u32 = 320;

/// A stored user.
#[derive(Clone, Debug)]
pub struct User {
    ctx: Context,
    record: UserRecord,
}

impl User {
    /// Look up a stored user by id or username.
    pub fn load(ctx: Context, ident: impl Into<Identifier>) -> Result<Self> {
        let ident = ident.into();
        let stored = ctx
            .db()
            .find_user(&ident)?
            .ok_or_else(|| Error::NotFound(format!("user {ident}")))?;
        Ok(Self {
            ctx,
            record: stored.record,
        })
    }

    /// Build a user from `getChat` on their private chat, bypassing the store.
    pub async fn fetch_remote(ctx: Context, user_id: UserId) -> Result<Self> {
        let info: ChatFullInfo =
            call_as(ctx.api(), "getChat", &Params::new().with("chat_id", user_id.0)).await?;
        if info.kind != ChatType::Private {
            return Err(Error::InvalidArgument(format!(
                "{user_id} is a {} chat, not a user",
                info.kind.as_str()
            )));
        }
        let record = UserRecord {
            id: info.id,
            username: info.username,
            first_name: info.first_name.unwrap_or_default(),
            last_name: info.last_name,
        };
        Ok(Self { ctx, record })
    }

    pub fn id(&self) -> UserId {
        UserId(self.record.id)
    }

    pub fn username(&self) -> Option<&str> {
        self.record.username.as_deref()
    }

    pub fn first_name(&self) -> &str {
        &self.record.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.record.last_name.as_deref()
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    /// Download URL of the current profile picture, `None` when there is none.
    pub async fn get_profile_picture(&self, size: u32) -> Result<Option<String>> {
        profile_picture_of(&self.ctx, self.id(), size).await
    }

    /// Latest messages of the private chat with this user, oldest first.
    pub fn get_latest_messages(&self, limit: usize) -> Result<Vec<MessageRecord>> {
        self.ctx.db().latest_messages("chat", self.record.id, limit)
    }
}

/// Newest profile photo at width `size`, falling back to its largest size.
pub(crate) async fn profile_picture_of(
    ctx: &Context,
    user_id: UserId,
    size: u32,
) -> Result<Option<String>> {
    let photos: UserProfilePhotos = call_as(
        ctx.api(),
        "getUserProfilePhotos",
        &Params::new().with("user_id", user_id.0).with("limit", 1),
    )
    .await?;

    let Some(sizes) = photos.photos.first() else {
        return Ok(None);
    };
    let Some(photo) = sizes.iter().find(|p| p.width == size).or(sizes.last()) else {
        return Ok(None);
    };
    resolve_file_url(ctx.api(), &photo.file_id).await.map(Some)
}
