//! Bot orchestration on top of the `tgw-core` ports.
//!
//! [`Bot`] polls for updates, projects them into the local store and hands
//! each message to the callback registered for its kind. [`User`] and [`Chat`]
//! read the stored projections and wrap the chat-level Bot API methods.

use std::sync::Arc;

use serde_json::Value;

use tgw_core::{
    domain::{ChatId, Identifier, MessageId},
    errors::Error,
    ports::{resolve_file_url, BotApi, Params},
    store::Database,
    validation::validate_method,
    Result,
};

pub mod entities;
mod guard;
pub mod handlers;
pub mod poller;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use entities::{Chat, User};
pub use handlers::{handler, Criteria, Handler, MessageContent, MessageEvent};
pub use poller::UpdateQuery;
pub use router::Bot;

/// Shared handles every collaborator works through: the API client and the store.
///
/// Cheap to clone; handlers receive their own copy.
#[derive(Clone)]
pub struct Context {
    api: Arc<dyn BotApi>,
    db: Arc<Database>,
}

impl Context {
    pub fn new(api: Arc<dyn BotApi>, db: Arc<Database>) -> Self {
        Self { api, db }
    }

    pub fn api(&self) -> &dyn BotApi {
        self.api.as_ref()
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageId> {
        let sent = self
            .api
            .call(
                "sendMessage",
                &Params::new().with("chat_id", chat_id.0).with("text", text),
            )
            .await?;
        sent.get("message_id")
            .and_then(Value::as_i64)
            .map(MessageId)
            .ok_or_else(|| Error::External("telegram sendMessage: no message_id in result".into()))
    }

    /// Download URL for `file_id`.
    pub async fn get_file(&self, file_id: &str) -> Result<String> {
        resolve_file_url(self.api(), file_id).await
    }

    pub async fn send_custom_request(&self, method: &str, params: &Params) -> Result<Value> {
        validate_method(method)?;
        self.api.call(method, params).await
    }

    pub fn user(&self, ident: impl Into<Identifier>) -> Result<User> {
        User::load(self.clone(), ident)
    }

    pub fn chat(&self, ident: impl Into<Identifier>) -> Result<Chat> {
        Chat::load(self.clone(), ident)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("store", &self.db.root())
            .finish_non_exhaustive()
    }
}
