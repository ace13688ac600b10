use std::sync::Arc;

use serde_json::Value;

use tgw_api::TelegramApi;
use tgw_core::{
    config::Config,
    domain::{ChatId, Identifier, MessageId},
    errors::Error,
    model::{ApiUser, Message, Update},
    ports::{call_as, BotApi, Params},
    projection::ProjectionWriter,
    store::{Collection, Database},
    validation::validate_token,
    Result,
};

use crate::{
    entities::{Chat, User},
    guard::InstanceGuard,
    handlers::{Criteria, Handler, HandlerTable, MessageEvent},
    poller::{fetch_updates, UpdateQuery},
    Context,
};

/// One bot: the context, its callbacks and (optionally) the single-instance guard.
pub struct Bot {
    ctx: Context,
    config: Config,
    me: ApiUser,
    handlers: HandlerTable,
    _guard: Option<InstanceGuard>,
}

impl Bot {
    /// Connect to the Bot API described by `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let api = TelegramApi::from_config(&config)?;
        Self::with_api(config, Arc::new(api)).await
    }

    /// Build a bot over any [`BotApi`] implementation.
    pub async fn with_api(config: Config, api: Arc<dyn BotApi>) -> Result<Self> {
        validate_token(&config.bot_token)?;

        let guard = if config.single_instance {
            Some(InstanceGuard::acquire()?)
        } else {
            None
        };

        let me: ApiUser = call_as(api.as_ref(), "getMe", &Params::new())
            .await
            .map_err(|e| Error::InvalidToken(e.to_string()))?;

        let db = Database::open(
            &config.data_dir,
            &Collection::for_profile(config.track_chats),
        )?;

        tracing::info!(
            bot = me.username.as_deref().unwrap_or(&me.first_name),
            data_dir = %config.data_dir.display(),
            track_chats = config.track_chats,
            "bot started"
        );

        Ok(Self {
            ctx: Context::new(api, Arc::new(db)),
            config,
            me,
            handlers: HandlerTable::default(),
            _guard: guard,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The bot's own account, as returned by `getMe`.
    pub fn me(&self) -> &ApiUser {
        &self.me
    }

    /// Register `h` under `criteria` (`default` when omitted).
    pub fn set_callback(&mut self, h: Handler, criteria: Option<&str>) -> Result<()> {
        let criteria = Criteria::parse_opt(criteria)?;
        self.set_handler(criteria, h);
        Ok(())
    }

    pub fn set_handler(&mut self, criteria: Criteria, h: Handler) -> Option<Handler> {
        tracing::debug!(%criteria, "callback registered");
        self.handlers.set(criteria, h)
    }

    /// Remove the handler for `criteria`, or every handler when omitted.
    pub fn unset_callback(&mut self, criteria: Option<&str>) -> Result<Vec<(Criteria, Handler)>> {
        match criteria {
            None => Ok(self.handlers.drain()),
            Some(c) => {
                let c: Criteria = c.parse()?;
                Ok(self.handlers.remove(c).map(|h| (c, h)).into_iter().collect())
            }
        }
    }

    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageId> {
        self.ctx.send_message(chat_id, text).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<String> {
        self.ctx.get_file(file_id).await
    }

    pub async fn send_custom_request(&self, method: &str, params: &Params) -> Result<Value> {
        self.ctx.send_custom_request(method, params).await
    }

    /// Whether the bot can see `chat_id`, i.e. `getChatMember` for itself succeeds.
    pub async fn has_access_to_chat(&self, chat_id: ChatId) -> Result<bool> {
        let params = Params::new()
            .with("chat_id", chat_id.0)
            .with("user_id", self.me.id);
        match self.ctx.api().call("getChatMember", &params).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_api_rejection() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn get_updates(&self, query: &UpdateQuery) -> Result<Vec<Update>> {
        fetch_updates(&self.ctx, query).await
    }

    /// Poll once, store every message and run its callback.
    ///
    /// Returns how many updates the poll delivered. Failures while handling a
    /// single update are logged and do not abort the batch.
    pub async fn check_for_messages(&self) -> Result<usize> {
        let updates = self
            .get_updates(&UpdateQuery::from_config(&self.config))
            .await?;
        let count = updates.len();

        for update in updates {
            let update_id = update.update_id;
            if let Err(e) = self.process_update(update).await {
                tracing::warn!(update_id, error = %e, "failed to process update");
            }
        }
        Ok(count)
    }

    async fn process_update(&self, update: Update) -> Result<()> {
        let Some(raw) = update.message else {
            tracing::debug!(update_id = update.update_id, "update without message skipped");
            return Ok(());
        };
        let msg = match Message::from_raw(&raw) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(update_id = update.update_id, error = %e, "undecodable message skipped");
                return Ok(());
            }
        };

        let writer = ProjectionWriter::new(self.ctx.db());
        if self.config.track_chats {
            writer.upsert_chat(&msg.chat, &raw["chat"])?;
        }
        if let Some(from) = &msg.from {
            writer.upsert_user(from)?;
        }
        writer.append_message(&msg, &raw)?;

        let event = MessageEvent::new(&msg, raw);
        let Some((criteria, h)) = self.handlers.resolve(event.kind()) else {
            return Ok(());
        };

        tracing::debug!(%criteria, chat_id = %event.chat, "dispatching message");
        if let Err(e) = h(self.ctx.clone(), event).await {
            tracing::warn!(%criteria, error = %e, "callback failed");
        }
        Ok(())
    }

    pub fn user(&self, ident: impl Into<Identifier>) -> Result<User> {
        self.ctx.user(ident)
    }

    pub fn chat(&self, ident: impl Into<Identifier>) -> Result<Chat> {
        self.ctx.chat(ident)
    }
}
