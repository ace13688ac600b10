//! Projection of incoming messages into the local store.
//!
//! Users and chats are upserted with a per-field diff so an unchanged sighting
//! performs no write at all; messages are appended.

use serde_json::Value;

use crate::{
    model::{ApiChat, ApiUser, Message},
    store::{
        records::{ChatRecord, MessageRecord, UserRecord},
        to_document, Collection, Database, Document,
    },
    Result,
};

/// What an upsert did to the stored record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    /// Names of the fields that were rewritten.
    Updated(Vec<&'static str>),
    Unchanged,
}

impl Upsert {
    pub fn changed_fields(&self) -> &[&'static str] {
        match self {
            Upsert::Updated(fields) => fields,
            _ => &[],
        }
    }
}

/// Writes user/chat/message projections for one database.
pub struct ProjectionWriter<'a> {
    db: &'a Database,
}

impl<'a> ProjectionWriter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn upsert_user(&self, from: &ApiUser) -> Result<Upsert> {
        let users = self.db.store(Collection::Users)?;
        let fresh = UserRecord {
            id: from.id,
            username: from.username.clone(),
            first_name: from.first_name.clone(),
            last_name: from.last_name.clone(),
        };

        let Some(existing) = self.db.find_user(&from.id.into())? else {
            users.insert_as(&fresh)?;
            tracing::debug!(user_id = from.id, "stored new user");
            return Ok(Upsert::Inserted);
        };

        let old = &existing.record;
        let mut diff = FieldDiff::default();
        diff.check("username", &old.username, &fresh.username)?;
        diff.check("first_name", &old.first_name, &fresh.first_name)?;
        diff.check("last_name", &old.last_name, &fresh.last_name)?;
        diff.apply(|fields| users.update_by_id(existing.doc_id, fields))
    }

    /// Upsert the chat a message was posted in; `raw` is the message's `chat` object.
    pub fn upsert_chat(&self, chat: &ApiChat, raw: &Value) -> Result<Upsert> {
        let chats = self.db.store(Collection::Chats)?;
        let fresh = ChatRecord {
            id: chat.id,
            kind: chat.kind,
            title: chat.title.clone(),
            username: chat.username.clone(),
            chat_obj: raw.clone(),
        };

        let Some(old) = self.db.find_chat(&chat.id.into())? else {
            chats.update_or_insert(to_document(&fresh)?)?;
            tracing::debug!(chat_id = chat.id, kind = chat.kind.as_str(), "stored new chat");
            return Ok(Upsert::Inserted);
        };

        let mut diff = FieldDiff::default();
        diff.check("type", &old.kind, &fresh.kind)?;
        diff.check("title", &old.title, &fresh.title)?;
        diff.check("username", &old.username, &fresh.username)?;
        diff.check("chat_obj", &old.chat_obj, &fresh.chat_obj)?;
        diff.apply(|fields| chats.update_by_id(chat.id, fields))
    }

    /// Append the message projection; returns its document id.
    pub fn append_message(&self, msg: &Message, raw: &Value) -> Result<i64> {
        let record = MessageRecord {
            message_id: msg.message_id,
            from: msg.from.as_ref().map(|u| u.id),
            chat: msg.chat.id,
            date: msg.date,
            kind: msg.kind(),
            text: msg.text.clone(),
            object: raw.clone(),
        };
        self.db.store(Collection::Messages)?.insert_as(&record)
    }
}

#[derive(Default)]
struct FieldDiff {
    fields: Document,
    names: Vec<&'static str>,
}

impl FieldDiff {
    fn check<T: PartialEq + serde::Serialize>(
        &mut self,
        name: &'static str,
        old: &T,
        new: &T,
    ) -> Result<()> {
        if old != new {
            self.fields
                .insert(name.to_string(), serde_json::to_value(new)?);
            self.names.push(name);
        }
        Ok(())
    }

    fn apply(self, write: impl FnOnce(Document) -> Result<bool>) -> Result<Upsert> {
        if self.names.is_empty() {
            return Ok(Upsert::Unchanged);
        }
        write(self.fields)?;
        Ok(Upsert::Updated(self.names))
    }
}
