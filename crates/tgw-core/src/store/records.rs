//! Typed projections stored in the `users`, `chats` and `messages` collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{ChatType, Identifier},
    model::ContentKind,
    Result,
};

use super::{from_document, Collection, Database, Document, Order, Query, ID_FIELD};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Chat projection; the document `_id` is the Telegram chat id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatType,
    pub title: Option<String>,
    pub username: Option<String>,
    /// Raw chat object as last seen.
    pub chat_obj: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: i64,
    pub from: Option<i64>,
    pub chat: i64,
    pub date: i64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub text: Option<String>,
    /// Raw message as received.
    pub object: Value,
}

impl MessageRecord {
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date, 0)
    }
}

/// A record together with its document `_id`.
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<T> {
    pub doc_id: i64,
    pub record: T,
}

// Unknown fields (including `_id` for users and messages) are ignored by serde.
fn stored<T: serde::de::DeserializeOwned>(doc: Document) -> Result<Stored<T>> {
    let doc_id = doc.get(ID_FIELD).and_then(Value::as_i64).unwrap_or_default();
    Ok(Stored {
        doc_id,
        record: from_document(doc)?,
    })
}

impl Database {
    pub fn find_user(&self, ident: &Identifier) -> Result<Option<Stored<UserRecord>>> {
        let users = self.store(Collection::Users)?;
        let doc = match ident {
            Identifier::Id(id) => users.find_one_by("id", *id)?,
            Identifier::Username(name) => users.find_one_by("username", name.as_str())?,
        };
        doc.map(stored).transpose()
    }

    pub fn find_chat(&self, ident: &Identifier) -> Result<Option<ChatRecord>> {
        let chats = self.store(Collection::Chats)?;
        let doc = match ident {
            Identifier::Id(id) => chats.find_by_id(*id)?,
            Identifier::Username(name) => chats.find_one_by("username", name.as_str())?,
        };
        Ok(doc.map(stored::<ChatRecord>).transpose()?.map(|s| s.record))
    }

    /// Latest `limit` messages whose `field` equals `value`, oldest first.
    pub fn latest_messages(
        &self,
        field: &str,
        value: i64,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let q = Query::eq(field, value)
            .order_by("date", Order::Desc)
            .limit(limit);
        let mut out = self
            .store(Collection::Messages)?
            .find_by(&q)?
            .into_iter()
            .map(|d| stored::<MessageRecord>(d).map(|s| s.record))
            .collect::<Result<Vec<_>>>()?;
        out.reverse();
        Ok(out)
    }
}
