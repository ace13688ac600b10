//! Scripted `BotApi` fake shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};

use tgw_core::{
    config::Config,
    errors::Error,
    ports::{BotApi, Params},
    Result,
};

use crate::Bot;

pub(crate) const TOKEN: &str = "12345678:ABCDEFGHIJKLMNOPQRSTUVWXYZ0123-_abc";
pub(crate) const BOT_ID: i64 = 4242;

#[derive(Clone)]
enum Reply {
    Ok(Value),
    Rejected(String),
}

/// Answers each method from a one-shot queue first, then from a sticky reply.
/// Unscripted methods are rejected like an unknown Bot API method.
#[derive(Default)]
pub(crate) struct FakeApi {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl FakeApi {
    /// A fake that already answers `getMe`.
    pub(crate) fn new() -> Arc<Self> {
        let api = Arc::new(Self::default());
        api.always(
            "getMe",
            json!({"id": BOT_ID, "is_bot": true, "first_name": "Test", "username": "test_bot"}),
        );
        api
    }

    pub(crate) fn once(&self, method: &str, result: Value) {
        self.queued
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Reply::Ok(result));
    }

    pub(crate) fn always(&self, method: &str, result: Value) {
        self.sticky
            .lock()
            .unwrap()
            .insert(method.to_string(), Reply::Ok(result));
    }

    pub(crate) fn reject(&self, method: &str, description: &str) {
        self.sticky
            .lock()
            .unwrap()
            .insert(method.to_string(), Reply::Rejected(description.to_string()));
    }

    pub(crate) fn calls_to(&self, method: &str) -> Vec<Params> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

#[async_trait]
impl BotApi for FakeApi {
    async fn call(&self, method: &str, params: &Params) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        let reply = queued.or_else(|| self.sticky.lock().unwrap().get(method).cloned());

        match reply {
            Some(Reply::Ok(v)) => Ok(v),
            Some(Reply::Rejected(description)) => Err(Error::Api {
                method: method.to_string(),
                code: Some(400),
                description,
            }),
            None => Err(Error::Api {
                method: method.to_string(),
                code: Some(404),
                description: "Not Found".to_string(),
            }),
        }
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("https://files.test/{file_path}")
    }
}

pub(crate) fn config(dir: &Path) -> Config {
    let mut cfg = Config::new(TOKEN);
    cfg.data_dir = dir.to_path_buf();
    cfg.single_instance = false;
    cfg
}

pub(crate) async fn bot(dir: &Path, api: Arc<FakeApi>) -> Bot {
    Bot::with_api(config(dir), api).await.unwrap()
}

/// A raw `message` with the given content fields merged in.
pub(crate) fn message(message_id: i64, from: i64, chat: Value, date: i64, content: Value) -> Value {
    let mut raw = json!({
        "message_id": message_id,
        "from": {"id": from, "is_bot": false, "first_name": format!("User{from}")},
        "chat": chat,
        "date": date,
    });
    if let (Some(obj), Some(extra)) = (raw.as_object_mut(), content.as_object()) {
        obj.extend(extra.clone());
    }
    raw
}

pub(crate) fn private_chat(id: i64) -> Value {
    json!({"id": id, "type": "private", "first_name": format!("User{id}")})
}

pub(crate) fn group_chat(id: i64, title: &str) -> Value {
    json!({"id": id, "type": "supergroup", "title": title})
}
