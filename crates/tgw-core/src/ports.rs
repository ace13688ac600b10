use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{errors::Error, validation::validate_method, Result};

/// Ordered request parameters for a Bot API call.
///
/// Strings are sent verbatim; numbers, booleans, arrays and objects are sent as
/// their JSON text (which is what the Bot API expects for e.g.
/// `allowed_updates` or `permissions`). `null` values are dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Vec<(String, Value)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Query-string pairs, ready for URL encoding.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter_map(|(k, v)| {
                let s = match v {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((k.clone(), s))
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut p = Params::new();
        for (k, v) in iter {
            p.push(k, v);
        }
        p
    }
}

/// Hexagonal port for the remote Bot API.
///
/// Implementations perform one round trip per call and never retry. A reply with
/// `ok: false` maps to `Error::Api`; transport and decoding failures map to
/// `Error::External`.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Call `method` and return the decoded `result` field.
    async fn call(&self, method: &str, params: &Params) -> Result<Value>;

    /// Public download URL for a `file_path` returned by `getFile`.
    fn file_url(&self, file_path: &str) -> String;
}

/// Call `method` and decode its `result` into `T`.
pub async fn call_as<T: DeserializeOwned>(
    api: &dyn BotApi,
    method: &str,
    params: &Params,
) -> Result<T> {
    validate_method(method)?;
    let v = api.call(method, params).await?;
    serde_json::from_value(v)
        .map_err(|e| Error::External(format!("telegram {method}: unexpected result shape: {e}")))
}

/// Resolve a file id into a download URL (`getFile` + file URL).
pub async fn resolve_file_url(api: &dyn BotApi, file_id: &str) -> Result<String> {
    let file: crate::model::File =
        call_as(api, "getFile", &Params::new().with("file_id", file_id)).await?;
    let path = file
        .file_path
        .ok_or_else(|| Error::External(format!("telegram getFile: no file_path for {file_id}")))?;
    Ok(api.file_url(&path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_encode_json_values_as_text() {
        let p = Params::new()
            .with("chat_id", -100)
            .with("text", "hi there")
            .with("allowed_updates", json!(["message"]))
            .with("disable_notification", false)
            .with("offset", Value::Null);
        assert_eq!(
            p.to_query(),
            vec![
                ("chat_id".to_string(), "-100".to_string()),
                ("text".to_string(), "hi there".to_string()),
                ("allowed_updates".to_string(), r#"["message"]"#.to_string()),
                ("disable_notification".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn params_push_replaces_existing_key() {
        let p: Params = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(p.get("a"), Some(&json!(3)));
        assert_eq!(p.to_query().len(), 2);
    }
}
