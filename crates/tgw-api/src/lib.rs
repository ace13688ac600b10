//! Bot API adapter (HTTP GET over `reqwest`).
//!
//! Implements the `tgw-core` [`BotApi`] port: every call is
//! `GET <base>/bot<token>/<method>?<params>` returning the standard
//! `{ok, result, description, error_code}` envelope.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use tgw_core::{
    config::Config,
    errors::Error,
    ports::{BotApi, Params},
    validation::validate_method,
    Result,
};

#[derive(Clone, Debug)]
pub struct TelegramApi {
    token: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl TelegramApi {
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.bot_token.clone(),
            cfg.api_base_url.clone(),
            cfg.effective_request_timeout(),
        )
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    fn decode(method: &str, status: reqwest::StatusCode, body: &str) -> Result<Value> {
        let env: Envelope = serde_json::from_str(body).map_err(|e| {
            Error::External(format!(
                "telegram {method}: {status} with undecodable body: {e}: {}",
                body.chars().take(200).collect::<String>()
            ))
        })?;

        if !env.ok {
            return Err(Error::Api {
                method: method.to_string(),
                code: env.error_code.or(Some(i64::from(status.as_u16()))),
                description: env
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        Ok(env.result)
    }
}

#[async_trait]
impl BotApi for TelegramApi {
    async fn call(&self, method: &str, params: &Params) -> Result<Value> {
        validate_method(method)?;
        tracing::debug!(method, "telegram request");

        // `without_url` keeps the bot token out of error messages.
        let resp = self
            .http
            .get(self.method_url(method))
            .query(&params.to_query())
            .send()
            .await
            .map_err(|e| {
                Error::External(format!("telegram {method} request error: {}", e.without_url()))
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            Error::External(format!("telegram {method} read error: {}", e.without_url()))
        })?;

        let out = Self::decode(method, status, &body);
        if let Err(e) = &out {
            tracing::debug!(method, error = %e, "telegram request failed");
        }
        out
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.base_url,
            self.token,
            file_path.trim_start_matches('/')
        )
    }
}
