//! `getUpdates` with a persisted offset.

use std::time::Duration;

use serde_json::Value;

use tgw_core::{
    config::Config,
    model::Update,
    ports::{call_as, Params},
    Result,
};

use crate::Context;

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateQuery {
    /// Explicit offset; `None` resumes after the stored offset marker.
    pub offset: Option<i64>,
    pub limit: u32,
    pub timeout: Duration,
    pub allowed_updates: Vec<String>,
}

impl Default for UpdateQuery {
    fn default() -> Self {
        Self {
            offset: None,
            limit: 100,
            timeout: Duration::ZERO,
            allowed_updates: vec!["message".to_string()],
        }
    }
}

impl UpdateQuery {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            offset: None,
            limit: cfg.poll_limit,
            timeout: cfg.poll_timeout,
            allowed_updates: cfg.allowed_updates.clone(),
        }
    }

    fn params(&self, offset: Option<i64>) -> Params {
        let mut p = Params::new();
        if let Some(offset) = offset {
            p.push("offset", offset);
        }
        p.push("limit", self.limit);
        p.push("timeout", self.timeout.as_secs());
        p.push(
            "allowed_updates",
            Value::from(self.allowed_updates.clone()),
        );
        p
    }
}

/// Fetch one batch and advance the stored offset to its highest `update_id`.
///
/// On error the offset is left untouched.
pub async fn fetch_updates(ctx: &Context, query: &UpdateQuery) -> Result<Vec<Update>> {
    let offset = match query.offset {
        Some(offset) => Some(offset),
        None => ctx.db().last_update_id()?.map(|id| id + 1),
    };

    let updates: Vec<Update> = call_as(ctx.api(), "getUpdates", &query.params(offset)).await?;

    if let Some(last) = updates.iter().map(|u| u.update_id).max() {
        ctx.db().set_last_update_id(last)?;
    }
    tracing::debug!(?offset, count = updates.len(), "polled updates");
    Ok(updates)
}
