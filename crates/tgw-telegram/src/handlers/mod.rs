//! Callback registration and resolution.
//!
//! A handler is registered under one of nine criteria keys. For a message of
//! kind `k` the table is consulted in order `message_<k>` → `message` →
//! `default`; the first hit handles the message.

use std::{collections::HashMap, fmt, future::Future, pin::Pin, str::FromStr, sync::Arc};

use tgw_core::{errors::Error, model::ContentKind, Result};

use crate::Context;

pub mod payload;

pub use payload::{MessageContent, MessageEvent};

pub type BoxFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// A registered callback.
pub type Handler = Arc<dyn Fn(Context, MessageEvent) -> BoxFuture + Send + Sync>;

/// Wrap an async closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Context, MessageEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx, ev| -> BoxFuture { Box::pin(f(ctx, ev)) })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Criteria {
    Default,
    Message,
    MessageText,
    MessagePhoto,
    MessageVideo,
    MessageAudio,
    MessageVoice,
    MessageDocument,
    MessageSticker,
}

impl Criteria {
    pub const ALL: [Criteria; 9] = [
        Criteria::Default,
        Criteria::Message,
        Criteria::MessageText,
        Criteria::MessagePhoto,
        Criteria::MessageVideo,
        Criteria::MessageAudio,
        Criteria::MessageVoice,
        Criteria::MessageDocument,
        Criteria::MessageSticker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Criteria::Default => "default",
            Criteria::Message => "message",
            Criteria::MessageText => "message_text",
            Criteria::MessagePhoto => "message_photo",
            Criteria::MessageVideo => "message_video",
            Criteria::MessageAudio => "message_audio",
            Criteria::MessageVoice => "message_voice",
            Criteria::MessageDocument => "message_document",
            Criteria::MessageSticker => "message_sticker",
        }
    }

    /// The type-specific key for a content kind (`unknown` has none).
    pub fn for_kind(kind: ContentKind) -> Option<Criteria> {
        match kind {
            ContentKind::Text => Some(Criteria::MessageText),
            ContentKind::Photo => Some(Criteria::MessagePhoto),
            ContentKind::Video => Some(Criteria::MessageVideo),
            ContentKind::Audio => Some(Criteria::MessageAudio),
            ContentKind::Voice => Some(Criteria::MessageVoice),
            ContentKind::Document => Some(Criteria::MessageDocument),
            ContentKind::Sticker => Some(Criteria::MessageSticker),
            ContentKind::Unknown => None,
        }
    }

    /// Parse an optional criteria string; `None` means `default`.
    pub fn parse_opt(criteria: Option<&str>) -> Result<Criteria> {
        criteria.map_or(Ok(Criteria::Default), str::parse)
    }
}

impl FromStr for Criteria {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Criteria::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let valid = Criteria::ALL.map(Criteria::as_str).join(", ");
                Error::InvalidArgument(format!("invalid criteria {s:?}. Valid criteria: {valid}"))
            })
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default)]
pub struct HandlerTable {
    inner: HashMap<Criteria, Handler>,
}

impl HandlerTable {
    /// Register `h`, returning the handler it replaced.
    pub fn set(&mut self, criteria: Criteria, h: Handler) -> Option<Handler> {
        self.inner.insert(criteria, h)
    }

    pub fn remove(&mut self, criteria: Criteria) -> Option<Handler> {
        self.inner.remove(&criteria)
    }

    pub fn drain(&mut self) -> Vec<(Criteria, Handler)> {
        let mut out: Vec<_> = self.inner.drain().collect();
        out.sort_by_key(|(c, _)| Criteria::ALL.iter().position(|x| x == c));
        out
    }

    pub fn contains(&self, criteria: Criteria) -> bool {
        self.inner.contains_key(&criteria)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pick the handler for `kind`: type-specific, then `message`, then `default`.
    pub fn resolve(&self, kind: ContentKind) -> Option<(Criteria, Handler)> {
        Criteria::for_kind(kind)
            .into_iter()
            .chain([Criteria::Message, Criteria::Default])
            .find_map(|c| self.inner.get(&c).map(|h| (c, h.clone())))
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.inner.keys().map(|c| c.as_str()).collect();
        keys.sort_unstable();
        f.debug_struct("HandlerTable").field("criteria", &keys).finish()
    }
}
