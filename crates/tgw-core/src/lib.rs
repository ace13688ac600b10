//! Core domain logic for the Telegram Bot API wrapper.
//!
//! This crate is transport-agnostic. The remote Bot API lives behind the
//! [`ports::BotApi`] port, implemented by the `tgw-api` adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod model;
pub mod ports;
pub mod projection;
pub mod store;
pub mod validation;

pub use errors::{Error, Result};
