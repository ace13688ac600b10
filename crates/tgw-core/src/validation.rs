use std::sync::OnceLock;

use regex::Regex;

use crate::{errors::Error, Result};

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static METHOD_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"^[0-9]{8,10}:[A-Za-z0-9_-]{35}$").expect("static token regex")
    })
}

fn method_re() -> &'static Regex {
    METHOD_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("static method regex"))
}

/// Bot tokens look like `<8-10 digit bot id>:<35 char secret>`.
pub fn is_valid_token(token: &str) -> bool {
    token_re().is_match(token)
}

pub fn validate_token(token: &str) -> Result<()> {
    if is_valid_token(token) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(
            "telegram bot token is in wrong format".to_string(),
        ))
    }
}

/// Method names become a URL path segment, so only `[A-Za-z0-9_]` is allowed.
pub fn validate_method(method: &str) -> Result<()> {
    if method_re().is_match(method) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "method is in wrong format: {method:?}"
        )))
    }
}
