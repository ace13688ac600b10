use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Typed configuration for a bot.
///
/// Libraries build it with [`Config::new`]; binaries usually call
/// [`Config::load`] to read it from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub api_base_url: String,
    pub data_dir: PathBuf,

    // Polling
    pub poll_limit: u32,
    pub poll_timeout: Duration,
    pub allowed_updates: Vec<String>,
    pub poll_interval: Duration,

    // HTTP
    pub request_timeout: Duration,

    // Behavior flags
    pub track_chats: bool,
    pub single_instance: bool,
}

impl Config {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base_url: DEFAULT_API_URL.to_string(),
            data_dir: PathBuf::from("db"),
            poll_limit: 100,
            poll_timeout: Duration::ZERO,
            allowed_updates: vec!["message".to_string()],
            poll_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(30_000),
            track_chats: true,
            single_instance: true,
        }
    }

    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let mut cfg = Config::new(bot_token.trim());

        if let Some(url) = env_str("TELEGRAM_API_URL").and_then(non_empty) {
            cfg.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = env_path("TGW_DATA_DIR") {
            cfg.data_dir = dir;
        }

        // Polling
        if let Some(limit) = env_u32("TGW_POLL_LIMIT") {
            if !(1..=100).contains(&limit) {
                return Err(Error::Config(format!(
                    "TGW_POLL_LIMIT must be between 1 and 100, got {limit}"
                )));
            }
            cfg.poll_limit = limit;
        }
        if let Some(secs) = env_u64("TGW_POLL_TIMEOUT") {
            cfg.poll_timeout = Duration::from_secs(secs);
        }
        let allowed = parse_csv(env_str("TGW_ALLOWED_UPDATES"));
        if !allowed.is_empty() {
            cfg.allowed_updates = allowed;
        }
        if let Some(ms) = env_u64("TGW_POLL_INTERVAL_MS") {
            cfg.poll_interval = Duration::from_millis(ms);
        }

        // HTTP
        if let Some(ms) = env_u64("TGW_REQUEST_TIMEOUT_MS") {
            cfg.request_timeout = Duration::from_millis(ms);
        }

        // Behavior flags
        cfg.track_chats = env_bool("TGW_TRACK_CHATS").unwrap_or(true);
        cfg.single_instance = env_bool("TGW_SINGLE_INSTANCE").unwrap_or(true);

        Ok(cfg)
    }

    /// HTTP timeout for one request; long polls get their server-side wait on top.
    pub fn effective_request_timeout(&self) -> Duration {
        self.request_timeout + self.poll_timeout
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_messages_only() {
        let cfg = Config::new("t");
        assert_eq!(cfg.api_base_url, DEFAULT_API_URL);
        assert_eq!(cfg.poll_limit, 100);
        assert_eq!(cfg.poll_timeout, Duration::ZERO);
        assert_eq!(cfg.allowed_updates, vec!["message".to_string()]);
        assert!(cfg.track_chats);
        assert!(cfg.single_instance);
    }

    #[test]
    fn long_poll_extends_request_timeout() {
        let mut cfg = Config::new("t");
        cfg.request_timeout = Duration::from_secs(10);
        cfg.poll_timeout = Duration::from_secs(25);
        assert_eq!(cfg.effective_request_timeout(), Duration::from_secs(35));
    }

    #[test]
    fn csv_parsing_skips_blanks() {
        assert_eq!(
            parse_csv(Some(" message, ,edited_message ".to_string())),
            vec!["message".to_string(), "edited_message".to_string()]
        );
        assert!(parse_csv(None).is_empty());
    }
}
