use crate::{errors::Error, Result};

/// Initialize logging/tracing for a bot process.
///
/// Library crates only emit `tracing` events; the embedding binary decides
/// whether to install a subscriber by calling this once at startup.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    // Default: info for our crates, warn for everything else.
    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tgw=info,tgw_core=info,tgw_api=info,tgw_telegram=info,{}=info",
            service_name.replace('-', "_")
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_reported() {
        assert!(init("tgw-test").is_ok());
        assert!(matches!(init("tgw-test"), Err(Error::Config(_))));
    }
}
