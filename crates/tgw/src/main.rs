use tokio_util::sync::CancellationToken;

use tgw_core::config::Config;
use tgw_telegram::{handler, Bot, MessageEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tgw_core::logging::init("tgw")?;

    let cfg = Config::load()?;
    let interval = cfg.poll_interval;

    let mut bot = Bot::new(cfg).await?;
    bot.set_callback(
        handler(|ctx, ev: MessageEvent| async move {
            let name = ev.sender_first_name().unwrap_or("there");
            ctx.send_message(ev.chat, &format!("Hello {name}"))
                .await
                .map(|_| ())
        }),
        None,
    )?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutting down");
            }
            shutdown.cancel();
        });
    }

    while !shutdown.is_cancelled() {
        match bot.check_for_messages().await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(updates = n, "processed updates"),
            Err(e) => tracing::warn!(error = %e, "poll failed"),
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    Ok(())
}
