use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flights::bot::{self, AppContext};
use flights::config::BotConfig;
use flights::dialogue::ChatMode;
use flights::localization::init_localization;
use flights::notifications::spawn_daily_check;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting Flights Telegram Bot");

    init_localization().context("Failed to initialize localization")?;

    let config = BotConfig::from_env()?;
    info!(
        favorites_path = %config.favorites_path.display(),
        notify_hour_utc = config.schedule.hour,
        notify_minute_utc = config.schedule.minute,
        "Configuration loaded"
    );

    let bot = Bot::new(config.telegram_token.clone());
    let ctx = Arc::new(AppContext::new(config).context("Failed to build HTTP clients")?);

    let _daily_check = spawn_daily_check(bot.clone(), Arc::clone(&ctx));

    info!("Bot initialized, starting dispatcher");

    let handler = dialogue::enter::<Update, InMemStorage<ChatMode>, ChatMode, _>()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<ChatMode>::new(), ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
