//! Message Handler module for processing incoming Telegram text messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, info};

use crate::dialogue::{ChatDialogue, ChatMode};
use crate::localization::t_lang;

use super::favorites_handler::list_favorites;
use super::router::{route_text, MenuOption, TextAction};
use super::search_handlers::{
    airline_selection, handle_calendar_query, handle_cheap_query, handle_flight_query,
    handle_stats_query, mode_instructions,
};
use super::ui_builder::main_menu_keyboard;
use super::{send_main_menu, send_reply, AppContext, Reply};

fn join_messages(keys: &[&str], language_code: Option<&str>) -> String {
    keys.iter()
        .map(|key| t_lang(key, language_code))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Greeting shown on `/start`
pub fn welcome_text(language_code: Option<&str>) -> String {
    join_messages(
        &["welcome-greeting", "welcome-features", "welcome-footer"],
        language_code,
    )
}

/// Usage overview shown on `/help`
pub fn help_text(language_code: Option<&str>) -> String {
    join_messages(
        &["help-title", "help-search", "help-favorites", "help-notifications"],
        language_code,
    )
}

async fn send_with_menu(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    language_code: Option<&str>,
) -> Result<()> {
    bot.send_message(chat_id, text)
        .reply_markup(main_menu_keyboard(language_code))
        .await?;
    Ok(())
}

/// Run the handler of a sticky mode
async fn handle_query(
    ctx: &AppContext,
    user_id: i64,
    mode: ChatMode,
    text: &str,
    language_code: Option<&str>,
) -> Option<Reply> {
    let reply = match mode {
        ChatMode::CheapTickets => handle_cheap_query(ctx, user_id, text, language_code).await,
        ChatMode::PriceCalendar => handle_calendar_query(ctx, text, language_code).await,
        ChatMode::PriceStats => handle_stats_query(ctx, text, language_code).await,
        ChatMode::FlightInfo => handle_flight_query(ctx, user_id, text, language_code).await,
        ChatMode::Idle => return None,
    };
    Some(reply)
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    ctx: Arc<AppContext>,
    dialogue: ChatDialogue,
) -> Result<()> {
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_deref());
    let user_id = msg
        .from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .unwrap_or(msg.chat.id.0);

    let Some(text) = msg.text() else {
        debug!(user_id = %user_id, "Ignoring non-text message");
        bot.send_message(msg.chat.id, t_lang("unsupported-message", language_code))
            .await?;
        return Ok(());
    };

    let mode = dialogue.get().await?.unwrap_or_default();
    debug!(user_id = %user_id, mode = ?mode, "Received text message");

    let result = match route_text(text, mode) {
        TextAction::Start => {
            info!(user_id = %user_id, "User started the bot");
            ctx.reference.preload().await;
            send_with_menu(&bot, msg.chat.id, welcome_text(language_code), language_code).await
        }
        TextAction::Help => {
            send_with_menu(&bot, msg.chat.id, help_text(language_code), language_code).await
        }
        TextAction::Menu(option) => {
            let reply = match option.mode() {
                Some(mode) => {
                    dialogue.update(mode).await?;
                    mode_instructions(mode, language_code)
                }
                None if option == MenuOption::Favorites => list_favorites(&ctx, user_id, language_code),
                None => airline_selection(language_code),
            };
            send_reply(&bot, msg.chat.id, reply).await
        }
        TextAction::Query(mode, query) => {
            match handle_query(&ctx, user_id, mode, &query, language_code).await {
                Some(reply) => send_reply(&bot, msg.chat.id, reply).await,
                None => send_main_menu(&bot, msg.chat.id, language_code).await,
            }
        }
        TextAction::ShowMenu => send_main_menu(&bot, msg.chat.id, language_code).await,
    };

    if let Err(e) = result {
        error!(user_id = %user_id, error = %e, "Failed to reply to message");
        bot.send_message(msg.chat.id, t_lang("error-unexpected", language_code))
            .await?;
    }

    Ok(())
}
