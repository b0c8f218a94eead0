//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::{ApiError as TelegramApiError, RequestError};
use tracing::{debug, error, warn};

use crate::dialogue::ChatDialogue;
use crate::localization::t_lang;

use super::favorites_handler::{add_favorite, favorite_detail, list_favorites, remove_favorite};
use super::router::CallbackAction;
use super::search_handlers::{
    airline_selection, handle_airline_routes, handle_period_selection, mode_instructions,
};
use super::{send_main_menu, send_reply, AppContext, Reply};

/// How a callback reply reaches the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Replace the message that carried the button
    Edit,
    /// Keep that message and send a new one
    Send,
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<AppContext>,
    dialogue: ChatDialogue,
) -> Result<()> {
    let data = q.data.as_deref().unwrap_or_default();
    let user_id = q.from.id.0 as i64;
    let language_code = q.from.language_code.as_deref();
    debug!(user_id = %user_id, data = %data, "Received callback query from user");

    let Some(message) = &q.message else {
        warn!(user_id = %user_id, "Callback query without an accessible message");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;

    let (reply, delivery) = match CallbackAction::parse(data) {
        CallbackAction::Back => {
            bot.answer_callback_query(q.id.clone()).await?;
            send_main_menu(&bot, chat_id, language_code).await?;
            return Ok(());
        }
        CallbackAction::AddFavorite => (add_favorite(&ctx, user_id, language_code), Delivery::Send),
        CallbackAction::MyFavorites => (list_favorites(&ctx, user_id, language_code), Delivery::Edit),
        CallbackAction::AirlineRoutes => (airline_selection(language_code), Delivery::Edit),
        CallbackAction::EnterMode(mode) => {
            dialogue.update(mode).await?;
            (mode_instructions(mode, language_code), Delivery::Edit)
        }
        CallbackAction::Airline(code) => (
            handle_airline_routes(&ctx, &code, language_code).await,
            Delivery::Edit,
        ),
        CallbackAction::Period(days) => (
            handle_period_selection(&ctx, user_id, days, language_code).await,
            Delivery::Edit,
        ),
        CallbackAction::FavoriteDetail(key) => (
            favorite_detail(&ctx, user_id, &key, language_code),
            Delivery::Edit,
        ),
        CallbackAction::FavoriteRemove(key) => (
            remove_favorite(&ctx, user_id, &key, language_code),
            Delivery::Edit,
        ),
        CallbackAction::Unknown(payload) => {
            warn!(user_id = %user_id, payload = %payload, "Unknown callback payload");
            bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        }
    };

    if delivery == Delivery::Send {
        bot.answer_callback_query(q.id.clone()).await?;
        send_logged(&bot, chat_id, reply, user_id).await;
        return Ok(());
    }

    let mut request = bot.edit_message_text(chat_id, message.id(), reply.text.clone());
    if let Some(keyboard) = reply.keyboard.clone() {
        request = request.reply_markup(keyboard);
    }

    match request.await {
        Ok(_) => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
        Err(RequestError::Api(TelegramApiError::MessageNotModified)) => {
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("info-up-to-date", language_code))
                .await?;
        }
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Failed to edit message, sending a new one");
            bot.answer_callback_query(q.id.clone()).await?;
            send_logged(&bot, chat_id, reply, user_id).await;
        }
    }

    Ok(())
}

async fn send_logged(bot: &Bot, chat_id: ChatId, reply: Reply, user_id: i64) {
    if let Err(e) = send_reply(bot, chat_id, reply).await {
        error!(user_id = %user_id, error = %e, "Failed to send callback reply");
    }
}
