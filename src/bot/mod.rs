//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `router`: Maps text and callback payloads to actions
//! - `message_handler`: Handles incoming text messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `search_handlers`: Fare searches, airline routes and flight status
//! - `favorites_handler`: Adds, lists, shows and removes favorites
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod favorites_handler;
pub mod message_handler;
pub mod router;
pub mod search_handlers;
pub mod ui_builder;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;

use crate::api::{FaresApi, FlightStatusApi};
use crate::config::BotConfig;
use crate::errors::ApiError;
use crate::favorites::FavoritesStore;
use crate::localization::t_lang;
use crate::reference_cache::ReferenceCache;
use crate::session::SessionStore;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Text and optional inline keyboard produced by a handler
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Send a reply as a new message
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<()> {
    let mut request = bot.send_message(chat_id, reply.text);
    if let Some(keyboard) = reply.keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

/// Show the persistent main menu keyboard
pub async fn send_main_menu(bot: &Bot, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    bot.send_message(chat_id, t_lang("choose-action", language_code))
        .reply_markup(ui_builder::main_menu_keyboard(language_code))
        .await?;
    Ok(())
}

/// Process-wide services shared by every handler and the notification job
pub struct AppContext {
    pub config: BotConfig,
    pub fares: FaresApi,
    pub flights: FlightStatusApi,
    pub reference: ReferenceCache,
    pub favorites: FavoritesStore,
    pub sessions: SessionStore,
}

impl AppContext {
    /// Build every service from the configuration and load the favorites file
    pub fn new(config: BotConfig) -> Result<Self, ApiError> {
        let fares = FaresApi::new(&config)?;
        let flights = FlightStatusApi::new(&config)?;
        let reference = ReferenceCache::new(config.endpoints.clone(), config.reference_timeout)?;
        let favorites = FavoritesStore::load(config.favorites_path.clone());

        Ok(Self {
            config,
            fares,
            flights,
            reference,
            favorites,
            sessions: SessionStore::new(),
        })
    }
}
