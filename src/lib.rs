//! # Flights Telegram Bot
//!
//! A Telegram bot that searches cheap flight tickets, price calendars,
//! monthly price statistics, popular airline routes and live flight status,
//! and keeps a per-user watchlist of favorites with a daily update message.

pub mod api;
pub mod bot;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod fares;
pub mod favorites;
pub mod localization;
pub mod models;
pub mod notifications;
pub mod query_parser;
pub mod reference_cache;
pub mod session;
