//! Routing of incoming text and callback payloads to bot actions
//!
//! Pure functions only: the teloxide glue in `message_handler` and
//! `callback_handler` executes the returned actions.

use crate::dialogue::ChatMode;
use crate::localization::{t_lang, SUPPORTED_LANGUAGES};

/// Options of the persistent main menu keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    CheapTickets,
    PriceCalendar,
    PriceStats,
    Favorites,
    PopularRoutes,
    FlightInfo,
}

impl MenuOption {
    /// Menu options in keyboard order, two per row
    pub const ALL: [MenuOption; 6] = [
        MenuOption::CheapTickets,
        MenuOption::PriceCalendar,
        MenuOption::PriceStats,
        MenuOption::Favorites,
        MenuOption::PopularRoutes,
        MenuOption::FlightInfo,
    ];

    pub fn label_key(&self) -> &'static str {
        match self {
            MenuOption::CheapTickets => "menu-cheap-tickets",
            MenuOption::PriceCalendar => "menu-price-calendar",
            MenuOption::PriceStats => "menu-price-stats",
            MenuOption::Favorites => "menu-favorites",
            MenuOption::PopularRoutes => "menu-popular-routes",
            MenuOption::FlightInfo => "menu-flight-info",
        }
    }

    /// Match a keyboard label in any supported language
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|option| {
            SUPPORTED_LANGUAGES
                .iter()
                .any(|lang| t_lang(option.label_key(), Some(lang)) == text)
        })
    }

    /// Input mode entered by this option, if any
    pub fn mode(&self) -> Option<ChatMode> {
        match self {
            MenuOption::CheapTickets => Some(ChatMode::CheapTickets),
            MenuOption::PriceCalendar => Some(ChatMode::PriceCalendar),
            MenuOption::PriceStats => Some(ChatMode::PriceStats),
            MenuOption::FlightInfo => Some(ChatMode::FlightInfo),
            MenuOption::Favorites | MenuOption::PopularRoutes => None,
        }
    }
}

/// What to do with an incoming text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextAction {
    Start,
    Help,
    Menu(MenuOption),
    /// Free text handled by the current sticky mode
    Query(ChatMode, String),
    /// No mode selected yet
    ShowMenu,
}

/// Route a text message given the chat's current mode
pub fn route_text(text: &str, mode: ChatMode) -> TextAction {
    let trimmed = text.trim();
    let command = trimmed.split_whitespace().next().unwrap_or_default();
    // Commands may carry a bot username suffix: /start@flights_bot
    let command = command.split('@').next().unwrap_or_default();

    match command {
        "/start" => return TextAction::Start,
        "/help" => return TextAction::Help,
        _ => {}
    }

    if let Some(option) = MenuOption::from_label(trimmed) {
        return TextAction::Menu(option);
    }

    match mode {
        ChatMode::Idle => TextAction::ShowMenu,
        mode => TextAction::Query(mode, trimmed.to_string()),
    }
}

/// Parsed inline button payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Back,
    AddFavorite,
    MyFavorites,
    AirlineRoutes,
    EnterMode(ChatMode),
    Airline(String),
    /// Period preset in days; `None` searches without dates
    Period(Option<u32>),
    FavoriteDetail(String),
    FavoriteRemove(String),
    Unknown(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        match data {
            "back" => return CallbackAction::Back,
            "add_favorite" => return CallbackAction::AddFavorite,
            "my_favorites" => return CallbackAction::MyFavorites,
            // Must be checked before the `airline_` prefix
            "airline_routes" => return CallbackAction::AirlineRoutes,
            _ => {}
        }

        if let Some(mode) = ChatMode::from_payload(data) {
            return CallbackAction::EnterMode(mode);
        }

        if let Some(code) = data.strip_prefix("airline_") {
            if !code.is_empty() {
                return CallbackAction::Airline(code.to_string());
            }
        } else if let Some(period) = data.strip_prefix("period_") {
            if period == "none" {
                return CallbackAction::Period(None);
            }
            if let Ok(days) = period.parse::<u32>() {
                if days > 0 {
                    return CallbackAction::Period(Some(days));
                }
            }
        } else if let Some(key) = data.strip_prefix("fav_detail_") {
            if !key.is_empty() {
                return CallbackAction::FavoriteDetail(key.to_string());
            }
        } else if let Some(key) = data.strip_prefix("fav_remove_") {
            if !key.is_empty() {
                return CallbackAction::FavoriteRemove(key.to_string());
            }
        }

        CallbackAction::Unknown(data.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airline_routes_is_not_an_airline_code() {
        assert_eq!(CallbackAction::parse("airline_routes"), CallbackAction::AirlineRoutes);
        assert_eq!(
            CallbackAction::parse("airline_SU"),
            CallbackAction::Airline("SU".to_string())
        );
        assert_eq!(
            CallbackAction::parse("airline_"),
            CallbackAction::Unknown("airline_".to_string())
        );
    }

    #[test]
    fn test_period_payloads() {
        assert_eq!(CallbackAction::parse("period_7"), CallbackAction::Period(Some(7)));
        assert_eq!(CallbackAction::parse("period_none"), CallbackAction::Period(None));
        assert!(matches!(CallbackAction::parse("period_0"), CallbackAction::Unknown(_)));
        assert!(matches!(CallbackAction::parse("period_x"), CallbackAction::Unknown(_)));
    }

    #[test]
    fn test_favorite_payloads_keep_full_key() {
        assert_eq!(
            CallbackAction::parse("fav_detail_MOW-AER-2025-08-01"),
            CallbackAction::FavoriteDetail("MOW-AER-2025-08-01".to_string())
        );
        assert_eq!(
            CallbackAction::parse("fav_remove_SU1234-2025-08-01"),
            CallbackAction::FavoriteRemove("SU1234-2025-08-01".to_string())
        );
    }

    #[test]
    fn test_mode_payloads() {
        assert_eq!(
            CallbackAction::parse("flight_info"),
            CallbackAction::EnterMode(ChatMode::FlightInfo)
        );
        assert_eq!(
            CallbackAction::parse("cheap"),
            CallbackAction::EnterMode(ChatMode::CheapTickets)
        );
        assert_eq!(CallbackAction::parse("back"), CallbackAction::Back);
    }

    #[test]
    fn test_route_text_commands_and_modes() {
        assert_eq!(route_text("/start", ChatMode::FlightInfo), TextAction::Start);
        assert_eq!(route_text("/start@flights_bot", ChatMode::Idle), TextAction::Start);
        assert_eq!(route_text("/help", ChatMode::Idle), TextAction::Help);
        assert_eq!(route_text("Москва Сочи", ChatMode::Idle), TextAction::ShowMenu);
        assert_eq!(
            route_text(" Москва Сочи ", ChatMode::CheapTickets),
            TextAction::Query(ChatMode::CheapTickets, "Москва Сочи".to_string())
        );
    }
}
