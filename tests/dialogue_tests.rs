use anyhow::Result;

use flights::bot::router::{route_text, CallbackAction, MenuOption, TextAction};
use flights::dialogue::ChatMode;
use flights::localization::{init_localization, t_lang};

/// Integration test for sticky mode routing
#[tokio::test]
async fn test_mode_is_sticky_for_free_text() -> Result<()> {
    init_localization()?;

    // Every message in a mode goes to that mode's handler
    assert_eq!(
        route_text("Москва Сочи", ChatMode::CheapTickets),
        TextAction::Query(ChatMode::CheapTickets, "Москва Сочи".to_string())
    );
    assert_eq!(
        route_text("  Москва Казань ", ChatMode::CheapTickets),
        TextAction::Query(ChatMode::CheapTickets, "Москва Казань".to_string())
    );
    assert_eq!(
        route_text("SU1234", ChatMode::FlightInfo),
        TextAction::Query(ChatMode::FlightInfo, "SU1234".to_string())
    );

    // Without a mode the menu is shown again
    assert_eq!(route_text("Москва Сочи", ChatMode::Idle), TextAction::ShowMenu);

    Ok(())
}

/// Commands and menu labels win over the current mode
#[tokio::test]
async fn test_commands_and_menu_override_mode() -> Result<()> {
    init_localization()?;

    assert_eq!(route_text("/start", ChatMode::PriceStats), TextAction::Start);
    assert_eq!(route_text("/start@flights_bot", ChatMode::Idle), TextAction::Start);
    assert_eq!(route_text("/help", ChatMode::CheapTickets), TextAction::Help);

    for option in MenuOption::ALL {
        for lang in ["ru", "en"] {
            let label = t_lang(option.label_key(), Some(lang));
            assert_eq!(route_text(&label, ChatMode::FlightInfo), TextAction::Menu(option));
        }
    }

    Ok(())
}

/// Test menu options map to modes
#[test]
fn test_menu_option_modes() {
    assert_eq!(MenuOption::CheapTickets.mode(), Some(ChatMode::CheapTickets));
    assert_eq!(MenuOption::PriceCalendar.mode(), Some(ChatMode::PriceCalendar));
    assert_eq!(MenuOption::PriceStats.mode(), Some(ChatMode::PriceStats));
    assert_eq!(MenuOption::FlightInfo.mode(), Some(ChatMode::FlightInfo));
    assert_eq!(MenuOption::Favorites.mode(), None);
    assert_eq!(MenuOption::PopularRoutes.mode(), None);
}

/// Unit test for callback payload parsing
#[test]
fn test_callback_payloads() {
    assert_eq!(CallbackAction::parse("back"), CallbackAction::Back);
    assert_eq!(CallbackAction::parse("add_favorite"), CallbackAction::AddFavorite);
    assert_eq!(CallbackAction::parse("my_favorites"), CallbackAction::MyFavorites);
    assert_eq!(CallbackAction::parse("airline_routes"), CallbackAction::AirlineRoutes);
    assert_eq!(
        CallbackAction::parse("airline_5N"),
        CallbackAction::Airline("5N".to_string())
    );
    assert_eq!(
        CallbackAction::parse("cheap"),
        CallbackAction::EnterMode(ChatMode::CheapTickets)
    );
    assert_eq!(CallbackAction::parse("period_90"), CallbackAction::Period(Some(90)));
    assert_eq!(
        CallbackAction::parse("something_else"),
        CallbackAction::Unknown("something_else".to_string())
    );
}

/// Unit test for the default dialogue state
#[test]
fn test_default_mode_is_idle() {
    assert_eq!(ChatMode::default(), ChatMode::Idle);
    assert_eq!(ChatMode::Idle.instruction_key(), None);
    assert_eq!(ChatMode::Idle.payload(), None);
}
