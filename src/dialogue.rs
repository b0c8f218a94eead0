//! Conversation mode module: which handler receives the next free-text message.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Input mode of a chat
///
/// The mode is sticky: every text message is handled in the current mode
/// until the user picks another menu option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMode {
    #[default]
    Idle,
    /// Awaiting `<from> <to> [dates]`
    CheapTickets,
    /// Awaiting `<from> <to>` for the price calendar
    PriceCalendar,
    /// Awaiting `<from> <to>` for monthly statistics
    PriceStats,
    /// Awaiting a flight number
    FlightInfo,
}

impl ChatMode {
    /// Mode selected by a menu callback payload
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload {
            "cheap" => Some(ChatMode::CheapTickets),
            "calendar" => Some(ChatMode::PriceCalendar),
            "stats" => Some(ChatMode::PriceStats),
            "flight_info" => Some(ChatMode::FlightInfo),
            _ => None,
        }
    }

    /// Callback payload that re-enters this mode
    pub fn payload(&self) -> Option<&'static str> {
        match self {
            ChatMode::Idle => None,
            ChatMode::CheapTickets => Some("cheap"),
            ChatMode::PriceCalendar => Some("calendar"),
            ChatMode::PriceStats => Some("stats"),
            ChatMode::FlightInfo => Some("flight_info"),
        }
    }

    /// Localization key of the instruction shown when the mode is entered
    pub fn instruction_key(&self) -> Option<&'static str> {
        match self {
            ChatMode::Idle => None,
            ChatMode::CheapTickets => Some("cheap-instructions"),
            ChatMode::PriceCalendar => Some("calendar-instructions"),
            ChatMode::PriceStats => Some("stats-instructions"),
            ChatMode::FlightInfo => Some("flight-info-instructions"),
        }
    }
}

/// Type alias for the chat mode dialogue
pub type ChatDialogue = Dialogue<ChatMode, InMemStorage<ChatMode>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        for mode in [
            ChatMode::CheapTickets,
            ChatMode::PriceCalendar,
            ChatMode::PriceStats,
            ChatMode::FlightInfo,
        ] {
            let payload = mode.payload().unwrap();
            assert_eq!(ChatMode::from_payload(payload), Some(mode));
            assert!(mode.instruction_key().is_some());
        }
    }

    #[test]
    fn test_idle_has_no_payload() {
        assert_eq!(ChatMode::default(), ChatMode::Idle);
        assert_eq!(ChatMode::Idle.payload(), None);
        assert_eq!(ChatMode::from_payload("back"), None);
    }
}
