//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::fares::DISPLAY_DATE_FORMAT;
use crate::localization::{t_args_lang, t_lang};
use crate::models::Favorite;

use super::router::MenuOption;

/// Airlines offered in the popular routes selection
pub const POPULAR_AIRLINES: [(&str, &str); 6] = [
    ("SU", "Аэрофлот"),
    ("S7", "S7 Airlines"),
    ("DP", "Победа"),
    ("U6", "Уральские авиалинии"),
    ("UT", "ЮТэйр"),
    ("5N", "Smartavia"),
];

/// What to print when a field has no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValue {
    Skip,
    /// Print the localized text of this key instead
    Fallback(&'static str),
}

/// One labelled line of a ticket or flight block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub emoji: &'static str,
    pub label_key: &'static str,
    pub value: Option<String>,
    pub missing: MissingValue,
}

impl DisplayField {
    pub fn new(emoji: &'static str, label_key: &'static str, value: Option<String>) -> Self {
        Self {
            emoji,
            label_key,
            value: value.filter(|v| !v.trim().is_empty()),
            missing: MissingValue::Skip,
        }
    }

    pub fn or_fallback(mut self, key: &'static str) -> Self {
        self.missing = MissingValue::Fallback(key);
        self
    }
}

/// Render fields as `<emoji> <label>: <value>` lines
pub fn render_fields(fields: &[DisplayField], language_code: Option<&str>) -> String {
    fields
        .iter()
        .filter_map(|field| {
            let value = match (&field.value, field.missing) {
                (Some(value), _) => value.clone(),
                (None, MissingValue::Fallback(key)) => t_lang(key, language_code),
                (None, MissingValue::Skip) => return None,
            };
            Some(format!(
                "{} {}: {}",
                field.emoji,
                t_lang(field.label_key, language_code),
                value
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Emoji and translated name of a flight status (`scheduled`, `active`, ...)
pub fn flight_status_label(status: Option<&str>, language_code: Option<&str>) -> String {
    let (emoji, key) = match status.unwrap_or_default() {
        "scheduled" => ("📅", "status-scheduled"),
        "active" => ("🛫", "status-active"),
        "landed" => ("🛬", "status-landed"),
        "cancelled" => ("❌", "status-cancelled"),
        "incident" => ("⚠️", "status-incident"),
        "diverted" => ("🔄", "status-diverted"),
        _ => ("❓", "status-unknown"),
    };
    format!("{emoji} {}", t_lang(key, language_code))
}

fn button(text: String, payload: impl Into<String>) -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(text, payload.into())]
}

fn back_row(language_code: Option<&str>) -> Vec<InlineKeyboardButton> {
    button(t_lang("button-back", language_code), "back")
}

/// Persistent reply keyboard with the six main menu options
pub fn main_menu_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = MenuOption::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|option| KeyboardButton::new(t_lang(option.label_key(), language_code)))
                .collect()
        })
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn back_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_row(language_code)])
}

/// Retry button re-entering the flow behind `payload`, plus back
pub fn retry_keyboard(payload: &str, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button(t_lang("button-retry", language_code), payload),
        back_row(language_code),
    ])
}

/// Period presets offered after a route search without dates
pub fn period_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let preset = |days: u32| {
        InlineKeyboardButton::callback(
            t_args_lang("button-period-days", &[("days", &days.to_string())], language_code),
            format!("period_{days}"),
        )
    };
    InlineKeyboardMarkup::new(vec![
        vec![preset(7), preset(14)],
        vec![preset(30), preset(90)],
        vec![
            InlineKeyboardButton::callback(t_lang("button-period-none", language_code), "period_none"),
            InlineKeyboardButton::callback(t_lang("button-back", language_code), "back"),
        ],
    ])
}

pub fn airline_selection_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = POPULAR_AIRLINES
        .iter()
        .map(|(code, name)| button(format!("{name} ({code})"), format!("airline_{code}")))
        .collect();
    rows.push(back_row(language_code));
    InlineKeyboardMarkup::new(rows)
}

pub fn airline_routes_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button(t_lang("button-other-airline", language_code), "airline_routes"),
        button(t_lang("button-main-menu", language_code), "back"),
    ])
}

/// Keyboard under a ticket search result
pub fn ticket_result_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button(t_lang("button-add-favorite", language_code), "add_favorite"),
        back_row(language_code),
    ])
}

/// Keyboard under a flight status result
pub fn flight_result_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button(t_lang("button-add-favorite", language_code), "add_favorite"),
        button(t_lang("button-other-flight", language_code), "flight_info"),
        back_row(language_code),
    ])
}

pub fn my_favorites_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button(t_lang("button-my-favorites", language_code), "my_favorites"),
        back_row(language_code),
    ])
}

/// Short label of a favorite for list buttons
pub fn favorite_label(favorite: &Favorite) -> String {
    match favorite {
        Favorite::Route(route) => {
            let mut label = format!("{} → {}", route.origin, route.destination);
            for date in [route.depart_date, route.return_date].into_iter().flatten() {
                label.push(' ');
                label.push_str(&date.format(DISPLAY_DATE_FORMAT).to_string());
            }
            label
        }
        Favorite::Flight(flight) => {
            let mut label = format!("✈️ {}", flight.flight_number);
            if let Some(date) = flight.flight_date {
                label.push(' ');
                label.push_str(&date.format(DISPLAY_DATE_FORMAT).to_string());
            }
            label
        }
    }
}

/// One button per favorite, plus back
pub fn favorites_list_keyboard(
    favorites: &[Favorite],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = favorites
        .iter()
        .map(|favorite| {
            button(
                favorite_label(favorite),
                format!("fav_detail_{}", favorite.route_key()),
            )
        })
        .collect();
    rows.push(back_row(language_code));
    InlineKeyboardMarkup::new(rows)
}

pub fn favorite_detail_keyboard(route_key: &str, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button(
            t_lang("button-remove-favorite", language_code),
            format!("fav_remove_{route_key}"),
        ),
        button(t_lang("button-back", language_code), "my_favorites"),
    ])
}
