//! Favorites handlers: add the last search, list, show and remove entries

use chrono::Local;
use tracing::{info, warn};

use crate::fares::{format_api_datetime, DISPLAY_DATETIME_FORMAT, DISPLAY_DATE_FORMAT};
use crate::localization::t_lang;
use crate::models::{Favorite, FavoriteRoute};
use crate::session::LastSearch;

use super::ui_builder::{
    back_keyboard, favorite_detail_keyboard, favorites_list_keyboard, flight_status_label,
    my_favorites_keyboard, render_fields, DisplayField,
};
use super::{AppContext, Reply};

/// Save the user's last search (route or flight) as a favorite
pub fn add_favorite(ctx: &AppContext, user_id: i64, language_code: Option<&str>) -> Reply {
    let (favorite, added_key) = match ctx.sessions.last(user_id) {
        Some(LastSearch::Route(params)) => (
            Favorite::Route(FavoriteRoute::from_search(&params)),
            "favorite-added",
        ),
        Some(LastSearch::Flight(mut flight)) => {
            flight.added_at = Local::now().naive_local();
            (Favorite::Flight(flight), "favorite-flight-added")
        }
        None => {
            warn!(user_id = %user_id, "Add to favorites without a previous search");
            return Reply::text(t_lang("favorite-add-no-search", language_code));
        }
    };

    if ctx.favorites.add(user_id, favorite) {
        Reply::with_keyboard(t_lang(added_key, language_code), my_favorites_keyboard(language_code))
    } else {
        Reply::text(t_lang("favorite-duplicate", language_code))
    }
}

/// List the user's favorites as buttons
pub fn list_favorites(ctx: &AppContext, user_id: i64, language_code: Option<&str>) -> Reply {
    let favorites = ctx.favorites.list(user_id);
    if favorites.is_empty() {
        return Reply::with_keyboard(
            t_lang("favorites-empty", language_code),
            back_keyboard(language_code),
        );
    }

    Reply::with_keyboard(
        t_lang("favorites-title", language_code),
        favorites_list_keyboard(&favorites, language_code),
    )
}

/// Detail card of one favorite with a remove button
pub fn favorite_detail(
    ctx: &AppContext,
    user_id: i64,
    route_key: &str,
    language_code: Option<&str>,
) -> Reply {
    let Some(favorite) = ctx.favorites.find(user_id, route_key) else {
        return Reply::with_keyboard(
            t_lang("favorite-not-found", language_code),
            my_favorites_keyboard(language_code),
        );
    };

    let body = match &favorite {
        Favorite::Route(route) => format!(
            "🛫 {} → {}\n{}",
            route.origin,
            route.destination,
            render_fields(
                &[
                    DisplayField::new(
                        "📅",
                        "field-departure",
                        route.depart_date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string()),
                    )
                    .or_fallback("value-any-date"),
                    DisplayField::new(
                        "📅",
                        "field-return",
                        route.return_date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string()),
                    )
                    .or_fallback("value-not-specified-date"),
                ],
                language_code,
            )
        ),
        Favorite::Flight(flight) => format!(
            "✈️ {}\n{}",
            flight.flight_number,
            render_fields(
                &[
                    DisplayField::new("🏛️", "field-airline", flight.airline.clone()),
                    DisplayField::new("🛫", "field-departure", flight.departure_airport.clone()),
                    DisplayField::new("🛬", "field-arrival", flight.arrival_airport.clone()),
                    DisplayField::new(
                        "📅",
                        "field-flight-date",
                        flight.flight_date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string()),
                    ),
                    DisplayField::new(
                        "📅",
                        "field-scheduled-departure",
                        flight.scheduled_departure.as_deref().map(format_api_datetime),
                    ),
                    DisplayField::new(
                        "📊",
                        "field-status",
                        Some(flight_status_label(flight.current_status.as_deref(), language_code)),
                    ),
                ],
                language_code,
            )
        ),
    };

    let text = format!(
        "{}\n{}\n\n{}: {}",
        t_lang("favorite-detail-title", language_code),
        body,
        t_lang("favorite-added-at", language_code),
        favorite.added_at().format(DISPLAY_DATETIME_FORMAT)
    );
    Reply::with_keyboard(text, favorite_detail_keyboard(favorite.route_key(), language_code))
}

/// Remove one favorite
pub fn remove_favorite(
    ctx: &AppContext,
    user_id: i64,
    route_key: &str,
    language_code: Option<&str>,
) -> Reply {
    if ctx.favorites.remove(user_id, route_key) {
        info!(user_id = %user_id, route_key = %route_key, "Favorite removed by user");
        Reply::with_keyboard(
            t_lang("favorite-removed", language_code),
            my_favorites_keyboard(language_code),
        )
    } else {
        Reply::with_keyboard(
            t_lang("favorite-remove-missing", language_code),
            my_favorites_keyboard(language_code),
        )
    }
}
