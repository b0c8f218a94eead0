//! Search and lookup handlers
//!
//! Every handler validates its input, issues one API call and turns the
//! result into a [`Reply`]. Failures never escape: input errors become a
//! canned message, API errors a canned message plus a retry button.

use chrono::Duration;
use tracing::{info, warn};

use crate::api::AIRLINE_ROUTES_LIMIT;
use crate::dialogue::ChatMode;
use crate::errors::{ApiError, InputError};
use crate::fares::{
    api_date, calendar_rows, cheapest_in_window, format_api_datetime, format_api_day,
    format_price, monthly_stats, parse_month_key, today_in_moscow, DISPLAY_DATE_FORMAT,
    MAX_TICKETS_SHOWN,
};
use crate::localization::{t_args_lang, t_lang};
use crate::models::{FavoriteFlight, FlightEndpoint, LiveInfo, SearchParams, Ticket};
use crate::query_parser::{normalize_flight_number, parse_trip_dates, split_route_query, RouteTokens};
use crate::session::LastSearch;

use super::ui_builder::{
    airline_routes_keyboard, airline_selection_keyboard, back_keyboard, flight_result_keyboard,
    flight_status_label, period_keyboard, render_fields, retry_keyboard, ticket_result_keyboard,
    DisplayField, POPULAR_AIRLINES,
};
use super::{AppContext, Reply};

/// Moscow airports are shown under the city name
const MOSCOW_AIRPORTS: [&str; 3] = ["SVO", "DME", "VKO"];

/// Instruction shown when a mode is entered
pub fn mode_instructions(mode: ChatMode, language_code: Option<&str>) -> Reply {
    match mode.instruction_key() {
        Some(key) => Reply::with_keyboard(t_lang(key, language_code), back_keyboard(language_code)),
        None => Reply::text(t_lang("choose-action", language_code)),
    }
}

fn input_error_reply(err: InputError, language_code: Option<&str>) -> Reply {
    Reply::text(t_lang(err.message_key(), language_code))
}

fn api_error_reply(
    err: &ApiError,
    not_found_key: &str,
    args: &[(&str, &str)],
    retry_payload: &str,
    language_code: Option<&str>,
) -> Reply {
    warn!(error = %err, retry = %retry_payload, "API request failed");

    let code = match err {
        ApiError::Status(code) => code.to_string(),
        _ => String::new(),
    };
    let mut all_args = args.to_vec();
    all_args.push(("code", code.as_str()));

    Reply::with_keyboard(
        t_args_lang(err.message_key(not_found_key), &all_args, language_code),
        retry_keyboard(retry_payload, language_code),
    )
}

async fn resolve_cities(ctx: &AppContext, tokens: &RouteTokens) -> Result<(String, String), InputError> {
    let origin = ctx.reference.resolve_city_code(&tokens.origin).await;
    let destination = ctx.reference.resolve_city_code(&tokens.destination).await;
    match (origin, destination) {
        (Some(origin), Some(destination)) => Ok((origin, destination)),
        _ => Err(InputError::CityNotFound),
    }
}

fn price_text(ctx: &AppContext, price: f64) -> String {
    format!("{} {}", format_price(price), ctx.config.currency.to_uppercase())
}

async fn ticket_block(ctx: &AppContext, ticket: &Ticket, language_code: Option<&str>) -> String {
    let airline_code = ticket.airline.clone().unwrap_or_default();
    let flight_number = ticket
        .flight_number
        .as_ref()
        .map(|n| n.to_string())
        .unwrap_or_default();

    let airline_name = if airline_code.is_empty() {
        None
    } else {
        Some(ctx.reference.airline_name(&airline_code).await)
    };
    let aircraft_name = match ticket.plane.as_deref() {
        Some(plane) if !plane.trim().is_empty() => Some(ctx.reference.aircraft_name(plane).await),
        _ => None,
    };

    let fields = vec![
        DisplayField::new("✈️", "field-flight", Some(format!("{airline_code}{flight_number}"))),
        DisplayField::new("🏛️", "field-airline", airline_name),
        DisplayField::new("🛩️", "field-aircraft", aircraft_name).or_fallback("value-not-specified"),
        DisplayField::new("🛫", "field-departure", ticket.departure_at.as_deref().map(format_api_datetime)),
        DisplayField::new("🛬", "field-return", ticket.return_at.as_deref().map(format_api_datetime))
            .or_fallback("value-not-specified-date"),
        DisplayField::new("💰", "field-price", Some(price_text(ctx, ticket.price))),
    ];

    format!(
        "{}\n{}",
        render_fields(&fields, language_code),
        t_lang("ticket-disclaimer", language_code)
    )
}

/// Free text in cheap-tickets mode: `<from> <to> [DD.MM.YYYY [DD.MM.YYYY]]`
///
/// Without dates the period presets are offered; with dates the search runs
/// immediately.
pub async fn handle_cheap_query(
    ctx: &AppContext,
    user_id: i64,
    text: &str,
    language_code: Option<&str>,
) -> Reply {
    let tokens = match split_route_query(text) {
        Ok(tokens) => tokens,
        Err(e) => return input_error_reply(e, language_code),
    };
    let (origin, destination) = match resolve_cities(ctx, &tokens).await {
        Ok(codes) => codes,
        Err(e) => return input_error_reply(e, language_code),
    };
    let (depart, ret) = match parse_trip_dates(
        tokens.depart.as_deref(),
        tokens.ret.as_deref(),
        today_in_moscow(),
    ) {
        Ok(dates) => dates,
        Err(e) => return input_error_reply(e, language_code),
    };

    let params = SearchParams::new(&origin, &destination).with_dates(depart, ret);
    info!(user_id = %user_id, origin = %origin, destination = %destination, "Cheap tickets query");
    ctx.sessions.remember(user_id, LastSearch::Route(params.clone()));

    if !params.has_dates() {
        return Reply::with_keyboard(
            t_lang("period-prompt", language_code),
            period_keyboard(language_code),
        );
    }

    search_tickets(ctx, &params, language_code).await
}

/// Search the cheapest tickets for a route and list up to five of them
pub async fn search_tickets(
    ctx: &AppContext,
    params: &SearchParams,
    language_code: Option<&str>,
) -> Reply {
    let tickets = match ctx.fares.cheap_tickets(params).await {
        Ok(tickets) if !tickets.is_empty() => tickets,
        Ok(_) => {
            return Reply::with_keyboard(
                t_lang("tickets-not-found", language_code),
                retry_keyboard("cheap", language_code),
            )
        }
        Err(e) => return api_error_reply(&e, "tickets-not-found", &[], "cheap", language_code),
    };

    let mut text = t_args_lang(
        "tickets-header",
        &[("origin", &params.origin), ("destination", &params.destination)],
        language_code,
    );
    let dates = render_fields(
        &[
            DisplayField::new(
                "🛫",
                "field-departure",
                params.depart_date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string()),
            ),
            DisplayField::new(
                "🛬",
                "field-return",
                params.return_date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string()),
            ),
        ],
        language_code,
    );
    if !dates.is_empty() {
        text.push('\n');
        text.push_str(&dates);
    }

    for ticket in tickets.iter().take(MAX_TICKETS_SHOWN) {
        text.push_str("\n\n");
        text.push_str(&ticket_block(ctx, ticket, language_code).await);
    }

    Reply::with_keyboard(text, ticket_result_keyboard(language_code))
}

/// Period preset pressed after a route search without dates
pub async fn handle_period_selection(
    ctx: &AppContext,
    user_id: i64,
    days: Option<u32>,
    language_code: Option<&str>,
) -> Reply {
    let Some(params) = ctx.sessions.last_route(user_id) else {
        return Reply::with_keyboard(
            t_lang("error-search-params-missing", language_code),
            back_keyboard(language_code),
        );
    };

    let Some(days) = days else {
        // "No period" searches the bare route and forgets any earlier dates
        let params = params.with_dates(None, None);
        ctx.sessions.remember(user_id, LastSearch::Route(params.clone()));
        return search_tickets(ctx, &params, language_code).await;
    };

    let start = today_in_moscow();
    let end = start + Duration::days(i64::from(days));

    let entries = match ctx
        .fares
        .calendar(&params.origin, &params.destination, start, Some(end))
        .await
    {
        Ok(entries) => entries,
        Err(e) => return api_error_reply(&e, "period-not-found", &[], "cheap", language_code),
    };

    let Some(best) = cheapest_in_window(&entries, start, end) else {
        return Reply::with_keyboard(
            t_lang("period-not-found", language_code),
            retry_keyboard("cheap", language_code),
        );
    };

    let depart = best.departure_at.as_deref().and_then(api_date);
    let ret = best.return_at.as_deref().and_then(api_date);
    ctx.sessions.remember(
        user_id,
        LastSearch::Route(params.clone().with_dates(depart, ret)),
    );
    info!(user_id = %user_id, days = days, price = best.price, "Cheapest ticket in period found");

    let days_text = days.to_string();
    let start_text = start.format(DISPLAY_DATE_FORMAT).to_string();
    let end_text = end.format(DISPLAY_DATE_FORMAT).to_string();
    let text = format!(
        "{}\n{}\n\n{}",
        t_args_lang(
            "period-header",
            &[("origin", &params.origin), ("destination", &params.destination)],
            language_code,
        ),
        t_args_lang(
            "period-range",
            &[("start", &start_text), ("end", &end_text), ("days", &days_text)],
            language_code,
        ),
        ticket_block(ctx, &Ticket::from(best), language_code).await
    );

    Reply::with_keyboard(text, ticket_result_keyboard(language_code))
}

/// Free text in price calendar mode: `<from> <to>`
pub async fn handle_calendar_query(
    ctx: &AppContext,
    text: &str,
    language_code: Option<&str>,
) -> Reply {
    let tokens = match split_route_query(text) {
        Ok(tokens) => tokens,
        Err(e) => return input_error_reply(e, language_code),
    };
    let (origin, destination) = match resolve_cities(ctx, &tokens).await {
        Ok(codes) => codes,
        Err(e) => return input_error_reply(e, language_code),
    };

    let entries = match ctx
        .fares
        .calendar(&origin, &destination, today_in_moscow(), None)
        .await
    {
        Ok(entries) => entries,
        Err(e) => return api_error_reply(&e, "tickets-not-found", &[], "calendar", language_code),
    };

    let rows = calendar_rows(&entries);
    if rows.is_empty() {
        return Reply::with_keyboard(
            t_lang("tickets-not-found", language_code),
            retry_keyboard("calendar", language_code),
        );
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|(day, price)| format!("📅 {}: {}", format_api_day(day), price_text(ctx, *price)))
        .collect();

    let text = format!(
        "{}\n\n{}\n\n{}",
        t_args_lang(
            "calendar-header",
            &[("origin", &origin), ("destination", &destination)],
            language_code,
        ),
        lines.join("\n"),
        t_args_lang(
            "calendar-link",
            &[("origin", &origin), ("destination", &destination)],
            language_code,
        )
    );
    Reply::with_keyboard(text, back_keyboard(language_code))
}

/// `Август 2025` for `2025-08`, or the key itself when it is not a month
fn month_label(key: &str, language_code: Option<&str>) -> String {
    match parse_month_key(key) {
        Some((year, month)) => format!("{} {year}", t_lang(&format!("month-{month}"), language_code)),
        None => key.to_string(),
    }
}

/// Free text in price statistics mode: `<from> <to>`
pub async fn handle_stats_query(ctx: &AppContext, text: &str, language_code: Option<&str>) -> Reply {
    let tokens = match split_route_query(text) {
        Ok(tokens) => tokens,
        Err(e) => return input_error_reply(e, language_code),
    };
    let (origin, destination) = match resolve_cities(ctx, &tokens).await {
        Ok(codes) => codes,
        Err(e) => return input_error_reply(e, language_code),
    };

    let entries = match ctx.fares.monthly_prices(&origin, &destination).await {
        Ok(entries) => entries,
        Err(e) => return api_error_reply(&e, "stats-no-data", &[], "stats", language_code),
    };

    let Some(stats) = monthly_stats(&entries) else {
        return Reply::with_keyboard(
            t_lang("stats-no-data", language_code),
            retry_keyboard("stats", language_code),
        );
    };

    let months: Vec<String> = stats
        .months
        .iter()
        .map(|month| {
            format!(
                "• {}:\n  💰 {}",
                month_label(&month.month, language_code),
                t_args_lang(
                    "stats-min-price",
                    &[("price", &price_text(ctx, month.price))],
                    language_code,
                )
            )
        })
        .collect();

    let cheapest = format!(
        "{} - {}",
        month_label(&stats.cheapest.month, language_code),
        price_text(ctx, stats.cheapest.price)
    );
    let most_expensive = format!(
        "{} - {}",
        month_label(&stats.most_expensive.month, language_code),
        price_text(ctx, stats.most_expensive.price)
    );
    let average = price_text(ctx, stats.average as f64);
    let spread = price_text(ctx, stats.spread);
    let count = stats.months.len().to_string();

    let summary = [
        t_lang("stats-summary-title", language_code),
        t_args_lang("stats-cheapest-month", &[("month", &cheapest)], language_code),
        t_args_lang("stats-expensive-month", &[("month", &most_expensive)], language_code),
        t_args_lang("stats-average", &[("price", &average)], language_code),
        t_args_lang("stats-spread", &[("price", &spread)], language_code),
        t_args_lang("stats-months-count", &[("count", &count)], language_code),
    ]
    .join("\n");

    let text = format!(
        "{}\n\n{}\n\n{}",
        t_args_lang(
            "stats-header",
            &[("origin", &origin), ("destination", &destination)],
            language_code,
        ),
        months.join("\n\n"),
        summary
    );
    Reply::with_keyboard(text, back_keyboard(language_code))
}

/// Airline picker for the popular routes menu
pub fn airline_selection(language_code: Option<&str>) -> Reply {
    Reply::with_keyboard(
        t_lang("airline-selection", language_code),
        airline_selection_keyboard(language_code),
    )
}

async fn city_label(ctx: &AppContext, code: &str, language_code: Option<&str>) -> String {
    if MOSCOW_AIRPORTS.contains(&code) {
        return t_args_lang("moscow-airport", &[("code", code)], language_code);
    }
    let name = ctx.reference.city_name(code).await;
    if name == code {
        code.to_string()
    } else {
        format!("{name} ({code})")
    }
}

/// Top routes of an airline
pub async fn handle_airline_routes(
    ctx: &AppContext,
    airline_code: &str,
    language_code: Option<&str>,
) -> Reply {
    let routes = match ctx.fares.airline_directions(airline_code).await {
        Ok(routes) => routes,
        Err(e) => {
            return api_error_reply(&e, "airline-routes-failed", &[], "airline_routes", language_code)
        }
    };

    let airline_name = match POPULAR_AIRLINES.iter().find(|(code, _)| *code == airline_code) {
        Some((_, name)) => name.to_string(),
        None => ctx.reference.airline_name(airline_code).await,
    };

    let mut lines = Vec::with_capacity(routes.len());
    for (i, route) in routes.iter().enumerate() {
        let line = match route.split_once('-') {
            Some((origin, destination)) => format!(
                "{}. {} → {}",
                i + 1,
                city_label(ctx, origin, language_code).await,
                city_label(ctx, destination, language_code).await
            ),
            None => format!("{}. {route}", i + 1),
        };
        lines.push(line);
    }

    let limit = AIRLINE_ROUTES_LIMIT.to_string();
    let text = format!(
        "{}\n\n{}",
        t_args_lang(
            "airline-routes-header",
            &[("limit", &limit), ("name", &airline_name), ("code", airline_code)],
            language_code,
        ),
        lines.join("\n")
    );
    Reply::with_keyboard(text, airline_routes_keyboard(language_code))
}

fn airport_text(endpoint: Option<&FlightEndpoint>, language_code: Option<&str>) -> String {
    let airport = endpoint
        .and_then(|e| e.airport.clone())
        .unwrap_or_else(|| t_lang("value-unknown", language_code));
    let iata = endpoint
        .and_then(|e| e.iata.clone())
        .unwrap_or_else(|| "?".to_string());
    format!("{airport} ({iata})")
}

fn delay_text(endpoint: Option<&FlightEndpoint>, language_code: Option<&str>) -> Option<String> {
    endpoint
        .and_then(|e| e.delay)
        .filter(|minutes| *minutes != 0)
        .map(|minutes| t_args_lang("value-minutes", &[("minutes", &minutes.to_string())], language_code))
}

/// Position of an airborne flight, or "on the ground"
fn live_text(live: Option<&LiveInfo>, language_code: Option<&str>) -> Option<String> {
    let live = live?;
    if live.is_ground == Some(true) {
        return Some(t_lang("value-live-ground", language_code));
    }
    let altitude = live.altitude?;
    let speed = live.speed_horizontal?;
    Some(t_args_lang(
        "value-live-airborne",
        &[
            ("altitude", &format!("{altitude:.0}")),
            ("speed", &format!("{speed:.0}")),
        ],
        language_code,
    ))
}

/// Free text in flight info mode: a flight number such as `SU1234`
pub async fn handle_flight_query(
    ctx: &AppContext,
    user_id: i64,
    text: &str,
    language_code: Option<&str>,
) -> Reply {
    let flight_number = match normalize_flight_number(text) {
        Ok(number) => number,
        Err(e) => return input_error_reply(e, language_code),
    };

    let record = match ctx.flights.flight_status(&flight_number).await {
        Ok(record) => record,
        Err(e) => {
            return api_error_reply(
                &e,
                "flight-not-found",
                &[("flight", &flight_number)],
                "flight_info",
                language_code,
            )
        }
    };

    info!(user_id = %user_id, flight = %flight_number, "Flight status retrieved");
    ctx.sessions.remember(
        user_id,
        LastSearch::Flight(FavoriteFlight::from_record(&flight_number, &record)),
    );

    let departure = record.departure.as_ref();
    let arrival = record.arrival.as_ref();
    let fields = vec![
        DisplayField::new("🛫", "field-departure", Some(airport_text(departure, language_code))),
        DisplayField::new("🛬", "field-arrival", Some(airport_text(arrival, language_code))),
        DisplayField::new(
            "📅",
            "field-scheduled-departure",
            departure.and_then(|d| d.scheduled.as_deref()).map(format_api_datetime),
        ),
        DisplayField::new(
            "📅",
            "field-scheduled-arrival",
            arrival.and_then(|a| a.scheduled.as_deref()).map(format_api_datetime),
        ),
        DisplayField::new(
            "🕐",
            "field-actual-departure",
            departure.and_then(|d| d.actual.as_deref()).map(format_api_datetime),
        ),
        DisplayField::new(
            "🕐",
            "field-actual-arrival",
            arrival.and_then(|a| a.actual.as_deref()).map(format_api_datetime),
        ),
        DisplayField::new("🏢", "field-departure-terminal", departure.and_then(|d| d.terminal.clone())),
        DisplayField::new("🚪", "field-departure-gate", departure.and_then(|d| d.gate.clone())),
        DisplayField::new("🏢", "field-arrival-terminal", arrival.and_then(|a| a.terminal.clone())),
        DisplayField::new("🚪", "field-arrival-gate", arrival.and_then(|a| a.gate.clone())),
        DisplayField::new(
            "📊",
            "field-status",
            Some(flight_status_label(record.flight_status.as_deref(), language_code)),
        ),
        DisplayField::new("🏛️", "field-airline", record.airline.as_ref().and_then(|a| a.name.clone())),
        DisplayField::new("🛩️", "field-aircraft", record.aircraft.as_ref().and_then(|a| a.iata.clone())),
        DisplayField::new(
            "🔖",
            "field-aircraft-registration",
            record.aircraft.as_ref().and_then(|a| a.registration.clone()),
        ),
        DisplayField::new("🔢", "field-flight-number", record.flight.as_ref().and_then(|f| f.number.clone())),
        DisplayField::new("⏰", "field-departure-delay", delay_text(departure, language_code)),
        DisplayField::new("⏰", "field-arrival-delay", delay_text(arrival, language_code)),
        DisplayField::new("📡", "field-live", live_text(record.live.as_ref(), language_code)),
    ];

    let text = format!(
        "{}\n\n{}",
        t_args_lang("flight-info-header", &[("flight", &flight_number)], language_code),
        render_fields(&fields, language_code)
    );
    Reply::with_keyboard(text, flight_result_keyboard(language_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2025-08", Some("ru")), "Август 2025");
        assert_eq!(month_label("2025-01-01", Some("en")), "January 2025");
        assert_eq!(month_label("later", Some("ru")), "later");
    }

    #[test]
    fn test_delay_text_skips_zero() {
        let endpoint = FlightEndpoint {
            delay: Some(0),
            ..Default::default()
        };
        assert_eq!(delay_text(Some(&endpoint), Some("ru")), None);

        let endpoint = FlightEndpoint {
            delay: Some(25),
            ..Default::default()
        };
        assert_eq!(delay_text(Some(&endpoint), Some("ru")).as_deref(), Some("25 мин"));
    }

    #[test]
    fn test_live_text() {
        assert_eq!(live_text(None, Some("ru")), None);

        let grounded = LiveInfo {
            is_ground: Some(true),
            ..Default::default()
        };
        assert_eq!(live_text(Some(&grounded), Some("ru")).as_deref(), Some("на земле"));

        let airborne = LiveInfo {
            altitude: Some(10668.4),
            speed_horizontal: Some(851.9),
            is_ground: Some(false),
        };
        assert_eq!(
            live_text(Some(&airborne), Some("en")).as_deref(),
            Some("altitude 10668 m, speed 852 km/h")
        );

        let partial = LiveInfo {
            altitude: Some(9000.0),
            ..Default::default()
        };
        assert_eq!(live_text(Some(&partial), Some("ru")), None);
    }

    #[test]
    fn test_airport_text_fallbacks() {
        assert_eq!(airport_text(None, Some("ru")), "Неизвестно (?)");
        let endpoint = FlightEndpoint {
            airport: Some("Sheremetyevo".to_string()),
            iata: Some("SVO".to_string()),
            ..Default::default()
        };
        assert_eq!(airport_text(Some(&endpoint), Some("ru")), "Sheremetyevo (SVO)");
    }
}
