//! # Notification Job
//!
//! Once a day every saved favorite is re-queried and its owner receives one
//! update message: the cheapest ticket for a route, the current status for a
//! flight. Each favorite is handled on its own; a failure is logged and
//! counted and the scan moves on.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bot::ui_builder::{flight_status_label, render_fields, DisplayField};
use crate::bot::AppContext;
use crate::config::NotifySchedule;
use crate::errors::ApiError;
use crate::fares::{cheapest_ticket, format_api_datetime, format_price, DISPLAY_DATE_FORMAT};
use crate::localization::{t_args_lang, t_lang};
use crate::models::{Favorite, FavoriteFlight, FavoriteRoute, SearchParams};

/// Notifications are written in the default language
const NOTIFY_LANGUAGE: Option<&str> = None;

/// Push channel to a user
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: i64, text: String) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl Notifier for Bot {
    fn notify(&self, user_id: i64, text: String) -> impl Future<Output = anyhow::Result<()>> + Send {
        async move {
            self.send_message(ChatId(user_id), text).await?;
            Ok(())
        }
    }
}

/// Counters of one favorites scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: usize,
    pub notified: usize,
    /// Favorites with nothing to report (no tickets, flight not found)
    pub skipped: usize,
    pub failed: usize,
}

/// Re-query every favorite and push one update per favorite
pub async fn check_favorites_and_notify<N: Notifier>(ctx: &AppContext, notifier: &N) -> CheckSummary {
    let snapshot = ctx.favorites.all();
    info!(users = snapshot.len(), "Running favorites check");

    let mut summary = CheckSummary::default();
    for (user_id, favorites) in snapshot {
        for favorite in favorites {
            summary.checked += 1;
            match build_update(ctx, &favorite).await {
                Ok(Some(text)) => match notifier.notify(user_id, text).await {
                    Ok(()) => summary.notified += 1,
                    Err(e) => {
                        error!(user_id = %user_id, route_key = %favorite.route_key(), error = %e, "Failed to send notification");
                        summary.failed += 1;
                    }
                },
                Ok(None) => {
                    debug!(user_id = %user_id, route_key = %favorite.route_key(), "Nothing to report");
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!(user_id = %user_id, route_key = %favorite.route_key(), error = %e, "Failed to refresh favorite");
                    summary.failed += 1;
                }
            }
        }
    }

    info!(
        checked = summary.checked,
        notified = summary.notified,
        skipped = summary.skipped,
        failed = summary.failed,
        "Favorites check completed"
    );
    summary
}

async fn build_update(ctx: &AppContext, favorite: &Favorite) -> Result<Option<String>, ApiError> {
    let result = match favorite {
        Favorite::Route(route) => route_update(ctx, route).await,
        Favorite::Flight(flight) => flight_update(ctx, flight).await,
    };
    match result {
        Err(ApiError::Empty) | Err(ApiError::Unsuccessful) => Ok(None),
        other => other,
    }
}

async fn route_update(ctx: &AppContext, route: &FavoriteRoute) -> Result<Option<String>, ApiError> {
    let params = SearchParams::new(&route.origin, &route.destination)
        .with_dates(route.depart_date, route.return_date);
    let tickets = ctx.fares.cheap_tickets(&params).await?;
    let Some(ticket) = cheapest_ticket(&tickets) else {
        return Ok(None);
    };

    let airline = match ticket.airline.as_deref() {
        Some(code) if !code.is_empty() => Some(ctx.reference.airline_name(code).await),
        _ => None,
    };
    let price = format!(
        "{} {}",
        format_price(ticket.price),
        ctx.config.currency.to_uppercase()
    );

    let route_fields = render_fields(
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
        NOTIFY_LANGUAGE,
    );
    let ticket_fields = render_fields(
        &[
            DisplayField::new("💰", "field-price", Some(price)),
            DisplayField::new("✈️", "field-airline", airline),
            DisplayField::new("🛫", "field-departure", ticket.departure_at.as_deref().map(format_api_datetime)),
        ],
        NOTIFY_LANGUAGE,
    );

    Ok(Some(format!(
        "{}\n🛫 {} → {}\n{}\n\n{}\n{}",
        t_lang("notify-route-title", NOTIFY_LANGUAGE),
        route.origin,
        route.destination,
        route_fields,
        t_lang("notify-cheapest-title", NOTIFY_LANGUAGE),
        ticket_fields
    )))
}

async fn flight_update(ctx: &AppContext, flight: &FavoriteFlight) -> Result<Option<String>, ApiError> {
    let query = flight.flight_iata.as_deref().unwrap_or(&flight.flight_number);
    let record = ctx.flights.flight_status(query).await?;

    let current = flight_status_label(record.flight_status.as_deref(), NOTIFY_LANGUAGE);
    let status = if flight.current_status == record.flight_status {
        current
    } else {
        format!(
            "{} → {}",
            flight_status_label(flight.current_status.as_deref(), NOTIFY_LANGUAGE),
            current
        )
    };

    let departure = record.departure.as_ref();
    let fields = render_fields(
        &[
            DisplayField::new("📊", "field-status", Some(status)),
            DisplayField::new(
                "📅",
                "field-scheduled-departure",
                departure.and_then(|d| d.scheduled.as_deref()).map(format_api_datetime),
            ),
            DisplayField::new(
                "📅",
                "field-estimated-departure",
                departure.and_then(|d| d.estimated.as_deref()).map(format_api_datetime),
            ),
            DisplayField::new(
                "⏰",
                "field-departure-delay",
                departure
                    .and_then(|d| d.delay)
                    .filter(|minutes| *minutes != 0)
                    .map(|minutes| {
                        t_args_lang("value-minutes", &[("minutes", &minutes.to_string())], NOTIFY_LANGUAGE)
                    }),
            ),
        ],
        NOTIFY_LANGUAGE,
    );

    Ok(Some(format!(
        "{}\n{}",
        t_args_lang("notify-flight-title", &[("flight", &flight.flight_number)], NOTIFY_LANGUAGE),
        fields
    )))
}

/// Time left until the next daily run at `schedule` (UTC)
///
/// A run exactly at `now` is considered past; the next one is tomorrow.
pub fn duration_until_next_run(now: DateTime<Utc>, schedule: NotifySchedule) -> Duration {
    let Some(today_run) = now
        .date_naive()
        .and_hms_opt(schedule.hour, schedule.minute, 0)
        .map(|run| run.and_utc())
    else {
        return Duration::from_secs(24 * 3600);
    };

    let next = if today_run > now {
        today_run
    } else {
        today_run + ChronoDuration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

/// Run the favorites check every day at the configured time
pub fn spawn_daily_check(bot: Bot, ctx: Arc<AppContext>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next_run(Utc::now(), ctx.config.schedule);
            info!(wait_secs = wait.as_secs(), "Next favorites check scheduled");
            tokio::time::sleep(wait).await;
            check_favorites_and_notify(&ctx, &bot).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let schedule = NotifySchedule { hour: 7, minute: 0 };
        assert_eq!(
            duration_until_next_run(at(6, 30, 0), schedule),
            Duration::from_secs(30 * 60)
        );
    }

    #[test]
    fn test_next_run_tomorrow() {
        let schedule = NotifySchedule { hour: 7, minute: 0 };
        assert_eq!(
            duration_until_next_run(at(7, 0, 0), schedule),
            Duration::from_secs(24 * 3600)
        );
        assert_eq!(
            duration_until_next_run(at(23, 0, 0), schedule),
            Duration::from_secs(8 * 3600)
        );
    }
}
