//! # Fare Algorithms
//!
//! Pure functions over API records: picking the cheapest ticket, the cheapest
//! round trip inside a period, calendar rows and monthly price statistics,
//! plus the date and price formatting shared by every reply.
//!
//! Every minimum/maximum scan uses a strict comparison, so on equal prices the
//! first record in response order wins.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::models::{CalendarEntry, MonthlyPrice, Ticket};

/// Maximum number of tickets listed in a search reply
pub const MAX_TICKETS_SHOWN: usize = 5;

/// Maximum number of rows in a price calendar reply
pub const MAX_CALENDAR_ROWS: usize = 30;

/// Period presets offered after a search without dates, in days
pub const PERIOD_PRESETS: [u32; 4] = [7, 14, 30, 90];

const MOSCOW_UTC_OFFSET_SECS: i32 = 3 * 3600;

/// Display format of API timestamps
pub const DISPLAY_DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Display format of calendar days
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Moscow time zone (fixed UTC+3, no DST since 2014)
pub fn moscow_offset() -> FixedOffset {
    FixedOffset::east_opt(MOSCOW_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current date in Moscow
pub fn today_in_moscow() -> NaiveDate {
    Utc::now().with_timezone(&moscow_offset()).date_naive()
}

/// Cheapest ticket of a search result
pub fn cheapest_ticket(tickets: &[Ticket]) -> Option<&Ticket> {
    let mut best: Option<&Ticket> = None;
    for ticket in tickets {
        if best.map_or(true, |current| ticket.price < current.price) {
            best = Some(ticket);
        }
    }
    best
}

/// Calendar date of an API timestamp (`2025-08-01T10:00:00+03:00` or `2025-08-01`)
pub fn api_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

/// Cheapest calendar bucket whose departure and return both fall in `[start, end]`
///
/// Buckets without a parseable departure or return date are skipped.
pub fn cheapest_in_window(
    entries: &[(String, CalendarEntry)],
    start: NaiveDate,
    end: NaiveDate,
) -> Option<&CalendarEntry> {
    let in_window = |raw: Option<&str>| {
        raw.and_then(api_date)
            .is_some_and(|date| start <= date && date <= end)
    };

    let mut best: Option<&CalendarEntry> = None;
    for (_, entry) in entries {
        if !in_window(entry.departure_at.as_deref()) || !in_window(entry.return_at.as_deref()) {
            continue;
        }
        if best.map_or(true, |current| entry.price < current.price) {
            best = Some(entry);
        }
    }
    best
}

/// Calendar rows sorted by day, capped at [`MAX_CALENDAR_ROWS`]
pub fn calendar_rows(entries: &[(String, CalendarEntry)]) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = entries
        .iter()
        .map(|(day, entry)| (day.clone(), entry.price))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows.truncate(MAX_CALENDAR_ROWS);
    rows
}

/// Minimum price of one month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthPrice {
    /// Month key as returned by the API (`2025-08` or `2025-08-01`)
    pub month: String,
    pub price: f64,
}

/// Summary of the monthly minimum prices of a route
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    /// Months sorted chronologically
    pub months: Vec<MonthPrice>,
    pub cheapest: MonthPrice,
    pub most_expensive: MonthPrice,
    /// Average of the monthly minimums, truncated to an integer
    pub average: i64,
    /// Difference between the most expensive and the cheapest month
    pub spread: f64,
}

/// Compute monthly statistics; `None` when no month has a price
///
/// Months with a zero price carry no data and are left out.
pub fn monthly_stats(entries: &[(String, MonthlyPrice)]) -> Option<MonthlyStats> {
    let mut months: Vec<MonthPrice> = entries
        .iter()
        .filter(|(_, entry)| entry.price > 0.0)
        .map(|(month, entry)| MonthPrice {
            month: month.clone(),
            price: entry.price,
        })
        .collect();
    months.sort_by(|a, b| a.month.cmp(&b.month));

    let first = months.first()?.clone();
    let (mut cheapest, mut most_expensive) = (first.clone(), first);
    for month in &months {
        if month.price < cheapest.price {
            cheapest = month.clone();
        }
        if month.price > most_expensive.price {
            most_expensive = month.clone();
        }
    }

    let total: f64 = months.iter().map(|m| m.price).sum();
    let average = (total / months.len() as f64) as i64;
    let spread = most_expensive.price - cheapest.price;

    Some(MonthlyStats {
        months,
        cheapest,
        most_expensive,
        average,
        spread,
    })
}

/// Year and month number of a month key
pub fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.get(..7)?.split_once('-')?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year.parse().ok()?, month))
}

/// Render an API timestamp in Moscow time
///
/// Timestamps without an offset are taken as UTC; a bare date renders as
/// `DD.MM.YYYY`; anything else is returned unchanged.
pub fn format_api_datetime(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&moscow_offset())
            .format(DISPLAY_DATETIME_FORMAT)
            .to_string();
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive
                .and_utc()
                .with_timezone(&moscow_offset())
                .format(DISPLAY_DATETIME_FORMAT)
                .to_string();
        }
    }
    format_api_day(raw)
}

/// Render a `YYYY-MM-DD` day as `DD.MM.YYYY`, or unchanged when unparseable
pub fn format_api_day(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format(DISPLAY_DATE_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Render a price without a fractional part when it is whole
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{price:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(price: f64, depart: &str, ret: &str) -> CalendarEntry {
        CalendarEntry {
            price,
            airline: Some("SU".to_string()),
            flight_number: None,
            departure_at: Some(depart.to_string()),
            return_at: Some(ret.to_string()),
        }
    }

    fn ticket(price: f64, airline: &str) -> Ticket {
        Ticket {
            price,
            airline: Some(airline.to_string()),
            flight_number: None,
            departure_at: None,
            return_at: None,
            plane: None,
        }
    }

    #[test]
    fn test_cheapest_in_window_first_seen_wins() {
        let entries = vec![
            ("2025-08-01".to_string(), entry(500.0, "2025-08-01T10:00:00+03:00", "2025-08-05T10:00:00+03:00")),
            ("2025-08-02".to_string(), entry(300.0, "2025-08-02T10:00:00+03:00", "2025-08-06T10:00:00+03:00")),
            ("2025-08-03".to_string(), entry(300.0, "2025-08-03T10:00:00+03:00", "2025-08-07T10:00:00+03:00")),
            ("2025-08-04".to_string(), entry(700.0, "2025-08-04T10:00:00+03:00", "2025-08-08T10:00:00+03:00")),
        ];

        let best = cheapest_in_window(&entries, date(2025, 8, 1), date(2025, 8, 31)).unwrap();
        assert_eq!(best.price, 300.0);
        assert_eq!(best.departure_at.as_deref(), Some("2025-08-02T10:00:00+03:00"));
    }

    #[test]
    fn test_cheapest_in_window_requires_both_dates_inside() {
        let entries = vec![
            // return after the window
            ("a".to_string(), entry(100.0, "2025-08-01T10:00:00+03:00", "2025-09-15T10:00:00+03:00")),
            // departure before the window
            ("b".to_string(), entry(150.0, "2025-07-20T10:00:00+03:00", "2025-08-03T10:00:00+03:00")),
            ("c".to_string(), entry(900.0, "2025-08-01T10:00:00+03:00", "2025-08-07T10:00:00+03:00")),
        ];

        let best = cheapest_in_window(&entries, date(2025, 8, 1), date(2025, 8, 7)).unwrap();
        assert_eq!(best.price, 900.0);

        assert!(cheapest_in_window(&entries, date(2025, 10, 1), date(2025, 10, 7)).is_none());
    }

    #[test]
    fn test_cheapest_ticket_ties() {
        let tickets = vec![ticket(4000.0, "SU"), ticket(3500.0, "S7"), ticket(3500.0, "DP")];
        assert_eq!(cheapest_ticket(&tickets).unwrap().airline.as_deref(), Some("S7"));
        assert!(cheapest_ticket(&[]).is_none());
    }

    #[test]
    fn test_calendar_rows_sorted_and_capped() {
        let mut entries: Vec<(String, CalendarEntry)> = (1..=31)
            .rev()
            .map(|d| (format!("2025-08-{d:02}"), entry(d as f64, "", "")))
            .collect();
        entries.push(("2025-07-31".to_string(), entry(1.0, "", "")));

        let rows = calendar_rows(&entries);
        assert_eq!(rows.len(), MAX_CALENDAR_ROWS);
        assert_eq!(rows[0].0, "2025-07-31");
        assert_eq!(rows[1].0, "2025-08-01");
    }

    #[test]
    fn test_monthly_stats_summary() {
        let entries = vec![
            ("2025-09".to_string(), MonthlyPrice { price: 5000.0 }),
            ("2025-08".to_string(), MonthlyPrice { price: 3000.0 }),
            ("2025-10".to_string(), MonthlyPrice { price: 3000.0 }),
            ("2025-11".to_string(), MonthlyPrice { price: 4001.0 }),
            ("2025-12".to_string(), MonthlyPrice { price: 0.0 }),
        ];

        let stats = monthly_stats(&entries).unwrap();
        assert_eq!(stats.months.len(), 4);
        assert_eq!(stats.months[0].month, "2025-08");
        assert_eq!(stats.cheapest.month, "2025-08");
        assert_eq!(stats.most_expensive.month, "2025-09");
        assert_eq!(stats.average, 3750);
        assert_eq!(stats.spread, 2000.0);

        assert!(monthly_stats(&[]).is_none());
    }

    #[test]
    fn test_parse_month_key() {
        assert_eq!(parse_month_key("2025-08"), Some((2025, 8)));
        assert_eq!(parse_month_key("2025-08-01"), Some((2025, 8)));
        assert_eq!(parse_month_key("2025-13"), None);
        assert_eq!(parse_month_key("soon"), None);
    }

    #[test]
    fn test_format_api_datetime_in_moscow_time() {
        assert_eq!(format_api_datetime("2025-08-01T07:30:00Z"), "01.08.2025 10:30");
        assert_eq!(format_api_datetime("2025-08-01T10:30:00+03:00"), "01.08.2025 10:30");
        assert_eq!(format_api_datetime("2025-08-01T22:00:00+00:00"), "02.08.2025 01:00");
        assert_eq!(format_api_datetime("2025-08-01"), "01.08.2025");
        assert_eq!(format_api_datetime("tomorrow"), "tomorrow");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(3500.0), "3500");
        assert_eq!(format_price(99.5), "99.50");
    }
}
