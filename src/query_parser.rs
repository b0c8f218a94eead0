//! # Query Parser Module
//!
//! Parses the constrained free-text grammar users type in search modes:
//!
//! ```text
//! <origin city> <destination city> [DD.MM.YYYY [DD.MM.YYYY]]
//! <airline code><flight number>
//! ```
//!
//! City names are returned raw; resolution to IATA codes happens in the
//! reference cache.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::InputError;

/// Date format users type
pub const USER_DATE_FORMAT: &str = "%d.%m.%Y";

// Airline designator (2 IATA chars or 3 ICAO letters), 1-5 digits, optional suffix
pub const FLIGHT_NUMBER_PATTERN: &str = r"^(?:[A-Z0-9]{2}|[A-Z]{3})\d{1,5}[A-Z]?$";

lazy_static! {
    pub static ref FLIGHT_NUMBER_REGEX: Regex =
        Regex::new(FLIGHT_NUMBER_PATTERN).expect("Flight number pattern should be valid");
}

/// Whitespace-separated tokens of a route query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTokens {
    pub origin: String,
    pub destination: String,
    pub depart: Option<String>,
    pub ret: Option<String>,
}

/// Split a route query into city names and optional raw date tokens
///
/// Tokens after the fourth are ignored.
pub fn split_route_query(text: &str) -> Result<RouteTokens, InputError> {
    let mut parts = text.split_whitespace();
    let (Some(origin), Some(destination)) = (parts.next(), parts.next()) else {
        return Err(InputError::MissingCities);
    };

    Ok(RouteTokens {
        origin: origin.to_string(),
        destination: destination.to_string(),
        depart: parts.next().map(str::to_string),
        ret: parts.next().map(str::to_string),
    })
}

/// Parse a `DD.MM.YYYY` date
pub fn parse_user_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), USER_DATE_FORMAT).ok()
}

/// Validate the optional departure and return dates of a route query
///
/// The departure date may not lie before `today`; the return date may not lie
/// before the departure date.
pub fn parse_trip_dates(
    depart: Option<&str>,
    ret: Option<&str>,
    today: NaiveDate,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), InputError> {
    let depart_date = match depart {
        Some(raw) => {
            let date = parse_user_date(raw).ok_or(InputError::InvalidDepartDate)?;
            if date < today {
                return Err(InputError::DepartDateInPast);
            }
            Some(date)
        }
        None => None,
    };

    let return_date = match ret {
        Some(raw) => {
            let date = parse_user_date(raw).ok_or(InputError::InvalidReturnDate)?;
            if let Some(depart_date) = depart_date {
                if date < depart_date {
                    return Err(InputError::ReturnBeforeDepart);
                }
            }
            Some(date)
        }
        None => None,
    };

    Ok((depart_date, return_date))
}

/// Normalize a typed flight number: trim, upper-case, drop inner spaces
pub fn normalize_flight_number(text: &str) -> Result<String, InputError> {
    let normalized: String = text
        .split_whitespace()
        .collect::<String>()
        .to_uppercase();

    if normalized.is_empty() {
        return Err(InputError::EmptyFlightNumber);
    }
    if !FLIGHT_NUMBER_REGEX.is_match(&normalized) {
        return Err(InputError::InvalidFlightNumber);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
    }

    #[test]
    fn test_split_requires_two_cities() {
        assert_eq!(split_route_query("Москва"), Err(InputError::MissingCities));
        assert_eq!(split_route_query("   "), Err(InputError::MissingCities));

        let tokens = split_route_query("  Москва   Сочи 01.08.2025 ").unwrap();
        assert_eq!(tokens.origin, "Москва");
        assert_eq!(tokens.destination, "Сочи");
        assert_eq!(tokens.depart.as_deref(), Some("01.08.2025"));
        assert_eq!(tokens.ret, None);
    }

    #[test]
    fn test_parse_depart_date() {
        let (depart, ret) = parse_trip_dates(Some("01.08.2025"), None, today()).unwrap();
        assert_eq!(depart, NaiveDate::from_ymd_opt(2025, 8, 1));
        assert_eq!(ret, None);
    }

    #[test]
    fn test_today_is_not_in_the_past() {
        assert!(parse_trip_dates(Some("15.07.2025"), None, today()).is_ok());
        assert_eq!(
            parse_trip_dates(Some("14.07.2025"), None, today()),
            Err(InputError::DepartDateInPast)
        );
    }

    #[test]
    fn test_return_before_depart_rejected() {
        assert_eq!(
            parse_trip_dates(Some("10.08.2025"), Some("01.08.2025"), today()),
            Err(InputError::ReturnBeforeDepart)
        );
        assert!(parse_trip_dates(Some("10.08.2025"), Some("10.08.2025"), today()).is_ok());
    }

    #[test]
    fn test_invalid_date_formats() {
        assert_eq!(
            parse_trip_dates(Some("2025-08-01"), None, today()),
            Err(InputError::InvalidDepartDate)
        );
        assert_eq!(
            parse_trip_dates(Some("01.08.2025"), Some("32.08.2025"), today()),
            Err(InputError::InvalidReturnDate)
        );
    }

    #[test]
    fn test_normalize_flight_number() {
        assert_eq!(normalize_flight_number(" su 1234 ").unwrap(), "SU1234");
        assert_eq!(normalize_flight_number("S7151").unwrap(), "S7151");
        assert_eq!(normalize_flight_number("u6256").unwrap(), "U6256");
        assert_eq!(normalize_flight_number("AFL1234").unwrap(), "AFL1234");
        assert_eq!(normalize_flight_number(""), Err(InputError::EmptyFlightNumber));
        assert_eq!(
            normalize_flight_number("Москва"),
            Err(InputError::InvalidFlightNumber)
        );
    }
}
