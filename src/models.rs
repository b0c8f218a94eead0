//! # Flight Data Model
//!
//! Data structures shared by the handlers, the favorites store and the
//! notification job.
//!
//! ## Core Concepts
//!
//! - **Favorite**: a saved watchlist entry, either a route or a single flight
//! - **route_key**: deduplication key of a favorite within one user's list
//! - **SearchParams**: the last route a user searched for
//! - **Ticket / CalendarEntry / MonthlyPrice / FlightRecord**: records returned
//!   by the external APIs
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use flights::models::{Favorite, FavoriteRoute};
//!
//! let depart = NaiveDate::from_ymd_opt(2025, 8, 1);
//! let route = FavoriteRoute::new("MOW", "AER", depart, None);
//! assert_eq!(route.route_key, "MOW-AER-2025-08-01");
//!
//! let favorite = Favorite::Route(route);
//! assert_eq!(favorite.route_key(), "MOW-AER-2025-08-01");
//! ```

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when joining route key parts
pub const ROUTE_KEY_SEPARATOR: &str = "-";

/// Build the deduplication key of a route favorite
///
/// Origin and destination are always present; dates are appended only when set.
pub fn route_key(
    origin: &str,
    destination: &str,
    depart_date: Option<NaiveDate>,
    return_date: Option<NaiveDate>,
) -> String {
    let mut parts = vec![origin.to_string(), destination.to_string()];
    if let Some(date) = depart_date {
        parts.push(date.format("%Y-%m-%d").to_string());
    }
    if let Some(date) = return_date {
        parts.push(date.format("%Y-%m-%d").to_string());
    }
    parts.join(ROUTE_KEY_SEPARATOR)
}

/// Build the deduplication key of a flight favorite
pub fn flight_key(flight_number: &str, flight_date: Option<NaiveDate>) -> String {
    match flight_date {
        Some(date) => format!("{}{}{}", flight_number, ROUTE_KEY_SEPARATOR, date.format("%Y-%m-%d")),
        None => flight_number.to_string(),
    }
}

/// A saved route watched for price changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRoute {
    pub route_key: String,
    /// IATA code of the origin city
    pub origin: String,
    /// IATA code of the destination city
    pub destination: String,
    #[serde(default)]
    pub depart_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    pub added_at: NaiveDateTime,
}

impl FavoriteRoute {
    pub fn new(
        origin: &str,
        destination: &str,
        depart_date: Option<NaiveDate>,
        return_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            route_key: route_key(origin, destination, depart_date, return_date),
            origin: origin.to_string(),
            destination: destination.to_string(),
            depart_date,
            return_date,
            added_at: Local::now().naive_local(),
        }
    }

    pub fn from_search(params: &SearchParams) -> Self {
        Self::new(
            &params.origin,
            &params.destination,
            params.depart_date,
            params.return_date,
        )
    }
}

/// Discriminator written as `"type": "flight"` in the persisted document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightTag {
    #[default]
    #[serde(rename = "flight")]
    Flight,
}

/// A saved flight watched for status changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteFlight {
    pub route_key: String,
    #[serde(rename = "type")]
    pub kind: FlightTag,
    /// Flight number as typed by the user, e.g. `SU1234`
    pub flight_number: String,
    #[serde(default)]
    pub flight_iata: Option<String>,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub departure_airport: Option<String>,
    #[serde(default)]
    pub arrival_airport: Option<String>,
    #[serde(default)]
    pub flight_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_status: Option<String>,
    #[serde(default)]
    pub scheduled_departure: Option<String>,
    #[serde(default)]
    pub estimated_departure: Option<String>,
    pub added_at: NaiveDateTime,
}

impl FavoriteFlight {
    /// Snapshot a flight-status record for the watchlist
    pub fn from_record(flight_number: &str, record: &FlightRecord) -> Self {
        let flight_date = record
            .flight_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let departure = record.departure.as_ref();
        let arrival = record.arrival.as_ref();

        Self {
            route_key: flight_key(flight_number, flight_date),
            kind: FlightTag::Flight,
            flight_number: flight_number.to_string(),
            flight_iata: record.flight.as_ref().and_then(|f| f.iata.clone()),
            airline: record.airline.as_ref().and_then(|a| a.name.clone()),
            departure_airport: departure.and_then(|d| d.airport.clone()),
            arrival_airport: arrival.and_then(|a| a.airport.clone()),
            flight_date,
            current_status: record.flight_status.clone(),
            scheduled_departure: departure.and_then(|d| d.scheduled.clone()),
            estimated_departure: departure.and_then(|d| d.estimated.clone()),
            added_at: Local::now().naive_local(),
        }
    }
}

/// A watchlist entry
///
/// The persisted list is untyped: flight entries carry `"type": "flight"`,
/// route entries carry no type at all. Flight is tried first so that the
/// discriminator decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Favorite {
    Flight(FavoriteFlight),
    Route(FavoriteRoute),
}

impl Favorite {
    pub fn route_key(&self) -> &str {
        match self {
            Favorite::Flight(flight) => &flight.route_key,
            Favorite::Route(route) => &route.route_key,
        }
    }

    pub fn added_at(&self) -> NaiveDateTime {
        match self {
            Favorite::Flight(flight) => flight.added_at,
            Favorite::Route(route) => route.added_at,
        }
    }
}

/// Parameters of the last route search of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub origin: String,
    pub destination: String,
    pub depart_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

impl SearchParams {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            depart_date: None,
            return_date: None,
        }
    }

    pub fn with_dates(mut self, depart: Option<NaiveDate>, ret: Option<NaiveDate>) -> Self {
        self.depart_date = depart;
        self.return_date = ret;
        self
    }

    pub fn has_dates(&self) -> bool {
        self.depart_date.is_some() || self.return_date.is_some()
    }
}

/// Flight numbers come back either as numbers or as strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlightNumber {
    Number(u64),
    Text(String),
}

impl fmt::Display for FlightNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightNumber::Number(n) => write!(f, "{n}"),
            FlightNumber::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One ticket of the cheapest-fares search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub price: f64,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub flight_number: Option<FlightNumber>,
    #[serde(default)]
    pub departure_at: Option<String>,
    #[serde(default)]
    pub return_at: Option<String>,
    #[serde(default)]
    pub plane: Option<String>,
}

/// One date bucket of the price calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub price: f64,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub flight_number: Option<FlightNumber>,
    #[serde(default)]
    pub departure_at: Option<String>,
    #[serde(default)]
    pub return_at: Option<String>,
}

impl From<&CalendarEntry> for Ticket {
    fn from(entry: &CalendarEntry) -> Self {
        Self {
            price: entry.price,
            airline: entry.airline.clone(),
            flight_number: entry.flight_number.clone(),
            departure_at: entry.departure_at.clone(),
            return_at: entry.return_at.clone(),
            plane: None,
        }
    }
}

/// Minimum price of one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPrice {
    pub price: f64,
}

/// Departure or arrival side of a flight-status record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightEndpoint {
    #[serde(default)]
    pub airport: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub terminal: Option<String>,
    #[serde(default)]
    pub gate: Option<String>,
    #[serde(default)]
    pub delay: Option<i64>,
    #[serde(default)]
    pub scheduled: Option<String>,
    #[serde(default)]
    pub estimated: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirlineInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightIdent {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftInfo {
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub registration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveInfo {
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed_horizontal: Option<f64>,
    #[serde(default)]
    pub is_ground: Option<bool>,
}

/// One record of the flight-status API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(default)]
    pub flight_date: Option<String>,
    #[serde(default)]
    pub flight_status: Option<String>,
    #[serde(default)]
    pub departure: Option<FlightEndpoint>,
    #[serde(default)]
    pub arrival: Option<FlightEndpoint>,
    #[serde(default)]
    pub airline: Option<AirlineInfo>,
    #[serde(default)]
    pub flight: Option<FlightIdent>,
    #[serde(default)]
    pub aircraft: Option<AircraftInfo>,
    #[serde(default)]
    pub live: Option<LiveInfo>,
}
