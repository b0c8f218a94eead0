//! # External API Clients
//!
//! Thin clients for the fares API (cheap tickets, price calendar, monthly
//! prices, airline directions) and the flight-status API. Every call is one
//! HTTP GET with a fixed timeout and no retry; responses are decoded into the
//! types of [`crate::models`] and failures into [`ApiError`].

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::errors::ApiError;
use crate::models::{CalendarEntry, FlightRecord, MonthlyPrice, SearchParams, Ticket};

/// Number of popular routes requested per airline
pub const AIRLINE_ROUTES_LIMIT: usize = 10;

const API_DATE_FORMAT: &str = "%Y-%m-%d";
const API_MONTH_FORMAT: &str = "%Y-%m";

async fn get_json(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<Value, ApiError> {
    debug!(url = %url, "Sending API request");
    let response = client.get(url).query(query).send().await?;

    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = status.as_u16(), "API returned non-success status");
        return Err(ApiError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Unwrap the `{success, data}` envelope of the fares API
fn success_data(value: Value) -> Result<Map<String, Value>, ApiError> {
    let Value::Object(mut envelope) = value else {
        return Err(ApiError::Malformed("response is not a JSON object".to_string()));
    };

    if !envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Err(ApiError::Unsuccessful);
    }

    match envelope.remove("data") {
        Some(Value::Object(data)) if !data.is_empty() => Ok(data),
        Some(Value::Object(_)) | Some(Value::Null) | None => Err(ApiError::Empty),
        Some(_) => Err(ApiError::Malformed("data is not a JSON object".to_string())),
    }
}

/// Decode every entry of a JSON object, skipping entries that do not fit `T`
fn decode_entries<T: DeserializeOwned>(data: Map<String, Value>) -> Vec<(String, T)> {
    data.into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<T>(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                debug!(key = %key, error = %e, "Skipping undecodable API entry");
                None
            }
        })
        .collect()
}

/// Client for the fares API
pub struct FaresApi {
    client: reqwest::Client,
    cheap_url: String,
    calendar_url: String,
    monthly_url: String,
    directions_url: String,
    token: String,
    currency: String,
}

impl FaresApi {
    pub fn new(config: &BotConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            cheap_url: config.endpoints.cheap.clone(),
            calendar_url: config.endpoints.calendar.clone(),
            monthly_url: config.endpoints.monthly.clone(),
            directions_url: config.endpoints.airline_directions.clone(),
            token: config.aviasales_token.clone(),
            currency: config.currency.clone(),
        })
    }

    fn auth(&self) -> [(&'static str, String); 2] {
        [
            ("token", self.token.clone()),
            ("currency", self.currency.clone()),
        ]
    }

    /// Cheapest tickets for a route, in response order
    ///
    /// A successful response whose buckets hold no tickets yields an empty list.
    pub async fn cheap_tickets(&self, params: &SearchParams) -> Result<Vec<Ticket>, ApiError> {
        let mut query = vec![
            ("origin", params.origin.clone()),
            ("destination", params.destination.clone()),
        ];
        if let Some(date) = params.depart_date {
            query.push(("depart_date", date.format(API_DATE_FORMAT).to_string()));
        }
        if let Some(date) = params.return_date {
            query.push(("return_date", date.format(API_DATE_FORMAT).to_string()));
        }
        query.extend(self.auth());

        let data = success_data(get_json(&self.client, &self.cheap_url, &query).await?)?;

        let tickets = data
            .into_iter()
            .filter_map(|(_, bucket)| match bucket {
                Value::Object(tickets) => Some(tickets),
                _ => None,
            })
            .flat_map(decode_entries::<Ticket>)
            .map(|(_, ticket)| ticket)
            .collect();
        Ok(tickets)
    }

    /// Daily price calendar starting at the month of `depart_month`
    pub async fn calendar(
        &self,
        origin: &str,
        destination: &str,
        depart_month: NaiveDate,
        return_month: Option<NaiveDate>,
    ) -> Result<Vec<(String, CalendarEntry)>, ApiError> {
        let mut query = vec![
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
            ("depart_date", depart_month.format(API_MONTH_FORMAT).to_string()),
        ];
        if let Some(month) = return_month {
            query.push(("return_date", month.format(API_MONTH_FORMAT).to_string()));
        }
        query.push(("calendar_type", "departure_date".to_string()));
        query.extend(self.auth());

        let data = success_data(get_json(&self.client, &self.calendar_url, &query).await?)?;
        Ok(decode_entries(data))
    }

    /// Minimum price per month for a route
    pub async fn monthly_prices(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<(String, MonthlyPrice)>, ApiError> {
        let mut query = vec![
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
        ];
        query.extend(self.auth());

        let data = success_data(get_json(&self.client, &self.monthly_url, &query).await?)?;
        Ok(decode_entries(data))
    }

    /// Most popular routes of an airline as `ORIGIN-DESTINATION` keys
    pub async fn airline_directions(&self, airline_code: &str) -> Result<Vec<String>, ApiError> {
        let query = vec![
            ("airline_code", airline_code.to_string()),
            ("limit", AIRLINE_ROUTES_LIMIT.to_string()),
            ("token", self.token.clone()),
        ];

        let data = success_data(get_json(&self.client, &self.directions_url, &query).await?)?;
        Ok(data.into_iter().map(|(route, _)| route).collect())
    }
}

/// Client for the flight-status API
pub struct FlightStatusApi {
    client: reqwest::Client,
    url: String,
    access_key: String,
}

impl FlightStatusApi {
    pub fn new(config: &BotConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.endpoints.flights.clone(),
            access_key: config.aviationstack_key.clone(),
        })
    }

    /// Latest record of a flight
    pub async fn flight_status(&self, flight_iata: &str) -> Result<FlightRecord, ApiError> {
        let query = vec![
            ("access_key", self.access_key.clone()),
            ("flight_iata", flight_iata.to_string()),
            ("limit", "1".to_string()),
        ];

        let value = get_json(&self.client, &self.url, &query).await?;

        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(ApiError::Upstream(message));
        }

        let records = match value.get("data") {
            Some(Value::Array(records)) => records,
            Some(Value::Null) | None => return Err(ApiError::Empty),
            Some(_) => return Err(ApiError::Malformed("data is not an array".to_string())),
        };

        match records.first() {
            Some(record) => Ok(serde_json::from_value(record.clone())?),
            None => Err(ApiError::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_data_envelope() {
        assert_eq!(
            success_data(json!({"success": false, "data": {}})),
            Err(ApiError::Unsuccessful)
        );
        assert_eq!(success_data(json!({"success": true, "data": {}})), Err(ApiError::Empty));
        assert_eq!(success_data(json!({"success": true})), Err(ApiError::Empty));
        assert!(matches!(
            success_data(json!([1, 2])),
            Err(ApiError::Malformed(_))
        ));
        let data = success_data(json!({"success": true, "data": {"AER": {}}})).unwrap();
        assert!(data.contains_key("AER"));
    }

    #[test]
    fn test_decode_entries_skips_bad_records() {
        let data = json!({
            "2025-08-01": {"price": 4000},
            "2025-08-02": {"no_price": true},
            "2025-08-03": {"price": 3500}
        });
        let Value::Object(map) = data else { unreachable!() };
        let entries: Vec<(String, MonthlyPrice)> = decode_entries(map);
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["2025-08-01", "2025-08-03"]);
    }
}
