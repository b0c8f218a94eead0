//! # Error Types Module
//!
//! Structured errors for the two failure families the handlers report to
//! users: problems talking to the external APIs and invalid user input.
//! Every variant maps to a localization key so the caller can pick the
//! canned message without inspecting error text.

use thiserror::Error;

/// Errors returned by the external HTTP JSON APIs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,
    /// Connection or transport failure
    #[error("network error: {0}")]
    Network(String),
    /// Non-success HTTP status code
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// Body could not be decoded as the expected JSON document
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The API answered with `success: false`
    #[error("API reported an unsuccessful response")]
    Unsuccessful,
    /// The API answered successfully but without usable data
    #[error("API returned no data")]
    Empty,
    /// The API returned an explicit error object
    #[error("API error: {0}")]
    Upstream(String),
}

impl ApiError {
    /// Localization key of the message shown to the user
    ///
    /// `Unsuccessful` and `Empty` are handler specific ("no tickets",
    /// "flight not found", ...) so the handler passes its own key.
    pub fn message_key<'a>(&self, not_found_key: &'a str) -> &'a str {
        match self {
            ApiError::Timeout => "error-timeout",
            ApiError::Network(_) => "error-network",
            ApiError::Status(_) => "error-server-status",
            ApiError::Malformed(_) => "error-malformed-response",
            ApiError::Upstream(_) => "error-upstream",
            ApiError::Unsuccessful | ApiError::Empty => not_found_key,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}

/// Validation errors for free-text user input
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("origin and destination are required")]
    MissingCities,
    #[error("city not found")]
    CityNotFound,
    #[error("departure date is not in DD.MM.YYYY format")]
    InvalidDepartDate,
    #[error("departure date is in the past")]
    DepartDateInPast,
    #[error("return date is not in DD.MM.YYYY format")]
    InvalidReturnDate,
    #[error("return date is before departure date")]
    ReturnBeforeDepart,
    #[error("flight number is empty")]
    EmptyFlightNumber,
    #[error("flight number has an unexpected format")]
    InvalidFlightNumber,
}

impl InputError {
    /// Localization key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            InputError::MissingCities => "error-missing-cities",
            InputError::CityNotFound => "error-city-not-found",
            InputError::InvalidDepartDate => "error-invalid-depart-date",
            InputError::DepartDateInPast => "error-depart-in-past",
            InputError::InvalidReturnDate => "error-invalid-return-date",
            InputError::ReturnBeforeDepart => "error-return-before-depart",
            InputError::EmptyFlightNumber => "error-empty-flight-number",
            InputError::InvalidFlightNumber => "error-invalid-flight-number",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        assert_eq!(ApiError::Status(502).to_string(), "unexpected HTTP status 502");
        assert_eq!(
            ApiError::Upstream("invalid_access_key".to_string()).to_string(),
            "API error: invalid_access_key"
        );
    }

    #[test]
    fn test_not_found_key_is_used_for_empty_results() {
        assert_eq!(ApiError::Empty.message_key("tickets-not-found"), "tickets-not-found");
        assert_eq!(ApiError::Unsuccessful.message_key("x"), "x");
        assert_eq!(ApiError::Timeout.message_key("x"), "error-timeout");
    }
}
