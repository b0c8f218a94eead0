//! # Reference Data Cache Module
//!
//! Lazily loaded code-to-name books for cities, airlines and aircraft types.
//! The handlers use them to turn IATA codes into readable labels and to
//! resolve typed city names into codes.
//!
//! # Lifecycle
//!
//! - A book is downloaded on first use (or by [`ReferenceCache::preload`])
//! - A failed or empty download leaves the book empty; the next lookup tries again
//! - A loaded book is kept for the life of the process and never refreshed

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::ApiEndpoints;
use crate::errors::ApiError;

/// Category of reference data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    City,
    Airline,
    Aircraft,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::City => "cities",
            ReferenceKind::Airline => "airlines",
            ReferenceKind::Aircraft => "aircraft",
        };
        f.write_str(name)
    }
}

/// Raw record of a reference list
#[derive(Debug, Deserialize)]
struct ReferenceRecord {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Insertion-ordered mapping from code to display name
#[derive(Debug, Default, Clone)]
pub struct CodeBook {
    entries: Vec<(String, String)>,
    by_code: HashMap<String, usize>,
}

impl CodeBook {
    /// Build a book from `(code, name)` pairs, keeping the first name of a duplicated code
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut book = CodeBook::default();
        for (code, name) in entries {
            let code = code.trim().to_uppercase();
            if code.is_empty() || book.by_code.contains_key(&code) {
                continue;
            }
            book.by_code.insert(code.clone(), book.entries.len());
            book.entries.push((code, name));
        }
        book
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name of a code (case-insensitive)
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.by_code
            .get(&code.trim().to_uppercase())
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// Resolve a typed name to a code
    ///
    /// An exact case-insensitive match wins; otherwise the first entry whose
    /// name contains the query, in insertion order.
    pub fn resolve_name(&self, query: &str) -> Option<&str> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let lowered: Vec<String> = self
            .entries
            .iter()
            .map(|(_, name)| name.to_lowercase())
            .collect();

        lowered
            .iter()
            .position(|name| *name == query)
            .or_else(|| lowered.iter().position(|name| name.contains(&query)))
            .map(|idx| self.entries[idx].0.as_str())
    }
}

/// Process-wide cache of the three reference books
pub struct ReferenceCache {
    client: reqwest::Client,
    endpoints: ApiEndpoints,
    cities: Mutex<Arc<CodeBook>>,
    airlines: Mutex<Arc<CodeBook>>,
    aircraft: Mutex<Arc<CodeBook>>,
}

impl ReferenceCache {
    /// Create an empty cache; books are downloaded on demand
    pub fn new(endpoints: ApiEndpoints, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoints,
            cities: Mutex::new(Arc::new(CodeBook::default())),
            airlines: Mutex::new(Arc::new(CodeBook::default())),
            aircraft: Mutex::new(Arc::new(CodeBook::default())),
        })
    }

    fn slot(&self, kind: ReferenceKind) -> &Mutex<Arc<CodeBook>> {
        match kind {
            ReferenceKind::City => &self.cities,
            ReferenceKind::Airline => &self.airlines,
            ReferenceKind::Aircraft => &self.aircraft,
        }
    }

    fn url(&self, kind: ReferenceKind) -> &str {
        match kind {
            ReferenceKind::City => &self.endpoints.cities,
            ReferenceKind::Airline => &self.endpoints.airlines,
            ReferenceKind::Aircraft => &self.endpoints.aircraft,
        }
    }

    /// Get a book, downloading it if it is still empty
    ///
    /// The slot lock is held during the download so concurrent lookups of the
    /// same kind wait for one request instead of issuing their own.
    pub async fn book(&self, kind: ReferenceKind) -> Arc<CodeBook> {
        let mut slot = self.slot(kind).lock().await;
        if !slot.is_empty() {
            return Arc::clone(&*slot);
        }

        match self.fetch(kind).await {
            Ok(book) if !book.is_empty() => {
                info!(kind = %kind, entries = book.len(), "Reference data loaded");
                *slot = Arc::new(book);
            }
            Ok(_) => {
                error!(kind = %kind, "Reference data download returned no entries");
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to load reference data");
            }
        }
        Arc::clone(&*slot)
    }

    async fn fetch(&self, kind: ReferenceKind) -> Result<CodeBook, ApiError> {
        let url = self.url(kind);
        debug!(kind = %kind, url = %url, "Downloading reference data");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        let records: Vec<ReferenceRecord> = serde_json::from_str(&body)?;

        Ok(CodeBook::from_entries(records.into_iter().filter_map(
            |record| match (record.code, record.name) {
                (Some(code), Some(name)) if !name.trim().is_empty() => Some((code, name)),
                _ => None,
            },
        )))
    }

    /// Warm up every book
    pub async fn preload(&self) {
        for kind in [
            ReferenceKind::City,
            ReferenceKind::Airline,
            ReferenceKind::Aircraft,
        ] {
            self.book(kind).await;
        }
    }

    /// Resolve a typed city name to its IATA code
    pub async fn resolve_city_code(&self, name: &str) -> Option<String> {
        self.book(ReferenceKind::City)
            .await
            .resolve_name(name)
            .map(str::to_string)
    }

    async fn name_or_code(&self, kind: ReferenceKind, code: &str) -> String {
        self.book(kind)
            .await
            .name_of(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }

    pub async fn city_name(&self, code: &str) -> String {
        self.name_or_code(ReferenceKind::City, code).await
    }

    pub async fn airline_name(&self, code: &str) -> String {
        self.name_or_code(ReferenceKind::Airline, code).await
    }

    pub async fn aircraft_name(&self, code: &str) -> String {
        self.name_or_code(ReferenceKind::Aircraft, code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities() -> CodeBook {
        CodeBook::from_entries(vec![
            ("LED".to_string(), "Санкт-Петербург".to_string()),
            ("MOW".to_string(), "Москва".to_string()),
            ("AER".to_string(), "Сочи".to_string()),
            ("XMO".to_string(), "Мос".to_string()),
        ])
    }

    #[test]
    fn test_exact_match_beats_substring() {
        let book = cities();
        // "мос" is a substring of "Москва" (earlier) but an exact match of "Мос"
        assert_eq!(book.resolve_name("Мос"), Some("XMO"));
        assert_eq!(book.resolve_name("москва"), Some("MOW"));
    }

    #[test]
    fn test_substring_match_is_first_in_order() {
        let book = cities();
        assert_eq!(book.resolve_name("петер"), Some("LED"));
        assert_eq!(book.resolve_name("моск"), Some("MOW"));
        assert_eq!(book.resolve_name("Берлин"), None);
        assert_eq!(book.resolve_name(""), None);
    }

    #[test]
    fn test_name_lookup_is_case_insensitive() {
        let book = cities();
        assert_eq!(book.name_of("aer"), Some("Сочи"));
        assert_eq!(book.name_of("ZZZ"), None);
    }

    #[test]
    fn test_duplicate_codes_keep_first() {
        let book = CodeBook::from_entries(vec![
            ("SU".to_string(), "Аэрофлот".to_string()),
            ("su".to_string(), "Duplicate".to_string()),
        ]);
        assert_eq!(book.len(), 1);
        assert_eq!(book.name_of("SU"), Some("Аэрофлот"));
    }
}
