//! Per-user memory of the most recent search, read by "add to favorites".

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{FavoriteFlight, SearchParams};

/// Result of the last search a user ran
#[derive(Debug, Clone, PartialEq)]
pub enum LastSearch {
    Route(SearchParams),
    Flight(FavoriteFlight),
}

/// In-memory store of last searches; lost on restart
#[derive(Debug, Default)]
pub struct SessionStore {
    searches: Mutex<HashMap<i64, LastSearch>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, LastSearch>> {
        self.searches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn remember(&self, user_id: i64, search: LastSearch) {
        self.lock().insert(user_id, search);
    }

    pub fn last(&self, user_id: i64) -> Option<LastSearch> {
        self.lock().get(&user_id).cloned()
    }

    /// Last route search, ignoring a flight lookup
    pub fn last_route(&self, user_id: i64) -> Option<SearchParams> {
        match self.last(user_id) {
            Some(LastSearch::Route(params)) => Some(params),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_search_overwrites_previous() {
        let sessions = SessionStore::new();
        sessions.remember(1, LastSearch::Route(SearchParams::new("MOW", "AER")));
        sessions.remember(1, LastSearch::Route(SearchParams::new("LED", "KZN")));

        assert_eq!(sessions.last_route(1).unwrap().origin, "LED");
        assert!(sessions.last(2).is_none());
    }
}
