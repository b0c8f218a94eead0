//! Integration tests for the favorites store: persistence, deduplication and
//! recovery from a damaged file.

use chrono::NaiveDate;
use flights::favorites::FavoritesStore;
use flights::models::{Favorite, FavoriteFlight, FavoriteRoute, FlightIdent, FlightRecord};
use std::fs;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> FavoritesStore {
    FavoritesStore::load(dir.path().join("favorites.json"))
}

fn route(origin: &str, destination: &str, depart: Option<NaiveDate>) -> Favorite {
    Favorite::Route(FavoriteRoute::new(origin, destination, depart, None))
}

#[test]
fn test_add_persists_and_reloads() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.add(100, route("MOW", "AER", NaiveDate::from_ymd_opt(2025, 8, 1))));
    assert!(store.add(100, route("LED", "KZN", None)));
    assert!(store.path().exists());

    let reloaded = store_in(&dir);
    let keys: Vec<String> = reloaded
        .list(100)
        .iter()
        .map(|f| f.route_key().to_string())
        .collect();
    assert_eq!(keys, vec!["MOW-AER-2025-08-01", "LED-KZN"]);
}

#[test]
fn test_duplicate_route_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.add(1, route("MOW", "AER", None)));
    assert!(!store.add(1, route("MOW", "AER", None)));
    assert_eq!(store.list(1).len(), 1);

    // Same route for another user is independent
    assert!(store.add(2, route("MOW", "AER", None)));
    assert_eq!(store.list(2).len(), 1);
}

#[test]
fn test_remove_existing_and_missing() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.add(5, route("MOW", "AER", None)));
    assert!(store.add(5, route("MOW", "LED", None)));

    assert!(store.remove(5, "MOW-AER"));
    assert!(!store.remove(5, "MOW-AER"));
    assert_eq!(store.list(5).len(), 1);

    let reloaded = store_in(&dir);
    assert!(reloaded.find(5, "MOW-AER").is_none());
    assert!(reloaded.find(5, "MOW-LED").is_some());
}

#[test]
fn test_remove_unknown_does_not_create_file() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(!store.remove(9, "MOW-AER"));
    assert!(!store.path().exists());
}

#[test]
fn test_corrupt_file_loads_empty_and_is_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("favorites.json");
    fs::write(&path, "{ not json").unwrap();

    let store = FavoritesStore::load(&path);
    assert!(store.all().is_empty());

    assert!(store.add(3, route("MOW", "AER", None)));
    let raw = fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(parsed.get("3").is_some());
}

#[test]
fn test_empty_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("favorites.json");
    fs::write(&path, "").unwrap();

    let store = FavoritesStore::load(&path);
    assert!(store.all().is_empty());
}

#[test]
fn test_document_uses_string_user_ids() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert!(store.add(123456, route("MOW", "AER", None)));

    let raw = fs::read_to_string(store.path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &parsed["123456"][0];
    assert_eq!(entry["route_key"], "MOW-AER");
    assert_eq!(entry["origin"], "MOW");
    assert!(entry.get("type").is_none());
}

#[test]
fn test_flight_favorites_survive_reload() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let record = FlightRecord {
        flight_date: Some("2025-08-01".to_string()),
        flight_status: Some("scheduled".to_string()),
        flight: Some(FlightIdent {
            number: Some("1234".to_string()),
            iata: Some("SU1234".to_string()),
        }),
        ..Default::default()
    };
    let flight = FavoriteFlight::from_record("SU1234", &record);
    assert!(store.add(8, Favorite::Flight(flight)));

    let reloaded = store_in(&dir);
    match reloaded.find(8, "SU1234-2025-08-01") {
        Some(Favorite::Flight(flight)) => {
            assert_eq!(flight.current_status.as_deref(), Some("scheduled"));
            assert_eq!(flight.flight_iata.as_deref(), Some("SU1234"));
        }
        other => panic!("Expected a flight favorite, got {other:?}"),
    }
}

#[test]
fn test_all_lists_every_user() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert!(store.add(1, route("MOW", "AER", None)));
    assert!(store.add(2, route("LED", "KZN", None)));
    assert!(store.add(2, route("LED", "AER", None)));

    let mut all = store.all();
    all.sort_by_key(|(user, _)| *user);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].1.len(), 1);
    assert_eq!(all[1].1.len(), 2);
}
