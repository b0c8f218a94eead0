//! # Favorites Store
//!
//! Durable per-user watchlist. The whole store is one JSON document mapping
//! the user id (as a string) to the ordered list of that user's favorites:
//!
//! ```json
//! {
//!   "123456": [
//!     {"route_key": "MOW-AER", "origin": "MOW", "destination": "AER", ...},
//!     {"route_key": "SU1234-2025-08-01", "type": "flight", ...}
//!   ]
//! }
//! ```
//!
//! The document is rewritten after every successful mutation. Duplicate check,
//! mutation and write happen under one lock, so concurrent handlers can never
//! store two favorites with the same `route_key` for one user.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::models::Favorite;

type Document = BTreeMap<String, Vec<Favorite>>;

pub struct FavoritesStore {
    path: PathBuf,
    data: Mutex<Document>,
}

impl FavoritesStore {
    /// Open the store backed by `path`
    ///
    /// A missing file yields an empty store. So does an unreadable or corrupt
    /// one; the problem is logged and the file is overwritten by the next
    /// successful mutation.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match read_document(&path) {
            Ok(Some(document)) => {
                info!(
                    path = %path.display(),
                    users = document.len(),
                    "Favorites loaded"
                );
                document
            }
            Ok(None) => {
                info!(path = %path.display(), "No favorites file yet, starting empty");
                Document::new()
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read favorites, starting empty");
                Document::new()
            }
        };

        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a favorite unless the user already has one with the same key
    pub fn add(&self, user_id: i64, favorite: Favorite) -> bool {
        let mut data = self.lock();
        let list = data.entry(user_id.to_string()).or_default();

        if list.iter().any(|f| f.route_key() == favorite.route_key()) {
            debug!(user_id = %user_id, route_key = %favorite.route_key(), "Favorite already present");
            return false;
        }

        info!(user_id = %user_id, route_key = %favorite.route_key(), "Adding favorite");
        list.push(favorite);
        self.persist(&data);
        true
    }

    /// Remove the favorite with `route_key`; `false` when there is none
    pub fn remove(&self, user_id: i64, route_key: &str) -> bool {
        let mut data = self.lock();
        let user = user_id.to_string();

        let Some(list) = data.get_mut(&user) else {
            return false;
        };
        let Some(position) = list.iter().position(|f| f.route_key() == route_key) else {
            return false;
        };

        list.remove(position);
        if list.is_empty() {
            data.remove(&user);
        }
        info!(user_id = %user_id, route_key = %route_key, "Removed favorite");
        self.persist(&data);
        true
    }

    /// Favorites of a user in insertion order
    pub fn list(&self, user_id: i64) -> Vec<Favorite> {
        self.lock()
            .get(&user_id.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn find(&self, user_id: i64, route_key: &str) -> Option<Favorite> {
        self.lock()
            .get(&user_id.to_string())
            .and_then(|list| list.iter().find(|f| f.route_key() == route_key).cloned())
    }

    /// Snapshot of every user's favorites
    ///
    /// Entries whose key is not a numeric user id are skipped.
    pub fn all(&self) -> Vec<(i64, Vec<Favorite>)> {
        self.lock()
            .iter()
            .filter_map(|(user, list)| match user.parse::<i64>() {
                Ok(id) => Some((id, list.clone())),
                Err(_) => {
                    warn!(user = %user, "Skipping favorites with a non-numeric user id");
                    None
                }
            })
            .collect()
    }

    /// Blocking write, called with the document lock held so concurrent
    /// mutations reach the file one at a time. The document is a few
    /// kilobytes, so it runs directly on the calling worker.
    fn persist(&self, data: &Document) {
        if let Err(e) = write_document(&self.path, data) {
            error!(path = %self.path.display(), error = %e, "Failed to save favorites");
        }
    }
}

fn read_document(path: &Path) -> Result<Option<Document>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context("Failed to read favorites file"),
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let document = serde_json::from_str(&raw).context("Favorites file is not a valid document")?;
    Ok(Some(document))
}

/// Write through a temp file in the same directory, then rename over the target
fn write_document(path: &Path, data: &Document) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let json = serde_json::to_string_pretty(data).context("Failed to serialize favorites")?;
    let mut file = NamedTempFile::new_in(dir).context("Failed to create temp file")?;
    file.write_all(json.as_bytes())
        .context("Failed to write favorites")?;
    file.persist(path).context("Failed to replace favorites file")?;
    Ok(())
}
