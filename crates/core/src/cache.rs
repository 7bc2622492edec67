//! Time-bounded suggestion cache, partitioned by owner and keyed by the
//! seed item id.
//!
//! Each owner's entries are persisted as a single JSON document through the
//! [`SuggestionCacheStore`] slot and loaded lazily on first use. Entries are
//! evicted on read once they are older than the configured validity window.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::domain::item::{ItemId, OwnerId};
use crate::domain::suggestion::{decode_suggestions, Suggestion};
use crate::stores::{RepositoryError, SuggestionCacheStore};

pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct CacheEntry {
    suggestions: Vec<Suggestion>,
    created_at: DateTime<Utc>,
}

type OwnerEntries = HashMap<ItemId, CacheEntry>;

pub struct SuggestionCache {
    store: Arc<dyn SuggestionCacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    owners: Mutex<HashMap<OwnerId, OwnerEntries>>,
}

impl SuggestionCache {
    pub fn new(store: Arc<dyn SuggestionCacheStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl, owners: Mutex::new(HashMap::new()) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, owner_id: &OwnerId, item_id: &ItemId) -> Option<Vec<Suggestion>> {
        let now = self.clock.now();
        let mut owners = self.owners.lock().await;
        let entries = self.entries_for(&mut owners, owner_id).await;

        let expired = match entries.get(item_id) {
            None => return None,
            Some(entry) => now > entry.created_at + self.ttl,
        };
        if !expired {
            return entries.get(item_id).map(|entry| entry.suggestions.clone());
        }

        entries.remove(item_id);
        tracing::debug!(
            event_name = "cache.entry_expired",
            owner_id = %owner_id,
            item_id = %item_id,
            "evicted stale suggestion entry"
        );
        let payload = encode(entries);
        drop(owners);
        self.persist(owner_id, payload).await;
        None
    }

    /// Last write wins. Store failures are logged, not returned.
    pub async fn put(&self, owner_id: &OwnerId, item_id: &ItemId, suggestions: Vec<Suggestion>) {
        let entry = CacheEntry { suggestions, created_at: self.clock.now() };
        let mut owners = self.owners.lock().await;
        let entries = self.entries_for(&mut owners, owner_id).await;
        entries.insert(item_id.clone(), entry);
        let payload = encode(entries);
        drop(owners);
        self.persist(owner_id, payload).await;
    }

    /// Drops every entry for the owner, in memory and in the store.
    pub async fn reset(&self, owner_id: &OwnerId) -> Result<(), RepositoryError> {
        let mut owners = self.owners.lock().await;
        owners.insert(owner_id.clone(), HashMap::new());
        self.store.clear(owner_id).await?;
        tracing::info!(event_name = "cache.reset", owner_id = %owner_id, "suggestion cache cleared");
        Ok(())
    }

    async fn entries_for<'a>(
        &self,
        owners: &'a mut HashMap<OwnerId, OwnerEntries>,
        owner_id: &OwnerId,
    ) -> &'a mut OwnerEntries {
        if !owners.contains_key(owner_id) {
            let loaded = self.load(owner_id).await;
            owners.insert(owner_id.clone(), loaded);
        }
        owners.entry(owner_id.clone()).or_default()
    }

    async fn load(&self, owner_id: &OwnerId) -> OwnerEntries {
        match self.store.load(owner_id).await {
            Ok(Some(payload)) => decode(owner_id, &payload),
            Ok(None) => HashMap::new(),
            Err(error) => {
                tracing::warn!(
                    event_name = "cache.load_failed",
                    owner_id = %owner_id,
                    error = %error,
                    "suggestion cache unreadable, starting empty"
                );
                HashMap::new()
            }
        }
    }

    async fn persist(&self, owner_id: &OwnerId, payload: Option<String>) {
        let Some(payload) = payload else {
            return;
        };
        if let Err(error) = self.store.save(owner_id, &payload).await {
            tracing::warn!(
                event_name = "cache.save_failed",
                owner_id = %owner_id,
                error = %error,
                "suggestion cache write failed"
            );
        }
    }
}

fn encode(entries: &OwnerEntries) -> Option<String> {
    let ordered = entries.iter().map(|(id, entry)| (id.0.as_str(), entry)).collect::<BTreeMap<_, _>>();
    match serde_json::to_string(&ordered) {
        Ok(payload) => Some(payload),
        Err(error) => {
            tracing::warn!(
                event_name = "cache.encode_failed",
                error = %error,
                "suggestion cache could not be serialized"
            );
            None
        }
    }
}

fn decode(owner_id: &OwnerId, payload: &str) -> OwnerEntries {
    let document = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(document)) => document,
        Ok(_) | Err(_) => {
            tracing::warn!(
                event_name = "cache.payload_corrupt",
                owner_id = %owner_id,
                "stored suggestion cache is not a JSON object, starting empty"
            );
            return HashMap::new();
        }
    };

    document
        .into_iter()
        .filter_map(|(item_id, raw)| match decode_entry(&raw) {
            Some(entry) => Some((ItemId(item_id), entry)),
            None => {
                tracing::warn!(
                    event_name = "cache.entry_skipped",
                    owner_id = %owner_id,
                    item_id = %item_id,
                    "skipping malformed suggestion cache entry"
                );
                None
            }
        })
        .collect()
}

fn decode_entry(raw: &Value) -> Option<CacheEntry> {
    let created_at = raw
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())?
        .with_timezone(&Utc);
    let records = raw.get("suggestions").and_then(Value::as_array)?;
    let suggestions = decode_suggestions(records);
    if suggestions.is_empty() {
        return None;
    }
    Some(CacheEntry { suggestions, created_at })
}
