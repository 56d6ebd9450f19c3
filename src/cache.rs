use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

pub const CACHE_PREFIX: &str = "gh_";
pub const DEFAULT_TTL_MINUTES: i64 = 15;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    data: T,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    sequence: u64,
}

#[derive(Deserialize)]
struct Stamp {
    timestamp: DateTime<Utc>,
    #[serde(default)]
    sequence: u64,
}

#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, String>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_TTL_MINUTES))
    }
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let storage_key = namespaced(key);
        let mut entries = self.lock();
        let raw = entries.get(&storage_key)?;

        let envelope: Envelope<T> = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("dropping unreadable cache entry {storage_key}: {err}");
                entries.remove(&storage_key);
                return None;
            }
        };

        if now - envelope.timestamp >= self.ttl {
            entries.remove(&storage_key);
            return None;
        }

        Some(envelope.data)
    }

    // A live entry written by a later fetch is kept, and the write is refused.
    // Expired and unreadable entries are swept on every write.
    pub fn put<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        sequence: u64,
        now: DateTime<Utc>,
    ) -> bool {
        let storage_key = namespaced(key);
        let envelope = Envelope {
            data,
            timestamp: now,
            sequence,
        };
        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("not caching {key}: {err}");
                return false;
            }
        };

        let mut entries = self.lock();
        entries.retain(|_, entry| self.is_live(entry, now));
        let newer = entries
            .get(&storage_key)
            .and_then(|raw| serde_json::from_str::<Stamp>(raw).ok())
            .is_some_and(|stamp| stamp.sequence > sequence);
        if newer {
            return false;
        }
        entries.insert(storage_key, raw);
        true
    }

    #[cfg(test)]
    fn put_raw(&self, key: &str, raw: impl Into<String>) {
        self.lock().insert(namespaced(key), raw.into());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    fn is_live(&self, raw: &str, now: DateTime<Utc>) -> bool {
        serde_json::from_str::<Stamp>(raw).is_ok_and(|stamp| now - stamp.timestamp < self.ttl)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn chart_key(username: &str, days: u32) -> String {
    format!("chart_{}_{days}d", username.to_lowercase())
}

pub fn inactivity_key(username: &str) -> String {
    format!("inactive_{}", username.to_lowercase())
}

fn namespaced(key: &str) -> String {
    format!("{CACHE_PREFIX}{key}")
}
