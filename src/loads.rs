use crate::models::Dashboard;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

// Dashboards nobody asked for in this long stop being auto-refreshed.
pub const IDLE_CUTOFF_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DashboardKey {
    pub username: String,
    pub days: u32,
}

impl DashboardKey {
    pub fn new(username: &str, days: u32) -> Self {
        Self {
            username: username.to_lowercase(),
            days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading {
        sequence: u64,
    },
    Success {
        sequence: u64,
        #[serde(rename = "completedAt")]
        completed_at: DateTime<Utc>,
    },
    Error {
        sequence: u64,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub key: DashboardKey,
    pub sequence: u64,
}

#[derive(Debug)]
struct Slot {
    latest: u64,
    state: LoadState,
    result: Option<Arc<Dashboard>>,
    requested_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct LoadTracker {
    next: AtomicU64,
    slots: Mutex<HashMap<DashboardKey, Slot>>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_sequence(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn begin(&self, key: DashboardKey, now: DateTime<Utc>) -> LoadTicket {
        self.start(key, now, true)
    }

    pub fn begin_refresh(&self, key: DashboardKey, now: DateTime<Utc>) -> LoadTicket {
        self.start(key, now, false)
    }

    fn start(&self, key: DashboardKey, now: DateTime<Utc>, requested: bool) -> LoadTicket {
        let sequence = self.next_sequence();
        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            latest: 0,
            state: LoadState::Idle,
            result: None,
            requested_at: now,
        });
        if requested {
            slot.requested_at = now;
        }
        slot.latest = sequence;
        slot.state = LoadState::Loading { sequence };
        LoadTicket { key, sequence }
    }

    // Records a finished load. Returns `false` when a newer load superseded it.
    pub fn complete(
        &self,
        ticket: &LoadTicket,
        outcome: Result<Arc<Dashboard>, String>,
        now: DateTime<Utc>,
    ) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(&ticket.key) else {
            return false;
        };
        if slot.latest != ticket.sequence {
            return false;
        }

        let sequence = ticket.sequence;
        match outcome {
            Ok(dashboard) => {
                slot.state = LoadState::Success {
                    sequence,
                    completed_at: now,
                };
                slot.result = Some(dashboard);
            }
            Err(message) => {
                slot.state = LoadState::Error { sequence, message };
            }
        }
        true
    }

    pub fn state(&self, key: &DashboardKey) -> LoadState {
        self.lock()
            .get(key)
            .map(|slot| slot.state.clone())
            .unwrap_or(LoadState::Idle)
    }

    pub fn latest(&self, key: &DashboardKey) -> Option<Arc<Dashboard>> {
        self.lock().get(key).and_then(|slot| slot.result.clone())
    }

    pub fn refreshable_keys(&self) -> Vec<DashboardKey> {
        let mut keys: Vec<DashboardKey> = self
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot.state, LoadState::Success { .. }))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // Forgets dashboards that never loaded or went unrequested past the cutoff.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let cutoff = Duration::hours(IDLE_CUTOFF_HOURS);
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|_, slot| {
            matches!(slot.state, LoadState::Loading { .. })
                || (slot.result.is_some() && now - slot.requested_at < cutoff)
        });
        before - slots.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DashboardKey, Slot>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
