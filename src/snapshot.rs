//! The cycle snapshot: one immutable value per completed cycle, published
//! with a single atomic swap so readers never observe a half-built cycle.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Alert, BasinResult, RadarPixel, Station};

/// Outcome of one basin's pipeline within a cycle. Validation failures are
/// carried as records, not dropped: consumers see which basins degraded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BasinOutcome {
    Computed(BasinResult),
    Failed { basin_id: String, error: String },
}

impl BasinOutcome {
    pub fn basin_id(&self) -> &str {
        match self {
            BasinOutcome::Computed(result) => &result.basin_id,
            BasinOutcome::Failed { basin_id, .. } => basin_id,
        }
    }

    pub fn result(&self) -> Option<&BasinResult> {
        match self {
            BasinOutcome::Computed(result) => Some(result),
            BasinOutcome::Failed { .. } => None,
        }
    }
}

/// Everything one cycle produced. Built locally by the coordinator and
/// never mutated after publication.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Latest observation per station id.
    pub stations: HashMap<String, Station>,
    pub outcomes: Vec<BasinOutcome>,
    pub radar: Option<Vec<RadarPixel>>,
    /// Active alerts, most severe first.
    pub alerts: Vec<Alert>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn outcome_for(&self, basin_id: &str) -> Option<&BasinOutcome> {
        self.outcomes.iter().find(|o| o.basin_id() == basin_id)
    }
}

/// Shared handle to the latest snapshot.
///
/// Readers clone an `Arc` under a brief read lock; the coordinator swaps
/// in the next cycle's snapshot under a brief write lock. Cycle i's value
/// is unreachable through the store once cycle i+1 publishes.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore {
            current: Arc::new(RwLock::new(Arc::new(Snapshot::default()))),
        }
    }

    /// The latest published snapshot.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .expect("snapshot lock poisoned")
            .clone()
    }

    /// Publishes `next` as the current snapshot. The single mutation point
    /// in the whole service.
    pub fn publish(&self, next: Snapshot) {
        let mut guard = self.current.write().expect("snapshot lock poisoned");
        *guard = Arc::new(next);
    }
}
