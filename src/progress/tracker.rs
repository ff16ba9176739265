// ABOUTME: Process-wide map from tenant to its latest progress snapshot.
// ABOUTME: Cheap to clone; a background task sweeps records past retention.

use super::{ProgressRecord, Stage};
use crate::types::TenantId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Shared progress store handed to every pipeline component.
///
/// Each write swaps in a fresh `Arc<ProgressRecord>` under the lock, so
/// readers always see a complete snapshot. Once a record reaches
/// `completed` or `error` further stage updates are ignored until the
/// tenant is restarted with [`ProgressTracker::begin`].
#[derive(Clone)]
pub struct ProgressTracker {
    records: Arc<RwLock<HashMap<TenantId, Arc<ProgressRecord>>>>,
    retention: chrono::Duration,
}

impl ProgressTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            retention: chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::days(36_500)),
        }
    }

    /// Start a fresh deployment record, replacing whatever was there.
    pub fn begin(&self, id: TenantId, message: impl Into<String>) -> Arc<ProgressRecord> {
        let record = Arc::new(ProgressRecord::new(
            id,
            Stage::Queued,
            message.into(),
            0,
            Utc::now(),
        ));
        self.records.write().insert(id, Arc::clone(&record));
        record
    }

    /// Upsert a stage update. Returns the snapshot now stored.
    pub fn update(
        &self,
        id: TenantId,
        stage: Stage,
        message: impl Into<String>,
        percent: u8,
    ) -> Arc<ProgressRecord> {
        let now = Utc::now();
        let message = message.into();
        let mut records = self.records.write();

        let next = match records.get(&id) {
            Some(current) if current.is_terminal() => return Arc::clone(current),
            Some(current) => current.advanced(stage, message, percent, now),
            None => ProgressRecord::new(id, stage, message, percent, now),
        };

        let next = Arc::new(next);
        records.insert(id, Arc::clone(&next));
        next
    }

    /// Mark the run completed at 100 percent with its result payload.
    pub fn complete(
        &self,
        id: TenantId,
        message: impl Into<String>,
        result: serde_json::Value,
    ) -> Arc<ProgressRecord> {
        self.finish(id, |current, now| {
            current.completed(message.into(), result, now)
        })
    }

    /// Mark the run failed, freezing its percent.
    pub fn fail(
        &self,
        id: TenantId,
        message: impl Into<String>,
        error: serde_json::Value,
    ) -> Arc<ProgressRecord> {
        self.finish(id, |current, now| current.failed(message.into(), error, now))
    }

    /// Fail a run that stopped without recording an outcome.
    ///
    /// Only touches a record that exists and is still processing. Returns
    /// whether it did.
    pub fn abandon(&self, id: TenantId, message: impl Into<String>) -> bool {
        let mut records = self.records.write();
        let Some(current) = records.get(&id).filter(|r| !r.is_terminal()) else {
            return false;
        };

        let message = message.into();
        let error = serde_json::json!({ "error": message, "kind": "interrupted" });
        let next = Arc::new(current.failed(message, error, Utc::now()));
        records.insert(id, next);
        true
    }

    fn finish<F>(&self, id: TenantId, transition: F) -> Arc<ProgressRecord>
    where
        F: FnOnce(&ProgressRecord, DateTime<Utc>) -> ProgressRecord,
    {
        let now = Utc::now();
        let mut records = self.records.write();

        let next = match records.get(&id) {
            Some(current) if current.is_terminal() => return Arc::clone(current),
            Some(current) => transition(current, now),
            None => {
                let seed = ProgressRecord::new(id, Stage::Queued, String::new(), 0, now);
                transition(&seed, now)
            }
        };

        let next = Arc::new(next);
        records.insert(id, Arc::clone(&next));
        next
    }

    /// Latest snapshot, unless it is older than the retention window.
    pub fn get(&self, id: TenantId) -> Option<Arc<ProgressRecord>> {
        self.get_at(id, Utc::now())
    }

    pub fn get_at(&self, id: TenantId, now: DateTime<Utc>) -> Option<Arc<ProgressRecord>> {
        self.records
            .read()
            .get(&id)
            .filter(|r| !self.expired(r, now))
            .cloned()
    }

    /// Drop every record past retention. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, r| !self.expired(r, now));
        before - records.len()
    }

    /// Number of records currently held, expired or not.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Run [`sweep`](Self::sweep) every `interval` until the task is aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = tracker.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "swept expired progress records");
                }
            }
        })
    }

    fn expired(&self, record: &ProgressRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.created_at) > self.retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Status;
    use serde_json::json;

    fn id(n: u32) -> TenantId {
        TenantId::from_ordinal(n).unwrap()
    }

    #[test]
    fn update_creates_processing_record() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        tracker.update(id(1), Stage::AllocatingPort, "allocating", 5);

        let record = tracker.get(id(1)).unwrap();
        assert_eq!(record.status, Status::Processing);
        assert_eq!(record.stage, Stage::AllocatingPort);
        assert_eq!(record.percent, 5);
    }

    #[test]
    fn unknown_tenant_is_none() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        assert!(tracker.get(id(3)).is_none());
    }

    #[test]
    fn terminal_status_is_sticky() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        tracker.update(id(1), Stage::Launching, "launching", 10);
        tracker.complete(id(1), "done", json!({"url": "x"}));

        tracker.update(id(1), Stage::WaitingForDatabase, "late update", 30);
        tracker.fail(id(1), "late failure", json!({}));

        let record = tracker.get(id(1)).unwrap();
        assert_eq!(record.status, Status::Completed);
        assert_eq!(record.stage, Stage::Completed);
        assert_eq!(record.percent, 100);
        assert_eq!(record.message, "done");
    }

    #[test]
    fn failure_keeps_percent_below_completion() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        tracker.update(id(1), Stage::WaitingForDatabase, "db", 35);
        tracker.fail(id(1), "db timed out", json!({"kind": "dependency_timed_out"}));

        let record = tracker.get(id(1)).unwrap();
        assert_eq!(record.status, Status::Error);
        assert_eq!(record.percent, 35);
        assert!(record.error.is_some());
    }

    #[test]
    fn abandon_fails_only_processing_records() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        tracker.update(id(1), Stage::WaitingForDatabase, "db", 30);
        tracker.complete(id(2), "done", json!({}));

        assert!(tracker.abandon(id(1), "interrupted"));
        assert!(!tracker.abandon(id(2), "interrupted"));
        assert!(!tracker.abandon(id(3), "interrupted"));

        let record = tracker.get(id(1)).unwrap();
        assert_eq!(record.status, Status::Error);
        assert_eq!(record.percent, 30);
        assert_eq!(record.error.as_ref().unwrap()["kind"], "interrupted");
        assert_eq!(tracker.get(id(2)).unwrap().status, Status::Completed);
        assert!(tracker.get(id(3)).is_none());
    }

    #[test]
    fn begin_restarts_a_finished_record() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        tracker.complete(id(1), "done", json!({}));
        tracker.begin(id(1), "redeploying");

        let record = tracker.get(id(1)).unwrap();
        assert_eq!(record.status, Status::Processing);
        assert_eq!(record.percent, 0);
    }

    #[test]
    fn expired_records_are_hidden_and_swept() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        tracker.update(id(1), Stage::Launching, "launching", 10);
        tracker.complete(id(2), "done", json!({}));

        let later = Utc::now() + chrono::Duration::seconds(61);
        assert!(tracker.get_at(id(1), later).is_none());
        assert!(tracker.get_at(id(2), later).is_none());
        assert_eq!(tracker.len(), 2);

        assert_eq!(tracker.sweep_at(later), 2);
        assert!(tracker.is_empty());
    }

    #[test]
    fn sweep_keeps_fresh_records() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        tracker.update(id(1), Stage::Launching, "launching", 10);
        assert_eq!(tracker.sweep(), 0);
        assert!(tracker.get(id(1)).is_some());
    }

    #[tokio::test]
    async fn sweeper_task_removes_expired_records() {
        let tracker = ProgressTracker::new(Duration::from_millis(10));
        tracker.update(id(1), Stage::Launching, "launching", 10);

        let handle = tracker.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        assert!(tracker.is_empty());
    }

    #[test]
    fn clones_share_state() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        let other = tracker.clone();
        other.update(id(4), Stage::Finalizing, "finalizing", 85);
        assert_eq!(tracker.get(id(4)).unwrap().percent, 85);
    }
}
