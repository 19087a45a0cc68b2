use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::config::SafetyConfig;
use crate::evaluator::ContentEvaluator;

pub type BatchId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BatchStatus {
    Pending,
    Running,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchState {
    pub id: BatchId,
    pub started_at_ms: u128,
    pub total_items: usize,
    pub total_windows: usize,
    pub windows_completed: usize,
    pub progress: f32,
    pub status: BatchStatus,
}

#[derive(Debug)]
struct BatchHandle {
    token: CancellationToken,
    started_at: Instant,
}

/// In-flight batches of one evaluator, cancellable by id.
#[derive(Clone, Default)]
pub struct BatchRegistry {
    inner: Arc<DashMap<BatchId, (BatchState, Arc<BatchHandle>)>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a new batch; cancelling it by id cancels `token`.
    pub fn register(&self, total_items: usize, total_windows: usize, token: CancellationToken) -> BatchId {
        let id = uuid::Uuid::new_v4().to_string();
        let state = BatchState {
            id: id.clone(),
            started_at_ms: now_ms(),
            total_items,
            total_windows,
            windows_completed: 0,
            progress: 0.0,
            status: BatchStatus::Pending,
        };
        let handle = Arc::new(BatchHandle { token, started_at: Instant::now() });
        self.inner.insert(id.clone(), (state, handle));
        id
    }

    pub fn update(&self, id: &str, mut f: impl FnMut(&mut BatchState)) {
        if let Some(mut entry) = self.inner.get_mut(id) {
            f(&mut entry.0);
        }
    }

    pub fn window_started(&self, id: &str) {
        self.update(id, |s| s.status = BatchStatus::Running);
    }

    pub fn window_finished(&self, id: &str) {
        self.update(id, |s| {
            s.status = BatchStatus::Running;
            s.windows_completed += 1;
            s.progress = if s.total_windows == 0 {
                100.0
            } else {
                s.windows_completed as f32 * 100.0 / s.total_windows as f32
            };
        });
    }

    pub fn get(&self, id: &str) -> Option<BatchState> {
        self.inner.get(id).map(|e| e.0.clone())
    }

    pub fn active(&self) -> Vec<BatchState> {
        self.inner.iter().map(|e| e.value().0.clone()).collect()
    }

    pub fn elapsed_ms(&self, id: &str) -> Option<u64> {
        self.inner
            .get(id)
            .map(|e| e.1.started_at.elapsed().as_millis() as u64)
    }

    pub fn cancel(&self, id: &str) -> bool {
        if let Some(entry) = self.inner.get(id) {
            entry.1.token.cancel();
            true
        } else {
            false
        }
    }

    /// Records the final status and drops the entry.
    pub fn finish(&self, id: &str, status: BatchStatus) -> Option<BatchState> {
        self.update(id, |s| {
            if status == BatchStatus::Completed {
                s.progress = 100.0;
            }
            s.status = status.clone();
        });
        self.inner.remove(id).map(|(_, (state, _))| state)
    }
}

/// Keeps a batch registered while it runs; dropping it unfinished records the
/// batch as canceled and removes the entry.
pub(crate) struct BatchGuard {
    registry: BatchRegistry,
    id: BatchId,
    finished: bool,
}

impl BatchGuard {
    pub(crate) fn new(registry: BatchRegistry, id: BatchId) -> Self {
        BatchGuard {
            registry,
            id,
            finished: false,
        }
    }

    pub(crate) fn finish(mut self, status: BatchStatus) {
        self.finished = true;
        self.registry.finish(&self.id, status);
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        if !self.finished {
            log::debug!("Batch {} dropped before completion", self.id);
            self.registry.finish(&self.id, BatchStatus::Canceled);
        }
    }
}

fn now_ms() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Independently configured evaluators keyed by tenant (brand) id.
#[derive(Clone, Default)]
pub struct EvaluatorRegistry {
    inner: Arc<DashMap<String, Arc<ContentEvaluator>>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant: impl Into<String>, evaluator: ContentEvaluator) -> Arc<ContentEvaluator> {
        let evaluator = Arc::new(evaluator);
        self.inner.insert(tenant.into(), Arc::clone(&evaluator));
        evaluator
    }

    pub fn get(&self, tenant: &str) -> Option<Arc<ContentEvaluator>> {
        self.inner.get(tenant).map(|e| Arc::clone(e.value()))
    }

    /// Returns the tenant's evaluator, creating one from `config` if absent.
    pub fn get_or_create(&self, tenant: &str, config: impl FnOnce() -> SafetyConfig) -> Arc<ContentEvaluator> {
        let entry = self
            .inner
            .entry(tenant.to_string())
            .or_insert_with(|| Arc::new(ContentEvaluator::new(config())));
        Arc::clone(entry.value())
    }

    pub fn remove(&self, tenant: &str) -> Option<Arc<ContentEvaluator>> {
        self.inner.remove(tenant).map(|(_, evaluator)| evaluator)
    }

    pub fn tenants(&self) -> Vec<String> {
        let mut tenants: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        tenants.sort();
        tenants
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
