use std::any::Any;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use super::content::preview;
use super::engine::{EvaluationSnapshot, IncludeFlags};
use super::telemetry::{BatchStatsCollector, BatchSummary};
use super::types::{EvaluationOutcome, ScoreWeights};
use super::ContentEvaluator;
use crate::error::EvaluationError;
use crate::ops::{BatchGuard, BatchId, BatchStatus};

pub const MAX_BATCH_ITEMS: usize = 100;
pub const ERROR_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    #[default]
    Safety,
    Compliance,
    Combined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub context: Option<String>,
    /// Opaque caller data, echoed back on success.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        BatchItem {
            id: id.into(),
            content: content.into(),
            context: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub evaluation: EvaluationKind,
    pub weights: Option<ScoreWeights>,
    pub include_safety: bool,
    pub include_brand: bool,
    pub window_size: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            evaluation: EvaluationKind::Safety,
            weights: None,
            include_safety: true,
            include_brand: true,
            window_size: None,
        }
    }
}

impl BatchOptions {
    pub fn of(evaluation: EvaluationKind) -> Self {
        BatchOptions {
            evaluation,
            ..Self::default()
        }
    }

    fn include(&self) -> IncludeFlags {
        IncludeFlags {
            safety: self.include_safety,
            brand: self.include_brand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchItemStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub id: String,
    pub status: BatchItemStatus,
    pub outcome: EvaluationOutcome,
    pub processing_time_ms: u64,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemError {
    pub id: String,
    pub status: BatchItemStatus,
    pub content_preview: String,
    pub message: String,
}

impl BatchItemError {
    fn new(id: String, content: &str, message: String) -> Self {
        BatchItemError {
            id,
            status: BatchItemStatus::Error,
            content_preview: preview(content, ERROR_PREVIEW_CHARS),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub results: Vec<BatchItemResult>,
    pub errors: Vec<BatchItemError>,
    pub summary: BatchSummary,
    pub cancelled: bool,
}

fn validate_batch(items: &[BatchItem]) -> Result<(), EvaluationError> {
    if items.is_empty() {
        return Err(EvaluationError::validation("batch must contain at least one item"));
    }
    if items.len() > MAX_BATCH_ITEMS {
        return Err(EvaluationError::validation(format!(
            "batch of {} items exceeds the limit of {MAX_BATCH_ITEMS}",
            items.len()
        )));
    }
    Ok(())
}

async fn run_item(
    snapshot: &EvaluationSnapshot,
    content: &str,
    context: Option<&str>,
    options: &BatchOptions,
) -> Result<EvaluationOutcome, EvaluationError> {
    let content = snapshot.content(content)?;
    match options.evaluation {
        EvaluationKind::Safety => Ok(EvaluationOutcome::Safety(
            snapshot.safety(&content, context).await,
        )),
        EvaluationKind::Compliance => snapshot
            .compliance(&content, context)
            .map(EvaluationOutcome::Compliance),
        EvaluationKind::Combined => snapshot
            .combined(&content, context, options.weights, options.include())
            .await
            .map(EvaluationOutcome::Combined),
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("evaluation task aborted: {err}");
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("evaluation panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("evaluation panicked: {message}")
    } else {
        "evaluation panicked".to_string()
    }
}

impl ContentEvaluator {
    /// Evaluates 1 to 100 items in fixed windows, isolating per-item failures.
    pub async fn evaluate_batch(
        &self,
        items: Vec<BatchItem>,
        options: BatchOptions,
    ) -> Result<BatchReport, EvaluationError> {
        self.evaluate_batch_with_cancel(items, options, CancellationToken::new())
            .await
    }

    /// Like [`evaluate_batch`](Self::evaluate_batch); `token` is checked between windows.
    ///
    /// Items of windows that never started are reported as "batch cancelled" errors.
    pub async fn evaluate_batch_with_cancel(
        &self,
        items: Vec<BatchItem>,
        options: BatchOptions,
        token: CancellationToken,
    ) -> Result<BatchReport, EvaluationError> {
        validate_batch(&items)?;

        let window = self.engine_config().window_size(options.window_size);
        let total_windows = items.len().div_ceil(window);
        let snapshot = self.snapshot().await;
        let registry = self.batch_registry();
        let batch_id = registry.register(items.len(), total_windows, token.clone());
        // Unregisters the batch even if this future is dropped mid-window.
        let guard = BatchGuard::new(registry.clone(), batch_id.clone());

        let mut stats = BatchStatsCollector::new();
        let mut results = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        let mut cancelled = false;

        stats.start();
        let mut pending = items.into_iter().peekable();
        let mut window_index = 0;
        while pending.peek().is_some() {
            let chunk: Vec<BatchItem> = pending.by_ref().take(window).collect();

            if token.is_cancelled() {
                cancelled = true;
                for item in chunk.into_iter().chain(pending.by_ref()) {
                    errors.push(BatchItemError::new(
                        item.id,
                        &item.content,
                        EvaluationError::Cancelled.to_string(),
                    ));
                    stats.track_failure();
                }
                break;
            }

            window_index += 1;
            registry.window_started(&batch_id);
            log::debug!(
                "Batch {}: window {}/{} started ({} items)",
                batch_id,
                window_index,
                total_windows,
                chunk.len()
            );

            let handles: Vec<_> = chunk
                .iter()
                .map(|item| {
                    let snapshot = snapshot.clone();
                    let options = options.clone();
                    let content = item.content.clone();
                    let context = item.context.clone();
                    tokio::spawn(async move {
                        let started = Instant::now();
                        let outcome =
                            run_item(&snapshot, &content, context.as_deref(), &options).await;
                        (outcome, started.elapsed().as_millis() as u64)
                    })
                })
                .collect();
            let joined = join_all(handles).await;

            for (item, outcome) in chunk.into_iter().zip(joined) {
                let failure = match outcome {
                    Ok((Ok(outcome), processing_time_ms)) => {
                        stats.track_success(&outcome);
                        results.push(BatchItemResult {
                            id: item.id,
                            status: BatchItemStatus::Success,
                            outcome,
                            processing_time_ms,
                            metadata: item.metadata,
                        });
                        continue;
                    }
                    Ok((Err(err), _)) => err.to_string(),
                    Err(err) => panic_message(err),
                };
                log::warn!("Batch {}: item {} failed: {}", batch_id, item.id, failure);
                stats.track_failure();
                errors.push(BatchItemError::new(item.id, &item.content, failure));
            }

            registry.window_finished(&batch_id);
            log::debug!(
                "Batch {}: window {}/{} finished",
                batch_id,
                window_index,
                total_windows
            );
        }
        stats.finish();

        let summary = stats.summary();
        guard.finish(if cancelled {
            BatchStatus::Canceled
        } else {
            BatchStatus::Completed
        });
        log::info!(
            "Batch {} finished: {}/{} succeeded ({:.1}%){}",
            batch_id,
            summary.successes,
            summary.total_items,
            summary.success_rate,
            if cancelled { ", cancelled" } else { "" }
        );

        Ok(BatchReport {
            batch_id,
            results,
            errors,
            summary,
            cancelled,
        })
    }
}
