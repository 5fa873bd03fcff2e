//! The resource-bounded execution loop. Steps run strictly in sequence;
//! accounting happens after every step and the kill-switch fires on the first
//! breach. Kills are forward-only: completed steps are never rolled back.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use warden_types::{
    ExecutionMetrics, ExecutionStatus, PipelineComponent, ResourceLimits, Result, WardenError,
};

use crate::cost_model::StepCostModel;
use crate::metrics::first_breach;

/// The external training collaborator. Errors terminate the run as `Failed`,
/// distinct from a resource kill. Retry policy, if any, lives behind this
/// seam, never in the executor.
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn run_step(&self, step: &PipelineComponent) -> Result<()>;
}

#[derive(Debug)]
struct ExecutionRecord {
    status: ExecutionStatus,
    metrics: ExecutionMetrics,
    cancel_requested: bool,
}

/// Shared view of one execution: status polling and cooperative cancellation.
/// Cancellation only flips a flag; the worker observes it before each step.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    inner: Arc<RwLock<ExecutionRecord>>,
}

impl ExecutionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ExecutionRecord {
                status: ExecutionStatus::Pending,
                metrics: ExecutionMetrics::default(),
                cancel_requested: false,
            })),
        }
    }

    pub async fn status(&self) -> ExecutionStatus {
        self.inner.read().await.status
    }

    pub async fn metrics(&self) -> ExecutionMetrics {
        self.inner.read().await.metrics.clone()
    }

    pub async fn cancel(&self) {
        self.inner.write().await.cancel_requested = true;
    }

    async fn set_status(&self, status: ExecutionStatus) {
        self.inner.write().await.status = status;
    }

    async fn store_metrics(&self, metrics: &ExecutionMetrics) {
        self.inner.write().await.metrics = metrics.clone();
    }

    async fn is_cancelled(&self) -> bool {
        self.inner.read().await.cancel_requested
    }
}

impl Default for ExecutionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked with a metrics snapshot after each successful step.
pub type ProgressCallback = dyn Fn(&ExecutionMetrics) + Send + Sync;

pub struct Executor<M: StepCostModel> {
    cost_model: M,
}

impl<M: StepCostModel> Executor<M> {
    pub fn new(cost_model: M) -> Self {
        Self { cost_model }
    }

    /// Run `steps` in order under `limits`. Returns the final metrics on
    /// completion or cancellation; fails with `StepFailed` when the runner
    /// errors and `ResourceLimitExceeded` when the kill-switch fires. In all
    /// cases the handle carries the final status and the partial metrics.
    pub async fn execute(
        &self,
        pipeline_id: Uuid,
        steps: &[PipelineComponent],
        limits: &ResourceLimits,
        runner: &dyn StepRunner,
        handle: &ExecutionHandle,
        progress: Option<&ProgressCallback>,
    ) -> Result<ExecutionMetrics> {
        handle.set_status(ExecutionStatus::Running).await;
        let mut metrics = ExecutionMetrics::default();

        for step in steps {
            if handle.is_cancelled().await {
                handle.set_status(ExecutionStatus::Cancelled).await;
                tracing::info!(pipeline = %pipeline_id, step = %step.name, "execution cancelled");
                return Ok(metrics);
            }

            let started = Instant::now();
            if let Err(err) = runner.run_step(step).await {
                handle.set_status(ExecutionStatus::Failed).await;
                tracing::error!(pipeline = %pipeline_id, step = %step.name, %err, "step failed");
                return Err(WardenError::StepFailed {
                    step: step.name.clone(),
                    message: err.to_string(),
                });
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let cost = self.cost_model.step_cost(step.kind);
            metrics.cost_usd += cost.cost_usd;
            metrics.carbon_kg += cost.carbon_kg;
            // Memory is a high-watermark, not a sum.
            metrics.memory_mb = metrics.memory_mb.max(cost.memory_mb);
            metrics.duration_ms += elapsed_ms;
            metrics.steps_completed += 1;
            handle.store_metrics(&metrics).await;

            if let Some(callback) = progress {
                callback(&metrics);
            }

            if let Some(breach) = first_breach(&metrics, limits) {
                handle.set_status(ExecutionStatus::Killed).await;
                tracing::warn!(
                    pipeline = %pipeline_id,
                    resource = %breach.resource,
                    limit = breach.limit,
                    current = breach.current,
                    "kill-switch fired"
                );
                return Err(WardenError::ResourceLimitExceeded {
                    resource: breach.resource,
                    limit: breach.limit,
                    current: breach.current,
                });
            }
        }

        handle.set_status(ExecutionStatus::Completed).await;
        tracing::info!(pipeline = %pipeline_id, steps = metrics.steps_completed, "execution completed");
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost_model::DefaultCostModel;
    use std::sync::atomic::{AtomicU64, Ordering};
    use warden_types::{ComponentKind, ResourceKind};

    struct OkRunner;

    #[async_trait]
    impl StepRunner for OkRunner {
        async fn run_step(&self, _step: &PipelineComponent) -> Result<()> {
            Ok(())
        }
    }

    struct FailingRunner {
        fail_on: String,
    }

    #[async_trait]
    impl StepRunner for FailingRunner {
        async fn run_step(&self, step: &PipelineComponent) -> Result<()> {
            if step.name == self.fail_on {
                Err(WardenError::Other("collaborator crashed".into()))
            } else {
                Ok(())
            }
        }
    }

    fn step(kind: ComponentKind, name: &str) -> PipelineComponent {
        PipelineComponent {
            kind,
            name: name.into(),
            tool: "stub".into(),
        }
    }

    fn open_limits() -> ResourceLimits {
        ResourceLimits {
            max_cost_usd: 100.0,
            max_carbon_kg: 10.0,
            max_memory_mb: 4096.0,
            max_duration_ms: 600_000,
        }
    }

    #[tokio::test]
    async fn clean_run_completes_with_additive_cost() {
        let executor = Executor::new(DefaultCostModel);
        let handle = ExecutionHandle::new();
        let steps = vec![
            step(ComponentKind::Source, "load"),
            step(ComponentKind::Transform, "prep"),
            step(ComponentKind::Model, "train"),
            step(ComponentKind::Sink, "save"),
        ];
        let metrics = executor
            .execute(Uuid::new_v4(), &steps, &open_limits(), &OkRunner, &handle, None)
            .await
            .unwrap();
        assert_eq!(metrics.steps_completed, 4);
        // 0.001 + 0.005 + 0.05 + 0.001
        assert!((metrics.cost_usd - 0.057).abs() < 1e-9);
        assert_eq!(handle.status().await, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn cost_breach_kills_after_the_breaching_step() {
        let executor = Executor::new(DefaultCostModel);
        let handle = ExecutionHandle::new();
        let steps = vec![
            step(ComponentKind::Source, "load"),
            step(ComponentKind::Model, "train"),
        ];
        let limits = ResourceLimits {
            max_cost_usd: 0.05,
            ..open_limits()
        };
        let err = executor
            .execute(Uuid::new_v4(), &steps, &limits, &OkRunner, &handle, None)
            .await
            .unwrap_err();
        let WardenError::ResourceLimitExceeded {
            resource,
            limit,
            current,
        } = err
        else {
            panic!("expected resource limit error");
        };
        assert_eq!(resource, ResourceKind::Cost);
        assert_eq!(limit, 0.05);
        // The breach is detected only after the model step runs, so both
        // steps' costs are in the kill report.
        assert!((current - 0.051).abs() < 1e-9);
        assert_eq!(handle.status().await, ExecutionStatus::Killed);
        let metrics = handle.metrics().await;
        assert_eq!(metrics.steps_completed, 2);
        assert!((metrics.cost_usd - 0.051).abs() < 1e-9);
    }

    #[tokio::test]
    async fn step_failure_is_failed_not_killed() {
        let executor = Executor::new(DefaultCostModel);
        let handle = ExecutionHandle::new();
        let steps = vec![
            step(ComponentKind::Source, "load"),
            step(ComponentKind::Model, "train"),
        ];
        let runner = FailingRunner {
            fail_on: "train".into(),
        };
        let err = executor
            .execute(Uuid::new_v4(), &steps, &open_limits(), &runner, &handle, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::StepFailed { .. }));
        assert_eq!(handle.status().await, ExecutionStatus::Failed);
        // The failing step was never accounted.
        assert_eq!(handle.metrics().await.steps_completed, 1);
    }

    #[tokio::test]
    async fn cancellation_is_observed_before_the_next_step() {
        let executor = Executor::new(DefaultCostModel);
        let handle = ExecutionHandle::new();
        handle.cancel().await;
        let steps = vec![step(ComponentKind::Source, "load")];
        let metrics = executor
            .execute(Uuid::new_v4(), &steps, &open_limits(), &OkRunner, &handle, None)
            .await
            .unwrap();
        assert_eq!(metrics.steps_completed, 0);
        assert_eq!(handle.status().await, ExecutionStatus::Cancelled);
    }

    #[tokio::test]
    async fn progress_callback_fires_after_every_step() {
        let executor = Executor::new(DefaultCostModel);
        let handle = ExecutionHandle::new();
        let calls = Arc::new(AtomicU64::new(0));
        let calls_seen = calls.clone();
        let progress = move |_metrics: &ExecutionMetrics| {
            calls_seen.fetch_add(1, Ordering::SeqCst);
        };
        let steps = vec![
            step(ComponentKind::Source, "load"),
            step(ComponentKind::Sink, "save"),
        ];
        executor
            .execute(
                Uuid::new_v4(),
                &steps,
                &open_limits(),
                &OkRunner,
                &handle,
                Some(&progress),
            )
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn memory_is_a_high_watermark() {
        let executor = Executor::new(DefaultCostModel);
        let handle = ExecutionHandle::new();
        let steps = vec![
            step(ComponentKind::Model, "train"),
            step(ComponentKind::Sink, "save"),
        ];
        let metrics = executor
            .execute(Uuid::new_v4(), &steps, &open_limits(), &OkRunner, &handle, None)
            .await
            .unwrap();
        // 512 (model), not 512 + 32.
        assert_eq!(metrics.memory_mb, 512.0);
    }

    #[tokio::test]
    async fn handle_starts_pending() {
        let handle = ExecutionHandle::new();
        assert_eq!(handle.status().await, ExecutionStatus::Pending);
        assert_eq!(handle.metrics().await, ExecutionMetrics::default());
    }
}
