//! The operation surface of the governance engine: design requests, lifecycle
//! queries and transitions, page-access checks, and the plan/start/monitor/
//! stop/complete training flow. Transport-free; callers bring their own HTTP
//! or persistence around the injected registry.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_executor::{first_breach, plan_training, Breach};
use warden_feasibility::{generate_candidates, DesignOutcome};
use warden_gate::{
    attach_monitors, create_safety_report, validate_for_execution, MonitorSpec, SafetyReport,
};
use warden_lifecycle::{
    check_page_access, PageAccess, ProjectRegistry, ProjectState, TransitionMetadata,
};
use warden_types::{
    Constraints, DataProfile, DesignRequest, ExecutionMetrics, ExecutionStatus, LifecycleState,
    ModelFamily, PipelineCandidate, ResourceLimits, Result, TrainingPlan, TrainingResult,
    ValidationIssue, ValidationReport, WardenError,
};
use warden_validation::validate;

/// Headroom applied to plan-derived memory and duration limits during
/// monitoring. Cost and carbon use the constraint budgets directly.
const MONITOR_HEADROOM: f64 = 1.1;

/// Outcome of a design request: the validation verdict, plus candidates when
/// the request was valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignResponse {
    pub validation: ValidationReport,
    pub outcome: Option<DesignOutcome>,
}

/// Snapshot answering the lifecycle query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub id: Uuid,
    pub name: String,
    pub current_state: LifecycleState,
    pub allowed_next_states: Vec<LifecycleState>,
    pub blocking_errors: Vec<ValidationIssue>,
    pub constraints: Option<Constraints>,
    pub data_profile: Option<DataProfile>,
    pub candidates: Vec<PipelineCandidate>,
}

/// Result of planning a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub plan: TrainingPlan,
    pub violations: Vec<ValidationIssue>,
    pub approved: bool,
    pub new_state: LifecycleState,
}

/// Result of the start-training gate check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOutcome {
    pub report: SafetyReport,
    pub monitors: Vec<MonitorSpec>,
}

/// Verdict of one monitoring poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorVerdict {
    pub killed: bool,
    pub breached_resource: Option<warden_types::ResourceKind>,
}

pub struct ProjectService {
    registry: Arc<dyn ProjectRegistry>,
}

impl ProjectService {
    pub fn new(registry: Arc<dyn ProjectRegistry>) -> Self {
        Self { registry }
    }

    pub async fn create_project(&self, name: impl Into<String>) -> Result<ProjectState> {
        let project = ProjectState::new(name);
        self.registry.create(project.clone()).await?;
        tracing::info!(project = %project.id, "created project");
        Ok(project)
    }

    /// Validate a design request and, when valid, generate candidates.
    /// Pure over the request; project state is not consulted.
    pub fn design(&self, request: &DesignRequest) -> DesignResponse {
        let validation = validate(request);
        if !validation.is_valid {
            return DesignResponse {
                validation,
                outcome: None,
            };
        }
        let outcome = generate_candidates(request);
        DesignResponse {
            validation,
            outcome: Some(outcome),
        }
    }

    pub async fn project_status(&self, id: Uuid) -> Result<ProjectStatus> {
        let project = self.registry.get(id).await?;
        Ok(ProjectStatus {
            id: project.id,
            name: project.name.clone(),
            current_state: project.current_state,
            allowed_next_states: project.allowed_next_states().to_vec(),
            blocking_errors: project.blocking_errors().into_iter().cloned().collect(),
            constraints: project.constraints.clone(),
            data_profile: project.data_profile.clone(),
            candidates: project.candidates.clone(),
        })
    }

    pub async fn transition(
        &self,
        id: Uuid,
        target: LifecycleState,
        metadata: Option<TransitionMetadata>,
    ) -> Result<ProjectState> {
        let mut project = self.registry.get(id).await?;
        project.transition_to(target, metadata)?;
        self.registry.update(project.clone()).await?;
        Ok(project)
    }

    pub async fn page_access(&self, id: Uuid, page: &str) -> Result<PageAccess> {
        let project = self.registry.get(id).await?;
        Ok(check_page_access(&project, page))
    }

    /// Plan a training run against the project's stored constraints. A clean
    /// plan advances to `ExecutionApproved`; violations advance to
    /// `TrainingBlocked` with the blocking issues stored on the project.
    pub async fn plan_training(
        &self,
        id: Uuid,
        rows: u64,
        epochs: u32,
        family: ModelFamily,
    ) -> Result<PlanOutcome> {
        let mut project = self.registry.get(id).await?;
        let constraints = project.constraints.clone().ok_or_else(|| {
            WardenError::Other(format!("project '{id}' has no stored constraints"))
        })?;

        let (plan, violations) = plan_training(rows, epochs, family, &constraints);
        let approved = violations.is_empty();
        let new_state = if approved {
            project.transition_to(
                LifecycleState::ExecutionApproved,
                Some(TransitionMetadata::TrainingPlan(plan.clone())),
            )?;
            LifecycleState::ExecutionApproved
        } else {
            project.transition_to(
                LifecycleState::TrainingBlocked,
                Some(TransitionMetadata::ValidationErrors(violations.clone())),
            )?;
            LifecycleState::TrainingBlocked
        };
        self.registry.update(project).await?;

        Ok(PlanOutcome {
            plan,
            violations,
            approved,
            new_state,
        })
    }

    /// Run the safety gate on the selected candidate and, when it passes (or
    /// `force` is set), start training. Requires `ExecutionApproved`.
    pub async fn start_training(&self, id: Uuid, force: bool) -> Result<StartOutcome> {
        let mut project = self.registry.get(id).await?;
        if project.current_state != LifecycleState::ExecutionApproved {
            return Err(WardenError::InvalidTransition {
                current: Some(project.current_state),
                target: LifecycleState::TrainingRunning,
            });
        }
        let constraints = project.constraints.clone().ok_or_else(|| {
            WardenError::Other(format!("project '{id}' has no stored constraints"))
        })?;
        let candidate = project
            .selected_pipeline
            .clone()
            .or_else(|| project.candidates.first().cloned())
            .ok_or_else(|| {
                WardenError::Other(format!("project '{id}' has no pipeline candidate"))
            })?;

        let decision = validate_for_execution(&candidate, &constraints, force);
        if !decision.can_execute {
            let reasons = decision
                .violations
                .iter()
                .map(|v| v.message.clone())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(WardenError::GateBlocked { reasons });
        }

        let monitors = attach_monitors(&candidate, &constraints);
        let report = create_safety_report(&candidate, &constraints, decision);

        project.transition_to(LifecycleState::TrainingRunning, None)?;
        self.registry.update(project).await?;

        Ok(StartOutcome { report, monitors })
    }

    /// Poll accumulated usage against the stored plan. A breach unilaterally
    /// kills the run and transitions the project to `TrainingKilled`.
    pub async fn monitor_training(
        &self,
        id: Uuid,
        usage: &ExecutionMetrics,
    ) -> Result<MonitorVerdict> {
        let mut project = self.registry.get(id).await?;
        if project.current_state != LifecycleState::TrainingRunning {
            return Err(WardenError::InvalidTransition {
                current: Some(project.current_state),
                target: LifecycleState::TrainingKilled,
            });
        }
        let constraints = project.constraints.clone().ok_or_else(|| {
            WardenError::Other(format!("project '{id}' has no stored constraints"))
        })?;
        let plan = project.training_plan.clone().ok_or_else(|| {
            WardenError::Other(format!("project '{id}' has no training plan"))
        })?;

        let limits = ResourceLimits {
            max_cost_usd: constraints.max_cost_usd,
            max_carbon_kg: constraints.max_carbon_kg,
            max_memory_mb: plan.estimate.memory_mb * MONITOR_HEADROOM,
            max_duration_ms: (plan.estimate.duration_ms as f64 * MONITOR_HEADROOM) as u64,
        };

        match first_breach(usage, &limits) {
            Some(Breach { resource, limit, current }) => {
                tracing::warn!(
                    project = %id,
                    %resource,
                    limit,
                    current,
                    "monitor killing training run"
                );
                project.transition_to(
                    LifecycleState::TrainingKilled,
                    Some(TransitionMetadata::TrainingResult(TrainingResult {
                        status: ExecutionStatus::Killed,
                        metrics: usage.clone(),
                        completed_at: Utc::now(),
                    })),
                )?;
                self.registry.update(project).await?;
                Ok(MonitorVerdict {
                    killed: true,
                    breached_resource: Some(resource),
                })
            }
            None => Ok(MonitorVerdict {
                killed: false,
                breached_resource: None,
            }),
        }
    }

    /// User-initiated kill of a running training job. `usage` is the metrics
    /// snapshot at the moment of the stop; it is preserved on the result.
    pub async fn stop_training(&self, id: Uuid, usage: ExecutionMetrics) -> Result<ProjectState> {
        let mut project = self.registry.get(id).await?;
        project.transition_to(
            LifecycleState::TrainingKilled,
            Some(TransitionMetadata::TrainingResult(TrainingResult {
                status: ExecutionStatus::Cancelled,
                metrics: usage,
                completed_at: Utc::now(),
            })),
        )?;
        self.registry.update(project.clone()).await?;
        Ok(project)
    }

    /// Record the final result of a run. Requires `TrainingRunning`.
    pub async fn complete_training(
        &self,
        id: Uuid,
        result: TrainingResult,
    ) -> Result<ProjectState> {
        let mut project = self.registry.get(id).await?;
        project.transition_to(
            LifecycleState::TrainingCompleted,
            Some(TransitionMetadata::TrainingResult(result)),
        )?;
        self.registry.update(project.clone()).await?;
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_lifecycle::InMemoryProjectRegistry;
    use warden_types::{
        ComplianceTier, DataType, DeploymentTarget, HardwareClass, ObjectiveType,
        RetrainingPolicy, TaskType,
    };

    fn service() -> ProjectService {
        ProjectService::new(Arc::new(InMemoryProjectRegistry::new()))
    }

    fn constraints() -> Constraints {
        Constraints {
            max_cost_usd: 50.0,
            max_carbon_kg: 5.0,
            max_latency_ms: 5000,
            min_accuracy: 0.6,
            compliance: ComplianceTier::Standard,
            max_model_size_mb: None,
            hardware: HardwareClass::Gpu,
        }
    }

    fn profile() -> DataProfile {
        DataProfile {
            data_type: DataType::Tabular,
            size_mb: Some(100),
            features: Some(20),
            num_samples: Some(10_000),
        }
    }

    fn request() -> DesignRequest {
        DesignRequest {
            name: "churn".into(),
            description: None,
            data_profile: profile(),
            objective: ObjectiveType::Balanced,
            task: Some(TaskType::Classification),
            constraints: constraints(),
            deployment: DeploymentTarget::Batch,
            retraining: RetrainingPolicy::Drift,
        }
    }

    /// Walk a project to CandidatesGenerated with stored constraints and
    /// candidates.
    async fn project_with_candidates(svc: &ProjectService) -> Uuid {
        let project = svc.create_project("churn").await.unwrap();
        let id = project.id;
        svc.transition(
            id,
            LifecycleState::DatasetProfiled,
            Some(TransitionMetadata::Profile(profile())),
        )
        .await
        .unwrap();
        svc.transition(id, LifecycleState::DatasetValidated, None)
            .await
            .unwrap();
        svc.transition(
            id,
            LifecycleState::ConstraintsValidated,
            Some(TransitionMetadata::Constraints(constraints())),
        )
        .await
        .unwrap();
        svc.transition(id, LifecycleState::FeasibilityApproved, None)
            .await
            .unwrap();
        let response = svc.design(&request());
        let Some(DesignOutcome::Feasible { candidates }) = response.outcome else {
            panic!("expected feasible design");
        };
        svc.transition(
            id,
            LifecycleState::CandidatesGenerated,
            Some(TransitionMetadata::Candidates(candidates)),
        )
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn create_project_starts_uploaded() {
        let svc = service();
        let project = svc.create_project("churn").await.unwrap();
        let status = svc.project_status(project.id).await.unwrap();
        assert_eq!(status.current_state, LifecycleState::DatasetUploaded);
        assert_eq!(
            status.allowed_next_states,
            vec![LifecycleState::DatasetProfiled]
        );
    }

    #[tokio::test]
    async fn design_returns_validation_failure_without_candidates() {
        let svc = service();
        let mut req = request();
        req.data_profile.data_type = DataType::Text;
        req.constraints.max_cost_usd = 3.0;
        let response = svc.design(&req);
        assert!(!response.validation.is_valid);
        assert!(response.outcome.is_none());
    }

    #[tokio::test]
    async fn full_walkthrough_to_completion() {
        let svc = service();
        let id = project_with_candidates(&svc).await;

        let plan = svc
            .plan_training(id, 10_000, 2, ModelFamily::Classical)
            .await
            .unwrap();
        assert!(plan.approved);
        assert_eq!(plan.new_state, LifecycleState::ExecutionApproved);

        let start = svc.start_training(id, false).await.unwrap();
        assert!(start.report.decision.can_execute);
        assert!(!start.monitors.is_empty());

        let status = svc.project_status(id).await.unwrap();
        assert_eq!(status.current_state, LifecycleState::TrainingRunning);

        let project = svc
            .complete_training(
                id,
                TrainingResult {
                    status: ExecutionStatus::Completed,
                    metrics: ExecutionMetrics {
                        cost_usd: 0.2,
                        carbon_kg: 0.02,
                        memory_mb: 20.0,
                        duration_ms: 200,
                        steps_completed: 4,
                    },
                    completed_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(project.current_state, LifecycleState::TrainingCompleted);
        assert!(project.training_result.is_some());
    }

    #[tokio::test]
    async fn over_budget_plan_blocks_the_project() {
        let svc = service();
        let id = project_with_candidates(&svc).await;
        let plan = svc
            .plan_training(id, 1_000_000, 50, ModelFamily::Transformer)
            .await
            .unwrap();
        assert!(!plan.approved);
        assert_eq!(plan.new_state, LifecycleState::TrainingBlocked);
        let status = svc.project_status(id).await.unwrap();
        assert!(!status.blocking_errors.is_empty());
    }

    #[tokio::test]
    async fn start_training_requires_execution_approved() {
        let svc = service();
        let id = project_with_candidates(&svc).await;
        let err = svc.start_training(id, false).await.unwrap_err();
        assert!(matches!(err, WardenError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn monitor_kills_on_budget_breach() {
        let svc = service();
        let id = project_with_candidates(&svc).await;
        svc.plan_training(id, 10_000, 2, ModelFamily::Classical)
            .await
            .unwrap();
        svc.start_training(id, false).await.unwrap();

        let healthy = svc
            .monitor_training(id, &ExecutionMetrics::default())
            .await
            .unwrap();
        assert!(!healthy.killed);

        let runaway = ExecutionMetrics {
            cost_usd: 100.0, // budget is 50
            ..Default::default()
        };
        let verdict = svc.monitor_training(id, &runaway).await.unwrap();
        assert!(verdict.killed);
        assert_eq!(
            verdict.breached_resource,
            Some(warden_types::ResourceKind::Cost)
        );
        let status = svc.project_status(id).await.unwrap();
        assert_eq!(status.current_state, LifecycleState::TrainingKilled);
    }

    #[tokio::test]
    async fn stop_training_kills_a_running_job() {
        let svc = service();
        let id = project_with_candidates(&svc).await;
        svc.plan_training(id, 10_000, 2, ModelFamily::Classical)
            .await
            .unwrap();
        svc.start_training(id, false).await.unwrap();
        let project = svc
            .stop_training(id, ExecutionMetrics::default())
            .await
            .unwrap();
        assert_eq!(project.current_state, LifecycleState::TrainingKilled);
    }

    #[tokio::test]
    async fn stop_training_preserves_the_usage_snapshot() {
        let svc = service();
        let id = project_with_candidates(&svc).await;
        svc.plan_training(id, 10_000, 2, ModelFamily::Classical)
            .await
            .unwrap();
        svc.start_training(id, false).await.unwrap();
        let usage = ExecutionMetrics {
            cost_usd: 0.12,
            carbon_kg: 0.012,
            memory_mb: 24.0,
            duration_ms: 150,
            steps_completed: 2,
        };
        let project = svc.stop_training(id, usage.clone()).await.unwrap();
        let result = project.training_result.unwrap();
        assert_eq!(result.status, ExecutionStatus::Cancelled);
        assert_eq!(result.metrics, usage);
    }

    #[tokio::test]
    async fn killed_project_can_restart() {
        let svc = service();
        let id = project_with_candidates(&svc).await;
        svc.plan_training(id, 10_000, 2, ModelFamily::Classical)
            .await
            .unwrap();
        svc.start_training(id, false).await.unwrap();
        svc.stop_training(id, ExecutionMetrics::default())
            .await
            .unwrap();
        let project = svc
            .transition(id, LifecycleState::DatasetUploaded, None)
            .await
            .unwrap();
        assert_eq!(project.current_state, LifecycleState::DatasetUploaded);
    }

    #[tokio::test]
    async fn page_access_follows_the_lifecycle() {
        let svc = service();
        let id = project_with_candidates(&svc).await;
        let access = svc.page_access(id, "/design/results").await.unwrap();
        assert!(access.allowed);
        let access = svc.page_access(id, "/train/running").await.unwrap();
        assert!(!access.allowed);
    }

    #[tokio::test]
    async fn unknown_project_is_reported() {
        let svc = service();
        let err = svc.project_status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, WardenError::ProjectNotFound { .. }));
    }
}
