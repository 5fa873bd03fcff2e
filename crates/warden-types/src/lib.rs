//! Shared types and errors for the Warden lifecycle governance engine.
//!
//! This crate provides the foundational types used across all other Warden crates:
//! - `WardenError` — unified error taxonomy
//! - `Constraints`, `DesignRequest` — the user-facing design contract
//! - `PipelineCandidate` — generated pipeline artifacts
//! - `LifecycleState` — the gated project workflow stages
//! - `ExecutionMetrics` / `ResourceLimits` — executor accounting

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lifecycle states
// ---------------------------------------------------------------------------

/// Stages of the gated workflow from dataset intake to trained-model delivery.
///
/// The allowed transitions between states are defined by
/// `warden-lifecycle`'s transition table; this enum is only the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    DatasetUploaded,
    DatasetProfiled,
    DatasetValidated,
    ConstraintsValidated,
    FeasibilityApproved,
    CandidatesGenerated,
    ExecutionApproved,
    TrainingRunning,
    TrainingCompleted,
    TrainingBlocked,
    TrainingKilled,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::DatasetUploaded => "DATASET_UPLOADED",
            LifecycleState::DatasetProfiled => "DATASET_PROFILED",
            LifecycleState::DatasetValidated => "DATASET_VALIDATED",
            LifecycleState::ConstraintsValidated => "CONSTRAINTS_VALIDATED",
            LifecycleState::FeasibilityApproved => "FEASIBILITY_APPROVED",
            LifecycleState::CandidatesGenerated => "CANDIDATES_GENERATED",
            LifecycleState::ExecutionApproved => "EXECUTION_APPROVED",
            LifecycleState::TrainingRunning => "TRAINING_RUNNING",
            LifecycleState::TrainingCompleted => "TRAINING_COMPLETED",
            LifecycleState::TrainingBlocked => "TRAINING_BLOCKED",
            LifecycleState::TrainingKilled => "TRAINING_KILLED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Resource dimensions tracked by the executor's kill-switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cost,
    Carbon,
    Memory,
    Duration,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Cost => "cost",
            ResourceKind::Carbon => "carbon",
            ResourceKind::Memory => "memory",
            ResourceKind::Duration => "duration",
        };
        f.write_str(s)
    }
}

/// Unified error type for all Warden subsystems.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    // === Input errors ===
    #[error("Invalid {field}: {message} (value {value}, required {required})")]
    Validation {
        field: String,
        value: serde_json::Value,
        required: serde_json::Value,
        message: String,
    },

    // === Lifecycle errors ===
    #[error("Cannot transition from {} to {target}", current.map(|s| s.to_string()).unwrap_or_else(|| "(none)".into()))]
    InvalidTransition {
        current: Option<LifecycleState>,
        target: LifecycleState,
    },

    #[error("Project '{id}' not found")]
    ProjectNotFound { id: String },

    #[error("Metadata payload {payload} does not match target state {target}")]
    MetadataMismatch { target: LifecycleState, payload: String },

    // === Execution errors ===
    #[error("Resource limit exceeded: {resource} at {current:.4} over limit {limit:.4}")]
    ResourceLimitExceeded {
        resource: ResourceKind,
        limit: f64,
        current: f64,
    },

    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("Execution blocked by safety gate: {reasons}")]
    GateBlocked { reasons: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl WardenError {
    /// Returns `true` for errors caused by malformed or out-of-range user input.
    /// These are always actionable and never fatal.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            WardenError::Validation { .. }
                | WardenError::InvalidTransition { .. }
                | WardenError::MetadataMismatch { .. }
        )
    }

    /// Returns `true` if the error terminated an in-flight execution.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            WardenError::ResourceLimitExceeded { .. } | WardenError::StepFailed { .. }
        )
    }
}

/// A convenience alias for `Result<T, WardenError>`.
pub type Result<T> = std::result::Result<T, WardenError>;

// ---------------------------------------------------------------------------
// Request vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Tabular,
    Text,
    Image,
    TimeSeries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Regression,
    Clustering,
    Ner,
    Summarization,
    Translation,
    ObjectDetection,
    Segmentation,
    Forecasting,
}

impl TaskType {
    /// Tasks that only make sense on image data.
    pub fn is_vision_only(&self) -> bool {
        matches!(self, TaskType::ObjectDetection | TaskType::Segmentation)
    }

    /// Tasks that only make sense on text data.
    pub fn is_text_only(&self) -> bool {
        matches!(
            self,
            TaskType::Ner | TaskType::Summarization | TaskType::Translation
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    Accuracy,
    Cost,
    Speed,
    Carbon,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentTarget {
    Batch,
    Realtime,
    Edge,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrainingPolicy {
    Time,
    Drift,
    Manual,
    None,
}

/// Compliance tiers are ordered: variant order defines strictness, so
/// `tier >= ComplianceTier::Regulated` selects the regulated tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceTier {
    None,
    Standard,
    Regulated,
    HighlyRegulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareClass {
    Cpu,
    Gpu,
    Tpu,
    EdgeDevice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Classical,
    SmallDeep,
    Compressed,
    Transformer,
    Legacy,
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelFamily::Classical => "classical",
            ModelFamily::SmallDeep => "small_deep",
            ModelFamily::Compressed => "compressed",
            ModelFamily::Transformer => "transformer",
            ModelFamily::Legacy => "legacy",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Constraints and design request
// ---------------------------------------------------------------------------

/// Immutable resource/quality limits for a design request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub max_cost_usd: f64,
    pub max_carbon_kg: f64,
    pub max_latency_ms: u64,
    pub min_accuracy: f64,
    pub compliance: ComplianceTier,
    pub max_model_size_mb: Option<u32>,
    pub hardware: HardwareClass,
}

/// Shape of the dataset a design request is built on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    pub data_type: DataType,
    pub size_mb: Option<u64>,
    pub features: Option<u32>,
    pub num_samples: Option<u64>,
}

/// A request for pipeline designs, with explicit named fields rather than a
/// generic key/value payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignRequest {
    pub name: String,
    pub description: Option<String>,
    pub data_profile: DataProfile,
    pub objective: ObjectiveType,
    pub task: Option<TaskType>,
    pub constraints: Constraints,
    pub deployment: DeploymentTarget,
    pub retraining: RetrainingPolicy,
}

// ---------------------------------------------------------------------------
// Validation outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Hard,
    Soft,
}

/// A single constraint violation, with the triggering value and limit so
/// relaxation tooling can act on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub constraint: String,
    pub value: serde_json::Value,
    pub required: serde_json::Value,
    pub severity: Severity,
    pub message: String,
}

impl ConstraintViolation {
    pub fn hard(
        constraint: impl Into<String>,
        value: impl Into<serde_json::Value>,
        required: impl Into<serde_json::Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            constraint: constraint.into(),
            value: value.into(),
            required: required.into(),
            severity: Severity::Hard,
            message: message.into(),
        }
    }

    pub fn soft(
        constraint: impl Into<String>,
        value: impl Into<serde_json::Value>,
        required: impl Into<serde_json::Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            constraint: constraint.into(),
            value: value.into(),
            required: required.into(),
            severity: Severity::Soft,
            message: message.into(),
        }
    }
}

/// A proposed loosening of a violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxationSuggestion {
    pub constraint: String,
    pub current: serde_json::Value,
    pub suggested: serde_json::Value,
    pub reason: String,
    pub priority: u8,
}

/// Result of validating a design request's raw constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<ConstraintViolation>,
    pub suggestions: Vec<RelaxationSuggestion>,
    pub feasibility_score: f64,
}

impl ValidationReport {
    pub fn hard_violations(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Hard)
    }
}

/// A lifecycle-level validation error stored on the project aggregate.
/// Codes prefixed `BLOCK_` block forward progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    pub action: String,
}

impl ValidationIssue {
    pub fn is_blocking(&self) -> bool {
        self.code.starts_with("BLOCK_")
    }
}

// ---------------------------------------------------------------------------
// Pipeline candidates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Source,
    Transform,
    Model,
    Sink,
    Monitor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineComponent {
    pub kind: ComponentKind,
    pub name: String,
    pub tool: String,
}

/// A generated pipeline design. Never mutated after creation except to attach
/// the hard-constraint filter's violation results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCandidate {
    pub id: uuid::Uuid,
    pub name: String,
    pub description: String,
    pub model_families: Vec<ModelFamily>,
    pub estimated_cost_usd: f64,
    pub estimated_carbon_kg: f64,
    pub estimated_latency_ms: u64,
    pub estimated_accuracy: f64,
    pub components: Vec<PipelineComponent>,
    pub feasibility_score: f64,
    pub violations: Vec<ConstraintViolation>,
}

// ---------------------------------------------------------------------------
// Monitoring and compliance vocabulary
// ---------------------------------------------------------------------------

/// Monitors that can be required by policy and attached before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    Cost,
    Latency,
    Carbon,
    Throughput,
    Drift,
    Fairness,
}

/// Compliance artifacts a regulated project must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceArtifact {
    AuditLogging,
    ModelDocumentation,
    FairnessAudit,
    Explainability,
}

// ---------------------------------------------------------------------------
// Execution accounting
// ---------------------------------------------------------------------------

/// Per-execution state machine: `Pending → Running → {Completed, Failed,
/// Cancelled, Killed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Killed,
}

/// Running totals accumulated by the executor, exactly once per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub cost_usd: f64,
    pub carbon_kg: f64,
    pub memory_mb: f64,
    pub duration_ms: u64,
    pub steps_completed: u64,
}

/// Ceilings the kill-switch enforces after every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub max_cost_usd: f64,
    pub max_carbon_kg: f64,
    pub max_memory_mb: f64,
    pub max_duration_ms: u64,
}

/// Estimated resource footprint of a planned training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEstimate {
    pub cost_usd: f64,
    pub carbon_kg: f64,
    pub duration_ms: u64,
    pub memory_mb: f64,
}

/// The in-flight training plan stored on the project when execution is approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub rows: u64,
    pub epochs: u32,
    pub model_family: ModelFamily,
    pub estimate: ResourceEstimate,
}

/// Final outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub status: ExecutionStatus,
    pub metrics: ExecutionMetrics,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}
