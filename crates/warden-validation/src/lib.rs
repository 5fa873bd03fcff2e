//! Constraint validation: consistency rules and feasibility scoring.
//!
//! Checks a design request's raw constraints for internal consistency and
//! known-infeasible combinations *before* any candidate is generated. Each
//! rule contributes violations (hard or soft) and relaxation suggestions;
//! [`validate`] runs them all and derives the feasibility score.

use serde_json::json;

use warden_types::{
    ConstraintViolation, DataType, DesignRequest, DeploymentTarget, ObjectiveType,
    RelaxationSuggestion, Severity, ValidationReport, ComplianceTier,
};

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Absolute floors per constraint field. Values below are hard violations.
const MIN_COST_USD: f64 = 0.1;
const MIN_CARBON_KG: f64 = 0.001;
const MIN_LATENCY_MS: u64 = 10;
const MIN_ACCURACY: f64 = 0.1;

/// Absolute ceilings per constraint field. Values above are hard violations.
const MAX_COST_USD: f64 = 10_000.0;
const MAX_CARBON_KG: f64 = 1_000.0;
const MAX_LATENCY_MS: u64 = 60_000;
const MAX_ACCURACY: f64 = 0.99;

// ---------------------------------------------------------------------------
// ValidationRule trait
// ---------------------------------------------------------------------------

/// A single finding produced by a validation rule.
#[derive(Debug, Clone)]
pub enum Finding {
    Violation(ConstraintViolation),
    Suggestion(RelaxationSuggestion),
}

pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, request: &DesignRequest) -> Vec<Finding>;
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

struct RangeRule;
impl ValidationRule for RangeRule {
    fn name(&self) -> &str { "range" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let c = &request.constraints;
        let mut findings = Vec::new();

        let mut check_f64 = |field: &str, value: f64, min: f64, max: f64| {
            if value < min {
                findings.push(Finding::Violation(ConstraintViolation::hard(
                    field,
                    value,
                    min,
                    format!("{field} must be at least {min}"),
                )));
            } else if value > max {
                findings.push(Finding::Violation(ConstraintViolation::hard(
                    field,
                    value,
                    max,
                    format!("{field} cannot exceed {max}"),
                )));
            }
        };
        check_f64("max_cost_usd", c.max_cost_usd, MIN_COST_USD, MAX_COST_USD);
        check_f64("max_carbon_kg", c.max_carbon_kg, MIN_CARBON_KG, MAX_CARBON_KG);
        check_f64("min_accuracy", c.min_accuracy, MIN_ACCURACY, MAX_ACCURACY);

        if c.max_latency_ms < MIN_LATENCY_MS {
            findings.push(Finding::Violation(ConstraintViolation::hard(
                "max_latency_ms",
                c.max_latency_ms,
                MIN_LATENCY_MS,
                format!("max_latency_ms must be at least {MIN_LATENCY_MS}"),
            )));
        } else if c.max_latency_ms > MAX_LATENCY_MS {
            findings.push(Finding::Violation(ConstraintViolation::hard(
                "max_latency_ms",
                c.max_latency_ms,
                MAX_LATENCY_MS,
                format!("max_latency_ms cannot exceed {MAX_LATENCY_MS}"),
            )));
        }

        findings
    }
}

/// Extreme carbon limits paired with extreme budgets are suspicious but not
/// blocking: suggest a realistic carbon limit.
struct CarbonCostSanityRule;
impl ValidationRule for CarbonCostSanityRule {
    fn name(&self) -> &str { "carbon_cost_sanity" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let c = &request.constraints;
        if c.max_carbon_kg < 0.1 && c.max_cost_usd > 100.0 {
            vec![Finding::Suggestion(RelaxationSuggestion {
                constraint: "max_carbon_kg".into(),
                current: json!(c.max_carbon_kg),
                suggested: json!(0.5),
                reason: "Very low carbon with high budget may not be achievable".into(),
                priority: 2,
            })]
        } else {
            vec![]
        }
    }
}

/// Sub-50ms latency combined with a sub-$5 budget is infeasible.
struct LatencyBudgetRule;
impl ValidationRule for LatencyBudgetRule {
    fn name(&self) -> &str { "latency_budget" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let c = &request.constraints;
        if c.max_latency_ms < 50 && c.max_cost_usd < 5.0 {
            vec![Finding::Violation(ConstraintViolation::hard(
                "max_latency_ms",
                c.max_latency_ms,
                50,
                "Very low latency (<50ms) with low budget (<$5) is likely infeasible",
            ))]
        } else {
            vec![]
        }
    }
}

/// Highly regulated systems require at least 95% minimum accuracy.
struct ComplianceAccuracyRule;
impl ValidationRule for ComplianceAccuracyRule {
    fn name(&self) -> &str { "compliance_accuracy" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let c = &request.constraints;
        if c.compliance == ComplianceTier::HighlyRegulated && c.min_accuracy < 0.95 {
            vec![Finding::Violation(ConstraintViolation::hard(
                "min_accuracy",
                c.min_accuracy,
                0.95,
                "Highly regulated systems require min 95% accuracy",
            ))]
        } else {
            vec![]
        }
    }
}

struct DeploymentRule;
impl ValidationRule for DeploymentRule {
    fn name(&self) -> &str { "deployment" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let c = &request.constraints;
        let mut findings = Vec::new();
        match request.deployment {
            DeploymentTarget::Realtime => {
                if c.max_cost_usd < 5.0 {
                    findings.push(Finding::Violation(ConstraintViolation::hard(
                        "max_cost_usd",
                        c.max_cost_usd,
                        5.0,
                        "Real-time deployment requires at least $5 budget",
                    )));
                }
                if c.max_latency_ms > 1000 {
                    findings.push(Finding::Violation(ConstraintViolation::soft(
                        "max_latency_ms",
                        c.max_latency_ms,
                        1000,
                        "Consider lower latency for real-time use case",
                    )));
                }
            }
            DeploymentTarget::Edge => {
                if c.max_cost_usd < 0.5 {
                    findings.push(Finding::Suggestion(RelaxationSuggestion {
                        constraint: "max_cost_usd".into(),
                        current: json!(c.max_cost_usd),
                        suggested: json!(1.0),
                        reason: "Edge deployment may require slightly higher budget for optimized models".into(),
                        priority: 2,
                    }));
                }
                if let Some(size) = c.max_model_size_mb {
                    if size > 100 {
                        findings.push(Finding::Violation(ConstraintViolation::soft(
                            "max_model_size_mb",
                            size,
                            100,
                            "Consider smaller models for edge deployment",
                        )));
                    }
                }
            }
            _ => {}
        }
        findings
    }
}

/// An accuracy objective with a 90%+ target and a sub-$10 budget contradicts itself.
struct ObjectiveBudgetRule;
impl ValidationRule for ObjectiveBudgetRule {
    fn name(&self) -> &str { "objective_budget" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let c = &request.constraints;
        if request.objective == ObjectiveType::Accuracy
            && c.min_accuracy >= 0.9
            && c.max_cost_usd < 10.0
        {
            vec![Finding::Violation(ConstraintViolation::hard(
                "min_accuracy",
                c.min_accuracy,
                0.9,
                "High accuracy (90%+) with low budget (<$10) is likely infeasible",
            ))]
        } else {
            vec![]
        }
    }
}

struct DataTaskCompatibilityRule;
impl ValidationRule for DataTaskCompatibilityRule {
    fn name(&self) -> &str { "data_task_compatibility" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let mut findings = Vec::new();
        if let Some(task) = request.task {
            if request.data_profile.data_type == DataType::Text && task.is_vision_only() {
                findings.push(Finding::Violation(ConstraintViolation::hard(
                    "data_profile",
                    json!("text"),
                    json!("image"),
                    format!("Task {task:?} requires image data, not text"),
                )));
            }
            if request.data_profile.data_type == DataType::Image && task.is_text_only() {
                findings.push(Finding::Violation(ConstraintViolation::hard(
                    "data_profile",
                    json!("image"),
                    json!("text"),
                    format!("Task {task:?} requires text data, not image"),
                )));
            }
        }
        // Text and image pipelines cannot be trained on sub-$5 budgets.
        if matches!(
            request.data_profile.data_type,
            DataType::Text | DataType::Image
        ) && request.constraints.max_cost_usd < 5.0
        {
            findings.push(Finding::Violation(ConstraintViolation::hard(
                "max_cost_usd",
                request.constraints.max_cost_usd,
                5.0,
                format!(
                    "${} budget too low for {:?} data",
                    request.constraints.max_cost_usd, request.data_profile.data_type
                ),
            )));
        }
        findings
    }
}

/// Non-blocking relaxation hints for borderline requests.
struct SuggestionRule;
impl ValidationRule for SuggestionRule {
    fn name(&self) -> &str { "suggestions" }
    fn apply(&self, request: &DesignRequest) -> Vec<Finding> {
        let c = &request.constraints;
        let mut findings = Vec::new();
        if request.objective == ObjectiveType::Accuracy && c.max_cost_usd < 1.0 {
            findings.push(Finding::Suggestion(RelaxationSuggestion {
                constraint: "max_cost_usd".into(),
                current: json!(c.max_cost_usd),
                suggested: json!(5.0),
                reason: "Accuracy optimization typically requires more compute".into(),
                priority: 1,
            }));
        }
        if c.max_carbon_kg < 0.01 {
            findings.push(Finding::Suggestion(RelaxationSuggestion {
                constraint: "max_carbon_kg".into(),
                current: json!(c.max_carbon_kg),
                suggested: json!(0.1),
                reason: "Very low carbon footprint may limit model options".into(),
                priority: 1,
            }));
        }
        if matches!(
            request.data_profile.data_type,
            DataType::Image | DataType::Text
        ) && c.max_latency_ms < 100
        {
            findings.push(Finding::Suggestion(RelaxationSuggestion {
                constraint: "max_latency_ms".into(),
                current: json!(c.max_latency_ms),
                suggested: json!(500),
                reason: format!(
                    "{:?} processing typically requires more time",
                    request.data_profile.data_type
                ),
                priority: 2,
            }));
        }
        findings
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run all validation rules against a design request.
///
/// `is_valid` is true iff no hard violations were found. The feasibility
/// score starts at 1.0, losing 0.3 per hard violation, 0.1 per soft
/// violation, and 0.1 per borderline numeric value, clamped to `[0, 1]`.
pub fn validate(request: &DesignRequest) -> ValidationReport {
    let rules: Vec<Box<dyn ValidationRule>> = vec![
        Box::new(RangeRule),
        Box::new(CarbonCostSanityRule),
        Box::new(LatencyBudgetRule),
        Box::new(ComplianceAccuracyRule),
        Box::new(DeploymentRule),
        Box::new(ObjectiveBudgetRule),
        Box::new(DataTaskCompatibilityRule),
        Box::new(SuggestionRule),
    ];

    let mut violations = Vec::new();
    let mut suggestions = Vec::new();
    for rule in &rules {
        for finding in rule.apply(request) {
            match finding {
                Finding::Violation(v) => violations.push(v),
                Finding::Suggestion(s) => suggestions.push(s),
            }
        }
    }

    let hard = violations.iter().filter(|v| v.severity == Severity::Hard).count();
    let soft = violations.iter().filter(|v| v.severity == Severity::Soft).count();

    let mut score = 1.0 - 0.3 * hard as f64 - 0.1 * soft as f64;
    let c = &request.constraints;
    if c.max_cost_usd < 1.0 {
        score -= 0.1;
    }
    if c.max_carbon_kg < 0.01 {
        score -= 0.1;
    }
    if c.max_latency_ms < 50 {
        score -= 0.1;
    }
    let feasibility_score = score.clamp(0.0, 1.0);

    let is_valid = hard == 0;
    if !is_valid {
        tracing::debug!(
            request = %request.name,
            hard_violations = hard,
            score = feasibility_score,
            "design request rejected by constraint validator"
        );
    }

    ValidationReport {
        is_valid,
        violations,
        suggestions,
        feasibility_score,
    }
}
