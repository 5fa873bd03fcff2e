//! Hard constraint filter: partitions candidates into feasible and infeasible
//! and proposes relaxations when nothing passes.

use serde_json::json;
use warden_types::{ConstraintViolation, Constraints, PipelineCandidate, RelaxationSuggestion};

/// Over-provision factor applied when suggesting a relaxed limit.
const RELAXATION_MARGIN: f64 = 1.2;

/// Check a candidate against the hard budgets. Every violated constraint is
/// reported, not just the first, so relaxation suggestions see the full
/// picture.
pub fn check_candidate(
    candidate: &PipelineCandidate,
    constraints: &Constraints,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    if candidate.estimated_cost_usd > constraints.max_cost_usd {
        violations.push(ConstraintViolation::hard(
            "max_cost_usd",
            candidate.estimated_cost_usd,
            constraints.max_cost_usd,
            format!(
                "estimated cost ${:.2} exceeds budget ${:.2}",
                candidate.estimated_cost_usd, constraints.max_cost_usd
            ),
        ));
    }
    if candidate.estimated_carbon_kg > constraints.max_carbon_kg {
        violations.push(ConstraintViolation::hard(
            "max_carbon_kg",
            candidate.estimated_carbon_kg,
            constraints.max_carbon_kg,
            format!(
                "estimated carbon {:.3} kg exceeds budget {:.3} kg",
                candidate.estimated_carbon_kg, constraints.max_carbon_kg
            ),
        ));
    }
    if candidate.estimated_latency_ms > constraints.max_latency_ms {
        violations.push(ConstraintViolation::hard(
            "max_latency_ms",
            candidate.estimated_latency_ms,
            constraints.max_latency_ms,
            format!(
                "estimated latency {} ms exceeds limit {} ms",
                candidate.estimated_latency_ms, constraints.max_latency_ms
            ),
        ));
    }
    if candidate.estimated_accuracy < constraints.min_accuracy {
        violations.push(ConstraintViolation::hard(
            "min_accuracy",
            candidate.estimated_accuracy,
            constraints.min_accuracy,
            format!(
                "estimated accuracy {:.2} below required {:.2}",
                candidate.estimated_accuracy, constraints.min_accuracy
            ),
        ));
    }

    violations
}

/// Partition candidates into (feasible, infeasible). A candidate is feasible
/// iff it has zero hard violations; infeasible candidates come back annotated
/// with everything they violated.
pub fn filter_candidates(
    candidates: Vec<PipelineCandidate>,
    constraints: &Constraints,
) -> (Vec<PipelineCandidate>, Vec<PipelineCandidate>) {
    let mut feasible = Vec::new();
    let mut infeasible = Vec::new();

    for mut candidate in candidates {
        let violations = check_candidate(&candidate, constraints);
        if violations.is_empty() {
            feasible.push(candidate);
        } else {
            tracing::debug!(
                candidate = %candidate.name,
                violations = violations.len(),
                "candidate rejected by hard constraint filter"
            );
            candidate.violations = violations;
            infeasible.push(candidate);
        }
    }

    (feasible, infeasible)
}

/// Derive relaxation suggestions from a set of rejected candidates. For each
/// violated constraint, the suggested limit is the smallest violating value
/// across candidates times a 20% margin: the cheapest change that would admit
/// at least one candidate.
pub fn relaxation_suggestions(
    infeasible: &[PipelineCandidate],
    constraints: &Constraints,
) -> Vec<RelaxationSuggestion> {
    let mut suggestions = Vec::new();

    let min_violating = |constraint: &str| -> Option<f64> {
        infeasible
            .iter()
            .flat_map(|c| &c.violations)
            .filter(|v| v.constraint == constraint)
            .filter_map(|v| v.value.as_f64())
            .min_by(|a, b| a.total_cmp(b))
    };

    if let Some(cost) = min_violating("max_cost_usd") {
        suggestions.push(RelaxationSuggestion {
            constraint: "max_cost_usd".into(),
            current: json!(constraints.max_cost_usd),
            suggested: json!(cost * RELAXATION_MARGIN),
            reason: "cheapest candidate exceeds the cost budget".into(),
            priority: 1,
        });
    }
    if let Some(carbon) = min_violating("max_carbon_kg") {
        suggestions.push(RelaxationSuggestion {
            constraint: "max_carbon_kg".into(),
            current: json!(constraints.max_carbon_kg),
            suggested: json!(carbon * RELAXATION_MARGIN),
            reason: "lowest-carbon candidate exceeds the carbon budget".into(),
            priority: 2,
        });
    }
    if let Some(latency) = min_violating("max_latency_ms") {
        suggestions.push(RelaxationSuggestion {
            constraint: "max_latency_ms".into(),
            current: json!(constraints.max_latency_ms),
            suggested: json!((latency * RELAXATION_MARGIN) as u64),
            reason: "fastest candidate exceeds the latency limit".into(),
            priority: 3,
        });
    }
    // Accuracy relaxes downward: suggest the best accuracy any candidate reaches.
    let best_accuracy = infeasible
        .iter()
        .flat_map(|c| &c.violations)
        .filter(|v| v.constraint == "min_accuracy")
        .filter_map(|v| v.value.as_f64())
        .max_by(|a, b| a.total_cmp(b));
    if let Some(accuracy) = best_accuracy {
        suggestions.push(RelaxationSuggestion {
            constraint: "min_accuracy".into(),
            current: json!(constraints.min_accuracy),
            suggested: json!(accuracy),
            reason: "no candidate reaches the required accuracy".into(),
            priority: 4,
        });
    }

    suggestions
}
