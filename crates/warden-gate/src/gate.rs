//! Execution safety gate: the last check before training is allowed to run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_feasibility::check_candidate;
use warden_types::{ConstraintViolation, Constraints, PipelineCandidate};

/// Fraction of the accuracy requirement treated as "too close for comfort".
const ACCURACY_WARNING_MARGIN: f64 = 1.1;
/// Fraction of the cost budget above which a warning fires.
const COST_WARNING_FRACTION: f64 = 0.8;

/// The gate's verdict. `forced` records that `force` overrode violations, so
/// callers always see the risk acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub can_execute: bool,
    pub forced: bool,
    pub violations: Vec<ConstraintViolation>,
    pub warnings: Vec<String>,
}

/// Re-run the hard-constraint check on the single selected candidate and emit
/// proximity warnings. `force` lets a caller execute despite violations.
pub fn validate_for_execution(
    candidate: &PipelineCandidate,
    constraints: &Constraints,
    force: bool,
) -> GateDecision {
    let violations = check_candidate(candidate, constraints);

    let mut warnings = Vec::new();
    if candidate.estimated_accuracy < constraints.min_accuracy * ACCURACY_WARNING_MARGIN {
        warnings.push(format!(
            "estimated accuracy {:.2} is within 10% of the required minimum {:.2}",
            candidate.estimated_accuracy, constraints.min_accuracy
        ));
    }
    if candidate.estimated_cost_usd > constraints.max_cost_usd * COST_WARNING_FRACTION {
        warnings.push(format!(
            "estimated cost ${:.2} exceeds 80% of the ${:.2} budget",
            candidate.estimated_cost_usd, constraints.max_cost_usd
        ));
    }

    let can_execute = violations.is_empty() || force;
    let forced = force && !violations.is_empty();
    if forced {
        tracing::warn!(
            candidate = %candidate.name,
            violations = violations.len(),
            "safety gate overridden by force"
        );
    }

    GateDecision {
        can_execute,
        forced,
        violations,
        warnings,
    }
}

/// Auditable record of a gate decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyReport {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub decision: GateDecision,
    pub estimated_cost_usd: f64,
    pub estimated_carbon_kg: f64,
    pub estimated_latency_ms: u64,
    pub estimated_accuracy: f64,
    pub constraints: Constraints,
    pub created_at: DateTime<Utc>,
}

pub fn create_safety_report(
    candidate: &PipelineCandidate,
    constraints: &Constraints,
    decision: GateDecision,
) -> SafetyReport {
    SafetyReport {
        candidate_id: candidate.id,
        candidate_name: candidate.name.clone(),
        decision,
        estimated_cost_usd: candidate.estimated_cost_usd,
        estimated_carbon_kg: candidate.estimated_carbon_kg,
        estimated_latency_ms: candidate.estimated_latency_ms,
        estimated_accuracy: candidate.estimated_accuracy,
        constraints: constraints.clone(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::{ComplianceTier, HardwareClass, ModelFamily};

    fn constraints() -> Constraints {
        Constraints {
            max_cost_usd: 10.0,
            max_carbon_kg: 1.0,
            max_latency_ms: 1000,
            min_accuracy: 0.7,
            compliance: ComplianceTier::Standard,
            max_model_size_mb: None,
            hardware: HardwareClass::Cpu,
        }
    }

    fn candidate(cost: f64, accuracy: f64) -> PipelineCandidate {
        PipelineCandidate {
            id: Uuid::new_v4(),
            name: "c".into(),
            description: String::new(),
            model_families: vec![ModelFamily::Classical],
            estimated_cost_usd: cost,
            estimated_carbon_kg: 0.1,
            estimated_latency_ms: 200,
            estimated_accuracy: accuracy,
            components: vec![],
            feasibility_score: 0.9,
            violations: vec![],
        }
    }

    #[test]
    fn clean_candidate_passes_without_warnings() {
        let decision = validate_for_execution(&candidate(1.0, 0.9), &constraints(), false);
        assert!(decision.can_execute);
        assert!(!decision.forced);
        assert!(decision.violations.is_empty());
        assert!(decision.warnings.is_empty());
    }

    #[test]
    fn violating_candidate_is_blocked() {
        let decision = validate_for_execution(&candidate(20.0, 0.9), &constraints(), false);
        assert!(!decision.can_execute);
        assert_eq!(decision.violations.len(), 1);
    }

    #[test]
    fn force_overrides_violations_and_is_recorded() {
        let decision = validate_for_execution(&candidate(20.0, 0.9), &constraints(), true);
        assert!(decision.can_execute);
        assert!(decision.forced);
        assert!(!decision.violations.is_empty());
    }

    #[test]
    fn force_without_violations_is_not_flagged() {
        let decision = validate_for_execution(&candidate(1.0, 0.9), &constraints(), true);
        assert!(decision.can_execute);
        assert!(!decision.forced);
    }

    #[test]
    fn near_minimum_accuracy_warns() {
        // 0.75 < 0.7 * 1.1 = 0.77, so this is within the warning margin.
        let decision = validate_for_execution(&candidate(1.0, 0.75), &constraints(), false);
        assert!(decision.can_execute);
        assert_eq!(decision.warnings.len(), 1);
        assert!(decision.warnings[0].contains("accuracy"));
    }

    #[test]
    fn high_budget_utilisation_warns() {
        let decision = validate_for_execution(&candidate(9.0, 0.9), &constraints(), false);
        assert!(decision.can_execute);
        assert!(decision.warnings.iter().any(|w| w.contains("80%")));
    }

    #[test]
    fn safety_report_captures_the_decision() {
        let c = candidate(20.0, 0.9);
        let cons = constraints();
        let decision = validate_for_execution(&c, &cons, true);
        let report = create_safety_report(&c, &cons, decision);
        assert_eq!(report.candidate_id, c.id);
        assert!(report.decision.forced);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("created_at"));
    }
}
