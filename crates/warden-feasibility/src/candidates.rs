//! Candidate generation: one pipeline design per eligible family, ranked by
//! objective, then partitioned by the hard constraint filter.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_types::{DesignRequest, ObjectiveType, PipelineCandidate, RelaxationSuggestion};

use crate::{filter, matrix};

/// Outcome of a design run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DesignOutcome {
    /// At least one candidate survived the hard constraint filter.
    Feasible { candidates: Vec<PipelineCandidate> },
    /// Families were eligible but every candidate violated a hard budget.
    /// The violating candidates come back annotated, with relaxations.
    Infeasible {
        candidates: Vec<PipelineCandidate>,
        suggestions: Vec<RelaxationSuggestion>,
    },
    /// No family passed the eligibility matrix at all.
    NoEligibleFamilies,
}

impl DesignOutcome {
    pub fn is_feasible(&self) -> bool {
        matches!(self, DesignOutcome::Feasible { .. })
    }
}

/// Generate, rank, and filter pipeline candidates for a request.
pub fn generate_candidates(request: &DesignRequest) -> DesignOutcome {
    let families = matrix::eligible_families(request);
    if families.is_empty() {
        tracing::info!(name = %request.name, "no eligible model families");
        return DesignOutcome::NoEligibleFamilies;
    }

    let data_size = request.data_profile.size_mb.unwrap_or(100);
    let samples = request.data_profile.num_samples.unwrap_or(10_000);

    let mut candidates: Vec<PipelineCandidate> = families
        .iter()
        .map(|&family| {
            let profile = matrix::profile(family);
            let estimate = matrix::estimate_resources(family, data_size, samples);
            let accuracy = matrix::estimate_accuracy(family, request.objective);
            let mut candidate = PipelineCandidate {
                id: Uuid::new_v4(),
                name: format!("{} Pipeline", profile.name),
                description: profile.description.to_string(),
                model_families: vec![family],
                estimated_cost_usd: estimate.cost_usd,
                estimated_carbon_kg: estimate.carbon_kg,
                estimated_latency_ms: estimate.latency_ms,
                estimated_accuracy: accuracy,
                components: matrix::components_for(family, request.data_profile.data_type),
                feasibility_score: 0.0,
                violations: vec![],
            };
            candidate.feasibility_score = feasibility_score(&candidate, request);
            candidate
        })
        .collect();

    rank_candidates(&mut candidates, request.objective);

    let (feasible, infeasible) = filter::filter_candidates(candidates, &request.constraints);
    if feasible.is_empty() {
        let suggestions = filter::relaxation_suggestions(&infeasible, &request.constraints);
        tracing::info!(
            name = %request.name,
            rejected = infeasible.len(),
            "every candidate failed the hard constraint filter"
        );
        return DesignOutcome::Infeasible {
            candidates: infeasible,
            suggestions,
        };
    }

    tracing::info!(name = %request.name, count = feasible.len(), "generated candidates");
    DesignOutcome::Feasible { candidates: feasible }
}

/// Headroom-based score in [0, 1]: how comfortably the candidate sits inside
/// each budget, averaged across cost, carbon, latency and accuracy margin.
fn feasibility_score(candidate: &PipelineCandidate, request: &DesignRequest) -> f64 {
    let c = &request.constraints;
    let headrooms = [
        1.0 - candidate.estimated_cost_usd / c.max_cost_usd,
        1.0 - candidate.estimated_carbon_kg / c.max_carbon_kg,
        1.0 - candidate.estimated_latency_ms as f64 / c.max_latency_ms as f64,
        (candidate.estimated_accuracy - c.min_accuracy) / (1.0 - c.min_accuracy).max(0.01),
    ];
    let score = headrooms.iter().sum::<f64>() / headrooms.len() as f64;
    score.clamp(0.0, 1.0)
}

fn rank_candidates(candidates: &mut [PipelineCandidate], objective: ObjectiveType) {
    match objective {
        ObjectiveType::Accuracy => candidates
            .sort_by(|a, b| b.estimated_accuracy.total_cmp(&a.estimated_accuracy)),
        ObjectiveType::Cost => {
            candidates.sort_by(|a, b| a.estimated_cost_usd.total_cmp(&b.estimated_cost_usd))
        }
        ObjectiveType::Speed => {
            candidates.sort_by_key(|c| c.estimated_latency_ms);
        }
        ObjectiveType::Carbon => {
            candidates.sort_by(|a, b| a.estimated_carbon_kg.total_cmp(&b.estimated_carbon_kg))
        }
        ObjectiveType::Balanced => {
            candidates.sort_by(|a, b| b.feasibility_score.total_cmp(&a.feasibility_score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::{
        ComplianceTier, Constraints, DataProfile, DataType, DeploymentTarget, HardwareClass,
        ModelFamily, RetrainingPolicy, TaskType,
    };

    fn request(objective: ObjectiveType, constraints: Constraints) -> DesignRequest {
        DesignRequest {
            name: "churn-model".into(),
            description: None,
            data_profile: DataProfile {
                data_type: DataType::Tabular,
                size_mb: Some(100),
                features: Some(20),
                num_samples: Some(10_000),
            },
            objective,
            task: Some(TaskType::Classification),
            constraints,
            deployment: DeploymentTarget::Batch,
            retraining: RetrainingPolicy::Drift,
        }
    }

    fn open_constraints() -> Constraints {
        Constraints {
            max_cost_usd: 100.0,
            max_carbon_kg: 10.0,
            max_latency_ms: 10_000,
            min_accuracy: 0.5,
            compliance: ComplianceTier::Standard,
            max_model_size_mb: None,
            hardware: HardwareClass::Gpu,
        }
    }

    #[test]
    fn feasible_outcome_has_one_candidate_per_family() {
        let outcome = generate_candidates(&request(ObjectiveType::Balanced, open_constraints()));
        let DesignOutcome::Feasible { candidates } = outcome else {
            panic!("expected feasible outcome");
        };
        // Tabular data admits classical, small_deep, compressed and legacy.
        assert_eq!(candidates.len(), 4);
        for candidate in &candidates {
            assert_eq!(candidate.model_families.len(), 1);
            assert!(candidate.violations.is_empty());
            assert!((0.0..=1.0).contains(&candidate.feasibility_score));
        }
    }

    #[test]
    fn cost_objective_ranks_cheapest_first() {
        let outcome = generate_candidates(&request(ObjectiveType::Cost, open_constraints()));
        let DesignOutcome::Feasible { candidates } = outcome else {
            panic!("expected feasible outcome");
        };
        assert_eq!(candidates[0].model_families, vec![ModelFamily::Classical]);
        let costs: Vec<f64> = candidates.iter().map(|c| c.estimated_cost_usd).collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn accuracy_objective_ranks_most_accurate_first() {
        let outcome = generate_candidates(&request(ObjectiveType::Accuracy, open_constraints()));
        let DesignOutcome::Feasible { candidates } = outcome else {
            panic!("expected feasible outcome");
        };
        let accuracies: Vec<f64> = candidates.iter().map(|c| c.estimated_accuracy).collect();
        assert!(accuracies.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn tight_budget_yields_infeasible_with_suggestions() {
        let mut c = open_constraints();
        // min_cost of classical (cheapest) is 0.1, so families stay eligible,
        // but the large dataset pushes every estimate over budget.
        c.max_cost_usd = 0.15;
        let mut req = request(ObjectiveType::Balanced, c);
        req.data_profile.size_mb = Some(1_000);
        let outcome = generate_candidates(&req);
        let DesignOutcome::Infeasible {
            candidates,
            suggestions,
        } = outcome
        else {
            panic!("expected infeasible outcome");
        };
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| !c.violations.is_empty()));
        assert!(suggestions.iter().any(|s| s.constraint == "max_cost_usd"));
    }

    #[test]
    fn impossible_matrix_yields_no_eligible_families() {
        let mut c = open_constraints();
        c.max_carbon_kg = 0.001; // below every family's per-run carbon
        let outcome = generate_candidates(&request(ObjectiveType::Balanced, c));
        assert!(matches!(outcome, DesignOutcome::NoEligibleFamilies));
    }

    #[test]
    fn highly_regulated_candidates_use_only_approved_families() {
        let mut c = open_constraints();
        c.compliance = ComplianceTier::HighlyRegulated;
        let outcome = generate_candidates(&request(ObjectiveType::Balanced, c));
        let DesignOutcome::Feasible { candidates } = outcome else {
            panic!("expected feasible outcome");
        };
        for candidate in &candidates {
            assert!(candidate
                .model_families
                .iter()
                .all(|f| matches!(f, ModelFamily::Classical | ModelFamily::Compressed)));
        }
    }

    #[test]
    fn tight_budget_penalises_expensive_candidates() {
        // With a $2.50 budget, legacy ($2.00 estimate) has almost no cost
        // headroom while classical ($0.10) is comfortable.
        let mut c = open_constraints();
        c.max_cost_usd = 2.5;
        let outcome = generate_candidates(&request(ObjectiveType::Balanced, c));
        let DesignOutcome::Feasible { candidates } = outcome else {
            panic!("expected feasible outcome");
        };
        let classical = candidates
            .iter()
            .find(|c| c.model_families == vec![ModelFamily::Classical])
            .unwrap();
        let legacy = candidates
            .iter()
            .find(|c| c.model_families == vec![ModelFamily::Legacy])
            .unwrap();
        assert!(classical.feasibility_score > legacy.feasibility_score);
    }
}
