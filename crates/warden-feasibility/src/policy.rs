//! Feasibility policy engine: derives the enforcement plan for a validated
//! design request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_types::{
    ComplianceArtifact, ComplianceTier, DeploymentTarget, DesignRequest, ModelFamily, MonitorKind,
};

use crate::matrix;

/// Which constraints the filter treats as hard (candidate-rejecting) versus
/// soft (flagged but not rejecting), plus the monitoring and compliance
/// obligations execution must carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityPolicy {
    pub request_id: Uuid,
    pub eligible_families: Vec<ModelFamily>,
    pub hard_constraints: Vec<String>,
    pub soft_constraints: Vec<String>,
    pub required_monitors: Vec<MonitorKind>,
    pub compliance_artifacts: Vec<ComplianceArtifact>,
}

impl FeasibilityPolicy {
    pub fn is_hard(&self, constraint: &str) -> bool {
        self.hard_constraints.iter().any(|c| c == constraint)
    }
}

/// Build the policy for a request. Cost and carbon budgets are always hard;
/// latency hardens for realtime deployment; compliance hardens for regulated
/// tiers. Accuracy and latency are always tracked as soft constraints.
pub fn generate_policy(request: &DesignRequest) -> FeasibilityPolicy {
    let constraints = &request.constraints;

    let mut hard = vec!["max_cost_usd".to_string(), "max_carbon_kg".to_string()];
    if request.deployment == DeploymentTarget::Realtime {
        hard.push("max_latency_ms".to_string());
    }
    if constraints.compliance >= ComplianceTier::Regulated {
        hard.push("compliance".to_string());
    }

    let soft = vec!["min_accuracy".to_string(), "max_latency_ms".to_string()];

    let mut monitors = vec![MonitorKind::Cost, MonitorKind::Latency];
    if constraints.max_carbon_kg < 1.0 {
        monitors.push(MonitorKind::Carbon);
    }
    if request.deployment == DeploymentTarget::Realtime {
        monitors.push(MonitorKind::Throughput);
    }
    if constraints.compliance >= ComplianceTier::Regulated {
        monitors.push(MonitorKind::Drift);
        monitors.push(MonitorKind::Fairness);
    }

    let mut artifacts = Vec::new();
    if constraints.compliance >= ComplianceTier::Regulated {
        artifacts.push(ComplianceArtifact::AuditLogging);
        artifacts.push(ComplianceArtifact::ModelDocumentation);
    }
    if constraints.compliance == ComplianceTier::HighlyRegulated {
        artifacts.push(ComplianceArtifact::FairnessAudit);
        artifacts.push(ComplianceArtifact::Explainability);
    }

    let policy = FeasibilityPolicy {
        request_id: Uuid::new_v4(),
        eligible_families: matrix::eligible_families(request),
        hard_constraints: hard,
        soft_constraints: soft,
        required_monitors: monitors,
        compliance_artifacts: artifacts,
    };
    tracing::debug!(
        families = policy.eligible_families.len(),
        monitors = policy.required_monitors.len(),
        "generated feasibility policy"
    );
    policy
}
