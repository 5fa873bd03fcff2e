//! Monitoring attacher: instantiates the monitors an approved execution must
//! carry, with thresholds derived from the candidate's estimates.

use serde::{Deserialize, Serialize};
use warden_types::{ComplianceTier, Constraints, MonitorKind, PipelineCandidate};

/// Headroom applied to estimate-derived thresholds.
const THRESHOLD_MARGIN: f64 = 1.1;
/// Fixed KL-divergence threshold for drift detection.
const DRIFT_KL_THRESHOLD: f64 = 0.1;
/// Minimum sustained requests per second before the throughput monitor fires.
const THROUGHPUT_MIN_RPS: f64 = 10.0;

/// An instantiated monitor, ready to hand to the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSpec {
    pub kind: MonitorKind,
    pub threshold: f64,
    pub unit: String,
    /// Detection method for monitors that are not simple threshold checks.
    pub method: Option<String>,
    /// Named metrics tracked, for monitors that aggregate several.
    pub metrics: Vec<String>,
}

/// Attach monitors per the approved constraints. Cost and latency always;
/// carbon for tight carbon budgets; drift and fairness for regulated tiers
/// (fairness only at the highest); throughput for low-latency targets.
pub fn attach_monitors(
    candidate: &PipelineCandidate,
    constraints: &Constraints,
) -> Vec<MonitorSpec> {
    let mut monitors = vec![
        MonitorSpec {
            kind: MonitorKind::Cost,
            threshold: candidate.estimated_cost_usd * THRESHOLD_MARGIN,
            unit: "usd".into(),
            method: None,
            metrics: vec![],
        },
        MonitorSpec {
            kind: MonitorKind::Latency,
            threshold: candidate.estimated_latency_ms as f64 * THRESHOLD_MARGIN,
            unit: "ms".into(),
            method: None,
            metrics: vec![],
        },
    ];

    if constraints.max_carbon_kg < 1.0 {
        monitors.push(MonitorSpec {
            kind: MonitorKind::Carbon,
            threshold: candidate.estimated_carbon_kg * THRESHOLD_MARGIN,
            unit: "kg".into(),
            method: None,
            metrics: vec![],
        });
    }
    if constraints.compliance >= ComplianceTier::Regulated {
        monitors.push(MonitorSpec {
            kind: MonitorKind::Drift,
            threshold: DRIFT_KL_THRESHOLD,
            unit: "nats".into(),
            method: Some("kl_divergence".into()),
            metrics: vec![],
        });
    }
    if constraints.compliance == ComplianceTier::HighlyRegulated {
        monitors.push(MonitorSpec {
            kind: MonitorKind::Fairness,
            threshold: DRIFT_KL_THRESHOLD,
            unit: "ratio".into(),
            method: None,
            metrics: vec!["demographic_parity".into(), "equalized_odds".into()],
        });
    }
    if constraints.max_latency_ms < 1000 {
        monitors.push(MonitorSpec {
            kind: MonitorKind::Throughput,
            threshold: THROUGHPUT_MIN_RPS,
            unit: "rps".into(),
            method: None,
            metrics: vec![],
        });
    }

    tracing::debug!(
        candidate = %candidate.name,
        count = monitors.len(),
        "attached monitors"
    );
    monitors
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use warden_types::{HardwareClass, ModelFamily};

    fn candidate() -> PipelineCandidate {
        PipelineCandidate {
            id: Uuid::new_v4(),
            name: "c".into(),
            description: String::new(),
            model_families: vec![ModelFamily::Classical],
            estimated_cost_usd: 1.0,
            estimated_carbon_kg: 0.1,
            estimated_latency_ms: 200,
            estimated_accuracy: 0.8,
            components: vec![],
            feasibility_score: 0.9,
            violations: vec![],
        }
    }

    fn constraints(compliance: ComplianceTier, carbon: f64, latency: u64) -> Constraints {
        Constraints {
            max_cost_usd: 10.0,
            max_carbon_kg: carbon,
            max_latency_ms: latency,
            min_accuracy: 0.7,
            compliance,
            max_model_size_mb: None,
            hardware: HardwareClass::Cpu,
        }
    }

    fn kinds(monitors: &[MonitorSpec]) -> Vec<MonitorKind> {
        monitors.iter().map(|m| m.kind).collect()
    }

    #[test]
    fn cost_and_latency_are_always_attached() {
        let monitors = attach_monitors(&candidate(), &constraints(ComplianceTier::None, 5.0, 5000));
        assert_eq!(kinds(&monitors), vec![MonitorKind::Cost, MonitorKind::Latency]);
    }

    #[test]
    fn thresholds_carry_ten_percent_headroom() {
        let monitors = attach_monitors(&candidate(), &constraints(ComplianceTier::None, 5.0, 5000));
        let cost = monitors.iter().find(|m| m.kind == MonitorKind::Cost).unwrap();
        assert!((cost.threshold - 1.1).abs() < 1e-9);
        let latency = monitors
            .iter()
            .find(|m| m.kind == MonitorKind::Latency)
            .unwrap();
        assert!((latency.threshold - 220.0).abs() < 1e-9);
    }

    #[test]
    fn tight_carbon_budget_attaches_carbon_monitor() {
        let monitors = attach_monitors(&candidate(), &constraints(ComplianceTier::None, 0.5, 5000));
        assert!(kinds(&monitors).contains(&MonitorKind::Carbon));
    }

    #[test]
    fn regulated_gets_drift_but_not_fairness() {
        let monitors =
            attach_monitors(&candidate(), &constraints(ComplianceTier::Regulated, 5.0, 5000));
        let drift = monitors.iter().find(|m| m.kind == MonitorKind::Drift).unwrap();
        assert_eq!(drift.method.as_deref(), Some("kl_divergence"));
        assert!(!kinds(&monitors).contains(&MonitorKind::Fairness));
    }

    #[test]
    fn highly_regulated_adds_fairness_metrics() {
        let monitors = attach_monitors(
            &candidate(),
            &constraints(ComplianceTier::HighlyRegulated, 5.0, 5000),
        );
        let fairness = monitors
            .iter()
            .find(|m| m.kind == MonitorKind::Fairness)
            .unwrap();
        assert_eq!(
            fairness.metrics,
            vec!["demographic_parity".to_string(), "equalized_odds".to_string()]
        );
    }

    #[test]
    fn low_latency_target_attaches_throughput() {
        let monitors = attach_monitors(&candidate(), &constraints(ComplianceTier::None, 5.0, 500));
        let throughput = monitors
            .iter()
            .find(|m| m.kind == MonitorKind::Throughput)
            .unwrap();
        assert_eq!(throughput.threshold, THROUGHPUT_MIN_RPS);
    }
}
