//! Pluggable per-step cost model. The executor never measures real spend; it
//! accounts estimates from this seam so tests can substitute exact values.

use warden_types::ComponentKind;

/// Estimated footprint of running one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCost {
    pub cost_usd: f64,
    pub carbon_kg: f64,
    pub memory_mb: f64,
}

pub trait StepCostModel: Send + Sync {
    fn step_cost(&self, kind: ComponentKind) -> StepCost;
}

/// Deterministic defaults keyed by component kind. Carbon scales at
/// 0.1 kg per USD.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCostModel;

const CARBON_PER_USD: f64 = 0.1;

impl StepCostModel for DefaultCostModel {
    fn step_cost(&self, kind: ComponentKind) -> StepCost {
        let (cost_usd, memory_mb) = match kind {
            ComponentKind::Source => (0.001, 64.0),
            ComponentKind::Transform => (0.005, 128.0),
            ComponentKind::Model => (0.05, 512.0),
            ComponentKind::Sink => (0.001, 32.0),
            ComponentKind::Monitor => (0.002, 16.0),
        };
        StepCost {
            cost_usd,
            carbon_kg: cost_usd * CARBON_PER_USD,
            memory_mb,
        }
    }
}
