//! Limit checking over accumulated execution metrics.

use warden_types::{ExecutionMetrics, ResourceKind, ResourceLimits};

/// A detected limit breach: which resource, its limit, and the current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub resource: ResourceKind,
    pub limit: f64,
    pub current: f64,
}

/// The first breached limit, checked in a fixed order: cost, carbon, memory,
/// duration. Returns `None` when everything is within bounds.
pub fn first_breach(metrics: &ExecutionMetrics, limits: &ResourceLimits) -> Option<Breach> {
    if metrics.cost_usd > limits.max_cost_usd {
        return Some(Breach {
            resource: ResourceKind::Cost,
            limit: limits.max_cost_usd,
            current: metrics.cost_usd,
        });
    }
    if metrics.carbon_kg > limits.max_carbon_kg {
        return Some(Breach {
            resource: ResourceKind::Carbon,
            limit: limits.max_carbon_kg,
            current: metrics.carbon_kg,
        });
    }
    if metrics.memory_mb > limits.max_memory_mb {
        return Some(Breach {
            resource: ResourceKind::Memory,
            limit: limits.max_memory_mb,
            current: metrics.memory_mb,
        });
    }
    if metrics.duration_ms > limits.max_duration_ms {
        return Some(Breach {
            resource: ResourceKind::Duration,
            limit: limits.max_duration_ms as f64,
            current: metrics.duration_ms as f64,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ResourceLimits {
        ResourceLimits {
            max_cost_usd: 1.0,
            max_carbon_kg: 0.1,
            max_memory_mb: 1024.0,
            max_duration_ms: 60_000,
        }
    }

    #[test]
    fn within_limits_is_clean() {
        let metrics = ExecutionMetrics {
            cost_usd: 0.5,
            carbon_kg: 0.05,
            memory_mb: 512.0,
            duration_ms: 1000,
            steps_completed: 3,
        };
        assert_eq!(first_breach(&metrics, &limits()), None);
    }

    #[test]
    fn exactly_at_limit_is_not_a_breach() {
        let metrics = ExecutionMetrics {
            cost_usd: 1.0,
            ..Default::default()
        };
        assert_eq!(first_breach(&metrics, &limits()), None);
    }

    #[test]
    fn cost_is_checked_before_carbon() {
        let metrics = ExecutionMetrics {
            cost_usd: 2.0,
            carbon_kg: 0.5,
            ..Default::default()
        };
        let breach = first_breach(&metrics, &limits()).unwrap();
        assert_eq!(breach.resource, ResourceKind::Cost);
        assert_eq!(breach.current, 2.0);
        assert_eq!(breach.limit, 1.0);
    }

    #[test]
    fn duration_breach_is_detected_last() {
        let metrics = ExecutionMetrics {
            duration_ms: 120_000,
            ..Default::default()
        };
        let breach = first_breach(&metrics, &limits()).unwrap();
        assert_eq!(breach.resource, ResourceKind::Duration);
    }
}
