//! Execution safety gate and monitoring attacher: the final checks and
//! obligations applied between candidate selection and training execution.

pub mod gate;
pub mod monitors;

pub use gate::{create_safety_report, validate_for_execution, GateDecision, SafetyReport};
pub use monitors::{attach_monitors, MonitorSpec};
