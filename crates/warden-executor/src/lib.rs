//! Resource-bounded execution: a sequential step loop with per-step
//! accounting and a deterministic kill-switch, plus the training planner that
//! estimates a run before it is approved.

pub mod cost_model;
pub mod executor;
pub mod metrics;
pub mod planner;

pub use cost_model::{DefaultCostModel, StepCost, StepCostModel};
pub use executor::{ExecutionHandle, Executor, ProgressCallback, StepRunner};
pub use metrics::{first_breach, Breach};
pub use planner::{estimate_training, plan_training};
