//! Jury composition.
//!
//! [`RoleBalancer`] fills the supervisor, reviewer and president seats of
//! each defense under a per-person cap and then evens out reviewer and
//! president counts against supervision counts. [`WorkloadStats`] is the
//! per-person tally both phases work from.

mod balancer;
mod workload;

pub use balancer::{BalanceConfig, BalanceReport, FailurePolicy, RoleBalancer};
pub use workload::{PersonLoad, WorkloadStats};
