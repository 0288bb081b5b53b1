//! Software Refresh Policies.
//!
//! A software controller only sees crossbar-wide counters: how many MVMs ran
//! since the array was last programmed, and how often it has been programmed
//! (writes plus refreshes). A `RefreshPolicy` turns these into the decision
//! whether the whole array is reprogrammed.

use crate::xbar::ReadDisturb;

/// Trait for software refresh triggers.
pub trait RefreshPolicy {
    /// Decides whether the crossbar is reprogrammed now.
    ///
    /// # Arguments
    ///
    /// * `rd` - Read disturb model, for policies that evaluate the drift equations.
    /// * `consecutive_mvms` - MVMs since the last write or refresh.
    /// * `programming_events` - Writes plus refreshes so far.
    fn needs_refresh(&self, rd: &ReadDisturb, consecutive_mvms: u64, programming_events: u64) -> bool;
}

/// Refreshes once the worst-case cell has lost more than `tolerance` of its conductance.
///
/// The worst-case cell is assumed to have been cycled on every programming
/// event and read on every MVM since the last one.
#[derive(Debug, Clone, Copy)]
pub struct WorstCaseDrift {
    pub tolerance: f64,
}

impl WorstCaseDrift {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl RefreshPolicy for WorstCaseDrift {
    fn needs_refresh(&self, rd: &ReadDisturb, consecutive_mvms: u64, programming_events: u64) -> bool {
        rd.calc_g0_scaling_factor(consecutive_mvms, programming_events) < 1.0 - self.tolerance
    }
}

/// Refreshes after a fixed number of MVMs, regardless of the device state.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    pub mvms: u64,
}

impl RefreshPolicy for FixedInterval {
    fn needs_refresh(&self, _rd: &ReadDisturb, consecutive_mvms: u64, _programming_events: u64) -> bool {
        consecutive_mvms >= self.mvms
    }
}
