use std::fmt;
use std::time::Duration;

use crate::time::SimTime;

use super::Simulation;

/// Builder for a process-oriented, discrete-event simulation.
pub struct SimInit {
    watchdog_period: Duration,
}

impl SimInit {
    /// Default sampling period of the idleness watchdog.
    pub const DEFAULT_WATCHDOG_PERIOD: Duration = Duration::from_millis(100);

    /// Creates a builder with the default watchdog period.
    pub fn new() -> Self {
        Self {
            watchdog_period: Self::DEFAULT_WATCHDOG_PERIOD,
        }
    }

    /// Sets the sampling period of the idleness watchdog.
    ///
    /// The watchdog declares the simulation idle when no event was delivered
    /// and virtual time did not move over a full period, so the period bounds
    /// how long a client may compute between two suspension points. Raise it
    /// for benches with wall-clock-heavy clients.
    pub fn set_watchdog_period(mut self, period: Duration) -> Self {
        self.watchdog_period = period;
        self
    }

    /// Builds a simulation initialized at the specified virtual time.
    pub fn init(self, start_time: SimTime) -> Simulation {
        Simulation::new(start_time, self.watchdog_period)
    }
}

impl Default for SimInit {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimInit {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("SimInit").finish_non_exhaustive()
    }
}
