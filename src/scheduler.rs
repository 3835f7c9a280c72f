//! Adaptive cycle scheduling.
//!
//! Erosion is the expensive part of a frame. The scheduler divides a fixed
//! base number of drops by a `rate` that tracks how long the last frame
//! took, so slow machines run fewer drops per frame and still hold the
//! target frame rate. Every `base_cycles` drops it also triggers a growth
//! cycle and a smoothing pass.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// Drops per frame at `rate == 1`, and drops between growth cycles
    pub base_cycles: usize,
    /// Frame rate the scheduler tries to hold
    pub target_fps: f64,
    /// Length of the time budget, in milliseconds
    pub frame_budget_ms: f64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            base_cycles: 250,
            target_fps: 60.0,
            frame_budget_ms: 1000.0,
        }
    }
}

impl SchedulerParams {
    pub fn validate(&self) -> Result<()> {
        if self.base_cycles == 0 {
            return Err(SimError::invalid("scheduler.base_cycles", "must be at least 1"));
        }
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            return Err(SimError::invalid("scheduler.target_fps", "must be positive"));
        }
        if !(self.frame_budget_ms.is_finite() && self.frame_budget_ms > 0.0) {
            return Err(SimError::invalid("scheduler.frame_budget_ms", "must be positive"));
        }
        Ok(())
    }
}

/// Work planned for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    /// Drops to simulate
    pub erodes: usize,
    /// Run a growth cycle and a smoothing pass after the drops
    pub grow: bool,
}

/// Frame-rate-aware drop budget.
///
/// The scheduler holds no clock; callers measure each frame and report it
/// with [`AdaptiveScheduler::record`].
#[derive(Clone, Debug)]
pub struct AdaptiveScheduler {
    params: SchedulerParams,
    rate: usize,
    accumulated: usize,
}

impl AdaptiveScheduler {
    pub fn new(params: SchedulerParams) -> Self {
        Self {
            params,
            rate: 1,
            accumulated: 0,
        }
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Current divisor of the base drop count, in `[1, base_cycles]`.
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Drops counted towards the next growth cycle.
    pub fn accumulated(&self) -> usize {
        self.accumulated
    }

    /// Drops per frame at the current rate, in `[1, base_cycles]`.
    pub fn erodes(&self) -> usize {
        (self.params.base_cycles / self.rate).max(1)
    }

    /// Plan the next frame and count its drops towards the growth cycle.
    pub fn plan_frame(&mut self) -> FramePlan {
        let erodes = self.erodes();
        let base = self.params.base_cycles;

        self.accumulated += erodes;
        let grow = self.accumulated > base;
        if grow {
            self.accumulated -= base;
        }

        FramePlan { erodes, grow }
    }

    /// Adjust the rate from how long a frame of `erodes` drops took.
    pub fn record(&mut self, erodes: usize, elapsed: Duration) {
        let base = self.params.base_cycles;
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        let estimate = base as f64 * elapsed_ms * self.params.target_fps
            / (self.params.frame_budget_ms * erodes.max(1) as f64);

        self.rate = if estimate.is_finite() {
            (estimate.floor().max(0.0) as usize).clamp(1, base)
        } else {
            base
        };
    }
}

impl Default for AdaptiveScheduler {
    fn default() -> Self {
        Self::new(SchedulerParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simulate frames where every drop costs `cost_ms`.
    fn run(scheduler: &mut AdaptiveScheduler, cost_ms: f64, frames: usize) -> Vec<f64> {
        let mut frame_times = Vec::new();
        for _ in 0..frames {
            let plan = scheduler.plan_frame();
            let elapsed_ms = plan.erodes as f64 * cost_ms;
            scheduler.record(plan.erodes, Duration::from_secs_f64(elapsed_ms / 1000.0));
            frame_times.push(elapsed_ms);
        }
        frame_times
    }

    #[test]
    fn test_converges_to_target_frame_time() {
        let mut scheduler = AdaptiveScheduler::default();
        let times = run(&mut scheduler, 0.3667, 20);

        assert_eq!(scheduler.rate(), 5);
        assert_eq!(scheduler.erodes(), 50);
        let target = 1000.0 / 60.0;
        let last = *times.last().unwrap();
        assert!((last - target).abs() / target < 0.25, "frame took {last} ms");
    }

    #[test]
    fn test_erodes_stay_in_range() {
        let mut slow = AdaptiveScheduler::default();
        run(&mut slow, 1000.0, 5);
        assert_eq!(slow.erodes(), 1);

        let mut fast = AdaptiveScheduler::default();
        run(&mut fast, 0.0, 5);
        assert_eq!(fast.rate(), 1);
        assert_eq!(fast.erodes(), 250);
    }

    #[test]
    fn test_growth_fires_every_base_cycles() {
        let mut scheduler = AdaptiveScheduler::default();
        scheduler.record(250, Duration::from_secs_f64(0.1667 * 250.0 / 1000.0 * 3.0));
        // rate is now 7, 35 drops per frame
        assert_eq!(scheduler.erodes(), 35);

        let mut grown = 0;
        let mut drops = 0;
        for _ in 0..100 {
            let plan = scheduler.plan_frame();
            drops += plan.erodes;
            if plan.grow {
                grown += 1;
            }
        }
        assert_eq!(drops, 3500);
        assert_eq!(grown, 13);
        assert!(scheduler.accumulated() <= 250);
    }
}
