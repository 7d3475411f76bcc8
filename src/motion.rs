//! Motion detectors over the accelerometer stream
//!
//! Both detectors smooth the raw axis triple and compare the estimate
//! against a snapshot latched at the end of the settle window; the
//! Euclidean distance between the two is the trigger magnitude. A
//! trigger re-arms the settle window, so a sustained pose change fires
//! once rather than continuously.

use log::debug;
use nalgebra::Vector3;

use crate::kalman::{self, KalmanSettings};
use crate::SETTLE_SAMPLES;

/// Motion detector built on an exponential low-pass filter
///
/// The low-pass stage suppresses shocks so only sustained motion
/// produces a trigger.
///
/// # Example
/// ```
/// use lsm303dlhc_motion::MotionLowPass;
/// use nalgebra::Vector3;
///
/// let mut detector = MotionLowPass::new(0.3, 0.05, 0);
/// let trigger = detector.update(Vector3::new(0.0, 0.0, 1.0));
/// assert_eq!(trigger, 0.0); // settle window still open
/// ```
#[derive(Debug, Clone)]
pub struct MotionLowPass {
    alpha: f32,
    delta: f32,
    sample: u8,
    settle: u8,
    decimate: u8,
    filtered: Vector3<f32>,
    snapshot: Vector3<f32>,
}

impl MotionLowPass {
    /// Create a detector
    ///
    /// # Arguments
    /// * `alpha` - Low-pass coefficient in (0, 1); see [`alpha`](crate::alpha)
    /// * `delta` - Trigger threshold in g
    /// * `sample` - Samples skipped between trigger checks (0 checks every sample)
    pub fn new(alpha: f32, delta: f32, sample: u8) -> Self {
        MotionLowPass {
            alpha,
            delta,
            sample,
            settle: 0,
            decimate: 0,
            filtered: Vector3::zeros(),
            snapshot: Vector3::zeros(),
        }
    }

    /// Feed one accelerometer sample, in g
    ///
    /// Returns the trigger magnitude, or 0.0 while settling, between
    /// decimated checks, and when no motion is detected.
    pub fn update(&mut self, input: Vector3<f32>) -> f32 {
        if self.settle == 0 {
            self.filtered = input;
            self.settle = 1;
            return 0.0;
        }

        self.filtered = input * self.alpha + self.filtered * (1.0 - self.alpha);

        if self.settle < SETTLE_SAMPLES {
            self.snapshot = self.filtered;
            self.settle += 1;
            return 0.0;
        }

        if self.decimate < self.sample {
            self.decimate += 1;
            return 0.0;
        }
        self.decimate = 0;

        let magnitude = (self.filtered - self.snapshot).magnitude();
        if magnitude > self.delta {
            self.settle = 0;
            debug!(
                "motion {:.3}, {:.3}, {:.3}\tD: {:.3}",
                input.x, input.y, input.z, magnitude
            );
            return magnitude;
        }
        0.0
    }

    /// Restart the settle window
    pub fn reset(&mut self) {
        self.settle = 0;
    }
}

/// Motion detector built on a per-axis scalar Kalman filter
///
/// Same snapshot-distance trigger as [`MotionLowPass`], with an upper
/// bound on the trigger magnitude: changes of 1.0 g or more between
/// snapshots are discarded as implausible spikes.
#[derive(Debug, Clone)]
pub struct MotionKalman {
    settings: KalmanSettings,
    delta: f32,
    sample: u8,
    settle: u8,
    decimate: u8,
    estimate: Vector3<f32>,
    error: Vector3<f32>,
    snapshot: Vector3<f32>,
}

/// Trigger magnitudes at or above this bound are rejected
const SPIKE_BOUND: f32 = 1.0;

impl MotionKalman {
    /// Create a detector
    ///
    /// # Arguments
    /// * `settings` - Kalman tuning, applied per axis
    /// * `delta` - Trigger threshold in g
    /// * `sample` - Samples skipped between trigger checks
    pub fn new(settings: KalmanSettings, delta: f32, sample: u8) -> Self {
        MotionKalman {
            settings,
            delta,
            sample,
            settle: 0,
            decimate: 0,
            estimate: Vector3::zeros(),
            error: Vector3::zeros(),
            snapshot: Vector3::zeros(),
        }
    }

    /// Feed one accelerometer sample, in g
    pub fn update(&mut self, input: Vector3<f32>) -> f32 {
        if self.settle == 0 {
            self.estimate = input;
            self.error = Vector3::repeat(self.settings.initial_error);
            self.settle = 1;
            return 0.0;
        }

        for i in 0..3 {
            kalman::step(
                &mut self.estimate[i],
                &mut self.error[i],
                input[i],
                &self.settings,
            );
        }

        if self.settle < SETTLE_SAMPLES {
            self.snapshot = self.estimate;
            self.settle += 1;
            return 0.0;
        }

        if self.decimate < self.sample {
            self.decimate += 1;
            return 0.0;
        }
        self.decimate = 0;

        let magnitude = (self.estimate - self.snapshot).magnitude();
        if magnitude > self.delta && magnitude < SPIKE_BOUND {
            self.settle = 0;
            debug!(
                "motion {:.3}, {:.3}, {:.3}\tD: {:.3}",
                input.x, input.y, input.z, magnitude
            );
            return magnitude;
        }
        0.0
    }

    /// Restart the settle window
    pub fn reset(&mut self) {
        self.settle = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);

    #[test]
    fn test_low_pass_settle_window() {
        let mut detector = MotionLowPass::new(0.5, 0.01, 0);
        for _ in 0..SETTLE_SAMPLES {
            assert_eq!(detector.update(REST), 0.0);
        }
        // Steady input keeps the trigger at zero after settling too.
        for _ in 0..100 {
            assert_eq!(detector.update(REST), 0.0);
        }
    }

    #[test]
    fn test_low_pass_step_triggers() {
        let mut detector = MotionLowPass::new(0.5, 0.05, 0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(REST);
        }

        // Step the input well past delta; with alpha = 0.5 the estimate
        // moves half the step on the first post-settle sample.
        let moved = Vector3::new(0.5, 0.0, 1.0);
        let trigger = detector.update(moved);
        assert!(trigger > 0.05, "trigger = {}", trigger);
    }

    #[test]
    fn test_low_pass_rearms_after_trigger() {
        let mut detector = MotionLowPass::new(0.5, 0.05, 0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(REST);
        }
        let moved = Vector3::new(0.5, 0.0, 1.0);
        assert!(detector.update(moved) > 0.0);

        // The next call reseeds the filter, so the settle window is open
        // again and nothing can trigger for another 32 samples.
        for _ in 0..SETTLE_SAMPLES {
            assert_eq!(detector.update(moved), 0.0);
        }
    }

    #[test]
    fn test_low_pass_decimation() {
        let mut detector = MotionLowPass::new(0.9, 0.05, 4);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(REST);
        }
        let moved = Vector3::new(0.5, 0.0, 1.0);
        // Four decimated calls return zero even though the step is large.
        for _ in 0..4 {
            assert_eq!(detector.update(moved), 0.0);
        }
        assert!(detector.update(moved) > 0.0);
    }

    #[test]
    fn test_kalman_steady_input_no_trigger() {
        let mut detector = MotionKalman::new(KalmanSettings::default(), 0.05, 0);
        for _ in 0..200 {
            assert_eq!(detector.update(REST), 0.0);
        }
    }

    #[test]
    fn test_kalman_step_triggers() {
        let mut detector = MotionKalman::new(KalmanSettings::default(), 0.05, 0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(REST);
        }
        let moved = Vector3::new(0.5, 0.0, 1.0);
        let mut trigger = 0.0;
        for _ in 0..10 {
            trigger = detector.update(moved);
            if trigger > 0.0 {
                break;
            }
        }
        assert!(trigger > 0.05, "trigger = {}", trigger);
        assert!(trigger < 1.0);
    }

    #[test]
    fn test_kalman_spike_bound_rejects_large_steps() {
        let mut detector = MotionKalman::new(KalmanSettings::default(), 0.05, 0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(REST);
        }
        // A step so large the snapshot distance lands past the bound is
        // ignored and the detector stays armed.
        let shock = Vector3::new(10.0, 0.0, 1.0);
        assert_eq!(detector.update(shock), 0.0);
    }
}
