//! Magnetic field distortion detectors
//!
//! Both detectors watch the magnetometer stream for deviations from its
//! recent history: a ferrous object moving near the sensor shows up as a
//! short-lived swing that the detectors isolate from the slowly varying
//! ambient field.

use log::debug;
use nalgebra::{ComplexField, Vector3};

use crate::SETTLE_SAMPLES;

/// Distortion detector built on a high-pass filter
///
/// The high-pass stage tracks the fast component of the field; the
/// magnitude of (input − filtered) is averaged into a baseline during the
/// settle window, and a trigger fires when the instantaneous magnitude
/// strays from that baseline by more than `delta`.
#[derive(Debug, Clone)]
pub struct DistortionHighPass {
    alpha: f32,
    delta: f32,
    settle: u8,
    input: Vector3<f32>,
    output: Vector3<f32>,
    baseline: f32,
}

impl DistortionHighPass {
    /// Create a detector
    ///
    /// # Arguments
    /// * `alpha` - High-pass coefficient in (0, 1)
    /// * `delta` - Trigger threshold in field units
    pub fn new(alpha: f32, delta: f32) -> Self {
        DistortionHighPass {
            alpha,
            delta,
            settle: 0,
            input: Vector3::zeros(),
            output: Vector3::zeros(),
            baseline: 0.0,
        }
    }

    /// Feed one magnetometer sample
    ///
    /// Returns the deviation from the settled baseline, or 0.0 while
    /// settling and when the field is undisturbed.
    pub fn update(&mut self, sample: Vector3<f32>) -> f32 {
        self.output = (self.output + sample - self.input) * self.alpha;
        self.input = sample;

        let magnitude = (self.input - self.output).magnitude();

        if self.settle == 0 {
            self.baseline = magnitude;
            self.settle = 1;
            return 0.0;
        }
        if self.settle < SETTLE_SAMPLES {
            self.baseline = magnitude * self.alpha + self.baseline * (1.0 - self.alpha);
            self.settle += 1;
            return 0.0;
        }

        let deviation = (self.baseline - magnitude).abs();
        if deviation > self.delta {
            self.settle = 0;
            debug!(
                "distortion {:.3}, {:.3}, {:.3}\tM: {:.3} m: {:.3} D: {:.3}",
                sample.x, sample.y, sample.z, self.baseline, magnitude, deviation
            );
            return deviation;
        }
        0.0
    }

    /// Restart the settle window; the filter memory is kept
    pub fn reset(&mut self) {
        self.settle = 0;
    }
}

/// Distortion detector built on a running-average low-pass filter
///
/// Tracks the deviation of each sample from the running average of the
/// stream, taken before the average absorbs the sample.
#[derive(Debug, Clone)]
pub struct DistortionLowPass {
    alpha: f32,
    delta: f32,
    settle: u8,
    average: Vector3<f32>,
}

impl DistortionLowPass {
    /// Create a detector
    ///
    /// # Arguments
    /// * `alpha` - Low-pass coefficient in (0, 1); smaller smooths harder
    /// * `delta` - Trigger threshold in field units
    pub fn new(alpha: f32, delta: f32) -> Self {
        DistortionLowPass {
            alpha,
            delta,
            settle: 0,
            average: Vector3::zeros(),
        }
    }

    /// Feed one magnetometer sample
    pub fn update(&mut self, sample: Vector3<f32>) -> f32 {
        if self.settle == 0 {
            self.average = sample;
            self.settle = 1;
            return 0.0;
        }

        let deviation = sample - self.average;
        self.average = sample * self.alpha + self.average * (1.0 - self.alpha);

        if self.settle < SETTLE_SAMPLES {
            self.settle += 1;
            return 0.0;
        }

        let magnitude = deviation.magnitude();
        if magnitude > self.delta {
            self.settle = 0;
            debug!(
                "distortion {:.3}, {:.3}, {:.3}\tD: {:.3}",
                sample.x, sample.y, sample.z, magnitude
            );
            return magnitude;
        }
        0.0
    }

    /// Restart the settle window; the running average is kept
    pub fn reset(&mut self) {
        self.settle = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD: Vector3<f32> = Vector3::new(25.0, 0.0, -40.0);

    #[test]
    fn test_high_pass_steady_field_no_trigger() {
        let mut detector = DistortionHighPass::new(0.5, 1.0);
        for _ in 0..200 {
            assert_eq!(detector.update(FIELD), 0.0);
        }
    }

    #[test]
    fn test_high_pass_disturbance_triggers() {
        let mut detector = DistortionHighPass::new(0.5, 1.0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(FIELD);
        }
        let disturbed = FIELD + Vector3::new(30.0, -20.0, 10.0);
        let trigger = detector.update(disturbed);
        assert!(trigger > 1.0, "trigger = {}", trigger);
    }

    #[test]
    fn test_high_pass_rearms_after_trigger() {
        let mut detector = DistortionHighPass::new(0.5, 1.0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(FIELD);
        }
        let disturbed = FIELD + Vector3::new(30.0, -20.0, 10.0);
        assert!(detector.update(disturbed) > 0.0);
        // The baseline reseeds on the next call; another settle window
        // must pass before the detector can fire again.
        assert_eq!(detector.update(disturbed), 0.0);
        assert_eq!(detector.update(FIELD), 0.0);
    }

    #[test]
    fn test_low_pass_steady_field_no_trigger() {
        let mut detector = DistortionLowPass::new(0.1, 1.0);
        for _ in 0..200 {
            assert_eq!(detector.update(FIELD), 0.0);
        }
    }

    #[test]
    fn test_low_pass_step_triggers() {
        let mut detector = DistortionLowPass::new(0.1, 1.0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(FIELD);
        }
        let disturbed = FIELD + Vector3::new(10.0, 0.0, 0.0);
        // Deviation is measured against the average before it moves, so
        // the full step is visible immediately.
        let trigger = detector.update(disturbed);
        assert!((trigger - 10.0).abs() < 1e-3, "trigger = {}", trigger);
    }

    #[test]
    fn test_low_pass_below_threshold_stays_quiet() {
        let mut detector = DistortionLowPass::new(0.1, 5.0);
        for _ in 0..SETTLE_SAMPLES {
            detector.update(FIELD);
        }
        let nudged = FIELD + Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(detector.update(nudged), 0.0);
    }
}
