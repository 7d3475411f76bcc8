//! Incline detector over the accelerometer stream

use log::debug;
use nalgebra::{ComplexField, Vector3};

use crate::math::RAD_TO_DEG;
use crate::SETTLE_SAMPLES;

/// Incline detector built on an exponential low-pass filter
///
/// Smooths the gravity vector and measures the angle between the
/// filtered Z axis and vertical; the trigger fires when that angle
/// exceeds the threshold.
///
/// # Example
/// ```
/// use lsm303dlhc_motion::InclineLowPass;
/// use nalgebra::Vector3;
///
/// let mut detector = InclineLowPass::new(0.3, 15.0);
/// let angle = detector.update(Vector3::new(0.0, 0.0, 1.0));
/// assert_eq!(angle, 0.0); // settle window still open
/// ```
#[derive(Debug, Clone)]
pub struct InclineLowPass {
    alpha: f32,
    delta: f32,
    settle: u8,
    filtered: Vector3<f32>,
}

impl InclineLowPass {
    /// Create a detector
    ///
    /// # Arguments
    /// * `alpha` - Low-pass coefficient in (0, 1)
    /// * `delta` - Angle limit in degrees; the absolute value is used
    pub fn new(alpha: f32, delta: f32) -> Self {
        InclineLowPass {
            alpha,
            delta,
            settle: 0,
            filtered: Vector3::zeros(),
        }
    }

    /// Feed one accelerometer sample, in g
    ///
    /// Returns the inclination angle in degrees when it exceeds the
    /// limit, otherwise 0.0.
    pub fn update(&mut self, input: Vector3<f32>) -> f32 {
        if self.settle == 0 {
            self.filtered = input;
            self.settle = 1;
            return 0.0;
        }

        self.filtered = input * self.alpha + self.filtered * (1.0 - self.alpha);

        if self.settle < SETTLE_SAMPLES {
            self.settle += 1;
            return 0.0;
        }

        let angle = (self.filtered.z / self.filtered.magnitude()).acos() * RAD_TO_DEG;
        if angle > self.delta.abs() {
            self.settle = 0;
            debug!(
                "incline {:.3}, {:.3}, {:.3}\tA: {:.2}",
                input.x, input.y, input.z, angle
            );
            return angle;
        }
        0.0
    }

    /// Restart the settle window
    pub fn reset(&mut self) {
        self.settle = 0;
    }
}
