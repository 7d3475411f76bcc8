//! Orientation estimation from filtered accelerometer and magnetometer
//! samples
//!
//! Two interchangeable estimators share one contract: feed both axis
//! triples every cycle and receive pitch, roll and tilt-compensated yaw
//! once the settle window has passed. Pitch and roll come from the
//! gravity direction; yaw projects the magnetic field onto the horizontal
//! plane before taking its angle, so the heading holds steady while the
//! body tilts.

use log::debug;
use nalgebra::{ComplexField, RealField, Vector3};

use crate::kalman::{self, KalmanSettings};
use crate::math::{Vector3Ext, RAD_TO_DEG};
use crate::SETTLE_SAMPLES;

/// Estimated attitude in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Rotation about the Y axis
    pub pitch: f32,
    /// Rotation about the X axis
    pub roll: f32,
    /// Tilt-compensated magnetic heading
    pub yaw: f32,
}

/// Compute the attitude from the filtered vectors
///
/// Normalization happens in place: the filter state itself is scaled to
/// unit length, matching the recurrence the estimators were tuned with.
fn resolve(accel: &mut Vector3<f32>, mag: &mut Vector3<f32>) -> Orientation {
    let pitch = accel.x.atan2((accel.y * accel.y + accel.z * accel.z).sqrt()) * RAD_TO_DEG;
    let roll = accel.y.atan2((accel.x * accel.x + accel.z * accel.z).sqrt()) * RAD_TO_DEG;

    *accel = accel.safe_normalize();
    *mag = mag.safe_normalize();

    // Horizontal projection of the magnetic field.
    let mx = mag.x * accel.z - mag.z * accel.x;
    let my = mag.y * accel.z - mag.z * accel.y;
    let yaw = my.atan2(mx) * RAD_TO_DEG;

    debug!("pitch: {:.2}, roll: {:.2}, yaw: {:.2}", pitch, roll, yaw);
    Orientation { pitch, roll, yaw }
}

/// Orientation estimator built on exponential low-pass filters
///
/// # Example
/// ```
/// use lsm303dlhc_motion::LowPassEstimator;
/// use nalgebra::Vector3;
///
/// let mut estimator = LowPassEstimator::new(0.239);
/// let accel = Vector3::new(0.0, 0.0, 1.0); // level, gravity on Z
/// let mag = Vector3::new(1.0, 0.0, 0.0);   // pointing north
///
/// let mut attitude = None;
/// for _ in 0..40 {
///     attitude = estimator.update(accel, mag);
/// }
/// let attitude = attitude.unwrap();
/// assert!(attitude.pitch.abs() < 1.0);
/// assert!(attitude.roll.abs() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct LowPassEstimator {
    alpha: f32,
    settle: u8,
    accel: Vector3<f32>,
    mag: Vector3<f32>,
}

impl LowPassEstimator {
    /// Create an estimator
    ///
    /// # Arguments
    /// * `alpha` - Low-pass coefficient in (0, 1); smaller smooths harder
    pub fn new(alpha: f32) -> Self {
        LowPassEstimator {
            alpha,
            settle: 0,
            accel: Vector3::zeros(),
            mag: Vector3::zeros(),
        }
    }

    /// Feed one pair of samples
    ///
    /// Returns `None` until the settle window has passed.
    pub fn update(&mut self, accel: Vector3<f32>, mag: Vector3<f32>) -> Option<Orientation> {
        if self.settle == 0 {
            self.accel = accel;
            self.mag = mag;
            self.settle = 1;
            return None;
        }

        self.accel = accel * self.alpha + self.accel * (1.0 - self.alpha);
        self.mag = mag * self.alpha + self.mag * (1.0 - self.alpha);

        if self.settle < SETTLE_SAMPLES {
            self.settle += 1;
            return None;
        }

        Some(resolve(&mut self.accel, &mut self.mag))
    }

    /// Restart the settle window
    pub fn reset(&mut self) {
        self.settle = 0;
    }
}

/// Orientation estimator built on per-component scalar Kalman filters
///
/// One [`KalmanSettings`] triple is shared by all six filtered
/// components (three accelerometer, three magnetometer).
#[derive(Debug, Clone)]
pub struct KalmanEstimator {
    settings: KalmanSettings,
    settle: u8,
    accel: Vector3<f32>,
    mag: Vector3<f32>,
    accel_error: Vector3<f32>,
    mag_error: Vector3<f32>,
}

impl KalmanEstimator {
    /// Create an estimator
    pub fn new(settings: KalmanSettings) -> Self {
        KalmanEstimator {
            settings,
            settle: 0,
            accel: Vector3::zeros(),
            mag: Vector3::zeros(),
            accel_error: Vector3::zeros(),
            mag_error: Vector3::zeros(),
        }
    }

    /// Feed one pair of samples
    ///
    /// Returns `None` until the settle window has passed.
    pub fn update(&mut self, accel: Vector3<f32>, mag: Vector3<f32>) -> Option<Orientation> {
        if self.settle == 0 {
            self.accel = accel;
            self.mag = mag;
            self.accel_error = Vector3::repeat(self.settings.initial_error);
            self.mag_error = Vector3::repeat(self.settings.initial_error);
            self.settle = 1;
            return None;
        }

        for i in 0..3 {
            kalman::step(
                &mut self.accel[i],
                &mut self.accel_error[i],
                accel[i],
                &self.settings,
            );
            kalman::step(
                &mut self.mag[i],
                &mut self.mag_error[i],
                mag[i],
                &self.settings,
            );
        }

        if self.settle < SETTLE_SAMPLES {
            self.settle += 1;
            return None;
        }

        Some(resolve(&mut self.accel, &mut self.mag))
    }

    /// Restart the settle window
    pub fn reset(&mut self) {
        self.settle = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);
    const NORTH: Vector3<f32> = Vector3::new(1.0, 0.0, 0.0);

    fn settle_low_pass(estimator: &mut LowPassEstimator, accel: Vector3<f32>, mag: Vector3<f32>) {
        for _ in 0..SETTLE_SAMPLES {
            assert!(estimator.update(accel, mag).is_none());
        }
    }

    #[test]
    fn test_settle_window_length() {
        let mut estimator = LowPassEstimator::new(0.239);
        for _ in 0..SETTLE_SAMPLES {
            assert!(estimator.update(LEVEL, NORTH).is_none());
        }
        assert!(estimator.update(LEVEL, NORTH).is_some());

        let mut kalman = KalmanEstimator::new(KalmanSettings::default());
        for _ in 0..SETTLE_SAMPLES {
            assert!(kalman.update(LEVEL, NORTH).is_none());
        }
        assert!(kalman.update(LEVEL, NORTH).is_some());
    }

    #[test]
    fn test_level_north_attitude() {
        let mut estimator = LowPassEstimator::new(0.239);
        settle_low_pass(&mut estimator, LEVEL, NORTH);
        let attitude = estimator.update(LEVEL, NORTH).unwrap();
        assert!(attitude.pitch.abs() < 0.5, "pitch = {}", attitude.pitch);
        assert!(attitude.roll.abs() < 0.5, "roll = {}", attitude.roll);
        assert!(attitude.yaw.abs() < 0.5, "yaw = {}", attitude.yaw);
    }

    #[test]
    fn test_yaw_cardinal_directions() {
        // Field along +Y reads 90°, along -X ±180°, along -Y -90°.
        let cases = [
            (Vector3::new(0.0, 1.0, 0.0), 90.0),
            (Vector3::new(0.0, -1.0, 0.0), -90.0),
        ];
        for (mag, expected) in cases {
            let mut estimator = LowPassEstimator::new(0.5);
            settle_low_pass(&mut estimator, LEVEL, mag);
            let attitude = estimator.update(LEVEL, mag).unwrap();
            assert!(
                (attitude.yaw - expected).abs() < 1.0,
                "yaw = {}, expected {}",
                attitude.yaw,
                expected
            );
        }

        let south = Vector3::new(-1.0, 0.0, 0.0);
        let mut estimator = LowPassEstimator::new(0.5);
        settle_low_pass(&mut estimator, LEVEL, south);
        let attitude = estimator.update(LEVEL, south).unwrap();
        assert!((attitude.yaw.abs() - 180.0).abs() < 1.0, "yaw = {}", attitude.yaw);
    }

    #[test]
    fn test_pitch_from_tilt() {
        // 30° pitch: gravity splits between X and Z.
        let tilted = Vector3::new(0.5, 0.0, 0.866);
        let mut estimator = LowPassEstimator::new(0.5);
        settle_low_pass(&mut estimator, tilted, NORTH);
        let attitude = estimator.update(tilted, NORTH).unwrap();
        assert!((attitude.pitch - 30.0).abs() < 1.0, "pitch = {}", attitude.pitch);
        assert!(attitude.roll.abs() < 1.0);
    }

    #[test]
    fn test_yaw_is_tilt_compensated() {
        let field = Vector3::new(1.0, 0.0, 0.5);

        let mut level = LowPassEstimator::new(0.5);
        settle_low_pass(&mut level, LEVEL, field);
        let level_yaw = level.update(LEVEL, field).unwrap().yaw;

        let tilted_accel = Vector3::new(0.2, 0.0, 0.98);
        let mut tilted = LowPassEstimator::new(0.5);
        settle_low_pass(&mut tilted, tilted_accel, field);
        let tilted_yaw = tilted.update(tilted_accel, field).unwrap().yaw;

        assert!(
            (level_yaw - tilted_yaw).abs() < 5.0,
            "level = {}, tilted = {}",
            level_yaw,
            tilted_yaw
        );
    }

    #[test]
    fn test_kalman_level_north_attitude() {
        let mut estimator = KalmanEstimator::new(KalmanSettings::default());
        let mut attitude = None;
        for _ in 0..SETTLE_SAMPLES + 1 {
            attitude = estimator.update(LEVEL, NORTH);
        }
        let attitude = attitude.unwrap();
        assert!(attitude.pitch.abs() < 0.5);
        assert!(attitude.roll.abs() < 0.5);
        assert!(attitude.yaw.abs() < 0.5);
    }

    #[test]
    fn test_reset_reopens_settle_window() {
        let mut estimator = LowPassEstimator::new(0.5);
        settle_low_pass(&mut estimator, LEVEL, NORTH);
        assert!(estimator.update(LEVEL, NORTH).is_some());

        estimator.reset();
        assert!(estimator.update(LEVEL, NORTH).is_none());
    }
}
