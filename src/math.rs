//! Mathematical utilities and nalgebra extensions for the detector modules

use nalgebra::{ComplexField, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Calculate the smoothing coefficient of an RC low-pass filter
///
/// # Arguments
/// * `rate` - Sampling frequency in Hz
/// * `cutoff` - Cutoff frequency in Hz
///
/// # Returns
/// Filter coefficient in (0, 1); smaller values smooth harder
///
/// # Example
/// ```
/// use lsm303dlhc_motion::alpha;
///
/// let a = alpha(400.0, 10.0);
/// assert!(a > 0.0 && a < 1.0);
/// ```
pub fn alpha(rate: f32, cutoff: f32) -> f32 {
    let rc = 1.0 / (2.0 * core::f32::consts::PI * cutoff);
    let dt = 1.0 / rate;
    dt / (rc + dt)
}

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Calculate the magnitude of the vector
    fn magnitude(&self) -> f32;

    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = Vector3Ext::magnitude(self);
        if mag > 0.0 {
            *self / mag
        } else {
            Vector3::zeros()
        }
    }
}
