//! Scalar Kalman recurrence shared by the motion detector and the
//! orientation estimator

/// Tuning of the scalar Kalman recurrence
///
/// The same triple is applied independently to every filtered component.
///
/// # Example
/// ```
/// use lsm303dlhc_motion::KalmanSettings;
///
/// let settings = KalmanSettings {
///     process_covariance: 1e-5, // heavier smoothing, more lag
///     ..Default::default()
/// };
/// # let _ = settings;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct KalmanSettings {
    /// Process covariance Q
    pub process_covariance: f32,
    /// Measurement covariance R
    pub measurement_covariance: f32,
    /// Initial error estimate E, seeded on the first sample
    pub initial_error: f32,
}

impl Default for KalmanSettings {
    fn default() -> Self {
        Self {
            process_covariance: 0.1,
            measurement_covariance: 1.0,
            initial_error: 1.0,
        }
    }
}

/// One predict/update step of the scalar filter
pub(crate) fn step(estimate: &mut f32, error: &mut f32, measurement: f32, settings: &KalmanSettings) {
    *error += settings.process_covariance;
    let gain = *error / (*error + settings.measurement_covariance);
    *estimate += gain * (measurement - *estimate);
    *error *= 1.0 - gain;
}
