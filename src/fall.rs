//! Free-fall detection over the accelerometer stream
//!
//! A fall reads as a window of weightlessness ended by an impact. The
//! detector tracks that shape with a three-stage machine over the
//! acceleration magnitude: near-zero magnitude moves it from [`Init`] to
//! [`Weightless`], a spike above the impact threshold moves it to
//! [`Fall`], and `Fall` latches until the detector is reset.
//!
//! [`Init`]: FallStage::Init
//! [`Weightless`]: FallStage::Weightless
//! [`Fall`]: FallStage::Fall

use log::debug;
use nalgebra::Vector3;

/// Detection stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallStage {
    /// At rest or in ordinary motion
    #[default]
    Init,
    /// Acceleration magnitude dropped below the weightlessness threshold
    Weightless,
    /// Impact detected after weightlessness; latched until reset
    Fall,
}

/// Three-stage free-fall detector
///
/// One instance tracks one physical body.
///
/// # Example
/// ```
/// use lsm303dlhc_motion::{FallDetector, FallStage};
/// use nalgebra::Vector3;
///
/// let mut detector = FallDetector::new(0.1, 1.5);
/// detector.update(Vector3::new(0.0, 0.0, 1.0));   // at rest
/// detector.update(Vector3::new(0.0, 0.0, 0.05));  // falling
/// let stage = detector.update(Vector3::new(0.0, 1.5, 1.5)); // impact
/// assert_eq!(stage, FallStage::Fall);
///
/// detector.reset();
/// assert_eq!(detector.stage(), FallStage::Init);
/// ```
#[derive(Debug, Clone)]
pub struct FallDetector {
    weightless_threshold: f32,
    impact_threshold: f32,
    stage: FallStage,
}

impl FallDetector {
    /// Create a detector
    ///
    /// # Arguments
    /// * `weightless_threshold` - Magnitude in g below which the body is
    ///   considered weightless
    /// * `impact_threshold` - Magnitude in g above which a following
    ///   impact is recognized
    pub fn new(weightless_threshold: f32, impact_threshold: f32) -> Self {
        FallDetector {
            weightless_threshold,
            impact_threshold,
            stage: FallStage::Init,
        }
    }

    /// Current stage
    pub fn stage(&self) -> FallStage {
        self.stage
    }

    /// Feed one accelerometer sample, in g
    ///
    /// Returns the stage after evaluating the sample. [`FallStage::Fall`]
    /// is sticky; leave it with [`reset`](Self::reset).
    pub fn update(&mut self, accel: Vector3<f32>) -> FallStage {
        self.advance(accel, self.weightless_threshold, self.impact_threshold);
        self.stage
    }

    /// Feed one sample with per-call thresholds
    ///
    /// Compatibility form of [`update`](Self::update): passing both
    /// thresholds as zero is the legacy request to leave
    /// [`FallStage::Fall`] and start over. New code should construct the
    /// detector with its thresholds and call [`reset`](Self::reset)
    /// instead.
    pub fn detect(
        &mut self,
        accel: Vector3<f32>,
        weightless_threshold: f32,
        impact_threshold: f32,
    ) -> FallStage {
        if self.stage == FallStage::Fall && weightless_threshold + impact_threshold == 0.0 {
            self.reset();
            return self.stage;
        }
        self.advance(accel, weightless_threshold, impact_threshold);
        self.stage
    }

    /// Return to [`FallStage::Init`]
    pub fn reset(&mut self) {
        self.stage = FallStage::Init;
        debug!("fall stage reset");
    }

    fn advance(&mut self, accel: Vector3<f32>, weightless_threshold: f32, impact_threshold: f32) {
        let magnitude = accel.magnitude();
        match self.stage {
            FallStage::Init => {
                if magnitude < weightless_threshold {
                    self.stage = FallStage::Weightless;
                    debug!("weightlessness: {:.3}", magnitude);
                }
            }
            FallStage::Weightless => {
                if magnitude > impact_threshold {
                    self.stage = FallStage::Fall;
                    debug!("fall: {:.3}", magnitude);
                }
            }
            FallStage::Fall => {}
        }
    }
}
