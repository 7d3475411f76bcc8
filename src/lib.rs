#![no_std]

//! Driver and motion-signal library for the LSM303DLHC combined
//! accelerometer/magnetometer
//!
//! The crate covers both halves of working with the sensor: the register
//! protocol (configuration, interrupt plumbing, calibrated polled reads
//! over any [`embedded_hal::i2c::I2c`] bus) and the signal processing
//! that turns raw axis triples into something an application can act on:
//! motion and magnetic distortion triggers, incline angle, device
//! orientation and a free-fall state machine.
//!
//! # Features
//!
//! - Calibrated accelerometer and magnetometer reads with the full
//!   datasheet sensitivity tables
//! - INT1 threshold/duration event generator configuration and a
//!   lock-free interrupt-to-poll event counter
//! - Motion detectors (low-pass and Kalman variants) with a
//!   shock-rejecting settle window
//! - Magnetic distortion detectors (high-pass and low-pass variants)
//! - Incline detection against a configurable angle limit
//! - Pitch/roll/tilt-compensated-yaw estimation (low-pass and Kalman
//!   variants)
//! - Three-stage free-fall detection
//! - `#![no_std]` compatible; diagnostics go through the `log` facade
//!   and cost nothing unless a logger is installed
//!
//! # Quick Start
//!
//! Every detector is an explicit state value: construct one per axis
//! stream and feed it every sample.
//!
//! ```rust
//! use lsm303dlhc_motion::{FallDetector, FallStage, LowPassEstimator, MotionLowPass};
//! use nalgebra::Vector3;
//!
//! let mut motion = MotionLowPass::new(0.3, 0.05, 4);
//! let mut orientation = LowPassEstimator::new(0.239);
//! let mut fall = FallDetector::new(0.1, 1.5);
//!
//! // Feed samples as they arrive (here: at rest, pointing north).
//! let accel = Vector3::new(0.0, 0.0, 1.0);
//! let mag = Vector3::new(25.0, 0.0, -40.0);
//!
//! for _ in 0..40 {
//!     let trigger = motion.update(accel);
//!     assert_eq!(trigger, 0.0); // no motion in a constant stream
//!
//!     if let Some(attitude) = orientation.update(accel, mag) {
//!         assert!(attitude.pitch.abs() < 1.0);
//!     }
//!
//!     assert_eq!(fall.update(accel), FallStage::Init);
//! }
//! ```
//!
//! Reading the hardware follows the same polling rhythm; see
//! [`Lsm303dlhc`] for the bus side.

mod distortion;
mod driver;
mod event;
mod fall;
mod incline;
mod kalman;
mod math;
mod motion;
mod orientation;
pub mod registers;

pub use distortion::{DistortionHighPass, DistortionLowPass};
pub use driver::{Error, Lsm303dlhc};
pub use event::InterruptCounter;
pub use fall::{FallDetector, FallStage};
pub use incline::InclineLowPass;
pub use kalman::KalmanSettings;
pub use math::{alpha, Vector3Ext, DEG_TO_RAD, RAD_TO_DEG};
pub use motion::{MotionKalman, MotionLowPass};
pub use orientation::{KalmanEstimator, LowPassEstimator, Orientation};
pub use registers::{
    AccelDataRate, AccelMode, AccelScale, FullScale, InterruptConfig, InterruptMode,
    InterruptSource, MagDataRate, MagGain, MagMode, MagScale, ACCEL_ADDR, MAG_ADDR,
};

/// Samples a filter must absorb after (re)initialization before its
/// output is valid
pub const SETTLE_SAMPLES: u8 = 32;
