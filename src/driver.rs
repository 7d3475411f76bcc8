//! Register protocol for the LSM303DLHC: configuration, interrupt
//! plumbing and calibrated sample reads
//!
//! The driver is generic over any [`embedded_hal::i2c::I2c`] bus and owns
//! the calibration scales derived by the setup calls. Reads are polled:
//! a read returns [`Error::NotReady`] while the data-ready bit is clear,
//! which is a retry condition rather than a fault.

use embedded_hal::i2c::I2c;
use log::{debug, warn};
use nalgebra::Vector3;

use crate::registers::{
    accel, mag, pack_cra_reg, pack_crb_reg, pack_ctrl_reg1, pack_ctrl_reg4, AccelDataRate,
    AccelMode, AccelScale, FullScale, InterruptConfig, InterruptSource, MagDataRate, MagGain,
    MagMode, MagScale, ACCEL_ADDR, MAG_ADDR,
};

/// Gauss to microtesla
const GAUSS_TO_MICROTESLA: f32 = 100.0;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
    /// Data not ready yet; poll again later
    NotReady,
}

/// LSM303DLHC driver
///
/// Owns the bus handle and the calibration scales. The scales are zero
/// until the corresponding setup call succeeds, so configure each device
/// before reading it.
///
/// # Example
/// ```ignore
/// use lsm303dlhc_motion::{AccelDataRate, AccelMode, Error, FullScale, Lsm303dlhc};
///
/// let mut sensor = Lsm303dlhc::new(i2c);
/// sensor.setup_accelerometer(AccelDataRate::Hz400, AccelMode::HighResolution, FullScale::G4)?;
///
/// loop {
///     match sensor.acceleration() {
///         Ok(accel) => break accel,        // g
///         Err(Error::NotReady) => continue, // next conversion not finished
///         Err(e) => return Err(e),
///     }
/// }
/// ```
pub struct Lsm303dlhc<I2C> {
    i2c: I2C,
    accel_scale: AccelScale,
    mag_scale: MagScale,
}

impl<I2C, E> Lsm303dlhc<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Create a driver over the given bus
    pub fn new(i2c: I2C) -> Self {
        Lsm303dlhc {
            i2c,
            accel_scale: AccelScale::default(),
            mag_scale: MagScale::default(),
        }
    }

    /// Release the bus handle
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Accelerometer scale derived by the last setup call
    pub fn accel_scale(&self) -> AccelScale {
        self.accel_scale
    }

    /// Magnetometer scale derived by the last setup call
    pub fn mag_scale(&self) -> MagScale {
        self.mag_scale
    }

    /// Configure the accelerometer
    ///
    /// Writes CTRL_REG1 (axis enables, LPen, data rate) and CTRL_REG4
    /// (HR bit, full scale), then derives and stores the calibration
    /// scale. There is no rollback: a bus failure after the first write
    /// leaves the device partially configured.
    pub fn setup_accelerometer(
        &mut self,
        odr: AccelDataRate,
        mode: AccelMode,
        full_scale: FullScale,
    ) -> Result<AccelScale, Error<E>> {
        let reg1 = pack_ctrl_reg1(odr, mode);
        self.write_register(ACCEL_ADDR, accel::CTRL_REG1, reg1)?;
        debug!("CTRL_REG1_A: {:#04x} {:08b}", reg1, reg1);

        let reg4 = pack_ctrl_reg4(mode, full_scale);
        self.write_register(ACCEL_ADDR, accel::CTRL_REG4, reg4)?;
        debug!("CTRL_REG4_A: {:#04x} {:08b}", reg4, reg4);

        self.accel_scale = AccelScale::from_settings(mode, full_scale);
        Ok(self.accel_scale)
    }

    /// Configure the magnetometer
    ///
    /// Writes CRA_REG (temperature sensor, data rate), CRB_REG (gain)
    /// and MR_REG (operating mode), then derives and stores the per-axis
    /// sensitivity. No rollback on mid-sequence failure.
    pub fn setup_magnetometer(
        &mut self,
        temperature: bool,
        odr: MagDataRate,
        gain: MagGain,
        mode: MagMode,
    ) -> Result<MagScale, Error<E>> {
        let cra = pack_cra_reg(temperature, odr);
        self.write_register(MAG_ADDR, mag::CRA_REG, cra)?;
        debug!("CRA_REG_M: {:#04x} {:08b}", cra, cra);

        let crb = pack_crb_reg(gain);
        self.write_register(MAG_ADDR, mag::CRB_REG, crb)?;
        debug!("CRB_REG_M: {:#04x} {:08b}", crb, crb);

        let mr = mode as u8;
        self.write_register(MAG_ADDR, mag::MR_REG, mr)?;
        debug!("MR_REG_M: {:#04x} {:08b}", mr, mr);

        self.mag_scale = MagScale::from_gain(gain);
        Ok(self.mag_scale)
    }

    /// Configure the INT1 event generator
    ///
    /// A configuration with no events enabled deactivates the generator:
    /// threshold and duration are forced to zero and the AOI1 pin routing
    /// is cleared. Otherwise threshold and duration are clamped to their
    /// 7-bit range and AOI1 is routed to the INT1 pin. Registers are
    /// written in the order CFG, THS, DURATION, CTRL_REG3.
    pub fn configure_interrupt1(&mut self, config: InterruptConfig) -> Result<(), Error<E>> {
        let cfg = config.cfg_byte();
        let (threshold, duration, routing) = if cfg == 0 {
            (0, 0, 0)
        } else {
            (
                config.threshold.min(0x7F),
                config.duration.min(0x7F),
                accel::AOI1_ON_INT1,
            )
        };

        self.write_register(ACCEL_ADDR, accel::INT1_CFG, cfg)?;
        debug!("INT1_CFG_A: {:#04x} {:08b}", cfg, cfg);
        self.write_register(ACCEL_ADDR, accel::INT1_THS, threshold)?;
        debug!("INT1_THS_A: {:#04x}", threshold);
        self.write_register(ACCEL_ADDR, accel::INT1_DURATION, duration)?;
        debug!("INT1_DURATION_A: {:#04x}", duration);
        self.write_register(ACCEL_ADDR, accel::CTRL_REG3, routing)?;
        debug!("CTRL_REG3_A: {:#04x} {:08b}", routing, routing);
        Ok(())
    }

    /// Read and decode the INT1 source register
    ///
    /// Reading also clears a latched interrupt on the device.
    pub fn interrupt1_source(&mut self) -> Result<InterruptSource, Error<E>> {
        let src = self.read_register(ACCEL_ADDR, accel::INT1_SRC)?;
        Ok(InterruptSource::from(src))
    }

    /// Read the accelerometer in g
    ///
    /// Polls the data-ready bit and performs a 6-byte burst read; each
    /// axis is shift-aligned and scaled by the stored sensitivity.
    pub fn acceleration(&mut self) -> Result<Vector3<f32>, Error<E>> {
        let [x, y, z] = self.acceleration_aligned()?;
        let lsb = self.accel_scale.g_per_lsb;
        Ok(Vector3::new(x as f32 * lsb, y as f32 * lsb, z as f32 * lsb))
    }

    /// Read the accelerometer raw, shift-aligned but unscaled
    pub fn acceleration_raw(&mut self) -> Result<Vector3<i16>, Error<E>> {
        let [x, y, z] = self.acceleration_aligned()?;
        Ok(Vector3::new(x, y, z))
    }

    /// Read the magnetic field in microtesla
    ///
    /// Polls the data-ready bit, bursts the output registers and divides
    /// by the per-axis LSB/Gauss sensitivity. Requires a prior
    /// [`setup_magnetometer`](Self::setup_magnetometer) call.
    pub fn magnetic_field(&mut self) -> Result<Vector3<f32>, Error<E>> {
        let [x, y, z] = self.magnetic_field_wire()?;
        let scale = self.mag_scale;
        Ok(Vector3::new(
            x as f32 / scale.lsb_per_gauss_xy * GAUSS_TO_MICROTESLA,
            y as f32 / scale.lsb_per_gauss_xy * GAUSS_TO_MICROTESLA,
            z as f32 / scale.lsb_per_gauss_z * GAUSS_TO_MICROTESLA,
        ))
    }

    /// Read the magnetic field raw, in LSB
    pub fn magnetic_field_raw(&mut self) -> Result<Vector3<i16>, Error<E>> {
        let [x, y, z] = self.magnetic_field_wire()?;
        Ok(Vector3::new(x, y, z))
    }

    fn acceleration_aligned(&mut self) -> Result<[i16; 3], Error<E>> {
        let status = self.read_register(ACCEL_ADDR, accel::STATUS_REG)?;
        if status & accel::ZYXDA == 0 {
            return Err(Error::NotReady);
        }

        let mut buf = [0u8; 6];
        self.read_burst(ACCEL_ADDR, accel::OUT_X_L | accel::AUTO_INCREMENT, &mut buf)?;

        // Little-endian per axis, left-justified; arithmetic shift keeps
        // the sign.
        let shift = self.accel_scale.shift;
        Ok([
            i16::from_le_bytes([buf[0], buf[1]]) >> shift,
            i16::from_le_bytes([buf[2], buf[3]]) >> shift,
            i16::from_le_bytes([buf[4], buf[5]]) >> shift,
        ])
    }

    fn magnetic_field_wire(&mut self) -> Result<[i16; 3], Error<E>> {
        let status = self.read_register(MAG_ADDR, mag::SR_REG)?;
        if status & mag::DRDY == 0 {
            return Err(Error::NotReady);
        }

        let mut buf = [0u8; 6];
        self.read_burst(MAG_ADDR, mag::OUT_X_H, &mut buf)?;

        // Big-endian per axis, and the wire order is X, Z, Y.
        Ok([
            i16::from_be_bytes([buf[0], buf[1]]),
            i16::from_be_bytes([buf[4], buf[5]]),
            i16::from_be_bytes([buf[2], buf[3]]),
        ])
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(address, &[register, value])
            .map_err(Error::Bus)
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(address, &[register], &mut buf)
            .map_err(|e| {
                warn!("register {:#04x} read failed", register);
                Error::Bus(e)
            })?;
        Ok(buf[0])
    }

    fn read_burst(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c.write_read(address, &[register], buf).map_err(|e| {
            warn!("burst read at {:#04x} failed", register);
            Error::Bus(e)
        })
    }
}
