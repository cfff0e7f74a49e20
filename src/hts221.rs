//! * Driver for the HTS221 humidity sensor
//! See `http://www.st.com/content/st_com/en/products/mems-and-sensors/humidity-sensors/hts221.html`
//!
//! The chip has to be activated before it will produce readings. Activation
//! powers it up and loads its factory calibration; powering it down throws
//! the calibration away again, so the next [`Hts221::activate`] reloads it.
//!
//! ```text
//! Uninitialized --init--> Initialized --activate--> Active --power_down--> PoweredDown
//!                                                     ^                        |
//!                                                     +-------activate---------+
//! ```
//!
//! An activation that fails after the chip has been powered up leaves it
//! `Uncalibrated`: running, but with no calibration to convert readings.

use std::thread;

use log::{debug, info, warn};

use crate::bus::{RegisterTransport, SharedBus};
use crate::calibration::{Calibration, CALIBRATION_LEN, CALIBRATION_START};
use crate::config::Hts221Config;
use crate::units::celsius_to_fahrenheit;
use crate::{Error, SensorResult};

pub const ADDRESS: u8 = 0x5f;
pub const WHO_AM_I_VALUE: u8 = 0xbc;

pub const REG_WHO_AM_I: u8 = 0x0f;
pub const REG_CTRL1: u8 = 0x20;
pub const REG_STATUS: u8 = 0x27;
pub const REG_HUMIDITY_OUT_L: u8 = 0x28;
pub const REG_HUMIDITY_OUT_H: u8 = 0x29;
pub const REG_TEMP_OUT_L: u8 = 0x2a;
pub const REG_TEMP_OUT_H: u8 = 0x2b;

pub const CTRL1_PD: u8 = 0x80;
pub const CTRL1_BDU: u8 = 0x04;
pub const CTRL1_ODR0: u8 = 0x01;

pub const STATUS_T_DA: u8 = 0x01;
pub const STATUS_H_DA: u8 = 0x02;

/// Where the driver is in its power/calibration lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerState {
    Uninitialized,
    /// WHO_AM_I matched
    Initialized,
    /// Powered up and calibrated; readings are valid
    Active,
    /// Powered down; calibration has been discarded
    PoweredDown,
    /// Powered up, but loading the calibration failed
    Uncalibrated,
}

pub struct Hts221<T> {
    bus: SharedBus<T>,
    config: Hts221Config,
    state: PowerState,
    calibration: Option<Calibration>,
}

impl<T> Hts221<T>
where
    T: RegisterTransport,
{
    /// Create a handle for the chip at `config.address`. Nothing is sent
    /// until [`Hts221::init`].
    pub fn new(bus: SharedBus<T>, config: Hts221Config) -> Hts221<T> {
        Hts221 {
            bus,
            config,
            state: PowerState::Uninitialized,
            calibration: None,
        }
    }

    /// Check that an HTS221 answers at our address.
    ///
    /// A mismatch is reported but leaves the driver usable; it's up to the
    /// caller whether to carry on.
    pub fn init(&mut self) -> SensorResult<(), T::Error> {
        let found = self.identify()?;
        if found != WHO_AM_I_VALUE {
            warn!(
                "[hts221] WHO_AM_I=0x{:02X}, expected 0x{:02X}",
                found, WHO_AM_I_VALUE
            );
            return Err(Error::IdentityMismatch {
                expected: WHO_AM_I_VALUE,
                found,
            });
        }
        info!("[hts221] found at 0x{:02X}", self.config.address);
        if self.state == PowerState::Uninitialized {
            self.state = PowerState::Initialized;
        }
        Ok(())
    }

    /// Obtain the WHO_AM_I register. An HTS221 answers 0xBC.
    pub fn identify(&mut self) -> SensorResult<u8, T::Error> {
        let address = self.config.address;
        self.bus.transaction(|bus| bus.read_byte(address, REG_WHO_AM_I))
    }

    /// Obtain the status bitfield from the chip.
    pub fn status(&mut self) -> SensorResult<u8, T::Error> {
        let address = self.config.address;
        self.bus.transaction(|bus| bus.read_byte(address, REG_STATUS))
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// The calibration loaded by the last [`Hts221::activate`], if the
    /// chip is still active.
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Power the chip up at 1 Hz and load its calibration.
    ///
    /// Any previous calibration is dropped first, so a failed activation
    /// never leaves stale coefficients behind.
    pub fn activate(&mut self) -> SensorResult<(), T::Error> {
        let address = self.config.address;
        self.calibration = None;
        if self.state == PowerState::Active {
            self.state = PowerState::Uncalibrated;
        }
        let ctrl = self.bus.transaction(|bus| {
            bus.modify_byte(address, REG_CTRL1, |ctrl| ctrl | CTRL1_PD | CTRL1_ODR0)
        })?;
        debug!("[hts221] CTRL_REG1=0x{:02X}", ctrl);
        self.state = PowerState::Uncalibrated;
        self.calibrate()?;
        self.state = PowerState::Active;
        info!("[hts221] active");
        Ok(())
    }

    /// Power the chip down. Readings fail until the next activation.
    pub fn power_down(&mut self) -> SensorResult<(), T::Error> {
        let address = self.config.address;
        self.bus
            .transaction(|bus| bus.modify_byte(address, REG_CTRL1, |ctrl| ctrl & !CTRL1_PD))?;
        self.calibration = None;
        self.state = PowerState::PoweredDown;
        info!("[hts221] powered down");
        Ok(())
    }

    /// Enable or disable block data update. With it on, the chip holds an
    /// output register pair until both halves have been read.
    pub fn set_block_data_update(&mut self, enabled: bool) -> SensorResult<(), T::Error> {
        let address = self.config.address;
        let ctrl = self.bus.transaction(|bus| {
            bus.modify_byte(address, REG_CTRL1, |ctrl| {
                if enabled {
                    ctrl | CTRL1_BDU
                } else {
                    ctrl & !CTRL1_BDU
                }
            })
        })?;
        debug!("[hts221] block data update {}, CTRL_REG1=0x{:02X}", enabled, ctrl);
        Ok(())
    }

    fn calibrate(&mut self) -> SensorResult<(), T::Error> {
        let address = self.config.address;
        let block = self.bus.transaction(|bus| {
            let mut block = [0u8; CALIBRATION_LEN];
            for (offset, byte) in block.iter_mut().enumerate() {
                *byte = bus.read_byte(address, CALIBRATION_START + offset as u8)?;
            }
            Ok(block)
        })?;
        let calibration = Calibration::from_registers(&block);
        debug!("[hts221] {:?}", calibration);
        if let Err(e) = calibration.validate() {
            warn!("[hts221] unusable calibration: {}", e);
        }
        self.calibration = Some(calibration);
        Ok(())
    }

    fn active_calibration(&self) -> SensorResult<Calibration, T::Error> {
        match (self.state, self.calibration) {
            (PowerState::Active, Some(calibration)) => Ok(calibration),
            _ => Err(Error::NotCalibrated),
        }
    }

    /// Poll the status register until any bit in `mask` is set.
    fn wait_for(&mut self, mask: u8) -> SensorResult<(), T::Error> {
        let polls = self.config.max_status_polls.max(1);
        for attempt in 1..=polls {
            if self.status()? & mask != 0 {
                return Ok(());
            }
            if attempt < polls {
                thread::sleep(self.config.poll_interval);
            }
        }
        warn!("[hts221] no data after {} status polls", polls);
        Err(Error::Timeout {
            register: REG_STATUS,
            polls,
        })
    }

    /// Read the raw humidity output, without checking it's ready.
    pub fn get_relative_humidity(&mut self) -> SensorResult<u16, T::Error> {
        let address = self.config.address;
        self.bus.transaction(|bus| {
            bus.read_word(address, REG_HUMIDITY_OUT_L, REG_HUMIDITY_OUT_H)
        })
    }

    /// Read the raw temperature output, without checking it's ready.
    pub fn get_temperature(&mut self) -> SensorResult<u16, T::Error> {
        let address = self.config.address;
        self.bus
            .transaction(|bus| bus.read_word(address, REG_TEMP_OUT_L, REG_TEMP_OUT_H))
    }

    /// Wait for a new humidity sample and return it in %RH.
    pub fn read_humidity_percent(&mut self) -> SensorResult<f64, T::Error> {
        let calibration = self.active_calibration()?;
        self.wait_for(STATUS_H_DA)?;
        let raw = self.get_relative_humidity()?;
        calibration
            .humidity_percent(raw)
            .map_err(Error::Calibration)
    }

    /// Wait for a new temperature sample and return it in deg C.
    pub fn read_temperature_c(&mut self) -> SensorResult<f64, T::Error> {
        let calibration = self.active_calibration()?;
        self.wait_for(STATUS_T_DA)?;
        let raw = self.get_temperature()?;
        calibration
            .temperature_celsius(raw)
            .map_err(Error::Calibration)
    }

    pub fn read_temperature_f(&mut self) -> SensorResult<f64, T::Error> {
        self.read_temperature_c().map(celsius_to_fahrenheit)
    }
}


// End of file
