//! * Driver for the LPS25HB Pressure sensor
//! See https://www.st.com/resource/en/datasheet/lps25hb.pdf

use byteorder::{ByteOrder, LittleEndian};
use log::{info, trace, warn};

use crate::bus::{RegisterTransport, SharedBus};
use crate::config::Lps25hbConfig;
use crate::units::{celsius_to_fahrenheit, Sample};
use crate::{Error, SensorResult};

pub const ADDRESS: u8 = 0x5d;
pub const WHO_AM_I_VALUE: u8 = 0xbd;

pub const REG_WHO_AM_I: u8 = 0x0f;
pub const REG_CTRL_REG_1: u8 = 0x20;
pub const REG_STATUS_REG: u8 = 0x27;
pub const REG_PRESS_OUT_XL: u8 = 0x28;
pub const REG_PRESS_OUT_L: u8 = 0x29;
pub const REG_PRESS_OUT_H: u8 = 0x2a;
pub const REG_TEMP_OUT_L: u8 = 0x2b;
pub const REG_TEMP_OUT_H: u8 = 0x2c;

/// PD (active mode) plus ODR = 12.5 Hz
pub const CTRL1_ACTIVE_12HZ5: u8 = 0xb0;
pub const STATUS_T_DA: u8 = 0x01;
pub const STATUS_P_DA: u8 = 0x02;

/// How the data bytes are combined into a reading.
///
/// The reference firmware weights the upper bytes by 255 and 65535 rather
/// than shifting them, and biases the temperature by a flat -65536. That is
/// kept as the default so readings match it exactly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ByteWeighting {
    /// `high*255 + low`, `high*65535 + mid*255 + low`
    Reference,
    /// Two's complement words as in the datasheet
    Shifted,
}

impl Default for ByteWeighting {
    fn default() -> ByteWeighting {
        ByteWeighting::Reference
    }
}

impl ByteWeighting {
    /// T(°C) = 42.5 + (TEMP_OUT / 480)
    pub fn temperature_celsius(self, low: u8, high: u8) -> f64 {
        let temp_out = match self {
            ByteWeighting::Reference => (i32::from(high) * 255 + i32::from(low)) - (1 << 16),
            ByteWeighting::Shifted => i32::from(LittleEndian::read_i16(&[low, high])),
        };
        42.5 + f64::from(temp_out) / 480.0
    }

    /// Pout(hPa) = PRESS_OUT / 4096
    pub fn pressure_mbar(self, xl: u8, l: u8, h: u8) -> f64 {
        let press_out = match self {
            ByteWeighting::Reference => {
                u32::from(h) * 65535 + u32::from(l) * 255 + u32::from(xl)
            }
            ByteWeighting::Shifted => LittleEndian::read_u24(&[xl, l, h]),
        };
        f64::from(press_out) / 4096.0
    }
}

pub struct Lps25hb<T> {
    bus: SharedBus<T>,
    config: Lps25hbConfig,
}

impl<T> Lps25hb<T>
where
    T: RegisterTransport,
{
    /// Create a handle for the chip at `config.address`. Nothing is sent
    /// until [`Lps25hb::init`].
    pub fn new(bus: SharedBus<T>, config: Lps25hbConfig) -> Lps25hb<T> {
        Lps25hb { bus, config }
    }

    /// Switch the chip to active mode at 12.5 Hz, leaving the other
    /// control bits as they were.
    pub fn init(&mut self) -> SensorResult<(), T::Error> {
        let address = self.config.address;
        let ctrl = self.bus.transaction(|bus| {
            bus.modify_byte(address, REG_CTRL_REG_1, |ctrl| ctrl | CTRL1_ACTIVE_12HZ5)
        })?;
        info!("[lps25hb] active, CTRL_REG1=0x{:02X}", ctrl);
        Ok(())
    }

    /// Obtain the WHO_AM_I register. An LPS25HB answers 0xBD.
    pub fn identify(&mut self) -> SensorResult<u8, T::Error> {
        let address = self.config.address;
        self.bus
            .transaction(|bus| bus.read_byte(address, REG_WHO_AM_I))
    }

    /// Compare WHO_AM_I against the expected value.
    pub fn check_identity(&mut self) -> SensorResult<(), T::Error> {
        let found = self.identify()?;
        if found == WHO_AM_I_VALUE {
            Ok(())
        } else {
            warn!(
                "[lps25hb] WHO_AM_I=0x{:02X}, expected 0x{:02X}",
                found, WHO_AM_I_VALUE
            );
            Err(Error::IdentityMismatch {
                expected: WHO_AM_I_VALUE,
                found,
            })
        }
    }

    /// Obtain the status bitfield from the chip.
    pub fn status(&mut self) -> SensorResult<u8, T::Error> {
        let address = self.config.address;
        self.bus
            .transaction(|bus| bus.read_byte(address, REG_STATUS_REG))
    }

    /// Checks the status register once and, if a temperature is waiting,
    /// returns it in deg C.
    pub fn read_temperature_c(&mut self) -> SensorResult<Sample<f64>, T::Error> {
        let address = self.config.address;
        let weighting = self.config.weighting;
        let bytes = self.bus.transaction(|bus| {
            if bus.read_byte(address, REG_STATUS_REG)? & STATUS_T_DA == 0 {
                return Ok(None);
            }
            let low = bus.read_byte(address, REG_TEMP_OUT_L)?;
            let high = bus.read_byte(address, REG_TEMP_OUT_H)?;
            Ok(Some((low, high)))
        })?;
        match bytes {
            Some((low, high)) => Ok(Sample::Ready(weighting.temperature_celsius(low, high))),
            None => {
                trace!("[lps25hb] temperature not ready");
                Ok(Sample::NotReady)
            }
        }
    }

    /// As [`Lps25hb::read_temperature_c`], in deg F.
    pub fn read_temperature_f(&mut self) -> SensorResult<Sample<f64>, T::Error> {
        Ok(self.read_temperature_c()?.map(celsius_to_fahrenheit))
    }

    /// Checks the status register once and, if a pressure is waiting,
    /// returns it in mbar (hPa).
    pub fn read_pressure_mbar(&mut self) -> SensorResult<Sample<f64>, T::Error> {
        let address = self.config.address;
        let weighting = self.config.weighting;
        let bytes = self.bus.transaction(|bus| {
            if bus.read_byte(address, REG_STATUS_REG)? & STATUS_P_DA == 0 {
                return Ok(None);
            }
            let xl = bus.read_byte(address, REG_PRESS_OUT_XL)?;
            let l = bus.read_byte(address, REG_PRESS_OUT_L)?;
            let h = bus.read_byte(address, REG_PRESS_OUT_H)?;
            Ok(Some((xl, l, h)))
        })?;
        match bytes {
            Some((xl, l, h)) => Ok(Sample::Ready(weighting.pressure_mbar(xl, l, h))),
            None => {
                trace!("[lps25hb] pressure not ready");
                Ok(Sample::NotReady)
            }
        }
    }
}


// End of file
