//! # Drivers for the ST LPS25HB and HTS221 environmental sensors
//!
//! Both chips sit on an I2C bus and are driven one register at a time.
//!
//! Supported components:
//!
//! * Pressure and Temperature Sensor (an LPS25HB, address 0x5D)
//! * Humidity and Temperature Sensor (an HTS221, address 0x5F)
//!
//! Each driver can be used on its own over any [`RegisterTransport`], or
//! both can be brought up together through a [`Board`].
//!
//! ```no_run
//! use st_envsense::{Board, Config};
//!
//! let mut board = Board::open(&Config::default()).expect("Couldn't open the sensors");
//! let rh = board.humidity().expect("Couldn't get rh");
//! println!("It's {} relative humidity", rh);
//! ```

use std::fmt;

pub mod bus;
pub mod calibration;
pub mod config;
pub mod hts221;
pub mod lps25hb;
mod units;

pub use measurements::Pressure;
pub use measurements::Temperature;
pub use units::{
    celsius_to_fahrenheit, RelativeHumidity, Sample, ABSOLUTE_ZERO_CELSIUS, PRESSURE_NOT_READY,
};

pub use bus::{I2cdevBus, RegisterTransport, SharedBus};
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use bus::LinuxBus;
pub use calibration::{Calibration, CalibrationError, Channel};
pub use config::{Config, Hts221Config, Lps25hbConfig};
pub use hts221::{Hts221, PowerState};
pub use lps25hb::{ByteWeighting, Lps25hb};

#[cfg(any(target_os = "linux", target_os = "android"))]
use i2cdev::linux::LinuxI2CError;

/// Errors that this crate can return, generic over the bus error `E`
#[derive(Debug, PartialEq)]
pub enum Error<E> {
    /// The bus transaction itself failed
    Transport(E),
    /// WHO_AM_I didn't hold the value for this chip
    IdentityMismatch { expected: u8, found: u8 },
    /// The HTS221 hasn't been activated since init or power-down
    NotCalibrated,
    Calibration(CalibrationError),
    /// The data-ready bit never came up
    Timeout { register: u8, polls: u32 },
    /// Another user of the bus panicked mid-transaction
    BusPoisoned,
}

/// A shortcut for Results that can return `T` or `Error<E>`
pub type SensorResult<T, E> = Result<T, Error<E>>;

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Error<E> {
        Error::Transport(err)
    }
}

impl<E> fmt::Display for Error<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "Bus error: {}", e),
            Error::IdentityMismatch { expected, found } => write!(
                f,
                "WHO_AM_I was 0x{:02X}, expected 0x{:02X}",
                found, expected
            ),
            Error::NotCalibrated => write!(f, "Sensor not activated"),
            Error::Calibration(e) => write!(f, "Calibration error: {}", e),
            Error::Timeout { register, polls } => write!(
                f,
                "Register 0x{:02X} not ready after {} polls",
                register, polls
            ),
            Error::BusPoisoned => write!(f, "Bus lock poisoned"),
        }
    }
}

impl<E> std::error::Error for Error<E> where E: fmt::Debug + fmt::Display {}

/// Both sensors on one shared bus.
pub struct Board<T> {
    /// LPS25HB pressure sensor
    pressure_chip: Lps25hb<T>,
    /// HTS221 humidity sensor
    humidity_chip: Hts221<T>,
}

/// Carry on past a WHO_AM_I mismatch; the driver has already logged it.
fn tolerate_mismatch<E>(result: SensorResult<(), E>) -> SensorResult<(), E> {
    match result {
        Err(Error::IdentityMismatch { .. }) => Ok(()),
        other => other,
    }
}

impl<T> Board<T>
where
    T: RegisterTransport,
{
    /// Bring up both chips on `bus`.
    ///
    /// Identity mismatches are logged and ignored. The HTS221 is switched to
    /// block data update, powered up and calibrated.
    pub fn new(bus: SharedBus<T>, config: &Config) -> SensorResult<Board<T>, T::Error> {
        let mut pressure_chip = Lps25hb::new(bus.clone(), config.lps25hb.clone());
        tolerate_mismatch(pressure_chip.check_identity())?;
        pressure_chip.init()?;

        let mut humidity_chip = Hts221::new(bus, config.hts221.clone());
        tolerate_mismatch(humidity_chip.init())?;
        humidity_chip.set_block_data_update(true)?;
        humidity_chip.activate()?;

        Ok(Board {
            pressure_chip,
            humidity_chip,
        })
    }

    /// Returns a Temperature reading from the barometer, if one is ready.
    /// It's less accurate than the humidity sensor (+/- 2 degrees C), but
    /// over a wider range.
    pub fn temperature_from_pressure(&mut self) -> SensorResult<Sample<Temperature>, T::Error> {
        Ok(self
            .pressure_chip
            .read_temperature_c()?
            .map(Temperature::from_celsius))
    }

    /// Returns a Pressure value from the barometer, if one is ready.
    pub fn pressure(&mut self) -> SensorResult<Sample<Pressure>, T::Error> {
        Ok(self
            .pressure_chip
            .read_pressure_mbar()?
            .map(Pressure::from_hectopascals))
    }

    /// Returns a Temperature reading from the humidity sensor. It's more
    /// accurate than the barometer (+/- 0.5 degrees C), but over a smaller
    /// range. Waits for a fresh sample.
    pub fn temperature_from_humidity(&mut self) -> SensorResult<Temperature, T::Error> {
        let celsius = self.humidity_chip.read_temperature_c()?;
        Ok(Temperature::from_celsius(celsius))
    }

    /// Returns a RelativeHumidity value in percent. Waits for a fresh
    /// sample.
    pub fn humidity(&mut self) -> SensorResult<RelativeHumidity, T::Error> {
        let percent = self.humidity_chip.read_humidity_percent()?;
        Ok(RelativeHumidity::from_percent(percent))
    }

    /// The LPS25HB driver, for reads the board doesn't wrap (raw status,
    /// Fahrenheit).
    pub fn pressure_chip(&mut self) -> &mut Lps25hb<T> {
        &mut self.pressure_chip
    }

    /// The HTS221 driver, e.g. to power it down or re-activate it.
    pub fn humidity_chip(&mut self) -> &mut Hts221<T> {
        &mut self.humidity_chip
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl Board<LinuxBus> {
    /// Open `config.bus_path` and bring up both chips on it.
    pub fn open(config: &Config) -> SensorResult<Board<LinuxBus>, LinuxI2CError> {
        let bus = LinuxBus::open(&config.bus_path)?;
        Board::new(SharedBus::new(bus), config)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::fake::{FakeBus, FakeError};
    use crate::calibration::test::BLOCK;
    use crate::calibration::CALIBRATION_START;
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config::default();
        config.hts221.poll_interval = Duration::from_millis(0);
        config.hts221.max_status_polls = 3;
        config
    }

    fn board_fake() -> FakeBus {
        let mut fake = FakeBus::new();
        fake.set(lps25hb::ADDRESS, lps25hb::REG_WHO_AM_I, lps25hb::WHO_AM_I_VALUE)
            .set(hts221::ADDRESS, hts221::REG_WHO_AM_I, hts221::WHO_AM_I_VALUE)
            .set_block(hts221::ADDRESS, CALIBRATION_START, &BLOCK);
        fake
    }

    #[test]
    fn brings_up_both_chips() {
        let bus = SharedBus::new(board_fake());
        let mut board = Board::new(bus.clone(), &config()).unwrap();
        assert_eq!(board.humidity_chip().state(), PowerState::Active);
        let (lps_ctrl, hts_ctrl) = bus
            .transaction(|b| {
                Ok((
                    b.get(lps25hb::ADDRESS, lps25hb::REG_CTRL_REG_1),
                    b.get(hts221::ADDRESS, hts221::REG_CTRL1),
                ))
            })
            .unwrap();
        assert_eq!(lps_ctrl, 0xb0);
        assert_eq!(hts_ctrl, 0x85);
    }

    #[test]
    fn wrong_identity_is_tolerated() {
        let mut fake = board_fake();
        fake.set(lps25hb::ADDRESS, lps25hb::REG_WHO_AM_I, 0x00)
            .set(hts221::ADDRESS, hts221::REG_WHO_AM_I, 0x00);
        assert!(Board::new(SharedBus::new(fake), &config()).is_ok());
    }

    #[test]
    fn bus_failure_is_fatal() {
        let mut fake = board_fake();
        fake.fail_on(lps25hb::ADDRESS, lps25hb::REG_CTRL_REG_1);
        let result = Board::new(SharedBus::new(fake), &config());
        assert!(match result {
            Err(Error::Transport(FakeError { register, .. })) => register == 0x20,
            _ => false,
        });
    }

    #[test]
    fn readings() {
        let mut fake = board_fake();
        fake.set(lps25hb::ADDRESS, lps25hb::REG_STATUS_REG, 0x03)
            .set_block(lps25hb::ADDRESS, lps25hb::REG_PRESS_OUT_XL, &[0x00, 0x00, 0x01])
            .set_block(lps25hb::ADDRESS, lps25hb::REG_TEMP_OUT_L, &[0x10, 0xff])
            .set(hts221::ADDRESS, hts221::REG_STATUS, 0x03)
            .set_block(hts221::ADDRESS, hts221::REG_HUMIDITY_OUT_L, &[0x88, 0x13])
            .set_block(hts221::ADDRESS, hts221::REG_TEMP_OUT_L, &[0xf4, 0x01]);
        let mut board = Board::new(SharedBus::new(fake), &config()).unwrap();

        assert_eq!(board.humidity().unwrap().as_percent(), 52.0);
        let t = board.temperature_from_humidity().unwrap();
        assert!((t.as_celsius() - 38.125).abs() < 1e-9);
        let t = board.temperature_from_pressure().unwrap().ready().unwrap();
        assert!((t.as_celsius() - 41.46875).abs() < 1e-9);
        let p = board.pressure().unwrap().ready().unwrap();
        assert!((p.as_hectopascals() - 65535.0 / 4096.0).abs() < 1e-9);
    }

    #[test]
    fn pressure_not_ready() {
        let mut board = Board::new(SharedBus::new(board_fake()), &config()).unwrap();
        assert!(!board.pressure().unwrap().is_ready());
        assert!(!board.temperature_from_pressure().unwrap().is_ready());
    }

    #[test]
    fn chips_stay_reachable() {
        let mut fake = board_fake();
        fake.set(lps25hb::ADDRESS, lps25hb::REG_STATUS_REG, 0x01)
            .set_block(lps25hb::ADDRESS, lps25hb::REG_TEMP_OUT_L, &[0x10, 0xff]);
        let mut board = Board::new(SharedBus::new(fake), &config()).unwrap();
        assert_eq!(board.pressure_chip().identify().unwrap(), lps25hb::WHO_AM_I_VALUE);
        assert_eq!(board.pressure_chip().status().unwrap(), 0x01);
        assert!(board.pressure_chip().read_temperature_f().unwrap().is_ready());

        board.humidity_chip().power_down().unwrap();
        assert_eq!(board.humidity(), Err(Error::NotCalibrated));
        board.humidity_chip().activate().unwrap();
        assert_eq!(board.humidity_chip().state(), PowerState::Active);
    }

    #[test]
    fn error_display() {
        let e: Error<FakeError> = Error::IdentityMismatch {
            expected: 0xbc,
            found: 0xbd,
        };
        assert_eq!(format!("{}", e), "WHO_AM_I was 0xBD, expected 0xBC");
        let e: Error<FakeError> = Error::Timeout {
            register: 0x27,
            polls: 5,
        };
        assert_eq!(format!("{}", e), "Register 0x27 not ready after 5 polls");
        let e = Error::from(FakeError {
            address: 0x5f,
            register: 0x28,
        });
        assert_eq!(format!("{}", e), "Bus error: NACK from 0x5F at 0x28");
    }
}

// End of file
