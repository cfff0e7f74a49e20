//! * Settings for the drivers and the board

use std::path::PathBuf;
use std::time::Duration;

use crate::hts221;
use crate::lps25hb::{self, ByteWeighting};

/// The I2C bus the sensors sit on, on a Raspberry Pi.
pub const DEFAULT_BUS_PATH: &str = "/dev/i2c-1";

/// Settings for an HTS221.
#[derive(Debug, Clone, PartialEq)]
pub struct Hts221Config {
    /// 7-bit I2C address
    pub address: u8,
    /// How many times to check the status register before giving up on a
    /// reading. Zero is treated as one.
    pub max_status_polls: u32,
    /// How long to sleep between status checks
    pub poll_interval: Duration,
}

impl Default for Hts221Config {
    fn default() -> Hts221Config {
        // At the 1 Hz output data rate a sample can be up to a second away
        Hts221Config {
            address: hts221::ADDRESS,
            max_status_polls: 1000,
            poll_interval: Duration::from_millis(2),
        }
    }
}

/// Settings for an LPS25HB.
#[derive(Debug, Clone, PartialEq)]
pub struct Lps25hbConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// How the output bytes are weighted when building a reading
    pub weighting: ByteWeighting,
}

impl Default for Lps25hbConfig {
    fn default() -> Lps25hbConfig {
        Lps25hbConfig {
            address: lps25hb::ADDRESS,
            weighting: ByteWeighting::default(),
        }
    }
}

/// Everything needed to bring up both sensors.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bus_path: PathBuf,
    pub hts221: Hts221Config,
    pub lps25hb: Lps25hbConfig,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            bus_path: PathBuf::from(DEFAULT_BUS_PATH),
            hts221: Hts221Config::default(),
            lps25hb: Lps25hbConfig::default(),
        }
    }
}

impl Config {
    pub fn with_bus_path<P: Into<PathBuf>>(mut self, path: P) -> Config {
        self.bus_path = path.into();
        self
    }

    pub fn with_weighting(mut self, weighting: ByteWeighting) -> Config {
        self.lps25hb.weighting = weighting;
        self
    }
}


// End of file
