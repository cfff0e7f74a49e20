//! # Units and reading wrappers that the measurements crate doesn't cover

use std::fmt;

/// The value the reference firmware returned for a temperature that wasn't
/// ready yet: zero kelvin, which no sensor can actually report.
pub const ABSOLUTE_ZERO_CELSIUS: f64 = -273.15;

/// The value the reference firmware returned for a pressure that wasn't
/// ready yet.
pub const PRESSURE_NOT_READY: f64 = -1.0;

/// Represents a relative humidity reading from the humidity sensor
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RelativeHumidity {
    value: f64,
}

impl RelativeHumidity {
    pub fn from_percent(pc: f64) -> RelativeHumidity {
        RelativeHumidity { value: pc }
    }

    pub fn as_percent(&self) -> f64 {
        self.value
    }
}

impl fmt::Display for RelativeHumidity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.1}%", self.as_percent())
    }
}

/// The outcome of a single, non-blocking look at a data register.
///
/// The sensor only raises its data-ready bits once per output period, so a
/// read that checks the status register once can legitimately find nothing
/// new. That is not an error and is kept apart from the `Err` path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Sample<T> {
    /// A fresh value was available
    Ready(T),
    /// The status register said the data was not ready yet
    NotReady,
}

impl<T> Sample<T> {
    pub fn is_ready(&self) -> bool {
        match self {
            Sample::Ready(_) => true,
            Sample::NotReady => false,
        }
    }

    /// Converts into an `Option`, discarding the not-ready case.
    pub fn ready(self) -> Option<T> {
        match self {
            Sample::Ready(value) => Some(value),
            Sample::NotReady => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Sample<U> {
        match self {
            Sample::Ready(value) => Sample::Ready(f(value)),
            Sample::NotReady => Sample::NotReady,
        }
    }

    /// Returns the value, or `sentinel` if none was ready. Pass
    /// [`ABSOLUTE_ZERO_CELSIUS`] or [`PRESSURE_NOT_READY`] to get the
    /// reference firmware's behaviour.
    pub fn unwrap_or(self, sentinel: T) -> T {
        match self {
            Sample::Ready(value) => value,
            Sample::NotReady => sentinel,
        }
    }
}

/// Convert degrees Celsius to degrees Fahrenheit.
///
/// Done directly rather than through `measurements::Temperature`, which goes
/// via kelvin and doesn't map -273.15 onto exactly -459.67.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}


// End of file
