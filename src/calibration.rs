//! * Calibration coefficients for the HTS221
//!
//! Each HTS221 is trimmed at the factory. Two known humidity points and two
//! known temperature points, together with the raw ADC codes the chip
//! produced at each of them, are stored in registers `0x30..=0x3F`. A raw
//! reading is turned into a physical value by interpolating between the
//! two points.
//!
//! | Register    | Contents                                       |
//! |-------------|------------------------------------------------|
//! | 0x30        | H0_rH_x2 (%RH × 2)                             |
//! | 0x31        | H1_rH_x2 (%RH × 2)                             |
//! | 0x32        | T0_degC_x8, bits 7:0 (°C × 8)                  |
//! | 0x33        | T1_degC_x8, bits 7:0 (°C × 8)                  |
//! | 0x35        | T1 bits 9:8 in [3:2], T0 bits 9:8 in [1:0]     |
//! | 0x36/0x37   | H0_T0_OUT                                      |
//! | 0x3A/0x3B   | H1_T0_OUT                                      |
//! | 0x3C/0x3D   | T0_OUT                                         |
//! | 0x3E/0x3F   | T1_OUT                                         |

use std::fmt;

use crate::bus::compose_word;

/// First calibration register.
pub const CALIBRATION_START: u8 = 0x30;
/// Last calibration register.
pub const CALIBRATION_END: u8 = 0x3f;
/// Number of registers in the calibration block.
pub const CALIBRATION_LEN: usize = (CALIBRATION_END - CALIBRATION_START) as usize + 1;

// Offsets into the calibration block
const H0_RH_X2: usize = 0x00;
const H1_RH_X2: usize = 0x01;
const T0_DEG_C_X8: usize = 0x02;
const T1_DEG_C_X8: usize = 0x03;
const T1_T0_MSB: usize = 0x05;
const H0_T0_OUT: usize = 0x06;
const H1_T0_OUT: usize = 0x0a;
const T0_OUT: usize = 0x0c;
const T1_OUT: usize = 0x0e;

const T0_MSB_SHIFT: u32 = 0;
const T1_MSB_SHIFT: u32 = 2;

/// Which measurement a calibration problem affects.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Channel {
    Humidity,
    Temperature,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    /// Both calibration points produced the same ADC code, so there is no
    /// slope to interpolate along.
    DegenerateSpan(Channel),
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CalibrationError::DegenerateSpan(channel) => {
                write!(f, "{:?} calibration points share one ADC code", channel)
            }
        }
    }
}

impl std::error::Error for CalibrationError {}

/// Assemble a 10-bit temperature calibration point from its low byte and
/// the two bits at `shift` in the shared MSB register.
pub fn temperature_point(low: u8, msb: u8, shift: u32) -> u16 {
    (u16::from((msb >> shift) & 0x03) << 8) | u16::from(low)
}

/// The decoded calibration block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Calibration {
    pub h0_rh_x2: u8,
    pub h1_rh_x2: u8,
    pub t0_deg_c_x8: u16,
    pub t1_deg_c_x8: u16,
    pub h0_t0_out: u16,
    pub h1_t0_out: u16,
    pub t0_out: u16,
    pub t1_out: u16,
}

impl Calibration {
    /// Decode the registers `0x30..=0x3F`, in address order.
    pub fn from_registers(block: &[u8; CALIBRATION_LEN]) -> Calibration {
        let msb = block[T1_T0_MSB];
        let word = |offset: usize| compose_word(block[offset], block[offset + 1]);
        Calibration {
            h0_rh_x2: block[H0_RH_X2],
            h1_rh_x2: block[H1_RH_X2],
            t0_deg_c_x8: temperature_point(block[T0_DEG_C_X8], msb, T0_MSB_SHIFT),
            t1_deg_c_x8: temperature_point(block[T1_DEG_C_X8], msb, T1_MSB_SHIFT),
            h0_t0_out: word(H0_T0_OUT),
            h1_t0_out: word(H1_T0_OUT),
            t0_out: word(T0_OUT),
            t1_out: word(T1_OUT),
        }
    }

    /// Check that both channels can be converted.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        self.humidity_span()?;
        self.temperature_span()?;
        Ok(())
    }

    fn humidity_span(&self) -> Result<f64, CalibrationError> {
        span(self.h0_t0_out, self.h1_t0_out, Channel::Humidity)
    }

    fn temperature_span(&self) -> Result<f64, CalibrationError> {
        span(self.t0_out, self.t1_out, Channel::Temperature)
    }

    /// Convert a raw `H_OUT` code to %RH.
    pub fn humidity_percent(&self, raw: u16) -> Result<f64, CalibrationError> {
        let adc_span = self.humidity_span()?;
        let h0 = f64::from(self.h0_rh_x2);
        let h1 = f64::from(self.h1_rh_x2);
        let half_span = (h1 - h0) / 2.0;
        Ok((f64::from(raw) - f64::from(self.h0_t0_out)) * half_span / adc_span + h0 / 2.0)
    }

    /// Convert a raw `T_OUT` code to °C.
    pub fn temperature_celsius(&self, raw: u16) -> Result<f64, CalibrationError> {
        let adc_span = self.temperature_span()?;
        let t0 = f64::from(self.t0_deg_c_x8);
        let t1 = f64::from(self.t1_deg_c_x8);
        let deg_span = (t1 - t0) / 8.0;
        Ok((f64::from(raw) - f64::from(self.t0_out)) * deg_span / adc_span + t0 / 8.0)
    }
}

fn span(out0: u16, out1: u16, channel: Channel) -> Result<f64, CalibrationError> {
    if out0 == out1 {
        Err(CalibrationError::DegenerateSpan(channel))
    } else {
        Ok(f64::from(out1) - f64::from(out0))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// H0 = 32 %RH at 1000, H1 = 72 %RH at 9000,
    /// T0 = 34.25 °C at 300, T1 = 42.0 °C at 700.
    pub(crate) const BLOCK: [u8; CALIBRATION_LEN] = [
        0x40, 0x90, 0x12, 0x50, 0x00, 0x05, 0xe8, 0x03, //
        0x00, 0x00, 0x28, 0x23, 0x2c, 0x01, 0xbc, 0x02,
    ];

    fn sample() -> Calibration {
        Calibration::from_registers(&BLOCK)
    }

    #[test]
    fn block_len() {
        assert_eq!(CALIBRATION_LEN, 16);
    }

    #[test]
    fn point_bits() {
        assert_eq!(temperature_point(0x12, 0b01, T0_MSB_SHIFT), 0x112);
        assert_eq!(temperature_point(0x12, 0b0100, T1_MSB_SHIFT), 0x112);
        // Only the two selected bits are used
        assert_eq!(temperature_point(0xff, 0b1111_1110, T0_MSB_SHIFT), 0x2ff);
        assert_eq!(temperature_point(0x00, 0b1111_0011, T1_MSB_SHIFT), 0x000);
        assert_eq!(temperature_point(0x34, 0b1100, T1_MSB_SHIFT), 0x334);
    }

    #[test]
    fn decode() {
        assert_eq!(
            sample(),
            Calibration {
                h0_rh_x2: 0x40,
                h1_rh_x2: 0x90,
                t0_deg_c_x8: 0x112,
                t1_deg_c_x8: 0x150,
                h0_t0_out: 1000,
                h1_t0_out: 9000,
                t0_out: 300,
                t1_out: 700,
            }
        );
    }

    #[test]
    fn exact_at_calibration_points() {
        let cal = sample();
        assert_eq!(cal.humidity_percent(cal.h0_t0_out), Ok(32.0));
        assert_eq!(cal.humidity_percent(cal.h1_t0_out), Ok(72.0));
        assert_eq!(cal.temperature_celsius(cal.t0_out), Ok(34.25));
        assert_eq!(cal.temperature_celsius(cal.t1_out), Ok(42.0));
    }

    #[test]
    fn interpolates() {
        let cal = sample();
        assert_eq!(cal.humidity_percent(5000), Ok(52.0));
        assert_eq!(cal.temperature_celsius(500), Ok(38.125));
        // Extrapolates outside the calibration points
        assert_eq!(cal.humidity_percent(0), Ok(27.0));
    }

    #[test]
    fn monotonic_between_points() {
        let cal = sample();
        let mut last = std::f64::MIN;
        for raw in cal.h0_t0_out..=cal.h1_t0_out {
            let rh = cal.humidity_percent(raw).unwrap();
            assert!(rh >= last);
            last = rh;
        }
        let mut last = std::f64::MIN;
        for raw in cal.t0_out..=cal.t1_out {
            let t = cal.temperature_celsius(raw).unwrap();
            assert!(t >= last);
            last = t;
        }
    }

    #[test]
    fn swapped_points_still_decrease_consistently() {
        let mut cal = sample();
        std::mem::swap(&mut cal.t0_out, &mut cal.t1_out);
        assert_eq!(cal.temperature_celsius(700), Ok(34.25));
        assert_eq!(cal.temperature_celsius(300), Ok(42.0));
    }

    #[test]
    fn degenerate_span() {
        let mut cal = sample();
        cal.h1_t0_out = cal.h0_t0_out;
        assert_eq!(
            cal.humidity_percent(1234),
            Err(CalibrationError::DegenerateSpan(Channel::Humidity))
        );
        assert_eq!(cal.validate(), Err(CalibrationError::DegenerateSpan(Channel::Humidity)));
        // The other channel is unaffected
        assert_eq!(cal.temperature_celsius(300), Ok(34.25));

        let mut cal = sample();
        cal.t1_out = cal.t0_out;
        assert_eq!(
            cal.temperature_celsius(cal.t0_out),
            Err(CalibrationError::DegenerateSpan(Channel::Temperature))
        );
    }

    #[test]
    fn sample_block_is_valid() {
        assert_eq!(sample().validate(), Ok(()));
    }
}

// End of file
