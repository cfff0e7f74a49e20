//! * Register transport shared by the sensor drivers
//!
//! Both chips only ever need single-byte register reads and writes. The
//! drivers talk to the bus through [`RegisterTransport`], and share one
//! transport through a [`SharedBus`] so that a read-modify-write, or the
//! two or three reads that make up a sample, can't be interleaved with
//! traffic from the other driver.

use std::sync::{Arc, Mutex};

use byteorder::{ByteOrder, LittleEndian};
use i2cdev::core::I2CDevice;
#[cfg(any(target_os = "linux", target_os = "android"))]
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::trace;

use crate::{Error, SensorResult};

/// Build a 16-bit word from the low and high register bytes.
pub fn compose_word(low: u8, high: u8) -> u16 {
    LittleEndian::read_u16(&[low, high])
}

/// Single-byte register access to any device on the bus.
pub trait RegisterTransport {
    type Error;

    /// Read one register from the device at the 7-bit `address`.
    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, Self::Error>;

    /// Write one register on the device at the 7-bit `address`.
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error>;

    /// Read a register, pass it through `f` and write the result back.
    /// Returns the value written.
    fn modify_byte<F>(&mut self, address: u8, register: u8, f: F) -> Result<u8, Self::Error>
    where
        F: FnOnce(u8) -> u8,
    {
        let old = self.read_byte(address, register)?;
        let new = f(old);
        self.write_byte(address, register, new)?;
        Ok(new)
    }

    /// Read a little-endian word held in two byte registers, low first.
    fn read_word(&mut self, address: u8, low: u8, high: u8) -> Result<u16, Self::Error> {
        let low = self.read_byte(address, low)?;
        let high = self.read_byte(address, high)?;
        Ok(compose_word(low, high))
    }
}

/// A handle to a transport that several drivers can hold at once.
pub struct SharedBus<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SharedBus<T> {
    fn clone(&self) -> SharedBus<T> {
        SharedBus {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedBus<T>
where
    T: RegisterTransport,
{
    pub fn new(transport: T) -> SharedBus<T> {
        SharedBus {
            inner: Arc::new(Mutex::new(transport)),
        }
    }

    /// Run `f` with exclusive access to the bus. The lock is held for the
    /// whole closure and dropped however it returns.
    pub fn transaction<R, F>(&self, f: F) -> SensorResult<R, T::Error>
    where
        F: FnOnce(&mut T) -> Result<R, T::Error>,
    {
        let mut guard = self.inner.lock().map_err(|_| Error::BusPoisoned)?;
        f(&mut *guard).map_err(Error::Transport)
    }
}

/// An `i2cdev` device that can be pointed at a different slave address.
pub trait SelectSlave: I2CDevice {
    fn select_slave(&mut self, address: u8) -> Result<(), Self::Error>;
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl SelectSlave for LinuxI2CDevice {
    fn select_slave(&mut self, address: u8) -> Result<(), LinuxI2CError> {
        self.set_slave_address(u16::from(address))
    }
}

/// [`RegisterTransport`] over an `i2cdev` SMBus device.
///
/// The device file is opened once; the slave address is only changed when
/// consecutive accesses target different chips.
pub struct I2cdevBus<D> {
    device: D,
    selected: Option<u8>,
}

impl<D> I2cdevBus<D>
where
    D: SelectSlave,
{
    pub fn new(device: D) -> I2cdevBus<D> {
        I2cdevBus {
            device,
            selected: None,
        }
    }

    fn select(&mut self, address: u8) -> Result<(), D::Error> {
        if self.selected != Some(address) {
            trace!("[i2c] select slave 0x{:02X}", address);
            // Unknown until the ioctl succeeds
            self.selected = None;
            self.device.select_slave(address)?;
            self.selected = Some(address);
        }
        Ok(())
    }
}

impl<D> RegisterTransport for I2cdevBus<D>
where
    D: SelectSlave,
{
    type Error = D::Error;

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, D::Error> {
        self.select(address)?;
        let value = self.device.smbus_read_byte_data(register)?;
        trace!("[i2c] 0x{:02X} read 0x{:02X} -> 0x{:02X}", address, register, value);
        Ok(value)
    }

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), D::Error> {
        self.select(address)?;
        trace!("[i2c] 0x{:02X} write 0x{:02X} <- 0x{:02X}", address, register, value);
        self.device.smbus_write_byte_data(register, value)
    }
}

/// The Linux `/dev/i2c-N` bus.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub type LinuxBus = I2cdevBus<LinuxI2CDevice>;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl I2cdevBus<LinuxI2CDevice> {
    /// Open the given I2C character device, e.g. `/dev/i2c-1`.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<LinuxBus, LinuxI2CError> {
        // The slave address is set on first use
        let device = LinuxI2CDevice::new(path, 0)?;
        Ok(I2cdevBus::new(device))
    }
}



// End of file
