//! RFM69 register access layer
//!
//! This module provides the low-level interface to the RFM69 register file
//! over SPI. It supports both synchronous and asynchronous operations.
//!
//! Every access is one SPI transaction that starts with an address byte.
//! Bit 7 of that byte selects the direction: set for a read, cleared for a
//! write. Register values are never cached; every read goes to the bus.
//!
//! The interface is built around the `Device<SPI>` struct which wraps an SPI
//! interface and provides methods for:
//! - Raw single register reads and writes
//! - Read-modify-write of selected bits
//! - Burst access to the FIFO
//! - Typed register access through `regiface`
//!
//! # Example
//! ```no_run
//! use rfm69::{Device, Register};
//!
//! fn version<SPI: embedded_hal::spi::SpiDevice>(spi: SPI) -> Result<u8, rfm69::Error<SPI::Error>> {
//!     let mut device = Device::new(spi);
//!     device.read(Register::Version)
//! }
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use regiface::{ByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::{Error, Register};

/// Register interface of the RFM69.
///
/// This struct wraps an SPI interface and provides methods to access the
/// radio's registers and FIFO. It supports both synchronous operations
/// through the embedded-hal traits and asynchronous operations through
/// embedded-hal-async.
pub struct Device<SPI> {
    spi: SPI,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    ///
    /// # Arguments
    /// * `spi` - An SPI interface implementing the required embedded-hal traits
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

fn serialize<R>(register: R) -> R::Array
where
    R: ToByteArray<Error = Infallible>,
{
    match register.to_bytes() {
        Ok(bytes) => bytes,
        Err(never) => match never {},
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads a single register.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn read(&mut self, register: Register) -> Result<u8, Error<SPI::Error>> {
        let mut value = [0u8];

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[register.read()]),
                embedded_hal::spi::Operation::Read(&mut value),
            ])
            .map_err(Error::Bus)?;

        Ok(value[0])
    }

    /// Writes a single register.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn write(&mut self, register: Register, value: u8) -> Result<(), Error<SPI::Error>> {
        self.spi
            .transaction(&mut [embedded_hal::spi::Operation::Write(&[
                register.write(),
                value,
            ])])
            .map_err(Error::Bus)
    }

    /// Read-modify-write of a register: `new = (old & mask) | bits`.
    ///
    /// `mask` selects the bits that are kept. The two accesses are separate
    /// transactions, so this relies on the driver owning the bus.
    pub fn conditional_set(
        &mut self,
        register: Register,
        mask: u8,
        bits: u8,
    ) -> Result<(), Error<SPI::Error>> {
        let current = self.read(register)?;
        self.write(register, (current & mask) | bits)
    }

    /// Writes `value` and reads the register back until it equals
    /// `expected`.
    ///
    /// Returns `Ok(false)` once `timeout_ms` has elapsed without a match;
    /// only bus failures are errors.
    pub fn write_and_poll_until<D: DelayNs>(
        &mut self,
        delay: &mut D,
        register: Register,
        value: u8,
        expected: u8,
        timeout_ms: u32,
    ) -> Result<bool, Error<SPI::Error>> {
        let mut elapsed_ms = 0;
        loop {
            self.write(register, value)?;
            if self.read(register)? == expected {
                return Ok(true);
            }
            if elapsed_ms >= timeout_ms {
                return Ok(false);
            }
            delay.delay_ms(1);
            elapsed_ms += 1;
        }
    }

    /// Writes consecutive bytes to a register in one transaction.
    ///
    /// Used for FIFO loads: the FIFO address does not auto-increment, so
    /// every byte is pushed into the FIFO.
    pub fn write_burst(&mut self, register: Register, bytes: &[u8]) -> Result<(), Error<SPI::Error>> {
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[register.write()]),
                embedded_hal::spi::Operation::Write(bytes),
            ])
            .map_err(Error::Bus)
    }

    /// Reads consecutive bytes from a register in one transaction.
    pub fn read_burst(&mut self, register: Register, bytes: &mut [u8]) -> Result<(), Error<SPI::Error>> {
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[register.read()]),
                embedded_hal::spi::Operation::Read(bytes),
            ])
            .map_err(Error::Bus)
    }

    /// Reads a register value from the device.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u8 ID
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Deserialization` - Failed to parse register value
    pub fn read_register<R>(&mut self) -> Result<R, Error<SPI::Error>>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[R::id() | 0x80]),
                embedded_hal::spi::Operation::Read(raw_value.as_mut()),
            ])
            .map_err(Error::Bus)?;

        R::from_bytes(raw_value).map_err(|_| Error::Deserialization)
    }

    /// Writes a value to a device register.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), Error<SPI::Error>>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = serialize(register);

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[R::id() & 0x7F]),
                embedded_hal::spi::Operation::Write(raw_value.as_ref()),
            ])
            .map_err(Error::Bus)
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Asynchronously reads a single register.
    ///
    /// This is the async version of [`read`](Device::read).
    pub async fn read_async(&mut self, register: Register) -> Result<u8, Error<SPI::Error>> {
        let mut value = [0u8];

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[register.read()]),
                embedded_hal_async::spi::Operation::Read(&mut value),
            ])
            .await
            .map_err(Error::Bus)?;

        Ok(value[0])
    }

    /// Asynchronously writes a single register.
    ///
    /// This is the async version of [`write`](Device::write).
    pub async fn write_async(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), Error<SPI::Error>> {
        self.spi
            .transaction(&mut [embedded_hal_async::spi::Operation::Write(&[
                register.write(),
                value,
            ])])
            .await
            .map_err(Error::Bus)
    }

    /// Asynchronous read-modify-write.
    ///
    /// This is the async version of [`conditional_set`](Device::conditional_set).
    pub async fn conditional_set_async(
        &mut self,
        register: Register,
        mask: u8,
        bits: u8,
    ) -> Result<(), Error<SPI::Error>> {
        let current = self.read_async(register).await?;
        self.write_async(register, (current & mask) | bits).await
    }

    /// Asynchronously writes consecutive bytes to a register.
    ///
    /// This is the async version of [`write_burst`](Device::write_burst).
    pub async fn write_burst_async(
        &mut self,
        register: Register,
        bytes: &[u8],
    ) -> Result<(), Error<SPI::Error>> {
        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[register.write()]),
                embedded_hal_async::spi::Operation::Write(bytes),
            ])
            .await
            .map_err(Error::Bus)
    }

    /// Asynchronously reads consecutive bytes from a register.
    ///
    /// This is the async version of [`read_burst`](Device::read_burst).
    pub async fn read_burst_async(
        &mut self,
        register: Register,
        bytes: &mut [u8],
    ) -> Result<(), Error<SPI::Error>> {
        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[register.read()]),
                embedded_hal_async::spi::Operation::Read(bytes),
            ])
            .await
            .map_err(Error::Bus)
    }

    /// Asynchronously reads a register value from the device.
    ///
    /// This is the async version of [`read_register`](Device::read_register).
    pub async fn read_register_async<R>(&mut self) -> Result<R, Error<SPI::Error>>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[R::id() | 0x80]),
                embedded_hal_async::spi::Operation::Read(raw_value.as_mut()),
            ])
            .await
            .map_err(Error::Bus)?;

        R::from_bytes(raw_value).map_err(|_| Error::Deserialization)
    }

    /// Asynchronously writes a value to a device register.
    ///
    /// This is the async version of [`write_register`](Device::write_register).
    pub async fn write_register_async<R>(&mut self, register: R) -> Result<(), Error<SPI::Error>>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = serialize(register);

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[R::id() & 0x7F]),
                embedded_hal_async::spi::Operation::Write(raw_value.as_ref()),
            ])
            .await
            .map_err(Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{Irq1, IrqFlags1, OpMode, TestPa1};
    use crate::Mode;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn read_sets_the_direction_bit() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x90),
            SpiTransaction::read(0x24),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi.clone());

        assert_eq!(device.read(Register::Version).unwrap(), 0x24);

        spi.done();
    }

    #[test]
    fn write_clears_the_direction_bit() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x30, 100]),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi.clone());

        device.write(Register::SyncValue2, 100).unwrap();

        spi.done();
    }

    #[test]
    fn conditional_set_keeps_masked_bits() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x81),
            SpiTransaction::read(0x84),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x01, 0x90]),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi.clone());

        device
            .conditional_set(Register::OpMode, OpMode::PRESERVE_MASK, Mode::Receive.bits())
            .unwrap();

        spi.done();
    }

    #[test]
    fn write_and_poll_until_matches() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x2F, 0xAA]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0xAF),
            SpiTransaction::read(0x00),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x2F, 0xAA]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0xAF),
            SpiTransaction::read(0xAA),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi.clone());

        let matched = device
            .write_and_poll_until(&mut NoopDelay::new(), Register::SyncValue1, 0xAA, 0xAA, 50)
            .unwrap();
        assert!(matched);

        spi.done();
    }

    #[test]
    fn write_and_poll_until_gives_up() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x2F, 0x55]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0xAF),
            SpiTransaction::read(0x00),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x2F, 0x55]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0xAF),
            SpiTransaction::read(0x00),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi.clone());

        let matched = device
            .write_and_poll_until(&mut NoopDelay::new(), Register::SyncValue1, 0x55, 0x55, 1)
            .unwrap();
        assert!(!matched);

        spi.done();
    }

    #[test]
    fn fifo_burst() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x00),
            SpiTransaction::write_vec(vec![5, 1, 2, 0, b'h', b'i']),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x80),
            SpiTransaction::read_vec(vec![7, 8, 9]),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi.clone());

        device
            .write_burst(Register::Fifo, &[5, 1, 2, 0, b'h', b'i'])
            .unwrap();

        let mut buf = [0u8; 3];
        device.read_burst(Register::Fifo, &mut buf).unwrap();
        assert_eq!(buf, [7, 8, 9]);

        spi.done();
    }

    #[test]
    fn typed_registers() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0xA7),
            SpiTransaction::read(0x80),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x5A),
            SpiTransaction::write_vec(vec![0x5D]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x81),
            SpiTransaction::read(0x1C),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi.clone());

        let irq = device.read_register::<IrqFlags1>().unwrap();
        assert_eq!(irq.flags, Irq1::MODE_READY);

        device.write_register(TestPa1 { boost: true }).unwrap();

        assert_eq!(
            device.read_register::<OpMode>(),
            Err(Error::Deserialization)
        );

        spi.done();
    }

    mod asynchronous {
        use super::*;
        use futures_test::test;

        #[test]
        async fn read_and_write() {
            let mut spi = SpiMock::new(&[
                SpiTransaction::transaction_start(),
                SpiTransaction::write(0x90),
                SpiTransaction::read(0x24),
                SpiTransaction::transaction_end(),
                SpiTransaction::transaction_start(),
                SpiTransaction::write_vec(vec![0x3D, 0x12]),
                SpiTransaction::transaction_end(),
            ]);
            let mut device = Device::new(spi.clone());

            assert_eq!(device.read_async(Register::Version).await.unwrap(), 0x24);
            device
                .write_async(Register::PacketConfig2, 0x12)
                .await
                .unwrap();

            spi.done();
        }

        #[test]
        async fn conditional_set_and_typed_access() {
            let mut spi = SpiMock::new(&[
                SpiTransaction::transaction_start(),
                SpiTransaction::write(0xBD),
                SpiTransaction::read(0x12),
                SpiTransaction::transaction_end(),
                SpiTransaction::transaction_start(),
                SpiTransaction::write_vec(vec![0x3D, 0x16]),
                SpiTransaction::transaction_end(),
                SpiTransaction::transaction_start(),
                SpiTransaction::write(0xA7),
                SpiTransaction::read(0x00),
                SpiTransaction::transaction_end(),
                SpiTransaction::transaction_start(),
                SpiTransaction::write(0x5C),
                SpiTransaction::write_vec(vec![0x70]),
                SpiTransaction::transaction_end(),
            ]);
            let mut device = Device::new(spi.clone());

            device
                .conditional_set_async(Register::PacketConfig2, 0xFB, 0x04)
                .await
                .unwrap();

            let irq = device.read_register_async::<IrqFlags1>().await.unwrap();
            assert!(!irq.flags.contains(Irq1::MODE_READY));

            device
                .write_register_async(crate::registers::TestPa2 { boost: false })
                .await
                .unwrap();

            spi.done();
        }

        #[test]
        async fn fifo_burst() {
            let mut spi = SpiMock::new(&[
                SpiTransaction::transaction_start(),
                SpiTransaction::write(0x00),
                SpiTransaction::write_vec(vec![3, 255, 1, 0]),
                SpiTransaction::transaction_end(),
                SpiTransaction::transaction_start(),
                SpiTransaction::write(0x80),
                SpiTransaction::read_vec(vec![1, 2]),
                SpiTransaction::transaction_end(),
            ]);
            let mut device = Device::new(spi.clone());

            device
                .write_burst_async(Register::Fifo, &[3, 255, 1, 0])
                .await
                .unwrap();
            let mut buf = [0u8; 2];
            device
                .read_burst_async(Register::Fifo, &mut buf)
                .await
                .unwrap();
            assert_eq!(buf, [1, 2]);

            spi.done();
        }
    }
}
