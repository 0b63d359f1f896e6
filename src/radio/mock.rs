//! Expected bus traffic for driver tests

use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

use crate::config::{config_table, FrequencyBand};

/// Builder for the transactions a radio operation is expected to perform
#[derive(Default)]
pub struct Script {
    transactions: Vec<SpiTransaction<u8>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, body: Vec<SpiTransaction<u8>>) -> Self {
        self.transactions.push(SpiTransaction::transaction_start());
        self.transactions.extend(body);
        self.transactions.push(SpiTransaction::transaction_end());
        self
    }

    /// Single register read returning `value`
    pub fn read(self, register: u8, value: u8) -> Self {
        self.push(vec![
            SpiTransaction::write(register | 0x80),
            SpiTransaction::read(value),
        ])
    }

    /// Single raw register write
    pub fn write(self, register: u8, value: u8) -> Self {
        self.push(vec![SpiTransaction::write_vec(vec![register, value])])
    }

    /// Typed register write, address and value go out as two operations
    pub fn write_typed(self, register: u8, value: u8) -> Self {
        self.push(vec![
            SpiTransaction::write(register),
            SpiTransaction::write_vec(vec![value]),
        ])
    }

    pub fn write_fifo(self, bytes: &[u8]) -> Self {
        self.push(vec![
            SpiTransaction::write(0x00),
            SpiTransaction::write_vec(bytes.to_vec()),
        ])
    }

    pub fn read_fifo(self, bytes: &[u8]) -> Self {
        self.push(vec![
            SpiTransaction::write(0x80),
            SpiTransaction::read_vec(bytes.to_vec()),
        ])
    }

    /// Opmode read-modify-write from `current` to the `target` mode bits
    pub fn opmode(self, current: u8, target: u8) -> Self {
        self.read(0x01, current)
            .write(0x01, (current & 0xE3) | target)
    }

    pub fn mode_ready(self) -> Self {
        self.read(0x27, 0x80)
    }

    /// PA test register pair
    pub fn pa(self, boost: bool) -> Self {
        if boost {
            self.write_typed(0x5A, 0x5D).write_typed(0x5C, 0x7C)
        } else {
            self.write_typed(0x5A, 0x55).write_typed(0x5C, 0x70)
        }
    }

    /// Mode change without PA traffic
    pub fn mode(self, current: u8, target: u8) -> Self {
        self.opmode(current, target).mode_ready()
    }

    /// Mode change on a high power radio
    pub fn mode_with_pa(self, current: u8, target: u8, boost: bool) -> Self {
        self.opmode(current, target).pa(boost).mode_ready()
    }

    pub fn table(mut self, band: FrequencyBand, network_id: u8) -> Self {
        for entry in config_table(band, network_id) {
            self = self.write(entry.register.addr(), entry.value);
        }
        self
    }

    /// Full `initialize` with the high power path selected
    pub fn initialize(self, band: FrequencyBand, network_id: u8) -> Self {
        self.table(band, network_id)
            .read(0x3D, 0x12)
            .write(0x3D, 0x12)
            .write_typed(0x13, 0x0F)
            .read(0x11, 0x9F)
            .write(0x11, 0x7F)
            .mode(0x04, 0x04)
    }

    pub fn build(self) -> SpiMock<u8> {
        SpiMock::new(&self.transactions)
    }

    /// Device failing transaction number `index` (counting from zero). The
    /// script lists every other transaction; the mock is returned for
    /// `done()`.
    pub fn build_failing_at(self, index: usize) -> (SpiMock<u8>, FailingSpi) {
        let mock = self.build();
        let spi = FailingSpi {
            inner: mock.clone(),
            fail_at: index,
            count: 0,
        };
        (mock, spi)
    }
}

/// SPI device with one broken transaction
pub struct FailingSpi {
    inner: SpiMock<u8>,
    fail_at: usize,
    count: usize,
}

impl ErrorType for FailingSpi {
    type Error = ErrorKind;
}

impl SpiDevice for FailingSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let index = self.count;
        self.count += 1;
        if index == self.fail_at {
            return Err(ErrorKind::Other);
        }
        self.inner.transaction(operations)
    }
}
