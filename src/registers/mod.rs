//! Register definitions for the RFM69 / SX1231
//!
//! [`Register`] is the flat address map used for raw access. The submodules
//! hold typed views of the registers whose bit layout the driver interprets.
//!
//! SPI access encodes the direction in bit 7 of the address byte: set for a
//! read, cleared for a write.

mod dio;
mod packet;
mod rf;
mod system;

pub use dio::*;
pub use packet::*;
pub use rf::*;
pub use system::*;

/// Register addresses used by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Fifo = 0x00,
    OpMode = 0x01,
    DataModul = 0x02,
    BitrateMsb = 0x03,
    BitrateLsb = 0x04,
    FdevMsb = 0x05,
    FdevLsb = 0x06,
    FrfMsb = 0x07,
    FrfMid = 0x08,
    FrfLsb = 0x09,
    Version = 0x10,
    PaLevel = 0x11,
    Ocp = 0x13,
    RxBw = 0x19,
    RssiConfig = 0x23,
    RssiValue = 0x24,
    DioMapping1 = 0x25,
    DioMapping2 = 0x26,
    IrqFlags1 = 0x27,
    IrqFlags2 = 0x28,
    RssiThresh = 0x29,
    SyncConfig = 0x2E,
    SyncValue1 = 0x2F,
    SyncValue2 = 0x30,
    PacketConfig1 = 0x37,
    PayloadLength = 0x38,
    NodeAddress = 0x39,
    FifoThresh = 0x3C,
    PacketConfig2 = 0x3D,
    Temp1 = 0x4E,
    Temp2 = 0x4F,
    TestPa1 = 0x5A,
    TestPa2 = 0x5C,
    TestDagc = 0x6F,
}

impl Register {
    /// Raw register address
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Address byte that starts a read access
    pub const fn read(self) -> u8 {
        self.addr() | 0x80
    }

    /// Address byte that starts a write access
    pub const fn write(self) -> u8 {
        self.addr() & 0x7F
    }
}

impl From<Register> for u8 {
    fn from(value: Register) -> Self {
        value.addr()
    }
}
