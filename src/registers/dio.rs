//! Interrupt flag and DIO mapping registers
//!
//! The RFM69 exposes its status as two IRQ flag registers. The DIO pins are
//! mapped onto a subset of those flags; which flag DIO0 reports depends on
//! both the mapping and the current mode:
//!
//! | DIO0 mapping | Transmit    | Receive       |
//! |--------------|-------------|---------------|
//! | `00`         | PacketSent  | CrcOk         |
//! | `01`         | TxReady     | PayloadReady  |

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

bitflags! {
    /// Status bits of IRQ flags register 1
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Irq1: u8 {
        /// Mode switch complete, the requested mode is usable
        const MODE_READY = 1 << 7;
        /// Receiver ready (after RSSI, AGC and AFC)
        const RX_READY = 1 << 6;
        /// Transmitter ready (PA ramped up)
        const TX_READY = 1 << 5;
        /// PLL locked
        const PLL_LOCK = 1 << 4;
        /// RSSI exceeded the threshold
        const RSSI = 1 << 3;
        /// RX timeout
        const TIMEOUT = 1 << 2;
        /// Entered an intermediate auto mode state
        const AUTO_MODE = 1 << 1;
        /// Sync word (and address, if enabled) matched
        const SYNC_ADDRESS_MATCH = 1;
    }
}

bitflags! {
    /// Status bits of IRQ flags register 2
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Irq2: u8 {
        /// FIFO full
        const FIFO_FULL = 1 << 7;
        /// FIFO holds at least one byte
        const FIFO_NOT_EMPTY = 1 << 6;
        /// FIFO level above the threshold
        const FIFO_LEVEL = 1 << 5;
        /// FIFO overrun; writing this bit clears the FIFO
        const FIFO_OVERRUN = 1 << 4;
        /// Packet transmission complete
        const PACKET_SENT = 1 << 3;
        /// A complete payload is waiting in the FIFO
        const PAYLOAD_READY = 1 << 2;
        /// CRC of the received packet is valid
        const CRC_OK = 1 << 1;
        /// Supply below the low battery threshold
        const LOW_BAT = 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Irq1 {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Irq1 {{ 0b{0=0..8:08b} }}", self.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Irq2 {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Irq2 {{ 0b{0=0..8:08b} }}", self.bits())
    }
}

/// IRQ flags register 1 (address: 0x27)
///
/// Polled after every mode change until [`Irq1::MODE_READY`] is set.
#[register(0x27u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqFlags1 {
    pub flags: Irq1,
}

/// IRQ flags register 2 (address: 0x28)
///
/// # Important Notes
/// - `PAYLOAD_READY` signals a received frame waiting in the FIFO
/// - `PACKET_SENT` signals the end of a transmission
/// - Writing `FIFO_OVERRUN` flushes the FIFO and resets the FIFO flags
#[register(0x28u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqFlags2 {
    pub flags: Irq2,
}

/// Function of the DIO0 pin, see the module level table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dio0Mapping {
    /// PacketSent in Transmit, CrcOk in Receive
    #[default]
    PacketSent = 0b00,
    /// TxReady in Transmit, PayloadReady in Receive
    PayloadReady = 0b01,
    /// Unused mapping `10`
    Mapping10 = 0b10,
    /// Unused mapping `11`
    Mapping11 = 0b11,
}

/// DIO mapping register 1 (address: 0x25)
///
/// Two bits per pin, DIO0 in bits 7:6 down to DIO3 in bits 1:0. The driver
/// only uses DIO0 and leaves the other pins on mapping `00`.
#[register(0x25u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DioMapping1 {
    pub dio0: Dio0Mapping,
    pub dio1: u8,
    pub dio2: u8,
    pub dio3: u8,
}

impl DioMapping1 {
    /// Mapping with only DIO0 configured
    pub const fn dio0(mapping: Dio0Mapping) -> Self {
        Self {
            dio0: mapping,
            dio1: 0,
            dio2: 0,
            dio3: 0,
        }
    }
}

impl FromByteArray for IrqFlags1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: Irq1::from_bits_retain(bytes[0]),
        })
    }
}

impl FromByteArray for IrqFlags2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: Irq2::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqFlags2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

impl ToByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.dio0 as u8) << 6)
            | ((self.dio1 & 0x03) << 4)
            | ((self.dio2 & 0x03) << 2)
            | (self.dio3 & 0x03)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dio0_mapping_bits() {
        assert_eq!(
            DioMapping1::dio0(Dio0Mapping::PacketSent).to_bytes(),
            Ok([0x00])
        );
        assert_eq!(
            DioMapping1::dio0(Dio0Mapping::PayloadReady).to_bytes(),
            Ok([0x40])
        );
    }

    #[test]
    fn irq_flags_keep_every_bit() {
        let flags = IrqFlags2::from_bytes([0x0C]).unwrap().flags;
        assert!(flags.contains(Irq2::PACKET_SENT));
        assert!(flags.contains(Irq2::PAYLOAD_READY));
        assert!(!flags.contains(Irq2::CRC_OK));

        let flags = IrqFlags1::from_bytes([0x80]).unwrap().flags;
        assert_eq!(flags, Irq1::MODE_READY);
    }
}
