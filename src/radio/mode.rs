//! Chip mode state machine and power amplifier control
//!
//! # Mode transitions
//! Every transition updates the mode bits of the opmode register, keeping
//! the sequencer and listen bits, and then waits for `MODE_READY`.
//!
//! # High power path
//! With PA1 + PA2 selected the +20 dBm boost registers follow the mode:
//! boosted while transmitting, normal otherwise. Over-current protection
//! stays off while the high power path is selected.

use embedded_hal::delay::DelayNs;

use super::Radio;
use crate::registers::{Irq1, IrqFlags1, Mode, Ocp, OpMode, PaLevel, TestPa1, TestPa2};
use crate::{Error, Register};

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: DelayNs,
{
    /// Switches the chip to `mode`.
    ///
    /// Does nothing when `mode` is already the recorded mode and the last
    /// transition completed.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Timeout` - `MODE_READY` did not show up within
    ///   [`Config::wait_timeout_ms`](crate::Config::wait_timeout_ms). The
    ///   requested mode is recorded as unresolved and the next `set_mode`
    ///   always reaches the chip.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<SPI::Error>> {
        if self.mode_ready && mode == self.mode {
            return Ok(());
        }
        self.apply_mode(mode)
    }

    /// Performs the transition even when `mode` is already recorded.
    pub(crate) fn apply_mode(&mut self, mode: Mode) -> Result<(), Error<SPI::Error>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("Mode {} -> {}", self.mode, mode);

        let previous = self.mode;
        self.mode = mode;
        self.mode_ready = false;

        self.device
            .conditional_set(Register::OpMode, OpMode::PRESERVE_MASK, mode.bits())?;

        if self.high_power {
            match mode {
                Mode::Transmit => self.set_boost(true)?,
                Mode::Receive => self.set_boost(false)?,
                _ if previous == Mode::Transmit => self.set_boost(false)?,
                _ => {}
            }
        }

        self.wait_for(|radio| {
            let irq = radio.device.read_register::<IrqFlags1>()?;
            Ok(irq.flags.contains(Irq1::MODE_READY))
        })?;

        self.mode_ready = true;
        Ok(())
    }

    fn set_boost(&mut self, boost: bool) -> Result<(), Error<SPI::Error>> {
        self.device.write_register(TestPa1 { boost })?;
        self.device.write_register(TestPa2 { boost })
    }

    /// Selects the power amplifier path.
    ///
    /// Enabled: PA1 + PA2 with over-current protection off, as needed by
    /// RFM69HW/HCW modules. Disabled: PA0 at the current power level with
    /// protection on and the boost registers back to normal.
    pub fn set_high_power(&mut self, enabled: bool) -> Result<(), Error<SPI::Error>> {
        if enabled {
            self.device.write_register(Ocp::OFF)?;
            self.device.conditional_set(
                Register::PaLevel,
                PaLevel::OUTPUT_POWER_MASK,
                PaLevel::PA1_ON | PaLevel::PA2_ON,
            )?;
        } else {
            self.device.write_register(Ocp::default())?;
            self.device.write_register(PaLevel {
                output_power: self.power_level,
                ..PaLevel::default()
            })?;
            self.set_boost(false)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("High power path: {}", enabled);

        self.high_power = enabled;
        Ok(())
    }

    /// Sets the output power, 0..=31. Larger values are clamped.
    ///
    /// The PA selection bits are left as they are.
    pub fn set_power_level(&mut self, level: u8) -> Result<(), Error<SPI::Error>> {
        let level = level.min(PaLevel::MAX_OUTPUT_POWER);
        self.device.conditional_set(
            Register::PaLevel,
            !PaLevel::OUTPUT_POWER_MASK,
            level,
        )?;
        self.power_level = level;
        Ok(())
    }

    /// Puts the chip to sleep. Any later operation wakes it up again.
    pub fn sleep(&mut self) -> Result<(), Error<SPI::Error>> {
        self.set_mode(Mode::Sleep)
    }

    /// Reads the mode the chip is actually in.
    ///
    /// # Errors
    /// * `Error::InvalidMode` - The mode bits hold a reserved value
    pub fn chip_mode(&mut self) -> Result<Mode, Error<SPI::Error>> {
        let bits = self.device.read(Register::OpMode)?;
        Ok(Mode::try_from(bits & !OpMode::PRESERVE_MASK)?)
    }
}
