//! Link-layer packet engine
//!
//! # Transmit
//! Before a frame goes out the driver listens for a short while: it keeps
//! the receiver running until no frame is pending (and, optionally, the RSSI
//! is below a threshold). When the channel never clears within
//! [`Config::csma_timeout_ms`](crate::Config::csma_timeout_ms) the frame is
//! sent anyway.
//!
//! # Receive
//! Reception is polled: [`Radio::receive_done`] is called repeatedly and
//! returns true once a frame for this node has been read into the
//! [`ReceiveSession`](super::ReceiveSession).

use embedded_hal::delay::DelayNs;

use super::Radio;
use crate::frame::{
    Control, Frame, BROADCAST_ADDRESS, HEADER_LEN, MAX_FRAME_LEN, MAX_PAYLOAD_LEN,
};
use crate::registers::{
    Dio0Mapping, DioMapping1, Irq2, IrqFlags2, Mode, PACKET2_RX_RESTART, PACKET2_RX_RESTART_MASK,
};
use crate::{Error, Register};

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: DelayNs,
{
    /// Sends `payload` to `target` after waiting for a clear channel.
    ///
    /// # Errors
    /// * `Error::PayloadTooLarge` - More than 61 bytes; nothing is sent
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Timeout` - A bounded hardware wait expired
    pub fn send(
        &mut self,
        target: u8,
        payload: &[u8],
        request_ack: bool,
    ) -> Result<(), Error<SPI::Error>> {
        check_payload(payload)?;

        self.restart_rx()?;
        self.avoid_collisions();
        self.send_frame(target, payload, request_ack, false)
    }

    /// Acknowledges the last received frame, optionally with a payload.
    ///
    /// The session keeps the sender and RSSI of the acknowledged frame.
    pub fn send_ack(&mut self, payload: &[u8]) -> Result<(), Error<SPI::Error>> {
        check_payload(payload)?;

        self.session.ack_requested = false;
        let sender = self.session.sender_id;
        let rssi = self.session.rssi;

        self.restart_rx()?;
        self.avoid_collisions();

        self.session.sender_id = sender;
        self.send_frame(sender, payload, false, true)?;
        self.session.rssi = rssi;
        Ok(())
    }

    /// Sends with an acknowledgment request and waits `retry_wait_ms` for
    /// the ack, trying `retries` more times when none arrives.
    ///
    /// Returns whether an acknowledgment was received.
    pub fn send_with_retry(
        &mut self,
        target: u8,
        payload: &[u8],
        retries: u8,
        retry_wait_ms: u32,
    ) -> Result<bool, Error<SPI::Error>> {
        for _ in 0..=retries {
            self.send(target, payload, true)?;
            if self.poll_until(Some(retry_wait_ms), |radio| radio.ack_received(target))? {
                return Ok(true);
            }

            #[cfg(feature = "defmt")]
            defmt::debug!("No ack from {}", target);
        }
        Ok(false)
    }

    /// Whether an acknowledgment from `from` (or from anyone, for the
    /// broadcast address) has arrived. Keeps the receiver running.
    pub fn ack_received(&mut self, from: u8) -> Result<bool, Error<SPI::Error>> {
        if self.receive_done()? {
            return Ok(self.session.ack_received
                && (self.session.sender_id == from || from == BROADCAST_ADDRESS));
        }
        Ok(false)
    }

    /// Whether the last received frame expects an acknowledgment
    pub fn ack_requested(&self) -> bool {
        self.session.wants_ack()
    }

    /// Transmits a single frame without listening first.
    ///
    /// An ack reply never carries the ack request bit. The radio ends up in
    /// Standby.
    pub fn send_frame(
        &mut self,
        target: u8,
        payload: &[u8],
        request_ack: bool,
        is_ack_reply: bool,
    ) -> Result<(), Error<SPI::Error>> {
        let control = Control::outgoing(request_ack, is_ack_reply);
        let frame = Frame::new(target, self.address, control, payload)?;
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = frame.encode(&mut buf)?;

        self.set_mode(Mode::Standby)?;
        self.device
            .write_register(DioMapping1::dio0(Dio0Mapping::PacketSent))?;
        self.device.write_burst(Register::Fifo, &buf[..len])?;

        #[cfg(feature = "defmt")]
        defmt::debug!("TX {} bytes to {}, {}", payload.len(), target, control);

        self.set_mode(Mode::Transmit)?;
        self.wait_for(|radio| {
            let irq = radio.device.read_register::<IrqFlags2>()?;
            Ok(irq.flags.contains(Irq2::PACKET_SENT))
        })?;
        self.set_mode(Mode::Standby)
    }

    /// Whether the channel is free to transmit on.
    ///
    /// True only while receiving with no frame pending. The radio is then
    /// moved to Standby, ready to load the FIFO.
    pub fn can_send(&mut self) -> Result<bool, Error<SPI::Error>> {
        if !self.in_mode(Mode::Receive) || self.session.payload_len != 0 {
            return Ok(false);
        }
        if let Some(limit) = self.config.csma_rssi_limit {
            if self.read_rssi(false)? >= limit {
                return Ok(false);
            }
        }
        self.set_mode(Mode::Standby)?;
        Ok(true)
    }

    /// Polls for a received frame.
    ///
    /// Outside Receive the receiver is (re)started and false returned. In
    /// Receive, a waiting frame is read into the session; frames for other
    /// nodes and corrupt frames are dropped and reception restarted.
    pub fn receive_done(&mut self) -> Result<bool, Error<SPI::Error>> {
        if !self.in_mode(Mode::Receive) {
            self.receive_begin()?;
            return Ok(false);
        }
        if !self.payload_ready()? {
            return Ok(false);
        }

        self.set_mode(Mode::Standby)?;
        self.read_frame()
    }

    /// Starts a new receive attempt, discarding the session.
    pub fn receive_begin(&mut self) -> Result<(), Error<SPI::Error>> {
        self.session.reset();

        if self.payload_ready()? {
            self.restart_rx()?;
        }
        self.device
            .write_register(DioMapping1::dio0(Dio0Mapping::PayloadReady))?;
        self.set_mode(Mode::Receive)
    }

    fn read_frame(&mut self) -> Result<bool, Error<SPI::Error>> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        self.device.read_burst(Register::Fifo, &mut buf[..1])?;

        let length = buf[0] as usize;
        if !(HEADER_LEN..=HEADER_LEN + MAX_PAYLOAD_LEN).contains(&length) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Dropping frame with length byte {}", buf[0]);

            self.device.write_register(IrqFlags2 {
                flags: Irq2::FIFO_OVERRUN,
            })?;
            self.receive_begin()?;
            return Ok(false);
        }

        self.device
            .read_burst(Register::Fifo, &mut buf[1..=length])?;
        let frame = Frame::parse(&buf[..=length])?;

        if !self.config.promiscuous && !frame.is_for(self.address) {
            #[cfg(feature = "defmt")]
            defmt::trace!("Ignoring frame for {}", frame.target);

            self.receive_begin()?;
            return Ok(false);
        }

        self.session.store(&frame);
        self.session.rssi = self.read_rssi(false)?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "RX {} bytes from {}, {} dBm",
            frame.payload.len(),
            frame.sender,
            self.session.rssi
        );

        Ok(true)
    }

    fn restart_rx(&mut self) -> Result<(), Error<SPI::Error>> {
        self.device.conditional_set(
            Register::PacketConfig2,
            PACKET2_RX_RESTART_MASK,
            PACKET2_RX_RESTART,
        )
    }

    /// Listens until the channel is clear. Never fails: a bus error or the
    /// timeout both end the wait and the caller transmits regardless.
    fn avoid_collisions(&mut self) {
        let timeout_ms = self.config.csma_timeout_ms;
        let outcome = self.poll_until(Some(timeout_ms), |radio| {
            radio.receive_done()?;
            radio.can_send()
        });

        match outcome {
            Ok(true) => {}
            Ok(false) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Channel busy for {} ms, transmitting anyway", timeout_ms);
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Busy check failed, transmitting anyway");
            }
        }
    }
}

fn check_payload<E>(payload: &[u8]) -> Result<(), Error<E>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLarge(payload.len()));
    }
    Ok(())
}
