/*
LICENSE: BSD3 (see LICENSE file)
*/

use super::{SensorInterface, MAX_COMMAND_LENGTH};
use crate::constants::*;
use crate::resolver::{Resolution, ResolutionOutcome};
use crate::Error;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::{Operation, SpiDevice};

/// SPI transport for the C3DFBS.
///
/// Chip select framing is owned by the `SpiDevice` implementation;
/// this interface only drives the reset line and the command protocol.
pub struct SpiInterface<SPI, RP> {
    spi: SPI,
    reset_pin: RP,
}

impl<SPI, RP, CommE, PinE> SpiInterface<SPI, RP>
where
    SPI: SpiDevice<u8, Error = CommE>,
    RP: OutputPin<Error = PinE>,
{
    pub fn new(spi: SPI, reset_pin: RP) -> Self {
        Self { spi, reset_pin }
    }

    /// Returns the owned peripherals.
    pub fn free(self) -> (SPI, RP) {
        (self.spi, self.reset_pin)
    }

    async fn pulse_reset(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<CommE, PinE>> {
        self.reset_pin.set_low().map_err(Error::Pin)?;
        delay.delay_ms(RESET_PULSE_MS).await;
        self.reset_pin.set_high().map_err(Error::Pin)?;
        delay.delay_ms(BOOT_DELAY_MS).await;
        Ok(())
    }
}

impl<SPI, RP, CommE, PinE> SensorInterface for SpiInterface<SPI, RP>
where
    SPI: SpiDevice<u8, Error = CommE>,
    RP: OutputPin<Error = PinE>,
{
    type SensorError = Error<CommE, PinE>;

    async fn setup(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::SensorError> {
        self.pulse_reset(delay).await
    }

    /// SPI has no bus addresses to resolve; a live device after reset
    /// reports as already in place.
    async fn connect(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<Resolution, Self::SensorError> {
        self.pulse_reset(delay).await?;
        let alive =
            self.send_command(CMD_PING, &[]).await? == STATUS_SUCCESS;
        let outcome = if alive {
            ResolutionOutcome::AlreadyAtTarget
        } else {
            ResolutionOutcome::NotFound
        };
        Ok(Resolution { outcome, alive })
    }

    async fn send_command(
        &mut self,
        command: u8,
        args: &[u8],
    ) -> Result<u8, Self::SensorError> {
        debug_assert!(args.len() < MAX_COMMAND_LENGTH);
        let mut cmd_buf = [0u8; MAX_COMMAND_LENGTH];
        let cmd_len = 1 + args.len();
        cmd_buf[0] = command;
        cmd_buf[1..cmd_len].copy_from_slice(args);

        let mut status = [0u8; 1];
        self.spi
            .transaction(&mut [
                Operation::Write(&cmd_buf[..cmd_len]),
                Operation::Read(&mut status),
            ])
            .await
            .map_err(Error::Comm)?;
        Ok(status[0])
    }

    async fn read_frame(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(), Self::SensorError> {
        self.spi.read(buf).await.map_err(Error::Comm)
    }

    async fn hard_reset(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::SensorError> {
        self.pulse_reset(delay).await
    }
}
