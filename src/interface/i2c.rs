/*
LICENSE: BSD3 (see LICENSE file)
*/

use super::{SensorInterface, MAX_COMMAND_LENGTH};
use crate::constants::*;
use crate::resolver::{Address, AddressResolver, BusProbe, Resolution};
use crate::Error;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{Error as I2cError, ErrorKind, I2c};

/// I2C transport for the C3DFBS.
///
/// Tracks the bus address it currently talks to; a successful address
/// reassignment retargets the interface to the new address.
pub struct I2cInterface<I2C, RP> {
    i2c: I2C,
    reset_pin: RP,
    /// Address the caller wants the sensor to answer at
    target: Address,
    /// Address the sensor currently answers at, as far as we know
    address: Address,
}

impl<I2C, RP, CommE, PinE> I2cInterface<I2C, RP>
where
    I2C: I2c<Error = CommE>,
    RP: OutputPin<Error = PinE>,
{
    pub fn new(i2c: I2C, reset_pin: RP, target: Address) -> Self {
        Self {
            i2c,
            reset_pin,
            target,
            address: target,
        }
    }

    /// Address this interface currently addresses its transactions to
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the owned peripherals.
    pub fn free(self) -> (I2C, RP) {
        (self.i2c, self.reset_pin)
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

    /// Write `[command, args...]` and read back the status byte in one
    /// transaction at `address`.
    async fn command_at(
        &mut self,
        address: Address,
        command: u8,
        args: &[u8],
    ) -> Result<u8, CommE> {
        debug_assert!(args.len() < MAX_COMMAND_LENGTH);
        let mut cmd_buf = [0u8; MAX_COMMAND_LENGTH];
        let cmd_len = 1 + args.len();
        cmd_buf[0] = command;
        cmd_buf[1..cmd_len].copy_from_slice(args);

        let mut status = [0u8; 1];
        self.i2c
            .write_read(address.get(), &cmd_buf[..cmd_len], &mut status)
            .await?;
        Ok(status[0])
    }
}

impl<I2C, RP, CommE, PinE> SensorInterface for I2cInterface<I2C, RP>
where
    I2C: I2c<Error = CommE>,
    CommE: I2cError,
    RP: OutputPin<Error = PinE>,
{
    type SensorError = Error<CommE, PinE>;

    async fn setup(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::SensorError> {
        self.pulse_reset(delay).await
    }

    async fn connect(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<Resolution, Self::SensorError> {
        let resolver = AddressResolver::new(self.target);
        resolver.resolve(self, delay).await
    }

    async fn send_command(
        &mut self,
        command: u8,
        args: &[u8],
    ) -> Result<u8, Self::SensorError> {
        let address = self.address;
        self.command_at(address, command, args)
            .await
            .map_err(|e| match e.kind() {
                // Nothing answering at the configured address
                ErrorKind::NoAcknowledge(_) => Error::SensorUnresponsive,
                _ => Error::Comm(e),
            })
    }

    async fn read_frame(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(), Self::SensorError> {
        self.i2c
            .read(self.address.get(), buf)
            .await
            .map_err(Error::Comm)
    }

    async fn hard_reset(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::SensorError> {
        self.pulse_reset(delay).await
    }
}

impl<I2C, RP, CommE, PinE> BusProbe for I2cInterface<I2C, RP>
where
    I2C: I2c<Error = CommE>,
    CommE: I2cError,
    RP: OutputPin<Error = PinE>,
{
    type ProbeError = Error<CommE, PinE>;

    async fn probe(&mut self, address: Address) -> bool {
        // Empty write: any device at `address` acks, nothing is read
        // or written.
        self.i2c.write(address.get(), &[]).await.is_ok()
    }

    async fn reassign(
        &mut self,
        new: Address,
        current: Address,
    ) -> Result<bool, Self::ProbeError> {
        let res = self
            .command_at(current, CMD_CHANGE_I2C_ADDRESS, &[new.get()])
            .await;
        match res {
            Ok(STATUS_SUCCESS) => {
                self.address = new;
                Ok(true)
            }
            Ok(_) => Ok(false),
            // The device just acked a probe; a NACK here means it
            // dropped off rather than a bus fault.
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => {
                Ok(false)
            }
            Err(e) => Err(Error::Comm(e)),
        }
    }

    async fn reset_line(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::ProbeError> {
        self.pulse_reset(delay).await
    }

    async fn is_alive(&mut self) -> bool {
        let address = self.address;
        matches!(
            self.command_at(address, CMD_PING, &[]).await,
            Ok(STATUS_SUCCESS)
        )
    }
}
