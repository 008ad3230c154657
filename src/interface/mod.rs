/*
LICENSE: BSD3 (see LICENSE file)
*/

pub mod i2c;
#[cfg(test)]
pub mod mock_i2c_port;
pub mod spi;

pub use self::i2c::I2cInterface;
pub use self::spi::SpiInterface;

use crate::resolver::Resolution;
use embedded_hal_async::delay::DelayNs;

/// Every command is one opcode byte plus at most four argument bytes.
pub const MAX_COMMAND_LENGTH: usize = 5;

/// A method of communicating with the C3DFBS force sensor.
///
/// Implementations own the transport framing (I2C addressing, SPI chip
/// select) and expose the device's command/response protocol: the host
/// writes `[opcode, args...]` and the device answers with a single
/// status byte, followed by a payload frame where one is defined.
pub trait SensorInterface {
    /// Interface-associated error type
    type SensorError;

    /// Release the reset line and wait out device boot.
    async fn setup(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::SensorError>;

    /// Locate the sensor on this transport.
    ///
    /// On I2C this runs the bus address resolution procedure and may
    /// change the persisted address of the device it finds; on SPI it
    /// amounts to a reset and a ping.
    async fn connect(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<Resolution, Self::SensorError>;

    /// Send one command and return the device's status byte.
    ///
    /// `args` must fit the command frame: at most
    /// [`MAX_COMMAND_LENGTH`] `- 1` bytes. Longer slices panic, no
    /// defined command takes more.
    async fn send_command(
        &mut self,
        command: u8,
        args: &[u8],
    ) -> Result<u8, Self::SensorError>;

    /// Read one response or stream frame into `buf`.
    async fn read_frame(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(), Self::SensorError>;

    /// Pulse the active-low hardware reset line.
    async fn hard_reset(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::SensorError>;
}
