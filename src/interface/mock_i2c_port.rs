extern crate std;

use crate::constants::*;

use core::convert::Infallible;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{
    ErrorKind, ErrorType, NoAcknowledgeSource, Operation, SevenBitAddress,
};
use std::collections::VecDeque;
use std::vec::Vec;

pub struct FakeDelay;

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        // no-op
    }
}

/// Active-low reset line that counts completed pulses
pub struct FakeResetPin {
    pub pulses: u32,
    low: bool,
}

impl FakeResetPin {
    pub fn new() -> Self {
        FakeResetPin {
            pulses: 0,
            low: false,
        }
    }
}

impl embedded_hal::digital::ErrorType for FakeResetPin {
    type Error = Infallible;
}

impl OutputPin for FakeResetPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.low = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        if self.low {
            self.pulses += 1;
        }
        self.low = false;
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeI2cError {
    kind: ErrorKind,
}

impl FakeI2cError {
    fn nack() -> Self {
        FakeI2cError {
            kind: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
        }
    }

    fn bus() -> Self {
        FakeI2cError {
            kind: ErrorKind::Bus,
        }
    }
}

impl embedded_hal_async::i2c::Error for FakeI2cError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Simulates one C3DFBS sitting on the bus.
///
/// Transactions addressed anywhere else are NACKed. Commands are
/// answered with a status byte; an accepted address change takes
/// effect after the status is served, like the real part.
pub struct FakeI2cPort {
    /// Bus address the simulated device answers at, if attached
    pub device_address: Option<u8>,
    /// Refuse CMD_CHANGE_I2C_ADDRESS with an error status
    pub reject_address_change: bool,
    /// Fail every transaction with a bus error instead of a NACK
    pub bus_fault: bool,
    pub firmware_version: [u8; 3],
    pub streaming: bool,
    /// Frames served to `read` calls, oldest first
    pub frames: VecDeque<Vec<u8>>,
    /// Every write the host performed: (address, bytes)
    pub sent: Vec<(u8, Vec<u8>)>,
    pending_address: Option<u8>,
}

impl FakeI2cPort {
    pub fn new() -> Self {
        FakeI2cPort {
            device_address: None,
            reject_address_change: false,
            bus_fault: false,
            firmware_version: [1, 0, 0],
            streaming: false,
            frames: VecDeque::new(),
            sent: Vec::new(),
            pending_address: None,
        }
    }

    pub fn with_device(address: u8) -> Self {
        let mut port = Self::new();
        port.device_address = Some(address);
        port
    }

    /// Queue a stream frame to be served by a later read
    pub fn add_frame(&mut self, bytes: &[u8]) {
        self.frames.push_back(bytes.to_vec());
    }

    /// True if any transaction was ever addressed to `address`
    pub fn addressed(&self, address: u8) -> bool {
        self.sent.iter().any(|(a, _)| *a == address)
    }

    /// Opcodes of all non-empty writes the host performed, in order
    pub fn opcodes(&self) -> Vec<u8> {
        self.sent
            .iter()
            .filter(|(_, bytes)| !bytes.is_empty())
            .map(|(_, bytes)| bytes[0])
            .collect()
    }

    fn handle_command(&mut self, bytes: &[u8]) -> u8 {
        match bytes[0] {
            CMD_PING => STATUS_SUCCESS,
            CMD_GET_VERSION => {
                let version = self.firmware_version.to_vec();
                self.frames.push_back(version);
                STATUS_SUCCESS
            }
            CMD_SET_DATA_FREQUENCY | CMD_SET_DATA_FIELDS => STATUS_SUCCESS,
            CMD_START_DATA_STREAM => {
                self.streaming = true;
                STATUS_SUCCESS
            }
            CMD_STOP_DATA_STREAM => {
                if self.streaming {
                    self.streaming = false;
                    STATUS_SUCCESS
                } else {
                    STATUS_NOT_STREAMING
                }
            }
            CMD_REMOVE_BIAS => STATUS_SUCCESS,
            CMD_CHANGE_I2C_ADDRESS => {
                if self.reject_address_change {
                    STATUS_INVALID_ARGUMENT
                } else {
                    self.pending_address = Some(bytes[1]);
                    STATUS_SUCCESS
                }
            }
            _ => STATUS_INVALID_COMMAND,
        }
    }
}

impl ErrorType for FakeI2cPort {
    type Error = FakeI2cError;
}

impl embedded_hal_async::i2c::I2c for FakeI2cPort {
    async fn read(
        &mut self,
        address: SevenBitAddress,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        if self.bus_fault {
            return Err(FakeI2cError::bus());
        }
        if self.device_address != Some(address) {
            return Err(FakeI2cError::nack());
        }
        if let Some(frame) = self.frames.pop_front() {
            let n = frame.len().min(buffer.len());
            buffer[..n].copy_from_slice(&frame[..n]);
            buffer[n..].fill(0);
        } else {
            buffer.fill(0);
        }
        Ok(())
    }

    async fn write(
        &mut self,
        address: SevenBitAddress,
        bytes: &[u8],
    ) -> Result<(), Self::Error> {
        self.sent.push((address, bytes.to_vec()));
        if self.bus_fault {
            return Err(FakeI2cError::bus());
        }
        if self.device_address == Some(address) {
            Ok(())
        } else {
            Err(FakeI2cError::nack())
        }
    }

    async fn write_read(
        &mut self,
        address: SevenBitAddress,
        send_buf: &[u8],
        recv_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.sent.push((address, send_buf.to_vec()));
        if self.bus_fault {
            return Err(FakeI2cError::bus());
        }
        if self.device_address != Some(address) || send_buf.is_empty() {
            return Err(FakeI2cError::nack());
        }
        let status = self.handle_command(send_buf);
        recv_buf.fill(0);
        recv_buf[0] = status;
        // Address change takes effect once the response is on the wire.
        if let Some(new_address) = self.pending_address.take() {
            self.device_address = Some(new_address);
        }
        Ok(())
    }

    async fn transaction(
        &mut self,
        _address: SevenBitAddress,
        _operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        todo!()
    }
}
