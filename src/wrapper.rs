/*
LICENSE: BSD3 (see LICENSE file)
*/

use crate::constants::*;
use crate::interface::SensorInterface;
use crate::resolver::Resolution;

#[cfg(feature = "defmt")]
use defmt::println;
use embedded_hal_async::delay::DelayNs;

#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WrapperError<E> {
    ///Communications error
    CommError(E),
    /// The device answered a command with an error status
    Status(u8),
}

/// Three-axis force reading in newtons.
///
/// Fields excluded from the device's data field mask read as NaN.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ForceVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ForceVector {
    pub const fn nan() -> Self {
        ForceVector {
            x: f32::NAN,
            y: f32::NAN,
            z: f32::NAN,
        }
    }

    /// True when every axis carried data
    pub fn is_complete(&self) -> bool {
        !(self.x.is_nan() || self.y.is_nan() || self.z.is_nan())
    }

    /// Binary record form: u32 LE timestamp followed by three f32 LE
    /// components.
    pub fn to_bytes(&self, timestamp_ms: u32) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&timestamp_ms.to_le_bytes());
        out[4..8].copy_from_slice(&self.x.to_le_bytes());
        out[8..12].copy_from_slice(&self.y.to_le_bytes());
        out[12..16].copy_from_slice(&self.z.to_le_bytes());
        out
    }
}

impl core::fmt::Display for ForceVector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Fx: {:3.2}, Fy: {:3.2}, Fz: {:3.2}",
            self.x, self.y, self.z
        )?;
        if !self.is_complete() {
            write!(f, " (unbiased)")?;
        }
        Ok(())
    }
}

/// Sensor firmware version
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

pub struct F3d<SI> {
    pub(crate) sensor_interface: SI,
    /// buffer for one force frame from the data stream
    frame_buf: [u8; FORCE_FRAME_LENGTH],
    /// field mask applied when the stream is next started
    data_fields: u32,
    streaming: bool,
    /// how the last connect() located the device
    resolution: Option<Resolution>,
}

impl<SI> F3d<SI> {
    pub fn new_with_interface(sensor_interface: SI) -> Self {
        Self {
            sensor_interface,
            frame_buf: [0; FORCE_FRAME_LENGTH],
            data_fields: FIELD_ALL_FORCE,
            streaming: false,
            resolution: None,
        }
    }

    /// Returns previously consumed sensor interface instance.
    pub fn free(self) -> SI {
        self.sensor_interface
    }

    /// Select which force fields the stream carries.
    ///
    /// Takes effect the next time the stream starts.
    pub fn set_data_fields(&mut self, mask: u32) {
        self.data_fields = mask & FIELD_ALL_FORCE;
    }

    /// Outcome of the last `connect` call, if any
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    fn frame_len(&self) -> usize {
        (self.data_fields.count_ones() as usize) * 4
    }
}

impl<SI, SE> F3d<SI>
where
    SI: SensorInterface<SensorError = SE>,
{
    /// Initialise the sensor: release the reset line and wait for boot.
    pub async fn init(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), WrapperError<SE>> {
        #[cfg(feature = "defmt")]
        println!("wrapper init");
        self.sensor_interface
            .setup(delay)
            .await
            .map_err(WrapperError::CommError)
    }

    /// Connect to the sensor, returning whether it answers at its
    /// configured address afterwards.
    ///
    /// On I2C this runs address resolution and may change the persisted
    /// address of a sensor found at the default address or during the
    /// bus scan. If other F3D sensors share the bus they may have their
    /// addresses altered accidentally; remove them from the bus before
    /// calling this. The detailed outcome is readable via
    /// [`resolution`](Self::resolution).
    pub async fn connect(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<bool, WrapperError<SE>> {
        let res = self
            .sensor_interface
            .connect(delay)
            .await
            .map_err(WrapperError::CommError)?;
        #[cfg(feature = "defmt")]
        println!("connect alive: {}", res.alive);
        // Resolution may have pulsed reset, which drops any stream.
        self.streaming = false;
        self.resolution = Some(res);
        Ok(res.alive)
    }

    /// Read one force frame, starting the stream first if needed.
    pub async fn read(&mut self) -> Result<ForceVector, WrapperError<SE>> {
        if !self.streaming {
            self.start().await?;
        }

        let frame_len = self.frame_len();
        self.sensor_interface
            .read_frame(&mut self.frame_buf[..frame_len])
            .await
            .map_err(WrapperError::CommError)?;

        let mut forces = ForceVector::nan();
        let mut cursor = 0;
        // Selected fields arrive as f32 LE in ascending bit order.
        for bit in [FIELD_FORCE_X, FIELD_FORCE_Y, FIELD_FORCE_Z] {
            if self.data_fields & bit == 0 {
                continue;
            }
            let mut word = [0u8; 4];
            word.copy_from_slice(&self.frame_buf[cursor..cursor + 4]);
            let value = f32::from_le_bytes(word);
            cursor += 4;
            match bit {
                FIELD_FORCE_X => forces.x = value,
                FIELD_FORCE_Y => forces.y = value,
                _ => forces.z = value,
            }
        }
        Ok(forces)
    }

    /// Zero the sensor (remove bias). Call while no force is applied;
    /// a running stream is stopped and restarted around the command.
    pub async fn zero(&mut self) -> Result<(), WrapperError<SE>> {
        let was_streaming = self.streaming;
        if was_streaming {
            self.stop().await?;
        }

        let result = self.checked_command(CMD_REMOVE_BIAS, &[]).await;

        if was_streaming {
            self.start().await?;
        }
        result
    }

    /// Hard-reset the sensor. Any running stream is dropped.
    pub async fn reset(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), WrapperError<SE>> {
        self.sensor_interface
            .hard_reset(delay)
            .await
            .map_err(WrapperError::CommError)?;
        self.streaming = false;
        Ok(())
    }

    /// Query the firmware version. A running stream is stopped and
    /// restarted around the query.
    pub async fn version(&mut self) -> Result<Version, WrapperError<SE>> {
        let was_streaming = self.streaming;
        if was_streaming {
            self.stop().await?;
        }

        self.checked_command(CMD_GET_VERSION, &[]).await?;
        let mut payload = [0u8; VERSION_PAYLOAD_LENGTH];
        self.sensor_interface
            .read_frame(&mut payload)
            .await
            .map_err(WrapperError::CommError)?;
        let version = Version {
            major: payload[0],
            minor: payload[1],
            patch: payload[2],
        };

        if was_streaming {
            self.start().await?;
        }
        Ok(version)
    }

    /// Stop the data stream
    pub async fn stop(&mut self) -> Result<(), WrapperError<SE>> {
        let status = self
            .sensor_interface
            .send_command(CMD_STOP_DATA_STREAM, &[])
            .await
            .map_err(WrapperError::CommError)?;
        self.streaming = false;
        // Stopping an idle stream is not an error.
        if status != STATUS_SUCCESS && status != STATUS_NOT_STREAMING {
            return Err(WrapperError::Status(status));
        }
        Ok(())
    }

    /// Configure the sensor and begin streaming
    async fn start(&mut self) -> Result<(), WrapperError<SE>> {
        #[cfg(feature = "defmt")]
        println!("start stream, fields 0x{:X}", self.data_fields);

        self.stop().await?;

        self.checked_command(
            CMD_SET_DATA_FREQUENCY,
            &STREAM_FREQUENCY_HZ.to_le_bytes(),
        )
        .await?;
        self.checked_command(
            CMD_SET_DATA_FIELDS,
            &self.data_fields.to_le_bytes(),
        )
        .await?;
        self.checked_command(CMD_START_DATA_STREAM, &[]).await?;

        self.streaming = true;
        Ok(())
    }

    async fn checked_command(
        &mut self,
        command: u8,
        args: &[u8],
    ) -> Result<(), WrapperError<SE>> {
        let status = self
            .sensor_interface
            .send_command(command, args)
            .await
            .map_err(WrapperError::CommError)?;
        if status != STATUS_SUCCESS {
            return Err(WrapperError::Status(status));
        }
        Ok(())
    }
}
