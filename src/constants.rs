// I2C address space of the C3DFBS force sensor.
// Devices leave the factory answering at the default address; the valid
// range is what the address-change command will accept. 0x55 is used
// internally by the sensor bootloader and must never be probed or assigned.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x57;
pub const RESERVED_I2C_ADDRESS: u8 = 0x55;
pub const I2C_ADDRESS_RANGE_START: u8 = 0x50;
pub const I2C_ADDRESS_RANGE_END: u8 = 0x72; // exclusive

// Command bytes understood by the C3DFBS, written as the first byte of
// every host transaction. The device answers each command with a single
// status byte, followed by a response payload where one is defined.
pub const CMD_PING: u8 = 0x01;
pub const CMD_GET_VERSION: u8 = 0x02;
pub const CMD_SET_DATA_FREQUENCY: u8 = 0x10;
pub const CMD_SET_DATA_FIELDS: u8 = 0x11;
pub const CMD_START_DATA_STREAM: u8 = 0x12;
pub const CMD_STOP_DATA_STREAM: u8 = 0x13;
pub const CMD_REMOVE_BIAS: u8 = 0x20;
pub const CMD_CHANGE_I2C_ADDRESS: u8 = 0x30;

// Device status codes, returned as the first byte of every response.
pub const STATUS_SUCCESS: u8 = 0x00;
pub const STATUS_INVALID_COMMAND: u8 = 0x01;
pub const STATUS_INVALID_ARGUMENT: u8 = 0x02;
pub const STATUS_NOT_STREAMING: u8 = 0x03;
pub const STATUS_BUSY: u8 = 0x04;

// Data field selection bits for CMD_SET_DATA_FIELDS. Selected fields are
// streamed as little-endian f32 values in ascending bit order.
pub const FIELD_FORCE_X: u32 = 1 << 0;
pub const FIELD_FORCE_Y: u32 = 1 << 1;
pub const FIELD_FORCE_Z: u32 = 1 << 2;
pub const FIELD_ALL_FORCE: u32 = FIELD_FORCE_X | FIELD_FORCE_Y | FIELD_FORCE_Z;

/// Number of selectable data fields
pub const NUM_FIELDS: usize = 3;

/// Stream configuration applied by the wrapper before streaming starts
pub const STREAM_FREQUENCY_HZ: u16 = 1000;

// Reset timing. The reset line is active low; after release the sensor
// needs time to boot before it will acknowledge its address.
pub const RESET_PULSE_MS: u32 = 1;
pub const BOOT_DELAY_MS: u32 = 10;

/// Firmware version response payload length (major, minor, patch)
pub const VERSION_PAYLOAD_LENGTH: usize = 3;

/// Force frame length with all three fields selected
pub const FORCE_FRAME_LENGTH: usize = NUM_FIELDS * 4;
