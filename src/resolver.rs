/*
LICENSE: BSD3 (see LICENSE file)
*/

//! I2C address resolution for the C3DFBS.
//!
//! A sensor fresh from the factory answers at [`Address::DEFAULT`]; once
//! configured it answers at whatever address was last assigned to it. The
//! [`AddressResolver`] locates the device wherever it currently is and
//! moves it to the caller's target address, touching the rest of the bus
//! as little as possible.

use crate::constants::*;
#[cfg(feature = "defmt")]
use defmt::println;
use embedded_hal_async::delay::DelayNs;

/// A validated sensor bus address.
///
/// Only values inside `[0x50, 0x72)` are representable, and the reserved
/// bootloader address `0x55` is rejected at construction. Holding an
/// `Address` is proof the value is safe to probe and assign.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

/// Rejected address value, outside the valid range or reserved
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidAddress(pub u8);

impl Address {
    /// Factory-default address every unconfigured sensor answers at
    pub const DEFAULT: Address = Address(DEFAULT_I2C_ADDRESS);

    pub const fn new(raw: u8) -> Result<Self, InvalidAddress> {
        if raw < I2C_ADDRESS_RANGE_START
            || raw >= I2C_ADDRESS_RANGE_END
            || raw == RESERVED_I2C_ADDRESS
        {
            Err(InvalidAddress(raw))
        } else {
            Ok(Address(raw))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// All assignable addresses in ascending order, skipping the
    /// reserved bootloader address.
    pub fn scan() -> impl Iterator<Item = Address> {
        (I2C_ADDRESS_RANGE_START..I2C_ADDRESS_RANGE_END)
            .filter(|raw| *raw != RESERVED_I2C_ADDRESS)
            .map(Address)
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Raw bus operations the resolver needs from the transport.
///
/// Probe non-acknowledgment is a normal outcome, not an error; only hard
/// bus faults surface through `ProbeError`.
pub trait BusProbe {
    type ProbeError;

    /// Non-destructive ack test at `address`.
    async fn probe(&mut self, address: Address) -> bool;

    /// Command the device currently at `current` to move to `new`.
    ///
    /// Returns `Ok(true)` when the device accepted the command,
    /// `Ok(false)` when it rejected it, and `Err` on a hard bus fault.
    async fn reassign(
        &mut self,
        new: Address,
        current: Address,
    ) -> Result<bool, Self::ProbeError>;

    /// Pulse the hardware reset line, returning attached devices to
    /// their power-on address state.
    async fn reset_line(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Self::ProbeError>;

    /// Liveness check at the address this transport currently targets.
    async fn is_alive(&mut self) -> bool;
}

/// How the device was located, per `resolve` invocation
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResolutionOutcome {
    /// A device already answers at the target address
    AlreadyAtTarget,
    /// A device answered at the factory default and was moved
    MovedFromDefault,
    /// The bus scan located a device at the given address and moved it
    MovedFromScan(Address),
    /// No device answered anywhere in the valid range
    NotFound,
}

/// Result of one `resolve` call.
///
/// `alive` is the final liveness check at the target address and is the
/// value callers should treat as "connected"; `outcome` records which
/// path the resolution took.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resolution {
    pub outcome: ResolutionOutcome,
    pub alive: bool,
}

/// Locates a sensor on a shared bus and moves it to the target address.
///
/// # Warning
///
/// Resolution may change the persisted address of a sensor found at the
/// default address or during the scan. If several unconfigured sensors
/// share the bus, whichever one answers first gets moved; remove other
/// F3D sensors from the bus before resolving.
pub struct AddressResolver {
    target: Address,
    default: Address,
}

impl AddressResolver {
    pub fn new(target: Address) -> Self {
        Self::with_default(target, Address::DEFAULT)
    }

    pub fn with_default(target: Address, default: Address) -> Self {
        Self { target, default }
    }

    /// Run the resolution procedure once.
    ///
    /// Probes the target, then the default, then resets the line and
    /// scans the whole valid range in ascending order. A reassignment
    /// rejected by the device continues the scan; a hard bus fault
    /// aborts it.
    pub async fn resolve<P>(
        &self,
        bus: &mut P,
        delay: &mut impl DelayNs,
    ) -> Result<Resolution, P::ProbeError>
    where
        P: BusProbe,
    {
        let outcome = self.locate(bus, delay).await?;
        let alive = bus.is_alive().await;
        Ok(Resolution { outcome, alive })
    }

    async fn locate<P>(
        &self,
        bus: &mut P,
        delay: &mut impl DelayNs,
    ) -> Result<ResolutionOutcome, P::ProbeError>
    where
        P: BusProbe,
    {
        // Common case: the sensor was configured on a previous run and
        // already answers at the target.
        if bus.probe(self.target).await {
            return Ok(ResolutionOutcome::AlreadyAtTarget);
        }

        if bus.probe(self.default).await {
            #[cfg(feature = "defmt")]
            println!("found at default 0x{:X}", self.default.get());
            bus.reassign(self.target, self.default).await?;
            return Ok(ResolutionOutcome::MovedFromDefault);
        }

        // Nothing at either expected address. Reset the line so an
        // attached device is back in its power-on state, then walk the
        // whole range.
        bus.reset_line(delay).await?;
        for addr in Address::scan() {
            if !bus.probe(addr).await {
                continue;
            }
            #[cfg(feature = "defmt")]
            println!("scan hit 0x{:X}", addr.get());
            if bus.reassign(self.target, addr).await? {
                return Ok(ResolutionOutcome::MovedFromScan(addr));
            }
            // Rejected reassignment: leave that device alone and keep
            // scanning.
        }

        Ok(ResolutionOutcome::NotFound)
    }
}
