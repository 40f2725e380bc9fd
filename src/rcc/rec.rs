//! Peripheral Reset and Enable Control (REC)
//!
//! A [`Rec`] is a handle on the bus clock gating of one or more peripherals
//! of the same bus group. Drivers take ownership of a `Rec` so that the
//! peripheral they drive can be enabled and reset without touching its
//! neighbours.
//!
//! Each peripheral's `Rec` is handed out once per [`Rcc`]. Asking again
//! for a peripheral that is already owned returns
//! [`Error::PeripheralInUse`](crate::Error::PeripheralInUse).
//!
//! ```rust,ignore
//! let rec = rcc.rec(Ahb3::MDMA)?.low_power(LowPowerMode::Off);
//!
//! // Enable the clock to a peripheral and reset it
//! let rec = rec.enable().reset();
//! ```

use super::bus::{Bus, BusGroup};
use super::Rcc;
use crate::Error;

/// A trait for Resetting, Enabling and Disabling a single peripheral
pub trait ResetEnable {
    /// Enable this peripheral
    #[must_use]
    fn enable(self) -> Self;
    /// Disable this peripheral
    #[must_use]
    fn disable(self) -> Self;
    /// Reset this peripheral
    #[must_use]
    fn reset(self) -> Self;
}

/// The clock gating state of a peripheral in low-power mode
///
/// See RM0433 rev 7. Section 8.5.11
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LowPowerMode {
    /// Bus interface clock is not provided in CSleep mode
    Off,
    /// Bus interface clock is provided in CSleep mode
    Enabled,
}
impl Default for LowPowerMode {
    fn default() -> Self {
        LowPowerMode::Enabled
    }
}

/// Reset and enable control of the peripherals `G`
pub struct Rec<'a, G: BusGroup> {
    bus: Bus<'a, G>,
    periphs: G,
}

impl<'a> Rcc<'a> {
    /// Returns the reset and enable control of `periphs`
    ///
    /// Fails if the control of any of `periphs` was already handed out.
    pub fn rec<G: BusGroup>(&self, periphs: G) -> Result<Rec<'a, G>, Error> {
        let issued = &self.issued[G::INDEX];
        if issued.get() & periphs.bits() != 0 {
            return Err(Error::PeripheralInUse);
        }
        issued.set(issued.get() | periphs.bits());

        Ok(Rec {
            bus: Bus::new(self.rb),
            periphs,
        })
    }
}

impl<'a, G: BusGroup> Rec<'a, G> {
    /// The peripherals controlled by this handle
    pub fn peripherals(&self) -> G {
        self.periphs
    }

    /// True if the bus clock of the peripherals is enabled
    pub fn is_enabled(&self) -> bool {
        self.bus.is_enabled_clock(self.periphs)
    }

    /// Set the clock gating state in CSleep mode
    #[must_use]
    pub fn low_power(self, lpm: LowPowerMode) -> Self {
        match lpm {
            LowPowerMode::Off => self.bus.disable_clock_sleep(self.periphs),
            LowPowerMode::Enabled => self.bus.enable_clock_sleep(self.periphs),
        }
        self
    }
}

impl<'a, G: BusGroup> ResetEnable for Rec<'a, G> {
    #[inline(always)]
    fn enable(self) -> Self {
        self.bus.enable_clock(self.periphs);
        self
    }
    #[inline(always)]
    fn disable(self) -> Self {
        self.bus.disable_clock(self.periphs);
        self
    }
    #[inline(always)]
    fn reset(self) -> Self {
        self.bus.force_reset(self.periphs);
        self.bus.release_reset(self.periphs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::tests::zeroed;
    use crate::rcc::{Ahb3, Ahb4, Apb1L};

    #[test]
    fn enable_disable() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        let rec = rcc.rec(Ahb3::MDMA).unwrap().enable();
        assert!(rec.is_enabled());
        assert_eq!(rb.ahb3enr.read(), 1);

        let rec = rec.disable();
        assert!(!rec.is_enabled());
        assert_eq!(rec.peripherals(), Ahb3::MDMA);
    }

    #[test]
    fn reset_releases() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        let _ = rcc.rec(Apb1L::I2C1 | Apb1L::I2C2).unwrap().reset();
        assert_eq!(rb.apb1lrstr.read(), 0);
    }

    #[test]
    fn low_power_mode() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        let rec = rcc
            .rec(Ahb3::FMC)
            .unwrap()
            .low_power(LowPowerMode::default());
        assert_eq!(rb.ahb3lpenr.read(), 1 << 12);
        let _ = rec.low_power(LowPowerMode::Off);
        assert_eq!(rb.ahb3lpenr.read(), 0);
    }

    #[test]
    fn handed_out_once() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        let _mdma = rcc.rec(Ahb3::MDMA).unwrap();
        assert_eq!(rcc.rec(Ahb3::MDMA).err(), Some(Error::PeripheralInUse));
        assert_eq!(
            rcc.rec(Ahb3::FMC | Ahb3::MDMA).err(),
            Some(Error::PeripheralInUse)
        );

        // Same bits in other groups, and other peripherals of the group
        assert!(rcc.rec(Ahb4::GPIOA).is_ok());
        assert!(rcc.rec(Ahb3::FMC | Ahb3::QSPI).is_ok());
        assert_eq!(rcc.rec(Ahb3::QSPI).err(), Some(Error::PeripheralInUse));
    }
}
