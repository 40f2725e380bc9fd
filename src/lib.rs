//! Low-layer drivers for the STM32H7 Reset and Clock Control (RCC) and
//! Master DMA (MDMA) peripherals.
//!
//! Each operation in this crate is a thin, synchronous access to a fixed
//! bit-field of a memory-mapped register, in the manner of the vendor LL
//! drivers:
//!
//! * [`rcc::bus`] gates the bus clocks of peripherals, forces and releases
//!   their resets and controls their clocks in sleep mode.
//! * [`rcc`] controls the oscillators, the system clock switch and the
//!   prescalers, and computes the frequency of every clock in the tree
//!   from the current register state.
//! * [`mdma`] exposes the MDMA channel registers, a complete channel
//!   initialisation and linked-list transfer descriptors.
//!
//! Register blocks are plain `#[repr(C)]` structures. On hardware they are
//! obtained from their fixed base address, or from the PAC peripheral
//! singleton when a device feature is selected:
//!
//! ```rust,ignore
//! let dp = pac::Peripherals::take().unwrap();
//!
//! let rcc = dp.RCC.constrain().use_hse(25.mhz());
//! let clocks = rcc.core_clocks()?;
//!
//! let mdma = dp.MDMA.mdma(rcc.rec(Ahb3::MDMA)?)?;
//! ```
#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types)]

#[cfg(any(
    feature = "stm32h742",
    feature = "stm32h743",
    feature = "stm32h750",
))]
pub use stm32h7::stm32h743 as stm32;
#[cfg(any(
    feature = "stm32h742v",
    feature = "stm32h743v",
    feature = "stm32h750v",
))]
pub use stm32h7::stm32h743v as stm32;
#[cfg(feature = "stm32h753")]
pub use stm32h7::stm32h753 as stm32;
#[cfg(feature = "stm32h753v")]
pub use stm32h7::stm32h753v as stm32;

#[cfg(feature = "device-selected")]
pub use crate::stm32 as pac;

mod error;
pub mod mdma;
pub mod prelude;
pub mod rcc;
pub mod register;
pub mod time;

pub use crate::error::Error;
