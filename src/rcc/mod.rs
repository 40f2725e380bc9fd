//! Reset and Clock Control
//!
//! This module gives low-layer access to the RCC unit: the oscillators,
//! the system clock switch `sys_ck`, the prescalers of the CPU clock
//! `c_ck`, of the AMBA High-performance Busses `hclk` and of the AMBA
//! Peripheral Busses `pclkN`, the three PLLs and the peripheral kernel
//! clock multiplexers.
//!
//! See Fig 46 "Core and bus clock generation" in Reference Manual
//! RM0433 for information (p 336).
//!
//! HSI is 64 MHz.
//! CSI is 4 MHz.
//! HSI48 is 48MHz.
//! LSI is 32 kHz.
//!
//! # Usage
//!
//! Nothing is configured when the [`Rcc`](struct.Rcc.html) is created.
//! Each method performs a single access to the registers. The frequencies
//! of the external clocks, which cannot be read back from the hardware,
//! are specified with a builder pattern. Frequencies are then computed
//! from the current register state.
//!
//! ```rust,ignore
//!     let dp = pac::Peripherals::take().unwrap();
//!
//!     let rcc = dp.RCC.constrain()
//!         .use_hse(25.mhz()); // XTAL X1
//!
//!     rcc.enable_hse();
//!     while !rcc.is_hse_ready() {}
//!
//!     let clocks = rcc.core_clocks()?;
//!     assert_eq!(clocks.hclk().0, 64_000_000);
//! ```
//!
//! # Peripherals
//!
//! The bus clock of each peripheral is gated in [`bus`](bus/index.html).
//! A [`Rec`](rec/struct.Rec.html) gives ownership of the reset and enable
//! control of a peripheral to its driver.
//!
//!```rust,ignore
//! // Enable the clock to a peripheral and reset it
//! let rec = rcc.rec(Ahb3::MDMA)?.enable().reset();
//!```
#![deny(missing_docs)]

pub mod bus;
mod clocks;
pub mod kernel;
mod pll;
pub mod rec;
mod registers;
mod reset_reason;

pub use bus::{Ahb1, Ahb2, Ahb3, Ahb4, Apb1H, Apb1L, Apb2, Apb3, Apb4};
pub use clocks::CoreClocks;
pub use pll::{
    calc_pll_clock_freq, InputRange, Pll, PllClocks, PllConfig,
    PllConfigStrategy, PllDividers, PllOutput, PllSource, VcoRange,
};
pub use registers::RegisterBlock;
pub use reset_reason::ResetReason;

use core::cell::Cell;

use crate::time::Hertz;
use crate::Error;
use registers::{bdcr, cfgr, cr, csr, d1cfgr, d2cfgr, d3cfgr, rsr};

/// High Speed Internal oscillator (Hz)
pub const HSI: u32 = 64_000_000;
/// Low-power Internal oscillator (Hz)
pub const CSI: u32 = 4_000_000;
/// 48 MHz High Speed Internal oscillator (Hz)
pub const HSI48: u32 = 48_000_000;
/// Low Speed Internal oscillator (Hz)
pub const LSI: u32 = 32_000;
/// Typical Low Speed External crystal (Hz)
pub const LSE: u32 = 32_768;

/// Frequencies of the clocks external to the device
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    hse: Option<u32>,
    lse: u32,
    i2s_ckin: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hse: None,
            lse: LSE,
            i2s_ckin: None,
        }
    }
}

/// RCC peripheral
///
/// Created with `new` from the register block, or by calling `constrain`
/// on the PAC's RCC peripheral.
///
/// ```rust,ignore
/// let dp = stm32::Peripherals::take().unwrap();
/// let rcc = dp.RCC.constrain();
/// ```
pub struct Rcc<'a> {
    config: Config,
    pub(crate) rb: &'a RegisterBlock,
    /// Peripherals whose `Rec` was handed out, per bus group
    pub(crate) issued: [Cell<u32>; bus::BUS_GROUPS],
}

/// Extension trait that constrains the `RCC` peripheral
#[cfg(feature = "device-selected")]
pub trait RccExt {
    /// Constrains the `RCC` peripheral so it plays nicely with the other
    /// abstractions
    fn constrain(self) -> Rcc<'static>;
}

#[cfg(feature = "device-selected")]
impl RccExt for crate::stm32::RCC {
    fn constrain(self) -> Rcc<'static> {
        // Owning the PAC singleton guarantees a unique handle
        Rcc::new(unsafe { RegisterBlock::steal() })
    }
}

impl<'a> Rcc<'a> {
    /// Create a RCC handle from its register block. Nothing is written to
    /// the registers
    pub fn new(rb: &'a RegisterBlock) -> Self {
        Rcc {
            config: Config::default(),
            rb,
            issued: Default::default(),
        }
    }

    /// Uses HSE (external oscillator) instead of HSI (internal RC
    /// oscillator) as the clock source. Specifies the frequency of the
    /// crystal or bypass clock
    #[must_use]
    pub fn use_hse<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.config.hse = Some(freq.into().0);
        self
    }

    /// Specifies the frequency of the LSE crystal or bypass clock. Default
    /// 32.768 kHz
    #[must_use]
    pub fn lse<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.config.lse = freq.into().0;
        self
    }

    /// Specifies the frequency of the external clock on the I2S_CKIN pin
    #[must_use]
    pub fn i2s_ckin<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.config.i2s_ckin = Some(freq.into().0);
        self
    }

    /// The external clock frequencies
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Frequency specified for HSE
    pub fn hse_frequency(&self) -> Result<Hertz, Error> {
        self.config
            .hse
            .map(Hertz)
            .ok_or(Error::HseFrequencyUnknown)
    }

    pub(crate) fn lse_frequency(&self) -> Hertz {
        Hertz(self.config.lse)
    }

    pub(crate) fn i2s_ckin_frequency(&self) -> Option<Hertz> {
        self.config.i2s_ckin.map(Hertz)
    }
}

macro_rules! oscillator_control {
    ($($osc:ident: $name:literal, $reg:ident, $on:expr, $rdy:expr;)+) => {
        paste::item! {
            impl<'a> Rcc<'a> {
                $(
                    #[doc = concat!("Enable the ", $name, " oscillator")]
                    #[inline]
                    pub fn [< enable_ $osc >](&self) {
                        self.rb.$reg.set_bits($on);
                    }
                    #[doc = concat!("Disable the ", $name, " oscillator")]
                    #[inline]
                    pub fn [< disable_ $osc >](&self) {
                        self.rb.$reg.clear_bits($on);
                    }
                    #[doc = concat!("True if the ", $name, " oscillator is ready")]
                    #[inline]
                    pub fn [< is_ $osc _ready >](&self) -> bool {
                        self.rb.$reg.is_set($rdy)
                    }
                )+
            }
        }
    };
}

oscillator_control! {
    hsi: "HSI", cr, cr::HSION, cr::HSIRDY;
    csi: "CSI", cr, cr::CSION, cr::CSIRDY;
    hsi48: "HSI48", cr, cr::HSI48ON, cr::HSI48RDY;
    hse: "HSE", cr, cr::HSEON, cr::HSERDY;
    lse: "LSE", bdcr, bdcr::LSEON, bdcr::LSERDY;
    lsi: "LSI", csr, csr::LSION, csr::LSIRDY;
}

/// HSI oscillator divider
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HsiDivider {
    /// hsi_ck = 64 MHz
    Div1 = 0,
    /// hsi_ck = 32 MHz
    Div2 = 1,
    /// hsi_ck = 16 MHz
    Div4 = 2,
    /// hsi_ck = 8 MHz
    Div8 = 3,
}

/// System clock switch
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClkSource {
    /// HSI selected as system clock
    Hsi = 0,
    /// CSI selected as system clock
    Csi = 1,
    /// HSE selected as system clock
    Hse = 2,
    /// PLL1 P output selected as system clock
    Pll1 = 3,
}

/// Prescaler of the system clock (D1CPRE) and of the AHB clock (HPRE)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AhbPrescaler {
    /// Not divided
    Div1 = 0b0000,
    /// Divided by 2
    Div2 = 0b1000,
    /// Divided by 4
    Div4 = 0b1001,
    /// Divided by 8
    Div8 = 0b1010,
    /// Divided by 16
    Div16 = 0b1011,
    /// Divided by 64
    Div64 = 0b1100,
    /// Divided by 128
    Div128 = 0b1101,
    /// Divided by 256
    Div256 = 0b1110,
    /// Divided by 512
    Div512 = 0b1111,
}

impl AhbPrescaler {
    /// Decode the register value. All values `0xxx` select `Div1`
    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits & 0xF {
            0b1000 => AhbPrescaler::Div2,
            0b1001 => AhbPrescaler::Div4,
            0b1010 => AhbPrescaler::Div8,
            0b1011 => AhbPrescaler::Div16,
            0b1100 => AhbPrescaler::Div64,
            0b1101 => AhbPrescaler::Div128,
            0b1110 => AhbPrescaler::Div256,
            0b1111 => AhbPrescaler::Div512,
            _ => AhbPrescaler::Div1,
        }
    }

    /// Right shift performed on the input clock
    pub fn shift(self) -> u32 {
        match self {
            AhbPrescaler::Div1 => 0,
            AhbPrescaler::Div2 => 1,
            AhbPrescaler::Div4 => 2,
            AhbPrescaler::Div8 => 3,
            AhbPrescaler::Div16 => 4,
            AhbPrescaler::Div64 => 6,
            AhbPrescaler::Div128 => 7,
            AhbPrescaler::Div256 => 8,
            AhbPrescaler::Div512 => 9,
        }
    }

    /// Division factor
    pub fn divisor(self) -> u32 {
        1 << self.shift()
    }
}

/// Prescaler of an APB clock (D1PPRE, D2PPRE1, D2PPRE2, D3PPRE)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApbPrescaler {
    /// Not divided
    Div1 = 0b000,
    /// Divided by 2
    Div2 = 0b100,
    /// Divided by 4
    Div4 = 0b101,
    /// Divided by 8
    Div8 = 0b110,
    /// Divided by 16
    Div16 = 0b111,
}

impl ApbPrescaler {
    /// Decode the register value. All values `0xx` select `Div1`
    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0b100 => ApbPrescaler::Div2,
            0b101 => ApbPrescaler::Div4,
            0b110 => ApbPrescaler::Div8,
            0b111 => ApbPrescaler::Div16,
            _ => ApbPrescaler::Div1,
        }
    }

    /// Right shift performed on the input clock
    pub fn shift(self) -> u32 {
        match self {
            ApbPrescaler::Div1 => 0,
            ApbPrescaler::Div2 => 1,
            ApbPrescaler::Div4 => 2,
            ApbPrescaler::Div8 => 3,
            ApbPrescaler::Div16 => 4,
        }
    }

    /// Division factor
    pub fn divisor(self) -> u8 {
        1 << self.shift()
    }
}

/// Timer kernel clock prescaler selection (TIMPRE)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerPrescaler {
    /// Timer kernel clock is at most twice the APB clock
    Twice,
    /// Timer kernel clock is at most four times the APB clock
    FourTimes,
}

bitflags::bitflags! {
    /// Clock ready and clock security system interrupt sources
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ClockInterrupt: u32 {
        /// LSI ready
        const LSIRDY = 1 << 0;
        /// LSE ready
        const LSERDY = 1 << 1;
        /// HSI ready
        const HSIRDY = 1 << 2;
        /// HSE ready
        const HSERDY = 1 << 3;
        /// CSI ready
        const CSIRDY = 1 << 4;
        /// HSI48 ready
        const HSI48RDY = 1 << 5;
        /// PLL1 locked
        const PLL1RDY = 1 << 6;
        /// PLL2 locked
        const PLL2RDY = 1 << 7;
        /// PLL3 locked
        const PLL3RDY = 1 << 8;
        /// LSE clock security system failure
        const LSECSS = 1 << 9;
        /// HSE clock security system failure. This flag has no interrupt
        /// enable, it always generates a NMI
        const HSECSS = 1 << 10;
    }
}

impl<'a> Rcc<'a> {
    /// Set the HSI divider
    pub fn set_hsi_divider(&self, div: HsiDivider) {
        self.rb.cr.write_field(cr::HSIDIV_POS, 2, div as u32);
    }

    /// HSI divider
    pub fn hsi_divider(&self) -> HsiDivider {
        match self.rb.cr.read_field(cr::HSIDIV_POS, 2) {
            0 => HsiDivider::Div1,
            1 => HsiDivider::Div2,
            2 => HsiDivider::Div4,
            _ => HsiDivider::Div8,
        }
    }

    /// True once a new HSI divider value has been taken into account
    pub fn is_hsi_divider_ready(&self) -> bool {
        self.rb.cr.is_set(cr::HSIDIVF)
    }

    /// Keep HSI running in Stop mode for the peripheral kernel clocks
    pub fn enable_hsi_stop_mode(&self) {
        self.rb.cr.set_bits(cr::HSIKERON);
    }

    /// Stop HSI in Stop mode
    pub fn disable_hsi_stop_mode(&self) {
        self.rb.cr.clear_bits(cr::HSIKERON);
    }

    /// Keep CSI running in Stop mode for the peripheral kernel clocks
    pub fn enable_csi_stop_mode(&self) {
        self.rb.cr.set_bits(cr::CSIKERON);
    }

    /// Stop CSI in Stop mode
    pub fn disable_csi_stop_mode(&self) {
        self.rb.cr.clear_bits(cr::CSIKERON);
    }

    /// Bypass the HSE oscillator with an external clock. HSE must be
    /// disabled
    pub fn enable_hse_bypass(&self) {
        self.rb.cr.set_bits(cr::HSEBYP);
    }

    /// Use a crystal on the HSE oscillator pins
    pub fn disable_hse_bypass(&self) {
        self.rb.cr.clear_bits(cr::HSEBYP);
    }

    /// Enable the HSE clock security system. Only a reset clears it
    pub fn enable_hse_css(&self) {
        self.rb.cr.set_bits(cr::HSECSSON);
    }

    /// Bypass the LSE oscillator with an external clock. LSE must be
    /// disabled
    pub fn enable_lse_bypass(&self) {
        self.rb.bdcr.set_bits(bdcr::LSEBYP);
    }

    /// Use a crystal on the LSE oscillator pins
    pub fn disable_lse_bypass(&self) {
        self.rb.bdcr.clear_bits(bdcr::LSEBYP);
    }

    /// True when the domain 1 clocks are available
    pub fn is_d1_clock_ready(&self) -> bool {
        self.rb.cr.is_set(cr::D1CKRDY)
    }

    /// True when the domain 2 clocks are available
    pub fn is_d2_clock_ready(&self) -> bool {
        self.rb.cr.is_set(cr::D2CKRDY)
    }

    /// Select the system clock source
    pub fn set_sys_clk_source(&self, source: SysClkSource) {
        self.rb.cfgr.write_field(cfgr::SW_POS, 3, source as u32);
    }

    /// Clock source currently used as system clock. Reserved register
    /// values read as HSI, the clock selected after reset
    pub fn sys_clk_source(&self) -> SysClkSource {
        match self.rb.cfgr.read_field(cfgr::SWS_POS, 3) {
            1 => SysClkSource::Csi,
            2 => SysClkSource::Hse,
            3 => SysClkSource::Pll1,
            _ => SysClkSource::Hsi,
        }
    }

    /// Set the timer kernel clock prescaler
    pub fn set_timer_prescaler(&self, prescaler: TimerPrescaler) {
        match prescaler {
            TimerPrescaler::Twice => self.rb.cfgr.clear_bits(cfgr::TIMPRE),
            TimerPrescaler::FourTimes => self.rb.cfgr.set_bits(cfgr::TIMPRE),
        }
    }

    /// Timer kernel clock prescaler
    pub fn timer_prescaler(&self) -> TimerPrescaler {
        if self.rb.cfgr.is_set(cfgr::TIMPRE) {
            TimerPrescaler::FourTimes
        } else {
            TimerPrescaler::Twice
        }
    }
}

macro_rules! prescaler_control {
    ($($set:ident, $get:ident: $Presc:ident, $reg:ident, $pos:expr, $width:expr, $doc:literal;)+) => {
        impl<'a> Rcc<'a> {
            $(
                #[doc = concat!("Set the ", $doc, " prescaler")]
                pub fn $set(&self, prescaler: $Presc) {
                    self.rb.$reg.write_field($pos, $width, prescaler as u32);
                }
                #[doc = concat!("The ", $doc, " prescaler")]
                pub fn $get(&self) -> $Presc {
                    $Presc::from_bits(self.rb.$reg.read_field($pos, $width))
                }
            )+
        }
    };
}

prescaler_control! {
    set_sys_prescaler, sys_prescaler: AhbPrescaler, d1cfgr, d1cfgr::D1CPRE_POS, 4, "system clock (D1CPRE)";
    set_ahb_prescaler, ahb_prescaler: AhbPrescaler, d1cfgr, d1cfgr::HPRE_POS, 4, "AHB clock (HPRE)";
    set_apb3_prescaler, apb3_prescaler: ApbPrescaler, d1cfgr, d1cfgr::D1PPRE_POS, 3, "APB3 clock (D1PPRE)";
    set_apb1_prescaler, apb1_prescaler: ApbPrescaler, d2cfgr, d2cfgr::D2PPRE1_POS, 3, "APB1 clock (D2PPRE1)";
    set_apb2_prescaler, apb2_prescaler: ApbPrescaler, d2cfgr, d2cfgr::D2PPRE2_POS, 3, "APB2 clock (D2PPRE2)";
    set_apb4_prescaler, apb4_prescaler: ApbPrescaler, d3cfgr, d3cfgr::D3PPRE_POS, 3, "APB4 clock (D3PPRE)";
}

impl<'a> Rcc<'a> {
    /// Enable the interrupts of `sources`
    pub fn enable_interrupt(&self, sources: ClockInterrupt) {
        self.rb.cier.set_bits(sources.bits());
    }

    /// Disable the interrupts of `sources`
    pub fn disable_interrupt(&self, sources: ClockInterrupt) {
        self.rb.cier.clear_bits(sources.bits());
    }

    /// True if the interrupts of all `sources` are enabled
    pub fn is_interrupt_enabled(&self, sources: ClockInterrupt) -> bool {
        self.rb.cier.is_set(sources.bits())
    }

    /// Interrupt flags currently raised
    pub fn interrupt_flags(&self) -> ClockInterrupt {
        ClockInterrupt::from_bits_truncate(self.rb.cifr.read())
    }

    /// True if all the flags of `sources` are raised
    pub fn is_flag_active(&self, sources: ClockInterrupt) -> bool {
        self.rb.cifr.is_set(sources.bits())
    }

    /// Clear the interrupt flags of `sources`
    pub fn clear_flag(&self, sources: ClockInterrupt) {
        self.rb.cicr.write(sources.bits());
    }

    /// Reset the clock configuration to the default reset state
    ///
    /// HSI is enabled and used as system clock. HSE, CSI, HSI48 and the
    /// PLLs are switched off, all prescalers are cleared and the PLL
    /// configuration is restored. Clock interrupts are disabled and their
    /// flags cleared, as are the reset flags.
    ///
    /// LSE, LSI and the peripheral clocks are not modified. This method
    /// waits for HSI to be ready and for the PLLs to be unlocked.
    pub fn deinit(&self) {
        log::debug!("RCC: restoring reset clock configuration");

        // HSI on, used as sys_ck when CFGR is cleared
        self.rb.cr.set_bits(cr::HSION);
        while !self.is_hsi_ready() {}
        self.rb.cfgr.write(0);

        self.rb.cr.clear_bits(
            cr::HSEON
                | cr::HSIKERON
                | cr::HSIDIV
                | cr::HSIDIVF
                | cr::CSION
                | cr::CSIKERON
                | cr::HSI48ON
                | cr::HSECSSON
                | cr::PLL1ON
                | cr::PLL2ON
                | cr::PLL3ON,
        );
        while self.rb.cr.read_bits(cr::PLL1RDY | cr::PLL2RDY | cr::PLL3RDY)
            != 0
        {}

        self.rb.d1cfgr.write(0);
        self.rb.d2cfgr.write(0);
        self.rb.d3cfgr.write(0);

        self.rb.pllckselr.write(registers::pllckselr::RESET);
        self.rb.pllcfgr.write(registers::pllcfgr::RESET);
        for pll in &[Pll::Pll1, Pll::Pll2, Pll::Pll3] {
            let (divr, fracr) = self.pll_registers(*pll);
            divr.write(registers::plldivr::RESET);
            fracr.write(0);
        }

        // Bypass cleared once HSE is off
        self.rb.cr.clear_bits(cr::HSEBYP);

        self.rb.cier.write(0);
        self.rb.cicr.write(ClockInterrupt::all().bits());
        self.rb.rsr.set_bits(rsr::RMVF);
    }
}
