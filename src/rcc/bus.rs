//! Bus clock gating
//!
//! Each bus group has an enable register (ENR), a reset register (RSTR) and
//! a sleep-mode enable register (LPENR), with one bit per peripheral at the
//! same position in all three. The peripherals of a group are `bitflags`,
//! so several peripherals on the same bus can be controlled at once.
//!
//! ```rust,ignore
//! rcc.ahb4().enable_clock(Ahb4::GPIOA | Ahb4::GPIOB);
//!
//! rcc.apb1l().force_reset(Apb1L::USART2);
//! rcc.apb1l().release_reset(Apb1L::USART2);
//!
//! // Keep the MDMA clocked in CSleep mode
//! rcc.ahb3().enable_clock_sleep(Ahb3::MDMA);
//! ```
//!
//! The registers are shared between peripherals, so each read-modify-write
//! is performed in a critical section.

use core::marker::PhantomData;

use super::{RegisterBlock, Rcc};
use crate::register::Reg;

mod sealed {
    pub trait Sealed {}
}

/// A group of peripherals sharing the same clock enable, reset and sleep
/// mode registers
pub trait BusGroup: Copy + sealed::Sealed {
    /// Index of the group among the bus groups
    const INDEX: usize;
    /// Register bits of the peripherals
    fn bits(self) -> u32;
    /// Clock enable register
    fn enr(rb: &RegisterBlock) -> &Reg;
    /// Reset register
    fn rstr(rb: &RegisterBlock) -> &Reg;
    /// Sleep mode clock enable register
    fn lpenr(rb: &RegisterBlock) -> &Reg;
}

/// Number of bus groups
pub(crate) const BUS_GROUPS: usize = 9;

/// Clock gating of the peripherals of one bus group
pub struct Bus<'a, G> {
    rb: &'a RegisterBlock,
    _group: PhantomData<G>,
}

impl<'a, G: BusGroup> Bus<'a, G> {
    pub(crate) fn new(rb: &'a RegisterBlock) -> Self {
        Bus {
            rb,
            _group: PhantomData,
        }
    }

    /// Enable the bus clock of `periphs`
    pub fn enable_clock(&self, periphs: G) {
        let enr = G::enr(self.rb);
        critical_section::with(|_| {
            enr.set_bits(periphs.bits());
            // Delay after an RCC peripheral clock enabling
            let _ = enr.read_bits(periphs.bits());
        });
    }

    /// Disable the bus clock of `periphs`
    pub fn disable_clock(&self, periphs: G) {
        let enr = G::enr(self.rb);
        critical_section::with(|_| enr.clear_bits(periphs.bits()));
    }

    /// True if the bus clock of all `periphs` is enabled
    pub fn is_enabled_clock(&self, periphs: G) -> bool {
        G::enr(self.rb).is_set(periphs.bits())
    }

    /// Hold `periphs` in reset
    pub fn force_reset(&self, periphs: G) {
        let rstr = G::rstr(self.rb);
        critical_section::with(|_| rstr.set_bits(periphs.bits()));
    }

    /// Release `periphs` from reset
    pub fn release_reset(&self, periphs: G) {
        let rstr = G::rstr(self.rb);
        critical_section::with(|_| rstr.clear_bits(periphs.bits()));
    }

    /// Keep the bus clock of `periphs` running in CSleep mode
    pub fn enable_clock_sleep(&self, periphs: G) {
        let lpenr = G::lpenr(self.rb);
        critical_section::with(|_| lpenr.set_bits(periphs.bits()));
    }

    /// Stop the bus clock of `periphs` in CSleep mode
    pub fn disable_clock_sleep(&self, periphs: G) {
        let lpenr = G::lpenr(self.rb);
        critical_section::with(|_| lpenr.clear_bits(periphs.bits()));
    }

    /// True if the bus clock of all `periphs` runs in CSleep mode
    pub fn is_enabled_clock_sleep(&self, periphs: G) -> bool {
        G::lpenr(self.rb).is_set(periphs.bits())
    }
}

macro_rules! bus_groups {
    ($(
        $(#[$gmeta:meta])*
        $Group:ident[$index:literal], $group:ident: ($enr:ident, $rstr:ident, $lpenr:ident) {
            $( $(#[$pmeta:meta])* $P:ident = $bit:expr; )+
        }
    )+) => {
        $(
            bitflags::bitflags! {
                $(#[$gmeta])*
                #[derive(Copy, Clone, Debug, PartialEq, Eq)]
                pub struct $Group: u32 {
                    $(
                        $(#[$pmeta])*
                        #[allow(missing_docs)]
                        const $P = 1 << $bit;
                    )+
                }
            }

            impl sealed::Sealed for $Group {}
            impl BusGroup for $Group {
                const INDEX: usize = $index;
                #[inline(always)]
                fn bits(self) -> u32 {
                    $Group::bits(&self)
                }
                #[inline(always)]
                fn enr(rb: &RegisterBlock) -> &Reg {
                    &rb.$enr
                }
                #[inline(always)]
                fn rstr(rb: &RegisterBlock) -> &Reg {
                    &rb.$rstr
                }
                #[inline(always)]
                fn lpenr(rb: &RegisterBlock) -> &Reg {
                    &rb.$lpenr
                }
            }

            impl<'a> Rcc<'a> {
                #[doc = concat!("Clock gating of the ", stringify!($Group), " peripherals")]
                pub fn $group(&self) -> Bus<'a, $Group> {
                    Bus::new(self.rb)
                }
            }
        )+
    };
}

bus_groups! {
    /// AHB3 peripherals
    Ahb3[0], ahb3: (ahb3enr, ahb3rstr, ahb3lpenr) {
        MDMA = 0;
        DMA2D = 4;
        JPGDEC = 5;
        FMC = 12;
        QSPI = 14;
        SDMMC1 = 16;
    }
    /// AHB1 peripherals
    Ahb1[1], ahb1: (ahb1enr, ahb1rstr, ahb1lpenr) {
        DMA1 = 0;
        DMA2 = 1;
        ADC12 = 5;
        ETH1MAC = 15;
        ETH1TX = 16;
        ETH1RX = 17;
        USB1OTGHS = 25;
        USB1OTGHSULPI = 26;
        USB2OTGFS = 27;
        USB2OTGFSULPI = 28;
    }
    /// AHB2 peripherals
    Ahb2[2], ahb2: (ahb2enr, ahb2rstr, ahb2lpenr) {
        DCMI = 0;
        CRYP = 4;
        HASH = 5;
        RNG = 6;
        SDMMC2 = 9;
        SRAM1 = 29;
        SRAM2 = 30;
        SRAM3 = 31;
    }
    /// AHB4 peripherals
    Ahb4[3], ahb4: (ahb4enr, ahb4rstr, ahb4lpenr) {
        GPIOA = 0;
        GPIOB = 1;
        GPIOC = 2;
        GPIOD = 3;
        GPIOE = 4;
        GPIOF = 5;
        GPIOG = 6;
        GPIOH = 7;
        GPIOI = 8;
        GPIOJ = 9;
        GPIOK = 10;
        CRC = 19;
        BDMA = 21;
        ADC3 = 24;
        HSEM = 25;
        BKPRAM = 28;
    }
    /// APB3 peripherals
    Apb3[4], apb3: (apb3enr, apb3rstr, apb3lpenr) {
        LTDC = 3;
        WWDG1 = 6;
    }
    /// APB1 peripherals, low word
    Apb1L[5], apb1l: (apb1lenr, apb1lrstr, apb1llpenr) {
        TIM2 = 0;
        TIM3 = 1;
        TIM4 = 2;
        TIM5 = 3;
        TIM6 = 4;
        TIM7 = 5;
        TIM12 = 6;
        TIM13 = 7;
        TIM14 = 8;
        LPTIM1 = 9;
        SPI2 = 14;
        SPI3 = 15;
        SPDIFRX = 16;
        USART2 = 17;
        USART3 = 18;
        UART4 = 19;
        UART5 = 20;
        I2C1 = 21;
        I2C2 = 22;
        I2C3 = 23;
        CEC = 27;
        DAC12 = 29;
        UART7 = 30;
        UART8 = 31;
    }
    /// APB1 peripherals, high word
    Apb1H[6], apb1h: (apb1henr, apb1hrstr, apb1hlpenr) {
        CRS = 1;
        SWPMI = 2;
        OPAMP = 4;
        MDIOS = 5;
        FDCAN = 8;
    }
    /// APB2 peripherals
    Apb2[7], apb2: (apb2enr, apb2rstr, apb2lpenr) {
        TIM1 = 0;
        TIM8 = 1;
        USART1 = 4;
        USART6 = 5;
        SPI1 = 12;
        SPI4 = 13;
        TIM15 = 16;
        TIM16 = 17;
        TIM17 = 18;
        SPI5 = 20;
        SAI1 = 22;
        SAI2 = 23;
        SAI3 = 24;
        DFSDM1 = 28;
        HRTIM = 29;
    }
    /// APB4 peripherals
    Apb4[8], apb4: (apb4enr, apb4rstr, apb4lpenr) {
        SYSCFG = 1;
        LPUART1 = 3;
        SPI6 = 5;
        I2C4 = 7;
        LPTIM2 = 9;
        LPTIM3 = 10;
        LPTIM4 = 11;
        LPTIM5 = 12;
        COMP12 = 14;
        VREF = 15;
        RTCAPB = 16;
        SAI4 = 21;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::tests::zeroed;

    #[test]
    fn enable_and_disable_clock() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.ahb4().enable_clock(Ahb4::GPIOA | Ahb4::GPIOK);
        assert_eq!(rb.ahb4enr.read(), 1 | 1 << 10);
        assert!(rcc.ahb4().is_enabled_clock(Ahb4::GPIOA));
        assert!(rcc.ahb4().is_enabled_clock(Ahb4::GPIOA | Ahb4::GPIOK));
        assert!(!rcc.ahb4().is_enabled_clock(Ahb4::GPIOA | Ahb4::GPIOB));

        rcc.ahb4().disable_clock(Ahb4::GPIOA);
        assert_eq!(rb.ahb4enr.read(), 1 << 10);
        // Other groups untouched
        assert_eq!(rb.ahb3enr.read(), 0);
        assert_eq!(rb.ahb4rstr.read(), 0);
    }

    #[test]
    fn force_and_release_reset() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.apb1l().force_reset(Apb1L::USART2 | Apb1L::UART8);
        assert_eq!(rb.apb1lrstr.read(), 1 << 17 | 1 << 31);
        rcc.apb1l().release_reset(Apb1L::UART8);
        assert_eq!(rb.apb1lrstr.read(), 1 << 17);

        rcc.ahb3().force_reset(Ahb3::all());
        assert_eq!(rb.ahb3rstr.read(), 0x0001_5031);
        rcc.ahb3().release_reset(Ahb3::all());
        assert_eq!(rb.ahb3rstr.read(), 0);
    }

    #[test]
    fn clock_sleep() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.ahb3().enable_clock_sleep(Ahb3::MDMA);
        rcc.apb4().enable_clock_sleep(Apb4::SAI4);
        assert_eq!(rb.ahb3lpenr.read(), 1);
        assert_eq!(rb.apb4lpenr.read(), 1 << 21);
        assert!(rcc.apb4().is_enabled_clock_sleep(Apb4::SAI4));

        rcc.ahb3().disable_clock_sleep(Ahb3::MDMA);
        assert!(!rcc.ahb3().is_enabled_clock_sleep(Ahb3::MDMA));
    }

    #[test]
    fn register_selection() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.ahb1().enable_clock(Ahb1::DMA1);
        rcc.ahb2().enable_clock(Ahb2::RNG);
        rcc.apb1h().enable_clock(Apb1H::FDCAN);
        rcc.apb2().enable_clock(Apb2::SPI1);
        rcc.apb3().enable_clock(Apb3::LTDC);
        assert_eq!(rb.ahb1enr.read(), 1);
        assert_eq!(rb.ahb2enr.read(), 1 << 6);
        assert_eq!(rb.apb1henr.read(), 1 << 8);
        assert_eq!(rb.apb2enr.read(), 1 << 12);
        assert_eq!(rb.apb3enr.read(), 1 << 3);
    }
}
