//! Peripheral kernel clock multiplexers
//!
//! Each multiplexer in D1CCIPR, D2CCIP1R, D2CCIP2R and D3CCIPR has a
//! selection enum and three methods on [`Rcc`](super::Rcc):
//!
//! * `set_<mux>_clk_sel` selects the kernel clock source
//! * `<mux>_clk_sel` returns the current selection, or `None` for a
//!   reserved encoding
//! * `<mux>_clock_freq` returns the kernel clock frequency, or `None` if
//!   the selected source is not running
//!
//! ```rust,ignore
//! rcc.set_usart234578_clk_sel(Usart234578ClkSel::HsiKer);
//! let ker_ck = rcc.usart234578_clock_freq();
//! ```
//!
//! See RM0433 Rev 7 Section 8.5.8 "Kernel clock distribution overview".
//!
//! It is possible to switch these clocks dynamically without generating
//! spurs or timing violations. However, both clocks must be running. See
//! RM0433 Rev 7 Section 8.5.10.

use super::{Pll, Rcc};
use crate::time::Hertz;

/// Clocks that feed the kernel clock multiplexers
#[derive(Copy, Clone)]
enum Source {
    Hclk,
    Pclk1,
    Pclk2,
    Pclk4,
    SysCk,
    Pll1Q,
    Pll2P,
    Pll2Q,
    Pll2R,
    Pll3P,
    Pll3Q,
    Pll3R,
    HsiKer,
    CsiKer,
    CsiDiv122,
    Hsi48,
    Hse,
    Lse,
    Lsi,
    I2sCkin,
    Per,
    Disabled,
}

impl<'a> Rcc<'a> {
    fn source_freq(&self, source: Source) -> Option<Hertz> {
        match source {
            Source::Hclk => self.hclk().ok(),
            Source::Pclk1 => self.pclk1().ok(),
            Source::Pclk2 => self.pclk2().ok(),
            Source::Pclk4 => self.pclk4().ok(),
            Source::SysCk => self.sys_ck().ok(),
            Source::Pll1Q => self.locked_pll_clocks(Pll::Pll1).q_ck,
            Source::Pll2P => self.locked_pll_clocks(Pll::Pll2).p_ck,
            Source::Pll2Q => self.locked_pll_clocks(Pll::Pll2).q_ck,
            Source::Pll2R => self.locked_pll_clocks(Pll::Pll2).r_ck,
            Source::Pll3P => self.locked_pll_clocks(Pll::Pll3).p_ck,
            Source::Pll3Q => self.locked_pll_clocks(Pll::Pll3).q_ck,
            Source::Pll3R => self.locked_pll_clocks(Pll::Pll3).r_ck,
            Source::HsiKer => self.hsi_ck(),
            Source::CsiKer => self.csi_ck(),
            Source::CsiDiv122 => self.csi_ck().map(|ck| ck.div(122)),
            Source::Hsi48 => self.hsi48_ck(),
            Source::Hse => self.hse_ck(),
            Source::Lse => self.lse_ck(),
            Source::Lsi => self.lsi_ck(),
            Source::I2sCkin => self.i2s_ckin_frequency(),
            Source::Per => self.per_clock_freq(),
            Source::Disabled => None,
        }
    }

    /// Frequency of the LTDC kernel clock
    ///
    /// The LTDC has no kernel clock mux, it always runs from `pll3_r_ck`.
    pub fn ltdc_clock_freq(&self) -> Option<Hertz> {
        self.source_freq(Source::Pll3R)
    }
}

// This macro uses the paste::paste! macro to create identifiers.
macro_rules! kernel_clocks {
    ($(
        $(#[$meta:meta])*
        $Sel:ident, $mux:ident: $ccip:ident[$pos:literal, $width:literal] {
            $( $Variant:ident = $bits:literal => $Source:ident, )+
        }
    )+) => {
        paste::paste! {
            $(
                $(#[$meta])*
                #[derive(Copy, Clone, Debug, PartialEq, Eq)]
                #[cfg_attr(feature = "defmt", derive(defmt::Format))]
                pub enum $Sel {
                    $(
                        #[allow(missing_docs)]
                        $Variant = $bits,
                    )+
                }

                impl $Sel {
                    fn from_bits(bits: u32) -> Option<Self> {
                        match bits {
                            $( $bits => Some($Sel::$Variant), )+
                            _ => None,
                        }
                    }

                    fn source(self) -> Source {
                        match self {
                            $( $Sel::$Variant => Source::$Source, )+
                        }
                    }
                }

                impl<'a> Rcc<'a> {
                    #[doc = concat!("Select the ", stringify!($mux), " kernel clock source")]
                    pub fn [< set_ $mux _clk_sel >](&self, sel: $Sel) {
                        critical_section::with(|_| {
                            self.rb.$ccip.write_field($pos, $width, sel as u32)
                        });
                    }

                    #[doc = concat!("Current ", stringify!($mux), " kernel clock source")]
                    pub fn [< $mux _clk_sel >](&self) -> Option<$Sel> {
                        $Sel::from_bits(self.rb.$ccip.read_field($pos, $width))
                    }

                    #[doc = concat!("Frequency of the ", stringify!($mux), " kernel clock")]
                    pub fn [< $mux _clock_freq >](&self) -> Option<Hertz> {
                        self.[< $mux _clk_sel >]()
                            .and_then(|sel| self.source_freq(sel.source()))
                    }
                }
            )+
        }
    };
}

kernel_clocks! {
    /// FMC kernel clock source selection
    FmcClkSel, fmc: d1ccipr[0, 2] {
        Hclk3 = 0 => Hclk,
        Pll1Q = 1 => Pll1Q,
        Pll2R = 2 => Pll2R,
        Per = 3 => Per,
    }
    /// QUADSPI kernel clock source selection
    QspiClkSel, qspi: d1ccipr[4, 2] {
        Hclk3 = 0 => Hclk,
        Pll1Q = 1 => Pll1Q,
        Pll2R = 2 => Pll2R,
        Per = 3 => Per,
    }
    /// SDMMC1 and SDMMC2 kernel clock source selection
    SdmmcClkSel, sdmmc: d1ccipr[16, 1] {
        Pll1Q = 0 => Pll1Q,
        Pll2R = 1 => Pll2R,
    }
    /// Peripheral clock (per_ck) source selection
    PerClkSel, per: d1ccipr[28, 2] {
        HsiKer = 0 => HsiKer,
        CsiKer = 1 => CsiKer,
        Hse = 2 => Hse,
    }
    /// SAI1 and DFSDM1 audio kernel clock source selection
    Sai1ClkSel, sai1: d2ccip1r[0, 3] {
        Pll1Q = 0 => Pll1Q,
        Pll2P = 1 => Pll2P,
        Pll3P = 2 => Pll3P,
        I2sCkin = 3 => I2sCkin,
        Per = 4 => Per,
    }
    /// SAI2 and SAI3 kernel clock source selection
    Sai23ClkSel, sai23: d2ccip1r[6, 3] {
        Pll1Q = 0 => Pll1Q,
        Pll2P = 1 => Pll2P,
        Pll3P = 2 => Pll3P,
        I2sCkin = 3 => I2sCkin,
        Per = 4 => Per,
    }
    /// SPI1, SPI2 and SPI3 kernel clock source selection
    Spi123ClkSel, spi123: d2ccip1r[12, 3] {
        Pll1Q = 0 => Pll1Q,
        Pll2P = 1 => Pll2P,
        Pll3P = 2 => Pll3P,
        I2sCkin = 3 => I2sCkin,
        Per = 4 => Per,
    }
    /// SPI4 and SPI5 kernel clock source selection
    Spi45ClkSel, spi45: d2ccip1r[16, 3] {
        Pclk2 = 0 => Pclk2,
        Pll2Q = 1 => Pll2Q,
        Pll3Q = 2 => Pll3Q,
        HsiKer = 3 => HsiKer,
        CsiKer = 4 => CsiKer,
        Hse = 5 => Hse,
    }
    /// SPDIFRX kernel clock source selection
    SpdifClkSel, spdif: d2ccip1r[20, 2] {
        Pll1Q = 0 => Pll1Q,
        Pll2R = 1 => Pll2R,
        Pll3R = 2 => Pll3R,
        HsiKer = 3 => HsiKer,
    }
    /// DFSDM1 kernel clock source selection
    Dfsdm1ClkSel, dfsdm1: d2ccip1r[24, 1] {
        Pclk2 = 0 => Pclk2,
        SysCk = 1 => SysCk,
    }
    /// FDCAN kernel clock source selection
    FdcanClkSel, fdcan: d2ccip1r[28, 2] {
        Hse = 0 => Hse,
        Pll1Q = 1 => Pll1Q,
        Pll2Q = 2 => Pll2Q,
    }
    /// SWPMI kernel clock source selection
    SwpmiClkSel, swpmi: d2ccip1r[31, 1] {
        Pclk1 = 0 => Pclk1,
        HsiKer = 1 => HsiKer,
    }
    /// USART2/3, UART4/5/7/8 kernel clock source selection
    Usart234578ClkSel, usart234578: d2ccip2r[0, 3] {
        Pclk1 = 0 => Pclk1,
        Pll2Q = 1 => Pll2Q,
        Pll3Q = 2 => Pll3Q,
        HsiKer = 3 => HsiKer,
        CsiKer = 4 => CsiKer,
        Lse = 5 => Lse,
    }
    /// USART1 and USART6 kernel clock source selection
    Usart16ClkSel, usart16: d2ccip2r[3, 3] {
        Pclk2 = 0 => Pclk2,
        Pll2Q = 1 => Pll2Q,
        Pll3Q = 2 => Pll3Q,
        HsiKer = 3 => HsiKer,
        CsiKer = 4 => CsiKer,
        Lse = 5 => Lse,
    }
    /// RNG kernel clock source selection
    RngClkSel, rng: d2ccip2r[8, 2] {
        Hsi48 = 0 => Hsi48,
        Pll1Q = 1 => Pll1Q,
        Lse = 2 => Lse,
        Lsi = 3 => Lsi,
    }
    /// I2C1, I2C2 and I2C3 kernel clock source selection
    I2c123ClkSel, i2c123: d2ccip2r[12, 2] {
        Pclk1 = 0 => Pclk1,
        Pll3R = 1 => Pll3R,
        HsiKer = 2 => HsiKer,
        CsiKer = 3 => CsiKer,
    }
    /// USB OTG kernel clock source selection
    UsbClkSel, usb: d2ccip2r[20, 2] {
        Disabled = 0 => Disabled,
        Pll1Q = 1 => Pll1Q,
        Pll3Q = 2 => Pll3Q,
        Hsi48 = 3 => Hsi48,
    }
    /// HDMI-CEC kernel clock source selection
    CecClkSel, cec: d2ccip2r[22, 2] {
        Lse = 0 => Lse,
        Lsi = 1 => Lsi,
        CsiKerDiv122 = 2 => CsiDiv122,
    }
    /// LPTIM1 kernel clock source selection
    Lptim1ClkSel, lptim1: d2ccip2r[28, 3] {
        Pclk1 = 0 => Pclk1,
        Pll2P = 1 => Pll2P,
        Pll3R = 2 => Pll3R,
        Lse = 3 => Lse,
        Lsi = 4 => Lsi,
        Per = 5 => Per,
    }
    /// LPUART1 kernel clock source selection
    Lpuart1ClkSel, lpuart1: d3ccipr[0, 3] {
        Pclk4 = 0 => Pclk4,
        Pll2Q = 1 => Pll2Q,
        Pll3Q = 2 => Pll3Q,
        HsiKer = 3 => HsiKer,
        CsiKer = 4 => CsiKer,
        Lse = 5 => Lse,
    }
    /// I2C4 kernel clock source selection
    I2c4ClkSel, i2c4: d3ccipr[8, 2] {
        Pclk4 = 0 => Pclk4,
        Pll3R = 1 => Pll3R,
        HsiKer = 2 => HsiKer,
        CsiKer = 3 => CsiKer,
    }
    /// LPTIM2 kernel clock source selection
    Lptim2ClkSel, lptim2: d3ccipr[10, 3] {
        Pclk4 = 0 => Pclk4,
        Pll2P = 1 => Pll2P,
        Pll3R = 2 => Pll3R,
        Lse = 3 => Lse,
        Lsi = 4 => Lsi,
        Per = 5 => Per,
    }
    /// LPTIM3, LPTIM4 and LPTIM5 kernel clock source selection
    Lptim345ClkSel, lptim345: d3ccipr[13, 3] {
        Pclk4 = 0 => Pclk4,
        Pll2P = 1 => Pll2P,
        Pll3R = 2 => Pll3R,
        Lse = 3 => Lse,
        Lsi = 4 => Lsi,
        Per = 5 => Per,
    }
    /// ADC kernel clock source selection
    AdcClkSel, adc: d3ccipr[16, 2] {
        Pll2P = 0 => Pll2P,
        Pll3R = 1 => Pll3R,
        Per = 2 => Per,
    }
    /// SAI4 sub-block A kernel clock source selection
    Sai4AClkSel, sai4a: d3ccipr[21, 3] {
        Pll1Q = 0 => Pll1Q,
        Pll2P = 1 => Pll2P,
        Pll3P = 2 => Pll3P,
        I2sCkin = 3 => I2sCkin,
        Per = 4 => Per,
    }
    /// SAI4 sub-block B kernel clock source selection
    Sai4BClkSel, sai4b: d3ccipr[24, 3] {
        Pll1Q = 0 => Pll1Q,
        Pll2P = 1 => Pll2P,
        Pll3P = 2 => Pll3P,
        I2sCkin = 3 => I2sCkin,
        Per = 4 => Per,
    }
    /// SPI6 kernel clock source selection
    Spi6ClkSel, spi6: d3ccipr[28, 3] {
        Pclk4 = 0 => Pclk4,
        Pll2Q = 1 => Pll2Q,
        Pll3Q = 2 => Pll3Q,
        HsiKer = 3 => HsiKer,
        CsiKer = 4 => CsiKer,
        Hse = 5 => Hse,
    }
}

#[cfg(test)]
mod tests {
    use super::super::registers::cr;
    use super::*;
    use crate::rcc::tests::zeroed;
    use crate::rcc::{PllOutput, PllSource};
    use crate::time::U32Ext;

    #[test]
    fn mux_fields() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.set_fmc_clk_sel(FmcClkSel::Per);
        rcc.set_qspi_clk_sel(QspiClkSel::Pll2R);
        rcc.set_sdmmc_clk_sel(SdmmcClkSel::Pll2R);
        rcc.set_per_clk_sel(PerClkSel::Hse);
        assert_eq!(rb.d1ccipr.read(), 3 | 2 << 4 | 1 << 16 | 2 << 28);

        rcc.set_swpmi_clk_sel(SwpmiClkSel::HsiKer);
        rcc.set_spi45_clk_sel(Spi45ClkSel::Hse);
        assert_eq!(rb.d2ccip1r.read(), 1 << 31 | 5 << 16);

        rcc.set_lptim1_clk_sel(Lptim1ClkSel::Per);
        rcc.set_cec_clk_sel(CecClkSel::CsiKerDiv122);
        assert_eq!(rb.d2ccip2r.read(), 5 << 28 | 2 << 22);

        rcc.set_sai4b_clk_sel(Sai4BClkSel::Per);
        rcc.set_spi6_clk_sel(Spi6ClkSel::CsiKer);
        assert_eq!(rb.d3ccipr.read(), 4 << 24 | 4 << 28);

        assert_eq!(rcc.fmc_clk_sel(), Some(FmcClkSel::Per));
        assert_eq!(rcc.sai4b_clk_sel(), Some(Sai4BClkSel::Per));
        assert_eq!(rcc.sai4a_clk_sel(), Some(Sai4AClkSel::Pll1Q));

        // Switching one mux leaves its neighbours alone
        rcc.set_fmc_clk_sel(FmcClkSel::Hclk3);
        assert_eq!(rb.d1ccipr.read(), 2 << 4 | 1 << 16 | 2 << 28);
    }

    #[test]
    fn reserved_encodings() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rb.d2ccip2r.write(7);
        assert_eq!(rcc.usart234578_clk_sel(), None);
        assert_eq!(rcc.usart234578_clock_freq(), None);

        rb.d1ccipr.write(3 << 28);
        assert_eq!(rcc.per_clk_sel(), None);
        assert_eq!(rcc.per_clock_freq(), None);
    }

    #[test]
    fn bus_and_oscillator_sources() {
        let rb = zeroed();
        rb.cr.write(cr::HSION | cr::HSIRDY);
        let rcc = Rcc::new(&rb);

        // Reset value selects the APB clocks
        assert_eq!(rcc.usart16_clock_freq(), Some(Hertz(64_000_000)));
        assert_eq!(rcc.lpuart1_clock_freq(), Some(Hertz(64_000_000)));
        assert_eq!(rcc.fmc_clock_freq(), Some(Hertz(64_000_000)));
        assert_eq!(rcc.dfsdm1_clock_freq(), Some(Hertz(64_000_000)));

        rcc.set_i2c123_clk_sel(I2c123ClkSel::HsiKer);
        assert_eq!(rcc.i2c123_clock_freq(), Some(Hertz(64_000_000)));
        rcc.set_i2c123_clk_sel(I2c123ClkSel::CsiKer);
        assert_eq!(rcc.i2c123_clock_freq(), None);

        rb.cr.set_bits(cr::CSION | cr::CSIRDY);
        assert_eq!(rcc.i2c123_clock_freq(), Some(Hertz(4_000_000)));

        rcc.set_cec_clk_sel(CecClkSel::CsiKerDiv122);
        assert_eq!(rcc.cec_clock_freq(), Some(Hertz(32_786)));

        // Reset value selects HSI48, which is not running
        assert_eq!(rcc.rng_clock_freq(), None);
        assert_eq!(rcc.usb_clock_freq(), None);
    }

    #[test]
    fn per_ck_follows_ckpersel() {
        let rb = zeroed();
        rb.cr.write(cr::HSION | cr::HSIRDY | cr::HSEON | cr::HSERDY);
        let rcc = Rcc::new(&rb).use_hse(24.mhz());

        rcc.set_adc_clk_sel(AdcClkSel::Per);
        assert_eq!(rcc.adc_clock_freq(), Some(Hertz(64_000_000)));
        rcc.set_per_clk_sel(PerClkSel::Hse);
        assert_eq!(rcc.adc_clock_freq(), Some(Hertz(24_000_000)));
        rcc.set_per_clk_sel(PerClkSel::CsiKer);
        assert_eq!(rcc.adc_clock_freq(), None);
    }

    #[test]
    fn external_i2s_clock() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.set_sai1_clk_sel(Sai1ClkSel::I2sCkin);
        assert_eq!(rcc.sai1_clock_freq(), None);

        let rcc = rcc.i2s_ckin(12_288.khz());
        assert_eq!(rcc.sai1_clock_freq(), Some(Hertz(12_288_000)));
    }

    #[test]
    fn pll_sources_require_lock() {
        let rb = zeroed();
        rb.cr.write(cr::HSION | cr::HSIRDY);
        let rcc = Rcc::new(&rb);

        // 64 MHz / 32 * 200 / 4 = 100 MHz
        rcc.set_pll_source(PllSource::Hsi);
        rcc.set_pll_m(Pll::Pll3, 32).unwrap();
        rcc.set_pll_n(Pll::Pll3, 200).unwrap();
        rcc.set_pll_divider(Pll::Pll3, PllOutput::R, 4).unwrap();
        rcc.enable_pll_output(Pll::Pll3, PllOutput::R);

        rcc.set_i2c4_clk_sel(I2c4ClkSel::Pll3R);
        assert_eq!(rcc.i2c4_clock_freq(), None);

        rb.cr.set_bits(cr::PLL3ON | cr::PLL3RDY);
        assert_eq!(rcc.i2c4_clock_freq(), Some(Hertz(100_000_000)));

        // Locked, but the Q output is disabled
        rcc.set_spi6_clk_sel(Spi6ClkSel::Pll3Q);
        assert_eq!(rcc.spi6_clock_freq(), None);
    }

    #[test]
    fn ltdc_runs_from_pll3_r() {
        let rb = zeroed();
        rb.cr.write(cr::HSION | cr::HSIRDY);
        let rcc = Rcc::new(&rb);
        assert_eq!(rcc.ltdc_clock_freq(), None);

        // 64 MHz / 32 * 165 / 11 = 30 MHz
        rcc.set_pll_source(PllSource::Hsi);
        rcc.set_pll_m(Pll::Pll3, 32).unwrap();
        rcc.set_pll_n(Pll::Pll3, 165).unwrap();
        rcc.set_pll_divider(Pll::Pll3, PllOutput::R, 11).unwrap();
        rcc.enable_pll_output(Pll::Pll3, PllOutput::R);
        assert_eq!(rcc.ltdc_clock_freq(), None);

        rb.cr.set_bits(cr::PLL3ON | cr::PLL3RDY);
        assert_eq!(rcc.ltdc_clock_freq(), Some(Hertz(30_000_000)));

        rcc.disable_pll_output(Pll::Pll3, PllOutput::R);
        assert_eq!(rcc.ltdc_clock_freq(), None);
    }
}
