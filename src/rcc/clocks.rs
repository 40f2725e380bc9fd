//! Core clock frequencies computed from the clock tree registers

use super::{Pll, Rcc, SysClkSource, TimerPrescaler, CSI, HSI, HSI48, LSI};
use crate::time::Hertz;
use crate::Error;

/// Core clock frequencies
///
/// A snapshot of the clock tree, computed from the register state by
/// [`Rcc::core_clocks`](struct.Rcc.html#method.core_clocks).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoreClocks {
    hclk: Hertz,
    pclk1: Hertz,
    pclk2: Hertz,
    pclk3: Hertz,
    pclk4: Hertz,
    ppre1: u8,
    ppre2: u8,
    ppre3: u8,
    ppre4: u8,
    csi_ck: Option<Hertz>,
    hsi_ck: Option<Hertz>,
    hsi48_ck: Option<Hertz>,
    lsi_ck: Option<Hertz>,
    lse_ck: Option<Hertz>,
    hse_ck: Option<Hertz>,
    pll1_p_ck: Option<Hertz>,
    pll1_q_ck: Option<Hertz>,
    pll1_r_ck: Option<Hertz>,
    pll2_p_ck: Option<Hertz>,
    pll2_q_ck: Option<Hertz>,
    pll2_r_ck: Option<Hertz>,
    pll3_p_ck: Option<Hertz>,
    pll3_q_ck: Option<Hertz>,
    pll3_r_ck: Option<Hertz>,
    timx_ker_ck: Hertz,
    timy_ker_ck: Hertz,
    sys_ck: Hertz,
    c_ck: Hertz,
}

/// Getters for pclk and ppre
macro_rules! pclk_ppre_getter {
    ($(($pclk:ident, $ppre:ident),)+) => {
        $(
            /// Returns the frequency of the APBn
            pub fn $pclk(&self) -> Hertz {
                self.$pclk
            }
            /// Returns the prescaler of the APBn
            pub fn $ppre(&self) -> u8 {
                self.$ppre
            }
        )+
    };
}

/// Getters for optional clocks
macro_rules! optional_ck_getter {
    ($($opt_ck:ident: $doc:expr,)+) => {
        $(
            /// Returns `Some(frequency)` if
            #[doc=$doc]
            /// is running, otherwise `None`
            pub fn $opt_ck(&self) -> Option<Hertz> {
                self.$opt_ck
            }
        )+
    };
}

/// Getters for pll clocks
macro_rules! pll_getter {
    ($($pll_ck:ident,)+) => {
        $(
            /// Returns `Some(frequency)` if the PLLx output is running,
            /// otherwise `None`
            pub fn $pll_ck(&self) -> Option<Hertz> {
                self.$pll_ck
            }
        )+
    };
}

impl CoreClocks {
    /// Returns the frequency of AHB1,2,3 busses
    pub fn hclk(&self) -> Hertz {
        self.hclk
    }

    /// Returns the frequency of the AXI bus
    pub fn aclk(&self) -> Hertz {
        self.hclk // Same as HCLK
    }

    pclk_ppre_getter! {
        (pclk1, ppre1),
        (pclk2, ppre2),
        (pclk3, ppre3),
        (pclk4, ppre4),
    }

    optional_ck_getter! {
        csi_ck: "csi_ck",
        hsi_ck: "hsi_ck",
        hsi48_ck: "hsi48_ck",
        hse_ck: "hse_ck",
        lsi_ck: "lsi_ck",
        lse_ck: "lse_ck",
    }

    pll_getter! {
        pll1_p_ck,
        pll1_q_ck,
        pll1_r_ck,
        pll2_p_ck,
        pll2_q_ck,
        pll2_r_ck,
        pll3_p_ck,
        pll3_q_ck,
        pll3_r_ck,
    }

    /// Returns the input frequency to the SCGU
    pub fn sys_ck(&self) -> Hertz {
        self.sys_ck
    }

    /// Returns the CK_INT frequency for timers on APB1
    pub fn timx_ker_ck(&self) -> Hertz {
        self.timx_ker_ck
    }

    /// Returns the CK_INT frequency for timers on APB2
    pub fn timy_ker_ck(&self) -> Hertz {
        self.timy_ker_ck
    }

    /// Returns the core frequency
    pub fn c_ck(&self) -> Hertz {
        self.c_ck
    }
}

impl<'a> Rcc<'a> {
    /// HSI kernel clock, after the HSI divider, if HSI is ready
    pub fn hsi_ck(&self) -> Option<Hertz> {
        if self.is_hsi_ready() {
            Some(Hertz(HSI).shr(self.hsi_divider() as u32))
        } else {
            None
        }
    }

    /// CSI clock, if CSI is ready
    pub fn csi_ck(&self) -> Option<Hertz> {
        if self.is_csi_ready() {
            Some(Hertz(CSI))
        } else {
            None
        }
    }

    /// HSI48 clock, if HSI48 is ready
    pub fn hsi48_ck(&self) -> Option<Hertz> {
        if self.is_hsi48_ready() {
            Some(Hertz(HSI48))
        } else {
            None
        }
    }

    /// HSE clock, if HSE is ready and its frequency was specified
    pub fn hse_ck(&self) -> Option<Hertz> {
        if self.is_hse_ready() {
            self.hse_frequency().ok()
        } else {
            None
        }
    }

    /// LSE clock, if LSE is ready
    pub fn lse_ck(&self) -> Option<Hertz> {
        if self.is_lse_ready() {
            Some(self.lse_frequency())
        } else {
            None
        }
    }

    /// LSI clock, if LSI is ready
    pub fn lsi_ck(&self) -> Option<Hertz> {
        if self.is_lsi_ready() {
            Some(Hertz(LSI))
        } else {
            None
        }
    }

    /// System clock frequency, from the clock selected by the system clock
    /// switch
    ///
    /// The switch only selects a clock that is ready, so the readiness of
    /// the selected oscillator is not checked. With PLL1 selected, the
    /// PLL1 P output must be enabled and its source known.
    pub fn sys_ck(&self) -> Result<Hertz, Error> {
        match self.sys_clk_source() {
            SysClkSource::Hsi => {
                Ok(Hertz(HSI).shr(self.hsi_divider() as u32))
            }
            SysClkSource::Csi => Ok(Hertz(CSI)),
            SysClkSource::Hse => self.hse_frequency(),
            SysClkSource::Pll1 => self
                .pll_clocks(Pll::Pll1)
                .p_ck
                .ok_or(Error::ClockNotRunning),
        }
    }

    /// CPU clock frequency, `sys_ck` divided by D1CPRE
    pub fn c_ck(&self) -> Result<Hertz, Error> {
        Ok(self.sys_ck()?.shr(self.sys_prescaler().shift()))
    }

    /// AHB and AXI clock frequency, `c_ck` divided by HPRE
    pub fn hclk(&self) -> Result<Hertz, Error> {
        Ok(self.c_ck()?.shr(self.ahb_prescaler().shift()))
    }

    /// APB1 clock frequency
    pub fn pclk1(&self) -> Result<Hertz, Error> {
        Ok(self.hclk()?.shr(self.apb1_prescaler().shift()))
    }

    /// APB2 clock frequency
    pub fn pclk2(&self) -> Result<Hertz, Error> {
        Ok(self.hclk()?.shr(self.apb2_prescaler().shift()))
    }

    /// APB3 clock frequency
    pub fn pclk3(&self) -> Result<Hertz, Error> {
        Ok(self.hclk()?.shr(self.apb3_prescaler().shift()))
    }

    /// APB4 clock frequency
    pub fn pclk4(&self) -> Result<Hertz, Error> {
        Ok(self.hclk()?.shr(self.apb4_prescaler().shift()))
    }

    /// Timer kernel clock for an APB with prescaler `ppre`
    ///
    /// See RM0433 Rev 7 Table 55 "Ratio between clock timer and pclk"
    fn tim_ker_ck(&self, hclk: Hertz, ppre: u8) -> Hertz {
        let pclk = hclk.div(ppre as u32);
        match (self.timer_prescaler(), ppre) {
            (TimerPrescaler::Twice, 1) | (TimerPrescaler::Twice, 2) => hclk,
            (TimerPrescaler::Twice, _) => Hertz(pclk.0 * 2),
            (TimerPrescaler::FourTimes, 1..=4) => hclk,
            (TimerPrescaler::FourTimes, _) => Hertz(pclk.0 * 4),
        }
    }

    /// Timer kernel clock of the timers on APB1
    pub fn timx_ker_ck(&self) -> Result<Hertz, Error> {
        Ok(self.tim_ker_ck(self.hclk()?, self.apb1_prescaler().divisor()))
    }

    /// Timer kernel clock of the timers on APB2
    pub fn timy_ker_ck(&self) -> Result<Hertz, Error> {
        Ok(self.tim_ker_ck(self.hclk()?, self.apb2_prescaler().divisor()))
    }

    /// Output frequencies of `pll`, only if it is locked
    pub(crate) fn locked_pll_clocks(&self, pll: Pll) -> super::PllClocks {
        if self.is_pll_ready(pll) {
            self.pll_clocks(pll)
        } else {
            super::PllClocks::default()
        }
    }

    /// Compute the frequency of each core clock from the register state
    pub fn core_clocks(&self) -> Result<CoreClocks, Error> {
        let sys_ck = self.sys_ck()?;
        let c_ck = sys_ck.shr(self.sys_prescaler().shift());
        let hclk = c_ck.shr(self.ahb_prescaler().shift());

        let ppre1 = self.apb1_prescaler().divisor();
        let ppre2 = self.apb2_prescaler().divisor();
        let ppre3 = self.apb3_prescaler().divisor();
        let ppre4 = self.apb4_prescaler().divisor();

        let pll1 = self.locked_pll_clocks(Pll::Pll1);
        let pll2 = self.locked_pll_clocks(Pll::Pll2);
        let pll3 = self.locked_pll_clocks(Pll::Pll3);

        Ok(CoreClocks {
            hclk,
            pclk1: hclk.div(ppre1 as u32),
            pclk2: hclk.div(ppre2 as u32),
            pclk3: hclk.div(ppre3 as u32),
            pclk4: hclk.div(ppre4 as u32),
            ppre1,
            ppre2,
            ppre3,
            ppre4,
            csi_ck: self.csi_ck(),
            hsi_ck: self.hsi_ck(),
            hsi48_ck: self.hsi48_ck(),
            lsi_ck: self.lsi_ck(),
            lse_ck: self.lse_ck(),
            hse_ck: self.hse_ck(),
            pll1_p_ck: pll1.p_ck,
            pll1_q_ck: pll1.q_ck,
            pll1_r_ck: pll1.r_ck,
            pll2_p_ck: pll2.p_ck,
            pll2_q_ck: pll2.q_ck,
            pll2_r_ck: pll2.r_ck,
            pll3_p_ck: pll3.p_ck,
            pll3_q_ck: pll3.q_ck,
            pll3_r_ck: pll3.r_ck,
            timx_ker_ck: self.tim_ker_ck(hclk, ppre1),
            timy_ker_ck: self.tim_ker_ck(hclk, ppre2),
            sys_ck,
            c_ck,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::registers::cr;
    use super::super::*;
    use crate::rcc::tests::zeroed;
    use crate::time::U32Ext;

    #[test]
    fn reset_state_runs_from_hsi() {
        let rb = zeroed();
        rb.cr.write(cr::HSION | cr::HSIRDY);
        let rcc = Rcc::new(&rb);

        let clocks = rcc.core_clocks().unwrap();
        assert_eq!(clocks.sys_ck(), Hertz(64_000_000));
        assert_eq!(clocks.c_ck(), Hertz(64_000_000));
        assert_eq!(clocks.hclk(), Hertz(64_000_000));
        assert_eq!(clocks.aclk(), Hertz(64_000_000));
        assert_eq!(clocks.pclk1(), Hertz(64_000_000));
        assert_eq!(clocks.pclk4(), Hertz(64_000_000));
        assert_eq!(clocks.ppre2(), 1);
        assert_eq!(clocks.timx_ker_ck(), Hertz(64_000_000));
        assert_eq!(clocks.hsi_ck(), Some(Hertz(64_000_000)));
        assert_eq!(clocks.hse_ck(), None);
        assert_eq!(clocks.pll1_p_ck(), None);
    }

    #[test]
    fn hsi_divider_scales_sys_ck() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.set_hsi_divider(HsiDivider::Div4);
        assert_eq!(rcc.sys_ck(), Ok(Hertz(16_000_000)));
    }

    #[test]
    fn sys_ck_from_each_source() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rb.cfgr.write(1 << 3);
        assert_eq!(rcc.sys_ck(), Ok(Hertz(4_000_000)));

        rb.cfgr.write(2 << 3);
        assert_eq!(rcc.sys_ck(), Err(Error::HseFrequencyUnknown));
        let rcc = rcc.use_hse(25.mhz());
        assert_eq!(rcc.sys_ck(), Ok(Hertz(25_000_000)));

        rb.cfgr.write(3 << 3);
        assert_eq!(rcc.sys_ck(), Err(Error::ClockNotRunning));
    }

    #[test]
    fn bus_clocks_from_pll1() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb).use_hse(25.mhz());

        // 25 MHz / 5 * 160 / 2 = 400 MHz
        rb.cr.write(cr::HSEON | cr::HSERDY | cr::PLL1ON | cr::PLL1RDY);
        rcc.set_pll_source(PllSource::Hse);
        rcc.set_pll_m(Pll::Pll1, 5).unwrap();
        rcc.set_pll_n(Pll::Pll1, 160).unwrap();
        rcc.set_pll_divider(Pll::Pll1, PllOutput::P, 2).unwrap();
        rcc.set_pll_divider(Pll::Pll1, PllOutput::Q, 8).unwrap();
        rcc.enable_pll_output(Pll::Pll1, PllOutput::P);
        rcc.enable_pll_output(Pll::Pll1, PllOutput::Q);
        rb.cfgr.write(3 | 3 << 3);

        rcc.set_sys_prescaler(AhbPrescaler::Div1);
        rcc.set_ahb_prescaler(AhbPrescaler::Div2);
        rcc.set_apb1_prescaler(ApbPrescaler::Div2);
        rcc.set_apb2_prescaler(ApbPrescaler::Div4);
        rcc.set_apb3_prescaler(ApbPrescaler::Div2);
        rcc.set_apb4_prescaler(ApbPrescaler::Div16);

        let clocks = rcc.core_clocks().unwrap();
        assert_eq!(clocks.sys_ck(), Hertz(400_000_000));
        assert_eq!(clocks.c_ck(), Hertz(400_000_000));
        assert_eq!(clocks.hclk(), Hertz(200_000_000));
        assert_eq!(clocks.pclk1(), Hertz(100_000_000));
        assert_eq!(clocks.pclk2(), Hertz(50_000_000));
        assert_eq!(clocks.pclk3(), Hertz(100_000_000));
        assert_eq!(clocks.pclk4(), Hertz(12_500_000));
        assert_eq!(clocks.ppre4(), 16);
        assert_eq!(clocks.pll1_p_ck(), Some(Hertz(400_000_000)));
        assert_eq!(clocks.pll1_q_ck(), Some(Hertz(100_000_000)));
        assert_eq!(clocks.pll1_r_ck(), None);
        assert_eq!(clocks.hse_ck(), Some(Hertz(25_000_000)));

        // TIMPRE = 0: hclk for ppre 1 or 2, else 2 x pclk
        assert_eq!(clocks.timx_ker_ck(), Hertz(200_000_000));
        assert_eq!(clocks.timy_ker_ck(), Hertz(100_000_000));

        // TIMPRE = 1: hclk for ppre up to 4, else 4 x pclk
        rcc.set_timer_prescaler(TimerPrescaler::FourTimes);
        assert_eq!(rcc.timy_ker_ck(), Ok(Hertz(200_000_000)));
        rcc.set_apb2_prescaler(ApbPrescaler::Div8);
        assert_eq!(rcc.timy_ker_ck(), Ok(Hertz(100_000_000)));

        // The individual getters agree with the snapshot
        assert_eq!(rcc.pclk1(), Ok(clocks.pclk1()));
        assert_eq!(rcc.pclk4(), Ok(clocks.pclk4()));
    }

    #[test]
    fn sys_prescaler_divides_cpu_and_bus_clocks() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.set_sys_prescaler(AhbPrescaler::Div2);
        rcc.set_ahb_prescaler(AhbPrescaler::Div4);
        assert_eq!(rcc.c_ck(), Ok(Hertz(32_000_000)));
        assert_eq!(rcc.hclk(), Ok(Hertz(8_000_000)));
    }

    #[test]
    fn unlocked_plls_are_not_reported() {
        let rb = zeroed();
        rb.cr.write(cr::HSION | cr::HSIRDY);
        let rcc = Rcc::new(&rb);

        rcc.set_pll_source(PllSource::Hsi);
        rcc.set_pll_m(Pll::Pll2, 32).unwrap();
        rcc.set_pll_n(Pll::Pll2, 100).unwrap();
        rcc.enable_pll_output(Pll::Pll2, PllOutput::R);

        assert_eq!(rcc.core_clocks().unwrap().pll2_r_ck(), None);
        rb.cr.set_bits(cr::PLL2RDY);
        // 64 MHz / 32 * 100 / 1
        assert_eq!(
            rcc.core_clocks().unwrap().pll2_r_ck(),
            Some(Hertz(200_000_000))
        );
    }
}
