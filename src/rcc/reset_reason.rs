//! Reason for the last reset, read from RCC_RSR

use core::fmt::Display;

use super::registers::rsr;
use super::Rcc;

const LPWRRSTF: u32 = 1 << 30;
const WWDG1RSTF: u32 = 1 << 28;
const IWDG1RSTF: u32 = 1 << 26;
const SFTRSTF: u32 = 1 << 24;
const PORRSTF: u32 = 1 << 23;
const PINRSTF: u32 = 1 << 22;
const BORRSTF: u32 = 1 << 21;
const D2RSTF: u32 = 1 << 20;
const D1RSTF: u32 = 1 << 19;
const CPURSTF: u32 = 1 << 17;

impl<'a> Rcc<'a> {
    /// Gets and clears the reason of why the mcu was reset
    pub fn reset_reason(&self) -> ResetReason {
        let rsr = self.rb.rsr.read();

        // Clear the flags
        self.rb.rsr.set_bits(rsr::RMVF);

        let reason = ResetReason::from_bits(rsr);
        log::debug!("Reset reason: {}", reason);
        reason
    }
}

/// Gives the reason why the mcu was reset
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResetReason {
    /// The mcu went from not having power to having power and resetting
    PowerOnReset,
    /// The reset pin was asserted
    PinReset,
    /// The brownout detector triggered
    BrownoutReset,
    /// The software did a soft reset through the SCB peripheral
    SystemReset,
    /// The software did a soft reset through the RCC periperal
    CpuReset,
    /// The window watchdog triggered
    WindowWatchdogReset,
    /// The independent watchdog triggered
    IndependentWatchdogReset,
    /// Either of the two watchdogs triggered (but we don't know which one)
    GenericWatchdogReset,
    /// D1 exited DStandby mode
    D1ExitsDStandbyMode,
    /// D2 exited DStandby mode
    D2ExitsDStandbyMode,
    /// A low-power state has been entered erroneously
    D1EntersDStandbyErroneouslyOrCpuEntersCStopErroneously,
    /// The reason could not be determined
    Unknown {
        /// The raw register value
        rcc_rsr: u32,
    },
}

impl ResetReason {
    /// Decode the flags of RCC_RSR
    ///
    /// See RM0433 Rev 7 Section 8.4.4 Reset source identification
    #[rustfmt::skip]
    pub fn from_bits(rcc_rsr: u32) -> Self {
        let f = |mask| rcc_rsr & mask != 0;

        match (
            f(LPWRRSTF),
            f(WWDG1RSTF),
            f(IWDG1RSTF),
            f(SFTRSTF),
            f(PORRSTF),
            f(PINRSTF),
            f(BORRSTF),
            f(D2RSTF),
            f(D1RSTF),
            f(CPURSTF),
        ) {
            (false, false, false, false, true, true, true, true, true, true) => {
                ResetReason::PowerOnReset
            }
            (false, false, false, false, false, true, false, false, false, true) => {
                ResetReason::PinReset
            }
            (false, false, false, false, false, true, true, false, false, true) => {
                ResetReason::BrownoutReset
            }
            (false, false, false, true, false, true, false, false, false, true) => {
                ResetReason::SystemReset
            }
            (false, false, false, false, false, false, false, false, false, true) => {
                ResetReason::CpuReset
            }
            (false, true, false, false, false, false, false, false, false, false) | (false, true, false, false, false, true, false, false, false, true) => {
                ResetReason::WindowWatchdogReset
            }
            (false, false, true, false, false, true, false, false, false, true) => {
                ResetReason::IndependentWatchdogReset
            }
            (false, true, true, false, false, true, false, false, false, true) => {
                ResetReason::GenericWatchdogReset
            }
            (false, false, false, false, false, false, false, false, true, false) => {
                ResetReason::D1ExitsDStandbyMode
            }
            (false, false, false, false, false, false, false, true, false, false) => {
                ResetReason::D2ExitsDStandbyMode
            }
            (true, false, false, false, false, true, false, false, false, true) => {
                ResetReason::D1EntersDStandbyErroneouslyOrCpuEntersCStopErroneously
            }
            _ => ResetReason::Unknown { rcc_rsr },
        }
    }
}

impl Display for ResetReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ResetReason::PowerOnReset => write!(f, "Power-on reset (pwr_por_rst)"),
            ResetReason::PinReset => write!(f, "Pin reset (NRST)"),
            ResetReason::BrownoutReset => write!(f, "Brownout reset (pwr_bor_rst)"),
            ResetReason::SystemReset => write!(f, "System reset generated by CPU (SFTRESET)"),
            ResetReason::CpuReset => write!(f, "CPU reset (CPURST)"),
            ResetReason::WindowWatchdogReset => write!(f, "WWDG1 reset (wwdg1_out_rst)"),
            ResetReason::IndependentWatchdogReset => write!(f, "IWDG1 reset (iwdg1_out_rst)"),
            ResetReason::GenericWatchdogReset => write!(f, "IWDG1 or WWDG1 reset"),
            ResetReason::D1ExitsDStandbyMode => write!(f, "D1 exits DStandby mode"),
            ResetReason::D2ExitsDStandbyMode => write!(f, "D2 exits DStandby mode"),
            ResetReason::D1EntersDStandbyErroneouslyOrCpuEntersCStopErroneously => write!(
                f,
                "D1 erroneously enters DStandby mode or CPU erroneously enters CStop mode"
            ),
            ResetReason::Unknown { rcc_rsr } => write!(
                f,
                "Could not determine the cause. RCC RSR bits were 0x{:X}",
                rcc_rsr
            ),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ResetReason {
    fn format(&self, f: defmt::Formatter<'_>) {
        match self {
            ResetReason::Unknown { rcc_rsr } => defmt::write!(
                f,
                "Could not determine the cause. RCC RSR bits were 0x{:X}",
                rcc_rsr
            ),
            other => defmt::write!(f, "{}", defmt::Display2Format(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::tests::zeroed;

    #[test]
    fn decode() {
        assert_eq!(ResetReason::from_bits(0x00FA_0000), ResetReason::PowerOnReset);
        assert_eq!(
            ResetReason::from_bits(PINRSTF | CPURSTF),
            ResetReason::PinReset
        );
        assert_eq!(
            ResetReason::from_bits(WWDG1RSTF),
            ResetReason::WindowWatchdogReset
        );
        assert_eq!(
            ResetReason::from_bits(WWDG1RSTF | IWDG1RSTF | PINRSTF | CPURSTF),
            ResetReason::GenericWatchdogReset
        );
        assert_eq!(
            ResetReason::from_bits(SFTRSTF),
            ResetReason::Unknown { rcc_rsr: SFTRSTF }
        );
    }

    #[test]
    fn read_and_clear() {
        let rb = zeroed();
        rb.rsr.write(SFTRSTF | PINRSTF | CPURSTF);
        let rcc = Rcc::new(&rb);

        assert_eq!(rcc.reset_reason(), ResetReason::SystemReset);
        assert!(rb.rsr.is_set(rsr::RMVF));
    }
}
