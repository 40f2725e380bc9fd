//! RCC register block and bit definitions
//!
//! See RM0433 Rev 7 Section 8.7 "RCC register description"

use crate::register::Reg;

/// RCC register block
#[repr(C)]
pub struct RegisterBlock {
    /// Source control register
    pub cr: Reg,
    /// Internal clock sources calibration register
    pub hsicfgr: Reg,
    /// Clock recovery RC register
    pub crrcr: Reg,
    /// CSI calibration register
    pub csicfgr: Reg,
    /// Clock configuration register
    pub cfgr: Reg,
    _reserved0: [u8; 4],
    /// Domain 1 clock configuration register
    pub d1cfgr: Reg,
    /// Domain 2 clock configuration register
    pub d2cfgr: Reg,
    /// Domain 3 clock configuration register
    pub d3cfgr: Reg,
    _reserved1: [u8; 4],
    /// PLLs clock source selection register
    pub pllckselr: Reg,
    /// PLLs configuration register
    pub pllcfgr: Reg,
    /// PLL1 dividers configuration register
    pub pll1divr: Reg,
    /// PLL1 fractional divider register
    pub pll1fracr: Reg,
    /// PLL2 dividers configuration register
    pub pll2divr: Reg,
    /// PLL2 fractional divider register
    pub pll2fracr: Reg,
    /// PLL3 dividers configuration register
    pub pll3divr: Reg,
    /// PLL3 fractional divider register
    pub pll3fracr: Reg,
    _reserved2: [u8; 4],
    /// Domain 1 kernel clock configuration register
    pub d1ccipr: Reg,
    /// Domain 2 kernel clock configuration register 1
    pub d2ccip1r: Reg,
    /// Domain 2 kernel clock configuration register 2
    pub d2ccip2r: Reg,
    /// Domain 3 kernel clock configuration register
    pub d3ccipr: Reg,
    _reserved3: [u8; 4],
    /// Clock source interrupt enable register
    pub cier: Reg,
    /// Clock source interrupt flag register
    pub cifr: Reg,
    /// Clock source interrupt clear register
    pub cicr: Reg,
    _reserved4: [u8; 4],
    /// Backup domain control register
    pub bdcr: Reg,
    /// Clock control and status register
    pub csr: Reg,
    _reserved5: [u8; 4],
    /// AHB3 reset register
    pub ahb3rstr: Reg,
    /// AHB1 peripheral reset register
    pub ahb1rstr: Reg,
    /// AHB2 peripheral reset register
    pub ahb2rstr: Reg,
    /// AHB4 peripheral reset register
    pub ahb4rstr: Reg,
    /// APB3 peripheral reset register
    pub apb3rstr: Reg,
    /// APB1 peripheral reset register (low word)
    pub apb1lrstr: Reg,
    /// APB1 peripheral reset register (high word)
    pub apb1hrstr: Reg,
    /// APB2 peripheral reset register
    pub apb2rstr: Reg,
    /// APB4 peripheral reset register
    pub apb4rstr: Reg,
    /// Global control register
    pub gcr: Reg,
    _reserved6: [u8; 4],
    /// D3 autonomous mode register
    pub d3amr: Reg,
    _reserved7: [u8; 36],
    /// Reset status register
    pub rsr: Reg,
    /// AHB3 clock register
    pub ahb3enr: Reg,
    /// AHB1 clock register
    pub ahb1enr: Reg,
    /// AHB2 clock register
    pub ahb2enr: Reg,
    /// AHB4 clock register
    pub ahb4enr: Reg,
    /// APB3 clock register
    pub apb3enr: Reg,
    /// APB1 clock register (low word)
    pub apb1lenr: Reg,
    /// APB1 clock register (high word)
    pub apb1henr: Reg,
    /// APB2 clock register
    pub apb2enr: Reg,
    /// APB4 clock register
    pub apb4enr: Reg,
    _reserved8: [u8; 4],
    /// AHB3 sleep clock register
    pub ahb3lpenr: Reg,
    /// AHB1 sleep clock register
    pub ahb1lpenr: Reg,
    /// AHB2 sleep clock register
    pub ahb2lpenr: Reg,
    /// AHB4 sleep clock register
    pub ahb4lpenr: Reg,
    /// APB3 sleep clock register
    pub apb3lpenr: Reg,
    /// APB1 sleep clock register (low word)
    pub apb1llpenr: Reg,
    /// APB1 sleep clock register (high word)
    pub apb1hlpenr: Reg,
    /// APB2 sleep clock register
    pub apb2lpenr: Reg,
    /// APB4 sleep clock register
    pub apb4lpenr: Reg,
}

impl RegisterBlock {
    /// Address of the RCC register block
    pub const PTR: *const RegisterBlock = 0x5802_4400 as *const _;

    /// Returns the RCC register block at its fixed address
    ///
    /// # Safety
    ///
    /// Every handle created from the returned reference accesses the same
    /// registers. The caller ensures that accesses do not conflict.
    pub unsafe fn steal() -> &'static RegisterBlock {
        &*Self::PTR
    }
}

pub(crate) mod cr {
    pub const HSION: u32 = 1 << 0;
    pub const HSIKERON: u32 = 1 << 1;
    pub const HSIRDY: u32 = 1 << 2;
    pub const HSIDIV_POS: u8 = 3;
    pub const HSIDIV: u32 = 0b11 << HSIDIV_POS;
    pub const HSIDIVF: u32 = 1 << 5;
    pub const CSION: u32 = 1 << 7;
    pub const CSIRDY: u32 = 1 << 8;
    pub const CSIKERON: u32 = 1 << 9;
    pub const HSI48ON: u32 = 1 << 12;
    pub const HSI48RDY: u32 = 1 << 13;
    pub const D1CKRDY: u32 = 1 << 14;
    pub const D2CKRDY: u32 = 1 << 15;
    pub const HSEON: u32 = 1 << 16;
    pub const HSERDY: u32 = 1 << 17;
    pub const HSEBYP: u32 = 1 << 18;
    pub const HSECSSON: u32 = 1 << 19;
    pub const PLL1ON: u32 = 1 << 24;
    pub const PLL1RDY: u32 = 1 << 25;
    pub const PLL2ON: u32 = 1 << 26;
    pub const PLL2RDY: u32 = 1 << 27;
    pub const PLL3ON: u32 = 1 << 28;
    pub const PLL3RDY: u32 = 1 << 29;
}

pub(crate) mod cfgr {
    pub const SW_POS: u8 = 0;
    pub const SWS_POS: u8 = 3;
    pub const TIMPRE: u32 = 1 << 15;
}

pub(crate) mod d1cfgr {
    pub const HPRE_POS: u8 = 0;
    pub const D1PPRE_POS: u8 = 4;
    pub const D1CPRE_POS: u8 = 8;
}

pub(crate) mod d2cfgr {
    pub const D2PPRE1_POS: u8 = 4;
    pub const D2PPRE2_POS: u8 = 8;
}

pub(crate) mod d3cfgr {
    pub const D3PPRE_POS: u8 = 4;
}

pub(crate) mod pllckselr {
    pub const PLLSRC_POS: u8 = 0;
    /// DIVM1 at 4, DIVM2 at 12, DIVM3 at 20
    pub const DIVM_POS: [u8; 3] = [4, 12, 20];
    pub const RESET: u32 = 0x0202_0200;
}

pub(crate) mod pllcfgr {
    pub const RESET: u32 = 0x01FF_0000;
    pub const DIVEN_POS: u8 = 16;
}

pub(crate) mod plldivr {
    pub const DIVN_POS: u8 = 0;
    pub const DIVP_POS: u8 = 9;
    pub const DIVQ_POS: u8 = 16;
    pub const DIVR_POS: u8 = 24;
    pub const RESET: u32 = 0x0101_0280;
}

pub(crate) mod pllfracr {
    pub const FRACN_POS: u8 = 3;
}

pub(crate) mod bdcr {
    pub const LSEON: u32 = 1 << 0;
    pub const LSERDY: u32 = 1 << 1;
    pub const LSEBYP: u32 = 1 << 2;
}

pub(crate) mod csr {
    pub const LSION: u32 = 1 << 0;
    pub const LSIRDY: u32 = 1 << 1;
}

pub(crate) mod rsr {
    pub const RMVF: u32 = 1 << 16;
}

#[cfg(test)]
mod tests {
    use super::RegisterBlock;

    macro_rules! offset {
        ($rb:ident, $reg:ident) => {
            &$rb.$reg as *const _ as usize - &$rb as *const _ as usize
        };
    }

    #[test]
    fn register_offsets() {
        let rb: RegisterBlock = unsafe { core::mem::zeroed() };

        assert_eq!(offset!(rb, cfgr), 0x010);
        assert_eq!(offset!(rb, d1cfgr), 0x018);
        assert_eq!(offset!(rb, pllckselr), 0x028);
        assert_eq!(offset!(rb, pll3fracr), 0x044);
        assert_eq!(offset!(rb, d1ccipr), 0x04C);
        assert_eq!(offset!(rb, d3ccipr), 0x058);
        assert_eq!(offset!(rb, cier), 0x060);
        assert_eq!(offset!(rb, bdcr), 0x070);
        assert_eq!(offset!(rb, ahb3rstr), 0x07C);
        assert_eq!(offset!(rb, apb4rstr), 0x09C);
        assert_eq!(offset!(rb, d3amr), 0x0A8);
        assert_eq!(offset!(rb, rsr), 0x0D0);
        assert_eq!(offset!(rb, ahb3enr), 0x0D4);
        assert_eq!(offset!(rb, apb4enr), 0x0F4);
        assert_eq!(offset!(rb, ahb3lpenr), 0x0FC);
        assert_eq!(offset!(rb, apb4lpenr), 0x11C);
        assert_eq!(core::mem::size_of::<RegisterBlock>(), 0x120);
    }
}
