//! Phase Locked Loop Configuration

use cast::f32;

use super::registers::{cr, pllcfgr, pllckselr, plldivr, pllfracr};
use super::{Rcc, CSI, HSI};
use crate::register::Reg;
use crate::time::Hertz;
use crate::Error;

const FRACN_DIVISOR: f32 = 8192.0; // 2 ** 13
const FRACN_MAX: f32 = FRACN_DIVISOR - 1.0;

/// One of the three PLLs
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pll {
    /// PLL1. Its P output can be used as system clock
    Pll1,
    /// PLL2
    Pll2,
    /// PLL3
    Pll3,
}

impl Pll {
    fn index(self) -> u8 {
        match self {
            Pll::Pll1 => 0,
            Pll::Pll2 => 1,
            Pll::Pll3 => 2,
        }
    }

    fn on(self) -> u32 {
        match self {
            Pll::Pll1 => cr::PLL1ON,
            Pll::Pll2 => cr::PLL2ON,
            Pll::Pll3 => cr::PLL3ON,
        }
    }

    fn rdy(self) -> u32 {
        match self {
            Pll::Pll1 => cr::PLL1RDY,
            Pll::Pll2 => cr::PLL2RDY,
            Pll::Pll3 => cr::PLL3RDY,
        }
    }
}

/// Clock source of the three PLLs
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    /// HSI, after the HSI divider
    Hsi = 0,
    /// CSI
    Csi = 1,
    /// HSE
    Hse = 2,
    /// No clock sent to the PLLs
    None = 3,
}

/// PLL output
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllOutput {
    /// P output
    P,
    /// Q output
    Q,
    /// R output
    R,
}

impl PllOutput {
    fn divider_pos(self) -> u8 {
        match self {
            PllOutput::P => plldivr::DIVP_POS,
            PllOutput::Q => plldivr::DIVQ_POS,
            PllOutput::R => plldivr::DIVR_POS,
        }
    }

    fn offset(self) -> u8 {
        match self {
            PllOutput::P => 0,
            PllOutput::Q => 1,
            PllOutput::R => 2,
        }
    }
}

/// PLL VCO selection
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VcoRange {
    /// Wide VCO range, 192 to 836 MHz (960 MHz on revision V)
    Wide = 0,
    /// Medium VCO range, 150 to 420 MHz
    Medium = 1,
}

/// Frequency range of the reference clock at the PLL input
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputRange {
    /// 1 to 2 MHz
    Range1 = 0,
    /// 2 to 4 MHz
    Range2 = 1,
    /// 4 to 8 MHz
    Range4 = 2,
    /// 8 to 16 MHz
    Range8 = 3,
}

/// Output frequencies of a PLL. `None` if an output is disabled or the
/// PLL has no input clock
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllClocks {
    /// P output
    pub p_ck: Option<Hertz>,
    /// Q output
    pub q_ck: Option<Hertz>,
    /// R output
    pub r_ck: Option<Hertz>,
}

impl PllClocks {
    /// Frequency of `output`
    pub fn output(&self, output: PllOutput) -> Option<Hertz> {
        match output {
            PllOutput::P => self.p_ck,
            PllOutput::Q => self.q_ck,
            PllOutput::R => self.r_ck,
        }
    }
}

/// Strategies for configuring a Phase Locked Loop (PLL)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllConfigStrategy {
    /// VCOL, highest PFD frequency, highest VCO frequency
    Normal,
    /// VCOH, choose PFD frequency for accuracy, highest VCO frequency
    Iterative,
    /// VCOH, choose PFD frequency for accuracy, highest VCO frequency
    /// Uses fractional mode to precisely set the P clock
    Fractional,
    /// VCOH, choose PFD frequency for accuracy, highest VCO frequency
    /// Uses fractional mode to precisely set the P clock not less than target frequency
    FractionalNotLess,
}

/// Requested output frequencies of a Phase Locked Loop (PLL)
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    strategy: PllConfigStrategy,
    p_ck: Option<u32>,
    q_ck: Option<u32>,
    r_ck: Option<u32>,
}
impl Default for PllConfig {
    fn default() -> PllConfig {
        PllConfig {
            strategy: PllConfigStrategy::Normal,
            p_ck: None,
            q_ck: None,
            r_ck: None,
        }
    }
}

impl PllConfig {
    /// Set the strategy used to choose the dividers
    #[must_use]
    pub fn strategy(mut self, strategy: PllConfigStrategy) -> Self {
        self.strategy = strategy;
        self
    }
    /// Request a P output frequency
    #[must_use]
    pub fn p_ck<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.p_ck = Some(freq.into().0);
        self
    }
    /// Request a Q output frequency. Requires a P output
    #[must_use]
    pub fn q_ck<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.q_ck = Some(freq.into().0);
        self
    }
    /// Request a R output frequency. Requires a P output
    #[must_use]
    pub fn r_ck<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.r_ck = Some(freq.into().0);
        self
    }

    /// Calculate the dividers for `pll` fed by a `pllsrc` clock (Hz)
    ///
    /// Returns `None` if no output is requested. Output clocks are never
    /// faster than requested, except with `FractionalNotLess` where they
    /// are never slower.
    pub fn dividers(
        &self,
        pll: Pll,
        pllsrc: u32,
    ) -> Result<Option<PllDividers>, Error> {
        let output = match self.p_ck {
            Some(output) => output,
            None if self.q_ck.is_some() || self.r_ck.is_some() => {
                return Err(Error::PllOutputWithoutP)
            }
            None => return Ok(None),
        };
        if pllsrc == 0 {
            return Err(Error::PllInputFrequency);
        }
        let pll1_p = pll == Pll::Pll1;

        // Set VCO parameters based on VCO strategy
        let vco = match self.strategy {
            PllConfigStrategy::Normal => vco_setup_normal(pllsrc, output, pll1_p)?,
            // Iterative, Fractional, FractionalNotLess
            _ => vco_setup_iterative(pllsrc, output, pll1_p)?,
        };

        // Feedback divider. Integer only
        let n = vco.vco_ck_target / vco.ref_ck;
        if !(4..=512).contains(&n) {
            return Err(Error::PllDivider);
        }

        // Configure N divider. Returns the resulting VCO frequency
        let (fracn, vco_ck) = match self.strategy {
            PllConfigStrategy::Fractional => {
                let fracn = calc_fracn(vco.ref_ck as f32, n as f32, vco.p as f32, output as f32)?;
                (Some(fracn), calc_vco_ck(vco.ref_ck, n, fracn))
            }
            PllConfigStrategy::FractionalNotLess => {
                // Round up instead of down
                let fracn = calc_fracn(vco.ref_ck as f32, n as f32, vco.p as f32, output as f32)? + 1;
                if fracn as f32 > FRACN_MAX {
                    return Err(Error::PllFracn);
                }
                (Some(fracn), calc_vco_ck(vco.ref_ck, n, fracn))
            }
            // Normal, Iterative
            _ => (None, vco.ref_ck * n),
        };

        // Calulate additional output dividers
        let divider = |target: Option<u32>| -> Result<Option<u8>, Error> {
            target
                .map(|ck| calc_ck_div(self.strategy, vco_ck, ck))
                .transpose()
        };

        Ok(Some(PllDividers {
            m: vco.m as u8,
            n: n as u16,
            p: vco.p as u8,
            q: divider(self.q_ck)?,
            r: divider(self.r_ck)?,
            fracn,
            vco_range: vco.vco_range,
            input_range: vco.input_range,
            vco_ck: Hertz(vco_ck),
        }))
    }
}

/// Divider values of a PLL
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllDividers {
    /// Input divider (DIVM)
    pub m: u8,
    /// Integer part of the multiplication factor
    pub n: u16,
    /// Fractional part of the multiplication factor, if used
    pub fracn: Option<u16>,
    /// P output divider
    pub p: u8,
    /// Q output divider, if enabled
    pub q: Option<u8>,
    /// R output divider, if enabled
    pub r: Option<u8>,
    /// VCO selection
    pub vco_range: VcoRange,
    /// Reference clock range
    pub input_range: InputRange,
    /// Resulting VCO frequency
    pub vco_ck: Hertz,
}

impl PllDividers {
    /// Resulting output clocks
    pub fn clocks(&self) -> PllClocks {
        let vco_ck = self.vco_ck;
        PllClocks {
            p_ck: Some(vco_ck.div(self.p as u32)),
            q_ck: self.q.map(|q| vco_ck.div(q as u32)),
            r_ck: self.r.map(|r| vco_ck.div(r as u32)),
        }
    }
}

/// Result of the VCO setup
#[derive(Debug)]
struct VcoSetup {
    ref_ck: u32,
    m: u32,
    p: u32,
    vco_ck_target: u32,
    vco_range: VcoRange,
    input_range: InputRange,
}

/// Calculate VCO output divider (p-divider). Choose the highest VCO
/// frequency to give specified output.
///
/// Returns *target* VCO frequency
fn vco_output_divider_setup(
    output: u32,
    vco_min: u32,
    vco_max: u32,
    pll1_p: bool,
) -> Result<(u32, u32), Error> {
    if output == 0 {
        return Err(Error::PllVcoFrequency);
    }
    let pll_x_p = if output > vco_max / 2 {
        1
    } else if pll1_p {
        ((vco_max / output) | 1) - 1 // Must be even or unity
    } else {
        vco_max / output
    };

    // Calcuate VCO output
    let vco_ck = output * pll_x_p;

    if pll_x_p > 128 || vco_ck < vco_min || vco_ck > vco_max {
        return Err(Error::PllVcoFrequency);
    }
    Ok((vco_ck, pll_x_p))
}

/// Normal: VCOL, highest PFD frequency, highest VCO frequency
fn vco_setup_normal(
    pllsrc: u32,
    output: u32,
    pll1_p: bool,
) -> Result<VcoSetup, Error> {
    // VCO output frequency. Choose the highest VCO frequency
    let (vco_min, vco_max) = (150_000_000, 420_000_000);
    let (vco_ck_target, pll_x_p) =
        vco_output_divider_setup(output, vco_min, vco_max, pll1_p)?;

    // Input divisor, resulting in a reference clock in the range
    // 1 to 2 MHz. Choose the highest reference clock (lowest m)
    let pll_x_m = div_ceil(pllsrc, 2_000_000);
    if pll_x_m >= 64 {
        return Err(Error::PllInputFrequency);
    }

    // Calculate resulting reference clock
    let ref_x_ck = pllsrc / pll_x_m;
    if !(1_000_000..=2_000_000).contains(&ref_x_ck) {
        return Err(Error::PllInputFrequency);
    }

    Ok(VcoSetup {
        ref_ck: ref_x_ck,
        m: pll_x_m,
        p: pll_x_p,
        vco_ck_target,
        vco_range: VcoRange::Medium, // 150 - 420MHz Medium VCO
        input_range: InputRange::Range1, // ref_x_ck is 1 - 2 MHz
    })
}

/// Iterative: VCOH, choose PFD frequency for accuracy, highest VCO
/// frequency
fn vco_setup_iterative(
    pllsrc: u32,
    output: u32,
    pll1_p: bool,
) -> Result<VcoSetup, Error> {
    // VCO output frequency limits
    #[cfg(not(feature = "revision_v"))]
    let (vco_min, vco_max) = (192_000_000, 836_000_000);
    #[cfg(feature = "revision_v")]
    let (vco_min, vco_max) = (192_000_000, 960_000_000);

    // VCO output frequency. Choose the highest VCO frequency
    let (vco_ck_target, pll_x_p) =
        vco_output_divider_setup(output, vco_min, vco_max, pll1_p)?;

    // Input divisor, resulting in a reference clock in the
    // range 2 to 16 MHz.
    let pll_x_m_min = div_ceil(pllsrc, 16_000_000);
    let pll_x_m_max = match pllsrc {
        0..=127_999_999 => pllsrc / 2_000_000,
        _ => 63, // pllm < 64
    };

    // Iterative search for the lowest m value that minimizes
    // the difference between requested and actual VCO frequency
    let pll_x_m = (pll_x_m_min..=pll_x_m_max)
        .min_by_key(|pll_x_m| {
            let ref_x_ck = pllsrc / pll_x_m;

            // Feedback divider. Integer only
            let pll_x_n = vco_ck_target / ref_x_ck;

            vco_ck_target as i32 - (ref_x_ck * pll_x_n) as i32
        })
        .ok_or(Error::PllInputFrequency)?;

    // Calculate resulting reference clock
    let ref_x_ck = pllsrc / pll_x_m;
    if !(2_000_000..=16_000_000).contains(&ref_x_ck) {
        return Err(Error::PllInputFrequency);
    }

    let input_range = match ref_x_ck {
        2_000_000..=3_999_999 => InputRange::Range2, // ref_x_ck is 2 - 4 MHz
        4_000_000..=7_999_999 => InputRange::Range4, // ref_x_ck is 4 - 8 MHz
        _ => InputRange::Range8,                     // ref_x_ck is 8 - 16 MHz
    };

    Ok(VcoSetup {
        ref_ck: ref_x_ck,
        m: pll_x_m,
        p: pll_x_p,
        vco_ck_target,
        vco_range: VcoRange::Wide,
        input_range,
    })
}

/// Calcuate the Fractional-N part of the divider
///
/// ref_clk - Frequency at the PFD input
/// pll_n - Integer-N part of the divider
/// pll_p - P-divider
/// output - Wanted output frequency
fn calc_fracn(
    ref_clk: f32,
    pll_n: f32,
    pll_p: f32,
    output: f32,
) -> Result<u16, Error> {
    // VCO output frequency = Fref1_ck x (DIVN1 + (FRACN1 / 2^13)),
    let pll_fracn = FRACN_DIVISOR * (((output * pll_p) / ref_clk) - pll_n);
    if !(0.0..=FRACN_MAX).contains(&pll_fracn) {
        return Err(Error::PllFracn);
    }
    // Rounding down by casting gives up the lowest without going over
    Ok(pll_fracn as u16)
}

/// Calculates the {Q,R}-divider. Must NOT be used for the P-divider, as this
/// has additional restrictions on PLL1.
///
/// vco_ck - VCO output frequency
/// target_ck - Target {Q,R} output frequency
fn calc_ck_div(
    strategy: PllConfigStrategy,
    vco_ck: u32,
    target_ck: u32,
) -> Result<u8, Error> {
    // The output cannot be faster than the VCO
    if target_ck == 0 || target_ck > vco_ck {
        return Err(Error::PllDivider);
    }
    let mut div = div_ceil(vco_ck, target_ck);
    // If the divider takes us under the target clock, then increase it
    if strategy == PllConfigStrategy::FractionalNotLess
        && u64::from(target_ck) * u64::from(div) > u64::from(vco_ck)
    {
        div -= 1;
    }
    match div {
        1..=128 => Ok(div as u8),
        _ => Err(Error::PllDivider),
    }
}

/// `a / b` rounded up, without overflow
fn div_ceil(a: u32, b: u32) -> u32 {
    a / b + u32::from(a % b != 0)
}

/// Calculates the VCO output frequency
///
/// ref_clk - Frequency at the PFD input
/// pll_n - Integer-N part of the divider
/// pll_fracn - Fractional-N part of the divider
fn calc_vco_ck(ref_ck: u32, pll_n: u32, pll_fracn: u16) -> u32 {
    (f32(ref_ck) * (f32(pll_n) + (f32(pll_fracn) / FRACN_DIVISOR))) as u32
}

/// Frequency of a PLL output
///
/// `input / m * (n + fracn / 8192) / pqr`, computed in single precision
/// floating point. Returns 0 if `m` or `pqr` is 0.
///
/// input - PLL source frequency
/// m - Input divider
/// n - Integer part of the multiplication factor
/// fracn - Fractional part of the multiplication factor
/// pqr - Output divider
pub fn calc_pll_clock_freq(input: u32, m: u32, n: u32, fracn: u32, pqr: u32) -> u32 {
    if m == 0 || pqr == 0 {
        return 0;
    }
    let freq = f32(input) / f32(m);
    let freq = freq * (f32(n) + f32(fracn) / FRACN_DIVISOR);
    (freq / f32(pqr)) as u32
}

impl<'a> Rcc<'a> {
    pub(super) fn pll_registers(&self, pll: Pll) -> (&Reg, &Reg) {
        match pll {
            Pll::Pll1 => (&self.rb.pll1divr, &self.rb.pll1fracr),
            Pll::Pll2 => (&self.rb.pll2divr, &self.rb.pll2fracr),
            Pll::Pll3 => (&self.rb.pll3divr, &self.rb.pll3fracr),
        }
    }

    /// Select the clock source of all the PLLs
    pub fn set_pll_source(&self, source: PllSource) {
        self.rb
            .pllckselr
            .write_field(pllckselr::PLLSRC_POS, 2, source as u32);
    }

    /// Clock source of the PLLs
    pub fn pll_source(&self) -> PllSource {
        match self.rb.pllckselr.read_field(pllckselr::PLLSRC_POS, 2) {
            0 => PllSource::Hsi,
            1 => PllSource::Csi,
            2 => PllSource::Hse,
            _ => PllSource::None,
        }
    }

    /// Enable `pll`
    pub fn enable_pll(&self, pll: Pll) {
        self.rb.cr.set_bits(pll.on());
    }

    /// Disable `pll`
    pub fn disable_pll(&self, pll: Pll) {
        self.rb.cr.clear_bits(pll.on());
    }

    /// True if `pll` is locked
    pub fn is_pll_ready(&self, pll: Pll) -> bool {
        self.rb.cr.is_set(pll.rdy())
    }

    /// Set the input divider of `pll`. 0 disables the prescaler, and the
    /// PLL
    pub fn set_pll_m(&self, pll: Pll, m: u8) -> Result<(), Error> {
        if m > 63 {
            return Err(Error::PllDivider);
        }
        self.rb.pllckselr.write_field(
            pllckselr::DIVM_POS[pll.index() as usize],
            6,
            m as u32,
        );
        Ok(())
    }

    /// Input divider of `pll`
    pub fn pll_m(&self, pll: Pll) -> u8 {
        self.rb
            .pllckselr
            .read_field(pllckselr::DIVM_POS[pll.index() as usize], 6) as u8
    }

    /// Set the integer part of the multiplication factor of `pll`, 4 to
    /// 512
    pub fn set_pll_n(&self, pll: Pll, n: u16) -> Result<(), Error> {
        if !(4..=512).contains(&n) {
            return Err(Error::PllDivider);
        }
        let (divr, _) = self.pll_registers(pll);
        divr.write_field(plldivr::DIVN_POS, 9, (n - 1) as u32);
        Ok(())
    }

    /// Integer part of the multiplication factor of `pll`
    pub fn pll_n(&self, pll: Pll) -> u16 {
        let (divr, _) = self.pll_registers(pll);
        divr.read_field(plldivr::DIVN_POS, 9) as u16 + 1
    }

    /// Set the divider of one output of `pll`, 1 to 128. The P divider of
    /// PLL1 must be 1 or even
    pub fn set_pll_divider(
        &self,
        pll: Pll,
        output: PllOutput,
        div: u8,
    ) -> Result<(), Error> {
        if !(1..=128).contains(&div) {
            return Err(Error::PllDivider);
        }
        if pll == Pll::Pll1 && output == PllOutput::P && div != 1 && div % 2 != 0 {
            return Err(Error::PllDivider);
        }
        let (divr, _) = self.pll_registers(pll);
        divr.write_field(output.divider_pos(), 7, (div - 1) as u32);
        Ok(())
    }

    /// Divider of one output of `pll`
    pub fn pll_divider(&self, pll: Pll, output: PllOutput) -> u8 {
        let (divr, _) = self.pll_registers(pll);
        divr.read_field(output.divider_pos(), 7) as u8 + 1
    }

    /// Set the fractional part of the multiplication factor of `pll`. It is
    /// only used when enabled with `enable_pll_fracn`
    pub fn set_pll_fracn(&self, pll: Pll, fracn: u16) -> Result<(), Error> {
        if fracn as f32 > FRACN_MAX {
            return Err(Error::PllFracn);
        }
        let (_, fracr) = self.pll_registers(pll);
        fracr.write_field(pllfracr::FRACN_POS, 13, fracn as u32);
        Ok(())
    }

    /// Fractional part of the multiplication factor of `pll`
    pub fn pll_fracn(&self, pll: Pll) -> u16 {
        let (_, fracr) = self.pll_registers(pll);
        fracr.read_field(pllfracr::FRACN_POS, 13) as u16
    }

    /// Use the fractional part of the multiplication factor of `pll`
    pub fn enable_pll_fracn(&self, pll: Pll) {
        self.rb.pllcfgr.set_bits(1 << (4 * pll.index()));
    }

    /// Ignore the fractional part of the multiplication factor of `pll`
    pub fn disable_pll_fracn(&self, pll: Pll) {
        self.rb.pllcfgr.clear_bits(1 << (4 * pll.index()));
    }

    /// True if the fractional part of the multiplication factor of `pll`
    /// is used
    pub fn is_pll_fracn_enabled(&self, pll: Pll) -> bool {
        self.rb.pllcfgr.is_set(1 << (4 * pll.index()))
    }

    /// Select the VCO of `pll`
    pub fn set_pll_vco_range(&self, pll: Pll, range: VcoRange) {
        self.rb
            .pllcfgr
            .write_field(4 * pll.index() + 1, 1, range as u32);
    }

    /// VCO of `pll`
    pub fn pll_vco_range(&self, pll: Pll) -> VcoRange {
        match self.rb.pllcfgr.read_field(4 * pll.index() + 1, 1) {
            0 => VcoRange::Wide,
            _ => VcoRange::Medium,
        }
    }

    /// Set the frequency range of the reference clock of `pll`
    pub fn set_pll_input_range(&self, pll: Pll, range: InputRange) {
        self.rb
            .pllcfgr
            .write_field(4 * pll.index() + 2, 2, range as u32);
    }

    /// Frequency range of the reference clock of `pll`
    pub fn pll_input_range(&self, pll: Pll) -> InputRange {
        match self.rb.pllcfgr.read_field(4 * pll.index() + 2, 2) {
            0 => InputRange::Range1,
            1 => InputRange::Range2,
            2 => InputRange::Range4,
            _ => InputRange::Range8,
        }
    }

    fn pll_output_enable_bit(pll: Pll, output: PllOutput) -> u32 {
        1 << (pllcfgr::DIVEN_POS + 3 * pll.index() + output.offset())
    }

    /// Enable one output of `pll`
    pub fn enable_pll_output(&self, pll: Pll, output: PllOutput) {
        self.rb
            .pllcfgr
            .set_bits(Self::pll_output_enable_bit(pll, output));
    }

    /// Disable one output of `pll`
    pub fn disable_pll_output(&self, pll: Pll, output: PllOutput) {
        self.rb
            .pllcfgr
            .clear_bits(Self::pll_output_enable_bit(pll, output));
    }

    /// True if one output of `pll` is enabled
    pub fn is_pll_output_enabled(&self, pll: Pll, output: PllOutput) -> bool {
        self.rb
            .pllcfgr
            .is_set(Self::pll_output_enable_bit(pll, output))
    }

    /// Frequency of the selected PLL source clock, if that clock is ready
    pub fn pll_input_frequency(&self) -> Option<Hertz> {
        match self.pll_source() {
            PllSource::Hsi if self.is_hsi_ready() => {
                Some(Hertz(HSI).shr(self.hsi_divider() as u32))
            }
            PllSource::Csi if self.is_csi_ready() => Some(Hertz(CSI)),
            PllSource::Hse if self.is_hse_ready() => self.hse_frequency().ok(),
            _ => None,
        }
    }

    /// Output frequencies of `pll`, computed from its register state
    ///
    /// An output is `None` when it is disabled, when the PLL source is not
    /// ready or when the input divider is 0. The PLL itself is not
    /// required to be locked.
    pub fn pll_clocks(&self, pll: Pll) -> PllClocks {
        let input = match self.pll_input_frequency() {
            Some(input) => input.0,
            None => return PllClocks::default(),
        };
        let m = self.pll_m(pll) as u32;
        if m == 0 {
            return PllClocks::default();
        }
        let n = self.pll_n(pll) as u32;
        let fracn = if self.is_pll_fracn_enabled(pll) {
            self.pll_fracn(pll) as u32
        } else {
            0
        };

        let output = |output: PllOutput| {
            if self.is_pll_output_enabled(pll, output) {
                let div = self.pll_divider(pll, output) as u32;
                Some(Hertz(calc_pll_clock_freq(input, m, n, fracn, div)))
            } else {
                None
            }
        };

        PllClocks {
            p_ck: output(PllOutput::P),
            q_ck: output(PllOutput::Q),
            r_ck: output(PllOutput::R),
        }
    }

    /// Program the dividers of `pll` to produce the clocks requested in
    /// `config` from the selected PLL source
    ///
    /// The PLL must be disabled. Outputs that are not requested are
    /// disabled. Returns the resulting output clocks.
    pub fn configure_pll(
        &self,
        pll: Pll,
        config: &PllConfig,
    ) -> Result<PllClocks, Error> {
        let pllsrc = match self.pll_source() {
            PllSource::Hsi => Hertz(HSI).shr(self.hsi_divider() as u32),
            PllSource::Csi => Hertz(CSI),
            PllSource::Hse => self.hse_frequency()?,
            PllSource::None => return Err(Error::PllSourceNotReady),
        };

        let dividers = match config.dividers(pll, pllsrc.0)? {
            Some(dividers) => dividers,
            None => {
                for output in &[PllOutput::P, PllOutput::Q, PllOutput::R] {
                    self.disable_pll_output(pll, *output);
                }
                return Ok(PllClocks::default());
            }
        };
        log::debug!(
            "{:?}: M={} N={} FRACN={:?} P={} Q={:?} R={:?}",
            pll,
            dividers.m,
            dividers.n,
            dividers.fracn,
            dividers.p,
            dividers.q,
            dividers.r
        );

        self.set_pll_m(pll, dividers.m)?;
        self.set_pll_n(pll, dividers.n)?;
        self.set_pll_vco_range(pll, dividers.vco_range);
        self.set_pll_input_range(pll, dividers.input_range);
        match dividers.fracn {
            Some(fracn) => {
                self.set_pll_fracn(pll, fracn)?;
                self.enable_pll_fracn(pll);
            }
            None => self.disable_pll_fracn(pll),
        }

        let outputs = [
            (PllOutput::P, Some(dividers.p)),
            (PllOutput::Q, dividers.q),
            (PllOutput::R, dividers.r),
        ];
        for (output, div) in outputs.iter() {
            match div {
                Some(div) => {
                    self.set_pll_divider(pll, *output, *div)?;
                    self.enable_pll_output(pll, *output);
                }
                None => self.disable_pll_output(pll, *output),
            }
        }

        Ok(dividers.clocks())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::tests::zeroed;
    use crate::time::U32Ext;

    #[test]
    /// Test PFD input frequency PLL and VCO output frequency
    fn vco_setup_normal_output() {
        let pllsrc = 25_000_000; // PLL source frequency eg. 25MHz crystal
        let pll_p_target = 242_000_000; // PLL output frequency (P_CK)
        let pll_q_target = 120_900_000; // PLL output frequency (Q_CK)
        let pll_r_target = 30_200_000; // PLL output frequency (R_CK)

        let vco = vco_setup_normal(pllsrc, pll_p_target, false).unwrap();
        assert_eq!(vco.vco_range, VcoRange::Medium);
        assert_eq!(vco.input_range, InputRange::Range1);

        // Feedback divider. Integer only
        let pll_x_n = vco.vco_ck_target / vco.ref_ck;
        // Resulting achieved vco_ck
        let vco_ck_achieved = calc_vco_ck(vco.ref_ck, pll_x_n, 0);
        // {Q,R} output clocks
        let pll_x_q = calc_ck_div(
            PllConfigStrategy::Normal,
            vco_ck_achieved,
            pll_q_target,
        )
        .unwrap();
        let pll_x_r = calc_ck_div(
            PllConfigStrategy::Normal,
            vco_ck_achieved,
            pll_r_target,
        )
        .unwrap();

        // Input
        let input = pllsrc as f32 / vco.m as f32;
        assert!((input > 1e6) && (input < 2e6));

        // Output
        let output_p = vco_ck_achieved as f32 / vco.p as f32;
        let error = output_p - pll_p_target as f32;
        assert!(f32::abs(error) < (pll_p_target as f32 / 100.0)); // < ±1% error

        let output_q = vco_ck_achieved as f32 / pll_x_q as f32;
        let error = output_q - pll_q_target as f32;
        assert!(f32::abs(error) < (pll_q_target as f32 / 100.0)); // < ±1% error

        let output_r = vco_ck_achieved as f32 / pll_x_r as f32;
        let error = output_r - pll_r_target as f32;
        assert!(f32::abs(error) < (pll_r_target as f32 / 100.0)); // < ±1% error
    }

    #[test]
    /// Test PFD input frequency PLL and VCO output frequency
    fn vco_setup_iterative_output() {
        let pllsrc = 25_000_000; // PLL source frequency eg. 25MHz crystal
        let pll_p_target = 240_000_000; // PLL output frequency (P_CK)
        let pll_q_target = 120_000_000; // PLL output frequency (Q_CK)
        let pll_r_target = 30_000_000; // PLL output frequency (R_CK)

        let vco = vco_setup_iterative(pllsrc, pll_p_target, false).unwrap();
        assert_eq!(vco.vco_range, VcoRange::Wide);
        assert_eq!(vco.input_range, InputRange::Range4);

        // Feedback divider. Integer only
        let pll_x_n = vco.vco_ck_target / vco.ref_ck;
        // Resulting achieved vco_ck
        let vco_ck_achieved = calc_vco_ck(vco.ref_ck, pll_x_n, 0);
        // {Q,R} output clocks
        let pll_x_q = calc_ck_div(
            PllConfigStrategy::Iterative,
            vco.vco_ck_target,
            pll_q_target,
        )
        .unwrap();
        let pll_x_r = calc_ck_div(
            PllConfigStrategy::Iterative,
            vco.vco_ck_target,
            pll_r_target,
        )
        .unwrap();

        // Input
        let input = pllsrc as f32 / vco.m as f32;
        assert_eq!(input, 5e6);

        // Output
        let output_p = pll_x_n as f32 * input / vco.p as f32;
        assert_eq!(output_p, 240e6);

        let output_q = vco_ck_achieved as f32 / pll_x_q as f32;
        assert_eq!(output_q, pll_q_target as f32);

        let output_r = vco_ck_achieved as f32 / pll_x_r as f32;
        assert_eq!(output_r, pll_r_target as f32);
    }

    #[test]
    /// Test PFD input frequency PLL and VCO output frequency
    fn vco_setup_fractional() {
        let pllsrc = 16_000_000; // PLL source frequency eg. 16MHz crystal
        let pll_p_target = 48_000 * 256; // Target clock
        let pll_q_target = 48_000 * 128; // Target clock
        let pll_r_target = 48_000 * 63; // Target clock
        let output = pll_p_target; // PLL output frequency (P_CK)

        let vco = vco_setup_iterative(pllsrc, output, false).unwrap();
        let input = pllsrc as f32 / vco.m as f32;

        // Feedback divider. Integer only
        let pll_x_n = vco.vco_ck_target / vco.ref_ck;
        let pll_x_fracn = calc_fracn(
            input as f32,
            pll_x_n as f32,
            vco.p as f32,
            output as f32,
        )
        .unwrap();
        // Resulting achieved vco_ck
        let vco_ck_achieved = calc_vco_ck(vco.ref_ck, pll_x_n, pll_x_fracn);

        // Calulate additional output dividers
        let pll_x_q = calc_ck_div(
            PllConfigStrategy::Fractional,
            vco_ck_achieved,
            pll_q_target,
        )
        .unwrap();
        let pll_x_r = calc_ck_div(
            PllConfigStrategy::Fractional,
            vco_ck_achieved,
            pll_r_target,
        )
        .unwrap();

        // Output
        let output_p = vco_ck_achieved as f32 / vco.p as f32;

        // The P_CK should be very close to the target with a finely tuned FRACN
        //
        // The other clocks accuracy will vary depending on how close
        // they are to an integer fraction of the P_CK
        assert!(output_p <= pll_p_target as f32);
        let error = output_p - pll_p_target as f32;
        assert!(f32::abs(error) < (pll_p_target as f32 / 500_000.0)); // < ±.0002% = 2ppm error

        let output_q = vco_ck_achieved as f32 / pll_x_q as f32;
        assert!(output_q <= pll_q_target as f32);

        let output_r = vco_ck_achieved as f32 / pll_x_r as f32;
        assert!(output_r <= pll_r_target as f32);
    }

    #[test]
    fn vco_setup_fractional_not_less() {
        let pllsrc = 16_000_000; // PLL source frequency eg. 16MHz crystal
        let pll_p_target = 48_000 * 256; // Target clock
        let pll_q_target = 48_000 * 128; // Target clock
        let pll_r_target = 48_000 * 63; // Target clock
        let output = pll_p_target; // PLL output frequency (P_CK)

        let vco = vco_setup_iterative(pllsrc, output, false).unwrap();
        let input = pllsrc as f32 / vco.m as f32;

        // Feedback divider. Integer only
        let pll_x_n = vco.vco_ck_target / vco.ref_ck;
        let pll_x_fracn = calc_fracn(
            input as f32,
            pll_x_n as f32,
            vco.p as f32,
            output as f32,
        )
        .unwrap()
            + 1;
        // Resulting achieved vco_ck
        let vco_ck_achieved = calc_vco_ck(vco.ref_ck, pll_x_n, pll_x_fracn);

        // Calulate additional output dividers
        let pll_x_q = calc_ck_div(
            PllConfigStrategy::FractionalNotLess,
            vco_ck_achieved,
            pll_q_target,
        )
        .unwrap();
        let pll_x_r = calc_ck_div(
            PllConfigStrategy::FractionalNotLess,
            vco_ck_achieved,
            pll_r_target,
        )
        .unwrap();

        // Output
        let output_p = vco_ck_achieved as f32 / vco.p as f32;
        assert!(output_p >= pll_p_target as f32);
        let error = output_p - pll_p_target as f32;
        assert!(f32::abs(error) < (pll_p_target as f32 / 500_000.0)); // < ±.0002% = 2ppm error

        let output_q = vco_ck_achieved as f32 / pll_x_q as f32;
        assert!(output_q >= pll_q_target as f32);

        let output_r = vco_ck_achieved as f32 / pll_x_r as f32;
        assert!(output_r >= pll_r_target as f32);
    }

    #[test]
    fn pll1_p_divider_is_even() {
        // 836 / 100 = 8, 960 / 100 = 9 -> 8
        let (vco_ck, p) =
            vco_output_divider_setup(100_000_000, 192_000_000, 836_000_000, true)
                .unwrap();
        assert_eq!(p, 8);
        assert_eq!(vco_ck, 800_000_000);

        let (_, p) =
            vco_output_divider_setup(90_000_000, 192_000_000, 836_000_000, true)
                .unwrap();
        assert_eq!(p % 2, 0);

        // Outputs above half of the VCO range are not divided
        let (_, p) =
            vco_output_divider_setup(500_000_000, 192_000_000, 960_000_000, true)
                .unwrap();
        assert_eq!(p, 1);
    }

    #[test]
    fn unachievable_outputs() {
        // Below the VCO range even with the largest divider
        assert_eq!(
            vco_output_divider_setup(1_000_000, 192_000_000, 836_000_000, false),
            Err(Error::PllVcoFrequency)
        );
        // Above the VCO range
        assert_eq!(
            vco_output_divider_setup(900_000_000, 192_000_000, 836_000_000, false),
            Err(Error::PllVcoFrequency)
        );
        // Reference clock cannot reach 2 MHz
        assert_eq!(
            vco_setup_iterative(1_000_000, 100_000_000, false).unwrap_err(),
            Error::PllInputFrequency
        );

        let config = PllConfig::default().q_ck(48.mhz());
        assert_eq!(
            config.dividers(Pll::Pll2, 25_000_000),
            Err(Error::PllOutputWithoutP)
        );
        assert_eq!(PllConfig::default().dividers(Pll::Pll2, 25_000_000), Ok(None));
    }

    #[test]
    fn output_faster_than_vco() {
        let config = PllConfig::default()
            .p_ck(400.mhz())
            .q_ck(4_000_000_000u32.hz());
        assert_eq!(
            config.dividers(Pll::Pll1, 25_000_000),
            Err(Error::PllDivider)
        );

        let config = PllConfig::default()
            .strategy(PllConfigStrategy::Iterative)
            .p_ck(400.mhz())
            .r_ck(u32::MAX.hz());
        assert_eq!(
            config.dividers(Pll::Pll2, 25_000_000),
            Err(Error::PllDivider)
        );

        assert_eq!(
            calc_ck_div(PllConfigStrategy::FractionalNotLess, u32::MAX, u32::MAX),
            Ok(1)
        );
        assert_eq!(
            calc_ck_div(PllConfigStrategy::Normal, 800_000_000, 1_000_000),
            Err(Error::PllDivider)
        );
    }

    #[test]
    fn largest_source_frequency() {
        for strategy in [PllConfigStrategy::Normal, PllConfigStrategy::Iterative] {
            let config = PllConfig::default().strategy(strategy).p_ck(400.mhz());
            assert_eq!(
                config.dividers(Pll::Pll1, u32::MAX),
                Err(Error::PllInputFrequency)
            );
        }
        assert_eq!(div_ceil(u32::MAX, 16_000_000), 269);
        assert_eq!(div_ceil(32_000_000, 16_000_000), 2);
    }

    #[test]
    fn pll_clock_freq() {
        // 25 MHz / 5 * 192 / 2
        assert_eq!(calc_pll_clock_freq(25_000_000, 5, 192, 0, 2), 480_000_000);
        // 64 MHz / 32 * 129 / 2, reset configuration
        assert_eq!(calc_pll_clock_freq(64_000_000, 32, 129, 0, 2), 129_000_000);
        // Fractional part: 4 MHz * (100 + 4096 / 8192) / 1
        assert_eq!(calc_pll_clock_freq(4_000_000, 1, 100, 4096, 1), 402_000_000);
        assert_eq!(calc_pll_clock_freq(25_000_000, 0, 192, 0, 2), 0);
    }

    #[test]
    fn pll_register_accessors() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.set_pll_source(PllSource::Hse);
        rcc.set_pll_m(Pll::Pll1, 5).unwrap();
        rcc.set_pll_m(Pll::Pll2, 63).unwrap();
        rcc.set_pll_m(Pll::Pll3, 32).unwrap();
        assert_eq!(rb.pllckselr.read(), 2 | 5 << 4 | 63 << 12 | 32 << 20);
        assert_eq!(rcc.pll_source(), PllSource::Hse);
        assert_eq!(rcc.pll_m(Pll::Pll2), 63);
        assert_eq!(rcc.set_pll_m(Pll::Pll1, 64), Err(Error::PllDivider));

        rcc.set_pll_n(Pll::Pll2, 192).unwrap();
        rcc.set_pll_divider(Pll::Pll2, PllOutput::P, 2).unwrap();
        rcc.set_pll_divider(Pll::Pll2, PllOutput::Q, 4).unwrap();
        rcc.set_pll_divider(Pll::Pll2, PllOutput::R, 128).unwrap();
        assert_eq!(rb.pll2divr.read(), 191 | 1 << 9 | 3 << 16 | 127 << 24);
        assert_eq!(rcc.pll_n(Pll::Pll2), 192);
        assert_eq!(rcc.pll_divider(Pll::Pll2, PllOutput::R), 128);
        assert_eq!(rcc.set_pll_n(Pll::Pll2, 3), Err(Error::PllDivider));
        assert_eq!(rcc.set_pll_n(Pll::Pll2, 513), Err(Error::PllDivider));
        assert_eq!(
            rcc.set_pll_divider(Pll::Pll2, PllOutput::Q, 0),
            Err(Error::PllDivider)
        );

        // PLL1 P divider must be even or unity
        assert_eq!(
            rcc.set_pll_divider(Pll::Pll1, PllOutput::P, 3),
            Err(Error::PllDivider)
        );
        rcc.set_pll_divider(Pll::Pll1, PllOutput::P, 1).unwrap();
        rcc.set_pll_divider(Pll::Pll3, PllOutput::P, 3).unwrap();

        rcc.set_pll_fracn(Pll::Pll3, 8191).unwrap();
        assert_eq!(rb.pll3fracr.read(), 8191 << 3);
        assert_eq!(rcc.pll_fracn(Pll::Pll3), 8191);
        assert_eq!(rcc.set_pll_fracn(Pll::Pll3, 8192), Err(Error::PllFracn));

        rcc.enable_pll_fracn(Pll::Pll3);
        rcc.set_pll_vco_range(Pll::Pll2, VcoRange::Medium);
        rcc.set_pll_input_range(Pll::Pll1, InputRange::Range8);
        rcc.enable_pll_output(Pll::Pll1, PllOutput::P);
        rcc.enable_pll_output(Pll::Pll3, PllOutput::R);
        assert_eq!(
            rb.pllcfgr.read(),
            1 << 8 | 1 << 5 | 0b11 << 2 | 1 << 16 | 1 << 24
        );
        assert!(rcc.is_pll_fracn_enabled(Pll::Pll3));
        assert_eq!(rcc.pll_vco_range(Pll::Pll2), VcoRange::Medium);
        assert_eq!(rcc.pll_input_range(Pll::Pll1), InputRange::Range8);
        assert!(rcc.is_pll_output_enabled(Pll::Pll3, PllOutput::R));
        rcc.disable_pll_output(Pll::Pll3, PllOutput::R);
        assert!(!rcc.is_pll_output_enabled(Pll::Pll3, PllOutput::R));

        rcc.enable_pll(Pll::Pll2);
        assert_eq!(rb.cr.read(), 1 << 26);
        assert!(!rcc.is_pll_ready(Pll::Pll2));
        rb.cr.set_bits(1 << 27);
        assert!(rcc.is_pll_ready(Pll::Pll2));
    }

    #[test]
    fn pll_clocks_from_registers() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb).use_hse(25.mhz());

        rcc.set_pll_source(PllSource::Hse);
        rcc.set_pll_m(Pll::Pll1, 25).unwrap();
        rcc.set_pll_n(Pll::Pll1, 300).unwrap();
        rcc.set_pll_divider(Pll::Pll1, PllOutput::P, 2).unwrap();
        rcc.set_pll_divider(Pll::Pll1, PllOutput::Q, 4).unwrap();
        rcc.enable_pll_output(Pll::Pll1, PllOutput::P);
        rcc.enable_pll_output(Pll::Pll1, PllOutput::Q);

        // HSE not ready
        assert_eq!(rcc.pll_clocks(Pll::Pll1), PllClocks::default());

        rb.cr.set_bits(cr::HSERDY);
        let clocks = rcc.pll_clocks(Pll::Pll1);
        assert_eq!(clocks.p_ck, Some(Hertz(150_000_000)));
        assert_eq!(clocks.q_ck, Some(Hertz(75_000_000)));
        assert_eq!(clocks.r_ck, None);

        // FRACN only counts once enabled
        rcc.set_pll_fracn(Pll::Pll1, 4096).unwrap();
        assert_eq!(rcc.pll_clocks(Pll::Pll1).p_ck, Some(Hertz(150_000_000)));
        rcc.enable_pll_fracn(Pll::Pll1);
        assert_eq!(rcc.pll_clocks(Pll::Pll1).p_ck, Some(Hertz(150_250_000)));

        // DIVM = 0 disables the PLL
        rcc.set_pll_m(Pll::Pll1, 0).unwrap();
        assert_eq!(rcc.pll_clocks(Pll::Pll1), PllClocks::default());
    }

    #[test]
    fn pll_clocks_from_divided_hsi() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rb.cr.write(cr::HSION | cr::HSIRDY);
        rcc.set_hsi_divider(crate::rcc::HsiDivider::Div2);
        rcc.set_pll_source(PllSource::Hsi);
        rcc.set_pll_m(Pll::Pll3, 16).unwrap();
        rcc.set_pll_n(Pll::Pll3, 200).unwrap();
        rcc.set_pll_divider(Pll::Pll3, PllOutput::R, 8).unwrap();
        rcc.enable_pll_output(Pll::Pll3, PllOutput::R);

        // 32 MHz / 16 * 200 / 8
        assert_eq!(rcc.pll_clocks(Pll::Pll3).r_ck, Some(Hertz(50_000_000)));
        assert_eq!(rcc.pll_clocks(Pll::Pll2), PllClocks::default());
    }

    #[test]
    fn configure_pll_writes_dividers() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb).use_hse(25.mhz());
        rcc.set_pll_source(PllSource::Hse);

        let config = PllConfig::default()
            .strategy(PllConfigStrategy::Iterative)
            .p_ck(240.mhz())
            .q_ck(120.mhz())
            .r_ck(30.mhz());
        let clocks = rcc.configure_pll(Pll::Pll2, &config).unwrap();
        assert_eq!(clocks.p_ck, Some(Hertz(240_000_000)));
        assert_eq!(clocks.q_ck, Some(Hertz(120_000_000)));
        assert_eq!(clocks.r_ck, Some(Hertz(30_000_000)));

        assert_eq!(rcc.pll_m(Pll::Pll2), 5);
        assert_eq!(rcc.pll_vco_range(Pll::Pll2), VcoRange::Wide);
        assert_eq!(rcc.pll_input_range(Pll::Pll2), InputRange::Range4);
        assert!(!rcc.is_pll_fracn_enabled(Pll::Pll2));
        for output in &[PllOutput::P, PllOutput::Q, PllOutput::R] {
            assert!(rcc.is_pll_output_enabled(Pll::Pll2, *output));
        }

        // Read back through the register state
        rb.cr.set_bits(cr::HSERDY);
        assert_eq!(rcc.pll_clocks(Pll::Pll2), clocks);
    }

    #[test]
    fn configure_pll_fractional() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb).use_hse(16.mhz());
        rcc.set_pll_source(PllSource::Hse);

        let config = PllConfig::default()
            .strategy(PllConfigStrategy::Fractional)
            .p_ck((48_000 * 256).hz());
        let clocks = rcc.configure_pll(Pll::Pll3, &config).unwrap();
        let p_ck = clocks.p_ck.unwrap().0;
        assert!(p_ck <= 48_000 * 256);
        assert!(48_000 * 256 - p_ck < 25);
        assert!(rcc.is_pll_fracn_enabled(Pll::Pll3));
        assert!(!rcc.is_pll_output_enabled(Pll::Pll3, PllOutput::Q));
    }

    #[test]
    fn configure_pll_without_source() {
        let rb = zeroed();
        let rcc = Rcc::new(&rb);

        rcc.set_pll_source(PllSource::None);
        let config = PllConfig::default().p_ck(100.mhz());
        assert_eq!(
            rcc.configure_pll(Pll::Pll1, &config),
            Err(Error::PllSourceNotReady)
        );

        rcc.set_pll_source(PllSource::Hse);
        assert_eq!(
            rcc.configure_pll(Pll::Pll1, &config),
            Err(Error::HseFrequencyUnknown)
        );
    }
}
