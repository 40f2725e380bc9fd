use core::fmt;

/// Errors returned by operations that take a value with a restricted range
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// MDMA block data length is greater than 65536 bytes
    BlockDataLength,
    /// MDMA block repeat count is greater than 4095
    BlockRepeatCount,
    /// MDMA buffer transfer length is greater than 127
    BufferTransferLength,
    /// MDMA buffers must have elements of 1, 2, 4 or 8 bytes
    DataSize,
    /// The reset / enable control belongs to another peripheral
    WrongPeripheral,
    /// The reset / enable control of the peripheral was already handed out
    PeripheralInUse,
    /// The HSE oscillator frequency was not specified with `use_hse`
    HseFrequencyUnknown,
    /// The selected PLL source is not ready, or no source is selected
    PllSourceNotReady,
    /// The reference clock at the PLL phase-frequency detector is out of
    /// range
    PllInputFrequency,
    /// The requested PLL output cannot be generated within the VCO range
    PllVcoFrequency,
    /// A PLL divider value is out of range
    PllDivider,
    /// The fractional part of the PLL multiplier is greater than 8191
    PllFracn,
    /// PLL Q or R output requested without the P output
    PllOutputWithoutP,
    /// The clock is not running
    ClockNotRunning,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            Error::BlockDataLength => "MDMA block data length out of range",
            Error::BlockRepeatCount => "MDMA block repeat count out of range",
            Error::BufferTransferLength => {
                "MDMA buffer transfer length out of range"
            }
            Error::DataSize => "Unsupported MDMA data size",
            Error::WrongPeripheral => {
                "Reset / enable control of the wrong peripheral"
            }
            Error::PeripheralInUse => {
                "Reset / enable control already handed out"
            }
            Error::HseFrequencyUnknown => "HSE frequency not specified",
            Error::PllSourceNotReady => "PLL source clock not ready",
            Error::PllInputFrequency => "PLL reference clock out of range",
            Error::PllVcoFrequency => "PLL VCO frequency out of range",
            Error::PllDivider => "PLL divider out of range",
            Error::PllFracn => "PLL FRACN out of range",
            Error::PllOutputWithoutP => {
                "PLL P clock must be set for the Q or R clock to take effect"
            }
            Error::ClockNotRunning => "Clock not running",
        };
        f.write_str(msg)
    }
}
