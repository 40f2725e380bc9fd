//! Master DMA
//!
//! The Master DMA has a wide variety of configuration options for
//! packing/unpacking data and swapping endianness. It is primarily intended for
//! use with peripherals and memory regions with ports on the 64-bit AXI bus
//! matrix. Unlike DMA1/DMA2, it can access TCM memory regions via the Cortex-M7
//! AHBS port.
//!
//! This module gives register-level access to the 16 MDMA channels. Every
//! accessor takes the [`Channel`] it operates on. A complete channel
//! configuration is written at once with [`Mdma::init`](Mdma#method.init)
//! from an [`InitConfig`].
//!
//! ```rust,ignore
//! let mdma = dp.MDMA.mdma(rcc.rec(Ahb3::MDMA)?)?;
//!
//! let config = InitConfig::default()
//!     .request_mode(MdmaRequestMode::Software)
//!     .trigger_mode(MdmaTrigger::Block)
//!     .addresses(src, dst)
//!     .block_data_length(1024);
//! mdma.init(Channel::Ch0, &config)?;
//!
//! mdma.enable_channel(Channel::Ch0);
//! mdma.generate_sw_request(Channel::Ch0);
//! while !mdma.is_active_flag(Channel::Ch0, ChannelFlags::CTC) {}
//! ```
//!
//! ## Trigger Modes
//!
//! #### Buffer Trigger
//!
//! Each request results in the transfer of up to 128 bytes of data, as set
//! by the buffer transfer length. If a larger block was configured, the
//! channel must be triggered again to continue the transfer. This behavior
//! is useful alongside hardware triggers when transferring to/from
//! peripheral FIFOs.
//!
//! #### Block Trigger
//!
//! Each request results in the transfer of a block of up to 65536 bytes of
//! data. The MDMA checks for other higher priority requests after each
//! buffer.
//!
//! #### Repeated Block Trigger
//!
//! Each request results in the transfer of the block repeated the number
//! of times set by the block repeat count, updating the addresses after
//! each block by the block repeat update values.
//!
//! #### Linked List Trigger
//!
//! Each request results in the complete transfer. At its end the channel
//! reloads its configuration from the [`LinkNode`] at the link address, if
//! there is one.

mod config;
mod link;

pub use config::InitConfig;
pub use link::LinkNode;

use core::fmt;
use core::mem;

use crate::rcc::rec::{Rec, ResetEnable};
use crate::rcc::Ahb3;
use crate::register::Reg;
use crate::Error;

/// Registers of one MDMA channel
#[repr(C)]
pub struct ChannelRegisterBlock {
    /// Interrupt/status register
    pub cisr: Reg,
    /// Interrupt flag clear register
    pub cifcr: Reg,
    /// Error status register
    pub cesr: Reg,
    /// Control register
    pub ccr: Reg,
    /// Transfer configuration register
    pub ctcr: Reg,
    /// Block number of data register
    pub cbndtr: Reg,
    /// Source address register
    pub csar: Reg,
    /// Destination address register
    pub cdar: Reg,
    /// Block repeat address update register
    pub cbrur: Reg,
    /// Link address register
    pub clar: Reg,
    /// Trigger and bus selection register
    pub ctbr: Reg,
    _reserved0: [u8; 4],
    /// Mask address register
    pub cmar: Reg,
    /// Mask data register
    pub cmdr: Reg,
    _reserved1: [u8; 8],
}

/// MDMA register block
#[repr(C)]
pub struct RegisterBlock {
    /// Global interrupt/status register
    pub gisr0: Reg,
    _reserved0: [u8; 0x3C],
    /// Channel registers
    pub ch: [ChannelRegisterBlock; 16],
}

impl RegisterBlock {
    /// Address of the MDMA register block
    pub const PTR: *const RegisterBlock = 0x5200_0000 as *const _;

    /// Returns the MDMA register block at its fixed address
    ///
    /// # Safety
    ///
    /// Every handle created from the returned reference accesses the same
    /// registers. The caller ensures that accesses do not conflict.
    pub unsafe fn steal() -> &'static RegisterBlock {
        &*Self::PTR
    }
}

mod ccr {
    pub const EN: u32 = 1 << 0;
    pub const IE_POS: u8 = 1;
    pub const PL_POS: u8 = 6;
    pub const BEX_POS: u8 = 12;
    pub const HEX_POS: u8 = 13;
    pub const WEX_POS: u8 = 14;
    pub const SWRQ: u32 = 1 << 16;
}

mod ctcr {
    pub const SINC_POS: u8 = 0;
    pub const DINC_POS: u8 = 2;
    pub const SSIZE_POS: u8 = 4;
    pub const DSIZE_POS: u8 = 6;
    pub const SINCOS_POS: u8 = 8;
    pub const DINCOS_POS: u8 = 10;
    pub const SBURST_POS: u8 = 12;
    pub const DBURST_POS: u8 = 15;
    pub const TLEN_POS: u8 = 18;
    pub const TLEN: u32 = 0x7F << TLEN_POS;
    pub const PKE: u32 = 1 << 25;
    pub const PAM_POS: u8 = 26;
    pub const TRGM_POS: u8 = 28;
    pub const SWRM_POS: u8 = 30;
    pub const BWM: u32 = 1 << 31;
}

mod cbndtr {
    pub const BNDT: u32 = 0x1_FFFF;
    pub const BRSUM_POS: u8 = 18;
    pub const BRDUM_POS: u8 = 19;
    pub const BRC_POS: u8 = 20;
    pub const BRC: u32 = 0xFFF << BRC_POS;
}

mod cbrur {
    pub const DUV_POS: u8 = 16;
}

mod ctbr {
    pub const TSEL_POS: u8 = 0;
    pub const SBUS_POS: u8 = 16;
    pub const DBUS_POS: u8 = 17;
}

mod cesr {
    pub const TEA: u32 = 0x7F;
    pub const TED: u32 = 1 << 7;
}

mod cisr {
    pub const CRQA: u32 = 1 << 16;
}

/// Largest block data length, in bytes
pub const MAX_BLOCK_DATA_LENGTH: u32 = 0x1_0000;
/// Largest block repeat count
pub const MAX_BLOCK_REPEAT_COUNT: u16 = 0xFFF;
/// Largest buffer transfer length field. The buffer is one byte longer
pub const MAX_BUFFER_TRANSFER_LENGTH: u8 = 0x7F;

/// A value of a bit-field of the MDMA channel registers
pub(crate) trait FieldValue: Copy {
    fn into_bits(self) -> u32;
    fn from_bits(bits: u32) -> Self;
}

/// MDMA channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Channel {
    Ch0 = 0,
    Ch1,
    Ch2,
    Ch3,
    Ch4,
    Ch5,
    Ch6,
    Ch7,
    Ch8,
    Ch9,
    Ch10,
    Ch11,
    Ch12,
    Ch13,
    Ch14,
    Ch15,
}

impl Channel {
    /// All channels, in order
    pub const ALL: [Channel; 16] = [
        Channel::Ch0,
        Channel::Ch1,
        Channel::Ch2,
        Channel::Ch3,
        Channel::Ch4,
        Channel::Ch5,
        Channel::Ch6,
        Channel::Ch7,
        Channel::Ch8,
        Channel::Ch9,
        Channel::Ch10,
        Channel::Ch11,
        Channel::Ch12,
        Channel::Ch13,
        Channel::Ch14,
        Channel::Ch15,
    ];
}

/// MDMA Stream Transfer Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaTransferRequest {
    /// DMA1 stream 0 transfer complete
    Dma1Tcif0 = 0,
    /// DMA1 stream 1 transfer complete
    Dma1Tcif1,
    /// DMA1 stream 2 transfer complete
    Dma1Tcif2,
    /// DMA1 stream 3 transfer complete
    Dma1Tcif3,
    /// DMA1 stream 4 transfer complete
    Dma1Tcif4,
    /// DMA1 stream 5 transfer complete
    Dma1Tcif5,
    /// DMA1 stream 6 transfer complete
    Dma1Tcif6,
    /// DMA1 stream 7 transfer complete
    Dma1Tcif7,
    /// DMA2 stream 0 transfer complete
    Dma2Tcif0,
    /// DMA2 stream 1 transfer complete
    Dma2Tcif1,
    /// DMA2 stream 2 transfer complete
    Dma2Tcif2,
    /// DMA2 stream 3 transfer complete
    Dma2Tcif3,
    /// DMA2 stream 4 transfer complete
    Dma2Tcif4,
    /// DMA2 stream 5 transfer complete
    Dma2Tcif5,
    /// DMA2 stream 6 transfer complete
    Dma2Tcif6,
    /// DMA2 stream 7 transfer complete
    Dma2Tcif7,
    /// LTDC line interrupt
    LtdcLiIt = 16,
    /// JPEG input FIFO threshold
    JpegIftTrg = 17,
    /// JPEG input FIFO not full
    JpegIfntTrg,
    /// JPEG output FIFO threshold
    JpegOftTrg,
    /// JPEG output FIFO not empty
    JpegOfneTrg,
    /// JPEG end of conversion
    JpegOecTrg,
    /// QUADSPI FIFO threshold
    QuadspiFtTrg = 22,
    /// QUADSPI transfer complete
    QuadspiTcTrg,
    /// DMA2D CLUT transfer complete
    Dma2dClutTrg = 24,
    /// DMA2D transfer complete
    Dma2dTcTrg,
    /// DMA2D transfer watermark
    Dma2dTwTrg,
    /// DSI tearing effect
    DsiTeTrg = 27,
    /// DSI end of refresh
    DsiEorTrg,
    /// SDMMC1 end of data
    Sdmmc1DataEndTrg = 29,
    /// SDMMC1 internal DMA buffer end
    Sdmmc1BuffendTrg,
    /// SDMMC1 command end
    Sdmmc1CmdEndTrg,
}

impl MdmaTransferRequest {
    const ALL: [MdmaTransferRequest; 32] = {
        use MdmaTransferRequest::*;
        [
            Dma1Tcif0, Dma1Tcif1, Dma1Tcif2, Dma1Tcif3, Dma1Tcif4, Dma1Tcif5,
            Dma1Tcif6, Dma1Tcif7, Dma2Tcif0, Dma2Tcif1, Dma2Tcif2, Dma2Tcif3,
            Dma2Tcif4, Dma2Tcif5, Dma2Tcif6, Dma2Tcif7, LtdcLiIt, JpegIftTrg,
            JpegIfntTrg, JpegOftTrg, JpegOfneTrg, JpegOecTrg, QuadspiFtTrg,
            QuadspiTcTrg, Dma2dClutTrg, Dma2dTcTrg, Dma2dTwTrg, DsiTeTrg,
            DsiEorTrg, Sdmmc1DataEndTrg, Sdmmc1BuffendTrg, Sdmmc1CmdEndTrg,
        ]
    };

    /// Returns the request for a `TSEL` value, or `None` if it is reserved
    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }
}

/// MDMA Source/Destination sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaSize {
    /// Byte (8-bit)
    Byte = 0,
    /// Half-word (16-bit)
    HalfWord = 1,
    /// Word (32-bit)
    Word = 2,
    /// Double-word (64-bit)
    DoubleWord = 3,
}
impl MdmaSize {
    /// Returns MdmaSize from the size of a type
    pub fn from_type<T: Sized>() -> Result<Self, Error> {
        match mem::size_of::<T>() {
            1 => Ok(MdmaSize::Byte),
            2 => Ok(MdmaSize::HalfWord),
            4 => Ok(MdmaSize::Word),
            8 => Ok(MdmaSize::DoubleWord),
            _ => Err(Error::DataSize),
        }
    }
    /// Returns the size in bytes of the Source/Destination size
    pub fn n_bytes(&self) -> usize {
        1 << (*self as usize)
    }
}
impl FieldValue for MdmaSize {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => MdmaSize::Byte,
            1 => MdmaSize::HalfWord,
            2 => MdmaSize::Word,
            _ => MdmaSize::DoubleWord,
        }
    }
}

/// MDMA increment mode
///
/// The reserved encoding `0b01` reads back as `Fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaIncMode {
    /// The address stays the same
    Fixed = 0b00,
    /// Increment by the increment offset size each element
    Increment = 0b10,
    /// Decrement by the increment offset size each element
    Decrement = 0b11,
}
impl FieldValue for MdmaIncMode {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b10 => MdmaIncMode::Increment,
            0b11 => MdmaIncMode::Decrement,
            _ => MdmaIncMode::Fixed,
        }
    }
}

/// MDMA burst size. This type contains the _register_ value, thus the burst
/// size is equal to 2^N where N is the register value.
///
/// The derived Default implementation gives a burst size of 2^0 = 1
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MdmaBurstSize(pub(crate) u8);
impl MdmaBurstSize {
    /// Single transfer
    pub const SINGLE: MdmaBurstSize = MdmaBurstSize(0);

    const fn from_size(mut v: usize) -> Self {
        let mut p = 0;
        while v > 1 {
            p += 1;
            v >>= 1;
        }

        MdmaBurstSize(p)
    }

    /// Number of beats in a burst
    pub fn beats(&self) -> usize {
        1 << self.0
    }
}
impl From<usize> for MdmaBurstSize {
    /// Rounds down to a power of two, up to 128 beats
    fn from(v: usize) -> Self {
        debug_assert!(v != 0, "Burst Size must not be zero");
        debug_assert!(v <= 128, "Maximum Burst Size is 128 beats");

        Self::from_size(v.min(128))
    }
}
impl fmt::Debug for MdmaBurstSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 > 0 {
            f.write_fmt(format_args!("{}", 1 << self.0))
        } else {
            f.write_str("single")
        }
    }
}
#[cfg(feature = "defmt")]
impl defmt::Format for MdmaBurstSize {
    fn format(&self, fmt: defmt::Formatter) {
        if self.0 > 0 {
            defmt::write!(fmt, "{=u32}", 1 << self.0);
        } else {
            defmt::write!(fmt, "single");
        }
    }
}
impl FieldValue for MdmaBurstSize {
    fn into_bits(self) -> u32 {
        self.0 as u32
    }
    fn from_bits(bits: u32) -> Self {
        MdmaBurstSize((bits & 0b111) as u8)
    }
}

/// MDMA padding and alignment, when the source data size is smaller than
/// the destination data size
///
/// The reserved encoding `0b11` reads back as `Right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaDataAlignment {
    /// Right-aligned and padded with zeros
    Right = 0b00,
    /// Right-aligned and sign-extended
    RightSigned = 0b01,
    /// Left-aligned and padded with zeros
    Left = 0b10,
}
impl FieldValue for MdmaDataAlignment {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => MdmaDataAlignment::RightSigned,
            0b10 => MdmaDataAlignment::Left,
            _ => MdmaDataAlignment::Right,
        }
    }
}

/// MDMA trigger mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaTrigger {
    /// Each MDMA request triggers a buffer transfer
    Buffer = 0b00,
    /// Each MDMA request triggers a block transfer
    Block = 0b01,
    /// Each MDMA request triggers a repeated block transfer
    RepeatedBlock = 0b10,
    /// Each MDMA request triggers a complete transfer, following the linked
    /// list if there is one
    LinkedList = 0b11,
}
impl FieldValue for MdmaTrigger {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => MdmaTrigger::Buffer,
            0b01 => MdmaTrigger::Block,
            0b10 => MdmaTrigger::RepeatedBlock,
            _ => MdmaTrigger::LinkedList,
        }
    }
}

/// Origin of the channel requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaRequestMode {
    /// Requests come from the hardware trigger selected by `TSEL`
    Hardware = 0,
    /// Requests are generated by software
    Software = 1,
}
impl FieldValue for MdmaRequestMode {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        if bits & 1 != 0 {
            MdmaRequestMode::Software
        } else {
            MdmaRequestMode::Hardware
        }
    }
}

/// Channel priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
    VeryHigh = 3,
}
impl FieldValue for Priority {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Priority::Low,
            1 => Priority::Medium,
            2 => Priority::High,
            _ => Priority::VeryHigh,
        }
    }
}

/// Endianness of one element size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endianness {
    /// Little endianness preserved
    Preserve = 0,
    /// Order exchanged within the destination data size
    Exchange = 1,
}
impl FieldValue for Endianness {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        if bits & 1 != 0 {
            Endianness::Exchange
        } else {
            Endianness::Preserve
        }
    }
}

bitflags::bitflags! {
    /// Endianness exchanges, as laid out in CCR
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct EndiannessExchange: u32 {
        /// Byte order exchanged when the destination data size is half
        /// word, word or double word
        const BYTE = 1 << 12;
        /// Half word order exchanged when the destination data size is
        /// word or double word
        const HALF_WORD = 1 << 13;
        /// Word order exchanged when the destination data size is double
        /// word
        const WORD = 1 << 14;
    }
}

/// Block repeat address update direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockRepeatUpdate {
    /// The address is incremented by the update value after each block
    Increment = 0,
    /// The address is decremented by the update value after each block
    Decrement = 1,
}
impl FieldValue for BlockRepeatUpdate {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        if bits & 1 != 0 {
            BlockRepeatUpdate::Decrement
        } else {
            BlockRepeatUpdate::Increment
        }
    }
}

/// Bus used for a source or destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaBus {
    /// System/AXI bus
    System = 0,
    /// AHB bus or TCM
    Ahb = 1,
}
impl FieldValue for MdmaBus {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        if bits & 1 != 0 {
            MdmaBus::Ahb
        } else {
            MdmaBus::System
        }
    }
}

impl FieldValue for u16 {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Self {
        bits as u16
    }
}

/// Direction of the access that caused a transfer error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MdmaErrorDirection {
    /// Read access
    Read,
    /// Write access
    Write,
}

bitflags::bitflags! {
    /// Channel status flags, as laid out in CISR and CIFCR
    ///
    /// The interrupt enable of each flag is the next bit up in CCR.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ChannelFlags: u32 {
        /// Transfer error
        const TE = 1 << 0;
        /// Channel transfer complete
        const CTC = 1 << 1;
        /// Block repeat transfer complete
        const BRT = 1 << 2;
        /// Block transfer complete
        const BT = 1 << 3;
        /// Buffer transfer complete
        const TC = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Transfer error causes, as laid out in CESR
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ErrorFlags: u32 {
        /// Error while reading a link node
        const TELD = 1 << 8;
        /// Error while writing the mask data
        const TEMD = 1 << 9;
        /// Address not aligned with the data size
        const ASE = 1 << 10;
        /// Block length not a multiple of the data size
        const BSE = 1 << 11;
    }
}

/// MDMA peripheral
pub struct Mdma<'a> {
    rb: &'a RegisterBlock,
    rec: Rec<'a, Ahb3>,
}

/// Extension trait that constrains the `MDMA` peripheral
#[cfg(feature = "device-selected")]
pub trait MdmaExt {
    /// Enable and reset the MDMA, returning a handle to its channels
    fn mdma<'a>(self, rec: Rec<'a, Ahb3>) -> Result<Mdma<'a>, Error>;
}

#[cfg(feature = "device-selected")]
impl MdmaExt for crate::stm32::MDMA {
    fn mdma<'a>(self, rec: Rec<'a, Ahb3>) -> Result<Mdma<'a>, Error> {
        // Owning the PAC singleton guarantees a unique handle
        Mdma::new(unsafe { RegisterBlock::steal() }, rec)
    }
}

impl<'a> Mdma<'a> {
    /// Create a MDMA handle from its register block and the reset and
    /// enable control of the MDMA. The MDMA is enabled and reset
    pub fn new(rb: &'a RegisterBlock, rec: Rec<'a, Ahb3>) -> Result<Self, Error> {
        if rec.peripherals() != Ahb3::MDMA {
            return Err(Error::WrongPeripheral);
        }
        let rec = rec.enable().reset();

        Ok(Mdma { rb, rec })
    }

    /// Releases the reset and enable control. The MDMA keeps running
    pub fn free(self) -> Rec<'a, Ahb3> {
        self.rec
    }

    #[inline(always)]
    fn ch(&self, channel: Channel) -> &ChannelRegisterBlock {
        &self.rb.ch[channel as usize]
    }
}

/// Generates a setter and a getter for a bit-field of a channel register
macro_rules! channel_field {
    ($(
        $(#[$meta:meta])*
        $reg:ident[$pos:expr, $width:expr]: $T:ty => $set:ident, $get:ident;
    )+) => {
        impl<'a> Mdma<'a> {
            $(
                $(#[$meta])*
                #[inline(always)]
                pub fn $set(&self, channel: Channel, value: $T) {
                    self.ch(channel)
                        .$reg
                        .write_field($pos, $width, value.into_bits());
                }

                $(#[$meta])*
                #[inline(always)]
                pub fn $get(&self, channel: Channel) -> $T {
                    <$T as FieldValue>::from_bits(
                        self.ch(channel).$reg.read_field($pos, $width),
                    )
                }
            )+
        }
    };
}

channel_field! {
    /// Word endianness exchange (WEX)
    ccr[ccr::WEX_POS, 1]: Endianness => set_word_endianness, word_endianness;
    /// Half word endianness exchange (HEX)
    ccr[ccr::HEX_POS, 1]: Endianness => set_half_word_endianness, half_word_endianness;
    /// Byte endianness exchange (BEX)
    ccr[ccr::BEX_POS, 1]: Endianness => set_byte_endianness, byte_endianness;
    /// Channel priority level
    ccr[ccr::PL_POS, 2]: Priority => set_channel_priority_level, channel_priority_level;

    /// Request mode (SWRM)
    ctcr[ctcr::SWRM_POS, 1]: MdmaRequestMode => set_request_mode, request_mode;
    /// Trigger mode (TRGM)
    ctcr[ctcr::TRGM_POS, 2]: MdmaTrigger => set_trigger_mode, trigger_mode;
    /// Padding and alignment (PAM)
    ctcr[ctcr::PAM_POS, 2]: MdmaDataAlignment => set_padding_alignment, padding_alignment;
    /// Destination burst size (DBURST)
    ctcr[ctcr::DBURST_POS, 3]: MdmaBurstSize => set_destination_burst_size, destination_burst_size;
    /// Source burst size (SBURST)
    ctcr[ctcr::SBURST_POS, 3]: MdmaBurstSize => set_source_burst_size, source_burst_size;
    /// Destination increment offset size (DINCOS)
    ctcr[ctcr::DINCOS_POS, 2]: MdmaSize => set_destination_inc_size, destination_inc_size;
    /// Source increment offset size (SINCOS)
    ctcr[ctcr::SINCOS_POS, 2]: MdmaSize => set_source_inc_size, source_inc_size;
    /// Destination data size (DSIZE)
    ctcr[ctcr::DSIZE_POS, 2]: MdmaSize => set_destination_data_size, destination_data_size;
    /// Source data size (SSIZE)
    ctcr[ctcr::SSIZE_POS, 2]: MdmaSize => set_source_data_size, source_data_size;
    /// Destination increment mode (DINC)
    ctcr[ctcr::DINC_POS, 2]: MdmaIncMode => set_destination_inc_mode, destination_inc_mode;
    /// Source increment mode (SINC)
    ctcr[ctcr::SINC_POS, 2]: MdmaIncMode => set_source_inc_mode, source_inc_mode;

    /// Block repeat destination address update mode (BRDUM)
    cbndtr[cbndtr::BRDUM_POS, 1]: BlockRepeatUpdate => set_blk_repeat_dest_addr_update, blk_repeat_dest_addr_update;
    /// Block repeat source address update mode (BRSUM)
    cbndtr[cbndtr::BRSUM_POS, 1]: BlockRepeatUpdate => set_blk_repeat_src_addr_update, blk_repeat_src_addr_update;

    /// Block repeat destination address update value (DUV), in bytes
    cbrur[cbrur::DUV_POS, 16]: u16 => set_blk_rpt_dest_addr_update_value, blk_rpt_dest_addr_update_value;
    /// Block repeat source address update value (SUV), in bytes
    cbrur[0, 16]: u16 => set_blk_rpt_src_addr_update_value, blk_rpt_src_addr_update_value;

    /// Destination bus (DBUS)
    ctbr[ctbr::DBUS_POS, 1]: MdmaBus => set_dest_bus_selection, dest_bus_selection;
    /// Source bus (SBUS)
    ctbr[ctbr::SBUS_POS, 1]: MdmaBus => set_src_bus_selection, src_bus_selection;
}

/// Channel control
impl<'a> Mdma<'a> {
    /// Enable the channel
    pub fn enable_channel(&self, channel: Channel) {
        self.ch(channel).ccr.set_bits(ccr::EN);
    }

    /// Disable the channel. An ongoing transfer is suspended at the end of
    /// the current access
    pub fn disable_channel(&self, channel: Channel) {
        self.ch(channel).ccr.clear_bits(ccr::EN);
    }

    /// True if the channel is enabled
    pub fn is_enabled_channel(&self, channel: Channel) -> bool {
        self.ch(channel).ccr.is_set(ccr::EN)
    }

    /// Request a transfer by software. The channel must be enabled and in
    /// software request mode
    pub fn generate_sw_request(&self, channel: Channel) {
        self.ch(channel).ccr.set_bits(ccr::SWRQ);
    }

    /// Set the word, half word and byte endianness exchanges at once
    pub fn config_xfer_endianness(&self, channel: Channel, exchange: EndiannessExchange) {
        self.ch(channel)
            .ccr
            .modify_bits(EndiannessExchange::all().bits(), exchange.bits());
    }

    /// Write the transfer configuration register (CTCR)
    ///
    /// `configuration` holds every CTCR field except the buffer transfer
    /// length, as built by
    /// [`InitConfig::transfer_configuration`](InitConfig#method.transfer_configuration).
    /// The buffer transfers `buffer_transfer_length + 1` bytes.
    pub fn config_transfer(
        &self,
        channel: Channel,
        configuration: u32,
        buffer_transfer_length: u8,
    ) -> Result<(), Error> {
        if buffer_transfer_length > MAX_BUFFER_TRANSFER_LENGTH {
            return Err(Error::BufferTransferLength);
        }
        self.ch(channel).ctcr.write(
            (configuration & !ctcr::TLEN)
                | (buffer_transfer_length as u32) << ctcr::TLEN_POS,
        );
        Ok(())
    }

    /// Destination write operations are bufferable
    pub fn enable_bufferable_wr_mode(&self, channel: Channel) {
        self.ch(channel).ctcr.set_bits(ctcr::BWM);
    }

    /// Destination write operations are not bufferable
    pub fn disable_bufferable_wr_mode(&self, channel: Channel) {
        self.ch(channel).ctcr.clear_bits(ctcr::BWM);
    }

    /// True if destination write operations are bufferable
    pub fn is_enabled_bufferable_wr_mode(&self, channel: Channel) -> bool {
        self.ch(channel).ctcr.is_set(ctcr::BWM)
    }

    /// Pack/unpack source data into the destination data size
    pub fn enable_packing(&self, channel: Channel) {
        self.ch(channel).ctcr.set_bits(ctcr::PKE);
    }

    /// Pad or truncate source data to the destination data size
    pub fn disable_packing(&self, channel: Channel) {
        self.ch(channel).ctcr.clear_bits(ctcr::PKE);
    }

    /// True if packing is enabled
    pub fn is_enabled_packing(&self, channel: Channel) -> bool {
        self.ch(channel).ctcr.is_set(ctcr::PKE)
    }

    /// Set the buffer transfer length (TLEN). The buffer transfers
    /// `length + 1` bytes
    pub fn set_buffer_transfer_length(&self, channel: Channel, length: u8) -> Result<(), Error> {
        if length > MAX_BUFFER_TRANSFER_LENGTH {
            return Err(Error::BufferTransferLength);
        }
        self.ch(channel)
            .ctcr
            .write_field(ctcr::TLEN_POS, 7, length as u32);
        Ok(())
    }

    /// Buffer transfer length (TLEN)
    pub fn buffer_transfer_length(&self, channel: Channel) -> u8 {
        self.ch(channel).ctcr.read_field(ctcr::TLEN_POS, 7) as u8
    }
}

/// Block counters
impl<'a> Mdma<'a> {
    /// Set the block repeat count and the block data length at once
    pub fn config_blk_counters(
        &self,
        channel: Channel,
        repeat_count: u16,
        data_length: u32,
    ) -> Result<(), Error> {
        if repeat_count > MAX_BLOCK_REPEAT_COUNT {
            return Err(Error::BlockRepeatCount);
        }
        if data_length > MAX_BLOCK_DATA_LENGTH {
            return Err(Error::BlockDataLength);
        }
        self.ch(channel).cbndtr.modify_bits(
            cbndtr::BRC | cbndtr::BNDT,
            (repeat_count as u32) << cbndtr::BRC_POS | data_length,
        );
        Ok(())
    }

    /// Set the number of bytes in a block (BNDT), up to 65536
    pub fn set_blk_data_length(&self, channel: Channel, length: u32) -> Result<(), Error> {
        if length > MAX_BLOCK_DATA_LENGTH {
            return Err(Error::BlockDataLength);
        }
        self.ch(channel).cbndtr.modify_bits(cbndtr::BNDT, length);
        Ok(())
    }

    /// Remaining bytes in the current block (BNDT)
    pub fn blk_data_length(&self, channel: Channel) -> u32 {
        self.ch(channel).cbndtr.read_bits(cbndtr::BNDT)
    }

    /// Set the number of block repetitions (BRC), up to 4095
    pub fn set_blk_repeat_count(&self, channel: Channel, count: u16) -> Result<(), Error> {
        if count > MAX_BLOCK_REPEAT_COUNT {
            return Err(Error::BlockRepeatCount);
        }
        self.ch(channel)
            .cbndtr
            .write_field(cbndtr::BRC_POS, 12, count as u32);
        Ok(())
    }

    /// Remaining block repetitions (BRC)
    pub fn blk_repeat_count(&self, channel: Channel) -> u16 {
        self.ch(channel).cbndtr.read_field(cbndtr::BRC_POS, 12) as u16
    }

    /// Set the destination and source block repeat address update modes
    pub fn config_blk_repeat_addr_update(
        &self,
        channel: Channel,
        destination: BlockRepeatUpdate,
        source: BlockRepeatUpdate,
    ) {
        self.ch(channel).cbndtr.modify_bits(
            1 << cbndtr::BRDUM_POS | 1 << cbndtr::BRSUM_POS,
            destination.into_bits() << cbndtr::BRDUM_POS
                | source.into_bits() << cbndtr::BRSUM_POS,
        );
    }

    /// Set the source and destination block repeat address update values
    pub fn config_blk_rpt_addr_update_value(
        &self,
        channel: Channel,
        source: u16,
        destination: u16,
    ) {
        self.ch(channel)
            .cbrur
            .write((destination as u32) << cbrur::DUV_POS | source as u32);
    }
}

/// Addresses
impl<'a> Mdma<'a> {
    /// Set the source and destination addresses at once
    pub fn config_addresses(&self, channel: Channel, source: u32, destination: u32) {
        let ch = self.ch(channel);
        ch.csar.write(source);
        ch.cdar.write(destination);
    }

    /// Set the source address
    pub fn set_source_address(&self, channel: Channel, address: u32) {
        self.ch(channel).csar.write(address);
    }

    /// Source address
    pub fn source_address(&self, channel: Channel) -> u32 {
        self.ch(channel).csar.read()
    }

    /// Set the destination address
    pub fn set_destination_address(&self, channel: Channel, address: u32) {
        self.ch(channel).cdar.write(address);
    }

    /// Destination address
    pub fn destination_address(&self, channel: Channel) -> u32 {
        self.ch(channel).cdar.read()
    }

    /// Set the address of the next link node. 0 ends the linked list
    pub fn set_link_address(&self, channel: Channel, address: u32) {
        self.ch(channel).clar.write(address);
    }

    /// Address of the next link node
    pub fn link_address(&self, channel: Channel) -> u32 {
        self.ch(channel).clar.read()
    }

    /// Set the destination and source buses at once
    pub fn config_bus_selection(&self, channel: Channel, destination: MdmaBus, source: MdmaBus) {
        self.ch(channel).ctbr.modify_bits(
            1 << ctbr::DBUS_POS | 1 << ctbr::SBUS_POS,
            destination.into_bits() << ctbr::DBUS_POS | source.into_bits() << ctbr::SBUS_POS,
        );
    }

    /// Select the hardware request of the channel (TSEL)
    pub fn set_hw_trigger(&self, channel: Channel, request: MdmaTransferRequest) {
        self.ch(channel)
            .ctbr
            .write_field(ctbr::TSEL_POS, 6, request as u32);
    }

    /// Hardware request of the channel, or `None` for a reserved `TSEL`
    pub fn hw_trigger(&self, channel: Channel) -> Option<MdmaTransferRequest> {
        MdmaTransferRequest::from_bits(self.ch(channel).ctbr.read_field(ctbr::TSEL_POS, 6))
    }

    /// Set the address written with the mask data when a request is served
    pub fn set_mask_address(&self, channel: Channel, address: u32) {
        self.ch(channel).cmar.write(address);
    }

    /// Mask address
    pub fn mask_address(&self, channel: Channel) -> u32 {
        self.ch(channel).cmar.read()
    }

    /// Set the data written to the mask address when a request is served
    pub fn set_mask_data(&self, channel: Channel, data: u32) {
        self.ch(channel).cmdr.write(data);
    }

    /// Mask data
    pub fn mask_data(&self, channel: Channel) -> u32 {
        self.ch(channel).cmdr.read()
    }
}

/// Status, flags and interrupts
impl<'a> Mdma<'a> {
    /// Direction of the access that caused the last transfer error
    pub fn xfer_error_direction(&self, channel: Channel) -> MdmaErrorDirection {
        if self.ch(channel).cesr.is_set(cesr::TED) {
            MdmaErrorDirection::Write
        } else {
            MdmaErrorDirection::Read
        }
    }

    /// 7 least significant bits of the address that caused the last
    /// transfer error
    pub fn xfer_error_lsb_address(&self, channel: Channel) -> u8 {
        self.ch(channel).cesr.read_bits(cesr::TEA) as u8
    }

    /// Causes of the last transfer error
    pub fn error_flags(&self, channel: Channel) -> ErrorFlags {
        ErrorFlags::from_bits_truncate(self.ch(channel).cesr.read())
    }

    /// True if all the error causes in `flags` are set
    pub fn is_active_error(&self, channel: Channel, flags: ErrorFlags) -> bool {
        self.ch(channel).cesr.is_set(flags.bits())
    }

    /// True if the channel has an interrupt pending (GISR0)
    pub fn is_active_global_interrupt(&self, channel: Channel) -> bool {
        self.rb.gisr0.is_set(1 << channel as u32)
    }

    /// Status flags of the channel
    pub fn flags(&self, channel: Channel) -> ChannelFlags {
        ChannelFlags::from_bits_truncate(self.ch(channel).cisr.read())
    }

    /// True if all the flags in `flags` are set
    pub fn is_active_flag(&self, channel: Channel, flags: ChannelFlags) -> bool {
        self.ch(channel).cisr.is_set(flags.bits())
    }

    /// True while a request is active on the channel (CRQA)
    pub fn is_active_request(&self, channel: Channel) -> bool {
        self.ch(channel).cisr.is_set(cisr::CRQA)
    }

    /// Clear `flags`
    pub fn clear_flags(&self, channel: Channel, flags: ChannelFlags) {
        self.ch(channel).cifcr.write(flags.bits());
    }

    /// Enable the interrupts of `flags`
    pub fn enable_interrupts(&self, channel: Channel, flags: ChannelFlags) {
        self.ch(channel).ccr.set_bits(flags.bits() << ccr::IE_POS);
    }

    /// Disable the interrupts of `flags`
    pub fn disable_interrupts(&self, channel: Channel, flags: ChannelFlags) {
        self.ch(channel).ccr.clear_bits(flags.bits() << ccr::IE_POS);
    }

    /// True if the interrupts of all `flags` are enabled
    pub fn is_enabled_interrupt(&self, channel: Channel, flags: ChannelFlags) -> bool {
        self.ch(channel).ccr.is_set(flags.bits() << ccr::IE_POS)
    }
}
