//! Complete channel configuration

use embedded_dma::{ReadBuffer, WriteBuffer};

use super::{
    cbndtr, cbrur, ccr, ctbr, ctcr, BlockRepeatUpdate, Channel, Endianness,
    FieldValue, Mdma, MdmaBurstSize, MdmaBus, MdmaDataAlignment, MdmaIncMode,
    MdmaRequestMode, MdmaSize, MdmaTransferRequest, MdmaTrigger, Priority,
    MAX_BLOCK_DATA_LENGTH, MAX_BLOCK_REPEAT_COUNT, MAX_BUFFER_TRANSFER_LENGTH,
};
use crate::rcc::rec::ResetEnable;
use crate::Error;

/// Contains the complete set of configuration for a MDMA channel.
///
/// The default configuration transfers single bytes from fixed addresses,
/// requested by hardware on `DMA1` stream 0 transfer complete, one buffer
/// per request. Every address and length is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitConfig {
    pub(crate) source_address: u32,
    pub(crate) destination_address: u32,
    pub(crate) byte_endianness: Endianness,
    pub(crate) half_word_endianness: Endianness,
    pub(crate) word_endianness: Endianness,
    pub(crate) priority: Priority,
    pub(crate) bufferable_write: bool,
    pub(crate) request_mode: MdmaRequestMode,
    pub(crate) trigger_mode: MdmaTrigger,
    pub(crate) padding_alignment: MdmaDataAlignment,
    pub(crate) packing: bool,
    pub(crate) buffer_transfer_length: u8,
    pub(crate) destination_burst_size: MdmaBurstSize,
    pub(crate) source_burst_size: MdmaBurstSize,
    pub(crate) destination_inc_size: MdmaSize,
    pub(crate) source_inc_size: MdmaSize,
    pub(crate) destination_data_size: MdmaSize,
    pub(crate) source_data_size: MdmaSize,
    pub(crate) destination_inc_mode: MdmaIncMode,
    pub(crate) source_inc_mode: MdmaIncMode,
    pub(crate) blk_repeat_count: u16,
    pub(crate) blk_repeat_dest_addr_update: BlockRepeatUpdate,
    pub(crate) blk_repeat_src_addr_update: BlockRepeatUpdate,
    pub(crate) link_address: u32,
    pub(crate) blk_data_length: u32,
    pub(crate) blk_rpt_src_addr_update_value: u16,
    pub(crate) blk_rpt_dest_addr_update_value: u16,
    pub(crate) hw_trigger: MdmaTransferRequest,
    pub(crate) destination_bus: MdmaBus,
    pub(crate) source_bus: MdmaBus,
    pub(crate) mask_address: u32,
    pub(crate) mask_data: u32,
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig {
            source_address: 0,
            destination_address: 0,
            byte_endianness: Endianness::Preserve,
            half_word_endianness: Endianness::Preserve,
            word_endianness: Endianness::Preserve,
            priority: Priority::Low,
            bufferable_write: false,
            request_mode: MdmaRequestMode::Hardware,
            trigger_mode: MdmaTrigger::Buffer,
            padding_alignment: MdmaDataAlignment::Right,
            packing: false,
            buffer_transfer_length: 0,
            destination_burst_size: MdmaBurstSize::SINGLE,
            source_burst_size: MdmaBurstSize::SINGLE,
            destination_inc_size: MdmaSize::Byte,
            source_inc_size: MdmaSize::Byte,
            destination_data_size: MdmaSize::Byte,
            source_data_size: MdmaSize::Byte,
            destination_inc_mode: MdmaIncMode::Fixed,
            source_inc_mode: MdmaIncMode::Fixed,
            blk_repeat_count: 0,
            blk_repeat_dest_addr_update: BlockRepeatUpdate::Increment,
            blk_repeat_src_addr_update: BlockRepeatUpdate::Increment,
            link_address: 0,
            blk_data_length: 0,
            blk_rpt_src_addr_update_value: 0,
            blk_rpt_dest_addr_update_value: 0,
            hw_trigger: MdmaTransferRequest::Dma1Tcif0,
            destination_bus: MdmaBus::System,
            source_bus: MdmaBus::System,
            mask_address: 0,
            mask_data: 0,
        }
    }
}

impl InitConfig {
    /// Set the source and destination addresses
    #[inline(always)]
    #[must_use]
    pub fn addresses(mut self, source: u32, destination: u32) -> Self {
        self.source_address = source;
        self.destination_address = destination;
        self
    }
    /// Set the byte, half word and word endianness exchanges. Each applies
    /// only when the destination data size is larger than its element
    #[inline(always)]
    #[must_use]
    pub fn endianness(
        mut self,
        byte: Endianness,
        half_word: Endianness,
        word: Endianness,
    ) -> Self {
        self.byte_endianness = byte;
        self.half_word_endianness = half_word;
        self.word_endianness = word;
        self
    }
    /// Set the priority
    #[inline(always)]
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
    /// Make destination writes bufferable
    #[inline(always)]
    #[must_use]
    pub fn bufferable_write(mut self, bufferable: bool) -> Self {
        self.bufferable_write = bufferable;
        self
    }
    /// Set whether requests come from hardware or software
    #[inline(always)]
    #[must_use]
    pub fn request_mode(mut self, mode: MdmaRequestMode) -> Self {
        self.request_mode = mode;
        self
    }
    /// Sets the trigger mode. If the trigger mode is `Buffer`, then the MDMA
    /// must be repeatedly triggered to complete a block transfer.
    #[inline(always)]
    #[must_use]
    pub fn trigger_mode(mut self, trigger: MdmaTrigger) -> Self {
        self.trigger_mode = trigger;
        self
    }
    /// Set the padding and alignment used when the source data size is
    /// smaller than the destination data size
    #[inline(always)]
    #[must_use]
    pub fn padding_alignment(mut self, alignment: MdmaDataAlignment) -> Self {
        self.padding_alignment = alignment;
        self
    }
    /// Pack or unpack source data into the destination data size
    #[inline(always)]
    #[must_use]
    pub fn packing(mut self, packing: bool) -> Self {
        self.packing = packing;
        self
    }
    /// Sets the buffer transfer length field. Each buffer is `length + 1`
    /// bytes, and must be a multiple of both the source and destination
    /// sizes.
    #[inline(always)]
    #[must_use]
    pub fn buffer_transfer_length(mut self, length: u8) -> Self {
        self.buffer_transfer_length = length;
        self
    }
    /// Set the destination burst size
    #[inline(always)]
    #[must_use]
    pub fn destination_burst_size(
        mut self,
        burst_size: impl Into<MdmaBurstSize>,
    ) -> Self {
        self.destination_burst_size = burst_size.into();
        self
    }
    /// Set the source burst size
    #[inline(always)]
    #[must_use]
    pub fn source_burst_size(
        mut self,
        burst_size: impl Into<MdmaBurstSize>,
    ) -> Self {
        self.source_burst_size = burst_size.into();
        self
    }
    /// Set the destination data size, increment mode and increment offset
    /// size
    #[inline(always)]
    #[must_use]
    pub fn destination(
        mut self,
        data_size: MdmaSize,
        inc_mode: MdmaIncMode,
        inc_size: MdmaSize,
    ) -> Self {
        self.destination_data_size = data_size;
        self.destination_inc_mode = inc_mode;
        self.destination_inc_size = inc_size;
        self
    }
    /// Set the source data size, increment mode and increment offset size
    #[inline(always)]
    #[must_use]
    pub fn source(
        mut self,
        data_size: MdmaSize,
        inc_mode: MdmaIncMode,
        inc_size: MdmaSize,
    ) -> Self {
        self.source_data_size = data_size;
        self.source_inc_mode = inc_mode;
        self.source_inc_size = inc_size;
        self
    }
    /// Set the number of bytes in a block, up to 65536
    #[inline(always)]
    #[must_use]
    pub fn block_data_length(mut self, bytes: u32) -> Self {
        self.blk_data_length = bytes;
        self
    }
    /// Set the number of block repetitions, up to 4095, and how the
    /// addresses are updated after each block
    #[inline(always)]
    #[must_use]
    pub fn block_repeat(
        mut self,
        count: u16,
        source_update: BlockRepeatUpdate,
        source_value: u16,
        destination_update: BlockRepeatUpdate,
        destination_value: u16,
    ) -> Self {
        self.blk_repeat_count = count;
        self.blk_repeat_src_addr_update = source_update;
        self.blk_rpt_src_addr_update_value = source_value;
        self.blk_repeat_dest_addr_update = destination_update;
        self.blk_rpt_dest_addr_update_value = destination_value;
        self
    }
    /// Set the address of the first [`LinkNode`](super::LinkNode). 0 is no
    /// linked list
    #[inline(always)]
    #[must_use]
    pub fn link_address(mut self, address: u32) -> Self {
        self.link_address = address;
        self
    }
    /// Sets a hardware transfer request line. Unlike DMA1/DMA2, it is valid to
    /// use the same hardware transfer request line for multiple channels
    #[inline(always)]
    #[must_use]
    pub fn hw_trigger(mut self, request: MdmaTransferRequest) -> Self {
        self.hw_trigger = request;
        self
    }
    /// Set the buses of the source and destination
    #[inline(always)]
    #[must_use]
    pub fn buses(mut self, source: MdmaBus, destination: MdmaBus) -> Self {
        self.source_bus = source;
        self.destination_bus = destination;
        self
    }
    /// Write `data` to `address` each time a request is served
    #[inline(always)]
    #[must_use]
    pub fn mask(mut self, address: u32, data: u32) -> Self {
        self.mask_address = address;
        self.mask_data = data;
        self
    }

    /// Use `buffer` as the source. Sets the source address, data size and
    /// increment, and the block data length if it is not already shorter
    ///
    /// # Safety
    ///
    /// The buffer must stay valid and unmodified until the transfers using
    /// this configuration are complete.
    pub unsafe fn with_source_buffer<B: ReadBuffer>(
        mut self,
        buffer: &B,
    ) -> Result<Self, Error> {
        let size = MdmaSize::from_type::<B::Word>()?;
        let (ptr, len) = buffer.read_buffer();

        self.source_address = ptr as u32;
        self.source_data_size = size;
        self.source_inc_size = size;
        self.source_inc_mode = MdmaIncMode::Increment;
        self.block_length_from_buffer(len * size.n_bytes())
    }

    /// Use `buffer` as the destination. Sets the destination address, data
    /// size and increment, and the block data length if it is not already
    /// shorter
    ///
    /// # Safety
    ///
    /// The buffer must stay valid, and must not be accessed, until the
    /// transfers using this configuration are complete.
    pub unsafe fn with_destination_buffer<B: WriteBuffer>(
        mut self,
        buffer: &mut B,
    ) -> Result<Self, Error> {
        let size = MdmaSize::from_type::<B::Word>()?;
        let (ptr, len) = buffer.write_buffer();

        self.destination_address = ptr as u32;
        self.destination_data_size = size;
        self.destination_inc_size = size;
        self.destination_inc_mode = MdmaIncMode::Increment;
        self.block_length_from_buffer(len * size.n_bytes())
    }

    fn block_length_from_buffer(mut self, bytes: usize) -> Result<Self, Error> {
        if bytes > MAX_BLOCK_DATA_LENGTH as usize {
            return Err(Error::BlockDataLength);
        }
        let bytes = bytes as u32;
        if self.blk_data_length == 0 || bytes < self.blk_data_length {
            self.blk_data_length = bytes;
        }
        Ok(self)
    }

    /// Check every length and count against its register field
    pub fn validate(&self) -> Result<(), Error> {
        if self.buffer_transfer_length > MAX_BUFFER_TRANSFER_LENGTH {
            return Err(Error::BufferTransferLength);
        }
        if self.blk_data_length > MAX_BLOCK_DATA_LENGTH {
            return Err(Error::BlockDataLength);
        }
        if self.blk_repeat_count > MAX_BLOCK_REPEAT_COUNT {
            return Err(Error::BlockRepeatCount);
        }
        Ok(())
    }

    /// CTCR value of this configuration, without the buffer transfer
    /// length. See [`Mdma::config_transfer`]
    pub fn transfer_configuration(&self) -> u32 {
        let mut bits = self.source_inc_mode.into_bits() << ctcr::SINC_POS
            | self.destination_inc_mode.into_bits() << ctcr::DINC_POS
            | self.source_data_size.into_bits() << ctcr::SSIZE_POS
            | self.destination_data_size.into_bits() << ctcr::DSIZE_POS
            | self.source_inc_size.into_bits() << ctcr::SINCOS_POS
            | self.destination_inc_size.into_bits() << ctcr::DINCOS_POS
            | self.source_burst_size.into_bits() << ctcr::SBURST_POS
            | self.destination_burst_size.into_bits() << ctcr::DBURST_POS
            | self.padding_alignment.into_bits() << ctcr::PAM_POS
            | self.trigger_mode.into_bits() << ctcr::TRGM_POS
            | self.request_mode.into_bits() << ctcr::SWRM_POS;
        if self.packing {
            bits |= ctcr::PKE;
        }
        if self.bufferable_write {
            bits |= ctcr::BWM;
        }
        bits
    }

    pub(crate) fn ctcr(&self) -> u32 {
        self.transfer_configuration()
            | ((self.buffer_transfer_length as u32) << ctcr::TLEN_POS) & ctcr::TLEN
    }

    pub(crate) fn cbndtr(&self) -> u32 {
        ((self.blk_repeat_count as u32) << cbndtr::BRC_POS) & cbndtr::BRC
            | self.blk_repeat_dest_addr_update.into_bits() << cbndtr::BRDUM_POS
            | self.blk_repeat_src_addr_update.into_bits() << cbndtr::BRSUM_POS
            | self.blk_data_length & cbndtr::BNDT
    }

    pub(crate) fn cbrur(&self) -> u32 {
        (self.blk_rpt_dest_addr_update_value as u32) << cbrur::DUV_POS
            | self.blk_rpt_src_addr_update_value as u32
    }

    pub(crate) fn ctbr(&self) -> u32 {
        self.destination_bus.into_bits() << ctbr::DBUS_POS
            | self.source_bus.into_bits() << ctbr::SBUS_POS
            | (self.hw_trigger as u32) << ctbr::TSEL_POS
    }

    fn ccr(&self) -> u32 {
        self.word_endianness.into_bits() << ccr::WEX_POS
            | self.half_word_endianness.into_bits() << ccr::HEX_POS
            | self.byte_endianness.into_bits() << ccr::BEX_POS
            | self.priority.into_bits() << ccr::PL_POS
    }
}

const CCR_CONFIG: u32 =
    0b111 << ccr::BEX_POS | 0b11 << ccr::PL_POS;
const CIFCR_ALL: u32 = 0x1F;

impl<'a> Mdma<'a> {
    /// Write a complete channel configuration. The channel should be
    /// disabled
    ///
    /// Interrupt enables and the channel enable are left unchanged.
    pub fn init(&self, channel: Channel, config: &InitConfig) -> Result<(), Error> {
        config.validate()?;
        log::debug!("MDMA {:?}: init {:?}", channel, config);

        let ch = self.ch(channel);
        ch.ccr.modify_bits(CCR_CONFIG, config.ccr());
        self.config_transfer(
            channel,
            config.transfer_configuration(),
            config.buffer_transfer_length,
        )?;
        ch.cbndtr.write(config.cbndtr());
        ch.csar.write(config.source_address);
        ch.cdar.write(config.destination_address);
        ch.cbrur.write(config.cbrur());
        ch.clar.write(config.link_address);
        ch.ctbr.write(config.ctbr());
        ch.cmar.write(config.mask_address);
        ch.cmdr.write(config.mask_data);
        Ok(())
    }

    /// Disable the channel, return its registers to their reset values
    /// and clear its flags
    pub fn deinit(&self, channel: Channel) {
        log::trace!("MDMA {:?}: deinit", channel);

        self.disable_channel(channel);

        let ch = self.ch(channel);
        for reg in [
            &ch.ccr, &ch.ctcr, &ch.cbndtr, &ch.csar, &ch.cdar, &ch.cbrur,
            &ch.clar, &ch.ctbr, &ch.cmar, &ch.cmdr,
        ] {
            reg.write(0);
        }
        ch.cifcr.write(CIFCR_ALL);
    }

    /// Reset every channel through the MDMA peripheral reset
    #[must_use]
    pub fn deinit_all(self) -> Self {
        log::debug!("MDMA: reset all channels");

        let Mdma { rb, rec } = self;
        Mdma {
            rb,
            rec: rec.reset(),
        }
    }
}
