//! Linked-list transfer descriptors
//!
//! At the end of a transfer the MDMA reloads the channel registers from the
//! node at the link address (`CLAR`), then continues with the new
//! configuration. A node with a zero link address ends the list.
//!
//! The MDMA follows link addresses on its own, so a node handed to it must
//! never move or be dropped. [`LinkNode::connect`] and
//! [`Mdma::set_link_node`] only accept `'static` nodes.
//!
//! ```rust,ignore
//! let first: &'static mut LinkNode =
//!     cortex_m::singleton!(: LinkNode = LinkNode::new(&config_a)?).unwrap();
//! let second: &'static LinkNode =
//!     cortex_m::singleton!(: LinkNode = LinkNode::new(&config_b)?).unwrap();
//! LinkNode::connect(first, second);
//!
//! mdma.init(Channel::Ch0, &config_a)?;
//! mdma.set_link_node(Channel::Ch0, first);
//! ```

use super::{cbndtr, ctcr, Channel, InitConfig, Mdma};
use crate::Error;

/// A MDMA linked-list node
///
/// The layout is the one the MDMA reads from memory: the values of CTCR,
/// CBNDTR, CSAR, CDAR, CBRUR, CLAR, CTBR, a reserved word, CMAR and CMDR.
/// Nodes handed to the MDMA are `'static` and must sit at an address the
/// MDMA can reach.
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkNode {
    ctcr: u32,
    cbndtr: u32,
    csar: u32,
    cdar: u32,
    cbrur: u32,
    clar: u32,
    ctbr: u32,
    reserved: u32,
    cmar: u32,
    cmdr: u32,
}

impl LinkNode {
    /// Create a node from a channel configuration
    pub fn new(config: &InitConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(LinkNode {
            ctcr: config.ctcr(),
            cbndtr: config.cbndtr(),
            csar: config.source_address,
            cdar: config.destination_address,
            cbrur: config.cbrur(),
            clar: config.link_address,
            ctbr: config.ctbr(),
            reserved: 0,
            cmar: config.mask_address,
            cmdr: config.mask_data,
        })
    }

    /// Address of this node, as seen by the MDMA
    pub fn address(&self) -> u32 {
        self as *const LinkNode as u32
    }

    /// Make `next` follow `prev`
    pub fn connect(prev: &mut LinkNode, next: &'static LinkNode) {
        prev.clar = next.address();
    }

    /// Make `node` the last of its list
    pub fn disconnect_next(node: &mut LinkNode) {
        node.clar = 0;
    }

    /// Address of the next node. 0 if this is the last node
    pub fn next_address(&self) -> u32 {
        self.clar
    }

    /// True if no node follows this one
    pub fn is_last(&self) -> bool {
        self.clar == 0
    }

    /// Block data length loaded by this node
    pub fn blk_data_length(&self) -> u32 {
        self.cbndtr & cbndtr::BNDT
    }

    /// Buffer transfer length loaded by this node
    pub fn buffer_transfer_length(&self) -> u8 {
        ((self.ctcr & ctcr::TLEN) >> ctcr::TLEN_POS) as u8
    }
}

impl<'a> Mdma<'a> {
    /// Load `node` at the end of the current transfer
    pub fn set_link_node(&self, channel: Channel, node: &'static LinkNode) {
        self.set_link_address(channel, node.address());
    }
}
