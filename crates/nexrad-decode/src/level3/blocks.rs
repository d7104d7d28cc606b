//! Symbology, graphic alphanumeric and tabular alphanumeric blocks.
//!
//! Each block starts with a divider, a block id and its length in bytes. The
//! symbology block is split into layers and the graphic block into pages,
//! each holding a run of packets within its own byte extent. A packet that
//! fails to decode ends its layer or page; decoding resumes at the next one.

use super::description::ProductDescriptionBlock;
use super::message_header::Level3MessageHeader;
use super::packets::{Packet, PacketFactory};
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use tracing::{debug, trace, warn};

const BLOCK_DIVIDER: i16 = -1;
const BLOCK_HEADER_SIZE: usize = 8;

pub const SYMBOLOGY_BLOCK_ID: i16 = 1;
pub const GRAPHIC_ALPHANUMERIC_BLOCK_ID: i16 = 2;
pub const TABULAR_ALPHANUMERIC_BLOCK_ID: i16 = 3;

const MAX_LAYERS: u16 = 18;
const MAX_PAGES: u16 = 48;
const MAX_LINE_CHARACTERS: i16 = 80;
const END_OF_PAGE: i16 = -1;

fn read_block_header(reader: &mut WireReader, expected_id: i16) -> DecodeResult<u32> {
    let divider: i16 = reader.read()?;
    let block_id: i16 = reader.read()?;
    let length_of_block: u32 = reader.read()?;

    if divider != BLOCK_DIVIDER {
        return Err(DecodeError::invalid_field(
            "block divider",
            format!("expected -1, found {}", divider),
        ));
    }
    if block_id != expected_id {
        return Err(DecodeError::invalid_field(
            "block id",
            format!("expected {}, found {}", expected_id, block_id),
        ));
    }
    if (length_of_block as usize) < BLOCK_HEADER_SIZE {
        return Err(DecodeError::invalid_field(
            "block length",
            format!("{} is shorter than the block header", length_of_block),
        ));
    }
    Ok(length_of_block)
}

/// Decodes packets until `extent` is used up or a packet fails.
fn read_packets(extent: &mut WireReader) -> Vec<Packet> {
    let mut packets = Vec::new();
    while !extent.is_at_end() {
        match PacketFactory::create(extent) {
            Ok(packet) => {
                trace!(packet_code = packet.packet_code(), size = packet.data_size(), "Decoded packet");
                packets.push(packet);
            }
            Err(e) => {
                warn!(
                    offset = extent.position(),
                    remaining = extent.remaining(),
                    error = %e,
                    "Abandoning remaining packets"
                );
                break;
            }
        }
    }
    packets
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbologyLayer {
    pub length_of_layer: u32,
    pub packets: Vec<Packet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbologyBlock {
    pub length_of_block: u32,
    pub number_of_layers: u16,
    pub layers: Vec<SymbologyLayer>,
}

impl SymbologyBlock {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let length_of_block = read_block_header(reader, SYMBOLOGY_BLOCK_ID)?;
        let number_of_layers: u16 = reader.read()?;

        if number_of_layers == 0 || number_of_layers > MAX_LAYERS {
            return Err(DecodeError::invalid_field(
                "number of layers",
                format!("{} is outside 1..={}", number_of_layers, MAX_LAYERS),
            ));
        }

        let mut layers = Vec::with_capacity(number_of_layers as usize);
        for layer in 0..number_of_layers {
            let divider: i16 = reader.read()?;
            if divider != BLOCK_DIVIDER {
                return Err(DecodeError::invalid_field(
                    "layer divider",
                    format!("expected -1, found {} in layer {}", divider, layer),
                ));
            }
            let length_of_layer: u32 = reader.read()?;
            let mut extent = reader.sub_reader(length_of_layer as usize)?;
            let packets = read_packets(&mut extent);
            debug!(layer, length_of_layer, packets = packets.len(), "Read symbology layer");
            layers.push(SymbologyLayer {
                length_of_layer,
                packets,
            });
        }

        reader.validate_message(reader.position() - start, length_of_block as usize)?;

        Ok(Self {
            length_of_block,
            number_of_layers,
            layers,
        })
    }

    /// All packets across every layer, in order.
    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.layers.iter().flat_map(|layer| layer.packets.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicPage {
    pub page_number: u16,
    pub length_of_page: u16,
    pub packets: Vec<Packet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicAlphanumericBlock {
    pub length_of_block: u32,
    pub number_of_pages: u16,
    pub pages: Vec<GraphicPage>,
}

impl GraphicAlphanumericBlock {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let length_of_block = read_block_header(reader, GRAPHIC_ALPHANUMERIC_BLOCK_ID)?;
        let number_of_pages: u16 = reader.read()?;

        if number_of_pages == 0 || number_of_pages > MAX_PAGES {
            return Err(DecodeError::invalid_field(
                "number of pages",
                format!("{} is outside 1..={}", number_of_pages, MAX_PAGES),
            ));
        }

        let mut pages = Vec::with_capacity(number_of_pages as usize);
        for _ in 0..number_of_pages {
            let page_number: u16 = reader.read()?;
            let length_of_page: u16 = reader.read()?;
            let mut extent = reader.sub_reader(length_of_page as usize)?;
            let packets = read_packets(&mut extent);
            debug!(page_number, length_of_page, packets = packets.len(), "Read graphic page");
            pages.push(GraphicPage {
                page_number,
                length_of_page,
                packets,
            });
        }

        reader.validate_message(reader.position() - start, length_of_block as usize)?;

        Ok(Self {
            length_of_block,
            number_of_pages,
            pages,
        })
    }
}

/// Text pages preceded by a copy of the product's header and description.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularAlphanumericBlock {
    pub length_of_block: u32,
    pub header: Level3MessageHeader,
    pub description: ProductDescriptionBlock,
    pub number_of_pages: u16,
    pub pages: Vec<Vec<String>>,
}

impl TabularAlphanumericBlock {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let length_of_block = read_block_header(reader, TABULAR_ALPHANUMERIC_BLOCK_ID)?;
        let header = Level3MessageHeader::decode(reader)?;
        let description = ProductDescriptionBlock::decode(reader)?;

        let divider: i16 = reader.read()?;
        if divider != BLOCK_DIVIDER {
            return Err(DecodeError::invalid_field(
                "page divider",
                format!("expected -1, found {}", divider),
            ));
        }

        let number_of_pages: u16 = reader.read()?;
        if number_of_pages == 0 || number_of_pages > MAX_PAGES {
            return Err(DecodeError::invalid_field(
                "number of pages",
                format!("{} is outside 1..={}", number_of_pages, MAX_PAGES),
            ));
        }

        let mut pages = Vec::with_capacity(number_of_pages as usize);
        for page in 0..number_of_pages {
            let mut lines = Vec::new();
            loop {
                let number_of_characters: i16 = reader.read()?;
                if number_of_characters == END_OF_PAGE {
                    break;
                }
                if !(0..=MAX_LINE_CHARACTERS).contains(&number_of_characters) {
                    return Err(DecodeError::invalid_field(
                        "line length",
                        format!("{} characters on page {}", number_of_characters, page + 1),
                    ));
                }
                lines.push(reader.read_string(number_of_characters as usize)?);
            }
            pages.push(lines);
        }

        reader.validate_message(reader.position() - start, length_of_block as usize)?;

        Ok(Self {
            length_of_block,
            header,
            description,
            number_of_pages,
            pages,
        })
    }
}
