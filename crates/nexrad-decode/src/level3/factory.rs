//! Level III message assembly.

use super::blocks::{GraphicAlphanumericBlock, SymbologyBlock, TabularAlphanumericBlock};
use super::description::{
    ProductDescriptionBlock, COMPRESSION_BZIP2, COMPRESSION_NONE, PRODUCT_DESCRIPTION_BLOCK_SIZE,
};
use super::message_header::{Level3MessageHeader, LEVEL3_HEADER_SIZE};
use super::packets::Packet;
use crate::compression::decompress_bzip2;
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use bytes::BytesMut;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

/// Message codes of graphic products, which carry a product description block.
pub const GRAPHIC_PRODUCT_CODES: RangeInclusive<i16> = 16..=299;

/// A decoded graphic product.
#[derive(Debug, Clone, PartialEq)]
pub struct Level3Message {
    pub header: Level3MessageHeader,
    pub description: ProductDescriptionBlock,
    pub symbology: Option<SymbologyBlock>,
    pub graphic: Option<GraphicAlphanumericBlock>,
    pub tabular: Option<TabularAlphanumericBlock>,
}

impl Level3Message {
    pub fn product_code(&self) -> i16 {
        self.description.product_code
    }

    /// Symbology packets across every layer, in order.
    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.symbology.iter().flat_map(|block| block.packets())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Level3MessageFactory;

impl Level3MessageFactory {
    /// Decodes one Level III message starting at the reader's position.
    ///
    /// On success the reader is left at the end of the message's declared
    /// length.
    pub fn create(reader: &mut WireReader) -> DecodeResult<Level3Message> {
        let message_start = reader.position();
        let header = Level3MessageHeader::decode(reader)?;

        if !GRAPHIC_PRODUCT_CODES.contains(&header.message_code) {
            warn!(message_code = header.message_code, "Unsupported Level III message code");
            return Err(DecodeError::UnsupportedProduct(header.message_code));
        }

        let description = ProductDescriptionBlock::decode(reader)?;
        debug!(
            message_code = header.message_code,
            product_code = description.product_code,
            length = header.length_of_message,
            "Read product description block"
        );

        let message_end = message_start + header.length_of_message as usize;

        let (symbology, graphic, tabular) = match description.compression_method() {
            COMPRESSION_NONE => read_blocks(reader, message_start, &description)?,
            COMPRESSION_BZIP2 => {
                let mut expanded = expand_product(reader, message_start, message_end.min(reader.len()), &description)?;
                read_blocks(&mut expanded, 0, &description)?
            }
            method => {
                return Err(DecodeError::UnsupportedCompression(format!(
                    "compression method {} in product {}",
                    method, description.product_code
                )))
            }
        };

        if message_end <= reader.len() {
            reader.seek(message_end)?;
        } else {
            warn!(
                declared = header.length_of_message,
                available = reader.len() - message_start,
                "Level III message shorter than its declared length"
            );
            reader.seek(reader.len())?;
        }

        Ok(Level3Message {
            header,
            description,
            symbology,
            graphic,
            tabular,
        })
    }
}

type Blocks = (
    Option<SymbologyBlock>,
    Option<GraphicAlphanumericBlock>,
    Option<TabularAlphanumericBlock>,
);

fn read_blocks(reader: &mut WireReader, message_start: usize, description: &ProductDescriptionBlock) -> DecodeResult<Blocks> {
    let symbology = read_block(reader, message_start, description.offset_to_symbology, SymbologyBlock::decode)?;
    let graphic = read_block(
        reader,
        message_start,
        description.offset_to_graphic,
        GraphicAlphanumericBlock::decode,
    )?;
    let tabular = read_block(
        reader,
        message_start,
        description.offset_to_tabular,
        TabularAlphanumericBlock::decode,
    )?;
    Ok((symbology, graphic, tabular))
}

/// Rebuilds an uncompressed product from a message whose data after the
/// description block is bzip2-compressed. Block offsets in the description
/// block refer to the uncompressed layout.
fn expand_product(
    reader: &mut WireReader,
    message_start: usize,
    message_end: usize,
    description: &ProductDescriptionBlock,
) -> DecodeResult<WireReader> {
    reader.seek(message_start)?;
    let raw = reader.read_bytes(message_end.saturating_sub(message_start))?;

    let header_size = LEVEL3_HEADER_SIZE + PRODUCT_DESCRIPTION_BLOCK_SIZE;
    let compressed = raw.get(header_size..).unwrap_or_default();
    let body = decompress_bzip2(compressed)?;
    debug!(
        product_code = description.product_code,
        compressed = compressed.len(),
        decompressed = body.len(),
        declared = description.uncompressed_size(),
        "Decompressed product data"
    );

    let mut expanded = BytesMut::with_capacity(header_size + body.len());
    expanded.extend_from_slice(&raw[..header_size.min(raw.len())]);
    expanded.extend_from_slice(&body);
    Ok(WireReader::new(expanded.freeze()))
}

/// Decodes the block at a halfword offset from the message start. A zero
/// offset means the block is absent.
fn read_block<T>(
    reader: &mut WireReader,
    message_start: usize,
    offset_halfwords: u32,
    decode: fn(&mut WireReader) -> DecodeResult<T>,
) -> DecodeResult<Option<T>> {
    if offset_halfwords == 0 {
        return Ok(None);
    }

    let offset = offset_halfwords as usize * 2;
    if offset < LEVEL3_HEADER_SIZE + PRODUCT_DESCRIPTION_BLOCK_SIZE {
        return Err(DecodeError::invalid_field(
            "block offset",
            format!("{} halfwords points inside the product header", offset_halfwords),
        ));
    }

    reader.seek(message_start + offset)?;
    decode(reader).map(Some)
}
