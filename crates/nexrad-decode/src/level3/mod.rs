//! NEXRAD Level III (RPG) graphic product decoding.
//!
//! A product is an 18-byte message header, a product description block and
//! up to three optional blocks located by halfword offsets: symbology,
//! graphic alphanumeric and tabular alphanumeric.

pub mod blocks;
pub mod description;
pub mod factory;
pub mod file;
pub mod message_header;
pub mod packets;
pub mod tables;

pub use blocks::{GraphicAlphanumericBlock, GraphicPage, SymbologyBlock, SymbologyLayer, TabularAlphanumericBlock};
pub use description::{
    ProductDescriptionBlock, COMPRESSION_BZIP2, COMPRESSION_NONE, PRODUCT_DESCRIPTION_BLOCK_SIZE,
};
pub use factory::{Level3Message, Level3MessageFactory, GRAPHIC_PRODUCT_CODES};
pub use file::Level3File;
pub use message_header::{Level3MessageHeader, LEVEL3_HEADER_SIZE};
pub use packets::{Packet, PacketFactory};
pub use tables::{product_info, DataLevelCode, LevelEncoding, ProductInfo};
