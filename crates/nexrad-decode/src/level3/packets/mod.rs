//! Level III display packets.
//!
//! Every packet starts with a 16-bit code. [`PacketFactory`] peeks the code,
//! dispatches to the matching decoder and hands back a [`Packet`].

mod radial;
mod raster;
mod symbols;
mod text;
mod vectors;

pub use radial::{DigitalRadialDataArrayPacket, Radial, RadialDataPacket};
pub use raster::{DigitalRasterDataArrayPacket, RasterDataPacket, MAX_RASTER_BINS};
pub use symbols::{
    HdaHailSymbol, HdaHailSymbolPacket, MesocycloneSymbol, MesocycloneSymbolPacket, PointFeatureSymbol,
    PointFeatureSymbolPacket, PointGraphicSymbol, PointGraphicSymbolPacket, StiCircleSymbol,
    StiCircleSymbolPacket, StormIdSymbol, StormIdSymbolPacket, SymbolPacket, SymbolRecord, VectorArrow,
    VectorArrowDataPacket, WindBarb, WindBarbDataPacket,
};
pub use text::TextAndSpecialSymbolPacket;
pub use vectors::{
    LinkedContourVectorPacket, LinkedVectorPacket, Point, SetColorLevelPacket, UnlinkedContourVectorPacket,
    UnlinkedVectorPacket, Vector,
};

use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use tracing::{trace, warn};

pub const TEXT_NO_VALUE: u16 = 1;
pub const SPECIAL_SYMBOL: u16 = 2;
pub const MESOCYCLONE: u16 = 3;
pub const WIND_BARB: u16 = 4;
pub const VECTOR_ARROW: u16 = 5;
pub const LINKED_VECTOR_NO_VALUE: u16 = 6;
pub const UNLINKED_VECTOR_NO_VALUE: u16 = 7;
pub const TEXT_WITH_VALUE: u16 = 8;
pub const LINKED_VECTOR_WITH_VALUE: u16 = 9;
pub const UNLINKED_VECTOR_WITH_VALUE: u16 = 10;
pub const CORRELATED_SHEAR: u16 = 11;
pub const TVS_SYMBOL: u16 = 12;
pub const HAIL_POSITIVE: u16 = 13;
pub const HAIL_PROBABLE: u16 = 14;
pub const STORM_ID: u16 = 15;
pub const DIGITAL_RADIAL_DATA_ARRAY: u16 = 16;
pub const HDA_HAIL: u16 = 19;
pub const POINT_FEATURE: u16 = 20;
pub const STI_CIRCLE: u16 = 25;
pub const ETVS_SYMBOL: u16 = 26;
pub const DIGITAL_RASTER_DATA_ARRAY: u16 = 33;
pub const SET_COLOR_LEVEL: u16 = 0x0802;
pub const LINKED_CONTOUR_VECTOR: u16 = 0x0E03;
pub const UNLINKED_CONTOUR_VECTOR: u16 = 0x3501;
pub const RADIAL_DATA: u16 = 0xAF1F;
pub const RASTER_DATA_7: u16 = 0xBA07;
pub const RASTER_DATA_F: u16 = 0xBA0F;

/// A decoded display packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    TextAndSpecialSymbol(TextAndSpecialSymbolPacket),
    MesocycloneSymbol(MesocycloneSymbolPacket),
    WindBarbData(WindBarbDataPacket),
    VectorArrowData(VectorArrowDataPacket),
    LinkedVector(LinkedVectorPacket),
    UnlinkedVector(UnlinkedVectorPacket),
    PointGraphicSymbol(PointGraphicSymbolPacket),
    StormIdSymbol(StormIdSymbolPacket),
    DigitalRadialDataArray(DigitalRadialDataArrayPacket),
    HdaHailSymbol(HdaHailSymbolPacket),
    PointFeatureSymbol(PointFeatureSymbolPacket),
    StiCircleSymbol(StiCircleSymbolPacket),
    DigitalRasterDataArray(DigitalRasterDataArrayPacket),
    SetColorLevel(SetColorLevelPacket),
    LinkedContourVector(LinkedContourVectorPacket),
    UnlinkedContourVector(UnlinkedContourVectorPacket),
    RadialData(RadialDataPacket),
    RasterData(RasterDataPacket),
}

impl Packet {
    pub fn packet_code(&self) -> u16 {
        match self {
            Self::TextAndSpecialSymbol(p) => p.packet_code,
            Self::MesocycloneSymbol(p) => p.packet_code,
            Self::WindBarbData(p) => p.packet_code,
            Self::VectorArrowData(p) => p.packet_code,
            Self::LinkedVector(p) => p.packet_code,
            Self::UnlinkedVector(p) => p.packet_code,
            Self::PointGraphicSymbol(p) => p.packet_code,
            Self::StormIdSymbol(p) => p.packet_code,
            Self::DigitalRadialDataArray(p) => p.packet_code,
            Self::HdaHailSymbol(p) => p.packet_code,
            Self::PointFeatureSymbol(p) => p.packet_code,
            Self::StiCircleSymbol(p) => p.packet_code,
            Self::DigitalRasterDataArray(p) => p.packet_code,
            Self::SetColorLevel(p) => p.packet_code,
            Self::LinkedContourVector(p) => p.packet_code,
            Self::UnlinkedContourVector(p) => p.packet_code,
            Self::RadialData(p) => p.packet_code,
            Self::RasterData(p) => p.packet_code,
        }
    }

    /// Encoded length of the packet in bytes, including its code.
    pub fn data_size(&self) -> usize {
        match self {
            Self::TextAndSpecialSymbol(p) => p.data_size(),
            Self::MesocycloneSymbol(p) => p.data_size(),
            Self::WindBarbData(p) => p.data_size(),
            Self::VectorArrowData(p) => p.data_size(),
            Self::LinkedVector(p) => p.data_size(),
            Self::UnlinkedVector(p) => p.data_size(),
            Self::PointGraphicSymbol(p) => p.data_size(),
            Self::StormIdSymbol(p) => p.data_size(),
            Self::DigitalRadialDataArray(p) => p.data_size,
            Self::HdaHailSymbol(p) => p.data_size(),
            Self::PointFeatureSymbol(p) => p.data_size(),
            Self::StiCircleSymbol(p) => p.data_size(),
            Self::DigitalRasterDataArray(p) => p.data_size,
            Self::SetColorLevel(p) => p.data_size(),
            Self::LinkedContourVector(p) => p.data_size(),
            Self::UnlinkedContourVector(p) => p.data_size(),
            Self::RadialData(p) => p.data_size,
            Self::RasterData(p) => p.data_size,
        }
    }
}

/// Dispatches packet decoding on the 16-bit packet code.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketFactory;

impl PacketFactory {
    /// True if `code` has a decoder.
    pub fn is_supported(code: u16) -> bool {
        matches!(
            code,
            TEXT_NO_VALUE
                | SPECIAL_SYMBOL
                | TEXT_WITH_VALUE
                | MESOCYCLONE
                | CORRELATED_SHEAR
                | WIND_BARB
                | VECTOR_ARROW
                | LINKED_VECTOR_NO_VALUE
                | LINKED_VECTOR_WITH_VALUE
                | UNLINKED_VECTOR_NO_VALUE
                | UNLINKED_VECTOR_WITH_VALUE
                | TVS_SYMBOL
                | HAIL_POSITIVE
                | HAIL_PROBABLE
                | ETVS_SYMBOL
                | STORM_ID
                | DIGITAL_RADIAL_DATA_ARRAY
                | HDA_HAIL
                | POINT_FEATURE
                | STI_CIRCLE
                | DIGITAL_RASTER_DATA_ARRAY
                | SET_COLOR_LEVEL
                | LINKED_CONTOUR_VECTOR
                | UNLINKED_CONTOUR_VECTOR
                | RADIAL_DATA
                | RASTER_DATA_7
                | RASTER_DATA_F
        )
    }

    /// Decodes the packet at the reader's position.
    ///
    /// Running out of data before the code, or an unsupported code, fails
    /// without advancing the reader. A packet that fails part way through
    /// leaves the reader wherever decoding stopped; callers resynchronize on
    /// the enclosing block's extent.
    pub fn create(reader: &mut WireReader) -> DecodeResult<Packet> {
        let code: u16 = match reader.peek() {
            Some(code) => code,
            None => {
                return Err(DecodeError::Truncated {
                    offset: reader.position(),
                    needed: 2,
                    available: reader.remaining(),
                })
            }
        };

        if !Self::is_supported(code) {
            warn!(packet_code = code, offset = reader.position(), "Unknown packet code");
            return Err(DecodeError::UnknownPacketCode(code));
        }

        trace!(packet_code = code, offset = reader.position(), "Found packet");

        let packet = match code {
            TEXT_NO_VALUE | SPECIAL_SYMBOL | TEXT_WITH_VALUE => {
                Packet::TextAndSpecialSymbol(TextAndSpecialSymbolPacket::decode(reader)?)
            }
            MESOCYCLONE | CORRELATED_SHEAR => Packet::MesocycloneSymbol(SymbolPacket::decode(reader)?),
            WIND_BARB => Packet::WindBarbData(SymbolPacket::decode(reader)?),
            VECTOR_ARROW => Packet::VectorArrowData(SymbolPacket::decode(reader)?),
            LINKED_VECTOR_NO_VALUE | LINKED_VECTOR_WITH_VALUE => {
                Packet::LinkedVector(LinkedVectorPacket::decode(reader)?)
            }
            UNLINKED_VECTOR_NO_VALUE | UNLINKED_VECTOR_WITH_VALUE => {
                Packet::UnlinkedVector(UnlinkedVectorPacket::decode(reader)?)
            }
            TVS_SYMBOL | HAIL_POSITIVE | HAIL_PROBABLE | ETVS_SYMBOL => {
                Packet::PointGraphicSymbol(SymbolPacket::decode(reader)?)
            }
            STORM_ID => Packet::StormIdSymbol(SymbolPacket::decode(reader)?),
            DIGITAL_RADIAL_DATA_ARRAY => {
                Packet::DigitalRadialDataArray(DigitalRadialDataArrayPacket::decode(reader)?)
            }
            HDA_HAIL => Packet::HdaHailSymbol(SymbolPacket::decode(reader)?),
            POINT_FEATURE => Packet::PointFeatureSymbol(SymbolPacket::decode(reader)?),
            STI_CIRCLE => Packet::StiCircleSymbol(SymbolPacket::decode(reader)?),
            DIGITAL_RASTER_DATA_ARRAY => {
                Packet::DigitalRasterDataArray(DigitalRasterDataArrayPacket::decode(reader)?)
            }
            SET_COLOR_LEVEL => Packet::SetColorLevel(SetColorLevelPacket::decode(reader)?),
            LINKED_CONTOUR_VECTOR => Packet::LinkedContourVector(LinkedContourVectorPacket::decode(reader)?),
            UNLINKED_CONTOUR_VECTOR => {
                Packet::UnlinkedContourVector(UnlinkedContourVectorPacket::decode(reader)?)
            }
            RADIAL_DATA => Packet::RadialData(RadialDataPacket::decode(reader)?),
            RASTER_DATA_7 | RASTER_DATA_F => Packet::RasterData(RasterDataPacket::decode(reader)?),
            other => return Err(DecodeError::UnknownPacketCode(other)),
        };

        Ok(packet)
    }
}

/// Reads a packet code and checks it against the codes a decoder accepts.
pub(crate) fn read_packet_code(reader: &mut WireReader, accepted: &[u16]) -> DecodeResult<u16> {
    let code: u16 = reader.read()?;
    if !accepted.contains(&code) {
        return Err(DecodeError::invalid_field(
            "packet code",
            format!("{} is not one of {:?}", code, accepted),
        ));
    }
    Ok(code)
}

/// Checks that a count lies within `min..=max`.
pub(crate) fn check_range(field: &'static str, value: u16, min: u16, max: u16) -> DecodeResult<()> {
    if value < min || value > max {
        return Err(DecodeError::invalid_field(
            field,
            format!("{} is outside {}..={}", value, min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_code_does_not_advance() {
        let mut reader = WireReader::new(vec![0x00, 0x1B, 0x00, 0x00]);
        let err = PacketFactory::create(&mut reader).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownPacketCode(27)));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_end_of_input_does_not_advance() {
        let mut reader = WireReader::new(vec![0x00]);
        let err = PacketFactory::create(&mut reader).unwrap_err();
        assert!(err.is_truncation());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_set_color_level_dispatch() {
        let mut reader = WireReader::new(vec![0x08, 0x02, 0x00, 0x02, 0x00, 0x05]);
        let packet = PacketFactory::create(&mut reader).unwrap();
        assert_eq!(packet.packet_code(), SET_COLOR_LEVEL);
        assert_eq!(packet.data_size(), 6);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_supported_codes() {
        for code in [1, 2, 8, 3, 11, 4, 5, 6, 9, 7, 10, 12, 13, 14, 26, 15, 16, 19, 20, 25, 33] {
            assert!(PacketFactory::is_supported(code), "code {}", code);
        }
        for code in [0x0802, 0x0E03, 0x3501, 0xAF1F, 0xBA07, 0xBA0F] {
            assert!(PacketFactory::is_supported(code), "code {:#x}", code);
        }
        assert!(!PacketFactory::is_supported(17));
        assert!(!PacketFactory::is_supported(28));
    }
}
