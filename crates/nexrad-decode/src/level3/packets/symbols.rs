//! Fixed-size symbol records repeated over a length-prefixed block.

use super::{
    read_packet_code, CORRELATED_SHEAR, ETVS_SYMBOL, HAIL_POSITIVE, HAIL_PROBABLE, HDA_HAIL, MESOCYCLONE,
    POINT_FEATURE, STI_CIRCLE, STORM_ID, TVS_SYMBOL, VECTOR_ARROW, WIND_BARB,
};
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};

/// One fixed-size record of a symbol packet.
pub trait SymbolRecord: Sized {
    /// Packet codes whose payload is a run of this record
    const CODES: &'static [u16];
    /// Encoded record size in bytes
    const SIZE: usize;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self>;
}

/// A packet whose block is a sequence of identical records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolPacket<T> {
    pub packet_code: u16,
    /// Bytes following this field
    pub length_of_block: u16,
    pub symbols: Vec<T>,
}

impl<T: SymbolRecord> SymbolPacket<T> {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, T::CODES)?;
        let length_of_block: u16 = reader.read()?;

        let length = length_of_block as usize;
        if length % T::SIZE != 0 {
            return Err(DecodeError::invalid_field(
                "symbol block length",
                format!("{} is not a multiple of the {}-byte record", length, T::SIZE),
            ));
        }

        let symbols = (0..length / T::SIZE)
            .map(|_| T::decode(reader))
            .collect::<DecodeResult<Vec<_>>>()?;

        reader.validate_message(reader.position() - start, 4 + length)?;

        Ok(Self {
            packet_code,
            length_of_block,
            symbols,
        })
    }

    pub fn data_size(&self) -> usize {
        4 + self.length_of_block as usize
    }
}

/// Packets 3 and 11
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MesocycloneSymbol {
    pub i_position: i16,
    pub j_position: i16,
    pub radius_of_mesocyclone: i16,
}

impl SymbolRecord for MesocycloneSymbol {
    const CODES: &'static [u16] = &[MESOCYCLONE, CORRELATED_SHEAR];
    const SIZE: usize = 6;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i_position: reader.read()?,
            j_position: reader.read()?,
            radius_of_mesocyclone: reader.read()?,
        })
    }
}

/// Packet 4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindBarb {
    pub color_level: u16,
    pub x_coordinate: i16,
    pub y_coordinate: i16,
    /// Degrees
    pub wind_direction: u16,
    /// Knots
    pub wind_speed: u16,
}

impl SymbolRecord for WindBarb {
    const CODES: &'static [u16] = &[WIND_BARB];
    const SIZE: usize = 10;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            color_level: reader.read()?,
            x_coordinate: reader.read()?,
            y_coordinate: reader.read()?,
            wind_direction: reader.read()?,
            wind_speed: reader.read()?,
        })
    }
}

/// Packet 5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorArrow {
    pub i_coordinate: i16,
    pub j_coordinate: i16,
    pub direction_of_arrow: u16,
    pub arrow_length: u16,
    pub arrow_head_length: u16,
}

impl SymbolRecord for VectorArrow {
    const CODES: &'static [u16] = &[VECTOR_ARROW];
    const SIZE: usize = 10;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i_coordinate: reader.read()?,
            j_coordinate: reader.read()?,
            direction_of_arrow: reader.read()?,
            arrow_length: reader.read()?,
            arrow_head_length: reader.read()?,
        })
    }
}

/// Packets 12 (TVS), 13 (hail positive), 14 (hail probable) and 26 (ETVS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointGraphicSymbol {
    pub i_position: i16,
    pub j_position: i16,
}

impl SymbolRecord for PointGraphicSymbol {
    const CODES: &'static [u16] = &[TVS_SYMBOL, HAIL_POSITIVE, HAIL_PROBABLE, ETVS_SYMBOL];
    const SIZE: usize = 4;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i_position: reader.read()?,
            j_position: reader.read()?,
        })
    }
}

/// Packet 15
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StormIdSymbol {
    pub i_position: i16,
    pub j_position: i16,
    pub storm_id: String,
}

impl SymbolRecord for StormIdSymbol {
    const CODES: &'static [u16] = &[STORM_ID];
    const SIZE: usize = 6;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i_position: reader.read()?,
            j_position: reader.read()?,
            storm_id: reader.read_string(2)?,
        })
    }
}

/// Packet 19
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdaHailSymbol {
    pub i_position: i16,
    pub j_position: i16,
    /// Percent, or -999 when not computed
    pub probability_of_hail: i16,
    pub probability_of_severe_hail: i16,
    /// Inches
    pub max_hail_size: u16,
}

impl SymbolRecord for HdaHailSymbol {
    const CODES: &'static [u16] = &[HDA_HAIL];
    const SIZE: usize = 10;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i_position: reader.read()?,
            j_position: reader.read()?,
            probability_of_hail: reader.read()?,
            probability_of_severe_hail: reader.read()?,
            max_hail_size: reader.read()?,
        })
    }
}

/// Packet 20
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFeatureSymbol {
    pub i_position: i16,
    pub j_position: i16,
    pub point_feature_type: u16,
    pub point_feature_attribute: u16,
}

impl SymbolRecord for PointFeatureSymbol {
    const CODES: &'static [u16] = &[POINT_FEATURE];
    const SIZE: usize = 8;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i_position: reader.read()?,
            j_position: reader.read()?,
            point_feature_type: reader.read()?,
            point_feature_attribute: reader.read()?,
        })
    }
}

/// Packet 25
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StiCircleSymbol {
    pub i_position: i16,
    pub j_position: i16,
    pub radius_of_circle: i16,
}

impl SymbolRecord for StiCircleSymbol {
    const CODES: &'static [u16] = &[STI_CIRCLE];
    const SIZE: usize = 6;

    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i_position: reader.read()?,
            j_position: reader.read()?,
            radius_of_circle: reader.read()?,
        })
    }
}

pub type MesocycloneSymbolPacket = SymbolPacket<MesocycloneSymbol>;
pub type WindBarbDataPacket = SymbolPacket<WindBarb>;
pub type VectorArrowDataPacket = SymbolPacket<VectorArrow>;
pub type PointGraphicSymbolPacket = SymbolPacket<PointGraphicSymbol>;
pub type StormIdSymbolPacket = SymbolPacket<StormIdSymbol>;
pub type HdaHailSymbolPacket = SymbolPacket<HdaHailSymbol>;
pub type PointFeatureSymbolPacket = SymbolPacket<PointFeatureSymbol>;
pub type StiCircleSymbolPacket = SymbolPacket<StiCircleSymbol>;
