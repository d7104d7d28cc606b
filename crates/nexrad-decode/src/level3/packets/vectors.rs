//! Linked, unlinked and contour vector packets.

use super::{
    read_packet_code, LINKED_CONTOUR_VECTOR, LINKED_VECTOR_NO_VALUE, LINKED_VECTOR_WITH_VALUE, SET_COLOR_LEVEL,
    UNLINKED_CONTOUR_VECTOR, UNLINKED_VECTOR_NO_VALUE, UNLINKED_VECTOR_WITH_VALUE,
};
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};

const INITIAL_POINT_INDICATOR: u16 = 0x8000;
const COLOR_VALUE_INDICATOR: u16 = 0x0002;

/// Screen coordinate in 1/4 km units relative to the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub i: i16,
    pub j: i16,
}

impl Point {
    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            i: reader.read()?,
            j: reader.read()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub start: Point,
    pub end: Point,
}

impl Vector {
    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            start: Point::decode(reader)?,
            end: Point::decode(reader)?,
        })
    }
}

fn read_points(reader: &mut WireReader, bytes: usize) -> DecodeResult<Vec<Point>> {
    if bytes % 4 != 0 {
        return Err(DecodeError::invalid_field(
            "vector length",
            format!("{} is not a whole number of points", bytes),
        ));
    }
    (0..bytes / 4).map(|_| Point::decode(reader)).collect()
}

fn read_vectors(reader: &mut WireReader, bytes: usize) -> DecodeResult<Vec<Vector>> {
    if bytes % 8 != 0 {
        return Err(DecodeError::invalid_field(
            "vector length",
            format!("{} is not a whole number of vectors", bytes),
        ));
    }
    (0..bytes / 8).map(|_| Vector::decode(reader)).collect()
}

/// Packets 6 and 9: a polyline from a start point through each end point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedVectorPacket {
    pub packet_code: u16,
    pub length_of_block: u16,
    /// Color level, present only on packet 9
    pub value_of_vector: Option<u16>,
    pub start: Point,
    pub end_points: Vec<Point>,
}

impl LinkedVectorPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start_offset = reader.position();
        let packet_code = read_packet_code(reader, &[LINKED_VECTOR_NO_VALUE, LINKED_VECTOR_WITH_VALUE])?;
        let length_of_block: u16 = reader.read()?;

        let header_size = if packet_code == LINKED_VECTOR_WITH_VALUE { 6 } else { 4 };
        let length = length_of_block as usize;
        if length < header_size {
            return Err(DecodeError::invalid_field(
                "linked vector length",
                format!("{} is shorter than the {}-byte header", length, header_size),
            ));
        }

        let value_of_vector = if packet_code == LINKED_VECTOR_WITH_VALUE {
            Some(reader.read()?)
        } else {
            None
        };
        let start = Point::decode(reader)?;
        let end_points = read_points(reader, length - header_size)?;

        reader.validate_message(reader.position() - start_offset, 4 + length)?;

        Ok(Self {
            packet_code,
            length_of_block,
            value_of_vector,
            start,
            end_points,
        })
    }

    pub fn data_size(&self) -> usize {
        4 + self.length_of_block as usize
    }

    /// The polyline as individual segments.
    pub fn segments(&self) -> impl Iterator<Item = Vector> + '_ {
        std::iter::once(self.start)
            .chain(self.end_points.iter().copied())
            .zip(self.end_points.iter().copied())
            .map(|(start, end)| Vector { start, end })
    }
}

/// Packets 7 and 10: independent line segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkedVectorPacket {
    pub packet_code: u16,
    pub length_of_block: u16,
    /// Color level, present only on packet 10
    pub value_of_vector: Option<u16>,
    pub vectors: Vec<Vector>,
}

impl UnlinkedVectorPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, &[UNLINKED_VECTOR_NO_VALUE, UNLINKED_VECTOR_WITH_VALUE])?;
        let length_of_block: u16 = reader.read()?;

        let header_size = if packet_code == UNLINKED_VECTOR_WITH_VALUE { 2 } else { 0 };
        let length = length_of_block as usize;
        if length < header_size {
            return Err(DecodeError::invalid_field(
                "unlinked vector length",
                format!("{} is shorter than the {}-byte header", length, header_size),
            ));
        }

        let value_of_vector = if packet_code == UNLINKED_VECTOR_WITH_VALUE {
            Some(reader.read()?)
        } else {
            None
        };
        let vectors = read_vectors(reader, length - header_size)?;

        reader.validate_message(reader.position() - start, 4 + length)?;

        Ok(Self {
            packet_code,
            length_of_block,
            value_of_vector,
            vectors,
        })
    }

    pub fn data_size(&self) -> usize {
        4 + self.length_of_block as usize
    }
}

/// Packet 0x0802: color level applied to following contour vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetColorLevelPacket {
    pub packet_code: u16,
    pub color_value_indicator: u16,
    pub value_of_contour: u16,
}

impl SetColorLevelPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let packet_code = read_packet_code(reader, &[SET_COLOR_LEVEL])?;
        let color_value_indicator: u16 = reader.read()?;
        let value_of_contour: u16 = reader.read()?;

        if color_value_indicator != COLOR_VALUE_INDICATOR {
            return Err(DecodeError::invalid_field(
                "color value indicator",
                format!("expected {:#06x}, found {:#06x}", COLOR_VALUE_INDICATOR, color_value_indicator),
            ));
        }

        Ok(Self {
            packet_code,
            color_value_indicator,
            value_of_contour,
        })
    }

    pub fn data_size(&self) -> usize {
        6
    }
}

/// Packet 0x0E03
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedContourVectorPacket {
    pub packet_code: u16,
    pub initial_point_indicator: u16,
    pub start: Point,
    /// Bytes of end points following this field
    pub length_of_vectors: u16,
    pub end_points: Vec<Point>,
}

impl LinkedContourVectorPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start_offset = reader.position();
        let packet_code = read_packet_code(reader, &[LINKED_CONTOUR_VECTOR])?;
        let initial_point_indicator: u16 = reader.read()?;
        let start = Point::decode(reader)?;
        let length_of_vectors: u16 = reader.read()?;

        if initial_point_indicator != INITIAL_POINT_INDICATOR {
            return Err(DecodeError::invalid_field(
                "initial point indicator",
                format!("expected {:#06x}, found {:#06x}", INITIAL_POINT_INDICATOR, initial_point_indicator),
            ));
        }

        let end_points = read_points(reader, length_of_vectors as usize)?;
        reader.validate_message(reader.position() - start_offset, 10 + length_of_vectors as usize)?;

        Ok(Self {
            packet_code,
            initial_point_indicator,
            start,
            length_of_vectors,
            end_points,
        })
    }

    pub fn data_size(&self) -> usize {
        10 + self.length_of_vectors as usize
    }
}

/// Packet 0x3501
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkedContourVectorPacket {
    pub packet_code: u16,
    pub length_of_vectors: u16,
    pub vectors: Vec<Vector>,
}

impl UnlinkedContourVectorPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, &[UNLINKED_CONTOUR_VECTOR])?;
        let length_of_vectors: u16 = reader.read()?;
        let vectors = read_vectors(reader, length_of_vectors as usize)?;

        reader.validate_message(reader.position() - start, 4 + length_of_vectors as usize)?;

        Ok(Self {
            packet_code,
            length_of_vectors,
            vectors,
        })
    }

    pub fn data_size(&self) -> usize {
        4 + self.length_of_vectors as usize
    }
}
