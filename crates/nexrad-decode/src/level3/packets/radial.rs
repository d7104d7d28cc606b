//! Radial image packets.
//!
//! Packet 0xAF1F carries run-length encoded radials with 16 levels. Packet 16
//! carries one byte per range bin with 256 levels.

use super::{check_range, read_packet_code, DIGITAL_RADIAL_DATA_ARRAY, RADIAL_DATA};
use crate::wire::WireReader;
use crate::DecodeResult;
use tracing::trace;

const MAX_RANGE_BINS: u16 = 1840;
const MAX_RADIALS: u16 = 720;

/// One radial of levels, indexed by range bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Radial {
    /// Tenths of a degree
    pub start_angle: i16,
    /// Tenths of a degree
    pub angle_delta: i16,
    pub levels: Vec<u8>,
}

impl Radial {
    pub fn start_angle_degrees(&self) -> f32 {
        self.start_angle as f32 * 0.1
    }

    pub fn angle_delta_degrees(&self) -> f32 {
        self.angle_delta as f32 * 0.1
    }
}

/// Fields shared by both radial packet layouts.
#[derive(Debug, Clone, Copy)]
struct RadialHeader {
    index_of_first_range_bin: u16,
    number_of_range_bins: u16,
    i_center_of_sweep: i16,
    j_center_of_sweep: i16,
    range_scale_factor: u16,
    number_of_radials: u16,
}

impl RadialHeader {
    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let header = Self {
            index_of_first_range_bin: reader.read()?,
            number_of_range_bins: reader.read()?,
            i_center_of_sweep: reader.read()?,
            j_center_of_sweep: reader.read()?,
            range_scale_factor: reader.read()?,
            number_of_radials: reader.read()?,
        };
        check_range("number of range bins", header.number_of_range_bins, 1, MAX_RANGE_BINS)?;
        check_range("number of radials", header.number_of_radials, 1, MAX_RADIALS)?;
        Ok(header)
    }
}

/// Packet 0xAF1F
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadialDataPacket {
    pub packet_code: u16,
    pub index_of_first_range_bin: u16,
    pub number_of_range_bins: u16,
    pub i_center_of_sweep: i16,
    pub j_center_of_sweep: i16,
    /// Thousandths of a screen pixel per range bin
    pub scale_factor: u16,
    pub number_of_radials: u16,
    pub radials: Vec<Radial>,
    pub data_size: usize,
}

impl RadialDataPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, &[RADIAL_DATA])?;
        let header = RadialHeader::decode(reader)?;
        let bins = header.number_of_range_bins as usize;

        let mut radials = Vec::with_capacity(header.number_of_radials as usize);
        for _ in 0..header.number_of_radials {
            let number_of_halfwords: u16 = reader.read()?;
            let start_angle: i16 = reader.read()?;
            let angle_delta: i16 = reader.read()?;
            let runs = reader.read_bytes(number_of_halfwords as usize * 2)?;

            let mut levels = Vec::with_capacity(bins);
            for &run in runs.iter() {
                let count = (run >> 4) as usize;
                let level = run & 0x0F;
                let take = count.min(bins - levels.len());
                levels.extend(std::iter::repeat(level).take(take));
            }
            if levels.len() < bins {
                trace!(expanded = levels.len(), bins, "Radial shorter than range bin count");
            }

            radials.push(Radial {
                start_angle,
                angle_delta,
                levels,
            });
        }

        let data_size = reader.position() - start;
        reader.validate_message(data_size, data_size)?;

        Ok(Self {
            packet_code,
            index_of_first_range_bin: header.index_of_first_range_bin,
            number_of_range_bins: header.number_of_range_bins,
            i_center_of_sweep: header.i_center_of_sweep,
            j_center_of_sweep: header.j_center_of_sweep,
            scale_factor: header.range_scale_factor,
            number_of_radials: header.number_of_radials,
            radials,
            data_size,
        })
    }
}

/// Packet 16
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalRadialDataArrayPacket {
    pub packet_code: u16,
    pub index_of_first_range_bin: u16,
    pub number_of_range_bins: u16,
    pub i_center_of_sweep: i16,
    pub j_center_of_sweep: i16,
    pub range_scale_factor: u16,
    pub number_of_radials: u16,
    pub radials: Vec<Radial>,
    pub data_size: usize,
}

impl DigitalRadialDataArrayPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, &[DIGITAL_RADIAL_DATA_ARRAY])?;
        let header = RadialHeader::decode(reader)?;
        let bins = header.number_of_range_bins as usize;

        let mut radials = Vec::with_capacity(header.number_of_radials as usize);
        for _ in 0..header.number_of_radials {
            let number_of_bytes: u16 = reader.read()?;
            let start_angle: i16 = reader.read()?;
            let angle_delta: i16 = reader.read()?;
            let data = reader.read_bytes(number_of_bytes as usize)?;

            // Odd bin counts are padded to a halfword
            let levels = data[..data.len().min(bins)].to_vec();

            radials.push(Radial {
                start_angle,
                angle_delta,
                levels,
            });
        }

        let data_size = reader.position() - start;
        reader.validate_message(data_size, data_size)?;

        Ok(Self {
            packet_code,
            index_of_first_range_bin: header.index_of_first_range_bin,
            number_of_range_bins: header.number_of_range_bins,
            i_center_of_sweep: header.i_center_of_sweep,
            j_center_of_sweep: header.j_center_of_sweep,
            range_scale_factor: header.range_scale_factor,
            number_of_radials: header.number_of_radials,
            radials,
            data_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(code: u16, bins: u16, radials: u16) -> Vec<u8> {
        [code, 0, bins, 0, 0, 999, radials]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect()
    }

    #[test]
    fn test_run_length_radials() {
        let mut bytes = header(0xAF1F, 8, 2);
        // 5 of level 3, 3 of level 7
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.extend_from_slice(&10i16.to_be_bytes());
        bytes.extend_from_slice(&[0x53, 0x37]);
        // Runs past the bin count are clipped
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&10i16.to_be_bytes());
        bytes.extend_from_slice(&10i16.to_be_bytes());
        bytes.extend_from_slice(&[0xF1, 0x00]);

        let mut reader = WireReader::new(bytes);
        let packet = RadialDataPacket::decode(&mut reader).unwrap();
        assert_eq!(packet.radials.len(), 2);
        assert_eq!(packet.radials[0].levels, vec![3, 3, 3, 3, 3, 7, 7, 7]);
        assert_eq!(packet.radials[1].levels, vec![1; 8]);
        assert!((packet.radials[1].start_angle_degrees() - 1.0).abs() < 1e-6);
        assert_eq!(packet.data_size, 14 + 2 * (6 + 2));
    }

    #[test]
    fn test_digital_radials() {
        let mut bytes = header(16, 3, 1);
        bytes.extend_from_slice(&4u16.to_be_bytes());
        bytes.extend_from_slice(&3595i16.to_be_bytes());
        bytes.extend_from_slice(&10i16.to_be_bytes());
        bytes.extend_from_slice(&[0, 1, 200, 0]);

        let mut reader = WireReader::new(bytes);
        let packet = DigitalRadialDataArrayPacket::decode(&mut reader).unwrap();
        assert_eq!(packet.radials[0].levels, vec![0, 1, 200]);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_zero_radials_rejected() {
        let mut reader = WireReader::new(header(16, 3, 0));
        assert!(DigitalRadialDataArrayPacket::decode(&mut reader).is_err());
    }

    #[test]
    fn test_truncated_radial_rejected() {
        let mut bytes = header(16, 3, 1);
        bytes.extend_from_slice(&4u16.to_be_bytes());
        let mut reader = WireReader::new(bytes);
        assert!(DigitalRadialDataArrayPacket::decode(&mut reader).unwrap_err().is_truncation());
    }
}
