//! Message type 31: digital radar data, generic format.
//!
//! A radial consists of a 32-byte fixed header followed by a table of data
//! block pointers. Pointers are byte offsets from the start of the message
//! body and locate volume, elevation and radial metadata blocks plus one
//! block per recorded moment.

use crate::time::modified_julian_to_datetime;
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{trace, warn};

/// Maximum number of data block pointers in the header
const MAX_DATA_BLOCKS: u16 = 10;
const MAX_GATES: u16 = 1840;

/// Moment data carried in a `D` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MomentType {
    Reflectivity,
    Velocity,
    SpectrumWidth,
    DifferentialReflectivity,
    DifferentialPhase,
    CorrelationCoefficient,
    ClutterFilterPower,
}

impl MomentType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "REF" => Some(Self::Reflectivity),
            "VEL" => Some(Self::Velocity),
            "SW " | "SW" => Some(Self::SpectrumWidth),
            "ZDR" => Some(Self::DifferentialReflectivity),
            "PHI" => Some(Self::DifferentialPhase),
            "RHO" => Some(Self::CorrelationCoefficient),
            "CFP" => Some(Self::ClutterFilterPower),
            _ => None,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::Reflectivity => "REF",
            Self::Velocity => "VEL",
            Self::SpectrumWidth => "SW",
            Self::DifferentialReflectivity => "ZDR",
            Self::DifferentialPhase => "PHI",
            Self::CorrelationCoefficient => "RHO",
            Self::ClutterFilterPower => "CFP",
        }
    }
}

impl fmt::Display for MomentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Volume metadata block (`RVOL`).
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDataBlock {
    pub version_major: u8,
    pub version_minor: u8,
    pub latitude: f32,
    pub longitude: f32,
    /// Site height above sea level in meters
    pub site_height: i16,
    pub feedhorn_height: u16,
    pub calibration_constant: f32,
    pub horizontal_shv_tx_power: f32,
    pub vertical_shv_tx_power: f32,
    pub system_differential_reflectivity: f32,
    pub initial_system_differential_phase: f32,
    pub volume_coverage_pattern_number: u16,
    pub processing_status: u16,
}

impl VolumeDataBlock {
    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            version_major: reader.read()?,
            version_minor: reader.read()?,
            latitude: reader.read()?,
            longitude: reader.read()?,
            site_height: reader.read()?,
            feedhorn_height: reader.read()?,
            calibration_constant: reader.read()?,
            horizontal_shv_tx_power: reader.read()?,
            vertical_shv_tx_power: reader.read()?,
            system_differential_reflectivity: reader.read()?,
            initial_system_differential_phase: reader.read()?,
            volume_coverage_pattern_number: reader.read()?,
            processing_status: reader.read()?,
        })
    }
}

/// Elevation metadata block (`RELV`).
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationDataBlock {
    /// Atmospheric attenuation factor in 0.001 dB/km
    pub atmospheric_attenuation: i16,
    pub calibration_constant: f32,
}

impl ElevationDataBlock {
    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            atmospheric_attenuation: reader.read()?,
            calibration_constant: reader.read()?,
        })
    }
}

/// Radial metadata block (`RRAD`).
#[derive(Debug, Clone, PartialEq)]
pub struct RadialDataBlock {
    /// Unambiguous range in 0.1 km
    pub unambiguous_range_raw: u16,
    pub horizontal_noise_level: f32,
    pub vertical_noise_level: f32,
    /// Nyquist velocity in 0.01 m/s
    pub nyquist_velocity_raw: u16,
    pub radial_flags: u16,
    pub horizontal_calibration_constant: f32,
    pub vertical_calibration_constant: f32,
}

impl RadialDataBlock {
    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            unambiguous_range_raw: reader.read()?,
            horizontal_noise_level: reader.read()?,
            vertical_noise_level: reader.read()?,
            nyquist_velocity_raw: reader.read()?,
            radial_flags: reader.read()?,
            horizontal_calibration_constant: reader.read()?,
            vertical_calibration_constant: reader.read()?,
        })
    }

    /// Unambiguous range in km.
    pub fn unambiguous_range(&self) -> f32 {
        self.unambiguous_range_raw as f32 * 0.1
    }

    /// Nyquist velocity in m/s.
    pub fn nyquist_velocity(&self) -> f32 {
        self.nyquist_velocity_raw as f32 * 0.01
    }
}

/// Raw gate values of a moment, stored at their wire width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MomentData {
    Byte(Vec<u8>),
    Word(Vec<u16>),
}

impl MomentData {
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Word(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, gate: usize) -> Option<u16> {
        match self {
            Self::Byte(v) => v.get(gate).map(|&b| b as u16),
            Self::Word(v) => v.get(gate).copied(),
        }
    }
}

/// One moment (`DREF`, `DVEL`, ...) along a radial.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentDataBlock {
    pub moment: MomentType,
    pub number_of_gates: u16,
    /// Range to the center of the first gate in meters
    pub data_moment_range: i16,
    /// Gate spacing in meters
    pub data_moment_range_sample_interval: u16,
    pub tover: u16,
    /// SNR threshold in 0.125 dB
    pub snr_threshold: i16,
    pub control_flags: u8,
    pub data_word_size: u8,
    pub scale: f32,
    pub offset: f32,
    pub data: MomentData,
}

impl MomentDataBlock {
    fn decode(moment: MomentType, reader: &mut WireReader) -> DecodeResult<Self> {
        reader.skip(4)?;
        let number_of_gates: u16 = reader.read()?;
        let data_moment_range: i16 = reader.read()?;
        let data_moment_range_sample_interval: u16 = reader.read()?;
        let tover: u16 = reader.read()?;
        let snr_threshold: i16 = reader.read()?;
        let control_flags: u8 = reader.read()?;
        let data_word_size: u8 = reader.read()?;
        let scale: f32 = reader.read()?;
        let offset: f32 = reader.read()?;

        if number_of_gates > MAX_GATES {
            return Err(DecodeError::invalid_field(
                "number of gates",
                format!("{} exceeds {}", number_of_gates, MAX_GATES),
            ));
        }

        let gates = number_of_gates as usize;
        let data = match data_word_size {
            8 => MomentData::Byte(reader.read_vec(gates)?),
            16 => MomentData::Word(reader.read_vec(gates)?),
            other => {
                return Err(DecodeError::invalid_field(
                    "data word size",
                    format!("{} bits for moment {}", other, moment),
                ))
            }
        };

        Ok(Self {
            moment,
            number_of_gates,
            data_moment_range,
            data_moment_range_sample_interval,
            tover,
            snr_threshold,
            control_flags,
            data_word_size,
            scale,
            offset,
            data,
        })
    }

    /// Range to the first gate in km.
    pub fn first_gate_range(&self) -> f32 {
        self.data_moment_range as f32 * 0.001
    }

    /// Gate spacing in km.
    pub fn gate_spacing(&self) -> f32 {
        self.data_moment_range_sample_interval as f32 * 0.001
    }

    /// Scaled physical value of a gate. Raw values 0 (below threshold) and 1
    /// (range folded) carry no value.
    pub fn value(&self, gate: usize) -> Option<f32> {
        let raw = self.data.get(gate)?;
        if raw < 2 {
            return None;
        }
        if self.scale == 0.0 {
            Some(raw as f32)
        } else {
            Some((raw as f32 - self.offset) / self.scale)
        }
    }
}

/// One radial of generic format radar data.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalRadarData {
    pub radar_identifier: String,
    /// Milliseconds past midnight
    pub collection_time: u32,
    pub modified_julian_date: u16,
    pub azimuth_number: u16,
    pub azimuth_angle: f32,
    pub compression_indicator: u8,
    pub radial_length: u16,
    pub azimuth_resolution_spacing: u8,
    pub radial_status: u8,
    pub elevation_number: u8,
    pub cut_sector_number: u8,
    pub elevation_angle: f32,
    pub radial_spot_blanking_status: u8,
    pub azimuth_indexing_mode: u8,
    pub volume: Option<VolumeDataBlock>,
    pub elevation: Option<ElevationDataBlock>,
    pub radial: Option<RadialDataBlock>,
    pub moments: Vec<MomentDataBlock>,
}

impl DigitalRadarData {
    pub fn decode(reader: &mut WireReader, data_size: usize) -> DecodeResult<Self> {
        trace!("Decoding Digital Radar Data Generic Format (Message Type 31)");
        let start = reader.position();

        let mut radial = Self {
            radar_identifier: reader.read_trimmed_string(4)?,
            collection_time: reader.read()?,
            modified_julian_date: reader.read()?,
            azimuth_number: reader.read()?,
            azimuth_angle: reader.read()?,
            compression_indicator: reader.read()?,
            radial_length: {
                reader.skip(1)?;
                reader.read()?
            },
            azimuth_resolution_spacing: reader.read()?,
            radial_status: reader.read()?,
            elevation_number: reader.read()?,
            cut_sector_number: reader.read()?,
            elevation_angle: reader.read()?,
            radial_spot_blanking_status: reader.read()?,
            azimuth_indexing_mode: reader.read()?,
            volume: None,
            elevation: None,
            radial: None,
            moments: Vec::new(),
        };
        let data_block_count: u16 = reader.read()?;

        if radial.compression_indicator != 0 {
            return Err(DecodeError::UnsupportedCompression(format!(
                "radial compression indicator {}",
                radial.compression_indicator
            )));
        }
        if data_block_count == 0 || data_block_count > MAX_DATA_BLOCKS {
            warn!(data_block_count, "Invalid data block count");
            return Err(DecodeError::invalid_field(
                "data block count",
                format!("{} not in 1..={}", data_block_count, MAX_DATA_BLOCKS),
            ));
        }

        let pointers: Vec<u32> = reader.read_vec(data_block_count as usize)?;
        let mut consumed = reader.position() - start;

        for pointer in pointers.into_iter().filter(|&p| p != 0) {
            let pointer = pointer as usize;
            if pointer + 4 > data_size {
                warn!(pointer, data_size, "Data block pointer outside message");
                return Err(DecodeError::invalid_field(
                    "data block pointer",
                    format!("{} beyond message size {}", pointer, data_size),
                ));
            }
            reader.seek(start + pointer)?;
            let block_end = radial.decode_block(reader)?;
            consumed = consumed.max(block_end - start);
        }

        reader.seek(start + consumed)?;
        reader.validate_message(consumed, data_size)?;
        Ok(radial)
    }

    /// Decodes the block at the reader position, returning its end offset.
    fn decode_block(&mut self, reader: &mut WireReader) -> DecodeResult<usize> {
        let block_start = reader.position();
        let block_type: u8 = reader.read()?;
        let name = reader.read_string(3)?;

        match (block_type, name.as_str()) {
            (b'R', "VOL") => {
                let size: u16 = reader.read()?;
                self.volume = Some(VolumeDataBlock::decode(reader)?);
                Ok(block_end(block_start, size, reader.position()))
            }
            (b'R', "ELV") => {
                let size: u16 = reader.read()?;
                self.elevation = Some(ElevationDataBlock::decode(reader)?);
                Ok(block_end(block_start, size, reader.position()))
            }
            (b'R', "RAD") => {
                let size: u16 = reader.read()?;
                self.radial = Some(RadialDataBlock::decode(reader)?);
                Ok(block_end(block_start, size, reader.position()))
            }
            (b'D', moment_name) => match MomentType::from_name(moment_name) {
                Some(moment) => {
                    self.moments.push(MomentDataBlock::decode(moment, reader)?);
                    Ok(reader.position())
                }
                None => {
                    warn!(block = %moment_name, "Unknown moment data block");
                    Ok(reader.position())
                }
            },
            (other, _) => {
                warn!(block_type = other, name = %name, "Unknown data block type");
                Ok(reader.position())
            }
        }
    }

    pub fn moment(&self, moment: MomentType) -> Option<&MomentDataBlock> {
        self.moments.iter().find(|m| m.moment == moment)
    }

    pub fn collection_timestamp(&self) -> DateTime<Utc> {
        modified_julian_to_datetime(self.modified_julian_date as u32, self.collection_time)
    }

    pub fn volume_coverage_pattern_number(&self) -> Option<u16> {
        self.volume.as_ref().map(|v| v.volume_coverage_pattern_number)
    }
}

fn block_end(block_start: usize, declared_size: u16, position: usize) -> usize {
    position.max(block_start + declared_size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radial_payload(gates: u16, word_size: u8) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"KTLX");
        out.extend_from_slice(&3_600_000u32.to_be_bytes());
        out.extend_from_slice(&19294u16.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&0.25f32.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&[1, 0, 1, 1]);
        out.extend_from_slice(&0.5f32.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&2u16.to_be_bytes());

        let vol_ptr = 40u32;
        let ref_ptr = vol_ptr + 44;
        out.extend_from_slice(&vol_ptr.to_be_bytes());
        out.extend_from_slice(&ref_ptr.to_be_bytes());

        out.extend_from_slice(b"RVOL");
        out.extend_from_slice(&44u16.to_be_bytes());
        out.extend_from_slice(&[2, 0]);
        out.extend_from_slice(&35.333f32.to_be_bytes());
        out.extend_from_slice(&(-97.278f32).to_be_bytes());
        out.extend_from_slice(&370i16.to_be_bytes());
        out.extend_from_slice(&20u16.to_be_bytes());
        for _ in 0..5 {
            out.extend_from_slice(&0f32.to_be_bytes());
        }
        out.extend_from_slice(&212u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());

        out.extend_from_slice(b"DREF");
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&gates.to_be_bytes());
        out.extend_from_slice(&2125i16.to_be_bytes());
        out.extend_from_slice(&250u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&16i16.to_be_bytes());
        out.push(0);
        out.push(word_size);
        out.extend_from_slice(&2.0f32.to_be_bytes());
        out.extend_from_slice(&66.0f32.to_be_bytes());
        for g in 0..gates {
            match word_size {
                8 => out.push(g as u8),
                _ => out.extend_from_slice(&g.to_be_bytes()),
            }
        }
        out
    }

    #[test]
    fn test_decode_radial() {
        let payload = radial_payload(100, 8);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        let radial = DigitalRadarData::decode(&mut reader, size).unwrap();

        assert_eq!(radial.radar_identifier, "KTLX");
        assert_eq!(radial.azimuth_angle, 0.25);
        assert_eq!(radial.elevation_angle, 0.5);
        assert_eq!(radial.volume_coverage_pattern_number(), Some(212));
        assert_eq!(reader.position(), size);

        let reflectivity = radial.moment(MomentType::Reflectivity).unwrap();
        assert_eq!(reflectivity.number_of_gates, 100);
        assert_eq!(reflectivity.first_gate_range(), 2.125);
        assert_eq!(reflectivity.value(0), None);
        assert_eq!(reflectivity.value(1), None);
        assert_eq!(reflectivity.value(70), Some(2.0));
        assert!(radial.moment(MomentType::Velocity).is_none());
    }

    #[test]
    fn test_decode_word_moment() {
        let payload = radial_payload(10, 16);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        let radial = DigitalRadarData::decode(&mut reader, size).unwrap();
        let reflectivity = radial.moment(MomentType::Reflectivity).unwrap();
        assert!(matches!(reflectivity.data, MomentData::Word(_)));
        assert_eq!(reflectivity.data.get(9), Some(9));
    }

    #[test]
    fn test_collection_timestamp() {
        let payload = radial_payload(1, 8);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        let radial = DigitalRadarData::decode(&mut reader, size).unwrap();
        assert_eq!(
            radial.collection_timestamp().to_rfc3339(),
            "2022-10-28T01:00:00+00:00"
        );
    }

    #[test]
    fn test_invalid_word_size() {
        let payload = radial_payload(4, 12);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        assert!(DigitalRadarData::decode(&mut reader, size).is_err());
    }

    #[test]
    fn test_pointer_beyond_message() {
        let payload = radial_payload(4, 8);
        let mut reader = WireReader::new(payload);
        assert!(DigitalRadarData::decode(&mut reader, 60).is_err());
    }
}
