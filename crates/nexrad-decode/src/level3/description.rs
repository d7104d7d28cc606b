//! Product description block (halfwords 10-60 of a graphic product).

use super::tables::{self, DataLevelCode, LevelEncoding};
use crate::time::modified_julian_seconds_to_datetime;
use crate::wire::{f32_from_halfwords, WireReader};
use crate::{DecodeError, DecodeResult};
use chrono::{DateTime, Utc};

/// Size of the product description block in bytes.
pub const PRODUCT_DESCRIPTION_BLOCK_SIZE: usize = 102;

pub const COMPRESSION_NONE: u16 = 0;
pub const COMPRESSION_BZIP2: u16 = 1;

const BLOCK_DIVIDER: i16 = -1;

/// Calibration, threshold and layout information for a Level III product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDescriptionBlock {
    pub block_divider: i16,
    /// Latitude in 0.001 degrees
    pub latitude_of_radar: i32,
    /// Longitude in 0.001 degrees
    pub longitude_of_radar: i32,
    /// Height above sea level in feet
    pub height_of_radar: i16,
    pub product_code: i16,
    pub operational_mode: u16,
    pub volume_coverage_pattern: u16,
    pub sequence_number: i16,
    pub volume_scan_number: u16,
    pub volume_scan_date: u16,
    pub volume_scan_start_time: u32,
    pub generation_date_of_product: u16,
    pub generation_time_of_product: u32,
    /// Product dependent halfwords 27, 28, 30, 47-53
    pub product_dependent: [u16; 10],
    pub elevation_number: u16,
    pub data_level_thresholds: [u16; 16],
    pub version: u8,
    pub spot_blank: u8,
    /// Offsets in halfwords from the start of the message
    pub offset_to_symbology: u32,
    pub offset_to_graphic: u32,
    pub offset_to_tabular: u32,
}

impl ProductDescriptionBlock {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();

        let block_divider: i16 = reader.read()?;
        let latitude_of_radar: i32 = reader.read()?;
        let longitude_of_radar: i32 = reader.read()?;
        let height_of_radar: i16 = reader.read()?;
        let product_code: i16 = reader.read()?;
        let operational_mode: u16 = reader.read()?;
        let volume_coverage_pattern: u16 = reader.read()?;
        let sequence_number: i16 = reader.read()?;
        let volume_scan_number: u16 = reader.read()?;
        let volume_scan_date: u16 = reader.read()?;
        let volume_scan_start_time: u32 = reader.read()?;
        let generation_date_of_product: u16 = reader.read()?;
        let generation_time_of_product: u32 = reader.read()?;

        let mut product_dependent = [0u16; 10];
        product_dependent[0] = reader.read()?;
        product_dependent[1] = reader.read()?;
        let elevation_number: u16 = reader.read()?;
        product_dependent[2] = reader.read()?;

        let mut data_level_thresholds = [0u16; 16];
        for threshold in data_level_thresholds.iter_mut() {
            *threshold = reader.read()?;
        }
        for value in product_dependent[3..].iter_mut() {
            *value = reader.read()?;
        }

        let version: u8 = reader.read()?;
        let spot_blank: u8 = reader.read()?;
        let offset_to_symbology: u32 = reader.read()?;
        let offset_to_graphic: u32 = reader.read()?;
        let offset_to_tabular: u32 = reader.read()?;

        if block_divider != BLOCK_DIVIDER {
            return Err(DecodeError::invalid_field(
                "block divider",
                format!("expected -1, found {}", block_divider),
            ));
        }

        reader.validate_message(reader.position() - start, PRODUCT_DESCRIPTION_BLOCK_SIZE)?;

        Ok(Self {
            block_divider,
            latitude_of_radar,
            longitude_of_radar,
            height_of_radar,
            product_code,
            operational_mode,
            volume_coverage_pattern,
            sequence_number,
            volume_scan_number,
            volume_scan_date,
            volume_scan_start_time,
            generation_date_of_product,
            generation_time_of_product,
            product_dependent,
            elevation_number,
            data_level_thresholds,
            version,
            spot_blank,
            offset_to_symbology,
            offset_to_graphic,
            offset_to_tabular,
        })
    }

    pub fn latitude(&self) -> f32 {
        self.latitude_of_radar as f32 * 0.001
    }

    pub fn longitude(&self) -> f32 {
        self.longitude_of_radar as f32 * 0.001
    }

    pub fn volume_scan_start(&self) -> DateTime<Utc> {
        modified_julian_seconds_to_datetime(self.volume_scan_date, self.volume_scan_start_time)
    }

    pub fn generation_time(&self) -> DateTime<Utc> {
        modified_julian_seconds_to_datetime(self.generation_date_of_product, self.generation_time_of_product)
    }

    /// Product dependent parameter `n` (1-10), as numbered by the ICD.
    pub fn parameter(&self, n: usize) -> Option<u16> {
        n.checked_sub(1).and_then(|i| self.product_dependent.get(i).copied())
    }

    pub fn level_encoding(&self) -> LevelEncoding {
        tables::level_encoding(self.product_code)
    }

    /// Compression method from halfword 51. Zero for products that cannot be
    /// compressed.
    pub fn compression_method(&self) -> u16 {
        if tables::supports_compression(self.product_code) {
            self.parameter(8).unwrap_or(0)
        } else {
            0
        }
    }

    /// True when the data following this block is compressed.
    pub fn is_compression_enabled(&self) -> bool {
        self.compression_method() != COMPRESSION_NONE
    }

    /// Uncompressed product size in bytes from halfwords 52-53.
    pub fn uncompressed_size(&self) -> u32 {
        let high = self.parameter(9).unwrap_or(0) as u32;
        let low = self.parameter(10).unwrap_or(0) as u32;
        (high << 16) | low
    }

    /// Elevation angle in degrees, for products scanned at a single elevation.
    pub fn elevation(&self) -> Option<f32> {
        if !tables::has_elevation(self.product_code) {
            return None;
        }
        self.parameter(3).map(|raw| raw as i16 as f32 * 0.1)
    }

    fn threshold(&self, index: usize) -> u16 {
        self.data_level_thresholds[index]
    }

    fn threshold_f32(&self, index: usize) -> f32 {
        f32_from_halfwords(self.threshold(index), self.threshold(index + 1))
    }

    /// Number of data levels, where the encoding declares one.
    pub fn number_of_levels(&self) -> Option<u16> {
        match self.level_encoding() {
            LevelEncoding::Coded => Some(16),
            LevelEncoding::MinIncrement => Some(self.threshold(2)),
            LevelEncoding::ScaleOffset => Some(self.threshold(5)),
            LevelEncoding::Logarithmic => Some(self.threshold(9)),
            LevelEncoding::EchoTops => None,
        }
    }

    /// Special code attached to a data level, if any.
    pub fn data_level_code(&self, level: u8) -> Option<DataLevelCode> {
        match self.level_encoding() {
            LevelEncoding::Coded => {
                let threshold = *self.data_level_thresholds.get(level as usize)?;
                (threshold & 0x8000 != 0).then(|| DataLevelCode::from_coded(threshold as u8))
            }
            LevelEncoding::MinIncrement
            | LevelEncoding::ScaleOffset
            | LevelEncoding::Logarithmic
            | LevelEncoding::EchoTops => match level {
                0 => Some(DataLevelCode::BelowThreshold),
                1 => Some(DataLevelCode::RangeFolded),
                _ => None,
            },
        }
    }

    /// Physical value of a data level, or `None` for coded levels.
    pub fn data_value(&self, level: u8) -> Option<f32> {
        match self.level_encoding() {
            LevelEncoding::Coded => self.coded_value(level),
            LevelEncoding::MinIncrement => {
                if level < 2 {
                    return None;
                }
                let minimum = self.threshold(0) as i16 as f32 * 0.1;
                let increment = self.threshold(1) as i16 as f32 * 0.1;
                Some(minimum + (level - 2) as f32 * increment)
            }
            LevelEncoding::ScaleOffset => {
                let leading_flags = self.threshold(6).max(2);
                let scale = self.threshold_f32(0);
                let offset = self.threshold_f32(2);
                if (level as u16) < leading_flags || scale == 0.0 {
                    return None;
                }
                Some((level as f32 - offset) / scale)
            }
            LevelEncoding::Logarithmic => {
                if level < 2 {
                    return None;
                }
                let linear_scale = self.threshold_f32(0);
                let linear_offset = self.threshold_f32(2);
                let log_start = self.threshold(4);
                let log_scale = self.threshold_f32(5);
                let log_offset = self.threshold_f32(7);
                if (level as u16) < log_start {
                    (linear_scale != 0.0).then(|| (level as f32 - linear_offset) / linear_scale)
                } else {
                    (log_scale != 0.0).then(|| ((level as f32 - log_offset) / log_scale).exp())
                }
            }
            LevelEncoding::EchoTops => {
                if level < 2 {
                    return None;
                }
                let data_mask = self.threshold(0) as u8;
                let scale = self.threshold(1);
                let offset = self.threshold(2);
                if scale == 0 {
                    return None;
                }
                Some((level & data_mask) as f32 / scale as f32 - offset as f32)
            }
        }
    }

    /// True if the echo tops level has the topped flag set.
    pub fn is_topped(&self, level: u8) -> bool {
        self.level_encoding() == LevelEncoding::EchoTops && level & (self.threshold(5) as u8) != 0
    }

    fn coded_value(&self, level: u8) -> Option<f32> {
        let threshold = *self.data_level_thresholds.get(level as usize)?;
        if threshold & 0x8000 != 0 {
            return None;
        }
        let mut value = (threshold & 0x00FF) as f32;
        if threshold & 0x4000 != 0 {
            value /= 20.0;
        }
        if threshold & 0x2000 != 0 {
            value /= 100.0;
        }
        if threshold & 0x1000 != 0 {
            value /= 10.0;
        }
        if threshold & 0x0100 != 0 {
            value = -value;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdb_bytes(product_code: i16, thresholds: [u16; 16], p8: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(-1i16).to_be_bytes());
        out.extend_from_slice(&35333i32.to_be_bytes());
        out.extend_from_slice(&(-97278i32).to_be_bytes());
        out.extend_from_slice(&1277i16.to_be_bytes());
        out.extend_from_slice(&product_code.to_be_bytes());
        out.extend_from_slice(&2u16.to_be_bytes());
        out.extend_from_slice(&212u16.to_be_bytes());
        out.extend_from_slice(&42i16.to_be_bytes());
        out.extend_from_slice(&7u16.to_be_bytes());
        out.extend_from_slice(&19294u16.to_be_bytes());
        out.extend_from_slice(&2640u32.to_be_bytes());
        out.extend_from_slice(&19294u16.to_be_bytes());
        out.extend_from_slice(&2700u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&5u16.to_be_bytes());
        for t in thresholds {
            out.extend_from_slice(&t.to_be_bytes());
        }
        for p in [0u16, 0, 0, 0, p8, 0, 0] {
            out.extend_from_slice(&p.to_be_bytes());
        }
        out.push(1);
        out.push(0);
        out.extend_from_slice(&60u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out
    }

    fn decode(bytes: Vec<u8>) -> ProductDescriptionBlock {
        let mut reader = WireReader::new(bytes);
        let pdb = ProductDescriptionBlock::decode(&mut reader).unwrap();
        assert_eq!(reader.position(), PRODUCT_DESCRIPTION_BLOCK_SIZE);
        pdb
    }

    #[test]
    fn test_decode_fields() {
        let pdb = decode(pdb_bytes(94, [0; 16], 0));
        assert!((pdb.latitude() - 35.333).abs() < 1e-4);
        assert!((pdb.longitude() + 97.278).abs() < 1e-4);
        assert_eq!(pdb.product_code, 94);
        assert_eq!(pdb.elevation_number, 1);
        assert_eq!(pdb.offset_to_symbology, 60);
        assert_eq!(pdb.elevation(), Some(0.5));
        assert_eq!(pdb.volume_scan_start().to_rfc3339(), "2022-10-28T00:44:00+00:00");
        assert!(!pdb.is_compression_enabled());
    }

    #[test]
    fn test_compression_flag() {
        let pdb = decode(pdb_bytes(94, [0; 16], 1));
        assert!(pdb.is_compression_enabled());
        assert_eq!(pdb.compression_method(), COMPRESSION_BZIP2);
        assert!(!decode(pdb_bytes(19, [0; 16], 1)).is_compression_enabled());
    }

    #[test]
    fn test_bad_block_divider() {
        let mut bytes = pdb_bytes(94, [0; 16], 0);
        bytes[1] = 0;
        let mut reader = WireReader::new(bytes);
        assert!(ProductDescriptionBlock::decode(&mut reader).is_err());
    }

    #[test]
    fn test_coded_thresholds() {
        let mut thresholds = [0u16; 16];
        thresholds[0] = 0x8002; // ND
        thresholds[1] = 0x0005; // 5
        thresholds[2] = 0x0105; // -5
        thresholds[3] = 0x1019; // 2.5
        thresholds[4] = 0x2032; // 0.5
        thresholds[5] = 0x4014; // 1.0
        let pdb = decode(pdb_bytes(19, thresholds, 0));

        assert_eq!(pdb.data_level_code(0), Some(DataLevelCode::NoData));
        assert_eq!(pdb.data_value(0), None);
        assert_eq!(pdb.data_value(1), Some(5.0));
        assert_eq!(pdb.data_value(2), Some(-5.0));
        assert_eq!(pdb.data_value(3), Some(2.5));
        assert_eq!(pdb.data_value(4), Some(0.5));
        assert_eq!(pdb.data_value(5), Some(1.0));
        assert_eq!(pdb.data_level_code(1), None);
        assert_eq!(pdb.data_value(16), None);
    }

    #[test]
    fn test_min_increment_levels() {
        let mut thresholds = [0u16; 16];
        thresholds[0] = (-320i16) as u16;
        thresholds[1] = 5;
        thresholds[2] = 254;
        let pdb = decode(pdb_bytes(94, thresholds, 0));

        assert_eq!(pdb.data_level_code(0), Some(DataLevelCode::BelowThreshold));
        assert_eq!(pdb.data_level_code(1), Some(DataLevelCode::RangeFolded));
        assert_eq!(pdb.data_value(1), None);
        assert_eq!(pdb.data_value(2), Some(-32.0));
        assert_eq!(pdb.data_value(66), Some(0.0));
        assert_eq!(pdb.number_of_levels(), Some(254));
    }

    #[test]
    fn test_scale_offset_levels() {
        let scale = 16.0f32.to_bits();
        let offset = 128.0f32.to_bits();
        let mut thresholds = [0u16; 16];
        thresholds[0] = (scale >> 16) as u16;
        thresholds[1] = scale as u16;
        thresholds[2] = (offset >> 16) as u16;
        thresholds[3] = offset as u16;
        thresholds[5] = 255;
        thresholds[6] = 2;
        let pdb = decode(pdb_bytes(159, thresholds, 0));

        assert_eq!(pdb.data_value(1), None);
        assert_eq!(pdb.data_value(144), Some(1.0));
        assert_eq!(pdb.data_value(128), Some(0.0));
    }

    #[test]
    fn test_logarithmic_levels() {
        let halves = |v: f32| ((v.to_bits() >> 16) as u16, v.to_bits() as u16);
        let mut thresholds = [0u16; 16];
        (thresholds[0], thresholds[1]) = halves(90.0);
        (thresholds[2], thresholds[3]) = halves(-2.0);
        thresholds[4] = 20;
        (thresholds[5], thresholds[6]) = halves(38.0);
        (thresholds[7], thresholds[8]) = halves(-83.0);
        thresholds[9] = 254;
        let pdb = decode(pdb_bytes(134, thresholds, 0));

        let linear = pdb.data_value(7).unwrap();
        assert!((linear - 0.1).abs() < 1e-6);
        let log = pdb.data_value(121).unwrap();
        assert!((log - ((121.0f32 + 83.0) / 38.0).exp()).abs() < 1e-3);
    }

    #[test]
    fn test_echo_tops_levels() {
        let mut thresholds = [0u16; 16];
        thresholds[0] = 0x7F;
        thresholds[1] = 1;
        thresholds[2] = 2;
        thresholds[5] = 0x80;
        let pdb = decode(pdb_bytes(135, thresholds, 0));

        assert_eq!(pdb.data_value(0), None);
        assert_eq!(pdb.data_value(32), Some(30.0));
        assert_eq!(pdb.data_value(0x80 | 32), Some(30.0));
        assert!(pdb.is_topped(0x80 | 32));
        assert!(!pdb.is_topped(32));
    }
}
