//! Raster image packets.

use super::{check_range, read_packet_code, DIGITAL_RASTER_DATA_ARRAY, RASTER_DATA_7, RASTER_DATA_F};
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use tracing::warn;

/// Largest number of bins a run-length encoded raster row may expand to.
pub const MAX_RASTER_BINS: usize = 464;

const MAX_RASTER_ROWS: u16 = 464;
const MAX_RASTER_ROW_BYTES: u16 = 920;
const MAX_DIGITAL_CELLS: u16 = 1840;

/// Expands a run-length encoded row: high nibble is the run, low nibble the
/// level. A trailing zero pad byte is dropped first.
fn expand_row(data: &[u8]) -> DecodeResult<Vec<u8>> {
    let data = match data.split_last() {
        Some((0, rest)) => rest,
        _ => data,
    };

    let bins: usize = data.iter().map(|&b| (b >> 4) as usize).sum();
    if bins > MAX_RASTER_BINS {
        return Err(DecodeError::invalid_field(
            "raster row",
            format!("expands to {} bins, more than {}", bins, MAX_RASTER_BINS),
        ));
    }

    let mut levels = Vec::with_capacity(bins);
    for &b in data {
        levels.extend(std::iter::repeat(b & 0x0F).take((b >> 4) as usize));
    }
    Ok(levels)
}

/// Packets 0xBA0F and 0xBA07: run-length encoded rows with 16 levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterDataPacket {
    pub packet_code: u16,
    pub op_flag: [u16; 2],
    pub i_coordinate_start: i16,
    pub j_coordinate_start: i16,
    pub x_scale_int: u16,
    pub x_scale_fractional: u16,
    pub y_scale_int: u16,
    pub y_scale_fractional: u16,
    pub number_of_rows: u16,
    pub packaging_descriptor: u16,
    /// Expanded levels per row
    pub rows: Vec<Vec<u8>>,
    /// Rows whose run lengths overflow [`MAX_RASTER_BINS`]. They are kept
    /// empty in `rows`.
    pub invalid_rows: Vec<u16>,
    pub data_size: usize,
}

impl RasterDataPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, &[RASTER_DATA_F, RASTER_DATA_7])?;
        let op_flag = [reader.read()?, reader.read()?];
        let i_coordinate_start: i16 = reader.read()?;
        let j_coordinate_start: i16 = reader.read()?;
        let x_scale_int: u16 = reader.read()?;
        let x_scale_fractional: u16 = reader.read()?;
        let y_scale_int: u16 = reader.read()?;
        let y_scale_fractional: u16 = reader.read()?;
        let number_of_rows: u16 = reader.read()?;
        let packaging_descriptor: u16 = reader.read()?;

        check_range("number of rows", number_of_rows, 1, MAX_RASTER_ROWS)?;

        let mut rows = Vec::with_capacity(number_of_rows as usize);
        let mut invalid_rows = Vec::new();
        for row in 0..number_of_rows {
            let number_of_bytes: u16 = reader.read()?;
            if number_of_bytes < 2 || number_of_bytes > MAX_RASTER_ROW_BYTES || number_of_bytes % 2 != 0 {
                warn!(row, number_of_bytes, "Invalid number of bytes in raster row");
                return Err(DecodeError::invalid_field(
                    "raster row length",
                    format!("{} bytes in row {}", number_of_bytes, row),
                ));
            }

            let data = reader.read_bytes(number_of_bytes as usize)?;
            match expand_row(&data) {
                Ok(levels) => rows.push(levels),
                Err(e) => {
                    warn!(row, error = %e, "Invalid raster row");
                    invalid_rows.push(row);
                    rows.push(Vec::new());
                }
            }
        }

        let data_size = reader.position() - start;
        reader.validate_message(data_size, data_size)?;

        Ok(Self {
            packet_code,
            op_flag,
            i_coordinate_start,
            j_coordinate_start,
            x_scale_int,
            x_scale_fractional,
            y_scale_int,
            y_scale_fractional,
            number_of_rows,
            packaging_descriptor,
            rows,
            invalid_rows,
            data_size,
        })
    }
}

/// Packet 33: one byte per cell with 256 levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalRasterDataArrayPacket {
    pub packet_code: u16,
    pub i_coordinate_start: i16,
    pub j_coordinate_start: i16,
    pub i_scale_factor: u16,
    pub j_scale_factor: u16,
    pub number_of_cells: u16,
    pub number_of_rows: u16,
    pub rows: Vec<Vec<u8>>,
    pub data_size: usize,
}

impl DigitalRasterDataArrayPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, &[DIGITAL_RASTER_DATA_ARRAY])?;
        let i_coordinate_start: i16 = reader.read()?;
        let j_coordinate_start: i16 = reader.read()?;
        let i_scale_factor: u16 = reader.read()?;
        let j_scale_factor: u16 = reader.read()?;
        let number_of_cells: u16 = reader.read()?;
        let number_of_rows: u16 = reader.read()?;

        check_range("number of cells", number_of_cells, 1, MAX_DIGITAL_CELLS)?;
        check_range("number of rows", number_of_rows, 1, MAX_RASTER_ROWS)?;

        let mut rows = Vec::with_capacity(number_of_rows as usize);
        for row in 0..number_of_rows {
            let number_of_bytes: u16 = reader.read()?;
            if number_of_bytes < 1 || number_of_bytes > MAX_DIGITAL_CELLS {
                warn!(row, number_of_bytes, "Invalid number of bytes in raster row");
                return Err(DecodeError::invalid_field(
                    "raster row length",
                    format!("{} bytes in row {}", number_of_bytes, row),
                ));
            }
            if number_of_bytes < number_of_cells {
                warn!(row, number_of_bytes, number_of_cells, "Raster row shorter than cell count");
                return Err(DecodeError::invalid_field(
                    "raster row length",
                    format!(
                        "{} bytes is fewer than {} cells in row {}",
                        number_of_bytes, number_of_cells, row
                    ),
                ));
            }

            let data = reader.read_bytes(number_of_bytes as usize)?;
            rows.push(data[..number_of_cells as usize].to_vec());
        }

        let data_size = reader.position() - start;
        reader.validate_message(data_size, data_size)?;

        Ok(Self {
            packet_code,
            i_coordinate_start,
            j_coordinate_start,
            i_scale_factor,
            j_scale_factor,
            number_of_cells,
            number_of_rows,
            rows,
            data_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_header(rows: u16) -> Vec<u8> {
        [0xBA0F, 0x8000, 0x00C0, 0xFF00u16, 0xFF00, 4, 0, 4, 0, rows, 2]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect()
    }

    #[test]
    fn test_expand_row() {
        assert_eq!(expand_row(&[0x21, 0x13, 0x00]).unwrap(), vec![1, 1, 3]);
        assert_eq!(expand_row(&[0x05]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_expand_row_overflow() {
        let data = vec![0xF1u8; 31];
        assert!(expand_row(&data).is_err());
        assert_eq!(expand_row(&data[..30]).unwrap().len(), 450);
    }

    #[test]
    fn test_raster_packet() {
        let mut bytes = raster_header(2);
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&[0x32, 0x00]);
        bytes.extend_from_slice(&4u16.to_be_bytes());
        bytes.extend_from_slice(&[0x11, 0x22, 0x13, 0x00]);

        let mut reader = WireReader::new(bytes);
        let packet = RasterDataPacket::decode(&mut reader).unwrap();
        assert_eq!(packet.number_of_rows, 2);
        assert_eq!(packet.rows[0], vec![2, 2, 2]);
        assert_eq!(packet.rows[1], vec![1, 2, 2, 3]);
        assert_eq!(packet.i_coordinate_start, -256);
        assert_eq!(packet.data_size, 22 + 4 + 6);
    }

    #[test]
    fn test_raster_overflowing_row_invalidated() {
        let mut bytes = raster_header(2);
        bytes.extend_from_slice(&32u16.to_be_bytes());
        bytes.extend_from_slice(&[0xF1; 32]);
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&[0x24, 0x00]);

        let mut reader = WireReader::new(bytes);
        let packet = RasterDataPacket::decode(&mut reader).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(packet.invalid_rows, vec![0]);
        assert!(packet.rows[0].is_empty());
        assert_eq!(packet.rows[1], vec![4, 4]);
    }

    #[test]
    fn test_raster_odd_row_length_rejected() {
        let mut bytes = raster_header(1);
        bytes.extend_from_slice(&3u16.to_be_bytes());
        bytes.extend_from_slice(&[0x32, 0x11, 0x00]);
        let mut reader = WireReader::new(bytes);
        assert!(RasterDataPacket::decode(&mut reader).is_err());
    }

    #[test]
    fn test_raster_zero_rows_rejected() {
        let mut reader = WireReader::new(raster_header(0));
        assert!(RasterDataPacket::decode(&mut reader).is_err());
    }

    fn digital_raster(cells: u16, row_bytes: u16) -> Vec<u8> {
        let mut bytes: Vec<u8> = [33u16, 0, 0, 1, 1, cells, 1]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        bytes.extend_from_slice(&row_bytes.to_be_bytes());
        bytes.extend((0..row_bytes).map(|b| b as u8));
        bytes
    }

    #[test]
    fn test_digital_raster() {
        let mut reader = WireReader::new(digital_raster(3, 4));
        let packet = DigitalRasterDataArrayPacket::decode(&mut reader).unwrap();
        assert_eq!(packet.rows, vec![vec![0, 1, 2]]);
        assert_eq!(packet.data_size, 14 + 2 + 4);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_digital_raster_short_row_rejected() {
        let mut reader = WireReader::new(digital_raster(4, 3));
        assert!(DigitalRasterDataArrayPacket::decode(&mut reader).is_err());
    }
}
