//! Byte-level builders for synthetic NEXRAD and AWIPS data.
//!
//! Every builder emits big-endian bytes laid out exactly as the radar
//! transmits them, so tests can drive the decoders without real data files.

use crate::fixtures::{site, time};
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::io::Write;

// ============================================================================
// Level II
// ============================================================================

/// Builds a 16-byte Level II message header.
pub fn level2_header(message_size: u16, message_type: u8, segments: u16, segment: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&message_size.to_be_bytes());
    out.push(0); // redundant channel
    out.push(message_type);
    out.extend_from_slice(&1u16.to_be_bytes()); // id sequence
    out.extend_from_slice(&time::MODIFIED_JULIAN_DATE.to_be_bytes());
    out.extend_from_slice(&time::MILLISECONDS_OF_DAY.to_be_bytes());
    out.extend_from_slice(&segments.to_be_bytes());
    out.extend_from_slice(&segment.to_be_bytes());
    out
}

/// Builds a complete single-segment message. Odd payloads are padded to a
/// halfword.
pub fn level2_message(message_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = payload.to_vec();
    if body.len() % 2 != 0 {
        body.push(0);
    }
    let halfwords = ((body.len() + 16) / 2) as u16;
    let mut out = level2_header(halfwords, message_type, 1, 1);
    out.extend_from_slice(&body);
    out
}

/// Builds a message using the 65535 size escape, with the payload length
/// packed into the segment fields.
pub fn level2_oversized_message(message_type: u8, payload: &[u8]) -> Vec<u8> {
    let size = payload.len();
    let mut out = level2_header(u16::MAX, message_type, (size >> 16) as u16, (size & 0xFFFF) as u16);
    out.extend_from_slice(payload);
    out
}

/// Splits a payload into segments of at most `segment_size` bytes, each with
/// its own header. `segment_size` must be even.
pub fn level2_segments(message_type: u8, payload: &[u8], segment_size: usize) -> Vec<Vec<u8>> {
    let chunks: Vec<&[u8]> = payload.chunks(segment_size).collect();
    let total = chunks.len() as u16;
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut body = chunk.to_vec();
            if body.len() % 2 != 0 {
                body.push(0);
            }
            let halfwords = ((body.len() + 16) / 2) as u16;
            let mut out = level2_header(halfwords, message_type, total, i as u16 + 1);
            out.extend_from_slice(&body);
            out
        })
        .collect()
}

/// RDA PRF data (message 32) body.
pub fn rda_prf_payload(waveforms: &[(u16, &[u32])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(waveforms.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    for (waveform_type, prfs) in waveforms {
        out.extend_from_slice(&waveform_type.to_be_bytes());
        out.extend_from_slice(&(prfs.len() as u16).to_be_bytes());
        for prf in prfs.iter() {
            out.extend_from_slice(&prf.to_be_bytes());
        }
    }
    out
}

/// Clutter filter map (message 15) body with the same range zones on every
/// azimuth of every elevation segment.
pub fn clutter_filter_map_payload(elevation_segments: u16, zones: &[(u16, u16)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&time::MODIFIED_JULIAN_DATE.to_be_bytes());
    out.extend_from_slice(&600u16.to_be_bytes());
    out.extend_from_slice(&elevation_segments.to_be_bytes());
    for _ in 0..elevation_segments {
        for _ in 0..360 {
            out.extend_from_slice(&(zones.len() as u16).to_be_bytes());
            for (op_code, end_range) in zones {
                out.extend_from_slice(&op_code.to_be_bytes());
                out.extend_from_slice(&end_range.to_be_bytes());
            }
        }
    }
    out
}

/// Digital radar data (message 31) body with a volume block and one
/// reflectivity moment.
pub fn digital_radar_data_payload(azimuth_number: u16, azimuth: f32, elevation_number: u8, gates: &[u8]) -> Vec<u8> {
    const FIXED_HEADER: usize = 32;
    const POINTERS: usize = 2;
    const VOLUME_BLOCK: usize = 44;

    let volume_pointer = (FIXED_HEADER + POINTERS * 4) as u32;
    let moment_pointer = volume_pointer + VOLUME_BLOCK as u32;

    let mut out = Vec::new();
    out.extend_from_slice(site::ICAO.as_bytes());
    out.extend_from_slice(&time::MILLISECONDS_OF_DAY.to_be_bytes());
    out.extend_from_slice(&time::MODIFIED_JULIAN_DATE.to_be_bytes());
    out.extend_from_slice(&azimuth_number.to_be_bytes());
    out.extend_from_slice(&azimuth.to_be_bytes());
    out.push(0); // compression
    out.push(0); // spare
    out.extend_from_slice(&0u16.to_be_bytes()); // radial length
    out.push(1); // azimuth resolution
    out.push(if azimuth_number == 1 { 3 } else { 1 }); // radial status
    out.push(elevation_number);
    out.push(1); // cut sector
    out.extend_from_slice(&0.5f32.to_be_bytes());
    out.push(0); // spot blanking
    out.push(0); // azimuth indexing
    out.extend_from_slice(&(POINTERS as u16).to_be_bytes());
    out.extend_from_slice(&volume_pointer.to_be_bytes());
    out.extend_from_slice(&moment_pointer.to_be_bytes());

    out.push(b'R');
    out.extend_from_slice(b"VOL");
    out.extend_from_slice(&(VOLUME_BLOCK as u16).to_be_bytes());
    out.push(1);
    out.push(0);
    out.extend_from_slice(&site::LATITUDE.to_be_bytes());
    out.extend_from_slice(&site::LONGITUDE.to_be_bytes());
    out.extend_from_slice(&site::HEIGHT_M.to_be_bytes());
    out.extend_from_slice(&20u16.to_be_bytes());
    for value in [-44.0f32, 700.0, 700.0, 0.2, 60.0] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&212u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());

    out.push(b'D');
    out.extend_from_slice(b"REF");
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&(gates.len() as u16).to_be_bytes());
    out.extend_from_slice(&2125i16.to_be_bytes());
    out.extend_from_slice(&250u16.to_be_bytes());
    out.extend_from_slice(&16u16.to_be_bytes());
    out.extend_from_slice(&20i16.to_be_bytes());
    out.push(0);
    out.push(8);
    out.extend_from_slice(&2.0f32.to_be_bytes());
    out.extend_from_slice(&66.0f32.to_be_bytes());
    out.extend_from_slice(gates);
    out
}

/// 24-byte Archive II volume header record for the fixture site and time.
pub fn volume_header_record() -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    out.extend_from_slice(b"AR2V0006.");
    out.extend_from_slice(b"001");
    out.extend_from_slice(&(time::MODIFIED_JULIAN_DATE as u32).to_be_bytes());
    out.extend_from_slice(&time::MILLISECONDS_OF_DAY.to_be_bytes());
    out.extend_from_slice(site::ICAO.as_bytes());
    out
}

/// Lays out messages as an uncompressed LDM record. Messages 29 and 31 are
/// packed back to back; every other message occupies a fixed 2432-byte slot.
/// Each message gets a 12-byte CTM header.
pub fn ldm_record(messages: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for message in messages {
        out.extend_from_slice(&[0u8; 12]);
        out.extend_from_slice(message);
        let message_type = message.get(3).copied().unwrap_or(0);
        if message_type != 29 && message_type != 31 {
            let slot: usize = 2432 - 12;
            out.resize(out.len() + slot.saturating_sub(message.len()), 0);
        }
    }
    out
}

/// Builds an Archive II volume: a volume header record followed by one
/// uncompressed LDM record.
pub fn archive2_volume(messages: &[Vec<u8>]) -> Vec<u8> {
    let mut out = volume_header_record();
    out.extend(ldm_record(messages));
    out
}

/// Builds an Archive II volume with each LDM record bzip2-compressed behind
/// its control word. The last record's control word is negative.
pub fn archive2_compressed_volume(records: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let mut out = volume_header_record();
    for (i, messages) in records.iter().enumerate() {
        let compressed = bzip2_compress(&ldm_record(messages));
        let size = compressed.len() as i32;
        let control_word = if i + 1 == records.len() { -size } else { size };
        out.extend_from_slice(&control_word.to_be_bytes());
        out.extend(compressed);
    }
    out
}

/// Compresses `data` as a single bzip2 stream.
pub fn bzip2_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("Failed to compress test data");
    encoder.finish().expect("Failed to finish bzip2 stream")
}

// ============================================================================
// Level III
// ============================================================================

/// Halfwords as big-endian bytes.
pub fn halfwords(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// 18-byte Level III message header.
pub fn level3_message_header(message_code: i16, length: u32, blocks: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(18);
    out.extend_from_slice(&message_code.to_be_bytes());
    out.extend_from_slice(&time::MODIFIED_JULIAN_DATE.to_be_bytes());
    out.extend_from_slice(&time::SECONDS_OF_DAY.to_be_bytes());
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&blocks.to_be_bytes());
    out
}

/// Parameters for [`product_description_block`].
#[derive(Debug, Clone)]
pub struct DescriptionParams {
    pub product_code: i16,
    pub thresholds: [u16; 16],
    /// Product dependent halfwords 27, 28, 30, 47-53 in that order
    pub dependent: [u16; 10],
    /// Halfword offsets to the symbology, graphic and tabular blocks
    pub offsets: [u32; 3],
}

impl DescriptionParams {
    pub fn new(product_code: i16) -> Self {
        let mut dependent = [0u16; 10];
        dependent[2] = 5; // 0.5 degrees
        Self {
            product_code,
            thresholds: [0; 16],
            dependent,
            offsets: [0; 3],
        }
    }
}

/// 102-byte product description block.
pub fn product_description_block(params: &DescriptionParams) -> Vec<u8> {
    let mut out = Vec::with_capacity(102);
    out.extend_from_slice(&(-1i16).to_be_bytes());
    out.extend_from_slice(&site::LATITUDE_MILLIDEGREES.to_be_bytes());
    out.extend_from_slice(&site::LONGITUDE_MILLIDEGREES.to_be_bytes());
    out.extend_from_slice(&site::HEIGHT_FT.to_be_bytes());
    out.extend_from_slice(&params.product_code.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes()); // precipitation mode
    out.extend_from_slice(&212u16.to_be_bytes());
    out.extend_from_slice(&42i16.to_be_bytes());
    out.extend_from_slice(&7u16.to_be_bytes());
    out.extend_from_slice(&time::MODIFIED_JULIAN_DATE.to_be_bytes());
    out.extend_from_slice(&time::SECONDS_OF_DAY.to_be_bytes());
    out.extend_from_slice(&time::MODIFIED_JULIAN_DATE.to_be_bytes());
    out.extend_from_slice(&(time::SECONDS_OF_DAY + 60).to_be_bytes());
    out.extend_from_slice(&halfwords(&params.dependent[0..2]));
    out.extend_from_slice(&1u16.to_be_bytes()); // elevation number
    out.extend_from_slice(&params.dependent[2].to_be_bytes());
    out.extend_from_slice(&halfwords(&params.thresholds));
    out.extend_from_slice(&halfwords(&params.dependent[3..]));
    out.push(1); // version
    out.push(0); // spot blank
    for offset in params.offsets {
        out.extend_from_slice(&offset.to_be_bytes());
    }
    out
}

/// Symbology block holding one layer per entry.
pub fn symbology_block(layers: &[Vec<u8>]) -> Vec<u8> {
    let body: usize = layers.iter().map(|layer| 6 + layer.len()).sum();
    let mut out = Vec::new();
    out.extend_from_slice(&(-1i16).to_be_bytes());
    out.extend_from_slice(&1i16.to_be_bytes());
    out.extend_from_slice(&((10 + body) as u32).to_be_bytes());
    out.extend_from_slice(&(layers.len() as u16).to_be_bytes());
    for layer in layers {
        out.extend_from_slice(&(-1i16).to_be_bytes());
        out.extend_from_slice(&(layer.len() as u32).to_be_bytes());
        out.extend_from_slice(layer);
    }
    out
}

/// Tabular alphanumeric block with the given pages of text lines.
pub fn tabular_block(params: &DescriptionParams, pages: &[&[&str]]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&level3_message_header(params.product_code, 120, 3));
    body.extend_from_slice(&product_description_block(params));
    body.extend_from_slice(&(-1i16).to_be_bytes());
    body.extend_from_slice(&(pages.len() as u16).to_be_bytes());
    for page in pages {
        for line in page.iter() {
            body.extend_from_slice(&(line.len() as i16).to_be_bytes());
            body.extend_from_slice(line.as_bytes());
        }
        body.extend_from_slice(&(-1i16).to_be_bytes());
    }

    let mut out = Vec::new();
    out.extend_from_slice(&(-1i16).to_be_bytes());
    out.extend_from_slice(&3i16.to_be_bytes());
    out.extend_from_slice(&((8 + body.len()) as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// Complete graphic product: header, description block and a symbology
/// block with the given layers. Offsets and lengths are filled in.
pub fn level3_product(mut params: DescriptionParams, layers: &[Vec<u8>]) -> Vec<u8> {
    let symbology = symbology_block(layers);
    params.offsets = [60, 0, 0];
    let length = 18 + 102 + symbology.len();

    let mut out = level3_message_header(params.product_code, length as u32, 3);
    out.extend_from_slice(&product_description_block(&params));
    out.extend_from_slice(&symbology);
    out
}

/// Graphic product whose data after the description block is
/// bzip2-compressed, with the compression method and uncompressed size set
/// in halfwords 51-53.
pub fn compressed_level3_product(params: DescriptionParams, layers: &[Vec<u8>]) -> Vec<u8> {
    let uncompressed = level3_product(params.clone(), layers);
    let header_size = 18 + 102;

    let mut params = params;
    params.offsets = [60, 0, 0];
    params.dependent[7] = 1;
    params.dependent[8] = (uncompressed.len() >> 16) as u16;
    params.dependent[9] = (uncompressed.len() & 0xFFFF) as u16;

    let compressed = bzip2_compress(&uncompressed[header_size..]);
    let length = header_size + compressed.len();

    let mut out = level3_message_header(params.product_code, length as u32, 3);
    out.extend_from_slice(&product_description_block(&params));
    out.extend_from_slice(&compressed);
    out
}

/// Text packet (1) at screen position `(i, j)`.
pub fn text_packet(i: i16, j: i16, text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&((4 + text.len()) as u16).to_be_bytes());
    out.extend_from_slice(&i.to_be_bytes());
    out.extend_from_slice(&j.to_be_bytes());
    out.extend_from_slice(text.as_bytes());
    out
}

/// Graphic alphanumeric block with one page per entry.
pub fn graphic_block(pages: &[Vec<u8>]) -> Vec<u8> {
    let body: usize = pages.iter().map(|page| 4 + page.len()).sum();
    let mut out = Vec::new();
    out.extend_from_slice(&(-1i16).to_be_bytes());
    out.extend_from_slice(&2i16.to_be_bytes());
    out.extend_from_slice(&((10 + body) as u32).to_be_bytes());
    out.extend_from_slice(&(pages.len() as u16).to_be_bytes());
    for (number, page) in pages.iter().enumerate() {
        out.extend_from_slice(&(number as u16 + 1).to_be_bytes());
        out.extend_from_slice(&(page.len() as u16).to_be_bytes());
        out.extend_from_slice(page);
    }
    out
}

/// Run-length encoded raster packet (0xBA0F). Each row is a list of
/// `(run, level)` pairs.
pub fn raster_packet(rows: &[Vec<(u8, u8)>]) -> Vec<u8> {
    let mut out = halfwords(&[0xBA0F, 0x8000, 0x00C0, 0xFF00, 0xFF00, 4, 0, 4, 0, rows.len() as u16, 2]);
    for row in rows {
        let mut data: Vec<u8> = row.iter().map(|(run, level)| (run << 4) | (level & 0x0F)).collect();
        if data.len() % 2 != 0 {
            data.push(0);
        }
        out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        out.extend_from_slice(&data);
    }
    out
}

/// Digital raster packet (33) with an explicit byte length per row.
pub fn digital_raster_packet(cells: u16, rows: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut out = halfwords(&[33, 0, 0, 1, 1, cells, rows.len() as u16]);
    for (number_of_bytes, data) in rows {
        out.extend_from_slice(&number_of_bytes.to_be_bytes());
        out.extend_from_slice(data);
    }
    out
}

/// Digital radial packet (16) with one byte per bin.
pub fn digital_radial_packet(radials: &[Vec<u8>]) -> Vec<u8> {
    let bins = radials.first().map_or(0, Vec::len) as u16;
    let mut out = halfwords(&[16, 0, bins, 0, 0, 999, radials.len() as u16]);
    for (i, radial) in radials.iter().enumerate() {
        let mut data = radial.clone();
        if data.len() % 2 != 0 {
            data.push(0);
        }
        out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        out.extend_from_slice(&((i as i16) * 10).to_be_bytes());
        out.extend_from_slice(&10i16.to_be_bytes());
        out.extend_from_slice(&data);
    }
    out
}

// ============================================================================
// AWIPS text
// ============================================================================

/// A text product with SOH, sequence line, heading and product line, the
/// body lines and a closing ETX, using `\r\r\n` line endings.
pub fn text_product(sequence: &str, heading: &str, awips_id: &str, body: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"\x01\r\r\n");
    for line in [sequence, heading, awips_id].iter().chain(body.iter()) {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\r\n");
    }
    out.push(0x03);
    out.extend_from_slice(b"\r\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level2_message_size() {
        let message = level2_message(32, &[1, 2, 3]);
        assert_eq!(message.len(), 20);
        assert_eq!(u16::from_be_bytes([message[0], message[1]]), 10);
    }

    #[test]
    fn test_level2_segments_numbering() {
        let segments = level2_segments(15, &[0u8; 10], 4);
        assert_eq!(segments.len(), 3);
        assert_eq!(&segments[2][12..16], &[0, 3, 0, 3]);
        assert_eq!(segments[2].len(), 16 + 2);
    }

    #[test]
    fn test_product_description_block_size() {
        assert_eq!(product_description_block(&DescriptionParams::new(94)).len(), 102);
    }

    #[test]
    fn test_level3_product_length() {
        let product = level3_product(DescriptionParams::new(94), &[halfwords(&[0x0802, 2, 7])]);
        let length = u32::from_be_bytes([product[8], product[9], product[10], product[11]]);
        assert_eq!(length as usize, product.len());
    }

    #[test]
    fn test_compressed_level3_product_layout() {
        let layers = [halfwords(&[0x0802, 2, 7])];
        let plain = level3_product(DescriptionParams::new(94), &layers);
        let product = compressed_level3_product(DescriptionParams::new(94), &layers);

        let length = u32::from_be_bytes([product[8], product[9], product[10], product[11]]);
        assert_eq!(length as usize, product.len());
        assert_eq!(&product[120..123], b"BZh");
        // Halfword 51 holds the compression method
        assert_eq!(&product[100..102], &[0, 1]);
        assert_eq!(product[102..106], (plain.len() as u32).to_be_bytes());
    }

    #[test]
    fn test_archive2_compressed_volume_control_words() {
        let volume = archive2_compressed_volume(&[vec![level2_message(32, &[0; 4])], vec![]]);
        let size = i32::from_be_bytes([volume[24], volume[25], volume[26], volume[27]]);
        assert!(size > 0);
        assert_eq!(&volume[28..31], b"BZh");

        let last = 28 + size as usize;
        let last_size = i32::from_be_bytes([volume[last], volume[last + 1], volume[last + 2], volume[last + 3]]);
        assert!(last_size < 0);
        assert_eq!(volume.len(), last + 4 + last_size.unsigned_abs() as usize);
    }

    #[test]
    fn test_digital_radar_data_payload_layout() {
        let payload = digital_radar_data_payload(1, 0.5, 1, &[2, 3, 4]);
        assert_eq!(payload.len(), 32 + 8 + 44 + 28 + 3);
        assert_eq!(&payload[40..44], b"RVOL");
        assert_eq!(&payload[84..88], b"DREF");
    }
}
