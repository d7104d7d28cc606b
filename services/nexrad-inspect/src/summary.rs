//! JSON summaries of decoded files.

use chrono::{DateTime, Utc};
use nexrad_decode::awips::{TextProductFile, TextProductMessage};
use nexrad_decode::level2::Archive2File;
use nexrad_decode::level3::{product_info, Level3File};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct Level2Summary {
    pub path: String,
    pub icao: String,
    pub tape_filename: String,
    pub start_time: DateTime<Utc>,
    pub message_count: usize,
    /// Message counts keyed by type name
    pub message_types: BTreeMap<String, usize>,
    pub volume_coverage_pattern: Option<u16>,
    pub elevations: Vec<ElevationSummary>,
}

#[derive(Debug, Serialize)]
pub struct ElevationSummary {
    pub elevation_number: u8,
    pub elevation_angle: f32,
    pub radials: usize,
    pub moments: Vec<&'static str>,
}

impl Level2Summary {
    pub fn new(path: &str, file: &Archive2File) -> Self {
        let mut message_types = BTreeMap::new();
        for message in &file.messages {
            *message_types
                .entry(message.message_type().to_string())
                .or_insert(0) += 1;
        }

        let elevations = file
            .elevation_scans()
            .into_iter()
            .map(|(elevation_number, radials)| {
                let mut moments: Vec<&'static str> = radials
                    .iter()
                    .flat_map(|r| r.moments.iter().map(|m| m.moment.short_name()))
                    .collect();
                moments.sort_unstable();
                moments.dedup();

                ElevationSummary {
                    elevation_number,
                    elevation_angle: radials.first().map_or(0.0, |r| r.elevation_angle),
                    radials: radials.len(),
                    moments,
                }
            })
            .collect();

        Self {
            path: path.to_string(),
            icao: file.volume_header.icao.clone(),
            tape_filename: file.volume_header.tape_filename.clone(),
            start_time: file.volume_header.start_time(),
            message_count: file.messages.len(),
            message_types,
            volume_coverage_pattern: file
                .volume_coverage_pattern()
                .map(|vcp| vcp.pattern_number)
                .or_else(|| file.radials().find_map(|r| r.volume_coverage_pattern_number())),
            elevations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Level3Summary {
    pub path: String,
    pub awips_id: Option<String>,
    pub product_code: i16,
    pub mnemonic: Option<&'static str>,
    pub description: Option<&'static str>,
    pub latitude: f32,
    pub longitude: f32,
    pub elevation: Option<f32>,
    pub volume_scan_start: DateTime<Utc>,
    pub generation_time: DateTime<Utc>,
    pub level_encoding: String,
    pub number_of_levels: Option<u16>,
    pub layers: usize,
    /// Packet counts keyed by packet code
    pub packets: BTreeMap<u16, usize>,
    pub graphic_pages: usize,
    pub tabular_pages: usize,
}

impl Level3Summary {
    pub fn new(path: &str, file: &Level3File) -> Self {
        let message = &file.message;
        let description = &message.description;
        let info = product_info(description.product_code);

        let mut packets = BTreeMap::new();
        for packet in message.packets() {
            *packets.entry(packet.packet_code()).or_insert(0) += 1;
        }

        Self {
            path: path.to_string(),
            awips_id: file.awips_id(),
            product_code: description.product_code,
            mnemonic: info.map(|i| i.mnemonic),
            description: info.map(|i| i.description),
            latitude: description.latitude(),
            longitude: description.longitude(),
            elevation: description.elevation(),
            volume_scan_start: description.volume_scan_start(),
            generation_time: description.generation_time(),
            level_encoding: format!("{:?}", description.level_encoding()),
            number_of_levels: description.number_of_levels(),
            layers: message.symbology.as_ref().map_or(0, |s| s.layers.len()),
            packets,
            graphic_pages: message.graphic.as_ref().map_or(0, |g| g.pages.len()),
            tabular_pages: message.tabular.as_ref().map_or(0, |t| t.pages.len()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TextFileSummary {
    pub path: String,
    pub duplicates: usize,
    pub products: Vec<TextProductSummary>,
}

#[derive(Debug, Serialize)]
pub struct TextProductSummary {
    pub awips_id: String,
    pub heading: String,
    pub sequence_number: String,
    /// Issuance time, or the Unix epoch when it cannot be resolved
    pub issued: DateTime<Utc>,
    pub lines: usize,
    pub segments: usize,
}

impl TextProductSummary {
    fn new(message: &TextProductMessage, end_time: Option<DateTime<Utc>>) -> Self {
        let header = &message.header;
        let mut heading = format!(
            "{}{}{} {} {}",
            header.data_type, header.geographic_designator, header.bulletin_id, header.icao, header.date_time
        );
        if !header.bbb_indicator.is_empty() {
            heading.push(' ');
            heading.push_str(&header.bbb_indicator);
        }

        Self {
            awips_id: header.awips_id(),
            heading,
            sequence_number: header.sequence_number.clone(),
            issued: header.date_time(end_time),
            lines: message.lines.len(),
            segments: message.segments().len(),
        }
    }
}

impl TextFileSummary {
    pub fn new(path: &str, file: &TextProductFile, end_time: Option<DateTime<Utc>>) -> Self {
        Self {
            path: path.to_string(),
            duplicates: file.duplicate_count(),
            products: file
                .messages()
                .iter()
                .map(|m| TextProductSummary::new(m, end_time))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_text_summary() {
        let data = b"\x01\r\r\n887 \r\r\nWFUS54 KOUN 280044 CCA\r\r\nTOROUN\r\r\nTornado Warning\r\r\n$$\r\r\n\x03";
        let mut file = TextProductFile::new();
        assert!(file.load_data("tor_20221028_00.txt", Bytes::from_static(data)));

        let summary = TextFileSummary::new("tor.txt", &file, None);
        assert_eq!(summary.products.len(), 1);

        let product = &summary.products[0];
        assert_eq!(product.awips_id, "TOROUN");
        assert_eq!(product.heading, "WFUS54 KOUN 280044 CCA");
        assert_eq!(product.issued.to_rfc3339(), "2022-10-28T00:44:00+00:00");
        assert_eq!(product.segments, 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["products"][0]["sequence_number"], "887");
    }
}
