//! Archive II volume files.
//!
//! A volume starts with a 24-byte volume header record followed by LDM
//! records. Inside an uncompressed record each message occupies a fixed
//! 2432-byte slot prefixed by a 12-byte CTM header, except message types 29
//! and 31 which occupy exactly their declared length. Current volumes
//! compress each LDM record separately with bzip2.

use super::factory::{Level2MessageFactory, ReassemblyContext};
use super::header::Level2MessageHeader;
use super::messages::{
    DigitalRadarData, Level2Message, Level2MessageData, RdaStatusData, VolumeCoveragePatternData,
};
use crate::compression::{decompress_bzip2, is_bzip2};
use crate::time::modified_julian_to_datetime;
use crate::wire::WireReader;
use crate::DecodeResult;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, trace, warn};

pub const VOLUME_HEADER_SIZE: usize = 24;
pub const CTM_HEADER_SIZE: usize = 12;
pub const DEFAULT_SEGMENT_SIZE: usize = 2432;
pub const LDM_CONTROL_WORD_SIZE: usize = 4;

/// Volume header record at the start of every Archive II file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeHeaderRecord {
    /// e.g. `AR2V0006.`
    pub tape_filename: String,
    pub extension_number: String,
    pub julian_date: u32,
    pub milliseconds: u32,
    pub icao: String,
}

impl VolumeHeaderRecord {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        Ok(Self {
            tape_filename: reader.read_string(9)?,
            extension_number: reader.read_string(3)?,
            julian_date: reader.read()?,
            milliseconds: reader.read()?,
            icao: reader.read_trimmed_string(4)?,
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        modified_julian_to_datetime(self.julian_date, self.milliseconds)
    }
}

/// Decodes every message in one uncompressed LDM record.
///
/// A single reassembly context spans the record so segmented messages are
/// rebuilt across slots.
pub fn decode_ldm_record(
    reader: &mut WireReader,
    factory: &Level2MessageFactory,
    ctx: &mut ReassemblyContext,
) -> Vec<Level2Message> {
    let mut messages = Vec::new();

    while !reader.is_at_end() {
        if reader.skip(CTM_HEADER_SIZE).is_err() {
            break;
        }

        let message_start = reader.position();
        let mut slot_size = DEFAULT_SEGMENT_SIZE - CTM_HEADER_SIZE;

        let mut peek = reader.clone();
        if let Ok(header) = Level2MessageHeader::decode(&mut peek) {
            if header.message_type == 29 || header.message_type == 31 {
                slot_size = header.message_length();
            }

            let info = factory.create(reader, ctx);
            if let Some(message) = info.message {
                messages.push(message);
            }
        } else {
            trace!(offset = message_start, "Skipping empty message slot");
        }

        let next = message_start + slot_size;
        if next >= reader.len() {
            break;
        }
        // Bounds checked above
        let _ = reader.seek(next);
    }

    messages
}

/// Splits the remainder of a volume into bzip2-compressed LDM records and
/// expands each one.
///
/// Each record is preceded by a big-endian control word whose magnitude is
/// the compressed size. A zero control word ends the list. Records that fail
/// to decompress are skipped.
pub fn decompress_ldm_records(reader: &mut WireReader) -> Vec<Bytes> {
    let mut records = Vec::new();

    while !reader.is_at_end() {
        let Ok(control_word) = reader.read::<i32>() else {
            warn!(offset = reader.position(), "Truncated LDM control word");
            break;
        };
        let record_size = control_word.unsigned_abs() as usize;
        if record_size == 0 {
            break;
        }

        let compressed = match reader.read_bytes(record_size) {
            Ok(compressed) => compressed,
            Err(e) => {
                warn!(record = records.len(), error = %e, "LDM record extends past end of file");
                break;
            }
        };

        match decompress_bzip2(&compressed) {
            Ok(record) => {
                trace!(compressed = record_size, decompressed = record.len(), "Decompressed LDM record");
                records.push(record);
            }
            Err(e) => warn!(record = records.len(), error = %e, "Failed to decompress LDM record"),
        }
    }

    debug!(records = records.len(), "Decompressed LDM records");
    records
}

/// A decoded Archive II volume.
#[derive(Debug, Clone)]
pub struct Archive2File {
    pub volume_header: VolumeHeaderRecord,
    pub messages: Vec<Level2Message>,
}

impl Archive2File {
    pub fn load_file(path: impl AsRef<Path>, factory: &Level2MessageFactory) -> DecodeResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading Archive II file");
        let data = std::fs::read(path)?;
        Self::load_data(Bytes::from(data), factory)
    }

    pub fn load_data(data: Bytes, factory: &Level2MessageFactory) -> DecodeResult<Self> {
        let mut reader = WireReader::new(data);
        let volume_header = VolumeHeaderRecord::decode(&mut reader)?;

        debug!(
            tape_filename = %volume_header.tape_filename,
            extension = %volume_header.extension_number,
            icao = %volume_header.icao,
            start_time = %volume_header.start_time(),
            "Read volume header record"
        );

        let mut ctx = factory.create_context();
        let mut messages = Vec::new();

        // Compressed records start with a 4-byte control word then the bzip2 magic
        if reader.peek_bytes(LDM_CONTROL_WORD_SIZE + 3).is_some_and(|b| is_bzip2(&b[LDM_CONTROL_WORD_SIZE..])) {
            for record in decompress_ldm_records(&mut reader) {
                let mut record_reader = WireReader::new(record);
                messages.extend(decode_ldm_record(&mut record_reader, factory, &mut ctx));
            }
        } else {
            messages = decode_ldm_record(&mut reader, factory, &mut ctx);
        }

        info!(
            icao = %volume_header.icao,
            messages = messages.len(),
            "Decoded Archive II volume"
        );

        Ok(Self {
            volume_header,
            messages,
        })
    }

    pub fn volume_coverage_pattern(&self) -> Option<&VolumeCoveragePatternData> {
        self.messages.iter().find_map(|m| match &m.data {
            Level2MessageData::VolumeCoveragePattern(vcp) => Some(vcp),
            _ => None,
        })
    }

    pub fn rda_status(&self) -> Option<&RdaStatusData> {
        self.messages.iter().find_map(|m| match &m.data {
            Level2MessageData::RdaStatus(status) => Some(status),
            _ => None,
        })
    }

    pub fn radials(&self) -> impl Iterator<Item = &DigitalRadarData> {
        self.messages.iter().filter_map(|m| match &m.data {
            Level2MessageData::DigitalRadarData(radial) => Some(radial),
            _ => None,
        })
    }

    /// Radials grouped by elevation number, in collection order.
    pub fn elevation_scans(&self) -> BTreeMap<u8, Vec<&DigitalRadarData>> {
        let mut scans: BTreeMap<u8, Vec<&DigitalRadarData>> = BTreeMap::new();
        for radial in self.radials() {
            scans.entry(radial.elevation_number).or_default().push(radial);
        }
        scans
    }
}
