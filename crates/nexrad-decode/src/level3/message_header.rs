//! Level III message header block (18 bytes).

use crate::time::modified_julian_seconds_to_datetime;
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use chrono::{DateTime, Utc};

pub const LEVEL3_HEADER_SIZE: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level3MessageHeader {
    pub message_code: i16,
    pub date_of_message: u16,
    /// Seconds past midnight
    pub time_of_message: u32,
    /// Length of the whole message in bytes, including this header
    pub length_of_message: u32,
    pub source_id: u16,
    pub destination_id: u16,
    pub number_of_blocks: u16,
}

impl Level3MessageHeader {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let header = Self {
            message_code: reader.read()?,
            date_of_message: reader.read()?,
            time_of_message: reader.read()?,
            length_of_message: reader.read()?,
            source_id: reader.read()?,
            destination_id: reader.read()?,
            number_of_blocks: reader.read()?,
        };

        if (header.length_of_message as usize) < LEVEL3_HEADER_SIZE {
            return Err(DecodeError::InvalidHeader(format!(
                "message length {} is shorter than the header",
                header.length_of_message
            )));
        }
        if header.number_of_blocks == 0 {
            return Err(DecodeError::InvalidHeader("message declares no blocks".to_string()));
        }

        Ok(header)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        modified_julian_seconds_to_datetime(self.date_of_message, self.time_of_message)
    }
}
