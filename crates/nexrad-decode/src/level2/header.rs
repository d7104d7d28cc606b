//! Level II message header (16 bytes).

use crate::time::modified_julian_to_datetime;
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use chrono::{DateTime, Utc};

/// Size of the fixed message header in bytes.
pub const MESSAGE_HEADER_SIZE: usize = 16;

/// Message size value signalling that the true payload length is packed into
/// the segment fields.
pub const OVERSIZED_MESSAGE_SIZE: u16 = u16::MAX;

/// Fixed header preceding every Level II message segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level2MessageHeader {
    /// Segment size in halfwords, including this header
    pub message_size: u16,
    pub rda_redundant_channel: u8,
    pub message_type: u8,
    pub id_sequence_number: u16,
    pub julian_date: u16,
    pub milliseconds_of_day: u32,
    pub number_of_message_segments: u16,
    pub message_segment_number: u16,
}

impl Level2MessageHeader {
    /// Reads the 16 header bytes.
    ///
    /// Fails if the stream ends early or if the declared size cannot even
    /// contain the header itself.
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let header = Self {
            message_size: reader.read()?,
            rda_redundant_channel: reader.read()?,
            message_type: reader.read()?,
            id_sequence_number: reader.read()?,
            julian_date: reader.read()?,
            milliseconds_of_day: reader.read()?,
            number_of_message_segments: reader.read()?,
            message_segment_number: reader.read()?,
        };

        if !header.is_oversized() && (header.message_size as usize) * 2 < MESSAGE_HEADER_SIZE {
            return Err(DecodeError::InvalidHeader(format!(
                "message size of {} halfwords is smaller than the header",
                header.message_size
            )));
        }

        Ok(header)
    }

    /// True when the payload length is carried in the segment fields.
    pub fn is_oversized(&self) -> bool {
        self.message_size == OVERSIZED_MESSAGE_SIZE
    }

    /// Payload length in bytes, excluding this header.
    pub fn data_size(&self) -> usize {
        if self.is_oversized() {
            ((self.number_of_message_segments as usize) << 16) + self.message_segment_number as usize
        } else {
            (self.message_size as usize * 2).saturating_sub(MESSAGE_HEADER_SIZE)
        }
    }

    /// Total length in bytes, including this header.
    pub fn message_length(&self) -> usize {
        self.data_size() + MESSAGE_HEADER_SIZE
    }

    /// `(segment_number, total_segments)`, with oversized messages always
    /// reported as a single segment.
    pub fn segment(&self) -> (u16, u16) {
        if self.is_oversized() {
            (1, 1)
        } else {
            (self.message_segment_number, self.number_of_message_segments)
        }
    }

    pub fn is_segmented(&self) -> bool {
        self.segment().1 > 1
    }

    /// Rewrites the size and segment fields to describe a single segment
    /// carrying `data_size` payload bytes.
    pub(crate) fn set_single_segment_size(&mut self, data_size: usize) {
        let halfwords = (data_size + MESSAGE_HEADER_SIZE) / 2;
        if halfwords < OVERSIZED_MESSAGE_SIZE as usize {
            self.message_size = halfwords as u16;
            self.number_of_message_segments = 1;
            self.message_segment_number = 1;
        } else {
            self.message_size = OVERSIZED_MESSAGE_SIZE;
            self.number_of_message_segments = (data_size >> 16) as u16;
            self.message_segment_number = (data_size & 0xFFFF) as u16;
        }
    }

    /// Time the message was generated.
    pub fn timestamp(&self) -> DateTime<Utc> {
        modified_julian_to_datetime(self.julian_date as u32, self.milliseconds_of_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(size: u16, msg_type: u8, segments: u16, segment: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&size.to_be_bytes());
        out.push(0);
        out.push(msg_type);
        out.extend_from_slice(&7u16.to_be_bytes());
        out.extend_from_slice(&19294u16.to_be_bytes());
        out.extend_from_slice(&1000u32.to_be_bytes());
        out.extend_from_slice(&segments.to_be_bytes());
        out.extend_from_slice(&segment.to_be_bytes());
        out
    }

    #[test]
    fn test_decode_header_fields() {
        let mut reader = WireReader::new(header_bytes(20, 2, 1, 1));
        let header = Level2MessageHeader::decode(&mut reader).unwrap();
        assert_eq!(header.message_size, 20);
        assert_eq!(header.message_type, 2);
        assert_eq!(header.id_sequence_number, 7);
        assert_eq!(header.data_size(), 24);
        assert_eq!(header.segment(), (1, 1));
        assert_eq!(reader.position(), MESSAGE_HEADER_SIZE);
    }

    #[test]
    fn test_oversized_message_size() {
        let mut reader = WireReader::new(header_bytes(OVERSIZED_MESSAGE_SIZE, 31, 0x0002, 0x0010));
        let header = Level2MessageHeader::decode(&mut reader).unwrap();
        assert!(header.is_oversized());
        assert_eq!(header.data_size(), 0x20010);
        assert_eq!(header.segment(), (1, 1));
        assert!(!header.is_segmented());
    }

    #[test]
    fn test_undersized_header_rejected() {
        let mut reader = WireReader::new(header_bytes(4, 2, 1, 1));
        assert!(matches!(
            Level2MessageHeader::decode(&mut reader),
            Err(DecodeError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_single_segment_rewrite_round_trips_size() {
        let mut reader = WireReader::new(header_bytes(20, 15, 3, 3));
        let mut header = Level2MessageHeader::decode(&mut reader).unwrap();

        header.set_single_segment_size(5000);
        assert_eq!(header.data_size(), 5000);
        assert_eq!(header.segment(), (1, 1));

        header.set_single_segment_size(300_000);
        assert!(header.is_oversized());
        assert_eq!(header.data_size(), 300_000);
    }
}
