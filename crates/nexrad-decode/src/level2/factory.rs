//! Level II message dispatch and multi-segment reassembly.

use super::header::Level2MessageHeader;
use super::messages::{Level2Message, MessageType};
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Tunables for segment reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReassemblyConfig {
    /// Lower bound on the number of segments' worth of space added when a
    /// message outgrows its initial size estimate
    pub min_growth_segments: u16,
    /// Upper bound on a reassembled message. Larger messages are rejected
    /// and their segments skipped.
    pub max_message_bytes: usize,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            min_growth_segments: 100,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

/// Default cap on a reassembled message, well above the largest clutter
/// filter map.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Default)]
enum ReassemblyState {
    #[default]
    Idle,
    Buffering {
        message_type: u8,
        total_segments: u16,
        next_segment: u16,
        buffer: BytesMut,
        filled: usize,
    },
}

/// Buffered state for one decode session.
///
/// A context holds at most one partially received message. Starting a new
/// message, a sequencing error, or running out of data discards it.
#[derive(Debug, Default)]
pub struct ReassemblyContext {
    state: ReassemblyState,
}

impl ReassemblyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_buffering(&self) -> bool {
        matches!(self.state, ReassemblyState::Buffering { .. })
    }

    /// Payload bytes received so far for the pending message.
    pub fn buffered_bytes(&self) -> usize {
        match &self.state {
            ReassemblyState::Idle => 0,
            ReassemblyState::Buffering { filled, .. } => *filled,
        }
    }

    /// Current size of the reassembly buffer.
    pub fn allocated_bytes(&self) -> usize {
        match &self.state {
            ReassemblyState::Idle => 0,
            ReassemblyState::Buffering { buffer, .. } => buffer.len(),
        }
    }

    /// Drops any partially received message.
    pub fn reset(&mut self) {
        self.state = ReassemblyState::Idle;
    }
}

/// Outcome of a single [`Level2MessageFactory::create`] call.
#[derive(Debug, Default)]
pub struct Level2MessageInfo {
    /// Header of the segment that was read, if it parsed
    pub header: Option<Level2MessageHeader>,
    /// Present only when a complete message decoded successfully
    pub message: Option<Level2Message>,
    pub header_valid: bool,
    pub message_valid: bool,
}

/// Reads Level II messages from a stream, reassembling segmented messages.
#[derive(Debug, Clone, Default)]
pub struct Level2MessageFactory {
    config: ReassemblyConfig,
}

impl Level2MessageFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReassemblyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReassemblyConfig {
        &self.config
    }

    pub fn create_context(&self) -> ReassemblyContext {
        ReassemblyContext::new()
    }

    /// Reads one message segment from `reader`.
    ///
    /// Single-segment messages are decoded immediately. Segments of a larger
    /// message are buffered in `ctx`; the decoded message is returned with the
    /// final segment. Intermediate segments and rejected input yield an info
    /// with no message.
    pub fn create(&self, reader: &mut WireReader, ctx: &mut ReassemblyContext) -> Level2MessageInfo {
        let mut info = Level2MessageInfo::default();

        let header = match Level2MessageHeader::decode(reader) {
            Ok(header) => header,
            Err(e) => {
                warn!(error = %e, offset = reader.position(), "Invalid Level II message header");
                return info;
            }
        };
        info.header_valid = true;
        info.header = Some(header.clone());

        let data_size = header.data_size();
        let (segment, total_segments) = header.segment();

        let Some(message_type) = MessageType::from_code(header.message_type) else {
            warn!(message_type = header.message_type, "Unknown message type");
            skip_payload(reader, data_size);
            return info;
        };

        if total_segments <= 1 {
            trace!(message_type = %message_type, size = data_size, "Found message");
            let payload_start = reader.position();
            match Level2Message::decode(message_type, header, reader) {
                Ok(message) => info.message = Some(message),
                Err(e) => {
                    warn!(message_type = %message_type, error = %e, "Failed to decode message");
                    resync(reader, payload_start + data_size);
                }
            }
        } else {
            trace!(
                message_type = %message_type,
                segment,
                total_segments,
                "Found message segment"
            );
            match self.buffer_segment(reader, ctx, &header, data_size) {
                Ok(Some(payload)) => {
                    let mut reassembled = header;
                    reassembled.set_single_segment_size(payload.len());
                    let mut message_reader = WireReader::new(payload);
                    match Level2Message::decode(message_type, reassembled, &mut message_reader) {
                        Ok(message) => info.message = Some(message),
                        Err(e) => {
                            warn!(message_type = %message_type, error = %e, "Failed to decode reassembled message")
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(message_type = %message_type, segment, total_segments, error = %e, "Rejected message segment")
                }
            }
        }

        info.message_valid = info.message.is_some();
        info
    }

    /// Appends one segment's payload to the context, returning the complete
    /// payload once the final segment arrives.
    fn buffer_segment(
        &self,
        reader: &mut WireReader,
        ctx: &mut ReassemblyContext,
        header: &Level2MessageHeader,
        data_size: usize,
    ) -> DecodeResult<Option<Bytes>> {
        let (segment, total_segments) = header.segment();

        if segment == 1 {
            if ctx.is_buffering() {
                debug!(
                    discarded = ctx.buffered_bytes(),
                    "New message started before previous message completed"
                );
            }
            ctx.state = ReassemblyState::Buffering {
                message_type: header.message_type,
                total_segments,
                next_segment: 1,
                buffer: BytesMut::new(),
                filled: 0,
            };
        }

        let expected = match &ctx.state {
            ReassemblyState::Idle => {
                skip_payload(reader, data_size);
                return Err(DecodeError::SegmentSequence {
                    segment,
                    total: total_segments,
                    reason: "message did not start at segment 1".to_string(),
                });
            }
            ReassemblyState::Buffering {
                message_type,
                total_segments,
                next_segment,
                ..
            } => (*message_type, *total_segments, *next_segment),
        };

        if expected != (header.message_type, total_segments, segment) {
            ctx.reset();
            skip_payload(reader, data_size);
            return Err(DecodeError::SegmentSequence {
                segment,
                total: total_segments,
                reason: format!(
                    "expected segment {} of {} for message type {}",
                    expected.2, expected.1, expected.0
                ),
            });
        }

        let max_bytes = self.config.max_message_bytes;
        let buffered = ctx.buffered_bytes();
        if buffered + data_size > max_bytes {
            ctx.reset();
            skip_payload(reader, data_size);
            return Err(DecodeError::invalid_field(
                "reassembled message size",
                format!(
                    "{} bytes buffered plus {} in segment {} exceeds {} bytes",
                    buffered, data_size, segment, max_bytes
                ),
            ));
        }

        let payload = match reader.read_bytes(data_size) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(segment, total_segments, "End of data reached while buffering message");
                ctx.reset();
                return Err(e);
            }
        };

        let ReassemblyState::Buffering {
            next_segment,
            buffer,
            filled,
            ..
        } = &mut ctx.state
        else {
            return Ok(None);
        };

        if buffer.len() < *filled + data_size {
            // Both estimates are capped at the maximum message size
            let new_len = if segment == 1 {
                data_size.saturating_mul(total_segments as usize)
            } else {
                let remaining_segments = (total_segments - segment + 1).max(self.config.min_growth_segments);
                let new_len = *filled + (remaining_segments as usize).saturating_mul(data_size);
                debug!(
                    current = buffer.len(),
                    new_len, segment, total_segments, "Reassembly buffer too small, growing"
                );
                new_len
            };
            buffer.resize(new_len.min(max_bytes), 0);
        }

        buffer[*filled..*filled + data_size].copy_from_slice(&payload);
        *filled += data_size;

        if segment < total_segments {
            *next_segment = segment + 1;
            return Ok(None);
        }

        let state = std::mem::take(&mut ctx.state);
        match state {
            ReassemblyState::Buffering {
                mut buffer, filled, ..
            } => {
                buffer.truncate(filled);
                Ok(Some(buffer.freeze()))
            }
            ReassemblyState::Idle => Ok(None),
        }
    }
}

fn skip_payload(reader: &mut WireReader, data_size: usize) {
    if let Err(e) = reader.skip(data_size) {
        trace!(error = %e, "Payload extends past end of data");
    }
}

fn resync(reader: &mut WireReader, offset: usize) {
    let offset = offset.min(reader.len());
    if reader.position() != offset {
        trace!(from = reader.position(), to = offset, "Resynchronizing to message boundary");
        // Clamped to the buffer length, so the seek cannot fail.
        let _ = reader.seek(offset);
    }
}
