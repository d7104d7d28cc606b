//! NEXRAD Level II (RDA) message decoding.
//!
//! Messages are read one segment at a time through [`Level2MessageFactory`],
//! which dispatches complete messages to typed decoders and reassembles
//! segmented messages using a caller-owned [`ReassemblyContext`].

pub mod archive;
pub mod factory;
pub mod header;
pub mod messages;

pub use archive::{decode_ldm_record, Archive2File, VolumeHeaderRecord};
pub use factory::{
    Level2MessageFactory, Level2MessageInfo, ReassemblyConfig, ReassemblyContext, DEFAULT_MAX_MESSAGE_BYTES,
};
pub use header::{Level2MessageHeader, MESSAGE_HEADER_SIZE};
pub use messages::{Level2Message, Level2MessageData, MessageType};
