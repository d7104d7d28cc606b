//! Decoders for NEXRAD weather radar data and AWIPS text products.
//!
//! This crate parses the binary formats broadcast by WSR-88D radar sites:
//!
//! - **Level II**: RDA messages from Archive II volumes, including
//!   multi-segment reassembly ([`level2`])
//! - **Level III**: RPG graphic products with their description block and
//!   display packets ([`level3`])
//! - **AWIPS text**: WMO bulletin headers and free text products ([`awips`])
//!
//! bzip2-compressed Archive II records and Level III products are expanded
//! transparently ([`compression`]).
//!
//! # Error Handling
//!
//! Decoders never panic on malformed input. Inner decoders return
//! [`DecodeResult`]; stream-level entry points such as
//! [`level2::Level2MessageFactory::create`] report validity alongside
//! whatever was decoded so callers can keep reading past a bad message.
//!
//! # Logging
//!
//! Diagnostics are emitted through `tracing`. The crate never installs a
//! subscriber.

pub mod awips;
pub mod compression;
pub mod error;
pub mod level2;
pub mod level3;
pub mod time;
pub mod wire;

pub use error::{DecodeError, DecodeResult};
pub use wire::WireReader;
