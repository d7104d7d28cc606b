//! Level III product files, optionally prefixed by a WMO header.

use super::factory::{Level3Message, Level3MessageFactory};
use crate::awips::WmoHeader;
use crate::wire::WireReader;
use crate::DecodeResult;
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct Level3File {
    pub wmo_header: Option<WmoHeader>,
    pub message: Level3Message,
}

impl Level3File {
    pub fn load_file(path: impl AsRef<Path>) -> DecodeResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading Level III file");
        let data = std::fs::read(path)?;
        Self::load_data(Bytes::from(data))
    }

    pub fn load_data(data: Bytes) -> DecodeResult<Self> {
        let mut reader = WireReader::new(data);

        // Products pulled straight from the RPG have no bulletin header
        let mut candidate = reader.clone();
        let wmo_header = match WmoHeader::parse(&mut candidate) {
            Ok(header) => {
                reader = candidate;
                reader.clear_exhausted();
                Some(header)
            }
            Err(e) => {
                debug!(error = %e, "No WMO header, decoding from start of data");
                None
            }
        };

        let message = Level3MessageFactory::create(&mut reader)?;

        info!(
            awips_id = wmo_header.as_ref().map(|h| h.awips_id()).unwrap_or_default(),
            product_code = message.product_code(),
            "Decoded Level III product"
        );

        Ok(Self { wmo_header, message })
    }

    /// AWIPS product identifier from the WMO header, e.g. `N0QTLX`.
    pub fn awips_id(&self) -> Option<String> {
        self.wmo_header.as_ref().map(WmoHeader::awips_id)
    }
}
