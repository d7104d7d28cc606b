//! Files holding a run of AWIPS text products.

use super::text_product::TextProductMessage;
use super::wmo_header::YearMonth;
use crate::wire::WireReader;
use crate::DecodeResult;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, trace};

/// `YYYYMMDD_HH` or `YYYYMMDDHH` anywhere in a file name.
static FILENAME_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((?:19|20)\d{2})(0[1-9]|1[0-2])(0[1-9]|[12]\d|3[01])_?([01]\d|2[0-3])").unwrap()
});

/// Extracts the year and month from a date token in a file name.
pub fn year_month_from_filename(filename: &str) -> Option<YearMonth> {
    let captures = FILENAME_DATE.captures(filename)?;
    let year = captures.get(1)?.as_str().parse().ok()?;
    let month = captures.get(2)?.as_str().parse().ok()?;
    YearMonth::new(year, month)
}

/// Outcome of loading a text product file.
#[derive(Debug, Clone, Default)]
pub struct TextProductFile {
    messages: Vec<TextProductMessage>,
    duplicates: usize,
}

impl TextProductFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> DecodeResult<bool> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading text product file");
        let data = std::fs::read(path)?;
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Ok(self.load_data(&filename, Bytes::from(data)))
    }

    /// Appends every product in `data`. Parsing stops at the end of the data
    /// or at the first header that fails to parse. Products whose header
    /// identity matches one already loaded are dropped.
    ///
    /// Returns true if the file holds at least one product.
    pub fn load_data(&mut self, filename: &str, data: Bytes) -> bool {
        let date_hint = year_month_from_filename(filename);
        if let Some(hint) = date_hint {
            trace!(filename, %hint, "Using date hint from file name");
        }

        let mut reader = WireReader::new(data);
        while !reader.is_at_end() {
            let message = match TextProductMessage::parse(&mut reader, date_hint) {
                Ok(message) => message,
                Err(e) => {
                    debug!(offset = reader.position(), error = %e, "Stopped reading text products");
                    break;
                }
            };

            if self.messages.iter().any(|m| m.header.same_identity(&message.header)) {
                trace!(awips_id = %message.header.awips_id(), "Skipping duplicate product");
                self.duplicates += 1;
                continue;
            }

            self.messages.push(message);
        }

        debug!(messages = self.messages.len(), duplicates = self.duplicates, "Loaded text products");
        !self.messages.is_empty()
    }

    pub fn messages(&self) -> &[TextProductMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Products skipped as repeats of one already loaded.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }
}
