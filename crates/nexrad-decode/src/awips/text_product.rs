//! A single AWIPS text product: WMO header plus free text body.

use super::wmo_header::{WmoHeader, YearMonth};
use crate::wire::{WireReader, ETX};
use crate::DecodeResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Line that closes a segment of a multi-segment product.
const SEGMENT_END: &str = "$$";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextProductMessage {
    pub header: WmoHeader,
    /// Body lines after the AWIPS identifier line, up to the end of text
    pub lines: Vec<String>,
}

impl TextProductMessage {
    /// Parses a header and body. The body ends at ETX or end of data; the
    /// ETX and any trailing line breaks, NULs and spaces are consumed.
    pub fn parse(reader: &mut WireReader, date_hint: Option<YearMonth>) -> DecodeResult<Self> {
        let header = WmoHeader::parse_with_hint(reader, date_hint)?;

        let mut lines = Vec::new();
        loop {
            if reader.peek::<u8>() == Some(ETX) {
                reader.skip(1)?;
                break;
            }
            match reader.read_line() {
                Some(line) => lines.push(line),
                None => break,
            }
        }

        while matches!(reader.peek::<u8>(), Some(b'\r' | b'\n' | b'\0' | b' ')) {
            reader.skip(1)?;
        }

        Ok(Self { header, lines })
    }

    /// Issuance time resolved from the header.
    pub fn issued(&self, end_time_hint: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        self.header.resolve(end_time_hint)
    }

    /// Body split into segments at `$$` lines. Blank lines between segments
    /// are dropped.
    pub fn segments(&self) -> Vec<&[String]> {
        let mut segments = Vec::new();
        let mut start = 0;
        for (i, line) in self.lines.iter().enumerate() {
            if line.trim() == SEGMENT_END {
                segments.push(&self.lines[start..i]);
                start = i + 1;
            }
        }
        segments.push(&self.lines[start..]);

        segments
            .into_iter()
            .map(|segment| {
                let first = segment.iter().position(|l| !l.trim().is_empty()).unwrap_or(segment.len());
                let last = segment.iter().rposition(|l| !l.trim().is_empty()).map_or(first, |i| i + 1);
                &segment[first..last.max(first)]
            })
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}
