//! WMO abbreviated heading and AWIPS identifier line.
//!
//! ```text
//! [SOH]
//! nnn
//! T1T2A1A2ii CCCC YYGGgg [BBB]
//! NNNxxx
//! ```
//!
//! The heading carries only day, hour and minute. A full timestamp needs a
//! year and month from somewhere else: an explicit hint (usually parsed from
//! a file name) or the end time of whatever the product is displayed against.

use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{trace, warn};

const START_OF_HEADING: u8 = 0x01;
const MIN_HEADING_LINE_LENGTH: usize = 18;
const IDENTIFIER_LENGTH_MIN: usize = 5;
const IDENTIFIER_LENGTH_MAX: usize = 6;
const ICAO_LENGTH: usize = 4;
const DATE_TIME_LENGTH: usize = 6;
const BBB_LENGTH: usize = 3;
const PRODUCT_LINE_LENGTH: usize = 6;

/// A calendar year and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` unless `month` is 1-12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    fn from_datetime(time: &DateTime<Utc>) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
        }
    }

    /// Combines with a day of month and time of day. Days past the end of
    /// the month carry into the next one.
    fn at(&self, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let naive = first.and_hms_opt(0, 0, 0)?
            + Duration::days(i64::from(day) - 1)
            + Duration::hours(i64::from(hour))
            + Duration::minutes(i64::from(minute));
        Some(Utc.from_utc_datetime(&naive))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A parsed WMO bulletin header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WmoHeader {
    pub sequence_number: String,
    /// T1T2
    pub data_type: String,
    /// A1A2
    pub geographic_designator: String,
    /// ii
    pub bulletin_id: String,
    /// Originating office, CCCC
    pub icao: String,
    /// YYGGgg
    pub date_time: String,
    /// Amendment, correction or delay indicator
    pub bbb_indicator: String,
    /// NNN
    pub product_category: String,
    /// xxx
    pub product_designator: String,
    date_hint: Option<YearMonth>,
}

impl WmoHeader {
    /// Parses a header from the reader's position.
    pub fn parse(reader: &mut WireReader) -> DecodeResult<Self> {
        Self::parse_with_hint(reader, None)
    }

    /// Parses a header with a year-month hint already attached.
    pub fn parse_with_hint(reader: &mut WireReader, date_hint: Option<YearMonth>) -> DecodeResult<Self> {
        let mut sequence_line = String::new();

        let heading_line = if reader.peek::<u8>() == Some(START_OF_HEADING) {
            let _soh = reader.read_line();
            sequence_line = reader.read_line().unwrap_or_default();
            reader.read_line()
        } else {
            match reader.read_line() {
                // A short first line is the sequence number
                Some(line) if line.len() < MIN_HEADING_LINE_LENGTH => {
                    sequence_line = line;
                    reader.read_line()
                }
                line => line,
            }
        };

        let (heading_line, product_line) = match (heading_line, reader.read_line()) {
            (Some(heading), Some(product)) => (heading, product),
            _ => {
                trace!("Reached end of data before the product identifier line");
                return Err(DecodeError::Truncated {
                    offset: reader.position(),
                    needed: PRODUCT_LINE_LENGTH,
                    available: 0,
                });
            }
        };

        let tokens: Vec<&str> = heading_line.split_whitespace().collect();
        if tokens.len() < 3 || tokens.len() > 4 {
            warn!(line = %heading_line, "Invalid number of WMO tokens");
            return Err(DecodeError::InvalidHeader(format!(
                "expected 3 or 4 heading tokens, found {}",
                tokens.len()
            )));
        }

        let identifier = tokens[0];
        if !(IDENTIFIER_LENGTH_MIN..=IDENTIFIER_LENGTH_MAX).contains(&identifier.len()) || !identifier.is_ascii() {
            warn!(identifier, "WMO identifier malformed");
            return Err(DecodeError::InvalidHeader(format!("WMO identifier {:?}", identifier)));
        }
        if tokens[1].len() != ICAO_LENGTH {
            warn!(icao = tokens[1], "ICAO malformed");
            return Err(DecodeError::InvalidHeader(format!("ICAO {:?}", tokens[1])));
        }
        if tokens[2].len() != DATE_TIME_LENGTH {
            warn!(date_time = tokens[2], "Date/time malformed");
            return Err(DecodeError::InvalidHeader(format!("date/time {:?}", tokens[2])));
        }
        let bbb_indicator = match tokens.get(3) {
            Some(bbb) if bbb.len() != BBB_LENGTH => {
                warn!(bbb, "BBB indicator malformed");
                return Err(DecodeError::InvalidHeader(format!("BBB indicator {:?}", bbb)));
            }
            Some(bbb) => bbb.to_string(),
            None => String::new(),
        };

        if product_line.len() != PRODUCT_LINE_LENGTH || !product_line.is_ascii() {
            warn!(line = %product_line, "AWIPS identifier line bad size");
            return Err(DecodeError::InvalidHeader(format!(
                "AWIPS identifier line {:?}",
                product_line
            )));
        }

        Ok(Self {
            sequence_number: sequence_line.trim_end_matches(' ').to_string(),
            data_type: identifier[..2].to_string(),
            geographic_designator: identifier[2..4].to_string(),
            bulletin_id: identifier[4..].to_string(),
            icao: tokens[1].to_string(),
            date_time: tokens[2].to_string(),
            bbb_indicator,
            product_category: product_line[..3].to_string(),
            product_designator: product_line[3..].to_string(),
            date_hint,
        })
    }

    pub fn set_date_hint(&mut self, hint: YearMonth) {
        self.date_hint = Some(hint);
    }

    pub fn date_hint(&self) -> Option<YearMonth> {
        self.date_hint
    }

    /// Product category and designator, e.g. `TOROUN`.
    pub fn awips_id(&self) -> String {
        format!("{}{}", self.product_category, self.product_designator)
    }

    /// Compares everything that identifies a product issuance. The
    /// transmission sequence number is ignored, as the same product is
    /// often relayed more than once.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.data_type == other.data_type
            && self.geographic_designator == other.geographic_designator
            && self.bulletin_id == other.bulletin_id
            && self.icao == other.icao
            && self.date_time == other.date_time
            && self.bbb_indicator == other.bbb_indicator
            && self.product_category == other.product_category
            && self.product_designator == other.product_designator
    }

    /// Day of month, hour and minute from the heading, if well formed.
    pub fn day_hour_minute(&self) -> Option<(u32, u32, u32)> {
        if self.date_time.len() != DATE_TIME_LENGTH || !self.date_time.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let field = |range: std::ops::Range<usize>| self.date_time[range].parse::<u32>().ok();
        let (day, hour, minute) = (field(0..2)?, field(2..4)?, field(4..6)?);
        if !(1..=31).contains(&day) || hour > 23 || minute > 59 {
            return None;
        }
        Some((day, hour, minute))
    }

    /// Resolves the heading's day/hour/minute to an absolute time.
    ///
    /// A year-month hint is used as is. Otherwise the end time hint supplies
    /// the year and month; if that lands more than a day after the end time
    /// the product is taken to be from the previous month.
    pub fn resolve(&self, end_time_hint: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        let (day, hour, minute) = self.day_hour_minute()?;

        if let Some(hint) = self.date_hint {
            return hint.at(day, hour, minute);
        }

        let end_time = end_time_hint?;
        let year_month = YearMonth::from_datetime(&end_time);
        let candidate = year_month.at(day, hour, minute)?;
        if candidate > end_time + Duration::hours(24) {
            year_month.previous().at(day, hour, minute)
        } else {
            Some(candidate)
        }
    }

    /// Like [`resolve`](Self::resolve), falling back to the Unix epoch.
    pub fn date_time(&self, end_time_hint: Option<DateTime<Utc>>) -> DateTime<Utc> {
        self.resolve(end_time_hint).unwrap_or_default()
    }
}
