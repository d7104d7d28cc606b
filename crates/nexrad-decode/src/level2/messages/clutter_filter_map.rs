//! Message type 15: clutter filter map.

use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use tracing::{trace, warn};

const MAX_ELEVATION_SEGMENTS: u16 = 5;
const AZIMUTH_SEGMENTS: usize = 360;
const MAX_RANGE_ZONES: u16 = 20;

/// One range zone along an azimuth segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeZone {
    /// 0 = bypass filter, 1 = bypass map in control, 2 = force filter
    pub op_code: u16,
    /// Zone end range in km
    pub end_range: u16,
}

/// Clutter filter zones for one elevation segment, indexed by azimuth
/// (one-degree segments).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationSegment {
    pub azimuth_segments: Vec<Vec<RangeZone>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClutterFilterMap {
    pub map_generation_date: u16,
    /// Minutes past midnight
    pub map_generation_time: u16,
    pub elevation_segments: Vec<ElevationSegment>,
}

impl ClutterFilterMap {
    pub fn decode(reader: &mut WireReader, data_size: usize) -> DecodeResult<Self> {
        trace!("Decoding Clutter Filter Map (Message Type 15)");
        let start = reader.position();

        let map_generation_date: u16 = reader.read()?;
        let map_generation_time: u16 = reader.read()?;
        let number_of_elevation_segments: u16 = reader.read()?;

        if number_of_elevation_segments == 0 || number_of_elevation_segments > MAX_ELEVATION_SEGMENTS {
            warn!(number_of_elevation_segments, "Invalid number of elevation segments");
            return Err(DecodeError::invalid_field(
                "number of elevation segments",
                format!("{} not in 1..={}", number_of_elevation_segments, MAX_ELEVATION_SEGMENTS),
            ));
        }

        let mut elevation_segments = Vec::with_capacity(number_of_elevation_segments as usize);
        for elevation in 0..number_of_elevation_segments {
            let mut azimuth_segments = Vec::with_capacity(AZIMUTH_SEGMENTS);
            for azimuth in 0..AZIMUTH_SEGMENTS {
                let number_of_range_zones: u16 = reader.read()?;
                if number_of_range_zones == 0 || number_of_range_zones > MAX_RANGE_ZONES {
                    warn!(elevation, azimuth, number_of_range_zones, "Invalid number of range zones");
                    return Err(DecodeError::invalid_field(
                        "number of range zones",
                        format!("{} not in 1..={}", number_of_range_zones, MAX_RANGE_ZONES),
                    ));
                }
                let zones = (0..number_of_range_zones)
                    .map(|_| -> DecodeResult<RangeZone> {
                        Ok(RangeZone {
                            op_code: reader.read()?,
                            end_range: reader.read()?,
                        })
                    })
                    .collect::<DecodeResult<Vec<_>>>()?;
                azimuth_segments.push(zones);
            }
            elevation_segments.push(ElevationSegment { azimuth_segments });
        }

        reader.validate_message(reader.position() - start, data_size)?;

        Ok(Self {
            map_generation_date,
            map_generation_time,
            elevation_segments,
        })
    }

    /// Range zones for an elevation segment and azimuth (degrees).
    pub fn range_zones(&self, elevation_segment: usize, azimuth: usize) -> Option<&[RangeZone]> {
        self.elevation_segments
            .get(elevation_segment)?
            .azimuth_segments
            .get(azimuth)
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_payload(elevations: u16, zones: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&19294u16.to_be_bytes());
        out.extend_from_slice(&720u16.to_be_bytes());
        out.extend_from_slice(&elevations.to_be_bytes());
        for _ in 0..elevations {
            for _ in 0..AZIMUTH_SEGMENTS {
                out.extend_from_slice(&zones.to_be_bytes());
                for z in 0..zones {
                    out.extend_from_slice(&(z % 3).to_be_bytes());
                    out.extend_from_slice(&(100 * (z + 1)).to_be_bytes());
                }
            }
        }
        out
    }

    #[test]
    fn test_decode_clutter_filter_map() {
        let payload = map_payload(2, 2);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        let map = ClutterFilterMap::decode(&mut reader, size).unwrap();

        assert_eq!(map.map_generation_time, 720);
        assert_eq!(map.elevation_segments.len(), 2);
        let zones = map.range_zones(1, 359).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1], RangeZone { op_code: 1, end_range: 200 });
        assert!(map.range_zones(2, 0).is_none());
    }

    #[test]
    fn test_invalid_range_zone_count() {
        let payload = map_payload(1, 0);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        assert!(ClutterFilterMap::decode(&mut reader, size).is_err());
    }

    #[test]
    fn test_invalid_elevation_segment_count() {
        let payload = map_payload(6, 1);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        assert!(ClutterFilterMap::decode(&mut reader, size).is_err());
    }
}
