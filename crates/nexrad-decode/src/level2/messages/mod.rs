//! Typed Level II message bodies.

mod clutter_filter_map;
mod digital_radar_data;
mod rda_prf;
mod rda_status;
mod volume_coverage_pattern;

pub use clutter_filter_map::{ClutterFilterMap, ElevationSegment, RangeZone};
pub use digital_radar_data::{
    DigitalRadarData, ElevationDataBlock, MomentData, MomentDataBlock, MomentType, RadialDataBlock,
    VolumeDataBlock,
};
pub use rda_prf::{RdaPrfData, WaveformPrf};
pub use rda_status::RdaStatusData;
pub use volume_coverage_pattern::{ElevationCut, SectorParameters, VolumeCoveragePatternData};

use super::header::Level2MessageHeader;
use crate::wire::WireReader;
use crate::DecodeResult;
use std::fmt;

/// Level II message types with a registered decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    RdaStatusData,
    VolumeCoveragePatternData,
    ClutterFilterMap,
    DigitalRadarDataGeneric,
    RdaPrfData,
}

impl MessageType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(Self::RdaStatusData),
            5 => Some(Self::VolumeCoveragePatternData),
            15 => Some(Self::ClutterFilterMap),
            31 => Some(Self::DigitalRadarDataGeneric),
            32 => Some(Self::RdaPrfData),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::RdaStatusData => 2,
            Self::VolumeCoveragePatternData => 5,
            Self::ClutterFilterMap => 15,
            Self::DigitalRadarDataGeneric => 31,
            Self::RdaPrfData => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RdaStatusData => "RDA Status Data",
            Self::VolumeCoveragePatternData => "Volume Coverage Pattern Data",
            Self::ClutterFilterMap => "Clutter Filter Map",
            Self::DigitalRadarDataGeneric => "Digital Radar Data Generic Format",
            Self::RdaPrfData => "RDA PRF Data",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

/// Decoded body of a Level II message.
#[derive(Debug, Clone, PartialEq)]
pub enum Level2MessageData {
    RdaStatus(RdaStatusData),
    VolumeCoveragePattern(VolumeCoveragePatternData),
    ClutterFilterMap(ClutterFilterMap),
    DigitalRadarData(DigitalRadarData),
    RdaPrf(RdaPrfData),
}

/// A complete Level II message: header plus typed body.
#[derive(Debug, Clone, PartialEq)]
pub struct Level2Message {
    pub header: Level2MessageHeader,
    pub data: Level2MessageData,
}

impl Level2Message {
    /// Decodes the payload following `header`. The reader must be positioned
    /// at the start of the payload; on success it is left at the payload end.
    pub fn decode(
        message_type: MessageType,
        header: Level2MessageHeader,
        reader: &mut WireReader,
    ) -> DecodeResult<Self> {
        let data_size = header.data_size();
        let data = match message_type {
            MessageType::RdaStatusData => {
                Level2MessageData::RdaStatus(RdaStatusData::decode(reader, data_size)?)
            }
            MessageType::VolumeCoveragePatternData => Level2MessageData::VolumeCoveragePattern(
                VolumeCoveragePatternData::decode(reader, data_size)?,
            ),
            MessageType::ClutterFilterMap => {
                Level2MessageData::ClutterFilterMap(ClutterFilterMap::decode(reader, data_size)?)
            }
            MessageType::DigitalRadarDataGeneric => {
                Level2MessageData::DigitalRadarData(DigitalRadarData::decode(reader, data_size)?)
            }
            MessageType::RdaPrfData => Level2MessageData::RdaPrf(RdaPrfData::decode(reader, data_size)?),
        };
        Ok(Self { header, data })
    }

    pub fn message_type(&self) -> MessageType {
        match &self.data {
            Level2MessageData::RdaStatus(_) => MessageType::RdaStatusData,
            Level2MessageData::VolumeCoveragePattern(_) => MessageType::VolumeCoveragePatternData,
            Level2MessageData::ClutterFilterMap(_) => MessageType::ClutterFilterMap,
            Level2MessageData::DigitalRadarData(_) => MessageType::DigitalRadarDataGeneric,
            Level2MessageData::RdaPrf(_) => MessageType::RdaPrfData,
        }
    }
}
