//! Message type 2: RDA status.

use crate::wire::WireReader;
use crate::DecodeResult;
use tracing::trace;

/// Size of the status body before RDA Build 18.
const LEGACY_SIZE: usize = 80;

/// RDA status data. Build 18 and later append signal processing options,
/// the downloaded pattern number and a status version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdaStatusData {
    pub rda_status: u16,
    pub operability_status: u16,
    pub control_status: u16,
    pub auxiliary_power_generator_state: u16,
    pub average_transmitter_power: u16,
    pub horizontal_reflectivity_calibration_correction: i16,
    pub data_transmission_enabled: u16,
    pub volume_coverage_pattern_number: i16,
    pub rda_control_authorization: u16,
    pub rda_build_number: u16,
    pub operational_mode: u16,
    pub super_resolution_status: u16,
    pub clutter_mitigation_decision_status: u16,
    pub rda_scan_and_data_flags: u16,
    pub rda_alarm_summary: u16,
    pub command_acknowledgement: u16,
    pub channel_control_status: u16,
    pub spot_blanking_status: u16,
    pub bypass_map_generation_date: u16,
    pub bypass_map_generation_time: u16,
    pub clutter_filter_map_generation_date: u16,
    pub clutter_filter_map_generation_time: u16,
    pub vertical_reflectivity_calibration_correction: i16,
    pub transition_power_source_status: u16,
    pub rms_control_status: u16,
    pub performance_check_status: u16,
    pub alarm_codes: [u16; 14],
    pub signal_processing_options: Option<u16>,
    pub downloaded_pattern_number: Option<u16>,
    pub status_version: Option<u16>,
}

impl RdaStatusData {
    pub fn decode(reader: &mut WireReader, data_size: usize) -> DecodeResult<Self> {
        trace!("Decoding RDA Status Data (Message Type 2)");
        let start = reader.position();

        let mut status = Self {
            rda_status: reader.read()?,
            operability_status: reader.read()?,
            control_status: reader.read()?,
            auxiliary_power_generator_state: reader.read()?,
            average_transmitter_power: reader.read()?,
            horizontal_reflectivity_calibration_correction: reader.read()?,
            data_transmission_enabled: reader.read()?,
            volume_coverage_pattern_number: reader.read()?,
            rda_control_authorization: reader.read()?,
            rda_build_number: reader.read()?,
            operational_mode: reader.read()?,
            super_resolution_status: reader.read()?,
            clutter_mitigation_decision_status: reader.read()?,
            rda_scan_and_data_flags: reader.read()?,
            rda_alarm_summary: reader.read()?,
            command_acknowledgement: reader.read()?,
            channel_control_status: reader.read()?,
            spot_blanking_status: reader.read()?,
            bypass_map_generation_date: reader.read()?,
            bypass_map_generation_time: reader.read()?,
            clutter_filter_map_generation_date: reader.read()?,
            clutter_filter_map_generation_time: reader.read()?,
            vertical_reflectivity_calibration_correction: reader.read()?,
            transition_power_source_status: reader.read()?,
            rms_control_status: reader.read()?,
            performance_check_status: reader.read()?,
            alarm_codes: [0; 14],
            signal_processing_options: None,
            downloaded_pattern_number: None,
            status_version: None,
        };
        for code in status.alarm_codes.iter_mut() {
            *code = reader.read()?;
        }

        if data_size > LEGACY_SIZE {
            status.signal_processing_options = Some(reader.read()?);
            // Halfwords 42-58 are spare
            reader.skip(34)?;
            status.downloaded_pattern_number = Some(reader.read()?);
            status.status_version = Some(reader.read()?);
        }

        reader.validate_message(reader.position() - start, data_size)?;
        Ok(status)
    }

    /// Horizontal reflectivity calibration correction in dB.
    pub fn horizontal_calibration_correction_db(&self) -> f32 {
        self.horizontal_reflectivity_calibration_correction as f32 * 0.01
    }

    /// RDA build number as a version, e.g. `19.0`.
    pub fn build_version(&self) -> f32 {
        if self.rda_build_number >= 100 {
            self.rda_build_number as f32 / 100.0
        } else {
            self.rda_build_number as f32 / 10.0
        }
    }
}
