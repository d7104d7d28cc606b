//! Message type 5: volume coverage pattern.

use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use tracing::{trace, warn};

const MAX_ELEVATION_CUTS: u16 = 32;

/// Degrees per unit of a 16-bit coded angle.
const ANGLE_SCALE: f32 = 180.0 / 32768.0;
/// Degrees per second per unit of a coded azimuth rate.
const AZIMUTH_RATE_SCALE: f32 = 22.5 / 16384.0;

/// Doppler parameters for one of the three azimuth sectors of a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorParameters {
    pub edge_angle: u16,
    pub doppler_prf_number: u16,
    pub doppler_prf_pulse_count: u16,
}

/// Scan parameters for a single elevation cut (46 bytes on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationCut {
    pub elevation_angle_raw: u16,
    pub channel_configuration: u8,
    pub waveform_type: u8,
    pub super_resolution_control: u8,
    pub surveillance_prf_number: u8,
    pub surveillance_prf_pulse_count: u16,
    pub azimuth_rate_raw: u16,
    pub reflectivity_threshold: i16,
    pub velocity_threshold: i16,
    pub spectrum_width_threshold: i16,
    pub differential_reflectivity_threshold: i16,
    pub differential_phase_threshold: i16,
    pub correlation_coefficient_threshold: i16,
    pub sectors: [SectorParameters; 3],
}

impl ElevationCut {
    fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let mut cut = Self {
            elevation_angle_raw: reader.read()?,
            channel_configuration: reader.read()?,
            waveform_type: reader.read()?,
            super_resolution_control: reader.read()?,
            surveillance_prf_number: reader.read()?,
            surveillance_prf_pulse_count: reader.read()?,
            azimuth_rate_raw: reader.read()?,
            reflectivity_threshold: reader.read()?,
            velocity_threshold: reader.read()?,
            spectrum_width_threshold: reader.read()?,
            differential_reflectivity_threshold: reader.read()?,
            differential_phase_threshold: reader.read()?,
            correlation_coefficient_threshold: reader.read()?,
            sectors: [SectorParameters {
                edge_angle: 0,
                doppler_prf_number: 0,
                doppler_prf_pulse_count: 0,
            }; 3],
        };
        for sector in cut.sectors.iter_mut() {
            sector.edge_angle = reader.read()?;
            sector.doppler_prf_number = reader.read()?;
            sector.doppler_prf_pulse_count = reader.read()?;
            reader.skip(2)?;
        }
        Ok(cut)
    }

    pub fn elevation_angle(&self) -> f32 {
        self.elevation_angle_raw as f32 * ANGLE_SCALE
    }

    /// Azimuth rate in degrees per second.
    pub fn azimuth_rate(&self) -> f32 {
        self.azimuth_rate_raw as f32 * AZIMUTH_RATE_SCALE
    }

    /// Reflectivity SNR threshold in dB.
    pub fn reflectivity_threshold_db(&self) -> f32 {
        self.reflectivity_threshold as f32 * 0.125
    }
}

/// Volume coverage pattern: the ordered list of elevation cuts in a volume
/// scan and their waveform parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeCoveragePatternData {
    /// Size of the pattern in halfwords
    pub pattern_size: u16,
    pub pattern_type: u16,
    pub pattern_number: u16,
    pub version: u8,
    pub clutter_map_group_number: u8,
    pub doppler_velocity_resolution: u8,
    pub pulse_width: u8,
    pub vcp_sequencing: u16,
    pub vcp_supplemental_data: u16,
    pub elevation_cuts: Vec<ElevationCut>,
}

impl VolumeCoveragePatternData {
    pub fn decode(reader: &mut WireReader, data_size: usize) -> DecodeResult<Self> {
        trace!("Decoding Volume Coverage Pattern Data (Message Type 5)");
        let start = reader.position();

        let pattern_size: u16 = reader.read()?;
        let pattern_type: u16 = reader.read()?;
        let pattern_number: u16 = reader.read()?;
        let number_of_elevation_cuts: u16 = reader.read()?;
        let version: u8 = reader.read()?;
        let clutter_map_group_number: u8 = reader.read()?;
        let doppler_velocity_resolution: u8 = reader.read()?;
        let pulse_width: u8 = reader.read()?;
        reader.skip(4)?;
        let vcp_sequencing: u16 = reader.read()?;
        let vcp_supplemental_data: u16 = reader.read()?;
        reader.skip(2)?;

        if number_of_elevation_cuts == 0 || number_of_elevation_cuts > MAX_ELEVATION_CUTS {
            warn!(number_of_elevation_cuts, "Invalid number of elevation cuts");
            return Err(DecodeError::invalid_field(
                "number of elevation cuts",
                format!("{} not in 1..={}", number_of_elevation_cuts, MAX_ELEVATION_CUTS),
            ));
        }

        let elevation_cuts = (0..number_of_elevation_cuts)
            .map(|_| ElevationCut::decode(reader))
            .collect::<DecodeResult<Vec<_>>>()?;

        reader.validate_message(reader.position() - start, data_size)?;

        Ok(Self {
            pattern_size,
            pattern_type,
            pattern_number,
            version,
            clutter_map_group_number,
            doppler_velocity_resolution,
            pulse_width,
            vcp_sequencing,
            vcp_supplemental_data,
            elevation_cuts,
        })
    }

    /// Doppler velocity resolution in m/s (`2` → 0.5, `4` → 1.0).
    pub fn velocity_resolution(&self) -> f32 {
        self.doppler_velocity_resolution as f32 * 0.25
    }

    pub fn elevation_cut(&self, index: usize) -> Option<&ElevationCut> {
        self.elevation_cuts.get(index)
    }
}
