//! Message type 32: RDA PRF data.

use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};
use tracing::{trace, warn};

const MAX_WAVEFORMS: u16 = 5;
const MAX_PRF_COUNT: u16 = 255;

/// Pulse repetition frequencies available for one waveform type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformPrf {
    pub waveform_type: u16,
    pub prf_values: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdaPrfData {
    pub waveforms: Vec<WaveformPrf>,
}

impl RdaPrfData {
    pub fn decode(reader: &mut WireReader, data_size: usize) -> DecodeResult<Self> {
        trace!("Decoding RDA PRF Data (Message Type 32)");
        let start = reader.position();

        let number_of_waveforms: u16 = reader.read()?;
        reader.skip(2)?;

        if number_of_waveforms == 0 || number_of_waveforms > MAX_WAVEFORMS {
            warn!(number_of_waveforms, "Invalid number of waveforms");
            return Err(DecodeError::invalid_field(
                "number of waveforms",
                format!("{} not in 1..={}", number_of_waveforms, MAX_WAVEFORMS),
            ));
        }

        let mut waveforms = Vec::with_capacity(number_of_waveforms as usize);
        for index in 0..number_of_waveforms {
            let waveform_type: u16 = reader.read()?;
            let prf_count: u16 = reader.read()?;
            if prf_count > MAX_PRF_COUNT {
                warn!(prf_count, waveform = index, "Invalid PRF count");
                return Err(DecodeError::invalid_field(
                    "PRF count",
                    format!("{} exceeds {}", prf_count, MAX_PRF_COUNT),
                ));
            }
            waveforms.push(WaveformPrf {
                waveform_type,
                prf_values: reader.read_vec(prf_count as usize)?,
            });
        }

        reader.validate_message(reader.position() - start, data_size)?;
        Ok(Self { waveforms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prf_payload(waveforms: &[(u16, &[u32])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(waveforms.len() as u16).to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        for (waveform_type, prfs) in waveforms {
            out.extend_from_slice(&waveform_type.to_be_bytes());
            out.extend_from_slice(&(prfs.len() as u16).to_be_bytes());
            for prf in prfs.iter() {
                out.extend_from_slice(&prf.to_be_bytes());
            }
        }
        out
    }

    #[test]
    fn test_decode_prf_data() {
        let payload = prf_payload(&[(1, &[322, 446]), (2, &[1013, 1094, 1181])]);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        let prf = RdaPrfData::decode(&mut reader, size).unwrap();

        assert_eq!(prf.waveforms.len(), 2);
        assert_eq!(prf.waveforms[1].waveform_type, 2);
        assert_eq!(prf.waveforms[1].prf_values, vec![1013, 1094, 1181]);
        assert_eq!(reader.position(), size);
    }

    #[test]
    fn test_too_many_waveforms() {
        let mut payload = prf_payload(&[]);
        payload[1] = 6;
        let mut reader = WireReader::new(payload);
        assert!(RdaPrfData::decode(&mut reader, 4).is_err());
    }

    #[test]
    fn test_padding_is_consumed() {
        let mut payload = prf_payload(&[(1, &[322])]);
        payload.extend_from_slice(&[0; 6]);
        let size = payload.len();
        let mut reader = WireReader::new(payload);
        RdaPrfData::decode(&mut reader, size).unwrap();
        assert_eq!(reader.position(), size);
    }
}
