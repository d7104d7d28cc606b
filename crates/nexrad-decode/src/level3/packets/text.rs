use super::{read_packet_code, SPECIAL_SYMBOL, TEXT_NO_VALUE, TEXT_WITH_VALUE};
use crate::wire::WireReader;
use crate::{DecodeError, DecodeResult};

/// Packets 1, 2 and 8: a text string or special symbol string at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAndSpecialSymbolPacket {
    pub packet_code: u16,
    /// Bytes following this field
    pub length_of_block: u16,
    /// Color level, present only on packet 8
    pub value_of_text: Option<u16>,
    pub i_start: i16,
    pub j_start: i16,
    pub text: String,
}

impl TextAndSpecialSymbolPacket {
    pub fn decode(reader: &mut WireReader) -> DecodeResult<Self> {
        let start = reader.position();
        let packet_code = read_packet_code(reader, &[TEXT_NO_VALUE, SPECIAL_SYMBOL, TEXT_WITH_VALUE])?;
        let length_of_block: u16 = reader.read()?;

        let header_size = if packet_code == TEXT_WITH_VALUE { 6 } else { 4 };
        if (length_of_block as usize) < header_size {
            return Err(DecodeError::invalid_field(
                "text packet length",
                format!("{} is shorter than the {}-byte header", length_of_block, header_size),
            ));
        }

        let value_of_text = if packet_code == TEXT_WITH_VALUE {
            Some(reader.read()?)
        } else {
            None
        };
        let i_start: i16 = reader.read()?;
        let j_start: i16 = reader.read()?;
        let text = reader.read_string(length_of_block as usize - header_size)?;

        reader.validate_message(reader.position() - start, 4 + length_of_block as usize)?;

        Ok(Self {
            packet_code,
            length_of_block,
            value_of_text,
            i_start,
            j_start,
            text,
        })
    }

    pub fn data_size(&self) -> usize {
        4 + self.length_of_block as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_packet(code: u16, value: Option<u16>, text: &str) -> Vec<u8> {
        let header = if value.is_some() { 6 } else { 4 };
        let mut out = Vec::new();
        out.extend_from_slice(&code.to_be_bytes());
        out.extend_from_slice(&((header + text.len()) as u16).to_be_bytes());
        if let Some(v) = value {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.extend_from_slice(&12i16.to_be_bytes());
        out.extend_from_slice(&(-40i16).to_be_bytes());
        out.extend_from_slice(text.as_bytes());
        out
    }

    #[test]
    fn test_text_with_value() {
        let mut reader = WireReader::new(text_packet(8, Some(3), "A0"));
        let packet = TextAndSpecialSymbolPacket::decode(&mut reader).unwrap();
        assert_eq!(packet.value_of_text, Some(3));
        assert_eq!(packet.i_start, 12);
        assert_eq!(packet.j_start, -40);
        assert_eq!(packet.text, "A0");
        assert_eq!(packet.data_size(), 12);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_text_without_value() {
        let mut reader = WireReader::new(text_packet(1, None, "KTLX"));
        let packet = TextAndSpecialSymbolPacket::decode(&mut reader).unwrap();
        assert_eq!(packet.value_of_text, None);
        assert_eq!(packet.text, "KTLX");
    }

    #[test]
    fn test_short_length_rejected() {
        let mut bytes = text_packet(8, Some(3), "");
        bytes[3] = 2;
        let mut reader = WireReader::new(bytes);
        assert!(TextAndSpecialSymbolPacket::decode(&mut reader).is_err());
    }
}
