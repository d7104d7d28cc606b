//! Big-endian primitives and a seekable cursor over message bytes.
//!
//! Every NEXRAD structure is transmitted in network byte order. [`WireReader`]
//! wraps a [`Bytes`] buffer and tracks a read position plus an "exhausted"
//! flag that is raised the first time a read runs past the end of the data.
//! Once raised, [`WireReader::validate_message`] fails until the flag is
//! cleared, mirroring stream semantics that decoders rely on for framing.

use crate::{DecodeError, DecodeResult};
use bytes::Bytes;

/// End-of-text control character terminating AWIPS text products.
pub const ETX: u8 = 0x03;

/// Fixed-width numeric types that can be decoded from network byte order.
pub trait FromBigEndian: Sized + Copy {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Decodes from the first `SIZE` bytes. Callers must supply at least
    /// `SIZE` bytes.
    fn from_be_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_from_big_endian {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromBigEndian for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_be_bytes(buf)
                }
            }
        )*
    };
}

impl_from_big_endian!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Decodes a single big-endian value, or `None` if `bytes` is too short.
pub fn decode_be<T: FromBigEndian>(bytes: &[u8]) -> Option<T> {
    (bytes.len() >= T::SIZE).then(|| T::from_be_slice(bytes))
}

/// Decodes `count` consecutive big-endian values.
pub fn decode_be_array<T: FromBigEndian>(bytes: &[u8], count: usize) -> Option<Vec<T>> {
    let needed = count.checked_mul(T::SIZE)?;
    if bytes.len() < needed {
        return None;
    }
    Some(bytes[..needed].chunks_exact(T::SIZE).map(T::from_be_slice).collect())
}

/// Reassembles an IEEE-754 float split across two halfwords (most
/// significant first), as used by Level III threshold and parameter fields.
pub fn f32_from_halfwords(high: u16, low: u16) -> f32 {
    f32::from_bits(((high as u32) << 16) | low as u32)
}

/// Seekable big-endian cursor over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct WireReader {
    data: Bytes,
    pos: usize,
    exhausted: bool,
}

impl WireReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            exhausted: false,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// True once a read has run past the end of the buffer.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn clear_exhausted(&mut self) {
        self.exhausted = false;
    }

    /// Advances past `n` bytes and returns them. A short read consumes the
    /// remainder and marks the reader exhausted.
    fn take(&mut self, n: usize) -> DecodeResult<&[u8]> {
        let available = self.remaining();
        if n > available {
            let offset = self.pos;
            self.pos = self.data.len();
            self.exhausted = true;
            return Err(DecodeError::Truncated {
                offset,
                needed: n,
                available,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    pub fn read<T: FromBigEndian>(&mut self) -> DecodeResult<T> {
        self.take(T::SIZE).map(T::from_be_slice)
    }

    pub fn read_vec<T: FromBigEndian>(&mut self, count: usize) -> DecodeResult<Vec<T>> {
        let needed = count.checked_mul(T::SIZE).ok_or_else(|| {
            DecodeError::invalid_field("element count", format!("{} overflows", count))
        })?;
        let bytes = self.take(needed)?;
        Ok(bytes.chunks_exact(T::SIZE).map(T::from_be_slice).collect())
    }

    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Returns the next `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<Bytes> {
        let start = self.pos;
        self.take(n)?;
        Ok(self.data.slice(start..start + n))
    }

    /// Reads `n` bytes as text, replacing invalid UTF-8.
    pub fn read_string(&mut self, n: usize) -> DecodeResult<String> {
        Ok(String::from_utf8_lossy(self.take(n)?).into_owned())
    }

    /// Reads a fixed-width character field, dropping NUL and space padding.
    pub fn read_trimmed_string(&mut self, n: usize) -> DecodeResult<String> {
        let raw = self.read_string(n)?;
        Ok(raw.trim_matches(|c: char| c == '\0' || c == ' ').to_string())
    }

    pub fn peek<T: FromBigEndian>(&self) -> Option<T> {
        self.data.get(self.pos..).and_then(decode_be)
    }

    /// Borrows the next `n` bytes without advancing.
    pub fn peek_bytes(&self, n: usize) -> Option<&[u8]> {
        self.data.get(self.pos..self.pos.checked_add(n)?)
    }

    pub fn skip(&mut self, n: usize) -> DecodeResult<()> {
        self.take(n).map(|_| ())
    }

    /// Moves to an absolute offset. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, offset: usize) -> DecodeResult<()> {
        if offset > self.data.len() {
            return Err(DecodeError::InvalidSeek {
                offset,
                length: self.data.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    /// Splits off the next `n` bytes as an independent reader.
    pub fn sub_reader(&mut self, n: usize) -> DecodeResult<WireReader> {
        self.read_bytes(n).map(WireReader::new)
    }

    /// Reads one line of text.
    ///
    /// A line ends at LF, at a run of CR characters optionally followed by LF,
    /// or just before an ETX byte, which is left in the stream. AWIPS
    /// `\r\r\n` terminators therefore yield clean lines. Returns `None` at
    /// end of data.
    pub fn read_line(&mut self) -> Option<String> {
        if self.is_at_end() {
            self.exhausted = true;
            return None;
        }
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == b'\n' || b == b'\r' || b == ETX)
            .unwrap_or(rest.len());
        let mut consumed = end;
        match rest.get(end) {
            Some(b'\n') => consumed += 1,
            Some(b'\r') => {
                while rest.get(consumed) == Some(&b'\r') {
                    consumed += 1;
                }
                if rest.get(consumed) == Some(&b'\n') {
                    consumed += 1;
                }
            }
            _ => {}
        }
        let line = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.pos += consumed;
        Some(line)
    }

    /// Reconciles the bytes a decoder consumed with the size its enclosing
    /// structure declared.
    ///
    /// * Exhausted stream: fails.
    /// * Consumed fewer bytes than declared: skips the remainder and succeeds.
    /// * Consumed more than declared: moves back to the declared end and fails.
    /// * Exact match: succeeds without moving.
    pub fn validate_message(&mut self, bytes_consumed: usize, declared_size: usize) -> DecodeResult<()> {
        if self.exhausted {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: declared_size.saturating_sub(bytes_consumed),
                available: self.remaining(),
            });
        }

        if bytes_consumed < declared_size {
            let unread = declared_size - bytes_consumed;
            tracing::trace!(bytes_consumed, declared_size, unread, "Skipping unread message bytes");
            self.skip(unread)
        } else if bytes_consumed > declared_size {
            let overrun = bytes_consumed - declared_size;
            tracing::warn!(bytes_consumed, declared_size, "Message overran its declared size");
            self.seek(self.pos.saturating_sub(overrun))?;
            Err(DecodeError::Overrun {
                consumed: bytes_consumed,
                declared: declared_size,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_be_integers() {
        assert_eq!(decode_be::<u16>(&[0x12, 0x34]), Some(0x1234));
        assert_eq!(decode_be::<i16>(&[0xFF, 0xFE]), Some(-2));
        assert_eq!(decode_be::<u32>(&[0x00, 0x01, 0x00, 0x00]), Some(65536));
        assert_eq!(decode_be::<i32>(&[0xFF, 0xFF, 0xFF, 0xFF]), Some(-1));
        assert_eq!(
            decode_be::<u64>(&[0, 0, 0, 1, 0, 0, 0, 0]),
            Some(1u64 << 32)
        );
    }

    #[test]
    fn test_decode_be_floats() {
        assert_eq!(decode_be::<f32>(&1.5f32.to_be_bytes()), Some(1.5));
        assert_eq!(decode_be::<f64>(&(-0.25f64).to_be_bytes()), Some(-0.25));
    }

    #[test]
    fn test_decode_be_short_input() {
        assert_eq!(decode_be::<u32>(&[0x00, 0x01, 0x02]), None);
        assert_eq!(decode_be_array::<u16>(&[0x00, 0x01, 0x02], 2), None);
    }

    #[test]
    fn test_decode_be_array() {
        let bytes = [0x00, 0x01, 0x00, 0x02, 0xFF, 0xFF];
        assert_eq!(decode_be_array::<u16>(&bytes, 3), Some(vec![1, 2, 0xFFFF]));
        assert_eq!(decode_be_array::<i16>(&bytes, 3), Some(vec![1, 2, -1]));
    }

    #[test]
    fn test_f32_from_halfwords() {
        let bits = 2.5f32.to_bits();
        assert_eq!(f32_from_halfwords((bits >> 16) as u16, bits as u16), 2.5);
    }

    #[test]
    fn test_reader_sequential_reads() {
        let mut reader = WireReader::new(vec![0x00, 0x2A, 0xFF, 0xFF, 0xFF, 0xFE, b'K', b'T', b'L', b'X']);
        assert_eq!(reader.read::<u16>().unwrap(), 42);
        assert_eq!(reader.read::<i32>().unwrap(), -2);
        assert_eq!(reader.read_string(4).unwrap(), "KTLX");
        assert!(reader.is_at_end());
        assert!(!reader.is_exhausted());
    }

    #[test]
    fn test_short_read_marks_exhausted() {
        let mut reader = WireReader::new(vec![0x00, 0x01, 0x02]);
        let err = reader.read::<u32>().unwrap_err();
        assert!(err.is_truncation());
        assert!(reader.is_exhausted());
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let reader = WireReader::new(vec![0xAF, 0x1F, 0x00]);
        assert_eq!(reader.peek::<u16>(), Some(0xAF1F));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_trimmed_string() {
        let mut reader = WireReader::new(b"KOUN\0\0  ".to_vec());
        assert_eq!(reader.read_trimmed_string(8).unwrap(), "KOUN");
    }

    #[test]
    fn test_seek_bounds() {
        let mut reader = WireReader::new(vec![0u8; 8]);
        assert!(reader.seek(8).is_ok());
        assert!(matches!(reader.seek(9), Err(DecodeError::InvalidSeek { offset: 9, length: 8 })));
    }

    #[test]
    fn test_read_line_handles_awips_terminators() {
        let mut reader = WireReader::new(b"first\r\r\nsecond\nthird\rfourth".to_vec());
        assert_eq!(reader.read_line().as_deref(), Some("first"));
        assert_eq!(reader.read_line().as_deref(), Some("second"));
        assert_eq!(reader.read_line().as_deref(), Some("third"));
        assert_eq!(reader.read_line().as_deref(), Some("fourth"));
        assert_eq!(reader.read_line(), None);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_read_line_stops_before_etx() {
        let mut reader = WireReader::new(b"$$\x03\x01".to_vec());
        assert_eq!(reader.read_line().as_deref(), Some("$$"));
        assert_eq!(reader.peek::<u8>(), Some(ETX));
    }

    #[test]
    fn test_validate_message_underrun_skips() {
        let mut reader = WireReader::new(vec![0u8; 16]);
        reader.skip(4).unwrap();
        assert!(reader.validate_message(4, 10).is_ok());
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn test_validate_message_overrun_repositions() {
        let mut reader = WireReader::new(vec![0u8; 16]);
        reader.skip(12).unwrap();
        let err = reader.validate_message(12, 10).unwrap_err();
        assert!(matches!(err, DecodeError::Overrun { consumed: 12, declared: 10 }));
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn test_validate_message_exact() {
        let mut reader = WireReader::new(vec![0u8; 16]);
        reader.skip(10).unwrap();
        assert!(reader.validate_message(10, 10).is_ok());
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn test_validate_message_exhausted_fails() {
        let mut reader = WireReader::new(vec![0u8; 2]);
        let _ = reader.read::<u32>();
        assert!(reader.validate_message(2, 2).is_err());
        reader.clear_exhausted();
        assert!(reader.validate_message(2, 2).is_ok());
    }
}
