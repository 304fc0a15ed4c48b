// crates/veritext-core/src/encoding.rs
//
// Canonical byte encoding shared by request descriptors, transcripts and
// proof artifacts.
//
// Layout rules (format v1):
//   - every encoding starts with a length-prefixed domain tag
//   - integers are big-endian, fixed width
//   - variable-length fields carry a u64 big-endian length prefix
//   - fields appear in a fixed order; there are no optional gaps, absent
//     values are written as an explicit presence byte

use crate::error::VeritextError;

/// Domain tag for request descriptors.
pub const REQUEST_DOMAIN: &[u8] = b"veritext/request/v1";
/// Domain tag for transcripts.
pub const TRANSCRIPT_DOMAIN: &[u8] = b"veritext/transcript/v1";
/// Domain tag for the message signed by a signed attestation.
pub const ATTESTATION_DOMAIN: &[u8] = b"veritext/attestation/v1";
/// Domain tag for serialized proof artifacts.
pub const ARTIFACT_DOMAIN: &[u8] = b"veritext/artifact";

/// Append-only builder for canonical encodings.
#[derive(Debug, Default)]
pub struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    /// Start an encoding under the given domain tag.
    pub fn new(domain: &[u8]) -> Self {
        let mut writer = Self { buf: Vec::new() };
        writer.put_bytes(domain);
        writer
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Length-prefixed byte string.
    pub fn put_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.put_u64(value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    /// Length-prefixed UTF-8 string.
    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.put_bytes(value.as_bytes())
    }

    /// Presence byte followed by the value when present.
    pub fn put_opt_bytes(&mut self, value: Option<&[u8]>) -> &mut Self {
        match value {
            Some(bytes) => {
                self.put_u8(1);
                self.put_bytes(bytes)
            }
            None => self.put_u8(0),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Strict reader for canonical encodings. Any deviation (truncation,
/// trailing bytes, wrong domain, non-canonical presence byte) is an error.
#[derive(Debug)]
pub struct CanonicalReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CanonicalReader<'a> {
    /// Open an encoding and check its domain tag.
    pub fn new(data: &'a [u8], domain: &[u8]) -> Result<Self, VeritextError> {
        let mut reader = Self { data, pos: 0 };
        let tag = reader.get_bytes()?;
        if tag != domain {
            return Err(VeritextError::Serialization(format!(
                "unexpected domain tag {:?}",
                String::from_utf8_lossy(tag)
            )));
        }
        Ok(reader)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], VeritextError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| VeritextError::Serialization("truncated encoding".to_string()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> Result<u8, VeritextError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, VeritextError> {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(self.take(2)?);
        Ok(u16::from_be_bytes(raw))
    }

    pub fn get_u64(&mut self) -> Result<u64, VeritextError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn get_bytes(&mut self) -> Result<&'a [u8], VeritextError> {
        let len = usize::try_from(self.get_u64()?)
            .map_err(|_| VeritextError::Serialization("length overflow".to_string()))?;
        self.take(len)
    }

    pub fn get_str(&mut self) -> Result<&'a str, VeritextError> {
        std::str::from_utf8(self.get_bytes()?)
            .map_err(|e| VeritextError::Serialization(format!("invalid UTF-8: {}", e)))
    }

    pub fn get_opt_bytes(&mut self) -> Result<Option<&'a [u8]>, VeritextError> {
        match self.get_u8()? {
            0 => Ok(None),
            1 => Ok(Some(self.get_bytes()?)),
            other => Err(VeritextError::Serialization(format!(
                "invalid presence byte {}",
                other
            ))),
        }
    }

    /// Fail if any bytes remain unread.
    pub fn finish(self) -> Result<(), VeritextError> {
        if self.pos != self.data.len() {
            return Err(VeritextError::Serialization(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}
