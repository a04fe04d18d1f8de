use std::time::Duration;

use bytes::Bytes;

/// TLV type codes assigned by the NDN packet format, version 0.1
pub mod types {
    // Packet types
    pub const INTEREST: u64 = 0x05;
    pub const DATA: u64 = 0x06;

    // Common fields
    pub const NAME: u64 = 0x07;
    pub const NAME_COMPONENT: u64 = 0x08;

    // Interest packet fields
    pub const SELECTORS: u64 = 0x09;
    pub const NONCE: u64 = 0x0A;
    pub const SCOPE: u64 = 0x0B;
    pub const INTEREST_LIFETIME: u64 = 0x0C;
    pub const MIN_SUFFIX_COMPONENTS: u64 = 0x0D;
    pub const MAX_SUFFIX_COMPONENTS: u64 = 0x0E;
    pub const PUBLISHER_PUBLIC_KEY_LOCATOR: u64 = 0x0F;
    pub const EXCLUDE: u64 = 0x10;
    pub const CHILD_SELECTOR: u64 = 0x11;
    pub const MUST_BE_FRESH: u64 = 0x12;
    pub const ANY: u64 = 0x13;

    // Data packet fields
    pub const META_INFO: u64 = 0x14;
    pub const CONTENT: u64 = 0x15;
    pub const SIGNATURE_INFO: u64 = 0x16;
    pub const SIGNATURE_VALUE: u64 = 0x17;
    pub const CONTENT_TYPE: u64 = 0x18;
    pub const FRESHNESS_PERIOD: u64 = 0x19;
    pub const FINAL_BLOCK_ID: u64 = 0x1A;

    // Signature fields
    pub const SIGNATURE_TYPE: u64 = 0x1B;
    pub const KEY_LOCATOR: u64 = 0x1C;
    pub const KEY_LOCATOR_DIGEST: u64 = 0x1D;
}

/// Errors that can occur during TLV encoding/decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TlvError {
    #[error("Unexpected end of input at offset {0}")]
    UnexpectedEnd(usize),
    #[error("TLV length {length} exceeds remaining buffer ({available} bytes)")]
    LengthExceedsBuffer { length: u64, available: usize },
    #[error("Expected TLV type {expected}, got {actual}")]
    TypeMismatch { expected: u64, actual: u64 },
    #[error("Nested TLV length mismatch: expected end at offset {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Invalid non-negative integer length: {0}")]
    InvalidIntegerLength(usize),
}

/// TLV encoder that builds a packet back to front
///
/// Wire format of every record:
/// - Type: VAR-NUMBER (1, 3, 5 or 9 bytes)
/// - Length: VAR-NUMBER
/// - Value: `length` bytes
///
/// Records are appended in reverse of their wire order, so the length of a
/// nested TLV is always known before its header is written and no header
/// ever needs patching. `finalize` reverses the buffer once to produce the
/// wire encoding.
#[derive(Debug, Default, Clone)]
pub struct TlvEncoder {
    // Holds the encoding in reverse byte order until finalize.
    output: Vec<u8>,
}

impl TlvEncoder {
    /// Create a new TLV encoder
    pub fn new() -> Self {
        Self { output: Vec::new() }
    }

    /// Create a new TLV encoder with a preallocated buffer
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far
    ///
    /// A length saved here measures distance from the back of the finished
    /// packet, so it stays valid while further records are prepended.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// True if nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    // Append a VAR-NUMBER in reverse byte order. On the wire the marker
    // byte (253, 254 or 255) comes first, so here it goes last.
    fn push_var_number(&mut self, value: u64) {
        if value < 253 {
            self.output.push(value as u8);
        } else if value <= 0xFFFF {
            self.output.extend_from_slice(&(value as u16).to_le_bytes());
            self.output.push(253);
        } else if value <= 0xFFFF_FFFF {
            self.output.extend_from_slice(&(value as u32).to_le_bytes());
            self.output.push(254);
        } else {
            self.output.extend_from_slice(&value.to_le_bytes());
            self.output.push(255);
        }
    }

    /// Write a TLV header for a value of `length` bytes already written
    pub fn write_type_and_length(&mut self, type_: u64, length: usize) {
        // Reverse order: length first, then type.
        self.push_var_number(length as u64);
        self.push_var_number(type_);
    }

    /// Write a complete blob TLV
    pub fn write_blob(&mut self, type_: u64, value: &[u8]) {
        self.output.extend(value.iter().rev());
        self.write_type_and_length(type_, value.len());
    }

    /// Write a non-negative integer TLV using the smallest of the four
    /// allowed widths (1, 2, 4 or 8 bytes, big-endian)
    pub fn write_nonnegative_integer(&mut self, type_: u64, value: u64) {
        let length = if value <= 0xFF {
            self.output.push(value as u8);
            1
        } else if value <= 0xFFFF {
            self.output.extend_from_slice(&(value as u16).to_le_bytes());
            2
        } else if value <= 0xFFFF_FFFF {
            self.output.extend_from_slice(&(value as u32).to_le_bytes());
            4
        } else {
            self.output.extend_from_slice(&value.to_le_bytes());
            8
        };
        self.write_type_and_length(type_, length);
    }

    /// Write a non-negative integer TLV, or nothing if the value is None
    pub fn write_optional_nonnegative_integer(&mut self, type_: u64, value: Option<u64>) {
        if let Some(value) = value {
            self.write_nonnegative_integer(type_, value);
        }
    }

    /// Write a duration as a non-negative integer TLV of whole milliseconds,
    /// or nothing if the value is None
    pub fn write_optional_duration_ms(&mut self, type_: u64, value: Option<Duration>) {
        if let Some(value) = value {
            self.write_nonnegative_integer(type_, duration_to_millis(value));
        }
    }

    /// Write a zero-length TLV if the flag is set, nothing otherwise
    pub fn write_flag(&mut self, type_: u64, present: bool) {
        if present {
            self.write_type_and_length(type_, 0);
        }
    }

    /// Reverse the buffer and return the finished wire encoding
    pub fn finalize(mut self) -> Bytes {
        self.output.reverse();
        Bytes::from(self.output)
    }
}

fn duration_to_millis(value: Duration) -> u64 {
    // Sub-millisecond precision is not representable on the wire.
    value.as_millis().min(u64::MAX as u128) as u64
}

/// TLV decoder over a borrowed input buffer
///
/// Reads run front to back. Blob reads borrow from the input, so nothing
/// is copied until the caller decides to keep a value.
#[derive(Debug)]
pub struct TlvDecoder<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> TlvDecoder<'a> {
    /// Create a decoder positioned at the start of the input
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    /// Current read position
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], TlvError> {
        if self.remaining() < count {
            return Err(TlvError::UnexpectedEnd(self.offset));
        }
        let bytes = &self.input[self.offset..self.offset + count];
        self.offset += count;
        Ok(bytes)
    }

    fn read_big_endian(&mut self, count: usize) -> Result<u64, TlvError> {
        let bytes = self.take(count)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Read a VAR-NUMBER (1, 3, 5 or 9 bytes on the wire)
    pub fn read_var_number(&mut self) -> Result<u64, TlvError> {
        let first = self.take(1)?[0];
        match first {
            253 => self.read_big_endian(2),
            254 => self.read_big_endian(4),
            255 => self.read_big_endian(8),
            short => Ok(u64::from(short)),
        }
    }

    /// Read a TLV header, checking the type and bounding the length against
    /// the remaining input
    pub fn read_type_and_length(&mut self, expected_type: u64) -> Result<usize, TlvError> {
        let type_ = self.read_var_number()?;
        if type_ != expected_type {
            return Err(TlvError::TypeMismatch {
                expected: expected_type,
                actual: type_,
            });
        }
        let length = self.read_var_number()?;
        if length > self.remaining() as u64 {
            return Err(TlvError::LengthExceedsBuffer {
                length,
                available: self.remaining(),
            });
        }
        Ok(length as usize)
    }

    /// Read the header of a nested TLV and return the offset just past its
    /// value, for use as the `end_offset` of the inner reads
    pub fn read_nested_start(&mut self, expected_type: u64) -> Result<usize, TlvError> {
        let length = self.read_type_and_length(expected_type)?;
        Ok(self.offset + length)
    }

    /// Check that a nested TLV was consumed exactly up to its declared end
    pub fn finish_nested(&mut self, end_offset: usize) -> Result<(), TlvError> {
        if self.offset != end_offset {
            return Err(TlvError::LengthMismatch {
                expected: end_offset,
                actual: self.offset,
            });
        }
        Ok(())
    }

    /// Report whether the next record before `end_offset` has the given
    /// type, without consuming anything
    pub fn peek_type(&mut self, expected_type: u64, end_offset: usize) -> Result<bool, TlvError> {
        if self.offset >= end_offset {
            return Ok(false);
        }
        let saved = self.offset;
        let type_ = self.read_var_number();
        self.offset = saved;
        Ok(type_? == expected_type)
    }

    /// Read a blob TLV, borrowing its value from the input
    pub fn read_blob(&mut self, expected_type: u64) -> Result<&'a [u8], TlvError> {
        let length = self.read_type_and_length(expected_type)?;
        self.take(length)
    }

    /// Read a non-negative integer TLV (1, 2, 4 or 8 byte value)
    pub fn read_nonnegative_integer(&mut self, expected_type: u64) -> Result<u64, TlvError> {
        let length = self.read_type_and_length(expected_type)?;
        match length {
            1 | 2 | 4 | 8 => self.read_big_endian(length),
            other => Err(TlvError::InvalidIntegerLength(other)),
        }
    }

    /// Read a non-negative integer TLV if one is next, or None
    pub fn read_optional_nonnegative_integer(
        &mut self,
        expected_type: u64,
        end_offset: usize,
    ) -> Result<Option<u64>, TlvError> {
        if self.peek_type(expected_type, end_offset)? {
            Ok(Some(self.read_nonnegative_integer(expected_type)?))
        } else {
            Ok(None)
        }
    }

    /// Consume a flag TLV if one is next, reporting whether it was present
    pub fn read_boolean(&mut self, expected_type: u64, end_offset: usize) -> Result<bool, TlvError> {
        if self.peek_type(expected_type, end_offset)? {
            // The value of a boolean TLV is ignored, even if non-empty.
            let length = self.read_type_and_length(expected_type)?;
            self.offset += length;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
