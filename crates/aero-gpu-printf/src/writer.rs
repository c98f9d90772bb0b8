//! Producer side of the print buffer protocol, on the host.
//!
//! This is intended for tests, fixtures, and CPU fallbacks that need to emit canonical print
//! commands (correct slot layout and cursor reservations) exactly as a shader would.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::abi::{command_len, ArgTag, CURSOR_SIZE_BYTES};
use crate::error::GpuPrintError;
use crate::hash::hash_string;

/// A typed argument as a shader would serialize it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrintArg {
    /// Signed integer.
    Int(i32),
    /// Unsigned integer.
    Uint(u32),
    /// Single-precision float.
    Float(f32),
    /// Boolean, stored as 0 or 1.
    Bool(bool),
    /// Hash of a string literal registered with the string table.
    StringHash(u32),
}

impl PrintArg {
    /// A reference to the literal `text`.
    pub fn string(text: &str) -> Self {
        Self::StringHash(hash_string(text))
    }

    /// Wire tag for this argument.
    pub fn tag(&self) -> ArgTag {
        match self {
            Self::Int(_) => ArgTag::Int,
            Self::Uint(_) => ArgTag::Uint,
            Self::Float(_) => ArgTag::Float,
            Self::Bool(_) => ArgTag::Bool,
            Self::StringHash(_) => ArgTag::StringHash,
        }
    }

    /// Value slot contents.
    pub fn bits(&self) -> u32 {
        match *self {
            Self::Int(v) => v as u32,
            Self::Uint(v) => v,
            Self::Float(v) => v.to_bits(),
            Self::Bool(v) => v as u32,
            Self::StringHash(v) => v,
        }
    }
}

impl From<i32> for PrintArg {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for PrintArg {
    fn from(v: u32) -> Self {
        Self::Uint(v)
    }
}

impl From<f32> for PrintArg {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for PrintArg {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Serializes one command as little-endian `u32` words (header slot, then one slot per argument).
pub fn encode_print_command(format_hash: u32, args: &[PrintArg]) -> Vec<u32> {
    let mut words = Vec::with_capacity(2 + 2 * args.len());
    words.push(format_hash);
    words.push(0);
    for arg in args {
        words.push(arg.tag() as u32);
        words.push(arg.bits());
    }
    words
}

/// Builds a print buffer image sequentially, the way a single invocation would fill it.
#[derive(Debug, Default, Clone)]
pub struct PrintBufferWriter {
    payload: Vec<u8>,
}

impl PrintBufferWriter {
    /// Empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command for `format` (hashed with [`hash_string`]).
    pub fn print(&mut self, format: &str, args: &[PrintArg]) -> &mut Self {
        self.print_hash(hash_string(format), args)
    }

    /// Appends a command for an already-hashed format string.
    pub fn print_hash(&mut self, format_hash: u32, args: &[PrintArg]) -> &mut Self {
        for word in encode_print_command(format_hash, args) {
            self.payload.extend_from_slice(&word.to_le_bytes());
        }
        self
    }

    /// Appends raw bytes, e.g. to build a deliberately malformed stream.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.payload.extend_from_slice(bytes);
        self
    }

    /// Bytes written after the cursor so far.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Produces a `byte_size` buffer whose cursor covers everything written.
    ///
    /// Payload past `byte_size` is cut off while the cursor still counts it, matching what an
    /// overflowing dispatch leaves behind.
    pub fn finish(&self, byte_size: usize) -> Vec<u8> {
        let cursor = u32::try_from(self.payload.len()).unwrap_or(u32::MAX);
        self.finish_with_cursor(byte_size, cursor)
    }

    /// Like [`Self::finish`] but with an explicit cursor value.
    pub fn finish_with_cursor(&self, byte_size: usize, cursor: u32) -> Vec<u8> {
        let mut buf = vec![0u8; byte_size.max(CURSOR_SIZE_BYTES)];
        buf[..CURSOR_SIZE_BYTES].copy_from_slice(&cursor.to_le_bytes());
        let room = buf.len() - CURSOR_SIZE_BYTES;
        let n = self.payload.len().min(room);
        buf[CURSOR_SIZE_BYTES..CURSOR_SIZE_BYTES + n].copy_from_slice(&self.payload[..n]);
        buf
    }
}

/// A print buffer shared by concurrent producers.
///
/// Storage is 32-bit words; word 0 is the cursor. Each [`Self::print`] atomically reserves its
/// byte range by advancing the cursor and then writes only inside that range, so producers never
/// overlap and the payload ends up in reservation order. The cursor saturates at `u32::MAX`.
/// Once it sticks there every later reservation fails and nothing already written is reused.
#[derive(Debug)]
pub struct SharedPrintBuffer {
    words: Box<[AtomicU32]>,
}

impl SharedPrintBuffer {
    /// Zeroed buffer of `byte_size` bytes, cursor included.
    pub fn new(byte_size: usize) -> Result<Self, GpuPrintError> {
        if byte_size < CURSOR_SIZE_BYTES || byte_size % 4 != 0 {
            return Err(GpuPrintError::InvalidBufferSize { byte_size });
        }
        let words = (0..byte_size / 4).map(|_| AtomicU32::new(0)).collect();
        Ok(Self { words })
    }

    /// Total size in bytes, cursor included.
    pub fn byte_size(&self) -> usize {
        self.words.len() * 4
    }

    /// Zeroes the cursor and payload for the next dispatch.
    pub fn reset(&mut self) {
        for word in self.words.iter_mut() {
            *word.get_mut() = 0;
        }
    }

    /// Current cursor value (bytes reserved so far, possibly past the end).
    pub fn cursor(&self) -> u32 {
        self.words[0].load(Ordering::Acquire)
    }

    /// Reserves space for one command and writes it.
    ///
    /// Returns the byte offset of the command, or `None` if the reservation ran past the end of
    /// the buffer. The cursor is advanced either way (saturating) so the host can report the
    /// overflow.
    pub fn print(&self, format_hash: u32, args: &[PrintArg]) -> Option<usize> {
        let len = command_len(args.len())?;
        let len_u32 = u32::try_from(len).ok()?;
        let reserved = self.words[0]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                Some(cursor.saturating_add(len_u32))
            })
            .unwrap_or_else(|cursor| cursor) as usize;

        let start = CURSOR_SIZE_BYTES.checked_add(reserved)?;
        let end = start.checked_add(len)?;
        if end > self.byte_size() {
            return None;
        }

        let first_word = start / 4;
        for (i, word) in encode_print_command(format_hash, args).into_iter().enumerate() {
            self.words[first_word + i].store(word, Ordering::Relaxed);
        }
        Some(start)
    }

    /// Copies the buffer out as bytes.
    ///
    /// Only meaningful once every producer has finished (e.g. after joining the threads that
    /// called [`Self::print`]).
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_size());
        for word in self.words.iter() {
            out.extend_from_slice(&word.load(Ordering::Acquire).to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_header_then_tagged_slots() {
        let words = encode_print_command(0x1234, &[PrintArg::Int(-1), PrintArg::Bool(true)]);
        assert_eq!(
            words,
            vec![0x1234, 0, ArgTag::Int as u32, u32::MAX, ArgTag::Bool as u32, 1]
        );
    }

    #[test]
    fn writer_cuts_payload_but_keeps_cursor() {
        let mut w = PrintBufferWriter::new();
        w.print_hash(1, &[]).print_hash(2, &[]);
        let buf = w.finish(12);
        assert_eq!(buf.len(), 12);
        assert_eq!(u32::from_le_bytes(buf[..4].try_into().unwrap()), 16);
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 1);
    }

    #[test]
    fn shared_buffer_rejects_bad_sizes() {
        assert!(SharedPrintBuffer::new(0).is_err());
        assert!(SharedPrintBuffer::new(6).is_err());
        assert!(SharedPrintBuffer::new(4).is_ok());
    }

    #[test]
    fn shared_buffer_reserves_sequential_offsets() {
        let buf = SharedPrintBuffer::new(36).unwrap();
        assert_eq!(buf.print(7, &[]), Some(4));
        assert_eq!(buf.print(8, &[PrintArg::Uint(5)]), Some(12));
        // 24 of 32 payload bytes used; a 16-byte command does not fit.
        assert_eq!(buf.print(9, &[PrintArg::Uint(6)]), None);
        assert_eq!(buf.cursor(), 40);

        let bytes = buf.snapshot();
        assert_eq!(bytes.len(), 36);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 8);
    }

    #[test]
    fn cursor_saturates_instead_of_wrapping() {
        let buf = SharedPrintBuffer::new(64).unwrap();
        buf.words[0].store(u32::MAX - 8, Ordering::Relaxed);

        assert_eq!(buf.print(7, &[PrintArg::Uint(1)]), None);
        assert_eq!(buf.cursor(), u32::MAX);
        // A wrapped cursor would hand out offset 4 here.
        assert_eq!(buf.print(7, &[]), None);
        assert_eq!(buf.cursor(), u32::MAX);
        assert_eq!(buf.snapshot()[4..], [0u8; 60]);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut buf = SharedPrintBuffer::new(16).unwrap();
        buf.print(7, &[]);
        buf.reset();
        assert_eq!(buf.snapshot(), vec![0u8; 16]);
    }
}
