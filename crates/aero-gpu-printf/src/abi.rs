//! GPU → host print buffer ABI.
//!
//! Buffer layout (all little-endian):
//!
//! ```text
//! [0, 4)          u32 cursor: payload bytes reserved by shader invocations
//! [4, byte_size)  densely packed print commands, in reservation order
//! ```
//!
//! The payload is a sequence of 8-byte slots. A command is one header slot followed by one
//! argument slot per placeholder of its format string:
//!
//! ```text
//! header:   u32 format_hash, u32 reserved (0)
//! argument: u32 type_tag,    u32 value bits
//! ```
//!
//! The command length is never stored; it is derived from the format string the header's hash
//! resolves to.

/// Size of the reservation cursor at the start of the buffer.
pub const CURSOR_SIZE_BYTES: usize = 4;

/// Size of one header or argument slot.
pub const SLOT_SIZE_BYTES: usize = 8;

/// Size of a command header.
pub const COMMAND_HEADER_SIZE_BYTES: usize = SLOT_SIZE_BYTES;

/// Size of a single argument record.
pub const ARG_RECORD_SIZE_BYTES: usize = SLOT_SIZE_BYTES;

/// Argument type tags. `0` is unassigned; zeroed memory never decodes as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ArgTag {
    /// `i32`, two's complement.
    Int = 1,
    /// `u32`.
    Uint = 2,
    /// `f32` bit pattern.
    Float = 3,
    /// Zero is `false`, anything else `true`.
    Bool = 4,
    /// [`crate::hash_string`] of a registered literal.
    StringHash = 5,
}

impl ArgTag {
    /// Decodes a wire tag; `None` for values outside the enumeration.
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            x if x == Self::Int as u32 => Some(Self::Int),
            x if x == Self::Uint as u32 => Some(Self::Uint),
            x if x == Self::Float as u32 => Some(Self::Float),
            x if x == Self::Bool as u32 => Some(Self::Bool),
            x if x == Self::StringHash as u32 => Some(Self::StringHash),
            _ => None,
        }
    }
}

/// First slot of every command.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// [`crate::hash_string`] of the format string literal.
    pub format_hash: u32,
    /// Written as zero by shaders; ignored by the decoder.
    pub reserved: u32,
}

/// A raw argument slot. The tag is kept as a `u32` so unknown tags survive decoding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgRecord {
    /// Raw [`ArgTag`] value.
    pub tag: u32,
    /// Value bits, interpreted according to the tag.
    pub bits: u32,
}

impl ArgRecord {
    /// The decoded tag, if it is known.
    pub fn tag(&self) -> Option<ArgTag> {
        ArgTag::from_u32(self.tag)
    }
}

/// Byte length of a command whose format string has `placeholders` argument placeholders.
///
/// Returns `None` if the length does not fit in `usize`.
pub fn command_len(placeholders: usize) -> Option<usize> {
    placeholders
        .checked_mul(ARG_RECORD_SIZE_BYTES)?
        .checked_add(COMMAND_HEADER_SIZE_BYTES)
}

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let word: [u8; 4] = bytes.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(word))
}

fn read_slot(bytes: &[u8], offset: usize) -> Option<(u32, u32)> {
    let lo = read_u32_le(bytes, offset)?;
    let hi = read_u32_le(bytes, offset.checked_add(4)?)?;
    Some((lo, hi))
}

pub(crate) fn read_command_header(bytes: &[u8], offset: usize) -> Option<CommandHeader> {
    read_slot(bytes, offset).map(|(format_hash, reserved)| CommandHeader {
        format_hash,
        reserved,
    })
}

pub(crate) fn read_arg_record(bytes: &[u8], offset: usize) -> Option<ArgRecord> {
    read_slot(bytes, offset).map(|(tag, bits)| ArgRecord { tag, bits })
}
