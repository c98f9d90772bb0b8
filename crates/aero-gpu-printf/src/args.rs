use crate::abi::{read_arg_record, ArgRecord, ArgTag, ARG_RECORD_SIZE_BYTES};
use crate::strings::{Resolved, StringTable};

/// A decoded argument record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue<'t> {
    /// [`ArgTag::Int`].
    Int(i32),
    /// [`ArgTag::Uint`].
    Uint(u32),
    /// [`ArgTag::Float`].
    Float(f32),
    /// [`ArgTag::Bool`].
    Bool(bool),
    /// A nested string reference, already looked up in the string table.
    Str(Resolved<'t>),
    /// A record whose tag is outside the protocol's enumeration.
    Unknown {
        /// Raw tag value.
        tag: u32,
        /// Raw value bits.
        bits: u32,
    },
}

impl<'t> ArgValue<'t> {
    /// Interprets `record`, resolving string references through `strings`.
    pub fn decode(record: ArgRecord, strings: &'t StringTable) -> Self {
        match record.tag() {
            Some(ArgTag::Int) => Self::Int(record.bits as i32),
            Some(ArgTag::Uint) => Self::Uint(record.bits),
            Some(ArgTag::Float) => Self::Float(f32::from_bits(record.bits)),
            Some(ArgTag::Bool) => Self::Bool(record.bits != 0),
            Some(ArgTag::StringHash) => Self::Str(strings.resolve(record.bits)),
            None => Self::Unknown {
                tag: record.tag,
                bits: record.bits,
            },
        }
    }
}

/// Iterates the argument records of one command.
///
/// `bytes` holds exactly the argument slots (header excluded); a trailing partial slot is ignored.
#[derive(Debug, Clone)]
pub struct ArgDecoder<'a, 't> {
    bytes: &'a [u8],
    offset: usize,
    strings: &'t StringTable,
}

impl<'a, 't> ArgDecoder<'a, 't> {
    /// Decoder over the argument slots in `bytes`.
    pub fn new(bytes: &'a [u8], strings: &'t StringTable) -> Self {
        Self {
            bytes,
            offset: 0,
            strings,
        }
    }
}

impl<'t> Iterator for ArgDecoder<'_, 't> {
    type Item = ArgValue<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = read_arg_record(self.bytes, self.offset)?;
        self.offset += ARG_RECORD_SIZE_BYTES;
        Some(ArgValue::decode(record, self.strings))
    }
}
