//! Host-side decoder for shader `printf`.
//!
//! Shader invocations cannot perform I/O. Instead each one reserves a disjoint range of a shared
//! print buffer with an atomic add on the buffer's cursor and writes a compact command into it:
//! the hash of a format string literal plus one type-tagged record per placeholder. After the
//! dispatch completes the host decodes the buffer with [`GpuPrinting`]:
//!
//! - [`StringTable`] maps literal hashes back to text; it is filled from shader reflection through
//!   the [`LiteralStrings`] trait.
//! - [`PrintStream`] performs one bounds-checked pass over the buffer. A cursor larger than the
//!   buffer is clamped and reported once; a trailing command that does not fit is dropped.
//! - [`ArgDecoder`] and [`render`] turn the records into text with C `printf` semantics.
//!
//! The buffer is treated as **untrusted**: decoding never panics and never reads outside it.
//! See [`abi`] for the wire layout and [`hash_string`] for the pinned hash shared with the
//! shader compiler.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod abi;
mod args;
mod error;
mod format;
mod formatter;
mod hash;
mod printing;
mod stream;
mod strings;
mod writer;

pub use crate::args::{ArgDecoder, ArgValue};
pub use crate::error::GpuPrintError;
pub use crate::format::{Conversion, Flags, FormatString, Segment, Spec};
pub use crate::formatter::render;
pub use crate::hash::{hash_string, STRING_HASH_VERSION};
pub use crate::printing::{
    GpuPrinting, GpuPrintingConfig, PrintSummary, DEFAULT_PRINT_BUFFER_SIZE,
};
pub use crate::stream::{
    decode_print_buffer, DecodedPrintBuffer, PrintCommand, PrintCommands, PrintOverflow,
    PrintStream,
};
pub use crate::strings::{LiteralStrings, Resolved, StringTable};
pub use crate::writer::{encode_print_command, PrintArg, PrintBufferWriter, SharedPrintBuffer};
