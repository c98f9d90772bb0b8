//! Bounded single pass over a GPU-written print buffer.

use core::fmt;

use tracing::trace;

use crate::abi::{
    command_len, read_command_header, read_u32_le, COMMAND_HEADER_SIZE_BYTES, CURSOR_SIZE_BYTES,
};
use crate::args::ArgDecoder;
use crate::error::GpuPrintError;
use crate::format::FormatString;
use crate::formatter;
use crate::strings::{Resolved, StringTable};

/// Shaders reserved more bytes than the buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOverflow {
    /// Cursor value written by the GPU.
    pub requested: u32,
    /// Payload capacity of the buffer (`byte_size - 4`).
    pub available: usize,
}

impl PrintOverflow {
    /// Bytes reserved past the end of the buffer.
    pub fn dropped_bytes(&self) -> u64 {
        (self.requested as u64).saturating_sub(self.available as u64)
    }
}

impl fmt::Display for PrintOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GPU print buffer overflow: {} bytes dropped ({} requested, {} available)",
            self.dropped_bytes(),
            self.requested,
            self.available
        )
    }
}

/// A print buffer with its cursor validated and clamped.
#[derive(Debug, Clone, Copy)]
pub struct PrintStream<'a> {
    buf: &'a [u8],
    requested: u32,
    /// End of the scanned region: `4 + min(requested, byte_size - 4)`.
    end: usize,
}

impl<'a> PrintStream<'a> {
    /// Reads the cursor. Fails only if `buf` is shorter than the cursor itself.
    pub fn new(buf: &'a [u8]) -> Result<Self, GpuPrintError> {
        let requested =
            read_u32_le(buf, 0).ok_or(GpuPrintError::BufferTooSmall { len: buf.len() })?;
        let available = buf.len() - CURSOR_SIZE_BYTES;
        let cursor = usize::try_from(requested)
            .unwrap_or(usize::MAX)
            .min(available);
        Ok(Self {
            buf,
            requested,
            end: CURSOR_SIZE_BYTES + cursor,
        })
    }

    /// Cursor value as written by the GPU, before clamping.
    pub fn requested_bytes(&self) -> u32 {
        self.requested
    }

    /// Payload bytes that will be scanned.
    pub fn payload_len(&self) -> usize {
        self.end - CURSOR_SIZE_BYTES
    }

    /// `Some` if the cursor claims more bytes than the payload area holds.
    pub fn overflow(&self) -> Option<PrintOverflow> {
        let available = self.buf.len() - CURSOR_SIZE_BYTES;
        ((self.requested as u64) > available as u64).then_some(PrintOverflow {
            requested: self.requested,
            available,
        })
    }

    /// Iterates the complete commands in buffer order.
    pub fn commands<'t>(&self, strings: &'t StringTable) -> PrintCommands<'a, 't> {
        PrintCommands {
            buf: &self.buf[..self.end],
            offset: CURSOR_SIZE_BYTES,
            strings,
            done: false,
        }
    }
}

/// One decoded print request.
#[derive(Debug, Clone)]
pub struct PrintCommand<'a, 't> {
    /// Byte offset of the command header within the buffer.
    pub offset: usize,
    /// Hash from the command header.
    pub format_hash: u32,
    /// The format string the hash resolved to.
    pub format: Resolved<'t>,
    parsed: FormatString<'t>,
    args: &'a [u8],
    strings: &'t StringTable,
}

impl<'a, 't> PrintCommand<'a, 't> {
    /// Raw argument slots following the header.
    pub fn arg_bytes(&self) -> &'a [u8] {
        self.args
    }

    /// Decoded arguments, one per placeholder.
    pub fn args(&self) -> ArgDecoder<'a, 't> {
        ArgDecoder::new(self.args, self.strings)
    }

    /// Total size of the command in the buffer.
    pub fn len_bytes(&self) -> usize {
        COMMAND_HEADER_SIZE_BYTES + self.args.len()
    }

    /// The printed line, without a trailing newline.
    pub fn render(&self) -> String {
        match self.format {
            Resolved::Text(_) => formatter::render(&self.parsed, self.args()),
            Resolved::Unknown(_) => self.format.to_string(),
        }
    }
}

/// Iterator over the commands of a [`PrintStream`].
///
/// Stops at the first command that does not fit in the scanned region; that command and anything
/// after it are dropped.
#[derive(Debug, Clone)]
pub struct PrintCommands<'a, 't> {
    /// Buffer truncated to the scanned region.
    buf: &'a [u8],
    offset: usize,
    strings: &'t StringTable,
    done: bool,
}

impl<'a, 't> Iterator for PrintCommands<'a, 't> {
    type Item = PrintCommand<'a, 't>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.buf.len() {
            return None;
        }

        let Some(header) = read_command_header(self.buf, self.offset) else {
            trace!(offset = self.offset, "dropping partial GPU print command header");
            self.done = true;
            return None;
        };

        let format = self.strings.resolve(header.format_hash);
        let parsed = match format {
            Resolved::Text(text) => FormatString::parse(text),
            Resolved::Unknown(hash) => {
                trace!(offset = self.offset, hash, "unknown GPU print format hash");
                FormatString::default()
            }
        };

        let cmd_end = command_len(parsed.placeholder_count())
            .and_then(|len| self.offset.checked_add(len))
            .filter(|&end| end <= self.buf.len());
        let Some(cmd_end) = cmd_end else {
            trace!(
                offset = self.offset,
                placeholders = parsed.placeholder_count(),
                "dropping truncated GPU print command"
            );
            self.done = true;
            return None;
        };

        let cmd = PrintCommand {
            offset: self.offset,
            format_hash: header.format_hash,
            format,
            parsed,
            args: &self.buf[self.offset + COMMAND_HEADER_SIZE_BYTES..cmd_end],
            strings: self.strings,
        };
        self.offset = cmd_end;
        Some(cmd)
    }
}

/// Output of [`decode_print_buffer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPrintBuffer {
    /// One rendered line per complete command, in buffer order.
    pub lines: Vec<String>,
    /// Set when the cursor ran past the buffer.
    pub overflow: Option<PrintOverflow>,
}

/// Decodes every complete command in `buf` without writing anywhere.
pub fn decode_print_buffer(
    strings: &StringTable,
    buf: &[u8],
) -> Result<DecodedPrintBuffer, GpuPrintError> {
    let stream = PrintStream::new(buf)?;
    Ok(DecodedPrintBuffer {
        lines: stream.commands(strings).map(|cmd| cmd.render()).collect(),
        overflow: stream.overflow(),
    })
}
