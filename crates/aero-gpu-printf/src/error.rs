use std::io;

use thiserror::Error;

/// Host-side failures. Malformed buffer contents are never an error; they degrade the output.
#[derive(Debug, Error)]
pub enum GpuPrintError {
    /// The buffer cannot even hold the cursor.
    #[error("print buffer is {len} bytes; need at least 4 for the cursor")]
    BufferTooSmall {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// [`crate::SharedPrintBuffer::new`] was given an unusable size.
    #[error("print buffer size {byte_size} must be a non-zero multiple of 4 bytes")]
    InvalidBufferSize {
        /// Requested size in bytes.
        byte_size: usize,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidConfig {
        /// Name of the environment variable.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Writing to an output sink failed.
    #[error("failed to write GPU print output: {0}")]
    Io(#[from] io::Error),
}
