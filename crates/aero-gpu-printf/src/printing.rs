use std::io::{self, Write};

use tracing::{debug, info};

use crate::error::GpuPrintError;
use crate::stream::{PrintOverflow, PrintStream};
use crate::strings::{LiteralStrings, StringTable};
use crate::writer::SharedPrintBuffer;

/// Default size of buffers handed out by [`GpuPrinting::create_buffer`].
pub const DEFAULT_PRINT_BUFFER_SIZE: usize = 64 * 1024;

/// Host-side settings for [`GpuPrinting`].
#[derive(Debug, Clone, Copy)]
pub struct GpuPrintingConfig {
    /// Size of buffers created by [`GpuPrinting::create_buffer`].
    pub buffer_size_bytes: usize,
    /// Also emit every decoded line as a `tracing` event (target `aero_gpu_printf`).
    pub trace_lines: bool,
}

impl Default for GpuPrintingConfig {
    fn default() -> Self {
        Self {
            buffer_size_bytes: DEFAULT_PRINT_BUFFER_SIZE,
            trace_lines: false,
        }
    }
}

impl GpuPrintingConfig {
    /// Overrides [`Self::buffer_size_bytes`].
    pub const BUFFER_SIZE_ENV: &'static str = "AERO_GPU_PRINTF_BUFFER_SIZE";
    /// Overrides [`Self::trace_lines`].
    pub const TRACE_LINES_ENV: &'static str = "AERO_GPU_PRINTF_TRACE_LINES";

    /// Defaults overridden by `AERO_GPU_PRINTF_BUFFER_SIZE` (bytes) and
    /// `AERO_GPU_PRINTF_TRACE_LINES` (`1`/`true`/`0`/`false`).
    pub fn from_env() -> Result<Self, GpuPrintError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, GpuPrintError> {
        let mut config = Self::default();
        if let Some(value) = lookup(Self::BUFFER_SIZE_ENV) {
            config.buffer_size_bytes = value
                .trim()
                .parse()
                .ok()
                .filter(|&n: &usize| n >= 4 && n % 4 == 0)
                .ok_or(GpuPrintError::InvalidConfig {
                    var: Self::BUFFER_SIZE_ENV,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(Self::TRACE_LINES_ENV) {
            config.trace_lines = match value.trim() {
                "1" | "true" => true,
                "0" | "false" | "" => false,
                _ => {
                    return Err(GpuPrintError::InvalidConfig {
                        var: Self::TRACE_LINES_ENV,
                        value,
                    })
                }
            };
        }
        Ok(config)
    }
}

/// What a call to [`GpuPrinting::process_gpu_print_commands`] printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintSummary {
    /// Lines written to the output sink.
    pub lines: usize,
    /// Set when the cursor ran past the buffer; the warning has already been written.
    pub overflow: Option<PrintOverflow>,
}

/// Host side of shader printf: owns the string table shared by every program that prints, and
/// turns GPU-written print buffers into output lines.
///
/// `load_strings` needs `&mut self` while decoding only needs `&self`, so table updates cannot
/// race a decode.
#[derive(Debug, Default)]
pub struct GpuPrinting {
    strings: StringTable,
    config: GpuPrintingConfig,
}

impl GpuPrinting {
    /// Empty string table, default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty string table with `config`.
    pub fn with_config(config: GpuPrintingConfig) -> Self {
        Self {
            strings: StringTable::new(),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &GpuPrintingConfig {
        &self.config
    }

    /// Every literal registered so far.
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Registers the string literals of one compiled program. Call once per program.
    pub fn load_strings(&mut self, program: &dyn LiteralStrings) -> usize {
        self.strings.load_strings(program)
    }

    /// Allocates a zeroed host print buffer of the configured size.
    pub fn create_buffer(&self) -> Result<SharedPrintBuffer, GpuPrintError> {
        SharedPrintBuffer::new(self.config.buffer_size_bytes)
    }

    /// Decodes `buffer` and prints one line per command to stdout, plus at most one overflow
    /// warning to stderr.
    ///
    /// The caller must have synchronized with the GPU so every write to `buffer` is visible.
    pub fn process_gpu_print_commands(
        &self,
        buffer: &[u8],
    ) -> Result<PrintSummary, GpuPrintError> {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.process_gpu_print_commands_to(buffer, &mut stdout.lock(), &mut stderr.lock())
    }

    /// Like [`Self::process_gpu_print_commands`] with caller-provided sinks.
    pub fn process_gpu_print_commands_to<O: Write, E: Write>(
        &self,
        buffer: &[u8],
        out: &mut O,
        err: &mut E,
    ) -> Result<PrintSummary, GpuPrintError> {
        let stream = PrintStream::new(buffer)?;

        let overflow = stream.overflow();
        // One warning per call, on `err`. The event stays below WARN so a stderr log sink does
        // not repeat it.
        if let Some(overflow) = overflow {
            debug!(
                requested = overflow.requested,
                available = overflow.available,
                dropped = overflow.dropped_bytes(),
                "GPU print buffer overflow"
            );
            writeln!(err, "{overflow}")?;
        }

        let mut lines = 0usize;
        for cmd in stream.commands(&self.strings) {
            let mut line = cmd.render();
            if self.config.trace_lines {
                info!(target: "aero_gpu_printf", offset = cmd.offset, "{line}");
            }
            line.push('\n');
            out.write_all(line.as_bytes())?;
            lines += 1;
        }
        out.flush()?;

        Ok(PrintSummary { lines, overflow })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(
        vars: &'a [(&'static str, &'a str)],
    ) -> impl Fn(&'static str) -> Option<String> + 'a {
        move |var| {
            vars.iter()
                .find(|(k, _)| *k == var)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn config_defaults_without_env() {
        let config = GpuPrintingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.buffer_size_bytes, DEFAULT_PRINT_BUFFER_SIZE);
        assert!(!config.trace_lines);
    }

    #[test]
    fn config_reads_overrides() {
        let config = GpuPrintingConfig::from_lookup(lookup(&[
            (GpuPrintingConfig::BUFFER_SIZE_ENV, "4096"),
            (GpuPrintingConfig::TRACE_LINES_ENV, "true"),
        ]))
        .unwrap();
        assert_eq!(config.buffer_size_bytes, 4096);
        assert!(config.trace_lines);
    }

    #[test]
    fn config_rejects_bad_values() {
        for (var, value) in [
            (GpuPrintingConfig::BUFFER_SIZE_ENV, "13"),
            (GpuPrintingConfig::BUFFER_SIZE_ENV, "lots"),
            (GpuPrintingConfig::TRACE_LINES_ENV, "maybe"),
        ] {
            let err = GpuPrintingConfig::from_lookup(lookup(&[(var, value)])).unwrap_err();
            assert!(
                matches!(err, GpuPrintError::InvalidConfig { var: v, .. } if v == var),
                "{err}"
            );
        }
    }

    #[test]
    fn stdout_variant_reports_summary() {
        let mut printing = GpuPrinting::new();
        printing.load_strings(&["hi"]);
        let mut buf = vec![0u8; 16];
        buf[..4].copy_from_slice(&8u32.to_le_bytes());
        buf[4..8].copy_from_slice(&crate::hash_string("hi").to_le_bytes());
        let summary = printing.process_gpu_print_commands(&buf).unwrap();
        assert_eq!(summary, PrintSummary { lines: 1, overflow: None });
    }
}
