#![forbid(unsafe_code)]

use std::env;
use std::fs;
use std::io::{self, IsTerminal};

use aero_gpu_printf::{GpuPrinting, GpuPrintingConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the decoded lines; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let mut args = env::args().skip(1);
    let (Some(strings_path), Some(buffer_path)) = (args.next(), args.next()) else {
        eprintln!("usage: aero-gpu-printf <strings.txt> <print-buffer.bin>");
        eprintln!("  strings.txt: one string literal per line (\\n, \\t and \\\\ escapes)");
        std::process::exit(2);
    };

    let literals: Vec<String> = fs::read_to_string(&strings_path)?
        .lines()
        .map(unescape_literal)
        .collect();

    let mut printing = GpuPrinting::with_config(GpuPrintingConfig::from_env()?);
    printing.load_strings(&literals);

    let buffer = fs::read(&buffer_path)?;
    let summary = printing.process_gpu_print_commands(&buffer)?;
    tracing::debug!(lines = summary.lines, "decoded {buffer_path}");
    Ok(())
}

fn unescape_literal(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_common_sequences() {
        assert_eq!(unescape_literal(r"a\tb\n"), "a\tb\n");
        assert_eq!(unescape_literal(r"100%% \\ \q \"), "100%% \\ \\q \\");
    }
}
