//! Expands a parsed format string against decoded arguments, following C `printf` output rules
//! for the supported conversions.

use crate::args::ArgValue;
use crate::format::{Conversion, FormatString, Segment, Spec};

// Format strings are shader literals, but a typo like `%99999999d` must not allocate gigabytes.
const MAX_FIELD_WIDTH: usize = 1024;
const MAX_PRECISION: usize = 256;

const DEFAULT_FLOAT_PRECISION: usize = 6;

/// Expands `format`, consuming one argument per placeholder.
///
/// Placeholders left without an argument expand to `<missing arg>`; surplus arguments are
/// ignored.
pub fn render<'t>(
    format: &FormatString<'_>,
    args: impl IntoIterator<Item = ArgValue<'t>>,
) -> String {
    let mut args = args.into_iter();
    let mut out = String::new();
    for segment in format.segments() {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(spec) => match args.next() {
                Some(value) => format_arg(&mut out, spec, value),
                None => out.push_str("<missing arg>"),
            },
        }
    }
    out
}

fn format_arg(out: &mut String, spec: &Spec, value: ArgValue<'_>) {
    // Strings and unknown records render as text under every conversion.
    if let ArgValue::Str(_) | ArgValue::Unknown { .. } = value {
        return format_text(out, spec, &display_text(value));
    }

    match spec.conversion {
        Conversion::Signed => {
            let v = as_i32(value);
            format_integer(out, spec, v < 0, v.unsigned_abs(), 10, false, true);
        }
        Conversion::Unsigned => format_integer(out, spec, false, as_u32(value), 10, false, false),
        Conversion::Octal => format_integer(out, spec, false, as_u32(value), 8, false, false),
        Conversion::Hex { upper } => {
            format_integer(out, spec, false, as_u32(value), 16, upper, false)
        }
        Conversion::Fixed { .. } | Conversion::Exponent { .. } | Conversion::General { .. } => {
            format_float(out, spec, as_f64(value))
        }
        Conversion::Char => {
            let c = char::from_u32(as_u32(value)).unwrap_or(char::REPLACEMENT_CHARACTER);
            pad(out, spec, "", c.encode_utf8(&mut [0u8; 4]), false);
        }
        Conversion::Str => format_text(out, spec, &display_text(value)),
    }
}

fn display_text(value: ArgValue<'_>) -> String {
    match value {
        ArgValue::Int(v) => v.to_string(),
        ArgValue::Uint(v) => v.to_string(),
        ArgValue::Float(v) => v.to_string(),
        ArgValue::Bool(v) => v.to_string(),
        ArgValue::Str(resolved) => resolved.to_string(),
        ArgValue::Unknown { tag, .. } => format!("<unknown arg tag:{tag}>"),
    }
}

fn as_i32(value: ArgValue<'_>) -> i32 {
    match value {
        ArgValue::Int(v) => v,
        ArgValue::Uint(v) => v as i32,
        ArgValue::Float(v) => v as i32,
        ArgValue::Bool(v) => v as i32,
        ArgValue::Str(_) | ArgValue::Unknown { .. } => 0,
    }
}

fn as_u32(value: ArgValue<'_>) -> u32 {
    match value {
        ArgValue::Uint(v) => v,
        other => as_i32(other) as u32,
    }
}

fn as_f64(value: ArgValue<'_>) -> f64 {
    match value {
        ArgValue::Int(v) => v as f64,
        ArgValue::Uint(v) => v as f64,
        ArgValue::Float(v) => v as f64,
        ArgValue::Bool(v) => v as u8 as f64,
        ArgValue::Str(_) | ArgValue::Unknown { .. } => 0.0,
    }
}

fn width(spec: &Spec) -> usize {
    spec.width.unwrap_or(0).min(MAX_FIELD_WIDTH)
}

/// Writes `prefix` + `body` padded to the field width.
///
/// With `zero_pad` the padding goes between prefix (sign, `0x`) and body, as C does.
fn pad(out: &mut String, spec: &Spec, prefix: &str, body: &str, zero_pad: bool) {
    let len = prefix.chars().count() + body.chars().count();
    let fill = width(spec).saturating_sub(len);
    if spec.flags.left_align {
        out.push_str(prefix);
        out.push_str(body);
        out.extend(core::iter::repeat(' ').take(fill));
    } else if zero_pad {
        out.push_str(prefix);
        out.extend(core::iter::repeat('0').take(fill));
        out.push_str(body);
    } else {
        out.extend(core::iter::repeat(' ').take(fill));
        out.push_str(prefix);
        out.push_str(body);
    }
}

fn format_text(out: &mut String, spec: &Spec, text: &str) {
    match (spec.conversion, spec.precision) {
        (Conversion::Str, Some(max_chars)) => {
            let end = text
                .char_indices()
                .nth(max_chars)
                .map_or(text.len(), |(i, _)| i);
            pad(out, spec, "", &text[..end], false);
        }
        _ => pad(out, spec, "", text, false),
    }
}

fn format_integer(
    out: &mut String,
    spec: &Spec,
    negative: bool,
    magnitude: u32,
    radix: u32,
    upper: bool,
    signed: bool,
) {
    let mut digits = match (radix, upper) {
        (8, _) => format!("{magnitude:o}"),
        (16, false) => format!("{magnitude:x}"),
        (16, true) => format!("{magnitude:X}"),
        _ => magnitude.to_string(),
    };

    if let Some(precision) = spec.precision {
        let precision = precision.min(MAX_PRECISION);
        if precision == 0 && magnitude == 0 {
            digits.clear();
        } else if digits.len() < precision {
            digits.insert_str(0, &"0".repeat(precision - digits.len()));
        }
    }

    let mut prefix = String::new();
    if signed {
        if negative {
            prefix.push('-');
        } else if spec.flags.plus_sign {
            prefix.push('+');
        } else if spec.flags.space_sign {
            prefix.push(' ');
        }
    }
    if spec.flags.alternate {
        match radix {
            8 if !digits.starts_with('0') => digits.insert(0, '0'),
            16 if magnitude != 0 => prefix.push_str(if upper { "0X" } else { "0x" }),
            _ => {}
        }
    }

    let zero_pad = spec.flags.zero_pad && spec.precision.is_none();
    pad(out, spec, &prefix, &digits, zero_pad);
}

fn format_float(out: &mut String, spec: &Spec, v: f64) {
    let (upper, style) = match spec.conversion {
        Conversion::Fixed { upper } => (upper, FloatStyle::Fixed),
        Conversion::Exponent { upper } => (upper, FloatStyle::Exponent),
        Conversion::General { upper } => (upper, FloatStyle::General),
        _ => (false, FloatStyle::Fixed),
    };

    let sign = if v.is_sign_negative() && !v.is_nan() {
        "-"
    } else if spec.flags.plus_sign {
        "+"
    } else if spec.flags.space_sign {
        " "
    } else {
        ""
    };

    if !v.is_finite() {
        let body = match (v.is_nan(), upper) {
            (true, false) => "nan",
            (true, true) => "NAN",
            (false, false) => "inf",
            (false, true) => "INF",
        };
        pad(out, spec, sign, body, false);
        return;
    }

    let abs = v.abs();
    let precision = spec
        .precision
        .unwrap_or(DEFAULT_FLOAT_PRECISION)
        .min(MAX_PRECISION);
    let alternate = spec.flags.alternate;
    let mut body = match style {
        FloatStyle::Fixed => fixed(abs, precision, alternate),
        FloatStyle::Exponent => exponent(abs, precision, alternate),
        FloatStyle::General => general(abs, precision, alternate),
    };
    if upper {
        body.make_ascii_uppercase();
    }
    pad(out, spec, sign, &body, spec.flags.zero_pad);
}

#[derive(Clone, Copy)]
enum FloatStyle {
    Fixed,
    Exponent,
    General,
}

fn fixed(abs: f64, precision: usize, alternate: bool) -> String {
    let mut s = format!("{abs:.precision$}");
    if alternate && precision == 0 {
        s.push('.');
    }
    s
}

/// Splits Rust's `{:e}` output (`1.5e-7`) into mantissa and decimal exponent.
fn rust_exponent(abs: f64, precision: usize) -> (String, i32) {
    let s = format!("{abs:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_owned(), exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn exponent(abs: f64, precision: usize, alternate: bool) -> String {
    let (mut mantissa, exp) = rust_exponent(abs, precision);
    if alternate && precision == 0 {
        mantissa.push('.');
    }
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{exp_sign}{:02}", exp.unsigned_abs())
}

fn general(abs: f64, precision: usize, alternate: bool) -> String {
    let p = precision.max(1);
    let x = if abs == 0.0 {
        0
    } else {
        rust_exponent(abs, p - 1).1
    };

    let s = if x >= -4 && (x as i64) < p as i64 {
        fixed(abs, (p as i64 - 1 - x as i64) as usize, alternate)
    } else {
        exponent(abs, p - 1, alternate)
    };
    if alternate {
        return s;
    }

    let (mantissa, exp) = match s.find('e') {
        Some(i) => s.split_at(i),
        None => (s.as_str(), ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{mantissa}{exp}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::Resolved;
    use pretty_assertions::assert_eq;

    fn fmt(format: &str, args: &[ArgValue<'_>]) -> String {
        render(&FormatString::parse(format), args.iter().copied())
    }

    #[test]
    fn integers() {
        assert_eq!(fmt("%d", &[ArgValue::Int(-42)]), "-42");
        assert_eq!(fmt("%i", &[ArgValue::Uint(u32::MAX)]), "-1");
        assert_eq!(fmt("%u", &[ArgValue::Int(-1)]), "4294967295");
        assert_eq!(fmt("%5d|%-5d|%05d", &[ArgValue::Int(42); 3]), "   42|42   |00042");
        assert_eq!(fmt("%+d % d", &[ArgValue::Int(7), ArgValue::Int(7)]), "+7  7");
        assert_eq!(fmt("%.3d", &[ArgValue::Int(-5)]), "-005");
        assert_eq!(fmt("[%.0d]", &[ArgValue::Int(0)]), "[]");
        assert_eq!(fmt("%x %X %#x", &[ArgValue::Uint(0xbeef); 3]), "beef BEEF 0xbeef");
        assert_eq!(fmt("%#010x", &[ArgValue::Uint(0xbeef)]), "0x0000beef");
        assert_eq!(fmt("%o %#o", &[ArgValue::Uint(8); 2]), "10 010");
        assert_eq!(fmt("%ld %hu", &[ArgValue::Int(3), ArgValue::Uint(4)]), "3 4");
    }

    #[test]
    fn floats() {
        assert_eq!(fmt("%f", &[ArgValue::Float(1.5)]), "1.500000");
        assert_eq!(fmt("%.2f", &[ArgValue::Float(-0.25)]), "-0.25");
        assert_eq!(fmt("%8.3f|", &[ArgValue::Float(3.5)]), "   3.500|");
        assert_eq!(fmt("%08.3f", &[ArgValue::Float(-3.5)]), "-003.500");
        assert_eq!(fmt("%.0f %#.0f", &[ArgValue::Float(2.0); 2]), "2 2.");
        assert_eq!(fmt("%e", &[ArgValue::Float(1234.5)]), "1.234500e+03");
        assert_eq!(fmt("%.2E", &[ArgValue::Float(0.000125)]), "1.25E-04");
        assert_eq!(fmt("%g", &[ArgValue::Float(0.0001)]), "0.0001");
        assert_eq!(fmt("%g", &[ArgValue::Float(100000.0)]), "100000");
        assert_eq!(fmt("%g", &[ArgValue::Float(1000000.0)]), "1e+06");
        assert_eq!(fmt("%g", &[ArgValue::Float(0.0)]), "0");
        assert_eq!(fmt("%G", &[ArgValue::Float(0.00001)]), "1E-05");
        assert_eq!(fmt("%#g", &[ArgValue::Float(2.5)]), "2.50000");
        assert_eq!(fmt("%f", &[ArgValue::Int(3)]), "3.000000");
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(fmt("%f", &[ArgValue::Float(f32::INFINITY)]), "inf");
        assert_eq!(fmt("%E", &[ArgValue::Float(f32::NEG_INFINITY)]), "-INF");
        assert_eq!(fmt("%05f", &[ArgValue::Float(f32::NAN)]), "  nan");
    }

    #[test]
    fn strings_chars_and_bools() {
        assert_eq!(
            fmt("%s=%d", &[ArgValue::Str(Resolved::Text("flag")), ArgValue::Bool(true)]),
            "flag=1"
        );
        assert_eq!(fmt("%s", &[ArgValue::Bool(false)]), "false");
        assert_eq!(
            fmt(
                "%.3s|%6s|",
                &[
                    ArgValue::Str(Resolved::Text("abcdef")),
                    ArgValue::Str(Resolved::Text("ab"))
                ]
            ),
            "abc|    ab|"
        );
        assert_eq!(fmt("%c%c", &[ArgValue::Uint(0x41), ArgValue::Int(0x00e9)]), "Aé");
        assert_eq!(fmt("%c", &[ArgValue::Uint(0xd800)]), "\u{fffd}");
        assert_eq!(
            fmt("%s", &[ArgValue::Str(Resolved::Unknown(0x10))]),
            "<unknown string:0x00000010>"
        );
    }

    #[test]
    fn unknown_tags_and_missing_args() {
        assert_eq!(
            fmt("%d %d", &[ArgValue::Unknown { tag: 0, bits: 1 }]),
            "<unknown arg tag:0> <missing arg>"
        );
    }

    #[test]
    fn oversized_width_is_clamped() {
        assert_eq!(fmt("%99999999d", &[ArgValue::Int(1)]).len(), MAX_FIELD_WIDTH);
    }
}
