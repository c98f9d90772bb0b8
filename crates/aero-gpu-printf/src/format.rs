//! printf-style format string parsing.
//!
//! The same parse drives both the command length computation (one argument slot per
//! [`Segment::Placeholder`]) and the final text expansion, so the two can never disagree.

/// Conversion character of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `%d`, `%i`
    Signed,
    /// `%u`
    Unsigned,
    /// `%o`
    Octal,
    /// `%x`, `%X`
    Hex {
        /// Whether the uppercase variant was requested.
        upper: bool,
    },
    /// `%f`, `%F`
    Fixed {
        /// Whether the uppercase variant was requested.
        upper: bool,
    },
    /// `%e`, `%E`
    Exponent {
        /// Whether the uppercase variant was requested.
        upper: bool,
    },
    /// `%g`, `%G`
    General {
        /// Whether the uppercase variant was requested.
        upper: bool,
    },
    /// `%c`
    Char,
    /// `%s`
    Str,
}

impl Conversion {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'd' | 'i' => Self::Signed,
            'u' => Self::Unsigned,
            'o' => Self::Octal,
            'x' => Self::Hex { upper: false },
            'X' => Self::Hex { upper: true },
            'f' => Self::Fixed { upper: false },
            'F' => Self::Fixed { upper: true },
            'e' => Self::Exponent { upper: false },
            'E' => Self::Exponent { upper: true },
            'g' => Self::General { upper: false },
            'G' => Self::General { upper: true },
            'c' => Self::Char,
            's' => Self::Str,
            _ => return None,
        })
    }
}

/// Placeholder flag characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// `-`
    pub left_align: bool,
    /// `+`
    pub plus_sign: bool,
    /// ` `
    pub space_sign: bool,
    /// `#`
    pub alternate: bool,
    /// `0`
    pub zero_pad: bool,
}

/// One parsed `%...` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spec {
    /// Flag characters.
    pub flags: Flags,
    /// Minimum field width.
    pub width: Option<usize>,
    /// Digits after the point for floats, minimum digits for integers, maximum characters for
    /// `%s`. A bare `.` is `Some(0)`.
    pub precision: Option<usize>,
    /// Conversion character.
    pub conversion: Conversion,
}

/// A run of a [`FormatString`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied to the output unchanged. Includes `%%` (as `%`) and malformed placeholders.
    Literal(&'a str),
    /// A placeholder consuming the next argument record.
    Placeholder(Spec),
}

/// A parsed format string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatString<'a> {
    segments: Vec<Segment<'a>>,
    placeholders: usize,
}

impl<'a> FormatString<'a> {
    /// Parses `text`. Never fails: anything that is not a valid placeholder stays literal.
    pub fn parse(text: &'a str) -> Self {
        let mut segments = Vec::new();
        let mut placeholders = 0usize;
        let mut literal_start = 0usize;
        let mut pos = 0usize;

        while let Some(rel) = text[pos..].find('%') {
            let start = pos + rel;
            let (parsed, end) = parse_placeholder(text, start);
            match parsed {
                Parsed::Spec(spec) => {
                    if literal_start < start {
                        segments.push(Segment::Literal(&text[literal_start..start]));
                    }
                    segments.push(Segment::Placeholder(spec));
                    placeholders += 1;
                    literal_start = end;
                }
                Parsed::Percent => {
                    // Keep the first `%` of `%%` in the literal run and drop the second.
                    segments.push(Segment::Literal(&text[literal_start..start + 1]));
                    literal_start = end;
                }
                // Malformed: leave it in the current literal run.
                Parsed::Malformed => {}
            }
            pos = end;
        }
        if literal_start < text.len() {
            segments.push(Segment::Literal(&text[literal_start..]));
        }

        Self {
            segments,
            placeholders,
        }
    }

    /// Literal runs and placeholders in order.
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Number of argument records a command using this format string carries.
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }
}

enum Parsed {
    Spec(Spec),
    Percent,
    Malformed,
}

/// Parses the placeholder starting at `text[start] == '%'`.
///
/// Returns the parse result and the byte offset just past the consumed text. For malformed
/// placeholders the offending character is consumed unless it is `%` (which starts the next
/// placeholder) or the string ended.
fn parse_placeholder(text: &str, start: usize) -> (Parsed, usize) {
    let bytes = text.as_bytes();
    let mut i = start + 1;

    if bytes.get(i) == Some(&b'%') {
        return (Parsed::Percent, i + 1);
    }

    let mut flags = Flags::default();
    while let Some(&b) = bytes.get(i) {
        match b {
            b'-' => flags.left_align = true,
            b'+' => flags.plus_sign = true,
            b' ' => flags.space_sign = true,
            b'#' => flags.alternate = true,
            b'0' => flags.zero_pad = true,
            _ => break,
        }
        i += 1;
    }

    let width = parse_digits(bytes, &mut i);

    let precision = if bytes.get(i) == Some(&b'.') {
        i += 1;
        Some(parse_digits(bytes, &mut i).unwrap_or(0))
    } else {
        None
    };

    // Length modifiers carry no information: every argument is 32 bits wide.
    match bytes.get(i) {
        Some(b'h') | Some(b'l') => {
            let m = bytes[i];
            i += 1;
            if bytes.get(i) == Some(&m) {
                i += 1;
            }
        }
        _ => {}
    }

    let Some(c) = text[i..].chars().next() else {
        return (Parsed::Malformed, i);
    };
    match Conversion::from_char(c) {
        Some(conversion) => (
            Parsed::Spec(Spec {
                flags,
                width,
                precision,
                conversion,
            }),
            i + 1,
        ),
        None if c == '%' => (Parsed::Malformed, i),
        None => (Parsed::Malformed, i + c.len_utf8()),
    }
}

fn parse_digits(bytes: &[u8], i: &mut usize) -> Option<usize> {
    let start = *i;
    let mut value = 0usize;
    while let Some(&b) = bytes.get(*i) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as usize);
        *i += 1;
    }
    (*i > start).then_some(value)
}
