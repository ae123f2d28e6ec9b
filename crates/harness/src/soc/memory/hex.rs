//! Hex text formats.
//!
//! Program images, reference files and dumps are plain text word streams:
//! 1. **Images:** `#` or `/` comment lines, `@<word index>` origin directives, hex data words.
//! 2. **Dumps:** One 8-digit lowercase hex word per line.
//! 3. **Manifest fields:** Strict hex integers with an optional `0x` prefix.
//!
//! Image tokens are parsed permissively: the longest hex prefix is used and a token with no
//! digits reads as zero.

use std::io::{self, Write};

/// One non-comment line of a program image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageLine {
    /// Word index from an `@` directive, if the line starts with one.
    pub origin: Option<i64>,
    /// Data words following the directive (or the whole line).
    pub words: Vec<u32>,
}

/// Parses the leading hex integer of `token`.
///
/// Accepts an optional sign and an optional `0x` prefix, stops at the first non-hex
/// character and saturates at the `i64` limits.
pub fn parse_hex_prefix(token: &str) -> i64 {
    const LIMIT: u64 = i64::MAX as u64;

    let (negative, rest) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .filter(|d| d.starts_with(|c: char| c.is_ascii_hexdigit()))
        .unwrap_or(rest);

    let mut value: u64 = 0;
    for digit in digits.chars().map_while(|c| c.to_digit(16)) {
        value = value
            .saturating_mul(16)
            .saturating_add(u64::from(digit))
            .min(LIMIT + 1);
    }

    match (negative, value > LIMIT) {
        (false, true) => i64::MAX,
        (true, true) => i64::MIN,
        (false, false) => value as i64,
        (true, false) => -(value as i64),
    }
}

/// Parses an image data token into a 32-bit word (low 32 bits of the parsed value).
#[inline]
pub fn parse_word(token: &str) -> u32 {
    parse_hex_prefix(token) as u32
}

/// Parses one line of a program image.
///
/// # Returns
///
/// `None` for comment lines; otherwise the optional origin and the data words.
pub fn parse_image_line(line: &str) -> Option<ImageLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.starts_with('#') || line.starts_with('/') {
        return None;
    }

    let mut parsed = ImageLine::default();
    let data = match line.strip_prefix('@') {
        Some(rest) => {
            let mut tokens = rest.split_whitespace();
            parsed.origin = Some(tokens.next().map_or(0, parse_hex_prefix));
            tokens
        }
        None => line.split_whitespace(),
    };
    parsed.words = data.map(parse_word).collect();
    Some(parsed)
}

/// Parses a manifest address field.
///
/// The whole field must be hex digits, optionally prefixed by `0x`.
pub fn parse_hex_field(field: &str) -> Option<u64> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Writes words in dump format, one `%08x` line each.
///
/// # Errors
///
/// Propagates any error from `out`.
pub fn write_dump<W: Write>(mut out: W, words: impl IntoIterator<Item = u32>) -> io::Result<()> {
    for word in words {
        writeln!(out, "{word:08x}")?;
    }
    out.flush()
}
