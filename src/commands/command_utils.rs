use bytes::Bytes;

use crate::{commands::CommandError, key_value_store::sorted_set::parse_score};

/// Case-insensitive comparison of an argument with an option keyword.
pub fn is_keyword(argument: &[u8], keyword: &str) -> bool {
    argument.eq_ignore_ascii_case(keyword.as_bytes())
}

/// Parses a signed 64-bit integer. Only an optional '-' and ASCII digits
/// are accepted.
pub fn parse_integer(argument: &[u8]) -> Result<i64, CommandError> {
    if argument.first() == Some(&b'+') {
        return Err(CommandError::NotAnInteger);
    }

    std::str::from_utf8(argument)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or(CommandError::NotAnInteger)
}

/// Parses a non-negative count, as taken by `LPOP key count`.
pub fn parse_count(argument: &[u8]) -> Result<usize, CommandError> {
    let count = parse_integer(argument)?;
    usize::try_from(count).map_err(|_| CommandError::NotPositive)
}

pub fn parse_float(argument: &[u8]) -> Result<f64, CommandError> {
    parse_score(argument).ok_or(CommandError::NotAFloat)
}

/// Formats a float the way scores are sent back to clients: the shortest
/// digits that round-trip, switching to an exponent with a sign and at
/// least two digits (`1e+300`, `1.5e-05`) outside `[1e-4, 1e17)`, like C's
/// `%.17g`.
pub fn format_float(value: f64) -> Bytes {
    let magnitude = value.abs();
    if value.is_finite() && magnitude != 0.0 && !(1e-4..1e17).contains(&magnitude) {
        let scientific = format!("{:e}", value);
        if let Some((mantissa, exponent)) = scientific.split_once('e') {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            return Bytes::from(format!("{}e{}{:0>2}", mantissa, sign, digits));
        }
    }

    Bytes::from(value.to_string())
}

pub fn format_integer(value: i64) -> Bytes {
    Bytes::from(value.to_string())
}

/// Resolves `start`/`stop` (negative values count from the end) against a
/// sequence of `len` elements. Returns the inclusive index range, or `None`
/// when it selects nothing.
pub fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;

    let start = (if start < 0 { len + start } else { start }).max(0);
    let stop = (if stop < 0 { len + stop } else { stop }).min(len - 1);

    if start >= len || start > stop {
        return None;
    }

    Some((start as usize, stop as usize))
}

/// Resolves a single possibly-negative index.
pub fn normalize_index(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };

    (0..len).contains(&index).then_some(index as usize)
}
