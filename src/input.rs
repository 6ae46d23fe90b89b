//! Request framing for client connections.
//!
//! Clients send either a multi-bulk array (`*<n>\r\n` followed by `n` bulk
//! strings) or a single inline line of whitespace separated words. Both are
//! turned into the ordered list of byte-string arguments that make up one
//! command. Bytes that do not yet form a complete request stay in the
//! connection's [`RequestDecoder`] until the rest arrives.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

use crate::resp::RespValue;

const MAX_INLINE_LENGTH: usize = 64 * 1024;
const MAX_MULTIBULK_LENGTH: i64 = 1024 * 1024;
const MAX_BULK_LENGTH: i64 = 512 * 1024 * 1024;

/// Malformed request frame. Always fatal for the connection.
#[derive(Error, Debug, PartialEq)]
pub enum ProtocolError {
    #[error("invalid multibulk length")]
    InvalidMultibulkLength,
    #[error("invalid bulk length")]
    InvalidBulkLength,
    #[error("expected '$', got '{0}'")]
    ExpectedBulkString(char),
    #[error("unbalanced quotes in request")]
    UnbalancedQuotes,
    #[error("too big inline request")]
    InlineRequestTooBig,
    #[error("too big mbulk count string")]
    CountStringTooBig,
}

impl ProtocolError {
    pub fn to_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

/// Per-connection request decoder holding any partially received frame.
#[derive(Debug)]
pub struct RequestDecoder {
    buffer: BytesMut,
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDecoder {
    pub fn new() -> Self {
        RequestDecoder {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// The buffer network reads should append to.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Decodes the next complete request.
    ///
    /// Empty requests (`*0`, `*-1`, blank inline lines) are consumed and
    /// skipped. Returns `Ok(None)` when more bytes are needed.
    pub fn decode(&mut self) -> Result<Option<Vec<Bytes>>, ProtocolError> {
        loop {
            if self.buffer.is_empty() {
                return Ok(None);
            }

            let parsed = if self.buffer[0] == b'*' {
                parse_multibulk(&self.buffer)?
            } else {
                parse_inline(&self.buffer)?
            };

            let Some((arguments, consumed)) = parsed else {
                return Ok(None);
            };

            self.buffer.advance(consumed);

            if !arguments.is_empty() {
                return Ok(Some(arguments));
            }
        }
    }
}

fn parse_multibulk(data: &[u8]) -> Result<Option<(Vec<Bytes>, usize)>, ProtocolError> {
    let Some((header, mut cursor)) = read_line(data, 0) else {
        if data.len() > MAX_INLINE_LENGTH {
            return Err(ProtocolError::CountStringTooBig);
        }
        return Ok(None);
    };

    let count = parse_length(&header[1..]).ok_or(ProtocolError::InvalidMultibulkLength)?;

    if count > MAX_MULTIBULK_LENGTH {
        return Err(ProtocolError::InvalidMultibulkLength);
    }

    if count <= 0 {
        return Ok(Some((Vec::new(), cursor)));
    }

    let mut arguments = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let Some((bulk_header, after)) = read_line(data, cursor) else {
            if data.len() - cursor > MAX_INLINE_LENGTH {
                return Err(ProtocolError::InvalidBulkLength);
            }
            return Ok(None);
        };

        match bulk_header.first() {
            Some(b'$') => {}
            Some(&other) => return Err(ProtocolError::ExpectedBulkString(other as char)),
            None => return Err(ProtocolError::ExpectedBulkString(' ')),
        }

        let length = parse_length(&bulk_header[1..])
            .filter(|length| (0..=MAX_BULK_LENGTH).contains(length))
            .ok_or(ProtocolError::InvalidBulkLength)? as usize;

        let end = after + length;

        // The payload is followed by CRLF, which is skipped unchecked.
        if data.len() < end + 2 {
            return Ok(None);
        }

        arguments.push(Bytes::copy_from_slice(&data[after..end]));
        cursor = end + 2;
    }

    Ok(Some((arguments, cursor)))
}

fn parse_inline(data: &[u8]) -> Result<Option<(Vec<Bytes>, usize)>, ProtocolError> {
    let Some(newline) = data.iter().position(|&b| b == b'\n') else {
        if data.len() > MAX_INLINE_LENGTH {
            return Err(ProtocolError::InlineRequestTooBig);
        }
        return Ok(None);
    };

    let mut line = &data[..newline];
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }

    let arguments = split_arguments(line)?;
    Ok(Some((arguments, newline + 1)))
}

/// Splits an inline request into words, honouring double quotes (with
/// `\n`, `\r`, `\t`, `\b`, `\a`, `\xHH` escapes) and single quotes.
fn split_arguments(line: &[u8]) -> Result<Vec<Bytes>, ProtocolError> {
    let mut arguments = Vec::new();
    let mut i = 0;

    loop {
        while i < line.len() && line[i].is_ascii_whitespace() {
            i += 1;
        }

        if i == line.len() {
            return Ok(arguments);
        }

        let mut current = Vec::new();
        let mut quote: Option<u8> = None;

        loop {
            match quote {
                Some(q) => {
                    let Some(&byte) = line.get(i) else {
                        return Err(ProtocolError::UnbalancedQuotes);
                    };

                    if q == b'"'
                        && byte == b'\\'
                        && line.get(i + 1) == Some(&b'x')
                        && i + 3 < line.len()
                        && line[i + 2].is_ascii_hexdigit()
                        && line[i + 3].is_ascii_hexdigit()
                    {
                        current.push(hex_value(line[i + 2]) * 16 + hex_value(line[i + 3]));
                        i += 4;
                    } else if q == b'"' && byte == b'\\' && i + 1 < line.len() {
                        current.push(match line[i + 1] {
                            b'n' => b'\n',
                            b'r' => b'\r',
                            b't' => b'\t',
                            b'b' => 0x08,
                            b'a' => 0x07,
                            other => other,
                        });
                        i += 2;
                    } else if q == b'\'' && byte == b'\\' && line.get(i + 1) == Some(&b'\'') {
                        current.push(b'\'');
                        i += 2;
                    } else if byte == q {
                        i += 1;
                        // A closing quote must end the word.
                        if i < line.len() && !line[i].is_ascii_whitespace() {
                            return Err(ProtocolError::UnbalancedQuotes);
                        }
                        break;
                    } else {
                        current.push(byte);
                        i += 1;
                    }
                }
                None => match line.get(i) {
                    None => break,
                    Some(byte) if byte.is_ascii_whitespace() => break,
                    Some(&byte) if byte == b'"' || byte == b'\'' => {
                        quote = Some(byte);
                        i += 1;
                    }
                    Some(&byte) => {
                        current.push(byte);
                        i += 1;
                    }
                },
            }
        }

        arguments.push(Bytes::from(current));
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

fn read_line(data: &[u8], position: usize) -> Option<(&[u8], usize)> {
    let rest = data.get(position..)?;
    let end = rest.windows(2).position(|window| window == b"\r\n")?;
    Some((&rest[..end], position + end + 2))
}

/// Parses a frame length. Only an optional '-' and ASCII digits are allowed.
fn parse_length(digits: &[u8]) -> Option<i64> {
    if digits.first() == Some(&b'+') {
        return None;
    }

    std::str::from_utf8(digits).ok()?.parse::<i64>().ok()
}
