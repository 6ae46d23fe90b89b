//! Reply frames of the Redis Serialization Protocol (RESP2).
//!
//! Every reply the server writes is a [`RespValue`]. The same type is used by
//! clients (and the test-suite) to decode what the server sent back, so
//! [`RespValue::parse`] understands every kind [`RespValue::encode`] produces.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Errors raised while decoding a reply frame.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("unknown RESP type '{0}'")]
    UnknownRespType(char),
    #[error("failed to parse integer")]
    FailedToParseInteger,
    #[error("invalid bulk string")]
    InvalidBulkString,
    #[error("invalid array")]
    InvalidArray,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
}

/// A single reply frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Bulk string when present, nil otherwise.
    pub fn optional_bulk_string(data: Option<Bytes>) -> Self {
        match data {
            Some(data) => RespValue::BulkString(data),
            None => RespValue::NullBulkString,
        }
    }

    pub fn bulk_string_array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        RespValue::Array(items.into_iter().map(RespValue::BulkString).collect())
    }

    /// Serializes the frame to its exact wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                out.push(b'+');
                push_line(out, s);
            }
            RespValue::Error(s) => {
                out.push(b'-');
                push_line(out, s);
            }
            RespValue::Integer(i) => {
                out.push(b':');
                out.extend_from_slice(i.to_string().as_bytes());
                out.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                out.push(b'$');
                out.extend_from_slice(data.len().to_string().as_bytes());
                out.extend_from_slice(CRLF);
                out.extend_from_slice(data);
                out.extend_from_slice(CRLF);
            }
            RespValue::NullBulkString => out.extend_from_slice(b"$-1\r\n"),
            RespValue::Array(items) => {
                out.push(b'*');
                out.extend_from_slice(items.len().to_string().as_bytes());
                out.extend_from_slice(CRLF);
                for item in items {
                    item.encode_into(out);
                }
            }
            RespValue::NullArray => out.extend_from_slice(b"*-1\r\n"),
        }
    }

    /// Decodes the next complete frame from `buffer`.
    ///
    /// Returns `Ok(None)` and leaves the buffer untouched when the frame is
    /// not fully received yet, so the caller can read more bytes and retry.
    pub fn parse(buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        match Self::parse_frame(&buffer[..], 0)? {
            Some((value, consumed)) => {
                buffer.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn parse_frame(data: &[u8], position: usize) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, next)) = read_line(data, position) else {
            return Ok(None);
        };

        let Some((&marker, content)) = line.split_first() else {
            return Err(RespError::UnknownRespType(' '));
        };

        match marker {
            b'+' => Ok(Some((RespValue::SimpleString(line_to_string(content)?), next))),
            b'-' => Ok(Some((RespValue::Error(line_to_string(content)?), next))),
            b':' => Ok(Some((RespValue::Integer(parse_number(content)?), next))),
            b'$' => {
                let length = parse_number(content).map_err(|_| RespError::InvalidBulkString)?;

                if length == -1 {
                    return Ok(Some((RespValue::NullBulkString, next)));
                }

                let length = usize::try_from(length).map_err(|_| RespError::InvalidBulkString)?;
                let end = next + length;

                if data.len() < end + CRLF.len() {
                    return Ok(None);
                }

                if &data[end..end + CRLF.len()] != CRLF {
                    return Err(RespError::InvalidBulkString);
                }

                let bulk = Bytes::copy_from_slice(&data[next..end]);
                Ok(Some((RespValue::BulkString(bulk), end + CRLF.len())))
            }
            b'*' => {
                let length = parse_number(content).map_err(|_| RespError::InvalidArray)?;

                if length == -1 {
                    return Ok(Some((RespValue::NullArray, next)));
                }

                let length = usize::try_from(length).map_err(|_| RespError::InvalidArray)?;
                let mut elements = Vec::with_capacity(length.min(1024));
                let mut cursor = next;

                while elements.len() < length {
                    let Some((element, after)) = Self::parse_frame(data, cursor)? else {
                        return Ok(None);
                    };
                    elements.push(element);
                    cursor = after;
                }

                Ok(Some((RespValue::Array(elements), cursor)))
            }
            other => Err(RespError::UnknownRespType(other as char)),
        }
    }
}

/// Status and error lines may not carry line breaks.
fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend(
        line.bytes()
            .map(|b| if b == b'\r' || b == b'\n' { b' ' } else { b }),
    );
    out.extend_from_slice(CRLF);
}

/// Returns the line starting at `position` (without CRLF) and the offset
/// right after its terminator.
fn read_line(data: &[u8], position: usize) -> Option<(&[u8], usize)> {
    let rest = data.get(position..)?;
    let end = rest.windows(2).position(|window| window == CRLF)?;
    Some((&rest[..end], position + end + CRLF.len()))
}

fn line_to_string(content: &[u8]) -> Result<String, RespError> {
    std::str::from_utf8(content)
        .map(str::to_string)
        .map_err(|_| RespError::InvalidUtf8)
}

fn parse_number(content: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(content)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(RespError::FailedToParseInteger)
}
