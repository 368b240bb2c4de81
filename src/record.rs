//! Parsing of pmacct flow-accounting lines.
//!
//! pmacct prints one flow per line as whitespace-separated columns:
//!
//! ```text
//! ID CLASS SRC_MAC DST_MAC VLAN SRC_AS DST_AS SRC_IP DST_IP SRC_PORT DST_PORT TCP_FLAGS PROTOCOL TOS PACKETS FLOWS BYTES
//! 0 unknown 00:00:00:00:00:00 00:00:00:00:00:00 0 0 0 202.4.228.250 180.76.5.15 0 0 0 ip 0 24 0 34954
//! ```
//!
//! Only the source IP, destination IP and byte count are extracted. The same
//! stream carries pmacct's own log chatter, so anything that does not fit the
//! shape is a [`ParseError`] the caller is expected to skip, not report.

use thiserror::Error;

/// Which named field lives in which column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    SourceIp,
    DestIp,
    Bytes,
}

/// Column layout of a flow line. Unlisted columns are ignored.
const LAYOUT: &[(usize, Field)] = &[
    (7, Field::SourceIp),
    (8, Field::DestIp),
    (16, Field::Bytes),
];

/// Number of columns a line needs for every field in [`LAYOUT`] to exist.
pub const MIN_TOKENS: usize = 17;

/// One flow extracted from a pmacct line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRecord {
    pub source_ip: String,
    pub dest_ip: String,
    pub bytes: u64,
}

/// Why a line is not a flow record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected at least {min} columns, found {0}", min = MIN_TOKENS)]
    TooFewTokens(usize),

    #[error("byte count {0:?} is not an unsigned integer")]
    InvalidByteCount(String),
}

/// Cheap pre-filter: pmacct records start with a numeric ID.
pub fn starts_with_digit(line: &str) -> bool {
    line.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

/// Column separators: ASCII space, tab, newline, vertical tab, form feed and
/// carriage return. Other Unicode whitespace stays inside its token.
fn is_separator(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

/// Split a line into its non-empty columns.
fn columns(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_separator).filter(|token| !token.is_empty())
}

/// Parse one line, newline or not.
pub fn parse(line: &str) -> Result<FlowRecord, ParseError> {
    let tokens: Vec<&str> = columns(line).take(MIN_TOKENS).collect();
    if tokens.len() < MIN_TOKENS {
        return Err(ParseError::TooFewTokens(tokens.len()));
    }

    let mut source_ip = None;
    let mut dest_ip = None;
    let mut bytes = None;

    for &(index, field) in LAYOUT {
        let token = tokens[index];
        match field {
            Field::SourceIp => source_ip = Some(token.to_string()),
            Field::DestIp => dest_ip = Some(token.to_string()),
            Field::Bytes => {
                let count = token
                    .parse::<u64>()
                    .map_err(|_| ParseError::InvalidByteCount(token.to_string()))?;
                bytes = Some(count);
            }
        }
    }

    match (source_ip, dest_ip, bytes) {
        (Some(source_ip), Some(dest_ip), Some(bytes)) => Ok(FlowRecord {
            source_ip,
            dest_ip,
            bytes,
        }),
        // LAYOUT names every field, so a miss means too few columns.
        _ => Err(ParseError::TooFewTokens(tokens.len())),
    }
}
