//! Length-capped line reading.
//!
//! pmacct output has no hard line-length limit, but a flow line is short.
//! Anything longer than the cap is consumed up to its newline and reported
//! as oversized instead of being buffered whole.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Default cap, matching the stdio `BUFSIZ` the format was designed around.
pub const DEFAULT_MAX_LINE_BYTES: usize = 8192;

/// One line read from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A line within the cap, newline included when present. Invalid UTF-8
    /// is replaced with U+FFFD.
    Complete(String),
    /// A line over the cap; only its length is kept.
    Oversized { len: usize },
}

/// Reads [`Line`]s from an async buffered reader.
///
/// A line is oversized when it is longer than `max_bytes` including its
/// terminating newline.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    max_bytes: usize,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_bytes: usize) -> Self {
        Self {
            reader,
            max_bytes: max_bytes.max(1),
            buf: Vec::new(),
        }
    }

    /// Read the next line, or `None` at end of input.
    pub async fn next_line(&mut self) -> io::Result<Option<Line>> {
        self.buf.clear();
        let mut len = 0usize;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if len == 0 {
                    return Ok(None);
                }
                break;
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let take = newline.map_or(available.len(), |i| i + 1);
            let room = (self.max_bytes + 1).saturating_sub(self.buf.len());
            self.buf.extend_from_slice(&available[..take.min(room)]);
            self.reader.consume(take);
            len += take;

            if newline.is_some() {
                break;
            }
        }

        if len > self.max_bytes {
            return Ok(Some(Line::Oversized { len }));
        }
        Ok(Some(Line::Complete(
            String::from_utf8_lossy(&self.buf).into_owned(),
        )))
    }
}
