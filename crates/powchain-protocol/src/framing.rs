//! Newline framing over async byte streams.
//!
//! A frame is one UTF-8 line. The terminator (`\n`, optionally preceded by
//! `\r`) is stripped. A final line without a terminator is still returned
//! at EOF.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, Result};
use crate::messages::Response;

/// Reads bounded lines from a buffered stream.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    max_line_bytes: usize,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wrap a reader, rejecting lines longer than `max_line_bytes`.
    pub fn new(inner: R, max_line_bytes: usize) -> Self {
        Self {
            inner,
            max_line_bytes,
            buf: Vec::new(),
        }
    }

    /// Wrap a reader with no line limit. For reading replies from a node,
    /// whose `CHAIN` line grows with the chain.
    pub fn unbounded(inner: R) -> Self {
        Self::new(inner, usize::MAX)
    }

    /// Read the next line. Returns `None` at EOF.
    ///
    /// After [`ProtocolError::LineTooLong`] the stream sits in the middle of
    /// a line and the reader should be dropped.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let limit = (self.max_line_bytes as u64).saturating_add(1);
        let n = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        } else if self.buf.len() > self.max_line_bytes {
            return Err(ProtocolError::LineTooLong {
                limit: self.max_line_bytes,
            });
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        String::from_utf8(std::mem::take(&mut self.buf))
            .map(Some)
            .map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Give back the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Write one response line and flush.
pub async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(response.to_line().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn lines(input: &[u8], max: usize) -> Vec<Result<Option<String>>> {
        let mut reader = LineReader::new(input, max);
        let mut out = Vec::new();
        loop {
            let next = reader.next_line().await;
            let stop = !matches!(next, Ok(Some(_)));
            out.push(next);
            if stop {
                break;
            }
        }
        out
    }

    #[tokio::test]
    async fn test_splits_on_newlines() {
        let out = lines(b"MINE\nCHAIN\n", 64).await;
        assert_eq!(out[0].as_ref().unwrap().as_deref(), Some("MINE"));
        assert_eq!(out[1].as_ref().unwrap().as_deref(), Some("CHAIN"));
        assert!(matches!(out[2], Ok(None)));
    }

    #[tokio::test]
    async fn test_strips_carriage_return() {
        let out = lines(b"LENGTH\r\n", 64).await;
        assert_eq!(out[0].as_ref().unwrap().as_deref(), Some("LENGTH"));
    }

    #[tokio::test]
    async fn test_unterminated_last_line() {
        let out = lines(b"MINE\nVALIDATE", 64).await;
        assert_eq!(out[1].as_ref().unwrap().as_deref(), Some("VALIDATE"));
        assert!(matches!(out[2], Ok(None)));
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let out = lines(b"ADD 12\n", 6).await;
        assert_eq!(out[0].as_ref().unwrap().as_deref(), Some("ADD 12"));
    }

    #[tokio::test]
    async fn test_line_over_limit_is_rejected() {
        let out = lines(b"ADD 123\nMINE\n", 6).await;
        assert!(matches!(out[0], Err(ProtocolError::LineTooLong { limit: 6 })));
    }

    #[tokio::test]
    async fn test_unbounded_reader_takes_long_lines() {
        let long = format!("{}\n", "x".repeat(crate::limits::MAX_LINE_BYTES + 10));
        let mut reader = LineReader::unbounded(long.as_bytes());
        let line = reader.next_line().await.unwrap().unwrap();
        assert_eq!(line.len(), crate::limits::MAX_LINE_BYTES + 10);
        assert!(reader.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_recoverable() {
        let mut reader = LineReader::new(&b"\xff\xfe\nMINE\n"[..], 64);
        let err = reader.next_line().await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUtf8));
        assert!(err.is_recoverable());
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("MINE"));
    }

    #[tokio::test]
    async fn test_write_response_appends_newline() {
        let mut out: Vec<u8> = Vec::new();
        write_response(&mut out, &Response::Length(2)).await.unwrap();
        assert_eq!(out.last(), Some(&b'\n'));
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, Response::Length(2).to_json());
    }
}
