//! Response framing over a byte stream.
//!
//! A response is one CRLF line, extended by every `{n}` literal it
//! announces: the `n` raw bytes after the announcing line and the line that
//! follows them belong to the same response.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const BUFFER_SIZE: usize = 8 * 1024;

/// Longest line accepted outside literals.
const LINE_LIMIT: usize = 1024 * 1024;

/// Largest literal accepted; bounds the memory a single message can take.
const LITERAL_LIMIT: usize = 64 * 1024 * 1024;

/// A transport that speaks in whole responses and whole commands.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    outgoing: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected transport.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(BUFFER_SIZE, stream),
            outgoing: BytesMut::with_capacity(BUFFER_SIZE),
        }
    }

    /// Reads one response with its literals inlined.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();
        loop {
            let line_start = response.len();
            self.read_line_into(&mut response).await?;

            let Some(size) = literal_size(&response[line_start..]) else {
                return Ok(response);
            };
            if size > LITERAL_LIMIT {
                return Err(Error::Protocol(format!(
                    "literal too large: {size} bytes (limit {LITERAL_LIMIT})"
                )));
            }
            let literal_start = response.len();
            response.resize(literal_start + size, 0);
            self.reader.read_exact(&mut response[literal_start..]).await?;
        }
    }

    /// Appends bytes up to and including the next LF.
    async fn read_line_into(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        let mut bounded = (&mut self.reader).take(LINE_LIMIT as u64);
        let read = bounded.read_until(b'\n', buf).await?;

        if read > 0 && buf.ends_with(b"\n") {
            Ok(())
        } else if read >= LINE_LIMIT {
            Err(Error::Protocol("line too long".to_string()))
        } else {
            Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-response",
            )))
        }
    }

    /// Reads responses up to and including the completion tagged `tag`.
    pub async fn read_through(&mut self, tag: &str) -> Result<Vec<Vec<u8>>> {
        let mut responses = Vec::new();
        loop {
            let response = self.read_response().await?;
            let done = response
                .strip_prefix(tag.as_bytes())
                .is_some_and(|rest| rest.starts_with(b" "));
            responses.push(response);
            if done {
                return Ok(responses);
            }
        }
    }

    /// Writes and flushes one serialized command.
    pub async fn write_command(&mut self, line: &[u8]) -> Result<()> {
        self.outgoing.clear();
        self.outgoing.extend_from_slice(line);
        let stream = self.reader.get_mut();
        stream.write_all(&self.outgoing).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Closes the write half.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await.map_err(Error::from)
    }

    /// The transport.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// True if the server sent bytes that have not been framed yet.
    #[must_use]
    pub fn has_buffered_data(&self) -> bool {
        !self.reader.buffer().is_empty()
    }

    /// Unwraps the transport, discarding anything buffered.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Size announced by a line ending in `{n}` or `{n+}`.
fn literal_size(line: &[u8]) -> Option<usize> {
    let inner = line.strip_suffix(b"}\r\n")?;
    let inner = inner.strip_suffix(b"+").unwrap_or(inner);
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = std::str::from_utf8(&inner[open + 1..]).ok()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
