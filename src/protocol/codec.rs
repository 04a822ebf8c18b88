use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

pub const MAX_LINE_LENGTH: usize = 8191;

/// What the tester writes to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// A command; the newline delimiter is appended on encode.
    Line(String),
    /// Bytes written exactly as given, for framing edge cases.
    Raw(Bytes),
}

/// Newline framing for both directions of a test connection.
pub struct LineCodec {
    max_length: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self {
            max_length: MAX_LINE_LENGTH,
        }
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }

    fn take_line(&self, buf: &mut BytesMut, len: usize) -> String {
        let raw = buf.split_to(len);
        let mut line = &raw[..];
        if line.ends_with(b"\n") {
            line = &line[..line.len() - 1];
        }
        if line.ends_with(b"\r") {
            line = &line[..line.len() - 1];
        }
        let line = String::from_utf8_lossy(line).into_owned();
        trace!("<-- {}", line);
        line
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(idx) = buf.iter().position(|&b| b == b'\n') {
            if idx > self.max_length {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "Line too long"));
            }
            Ok(Some(self.take_line(buf, idx + 1)))
        } else if buf.len() > self.max_length {
            Err(io::Error::new(io::ErrorKind::InvalidData, "Line too long"))
        } else {
            Ok(None)
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(line) => Ok(Some(line)),
            None if buf.is_empty() => Ok(None),
            // An unterminated last line is still a line
            None => {
                let len = buf.len();
                Ok(Some(self.take_line(buf, len)))
            }
        }
    }
}

impl Encoder<Outgoing> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Outgoing, buf: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Outgoing::Line(line) => {
                trace!("--> {}", line);
                buf.reserve(line.len() + 1);
                buf.put(line.as_bytes());
                buf.put_u8(b'\n');
            }
            Outgoing::Raw(bytes) => {
                trace!("--> {}", String::from_utf8_lossy(&bytes));
                buf.put(bytes);
            }
        }
        Ok(())
    }
}
