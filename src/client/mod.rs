use std::time::Duration;

use bytes::Bytes;
use futures::SinkExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info};

use crate::assertions::{self, Verdict};
use crate::error::{ConformanceError, Result};
use crate::protocol::{LineCodec, Outgoing, ReplyBatch};

pub mod actions;
pub mod reader;

pub use self::reader::StreamReader;

/// Timing knobs shared by every client in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub reply_window: Duration,
    pub silence_window: Duration,
    pub connect_timeout: Duration,
    pub max_line_length: usize,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reply_window: Duration::from_secs(1),
            silence_window: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            max_line_length: crate::protocol::codec::MAX_LINE_LENGTH,
        }
    }
}

/// What the server should know this client as. Only used to build the
/// expected replies; nothing here tracks channels or other clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub nick: Option<String>,
}

struct Connection {
    reader: StreamReader<OwnedReadHalf>,
    writer: FramedWrite<OwnedWriteHalf, LineCodec>,
}

/// One simulated IRC participant with its own connection.
pub struct SimulatedClient {
    label: String,
    addr: String,
    timing: Timing,
    connection: Option<Connection>,
    identity: Identity,
}

impl SimulatedClient {
    pub fn new(label: impl Into<String>, addr: impl Into<String>, timing: Timing) -> Self {
        Self {
            label: label.into(),
            addr: addr.into(),
            timing,
            connection: None,
            identity: Identity::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn nick(&self) -> Option<&str> {
        self.identity.nick.as_deref()
    }

    /// The name numeric replies are addressed to: the nickname, or `*`.
    pub fn reply_target(&self) -> &str {
        self.nick().unwrap_or("*")
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub async fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            self.disconnect().await;
        }

        let connecting = TcpStream::connect(&self.addr);
        let stream = match timeout(self.timing.connect_timeout, connecting).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConformanceError::Connect {
                    addr: self.addr.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ConformanceError::Connect {
                    addr: self.addr.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
                })
            }
        };
        // Fragments sent back to back must reach the server as separate segments
        stream.set_nodelay(true)?;

        let (read_half, write_half) = stream.into_split();
        let max = self.timing.max_line_length;
        self.connection = Some(Connection {
            reader: StreamReader::new(read_half, LineCodec::with_max_length(max)),
            writer: FramedWrite::new(write_half, LineCodec::with_max_length(max)),
        });

        info!("Client {} connected to {}", self.label, self.addr);
        Ok(())
    }

    /// Closes the connection if there is one. Never fails.
    pub async fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.writer.get_mut().shutdown().await {
                debug!("Client {} shutdown error: {}", self.label, e);
            }
            info!("Client {} disconnected", self.label);
        }
        self.identity = Identity::default();
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        let label = &self.label;
        self.connection
            .as_mut()
            .ok_or_else(|| ConformanceError::NotConnected(label.clone()))
    }

    /// Sends one command; the line delimiter is added here.
    pub async fn send(&mut self, command: &str) -> Result<()> {
        debug!("[{}] --> {}", self.label, command);
        self.connection()?
            .writer
            .send(Outgoing::Line(command.to_string()))
            .await?;
        Ok(())
    }

    /// Sends bytes exactly as given, without a delimiter.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        debug!("[{}] --> {}", self.label, String::from_utf8_lossy(data));
        self.connection()?
            .writer
            .send(Outgoing::Raw(Bytes::copy_from_slice(data)))
            .await?;
        Ok(())
    }

    /// Everything the server sends within `window`.
    pub async fn collect(&mut self, window: Duration) -> Result<ReplyBatch> {
        let batch = self
            .connection()?
            .reader
            .collect(window)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => ConformanceError::Protocol(e.to_string()),
                _ => ConformanceError::Network(e),
            })?;
        for line in batch.iter() {
            debug!("[{}] <-- {}", self.label, line);
        }
        Ok(batch)
    }

    pub async fn test_silence(&mut self, window: Duration) -> Result<Verdict> {
        let batch = self.collect(window).await?;
        Ok(assertions::silence(&batch))
    }

    /// Drains one reply window without looking at it.
    pub async fn ignore_reply(&mut self, window: Duration) -> Result<()> {
        let batch = self.collect(window).await?;
        debug!("[{}] ignored {} line(s)", self.label, batch.len());
        Ok(())
    }
}
