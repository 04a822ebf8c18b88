use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;
use tracing::{debug, trace};

use crate::protocol::{LineCodec, ReplyBatch};

/// Turns the read half of a connection into reply batches.
///
/// There is no end-of-reply marker in the protocol, so a batch is whatever
/// arrives before the window closes. Bytes of a line that is still
/// incomplete when the window closes stay buffered for the next call.
pub struct StreamReader<R> {
    framed: FramedRead<R, LineCodec>,
    closed: bool,
}

impl<R: AsyncRead + Unpin> StreamReader<R> {
    pub fn new(reader: R, codec: LineCodec) -> Self {
        Self {
            framed: FramedRead::new(reader, codec),
            closed: false,
        }
    }

    /// Whether the peer has closed its side.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Collects every line that arrives within `window`.
    ///
    /// Always takes the full window. A peer close ends polling but not the
    /// window; only a framing error is returned as `Err`.
    pub async fn collect(&mut self, window: Duration) -> std::io::Result<ReplyBatch> {
        let deadline = Instant::now() + window;
        let mut batch = ReplyBatch::default();

        while !self.closed {
            match timeout_at(deadline, self.framed.next()).await {
                Ok(Some(Ok(line))) => batch.push(line),
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => {
                    debug!("Peer closed the connection");
                    self.closed = true;
                }
                Err(_) => break,
            }
        }

        sleep_until(deadline).await;
        trace!("Collected {} line(s) in {:?}", batch.len(), window);
        Ok(batch)
    }
}
