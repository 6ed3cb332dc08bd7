//! # Session
//!
//! One task per accepted connection: read bytes, frame, dispatch, write, repeat.
//!
//! ## Design Principles
//!
//! 1. **Exclusive State**: The read buffer and accumulator belong to the
//!    session task alone; nothing per-connection is shared.
//! 2. **Strict Order**: One frame is dispatched and its response fully written
//!    before the next read, so responses leave in request order.
//! 3. **Fail-Open**: Framing and parse problems drop the frame and keep the
//!    session; only transport errors end it.
//! 4. **Cooperative Shutdown**: A pending read is abandoned when the server
//!    stops. A dispatch already running completes and writes its response.
//!
//! ## Notes
//! - There is no idle timeout. A peer that neither sends nor closes holds its
//!   session until the server stops.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, error, trace};

use trk_common::{ErrorCategory, ErrorCode};

use crate::encoder;
use crate::frame::{FrameAccumulator, FrameError};
use crate::metrics::Metrics;
use crate::router::Router;

/// State owned by one connection's task.
pub struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    read_buf: Vec<u8>,
    frames: FrameAccumulator,
    router: Router,
    metrics: Arc<Metrics>,
}

impl Session {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        router: Router,
        metrics: Arc<Metrics>,
        buffer_size: usize,
    ) -> Self {
        Session {
            stream,
            peer,
            read_buf: vec![0; buffer_size.max(1)],
            frames: FrameAccumulator::new(),
            router,
            metrics,
        }
    }

    /// Drives the read/dispatch/write loop until the peer closes, the server
    /// stops, or the transport fails.
    ///
    /// A clean close or shutdown returns `Ok(())`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        loop {
            if *shutdown.borrow() {
                debug!(peer = %self.peer, "session stopping for shutdown");
                return Ok(());
            }

            let read = tokio::select! {
                read = self.stream.read(&mut self.read_buf) => read?,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!(peer = %self.peer, "server handle dropped; closing session");
                        return Ok(());
                    }
                    continue;
                }
            };
            if read == 0 {
                debug!(peer = %self.peer, "peer closed connection");
                return Ok(());
            }

            let chunk = self.read_buf.get(..read).unwrap_or_default();
            match self.frames.feed(chunk) {
                Ok(None) => {
                    trace!(peer = %self.peer, pending = self.frames.pending(), "awaiting closing brace");
                }
                Ok(Some(text)) => self.respond(&text).await?,
                Err(FrameError::Malformed { discarded }) => {
                    self.metrics.record_discard();
                    debug!(peer = %self.peer, discarded = %discarded, "discarding malformed frame");
                }
            }
        }
    }

    async fn respond(&mut self, text: &str) -> io::Result<()> {
        let started = Instant::now();
        let Some(envelope) = self.router.handle_frame(text).await else {
            self.metrics.record_discard();
            return Ok(());
        };
        let elapsed = started.elapsed();
        self.metrics.record_request(elapsed, envelope.success);
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        // client and store failures were already logged where they happened
        if envelope.code().map(ErrorCode::category) == Some(ErrorCategory::Server) {
            error!(peer = %self.peer, message = %envelope.message, elapsed_us, "request failed internally");
        } else {
            debug!(peer = %self.peer, success = envelope.success, elapsed_us, "request handled");
        }

        let bytes = encoder::encode(&envelope).map_err(io::Error::other)?;
        self.stream.write_all(&bytes).await
    }
}
