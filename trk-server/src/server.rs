//! # Connection Supervisor
//!
//! Own the listening socket, accept connections, and start one independent
//! [`Session`] task per connection.
//!
//! ## Design Principles
//!
//! 1. **Never Block Accept**: Each session is `tokio::spawn`ed; the accept
//!    loop only hands off the socket.
//! 2. **Errors Stay Local**: A failed accept is logged and the loop goes on;
//!    a failed session is logged and only that session ends.
//! 3. **Quiet Shutdown**: Stopping drops the listener; the accept loop exits
//!    on the shutdown signal instead of surfacing an accept error.
//! 4. **Unbounded Sessions**: No connection ceiling; every accepted socket
//!    gets a task.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::router::Router;
use crate::service::TrackingService;
use crate::session::Session;

/// Pending-connection queue length requested from the OS.
const LISTEN_BACKLOG: i32 = 1024;

/// Startup failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A bound, not yet accepting, server.
pub struct Server {
    listener: TcpListener,
    router: Router,
    metrics: Arc<Metrics>,
    buffer_size: usize,
}

impl Server {
    /// Binds the listening socket described by `config`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &ServerConfig, service: Arc<TrackingService>) -> Result<Self, ServerError> {
        let addr = config.socket_addr();
        let listener = bind_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let listener = TcpListener::from_std(listener)?;

        Ok(Server {
            listener,
            router: Router::new(service),
            metrics: Arc::new(Metrics::new()),
            buffer_size: config.buffer_size,
        })
    }

    /// Returns the bound address (useful when binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns the accept loop and returns a handle to stop it.
    pub fn start(self) -> io::Result<ServerHandle> {
        let local_addr = self.local_addr()?;
        let metrics = Arc::clone(&self.metrics);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(%local_addr, "server listening");
        let task = tokio::spawn(self.accept_loop(shutdown_rx));

        Ok(ServerHandle {
            local_addr,
            metrics,
            shutdown: shutdown_tx,
            task,
        })
    }

    async fn accept_loop(self, mut shutdown: watch::Receiver<bool>) {
        let Server {
            listener,
            router,
            metrics,
            buffer_size,
        } = self;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(value) => value,
                        Err(err) => {
                            if *shutdown.borrow() {
                                break;
                            }
                            warn!(error = %err, "accept failed");
                            continue;
                        }
                    };
                    if let Err(err) = stream.set_nodelay(true) {
                        debug!(%peer, error = %err, "could not disable Nagle");
                    }

                    metrics.session_opened();
                    debug!(%peer, "session opened");
                    let session = Session::new(
                        stream,
                        peer,
                        router.clone(),
                        Arc::clone(&metrics),
                        buffer_size,
                    );
                    let session_shutdown = shutdown.clone();
                    let session_metrics = Arc::clone(&metrics);
                    tokio::spawn(async move {
                        if let Err(err) = session.run(session_shutdown).await {
                            warn!(%peer, error = %err, "session ended with transport error");
                        }
                        session_metrics.session_closed();
                        debug!(%peer, "session closed");
                    });
                }
            }
        }

        drop(listener);
        info!("listener closed");
    }
}

/// Control handle for a running server.
///
/// Dropping the handle without calling [`ServerHandle::stop`] also stops the
/// accept loop and idle sessions, since the shutdown channel closes.
pub struct ServerHandle {
    local_addr: SocketAddr,
    metrics: Arc<Metrics>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Closes the listener and signals every session to wind down.
    ///
    /// Returns once the accept loop has exited, with the metrics as of that
    /// moment. Sessions finish any dispatch in progress on their own tasks.
    pub async fn stop(self) -> MetricsSnapshot {
        // send only fails when no receiver is left, which means everything has stopped
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "accept loop panicked");
        }
        self.metrics.snapshot()
    }
}

fn bind_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}
