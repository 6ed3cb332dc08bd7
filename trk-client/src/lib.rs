//! # Trip Tracking Client
//!
//! Minimal async client for the command protocol: one request object out,
//! one newline-terminated envelope back, in order, over one connection.

use std::net::SocketAddr;

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use trk_common::{Envelope, WireRequest};

/// Client-side failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("server closed the connection")]
    Closed,
}

/// A connected client.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl Client {
    /// Connects to a server.
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();
        Ok(Client {
            reader: BufReader::new(read),
            writer: write,
            line: String::new(),
        })
    }

    /// Sends `command` with `data` and waits for its envelope.
    pub async fn request(&mut self, command: &str, data: Value) -> Result<Envelope, ClientError> {
        let body = serde_json::to_vec(&WireRequest::new(command, data))?;
        self.send_raw(&body).await?;
        self.read_envelope().await
    }

    /// Writes bytes as-is, for callers that frame requests themselves.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Reads the next envelope.
    pub async fn read_envelope(&mut self) -> Result<Envelope, ClientError> {
        self.line.clear();
        if self.reader.read_line(&mut self.line).await? == 0 {
            return Err(ClientError::Closed);
        }
        Ok(serde_json::from_str(self.line.trim_end())?)
    }
}
