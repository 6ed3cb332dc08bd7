//! Shared helpers for the end-to-end tests: an ephemeral-port server and
//! store doubles that count, fail, or stall calls.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use trk_client::Client;
use trk_common::Envelope;
use trk_server::{Server, ServerConfig, ServerHandle, TrackingService};
use trk_store::{DocumentStore, Entry, MemoryStore, StoreError, StoreResult};

/// Upper bound for any single network step in a test.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts a server on `127.0.0.1:0` over `store`.
pub async fn spawn_server(store: Arc<dyn DocumentStore>) -> ServerHandle {
    spawn_server_with(store, ServerConfig::default().buffer_size).await
}

/// Starts a server with an explicit socket read size.
pub async fn spawn_server_with(store: Arc<dyn DocumentStore>, buffer_size: usize) -> ServerHandle {
    let config = ServerConfig {
        bind_addr: "127.0.0.1".parse().unwrap(),
        port: 0,
        buffer_size,
        seed_defaults: false,
    };
    let service = Arc::new(TrackingService::new(store));
    Server::bind(&config, service).unwrap().start().unwrap()
}

pub async fn connect(handle: &ServerHandle) -> Client {
    within(Client::connect(handle.local_addr())).await.unwrap()
}

pub async fn call(client: &mut Client, command: &str, data: Value) -> Envelope {
    within(client.request(command, data)).await.unwrap()
}

/// Awaits `future`, failing the test if it takes longer than [`STEP_TIMEOUT`].
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(STEP_TIMEOUT, future)
        .await
        .expect("step timed out")
}

/// Polls `condition` until it holds or [`STEP_TIMEOUT`] passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

/// Memory store that counts every call.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Entry>> {
        self.tick();
        self.inner.list(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.tick();
        self.inner.get(collection, id).await
    }

    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()> {
        self.tick();
        self.inner.put(collection, id, record).await
    }

    async fn append(&self, collection: &str, record: Value) -> StoreResult<String> {
        self.tick();
        self.inner.append(collection, record).await
    }
}

/// Store whose every call fails.
pub struct FailingStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn list(&self, _collection: &str) -> StoreResult<Vec<Entry>> {
        unavailable()
    }

    async fn get(&self, _collection: &str, _id: &str) -> StoreResult<Option<Value>> {
        unavailable()
    }

    async fn put(&self, _collection: &str, _id: &str, _record: Value) -> StoreResult<()> {
        unavailable()
    }

    async fn append(&self, _collection: &str, _record: Value) -> StoreResult<String> {
        unavailable()
    }
}

/// Memory store whose `list` calls stall until [`GatedStore::release`].
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryStore,
    gate: Notify,
    waiting: AtomicUsize,
}

impl GatedStore {
    /// Number of calls currently stalled.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        self.gate.notify_waiters();
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Entry>> {
        let notified = self.gate.notified();
        self.waiting.fetch_add(1, Ordering::SeqCst);
        notified.await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        self.inner.list(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()> {
        self.inner.put(collection, id, record).await
    }

    async fn append(&self, collection: &str, record: Value) -> StoreResult<String> {
        self.inner.append(collection, record).await
    }
}
