//! Client queue and per-client stream state
//!
//! Connected stream clients wait in a bounded FIFO and are serviced
//! round-robin: pop from the front, serve one frame, push to the back.
//! Capacity is enforced with semaphore permits so a full queue rejects a
//! new stream before any response bytes are written.

use std::collections::VecDeque;
use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::protocol::multipart;

/// Transport a stream client is served over
pub trait ClientTransport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ClientTransport for T {}

/// Connection state of a queued client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Waiting in the queue for its next service turn
    Queued,
    /// Found disconnected; terminal, the client is not re-enqueued
    Disconnected,
}

/// One connected stream client
///
/// Holds the transport, the connection state and the queue slot permit.
/// Dropping the client releases its slot.
pub struct StreamClient {
    transport: Box<dyn ClientTransport>,
    peer_addr: SocketAddr,
    state: ClientState,
    frames_sent: u64,
    _permit: OwnedSemaphorePermit,
}

impl StreamClient {
    /// Wrap an admitted transport with its queue slot permit
    pub fn new<T>(transport: T, peer_addr: SocketAddr, permit: OwnedSemaphorePermit) -> Self
    where
        T: ClientTransport + 'static,
    {
        Self {
            transport: Box::new(transport),
            peer_addr,
            state: ClientState::Queued,
            frames_sent: 0,
            _permit: permit,
        }
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Connection state
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Frames served to this client so far
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Probe whether the peer is still connected
    ///
    /// A single non-blocking read: `Pending` means the socket is open and
    /// quiet, a zero-length read means EOF, an error means the connection
    /// is dead. Bytes the client happens to send are read and discarded;
    /// nothing past the initial request is ever interpreted.
    pub async fn is_connected(&mut self) -> bool {
        if self.state == ClientState::Disconnected {
            return false;
        }

        let mut probe = [0u8; 512];
        let mut buf = ReadBuf::new(&mut probe);
        let transport = &mut self.transport;
        let connected = poll_fn(|cx| match Pin::new(&mut *transport).poll_read(cx, &mut buf) {
            Poll::Pending => Poll::Ready(true),
            Poll::Ready(Ok(())) => Poll::Ready(!buf.filled().is_empty()),
            Poll::Ready(Err(_)) => Poll::Ready(false),
        })
        .await;

        if !connected {
            self.state = ClientState::Disconnected;
        }
        connected
    }

    /// Write one multipart frame part to the client
    ///
    /// Any write error marks the client disconnected.
    pub async fn send_frame(&mut self, jpeg: &[u8]) -> io::Result<()> {
        let result = self.write_part(jpeg).await;
        match result {
            Ok(()) => {
                self.frames_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.state = ClientState::Disconnected;
                Err(e)
            }
        }
    }

    async fn write_part(&mut self, jpeg: &[u8]) -> io::Result<()> {
        let header = multipart::frame_part_header(jpeg.len());
        self.transport.write_all(&header).await?;
        self.transport.write_all(jpeg).await?;
        self.transport.write_all(multipart::BOUNDARY_DELIMITER).await?;
        self.transport.flush().await
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("peer_addr", &self.peer_addr)
            .field("state", &self.state)
            .field("frames_sent", &self.frames_sent)
            .finish()
    }
}

/// Bounded FIFO of connected stream clients
///
/// Strict arrival order on insert; the distributor pops from the front and
/// re-enqueues still-connected clients at the back. Size can structurally
/// never exceed the capacity because every queued client carries a permit.
pub struct ClientQueue {
    inner: Mutex<VecDeque<StreamClient>>,
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl ClientQueue {
    /// Create a queue with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Maximum number of queued clients
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Try to reserve a queue slot for a new client
    ///
    /// Returns `None` when the queue is at capacity; the caller drops the
    /// request without writing anything.
    pub fn try_reserve(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.slots).try_acquire_owned().ok()
    }

    /// Append a client at the back of the queue
    pub async fn push(&self, client: StreamClient) {
        self.inner.lock().await.push_back(client);
    }

    /// Remove the client at the front of the queue, if any
    pub async fn pop(&self) -> Option<StreamClient> {
        self.inner.lock().await.pop_front()
    }

    /// Number of queued clients
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether the queue is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
