//! Single-writer/single-reader chunk queue.
//!
//! A [`ChunkQueue`] decouples a producer that discovers content over time
//! from a consumer that pulls on its own schedule. A write either satisfies
//! the oldest pending read or lands in the buffer; a read either takes the
//! oldest buffered chunk or registers itself as pending. The buffer and the
//! pending list are never both non-empty.
//!
//! The state lock is held only for the O(1) transition, never across an
//! await point.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::{oneshot, Notify};
use tracing::trace;

use crate::error::{Error, Result};

/// Outcome delivered to a suspended read: a chunk, end of sequence, or the
/// terminal fault.
type Delivery<T> = Result<Option<T>>;

struct State<T> {
    buffer: VecDeque<T>,
    pending: VecDeque<oneshot::Sender<Delivery<T>>>,
    closed: bool,
    error: Option<Error>,
}

impl<T> State<T> {
    /// Hand `chunk` to the oldest live reader, or buffer it.
    fn deliver(&mut self, mut chunk: T) {
        while let Some(reader) = self.pending.pop_front() {
            match reader.send(Ok(Some(chunk))) {
                Ok(()) => return,
                // That read was dropped before completing; try the next one.
                Err(Ok(Some(returned))) => chunk = returned,
                Err(_) => return,
            }
        }
        self.buffer.push_back(chunk);
    }
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: Option<usize>,
    /// Signalled whenever buffer space frees up or the queue terminates.
    space: Notify,
}

enum ReadStep<T> {
    Ready(Delivery<T>),
    Wait(oneshot::Receiver<Delivery<T>>),
}

/// An ordered handoff buffer between one producer and one consumer.
///
/// The handle is cheap to clone; clones share the same queue. By
/// convention one render invocation owns the writing side and one
/// transport owns the reading side.
pub struct ChunkQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ChunkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for ChunkQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> ChunkQueue<T> {
    /// A queue whose buffer grows without limit.
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// A queue whose [`send`](Self::send) suspends once `capacity` chunks
    /// are buffered.
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self::with_capacity(Some(capacity))
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    buffer: VecDeque::new(),
                    pending: VecDeque::new(),
                    closed: false,
                    error: None,
                }),
                capacity,
                space: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared.state.lock().expect("chunk queue lock")
    }

    pub fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }

    /// Number of chunks written but not yet read.
    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` once [`close`](Self::close) or [`error`](Self::error) ran.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn is_errored(&self) -> bool {
        self.lock().error.is_some()
    }

    /// Write a chunk without ever suspending.
    ///
    /// Ignores the bound of a bounded queue. Fails with [`Error::Closed`]
    /// once the queue is terminal.
    pub fn write(&self, chunk: T) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        state.deliver(chunk);
        Ok(())
    }

    /// Write a chunk, suspending while a bounded queue is full.
    ///
    /// Fails with [`Error::Closed`] if the queue is, or becomes, terminal.
    pub async fn send(&self, chunk: T) -> Result<()> {
        let Some(capacity) = self.shared.capacity else {
            return self.write(chunk);
        };
        loop {
            let notified = self.shared.space.notified();
            {
                let mut state = self.lock();
                if state.closed {
                    return Err(Error::Closed);
                }
                if state.buffer.len() < capacity {
                    state.deliver(chunk);
                    return Ok(());
                }
            }
            trace!(capacity, "chunk queue full, producer waiting");
            notified.await;
        }
    }

    /// Terminate the queue with no error. Idempotent.
    ///
    /// Pending reads resolve with end of sequence; later reads drain the
    /// buffer and then do the same.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        for reader in state.pending.drain(..) {
            let _ = reader.send(Ok(None));
        }
        drop(state);
        self.shared.space.notify_waiters();
        trace!("chunk queue closed");
    }

    /// Terminate the queue with a fault. A no-op if already terminal.
    ///
    /// Every pending and future read re-raises `err`.
    pub fn error(&self, err: Error) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.buffer.clear();
        for reader in state.pending.drain(..) {
            let _ = reader.send(Err(err.clone()));
        }
        trace!(error = %err, "chunk queue errored");
        state.error = Some(err);
        drop(state);
        self.shared.space.notify_waiters();
    }

    fn read_step(&self) -> ReadStep<T> {
        let mut state = self.lock();
        if let Some(err) = &state.error {
            return ReadStep::Ready(Err(err.clone()));
        }
        if let Some(chunk) = state.buffer.pop_front() {
            drop(state);
            if self.shared.capacity.is_some() {
                self.shared.space.notify_waiters();
            }
            return ReadStep::Ready(Ok(Some(chunk)));
        }
        if state.closed {
            return ReadStep::Ready(Ok(None));
        }
        let (tx, rx) = oneshot::channel();
        state.pending.push_back(tx);
        ReadStep::Wait(rx)
    }

    /// Read the next chunk.
    ///
    /// Returns immediately when a chunk is buffered or the queue is
    /// terminal; otherwise suspends until the next write, close or error.
    /// `Ok(None)` marks the end of the sequence.
    pub async fn read(&self) -> Result<Option<T>> {
        match self.read_step() {
            ReadStep::Ready(delivery) => delivery,
            ReadStep::Wait(rx) => rx.await.unwrap_or(Ok(None)),
        }
    }

    /// Iterate the queue as a [`Stream`] sharing this handle.
    pub fn stream(&self) -> ChunkStream<T> {
        self.clone().into_stream()
    }

    pub fn into_stream(self) -> ChunkStream<T> {
        ChunkStream {
            queue: self,
            waiting: None,
            done: false,
        }
    }
}

/// Stream over a [`ChunkQueue`]'s content.
///
/// Yields every chunk in write order, then ends on close. On error it
/// yields the fault once and then ends.
pub struct ChunkStream<T> {
    queue: ChunkQueue<T>,
    waiting: Option<oneshot::Receiver<Delivery<T>>>,
    done: bool,
}

impl<T> Unpin for ChunkStream<T> {}

impl<T> ChunkStream<T> {
    /// The queue this stream reads from.
    pub fn queue(&self) -> &ChunkQueue<T> {
        &self.queue
    }

    fn settle(&mut self, delivery: Delivery<T>) -> Poll<Option<Result<T>>> {
        match delivery {
            Ok(Some(chunk)) => Poll::Ready(Some(Ok(chunk))),
            Ok(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            Err(err) => {
                self.done = true;
                Poll::Ready(Some(Err(err)))
            }
        }
    }
}

impl<T> Stream for ChunkStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        let mut rx = match this.waiting.take() {
            Some(rx) => rx,
            None => match this.queue.read_step() {
                ReadStep::Ready(delivery) => return this.settle(delivery),
                ReadStep::Wait(rx) => rx,
            },
        };
        match Pin::new(&mut rx).poll(cx) {
            Poll::Ready(delivery) => this.settle(delivery.unwrap_or(Ok(None))),
            Poll::Pending => {
                this.waiting = Some(rx);
                Poll::Pending
            }
        }
    }
}
