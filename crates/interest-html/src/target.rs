//! The explicit render context threaded through every render call.

use std::future::Future;
use std::sync::{Arc, Mutex};

use interest_stream::{ChunkQueue, Error, Result};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Where rendered chunks go.
///
/// Wraps the document's chunk queue together with the set of detached
/// producers started while rendering into it. Cloning is cheap; clones
/// share the queue and the detached set.
#[derive(Clone)]
pub struct RenderTarget {
    chunks: ChunkQueue<String>,
    detached: Arc<Mutex<Vec<JoinHandle<()>>>>,
    nested: bool,
}

impl RenderTarget {
    pub fn new(chunks: ChunkQueue<String>) -> Self {
        Self {
            chunks,
            detached: Arc::new(Mutex::new(Vec::new())),
            nested: false,
        }
    }

    pub fn chunks(&self) -> &ChunkQueue<String> {
        &self.chunks
    }

    /// `true` when rendering inside a tag's body.
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// The target for a tag's children.
    pub(crate) fn nested(&self) -> Self {
        Self {
            nested: true,
            ..self.clone()
        }
    }

    /// Write one chunk, waiting for space if the queue is bounded.
    pub async fn write(&self, chunk: impl Into<String>) -> Result<()> {
        self.chunks.send(chunk.into()).await
    }

    /// Run `work` without blocking the caller.
    ///
    /// Faults stay with the detached producer: a closed sink stops it
    /// quietly, anything else is logged.
    pub fn detach<F>(&self, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            match work.await {
                Ok(()) => debug!("detached producer finished"),
                Err(Error::Closed) => debug!("detached producer stopped, sink closed"),
                Err(err) => warn!(error = %err, "detached producer failed"),
            }
        });
        self.detached
            .lock()
            .expect("detached producers lock")
            .push(handle);
    }

    /// Number of detached producers still running.
    pub fn detached_running(&self) -> usize {
        self.detached
            .lock()
            .expect("detached producers lock")
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Wait until every detached producer, including ones started while
    /// waiting, has finished.
    pub async fn join_detached(&self) {
        loop {
            let handles = std::mem::take(&mut *self.detached.lock().expect("detached producers lock"));
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    warn!(error = %err, "detached producer panicked");
                }
            }
        }
    }
}
