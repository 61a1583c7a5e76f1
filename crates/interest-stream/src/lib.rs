//! interest-stream: the handoff between a producer and a consumer.
//!
//! [`ChunkQueue`] connects a producer that discovers content over time
//! (e.g. one list item every 500ms) with a consumer that pulls on its own
//! schedule, such as an HTTP transport. Neither side busy-waits: reads on
//! an empty queue suspend until the next write, close or error.
//!
//! The [`seq`] module provides stateless stages (map, filter, take, skip,
//! batch, tap, catch) over any fallible async sequence, including a
//! queue's own [`ChunkStream`].
//!
//! # Ordering
//!
//! Chunks written in program order are read in that order. Suspended reads
//! are served first-come, first-served.
//!
//! # Backpressure
//!
//! [`ChunkQueue::write`] never suspends. A queue created with
//! [`ChunkQueue::bounded`] makes [`ChunkQueue::send`] wait until the
//! consumer frees buffer space.

mod error;
mod queue;
pub mod seq;

pub use error::{Error, Result};
pub use queue::{ChunkQueue, ChunkStream};
pub use seq::{Seq, Stage};
