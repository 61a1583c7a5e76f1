//! Transformation stages over async sequences.
//!
//! A [`Seq`] is a fallible stream whose elements arrive one at a time. A
//! [`Stage`] turns one sequence into another; stages hold no shared state
//! and are consumed when applied. Mappers and predicates receive the item
//! and its zero-based index and return a future, so every step may await.
//!
//! Errors pass through every stage untouched except [`catch`].

use std::future::Future;
use std::pin::Pin;

use futures_core::Stream;
use futures_util::stream::{self, StreamExt};

use crate::error::{Error, Result};

/// A boxed, fallible async sequence.
pub type Seq<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// A transformation from one sequence into another.
pub type Stage<T, U> = Box<dyn FnOnce(Seq<T>) -> Seq<U> + Send>;

/// Lift plain items into a sequence.
pub fn from_iter<I>(items: I) -> Seq<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    Box::pin(stream::iter(items.into_iter().map(Ok)))
}

/// Lift an infallible stream into a sequence.
pub fn from_stream<S>(source: S) -> Seq<S::Item>
where
    S: Stream + Send + 'static,
    S::Item: Send + 'static,
{
    Box::pin(source.map(Ok))
}

/// Box a stream that already yields `Result`s.
pub fn from_results<T, S>(source: S) -> Seq<T>
where
    S: Stream<Item = Result<T>> + Send + 'static,
{
    Box::pin(source)
}

pub fn map<T, U, F, Fut>(f: F) -> Stage<T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T, usize) -> Fut + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    Box::new(move |source: Seq<T>| -> Seq<U> {
        Box::pin(stream::unfold(
            (source, f, 0usize),
            |(mut source, mut f, index)| async move {
                match source.next().await? {
                    Ok(item) => {
                        let mapped = f(item, index).await;
                        Some((Ok(mapped), (source, f, index + 1)))
                    }
                    Err(err) => Some((Err(err), (source, f, index))),
                }
            },
        ))
    })
}

pub fn filter<T, F, Fut>(pred: F) -> Stage<T, T>
where
    T: Send + 'static,
    F: FnMut(&T, usize) -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Box::new(move |source: Seq<T>| -> Seq<T> {
        Box::pin(stream::unfold(
            (source, pred, 0usize),
            |(mut source, mut pred, mut index)| async move {
                loop {
                    match source.next().await? {
                        Ok(item) => {
                            let keep = pred(&item, index).await;
                            index += 1;
                            if keep {
                                return Some((Ok(item), (source, pred, index)));
                            }
                        }
                        Err(err) => return Some((Err(err), (source, pred, index))),
                    }
                }
            },
        ))
    })
}

/// Pass the first `count` items, then end without pulling further.
pub fn take<T: Send + 'static>(count: usize) -> Stage<T, T> {
    Box::new(move |source: Seq<T>| -> Seq<T> {
        Box::pin(stream::unfold(
            (source, count),
            |(mut source, remaining)| async move {
                if remaining == 0 {
                    return None;
                }
                match source.next().await? {
                    Ok(item) => Some((Ok(item), (source, remaining - 1))),
                    Err(err) => Some((Err(err), (source, remaining))),
                }
            },
        ))
    })
}

/// Drop the first `count` items.
pub fn skip<T: Send + 'static>(count: usize) -> Stage<T, T> {
    Box::new(move |source: Seq<T>| -> Seq<T> {
        Box::pin(stream::unfold(
            (source, count),
            |(mut source, mut remaining)| async move {
                loop {
                    match source.next().await? {
                        Ok(_) if remaining > 0 => remaining -= 1,
                        item => return Some((item, (source, remaining))),
                    }
                }
            },
        ))
    })
}

/// Group items into vectors of `size`; a trailing partial batch is
/// emitted when the source ends cleanly.
///
/// An error discards the partial batch and ends the sequence after the
/// error is yielded.
pub fn batch<T: Send + 'static>(size: usize) -> Stage<T, Vec<T>> {
    assert!(size > 0, "batch size must be > 0");
    Box::new(move |source: Seq<T>| -> Seq<Vec<T>> {
        Box::pin(stream::unfold(
            (source, false),
            move |(mut source, done)| async move {
                if done {
                    return None;
                }
                let mut batch = Vec::with_capacity(size);
                loop {
                    match source.next().await {
                        Some(Ok(item)) => {
                            batch.push(item);
                            if batch.len() >= size {
                                return Some((Ok(batch), (source, false)));
                            }
                        }
                        Some(Err(err)) => return Some((Err(err), (source, true))),
                        None if batch.is_empty() => return None,
                        None => return Some((Ok(batch), (source, true))),
                    }
                }
            },
        ))
    })
}

/// Run a side effect for every item, in order, before it is passed on.
///
/// The effect for an item has completed by the time the consumer
/// receives that item.
pub fn tap<T, F, Fut>(f: F) -> Stage<T, T>
where
    T: Send + 'static,
    F: FnMut(&T, usize) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |source: Seq<T>| -> Seq<T> {
        Box::pin(stream::unfold(
            (source, f, 0usize),
            |(mut source, mut f, index)| async move {
                match source.next().await? {
                    Ok(item) => {
                        f(&item, index).await;
                        Some((Ok(item), (source, f, index + 1)))
                    }
                    Err(err) => Some((Err(err), (source, f, index))),
                }
            },
        ))
    })
}

/// Hand the first error to `handler` and end the sequence cleanly.
pub fn catch<T, F, Fut>(handler: F) -> Stage<T, T>
where
    T: Send + 'static,
    F: FnOnce(Error) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |source: Seq<T>| -> Seq<T> {
        Box::pin(stream::unfold(
            (source, Some(handler)),
            |(mut source, mut handler)| async move {
                match source.next().await? {
                    Ok(item) => Some((Ok(item), (source, handler))),
                    Err(err) => {
                        if let Some(handler) = handler.take() {
                            handler(err).await;
                        }
                        None
                    }
                }
            },
        ))
    })
}

/// Chain two stages: `second(first(source))`.
pub fn compose<A, B, C>(first: Stage<A, B>, second: Stage<B, C>) -> Stage<A, C>
where
    A: 'static,
    B: 'static,
    C: 'static,
{
    Box::new(move |source| second(first(source)))
}

/// Apply stages to a source sequence, left to right.
///
/// ```
/// use interest_stream::{pipe, seq};
///
/// let numbers = pipe!(
///     seq::from_iter(1..=10),
///     seq::skip(2),
///     seq::take(3),
/// );
/// # drop(numbers);
/// ```
#[macro_export]
macro_rules! pipe {
    ($source:expr $(, $stage:expr)* $(,)?) => {{
        let seq = $source;
        $( let seq = ($stage)(seq); )*
        seq
    }};
}
