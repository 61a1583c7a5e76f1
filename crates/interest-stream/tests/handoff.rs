//! Producer/consumer handoff through a chunk queue, with the producer and
//! consumer running at different paces.

use std::time::Duration;

use futures_util::StreamExt;
use interest_stream::{pipe, seq, ChunkQueue, Error};

#[tokio::test(start_paused = true)]
async fn slow_producer_fast_consumer_sees_every_chunk_in_order() {
    let queue = ChunkQueue::unbounded();
    let writer = queue.clone();

    let producer = tokio::spawn(async move {
        for i in 0..10u32 {
            tokio::time::sleep(Duration::from_millis(500)).await;
            writer.write(i).unwrap();
        }
        writer.close();
    });

    let mut received = Vec::new();
    while let Some(chunk) = queue.read().await.unwrap() {
        received.push(chunk);
    }
    producer.await.unwrap();

    assert_eq!(received, (0..10).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn bounded_queue_holds_a_fast_producer_back() {
    let queue = ChunkQueue::bounded(4);
    let writer = queue.clone();

    let producer = tokio::spawn(async move {
        for i in 0..100u32 {
            writer.send(i).await.unwrap();
        }
        writer.close();
    });

    let mut received = Vec::new();
    let mut stream = queue.stream();
    while let Some(chunk) = stream.next().await {
        assert!(queue.len() <= 4, "buffer exceeded its bound");
        received.push(chunk.unwrap());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    producer.await.unwrap();

    assert_eq!(received.len(), 100);
    assert!(received.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn producer_fault_terminates_the_consumer_cleanly() {
    let queue = ChunkQueue::unbounded();
    queue.write("<p>").unwrap();
    queue.write("partial").unwrap();

    let reader = queue.stream();
    queue.error(Error::fault("component exploded"));

    let items: Vec<_> = reader.collect().await;
    assert_eq!(items, vec![Err(Error::fault("component exploded"))]);
}

#[tokio::test]
async fn queue_stream_feeds_combinators() {
    let queue = ChunkQueue::unbounded();
    for word in ["alpha", "beta", "gamma", "delta"] {
        queue.write(word.to_string()).unwrap();
    }
    queue.close();

    let upper = pipe!(
        seq::from_results(queue.into_stream()),
        seq::filter(|w: &String, _| {
            let keep = w.len() > 4;
            async move { keep }
        }),
        seq::map(|w: String, i| async move { format!("{i}-{}", w.to_uppercase()) }),
    );

    let out: Vec<String> = upper.map(|r| r.unwrap()).collect().await;
    assert_eq!(out, vec!["0-ALPHA", "1-GAMMA", "2-DELTA"]);
}
