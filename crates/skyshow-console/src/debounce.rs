//! Coalescing of bursty triggers.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

/// Wait for the next trigger, then keep absorbing newer ones until the
/// channel stays quiet for `quiet`. Returns the newest trigger, or `None` once
/// the channel is closed and drained.
pub async fn next_debounced<T>(rx: &mut mpsc::Receiver<T>, quiet: Duration) -> Option<T> {
    let mut latest = rx.recv().await?;
    loop {
        match timeout(quiet, rx.recv()).await {
            Ok(Some(newer)) => latest = newer,
            Ok(None) | Err(_) => return Some(latest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_newest() {
        let (tx, mut rx) = mpsc::channel(16);
        for i in 0..5 {
            tx.send(i).await.unwrap();
        }
        assert_eq!(next_debounced(&mut rx, Duration::from_millis(100)).await, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_are_delivered_separately() {
        let (tx, mut rx) = mpsc::channel(16);
        let sender = tokio::spawn(async move {
            tx.send("a1").await.unwrap();
            tx.send("a2").await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            tx.send("b1").await.unwrap();
        });

        let quiet = Duration::from_millis(100);
        assert_eq!(next_debounced(&mut rx, quiet).await, Some("a2"));
        assert_eq!(next_debounced(&mut rx, quiet).await, Some("b1"));
        sender.await.unwrap();
        assert_eq!(next_debounced(&mut rx, quiet).await, None);
    }
}
