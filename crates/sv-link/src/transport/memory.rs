//! In-memory duplex transport: two endpoints joined by a pair of bounded
//! channels. Message-framed and ordered like the real thing, with close
//! propagation when either half drops.

use async_trait::async_trait;
use tokio::sync::mpsc;

use sv_types::TransportError;

use super::{MessageSink, MessageStream, Transport};

/// One end of an in-memory duplex pair.
pub struct MemoryTransport {
    tx: MemorySink,
    rx: MemoryStream,
}

/// Write half of a [`MemoryTransport`].
pub struct MemorySink(mpsc::Sender<String>);

/// Read half of a [`MemoryTransport`].
pub struct MemoryStream(mpsc::Receiver<String>);

/// Two transports wired back to back: what one sends, the other receives.
pub fn memory_pair(capacity: usize) -> (MemoryTransport, MemoryTransport) {
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);
    (
        MemoryTransport {
            tx: MemorySink(a_tx),
            rx: MemoryStream(a_rx),
        },
        MemoryTransport {
            tx: MemorySink(b_tx),
            rx: MemoryStream(b_rx),
        },
    )
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.0.send(text).await.map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl MessageStream for MemoryStream {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.0.recv().await.map(Ok)
    }
}

impl Transport for MemoryTransport {
    type Sink = MemorySink;
    type Stream = MemoryStream;

    fn split(self) -> (Self::Sink, Self::Stream) {
        (self.tx, self.rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_cross_the_pair_in_order() {
        let (left, right) = memory_pair(8);
        let (mut l_tx, _l_rx) = left.split();
        let (_r_tx, mut r_rx) = right.split();

        l_tx.send("one".into()).await.unwrap();
        l_tx.send("two".into()).await.unwrap();

        assert_eq!(r_rx.recv().await.unwrap().unwrap(), "one");
        assert_eq!(r_rx.recv().await.unwrap().unwrap(), "two");
    }

    #[tokio::test]
    async fn dropping_the_sink_closes_the_peer_stream() {
        let (left, right) = memory_pair(8);
        let (l_tx, _l_rx) = left.split();
        let (_r_tx, mut r_rx) = right.split();

        drop(l_tx);
        assert!(r_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn sending_to_a_dropped_peer_reports_closed() {
        let (left, right) = memory_pair(8);
        let (mut l_tx, _l_rx) = left.split();
        drop(right);

        let err = l_tx.send("lost".into()).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
