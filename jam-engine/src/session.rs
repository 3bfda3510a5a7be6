use std::sync::Arc;

use crossbeam::atomic::AtomicCell;
use flume::{Receiver, Sender};

use crate::util::ID_COUNTER;

pub type SessionId = u64;

/// The outbound half of one participant connection.
///
/// `deliver` never blocks: frames are enqueued for the socket writer to
/// drain. Any failure to enqueue means the peer is gone, after which the
/// session stays closed for good.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    outgoing: Sender<String>,
    closed: AtomicCell<bool>,
}

impl Session {
    /// Creates a session along with the receiver its socket writer drains.
    pub fn new() -> (Arc<Self>, Receiver<String>) {
        let (outgoing, receiver) = flume::unbounded();

        let session = Self {
            id: ID_COUNTER.fetch_add(1),
            outgoing,
            closed: AtomicCell::new(false),
        };

        (Arc::new(session), receiver)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Enqueues a serialized frame, returning false if the peer is gone.
    pub fn deliver(&self, frame: String) -> bool {
        if self.closed.load() {
            return false;
        }

        let delivered = self.outgoing.send(frame).is_ok();

        if !delivered {
            self.closed.store(true);
        }

        delivered
    }

    /// Marks the session as closed. Idempotent.
    pub fn close(&self) {
        self.closed.store(true);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deliver_and_close() {
        let (session, receiver) = Session::new();

        assert!(session.deliver("one".to_string()), "delivery succeeds");
        assert_eq!(receiver.try_recv().ok(), Some("one".to_string()));

        session.close();
        assert!(!session.deliver("two".to_string()), "closed session rejects frames");
        assert!(receiver.try_recv().is_err(), "nothing is enqueued after close");
    }

    #[test]
    fn test_deliver_fails_when_peer_is_gone() {
        let (session, receiver) = Session::new();
        drop(receiver);

        assert!(!session.deliver("one".to_string()), "delivery fails without a peer");
        assert!(
            !session.deliver("two".to_string()),
            "the session stays closed after a failure"
        );
    }
}
