//! Cross-context request/response relay.
//!
//! Replaces the extension's fire-and-forget message passing with explicit
//! async request/response futures. A handler receives a [`ReplySlot`] that
//! is consumed by [`ReplySlot::respond`], so it can reply at most once by
//! construction; dropping the slot resolves the caller with
//! [`MessengerError::Dropped`] instead of leaving it waiting forever.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{EmailRecord, ScanStats, Verdict},
    page::PageId,
};

/// The closed set of message kinds carried across contexts.
#[derive(Debug)]
pub enum Request {
    ScanPage { page: PageId },
    UpdateStats { is_phish: bool },
    ConnectivityTest,
}

#[derive(Debug)]
pub enum Reply {
    /// `scanned` is false when the page had no supported provider or no
    /// readable email; both are silent no-ops, not errors. A scan that found
    /// an email but could not get a verdict carries the record with no
    /// verdict; the error banner is already on the page.
    ScanComplete {
        scanned: bool,
        record: Option<EmailRecord>,
        verdict: Option<Verdict>,
    },
    StatsUpdated { stats: ScanStats },
    /// The relay is alive; `pages` is the registry size.
    Pong { pages: usize },
}

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("messenger channel closed")]
    Closed,
    #[error("handler dropped the reply slot without responding")]
    Dropped,
}

struct Envelope {
    request: Request,
    reply: ReplySlot,
}

/// Single-use reply handle. Consumed on respond; a silently dropped slot is
/// observable by the caller, never a hang.
pub struct ReplySlot(oneshot::Sender<Reply>);

impl ReplySlot {
    pub fn respond(self, reply: Reply) {
        // The caller may have gone away (fire-and-forget notify); that is
        // not the handler's problem.
        let _ = self.0.send(reply);
    }
}

#[derive(Clone)]
pub struct Messenger {
    tx: mpsc::Sender<Envelope>,
}

pub struct Inbox {
    rx: mpsc::Receiver<Envelope>,
}

pub fn channel(capacity: usize) -> (Messenger, Inbox) {
    let (tx, rx) = mpsc::channel(capacity);
    (Messenger { tx }, Inbox { rx })
}

impl Messenger {
    /// Send a request and wait for the handler's single reply.
    pub async fn request(&self, request: Request) -> Result<Reply, MessengerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                request,
                reply: ReplySlot(reply_tx),
            })
            .await
            .map_err(|_| MessengerError::Closed)?;
        reply_rx.await.map_err(|_| MessengerError::Dropped)
    }

    /// Fire-and-forget variant used for side channels like stats updates.
    /// Delivery failure must never affect the caller.
    pub fn notify(&self, request: Request) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let (reply_tx, _discarded) = oneshot::channel();
            let _ = tx
                .send(Envelope {
                    request,
                    reply: ReplySlot(reply_tx),
                })
                .await;
        });
    }
}

impl Inbox {
    /// Next pending request plus its reply slot. `None` once every
    /// `Messenger` clone is gone.
    pub async fn recv(&mut self) -> Option<(Request, ReplySlot)> {
        self.rx
            .recv()
            .await
            .map(|envelope| (envelope.request, envelope.reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_resolves_with_handler_reply() {
        let (messenger, mut inbox) = channel(8);

        let server = tokio::spawn(async move {
            let (request, slot) = inbox.recv().await.unwrap();
            assert!(matches!(request, Request::ConnectivityTest));
            slot.respond(Reply::Pong { pages: 1 });
        });

        let reply = messenger.request(Request::ConnectivityTest).await.unwrap();
        assert!(matches!(reply, Reply::Pong { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_reply_slot_resolves_caller_with_error() {
        let (messenger, mut inbox) = channel(8);

        let server = tokio::spawn(async move {
            let (_request, slot) = inbox.recv().await.unwrap();
            drop(slot);
        });

        let err = messenger
            .request(Request::ConnectivityTest)
            .await
            .unwrap_err();
        assert!(matches!(err, MessengerError::Dropped));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_inbox_rejects_requests() {
        let (messenger, inbox) = channel(8);
        drop(inbox);
        let err = messenger
            .request(Request::ConnectivityTest)
            .await
            .unwrap_err();
        assert!(matches!(err, MessengerError::Closed));
    }

    #[tokio::test]
    async fn notify_delivers_without_waiting_for_reply() {
        let (messenger, mut inbox) = channel(8);
        messenger.notify(Request::UpdateStats { is_phish: true });

        let (request, slot) = inbox.recv().await.unwrap();
        assert!(matches!(request, Request::UpdateStats { is_phish: true }));
        // Responding into the discarded receiver is harmless.
        slot.respond(Reply::StatsUpdated {
            stats: ScanStats::default(),
        });
    }
}
