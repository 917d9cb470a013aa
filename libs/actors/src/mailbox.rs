//! Actor Mailbox
//!
//! Ordered per-actor queue. Any number of senders may enqueue; only the
//! actor's processing loop owns the receiving half. Stop requests travel
//! through the same queue so they are handled behind already-enqueued work.

use crate::error::DeliveryFailure;
use crate::message::Envelope;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Item carried by the mailbox
#[derive(Debug)]
pub(crate) enum Signal {
    Deliver(Envelope),
    Stop,
}

/// Sending half of an actor mailbox
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: mpsc::UnboundedSender<Signal>,
    /// Queued user messages, bounded by `capacity`
    depth: Arc<AtomicUsize>,
    capacity: usize,
}

/// Receiving half, owned by exactly one processing loop
#[derive(Debug)]
pub(crate) struct MailboxReceiver {
    rx: mpsc::UnboundedReceiver<Signal>,
    depth: Arc<AtomicUsize>,
}

impl Mailbox {
    pub(crate) fn new(capacity: usize) -> (Self, MailboxReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));

        let mailbox = Self {
            tx,
            depth: Arc::clone(&depth),
            capacity,
        };
        let receiver = MailboxReceiver { rx, depth };

        (mailbox, receiver)
    }

    /// Enqueue a user message, handing it back with the reason on failure
    pub(crate) fn enqueue(&self, envelope: Envelope) -> Result<(), (Envelope, DeliveryFailure)> {
        if self.tx.is_closed() {
            return Err((envelope, DeliveryFailure::Terminated));
        }

        let previous = self.depth.fetch_add(1, Ordering::AcqRel);
        if previous >= self.capacity {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            return Err((envelope, DeliveryFailure::MailboxFull));
        }

        match self.tx.send(Signal::Deliver(envelope)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(signal)) => {
                self.depth.fetch_sub(1, Ordering::AcqRel);
                match signal {
                    Signal::Deliver(envelope) => Err((envelope, DeliveryFailure::Terminated)),
                    Signal::Stop => unreachable!("enqueue only sends Deliver"),
                }
            }
        }
    }

    /// Queue a stop request; ignores the capacity bound
    pub(crate) fn request_stop(&self) -> bool {
        self.tx.send(Signal::Stop).is_ok()
    }

    /// Number of user messages waiting to be processed
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the owning loop has stopped accepting messages
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl MailboxReceiver {
    pub(crate) async fn recv(&mut self) -> Option<Signal> {
        let signal = self.rx.recv().await;
        if let Some(Signal::Deliver(_)) = &signal {
            self.depth.fetch_sub(1, Ordering::AcqRel);
        }
        signal
    }

    /// Stop accepting new messages and hand back everything still queued
    pub(crate) fn close_and_drain(&mut self) -> Vec<Envelope> {
        self.rx.close();
        let mut leftovers = Vec::new();
        while let Ok(signal) = self.rx.try_recv() {
            if let Signal::Deliver(envelope) = signal {
                self.depth.fetch_sub(1, Ordering::AcqRel);
                leftovers.push(envelope);
            }
        }
        leftovers
    }
}
