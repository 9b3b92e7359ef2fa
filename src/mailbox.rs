use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Notify;

use crate::ids::{MessageId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Audio,
}

/// One pending delivery of one message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_lang: String,
    pub kind: MessageKind,
}

#[derive(Default)]
struct Mailbox {
    queue: Mutex<VecDeque<Envelope>>,
    ready: Notify,
}

impl Mailbox {
    fn pop(&self) -> Option<Envelope> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Per-user FIFO queues. Each mailbox has its own lock, so busy users don't
/// hold each other up.
#[derive(Clone, Default)]
pub struct Mailboxes {
    boxes: Arc<DashMap<UserId, Arc<Mailbox>>>,
}

impl Mailboxes {
    fn mailbox(&self, user: UserId) -> Arc<Mailbox> {
        self.boxes.entry(user).or_default().value().clone()
    }

    pub fn enqueue(&self, recipient: UserId, envelope: Envelope) {
        // The map entry stays locked until the push lands, so `discard_if_empty` can't drop it.
        let mailbox = self.boxes.entry(recipient).or_default();
        mailbox
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(envelope);
        mailbox.ready.notify_one();
    }

    /// Waits until `recipient` has mail. Dropping the future gives up the wait
    /// without taking anything out of the queue.
    pub async fn dequeue(&self, recipient: UserId) -> Envelope {
        let mailbox = self.mailbox(recipient);
        loop {
            if let Some(envelope) = mailbox.pop() {
                return envelope;
            }
            mailbox.ready.notified().await;
        }
    }

    pub fn pending(&self, user: UserId) -> usize {
        let Some(mailbox) = self.boxes.get(&user).map(|entry| entry.value().clone()) else {
            return 0;
        };
        let queue = mailbox.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.len()
    }

    /// Drops `user`'s mailbox once nothing is waiting in it. Only call this when
    /// no connection is consuming it anymore.
    pub fn discard_if_empty(&self, user: UserId) -> bool {
        self.boxes
            .remove_if(&user, |_, mailbox| {
                mailbox.queue.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
