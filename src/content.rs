use std::sync::Arc;

use dashmap::DashMap;

use crate::{error::{RelayError, RelayResult}, ids::MessageId};

struct Entry {
    payload: Arc<[u8]>,
    readers: usize,
}

/// Raw payloads of sent messages, written once and read by every recipient.
///
/// Each record remembers how many envelopes point at it. [`Contents::checkout`] hands
/// out the payload and drops one reference; the record goes away with the last one.
#[derive(Clone, Default)]
pub struct Contents {
    entries: Arc<DashMap<MessageId, Entry>>,
}

impl Contents {
    pub fn put(&self, id: MessageId, payload: impl Into<Arc<[u8]>>, readers: usize) {
        if readers == 0 {
            return;
        }
        self.entries.insert(id, Entry { payload: payload.into(), readers });
    }

    pub fn get(&self, id: MessageId) -> RelayResult<Arc<[u8]>> {
        self.entries
            .get(&id)
            .map(|entry| entry.payload.clone())
            .ok_or_else(|| RelayError::not_found("message", id))
    }

    pub fn checkout(&self, id: MessageId) -> RelayResult<Arc<[u8]>> {
        let mut payload = None;
        self.entries.remove_if_mut(&id, |_, entry| {
            entry.readers = entry.readers.saturating_sub(1);
            payload = Some(entry.payload.clone());
            entry.readers == 0
        });

        payload.ok_or_else(|| RelayError::not_found("message", id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
