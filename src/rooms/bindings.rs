use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::{mapref::entry::Entry, DashMap};
use tokio_util::sync::CancellationToken;

use crate::{
    error::RelayResult,
    ids::{RoomId, UserId},
    mailbox::Mailboxes,
    rooms::Rooms,
};

struct Active {
    session: u64,
    room: RoomId,
    token: CancellationToken,
}

/// What closing a connection did to its user's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Left { room_deleted: bool },
    /// A newer connection for the same user is still in the room.
    Superseded,
}

/// The live `/chat` connection of each user. Binding again as the same user
/// cancels the older connection, so one mailbox never has two consumers.
#[derive(Clone, Default)]
pub struct Bindings {
    active: Arc<DashMap<UserId, Active>>,
    next: Arc<AtomicU64>,
}

impl Bindings {
    pub fn claim(&self, user: UserId, room: RoomId, token: CancellationToken) -> u64 {
        let session = self.next.fetch_add(1, Ordering::Relaxed);
        if let Some(previous) = self.active.insert(user, Active { session, room, token }) {
            tracing::debug!(user = %user, session = previous.session, "replacing older connection");
            previous.token.cancel();
        }
        session
    }

    /// Undoes a claim whose join never happened.
    pub fn forget(&self, user: UserId, session: u64) {
        self.active.remove_if(&user, |_, active| active.session == session);
    }

    pub fn is_current(&self, user: UserId, session: u64) -> bool {
        self.active.get(&user).is_some_and(|active| active.session == session)
    }

    /// Takes the user out of `room` unless a newer connection is using it.
    /// Runs under the user's entry lock, so a concurrent `claim` sees either
    /// the whole release or none of it.
    pub fn release(
        &self,
        user: UserId,
        room: RoomId,
        session: u64,
        rooms: &Rooms,
        mailboxes: &Mailboxes,
    ) -> RelayResult<Release> {
        match self.active.entry(user) {
            Entry::Occupied(current) if current.get().session != session => {
                if current.get().room == room {
                    return Ok(Release::Superseded);
                }
                let room_deleted = rooms.leave(user, room)?;
                Ok(Release::Left { room_deleted })
            }
            Entry::Occupied(current) => {
                let left = rooms.leave(user, room);
                mailboxes.discard_if_empty(user);
                current.remove();
                Ok(Release::Left { room_deleted: left? })
            }
            Entry::Vacant(_) => {
                let room_deleted = rooms.leave(user, room)?;
                mailboxes.discard_if_empty(user);
                Ok(Release::Left { room_deleted })
            }
        }
    }
}
