use std::{collections::BTreeMap, sync::Arc};

use dashmap::DashMap;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::{
    error::{RelayError, RelayResult},
    ids::{RoomId, UserId},
    users::{User, Users},
};

const ADJECTIVES: &[&str] = &[
    "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
    "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy", "Sad",
    "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Dark", "Lucky",
];

const NOUNS: &[&str] = &[
    "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
    "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Puppy", "Phoenix", "Griffin",
    "Unicorn", "Turtle", "Dolphin", "Whale", "Elephant", "Giraffe", "Zebra",
];

fn random_name() -> String {
    let mut rng = rand::rng();
    format!(
        "{} {}",
        ADJECTIVES.choose(&mut rng).copied().unwrap_or_default(),
        NOUNS.choose(&mut rng).copied().unwrap_or_default(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    #[serde(skip)]
    pub id: RoomId,
    pub name: String,
    /// Join order, no duplicates.
    pub members: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub name: String,
    pub members: BTreeMap<UserId, User>,
}

/// Rooms are created empty and disappear as soon as their last member leaves.
#[derive(Clone, Default)]
pub struct Rooms {
    rooms: Arc<DashMap<RoomId, Room>>,
}

impl Rooms {
    pub fn create(&self) -> RoomId {
        let id = RoomId::new();
        self.rooms.insert(id, Room { id, name: random_name(), members: Vec::new() });
        id
    }

    pub fn join(&self, user: UserId, room: RoomId) -> RelayResult<Room> {
        let mut entry = self
            .rooms
            .get_mut(&room)
            .ok_or_else(|| RelayError::not_found("room", room))?;

        if !entry.members.contains(&user) {
            entry.members.push(user);
        }
        Ok(entry.value().clone())
    }

    /// Returns true if this leave emptied and deleted the room.
    pub fn leave(&self, user: UserId, room: RoomId) -> RelayResult<bool> {
        let emptied = self
            .rooms
            .remove_if_mut(&room, |_, entry| {
                let before = entry.members.len();
                entry.members.retain(|member| *member != user);
                entry.members.len() < before && entry.members.is_empty()
            })
            .is_some();

        if emptied || self.rooms.contains_key(&room) {
            Ok(emptied)
        } else {
            Err(RelayError::not_found("room", room))
        }
    }

    pub fn get(&self, room: RoomId) -> RelayResult<Room> {
        self.rooms
            .get(&room)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RelayError::not_found("room", room))
    }

    pub fn contains(&self, room: RoomId) -> bool {
        self.rooms.contains_key(&room)
    }

    pub fn members(&self, room: RoomId) -> RelayResult<Vec<UserId>> {
        Ok(self.get(room)?.members)
    }

    pub fn list(&self) -> BTreeMap<RoomId, Room> {
        self.rooms
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn info(&self, room: RoomId, users: &Users) -> RelayResult<RoomInfo> {
        let Room { name, members, .. } = self.get(room)?;

        let members = members
            .into_iter()
            .map(|id| users.get(id).map(|user| (id, user)))
            .collect::<RelayResult<_>>()?;

        Ok(RoomInfo { name, members })
    }
}
