use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RelayError, RelayResult};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Ids that don't even parse can't name anything we hold, so they're NotFound too.
            pub fn parse(s: &str) -> RelayResult<Self> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| RelayError::not_found($kind, s))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(UserId, "user");
id_type!(RoomId, "room");
id_type!(
    /// Key shared by every envelope fanned out from one sent message.
    MessageId, "message"
);
