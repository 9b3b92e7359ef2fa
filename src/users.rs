use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::{error::{RelayError, RelayResult}, ids::UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(skip)]
    pub id: UserId,
    pub name: String,
    pub lang: String,
}

/// Every join mints a new user; records are never removed.
#[derive(Clone, Default)]
pub struct Users {
    users: Arc<DashMap<UserId, User>>,
}

impl Users {
    pub fn create(&self, name: impl Into<String>, lang: impl Into<String>) -> UserId {
        let id = UserId::new();
        self.users.insert(id, User { id, name: name.into(), lang: lang.into() });
        id
    }

    pub fn get(&self, id: UserId) -> RelayResult<User> {
        self.users
            .get(&id)
            .map(|user| user.value().clone())
            .ok_or_else(|| RelayError::not_found("user", id))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get() {
        let users = Users::default();
        let id = users.create("A", "eng");
        let user = users.get(id).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "A");
        assert_eq!(user.lang, "eng");
    }

    #[test]
    fn same_name_gets_a_new_identity() {
        let users = Users::default();
        let first = users.create("A", "eng");
        let second = users.create("A", "eng");
        assert_ne!(first, second);
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let users = Users::default();
        assert!(matches!(
            users.get(UserId::new()),
            Err(RelayError::NotFound { kind: "user", .. })
        ));
    }
}
