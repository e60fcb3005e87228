use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserChanges};

/// Repository trait for User persistence
///
/// `create` and `update` enforce username and email uniqueness themselves, so a race
/// between two registrations still ends in a `Duplicate*` error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, input: NewUser) -> UserResult<User>;

    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>>;

    /// Apply `changes` to an existing user
    async fn update(&self, id: i32, changes: UserChanges) -> UserResult<User>;
}

#[derive(Debug, Default)]
struct Store {
    users: HashMap<i32, User>,
    last_id: i32,
}

impl Store {
    fn clash(
        &self,
        except: Option<i32>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Option<UserError> {
        let others = || self.users.values().filter(move |u| Some(u.id) != except);

        if let Some(username) = username {
            if others().any(|u| u.username == username) {
                return Some(UserError::DuplicateUsername);
            }
        }
        if let Some(email) = email {
            if others().any(|u| u.email == email) {
                return Some(UserError::DuplicateEmail);
            }
        }
        None
    }
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let mut store = self.store.write().await;

        if let Some(err) = store.clash(None, Some(&input.username), Some(&input.email)) {
            return Err(err);
        }

        store.last_id += 1;
        let user = User {
            id: store.last_id,
            username: input.username,
            email: input.email,
            password_hash: input.password_hash,
            avatar: String::new(),
            created_at: Utc::now(),
        };
        store.users.insert(user.id, user.clone());

        tracing::info!(user_id = user.id, username = %user.username, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.username == username).cloned())
    }

    async fn update(&self, id: i32, changes: UserChanges) -> UserResult<User> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&id) {
            return Err(UserError::NotFound(id));
        }
        let clash = store.clash(
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        );
        if let Some(err) = clash {
            return Err(err);
        }

        let user = store.users.get_mut(&id).ok_or(UserError::NotFound(id))?;
        user.apply(changes);

        tracing::info!(user_id = id, "Updated user");
        Ok(user.clone())
    }
}
