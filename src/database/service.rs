//! Database service layer
//!
//! Bundles the stores every service needs behind trait objects

use std::sync::Arc;
use crate::database::{DatabasePool, EventRepository, MemoryStore, NotificationRepository, UserRepository};
use crate::database::store::{EventStore, NotificationStore, UserStore};

#[derive(Clone)]
pub struct DatabaseService {
    pub users: Arc<dyn UserStore>,
    pub events: Arc<dyn EventStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pool: Option<DatabasePool>,
}

impl DatabaseService {
    /// PostgreSQL-backed stores sharing one pool
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            events: Arc::new(EventRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// All stores backed by one shared in-memory store
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            events: store.clone(),
            notifications: store,
            pool: None,
        }
    }

    /// Replace the notification store
    pub fn with_notification_store(mut self, notifications: Arc<dyn NotificationStore>) -> Self {
        self.notifications = notifications;
        self
    }

    /// Round-trip to the database; always healthy without a pool
    pub async fn health_check(&self) -> crate::Result<()> {
        match &self.pool {
            Some(pool) => super::connection::health_check(pool).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUserRequest;

    #[tokio::test]
    async fn test_in_memory_service_shares_one_store() {
        let service = DatabaseService::in_memory(Arc::new(MemoryStore::new()));
        let user = service
            .users
            .create_user(CreateUserRequest {
                name: "Lan".to_string(),
                email: "lan@example.org".to_string(),
                role: None,
                language_code: Some("vi".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(service.users.find_user(user.id).await.unwrap().unwrap().language_code, "vi");
        assert!(service.health_check().await.is_ok());
    }
}
