#[cfg(test)]
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::AppResult;

/// Durable set of notification keys already announced. Append-only during
/// normal operation; it never shrinks except by operator action on the
/// backing database.
#[async_trait]
pub trait NotifiedStore: Send + Sync {
    async fn contains(&self, key: &str) -> AppResult<bool>;
    async fn add(&self, key: &str) -> AppResult<()>;
}

/// Durable set of chat handles that opted in to notifications.
/// Monotonic union; the core offers no removal.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn register(&self, handle: &str) -> AppResult<()>;
    async fn all(&self) -> AppResult<Vec<String>>;
}
