// In-memory store implementations for tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::AppResult;
use crate::store::{NotifiedStore, SubscriberStore};

#[derive(Default)]
pub struct InMemoryNotifiedStore {
    keys: RwLock<HashSet<String>>,
}

impl InMemoryNotifiedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotifiedStore for InMemoryNotifiedStore {
    async fn contains(&self, key: &str) -> AppResult<bool> {
        Ok(self.keys.read().contains(key))
    }

    async fn add(&self, key: &str) -> AppResult<()> {
        self.keys.write().insert(key.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySubscriberStore {
    handles: RwLock<Vec<String>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn register(&self, handle: &str) -> AppResult<()> {
        let mut handles = self.handles.write();
        if !handles.iter().any(|h| h == handle) {
            handles.push(handle.to_string());
        }
        Ok(())
    }

    async fn all(&self) -> AppResult<Vec<String>> {
        Ok(self.handles.read().clone())
    }
}
