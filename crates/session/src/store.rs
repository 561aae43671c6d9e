//! Session and consent persistence: `SETEX`/`GET` against a key-value store
//! (§4.7, §6). `RedisSessionStore` is the production implementation;
//! `InMemorySessionStore` backs tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use voice_agent_core::CallSession;

const CONSENT_TTL_SECONDS: u64 = 365 * 24 * 3600;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session: &CallSession, ttl_seconds: u64) -> Result<(), StoreError>;
    async fn get(&self, call_id: &str) -> Result<Option<CallSession>, StoreError>;
    async fn delete(&self, call_id: &str) -> Result<(), StoreError>;
}

fn session_key(call_id: &str) -> String {
    format!("call:{call_id}")
}

pub struct RedisSessionStore {
    connection: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session: &CallSession, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let payload = serde_json::to_string(session)?;
        let _: () = conn.set_ex(session_key(&session.call_id), payload, ttl_seconds).await?;
        Ok(())
    }

    async fn get(&self, call_id: &str) -> Result<Option<CallSession>, StoreError> {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn.get(session_key(call_id)).await?;
        Ok(match payload {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }

    async fn delete(&self, call_id: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(session_key(call_id)).await?;
        Ok(())
    }
}

/// In-memory stand-in for tests; no TTL enforcement.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, CallSession>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session: &CallSession, _ttl_seconds: u64) -> Result<(), StoreError> {
        self.sessions.lock().unwrap().insert(session.call_id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, call_id: &str) -> Result<Option<CallSession>, StoreError> {
        Ok(self.sessions.lock().unwrap().get(call_id).cloned())
    }

    async fn delete(&self, call_id: &str) -> Result<(), StoreError> {
        self.sessions.lock().unwrap().remove(call_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub hotel_id: String,
    pub purpose: String,
    pub consent: bool,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub version: u32,
    pub schema_version: u32,
}

#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn record(&self, record: &ConsentRecord) -> Result<(), StoreError>;
}

fn consent_key(hotel_id: &str, purpose: &str) -> String {
    format!("consent:{hotel_id}:{purpose}")
}

pub struct RedisConsentStore {
    connection: ConnectionManager,
}

impl RedisConsentStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl ConsentStore for RedisConsentStore {
    async fn record(&self, record: &ConsentRecord) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let payload = serde_json::to_string(record)?;
        let _: () = conn
            .set_ex(consent_key(&record.hotel_id, &record.purpose), payload, CONSENT_TTL_SECONDS)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_agent_core::CallSession;

    #[tokio::test]
    async fn in_memory_store_round_trips_a_session() {
        let store = InMemorySessionStore::default();
        let session = CallSession::new("c1", "r1", "h1");
        store.put(&session, 3600).await.unwrap();
        let fetched = store.get("c1").await.unwrap().unwrap();
        assert_eq!(fetched.call_id, "c1");
    }

    #[tokio::test]
    async fn delete_removes_the_session() {
        let store = InMemorySessionStore::default();
        let session = CallSession::new("c1", "r1", "h1");
        store.put(&session, 3600).await.unwrap();
        store.delete("c1").await.unwrap();
        assert!(store.get("c1").await.unwrap().is_none());
    }
}
