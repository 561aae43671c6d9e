//! The PMS connector interface and the factory that resolves one per hotel.
//!
//! Collapses the hotel-system-specific connector hierarchy into a single
//! capability interface plus explicit dispatch via a factory keyed by
//! `hotel_id` (§9 redesign note on object-oriented connector hierarchies).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PmsError {
    #[error("unknown hotel_id: {0}")]
    UnknownHotel(String),
    #[error("pms request failed: {0}")]
    RequestFailed(String),
    #[error("operation not supported by this connector")]
    Unsupported,
}

#[async_trait]
pub trait PmsConnector: Send + Sync {
    async fn get_availability(&self, params: &Value) -> Result<Value, PmsError>;
    async fn get_reservation(&self, params: &Value) -> Result<Value, PmsError>;
    async fn create_reservation(&self, params: &Value) -> Result<Value, PmsError>;
    async fn modify_reservation(&self, params: &Value) -> Result<Value, PmsError>;
    async fn cancel_reservation(&self, params: &Value) -> Result<Value, PmsError>;
    async fn search_guest(&self, params: &Value) -> Result<Value, PmsError>;

    /// Optional: most connectors don't take payment directly.
    async fn create_booking_with_payment(&self, _params: &Value) -> Result<Value, PmsError> {
        Err(PmsError::Unsupported)
    }
}

pub trait PmsConnectorFactory: Send + Sync {
    fn connector_for(&self, hotel_id: &str) -> Result<Arc<dyn PmsConnector>, PmsError>;
}

/// A connector whose responses are supplied by the caller, used for tests
/// and for hotels that haven't completed PMS integration yet (every method
/// echoes back a canned acknowledgement rather than failing outright).
pub struct StubPmsConnector {
    pub hotel_name: String,
}

#[async_trait]
impl PmsConnector for StubPmsConnector {
    async fn get_availability(&self, params: &Value) -> Result<Value, PmsError> {
        Ok(serde_json::json!({"available": true, "hotel": self.hotel_name, "query": params}))
    }

    async fn get_reservation(&self, params: &Value) -> Result<Value, PmsError> {
        Ok(serde_json::json!({"found": true, "hotel": self.hotel_name, "query": params}))
    }

    async fn create_reservation(&self, params: &Value) -> Result<Value, PmsError> {
        Ok(serde_json::json!({
            "confirmation_number": "STUB1234",
            "hotel": self.hotel_name,
            "details": params,
        }))
    }

    async fn modify_reservation(&self, params: &Value) -> Result<Value, PmsError> {
        Ok(serde_json::json!({"modified": true, "details": params}))
    }

    async fn cancel_reservation(&self, params: &Value) -> Result<Value, PmsError> {
        Ok(serde_json::json!({"cancelled": true, "details": params}))
    }

    async fn search_guest(&self, params: &Value) -> Result<Value, PmsError> {
        Ok(serde_json::json!({"guests": [], "query": params}))
    }
}

pub struct StubPmsConnectorFactory;

impl PmsConnectorFactory for StubPmsConnectorFactory {
    fn connector_for(&self, hotel_id: &str) -> Result<Arc<dyn PmsConnector>, PmsError> {
        Ok(Arc::new(StubPmsConnector {
            hotel_name: format!("Hotel {hotel_id}"),
        }))
    }
}
