//! Per-call session state, event routing, and Redis-backed persistence
//! (§4.7): the seam where intent detection, slot filling, the flow
//! controller, the LLM coordinator and the TTS coordinator all meet.

pub mod events;
pub mod lane;
pub mod manager;
pub mod store;
pub mod templates;

pub use events::{parse_call_event, CallEvent, ReplyAction, ReplyMetadata, SessionReply};
pub use lane::SessionLane;
pub use manager::SessionManager;
pub use store::{ConsentRecord, ConsentStore, InMemorySessionStore, RedisConsentStore, RedisSessionStore, SessionStore, StoreError};
