//! A single-owner mutation queue for one call: a `tokio::sync::Mutex`
//! (rather than `parking_lot`) because the guard is held across `.await`
//! points during a turn's mutation phase (TTS/LLM/PMS/persistence calls),
//! guaranteeing per-session serialization while cross-session work proceeds
//! in parallel (§5).

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use voice_agent_core::CallSession;

pub struct SessionLane {
    session: Mutex<CallSession>,
    ending: AtomicBool,
}

impl SessionLane {
    pub fn new(session: CallSession) -> Self {
        Self { session: Mutex::new(session), ending: AtomicBool::new(false) }
    }

    pub async fn lock(&self) -> MutexGuard<'_, CallSession> {
        self.session.lock().await
    }

    /// Marks the call as ending. An in-flight turn on this lane completes
    /// its mutation (bounded by the usual per-phase timeouts) but the
    /// caller should suppress its outbound reply once this is set (§5).
    pub fn mark_ending(&self) {
        self.ending.store(true, Ordering::SeqCst);
    }

    pub fn is_ending(&self) -> bool {
        self.ending.load(Ordering::SeqCst)
    }
}
