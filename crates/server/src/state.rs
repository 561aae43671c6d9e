//! Shared state handed to every axum handler.

use std::sync::Arc;

use voice_agent_config::Settings;
use voice_agent_session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub session_manager: Arc<SessionManager>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, session_manager: Arc<SessionManager>) -> Self {
        Self { settings, session_manager }
    }
}
