//! Process-wide state shared by every request.

use std::sync::Arc;

use crew_auth::TokenVerifier;
use crew_core::limits::Limits;
use crew_db::CrewDb;
use crew_notify::Broadcaster;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<CrewDb>,
    pub verifier: TokenVerifier,
    pub broadcaster: Broadcaster,
    pub limits: Arc<Limits>,
    /// Outbound buffer for each notification socket.
    pub connection_buffer: usize,
}

impl AppState {
    #[must_use]
    pub fn new(db: CrewDb, verifier: TokenVerifier, limits: Limits, connection_buffer: usize) -> Self {
        Self {
            db: Arc::new(db),
            verifier,
            broadcaster: Broadcaster::new(),
            limits: Arc::new(limits),
            connection_buffer,
        }
    }
}
