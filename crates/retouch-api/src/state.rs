//! Application state shared by every handler.

use crate::auth::JwtVerifier;
use retouch_core::Config;
use retouch_db::{CreditLedger, ImageStore};
use retouch_editor::{SessionRegistry, SessionSettings};
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    /// `None` when the stores are not database-backed.
    pub pool: Option<PgPool>,
    pub images: Arc<dyn ImageStore>,
    pub ledger: Arc<dyn CreditLedger>,
    pub sessions: SessionRegistry,
    pub session_settings: SessionSettings,
    pub jwt: JwtVerifier,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: Option<PgPool>,
        images: Arc<dyn ImageStore>,
        ledger: Arc<dyn CreditLedger>,
    ) -> Self {
        let session_settings = SessionSettings::from_config(&config);
        let jwt = JwtVerifier::new(&config.jwt_secret);
        Self {
            config,
            pool,
            images,
            ledger,
            sessions: SessionRegistry::new(),
            session_settings,
            jwt,
        }
    }
}
