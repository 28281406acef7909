//! Open sessions keyed by id, scoped to their owner.
//!
//! Sessions live until they are closed or sit idle past the timeout given to
//! [`SessionRegistry::start_sweeper`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use uuid::Uuid;

use retouch_core::AppError;

use crate::session::TransformationSession;

struct Entry {
    session: Arc<TransformationSession>,
    last_touched: Instant,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: TransformationSession) -> Arc<TransformationSession> {
        let session = Arc::new(session);
        self.sessions.write().await.insert(
            session.id(),
            Entry {
                session: Arc::clone(&session),
                last_touched: Instant::now(),
            },
        );
        session
    }

    /// Look up a session owned by `user_id` and mark it as used. Sessions of
    /// other users are reported as missing.
    pub async fn get(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Arc<TransformationSession>, AppError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(entry) if entry.session.user_id() == user_id => {
                entry.last_touched = Instant::now();
                Ok(Arc::clone(&entry.session))
            }
            _ => Err(AppError::NotFound("Session not found".to_string())),
        }
    }

    /// Close a session, cancelling its pending debounced input.
    pub async fn remove(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&id) {
            Some(entry) if entry.session.user_id() == user_id => {
                sessions.remove(&id);
                tracing::debug!(session_id = %id, "Transformation session closed");
                Ok(())
            }
            _ => Err(AppError::NotFound("Session not found".to_string())),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close every session not used within `idle`. Returns how many were closed.
    pub async fn sweep_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_touched.elapsed() < idle);
        let closed = before - sessions.len();
        if closed > 0 {
            tracing::info!(closed, open = sessions.len(), "Closed idle transformation sessions");
        }
        closed
    }

    /// Start the background task that sweeps idle sessions every `every`.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start_sweeper(&self, idle: Duration, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut sweep_interval = interval(every);
            loop {
                sweep_interval.tick().await;
                registry.sweep_idle(idle).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{OpenSession, SessionSettings};
    use crate::test_helpers::{MockCreditLedger, MockImageStore};
    use retouch_core::{FormAction, TransformationType};

    async fn open(user_id: Uuid) -> TransformationSession {
        let ledger = Arc::new(MockCreditLedger::new());
        ledger.set_balance(user_id, 10);
        TransformationSession::open(
            OpenSession {
                action: FormAction::Add,
                transformation_type: TransformationType::Restore,
                user_id,
                image_id: None,
            },
            Arc::new(MockImageStore::new()),
            ledger,
            SessionSettings::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_sessions_are_scoped_to_owner() {
        let registry = SessionRegistry::new();
        let owner = Uuid::new_v4();
        let session = registry.insert(open(owner).await).await;

        assert!(registry.get(session.id(), owner).await.is_ok());
        assert!(matches!(
            registry.get(session.id(), Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(registry.remove(session.id(), Uuid::new_v4()).await.is_err());

        registry.remove(session.id(), owner).await.unwrap();
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_closes_only_idle_sessions() {
        let registry = SessionRegistry::new();
        let owner = Uuid::new_v4();
        let idle = registry.insert(open(owner).await).await;
        let active = registry.insert(open(owner).await).await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        registry.get(active.id(), owner).await.unwrap();
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert_eq!(registry.sweep_idle(Duration::from_secs(30)).await, 1);
        assert!(registry.get(idle.id(), owner).await.is_err());
        assert!(registry.get(active.id(), owner).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_closes_abandoned_sessions() {
        let registry = SessionRegistry::new();
        let owner = Uuid::new_v4();
        registry.insert(open(owner).await).await;

        let sweeper = registry.start_sweeper(Duration::from_secs(30), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(registry.len().await, 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(registry.len().await, 0);
        sweeper.abort();
    }
}
