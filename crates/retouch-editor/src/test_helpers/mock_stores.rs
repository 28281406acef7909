//! Mock store implementations for testing
//!
//! These mocks allow testing sessions without database dependencies.

use async_trait::async_trait;
use retouch_core::{AppError, ImagePayload, ImageRecord};
use retouch_db::{CreditLedger, ImageStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One recorded write against [`MockImageStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create {
        author_id: Uuid,
        revalidate_path: String,
    },
    Update {
        id: Uuid,
        author_id: Uuid,
        revalidate_path: String,
    },
}

/// Mock image store for testing without database
#[derive(Clone, Default)]
pub struct MockImageStore {
    images: Arc<Mutex<HashMap<Uuid, ImageRecord>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image(&self, image: ImageRecord) {
        self.images.lock().unwrap().insert(image.id, image);
    }

    pub fn image(&self, id: Uuid) -> Option<ImageRecord> {
        self.images.lock().unwrap().get(&id).cloned()
    }

    pub fn images(&self) -> Vec<ImageRecord> {
        self.images.lock().unwrap().values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every subsequent create/update fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("image store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn create(
        &self,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError> {
        self.calls.lock().unwrap().push(StoreCall::Create {
            author_id,
            revalidate_path: revalidate_path.to_string(),
        });
        self.check_writable()?;

        let record = ImageRecord::from_payload(Uuid::new_v4(), author_id, payload);
        self.add_image(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError> {
        self.calls.lock().unwrap().push(StoreCall::Update {
            id,
            author_id,
            revalidate_path: revalidate_path.to_string(),
        });
        self.check_writable()?;

        let mut images = self.images.lock().unwrap();
        let record = images
            .get_mut(&id)
            .filter(|r| r.author_id == author_id)
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
        record.apply_payload(payload);
        Ok(record.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>, AppError> {
        Ok(self.image(id))
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImageRecord>, AppError> {
        let mut records: Vec<ImageRecord> = self
            .images()
            .into_iter()
            .filter(|r| r.author_id == author_id)
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

/// Mock credit ledger for testing without database
#[derive(Clone, Default)]
pub struct MockCreditLedger {
    balances: Arc<Mutex<HashMap<Uuid, i64>>>,
    fail_updates: Arc<AtomicBool>,
}

impl MockCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, user_id: Uuid, balance: i64) {
        self.balances.lock().unwrap().insert(user_id, balance);
    }

    pub fn balance_of(&self, user_id: Uuid) -> Option<i64> {
        self.balances.lock().unwrap().get(&user_id).copied()
    }

    /// Make every subsequent credit update fail
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CreditLedger for MockCreditLedger {
    async fn balance(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.balance_of(user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn update_credits(&self, user_id: Uuid, fee: i64) -> Result<i64, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("ledger unavailable".to_string()));
        }
        let mut balances = self.balances.lock().unwrap();
        let balance = balances
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        *balance += fee;
        Ok(*balance)
    }
}
