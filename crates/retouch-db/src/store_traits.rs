//! Store trait abstractions for the transformation editor
//!
//! These traits define the minimal interface an editing session needs from
//! persistence, allowing sessions to be tested without a database.

use async_trait::async_trait;
use retouch_core::{AppError, ImagePayload, ImageRecord};
use uuid::Uuid;

use crate::db::{ImageRepository, UserRepository};

/// Create/update operations on image records
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist a new record owned by `author_id`
    async fn create(
        &self,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError>;

    /// Overwrite the record `id` owned by `author_id`
    async fn update(
        &self,
        id: Uuid,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError>;

    /// Load a record for editing
    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>, AppError>;

    /// Records owned by `author_id`, most recently updated first
    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImageRecord>, AppError>;
}

/// Credit balance owned by the user-management collaborator
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn balance(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Apply a signed delta and return the resulting balance
    async fn update_credits(&self, user_id: Uuid, fee: i64) -> Result<i64, AppError>;
}

#[async_trait]
impl ImageStore for ImageRepository {
    async fn create(
        &self,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError> {
        ImageRepository::create(self, author_id, payload, revalidate_path).await
    }

    async fn update(
        &self,
        id: Uuid,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError> {
        ImageRepository::update(self, id, author_id, payload, revalidate_path).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>, AppError> {
        self.get_by_id(id).await
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImageRecord>, AppError> {
        ImageRepository::list_by_author(self, author_id, limit, offset).await
    }
}

#[async_trait]
impl CreditLedger for UserRepository {
    async fn balance(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.get_credit_balance(user_id).await
    }

    async fn update_credits(&self, user_id: Uuid, fee: i64) -> Result<i64, AppError> {
        UserRepository::update_credits(self, user_id, fee).await
    }
}
