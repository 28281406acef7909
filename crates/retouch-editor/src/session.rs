//! Transformation form session controller.
//!
//! A [`TransformationSession`] owns one user's editing state for one image:
//! staged edits, the committed config, debounced text input, background credit
//! deductions and the final save.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use retouch_core::constants::{transformation_route, DEFAULT_CREDIT_FEE, DEFAULT_DEBOUNCE_MS};
use retouch_core::models::UploadedImage;
use retouch_core::transform_url::DEFAULT_DELIVERY_BASE_URL;
use retouch_core::validation::InputField;
use retouch_core::{AppError, AspectRatioKey, Config, FormAction, ImageRecord, TransformationType};
use retouch_db::{CreditLedger, ImageStore};

use crate::credits::{spawn_deduction, CreditDeduction, DeductionStatus};
use crate::debounce::Debouncer;
use crate::state::{Controls, DeliverySettings, SessionState};

/// Tunables shared by every session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub credit_fee: i64,
    pub debounce: Duration,
    pub delivery: DeliverySettings,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        SessionSettings {
            credit_fee: config.credit_fee,
            debounce: Duration::from_millis(config.debounce_ms),
            delivery: DeliverySettings {
                base_url: config.delivery_base_url.clone(),
                cloud_name: config.cloud_name.clone(),
            },
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            credit_fee: DEFAULT_CREDIT_FEE,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            delivery: DeliverySettings {
                base_url: DEFAULT_DELIVERY_BASE_URL.to_string(),
                cloud_name: String::new(),
            },
        }
    }
}

/// Parameters for opening a session.
#[derive(Debug, Clone)]
pub struct OpenSession {
    pub action: FormAction,
    pub transformation_type: TransformationType,
    pub user_id: Uuid,
    /// Record to edit; required for [`FormAction::Update`].
    pub image_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Neither an existing record nor an uploaded image; nothing was written.
    Skipped,
    Saved {
        record: ImageRecord,
        redirect_path: String,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeductionView {
    pub id: Uuid,
    pub fee: i64,
    pub status: DeductionStatus,
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub state: SessionState,
    pub controls: Controls,
    pub preview_url: Option<String>,
    pub deductions: Vec<DeductionView>,
}

pub struct TransformationSession {
    id: Uuid,
    state: Arc<Mutex<SessionState>>,
    /// Bumped when a save resets the form; staging scheduled before that is stale.
    form_epoch: Arc<AtomicU64>,
    prompt_input: Debouncer,
    color_input: Debouncer,
    deductions: Mutex<Vec<CreditDeduction>>,
    images: Arc<dyn ImageStore>,
    ledger: Arc<dyn CreditLedger>,
    settings: SessionSettings,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TransformationSession {
    /// Load the record being edited (if any) and the user's balance, then
    /// build the initial state.
    #[tracing::instrument(skip(images, ledger, settings), fields(user_id = %params.user_id))]
    pub async fn open(
        params: OpenSession,
        images: Arc<dyn ImageStore>,
        ledger: Arc<dyn CreditLedger>,
        settings: SessionSettings,
    ) -> Result<Self, AppError> {
        let existing = match (params.action, params.image_id) {
            (FormAction::Add, None) => None,
            (FormAction::Add, Some(_)) => {
                return Err(AppError::BadRequest(
                    "An image id is only accepted when updating".to_string(),
                ))
            }
            (FormAction::Update, None) => {
                return Err(AppError::BadRequest(
                    "Updating requires the id of an existing image".to_string(),
                ))
            }
            (FormAction::Update, Some(id)) => {
                let record = images
                    .get(id)
                    .await?
                    .filter(|r| r.author_id == params.user_id)
                    .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
                if record.transformation_type != params.transformation_type {
                    return Err(AppError::BadRequest(format!(
                        "Image {} was made with {}, not {}",
                        id, record.transformation_type, params.transformation_type
                    )));
                }
                Some(record)
            }
        };

        let balance = ledger.balance(params.user_id).await?;
        let state = SessionState::new(
            params.action,
            params.transformation_type,
            params.user_id,
            existing,
            balance,
            settings.credit_fee,
        );

        let id = Uuid::new_v4();
        tracing::info!(
            session_id = %id,
            action = ?params.action,
            transformation_type = %params.transformation_type,
            credit_balance = balance,
            "Transformation session opened"
        );

        Ok(TransformationSession {
            id,
            state: Arc::new(Mutex::new(state)),
            form_epoch: Arc::new(AtomicU64::new(0)),
            prompt_input: Debouncer::new(settings.debounce),
            color_input: Debouncer::new(settings.debounce),
            deductions: Mutex::new(Vec::new()),
            images,
            ledger,
            settings,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        lock(&self.state).user_id
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn controls(&self) -> Controls {
        lock(&self.state).controls()
    }

    /// URL of the committed config applied to the current image.
    pub fn preview_url(&self) -> Option<String> {
        lock(&self.state).transformation_url(&self.settings.delivery)
    }

    pub fn deductions(&self) -> Vec<CreditDeduction> {
        self.deductions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn view(&self) -> SessionView {
        let state = self.snapshot();
        SessionView {
            id: self.id,
            controls: state.controls(),
            preview_url: state.transformation_url(&self.settings.delivery),
            deductions: self
                .deductions()
                .iter()
                .map(|d| DeductionView {
                    id: d.id(),
                    fee: d.fee(),
                    status: d.status(),
                })
                .collect(),
            state,
        }
    }

    fn transition<F>(&self, f: F) -> Result<(), AppError>
    where
        F: FnOnce(&SessionState) -> Result<SessionState, AppError>,
    {
        let mut state = lock(&self.state);
        *state = f(&state)?;
        Ok(())
    }

    /// Select an aspect ratio preset by key (e.g. "3:4").
    pub fn on_select_field(&self, value: &str) -> Result<(), AppError> {
        let key: AspectRatioKey = value.parse()?;
        self.transition(|s| s.select_aspect_ratio(key))?;
        tracing::debug!(session_id = %self.id, aspect_ratio = %key, "Aspect ratio selected");
        Ok(())
    }

    /// Update `field` now and stage it into the pending delta under
    /// `transformation_type` once typing pauses for the debounce window.
    pub fn on_input_change(
        &self,
        field: InputField,
        value: &str,
        transformation_type: TransformationType,
    ) -> Result<(), AppError> {
        let epoch = {
            let mut state = lock(&self.state);
            *state = state.set_field(field, value)?;
            self.form_epoch.load(Ordering::SeqCst)
        };

        let state = Arc::clone(&self.state);
        let form_epoch = Arc::clone(&self.form_epoch);
        let session_id = self.id;
        let value = value.to_string();
        let debouncer = match field {
            InputField::Prompt => &self.prompt_input,
            InputField::Color => &self.color_input,
        };
        debouncer.call(move || {
            let mut state = lock(&state);
            if form_epoch.load(Ordering::SeqCst) != epoch {
                tracing::debug!(session_id = %session_id, field = %field, "Discarding input typed before the form reset");
                return;
            }
            *state = state.stage_field(field, &value, transformation_type);
            tracing::debug!(session_id = %session_id, field = %field, "Input staged");
        });
        Ok(())
    }

    pub fn set_title(&self, title: &str) -> Result<(), AppError> {
        self.transition(|s| s.set_title(title))
    }

    /// Attach an uploaded image.
    pub fn set_image(&self, upload: UploadedImage) -> Result<(), AppError> {
        tracing::debug!(session_id = %self.id, public_id = %upload.public_id, "Image attached");
        self.transition(|s| Ok(s.set_image(upload)))
    }

    /// Commit the pending delta and charge the user in the background.
    ///
    /// The merge is complete when this returns; the returned handle reports
    /// the deduction separately. Apply stays disabled until
    /// [`on_preview_ready`](Self::on_preview_ready).
    pub fn on_transform(&self) -> Result<CreditDeduction, AppError> {
        let (user_id, fee, preview_url) = {
            let mut state = lock(&self.state);
            *state = state.apply_transform()?;
            (
                state.user_id,
                state.credit_fee,
                state.transformation_url(&self.settings.delivery),
            )
        };
        tracing::info!(
            session_id = %self.id,
            preview_url = preview_url.as_deref().unwrap_or_default(),
            "Transformation applied"
        );

        let state = Arc::clone(&self.state);
        let deduction = spawn_deduction(Arc::clone(&self.ledger), user_id, fee, move |status| {
            if let DeductionStatus::Completed { balance } = status {
                let mut state = lock(&state);
                *state = state.with_balance(*balance);
            }
        });
        self.deductions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(deduction.clone());
        Ok(deduction)
    }

    /// The client finished loading (or gave up on) the transformed preview.
    pub fn on_preview_ready(&self) {
        let mut state = lock(&self.state);
        *state = state.preview_ready();
        tracing::debug!(session_id = %self.id, "Preview ready");
    }

    /// Persist the session as a new record (Add) or over the edited one (Update).
    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn on_submit(&self) -> Result<SubmitOutcome, AppError> {
        let (user_id, submission) = {
            let mut state = lock(&self.state);
            match state.begin_submit(&self.settings.delivery)? {
                None => {
                    tracing::debug!("Nothing to save");
                    return Ok(SubmitOutcome::Skipped);
                }
                Some((submitting, submission)) => {
                    *state = submitting;
                    (state.user_id, submission)
                }
            }
        };

        let result = match submission.record_id {
            None => {
                self.images
                    .create(user_id, submission.payload, &submission.revalidate_path)
                    .await
            }
            Some(id) => {
                self.images
                    .update(id, user_id, submission.payload, &submission.revalidate_path)
                    .await
            }
        };

        let mut state = lock(&self.state);
        match result {
            Ok(record) => {
                *state = state.finish_submit(&record);
                if submission.action == FormAction::Add {
                    self.form_epoch.fetch_add(1, Ordering::SeqCst);
                    self.prompt_input.cancel();
                    self.color_input.cancel();
                }
                let redirect_path = transformation_route(record.id);
                tracing::info!(image_id = %record.id, action = ?submission.action, "Image saved");
                Ok(SubmitOutcome::Saved {
                    record,
                    redirect_path,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, action = ?submission.action, "Failed to save image");
                *state = state.fail_submit(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;
    use crate::test_helpers::{MockCreditLedger, MockImageStore, StoreCall};
    use retouch_core::ImagePayload;
    use serde_json::json;

    struct Harness {
        images: Arc<MockImageStore>,
        ledger: Arc<MockCreditLedger>,
        user_id: Uuid,
    }

    impl Harness {
        fn new(balance: i64) -> Self {
            let ledger = Arc::new(MockCreditLedger::new());
            let user_id = Uuid::new_v4();
            ledger.set_balance(user_id, balance);
            Harness {
                images: Arc::new(MockImageStore::new()),
                ledger,
                user_id,
            }
        }

        async fn open(
            &self,
            action: FormAction,
            transformation_type: TransformationType,
            image_id: Option<Uuid>,
            fee: i64,
        ) -> Result<TransformationSession, AppError> {
            let settings = SessionSettings {
                credit_fee: fee,
                debounce: Duration::from_millis(1000),
                delivery: DeliverySettings {
                    base_url: "https://res.cloudinary.com".to_string(),
                    cloud_name: "demo".to_string(),
                },
            };
            TransformationSession::open(
                OpenSession {
                    action,
                    transformation_type,
                    user_id: self.user_id,
                    image_id,
                },
                self.images.clone(),
                self.ledger.clone(),
                settings,
            )
            .await
        }

        fn existing(&self, transformation_type: TransformationType) -> ImageRecord {
            let record = ImageRecord::from_payload(
                Uuid::new_v4(),
                self.user_id,
                ImagePayload {
                    title: "Portrait".to_string(),
                    transformation_type,
                    public_id: "samples/portrait".to_string(),
                    secure_url: "https://example.com/portrait.jpg".to_string(),
                    width: Some(1000),
                    height: Some(1000),
                    config: json!({}),
                    transformation_url: None,
                    aspect_ratio: None,
                    color: None,
                    prompt: Some("hat".to_string()),
                },
            );
            self.images.add_image(record.clone());
            record
        }
    }

    fn upload() -> UploadedImage {
        UploadedImage {
            public_id: "samples/dog".to_string(),
            secure_url: "https://example.com/dog.jpg".to_string(),
            width: 640,
            height: 480,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_color_burst_stages_only_last_value() {
        let h = Harness::new(10);
        let session = h
            .open(FormAction::Add, TransformationType::Recolor, None, -1)
            .await
            .unwrap();

        session
            .on_input_change(InputField::Color, "red", TransformationType::Recolor)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        session
            .on_input_change(InputField::Color, "blue", TransformationType::Recolor)
            .unwrap();

        assert_eq!(session.snapshot().form.color.as_deref(), Some("blue"));
        assert!(session.snapshot().pending.is_none());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            session.snapshot().pending,
            Some(json!({ "recolor": { "to": "blue" } }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_and_color_debounce_independently() {
        let h = Harness::new(10);
        let session = h
            .open(FormAction::Add, TransformationType::Recolor, None, -1)
            .await
            .unwrap();

        session
            .on_input_change(InputField::Prompt, "car", TransformationType::Recolor)
            .unwrap();
        session
            .on_input_change(InputField::Color, "green", TransformationType::Recolor)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(
            session.snapshot().pending,
            Some(json!({ "recolor": { "prompt": "car", "to": "green" } }))
        );
    }

    #[tokio::test]
    async fn test_submit_without_data_or_image_is_skipped() {
        let h = Harness::new(10);
        let session = h
            .open(FormAction::Add, TransformationType::Fill, None, -1)
            .await
            .unwrap();
        session.on_select_field("1:1").unwrap();

        assert!(matches!(session.on_submit().await.unwrap(), SubmitOutcome::Skipped));
        assert!(h.images.calls().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_credits_block_everything() {
        let h = Harness::new(0);
        let session = h
            .open(FormAction::Add, TransformationType::Restore, None, -10)
            .await
            .unwrap();
        session.set_image(upload()).unwrap();

        assert!(session.controls().insufficient_credits);
        assert!(matches!(
            session.on_transform().unwrap_err(),
            AppError::InsufficientCredits { balance: 0, fee: -10 }
        ));
        assert!(matches!(
            session.on_submit().await.unwrap_err(),
            AppError::InsufficientCredits { .. }
        ));
        assert!(h.images.calls().is_empty());
        assert_eq!(h.ledger.balance_of(h.user_id), Some(0));
    }

    #[tokio::test]
    async fn test_update_fill_hides_apply() {
        let h = Harness::new(10);
        let record = h.existing(TransformationType::Fill);
        let session = h
            .open(FormAction::Update, TransformationType::Fill, Some(record.id), -1)
            .await
            .unwrap();

        assert!(!session.controls().apply_visible);
        assert_eq!(session.snapshot().form.title, "Portrait");
    }

    #[tokio::test]
    async fn test_transform_merges_and_deducts_in_background() {
        let h = Harness::new(3);
        let session = h
            .open(FormAction::Add, TransformationType::RemoveBackground, None, -1)
            .await
            .unwrap();
        session.set_image(upload()).unwrap();
        assert!(session.controls().apply_enabled);

        let deduction = session.on_transform().unwrap();
        let state = session.snapshot();
        assert_eq!(state.committed, json!({ "removeBackground": true }));
        assert!(state.pending.is_none());
        assert_eq!(state.phase, Phase::Previewing);
        assert!(!session.controls().apply_enabled);
        assert_eq!(
            session.preview_url().as_deref(),
            Some("https://res.cloudinary.com/demo/image/upload/e_background_removal/c_limit,w_640/f_auto/q_auto/samples/dog")
        );

        assert_eq!(deduction.settled().await, DeductionStatus::Completed { balance: 2 });
        assert_eq!(session.snapshot().credit_balance, 2);
        assert_eq!(session.view().deductions.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_deduction_keeps_merge() {
        let h = Harness::new(3);
        h.ledger.fail_updates(true);
        let session = h
            .open(FormAction::Add, TransformationType::Restore, None, -1)
            .await
            .unwrap();
        session.set_image(upload()).unwrap();

        let deduction = session.on_transform().unwrap();
        assert!(matches!(deduction.settled().await, DeductionStatus::Failed { .. }));
        assert_eq!(session.snapshot().committed, json!({ "restore": true }));
        assert_eq!(session.snapshot().credit_balance, 3);
    }

    #[tokio::test]
    async fn test_add_submit_creates_and_redirects() {
        let h = Harness::new(10);
        let session = h
            .open(FormAction::Add, TransformationType::Restore, None, -1)
            .await
            .unwrap();
        session.set_title("Grandma").unwrap();
        session.set_image(upload()).unwrap();
        session.on_transform().unwrap();

        let SubmitOutcome::Saved { record, redirect_path } = session.on_submit().await.unwrap()
        else {
            panic!("expected the image to be saved");
        };
        assert_eq!(redirect_path, format!("/transformations/{}", record.id));
        assert_eq!(record.title, "Grandma");
        assert_eq!(record.config, json!({ "restore": true }));
        assert_eq!(
            h.images.calls(),
            vec![StoreCall::Create {
                author_id: h.user_id,
                revalidate_path: "/".to_string(),
            }]
        );
        assert_eq!(session.snapshot().phase, Phase::Idle);
        assert_eq!(session.snapshot().form.title, "");
    }

    #[tokio::test]
    async fn test_update_submit_revalidates_record_route() {
        let h = Harness::new(10);
        let record = h.existing(TransformationType::Remove);
        let session = h
            .open(FormAction::Update, TransformationType::Remove, Some(record.id), -1)
            .await
            .unwrap();
        session.set_title("Portrait without hat").unwrap();

        let outcome = session.on_submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Saved { .. }));
        assert_eq!(
            h.images.calls(),
            vec![StoreCall::Update {
                id: record.id,
                author_id: h.user_id,
                revalidate_path: format!("/transformations/{}", record.id),
            }]
        );
        assert_eq!(h.images.image(record.id).unwrap().title, "Portrait without hat");
    }

    #[tokio::test]
    async fn test_failed_submit_enters_error_phase() {
        let h = Harness::new(10);
        h.images.fail_writes(true);
        let session = h
            .open(FormAction::Add, TransformationType::Restore, None, -1)
            .await
            .unwrap();
        session.set_image(upload()).unwrap();

        assert!(session.on_submit().await.is_err());
        let state = session.snapshot();
        assert_eq!(state.phase, Phase::Error);
        assert!(state.last_error.is_some());
        assert!(session.controls().save_enabled);
    }

    #[tokio::test]
    async fn test_open_update_rejects_foreign_or_missing_image() {
        let h = Harness::new(10);
        let missing = h
            .open(FormAction::Update, TransformationType::Fill, Some(Uuid::new_v4()), -1)
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let other = Harness::new(10);
        let foreign = other.existing(TransformationType::Fill);
        h.images.add_image(foreign.clone());
        let result = h
            .open(FormAction::Update, TransformationType::Fill, Some(foreign.id), -1)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let no_id = h.open(FormAction::Update, TransformationType::Fill, None, -1).await;
        assert!(matches!(no_id, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_aspect_ratio_is_invalid_input() {
        let h = Harness::new(10);
        let session = h
            .open(FormAction::Add, TransformationType::Fill, None, -1)
            .await
            .unwrap();
        assert!(matches!(
            session.on_select_field("16:9").unwrap_err(),
            AppError::InvalidInput(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_typed_before_add_save_is_not_staged_afterwards() {
        let h = Harness::new(10);
        let session = h
            .open(FormAction::Add, TransformationType::Recolor, None, -1)
            .await
            .unwrap();
        session.set_image(upload()).unwrap();
        session
            .on_input_change(InputField::Color, "blue", TransformationType::Recolor)
            .unwrap();

        let outcome = session.on_submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Saved { .. }));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let state = session.snapshot();
        assert_eq!(state.form.color.as_deref(), Some(""));
        assert!(!state.image.is_present());
        assert!(state.pending.is_none());
        assert!(!session.controls().apply_enabled);

        session
            .on_input_change(InputField::Color, "green", TransformationType::Recolor)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            session.snapshot().pending,
            Some(json!({ "recolor": { "to": "green" } }))
        );
    }

    #[tokio::test]
    async fn test_apply_waits_for_preview_ready() {
        let h = Harness::new(10);
        let session = h
            .open(FormAction::Add, TransformationType::Recolor, None, -1)
            .await
            .unwrap();
        session.set_image(upload()).unwrap();
        session.transition(|s| {
            Ok(s.stage_field(InputField::Color, "red", TransformationType::Recolor))
        })
        .unwrap();

        session.on_transform().unwrap();
        let controls = session.controls();
        assert!(!controls.apply_enabled);
        assert_eq!(controls.apply_label, crate::state::APPLYING_LABEL);

        session.transition(|s| {
            Ok(s.stage_field(InputField::Color, "blue", TransformationType::Recolor))
        })
        .unwrap();
        assert!(matches!(session.on_transform().unwrap_err(), AppError::Conflict(_)));

        session.on_preview_ready();
        assert!(session.controls().apply_enabled);
        session.on_transform().unwrap();
        assert_eq!(
            session.snapshot().committed,
            json!({ "recolor": { "to": "blue" } })
        );
    }
}
