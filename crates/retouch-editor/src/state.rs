//! Session state and its transitions.
//!
//! Every transition takes the current state by reference and returns the next
//! one; nothing here touches the network, the clock or the store. The async
//! controller in [`crate::session`] swaps states under its lock.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use retouch_core::constants::{aspect_ratio_option, default_config, transformation_route};
use retouch_core::models::UploadedImage;
use retouch_core::validation::{FormValues, InputField};
use retouch_core::{
    deep_merge, AppError, AspectRatioKey, FormAction, ImagePayload, ImageRecord,
    TransformationType, TransformationUrlBuilder,
};

pub const APPLY_LABEL: &str = "Apply Transformation";
pub const APPLYING_LABEL: &str = "Transforming...";
pub const SAVE_LABEL: &str = "Save Image";
pub const SAVING_LABEL: &str = "Submitting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Editing,
    Previewing,
    Submitting,
    Error,
}

/// Image being transformed, as uploaded or loaded from an existing record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ImageDraft {
    pub public_id: Option<String>,
    pub secure_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<AspectRatioKey>,
}

impl ImageDraft {
    fn from_upload(upload: UploadedImage) -> Self {
        ImageDraft {
            public_id: Some(upload.public_id),
            secure_url: Some(upload.secure_url),
            width: Some(upload.width),
            height: Some(upload.height),
            aspect_ratio: None,
        }
    }

    fn from_record(record: &ImageRecord) -> Self {
        ImageDraft {
            public_id: Some(record.public_id.clone()),
            secure_url: Some(record.secure_url.clone()),
            width: record.width.and_then(|w| u32::try_from(w).ok()),
            height: record.height.and_then(|h| u32::try_from(h).ok()),
            aspect_ratio: record
                .aspect_ratio
                .as_deref()
                .and_then(|key| key.parse().ok()),
        }
    }

    pub fn is_present(&self) -> bool {
        self.public_id.is_some()
    }
}

/// Where the hosted image service delivers transformed images.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub base_url: String,
    pub cloud_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionState {
    pub action: FormAction,
    pub transformation_type: TransformationType,
    pub user_id: Uuid,
    /// Record being edited; `None` while adding.
    #[serde(skip)]
    pub existing: Option<ImageRecord>,
    pub image: ImageDraft,
    pub form: FormValues,
    #[schema(value_type = Option<Object>)]
    pub pending: Option<JsonValue>,
    #[schema(value_type = Object)]
    pub committed: JsonValue,
    pub phase: Phase,
    pub is_transforming: bool,
    pub is_submitting: bool,
    pub credit_balance: i64,
    pub credit_fee: i64,
    pub last_error: Option<String>,
}

/// Derived button and modal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Controls {
    pub apply_visible: bool,
    pub apply_enabled: bool,
    pub apply_label: String,
    pub save_enabled: bool,
    pub save_label: String,
    pub insufficient_credits: bool,
    pub show_aspect_ratio: bool,
    pub show_prompt: bool,
    pub show_color: bool,
}

/// Everything needed to persist the session once.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub action: FormAction,
    pub record_id: Option<Uuid>,
    pub payload: ImagePayload,
    pub revalidate_path: String,
}

impl SessionState {
    pub fn new(
        action: FormAction,
        transformation_type: TransformationType,
        user_id: Uuid,
        existing: Option<ImageRecord>,
        credit_balance: i64,
        credit_fee: i64,
    ) -> Self {
        let (image, form, committed) = match &existing {
            Some(record) => (
                ImageDraft::from_record(record),
                FormValues::from_record(record),
                record.config.clone(),
            ),
            None => (ImageDraft::default(), FormValues::defaults(), json!({})),
        };

        let state = SessionState {
            action,
            transformation_type,
            user_id,
            existing,
            image,
            form,
            pending: None,
            committed,
            phase: Phase::Idle,
            is_transforming: false,
            is_submitting: false,
            credit_balance,
            credit_fee,
            last_error: None,
        };
        state.stage_defaults_for_image()
    }

    pub fn has_insufficient_credits(&self) -> bool {
        self.credit_balance < self.credit_fee.abs()
    }

    fn ensure_credits(&self) -> Result<(), AppError> {
        if self.has_insufficient_credits() {
            return Err(AppError::InsufficientCredits {
                balance: self.credit_balance,
                fee: self.credit_fee,
            });
        }
        Ok(())
    }

    fn apply_hidden(&self) -> bool {
        self.action == FormAction::Update
            && matches!(
                self.transformation_type,
                TransformationType::Fill | TransformationType::RemoveBackground
            )
    }

    pub fn controls(&self) -> Controls {
        let t = self.transformation_type;
        Controls {
            apply_visible: !self.apply_hidden(),
            apply_enabled: self.pending.is_some() && !self.is_transforming,
            apply_label: if self.is_transforming {
                APPLYING_LABEL
            } else {
                APPLY_LABEL
            }
            .to_string(),
            save_enabled: !self.is_submitting,
            save_label: if self.is_submitting {
                SAVING_LABEL
            } else {
                SAVE_LABEL
            }
            .to_string(),
            insufficient_credits: self.has_insufficient_credits(),
            show_aspect_ratio: t == TransformationType::Fill,
            show_prompt: matches!(t, TransformationType::Remove | TransformationType::Recolor),
            show_color: t == TransformationType::Recolor,
        }
    }

    /// Stage the full default config of types without parameter fields.
    fn stage_defaults_for_image(mut self) -> Self {
        if self.transformation_type.stages_on_image() && self.image.is_present() {
            self.pending = Some(default_config(self.transformation_type));
        }
        self
    }

    /// Choose an aspect ratio preset (generative fill only).
    pub fn select_aspect_ratio(&self, key: AspectRatioKey) -> Result<Self, AppError> {
        if self.transformation_type != TransformationType::Fill {
            return Err(AppError::BadRequest(format!(
                "Aspect ratio cannot be selected for {} transformations",
                self.transformation_type
            )));
        }
        let option = aspect_ratio_option(key);

        let mut next = self.clone();
        next.image.aspect_ratio = Some(key);
        next.image.width = Some(option.width);
        next.image.height = Some(option.height);
        next.pending = Some(default_config(self.transformation_type));
        next.form.aspect_ratio = Some(key.as_str().to_string());
        next.phase = Phase::Editing;
        Ok(next)
    }

    /// Update a free-text form field. Staging happens separately once the
    /// edit settles.
    pub fn set_field(&self, field: InputField, value: &str) -> Result<Self, AppError> {
        let allowed = match field {
            InputField::Prompt => self.controls().show_prompt,
            InputField::Color => self.controls().show_color,
        };
        if !allowed {
            return Err(AppError::BadRequest(format!(
                "Field {} does not apply to {} transformations",
                field, self.transformation_type
            )));
        }

        let mut next = self.clone();
        next.form.set(field, value);
        next.form.validate()?;
        next.phase = Phase::Editing;
        Ok(next)
    }

    /// Merge one parameter into the pending delta under `transformation_type`.
    pub fn stage_field(
        &self,
        field: InputField,
        value: &str,
        transformation_type: TransformationType,
    ) -> Self {
        let key = transformation_type.config_key();
        let param = field.config_param();
        let delta = json!({ key: { param: value } });
        let base = self.pending.clone().unwrap_or_else(|| json!({}));

        let mut next = self.clone();
        next.pending = Some(deep_merge(&base, &delta));
        next.phase = Phase::Editing;
        next
    }

    pub fn set_title(&self, title: &str) -> Result<Self, AppError> {
        let mut next = self.clone();
        next.form.title = title.to_string();
        next.form.validate()?;
        next.phase = Phase::Editing;
        Ok(next)
    }

    pub fn set_image(&self, upload: UploadedImage) -> Self {
        let mut next = self.clone();
        next.form.public_id = upload.public_id.clone();
        next.image = ImageDraft::from_upload(upload);
        next.is_transforming = false;
        next.phase = Phase::Editing;
        next.stage_defaults_for_image()
    }

    /// Commit the pending delta (pending wins) and clear it. The state stays
    /// transforming until [`SessionState::preview_ready`] reports the new
    /// preview rendered.
    pub fn apply_transform(&self) -> Result<Self, AppError> {
        self.ensure_credits()?;
        if self.apply_hidden() {
            return Err(AppError::BadRequest(format!(
                "{} transformations cannot be re-applied while updating",
                self.transformation_type
            )));
        }
        if self.is_transforming {
            return Err(AppError::Conflict(
                "A transformation is already being applied".to_string(),
            ));
        }
        let Some(pending) = self.pending.as_ref() else {
            return Err(AppError::BadRequest(
                "There is no pending transformation to apply".to_string(),
            ));
        };

        let mut next = self.clone();
        next.committed = deep_merge(&self.committed, pending);
        next.pending = None;
        next.is_transforming = true;
        next.phase = Phase::Previewing;
        Ok(next)
    }

    /// The preview of the committed config finished loading (or failed to).
    pub fn preview_ready(&self) -> Self {
        let mut next = self.clone();
        next.is_transforming = false;
        next
    }

    /// Record an authoritative balance reported by the ledger.
    pub fn with_balance(&self, balance: i64) -> Self {
        let mut next = self.clone();
        next.credit_balance = balance;
        next
    }

    /// Delivery URL of the committed config applied to the current image.
    pub fn transformation_url(&self, delivery: &DeliverySettings) -> Option<String> {
        let public_id = self.image.public_id.as_deref()?;
        let mut builder =
            TransformationUrlBuilder::from_config(self.transformation_type, &self.committed)
                .resize(self.image.width, self.image.height);
        if let Some(key) = self.image.aspect_ratio {
            builder = builder.aspect_ratio(key.as_str());
        }
        Some(builder.build(&delivery.base_url, &delivery.cloud_name, public_id))
    }

    /// Enter the submitting phase, or `Ok(None)` when there is neither an
    /// existing record nor an uploaded image to save.
    pub fn begin_submit(
        &self,
        delivery: &DeliverySettings,
    ) -> Result<Option<(Self, Submission)>, AppError> {
        self.ensure_credits()?;
        if self.existing.is_none() && !self.image.is_present() {
            return Ok(None);
        }
        if self.is_submitting {
            return Err(AppError::Conflict(
                "The image is already being saved".to_string(),
            ));
        }
        self.form.validate()?;

        let existing = self.existing.as_ref();
        let public_id = self
            .image
            .public_id
            .clone()
            .or_else(|| existing.map(|r| r.public_id.clone()))
            .unwrap_or_default();
        let secure_url = self
            .image
            .secure_url
            .clone()
            .or_else(|| existing.map(|r| r.secure_url.clone()))
            .unwrap_or_default();

        let payload = ImagePayload {
            title: self.form.title.clone(),
            transformation_type: self.transformation_type,
            public_id,
            secure_url,
            width: self.image.width.and_then(|w| i32::try_from(w).ok()),
            height: self.image.height.and_then(|h| i32::try_from(h).ok()),
            config: self.committed.clone(),
            transformation_url: self.transformation_url(delivery),
            aspect_ratio: non_empty(&self.form.aspect_ratio),
            color: non_empty(&self.form.color),
            prompt: non_empty(&self.form.prompt),
        };

        let record_id = match self.action {
            FormAction::Add => None,
            FormAction::Update => Some(
                existing
                    .map(|r| r.id)
                    .ok_or_else(|| AppError::BadRequest("Nothing to update".to_string()))?,
            ),
        };
        let revalidate_path = match record_id {
            Some(id) => transformation_route(id),
            None => retouch_core::constants::ADD_REVALIDATE_PATH.to_string(),
        };

        let mut next = self.clone();
        next.is_submitting = true;
        next.phase = Phase::Submitting;
        next.last_error = None;

        Ok(Some((
            next,
            Submission {
                action: self.action,
                record_id,
                payload,
                revalidate_path,
            },
        )))
    }

    /// Settle a successful save. Adding resets the form for the next image;
    /// updating keeps editing the saved record.
    pub fn finish_submit(&self, record: &ImageRecord) -> Self {
        let mut next = self.clone();
        next.is_submitting = false;
        next.phase = Phase::Idle;
        match self.action {
            FormAction::Add => {
                next.form = FormValues::defaults();
                next.image = ImageDraft::default();
                next.pending = None;
                next.is_transforming = false;
            }
            FormAction::Update => {
                next.existing = Some(record.clone());
            }
        }
        next
    }

    /// Settle a failed save; the committed config is kept.
    pub fn fail_submit(&self, error: &AppError) -> Self {
        let mut next = self.clone();
        next.is_submitting = false;
        next.phase = Phase::Error;
        next.last_error = Some(error.to_string());
        next
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> DeliverySettings {
        DeliverySettings {
            base_url: "https://res.cloudinary.com".to_string(),
            cloud_name: "demo".to_string(),
        }
    }

    fn upload() -> UploadedImage {
        UploadedImage {
            public_id: "samples/cat".to_string(),
            secure_url: "https://res.cloudinary.com/demo/image/upload/samples/cat".to_string(),
            width: 800,
            height: 600,
        }
    }

    fn adding(transformation_type: TransformationType) -> SessionState {
        SessionState::new(
            FormAction::Add,
            transformation_type,
            Uuid::new_v4(),
            None,
            10,
            -1,
        )
    }

    fn record(transformation_type: TransformationType) -> ImageRecord {
        ImageRecord::from_payload(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ImagePayload {
                title: "Beach".to_string(),
                transformation_type,
                public_id: "samples/beach".to_string(),
                secure_url: "https://example.com/beach.jpg".to_string(),
                width: Some(1000),
                height: Some(1334),
                config: json!({ "fillBackground": true }),
                transformation_url: None,
                aspect_ratio: Some("3:4".to_string()),
                color: None,
                prompt: None,
            },
        )
    }

    #[test]
    fn test_apply_enabled_tracks_pending_delta() {
        let state = adding(TransformationType::Recolor);
        assert!(!state.controls().apply_enabled);

        let staged = state.stage_field(InputField::Color, "blue", TransformationType::Recolor);
        assert!(staged.controls().apply_enabled);

        let applied = staged.apply_transform().unwrap();
        assert!(!applied.controls().apply_enabled);
        assert_eq!(applied.controls().apply_label, APPLYING_LABEL);

        let applied = applied.preview_ready();
        assert!(!applied.controls().apply_enabled);
        assert_eq!(applied.controls().apply_label, APPLY_LABEL);
    }

    #[test]
    fn test_apply_hidden_for_fill_and_background_updates() {
        for t in TransformationType::ALL {
            let existing = record(t);
            let state = SessionState::new(FormAction::Update, t, existing.author_id, Some(existing), 10, -1);
            let hidden = matches!(t, TransformationType::Fill | TransformationType::RemoveBackground);
            assert_eq!(state.controls().apply_visible, !hidden, "type {}", t);
            assert!(adding(t).controls().apply_visible);
        }
    }

    #[test]
    fn test_stage_field_keys_by_type_and_param() {
        let state = adding(TransformationType::Recolor)
            .stage_field(InputField::Prompt, "shirt", TransformationType::Recolor)
            .stage_field(InputField::Color, "red", TransformationType::Recolor)
            .stage_field(InputField::Color, "blue", TransformationType::Recolor);
        assert_eq!(
            state.pending,
            Some(json!({ "recolor": { "prompt": "shirt", "to": "blue" } }))
        );
    }

    #[test]
    fn test_select_aspect_ratio_stages_defaults_and_dimensions() {
        let state = adding(TransformationType::Fill)
            .select_aspect_ratio(AspectRatioKey::PhonePortrait)
            .unwrap();
        assert_eq!(state.image.width, Some(1000));
        assert_eq!(state.image.height, Some(1778));
        assert_eq!(state.form.aspect_ratio.as_deref(), Some("9:16"));
        assert_eq!(state.pending, Some(json!({ "fillBackground": true })));
        assert_eq!(state.phase, Phase::Editing);
    }

    #[test]
    fn test_select_aspect_ratio_rejected_for_other_types() {
        let err = adding(TransformationType::Remove)
            .select_aspect_ratio(AspectRatioKey::Square)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_set_field_rejects_fields_the_type_does_not_show() {
        let err = adding(TransformationType::Remove)
            .set_field(InputField::Color, "red")
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_set_image_auto_stages_parameterless_types() {
        for t in [TransformationType::Restore, TransformationType::RemoveBackground] {
            let state = adding(t);
            assert!(state.pending.is_none());
            let state = state.set_image(upload());
            assert_eq!(state.pending, Some(default_config(t)));
            assert_eq!(state.form.public_id, "samples/cat");
        }

        let state = adding(TransformationType::Recolor).set_image(upload());
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_transform_merges_pending_over_committed() {
        let mut state = adding(TransformationType::Remove);
        state.committed = json!({ "remove": { "prompt": "cat", "removeShadow": true } });
        let state = state
            .stage_field(InputField::Prompt, "dog", TransformationType::Remove)
            .apply_transform()
            .unwrap();

        assert_eq!(
            state.committed,
            json!({ "remove": { "prompt": "dog", "removeShadow": true } })
        );
        assert!(state.pending.is_none());
        assert_eq!(state.phase, Phase::Previewing);
    }

    #[test]
    fn test_transform_without_pending_is_rejected() {
        let err = adding(TransformationType::Recolor).apply_transform().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_insufficient_credits_blocks_transform_and_submit() {
        let mut state = adding(TransformationType::Restore).set_image(upload());
        state.credit_balance = 0;
        state.credit_fee = -10;

        assert!(state.controls().insufficient_credits);
        assert!(matches!(
            state.apply_transform().unwrap_err(),
            AppError::InsufficientCredits { balance: 0, fee: -10 }
        ));
        assert!(matches!(
            state.begin_submit(&delivery()).unwrap_err(),
            AppError::InsufficientCredits { .. }
        ));
    }

    #[test]
    fn test_balance_equal_to_fee_is_sufficient() {
        let mut state = adding(TransformationType::Restore);
        state.credit_balance = 10;
        state.credit_fee = -10;
        assert!(!state.controls().insufficient_credits);
    }

    #[test]
    fn test_submit_without_data_or_image_is_skipped() {
        let state = adding(TransformationType::Fill)
            .select_aspect_ratio(AspectRatioKey::Square)
            .unwrap();
        assert!(state.begin_submit(&delivery()).unwrap().is_none());
    }

    #[test]
    fn test_add_submission_payload() {
        let state = adding(TransformationType::Restore)
            .set_title("Old photo")
            .unwrap()
            .set_image(upload())
            .apply_transform()
            .unwrap();

        let (next, submission) = state.begin_submit(&delivery()).unwrap().unwrap();
        assert_eq!(next.phase, Phase::Submitting);
        assert_eq!(next.controls().save_label, SAVING_LABEL);
        assert_eq!(submission.action, FormAction::Add);
        assert_eq!(submission.record_id, None);
        assert_eq!(submission.revalidate_path, "/");

        let payload = submission.payload;
        assert_eq!(payload.title, "Old photo");
        assert_eq!(payload.public_id, "samples/cat");
        assert_eq!(payload.width, Some(800));
        assert_eq!(payload.config, json!({ "restore": true }));
        assert_eq!(payload.aspect_ratio, None);
        assert_eq!(
            payload.transformation_url.as_deref(),
            Some("https://res.cloudinary.com/demo/image/upload/e_gen_restore/c_limit,w_800/f_auto/q_auto/samples/cat")
        );
    }

    #[test]
    fn test_update_submission_targets_record_route() {
        let existing = record(TransformationType::Fill);
        let id = existing.id;
        let state = SessionState::new(
            FormAction::Update,
            TransformationType::Fill,
            existing.author_id,
            Some(existing),
            10,
            -1,
        );

        let (_, submission) = state.begin_submit(&delivery()).unwrap().unwrap();
        assert_eq!(submission.record_id, Some(id));
        assert_eq!(submission.revalidate_path, format!("/transformations/{}", id));
        assert_eq!(submission.payload.aspect_ratio.as_deref(), Some("3:4"));
        assert_eq!(submission.payload.config, json!({ "fillBackground": true }));
    }

    #[test]
    fn test_second_submit_while_saving_conflicts() {
        let state = adding(TransformationType::Restore).set_image(upload());
        let (saving, _) = state.begin_submit(&delivery()).unwrap().unwrap();
        assert!(matches!(
            saving.begin_submit(&delivery()).unwrap_err(),
            AppError::Conflict(_)
        ));
    }

    #[test]
    fn test_failed_submit_keeps_committed_config() {
        let state = adding(TransformationType::Restore)
            .set_image(upload())
            .apply_transform()
            .unwrap();
        let (saving, _) = state.begin_submit(&delivery()).unwrap().unwrap();

        let failed = saving.fail_submit(&AppError::Internal("db down".to_string()));
        assert_eq!(failed.phase, Phase::Error);
        assert!(!failed.is_submitting);
        assert!(failed.last_error.as_deref().unwrap().contains("db down"));
        assert_eq!(failed.committed, json!({ "restore": true }));
    }

    #[test]
    fn test_successful_add_resets_form() {
        let state = adding(TransformationType::Restore)
            .set_title("Old photo")
            .unwrap()
            .set_image(upload());
        let (saving, submission) = state.begin_submit(&delivery()).unwrap().unwrap();
        let saved = ImageRecord::from_payload(Uuid::new_v4(), state.user_id, submission.payload);

        let done = saving.finish_submit(&saved);
        assert_eq!(done.phase, Phase::Idle);
        assert_eq!(done.form, FormValues::defaults());
        assert!(!done.image.is_present());
    }

    #[test]
    fn test_second_apply_conflicts_until_preview_ready() {
        let applied = adding(TransformationType::Recolor)
            .stage_field(InputField::Color, "red", TransformationType::Recolor)
            .apply_transform()
            .unwrap()
            .stage_field(InputField::Color, "blue", TransformationType::Recolor);
        assert!(applied.is_transforming);
        assert!(matches!(
            applied.apply_transform().unwrap_err(),
            AppError::Conflict(_)
        ));

        let reapplied = applied.preview_ready().apply_transform().unwrap();
        assert_eq!(reapplied.committed, json!({ "recolor": { "to": "blue" } }));
    }

    #[test]
    fn test_new_image_clears_transforming() {
        let state = adding(TransformationType::Restore)
            .set_image(upload())
            .apply_transform()
            .unwrap();
        assert!(state.is_transforming);
        assert!(!state.set_image(upload()).is_transforming);
    }
}
