//! Background credit deduction with an observable outcome.
//!
//! Applying a transformation charges the user's balance without delaying the
//! config merge: the ledger call runs on its own task and reports through a
//! `watch` channel that callers may poll or await.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use utoipa::ToSchema;
use uuid::Uuid;

use retouch_db::CreditLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeductionStatus {
    Pending,
    Completed { balance: i64 },
    Failed { message: String },
}

impl DeductionStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, DeductionStatus::Pending)
    }
}

/// Handle on one in-flight or finished deduction.
#[derive(Debug, Clone)]
pub struct CreditDeduction {
    id: Uuid,
    fee: i64,
    status: watch::Receiver<DeductionStatus>,
}

impl CreditDeduction {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn fee(&self) -> i64 {
        self.fee
    }

    /// Current status without waiting.
    pub fn status(&self) -> DeductionStatus {
        self.status.borrow().clone()
    }

    /// Wait until the ledger call has finished.
    pub async fn settled(&self) -> DeductionStatus {
        let mut status = self.status.clone();
        let settled = match status.wait_for(DeductionStatus::is_settled).await {
            Ok(settled) => settled.clone(),
            Err(_) => DeductionStatus::Failed {
                message: "Credit deduction task ended without a result".to_string(),
            },
        };
        settled
    }
}

/// Apply `fee` to `user_id`'s balance on a background task.
///
/// `on_settled` runs on that task once the outcome is known, before the status
/// is published.
pub fn spawn_deduction<F>(
    ledger: Arc<dyn CreditLedger>,
    user_id: Uuid,
    fee: i64,
    on_settled: F,
) -> CreditDeduction
where
    F: FnOnce(&DeductionStatus) + Send + 'static,
{
    let id = Uuid::new_v4();
    let (tx, rx) = watch::channel(DeductionStatus::Pending);

    tokio::spawn(async move {
        let status = match ledger.update_credits(user_id, fee).await {
            Ok(balance) => {
                tracing::debug!(deduction_id = %id, user_id = %user_id, fee, balance, "Credits deducted");
                DeductionStatus::Completed { balance }
            }
            Err(e) => {
                tracing::warn!(deduction_id = %id, user_id = %user_id, fee, error = %e, "Credit deduction failed");
                DeductionStatus::Failed {
                    message: e.to_string(),
                }
            }
        };
        on_settled(&status);
        // Nobody listening is fine; the outcome was already logged.
        let _ = tx.send(status);
    });

    CreditDeduction {
        id,
        fee,
        status: rx,
    }
}
