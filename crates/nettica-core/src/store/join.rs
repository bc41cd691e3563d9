// ── Join store ──
//
// Accepting an invitation to someone else's account.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use nettica_api::ApiClient;
use nettica_api::models::Account;

use super::feedback::{Feedback, FeedbackSlot};
use crate::error::CoreError;

pub struct JoinStore {
    api: Arc<ApiClient>,
    feedback: FeedbackSlot,
    account: watch::Sender<Option<Arc<Account>>>,
}

impl JoinStore {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        let (account, _) = watch::channel(None);
        Self {
            api,
            feedback: FeedbackSlot::new("join"),
            account,
        }
    }

    /// Activate the invited account `id` and remember the result.
    pub async fn activate(&self, id: &str) -> Result<Arc<Account>, CoreError> {
        let account = self
            .api
            .activate(id)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;
        info!(id, email = %account.email, "account activated");

        let account = Arc::new(account);
        self.account
            .send_modify(|slot| *slot = Some(Arc::clone(&account)));
        self.feedback.clear();
        Ok(account)
    }

    /// The account activated last.
    pub fn account(&self) -> Option<Arc<Account>> {
        self.account.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Account>>> {
        self.account.subscribe()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback.current()
    }

    pub fn last_error(&self) -> Option<String> {
        self.feedback.last_error()
    }
}
