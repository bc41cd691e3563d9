// Account endpoints
//
// Accounts are scoped by an account id rather than listed globally, and
// carry their own sub-resources (users, limits) and lifecycle calls
// (invite, activate).

use tracing::debug;

use crate::auth::Target;
use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Account, Limits};

impl ApiClient {
    /// Accounts reachable from `id` (the account itself plus the
    /// organisations it belongs to).
    ///
    /// `GET /accounts/{id}`
    pub async fn account_tree(&self, id: &str) -> Result<Vec<Account>, Error> {
        debug!(id, "listing accounts");
        self.get(Target::Primary, &format!("/accounts/{id}")).await
    }

    /// Members of account `id`.
    ///
    /// `GET /accounts/{id}/users`
    pub async fn account_users(&self, id: &str) -> Result<Vec<Account>, Error> {
        debug!(id, "listing account users");
        self.get(Target::Primary, &format!("/accounts/{id}/users"))
            .await
    }

    /// Usage and quotas of account `id`.
    ///
    /// `GET /accounts/{id}/limits`
    pub async fn account_limits(&self, id: &str) -> Result<Limits, Error> {
        debug!(id, "reading account limits");
        self.get(Target::Primary, &format!("/accounts/{id}/limits"))
            .await
    }

    /// Invite a new member.
    ///
    /// `POST /accounts/`
    pub async fn create_account(&self, account: &Account) -> Result<Account, Error> {
        debug!(email = %account.email, "creating account");
        self.post(Target::Primary, "/accounts/", account).await
    }

    /// Re-send the invitation e-mail for account `id`.
    ///
    /// `GET /accounts/{id}/invite`
    pub async fn invite(&self, id: &str) -> Result<(), Error> {
        debug!(id, "sending invite");
        self.get_discard(Target::Primary, &format!("/accounts/{id}/invite"))
            .await
    }

    /// Accept an invitation.
    ///
    /// `POST /accounts/{id}/activate`
    pub async fn activate(&self, id: &str) -> Result<Account, Error> {
        debug!(id, "activating account");
        self.post_empty(Target::Primary, &format!("/accounts/{id}/activate"))
            .await
    }
}
