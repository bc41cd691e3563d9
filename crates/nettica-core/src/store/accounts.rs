// ── Account store ──
//
// Accounts are not one flat collection: the console shows the caller's
// account tree, the users of an account, per-account member lists and
// per-account limits. Each lives in its own reactive collection; the
// per-account ones are keyed by the parent account id.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use nettica_api::ApiClient;
use nettica_api::Target;
use nettica_api::models::{Account, Limits};

use super::collection::{ResourceCollection, Scoped, Snapshot};
use super::feedback::{Feedback, FeedbackSlot};
use crate::error::CoreError;
use crate::stream::EntityStream;

const KIND: &str = "account";

pub struct AccountStore {
    api: Arc<ApiClient>,
    feedback: FeedbackSlot,
    /// Most recently created account.
    account: watch::Sender<Option<Arc<Account>>>,
    accounts: ResourceCollection<Account>,
    users: ResourceCollection<Account>,
    members: ResourceCollection<Scoped<Vec<Account>>>,
    limits: ResourceCollection<Scoped<Limits>>,
}

impl AccountStore {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        let (account, _) = watch::channel(None);
        Self {
            api,
            feedback: FeedbackSlot::new(KIND),
            account,
            accounts: ResourceCollection::new(),
            users: ResourceCollection::new(),
            members: ResourceCollection::new(),
            limits: ResourceCollection::new(),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Load the account tree visible from account `id`.
    pub async fn read_all(&self, id: &str) -> Result<Snapshot<Account>, CoreError> {
        let accounts = self
            .api
            .account_tree(id)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;
        self.accounts.replace_all(accounts);
        self.feedback.clear();
        Ok(self.accounts.snapshot())
    }

    /// Load the users of account `id` into the flat user list.
    pub async fn read_users(&self, id: &str) -> Result<Snapshot<Account>, CoreError> {
        let users = self
            .api
            .account_users(id)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;
        self.users.replace_all(users);
        self.feedback.clear();
        Ok(self.users.snapshot())
    }

    /// Load the members of account `id`, replacing that account's list.
    pub async fn read_members(&self, id: &str) -> Result<Vec<Account>, CoreError> {
        let members = self
            .api
            .account_users(id)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;
        self.members.upsert(Scoped {
            account_id: id.to_owned(),
            value: members.clone(),
        });
        self.feedback.clear();
        Ok(members)
    }

    /// Load the limits of account `id`.
    ///
    /// Accounts without a plan have no limits, so failures are returned
    /// but never recorded as feedback.
    pub async fn read_limits(&self, id: &str) -> Result<Limits, CoreError> {
        match self.api.account_limits(id).await {
            Ok(limits) => {
                self.limits.upsert(Scoped {
                    account_id: id.to_owned(),
                    value: limits.clone(),
                });
                Ok(limits)
            }
            Err(e) => {
                debug!(id, error = %e, "no limits for account");
                Err(e.into())
            }
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create (invite) an account and remember it as the last created.
    pub async fn create(&self, account: &Account) -> Result<Arc<Account>, CoreError> {
        let created = self
            .api
            .create_account(account)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;
        let created = Arc::new(created);
        self.account
            .send_modify(|slot| *slot = Some(Arc::clone(&created)));
        self.accounts.upsert(Account::clone(&created));
        self.feedback
            .notice(format!("Account for {} created", account.email));
        Ok(created)
    }

    /// PATCH an account, then reconcile every cached list holding it.
    ///
    /// Any tree entry with the same id is replaced, root or not; only the
    /// local `update_account` reconcile is restricted to roots.
    pub async fn update(&self, account: &Account) -> Result<Arc<Account>, CoreError> {
        let updated: Account = self
            .api
            .update(Target::Primary, account)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;

        let in_members = self.reconcile_member(&updated);
        let in_accounts = self.accounts.replace(updated.clone());
        let in_users = self.users.replace(updated.clone());
        if !(in_members || in_accounts || in_users) {
            return Err(self
                .feedback
                .fail(CoreError::not_found("update", KIND, &updated.id)));
        }

        self.feedback.notice(format!("{} updated", account.email));
        Ok(Arc::new(updated))
    }

    /// DELETE an account and drop it from every cached list.
    pub async fn delete(&self, account: &Account) -> Result<(), CoreError> {
        self.api
            .remove::<Account>(Target::Primary, &account.id)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;

        let in_accounts = self.accounts.remove(&account.id).is_some();
        let in_users = self.users.remove(&account.id).is_some();
        let in_members = self.drop_member(&account.id);
        if !(in_accounts || in_users || in_members) {
            return Err(self
                .feedback
                .fail(CoreError::not_found("delete", KIND, &account.id)));
        }

        self.feedback.notice(format!("{} deleted", account.email));
        Ok(())
    }

    /// Re-send the invitation e-mail.
    pub async fn email(&self, account: &Account) -> Result<(), CoreError> {
        self.api
            .invite(&account.id)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;
        self.feedback
            .notice(format!("Email to {} sent", account.email));
        Ok(())
    }

    // ── Local reconciliation ─────────────────────────────────────────

    /// Replace a root account in the account tree. Accounts that are not
    /// roots (`id != parent`) are skipped.
    pub fn update_account(&self, account: Account) -> Result<(), CoreError> {
        if !account.is_root() {
            debug!(id = %account.id, "not a root account, skipping");
            return Ok(());
        }
        let id = account.id.clone();
        if self.accounts.replace(account) {
            Ok(())
        } else {
            Err(self.feedback.fail(CoreError::not_found("update", KIND, id)))
        }
    }

    pub fn update_user(&self, user: Account) -> Result<(), CoreError> {
        let id = user.id.clone();
        if self.users.replace(user) {
            Ok(())
        } else {
            Err(self.feedback.fail(CoreError::not_found("update", "user", id)))
        }
    }

    /// Replace `member` in every member list that contains it.
    pub fn update_member(&self, member: &Account) -> Result<(), CoreError> {
        if self.reconcile_member(member) {
            Ok(())
        } else {
            Err(self
                .feedback
                .fail(CoreError::not_found("update", "member", &member.id)))
        }
    }

    /// Replace the cached limits of `limits.account_id`.
    pub fn update_limit(&self, limits: Limits) -> Result<(), CoreError> {
        let account_id = limits.account_id.clone();
        let replaced = self.limits.replace(Scoped {
            account_id: account_id.clone(),
            value: limits,
        });
        if replaced {
            Ok(())
        } else {
            Err(self
                .feedback
                .fail(CoreError::not_found("update", "limit", account_id)))
        }
    }

    pub fn delete_account(&self, id: &str) -> Result<(), CoreError> {
        if self.accounts.remove(id).is_some() {
            Ok(())
        } else {
            Err(self.feedback.fail(CoreError::not_found("delete", KIND, id)))
        }
    }

    pub fn delete_user(&self, id: &str) -> Result<(), CoreError> {
        if self.users.remove(id).is_some() {
            Ok(())
        } else {
            Err(self.feedback.fail(CoreError::not_found("delete", "user", id)))
        }
    }

    /// Remove member `id` from every member list.
    pub fn delete_member(&self, id: &str) -> Result<(), CoreError> {
        if self.drop_member(id) {
            Ok(())
        } else {
            Err(self
                .feedback
                .fail(CoreError::not_found("delete", "member", id)))
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The account returned by the last successful `create`.
    pub fn account(&self) -> Option<Arc<Account>> {
        self.account.borrow().clone()
    }

    pub fn accounts(&self) -> Snapshot<Account> {
        self.accounts.snapshot()
    }

    pub fn users(&self) -> Snapshot<Account> {
        self.users.snapshot()
    }

    /// Member list of account `id`, if loaded.
    pub fn members(&self, id: &str) -> Option<Vec<Account>> {
        self.members.get(id).map(|m| m.value.clone())
    }

    /// Limits of account `id`, if loaded.
    pub fn limits(&self, id: &str) -> Option<Limits> {
        self.limits.get(id).map(|l| l.value.clone())
    }

    pub fn subscribe_accounts(&self) -> EntityStream<Account> {
        EntityStream::new(self.accounts.subscribe())
    }

    pub fn subscribe_users(&self) -> EntityStream<Account> {
        EntityStream::new(self.users.subscribe())
    }

    pub fn subscribe_members(&self) -> EntityStream<Scoped<Vec<Account>>> {
        EntityStream::new(self.members.subscribe())
    }

    pub fn subscribe_limits(&self) -> EntityStream<Scoped<Limits>> {
        EntityStream::new(self.limits.subscribe())
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback.current()
    }

    pub fn last_error(&self) -> Option<String> {
        self.feedback.last_error()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn reconcile_member(&self, member: &Account) -> bool {
        self.members.modify(|groups| {
            let mut found = false;
            for group in groups {
                let Some(index) = group.value.iter().position(|m| m.id == member.id) else {
                    continue;
                };
                Arc::make_mut(group).value[index] = member.clone();
                found = true;
            }
            found
        })
    }

    fn drop_member(&self, id: &str) -> bool {
        self.members.modify(|groups| {
            let mut found = false;
            for group in groups {
                if group.value.iter().any(|m| m.id == id) {
                    Arc::make_mut(group).value.retain(|m| m.id != id);
                    found = true;
                }
            }
            found
        })
    }
}
