// ── Auth session ──
//
// Drives the OAuth-style handshake against the console and tracks the
// authenticated principal. Any failure collapses the session: every
// credential slot is destroyed and the user is dropped.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info};

use nettica_api::models::{BasicLogin, ExchangeRequest, User};
use nettica_api::{ApiClient, CredentialSlot, CredentialStore, Target};

use crate::error::CoreError;
use crate::store::{Feedback, FeedbackSlot};

/// `codeUrl` the server returns when OAuth is disabled and the user must
/// log in with a username and password.
pub const BASIC_LOGIN_URL: &str = "/login";

/// `codeUrl` the server returns when OAuth is disabled and the code can
/// be exchanged right away, without any redirect.
pub const NO_REDIRECT_SENTINEL: &str = "_magic_string_fake_auth_no_redirect_";

/// Progress of the handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AuthStatus {
    #[default]
    Unset,
    /// Basic-auth form requested.
    Basic,
    /// The user must be sent to `redirect_url`.
    Redirect,
    /// The server has OAuth switched off.
    Disabled,
    Success,
    Error,
}

/// What the caller should do next after starting a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlow {
    /// A token is in place and the user has been loaded.
    Authenticated,
    /// Navigate to `url` to continue.
    Redirect { url: String },
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub status: AuthStatus,
    pub redirect_url: Option<String>,
    /// Set by the routing layer for views that need a signed-in user.
    pub requires_auth: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            status: AuthStatus::Unset,
            redirect_url: None,
            requires_auth: true,
        }
    }
}

pub struct Session {
    api: Arc<ApiClient>,
    state: watch::Sender<SessionState>,
    feedback: FeedbackSlot,
}

impl Session {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            state,
            feedback: FeedbackSlot::new("session"),
        }
    }

    // ── Handshake ────────────────────────────────────────────────────

    /// Start a login.
    ///
    /// With a persisted token this only loads the user. Otherwise it asks
    /// the server how to authenticate and either returns a redirect or,
    /// when the server needs no user interaction, completes the exchange.
    pub async fn oauth2_url(&self) -> Result<AuthFlow, CoreError> {
        if self.credentials().get_present(CredentialSlot::Token).is_some() {
            debug!("token present, skipping authorization url");
            self.load_user().await?;
            return Ok(AuthFlow::Authenticated);
        }

        let auth = self
            .api
            .oauth2_url()
            .await
            .map_err(|e| self.collapse(e.into()))?;

        if let Some(client_id) = &auth.client_id {
            self.credentials().save(CredentialSlot::ClientId, client_id);
        }

        match auth.code_url.as_str() {
            BASIC_LOGIN_URL => {
                info!("server reports oauth2 disabled, basic auth");
                self.set_status(AuthStatus::Disabled);
                self.persist_state(auth.state.as_deref());
                Ok(self.redirect_to(BASIC_LOGIN_URL))
            }
            NO_REDIRECT_SENTINEL => {
                info!("server reports oauth2 disabled, exchanging without redirect");
                self.set_status(AuthStatus::Disabled);
                let state = auth.state.unwrap_or_default();
                self.oauth2_exchange(ExchangeRequest::new("", state)).await?;
                Ok(AuthFlow::Authenticated)
            }
            url => {
                self.persist_state(auth.state.as_deref());
                Ok(self.redirect_to(url))
            }
        }
    }

    /// Switch to the username/password form.
    pub fn basic_auth(&self) {
        self.set_status(AuthStatus::Basic);
    }

    /// Submit basic credentials. The server answers with a code that is
    /// persisted and then exchanged at the returned redirect URI.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthFlow, CoreError> {
        let credentials = self.credentials();
        let mut body = BasicLogin::new(username, password);
        body.client_id = credentials.get_present(CredentialSlot::ClientId);
        if let Some(state) = credentials.get_present(CredentialSlot::State) {
            body.state = state;
        }
        body.redirect_uri = credentials.get_present(CredentialSlot::RedirectUri);

        let grant = self
            .api
            .login(&body)
            .await
            .map_err(|e| self.collapse(e.into()))?;

        let slots = [
            (CredentialSlot::ClientId, &grant.client_id),
            (CredentialSlot::Code, &grant.code),
            (CredentialSlot::State, &grant.state),
            (CredentialSlot::RedirectUri, &grant.redirect_uri),
        ];
        for (slot, value) in slots {
            if let Some(value) = value {
                credentials.save(slot, value);
            }
        }

        Ok(self.redirect_to(grant.redirect_uri.as_deref().unwrap_or_default()))
    }

    /// Exchange an authorization code for a bearer token.
    ///
    /// With `request.server` set the token belongs to that federated
    /// server and is stored in the wild slots; the primary session is left
    /// alone. Otherwise the token becomes the primary token and the user
    /// is loaded.
    pub async fn oauth2_exchange(&self, mut request: ExchangeRequest) -> Result<(), CoreError> {
        let credentials = self.credentials();
        if request.client_id.is_none() {
            request.client_id = credentials.get(CredentialSlot::ClientId);
        }

        let target = match &request.server {
            Some(server) => {
                // A token from an earlier federation must not ride along.
                credentials.destroy(CredentialSlot::WildToken);
                credentials.save(CredentialSlot::WildServer, server);
                Target::Wild
            }
            None => Target::Primary,
        };

        let token = match self.api.oauth2_exchange(target, &request).await {
            Ok(token) => token,
            Err(e) => {
                match target {
                    Target::Wild => {
                        credentials.destroy(CredentialSlot::WildToken);
                        credentials.destroy(CredentialSlot::WildServer);
                    }
                    Target::Primary => credentials.destroy(CredentialSlot::Token),
                }
                return Err(self.collapse(e.into()));
            }
        };

        match target {
            Target::Wild => {
                credentials.save(CredentialSlot::WildToken, &token);
                self.set_status(AuthStatus::Success);
                Ok(())
            }
            Target::Primary => {
                credentials.save(CredentialSlot::Token, &token);
                credentials.destroy(CredentialSlot::ClientId);
                self.set_status(AuthStatus::Success);
                self.load_user().await?;
                Ok(())
            }
        }
    }

    /// Fetch the principal behind the primary token.
    pub async fn load_user(&self) -> Result<User, CoreError> {
        match self.api.current_user().await {
            Ok(user) => {
                info!(email = user.email.as_deref().unwrap_or_default(), "user loaded");
                self.state.send_modify(|s| s.user = Some(user.clone()));
                self.feedback.clear();
                Ok(user)
            }
            Err(e) => {
                let err = self.feedback.fail(e.into());
                self.clear_credentials();
                Err(err)
            }
        }
    }

    /// End the session.
    ///
    /// The server is told first; whatever it answers, every credential
    /// slot is destroyed and the user dropped. Safe to call repeatedly.
    pub async fn logout(&self) -> Result<(), CoreError> {
        let outcome = self.api.logout().await;
        self.clear_credentials();

        match outcome {
            Ok(()) => {
                info!("logged out");
                Ok(())
            }
            Err(e) => {
                self.set_status(AuthStatus::Unset);
                Err(self.feedback.fail(e.into()))
            }
        }
    }

    // ── Routing flags ────────────────────────────────────────────────

    pub fn requires_auth(&self) -> bool {
        self.state.borrow().requires_auth
    }

    pub fn set_requires_auth(&self, requires_auth: bool) {
        self.state.send_modify(|s| s.requires_auth = requires_auth);
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().user.is_some()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status
    }

    pub fn redirect_url(&self) -> Option<String> {
        self.state.borrow().redirect_url.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback.current()
    }

    pub fn last_error(&self) -> Option<String> {
        self.feedback.last_error()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.api.credentials()
    }

    fn set_status(&self, status: AuthStatus) {
        info!(%status, "auth status");
        self.state.send_modify(|s| s.status = status);
    }

    fn persist_state(&self, state: Option<&str>) {
        if let Some(state) = state {
            self.credentials().save(CredentialSlot::State, state);
        }
    }

    fn redirect_to(&self, url: &str) -> AuthFlow {
        self.state.send_modify(|s| {
            s.status = AuthStatus::Redirect;
            s.redirect_url = Some(url.to_owned());
        });
        info!(url, "auth redirect");
        AuthFlow::Redirect {
            url: url.to_owned(),
        }
    }

    /// Handshake failure: mark the error and drop everything.
    fn collapse(&self, err: CoreError) -> CoreError {
        self.set_status(AuthStatus::Error);
        let err = self.feedback.fail(err);
        self.clear_credentials();
        err
    }

    fn clear_credentials(&self) {
        self.credentials().clear();
        self.state.send_modify(|s| s.user = None);
    }
}
