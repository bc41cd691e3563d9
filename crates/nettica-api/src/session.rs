// Auth endpoints
//
// OAuth-style handshake: discover the authorization URL, optionally log in
// with basic credentials, then exchange the code for a bearer token.

use tracing::debug;

use crate::auth::Target;
use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{AuthUrl, BasicLogin, ExchangeRequest, LoginGrant, User};

impl ApiClient {
    /// The principal the primary token belongs to.
    ///
    /// `GET /auth/user`
    pub async fn current_user(&self) -> Result<User, Error> {
        self.get(Target::Primary, "/auth/user").await
    }

    /// Where to send the user for authorization.
    ///
    /// `GET /auth/oauth2_url`
    pub async fn oauth2_url(&self) -> Result<AuthUrl, Error> {
        self.get(Target::Primary, "/auth/oauth2_url").await
    }

    /// Basic-auth login. Returns a code to exchange, not a token.
    ///
    /// `POST /auth/login`
    pub async fn login(&self, body: &BasicLogin) -> Result<LoginGrant, Error> {
        debug!("logging in with basic credentials");
        self.post(Target::Primary, "/auth/login", body).await
    }

    /// Exchange an authorization code for a bearer token on `target`.
    ///
    /// `POST /auth/oauth2_exchange`
    pub async fn oauth2_exchange(
        &self,
        target: Target,
        body: &ExchangeRequest,
    ) -> Result<String, Error> {
        debug!(%target, "exchanging authorization code");
        self.post(target, "/auth/oauth2_exchange", body).await
    }

    /// Invalidate the primary token server-side.
    ///
    /// `GET /auth/logout`
    pub async fn logout(&self) -> Result<(), Error> {
        debug!("logging out");
        self.get_discard(Target::Primary, "/auth/logout").await
    }
}
