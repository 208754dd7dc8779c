use crate::auth::{LoginRequest, LoginResponse, RefreshRequest, RegisterRequest};
use crate::client::{ApiClient, ApiRequest, SessionEvent};
use crate::error::ClientError;
use crate::models::UserProfile;
use crate::session::Credential;
use validator::Validate;

impl ApiClient {
    /// Logs in with email and password and stores the resulting session.
    ///
    /// ## Responses:
    /// - the authenticated user's profile on success;
    /// - `Validation` if the email or password is malformed (no request is sent);
    /// - `Unauthorized` if the server rejects the credentials.
    pub async fn login(&self, request: &LoginRequest) -> Result<UserProfile, ClientError> {
        request.validate()?;
        let response: LoginResponse = self
            .send_anonymous(&ApiRequest::post("/auth/login").json(request)?)
            .await?;
        self.start_session(response)
    }

    /// Creates an account and logs straight into it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ClientError> {
        request.validate()?;
        let response: LoginResponse = self
            .send_anonymous(&ApiRequest::post("/auth/registration").json(request)?)
            .await?;
        self.start_session(response)
    }

    /// Ends the session. The server is told first, but the local session is
    /// cleared whether or not that call succeeds.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(refresh_token) = self.credentials().refresh_token() {
            let request = ApiRequest::post("/auth/logout").json(&RefreshRequest { refresh_token })?;
            if let Err(e) = self.send_empty(&request).await {
                log::warn!("Server-side logout failed: {}", e);
            }
        }
        self.credentials().clear()?;
        self.emit(SessionEvent::LoggedOut);
        log::info!("Logged out");
        Ok(())
    }

    /// `GET /auth/user`: reloads the profile of the logged-in user.
    pub async fn current_user(&self) -> Result<UserProfile, ClientError> {
        let profile: UserProfile = self.send_json(&ApiRequest::get("/auth/user")).await?;
        self.credentials().set_profile(profile.clone())?;
        Ok(profile)
    }

    fn start_session(&self, response: LoginResponse) -> Result<UserProfile, ClientError> {
        let credential = Credential::new(response.access_token, response.refresh_token);
        self.credentials().set(credential, response.user.clone())?;
        log::info!("Logged in as {}", response.user.email);
        self.emit(SessionEvent::LoggedIn {
            email: response.user.email.clone(),
        });
        Ok(response.user)
    }
}
