//! Authenticated request gateway.
//!
//! Every call to the API goes through [`ApiClient::send`]. The gateway attaches the
//! current access token, and when the server answers 401 it drives the refresh
//! protocol and retries the request exactly once. A second 401 for the same request
//! ends the session.

pub mod refresh;
pub mod request;

pub use refresh::RefreshCoordinator;
pub use request::ApiRequest;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::CredentialStore;
use chrono::Utc;
use request::Attempt;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Session lifecycle notifications. `Expired` is the signal to send the user back
/// to the login surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { email: String },
    Refreshed,
    Expired,
    LoggedOut,
}

pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::Client,
    credentials: Arc<CredentialStore>,
    refresher: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, credentials: Arc<CredentialStore>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let (events, _) = broadcast::channel(16);
        let refresher = RefreshCoordinator::new(
            http.clone(),
            config.endpoint_url("/auth/token/refresh"),
            Arc::clone(&credentials),
            events.clone(),
        );
        Ok(Self {
            config,
            http,
            credentials,
            refresher,
            events,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Sends an authenticated request.
    ///
    /// ## Behavior:
    /// - attaches `Authorization: Bearer <access token>` when a session exists;
    /// - on 401, refreshes through the [`RefreshCoordinator`] and retries once;
    /// - on a second 401, clears the session and returns `SessionExpired`;
    /// - any other error status is returned as is, never retried.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut attempt = Attempt::Original;
        let mut token = self.usable_token().await?;

        loop {
            let response = self.execute(request, token.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Self::check(response).await;
            }

            match attempt.next() {
                Some(next) => {
                    log::debug!(
                        "{} {} returned 401, refreshing credentials",
                        request.method,
                        request.path
                    );
                    let refreshed = self.refresher.refresh(token.as_deref()).await?;
                    token = Some(refreshed);
                    attempt = next;
                }
                None => {
                    log::warn!(
                        "{} {} rejected again after refresh, ending session",
                        request.method,
                        request.path
                    );
                    self.expire_session();
                    return Err(ClientError::SessionExpired);
                }
            }
        }
    }

    /// Sends an authenticated request and decodes the JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Sends an authenticated request whose response body is not needed.
    pub async fn send_empty(&self, request: &ApiRequest) -> Result<(), ClientError> {
        self.send(request).await?;
        Ok(())
    }

    /// Sends a request without credentials and outside the refresh protocol, as
    /// used by login and registration. A 401 here is `ClientError::Unauthorized`.
    pub async fn send_anonymous<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let response = self.execute(request, None).await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// The token to send first. A token already known to be expired is refreshed
    /// before use instead of letting the server reject it.
    async fn usable_token(&self) -> Result<Option<String>, ClientError> {
        match self.credentials.get() {
            Some(credential) if credential.is_expired(Utc::now()) => {
                log::debug!("Access token expired locally, refreshing before sending");
                let refreshed = self
                    .refresher
                    .refresh(Some(credential.access_token.as_str()))
                    .await?;
                Ok(Some(refreshed))
            }
            Some(credential) => Ok(Some(credential.access_token)),
            None => Ok(None),
        }
    }

    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ClientError> {
        let url = self.config.endpoint_url(&request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        log::debug!("{} {}", request.method, url);
        builder.send().await.map_err(|e| {
            log::warn!("{} {} failed without a response: {}", request.method, url, e);
            ClientError::Network(e.to_string())
        })
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status, &body))
    }

    pub(crate) fn expire_session(&self) {
        if let Err(e) = self.credentials.clear() {
            log::error!("Failed to erase stored session: {}", e);
        }
        self.emit(SessionEvent::Expired);
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}
