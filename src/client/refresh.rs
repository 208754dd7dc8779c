//! Single-flight refresh of the access credential.
//!
//! The coordinator is either idle or refreshing. While a refresh exchange is in
//! flight every further caller attaches to it and receives its outcome; no second
//! exchange is started. The exchange itself is the only place the refresh flow
//! writes to the credential store.

use super::SessionEvent;
use crate::auth::{RefreshRequest, RefreshResponse};
use crate::error::ClientError;
use crate::session::CredentialStore;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

type PendingRefresh = Shared<BoxFuture<'static, Result<String, ClientError>>>;

enum RefreshState {
    Idle,
    Refreshing(PendingRefresh),
}

pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    url: String,
    credentials: Arc<CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
    state: Mutex<RefreshState>,
    exchanges: AtomicUsize,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        url: String,
        credentials: Arc<CredentialStore>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                url,
                credentials,
                events,
                state: Mutex::new(RefreshState::Idle),
                exchanges: AtomicUsize::new(0),
            }),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.state.lock(), RefreshState::Refreshing(_))
    }

    /// Number of refresh exchanges sent to the server so far.
    pub fn exchanges(&self) -> usize {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    /// Obtains a fresh access token after `rejected` was refused by the server.
    ///
    /// If the stored token already differs from `rejected`, another caller's refresh
    /// has completed in the meantime and the stored token is returned as is.
    ///
    /// # Returns
    /// The new access token, or `ClientError::SessionExpired` once the store has been
    /// cleared because the exchange failed.
    pub async fn refresh(&self, rejected: Option<&str>) -> Result<String, ClientError> {
        let pending = {
            let mut state = self.inner.state.lock();
            let in_flight = match &*state {
                RefreshState::Refreshing(pending) => Some(pending.clone()),
                RefreshState::Idle => None,
            };
            match in_flight {
                Some(pending) => {
                    log::debug!("Refresh already in flight, waiting on it");
                    pending
                }
                None => {
                    match self.inner.credentials.access_token() {
                        // Already cleared by an earlier failed exchange.
                        None => return Err(ClientError::SessionExpired),
                        Some(current) if rejected != Some(current.as_str()) => return Ok(current),
                        Some(_) => {}
                    }
                    let pending = Inner::exchange(Arc::clone(&self.inner)).boxed().shared();
                    *state = RefreshState::Refreshing(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }
}

impl Inner {
    async fn exchange(inner: Arc<Inner>) -> Result<String, ClientError> {
        let outcome = match inner.request_new_access().await {
            Ok(response) => inner
                .credentials
                .update_access(response.access_token, response.refresh_token),
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok(credential) => {
                log::info!("Access token refreshed");
                let _ = inner.events.send(SessionEvent::Refreshed);
                Ok(credential.access_token)
            }
            Err(e) => {
                log::warn!("Token refresh failed, ending session: {}", e);
                if let Err(clear_err) = inner.credentials.clear() {
                    log::error!("Failed to erase stored session: {}", clear_err);
                }
                let _ = inner.events.send(SessionEvent::Expired);
                Err(ClientError::SessionExpired)
            }
        };

        *inner.state.lock() = RefreshState::Idle;
        result
    }

    async fn request_new_access(&self) -> Result<RefreshResponse, ClientError> {
        let refresh_token = self
            .credentials
            .refresh_token()
            .ok_or(ClientError::SessionExpired)?;

        self.exchanges.fetch_add(1, Ordering::SeqCst);
        log::debug!("POST {}", self.url);
        let response = self
            .http
            .post(&self.url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status, &body));
        }
        Ok(response.json::<RefreshResponse>().await?)
    }
}
