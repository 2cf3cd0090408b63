//! HTTP implementation of [`MediaBackend`] for Emby-compatible servers.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::descriptor::BackendDescriptor;
use crate::error::{BackendError, Result};
use crate::traits::MediaBackend;
use crate::types::{CreatedAccount, FavoriteItem, RemoteUser};

/// Connect timeout applied to every handle.
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Total request timeout applied to every handle.
const REQUEST_TIMEOUT_SECS: u64 = 10;
/// Retries for transient failures (network error, timeout).
const DEFAULT_MAX_RETRIES: u32 = 1;
/// Length of generated account passwords.
const PASSWORD_LEN: usize = 10;

/// Emby REST API client bound to one [`BackendDescriptor`].
pub struct EmbyBackend {
    id: String,
    base_url: String,
    api_key: String,
    client: Client,
    max_retries: u32,
}

impl EmbyBackend {
    /// Build a handle from a descriptor. Purely local, no network round-trip.
    pub fn new(descriptor: &BackendDescriptor) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::NetworkError {
                backend: descriptor.id.clone(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            id: descriptor.id.clone(),
            base_url: descriptor.base_url.clone(),
            api_key: descriptor.api_key.clone(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/emby{path}", self.base_url)
    }

    fn network_error(&self, detail: impl ToString) -> BackendError {
        BackendError::NetworkError {
            backend: self.id.clone(),
            detail: detail.to_string(),
        }
    }

    fn parse_error(&self, detail: impl ToString) -> BackendError {
        BackendError::ParseError {
            backend: self.id.clone(),
            detail: detail.to_string(),
        }
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// Business errors (auth, not-found, bad request) are never retried.
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let mut attempt = 0;
        loop {
            let builder = match request.try_clone() {
                Some(b) => b,
                // Streaming bodies cannot be cloned; fall through without retry.
                None => return self.execute_once(request).await,
            };

            match self.execute_once(builder).await {
                Ok(out) => return Ok(out),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = Duration::from_millis(100 * 2_u64.pow(attempt));
                    log::warn!(
                        "[{}] Transient error, retrying in {backoff:?}: {e}",
                        self.id
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute_once(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        backend: self.id.clone(),
                        detail: e.to_string(),
                    }
                } else {
                    self.network_error(e)
                }
            })?;

        let status = response.status();
        log::debug!("[{}] Response status: {status}", self.id);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::InvalidApiKey {
                backend: self.id.clone(),
            });
        }
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.network_error(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.network_error(format!("failed to read response body: {e}")))?;
        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| {
            log::error!("[{}] JSON parse failed: {e}", self.id);
            self.parse_error(e)
        })
    }

    fn status_error(&self, status: StatusCode, body: String) -> BackendError {
        BackendError::ApiError {
            backend: self.id.clone(),
            status: status.as_u16(),
            detail: body,
        }
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect()
}

// ===== Emby wire types =====

#[derive(Deserialize)]
struct EmbyUser {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Policy", default)]
    policy: Option<EmbyPolicy>,
}

#[derive(Deserialize, Default)]
struct EmbyPolicy {
    #[serde(rename = "IsDisabled", default)]
    is_disabled: bool,
}

#[derive(Deserialize)]
struct EmbyItems {
    #[serde(rename = "Items", default)]
    items: Vec<EmbyItem>,
}

#[derive(Deserialize)]
struct EmbyItem {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Deserialize)]
struct EmbySession {
    #[serde(rename = "NowPlayingItem", default)]
    now_playing: Option<serde_json::Value>,
}

impl From<EmbyUser> for RemoteUser {
    fn from(user: EmbyUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            disabled: user.policy.map(|p| p.is_disabled).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl MediaBackend for EmbyBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_user(&self, name: &str, days: i64) -> Result<CreatedAccount> {
        let request = self
            .client
            .post(self.url("/Users/New"))
            .json(&serde_json::json!({ "Name": name }));
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(self.status_error(status, body));
        }
        let user: EmbyUser = self.decode(&body)?;

        let password = generate_password();
        let request = self
            .client
            .post(self.url(&format!("/Users/{}/Password", user.id)))
            .json(&serde_json::json!({ "NewPw": password }));
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            // Leave no half-provisioned account behind.
            let _ = self.delete_user(&user.id).await;
            return Err(self.status_error(status, body));
        }

        log::info!("[{}] Created account '{name}' ({})", self.id, user.id);
        Ok(CreatedAccount {
            account_id: user.id,
            password,
            expires_at: Utc::now() + ChronoDuration::days(days),
        })
    }

    async fn delete_user(&self, account_id: &str) -> Result<()> {
        let request = self.client.delete(self.url(&format!("/Users/{account_id}")));
        let (status, body) = self.execute(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::UserNotFound {
                backend: self.id.clone(),
                account_id: account_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(self.status_error(status, body));
        }
        log::info!("[{}] Deleted account {account_id}", self.id);
        Ok(())
    }

    async fn set_policy(&self, account_id: &str, disable: bool) -> Result<()> {
        let request = self
            .client
            .post(self.url(&format!("/Users/{account_id}/Policy")))
            .json(&serde_json::json!({ "IsDisabled": disable }));
        let (status, body) = self.execute(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::UserNotFound {
                backend: self.id.clone(),
                account_id: account_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(self.status_error(status, body));
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<RemoteUser>> {
        let request = self.client.get(self.url("/Users"));
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(self.status_error(status, body));
        }
        let users: Vec<EmbyUser> = self.decode(&body)?;
        Ok(users.into_iter().map(RemoteUser::from).collect())
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<RemoteUser>> {
        let users = self.list_users().await?;
        Ok(users.into_iter().find(|u| u.name.eq_ignore_ascii_case(name)))
    }

    async fn list_favorites(&self, account_id: &str) -> Result<Vec<FavoriteItem>> {
        let request = self
            .client
            .get(self.url(&format!("/Users/{account_id}/Items")))
            .query(&[("Filters", "IsFavorite"), ("Recursive", "true")]);
        let (status, body) = self.execute(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::UserNotFound {
                backend: self.id.clone(),
                account_id: account_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(self.status_error(status, body));
        }
        let items: EmbyItems = self.decode(&body)?;
        Ok(items
            .items
            .into_iter()
            .map(|i| FavoriteItem {
                item_id: i.id,
                item_name: i.name,
            })
            .collect())
    }

    async fn playing_count(&self) -> Result<u64> {
        let request = self.client.get(self.url("/Sessions"));
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(self.status_error(status, body));
        }
        let sessions: Vec<EmbySession> = self.decode(&body)?;
        Ok(sessions.iter().filter(|s| s.now_playing.is_some()).count() as u64)
    }
}
