use crate::error::backend::BackendError;
use crate::game_code::GameCode;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::sleep as TokioSleep;
use url::Url;

const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(10);
const RETRY_MAX_ELAPSED: Duration = Duration::from_secs(5);
const GET_BY_CODE_ENDPOINT: &str = "api/games/get_by_code";
const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Envelope every backend endpoint answers with.
#[derive(Debug, Deserialize)]
pub struct ServerResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Direct HTTP access to the game backend, used when no host bridge exists.
#[derive(Clone)]
pub struct BackendClient {
    base_url: Url,
    client: Client,
    retry_max_elapsed: Duration,
}

impl BackendClient {
    pub fn new(base_url_str: &str) -> Result<Self, BackendError> {
        Self::with_timeout(base_url_str, DEFAULT_TIMEOUT_DURATION)
    }

    pub fn with_timeout(base_url_str: &str, timeout: Duration) -> Result<Self, BackendError> {
        // `join` drops the last path segment unless the base ends with '/'.
        let normalized = if base_url_str.ends_with('/') {
            base_url_str.to_string()
        } else {
            format!("{base_url_str}/")
        };
        let base_url = Url::parse(&normalized)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            client,
            retry_max_elapsed: RETRY_MAX_ELAPSED,
        })
    }

    /// Bound on the total time spent retrying transient statuses.
    pub fn with_retry_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.retry_max_elapsed = max_elapsed;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch a realtime snapshot of a game by its code.
    ///
    /// # Errors
    ///
    /// * [`BackendError::NotFound`] - the envelope carried no data
    /// * [`BackendError::Server`] - non-2xx after retries
    /// * [`BackendError::Http`] / [`BackendError::Json`] - transport or decode failures
    pub async fn get_by_code(
        &self,
        game_code: &GameCode,
        simulated_items: &[u32],
    ) -> Result<Value, BackendError> {
        let url = self.base_url.join(GET_BY_CODE_ENDPOINT)?;
        let body = json!({
            "game_code": Value::from(game_code),
            "simulated_items": simulated_items,
        });

        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        };

        loop {
            let response = self.client.post(url.clone()).json(&body).send().await?;
            let status = HttpStatusCode::from(response.status().as_u16());

            if status.is_success() {
                let envelope: ServerResponse<Value> = response.json().await?;
                return unwrap_envelope(envelope, game_code);
            }

            let text = response.text().await.unwrap_or_default();

            if status.is_retryable() {
                if let Some(duration) = backoff.next_backoff() {
                    warn!("Backend answered {status} for {game_code}, retrying after {duration:?}");
                    TokioSleep(duration).await;
                    continue;
                }
            }

            return Err(BackendError::Server {
                status,
                message: text,
                location: ErrorLocation::from(Location::caller()),
            });
        }
    }
}

#[track_caller]
fn unwrap_envelope(
    envelope: ServerResponse<Value>,
    game_code: &GameCode,
) -> Result<Value, BackendError> {
    match envelope.data {
        Some(data) if !data.is_null() => {
            debug!("Backend returned game {game_code}");
            Ok(data)
        }
        _ => {
            let message = envelope
                .message
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
            info!("Backend has no game {game_code}: {message}");
            Err(BackendError::NotFound {
                message,
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}
