use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::errors::GatewayError;

use super::GatewayResult;

const USER_AGENT: &str = concat!("taskboard/", env!("CARGO_PKG_VERSION"));

/// Published when the API answers `401`; the front end should send the
/// user back through sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Expired,
}

/// HTTP implementation of every gateway trait.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    events: broadcast::Sender<SessionEvent>,
}

/// `{success, data, message}` wrapper used by the task endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Error body shapes the API is known to produce.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &Config) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(GatewayError::Network)?;
        Ok(Self::with_client(client, &config.api_url, config.token.clone()))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            events,
        }
    }

    /// Receive session events (currently only expiry).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(super) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a plain JSON body.
    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> GatewayResult<T> {
        let response = self.dispatch(builder).await?;
        let body = response.text().await.map_err(GatewayError::Network)?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Send and ignore the body.
    pub(super) async fn send_empty(&self, builder: RequestBuilder) -> GatewayResult<()> {
        self.dispatch(builder).await.map(|_| ())
    }

    /// Send and unwrap a `{success, data}` envelope.
    pub(super) async fn send_enveloped<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> GatewayResult<T> {
        let envelope: Envelope<T> = self.send_json(builder, path).await?;
        if !envelope.success {
            return Err(GatewayError::Rejected(
                envelope.message.unwrap_or_else(|| "Request failed".into()),
            ));
        }
        envelope.data.ok_or_else(|| GatewayError::Decode {
            path: path.to_string(),
            message: "response envelope has no data".into(),
        })
    }

    /// Send an enveloped request whose payload is irrelevant; only
    /// `success: false` is an error.
    pub(super) async fn send_enveloped_ack(
        &self,
        builder: RequestBuilder,
        path: &str,
        fallback: &str,
    ) -> GatewayResult<()> {
        let response = self.dispatch(builder).await?;
        let body = response.text().await.map_err(GatewayError::Network)?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        if envelope.success {
            Ok(())
        } else {
            Err(GatewayError::Rejected(
                envelope.message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }

    async fn dispatch(&self, builder: RequestBuilder) -> GatewayResult<Response> {
        let response = builder.send().await.map_err(GatewayError::Network)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("api answered 401, session expired");
            // Nobody listening is fine.
            let _ = self.events.send(SessionEvent::Expired);
            return Err(GatewayError::SessionExpired);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        tracing::debug!(status = status.as_u16(), %message, "api error");
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(message));
        }
        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}
