use std::{net::SocketAddr, sync::Arc};

use axum::{Router, extract::DefaultBodyLimit};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::registry::HandlerRegistry;
mod service;

pub use service::Rejection;

/// Status answered when a handler fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerFailurePolicy {
    /// Log the failure and acknowledge the delivery anyway, so traQ does not
    /// redeliver it.
    #[default]
    Acknowledge,
    /// Answer `500 Internal Server Error`.
    Reject,
}

impl HandlerFailurePolicy {
    pub(crate) fn status(self) -> StatusCode {
        match self {
            Self::Acknowledge => StatusCode::NO_CONTENT,
            Self::Reject => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::str::FromStr for HandlerFailurePolicy {
    type Err = crate::Error;
    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "acknowledge" => Ok(Self::Acknowledge),
            "reject" => Ok(Self::Reject),
            other => Err(crate::Error::config(format!(
                "unknown handler failure policy `{other}`, expected `acknowledge` or `reject`"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebHookServiceConfig {
    pub path: String,
    pub body_size_limit: usize,
    pub handler_failure: HandlerFailurePolicy,
}

impl Default for WebHookServiceConfig {
    fn default() -> Self {
        Self {
            path: crate::statics::DEFAULT_PATH.to_string(),
            body_size_limit: crate::statics::DEFAULT_BODY_SIZE_LIMIT,
            handler_failure: HandlerFailurePolicy::default(),
        }
    }
}

/// Refuse settings the endpoint cannot serve safely.
pub(crate) fn validate(
    verification_token: &str,
    config: &WebHookServiceConfig,
) -> crate::Result<()> {
    if verification_token.is_empty() {
        return Err(crate::Error::config("verification token must not be empty"));
    }
    if !config.path.starts_with('/') {
        return Err(crate::Error::config(format!(
            "webhook path `{}` must start with `/`",
            config.path
        )));
    }
    Ok(())
}

/// Shared state of the webhook endpoint. The registry is frozen once it is
/// moved in here.
#[derive(Debug, Clone)]
pub struct WebHookServiceApp {
    verification_token: Arc<str>,
    registry: Arc<HandlerRegistry>,
    config: Arc<WebHookServiceConfig>,
}

impl WebHookServiceApp {
    pub fn new(
        verification_token: &str,
        registry: HandlerRegistry,
        config: WebHookServiceConfig,
    ) -> Self {
        Self {
            verification_token: Arc::from(verification_token),
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn build_service(&self) -> crate::Result<Router<()>> {
        validate(&self.verification_token, &self.config)?;
        let app = self.clone();
        let router = axum::Router::new()
            .route(
                &self.config.path,
                axum::routing::post(service::event_listen_service),
            )
            .layer(DefaultBodyLimit::max(self.config.body_size_limit))
            .with_state(app);
        Ok(router)
    }

    /// Verify, parse and dispatch one delivery, returning the status to
    /// answer with.
    pub async fn handle_request(&self, headers: &HeaderMap, body: &[u8]) -> StatusCode {
        match service::process(self, headers, body).await {
            Ok(status) => status,
            Err(rejection) => rejection.status(),
        }
    }
}

/// A running webhook listener.
#[derive(Debug)]
pub struct WebHookService {
    bind: SocketAddr,
    task: JoinHandle<()>,
}

impl WebHookService {
    /// The address actually bound, useful when binding port 0.
    pub fn get_bind(&self) -> SocketAddr {
        self.bind
    }

    pub async fn start(
        app: WebHookServiceApp,
        bind: SocketAddr,
        ct: CancellationToken,
    ) -> crate::Result<Self> {
        let service = app.build_service()?;
        let tokio_tcp_listen = tokio::net::TcpListener::bind(bind)
            .await
            .map_err(crate::Error::context(format!("failed to bind to {bind}")))?;
        let bind = tokio_tcp_listen
            .local_addr()
            .map_err(crate::Error::context("failed to read bound address"))?;
        tracing::info!(%bind, path = %app.config.path, "webhook service listening");
        let task = tokio::spawn(async move {
            let result = axum::serve(tokio_tcp_listen, service)
                .with_graceful_shutdown(async move {
                    ct.cancelled().await;
                    tracing::info!("webhook service shutdown");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("webhook service error: {:?}", err);
            }
        });
        Ok(Self { bind, task })
    }

    /// Wait until the listener stops.
    pub async fn wait(self) -> crate::Result<()> {
        self.task
            .await
            .map_err(|e| crate::Error::unexpected(format!("webhook service task failed: {e}")))
    }
}
