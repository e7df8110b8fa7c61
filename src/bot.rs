use std::net::{Ipv4Addr, SocketAddr};

use axum::Router;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    event::{
        handler::EventHandler,
        implement::webhook::{
            self, HandlerFailurePolicy, WebHookService, WebHookServiceApp, WebHookServiceConfig,
        },
        model::EventKind,
        registry::HandlerRegistry,
    },
    statics,
};

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct BotConfig {
    pub verification_token: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_body_size_limit")]
    pub body_size_limit: usize,
    #[serde(default)]
    pub handler_failure: HandlerFailurePolicy,
}

fn default_port() -> u16 {
    statics::DEFAULT_PORT
}

fn default_path() -> String {
    statics::DEFAULT_PATH.to_string()
}

fn default_body_size_limit() -> usize {
    statics::DEFAULT_BODY_SIZE_LIMIT
}

impl BotConfig {
    pub fn new(verification_token: impl Into<String>) -> Self {
        Self {
            verification_token: verification_token.into(),
            port: default_port(),
            path: default_path(),
            body_size_limit: default_body_size_limit(),
            handler_failure: HandlerFailurePolicy::default(),
        }
    }

    /// Read the configuration from `BOT_*` environment variables. Only
    /// `BOT_VERIFICATION_TOKEN` is required.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let opt = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let verification_token = opt(statics::ENV_VERIFICATION_TOKEN).ok_or_else(|| {
            crate::Error::config(format!(
                "missing required env: {}",
                statics::ENV_VERIFICATION_TOKEN
            ))
        })?;
        let mut config = Self::new(verification_token);
        if let Some(port) = opt(statics::ENV_PORT) {
            config.port = port.parse().map_err(|e| {
                crate::Error::config(format!("failed to parse {}='{port}': {e}", statics::ENV_PORT))
            })?;
        }
        if let Some(path) = opt(statics::ENV_PATH) {
            config.path = path;
        }
        if let Some(limit) = opt(statics::ENV_BODY_SIZE_LIMIT) {
            config.body_size_limit = limit.parse().map_err(|e| {
                crate::Error::config(format!(
                    "failed to parse {}='{limit}': {e}",
                    statics::ENV_BODY_SIZE_LIMIT
                ))
            })?;
        }
        if let Some(policy) = opt(statics::ENV_HANDLER_FAILURE) {
            config.handler_failure = policy.parse()?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        webhook::validate(&self.verification_token, &self.webhook_config())
    }

    fn webhook_config(&self) -> WebHookServiceConfig {
        WebHookServiceConfig {
            path: self.path.clone(),
            body_size_limit: self.body_size_limit,
            handler_failure: self.handler_failure,
        }
    }
}

macro_rules! register_methods {
    ($($method:ident => $kind:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register the handler for `", stringify!($kind), "` events.")]
            pub fn $method<H: EventHandler>(&mut self, handler: H) -> crate::Result<&mut Self> {
                self.register(EventKind::$kind, handler)?;
                Ok(self)
            }
        )*
    };
}

/// # Bot
/// traQ BOT server: holds the verification token and the handlers, and serves
/// the webhook endpoint once [`Bot::run`] is called.
///
/// ```no_run
/// use traq_bot::{Bot, event::Event};
///
/// # fn main() -> traq_bot::Result<()> {
/// let mut bot = Bot::new("verification-token");
/// bot.message_created(|event: Event| async move {
///     tracing::info!(payload = %event.payload(), "message created");
/// })?;
/// bot.run_blocking(8080)
/// # }
/// ```
#[derive(Debug)]
pub struct Bot {
    config: BotConfig,
    registry: HandlerRegistry,
}

impl Bot {
    pub fn new(verification_token: impl Into<String>) -> Self {
        Self {
            config: BotConfig::new(verification_token),
            registry: HandlerRegistry::new(),
        }
    }

    pub fn from_config(config: BotConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: HandlerRegistry::new(),
        })
    }

    pub fn from_env() -> crate::Result<Self> {
        Self::from_config(BotConfig::from_env()?)
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Bind `handler` to `kind`. A second registration for the same kind is
    /// rejected with [`ErrorKind::DuplicateHandler`](crate::ErrorKind::DuplicateHandler).
    pub fn register<H: EventHandler>(&mut self, kind: EventKind, handler: H) -> crate::Result<()> {
        self.registry.insert(kind, handler)
    }

    /// Bind `handler` to `kind`, replacing any previous one.
    pub fn replace<H: EventHandler>(&mut self, kind: EventKind, handler: H) -> bool {
        self.registry.replace(kind, handler)
    }

    register_methods! {
        ping => Ping,
        joined => Joined,
        left => Left,
        message_created => MessageCreated,
        message_deleted => MessageDeleted,
        message_updated => MessageUpdated,
        direct_message_created => DirectMessageCreated,
        direct_message_deleted => DirectMessageDeleted,
        direct_message_updated => DirectMessageUpdated,
        bot_message_stamps_updated => BotMessageStampsUpdated,
        channel_created => ChannelCreated,
        channel_topic_changed => ChannelTopicChanged,
        user_created => UserCreated,
        user_activated => UserActivated,
        stamp_created => StampCreated,
        tag_added => TagAdded,
        tag_removed => TagRemoved,
        user_group_created => UserGroupCreated,
        user_group_updated => UserGroupUpdated,
        user_group_deleted => UserGroupDeleted,
        user_group_member_added => UserGroupMemberAdded,
        user_group_member_updated => UserGroupMemberUpdated,
        user_group_member_removed => UserGroupMemberRemoved,
        user_group_admin_added => UserGroupAdminAdded,
        user_group_admin_removed => UserGroupAdminRemoved,
    }

    /// Freeze the handlers into the shared webhook state.
    pub fn into_service_app(self) -> WebHookServiceApp {
        let webhook_config = self.config.webhook_config();
        WebHookServiceApp::new(&self.config.verification_token, self.registry, webhook_config)
    }

    /// Router serving the webhook endpoint, for mounting into another axum app.
    pub fn into_router(self) -> crate::Result<Router<()>> {
        self.into_service_app().build_service()
    }

    /// Listen on `0.0.0.0:port` until `ct` is cancelled.
    pub async fn run_until(self, port: u16, ct: CancellationToken) -> crate::Result<()> {
        let bind = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let service = WebHookService::start(self.into_service_app(), bind, ct).await?;
        service.wait().await
    }

    /// Listen on `0.0.0.0:port` until Ctrl-C.
    pub async fn run(self, port: u16) -> crate::Result<()> {
        let ct = CancellationToken::new();
        let shutdown = ct.clone();
        let ctrl_c = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("ctrl-c received"),
                Err(err) => tracing::error!(%err, "failed to listen for ctrl-c"),
            }
            shutdown.cancel();
        });
        let result = self.run_until(port, ct).await;
        ctrl_c.abort();
        result
    }

    /// Like [`Bot::run`], on a runtime owned by the calling thread.
    pub fn run_blocking(self, port: u16) -> crate::Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(crate::Error::context("failed to build tokio runtime"))?;
        runtime.block_on(self.run(port))
    }
}
