use std::{str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value as JsonValue;

macro_rules! event_kinds {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Event type discriminator sent in the `X-TRAQ-BOT-EVENT` header.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[non_exhaustive]
        pub enum EventKind {
            $($variant,)*
        }

        impl EventKind {
            pub const ALL: &'static [EventKind] = &[$(EventKind::$variant,)*];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(EventKind::$variant => $name,)*
                }
            }
        }

        impl FromStr for EventKind {
            type Err = UnknownEventKind;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(EventKind::$variant),)*
                    other => Err(UnknownEventKind(other.into())),
                }
            }
        }
    };
}

event_kinds! {
    Ping => "PING",
    Joined => "JOINED",
    Left => "LEFT",
    MessageCreated => "MESSAGE_CREATED",
    MessageDeleted => "MESSAGE_DELETED",
    MessageUpdated => "MESSAGE_UPDATED",
    DirectMessageCreated => "DIRECT_MESSAGE_CREATED",
    DirectMessageDeleted => "DIRECT_MESSAGE_DELETED",
    DirectMessageUpdated => "DIRECT_MESSAGE_UPDATED",
    BotMessageStampsUpdated => "BOT_MESSAGE_STAMPS_UPDATED",
    ChannelCreated => "CHANNEL_CREATED",
    ChannelTopicChanged => "CHANNEL_TOPIC_CHANGED",
    UserCreated => "USER_CREATED",
    UserActivated => "USER_ACTIVATED",
    StampCreated => "STAMP_CREATED",
    TagAdded => "TAG_ADDED",
    TagRemoved => "TAG_REMOVED",
    UserGroupCreated => "USER_GROUP_CREATED",
    UserGroupUpdated => "USER_GROUP_UPDATED",
    UserGroupDeleted => "USER_GROUP_DELETED",
    UserGroupMemberAdded => "USER_GROUP_MEMBER_ADDED",
    UserGroupMemberUpdated => "USER_GROUP_MEMBER_UPDATED",
    UserGroupMemberRemoved => "USER_GROUP_MEMBER_REMOVED",
    UserGroupAdminAdded => "USER_GROUP_ADMIN_ADDED",
    UserGroupAdminRemoved => "USER_GROUP_ADMIN_REMOVED",
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind(pub String);

impl std::fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown event kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownEventKind {}

/// An inbound event, handed to the handler bound to its kind.
#[derive(Clone, Debug)]
pub struct Event {
    kind: EventKind,
    request_id: Option<Arc<str>>,
    payload: Arc<JsonValue>,
}

impl Event {
    pub fn new(kind: EventKind, payload: JsonValue) -> Self {
        Self {
            kind,
            request_id: None,
            payload: Arc::new(payload),
        }
    }
    pub fn with_request_id(mut self, request_id: impl Into<Arc<str>>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
    pub fn kind(&self) -> EventKind {
        self.kind
    }
    /// Delivery id from `X-TRAQ-BOT-REQUEST-ID`, if the sender provided one.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
    /// The request body exactly as it was received.
    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }
    pub fn into_payload(self) -> JsonValue {
        Arc::unwrap_or_clone(self.payload)
    }
    /// `eventTime` of the payload. `None` when absent or not RFC 3339.
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.payload.get("eventTime")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .inspect_err(|e| tracing::debug!(%e, raw, "unparseable eventTime"))
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }
    pub fn parse<T: DeserializeOwned>(&self) -> crate::Result<T> {
        T::deserialize(self.payload.as_ref())
            .map_err(crate::Error::context(format!("parsing {} payload", self.kind)))
    }
}
