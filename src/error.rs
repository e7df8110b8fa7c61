use std::borrow::Cow;

use crate::event::model::EventKind;
pub type Result<T> = std::result::Result<T, Error>;
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    context: Cow<'static, str>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::SerdeJson(err) => Some(err),
            ErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            context: context.into(),
        }
    }
    pub const fn context<K: Into<ErrorKind>>(
        context: impl Into<Cow<'static, str>>,
    ) -> impl FnOnce(K) -> Error {
        move |kind| Error::new(kind.into(), context)
    }
    pub fn unexpected(context: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unexpected, context)
    }
    pub fn config(context: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, context)
    }
    pub fn duplicate_handler(kind: EventKind) -> Self {
        Self::new(
            ErrorKind::DuplicateHandler(kind),
            "registering event handler",
        )
    }
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeJson(err)
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    SerdeJson(serde_json::Error),
    Io(std::io::Error),
    /// A handler is already bound to this event kind.
    DuplicateHandler(EventKind),
    Config,
    Unexpected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unexpected => write!(f, "unexpected error"),
            Self::SerdeJson(err) => write!(f, "serde_json error: {}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::DuplicateHandler(kind) => {
                write!(f, "a handler for `{}` is already registered", kind)
            }
            Self::Config => write!(f, "invalid configuration"),
        }
    }
}
