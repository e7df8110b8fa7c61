use std::{error::Error as StdError, future::Future, sync::Arc};

use futures_util::future::BoxFuture;

use super::model::Event;

pub type HandlerError = Box<dyn StdError + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

/// Something that can react to an [`Event`].
///
/// Implemented for every `Fn(Event) -> impl Future` whose output is `()` or
/// `Result<(), E>`, so plain async closures and `async fn`s can be registered
/// directly.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: Event) -> BoxFuture<'static, HandlerResult>;
}

pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<HandlerError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

impl<F, Fut, R> EventHandler for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
{
    fn handle(&self, event: Event) -> BoxFuture<'static, HandlerResult> {
        let fut = (self)(event);
        Box::pin(async move { fut.await.into_handler_result() })
    }
}

/// Handler running a synchronous function on the blocking thread pool.
pub struct Blocking<F> {
    f: Arc<F>,
}

/// Wrap a synchronous `Fn(Event)` so it can be registered as a handler.
pub fn blocking<F, R>(f: F) -> Blocking<F>
where
    F: Fn(Event) -> R + Send + Sync + 'static,
    R: IntoHandlerResult + Send + 'static,
{
    Blocking { f: Arc::new(f) }
}

impl<F, R> EventHandler for Blocking<F>
where
    F: Fn(Event) -> R + Send + Sync + 'static,
    R: IntoHandlerResult + Send + 'static,
{
    fn handle(&self, event: Event) -> BoxFuture<'static, HandlerResult> {
        let f = self.f.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || f(event).into_handler_result())
                .await
                .unwrap_or_else(|join_err| Err(HandlerError::from(join_err)))
        })
    }
}

/// Handler that ignores the event payload.
pub struct NoArg<F> {
    f: F,
}

/// Wrap an `Fn() -> impl Future` that does not need the event.
pub fn no_arg<F, Fut, R>(f: F) -> NoArg<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
{
    NoArg { f }
}

impl<F, Fut, R> EventHandler for NoArg<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
{
    fn handle(&self, _event: Event) -> BoxFuture<'static, HandlerResult> {
        let fut = (self.f)();
        Box::pin(async move { fut.await.into_handler_result() })
    }
}
