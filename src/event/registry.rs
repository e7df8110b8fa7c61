use std::{collections::HashMap, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;

use super::{
    handler::EventHandler,
    model::{Event, EventKind},
};

/// What happened when an event went through [`HandlerRegistry::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No handler is bound to the event kind.
    Unhandled,
    Handled,
    /// The handler returned an error or panicked.
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One handler per [`EventKind`].
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `kind`. Fails if `kind` already has a handler; the
    /// existing one stays in place.
    pub fn insert<H: EventHandler>(&mut self, kind: EventKind, handler: H) -> crate::Result<()> {
        if self.handlers.contains_key(&kind) {
            tracing::warn!(%kind, "duplicate handler registration rejected");
            return Err(crate::Error::duplicate_handler(kind));
        }
        self.handlers.insert(kind, Arc::new(handler));
        tracing::debug!(%kind, "handler registered");
        Ok(())
    }

    /// Bind `handler` to `kind`, dropping any previous handler. Returns `true`
    /// if one was replaced.
    pub fn replace<H: EventHandler>(&mut self, kind: EventKind, handler: H) -> bool {
        let replaced = self.handlers.insert(kind, Arc::new(handler)).is_some();
        tracing::debug!(%kind, replaced, "handler registered");
        replaced
    }

    pub fn remove(&mut self, kind: EventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.handlers.keys().copied()
    }

    /// Run the handler bound to the event's kind, if any. Handler errors and
    /// panics never escape this call.
    pub async fn dispatch(&self, event: Event) -> DispatchOutcome {
        let kind = event.kind();
        let Some(handler) = self.handlers.get(&kind) else {
            tracing::debug!(%kind, "no handler registered");
            return DispatchOutcome::Unhandled;
        };
        // `handle` itself may panic before returning a future
        let result = AssertUnwindSafe(async move { handler.handle(event).await })
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(())) => {
                tracing::debug!(%kind, "event handled");
                DispatchOutcome::Handled
            }
            Ok(Err(err)) => {
                tracing::error!(%kind, %err, "handler error");
                DispatchOutcome::Failed(err.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(%kind, panic = %message, "handler panicked");
                DispatchOutcome::Failed(message)
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(calls: &Arc<AtomicUsize>) -> impl EventHandler {
        let calls = calls.clone();
        move |_event: Event| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    async fn buggy_handler(_event: Event) {
        panic!("handler bug")
    }

    fn event(kind: EventKind) -> Event {
        Event::new(kind, serde_json::json!({ "text": "hi" }))
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry
            .insert(EventKind::MessageCreated, counting(&first))
            .unwrap();
        let err = registry
            .insert(EventKind::MessageCreated, counting(&second))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::DuplicateHandler(EventKind::MessageCreated)
        ));

        registry.dispatch(event(EventKind::MessageCreated)).await;
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn replace_overwrites() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        assert!(!registry.replace(EventKind::Ping, counting(&first)));
        assert!(registry.replace(EventKind::Ping, counting(&second)));
        assert_eq!(registry.len(), 1);

        registry.dispatch(event(EventKind::Ping)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_only_matching_kind() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.insert(EventKind::Joined, counting(&calls)).unwrap();

        let outcome = registry.dispatch(event(EventKind::Left)).await;
        assert_eq!(outcome, DispatchOutcome::Unhandled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let outcome = registry.dispatch(event(EventKind::Joined)).await;
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_failures_are_contained() {
        let mut registry = HandlerRegistry::new();
        registry
            .insert(EventKind::TagAdded, |_event: Event| async {
                Err::<(), _>("tag store unavailable")
            })
            .unwrap();
        registry.insert(EventKind::TagRemoved, buggy_handler).unwrap();
        registry
            .insert(EventKind::MessageCreated, |event: Event| {
                event.payload()["n"].as_u64().expect("n missing");
                async {}
            })
            .unwrap();

        let outcome = registry.dispatch(event(EventKind::TagAdded)).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Failed("tag store unavailable".into())
        );
        let outcome = registry.dispatch(event(EventKind::TagRemoved)).await;
        assert_eq!(outcome, DispatchOutcome::Failed("handler bug".into()));
        let outcome = registry.dispatch(event(EventKind::MessageCreated)).await;
        assert_eq!(outcome, DispatchOutcome::Failed("n missing".into()));
    }

    #[test]
    fn remove_and_kinds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        registry.insert(EventKind::Ping, counting(&calls)).unwrap();
        registry
            .insert(EventKind::StampCreated, counting(&calls))
            .unwrap();
        let mut kinds: Vec<_> = registry.kinds().collect();
        kinds.sort();
        assert_eq!(kinds, vec![EventKind::Ping, EventKind::StampCreated]);
        assert!(registry.remove(EventKind::Ping));
        assert!(!registry.contains(EventKind::Ping));
        assert!(!registry.remove(EventKind::Ping));
    }
}
