pub mod handler;
pub mod implement;
pub mod model;
pub mod registry;

pub use handler::{EventHandler, HandlerError, HandlerResult, blocking, no_arg};
pub use model::{Event, EventKind, UnknownEventKind};
pub use registry::{DispatchOutcome, HandlerRegistry};
