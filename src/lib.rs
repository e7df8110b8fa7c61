#![warn(clippy::unwrap_used)]
pub(crate) mod utils;

/// 机器人
pub mod bot;
/// 静态量，常量
pub mod statics;
/// 错误处理
mod error;
/// 事件：模型、处理器与 webhook 服务
pub mod event;

pub use bot::{Bot, BotConfig};
pub use error::{Error, ErrorKind, Result};
pub use event::implement::webhook::HandlerFailurePolicy;
