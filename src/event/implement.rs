/// traQ BOT HTTP mode: events are POSTed to an endpoint served by axum.
pub mod webhook;
