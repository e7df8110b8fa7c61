use traq_bot::{
    Bot,
    event::{Event, blocking},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,traq_bot=debug".into()),
        )
        .init();
    if let Err(err) = async_main().await {
        tracing::error!(%err, "bot stopped");
        std::process::exit(1);
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload {
    message: Message,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    id: String,
    channel_id: String,
    plain_text: String,
}

async fn async_main() -> traq_bot::Result<()> {
    // BOT_VERIFICATION_TOKEN is required, BOT_PORT defaults to 8080
    let mut bot = Bot::from_env()?;
    let port = bot.config().port;
    bot.ping(|event: Event| async move {
        tracing::info!(time = ?event.event_time(), "ping");
    })?
    .message_created(|event: Event| async move {
        let payload: MessagePayload = event.parse()?;
        let message = payload.message;
        tracing::info!(
            id = %message.id,
            channel = %message.channel_id,
            text = %message.plain_text,
            "message created"
        );
        Ok::<(), traq_bot::Error>(())
    })?
    .joined(blocking(|event: Event| {
        println!("joined: {}", event.payload());
    }))?;
    bot.run(port).await
}
