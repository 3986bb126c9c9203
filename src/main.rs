use anyhow::Context;
use dotenvy::dotenv;
use std::io::Read;
use std::sync::Arc;
use timeline_relay::assistant::OpenAiAssistant;
use timeline_relay::batch::BatchJob;
use timeline_relay::config::Settings;
use timeline_relay::feed::FeedSelector;
use timeline_relay::invocation::InvocationResponse;
use timeline_relay::push::LineMessaging;
use timeline_relay::registry::{S3Blob, SubscriberRegistry};
use timeline_relay::timeline::TwitterTimeline;
use timeline_relay::webhook::{Interpreter, WebhookRequest};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let mode = match std::env::args().nth(1).as_deref() {
        Some("batch") => Mode::Batch,
        Some("webhook") => Mode::Webhook,
        other => {
            error!("Usage: timeline-relay <batch|webhook>, got {:?}", other);
            std::process::exit(2);
        }
    };

    let settings = init_settings();

    let response = match mode {
        Mode::Batch => run_batch(&settings).await,
        Mode::Webhook => run_webhook(&settings).await?,
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

enum Mode {
    Batch,
    Webhook,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn registry(settings: &Settings) -> SubscriberRegistry {
    let store = Arc::new(S3Blob::new(settings.s3_bucket_name.clone()).await);
    SubscriberRegistry::new(store, settings.s3_key_name.clone())
}

fn feed(settings: &Settings) -> FeedSelector {
    let timeline = TwitterTimeline::new(
        reqwest::Client::new(),
        settings.twitter_bearer_token.clone(),
    );
    FeedSelector::new(Arc::new(timeline))
}

async fn run_batch(settings: &Settings) -> InvocationResponse {
    info!("Starting batch run");
    let push = Arc::new(LineMessaging::new(
        reqwest::Client::new(),
        settings.line_channel_access_token.clone(),
    ));

    BatchJob::new(feed(settings), registry(settings).await, push)
        .run()
        .await
}

async fn run_webhook(settings: &Settings) -> anyhow::Result<InvocationResponse> {
    info!("Starting webhook invocation");
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read webhook request from stdin")?;
    let request: WebhookRequest =
        serde_json::from_str(&raw).context("failed to parse webhook request")?;

    let push = Arc::new(LineMessaging::new(
        reqwest::Client::new(),
        settings.line_channel_access_token.clone(),
    ));
    let assistant = Arc::new(OpenAiAssistant::new(&settings.openai_api_key));

    let interpreter = Interpreter::new(
        feed(settings),
        registry(settings).await,
        push,
        assistant,
        settings.line_channel_secret.clone(),
    );

    Ok(interpreter.handle_request(&request).await)
}
