use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use babelcall_api::{build_router, prober, state::AppState};
use babelcall_config::Settings;
use babelcall_recognition::stt::WsSpeechBackend;
use babelcall_services::translate::HttpTranslator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    info!(
        stt_url = %settings.stt.url,
        translation_url = %settings.translation.url,
        "babelcall starting"
    );

    let speech = Arc::new(WsSpeechBackend::new(
        &settings.stt.url,
        &settings.stt.api_key,
        &settings.stt.model,
    ));
    let translator = Arc::new(HttpTranslator::new(
        &settings.translation.url,
        settings.translation.api_key.as_deref(),
    )?);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::new(settings, speech, translator);

    prober::spawn(
        Arc::clone(&state.registry),
        state.settings.prober.ping_interval_secs,
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, build_router(state))
        .await
        .context("server error")?;

    Ok(())
}
