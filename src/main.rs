//! Homestay Concierge - conversational assistant for a tourism village site
//!
//! Answers visitor questions from static destination facts, the live
//! homestay inventory and a generative backend, revealing replies
//! character by character over SSE.

mod actions;
mod api;
mod config;
mod conversation;
mod intent;
mod knowledge;
mod llm;
mod pipeline;
mod streaming;
#[cfg(test)]
mod testing;

use api::{create_router, AppState, SessionDefaults};
use config::{AssistantConfig, REQUEST_TIMEOUT};
use conversation::ConversationDeps;
use knowledge::{HttpHomestayDirectory, KnowledgeAggregator};
use llm::{GeminiService, LlmService, LoggingService};
use pipeline::ResponsePipeline;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::sync::Arc;
use streaming::TokioScheduler;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homestay_concierge=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AssistantConfig::from_env()?;

    let llm: Option<Arc<dyn LlmService>> = match &config.gemini_api_key {
        Some(key) => {
            let service = GeminiService::new(
                key.clone(),
                &config.gemini_model,
                config.gemini_base_url.as_deref(),
                REQUEST_TIMEOUT,
            )?;
            tracing::info!(model = %config.gemini_model, "Generative backend configured");
            Some(Arc::new(LoggingService::new(Arc::new(service))))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set; generation turns will answer with setup instructions");
            None
        }
    };

    let directory = HttpHomestayDirectory::new(&config.homestay_api_url, REQUEST_TIMEOUT)?;
    tracing::info!(url = %config.homestay_api_url, "Homestay directory configured");

    let pipeline = ResponsePipeline::new(
        llm,
        KnowledgeAggregator::new(Arc::new(directory)),
        Box::new(StdRng::from_entropy()),
    );

    let state = AppState::new(
        ConversationDeps {
            pipeline: Arc::new(pipeline),
            scheduler: Arc::new(TokioScheduler),
            base_delay: config.reveal_delay,
        },
        SessionDefaults {
            bot_name: config.bot_name.clone(),
            language: config.language,
            theme: config.theme.clone(),
        },
    );

    match config.idle_ttl {
        Some(ttl) => {
            let _sweeper = state.spawn_idle_sweeper(ttl);
            tracing::info!(ttl_secs = ttl.as_secs(), "Idle conversation expiry enabled");
        }
        None => tracing::info!("Idle conversation expiry disabled"),
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Homestay concierge listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
