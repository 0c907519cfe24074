use std::sync::Arc;

use bizscope::api::{AppState, chat_routes};
use bizscope::config::EngineConfig;
use bizscope::engine::{QuestionPlanner, ReadinessClassifier, SessionController};
use bizscope::llm::{OpenRouterConfig, create_provider};
use bizscope::proposal::ProposalGenerator;
use bizscope::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Read API key from environment
    let api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: OPENROUTER_API_KEY not set");
        eprintln!("  export OPENROUTER_API_KEY=sk-or-...");
        std::process::exit(1);
    });

    let model =
        std::env::var("BIZSCOPE_MODEL").unwrap_or_else(|_| "openai/o4-mini".to_string());

    let port: u16 = std::env::var("BIZSCOPE_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    eprintln!("BizScope v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", model);
    eprintln!("   Chat API: http://0.0.0.0:{}/api/chat", port);

    // ── LLM provider ─────────────────────────────────────────────────────
    let llm = create_provider(OpenRouterConfig::new(
        secrecy::SecretString::from(api_key),
        model,
    ))?;

    // ── Database ─────────────────────────────────────────────────────────
    let db_path =
        std::env::var("BIZSCOPE_DB_PATH").unwrap_or_else(|_| "./data/bizscope.db".to_string());

    let db_path_ref = std::path::Path::new(&db_path);
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(db_path_ref)
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", db_path, e);
                std::process::exit(1);
            }),
    );

    eprintln!("   Database: {}", db_path);

    // ── Engine ───────────────────────────────────────────────────────────
    let config = EngineConfig::default();
    let generator = Arc::new(ProposalGenerator::new(
        Arc::clone(&db),
        llm.clone(),
        &config,
    ));
    let controller = Arc::new(SessionController::new(
        Arc::clone(&db),
        QuestionPlanner::new(llm.clone(), config.context_window_messages),
        ReadinessClassifier::new(llm, config.min_user_messages, config.context_window_messages),
        config,
    ));

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = chat_routes(AppState {
        controller,
        generator,
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
