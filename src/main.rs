// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use examinator::config::Config;
use examinator::notifications::PointsAssignedNotifier;
use examinator::repository::FsExamRepository;
use examinator::routes;
use examinator::state::AppState;
use examinator::utils::converter::PandocConverter;
use examinator::utils::mail::{HttpMailRelay, LogMailer, Mailer};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if !config.exams_root.is_dir() {
        tracing::warn!(
            "Exam root {} does not exist yet, listings will be empty",
            config.exams_root.display()
        );
    }

    let converter = Arc::new(PandocConverter::from_config(&config));
    let exams = Arc::new(FsExamRepository::new(config.exams_root.clone(), converter));
    tracing::info!("Serving exams from {}", config.exams_root.display());

    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(endpoint) => match HttpMailRelay::new(endpoint.clone(), config.mail_timeout) {
            Ok(relay) => {
                tracing::info!("Sending mail through relay {}", endpoint);
                Arc::new(relay)
            }
            Err(e) => {
                tracing::error!(
                    "Cannot set up mail relay {}, notifications will only be logged: {}",
                    endpoint,
                    e
                );
                Arc::new(LogMailer)
            }
        },
        None => {
            tracing::warn!("MAIL_RELAY_URL not set, notifications will only be logged");
            Arc::new(LogMailer)
        }
    };
    let notifier = Arc::new(PointsAssignedNotifier::new(mailer, config.mail_from.clone()));

    // Create AppState
    let state = AppState {
        exams,
        notifier,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = config.bind_addr;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
