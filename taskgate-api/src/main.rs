//! # TaskGate API Server
//!
//! Serves the task, role and permission API and the front-end pages, and
//! runs the task-completion notification dispatcher in the same process.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskgate-api
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use taskgate_api::{
    app::{build_router, AppState},
    config::{Config, MailDriver},
};
use taskgate_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
    seed::seed,
};
use taskgate_worker::{
    dispatcher::NotificationDispatcher,
    listener::TaskCompletionListener,
    mail::{HttpMailer, LogMailer, MailAddress, MailSettings, Mailer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long shutdown waits for queued notifications
const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskgate_api=debug,taskgate_worker=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_mailer(config: &Config) -> anyhow::Result<Arc<dyn Mailer>> {
    match config.mail.driver {
        MailDriver::Log => Ok(Arc::new(LogMailer)),
        MailDriver::Http => {
            let url = config
                .mail
                .api_url
                .clone()
                .context("MAIL_API_URL is required when MAIL_DRIVER=http")?;
            Ok(Arc::new(HttpMailer::new(url, config.mail.api_key.clone())?))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "TaskGate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool).await?;

    let admin = config.admin.as_ref().map(|admin| admin.to_seed());
    seed(&pool, admin.as_ref()).await?;

    let settings = MailSettings::new(
        MailAddress::new(
            config.mail.from_address.clone(),
            Some(config.mail.from_name.clone()),
        ),
        config.api.app_url.clone(),
    );
    let mailer = build_mailer(&config)?;
    tracing::info!(mailer = mailer.name(), "Mail backend ready");

    let listener = TaskCompletionListener::new(pool.clone(), mailer, settings);
    let (dispatcher, dispatcher_handle) = NotificationDispatcher::spawn(Arc::new(listener));

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config).with_notifier(Arc::new(dispatcher.clone()));
    let app = build_router(state);

    let tcp = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dispatcher.shutdown();
    match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, dispatcher_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Notification dispatcher failed"),
        Err(_) => tracing::warn!("Timed out draining notifications"),
    }

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
