use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use utiles_escolares_server::{
    config::Config,
    context::AppContext,
    db, handlers,
    services::{
        auth_service,
        notification_service::{LogNotifier, Notifier, SmtpNotifier},
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = db::init_db_pool(&config.database_url, config.max_pool_size).await?;

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpNotifier::new(smtp, &config.admin_email)?),
        None => {
            tracing::warn!("SMTP_HOST not set, low-stock alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let ctx = Arc::new(AppContext::new(pool, &config, notifier));

    let password_hash = auth_service::hash_password(&config.admin_password)?;
    ctx.users
        .ensure_initial_admin(&config.admin_username, &config.admin_email, &password_hash)
        .await?;

    let app = handlers::router(ctx);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "starting school supplies inventory server");

    axum::serve(listener, app).await?;

    Ok(())
}
