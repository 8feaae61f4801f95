use std::error::Error;
use std::sync::Arc;

use internship_hub::core::applications::{ApplicationService, UploadStore};
use internship_hub::core::auth::{AuthService, JwtService, SessionValidator, VerificationService};
use internship_hub::core::config::Config;
use internship_hub::core::db::{
    ApplicationRepository, UserRepository, VerificationRepository, create_pool_with_migrations,
};
use internship_hub::core::mail::{LogMailer, Mailer, SmtpMailer};
use internship_hub::core::server::{AppState, app_router, shutdown_signal};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "internship_hub=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env()?;

    // Log config status (without revealing secrets)
    let db_config = config.db_config();
    tracing::info!(
        "Config loaded: database={}, jwt_secret={}, smtp={}, frontend={}, uploads={}",
        db_config.redacted_url(),
        config.has_jwt_secret(),
        config.has_smtp(),
        config.frontend_url,
        config.upload_dir.display()
    );

    let pool = create_pool_with_migrations(&db_config).await?;
    tracing::info!("Connected to database");

    let users = Arc::new(UserRepository::new(pool.clone()));
    let verifications = Arc::new(VerificationRepository::new(pool.clone()));
    let applications = Arc::new(ApplicationRepository::new(pool.clone()));

    match verifications.cleanup_expired().await {
        Ok(0) => {}
        Ok(removed) => tracing::info!("Removed {} expired verification tokens", removed),
        Err(e) => tracing::warn!("Failed to clean up expired verification tokens: {}", e),
    }

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp, config.frontend_url.clone())?),
        None => {
            tracing::warn!("SMTP_HOST is not set; verification links will only be logged");
            Arc::new(LogMailer::new(config.frontend_url.clone()))
        }
    };

    let uploads = UploadStore::new(config.upload_dir.clone());
    uploads.ensure_root().await?;

    let jwt_service = JwtService::new(config.jwt_config());
    let verification_service = VerificationService::new(verifications, mailer);

    let state = AppState {
        auth_service: AuthService::new(users.clone(), verification_service, jwt_service.clone()),
        application_service: ApplicationService::new(applications, uploads),
        sessions: SessionValidator::new(jwt_service, users),
        pool: Some(pool),
    };

    let app = app_router(state, &config.cors_origins);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
