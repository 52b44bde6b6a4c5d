//! TechMatch - A marketplace backend for university patents

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techmatch::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxArticleRepository, SqlxInterestRepository, SqlxMessageRepository,
            SqlxPatentRepository, SqlxUserRepository,
        },
    },
    services::{
        provider_from_config, ArticleService, ContentService, CredentialService,
        InterestService, MessageService, PatentService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "techmatch=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TechMatch marketplace...");

    // Load configuration
    let config = Arc::new(Config::load_with_env(Path::new("config.yml"))?);
    tracing::info!("Configuration loaded");

    if config.auth.uses_default_secret() {
        if config.server.environment.is_production() {
            anyhow::bail!("Refusing to start in production with the default token secret");
        }
        tracing::warn!("Using the default token secret; set auth.token_secret before deploying");
    }
    if !config.auth.enforce_admin_role {
        tracing::warn!("Admin role enforcement is off; admin endpoints accept any authenticated account");
    }
    if config.auth.bypass {
        tracing::warn!("Auth bypass is on; every request runs as the fixed development identity");
    }

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let patent_repo = SqlxPatentRepository::boxed(pool.clone());
    let interest_repo = SqlxInterestRepository::boxed(pool.clone());
    let message_repo = SqlxMessageRepository::boxed(pool.clone());
    let article_repo = SqlxArticleRepository::boxed(pool.clone());

    // Initialize services
    let credential_service = Arc::new(CredentialService::new(
        user_repo.clone(),
        config.auth.token_secret.clone(),
        config.auth.token_ttl_days,
    ));
    let identity_provider = provider_from_config(&config.auth);
    let patent_service = Arc::new(PatentService::new(
        patent_repo.clone(),
        config.upload.path.clone(),
    ));
    let interest_service = Arc::new(InterestService::new(interest_repo, patent_repo));
    let message_service = Arc::new(MessageService::new(message_repo));
    let article_service = Arc::new(ArticleService::new(article_repo.clone()));
    let content_service = Arc::new(ContentService::new(article_repo, config.content.clone())?);
    if config.content.wordpress_url.trim().is_empty() {
        tracing::info!("No WordPress source configured; columns fall back to stored articles");
    }

    // Build application state
    let state = AppState {
        config: config.clone(),
        credential_service,
        identity_provider,
        patent_service,
        interest_service,
        message_service,
        article_service,
        content_service,
    };

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
