//! PawHaven - pet adoption marketplace backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pawhaven::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxApplicationRepository, SqlxDictionaryRepository, SqlxNotificationRepository,
            SqlxPetRepository, SqlxPostRepository, SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{
        application::ApplicationService, community::CommunityService,
        dictionary::DictionaryService, notification::NotificationService, pet::PetService,
        user::UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawhaven=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PawHaven marketplace backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let pet_repo = SqlxPetRepository::boxed(pool.clone());
    let application_repo = SqlxApplicationRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let notification_repo = SqlxNotificationRepository::boxed(pool.clone());
    let dictionary_repo = SqlxDictionaryRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::with_session_expiration(
        user_repo,
        session_repo,
        config.session.expiration_days,
    ));
    let pet_service = Arc::new(PetService::new(pet_repo.clone()));
    let application_service = Arc::new(ApplicationService::new(
        application_repo,
        pet_repo,
        notification_repo.clone(),
    ));
    let community_service = Arc::new(CommunityService::new(
        post_repo,
        notification_repo.clone(),
    ));
    let notification_service = Arc::new(NotificationService::new(notification_repo));
    let dictionary_service = Arc::new(DictionaryService::new(dictionary_repo, cache));

    // Seed the breed catalog on first start
    let seeded = dictionary_service.seed_defaults().await?;
    if seeded > 0 {
        tracing::info!("Seeded {} dictionary entries", seeded);
    }

    // Build application state
    let state = AppState {
        user_service,
        pet_service,
        application_service,
        community_service,
        notification_service,
        dictionary_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
