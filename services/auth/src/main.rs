use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod middleware;
mod models;
mod password;
mod rbac;
mod repositories;
mod routes;
mod service;
mod token;
mod validation;

use std::sync::Arc;

use common::database;

use crate::{
    config::AuthConfig,
    password::PasswordService,
    rbac::RoleService,
    repositories::{RoleRepository, SessionRepository, UserRepository, UserStore},
    service::AuthService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub role_service: RoleService,
    pub user_store: Arc<dyn UserStore>,
    pub config: AuthConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let auth_config = AuthConfig::from_env()?;

    // Construct stores and services once and hand them to the router;
    // everything downstream receives its dependencies explicitly.
    let user_repository = Arc::new(UserRepository::new(pool.clone()));
    let session_repository = Arc::new(SessionRepository::new(pool.clone()));
    let role_repository = Arc::new(RoleRepository::new(pool));

    let auth_service = AuthService::new(
        user_repository.clone(),
        session_repository,
        PasswordService::new(),
        auth_config.clone(),
    );
    let role_service = RoleService::new(role_repository);

    let app_state = AppState {
        auth_service,
        role_service,
        user_store: user_repository,
        config: auth_config.clone(),
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&auth_config.bind_address).await?;
    info!(
        "Authentication service listening on {}",
        auth_config.bind_address
    );

    axum::serve(listener, app).await?;

    Ok(())
}
