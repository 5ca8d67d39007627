//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use lingua_cache::{MemoryRevocationRegistry, RedisPool, RedisRevocationRegistry};
use lingua_common::{AppConfig, AppError, JwtService, RegistryBackend};
use lingua_core::RevocationRegistry;
use lingua_db::{
    create_pool, ensure_schema, PgRevocationRegistry, PgSubjectRepository, PoolConfig,
};
use lingua_service::{spawn_pruning_job, CredentialAuthority, ServiceContextBuilder};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router();
    let router = apply_middleware(
        router,
        &state.config().cors,
        state.config().app.env.is_production(),
    );
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&PoolConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    ensure_schema(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let mut builder = ServiceContextBuilder::new().pool(pool.clone());

    let registry: Arc<dyn RevocationRegistry> = match config.registry.backend {
        RegistryBackend::Postgres => Arc::new(PgRevocationRegistry::new(pool.clone())),
        RegistryBackend::Redis => {
            info!("Connecting to Redis...");
            let redis_pool =
                RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
            builder = builder.redis_pool(redis_pool.clone());
            Arc::new(RedisRevocationRegistry::new(redis_pool))
        }
        RegistryBackend::Memory => {
            if config.app.env.is_production() {
                warn!(
                    "Revocation registry is process-local; \
                     rotation is only exclusive within this instance"
                );
            }
            Arc::new(MemoryRevocationRegistry::new())
        }
    };
    info!(backend = ?config.registry.backend, "Revocation registry ready");

    let authority = build_authority(&config, registry);

    let service_context = builder
        .subject_repo(Arc::new(PgSubjectRepository::new(pool)))
        .authority(authority)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config))
}

/// Build the credential authority from configuration over a registry
pub fn build_authority(
    config: &AppConfig,
    registry: Arc<dyn RevocationRegistry>,
) -> CredentialAuthority {
    let jwt = JwtService::with_issuer(
        &config.jwt.secret,
        &config.jwt.issuer,
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    );
    CredentialAuthority::new(Arc::new(jwt), registry)
}

/// Serve the application on a bound listener until ctrl-c
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), AppError> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.api.address();
    let prune_every = Duration::from_secs(config.registry.prune_interval_secs);

    let state = create_app_state(config).await?;

    info!("Starting HTTP server on {}", addr);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    let pruning = spawn_pruning_job(state.authority().clone(), prune_every);
    let app = create_app(state);

    let result = run_server(app, listener).await;
    pruning.abort();
    result
}
