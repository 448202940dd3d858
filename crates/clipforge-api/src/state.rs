//! Application state.

use std::sync::Arc;

use clipforge_db::{Database, DbConfig};
use clipforge_storage::ObjectStore;
use clipforge_worker::{JobOrchestrator, ProcessingContext, Sweeper, WorkerConfig};

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::middleware::RateLimiterCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub db: Database,
    pub storage: Arc<dyn ObjectStore>,
    pub orchestrator: JobOrchestrator,
    pub tokens: Arc<TokenVerifier>,
    pub rate_limiter: Arc<RateLimiterCache>,
}

impl AppState {
    /// Connect every collaborator from the environment.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let db = Database::connect(&DbConfig::from_env()).await?;
        let ctx = ProcessingContext::from_env(WorkerConfig::from_env(), db).await?;
        Ok(Self::from_context(config, ctx))
    }

    /// Assemble state around an existing processing context.
    pub fn from_context(config: ApiConfig, ctx: ProcessingContext) -> Self {
        let tokens = Arc::new(TokenVerifier::new(config.jwt_secret.as_deref()));
        let rate_limiter = Arc::new(RateLimiterCache::new(config.rate_limit_rps));
        Self {
            config: Arc::new(config),
            db: ctx.db.clone(),
            storage: Arc::clone(&ctx.storage),
            orchestrator: JobOrchestrator::new(ctx),
            tokens,
            rate_limiter,
        }
    }

    /// Background sweeper sharing this state's clients.
    pub fn sweeper(&self) -> Sweeper {
        let ctx = self.orchestrator.context();
        Sweeper::new(self.db.clone(), Arc::clone(&self.storage), Arc::clone(&ctx.config))
    }
}
