use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::auth::{IdentityResolver, PgSessionResolver, StaticIdentityResolver};
use crate::config::{Config, StoreBackend};
use crate::models::PageLimits;
use crate::services::{EventMutationService, EventQueryEngine};
use crate::store::{EventStore, MemoryEventStore, PgEventStore, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub queries: EventQueryEngine,
    pub mutations: EventMutationService,
    pub identity: Arc<dyn IdentityResolver>,
    pub session_cookie: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EventStore>,
        identity: Arc<dyn IdentityResolver>,
        limits: PageLimits,
        session_cookie: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            queries: EventQueryEngine::new(store.clone(), limits),
            mutations: EventMutationService::new(store),
            identity,
            session_cookie: session_cookie.into(),
        }
    }

    /// Wires the configured backend. For PostgreSQL this connects the pool and
    /// runs pending migrations.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let (store, identity): (Arc<dyn EventStore>, Arc<dyn IdentityResolver>) =
            match config.backend {
                StoreBackend::Postgres => {
                    let pool = PgPoolOptions::new()
                        .max_connections(config.max_connections)
                        .connect(&config.database_url)
                        .await?;
                    tracing::info!("Successfully connected to database");

                    sqlx::migrate!().run(&pool).await?;
                    tracing::info!("Migrations run successfully");

                    let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool.clone()));
                    let identity: Arc<dyn IdentityResolver> =
                        Arc::new(PgSessionResolver::new(pool));
                    (store, identity)
                }
                StoreBackend::Memory => {
                    let sessions = StaticIdentityResolver::parse(&config.static_sessions);
                    tracing::warn!(
                        sessions = sessions.len(),
                        "Using the in-memory event store; data is lost on restart"
                    );
                    let store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new());
                    let identity: Arc<dyn IdentityResolver> = Arc::new(sessions);
                    (store, identity)
                }
            };

        Ok(Self::new(
            store,
            identity,
            config.page_limits,
            config.session_cookie_name.as_str(),
        ))
    }
}
