//! # Container
//!
//! Wires the database to the repository and hands out one shared
//! repository per process.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Container Lifecycle                              │
//! │                                                                         │
//! │  get_repository(&config)          (any thread, any number of callers)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  APP_CONTAINER ── first caller's config wins, later configs ignored    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppDataContainer::items_repository()                                  │
//! │       │  database: OnceCell ── Database::new runs at most once         │
//! │       │  items_repository: OnceCell ── built at most once              │
//! │       ▼                                                                 │
//! │  Arc<dyn ItemsRepository>  (same instance for every caller)            │
//! │                                                                         │
//! │  Teardown: none. The pool lives until the process exits.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Racing first callers wait on the same initialization; a failed
//! initialization leaves the cell empty so the next caller retries.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::pool::{Database, DbConfig};
use crate::repository::{ItemsRepository, OfflineItemsRepository};

static APP_CONTAINER: OnceLock<AppDataContainer> = OnceLock::new();

/// What consumers hold to reach the repository.
///
/// Screens depend on `dyn AppContainer`, so tests can hand them a container
/// over an in-memory database (or any other backend).
#[async_trait]
pub trait AppContainer: Send + Sync {
    /// The shared items repository, built on first call.
    async fn items_repository(&self) -> DbResult<Arc<dyn ItemsRepository>>;
}

// =============================================================================
// AppDataContainer
// =============================================================================

/// Lazily built database and repository for one configuration.
///
/// ## Usage
/// ```rust,ignore
/// let container = AppDataContainer::new(DbConfig::new("./inventory.db"));
/// let repo = container.items_repository().await?;
/// ```
pub struct AppDataContainer {
    config: DbConfig,
    database: OnceCell<Database>,
    items_repository: OnceCell<Arc<dyn ItemsRepository>>,
}

impl AppDataContainer {
    /// Creates a container. Nothing is opened until first access.
    pub fn new(config: DbConfig) -> Self {
        AppDataContainer {
            config,
            database: OnceCell::new(),
            items_repository: OnceCell::new(),
        }
    }

    /// Configuration this container opens the database with.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Returns the database, opening it on first call.
    pub async fn database(&self) -> DbResult<&Database> {
        self.database
            .get_or_try_init(|| async {
                debug!(
                    path = %self.config.database_path.display(),
                    "Container building database"
                );
                Database::new(self.config.clone()).await
            })
            .await
    }

    /// Returns the shared repository, building it on first call.
    ///
    /// ## Returns
    /// * `Ok(repo)` - The same `Arc` on every call
    /// * `Err(DbError)` - The database could not be opened
    pub async fn items_repository(&self) -> DbResult<Arc<dyn ItemsRepository>> {
        let repo = self
            .items_repository
            .get_or_try_init(|| async {
                let db = self.database().await?;
                let repo: Arc<dyn ItemsRepository> =
                    Arc::new(OfflineItemsRepository::new(db.items()));
                Ok::<_, DbError>(repo)
            })
            .await?;

        Ok(repo.clone())
    }

    /// True once the repository has been built.
    pub fn is_initialized(&self) -> bool {
        self.items_repository.initialized()
    }
}

#[async_trait]
impl AppContainer for AppDataContainer {
    async fn items_repository(&self) -> DbResult<Arc<dyn ItemsRepository>> {
        AppDataContainer::items_repository(self).await
    }
}

impl std::fmt::Debug for AppDataContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppDataContainer")
            .field("config", &self.config)
            .field("database", &self.database.get())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

// =============================================================================
// Process-wide access
// =============================================================================

/// Returns the process-wide container, creating it with `config` on first
/// call.
pub fn app_container(config: &DbConfig) -> &'static AppDataContainer {
    let container = APP_CONTAINER.get_or_init(|| AppDataContainer::new(config.clone()));

    if container.config() != config {
        warn!(
            requested = %config.database_path.display(),
            active = %container.config().database_path.display(),
            "Container already initialized with a different config"
        );
    }

    container
}

/// Returns the process-wide items repository.
///
/// Idempotent: every call in a process returns the same instance. Only the
/// first caller's `config` is used.
pub async fn get_repository(config: &DbConfig) -> DbResult<Arc<dyn ItemsRepository>> {
    app_container(config).items_repository().await
}
