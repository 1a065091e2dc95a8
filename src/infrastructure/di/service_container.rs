//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::application::services::{SessionService, TreeStore};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::traits::{
    FileSystem, JsonCodec, Operator, RealFileSystem, TerminalOperator, TreeCodec,
};

/// Container holding the settings and I/O ports services are built from.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Tree byte codec
    pub codec: Arc<dyn TreeCodec>,

    /// Prompt/print boundary
    pub operator: Arc<dyn Operator>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(JsonCodec),
            Arc::new(TerminalOperator),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        codec: Arc<dyn TreeCodec>,
        operator: Arc<dyn Operator>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            codec,
            operator,
        }
    }

    pub fn tree_store(&self) -> TreeStore {
        TreeStore::new(self.fs.clone(), self.codec.clone())
    }

    /// Session driven by a seeded generator when `seed` is configured.
    pub fn session(&self) -> ApplicationResult<SessionService<StdRng>> {
        let rng = match self.settings.seed {
            Some(seed) => {
                debug!("session rng seeded with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };
        Ok(SessionService::new(
            self.operator.clone(),
            self.settings.policy,
            rng,
        )?)
    }
}
