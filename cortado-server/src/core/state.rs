use std::sync::Arc;

use anyhow::Context;

use crate::catalog::CatalogService;
use crate::core::Config;
use crate::orders::manager::OrdersManager;
use crate::stock::StockLedger;
use crate::storage::PosStorage;

/// Shared handles to every service, cloned into each request.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: PosStorage,
    pub catalog: Arc<CatalogService>,
    pub orders: Arc<OrdersManager>,
    pub ledger: Arc<StockLedger>,
}

impl ServerState {
    /// Open storage, warm the catalog caches and wire up the services.
    pub fn initialize(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;

        let storage = PosStorage::open(config.db_path())
            .with_context(|| format!("opening database at {}", config.db_path().display()))?;

        let catalog = Arc::new(CatalogService::new(storage.clone()));
        catalog.warmup().context("warming up catalog caches")?;

        let ledger = Arc::new(StockLedger::new(storage.clone()));
        let orders = Arc::new(OrdersManager::new(
            storage.clone(),
            catalog.clone(),
            ledger.clone(),
        ));

        Ok(Self {
            config,
            storage,
            catalog,
            orders,
            ledger,
        })
    }
}
