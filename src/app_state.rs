use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    core::{Clock, SystemClock},
    data_seeder::SeedDataset,
    infrastructure::{
        repository::EntityRepository, request_simulator::RequestSimulator,
        viewer::AnonymousIdentity,
    },
    portal::PortalService,
};

#[derive(Clone)]
pub struct AppState {
    pub portal: PortalService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(config: Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        // Load seed data
        let seed = match &config.seed.path {
            Some(path) => SeedDataset::from_path(path).await?,
            None => SeedDataset::builtin()?,
        };

        let repository = EntityRepository::new(seed, clock);
        let simulator = RequestSimulator::new(config.latency.build());

        let portal = PortalService::new(
            repository,
            simulator,
            Arc::new(AnonymousIdentity::new()),
            config.registration_policy,
            config.analytics,
        );
        info!(
            "Portal ready (latency {:?}, analytics {:?}, registration {:?})",
            config.latency.mode, config.analytics, config.registration_policy
        );

        Ok(Self { portal, config })
    }
}
