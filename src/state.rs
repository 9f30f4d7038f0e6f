use std::sync::Arc;

use tracing::error;

use crate::{config::Config, maps::MapsClient, store::PlaceStore};

/// Everything a handler needs, built once at startup and shared by
/// reference. Nothing here is ambient or mutable process-wide state,
/// so tests can assemble a fixture with `with_parts`.
pub struct AppState {
    pub config: Config,
    pub store: Box<dyn PlaceStore>,
    pub maps: MapsClient,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store = match crate::store::open(&config).await {
            Ok(store) => store,
            Err(e) => {
                error!("cannot open place store: {e:#}");
                std::process::exit(1);
            }
        };

        Self::with_parts(config, store)
    }

    pub fn with_parts(config: Config, store: Box<dyn PlaceStore>) -> Arc<Self> {
        let maps = MapsClient::new(&config);
        Arc::new(Self {
            config,
            store,
            maps,
        })
    }
}
