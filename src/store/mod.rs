use anyhow::Result;
use async_trait::async_trait;

use crate::{
    config::{Config, StoreBackend},
    place::Place,
};

pub mod file;
pub mod redis;
pub mod sqlite;

/// The persistence seam. All three backends are functionally a map keyed
/// by place id; the trait is the only place the rest of the server sees.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// All saved places, newest first.
    async fn list(&self) -> Result<Vec<Place>>;

    /// Durably appends one record. Ids are high-entropy and generated by
    /// the caller, so collisions are not handled beyond overwrite.
    async fn create(&self, place: &Place) -> Result<()>;

    /// Removes a record. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Opens the backend named by the configuration. A backend that cannot
/// load its persisted state refuses to open, which aborts startup.
pub async fn open(config: &Config) -> Result<Box<dyn PlaceStore>> {
    Ok(match config.backend {
        StoreBackend::File => Box::new(file::FileStore::open(&config.places_file).await?),
        StoreBackend::Sqlite => Box::new(sqlite::SqliteStore::open(&config.sqlite_path)?),
        StoreBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("REDIS_URL is required for the redis backend"))?;
            Box::new(redis::RedisStore::open(url).await?)
        }
    })
}

pub fn sort_newest_first(places: &mut [Place]) {
    places.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
