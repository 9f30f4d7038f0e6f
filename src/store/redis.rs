use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};

use crate::place::Place;

use super::{sort_newest_first, PlaceStore};

const PLACES_KEY: &str = "places";

/// Document-store backend: one hash keyed by place id, each field a
/// JSON-encoded record. Redis owns atomicity per command.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn open(url: &str) -> Result<Self> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(100));

        let client = Client::open(url).context("invalid redis URL")?;
        let conn = client
            .get_connection_manager_with_config(config)
            .await
            .context("cannot connect to redis")?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl PlaceStore for RedisStore {
    async fn list(&self) -> Result<Vec<Place>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.hvals(PLACES_KEY).await?;

        let mut places = Vec::with_capacity(raw.len());
        for entry in raw {
            let place: Place =
                serde_json::from_str(&entry).context("invalid place entry in redis")?;
            places.push(place);
        }
        sort_newest_first(&mut places);
        Ok(places)
    }

    async fn create(&self, place: &Place) -> Result<()> {
        let mut conn = self.conn.clone();
        let encoded = serde_json::to_string(place)?;
        let _: () = conn.hset(PLACES_KEY, &place.id, encoded).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.hdel(PLACES_KEY, id).await?;
        Ok(removed > 0)
    }
}
