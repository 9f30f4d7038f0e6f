use std::{path::Path, sync::Mutex};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::place::Place;

use super::PlaceStore;

/// Relational backend. Atomicity and durability are SQLite's problem;
/// this layer only translates shapes. Column names mirror the wire
/// fields in snake_case.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("cannot open sqlite database {}", path.display()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS places (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                maps_url TEXT NOT NULL,
                place_id TEXT NOT NULL,
                address TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("sqlite connection poisoned"))
    }
}

#[async_trait]
impl PlaceStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Place>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, maps_url, place_id, address, lat, lng, note, tags, created_at
             FROM places ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Place {
                id: row.get(0)?,
                name: row.get(1)?,
                maps_url: row.get(2)?,
                place_id: row.get(3)?,
                address: row.get(4)?,
                lat: row.get(5)?,
                lng: row.get(6)?,
                note: row.get(7)?,
                tags: row.get(8)?,
                created_at: row.get(9)?,
            })
        })?;

        let mut places = Vec::new();
        for place in rows {
            places.push(place?);
        }
        Ok(places)
    }

    async fn create(&self, place: &Place) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO places (id, name, maps_url, place_id, address, lat, lng, note, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                place.id,
                place.name,
                place.maps_url,
                place.place_id,
                place.address,
                place.lat,
                place.lng,
                place.note,
                place.tags,
                place.created_at,
            ],
        )?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM places WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, created_at: i64) -> Place {
        Place {
            id: id.to_string(),
            name: format!("place {id}"),
            maps_url: "https://maps.example/x".to_string(),
            place_id: format!("ChIJ{id}"),
            address: "somewhere".to_string(),
            lat: 1.0,
            lng: 2.0,
            note: "a note".to_string(),
            tags: "tag1,tag2".to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn round_trip_and_ordering() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("places.db")).unwrap();

        store.create(&sample("a", 1)).await.unwrap();
        store.create(&sample("b", 3)).await.unwrap();
        store.create(&sample("c", 2)).await.unwrap();

        let listed = store.list().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert_eq!(listed[0], sample("b", 3), "fields survive the round trip");
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("places.db")).unwrap();

        store.create(&sample("a", 1)).await.unwrap();
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert!(!store.delete("never-existed").await.unwrap());
    }
}
