use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::info;

use crate::place::{self, Place};

use super::{sort_newest_first, PlaceStore};

/// Flat-file backend. The whole collection lives in one JSON document;
/// every mutation rewrites it to a temporary file and renames over the
/// canonical path, so a crash mid-write leaves the last committed state
/// untouched. Mutations are serialized through a single writer lock, so
/// two concurrent writes cannot clobber each other's state.
#[derive(Debug)]
pub struct FileStore {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    places: Vec<Place>,
}

#[derive(Serialize, Deserialize, Default)]
struct StoreDocument {
    places: Vec<Place>,
}

impl FileStore {
    /// Loads the document at `path`, validating every record. A file
    /// that fails to parse or holds an invalid record is fatal: serving
    /// a corrupted view is worse than refusing to start. A missing file
    /// is simply an empty store.
    pub async fn open(path: &Path) -> Result<Self> {
        let places = match fs::read(path).await {
            Ok(bytes) => {
                let document: StoreDocument = serde_json::from_slice(&bytes)
                    .with_context(|| format!("unreadable places file {}", path.display()))?;
                for entry in &document.places {
                    place::validate(entry).map_err(|message| {
                        anyhow::anyhow!(
                            "invalid place entry in {}: {message}",
                            path.display()
                        )
                    })?;
                }
                info!("loaded {} places from {}", document.places.len(), path.display());
                document.places
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no places file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read {}", path.display()));
            }
        };

        Ok(Self {
            inner: Mutex::new(Inner {
                path: path.to_path_buf(),
                places,
            }),
        })
    }

    /// Full-state rewrite: serialize, write `<path>.tmp`, rename. The
    /// rename is the commit point and is atomic at the filesystem level.
    async fn persist(inner: &Inner) -> Result<()> {
        let document = StoreDocument {
            places: inner.places.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;

        let tmp = tmp_path(&inner.path);
        fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("cannot write {}", tmp.display()))?;
        fs::rename(&tmp, &inner.path)
            .await
            .with_context(|| format!("cannot replace {}", inner.path.display()))?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl PlaceStore for FileStore {
    async fn list(&self) -> Result<Vec<Place>> {
        let inner = self.inner.lock().await;
        let mut places = inner.places.clone();
        sort_newest_first(&mut places);
        Ok(places)
    }

    async fn create(&self, place: &Place) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.places.push(place.clone());
        if let Err(e) = Self::persist(&inner).await {
            inner.places.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some(index) = inner.places.iter().position(|p| p.id == id) else {
            return Ok(false);
        };
        let removed = inner.places.remove(index);
        if let Err(e) = Self::persist(&inner).await {
            inner.places.insert(index, removed);
            return Err(e);
        }
        Ok(true)
    }
}
