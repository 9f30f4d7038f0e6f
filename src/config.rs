use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

pub const PLACES_TEXT_SEARCH_URL: &str = "https://places.googleapis.com/v1/places:searchText";
pub const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Which persistence backend to open at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Sqlite,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("unknown backend '{other}', expected file|sqlite|redis")),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// SHA-256 of the configured PIN. The raw PIN is never kept.
    pub pin_digest: [u8; 32],
    pub maps_api_key: String,
    pub backend: StoreBackend,
    pub places_file: PathBuf,
    pub sqlite_path: PathBuf,
    pub redis_url: Option<String>,
    pub assets_dir: PathBuf,
    pub search_url: String,
    pub geocode_url: String,
}

impl Config {
    /// Loads all settings from the environment. Any missing or malformed
    /// required value aborts the process before it can serve traffic.
    pub fn load() -> Self {
        let pin = require("APP_PIN");
        if !is_valid_pin(&pin) {
            warn!("APP_PIN must be exactly 6 digits");
        }
        assert!(is_valid_pin(&pin), "Environment misconfigured!");

        let backend: StoreBackend = try_load("STORE_BACKEND", "file");
        let redis_url = match backend {
            StoreBackend::Redis => Some(require("REDIS_URL")),
            _ => env::var("REDIS_URL").ok(),
        };

        let port = require("PORT")
            .parse()
            .map_err(|e| {
                warn!("Invalid PORT value: {e}");
            })
            .expect("Environment misconfigured!");

        Self {
            port,
            pin_digest: Sha256::digest(pin.as_bytes()).into(),
            maps_api_key: require("GOOGLE_MAPS_API_KEY"),
            backend,
            places_file: try_load("PLACES_FILE", "places.json"),
            sqlite_path: try_load("SQLITE_PATH", "places.db"),
            redis_url,
            assets_dir: try_load("ASSETS_DIR", "public"),
            search_url: PLACES_TEXT_SEARCH_URL.to_string(),
            geocode_url: GEOCODE_URL.to_string(),
        }
    }
}

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 6 && pin.bytes().all(|b| b.is_ascii_digit())
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found");
    })
}

fn require(key: &str) -> String {
    let value = var(key).map(|s| s.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        warn!("{key} is required and must not be blank");
    }
    assert!(!value.is_empty(), "Environment misconfigured!");
    value
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
