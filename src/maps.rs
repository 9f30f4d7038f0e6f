use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{config::Config, error::AppError, place::SearchResult};

/// Bias circle for text search, centered on the caller.
const SEARCH_RADIUS_METERS: f64 = 8000.0;

const SEARCH_FIELD_MASK: &str =
    "places.id,places.displayName,places.formattedAddress,places.location";

/// Matches JavaScript's encodeURIComponent: everything but alphanumerics
/// and - _ . ! ~ * ' ( ) is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Stateless pass-through to the maps provider. Both calls are strict:
/// any transport failure or missing field fails the whole request with
/// a 502, and nothing is ever retried.
pub struct MapsClient {
    http: Client,
    api_key: String,
    search_url: String,
    geocode_url: String,
}

#[derive(Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    id: Option<String>,
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    location: Option<LatLng>,
}

#[derive(Deserialize)]
struct LocalizedText {
    text: Option<String>,
}

#[derive(Deserialize)]
struct LatLng {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Deserialize, Default)]
struct GeocodeResponse {
    status: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
}

impl MapsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            api_key: config.maps_api_key.clone(),
            search_url: config.search_url.clone(),
            geocode_url: config.geocode_url.clone(),
        }
    }

    /// Text search biased around the caller's position. Every candidate
    /// must be fully formed; one malformed entry fails the whole call
    /// rather than returning partial results.
    pub async fn search_text(
        &self,
        query: &str,
        lat: f64,
        lng: f64,
    ) -> Result<Vec<SearchResult>, AppError> {
        let body = json!({
            "textQuery": query,
            "locationBias": {
                "circle": {
                    "center": { "latitude": lat, "longitude": lng },
                    "radius": SEARCH_RADIUS_METERS,
                }
            }
        });

        let response = self
            .http
            .post(&self.search_url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", SEARCH_FIELD_MASK)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("maps search request failed: {e}");
                AppError::upstream("Google Maps search failed")
            })?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("maps search failed: {detail}");
            return Err(AppError::upstream("Google Maps search failed"));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            error!("maps search returned unparseable body: {e}");
            AppError::upstream("Google Maps search response missing data")
        })?;

        shape_search_results(parsed)
    }

    /// A single formatted address for a coordinate pair.
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<String, AppError> {
        let url = format!(
            "{}?latlng={lat},{lng}&key={}",
            self.geocode_url, self.api_key
        );

        let response = self.http.get(&url).send().await.map_err(|e| {
            error!("geocoding request failed: {e}");
            AppError::upstream("Geocoding failed")
        })?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("geocoding failed: {detail}");
            return Err(AppError::upstream("Geocoding failed"));
        }

        let parsed: GeocodeResponse = response.json().await.map_err(|e| {
            error!("geocoding returned unparseable body: {e}");
            AppError::upstream("Geocoding response missing address")
        })?;

        shape_geocode_label(parsed)
    }
}

fn shape_search_results(response: SearchResponse) -> Result<Vec<SearchResult>, AppError> {
    let mut results = Vec::with_capacity(response.places.len());

    for candidate in response.places {
        let shaped = (|| {
            let place_id = non_blank(candidate.id)?;
            let name = non_blank(candidate.display_name.and_then(|d| d.text))?;
            let address = non_blank(candidate.formatted_address)?;
            let location = candidate.location?;
            let lat = location.latitude.filter(|v| v.is_finite())?;
            let lng = location.longitude.filter(|v| v.is_finite())?;
            let maps_url = build_maps_url(&place_id, &name, &address);
            Some(SearchResult {
                place_id,
                name,
                address,
                lat,
                lng,
                maps_url,
            })
        })();

        match shaped {
            Some(result) => results.push(result),
            None => {
                error!("maps search candidate missing required fields");
                return Err(AppError::upstream("Google Maps search response missing data"));
            }
        }
    }

    Ok(results)
}

fn shape_geocode_label(response: GeocodeResponse) -> Result<String, AppError> {
    let status = response.status.unwrap_or_default();
    let label = response
        .results
        .into_iter()
        .next()
        .and_then(|r| r.formatted_address)
        .filter(|a| !a.trim().is_empty());

    match label {
        Some(label) if status == "OK" => Ok(label),
        _ => {
            error!("geocoding response missing address, status {status}");
            Err(AppError::upstream("Geocoding response missing address"))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Deep link into the maps application for a named place.
pub fn build_maps_url(place_id: &str, name: &str, address: &str) -> String {
    let query = format!("{name} {address}");
    let encoded = utf8_percent_encode(query.trim(), URI_COMPONENT);
    format!(
        "https://www.google.com/maps/search/?api=1&query={encoded}&query_place_id={place_id}"
    )
}
