use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::{
    error::AppError,
    place::{NewPlace, Place, SearchResult},
    state::AppState,
};

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn api_not_found() -> AppError {
    AppError::NotFound
}

pub async fn list_places(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Place>>, AppError> {
    let places = state.store.list().await.map_err(|e| {
        error!("failed to load places: {e:#}");
        AppError::upstream("Failed to load places")
    })?;
    Ok(Json(places))
}

pub async fn create_place(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewPlace>, JsonRejection>,
) -> Result<(StatusCode, Json<Place>), AppError> {
    let Json(new_place) = payload.map_err(|_| AppError::bad_request("Invalid JSON body"))?;
    let place = new_place.into_place()?;

    state.store.create(&place).await.map_err(|e| {
        error!("failed to save place: {e:#}");
        AppError::upstream("Failed to save place")
    })?;

    Ok((StatusCode::CREATED, Json(place)))
}

pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = state.store.delete(&id).await.map_err(|e| {
        error!("failed to delete place: {e:#}");
        AppError::upstream("Failed to delete place")
    })?;

    if !removed {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "ok": true })))
}

/// Coordinates arrive as raw query strings so that a missing value and
/// an unparseable one are rejected the same way.
#[derive(Deserialize)]
pub struct SearchParams {
    query: Option<String>,
    lat: Option<String>,
    lng: Option<String>,
}

#[derive(Deserialize)]
pub struct LocationParams {
    lat: Option<String>,
    lng: Option<String>,
}

pub async fn search_places(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, AppError> {
    let query = params.query.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return Err(AppError::bad_request("query is required"));
    }
    let (lat, lng) = parse_coords(params.lat, params.lng)?;

    let results = state.maps.search_text(query, lat, lng).await?;
    Ok(Json(results))
}

pub async fn locate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationParams>,
) -> Result<Json<Value>, AppError> {
    let (lat, lng) = parse_coords(params.lat, params.lng)?;

    let label = state.maps.reverse_geocode(lat, lng).await?;
    Ok(Json(json!({ "label": label })))
}

fn parse_coords(lat: Option<String>, lng: Option<String>) -> Result<(f64, f64), AppError> {
    let parse = |value: Option<String>| {
        value
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };
    match (parse(lat), parse(lng)) {
        (Some(lat), Some(lng)) => Ok((lat, lng)),
        _ => Err(AppError::bad_request("lat and lng are required")),
    }
}
