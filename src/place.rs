use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A saved location bookmark. Records are immutable after creation;
/// they are only ever listed or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub maps_url: String,
    pub place_id: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: String,
    /// Milliseconds since the Unix epoch, assigned server-side.
    pub created_at: i64,
}

/// One candidate from the maps provider, reshaped for the client.
/// Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub maps_url: String,
}

/// The POST /api/places body before normalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub maps_url: String,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: String,
}

impl NewPlace {
    /// Trims every string field, rejects the request if a required field
    /// is blank or a coordinate is absent, and mints the server-assigned
    /// `id` and `created_at`.
    pub fn into_place(self) -> Result<Place, AppError> {
        let name = self.name.trim().to_string();
        let maps_url = self.maps_url.trim().to_string();
        let place_id = self.place_id.trim().to_string();
        let address = self.address.trim().to_string();

        if name.is_empty() || maps_url.is_empty() || place_id.is_empty() || address.is_empty() {
            return Err(AppError::bad_request(
                "name, mapsUrl, placeId, and address are required",
            ));
        }

        let (lat, lng) = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            _ => return Err(AppError::bad_request("lat and lng are required")),
        };

        Ok(Place {
            id: Uuid::new_v4().to_string(),
            name,
            maps_url,
            place_id,
            address,
            lat,
            lng,
            note: self.note.trim().to_string(),
            tags: self.tags.trim().to_string(),
            created_at: Utc::now().timestamp_millis(),
        })
    }
}

/// Validates a fully-formed record, returning the first violated
/// constraint. Runs against every record loaded from disk: a corrupt
/// entry is fatal at startup, never silently dropped.
pub fn validate(place: &Place) -> Result<(), String> {
    let required = [
        ("id", &place.id),
        ("name", &place.name),
        ("mapsUrl", &place.maps_url),
        ("placeId", &place.place_id),
        ("address", &place.address),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(format!("Missing or invalid {field}."));
        }
    }
    if !place.lat.is_finite() || !place.lng.is_finite() {
        return Err("Missing or invalid lat/lng.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_place() -> NewPlace {
        NewPlace {
            name: "  Cafe Flora  ".to_string(),
            maps_url: "https://maps.example/cafe-flora".to_string(),
            place_id: "ChIJabc123".to_string(),
            address: "1 Main St".to_string(),
            lat: Some(47.6),
            lng: Some(-122.3),
            note: " great pastries ".to_string(),
            tags: "coffee,brunch".to_string(),
        }
    }

    #[test]
    fn creation_assigns_id_and_timestamp_and_trims() {
        let place = new_place().into_place().unwrap();
        assert!(!place.id.is_empty());
        assert!(place.created_at > 0);
        assert_eq!(place.name, "Cafe Flora");
        assert_eq!(place.note, "great pastries");
        assert_eq!(place.tags, "coffee,brunch");
    }

    #[test]
    fn blank_required_field_is_rejected() {
        for field in ["name", "maps_url", "place_id", "address"] {
            let mut input = new_place();
            match field {
                "name" => input.name = "   ".to_string(),
                "maps_url" => input.maps_url = String::new(),
                "place_id" => input.place_id = "  ".to_string(),
                _ => input.address = String::new(),
            }
            let err = input.into_place().unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{field} should be required");
        }
    }

    #[test]
    fn missing_or_non_finite_coordinates_are_rejected() {
        let mut input = new_place();
        input.lat = None;
        assert!(input.into_place().is_err());

        let mut input = new_place();
        input.lng = Some(f64::NAN);
        assert!(input.into_place().is_err());
    }

    #[test]
    fn validate_names_the_first_bad_field() {
        let mut place = new_place().into_place().unwrap();
        place.maps_url = " ".to_string();
        place.address = String::new();
        assert_eq!(validate(&place).unwrap_err(), "Missing or invalid mapsUrl.");
    }

    #[test]
    fn wire_format_is_camel_case() {
        let place = new_place().into_place().unwrap();
        let value = serde_json::to_value(&place).unwrap();
        assert!(value.get("mapsUrl").is_some());
        assert!(value.get("placeId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("maps_url").is_none());
    }
}
