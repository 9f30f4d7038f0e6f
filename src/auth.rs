use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::{error::AppError, state::AppState};

pub const PIN_HEADER: &str = "x-pin";

pub fn digest_pin(pin: &str) -> [u8; 32] {
    Sha256::digest(pin.as_bytes()).into()
}

/// Checks the supplied credential against the configured digest.
/// Both sides are hashed to a fixed size first, so the comparison never
/// branches on the secret's contents.
pub fn verify_pin(supplied: Option<&str>, expected: &[u8; 32]) -> Result<(), AppError> {
    let pin = supplied.unwrap_or("").trim();
    if pin.is_empty() {
        return Err(AppError::PinMissing);
    }
    if !constant_time_eq(&digest_pin(pin), expected) {
        return Err(AppError::PinInvalid);
    }
    Ok(())
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware in front of every `/api` route except `/api/health`.
pub async fn require_pin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let supplied = request
        .headers()
        .get(PIN_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_pin(supplied, &state.config.pin_digest)?;
    Ok(next.run(request).await)
}
