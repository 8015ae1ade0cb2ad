//! Tenant profile endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::directory::{Profile, ProfileRepository};
use crate::error::AppError;
use crate::middleware::Tenant;
use crate::state::AppState;

/// Build the profile router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/profile", get(get_profile).post(save_profile))
}

/// Fetch the tenant's profile; a missing row is an empty profile, not an
/// error.
async fn get_profile(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    let profile = ProfileRepository::new(state.directory()).get(&tenant).await?;
    Ok(Json(profile))
}

/// Upsert the tenant's profile wholesale.
async fn save_profile(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Json(body): Json<Profile>,
) -> Result<Json<serde_json::Value>, AppError> {
    ProfileRepository::new(state.directory())
        .upsert(&tenant, &body)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
