use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InviteParams {
    /// Client-correlation identifier. Absent or blank means the caller wants
    /// a fresh identity (and always a fresh code).
    pub uuid: Option<String>,
}

pub async fn issue_invite(
    state: State<AppState>,
    Query(params): Query<InviteParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let client_id = params.uuid.filter(|id| !id.trim().is_empty());
    let issued = state.issuer.handle(client_id).await?;

    Ok(Json(serde_json::json!({
        "uuid": issued.record.uuid,
        "code": issued.record.code,
        "expiresAt": issued.record.expires_at,
        "cached": issued.cached,
        "serverTime": state.clock.now_ms(),
    })))
}
