use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vivenda_db::{upsert_lead_by_phone, NewLead};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_phone, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateLeadPayload {
    pub client_name: Option<String>,
    pub client_phone: String,
    pub origin: Option<String>,
    pub property_type: Option<String>,
    pub intent: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LeadItem {
    pub id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub followup_stage: i32,
    pub created_at: DateTime<Utc>,
}

/// The widget's silent save endpoint. Idempotent per phone.
pub(super) async fn create_lead(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<Json<ApiResponse<LeadItem>>, ApiError> {
    let phone = normalize_phone(&payload.client_phone);
    if phone.len() < 10 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "clientPhone must carry at least 10 digits (DDD + number)",
        ));
    }

    let lead = NewLead {
        name: payload.client_name.filter(|n| !n.trim().is_empty()),
        phone,
        origin: payload.origin.unwrap_or_else(|| state.site_origin.clone()),
        property_type: payload.property_type,
        intent: payload.intent,
    };

    let row = upsert_lead_by_phone(&state.pool, &lead)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(lead_id = row.id, origin = %row.origin, "lead captured");

    Ok(Json(ApiResponse {
        data: LeadItem {
            id: row.id,
            name: row.name,
            phone: row.phone,
            status: row.status,
            followup_stage: row.followup_stage,
            created_at: row.created_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
