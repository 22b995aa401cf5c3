use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use vivenda_core::{ChatMessage, ChatRole};
use vivenda_db::{upsert_lead_by_phone, NewLead};

use crate::middleware::RequestId;

use super::{normalize_phone, ApiError, ApiResponse, AppState, ResponseMeta};

const SYSTEM_PROMPT: &str = "Você é um assistente virtual de uma imobiliária brasileira. Responda de \
     forma curta e cordial, ajudando o visitante a encontrar um imóvel. \
     Nunca peça dados pessoais de forma insistente.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatPayload {
    pub messages: Vec<ChatMessage>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub origin: Option<String>,
    pub page_url: Option<String>,
    pub page_context: Option<String>,
    #[serde(default)]
    pub skip_lead_creation: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatReply {
    pub reply: String,
}

/// Conversation endpoint behind the widget.
///
/// The lead capture is a side effect and must never fail the reply: upsert
/// errors are logged and swallowed.
pub(super) async fn chat(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ApiResponse<ChatReply>>, ApiError> {
    if !payload.skip_lead_creation {
        save_lead_silently(&state, &payload).await;
    }

    let prompt = render_transcript(&payload);
    let reply = state
        .ai
        .generate(SYSTEM_PROMPT, &prompt)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "completion provider failed");
            ApiError::new(req_id.0.clone(), "internal_error", "completion failed")
        })?;

    Ok(Json(ApiResponse {
        data: ChatReply { reply },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn save_lead_silently(state: &AppState, payload: &ChatPayload) {
    let Some(raw_phone) = payload.client_phone.as_deref() else {
        return;
    };
    let phone = normalize_phone(raw_phone);
    if phone.len() < 10 {
        return;
    }

    let lead = NewLead {
        name: payload.client_name.clone().filter(|n| !n.trim().is_empty()),
        phone,
        origin: payload
            .origin
            .clone()
            .unwrap_or_else(|| state.site_origin.clone()),
        property_type: None,
        intent: None,
    };

    match upsert_lead_by_phone(&state.pool, &lead).await {
        Ok(row) => tracing::debug!(lead_id = row.id, "lead upserted from chat"),
        Err(e) => tracing::warn!(error = %e, "silent lead upsert failed; reply continues"),
    }
}

/// Flattens the window of recent messages into one prompt for `generate`.
fn render_transcript(payload: &ChatPayload) -> String {
    let mut prompt = String::new();
    if let Some(url) = &payload.page_url {
        prompt.push_str(&format!("Página atual: {url}\n"));
    }
    if let Some(context) = &payload.page_context {
        prompt.push_str(&format!("Contexto da página: {context}\n"));
    }
    if let Some(name) = &payload.client_name {
        prompt.push_str(&format!("Nome do visitante: {name}\n"));
    }
    prompt.push_str("Conversa até aqui:\n");
    for message in &payload.messages {
        let speaker = match message.role {
            ChatRole::User => "Visitante",
            ChatRole::Assistant => "Assistente",
            ChatRole::System => "Sistema",
        };
        prompt.push_str(&format!("{speaker}: {}\n", message.content));
    }
    prompt.push_str("Responda à última mensagem do visitante.");
    prompt
}
