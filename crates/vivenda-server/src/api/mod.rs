mod chat;
mod leads;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use vivenda_ai::ProviderClient;

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ai: Arc<ProviderClient>,
    pub site_origin: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &vivenda_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Digits only; the canonical phone representation everywhere.
pub(super) fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn build_cors() -> CorsLayer {
    // The widget embeds on arbitrary property-listing pages.
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<HealthData>>, ApiError> {
    vivenda_db::health_check(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: HealthData {
            status: "ok",
            database: "up",
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[must_use]
pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/leads", post(leads::create_lead))
        .route("/api/chat", post(chat::chat))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_phone_strips_punctuation() {
        assert_eq!(normalize_phone("(62) 99999-1234"), "62999991234");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn error_codes_map_to_statuses() {
        let bad = ApiError::new("r1", "bad_request", "nope").into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let internal = ApiError::new("r2", "internal_error", "boom").into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    use vivenda_ai::{ChatCompletionClient, CompletionRequest};
    use vivenda_core::ChatMessage;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// The widget client must decode what this server actually answers.
    #[tokio::test]
    async fn widget_client_decodes_the_chat_envelope() {
        let provider = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Temos três opções."}}]
            })))
            .mount(&provider)
            .await;

        let state = AppState {
            // Never touched: skipLeadCreation bypasses the upsert.
            pool: sqlx::postgres::PgPoolOptions::new()
                .connect_lazy("postgres://localhost/unused")
                .unwrap(),
            ai: Arc::new(
                ProviderClient::new(&provider.uri(), None, "gpt-4o-mini", 5).unwrap(),
            ),
            site_origin: "site".to_owned(),
        };
        let app = build_app(state, default_rate_limit_state());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client =
            ChatCompletionClient::new(&format!("http://{addr}/api/chat"), 5).unwrap();
        let reply = client
            .reply(&CompletionRequest {
                messages: vec![ChatMessage::user("quero um apartamento")],
                client_name: None,
                client_phone: None,
                origin: "site".to_owned(),
                page_url: None,
                page_context: None,
                skip_lead_creation: true,
            })
            .await;
        assert_eq!(reply, "Temos três opções.");
    }

    #[test]
    fn envelope_serializes_data_and_meta() {
        let response = ApiResponse {
            data: HealthData {
                status: "ok",
                database: "up",
            },
            meta: ResponseMeta::new("req-1".to_owned()),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-1");
    }
}
