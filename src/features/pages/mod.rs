pub mod actions;
pub mod first_image;
pub mod model;
pub mod schema;
pub mod service;
pub mod upload;

use crate::AppState;
use crate::domain::scope::parse_operation_name;
use crate::domain::{Actor, RequestContext};
use crate::error::PageError;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
};
use http::{HeaderMap, StatusCode, header::ACCEPT_LANGUAGE};
use serde_json::{Value, json};

pub const USER_HEADER: &str = "x-portal-user";

pub fn pages_router() -> Router<AppState> {
    Router::new().route("/action/{action}", post(action_handler))
}

async fn action_handler(
    State(state): State<AppState>,
    Path(action): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let ctx = request_context(&headers, &state.config.default_lang);

    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadJson(e.to_string()))?
    };

    let result = if action == "pages_upload" {
        state.service.run_upload(&ctx, payload).await?
    } else {
        let (kind, op) =
            parse_operation_name(&action).ok_or_else(|| ApiError::UnknownAction(action.clone()))?;
        state.service.run(kind, op, &ctx, payload).await?
    };

    Ok(Json(json!({ "success": true, "result": result })))
}

/// Actor from `X-Portal-User`, language from the first `Accept-Language` tag.
pub fn request_context(headers: &HeaderMap, default_lang: &str) -> RequestContext {
    let actor = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Actor::new(name, name));

    let lang = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(primary_language)
        .unwrap_or_else(|| default_lang.to_string());

    RequestContext::new(actor, lang)
}

// "pt-BR,pt;q=0.9" -> "pt_BR"
fn primary_language(header: &str) -> Option<String> {
    let tag = header.split(',').next()?.split(';').next()?.trim();
    if tag.is_empty() || tag == "*" {
        return None;
    }
    Some(tag.replace('-', "_"))
}

#[derive(Debug)]
pub enum ApiError {
    Page(PageError),
    UnknownAction(String),
    BadJson(String),
}

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        ApiError::Page(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Page(PageError::Unauthorized(msg)) => (
                StatusCode::UNAUTHORIZED,
                json!({ "__type": "Authorization Error", "message": msg }),
            ),
            ApiError::Page(PageError::Validation(errors)) => {
                let mut body = json!({ "__type": "Validation Error" });
                if let (Some(obj), Ok(Value::Object(fields))) =
                    (body.as_object_mut(), serde_json::to_value(&errors))
                {
                    obj.extend(fields);
                }
                (StatusCode::BAD_REQUEST, body)
            }
            ApiError::Page(PageError::NotFound(msg)) => (
                StatusCode::NOT_FOUND,
                json!({ "__type": "Not Found Error", "message": msg }),
            ),
            ApiError::Page(PageError::Storage(err)) => {
                tracing::error!("Page store failure: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "__type": "Internal Error", "message": "Internal server error" }),
                )
            }
            ApiError::UnknownAction(name) => (
                StatusCode::NOT_FOUND,
                json!({ "__type": "Not Found Error", "message": format!("Action {} not found", name) }),
            ),
            ApiError::BadJson(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "__type": "Validation Error", "payload": [msg] }),
            ),
        };

        (status, Json(json!({ "success": false, "error": error }))).into_response()
    }
}
