use crate::models::ApiError;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{self, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, convert::Infallible, sync::Arc};
use tracing::{info, warn};

/// API-key gate for the `/api` routes.
///
/// With no keys configured the gate is open, which suits a dashboard running
/// next to the service on localhost.
#[derive(Clone, Default)]
pub struct AuthState {
    keys: Arc<HashMap<String, AuthContext>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
    pub client_id: String,
}

impl AuthContext {
    fn anonymous() -> Self {
        Self {
            client_id: "anonymous".into(),
        }
    }
}

impl AuthState {
    /// Parses `client:key` pairs separated by commas.
    pub fn from_config(raw: Option<&str>) -> Self {
        let mut keys = HashMap::new();
        for entry in raw.unwrap_or_default().split(',').map(str::trim) {
            if entry.is_empty() {
                continue;
            }
            match entry.split_once(':').map(|(c, k)| (c.trim(), k.trim())) {
                Some((client, key)) if !client.is_empty() && !key.is_empty() => {
                    keys.insert(
                        key.to_string(),
                        AuthContext {
                            client_id: client.to_string(),
                        },
                    );
                }
                _ => warn!(
                    target = "optimizer.api",
                    "ignored malformed OPTIMIZER_API_KEYS entry"
                ),
            }
        }

        if keys.is_empty() {
            warn!(
                target = "optimizer.api",
                "no API keys configured; /api routes are open"
            );
        } else {
            info!(
                target = "optimizer.api",
                key_count = keys.len(),
                "loaded API keys"
            );
        }
        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    fn authenticate(&self, presented: &str) -> Option<AuthContext> {
        self.keys.get(presented).cloned()
    }
}

pub async fn require_api_auth(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Infallible> {
    if !state.is_enabled() {
        request.extensions_mut().insert(AuthContext::anonymous());
        return Ok(next.run(request).await);
    }

    let Some(presented) = extract_api_key(request.headers()) else {
        return Ok(unauthorized_response(
            "missing_api_key",
            "Provide X-Optimizer-Key or Bearer token",
        ));
    };
    let Some(context) = state.authenticate(&presented) else {
        return Ok(unauthorized_response("invalid_api_key", "Key not recognized"));
    };

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn extract_api_key(headers: &http::HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(http::header::AUTHORIZATION)
        && let Ok(raw) = value.to_str()
        && raw.len() >= 7
        && raw[..6].eq_ignore_ascii_case("bearer")
    {
        return Some(raw[6..].trim().to_string());
    }
    headers
        .get("X-Optimizer-Key")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn unauthorized_response(code: &str, message: &str) -> Response {
    let payload = ApiError {
        error: code.to_string(),
        detail: Some(message.to_string()),
    };
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}
