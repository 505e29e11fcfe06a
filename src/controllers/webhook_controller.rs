use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::{AppState, error::AppError, services::webhook_service};

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(true) => false,
    }
}

/// Decode a webhook body: url-encoded forms become a flat string map,
/// anything else is read as JSON.
pub fn parse_payload(headers: &HeaderMap, body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::EmptyPayload);
    }

    let payload = if is_form(headers) {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(body).map_err(|e| AppError::InvalidPayload(e.to_string()))?;
        Value::Object(pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect::<Map<_, _>>())
    } else {
        serde_json::from_slice(body).map_err(|e| AppError::InvalidPayload(e.to_string()))?
    };

    if is_blank(&payload) {
        return Err(AppError::EmptyPayload);
    }
    Ok(payload)
}

// POST /webhook
pub async fn post_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    tracing::info!("incoming webhook request");
    tracing::debug!(?headers, "webhook request headers");

    let payload = match parse_payload(&headers, &body) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("rejected webhook body: {e}");
            return e.into_response();
        }
    };

    match webhook_service::process_alert(&state, &payload).await {
        Ok(res) => {
            tracing::info!("sending response: 200 - {}", res.status);
            (StatusCode::OK, Json(res)).into_response()
        }
        Err(e) => {
            tracing::error!("sending response: {} - {e}", e.status_code().as_u16());
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    fn form_headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        h
    }

    #[test]
    fn blank_bodies_are_empty_payloads() {
        let h = HeaderMap::new();
        let bodies: [&[u8]; 9] = [b"", b"  \n", b"{}", b"null", b"[]", b"\"\"", b"false", b"0", b"0.0"];
        for body in bodies {
            assert!(matches!(parse_payload(&h, body), Err(AppError::EmptyPayload)));
        }
        assert!(matches!(parse_payload(&form_headers(), b""), Err(AppError::EmptyPayload)));
    }

    #[test]
    fn malformed_json_is_invalid() {
        let res = parse_payload(&HeaderMap::new(), b"{\"stocks\": ");
        assert!(matches!(res, Err(AppError::InvalidPayload(_))));
    }

    #[test]
    fn form_fields_become_strings() {
        let payload = parse_payload(&form_headers(), b"stocks=NSE%3ATCS%2CINFY&scan_name=Breakout").unwrap();
        assert_eq!(payload, json!({ "stocks": "NSE:TCS,INFY", "scan_name": "Breakout" }));
    }
}
