use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;

/// Error bodies are small; anything larger is passed through untouched.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Add `"path": <request path>` to every JSON error object.
///
/// Successful responses and non-JSON bodies are returned unchanged.
pub async fn add_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, %path, "Could not buffer error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    fields.insert("path".to_string(), Value::String(path));

    match serde_json::to_vec(&Value::Object(fields)) {
        Ok(stamped) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(stamped))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}
