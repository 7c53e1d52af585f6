//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse,
    HealthResponse,
};
use common::ServiceError;
use solace_crypto::{AeadError, EncryptedField, SecretKey};
use tracing::warn;
use zeroize::Zeroizing;

use super::state::AppState;

/// `POST /encrypt` — encrypt a base64 plaintext under the service key.
///
/// Every call gets a fresh random nonce; callers sharing the service key
/// never choose one. Returns the result as a `v1.<nonce>.<ciphertext>.<tag>`
/// field.
pub async fn encrypt(State(state): State<AppState>, Json(req): Json<EncryptRequest>) -> Response {
    match encrypt_inner(&state, req).await {
        Ok(field) => (StatusCode::OK, Json(EncryptResponse { field })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn encrypt_inner(state: &AppState, req: EncryptRequest) -> Result<String, ServiceError> {
    let key = current_key(state).await?;
    let plaintext = Zeroizing::new(decode_b64(&req.plaintext, "plaintext")?);
    let associated_data = decode_optional(req.associated_data.as_deref(), "associated_data")?;

    let field = EncryptedField::seal(&plaintext, key.as_bytes(), &associated_data)
        .map_err(|e| {
            warn!(error = %e, "encryption failed");
            map_aead_error(e)
        })?;
    Ok(field.to_string())
}

/// `POST /decrypt` — verify and decrypt a `v1.` field.
///
/// Any authentication failure is reported as `422 authentication_failed` and
/// no plaintext is returned.
pub async fn decrypt(State(state): State<AppState>, Json(req): Json<DecryptRequest>) -> Response {
    match decrypt_inner(&state, req).await {
        Ok(plaintext) => (StatusCode::OK, Json(DecryptResponse { plaintext })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn decrypt_inner(state: &AppState, req: DecryptRequest) -> Result<String, ServiceError> {
    let key = current_key(state).await?;
    let field: EncryptedField = req
        .field
        .parse()
        .map_err(|_| ServiceError::BadRequest("field is not a valid v1 encrypted value".into()))?;
    let associated_data = decode_optional(req.associated_data.as_deref(), "associated_data")?;

    let plaintext = Zeroizing::new(field.open(key.as_bytes(), &associated_data).map_err(|e| {
        warn!(error = %e, "decryption rejected");
        map_aead_error(e)
    })?);
    Ok(STANDARD.encode(&*plaintext))
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when the key is loaded, `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let key_ready = state.key_store.is_ready().await;

    let (status_code, status_str) = if key_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        key_ready,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn current_key(state: &AppState) -> Result<SecretKey, ServiceError> {
    state
        .key_store
        .current()
        .await
        .map_err(|_| ServiceError::Unavailable("encryption key not yet initialised".into()))
}

fn decode_b64(value: &str, name: &str) -> Result<Vec<u8>, ServiceError> {
    STANDARD
        .decode(value)
        .map_err(|_| ServiceError::BadRequest(format!("invalid base64 in {name}")))
}

fn decode_optional(value: Option<&str>, name: &str) -> Result<Vec<u8>, ServiceError> {
    value.map_or_else(|| Ok(Vec::new()), |v| decode_b64(v, name))
}

/// Map a crypto-layer failure onto the service error taxonomy.
///
/// Only authentication failures are the caller's fault; every other kind means
/// the service itself could not complete the operation.
fn map_aead_error(err: AeadError) -> ServiceError {
    match err {
        AeadError::AuthenticationFailed => {
            ServiceError::Rejected("data failed authentication".into())
        }
        other => ServiceError::EncryptionFailure(other.code().into()),
    }
}

fn error_response(err: ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match &err {
        // Internal details stay in the logs.
        ServiceError::EncryptionFailure(_) | ServiceError::Internal(_) => {
            "encryption service error".to_string()
        }
        other => other.to_string(),
    };
    (status, Json(ErrorResponse::new(err.code(), message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post, Router};
    use axum::routing::get;
    use solace_crypto::KEY_LEN;
    use tower::ServiceExt;

    async fn ready_state() -> AppState {
        let state = AppState::default();
        state.key_store.store(&[0x42u8; KEY_LEN]).await.unwrap();
        state
    }

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/encrypt", post(encrypt))
            .route("/decrypt", post(decrypt))
            .route("/health", get(health))
            .with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_returns_503_when_not_ready() {
        let app = test_router(AppState::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_returns_200_when_key_loaded() {
        let app = test_router(ready_state().await);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn encrypt_then_decrypt_round_trip() {
        let app = test_router(ready_state().await);
        let (status, body) = post_json(
            app.clone(),
            "/encrypt",
            serde_json::json!({
                "plaintext": STANDARD.encode("123-45-6789"),
                "associated_data": STANDARD.encode("customer:9"),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let field = body["field"].as_str().unwrap().to_owned();
        assert!(field.starts_with("v1."), "expected v1. prefix, got: {field}");

        let (status, body) = post_json(
            app,
            "/decrypt",
            serde_json::json!({
                "field": field,
                "associated_data": STANDARD.encode("customer:9"),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            STANDARD.decode(body["plaintext"].as_str().unwrap()).unwrap(),
            b"123-45-6789"
        );
    }

    #[tokio::test]
    async fn repeated_encrypt_uses_fresh_nonces() {
        let app = test_router(ready_state().await);
        let body = serde_json::json!({
            "plaintext": STANDARD.encode("hello"),
            "associated_data": STANDARD.encode("tenant-a"),
        });
        let (_, a) = post_json(app.clone(), "/encrypt", body.clone()).await;
        let (_, b) = post_json(app, "/encrypt", body).await;

        let a: EncryptedField = a["field"].as_str().unwrap().parse().unwrap();
        let b: EncryptedField = b["field"].as_str().unwrap().parse().unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    // A nonce in the request body is ignored.
    #[tokio::test]
    async fn request_nonce_is_ignored() {
        let key = [0x42u8; KEY_LEN];
        let victim = EncryptedField::seal(b"tenant-a secret!", &key, b"tenant-a").unwrap();

        let app = test_router(ready_state().await);
        let (status, body) = post_json(
            app,
            "/encrypt",
            serde_json::json!({
                "plaintext": STANDARD.encode([0u8; 16]),
                "nonce": STANDARD.encode(victim.nonce),
                "associated_data": STANDARD.encode("attacker"),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let chosen: EncryptedField = body["field"].as_str().unwrap().parse().unwrap();
        assert_ne!(chosen.nonce, victim.nonce);
        let xor: Vec<u8> = chosen
            .ciphertext
            .iter()
            .zip(&victim.ciphertext)
            .map(|(a, b)| a ^ b)
            .collect();
        assert_ne!(xor, b"tenant-a secret!");
    }

    #[tokio::test]
    async fn tampered_field_is_rejected() {
        let key = [0x42u8; KEY_LEN];
        let mut field = EncryptedField::seal(b"secret", &key, b"").unwrap();
        field.ciphertext[0] ^= 0xFF;

        let app = test_router(ready_state().await);
        let (status, body) =
            post_json(app, "/decrypt", serde_json::json!({"field": field.to_string()})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "authentication_failed");
        assert!(body.get("plaintext").is_none());
    }

    #[tokio::test]
    async fn wrong_associated_data_is_rejected() {
        let key = [0x42u8; KEY_LEN];
        let field = EncryptedField::seal(b"secret", &key, b"a").unwrap();
        let app = test_router(ready_state().await);
        let (status, _) = post_json(
            app,
            "/decrypt",
            serde_json::json!({"field": field.to_string(), "associated_data": STANDARD.encode("b")}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn encrypt_without_key_is_503() {
        let app = test_router(AppState::default());
        let (status, body) = post_json(
            app,
            "/encrypt",
            serde_json::json!({"plaintext": STANDARD.encode("x")}),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "service_unavailable");
    }

    #[tokio::test]
    async fn bad_base64_is_400() {
        let app = test_router(ready_state().await);
        let (status, body) =
            post_json(app, "/encrypt", serde_json::json!({"plaintext": "***"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("plaintext"));
    }

    #[tokio::test]
    async fn malformed_field_is_400() {
        let app = test_router(ready_state().await);
        let (status, _) =
            post_json(app, "/decrypt", serde_json::json!({"field": "v2.abc"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn aead_errors_map_to_service_errors() {
        assert_eq!(map_aead_error(AeadError::AuthenticationFailed).http_status(), 422);
        assert_eq!(
            map_aead_error(AeadError::InvalidNonceLength { actual: 3 }).http_status(),
            500
        );
        assert_eq!(map_aead_error(AeadError::CipherInitFailed).http_status(), 500);
    }
}
