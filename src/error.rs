use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API error taxonomy. Each variant maps to one HTTP status; the response
/// body is JSON with either a `message` or, for validation, an `errors` list.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<String>),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token not provided")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("invalid or expired recovery code")]
    InvalidRecoveryCode,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("insufficient stock for {name}: {available} available")]
    InsufficientStock { name: String, available: i32 },
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRecoveryCode | Self::InsufficientStock { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::MissingToken | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(errors) => serde_json::json!({ "errors": errors }),
            // Detail stays server-side; the client gets an opaque message.
            Self::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                serde_json::json!({ "message": "internal server error" })
            }
            other => serde_json::json!({ "message": other.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn validation_enumerates_all_rules() {
        let (status, body) = body_json(ApiError::Validation(vec![
            "password must be at least 8 characters".into(),
            "password must contain a digit".into(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn invalid_credentials_is_generic_401() {
        let (status, body) = body_json(ApiError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn missing_token_is_403_and_invalid_token_401() {
        let (status, _) = body_json(ApiError::MissingToken).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = body_json(ApiError::InvalidToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn insufficient_stock_names_product_and_availability() {
        let (status, body) = body_json(ApiError::InsufficientStock {
            name: "Linen Shirt".into(),
            available: 2,
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["message"].as_str().expect("message");
        assert!(message.contains("Linen Shirt"));
        assert!(message.contains('2'));
    }

    #[tokio::test]
    async fn internal_error_is_opaque() {
        let (status, body) = body_json(ApiError::Internal(anyhow::anyhow!("pool timed out"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "internal server error");
    }
}
