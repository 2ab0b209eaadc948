pub mod products;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Handler failures. The status code is what the metrics middleware sees.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_client_statuses() {
        let missing = ApiError::NotFound("user 'u-9'".into());
        assert_eq!(missing.to_string(), "user 'u-9' not found");
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let bad = ApiError::Invalid("'x' is not an email address".into());
        assert_eq!(bad.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
