//! Validation utilities for Web API DTOs.

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// Deserializes the body as JSON, then runs the `validator` rules of `T`.
/// Failures produce a 422 with field-level details.
///
/// # Example
///
/// ```ignore
/// use filedrop::web::dto::ValidatedJson;
///
/// async fn register(
///     ValidatedJson(payload): ValidatedJson<RegisterRequest>,
/// ) -> Result<Json<LoginResponse>, ApiError> {
///     // payload is already validated
///     // ...
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Like [`ValidatedJson`], for endpoints whose body may be left out.
///
/// A request without `Content-Type` and with an empty body yields
/// `T::default()`. Any other body must be valid JSON for `T`; malformed
/// input is a 400 and never falls back to the default.
pub struct OptionalValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Default,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(CONTENT_TYPE) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid body: {}", e)))?;
            if !body.iter().all(u8::is_ascii_whitespace) {
                return Err(ApiError::bad_request(
                    "Expected request with `Content-Type: application/json`",
                ));
            }
            return Ok(OptionalValidatedJson(T::default()));
        }

        let ValidatedJson(value) = ValidatedJson::<T>::from_request(req, state).await?;
        Ok(OptionalValidatedJson(value))
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value.chars().any(|c| c.is_control()) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}

/// Validate an account username.
pub fn valid_username(value: &str) -> Result<(), validator::ValidationError> {
    crate::auth::validate_username(value).map_err(|e| {
        validator::ValidationError::new("username").with_message(e.to_string().into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::dto::DownloadRequest;
    use crate::web::error::ErrorCode;
    use axum::body::Body;

    async fn extract_download(
        content_type: Option<&str>,
        body: &'static str,
    ) -> Result<DownloadRequest, ApiError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body)).unwrap();
        OptionalValidatedJson::<DownloadRequest>::from_request(req, &())
            .await
            .map(|OptionalValidatedJson(value)| value)
    }

    #[tokio::test]
    async fn test_optional_json_absent_body_is_default() {
        let req = extract_download(None, "").await.unwrap();
        assert_eq!(req.password, None);
    }

    #[tokio::test]
    async fn test_optional_json_parses_body() {
        let req = extract_download(Some("application/json"), r#"{"password":"pw"}"#)
            .await
            .unwrap();
        assert_eq!(req.password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn test_optional_json_rejects_malformed_body() {
        for (content_type, body) in [
            (Some("application/json"), "{not json"),
            (Some("application/json"), r#"{"password":123}"#),
            (Some("text/plain"), "{}"),
            (None, r#"{"password":"pw"}"#),
        ] {
            let err = extract_download(content_type, body).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::BadRequest, "body {body:?}");
        }
    }

    #[test]
    fn test_no_control_chars() {
        assert!(no_control_chars("report.pdf").is_ok());
        assert!(no_control_chars("Hello\x00World").is_err());
        assert!(no_control_chars("Hello\x1bWorld").is_err());
        assert!(no_control_chars("two\nlines").is_err());
    }

    #[test]
    fn test_not_empty_trimmed() {
        assert!(not_empty_trimmed("  x  ").is_ok());
        assert!(not_empty_trimmed("").is_err());
        assert!(not_empty_trimmed("\t\n").is_err());
    }

    #[test]
    fn test_valid_username() {
        assert!(valid_username("alice_01").is_ok());
        assert!(valid_username("al").is_err());
        let err = valid_username("admin").unwrap_err();
        assert_eq!(err.message.unwrap(), "this username is reserved");
    }
}
