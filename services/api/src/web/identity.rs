//! services/api/src/web/identity.rs
//!
//! Resolves the calling user. Authentication itself happens upstream (the
//! gateway in front of this service verifies the session and injects an
//! `x-user-id` header); here that header is only read back as an opaque id.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// The id of the authenticated caller, extracted from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("x-user-id header is required".to_string())
            })?;

        let user_id = Uuid::parse_str(raw).map_err(|_| {
            ApiError::Unauthorized("x-user-id header is not a valid UUID".to_string())
        })?;

        Ok(CurrentUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/documents");
        if let Some(value) = value {
            builder = builder.header("x-user-id", value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn extracts_a_valid_user_id() {
        let user_id = Uuid::new_v4();
        let mut parts = parts_with_header(Some(&user_id.to_string()));
        let CurrentUser(extracted) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(extracted, user_id);
    }

    #[tokio::test]
    async fn rejects_a_missing_header() {
        let mut parts = parts_with_header(None);
        let rejection = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(rejection, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn rejects_a_malformed_header() {
        let mut parts = parts_with_header(Some("not-a-uuid"));
        let rejection = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(rejection, ApiError::Unauthorized(_)));
    }
}
