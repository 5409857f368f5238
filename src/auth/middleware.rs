//! Bearer token middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::{AuthError, Authenticator};
use crate::error::ApiError;

/// Rejects requests without a valid token.
pub async fn require_bearer(
    State(auth): State<Authenticator>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("non-ascii authorization header".to_string()))?;

    let token = extract_token(header)
        .ok_or_else(|| AuthError::InvalidToken("expected Bearer scheme".to_string()))?;

    let claims = auth.verify(token)?;
    debug!("token for {} accepted on {}", claims.sub, request.uri().path());
    Ok(next.run(request).await)
}

/// Pulls the token out of `Bearer <token>` or `JWT <token>`.
fn extract_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt");
    (known && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::util::ServiceExt;

    use crate::auth::generate_credentials;
    use crate::config::AuthSettings;
    use crate::store::CountyDb;

    async fn protected(header: Option<&str>) -> StatusCode {
        let db = CountyDb::open_in_memory().await.unwrap();
        let creds = generate_credentials();
        db.create_consumer(&creds).await.unwrap();
        let auth = Authenticator::new(
            db,
            &AuthSettings {
                secret: "middleware-test-secret".to_string(),
                token_ttl: Duration::from_secs(60),
            },
        );
        let token = auth.issue(&creds.api_key, &creds.api_secret).await.unwrap();

        let app = Router::new()
            .route("/county/travis", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(auth, require_bearer));

        let mut builder = axum::http::Request::builder().uri("/county/travis");
        if let Some(header) = header {
            builder = builder.header(AUTHORIZATION, header.replace("{token}", &token));
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_require_bearer_passes_valid_token() {
        let status = protected(Some("Bearer {token}")).await;
        assert_eq!(status, StatusCode::OK);

        let status = protected(Some("JWT {token}")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_require_bearer_rejects_bad_headers() {
        let status = protected(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let status = protected(Some("Basic {token}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let status = protected(Some("Bearer garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_token("bearer   abc"), Some("abc"));
        assert_eq!(extract_token("JWT abc"), Some("abc"));
        assert_eq!(extract_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_token("Bearer"), None);
        assert_eq!(extract_token("Bearer "), None);
    }
}
