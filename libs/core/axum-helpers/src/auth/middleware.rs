use super::identity::AuthUser;
use super::jwt::{JwtAuth, TokenPurpose};
use crate::errors::AppError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Looks up the account behind a verified token.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` when the user no longer exists.
    async fn resolve(&self, user_id: Uuid) -> Result<Option<AuthUser>, AppError>;
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtAuth,
    pub resolver: Arc<dyn IdentityResolver>,
}

impl AuthState {
    pub fn new(jwt: JwtAuth, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { jwt, resolver }
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Session middleware.
///
/// Requests without a bearer token pass through anonymously. A token that
/// fails verification, or whose user has been removed, is rejected with 401.
/// Otherwise the resolved [`AuthUser`] is inserted into the request extensions.
pub async fn authenticate(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_bearer_token(request.headers()).map(str::to_owned) else {
        return Ok(next.run(request).await);
    };

    let claims = auth
        .jwt
        .verify(&token, TokenPurpose::Session)
        .map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            AppError::Unauthorized("Not authorized, invalid token".to_string())
        })?;

    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized("Not authorized, invalid token".to_string()))?;

    let user = auth
        .resolver
        .resolve(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    tracing::debug!(user_id = %user.id, "Authenticated request");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct OneUser(AuthUser);

    #[async_trait]
    impl IdentityResolver for OneUser {
        async fn resolve(&self, user_id: Uuid) -> Result<Option<AuthUser>, AppError> {
            Ok((user_id == self.0.id).then(|| self.0.clone()))
        }
    }

    fn setup() -> (Router, JwtAuth, AuthUser) {
        let jwt = JwtAuth::new(&JwtConfig::new("middleware-test-secret-with-32-chars!!"));
        let user = AuthUser {
            id: Uuid::now_v7(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            roles: vec!["user".to_string()],
        };
        let state = AuthState::new(jwt.clone(), Arc::new(OneUser(user.clone())));

        let app = Router::new()
            .route("/me", get(|user: AuthUser| async move { user.email }))
            .route(
                "/maybe",
                get(|user: Option<AuthUser>| async move {
                    user.map(|u| u.name).unwrap_or_else(|| "anonymous".to_string())
                }),
            )
            .layer(middleware::from_fn_with_state(state, authenticate));

        (app, jwt, user)
    }

    fn get_with(uri: &str, token: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_session_token_attaches_identity() {
        let (app, jwt, user) = setup();
        let token = jwt.issue(user.id, TokenPurpose::Session).unwrap();

        let response = app.oneshot(get_with("/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "grace@example.com");
    }

    #[tokio::test]
    async fn test_anonymous_request_passes_through() {
        let (app, _, _) = setup();

        let response = app.clone().oneshot(get_with("/maybe", None)).await.unwrap();
        assert_eq!(text(response).await, "anonymous");

        let response = app.oneshot(get_with("/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_token_cannot_open_a_session() {
        let (app, jwt, user) = setup();
        let token = jwt.issue(user.id, TokenPurpose::PasswordReset).unwrap();

        let response = app.oneshot(get_with("/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_for_missing_user_is_rejected() {
        let (app, jwt, _) = setup();
        let token = jwt.issue(Uuid::now_v7(), TokenPurpose::Session).unwrap();

        let response = app.oneshot(get_with("/maybe", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi"));
    }
}
