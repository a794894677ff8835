use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use crate::config::JwtConfig;

/// Checks bearer tokens against the shared secret, issuer and audience.
/// Built once at startup and shared through the app state.
pub struct JwtVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&cfg.audience));
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
        }
    }

    /// Access tokens only; refresh tokens are rejected.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        if data.claims.kind != TokenKind::Access {
            anyhow::bail!("not an access token");
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// Authenticated caller, taken from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtVerifier>: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "missing Authorization header".to_string(),
            ))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".to_string()))?;

        let verifier = Arc::<JwtVerifier>::from_ref(state);
        let claims = verifier.verify(token).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            (StatusCode::UNAUTHORIZED, "invalid or expired token".to_string())
        })?;

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::OffsetDateTime;

    fn cfg() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            issuer: "nutriplan".into(),
            audience: "nutriplan-users".into(),
        }
    }

    fn token(user: Uuid, iss: &str, kind: TokenKind) -> String {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            sub: user,
            iat: now,
            exp: now + 300,
            iss: iss.into(),
            aud: "nutriplan-users".into(),
            kind,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    #[derive(Clone)]
    struct TestState(Arc<JwtVerifier>);

    impl FromRef<TestState> for Arc<JwtVerifier> {
        fn from_ref(state: &TestState) -> Self {
            state.0.clone()
        }
    }

    async fn extract(auth: Option<String>) -> Result<AuthUser, (StatusCode, String)> {
        let mut req = Request::builder().uri("/");
        if let Some(v) = auth {
            req = req.header(AUTHORIZATION, v);
        }
        let (mut parts, _) = req.body(()).unwrap().into_parts();
        let state = TestState(Arc::new(JwtVerifier::new(&cfg())));
        AuthUser::from_request_parts(&mut parts, &state).await
    }

    #[tokio::test]
    async fn accepts_valid_access_token() {
        let user = Uuid::new_v4();
        let AuthUser(id) = extract(Some(format!("Bearer {}", token(user, "nutriplan", TokenKind::Access))))
            .await
            .unwrap();
        assert_eq!(id, user);
    }

    #[tokio::test]
    async fn rejects_missing_header_wrong_issuer_and_refresh_tokens() {
        let user = Uuid::new_v4();
        for auth in [
            None,
            Some("Basic abc".to_string()),
            Some(format!("Bearer {}", token(user, "someone-else", TokenKind::Access))),
            Some(format!("Bearer {}", token(user, "nutriplan", TokenKind::Refresh))),
        ] {
            let (status, _) = extract(auth).await.unwrap_err();
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }
}
