/// HTTP middleware utilities for blog-service
///
/// Resolves the request `Principal` from an optional bearer token. Every blog
/// page is reachable anonymously, so a missing or rejected token never fails
/// the request; the viewer is simply anonymous and the ownership policy
/// decides what happens next.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::models::{Identity, Principal};

/// Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Profile id
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

/// HS256 verification key shared with the identity provider
#[derive(Clone)]
pub struct JwtKeys {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidSubject(data.claims.sub.clone()))?;

        Ok(Identity {
            id,
            username: data.claims.username,
        })
    }

    /// Principal for a raw `Authorization` header value
    pub fn principal_from_header(&self, header: Option<&str>) -> Principal {
        let Some(header) = header else {
            return Principal::Anonymous;
        };

        let Some(token) = header.strip_prefix("Bearer ") else {
            tracing::warn!("Ignoring Authorization header with unsupported scheme");
            return Principal::Anonymous;
        };

        match self.verify(token.trim()) {
            Ok(identity) => Principal::from(identity),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected bearer token; treating request as anonymous");
                Principal::Anonymous
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("invalid subject: {0}")]
    InvalidSubject(String),
}

/// Actix middleware that attaches a `Principal` to every request.
pub struct PrincipalMiddleware {
    keys: Arc<JwtKeys>,
}

impl PrincipalMiddleware {
    pub fn new(keys: JwtKeys) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PrincipalMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = PrincipalMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PrincipalMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct PrincipalMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
}

impl<S, B> Service<ServiceRequest> for PrincipalMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let principal = self.keys.principal_from_header(
            req.headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok()),
        );

        Box::pin(async move {
            req.extensions_mut().insert(principal);
            service.call(req).await
        })
    }
}

impl FromRequest for Principal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<Principal>()
            .cloned()
            .unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, username: &str, secret: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn whoami(principal: Principal) -> HttpResponse {
        match principal.identity() {
            Some(identity) => HttpResponse::Ok().body(format!("{}:{}", identity.id, identity.username)),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn call_with(header: Option<String>) -> String {
        let app = test::init_service(
            App::new()
                .wrap(PrincipalMiddleware::new(JwtKeys::from_secret(SECRET)))
                .route("/", web::get().to(whoami)),
        )
        .await;

        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = header {
            req = req.insert_header(("Authorization", value));
        }
        let body = test::call_and_read_body(&app, req.to_request()).await;
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn test_valid_token_yields_identity() {
        let bearer = format!("Bearer {}", token("7", "alice", SECRET, 3600));
        assert_eq!(call_with(Some(bearer)).await, "7:alice");
    }

    #[actix_web::test]
    async fn test_missing_header_is_anonymous() {
        assert_eq!(call_with(None).await, "anonymous");
    }

    #[actix_web::test]
    async fn test_bad_tokens_are_anonymous() {
        let wrong_secret = format!("Bearer {}", token("7", "alice", "other", 3600));
        assert_eq!(call_with(Some(wrong_secret)).await, "anonymous");

        let expired = format!("Bearer {}", token("7", "alice", SECRET, -3600));
        assert_eq!(call_with(Some(expired)).await, "anonymous");

        let bad_subject = format!("Bearer {}", token("alice", "alice", SECRET, 3600));
        assert_eq!(call_with(Some(bad_subject)).await, "anonymous");

        assert_eq!(call_with(Some("Basic abc".into())).await, "anonymous");
    }

    #[actix_web::test]
    async fn test_extractor_defaults_to_anonymous_without_middleware() {
        let req = test::TestRequest::default().to_http_request();
        let principal = Principal::extract(&req).await.unwrap();
        assert_eq!(principal, Principal::Anonymous);
    }
}
