//! Bearer-token authentication.
//!
//! Credential issuance lives in the upstream identity service; this module
//! only validates the HS256 tokens it mints and exposes the authenticated
//! identity to handlers through a `FromRequest` extractor. `issue_token`
//! exists so tests (and the identity service, which shares the secret) can
//! mint tokens.

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload,
    http::header::AUTHORIZATION, web,
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::api::error::ServiceError;
use crate::api::validation::ErrorResponse;

/// Actor role carried in the token
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Requester,
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Provider => "provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// Authentication errors, all reported as 401
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    Expired,
    Invalid(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing bearer token"),
            AuthError::InvalidFormat => {
                write!(f, "Invalid token format (expected 'Bearer <token>')")
            }
            AuthError::Expired => write!(f, "Token has expired"),
            AuthError::Invalid(msg) => write!(f, "Invalid token: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().json(ErrorResponse {
            error: "Unauthenticated".to_string(),
            fields: serde_json::json!({"message": self.to_string()}),
        })
    }
}

/// Token verification keys, registered as app data at startup
#[derive(Clone)]
pub struct AuthKeys {
    secret: String,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }

    /// Mint a token for `user_id` with `role`, valid for `ttl_secs`
    pub fn issue_token(
        &self,
        user_id: Uuid,
        role: Role,
        ttl_secs: u64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now + ttl_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Validate a raw token and return its claims
    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Invalid(e.to_string()),
        })
    }
}

/// The authenticated actor issuing the request
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Role gate for handlers; wrong role is a 403
    pub fn require(&self, role: Role) -> Result<(), ServiceError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(match role {
                Role::Requester => "This action is only available to requesters",
                Role::Provider => "This action is only available to providers",
            }))
        }
    }
}

fn extract_user(req: &HttpRequest) -> Result<AuthUser, AuthError> {
    let keys = req
        .app_data::<web::Data<AuthKeys>>()
        .ok_or_else(|| AuthError::Invalid("Token verification is not configured".to_string()))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let token = header.strip_prefix("Bearer ").ok_or(AuthError::InvalidFormat)?;

    let claims = keys.decode_token(token)?;
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::Invalid("Subject is not a valid user id".to_string()))?;

    Ok(AuthUser {
        id,
        role: claims.role,
    })
}

impl FromRequest for AuthUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_user(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_to_same_identity() {
        let keys = AuthKeys::new("test-secret");
        let id = Uuid::new_v4();

        let token = keys.issue_token(id, Role::Provider, 3600).unwrap();
        let claims = keys.decode_token(&token).unwrap();

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, Role::Provider);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = AuthKeys::new("test-secret");
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: Role::Requester,
            iat: now - 7200,
            // Past the default 60s leeway
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        match keys.decode_token(&token) {
            Err(AuthError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other),
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = AuthKeys::new("test-secret");
        let other = AuthKeys::new("other-secret");
        let token = other.issue_token(Uuid::new_v4(), Role::Provider, 3600).unwrap();

        match keys.decode_token(&token) {
            Err(AuthError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn role_strings_match_storage_values() {
        assert_eq!(Role::Requester.as_str(), "requester");
        assert_eq!(Role::Provider.as_str(), "provider");
    }
}
