//! JWT token handling
//!
//! Tokens are issued by the external identity provider; the service only
//! validates them. `create_token` exists for trusted tooling and tests.

use crate::auth::Role;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Display name, recorded in workflow stamps
    pub name: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Sign a token for a user
pub fn create_token(
    secret: &str,
    user_id: Uuid,
    name: &str,
    role: Role,
    ttl_minutes: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        name: name.to_string(),
        role,
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

/// Decode and validate a JWT token
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".to_string())
        }
        jsonwebtoken::errors::ErrorKind::InvalidToken => {
            AppError::Unauthorized("Invalid token".to_string())
        }
        _ => AppError::Unauthorized(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_carries_identity() {
        let id = Uuid::new_v4();
        let token = create_token(SECRET, id, "Pat Peer", Role::PeerReviewer, 5).unwrap();
        let claims = decode_token(SECRET, &token).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.name, "Pat Peer");
        assert_eq!(claims.role, Role::PeerReviewer);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(SECRET, Uuid::new_v4(), "Pat", Role::Editor, 5).unwrap();
        let err = decode_token("other-secret", &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = create_token(SECRET, Uuid::new_v4(), "Pat", Role::Editor, -10).unwrap();
        let err = decode_token(SECRET, &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Token expired"));
    }
}
