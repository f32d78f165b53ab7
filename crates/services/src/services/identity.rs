//! Verification of client identity tokens.
//!
//! Sign-up and sign-in live with the external identity provider. It issues
//! HS256 JWTs signed with a secret shared with this service; all we do is
//! check the signature and expiry and read the subject, email and role.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => IdentityError::Expired,
            _ => IdentityError::Invalid(err.to_string()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    Client,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default)]
    role: Role,
    iat: i64,
    exp: i64,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct CurrentClient {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl CurrentClient {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners and admins may act on an appointment.
    pub fn can_manage(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }
}

#[derive(Clone)]
pub struct IdentityVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: TimeDelta,
}

impl IdentityVerifier {
    pub fn new(secret: &str, token_ttl_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 30;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl: TimeDelta::minutes(token_ttl_minutes),
        }
    }

    pub fn verify(&self, token: &str) -> Result<CurrentClient, IdentityError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::MissingToken);
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(IdentityError::Invalid("empty subject".to_string()));
        }

        Ok(CurrentClient {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Mint a token the way the identity provider does. Used by tests and the
    /// local token tool.
    pub fn issue(&self, sub: &str, email: &str, role: Role) -> Result<String, IdentityError> {
        self.issue_with_ttl(sub, email, role, self.token_ttl)
    }

    pub fn issue_with_ttl(
        &self,
        sub: &str,
        email: &str,
        role: Role,
        ttl: TimeDelta,
    ) -> Result<String, IdentityError> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| IdentityError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_round_trips_claims() {
        let verifier = IdentityVerifier::new("test-secret", 60);
        let token = verifier
            .issue("uid-42", "jo@example.com", Role::Admin)
            .unwrap();

        let client = verifier.verify(&token).unwrap();
        assert_eq!(client.id, "uid-42");
        assert_eq!(client.email, "jo@example.com");
        assert!(client.is_admin());
        assert!(client.can_manage("someone-else"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = IdentityVerifier::new("test-secret", 60);
        let token = verifier
            .issue_with_ttl("uid-42", "jo@example.com", Role::Client, TimeDelta::hours(-2))
            .unwrap();

        assert!(matches!(verifier.verify(&token), Err(IdentityError::Expired)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = IdentityVerifier::new("provider-secret", 60);
        let verifier = IdentityVerifier::new("different-secret", 60);
        let token = issuer.issue("uid-42", "jo@example.com", Role::Client).unwrap();

        assert!(matches!(
            verifier.verify(&token),
            Err(IdentityError::Invalid(_))
        ));
    }

    #[test]
    fn test_client_role_defaults_and_ownership() {
        let verifier = IdentityVerifier::new("test-secret", 60);
        let token = verifier
            .issue("uid-7", "sam@example.com", Role::Client)
            .unwrap();
        let client = verifier.verify(&token).unwrap();

        assert_eq!(client.role, Role::Client);
        assert!(client.can_manage("uid-7"));
        assert!(!client.can_manage("uid-8"));
        assert!(matches!(verifier.verify("  "), Err(IdentityError::MissingToken)));
    }
}
