use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Purpose a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Mailed login link.
    Login,
    /// Session cookie issued after a link was redeemed or a session renewed.
    Session,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // account id
    pub exp: i64,    // expiration time
    pub iat: i64,    // issued at
    pub jti: String, // token id
    pub kind: TokenKind,
}

impl SessionClaims {
    fn new(subject: &str, ttl: Duration, kind: TokenKind) -> Self {
        let now = Utc::now();
        let exp = now + ttl;

        Self {
            sub: subject.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            kind,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Remaining lifetime relative to `now`; zero or negative once expired.
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at() - now
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Signature Invalid")]
    SignatureInvalid,
    #[error("token is expired")]
    Expired,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token invalid")]
    InvalidClaims,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// HS256 signer/verifier bound to the process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn mint(
        &self,
        subject: &str,
        ttl: Duration,
        kind: TokenKind,
    ) -> Result<(String, SessionClaims), TokenError> {
        let claims = SessionClaims::new(subject, ttl, kind);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;

        Ok((token, claims))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let token_data =
            decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|err| {
                match err.kind() {
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    // Includes a stray `.` in the signature: the segment
                    // structure breaks before any signature comparison.
                    _ => TokenError::Malformed(err.to_string()),
                }
            })?;
        let claims = token_data.claims;

        // Second resolution: a token whose expiry second has been reached is spent.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        if claims.sub.trim().is_empty() {
            return Err(TokenError::InvalidClaims);
        }

        Ok(claims)
    }
}
