//! Bearer token issuance and verification
//!
//! Tokens are compact JWTs signed with HMAC-SHA256:
//! `base64url(header).base64url(claims).base64url(signature)`.
//! No server-side storage; a token is valid until `exp`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID the token was issued to
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

impl Claims {
    /// Build claims for `user_id` valid for `max_age_secs` from now
    pub fn new(user_id: &str, max_age_secs: i64) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iat,
            exp: iat + max_age_secs,
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

fn mac_for(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Encryption(e.to_string()))
}

/// Issue a signed token for a user
///
/// # Arguments
/// * `user_id` - ID embedded as `sub`
/// * `secret` - HMAC secret key
/// * `max_age_secs` - Lifetime in seconds
pub fn issue_token(user_id: &str, secret: &str, max_age_secs: i64) -> Result<String, AppError> {
    sign_claims(&Claims::new(user_id, max_age_secs), secret)
}

/// Sign arbitrary claims
///
/// Returns `"{header}.{claims}.{signature}"`.
pub fn sign_claims(claims: &Claims, secret: &str) -> Result<String, AppError> {
    let header = Header {
        alg: TOKEN_ALGORITHM.to_string(),
        typ: TOKEN_TYPE.to_string(),
    };

    let header_json = serde_json::to_vec(&header).map_err(|e| AppError::Internal(e.into()))?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| AppError::Internal(e.into()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    let mut mac = mac_for(secret)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Verify and decode a token
///
/// # Errors
/// Returns `AppError::Unauthorized` for a malformed token, an unsupported
/// algorithm, a signature mismatch, or an expired token. The cases are not
/// distinguished.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::Unauthorized);
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let header: Header =
        serde_json::from_slice(&header_bytes).map_err(|_| AppError::Unauthorized)?;
    if header.alg != TOKEN_ALGORITHM {
        return Err(AppError::Unauthorized);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let mut mac = mac_for(secret)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    // Constant-time comparison
    mac.verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized)?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let claims: Claims =
        serde_json::from_slice(&claims_bytes).map_err(|_| AppError::Unauthorized)?;

    if claims.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}
