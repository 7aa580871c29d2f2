use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use lobby_types::api::Claims;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 30;

/// Issue an HS256 access token for `username`, valid for 30 minutes.
pub fn create_token(secret: &str, username: &str) -> anyhow::Result<String> {
    create_token_with_ttl(secret, username, Duration::minutes(ACCESS_TOKEN_TTL_MINUTES))
}

pub fn create_token_with_ttl(secret: &str, username: &str, ttl: Duration) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Checks signature and expiry. Resolving `sub` to a user is the caller's job.
pub fn decode_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_resolves_to_its_subject() {
        let token = create_token(SECRET, "aklevans").unwrap();
        let claims = decode_token(SECRET, &token).unwrap();

        assert_eq!(claims.sub, "aklevans");
        assert_eq!(claims.exp - claims.iat, (ACCESS_TOKEN_TTL_MINUTES * 60) as usize);
    }

    #[test]
    fn altered_signature_is_rejected() {
        let token = create_token(SECRET, "aklevans").unwrap();
        let forged = create_token("some-other-secret", "aklevans").unwrap();

        let (body, _) = token.rsplit_once('.').unwrap();
        let (_, forged_sig) = forged.rsplit_once('.').unwrap();
        let tampered = format!("{body}.{forged_sig}");

        let err = decode_token(SECRET, &tampered).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature), "got {err:?}");
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token_with_ttl(SECRET, "aklevans", Duration::hours(-2)).unwrap();

        let err = decode_token(SECRET, &token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature), "got {err:?}");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_token(SECRET, "not.a.token").is_err());
        assert!(decode_token(SECRET, "").is_err());
    }
}
