use jsonwebtoken::{encode, EncodingKey, Header};
use retouch_api::auth::JwtClaims;
use uuid::Uuid;

/// Shared secret of the test identity provider (must match test_config).
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

/// Sign a one-hour session token for `user_id`.
pub fn token_for(user_id: Uuid) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id,
        exp: now + 3600,
        iat: now,
        nbf: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
