use anyhow::{Context, Result};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use cookie::time::Duration as CookieDuration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const TOKEN_COOKIE: &str = "token";
pub const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Claims carried by the session token. `userId` keeps the wire casing the
/// frontend already stores and forwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a session token for the given user id, expiring in 24 hours.
pub fn issue_token(secret: &str, user_id: &str) -> Result<String> {
    issue_token_at(secret, user_id, Utc::now().timestamp())
}

fn issue_token_at(secret: &str, user_id: &str, issued_at: i64) -> Result<String> {
    let claims = SessionClaims {
        user_id: user_id.to_string(),
        iat: issued_at,
        exp: issued_at + TOKEN_TTL_SECONDS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("failed to sign session token")
}

/// Decode a session token. Accepts it only while the signature checks out
/// and the current time is strictly before `exp`; no clock leeway.
pub fn verify_token(secret: &str, token: &str) -> Option<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .ok()?;

    // The decoder treats a token as live through its expiry second;
    // expiry here is exclusive.
    if claims.exp <= Utc::now().timestamp() {
        return None;
    }
    Some(claims)
}

/// Pull the caller's user id from the request cookies. `None` covers both a
/// missing cookie and one that fails verification.
pub fn user_id_from_jar(jar: &CookieJar, secret: &str) -> Option<String> {
    let cookie = jar.get(TOKEN_COOKIE)?;
    verify_token(secret, cookie.value()).map(|claims| claims.user_id)
}

/// Cookie delivering a freshly issued token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(CookieDuration::seconds(TOKEN_TTL_SECONDS));
    cookie
}

/// Expired twin of [`session_cookie`], used to clear the browser's copy.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(CookieDuration::seconds(0));
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trips_through_verification() {
        let token = issue_token(SECRET, "user-123").unwrap();
        let claims = verify_token(SECRET, &token).expect("fresh token should verify");
        assert_eq!(claims.user_id, "user-123");
    }

    #[test]
    fn expiry_sits_exactly_one_day_after_issuance() {
        let token = issue_token(SECRET, "user-123").unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued_at = Utc::now().timestamp() - TOKEN_TTL_SECONDS - 120;
        let token = issue_token_at(SECRET, "user-123", issued_at).unwrap();
        assert!(verify_token(SECRET, &token).is_none());
    }

    #[test]
    fn token_is_rejected_at_the_exact_expiry_instant() {
        let issued_at = Utc::now().timestamp() - TOKEN_TTL_SECONDS;
        let token = issue_token_at(SECRET, "user-123", issued_at).unwrap();
        assert!(verify_token(SECRET, &token).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, "user-123").unwrap();
        assert!(verify_token("a-different-secret", &token).is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_token(SECRET, "user-123").unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'x' { 'y' } else { 'x' };
        let tampered: String = chars.into_iter().collect();
        assert!(verify_token(SECRET, &tampered).is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), false);
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(
            cookie.max_age(),
            Some(CookieDuration::seconds(TOKEN_TTL_SECONDS))
        );
    }

    #[test]
    fn production_cookie_is_secure() {
        let cookie = session_cookie("abc".to_string(), true);
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie(false);
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(0)));
    }
}
