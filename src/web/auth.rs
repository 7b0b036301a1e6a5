use anyhow::anyhow;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::web::models::{UserAuthRow, UserRow};
use crate::web::session::{issue_token, removal_cookie, session_cookie, user_id_from_jar};
use crate::web::{ApiError, ApiMessage, AppState};

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Missing keys decay to empty strings, which fail the same way a wrong
/// email does. Malformed credentials never get their own response shape.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserRow,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserRow,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "All fields are required".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password).map_err(|err| {
        ApiError::internal(
            "An error occurred during signup",
            anyhow!("failed to hash password: {err}"),
        )
    })?;

    let user = match sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING id, name, email",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .fetch_one(state.pool_ref())
    .await
    {
        Ok(user) => user,
        Err(err) if is_unique_violation(&err) => {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        Err(err) => {
            return Err(ApiError::persistence(
                "An error occurred during signup",
                err.into(),
            ));
        }
    };

    let token = issue_token(state.jwt_secret(), &user.id.to_string())
        .map_err(|err| ApiError::internal("An error occurred during signup", err))?;
    let jar = jar.add(session_cookie(token, state.cookie_secure()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "Signup successful",
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let email = payload.email.trim();

    let user = match fetch_user_by_email(state.pool_ref(), email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::InvalidCredentials),
        Err(err) => {
            return Err(ApiError::persistence(
                "An error occurred during login",
                err.into(),
            ));
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(state.jwt_secret(), &user.id.to_string())
        .map_err(|err| ApiError::internal("An error occurred during login", err))?;
    let jar = jar.add(session_cookie(token, state.cookie_secure()));

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful",
            user: UserRow {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<ApiMessage>) {
    let jar = jar.remove(removal_cookie(state.cookie_secure()));
    (jar, Json(ApiMessage::new("Logged out")))
}

pub async fn profile(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(user_id) = user_id_from_jar(&jar, state.jwt_secret()) else {
        return Err(ApiError::AuthenticationRequired);
    };

    match fetch_user_by_id(state.pool_ref(), &user_id).await {
        Ok(Some(user)) => Ok(Json(ProfileResponse { user })),
        Ok(None) => Err(ApiError::AuthenticationRequired),
        Err(err) => Err(ApiError::persistence("Failed to fetch profile", err.into())),
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn fetch_user_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<UserAuthRow>> {
    sqlx::query_as::<_, UserAuthRow>(
        "SELECT id, name, email, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Looks an account up by the raw string carried in the session claims.
/// Values that do not parse as UUIDs simply match no account.
pub async fn fetch_user_by_id(pool: &PgPool, user_id: &str) -> sqlx::Result<Option<UserRow>> {
    let Ok(id) = Uuid::parse_str(user_id) else {
        return Ok(None);
    };
    sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
