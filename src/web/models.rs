use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Public view of an account, safe to embed in API responses.
#[derive(Clone, FromRow, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Clone, FromRow)]
pub struct UserAuthRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Stored analysis run. `user_id` is kept as the raw string taken from the
/// session token; records never enforce a foreign key against `users`.
#[derive(Clone, FromRow)]
pub struct AnalysisResultRow {
    pub id: Uuid,
    pub user_id: String,
    pub predictions: Option<Value>,
    pub navigation: Option<Value>,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}
