use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::web::models::AnalysisResultRow;
use crate::web::session::user_id_from_jar;
use crate::web::{ApiError, AppState};

const HISTORY_LIMIT: i64 = 10;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryItem {
    id: Uuid,
    user_id: String,
    predictions: Option<Value>,
    navigation: Option<Value>,
    image_path: String,
    created_at: String,
}

#[derive(Serialize)]
pub(crate) struct HistoryResponse {
    results: Vec<HistoryItem>,
}

/// The ten most recent analyses for the session's user, newest first.
pub async fn analysis_history(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Some(user_id) = user_id_from_jar(&jar, state.jwt_secret()) else {
        return Err(ApiError::AuthenticationRequired);
    };

    let rows = fetch_recent_results(state.pool_ref(), &user_id)
        .await
        .map_err(|err| ApiError::persistence("Failed to fetch analysis history", err.into()))?;

    let results = rows.into_iter().map(history_item).collect();
    Ok(Json(HistoryResponse { results }))
}

async fn fetch_recent_results(
    pool: &PgPool,
    user_id: &str,
) -> sqlx::Result<Vec<AnalysisResultRow>> {
    sqlx::query_as::<_, AnalysisResultRow>(
        "SELECT id, user_id, predictions, navigation, image_path, created_at \
         FROM analysis_results WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(HISTORY_LIMIT)
    .fetch_all(pool)
    .await
}

fn history_item(row: AnalysisResultRow) -> HistoryItem {
    HistoryItem {
        id: row.id,
        user_id: row.user_id,
        predictions: row.predictions,
        navigation: row.navigation,
        image_path: row.image_path,
        created_at: row.created_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn history_items_serialize_in_camel_case() {
        let row = AnalysisResultRow {
            id: Uuid::nil(),
            user_id: "user-1".to_string(),
            predictions: Some(json!({ "score": 1 })),
            navigation: None,
            image_path: "uploads/capture.jpg".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        };

        let serialized = serde_json::to_value(history_item(row)).unwrap();
        assert_eq!(serialized["userId"], json!("user-1"));
        assert_eq!(serialized["imagePath"], json!("uploads/capture.jpg"));
        assert_eq!(serialized["createdAt"], json!("2025-01-02T03:04:05+00:00"));
        assert!(serialized["navigation"].is_null());
    }
}
