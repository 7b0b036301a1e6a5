use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use crate::upstream::AnalysisUpload;
use crate::upstream::normalize::normalize_payload;
use crate::web::session::user_id_from_jar;
use crate::web::upload::{self, UploadError, UploadedFile};
use crate::web::{ApiError, AppState};

const ANALYZE_ERROR: &str = "Failed to process image";
const PRODUCT_DETAILS_ERROR: &str = "Failed to process request";

#[derive(Deserialize)]
pub struct ConditionQuery {
    #[serde(rename = "userMedicalAilments")]
    pub user_medical_ailments: Option<String>,
}

/// Proxies an upload to the analysis service and records the outcome.
/// Nothing is persisted unless the upstream call succeeds.
pub async fn analyze_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ConditionQuery>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let Some(user_id) = user_id_from_jar(&jar, state.jwt_secret()) else {
        return Err(ApiError::AuthenticationRequired);
    };

    let mut form = upload::read_upload_form(multipart)
        .await
        .map_err(invalid_upload)?;
    let file = form.take_file().map_err(invalid_upload)?;
    upload::validate_upload(&file).map_err(invalid_upload)?;

    let condition = upload::normalize_condition(
        query
            .user_medical_ailments
            .as_deref()
            .or_else(|| form.text("condition")),
    );
    let image_path = upload::stored_image_path(&file.original_name);

    let raw = state
        .analysis()
        .analyze(to_upload(file), condition)
        .await
        .map_err(|err| ApiError::upstream(ANALYZE_ERROR, err))?;

    let normalized = normalize_payload(raw.clone());

    let result_id = insert_analysis_result(state.pool_ref(), &user_id, &raw, &image_path)
        .await
        .map_err(|err| ApiError::persistence(ANALYZE_ERROR, err.into()))?;

    Ok(Json(attach_result_id(normalized, result_id)))
}

/// Product lookup variant: the session is optional and nothing is stored.
pub async fn product_details(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ConditionQuery>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let user_id = user_id_from_jar(&jar, state.jwt_secret());

    let mut form = upload::read_upload_form(multipart)
        .await
        .map_err(invalid_upload)?;
    let file = form.take_file().map_err(invalid_upload)?;
    upload::validate_upload(&file).map_err(invalid_upload)?;

    let condition = upload::normalize_condition(
        query
            .user_medical_ailments
            .as_deref()
            .or_else(|| form.text("condition")),
    );

    let raw = state
        .analysis()
        .product_details(to_upload(file), condition, user_id.as_deref())
        .await
        .map_err(|err| ApiError::upstream(PRODUCT_DETAILS_ERROR, err))?;

    Ok(Json(normalize_payload(raw)))
}

async fn insert_analysis_result(
    pool: &PgPool,
    user_id: &str,
    raw: &Value,
    image_path: &str,
) -> sqlx::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        "INSERT INTO analysis_results (id, user_id, predictions, navigation, image_path) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(raw.get("predictions"))
    .bind(raw.get("navigation"))
    .bind(image_path)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// The client keys off `resultId` to link the rendered report to history.
fn attach_result_id(normalized: Value, result_id: Uuid) -> Value {
    match normalized {
        Value::Object(mut map) => {
            map.insert("resultId".to_string(), json!(result_id));
            Value::Object(map)
        }
        other => json!({ "result": other, "resultId": result_id }),
    }
}

fn invalid_upload(err: UploadError) -> ApiError {
    ApiError::InvalidInput(err.message().to_string())
}

fn to_upload(file: UploadedFile) -> AnalysisUpload {
    AnalysisUpload {
        filename: file.original_name,
        content_type: file.content_type,
        bytes: file.bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_id_lands_next_to_the_report() {
        let id = Uuid::new_v4();
        let merged = attach_result_id(json!({ "product_name": "Granola" }), id);
        assert_eq!(merged["product_name"], json!("Granola"));
        assert_eq!(merged["resultId"], json!(id.to_string()));
    }

    #[test]
    fn non_object_reports_are_wrapped_rather_than_spread() {
        let id = Uuid::new_v4();
        let merged = attach_result_id(json!("verbatim text"), id);
        assert_eq!(merged["result"], json!("verbatim text"));
        assert_eq!(merged["resultId"], json!(id.to_string()));
    }
}
