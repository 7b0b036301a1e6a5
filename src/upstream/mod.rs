use anyhow::{Context, Result, bail};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

pub mod normalize;

/// One captured upload, ready to forward to the analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Client for the external analysis service.
///
/// Requests deliberately carry no timeout; callers wait exactly as long as
/// the service takes.
#[derive(Clone)]
pub struct AnalysisClient {
    http: Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Submit an upload to `/analyze`, tagged with the caller's medical
    /// condition code.
    pub async fn analyze(&self, upload: AnalysisUpload, condition: &str) -> Result<Value> {
        let url = format!("{}/analyze", self.base_url);
        let form = Form::new().part("file", file_part(upload)?);
        self.post_form(&url, condition, form).await
    }

    /// Submit an upload to `/eco-agent/product-details`, attaching the
    /// requesting user's id when one is known.
    pub async fn product_details(
        &self,
        upload: AnalysisUpload,
        condition: &str,
        user_id: Option<&str>,
    ) -> Result<Value> {
        let url = format!("{}/eco-agent/product-details", self.base_url);
        let mut form = Form::new().part("file", file_part(upload)?);
        if let Some(user_id) = user_id {
            form = form.text("userId", user_id.to_string());
        }
        self.post_form(&url, condition, form).await
    }

    async fn post_form(&self, url: &str, condition: &str, form: Form) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .query(&[("userMedicalAilments", condition)])
            .multipart(form)
            .send()
            .await
            .context("analysis service request failed")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("failed to read analysis response body")?;
        if !status.is_success() {
            bail!(
                "analysis service call failed with status {}: {}",
                status,
                response_text
            );
        }

        serde_json::from_str(&response_text).with_context(|| {
            format!(
                "failed to parse analysis response as JSON. Response body: {}",
                response_preview(&response_text)
            )
        })
    }
}

/// First 500 characters of a response body, marked when truncated. Cuts on
/// character boundaries so multibyte bodies cannot split mid-sequence.
fn response_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(500).collect();
    if preview.len() < text.len() {
        preview.push_str("...");
    }
    preview
}

fn file_part(upload: AnalysisUpload) -> Result<Part> {
    Part::bytes(upload.bytes)
        .file_name(upload.filename)
        .mime_str(&upload.content_type)
        .context("upload carries an unusable content type")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::post};
    use tokio::net::TcpListener;

    fn jpeg_upload() -> AnalysisUpload {
        AnalysisUpload {
            filename: "capture.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0u8; 64],
        }
    }

    #[tokio::test]
    async fn upstream_error_status_surfaces_as_an_error() {
        let app = Router::new().route(
            "/analyze",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "analysis backend is down") }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = AnalysisClient::new(format!("http://{addr}"));
        let err = client.analyze(jpeg_upload(), "none").await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("503"), "unexpected error: {message}");
        assert!(message.contains("analysis backend is down"));
    }

    #[tokio::test]
    async fn non_json_success_body_surfaces_as_an_error() {
        let app = Router::new().route("/analyze", post(|| async { "<html>not json</html>" }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = AnalysisClient::new(format!("http://{addr}"));
        let err = client.analyze(jpeg_upload(), "none").await.unwrap_err();
        assert!(err.to_string().contains("failed to parse analysis response"));
    }

    #[test]
    fn short_previews_are_returned_whole() {
        assert_eq!(response_preview("short body"), "short body");
    }

    #[test]
    fn long_multibyte_previews_truncate_on_character_boundaries() {
        let body = "é".repeat(600);
        let preview = response_preview(&body);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 503);
    }
}
