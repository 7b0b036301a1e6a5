use std::{collections::HashMap, path::Path};

use axum::extract::Multipart;

/// Largest upload accepted, matching the strictest client-side cap.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Medical condition codes the analysis service understands.
pub const CONDITION_CODES: &[&str] = &[
    "none",
    "diabetes",
    "hypertension",
    "celiac",
    "lactose",
    "peanut",
    "shellfish",
    "tree_nut",
    "gluten",
];

/// Field names accepted for the uploaded file. Older clients send `image`,
/// newer ones send `file`.
const FILE_FIELDS: &[&str] = &["file", "image"];

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "video/webm",
    "video/mp4",
    "application/pdf",
];

pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned while reading or validating an uploaded file.
#[derive(Debug)]
pub struct UploadError {
    message: String,
}

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UploadError {}

/// A single uploaded file, buffered in memory for forwarding upstream.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parsed multipart form: at most one file plus any text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<UploadedFile>,
    text_fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn take_file(&mut self) -> UploadResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| UploadError::new("No file provided"))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|value| value.as_str())
    }
}

/// Reads a multipart form into memory. Accepts one file part (under either
/// accepted field name) and any number of text parts; the first value wins
/// for repeated text fields. The size cap is enforced while streaming so an
/// oversized body is dropped without being buffered whole.
pub async fn read_upload_form(mut multipart: Multipart) -> UploadResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::new(format!("Failed to parse upload form: {err}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if field.file_name().is_none() {
            let value = field.text().await.map_err(|err| {
                UploadError::new(format!("Failed to read field `{field_name}`: {err}"))
            })?;
            form.text_fields.entry(field_name).or_insert(value);
            continue;
        }

        if !FILE_FIELDS.contains(&field_name.as_str()) {
            return Err(UploadError::new(format!(
                "Unsupported file field `{field_name}`"
            )));
        }
        if form.file.is_some() {
            return Err(UploadError::new("Only one file may be uploaded"));
        }

        let original_name = field.file_name().unwrap_or("upload.bin").to_string();
        let declared_type = field.content_type().map(|ct| ct.to_string());

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| UploadError::new(format!("Failed to read upload data: {err}")))?
        {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(UploadError::new("File size should be less than 10MB"));
            }
            bytes.extend_from_slice(&chunk);
        }

        let content_type = resolve_content_type(declared_type.as_deref(), &original_name);
        form.file = Some(UploadedFile {
            original_name,
            content_type,
            bytes,
        });
    }

    Ok(form)
}

/// Applies the upload rules: size cap and content-type allow-list.
pub fn validate_upload(file: &UploadedFile) -> UploadResult<()> {
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::new("File size should be less than 10MB"));
    }
    if !is_allowed_content_type(&file.content_type) {
        return Err(UploadError::new(format!(
            "Unsupported file type: {}",
            file.content_type
        )));
    }
    Ok(())
}

/// Prefers the declared part type; falls back to the filename extension when
/// the declaration is missing or the generic octet-stream default.
pub fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    match declared {
        Some(declared) if !declared.is_empty() && declared != "application/octet-stream" => {
            declared.to_string()
        }
        _ => extension_content_type(file_name)
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// Checks the allow-list on the type/subtype essence, so parameters such as
/// `;codecs=vp8,opus` do not affect the decision.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let Ok(parsed) = content_type.parse::<mime::Mime>() else {
        return false;
    };
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| parsed.essence_str().eq_ignore_ascii_case(allowed))
}

fn extension_content_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();

    let mapped = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mapped)
}

/// Maps a client-supplied condition onto the known code list. Unknown or
/// missing values fall back to `none` so the upstream query is always valid.
pub fn normalize_condition(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw else {
        return "none";
    };
    let trimmed = raw.trim();
    CONDITION_CODES
        .iter()
        .copied()
        .find(|code| trimmed.eq_ignore_ascii_case(code))
        .unwrap_or("none")
}

/// Path recorded on the analysis result. No file is written locally; the
/// value mirrors where the frontend expects uploads to live.
pub fn stored_image_path(original_name: &str) -> String {
    let sanitized = sanitize_filename::sanitize(original_name);
    if sanitized.is_empty() {
        return "uploads/upload.bin".to_string();
    }
    format!("uploads/{sanitized}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content_type: &str, size: usize) -> UploadedFile {
        UploadedFile {
            original_name: "capture.jpg".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn two_mebibyte_jpeg_passes_validation() {
        let upload = file("image/jpeg", 2 * 1024 * 1024);
        assert!(validate_upload(&upload).is_ok());
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let upload = file("image/jpeg", MAX_UPLOAD_BYTES + 1);
        let err = validate_upload(&upload).unwrap_err();
        assert_eq!(err.message(), "File size should be less than 10MB");
    }

    #[test]
    fn disallowed_type_is_rejected() {
        let upload = file("text/html", 128);
        assert!(validate_upload(&upload).is_err());
    }

    #[test]
    fn recorder_type_with_codec_parameters_is_allowed() {
        assert!(is_allowed_content_type("video/webm;codecs=vp8,opus"));
    }

    #[test]
    fn garbage_content_type_is_not_allowed() {
        assert!(!is_allowed_content_type("not a mime type"));
    }

    #[test]
    fn declared_content_type_wins() {
        assert_eq!(
            resolve_content_type(Some("image/png"), "capture.jpg"),
            "image/png"
        );
    }

    #[test]
    fn octet_stream_falls_back_to_the_extension() {
        assert_eq!(
            resolve_content_type(Some("application/octet-stream"), "capture.jpg"),
            "image/jpeg"
        );
    }

    #[test]
    fn missing_declaration_uses_the_extension() {
        assert_eq!(resolve_content_type(None, "clip.webm"), "video/webm");
    }

    #[test]
    fn unknown_extension_defaults_to_octet_stream() {
        assert_eq!(
            resolve_content_type(None, "notes.xyz"),
            "application/octet-stream"
        );
    }

    #[test]
    fn condition_codes_are_normalized() {
        assert_eq!(normalize_condition(None), "none");
        assert_eq!(normalize_condition(Some("diabetes")), "diabetes");
        assert_eq!(normalize_condition(Some("  CELIAC  ")), "celiac");
        assert_eq!(normalize_condition(Some("made-up")), "none");
    }

    #[test]
    fn stored_path_strips_directory_components() {
        let path = stored_image_path("../../etc/passwd");
        assert!(path.starts_with("uploads/"));
        assert!(!path["uploads/".len()..].contains('/'));
    }

    #[test]
    fn stored_path_handles_empty_names() {
        assert_eq!(stored_image_path(""), "uploads/upload.bin");
    }

    #[test]
    fn missing_file_yields_the_original_message() {
        let mut form = UploadForm::default();
        let err = form.take_file().unwrap_err();
        assert_eq!(err.message(), "No file provided");
    }
}
