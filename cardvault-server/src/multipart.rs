//! Multipart form parsing helpers
//!
//! Collects the file and text fields of a multipart/form-data upload into
//! a structured form the handlers can query.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::ApiError;

/// A file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
}

/// Parsed multipart form fields
#[derive(Debug)]
pub struct MultipartFields {
    file: Option<FileField>,
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request.
    ///
    /// The field named `file` is treated as the upload; everything else is
    /// collected as text. Actual payload validation (format, size,
    /// dimensions) is the image policy's job, after parsing.
    pub async fn parse(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut file: Option<FileField> = None;
        let mut text_fields = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "file" {
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?
                    .to_vec();

                file = Some(FileField { data, content_type });
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{name}': {e}"))
                })?;
                text_fields.insert(name, value);
            }
        }

        Ok(Self { file, text_fields })
    }

    /// Get the file field (required)
    pub fn require_file(&self) -> Result<&FileField, ApiError> {
        self.file.as_ref().ok_or_else(|| {
            ApiError::bad_request("No file provided. Use 'file' field in multipart form.")
        })
    }

    /// Get a text field value, `None` when absent.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|s| s.as_str())
    }

    /// Get a text field value, empty string when absent.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text_fields.get(name).cloned().unwrap_or_default()
    }

    /// Get a text field parsed as a boolean ("true", case-insensitive).
    pub fn get_bool(&self, name: &str) -> bool {
        self.text_fields
            .get(name)
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields_with(pairs: &[(&str, &str)]) -> MultipartFields {
        MultipartFields {
            file: None,
            text_fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_get_bool() {
        let fields = fields_with(&[("a", "true"), ("b", "TRUE"), ("c", "false"), ("d", "yes")]);
        assert!(fields.get_bool("a"));
        assert!(fields.get_bool("b"));
        assert!(!fields.get_bool("c"));
        assert!(!fields.get_bool("d"));
        assert!(!fields.get_bool("missing"));
    }

    #[test]
    fn test_text_or_empty() {
        let fields = fields_with(&[("name", "value")]);
        assert_eq!(fields.text_or_empty("name"), "value");
        assert_eq!(fields.text_or_empty("missing"), "");
    }

    #[test]
    fn test_require_file_missing() {
        let fields = fields_with(&[]);
        assert!(fields.require_file().is_err());
    }
}
