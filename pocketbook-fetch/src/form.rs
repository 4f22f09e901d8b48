//! Replayable multipart bodies.
//!
//! reqwest's `Form` is consumed when sent, so requests keep a
//! [`MultipartForm`] and build a fresh `Form` on every send. File contents
//! are held in memory behind an `Arc`, which keeps replays after a token
//! refresh cheap.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::FetchError;

/// A file attached to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    file_name: String,
    mime: Option<String>,
    bytes: Arc<Vec<u8>>,
}

impl FormFile {
    /// Wraps file contents. The MIME type is guessed from the extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            mime,
            bytes: Arc::new(bytes),
        }
    }

    /// Overrides the MIME type.
    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// File name sent to the server.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// MIME type, if known.
    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    /// File contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text value.
    Text(String),
    /// File upload.
    File(FormFile),
}

/// Multipart form that can be sent more than once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<(String, FormPart)>,
}

impl MultipartForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds text fields from the members of a JSON object.
    ///
    /// Strings are sent as-is, nulls are skipped, and other values use their
    /// JSON text (`5000.0`, `true`).
    pub fn from_json_fields(value: &Value) -> Result<Self, FetchError> {
        let Value::Object(members) = value else {
            return Err(FetchError::InvalidRequest(
                "form fields must come from a JSON object".to_string(),
            ));
        };

        let mut form = Self::new();
        for (name, value) in members {
            match value {
                Value::Null => {}
                Value::String(text) => form = form.text(name.as_str(), text.as_str()),
                other => form = form.text(name.as_str(), other.to_string()),
            }
        }
        Ok(form)
    }

    /// Appends a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Appends a file field.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, file: FormFile) -> Self {
        self.parts.push((name.into(), FormPart::File(file)));
        self
    }

    /// Fields in insertion order.
    pub fn parts(&self) -> &[(String, FormPart)] {
        &self.parts
    }

    /// First field named `name`.
    pub fn field(&self, name: &str) -> Option<&FormPart> {
        self.parts
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, part)| part)
    }

    /// Builds the reqwest form for one send.
    pub(crate) fn to_form(&self) -> Result<Form, FetchError> {
        let mut form = Form::new();
        for (name, part) in &self.parts {
            form = match part {
                FormPart::Text(text) => form.text(name.clone(), text.clone()),
                FormPart::File(file) => {
                    let mut part =
                        Part::bytes(file.bytes().to_vec()).file_name(file.file_name.clone());
                    if let Some(mime) = file.mime() {
                        part = part.mime_str(mime)?;
                    }
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}
