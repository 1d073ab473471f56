//! Collection of `multipart/form-data` bodies.
//!
//! Actor and movie writes arrive as forms because they may carry an image.
//! Text fields are kept as strings. Relation lists (`genre_ids`,
//! `cinema_ids`, `actors`) are JSON documents inside a text field.

use std::collections::HashMap;

use axum::extract::Multipart;
use chrono::NaiveDate;
use marquee_core::blob::Upload;
use marquee_core::error::CoreError;
use marquee_core::validation::ValidationErrors;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// A fully read multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormData {
    /// Drain `multipart`. Parts carrying a file name are files; the rest are
    /// text. An empty file part (a form submitted without choosing a file)
    /// is dropped.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !bytes.is_empty() {
                        form.files.insert(
                            name,
                            Upload {
                                file_name,
                                content_type,
                                bytes: bytes.to_vec(),
                            },
                        );
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// A text field, `None` when absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A text field, `None` when absent or blank.
    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.text(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Remove and return an uploaded file.
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }

    /// A `YYYY-MM-DD` date. Missing or unparseable dates are validation
    /// errors on the field.
    pub fn date(&self, name: &str) -> AppResult<NaiveDate> {
        let raw = self.text(name).map(str::trim).unwrap_or("");
        if raw.is_empty() {
            return Err(field_error(name, format!("The field {name} is required")));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            field_error(name, format!("The field {name} must be a date (YYYY-MM-DD)"))
        })
    }

    /// A checkbox-style boolean. Absent means `false`.
    pub fn flag(&self, name: &str) -> AppResult<bool> {
        match self.text(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) => match v.as_str() {
                "" | "false" | "0" | "off" => Ok(false),
                "true" | "1" | "on" => Ok(true),
                _ => Err(field_error(name, format!("The field {name} must be true or false"))),
            },
        }
    }

    /// A JSON-encoded field. Absent or blank yields `T::default()`.
    pub fn json<T: DeserializeOwned + Default>(&self, name: &str) -> AppResult<T> {
        match self.text(name).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| field_error(name, format!("The field {name} is not valid JSON: {e}"))),
        }
    }
}

fn field_error(field: &str, message: String) -> AppError {
    AppError::Core(CoreError::Validation(ValidationErrors::single(field, message)))
}
