//! Request extraction helpers
//!
//! JSON bodies with declarative validation, multipart forms and path ids,
//! all rejecting with [`AppError`] so failures share one response shape.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::media::MediaUpload;

/// JSON body that has passed its `validator` rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Text fields and files of a multipart form
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, MediaUpload>,
}

impl MultipartForm {
    /// Read every part of the form into memory
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> AppResult<Self> {
        let mut multipart =
            multipart.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
                    form.files.insert(
                        name,
                        MediaUpload {
                            folder: String::new(),
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Text field, empty string when absent
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Remove a file part, placing it under `folder`
    pub fn take_file(&mut self, name: &str, folder: &str) -> Option<MediaUpload> {
        self.files.remove(name).map(|mut upload| {
            upload.folder = folder.to_string();
            upload
        })
    }
}

/// Parse an id taken from the request path
pub fn parse_uuid(raw: &str, what: &str) -> AppResult<Uuid> {
    if raw.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", what)));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidRequest(format!("invalid {}: {}", what, raw)))
}
