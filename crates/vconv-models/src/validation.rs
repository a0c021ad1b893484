//! Client-side validation of an upload selection.
//!
//! Validation is a pure function of the selection. Checks run in a fixed
//! order and the first failing check decides the outcome; errors are never
//! accumulated. Showing the message and the loading indicator is left to the
//! caller.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::{is_supported, MAX_UPLOAD_BYTES};
use crate::selection::UploadSelection;

/// Reason a selection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("No file uploaded")]
    NoFile,

    #[error("File format to convert to should be different than uploaded file format")]
    SameFormat,

    #[error("The uploaded file format is not supported")]
    UnsupportedFormat,

    #[error("File size should not be greater than 10MB")]
    FileTooLarge,
}

impl ValidationError {
    /// Message shown in the error panel.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Validate a selection before it is submitted.
pub fn validate(selection: &UploadSelection) -> Result<(), ValidationError> {
    let file = selection.file().ok_or(ValidationError::NoFile)?;
    let extension = file.extension();

    if extension == selection.target_format {
        return Err(ValidationError::SameFormat);
    }

    if !is_supported(&extension) {
        return Err(ValidationError::UnsupportedFormat);
    }

    if file.size_bytes > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge);
    }

    Ok(())
}
