//! Upload selection made on the conversion form.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::format::file_extension;

/// Metadata of a picked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileMeta {
    /// File name as picked, no directory part
    pub name: String,
    /// Size in bytes
    pub size_bytes: u64,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }

    /// Extension of the file name, dot included.
    pub fn extension(&self) -> String {
        file_extension(&self.name)
    }
}

/// What the user picked on the form: the files, the target format and an
/// optional quality preset.
///
/// The picker can report any number of files; validation requires exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadSelection {
    /// Picked files
    pub files: Vec<FileMeta>,
    /// Target container format, e.g. ".avi"
    pub target_format: String,
    /// Quality preset, e.g. "ultrafast"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl UploadSelection {
    /// Selection with a single file.
    pub fn single(file: FileMeta, target_format: impl Into<String>) -> Self {
        Self {
            files: vec![file],
            target_format: target_format.into(),
            preset: None,
        }
    }

    /// Selection with no file picked yet.
    pub fn empty(target_format: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            target_format: target_format.into(),
            preset: None,
        }
    }

    /// Set the quality preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    /// The picked file when exactly one is present.
    pub fn file(&self) -> Option<&FileMeta> {
        match self.files.as_slice() {
            [file] => Some(file),
            _ => None,
        }
    }
}
