//! Navigation targets and server error codes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::ValidationError;

/// Where the client goes once an operation reaches its end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Navigation {
    /// Home page carrying the server's error code
    Home { error_code: i64 },
    /// Download page of a converted file
    Download { filename: String },
    /// Sentinel for a jobs page reached without a submission
    UnauthorizedAccess,
}

impl Navigation {
    /// Home page with an error code.
    pub fn home(error_code: i64) -> Self {
        Navigation::Home { error_code }
    }

    /// Download page for an output file.
    pub fn download(filename: impl Into<String>) -> Self {
        Navigation::Download {
            filename: filename.into(),
        }
    }

    /// Resolve a directly requested path. A bare `jobs` path is not a page of
    /// its own and sends the user to the unauthorized-access sentinel.
    pub fn for_direct_access(path: &str) -> Option<Self> {
        match path.trim_matches('/') {
            "jobs" => Some(Navigation::UnauthorizedAccess),
            _ => None,
        }
    }

    /// Path of the target, relative to the site root.
    pub fn path(&self) -> String {
        match self {
            Navigation::Home { error_code } => format!("/home/{}", error_code),
            Navigation::Download { filename } => {
                format!("/downloads/{}", urlencoding::encode(filename))
            }
            Navigation::UnauthorizedAccess => {
                format!("/{}", ServerErrorCode::UnauthorizedAccess.code())
            }
        }
    }

    /// Absolute URL of the target under a base URL.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }

    /// Error code carried by the target, if any.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Navigation::Home { error_code } => Some(*error_code),
            Navigation::UnauthorizedAccess => Some(ServerErrorCode::UnauthorizedAccess.code()),
            Navigation::Download { .. } => None,
        }
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Error codes the conversion server hands back on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServerErrorCode {
    NoFile,
    UnsupportedFormat,
    SameFormat,
    FileTooLarge,
    UnauthorizedAccess,
}

impl ServerErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ServerErrorCode::NoFile => 101,
            ServerErrorCode::UnsupportedFormat => 102,
            ServerErrorCode::SameFormat => 103,
            ServerErrorCode::FileTooLarge => 104,
            ServerErrorCode::UnauthorizedAccess => 105,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            101 => Some(ServerErrorCode::NoFile),
            102 => Some(ServerErrorCode::UnsupportedFormat),
            103 => Some(ServerErrorCode::SameFormat),
            104 => Some(ServerErrorCode::FileTooLarge),
            105 => Some(ServerErrorCode::UnauthorizedAccess),
            _ => None,
        }
    }

    /// Message the home page shows for this code.
    pub fn message(&self) -> &'static str {
        match self {
            ServerErrorCode::NoFile => "No file uploaded",
            ServerErrorCode::UnsupportedFormat => "The uploaded file format is not supported",
            ServerErrorCode::SameFormat => {
                "File format to convert to should be different than uploaded file format"
            }
            ServerErrorCode::FileTooLarge => "File size should not be greater than 10MB",
            ServerErrorCode::UnauthorizedAccess => "Please start a conversion from the home page",
        }
    }
}

impl From<ValidationError> for ServerErrorCode {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NoFile => ServerErrorCode::NoFile,
            ValidationError::UnsupportedFormat => ServerErrorCode::UnsupportedFormat,
            ValidationError::SameFormat => ServerErrorCode::SameFormat,
            ValidationError::FileTooLarge => ServerErrorCode::FileTooLarge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Navigation::home(42).path(), "/home/42");
        assert_eq!(Navigation::download("out.mp4").path(), "/downloads/out.mp4");
        assert_eq!(Navigation::UnauthorizedAccess.path(), "/105");
    }

    #[test]
    fn test_download_path_encodes_filename() {
        assert_eq!(
            Navigation::download("my clip.mp4").path(),
            "/downloads/my%20clip.mp4"
        );
    }

    #[test]
    fn test_url_joins_base() {
        assert_eq!(
            Navigation::home(101).url("http://localhost:5000/"),
            "http://localhost:5000/home/101"
        );
    }

    #[test]
    fn test_direct_access_to_jobs() {
        assert_eq!(
            Navigation::for_direct_access("/jobs"),
            Some(Navigation::UnauthorizedAccess)
        );
        assert_eq!(Navigation::for_direct_access("jobs/"), Some(Navigation::UnauthorizedAccess));
        assert_eq!(Navigation::for_direct_access("/jobs/abc"), None);
    }

    #[test]
    fn test_error_code_round_trip_and_messages() {
        for code in 101..=105 {
            let known = ServerErrorCode::from_code(code).expect("known code");
            assert_eq!(known.code(), code);
            assert!(!known.message().is_empty());
        }
        assert_eq!(ServerErrorCode::from_code(42), None);
    }

    #[test]
    fn test_validation_errors_share_server_messages() {
        for err in [
            ValidationError::NoFile,
            ValidationError::SameFormat,
            ValidationError::UnsupportedFormat,
            ValidationError::FileTooLarge,
        ] {
            assert_eq!(ServerErrorCode::from(err).message(), err.message());
        }
    }
}
