//! Container formats accepted for conversion.

/// Container formats the converter accepts, as the format dropdown reports
/// them (leading dot included).
pub const SUPPORTED_FORMATS: [&str; 6] = [".mp4", ".avi", ".mkv", ".flv", ".webm", ".wmv"];

/// Upload size ceiling in bytes (10MB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extension of a file name, dot included.
///
/// Takes everything after the last `.`; a name without any dot yields the
/// whole name behind a dot. Case is preserved, so `clip.MP4` gives `.MP4`.
pub fn file_extension(file_name: &str) -> String {
    let tail = file_name.rsplit('.').next().unwrap_or(file_name);
    format!(".{}", tail)
}

/// Check whether an extension (dot included) is in the supported set.
pub fn is_supported(extension: &str) -> bool {
    SUPPORTED_FORMATS.contains(&extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_takes_last_segment() {
        assert_eq!(file_extension("clip.mp4"), ".mp4");
        assert_eq!(file_extension("holiday.final.webm"), ".webm");
    }

    #[test]
    fn test_file_extension_keeps_case() {
        assert_eq!(file_extension("clip.MP4"), ".MP4");
    }

    #[test]
    fn test_file_extension_without_dot() {
        assert_eq!(file_extension("README"), ".README");
        assert_eq!(file_extension("trailing."), ".");
    }

    #[test]
    fn test_supported_set() {
        for format in SUPPORTED_FORMATS {
            assert!(is_supported(format));
        }
        assert!(!is_supported(".mov"));
        assert!(!is_supported(".MP4"));
        assert!(!is_supported("mp4"));
    }

    #[test]
    fn test_max_upload_bytes() {
        assert_eq!(MAX_UPLOAD_BYTES, 10_485_760);
    }
}
