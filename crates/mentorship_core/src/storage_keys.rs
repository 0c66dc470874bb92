use crate::content_type::{extension_for_content_type, extension_of};

pub const PROFILE_PICTURE_PREFIX: &str = "profile_pictures";
pub const FALLBACK_EXTENSION: &str = "bin";

/// Deterministic object key for a user's profile picture:
/// `profile_pictures/<email>.<ext>`.
///
/// The extension comes from the uploaded file name when it has one, then from
/// the declared content type, then [`FALLBACK_EXTENSION`].
pub fn profile_picture_key(email: &str, file_name: &str, content_type: &str) -> String {
    let extension = extension_of(file_name)
        .or_else(|| extension_for_content_type(content_type).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    format!("{PROFILE_PICTURE_PREFIX}/{email}.{extension}")
}

pub fn public_object_url(bucket: &str, key: &str) -> String {
    format!(
        "https://{bucket}.s3.amazonaws.com/{}",
        key.trim_start_matches('/')
    )
}

/// Name offered to the browser in `Content-Disposition`.
pub fn download_file_name(key: &str) -> &str {
    key.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picture_key_prefers_file_name_extension() {
        let key = profile_picture_key("jo@example.com", "Selfie.JPEG", "image/png");
        assert_eq!(key, "profile_pictures/jo@example.com.jpeg");
    }

    #[test]
    fn picture_key_falls_back_to_content_type_then_bin() {
        assert_eq!(
            profile_picture_key("jo@example.com", "", "image/png"),
            "profile_pictures/jo@example.com.png"
        );
        assert_eq!(
            profile_picture_key("jo@example.com", "blob", "application/x-unknown"),
            "profile_pictures/jo@example.com.bin"
        );
    }

    #[test]
    fn picture_key_is_stable_for_same_identity() {
        let first = profile_picture_key("jo@example.com", "a.png", "image/png");
        let second = profile_picture_key("jo@example.com", "b.png", "image/png");
        assert_eq!(first, second);
    }

    #[test]
    fn builds_public_url() {
        assert_eq!(
            public_object_url("mentorship-files", "/profile_pictures/jo@example.com.png"),
            "https://mentorship-files.s3.amazonaws.com/profile_pictures/jo@example.com.png"
        );
    }

    #[test]
    fn download_name_is_last_segment() {
        assert_eq!(download_file_name("docs/2024/report.pdf"), "report.pdf");
        assert_eq!(download_file_name("report.pdf"), "report.pdf");
        assert_eq!(download_file_name("docs/"), "docs");
    }
}
