use std::path::Path;

use crate::api::errors::ApiError;

/// Plausibility check for the registration form, not RFC validation: a
/// non-empty local part, one `@`, a dotted domain, no whitespace.
pub(crate) fn validate_student_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();

    let plausible = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };

    if plausible {
        Ok(())
    } else {
        Err(ApiError::BadRequest("A valid email address is required".to_string()))
    }
}

pub(crate) fn validate_image_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

pub(crate) fn sanitized_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(validate_student_email("ada@example.com").is_ok());
        assert!(validate_student_email("  first.last@sub.domain.org ").is_ok());
    }

    #[test]
    fn rejects_implausible_emails() {
        for email in ["", "no-at-sign", "@example.com", "a@", "a@nodot", "a b@example.com",
            "a@.com", "a@example.", "a@b@c.com"]
        {
            assert!(validate_student_email(email).is_err(), "accepted: {email}");
        }
    }

    #[test]
    fn image_upload_checks_extension_and_mime() {
        let allowed = vec!["jpg".to_string(), "png".to_string()];
        assert!(validate_image_upload("photo.png", "image/png", &allowed).is_ok());
        assert!(validate_image_upload("photo.PNG", "image/png", &allowed).is_ok());
        assert!(validate_image_upload("photo.gif", "image/gif", &allowed).is_err());
        assert!(validate_image_upload("photo.png", "image/jpeg", &allowed).is_err());
        assert!(validate_image_upload("photo", "image/png", &allowed).is_err());
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitized_filename("my photo (1).png"), "myphoto1.png");
        assert_eq!(sanitized_filename("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitized_filename("¯\\_(ツ)_/¯"), "__");
        assert_eq!(sanitized_filename(""), "upload");
    }
}
