use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing file")]
    MissingFile,

    #[error("Empty filename")]
    EmptyFilename,

    #[error("Only image/* content types are allowed")]
    NotAnImage { content_type: String },
}

pub fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }
    Ok(())
}

/// Accepts any declared type whose top level is `image`, ignoring case and
/// parameters, and returns the lower-cased essence (`IMAGE/PNG; q=1` becomes
/// `image/png`). The subtype is not checked.
pub fn image_content_type(declared: Option<&str>) -> Result<String, ValidationError> {
    let declared = declared.unwrap_or_default();
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.split_once('/') {
        Some((top, _)) if top == mime::IMAGE.as_str() => Ok(essence),
        _ => Err(ValidationError::NotAnImage {
            content_type: declared.to_string(),
        }),
    }
}

/// Runs the upload checks in request order and yields the content type to
/// store alongside the blob.
pub fn validate_upload(filename: &str, content_type: Option<&str>) -> Result<String, ValidationError> {
    validate_filename(filename)?;
    image_content_type(content_type)
}
