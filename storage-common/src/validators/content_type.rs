//! Content type validation
//!
//! Empty is accepted (the server infers a type from the uploaded bytes).
//! Otherwise the value must look like `type/subtype` with optional
//! parameters.

pub const MAX_CONTENT_TYPE_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeError {
    TooLong,
    /// Missing the `/` between type and subtype
    MissingSubtype,
    InvalidCharacters,
}

pub fn validate_content_type(content_type: &str) -> Result<(), ContentTypeError> {
    if content_type.is_empty() {
        return Ok(());
    }
    if content_type.len() > MAX_CONTENT_TYPE_LENGTH {
        return Err(ContentTypeError::TooLong);
    }
    if content_type.chars().any(|ch| ch.is_control() || !ch.is_ascii()) {
        return Err(ContentTypeError::InvalidCharacters);
    }

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => Ok(()),
        _ => Err(ContentTypeError::MissingSubtype),
    }
}
