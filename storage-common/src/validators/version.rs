//! Handshake version string validation

use semver::Version;

pub const MAX_VERSION_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    Empty,
    TooLong,
    /// Not a semantic version
    Invalid,
}

/// Validate and parse a peer's version string
pub fn validate_version(version: &str) -> Result<Version, VersionError> {
    if version.is_empty() {
        return Err(VersionError::Empty);
    }
    if version.len() > MAX_VERSION_LENGTH {
        return Err(VersionError::TooLong);
    }
    Version::parse(version).map_err(|_| VersionError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        assert_eq!(validate_version("1.2.3"), Ok(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(validate_version(""), Err(VersionError::Empty));
        assert_eq!(validate_version("one"), Err(VersionError::Invalid));
        assert_eq!(
            validate_version(&"1".repeat(MAX_VERSION_LENGTH + 1)),
            Err(VersionError::TooLong)
        );
    }
}
