//! Protocol version compatibility

use semver::Version;

use crate::PROTOCOL_VERSION;

/// The protocol version this build speaks
#[must_use]
pub fn protocol_version() -> Version {
    // PROTOCOL_VERSION is a literal checked by tests
    Version::parse(PROTOCOL_VERSION).unwrap_or_else(|_| Version::new(0, 0, 0))
}

/// Whether a peer speaking `peer` can talk to this build
///
/// Versions are compatible when their major components match; for 0.x
/// releases the minor component must match too.
#[must_use]
pub fn is_compatible(peer: &Version) -> bool {
    let ours = protocol_version();
    if ours.major != peer.major {
        return false;
    }
    ours.major > 0 || ours.minor == peer.minor
}
