//! Version ordering for upgrades.
//!
//! Versions are semantic versions with an optional leading `v`; short forms
//! like `v4.0` are padded to `v4.0.0`. Build metadata is ignored. Strings
//! that do not parse sort below every valid version and equal to each other.

use semver::{BuildMetadata, Version};
use std::cmp::Ordering;

use super::OperationError;

const NIGHTLY: &str = "nightly";

/// Whether `version` is a nightly build tag.
pub fn is_nightly(version: &str) -> bool {
    version.contains(NIGHTLY)
}

fn parse(version: &str) -> Option<Version> {
    let bare = version.trim().strip_prefix('v').unwrap_or(version.trim());

    let padded = if bare.contains(['-', '+']) {
        bare.to_string()
    } else {
        match bare.split('.').count() {
            1 => format!("{bare}.0.0"),
            2 => format!("{bare}.0"),
            _ => bare.to_string(),
        }
    };

    let mut parsed = Version::parse(&padded).ok()?;
    parsed.build = BuildMetadata::EMPTY;
    Some(parsed)
}

/// Compare two version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Check that a cluster at `current` may move to `target`.
///
/// Moving forward is always allowed. Moving backward is allowed only to a
/// nightly build. Staying on the same version is rejected.
pub fn check_upgrade(current: &str, target: &str) -> Result<(), OperationError> {
    if target.trim().is_empty() {
        return Err(OperationError::InvalidVersion(target.to_string()));
    }

    let allowed = match compare(current, target) {
        Ordering::Less => true,
        Ordering::Greater => is_nightly(target),
        Ordering::Equal => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(OperationError::IncompatibleVersion {
            from: current.to_string(),
            to: target.to_string(),
        })
    }
}
