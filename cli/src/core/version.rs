//! # ddev Version Constraints
//!
//! File: cli/src/core/version.rs
//!
//! ## Overview
//!
//! Evaluates semver constraints against the running binary's version.
//! Backs `ddev debug version-constraint`, which scripts use to verify the
//! installed ddev meets a requirement before proceeding.
//!
use crate::core::error::{DdevError, Result};
use anyhow::anyhow;
use semver::{Version, VersionReq};

/// The version of the running binary.
pub fn binary_version() -> Version {
    // CARGO_PKG_VERSION is always valid semver.
    Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| Version::new(0, 0, 0))
}

/// Checks `constraint` (e.g. `">= 1.2.0"`) against `version`.
///
/// An unparsable constraint is an operational failure (exit 1) carrying the
/// literal `constraint is invalid` so callers surface a stable message; a
/// valid but unmet constraint returns `Ok(false)`.
pub fn check_constraint(constraint: &str, version: &Version) -> Result<bool> {
    let req = VersionReq::parse(constraint).map_err(|e| {
        anyhow!(DdevError::Precondition(format!(
            "constraint is invalid: '{}': {}",
            constraint, e
        )))
    })?;
    Ok(req.matches(version))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_met_constraint() {
        let v = Version::parse("1.23.0").unwrap();
        assert!(check_constraint(">= 1.0.0", &v).unwrap());
        assert!(check_constraint(">=1.23.0, <2.0.0", &v).unwrap());
    }

    #[test]
    fn test_unmet_constraint() {
        let v = Version::parse("1.23.0").unwrap();
        assert!(!check_constraint("< 1.23.0", &v).unwrap());
        assert!(!check_constraint("> 99.0.0", &v).unwrap());
    }

    #[test]
    fn test_invalid_constraint_is_operational_error() {
        let v = Version::parse("1.23.0").unwrap();
        let err = check_constraint("> 1.twentythree", &v).unwrap_err();
        let ddev = err.downcast_ref::<DdevError>().expect("typed error");
        assert_eq!(ddev.exit_code(), 1);
        assert!(err.to_string().contains("constraint is invalid"));
    }

    #[test]
    fn test_binary_version_parses() {
        // The crate version must stay valid semver for the constraint
        // command to be meaningful.
        assert!(binary_version() > Version::new(0, 0, 0));
    }
}
