//! Version parsing and constraint evaluation
//!
//! # Modules
//!
//! - [`semver`]: zero-padded semantic versions and sort helpers
//! - [`constraint`]: Terraform-style constraints (`>= 1.10.5, < 1.12`)
//! - [`error`]: Error type shared by both

pub mod constraint;
pub mod error;
pub mod semver;

pub use constraint::{ConstraintClause, Operator, VersionConstraint};
pub use error::VersionError;
pub use semver::{SemanticVersion, parse_version, sort_alphanumeric, sort_versions};
