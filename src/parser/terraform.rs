//! Terraform `required_version` scanner
//!
//! Looks for the version constraint inside the top-level `terraform` block:
//!
//! ```text
//! terraform {
//!   required_providers {
//!     sops = {
//!       source = "carlpett/sops"
//!     }
//!   }
//!   required_version = ">= 1.10.5, < 1.12, != 1.11.2"
//! }
//! ```
//!
//! Braces are not counted. The block ends at the first line holding a
//! closing brace in column 0, so indented braces of nested blocks keep the
//! scanner inside, while an unindented one ends the block early.

use regex::Regex;
use tracing::debug;

use crate::version::constraint::VersionConstraint;
use crate::version::error::VersionError;

/// One constraint clause: optional operator, then 1-3 numeric groups
const CLAUSE_PATTERN: &str = r"\s*[!=<>~]{0,2}\s*(?:[0-9]+\.){0,2}[0-9]+\s*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    OutsideBlock,
    InsideBlock,
}

/// Scanner for `.tf` file contents
pub struct TerraformParser {
    /// Regex for block start: `terraform {`
    block_start_re: Regex,
    /// Regex for block end: `}` in column 0
    block_end_re: Regex,
    /// Regex for `required_version = "<clauses>"`
    required_version_re: Regex,
}

impl TerraformParser {
    pub fn new() -> Self {
        let clauses = format!("((?:{CLAUSE_PATTERN},)*{CLAUSE_PATTERN})");
        Self {
            block_start_re: Regex::new(r"^terraform\s+\{\s*$").unwrap(),
            block_end_re: Regex::new(r"^\}\s*$").unwrap(),
            required_version_re: Regex::new(&format!(
                r#"^\s*required_version\s*=\s*"{clauses}"\s*$"#
            ))
            .unwrap(),
        }
    }

    /// Returns the first `required_version` constraint of a `terraform` block.
    ///
    /// `Ok(None)` means no block was opened, or the block closed (or the text
    /// ended) without a matching line. A matching line whose constraint
    /// doesn't compile is an error.
    pub fn find_required_version(
        &self,
        content: &str,
    ) -> Result<Option<VersionConstraint>, VersionError> {
        let mut state = ScanState::OutsideBlock;

        for (line_num, line) in content.lines().enumerate() {
            match state {
                ScanState::OutsideBlock => {
                    if self.block_start_re.is_match(line) {
                        state = ScanState::InsideBlock;
                    }
                }
                ScanState::InsideBlock => {
                    if self.block_end_re.is_match(line) {
                        state = ScanState::OutsideBlock;
                    } else if let Some(caps) = self.required_version_re.captures(line) {
                        let constraint = &caps[1];
                        debug!(
                            "Found required_version {:?} on line {}",
                            constraint,
                            line_num + 1
                        );
                        return constraint.parse().map(Some);
                    }
                }
            }
        }

        Ok(None)
    }
}

impl Default for TerraformParser {
    fn default() -> Self {
        Self::new()
    }
}
