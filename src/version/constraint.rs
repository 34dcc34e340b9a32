//! Terraform-style version constraints
//!
//! Supports comma-separated clauses, all of which must hold:
//! - `= 1.2.3` (or a bare `1.2.3`) - exact match after zero padding
//! - `!= 1.2.3` - exclude one version
//! - `> 1.2.3`, `< 1.2.3`, `>= 1.2.3`, `<= 1.2.3` - comparison operators
//! - `~> 1.2.3` - pessimistic: >=1.2.3 <1.3.0

use std::fmt;
use std::str::FromStr;

use crate::parser::terraform::TerraformParser;
use crate::version::error::VersionError;
use crate::version::semver::{SemanticVersion, parse_version};

/// Constraint operator as written by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    /// `~>`: at least the given version, below the next minor release
    Pessimistic,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

impl FromStr for Operator {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            "~>" => Ok(Operator::Pessimistic),
            _ => Err(VersionError::UnsupportedOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(operator, version)` pair, version kept verbatim for stringification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintClause {
    pub operator: Operator,
    pub version: String,
}

impl fmt::Display for ConstraintClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

/// A single compiled test against a bound
#[derive(Debug, Clone, PartialEq, Eq)]
struct Predicate {
    comparison: Comparison,
    bound: SemanticVersion,
}

impl Predicate {
    fn new(comparison: Comparison, bound: SemanticVersion) -> Self {
        Self { comparison, bound }
    }

    fn matches(&self, version: &SemanticVersion) -> bool {
        match self.comparison {
            Comparison::Eq => version == &self.bound,
            Comparison::Ne => version != &self.bound,
            Comparison::Gt => version > &self.bound,
            Comparison::Lt => version < &self.bound,
            Comparison::Ge => version >= &self.bound,
            Comparison::Le => version <= &self.bound,
        }
    }
}

/// A conjunction of constraint clauses.
///
/// Keeps the original clauses for [`Display`](fmt::Display) and the
/// compiled predicates for evaluation. `~>` compiles into two predicates,
/// so there can be more predicates than clauses.
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    clauses: Vec<ConstraintClause>,
    predicates: Vec<Predicate>,
}

impl VersionConstraint {
    /// Compile `(operator, version)` pairs.
    ///
    /// Fails on the first unknown operator or unparsable version; nothing
    /// is built in that case.
    pub fn new<I, O, V>(clauses: I) -> Result<Self, VersionError>
    where
        I: IntoIterator<Item = (O, V)>,
        O: AsRef<str>,
        V: AsRef<str>,
    {
        let mut compiled_clauses = Vec::new();
        let mut predicates = Vec::new();

        for (operator, version) in clauses {
            let operator: Operator = operator.as_ref().parse()?;
            let version = version.as_ref();
            let bound = parse_version(version)?;

            match operator {
                Operator::Eq => predicates.push(Predicate::new(Comparison::Eq, bound)),
                Operator::Ne => predicates.push(Predicate::new(Comparison::Ne, bound)),
                Operator::Gt => predicates.push(Predicate::new(Comparison::Gt, bound)),
                Operator::Lt => predicates.push(Predicate::new(Comparison::Lt, bound)),
                Operator::Ge => predicates.push(Predicate::new(Comparison::Ge, bound)),
                Operator::Le => predicates.push(Predicate::new(Comparison::Le, bound)),
                Operator::Pessimistic => {
                    // ~> 1.10.5 is >= 1.10.5, < 1.11.0
                    let upper = bound
                        .next_minor()
                        .ok_or_else(|| VersionError::InvalidVersion(version.to_string()))?;
                    predicates.push(Predicate::new(Comparison::Ge, bound));
                    predicates.push(Predicate::new(Comparison::Lt, upper));
                }
            }

            compiled_clauses.push(ConstraintClause {
                operator,
                version: version.to_string(),
            });
        }

        Ok(Self {
            clauses: compiled_clauses,
            predicates,
        })
    }

    /// Find `required_version` inside a `terraform { ... }` block.
    ///
    /// Returns `Ok(None)` when the text declares no constraint.
    pub fn from_terraform_config(content: &str) -> Result<Option<Self>, VersionError> {
        TerraformParser::new().find_required_version(content)
    }

    pub fn clauses(&self) -> &[ConstraintClause] {
        &self.clauses
    }

    /// Check an already parsed version against every predicate
    pub fn matches(&self, version: &SemanticVersion) -> bool {
        self.predicates.iter().all(|p| p.matches(version))
    }

    /// Returns true if the given version meets all constraints
    pub fn test_version(&self, version: &str) -> Result<bool, VersionError> {
        Ok(self.matches(&parse_version(version)?))
    }

    /// Keep only the versions meeting all constraints, in input order
    pub fn filter_versions<S: AsRef<str>>(
        &self,
        versions: &[S],
    ) -> Result<Vec<String>, VersionError> {
        let mut filtered = Vec::new();
        for version in versions {
            let version = version.as_ref();
            if self.test_version(version)? {
                filtered.push(version.to_string());
            }
        }
        Ok(filtered)
    }

    /// Returns the highest matching version, or None if nothing matches.
    ///
    /// Among semantically equal versions (`"3"`, `"3.0.0"`) the one listed
    /// last wins.
    pub fn latest_matching<S: AsRef<str>>(
        &self,
        versions: &[S],
    ) -> Result<Option<String>, VersionError> {
        let mut latest: Option<(SemanticVersion, &str)> = None;

        for version in versions {
            let version = version.as_ref();
            let parsed = parse_version(version)?;
            if !self.matches(&parsed) {
                continue;
            }
            if latest.as_ref().is_none_or(|(best, _)| parsed >= *best) {
                latest = Some((parsed, version));
            }
        }

        Ok(latest.map(|(_, version)| version.to_string()))
    }
}

/// Parses expressions like `">= 1.10.5, < 1.12"`, `"~> 1.10.5"` or `"1.10.5"`.
impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clauses = s.split(',').map(|item| {
            let item = item.trim();
            match item.split_once(char::is_whitespace) {
                Some((operator, version)) => (operator, version.trim()),
                None => ("=", item),
            }
        });

        Self::new(clauses)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            clause.fmt(f)?;
        }
        Ok(())
    }
}
