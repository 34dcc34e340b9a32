//! Release listing for asdf's `list-all`
//!
//! A [`Lister`] fetches raw version strings from somewhere (a web page, the
//! GitHub releases API). [`list_all`] runs the shared pipeline on top:
//! keep only what the filter matches, take its first capture group,
//! deduplicate, sort.

pub mod generic;
pub mod github;

pub use generic::GenericLister;
pub use github::GitHubLister;

#[cfg(test)]
use mockall::automock;

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::config::DEFAULT_VERSION_FILTER;
use crate::error::RegistryError;
use crate::version::semver::{sort_alphanumeric, sort_versions};

/// Trait for fetching the versions a plugin can install
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Lister: Send + Sync {
    /// Fetches the versions matching `filter`
    ///
    /// # Arguments
    /// * `filter` - version regex; group 1 (or the whole match without
    ///   groups) is the version string
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Versions in source order, may contain duplicates
    /// * `Err(RegistryError)` - If the fetch fails
    async fn fetch_versions(&self, filter: &Regex) -> Result<Vec<String>, RegistryError>;
}

/// How `list_all` orders its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionOrder {
    /// By major, minor and patch
    #[default]
    Semantic,
    /// As plain strings
    Alphanumeric,
}

/// Options for [`list_all`]
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub filter: Regex,
    pub order: VersionOrder,
}

impl ListOptions {
    /// Options with a custom filter; it should have exactly one capture group
    pub fn with_filter(filter: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            filter: Regex::new(filter)?,
            order: VersionOrder::default(),
        })
    }

    pub fn with_order(mut self, order: VersionOrder) -> Self {
        self.order = order;
        self
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            filter: Regex::new(DEFAULT_VERSION_FILTER).unwrap(),
            order: VersionOrder::default(),
        }
    }
}

/// Returns the filtered part of `haystack`: capture group 1 if the filter
/// has one, the whole match otherwise
pub(crate) fn extract_version(filter: &Regex, haystack: &str) -> Option<String> {
    let caps = filter.captures(haystack)?;
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string())
}

/// Implements asdf's `list-all`: fetch, deduplicate and sort.
pub async fn list_all(
    lister: &dyn Lister,
    options: &ListOptions,
) -> Result<Vec<String>, RegistryError> {
    let versions = lister.fetch_versions(&options.filter).await?;
    debug!("Fetched {} versions", versions.len());

    let mut seen = HashSet::new();
    let unique: Vec<String> = versions
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect();

    let sorted = match options.order {
        VersionOrder::Semantic => sort_versions(unique)?,
        VersionOrder::Alphanumeric => sort_alphanumeric(unique),
    };

    Ok(sorted)
}

/// Formats versions the way asdf expects on stdout: space separated
pub fn format_version_list(versions: &[String]) -> String {
    versions.join(" ")
}
