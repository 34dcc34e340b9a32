//! GitHub Releases API lister

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{DEFAULT_GITHUB_API_URL, GITHUB_PAGE_SIZE, USER_AGENT, github_token};
use crate::error::RegistryError;
use crate::lister::{Lister, extract_version};

/// Response item from GitHub Releases API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

/// Lists the published releases of a GitHub repository.
///
/// Follows the `Link: <...>; rel="next"` header page by page. Drafts and
/// pre-releases are skipped; the tag name is matched against the filter.
pub struct GitHubLister {
    client: reqwest::Client,
    base_url: String,
    repo: String,
    token: Option<String>,
}

impl GitHubLister {
    /// Lister for `repo` (e.g. "kubernetes-sigs/kustomize"), authenticated
    /// with `GITHUB_API_TOKEN` when it is set
    pub fn new(repo: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: DEFAULT_GITHUB_API_URL.to_string(),
            repo: repo.to_string(),
            token: github_token(),
        }
    }

    /// Use another API endpoint, e.g. GitHub Enterprise
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "{}/repos/{}/releases?per_page={}&page={}",
            self.base_url, self.repo, GITHUB_PAGE_SIZE, page
        )
    }

    async fn fetch_page(&self, page: u32) -> Result<(Vec<Release>, bool), RegistryError> {
        let url = self.page_url(page);
        debug!("Fetching releases page {}: {}", page, url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }
        let response = request.send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(self.repo.clone()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RegistryError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let has_next = has_next_page(
            response
                .headers()
                .get("link")
                .and_then(|v| v.to_str().ok()),
        );

        let releases: Vec<Release> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok((releases, has_next))
    }
}

/// Returns true if a `Link` header announces another page
fn has_next_page(link: Option<&str>) -> bool {
    link.is_some_and(|link| link.contains(r#"rel="next""#))
}

#[async_trait::async_trait]
impl Lister for GitHubLister {
    async fn fetch_versions(&self, filter: &Regex) -> Result<Vec<String>, RegistryError> {
        let mut versions = Vec::new();
        let mut page = 1;

        loop {
            let (releases, has_next) = self.fetch_page(page).await?;

            versions.extend(
                releases
                    .into_iter()
                    .filter(|r| !r.draft && !r.prerelease)
                    .filter_map(|r| extract_version(filter, &r.tag_name)),
            );

            if !has_next {
                break;
            }
            page += 1;
        }

        debug!("Found {} releases of {} in {} pages", versions.len(), self.repo, page);
        Ok(versions)
    }
}
