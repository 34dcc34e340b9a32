//! Lister scraping versions out of a web page

use regex::Regex;
use tracing::{debug, warn};

use crate::config::USER_AGENT;
use crate::error::RegistryError;
use crate::lister::Lister;

/// Fetches a page and applies the version filter to every line of it.
///
/// Use a filter with one capture group that matches within a line, e.g.
/// `href="terraform/(\d+\.\d+\.\d+)/"`.
pub struct GenericLister {
    client: reqwest::Client,
    url: String,
    headers: Vec<(String, String)>,
}

impl GenericLister {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            url: url.to_string(),
            headers: Vec::new(),
        }
    }

    /// Adds a header sent with the page request
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn extract_versions(filter: &Regex, body: &str) -> Vec<String> {
        body.lines()
            .flat_map(|line| filter.captures_iter(line))
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[async_trait::async_trait]
impl Lister for GenericLister {
    async fn fetch_versions(&self, filter: &Regex) -> Result<Vec<String>, RegistryError> {
        debug!("Fetching versions from {}", self.url);

        let mut request = self.client.get(&self.url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        let response = request.send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(self.url.clone()));
        }

        if !status.is_success() {
            warn!("Version page returned status {}: {}", status, self.url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read version page: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(Self::extract_versions(filter, &body))
    }
}
