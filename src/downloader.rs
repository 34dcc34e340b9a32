//! asdf's `download` step: fetch a release file into `ASDF_DOWNLOAD_PATH`

use std::path::PathBuf;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::{DEFAULT_GITHUB_DOWNLOAD_URL, USER_AGENT, github_token};
use crate::context::InstallContext;
use crate::error::{DownloadError, TemplateError};

/// Downloads files from a base URL.
///
/// The URL may contain `{filename}`; without it `/{filename}` is appended.
/// URL, file name and target all go through the context's templating, so
/// `"sops-v{version}.{platform}.{arch}"` works as a file name.
pub struct Downloader {
    client: reqwest::Client,
    url: String,
    repo: Option<String>,
    token: Option<String>,
    context: InstallContext,
}

impl Downloader {
    pub fn new(url: &str, context: InstallContext) -> Self {
        let url = if url.contains("{filename}") {
            url.to_string()
        } else {
            format!("{}/{{filename}}", url)
        };

        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            url,
            repo: None,
            token: None,
            context,
        }
    }

    /// Downloader for release assets of `repo` (e.g. "getsops/sops").
    ///
    /// Uses `https://github.com/{repo}/releases/download/v{version}` and
    /// sends `GITHUB_API_TOKEN` when it is set.
    pub fn github(repo: &str, context: InstallContext) -> Self {
        Self::github_with_url(repo, DEFAULT_GITHUB_DOWNLOAD_URL, context)
    }

    /// Like [`Downloader::github`] with a custom URL; `{repo}` is available
    pub fn github_with_url(repo: &str, url: &str, context: InstallContext) -> Self {
        let mut downloader = Self::new(url, context);
        downloader.repo = Some(repo.to_string());
        downloader.token = github_token();
        downloader
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn template(&self, template: &str, extra: &[(&str, &str)]) -> Result<String, TemplateError> {
        let mut vars = extra.to_vec();
        if let Some(repo) = &self.repo {
            vars.push(("repo", repo.as_str()));
        }
        self.context.template(template, &vars)
    }

    /// Render the URL to download the given file from
    pub fn download_url(&self, file: &str) -> Result<String, TemplateError> {
        let filename = self.template(file, &[])?;
        self.template(&self.url, &[("filename", filename.as_str())])
    }

    /// Download `file` to `target` inside the download directory.
    ///
    /// `target` defaults to the context's default local file
    /// (`downloaded.file`), also when empty. Returns the path written.
    pub async fn download(&self, file: &str, target: Option<&str>) -> Result<PathBuf, DownloadError> {
        let target = target
            .filter(|t| !t.is_empty())
            .unwrap_or(self.context.default_local_file());
        let target_path = self
            .context
            .download_path()
            .join(self.template(target, &[])?);
        let url = self.download_url(file)?;

        info!("downloading {} to {}", url, target_path.display());

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }
        let response = request.send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DownloadError::NotFound(url));
        }

        if !status.is_success() {
            warn!("Download returned status {}: {}", status, url);
            return Err(DownloadError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        if let Some(parent) = target_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&target_path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(target_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;
    use mockito::Server;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn download_url_appends_filename_placeholder() {
        let context = test_context(Path::new("/dl"), Path::new("/inst"));
        let downloader = Downloader::new("https://releases.example.com/tool/{version}", context);

        assert_eq!(
            downloader
                .download_url("tool_{version}_{platform}_{arch}.zip")
                .unwrap(),
            "https://releases.example.com/tool/3.9.4/tool_3.9.4_linux_amd64.zip"
        );
    }

    #[test]
    fn download_url_keeps_explicit_filename_position() {
        let context = test_context(Path::new("/dl"), Path::new("/inst"));
        let downloader =
            Downloader::new("https://example.com/get?file={filename}&v={version}", context);

        assert_eq!(
            downloader.download_url("tool.tgz").unwrap(),
            "https://example.com/get?file=tool.tgz&v=3.9.4"
        );
    }

    #[test]
    fn github_download_url_uses_repo() {
        let context = test_context(Path::new("/dl"), Path::new("/inst"));
        let downloader = Downloader::github("getsops/sops", context).with_token(None);

        assert_eq!(
            downloader
                .download_url("sops-v{version}.{platform}.{arch}")
                .unwrap(),
            "https://github.com/getsops/sops/releases/download/v3.9.4/sops-v3.9.4.linux.amd64"
        );
    }

    #[test]
    fn generic_download_url_rejects_repo_placeholder() {
        let context = test_context(Path::new("/dl"), Path::new("/inst"));
        let downloader = Downloader::new("https://example.com/{repo}", context);

        assert!(matches!(
            downloader.download_url("file"),
            Err(TemplateError::UnknownPlaceholder(name, _)) if name == "repo"
        ));
    }

    #[tokio::test]
    async fn download_streams_body_to_default_file() {
        let mut server = Server::new_async().await;
        let body = vec![7u8; 64 * 1024];

        let mock = server
            .mock("GET", "/v3.9.4/sops-v3.9.4.linux.amd64")
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let download_dir = TempDir::new().unwrap();
        let context = test_context(download_dir.path(), Path::new("/inst"));
        let downloader = Downloader::new(&format!("{}/v{{version}}", server.url()), context);

        let path = downloader
            .download("sops-v{version}.{platform}.{arch}", None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(path, download_dir.path().join("downloaded.file"));
        assert_eq!(std::fs::read(&path).unwrap(), body);
    }

    #[tokio::test]
    async fn download_treats_empty_target_as_default() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/tool.zip")
            .with_status(200)
            .with_body("zip")
            .create_async()
            .await;

        let download_dir = TempDir::new().unwrap();
        let context = test_context(download_dir.path(), Path::new("/inst"));
        let downloader = Downloader::new(&server.url(), context);

        let path = downloader.download("tool.zip", Some("")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(path, download_dir.path().join("downloaded.file"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "zip");
    }

    #[tokio::test]
    async fn download_writes_templated_target() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/owner/tool/tool.tar.gz")
            .match_header("authorization", "token ghp_secret")
            .with_status(200)
            .with_body("archive")
            .create_async()
            .await;

        let download_dir = TempDir::new().unwrap();
        let context = test_context(download_dir.path(), Path::new("/inst"));
        let downloader =
            Downloader::github_with_url("owner/tool", &format!("{}/{{repo}}", server.url()), context)
                .with_token(Some("ghp_secret".to_string()));

        let path = downloader
            .download("tool.tar.gz", Some("tool-{platform}-{arch}.tgz"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(path, download_dir.path().join("tool-linux-amd64.tgz"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "archive");
    }

    #[tokio::test]
    async fn download_returns_not_found_for_missing_asset() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .create_async()
            .await;

        let download_dir = TempDir::new().unwrap();
        let context = test_context(download_dir.path(), Path::new("/inst"));
        let downloader = Downloader::new(&server.url(), context);

        let result = downloader.download("missing.zip", None).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(DownloadError::NotFound(_))));
        assert!(!download_dir.path().join("downloaded.file").exists());
    }
}
