use std::path::PathBuf;

use crate::error::ConfigError;

// =============================================================================
// asdf environment
// =============================================================================

/// Directory downloads are stored in, e.g. `~/.asdf/downloads/sops/3.9.4`
pub const ASDF_DOWNLOAD_PATH: &str = "ASDF_DOWNLOAD_PATH";

/// Directory the version gets installed to, e.g. `~/.asdf/installs/sops/3.9.4`
pub const ASDF_INSTALL_PATH: &str = "ASDF_INSTALL_PATH";

/// Version to download/install, e.g. `3.9.4`
pub const ASDF_INSTALL_VERSION: &str = "ASDF_INSTALL_VERSION";

/// Either `version` or `ref`
pub const ASDF_INSTALL_TYPE: &str = "ASDF_INSTALL_TYPE";

/// Optional token for api.github.com, lifts the anonymous rate limit
pub const GITHUB_API_TOKEN: &str = "GITHUB_API_TOKEN";

// =============================================================================
// Logging
// =============================================================================

/// Filter directives for the log subscriber, e.g. `asdf_plugin_kit=debug`
pub const LOG_ENV: &str = "ASDF_PLUGIN_LOG";

/// `json` switches log lines to JSON
pub const LOG_FORMAT_ENV: &str = "ASDF_PLUGIN_LOG_FORMAT";

pub const DEFAULT_LOG_FILTER: &str = "asdf_plugin_kit=info";

// =============================================================================
// Defaults
// =============================================================================

/// File name used for a download when no target is given
pub const DEFAULT_LOCAL_FILE: &str = "downloaded.file";

/// Default base URL for GitHub API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default release asset URL, `{filename}` is appended by the downloader
pub const DEFAULT_GITHUB_DOWNLOAD_URL: &str =
    "https://github.com/{repo}/releases/download/v{version}";

/// Releases requested per GitHub API page (the API maximum)
pub const GITHUB_PAGE_SIZE: u32 = 100;

/// Stable `x.y.z` versions with optional `v` prefix; group 1 is the version
pub const DEFAULT_VERSION_FILTER: &str = r"^v?((?:[0-9]+\.){2}[0-9]+)$";

pub const USER_AGENT: &str = concat!("asdf-plugin-kit/", env!("CARGO_PKG_VERSION"));

/// Kind of installation requested by asdf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallType {
    Version,
    Ref,
}

impl std::str::FromStr for InstallType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "version" => Ok(InstallType::Version),
            "ref" => Ok(InstallType::Ref),
            _ => Err(()),
        }
    }
}

/// Settings asdf passes to `bin/download` and `bin/install`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEnv {
    pub download_path: PathBuf,
    pub install_path: PathBuf,
    pub install_version: String,
    pub install_type: InstallType,
}

impl PluginEnv {
    /// Reads the `ASDF_*` variables of the current process.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the settings from any variable source.
    ///
    /// Only `ASDF_INSTALL_TYPE=version` is supported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::MissingVar(key));

        let download_path = PathBuf::from(require(ASDF_DOWNLOAD_PATH)?);
        let install_path = PathBuf::from(require(ASDF_INSTALL_PATH)?);
        let install_version = require(ASDF_INSTALL_VERSION)?;
        let raw_install_type = require(ASDF_INSTALL_TYPE)?;

        match raw_install_type.parse() {
            Ok(InstallType::Version) => Ok(Self {
                download_path,
                install_path,
                install_version,
                install_type: InstallType::Version,
            }),
            _ => Err(ConfigError::UnsupportedInstallType(raw_install_type)),
        }
    }

    /// Directory executables are installed into
    pub fn bin_path(&self) -> PathBuf {
        self.install_path.join("bin")
    }
}

/// Returns the GitHub API token, if one is configured.
pub fn github_token() -> Option<String> {
    github_token_with_env(std::env::var(GITHUB_API_TOKEN).ok())
}

fn github_token_with_env(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}
