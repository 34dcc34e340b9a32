//! Shared fixtures for plugin integration tests

use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use tempfile::TempDir;

use asdf_plugin_kit::config::{InstallType, PluginEnv};
use asdf_plugin_kit::context::InstallContext;
use asdf_plugin_kit::error::RegistryError;
use asdf_plugin_kit::lister::Lister;

/// Lister returning fixed tags, filtered like a real source
pub struct StaticLister {
    tags: Vec<String>,
}

impl StaticLister {
    pub fn new(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Lister for StaticLister {
    async fn fetch_versions(&self, filter: &Regex) -> Result<Vec<String>, RegistryError> {
        Ok(self
            .tags
            .iter()
            .filter_map(|tag| filter.captures(tag))
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
            .collect())
    }
}

/// Download and install directories of one plugin run
pub struct PluginDirs {
    pub download: TempDir,
    pub install: TempDir,
}

impl PluginDirs {
    pub fn new() -> Self {
        Self {
            download: TempDir::new().unwrap(),
            install: TempDir::new().unwrap(),
        }
    }

    /// Context for installing `version` on a linux/amd64 host
    pub fn context(&self, version: &str) -> InstallContext {
        InstallContext::new(PluginEnv {
            download_path: self.download.path().to_path_buf(),
            install_path: self.install.path().to_path_buf(),
            install_version: version.to_string(),
            install_type: InstallType::Version,
        })
        .with_host("Linux", "x86_64")
    }

    pub fn bin(&self, name: &str) -> std::path::PathBuf {
        self.install.path().join("bin").join(name)
    }
}

/// A gzip compressed tarball holding `entries` as `(path, content)`
pub fn tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_ustar();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, Path::new(name), data.as_bytes())
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}
