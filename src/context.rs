//! Shared settings for the download and install steps

use std::path::Path;

use crate::config::{DEFAULT_LOCAL_FILE, PluginEnv};
use crate::error::{ConfigError, TemplateError};
use crate::platform::{ArchMapping, host_machine, host_system, render_template};

/// asdf settings plus the platform naming of the current host.
///
/// Renders `{platform}`, `{arch}` and `{version}` into file names and URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    env: PluginEnv,
    arch_mapping: ArchMapping,
    system: String,
    machine: String,
    default_local_file: String,
}

impl InstallContext {
    pub fn new(env: PluginEnv) -> Self {
        Self {
            env,
            arch_mapping: ArchMapping::default(),
            system: host_system(),
            machine: host_machine(),
            default_local_file: DEFAULT_LOCAL_FILE.to_string(),
        }
    }

    /// Context for the current process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(PluginEnv::from_env()?))
    }

    pub fn with_arch_mapping(mut self, arch_mapping: ArchMapping) -> Self {
        self.arch_mapping = arch_mapping;
        self
    }

    /// Pretend to run on another host, e.g. `("Darwin", "arm64")`
    pub fn with_host(mut self, system: &str, machine: &str) -> Self {
        self.system = system.to_string();
        self.machine = machine.to_string();
        self
    }

    pub fn with_default_local_file(mut self, file: &str) -> Self {
        self.default_local_file = file.to_string();
        self
    }

    pub fn env(&self) -> &PluginEnv {
        &self.env
    }

    pub fn default_local_file(&self) -> &str {
        &self.default_local_file
    }

    pub fn download_path(&self) -> &Path {
        &self.env.download_path
    }

    /// Returns `(platform, arch)` for this host
    pub fn platform(&self) -> (String, String) {
        self.arch_mapping.map(&self.system, &self.machine)
    }

    /// Render a template with platform, arch, version and `extra` values.
    pub fn template(&self, template: &str, extra: &[(&str, &str)]) -> Result<String, TemplateError> {
        let (platform, arch) = self.platform();
        let mut vars = vec![
            ("arch", arch.as_str()),
            ("platform", platform.as_str()),
            ("version", self.env.install_version.as_str()),
        ];
        vars.extend_from_slice(extra);

        render_template(template, &vars)
    }
}
