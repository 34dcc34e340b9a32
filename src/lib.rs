//! Building blocks for asdf plugins
//!
//! - [`version`]: version parsing and Terraform-style constraints
//! - [`parser`]: `required_version` lookup in Terraform configuration
//! - [`lister`]: `list-all` from web pages or GitHub releases
//! - [`downloader`] and [`installer`]: `download` and `install`
//! - [`config`], [`context`], [`platform`]: asdf environment and asset naming

pub mod config;
pub mod context;
pub mod downloader;
pub mod error;
pub mod installer;
pub mod lister;
pub mod logging;
pub mod parser;
pub mod platform;
pub mod version;

pub use config::PluginEnv;
pub use context::InstallContext;
pub use downloader::Downloader;
pub use installer::{FileSource, Installer};
pub use lister::{GenericLister, GitHubLister, ListOptions, Lister, list_all};
pub use version::{SemanticVersion, VersionConstraint, VersionError};
