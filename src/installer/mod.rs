//! asdf's `install` step: unpack the download and install executables
//!
//! The downloaded file is decompressed when it is gzip, extracted into the
//! download directory when it is a zip or tar archive, and the requested
//! files are then moved into `<install_path>/bin` with executable bits set.

pub mod archive;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::context::InstallContext;
use crate::error::InstallError;

/// Where an installed executable comes from inside the download directory
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file named like the target if one was downloaded or extracted,
    /// the downloaded source file otherwise
    Default,
    /// A relative path, templated like the target (e.g.
    /// `"{platform}-{arch}/helm"`)
    Path(String),
    /// Every file whose relative path matches; the target is used as the
    /// replacement, so `$1` or `${name}` refer to capture groups
    Pattern(Regex),
}

impl FileSource {
    pub fn path(path: &str) -> Self {
        FileSource::Path(path.to_string())
    }
}

pub struct Installer {
    context: InstallContext,
}

impl Installer {
    pub fn new(context: InstallContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &InstallContext {
        &self.context
    }

    /// Implements asdf's `install`.
    ///
    /// # Arguments
    /// * `files` - target name in `bin/` mapped to its source; targets are
    ///   templated unless the source is a [`FileSource::Pattern`]
    /// * `source` - the downloaded file, defaults to the context's default
    ///   local file; templated
    ///
    /// # Returns
    /// * `Ok(Vec<PathBuf>)` - Installed executables, in install order
    /// * `Err(InstallError)` - If the source is missing or a step fails
    pub fn install(
        &self,
        files: &IndexMap<String, FileSource>,
        source: Option<&str>,
    ) -> Result<Vec<PathBuf>, InstallError> {
        let download_path = self.context.download_path();
        let source = source
            .filter(|s| !s.is_empty())
            .unwrap_or(self.context.default_local_file());
        let mut source = self.context.template(source, &[])?;

        let source_path = download_path.join(&source);
        if !source_path.is_file() {
            return Err(InstallError::SourceMissing(source_path));
        }

        if archive::is_gzip_file(&source_path)? {
            let unzipped = format!("{}.unzipped", source);
            info!(
                "unzipping {} to {}",
                source_path.display(),
                download_path.join(&unzipped).display()
            );
            archive::gunzip(&source_path, &download_path.join(&unzipped))?;
            source = unzipped;
        }

        let source_path = download_path.join(&source);
        if archive::is_zip_file(&source_path)? {
            info!("unzipping {} to {}/", source_path.display(), download_path.display());
            archive::unzip(&source_path, download_path)?;
        }
        if archive::is_tar_file(&source_path)? {
            info!("untaring {} to {}/", source_path.display(), download_path.display());
            archive::untar(&source_path, download_path)?;
        }

        self.install_files(files, &source)
    }

    /// Install every entry of `files`; `source_file` is what
    /// [`FileSource::Default`] falls back to.
    pub fn install_files(
        &self,
        files: &IndexMap<String, FileSource>,
        source_file: &str,
    ) -> Result<Vec<PathBuf>, InstallError> {
        let download_path = self.context.download_path();
        let mut installed = Vec::new();

        for (target, source) in files {
            match source {
                FileSource::Pattern(pattern) => {
                    let downloaded = relative_files(download_path)?;
                    for file in downloaded.iter().filter(|f| pattern.is_match(f)) {
                        let target_name = pattern.replace_all(file, target.as_str());
                        installed.push(self.install_file(file, &target_name)?);
                    }
                }
                FileSource::Path(path) => {
                    let source = self.context.template(path, &[])?;
                    let target = self.context.template(target, &[])?;
                    installed.push(self.install_file(&source, &target)?);
                }
                FileSource::Default => {
                    let source = if download_path.join(target).is_file() {
                        target.as_str()
                    } else {
                        source_file
                    };
                    let source = self.context.template(source, &[])?;
                    let target = self.context.template(target, &[])?;
                    installed.push(self.install_file(&source, &target)?);
                }
            }
        }

        Ok(installed)
    }

    /// Move `source` from the download directory to `bin/target` and make
    /// it executable
    pub fn install_file(&self, source: &str, target: &str) -> Result<PathBuf, InstallError> {
        let source_path = self.context.download_path().join(source);
        let target_path = self.context.env().bin_path().join(target);
        info!(
            "installing {} to {}",
            source_path.display(),
            target_path.display()
        );

        if !source_path.is_file() {
            return Err(InstallError::SourceMissing(source_path));
        }
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Download and install dirs may live on different filesystems
        if let Err(e) = std::fs::rename(&source_path, &target_path) {
            debug!("rename failed ({}), copying instead", e);
            std::fs::copy(&source_path, &target_path)?;
            std::fs::remove_file(&source_path)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&target_path)?.permissions().mode();
            std::fs::set_permissions(&target_path, std::fs::Permissions::from_mode(mode | 0o111))?;
        }

        Ok(target_path)
    }
}

/// All regular files below `root` as `/` separated relative paths, sorted.
///
/// Symlinks are not followed, so a link back into the tree can't repeat
/// entries.
fn relative_files(root: &Path) -> Result<Vec<String>, InstallError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        files.push(parts.join("/"));
    }

    files.sort();
    Ok(files)
}
