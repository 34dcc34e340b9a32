//! Archive detection and extraction (gzip, zip, tar)

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::InstallError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8; 5] = b"ustar";

fn read_prefix(path: &Path, len: usize) -> Result<Vec<u8>, InstallError> {
    let mut buf = Vec::with_capacity(len);
    File::open(path)?.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Returns true if the file starts with the gzip magic bytes
pub fn is_gzip_file(path: &Path) -> Result<bool, InstallError> {
    Ok(read_prefix(path, GZIP_MAGIC.len())? == GZIP_MAGIC)
}

/// Returns true if the file has a readable zip central directory
pub fn is_zip_file(path: &Path) -> Result<bool, InstallError> {
    let file = BufReader::new(File::open(path)?);
    Ok(zip::ZipArchive::new(file).is_ok())
}

/// Returns true if the file has a POSIX (ustar) tar header
pub fn is_tar_file(path: &Path) -> Result<bool, InstallError> {
    let header = read_prefix(path, TAR_MAGIC_OFFSET + TAR_MAGIC.len())?;
    Ok(header.get(TAR_MAGIC_OFFSET..) == Some(&TAR_MAGIC[..]))
}

/// Decompress a gzip file to `target_path`
pub fn gunzip(source_path: &Path, target_path: &Path) -> Result<(), InstallError> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(source_path)?));
    let mut target = File::create(target_path)?;
    std::io::copy(&mut decoder, &mut target)?;
    Ok(())
}

/// Extract a zip archive into `dest_dir`, keeping unix modes
pub fn unzip(archive_path: &Path, dest_dir: &Path) -> Result<(), InstallError> {
    let file = BufReader::new(File::open(archive_path)?);
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| InstallError::Archive(format!("Failed to open zip: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::Archive(format!("Failed to read zip entry: {}", e)))?;

        // Rejects absolute paths and `..` components
        let Some(relative_path) = entry.enclosed_name() else {
            return Err(InstallError::Archive(format!(
                "Path traversal detected in archive: {}",
                entry.name()
            )));
        };
        let outpath = dest_dir.join(relative_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        std::io::copy(&mut entry, &mut outfile)?;
        debug!("extracted {}", outpath.display());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

/// Extract a tarball into `dest_dir`.
///
/// Gzip compressed tarballs are expected to be decompressed already.
pub fn untar(archive_path: &Path, dest_dir: &Path) -> Result<(), InstallError> {
    let file = BufReader::new(File::open(archive_path)?);
    let mut archive = tar::Archive::new(file);
    archive.set_preserve_permissions(true);
    archive
        .unpack(dest_dir)
        .map_err(|e| InstallError::Archive(format!("Failed to extract tar: {}", e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    pub(crate) fn tar_bytes(entries: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data, mode) in entries {
            let mut header = tar::Header::new_ustar();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    pub(crate) fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn detects_archive_types() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain");
        let gz = dir.path().join("file.gz");
        let zip = dir.path().join("file.zip");
        let tar = dir.path().join("file.tar");
        std::fs::write(&plain, b"#!/bin/sh\necho hi\n").unwrap();
        std::fs::write(&gz, gzip_bytes(b"payload")).unwrap();
        std::fs::write(&zip, zip_bytes(&[("tool", "binary")])).unwrap();
        std::fs::write(&tar, tar_bytes(&[("tool", "binary", 0o755)])).unwrap();

        assert!(!is_gzip_file(&plain).unwrap());
        assert!(!is_zip_file(&plain).unwrap());
        assert!(!is_tar_file(&plain).unwrap());

        assert!(is_gzip_file(&gz).unwrap());
        assert!(is_zip_file(&zip).unwrap());
        assert!(!is_tar_file(&zip).unwrap());
        assert!(is_tar_file(&tar).unwrap());
        assert!(!is_zip_file(&tar).unwrap());
    }

    #[test]
    fn is_gzip_file_handles_empty_file() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        std::fs::write(&empty, b"").unwrap();

        assert!(!is_gzip_file(&empty).unwrap());
        assert!(!is_tar_file(&empty).unwrap());
    }

    #[test]
    fn gunzip_restores_payload() {
        let dir = TempDir::new().unwrap();
        let gz = dir.path().join("file.gz");
        let out = dir.path().join("file.gz.unzipped");
        std::fs::write(&gz, gzip_bytes(b"payload")).unwrap();

        gunzip(&gz, &out).unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"payload");
    }

    #[test]
    fn unzip_extracts_nested_entries() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("file.zip");
        std::fs::write(
            &archive,
            zip_bytes(&[("tool-1.0/bin/tool", "binary"), ("tool-1.0/README", "docs")]),
        )
        .unwrap();

        unzip(&archive, dir.path()).unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("tool-1.0/bin/tool")).unwrap(),
            b"binary"
        );
        assert_eq!(
            std::fs::read(dir.path().join("tool-1.0/README")).unwrap(),
            b"docs"
        );
    }

    #[test]
    fn untar_extracts_entries() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("file.tar");
        std::fs::write(
            &archive,
            tar_bytes(&[("linux-amd64/helm", "binary", 0o755)]),
        )
        .unwrap();

        untar(&archive, dir.path()).unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("linux-amd64/helm")).unwrap(),
            b"binary"
        );
    }
}
