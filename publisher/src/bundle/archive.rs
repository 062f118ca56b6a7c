//! Archive packaging
//!
//! Builds the zip bundle that becomes the uploaded revision: applies the
//! per-group manifest convention, filters the source tree through the
//! include/exclude globs and writes the archive into a scoped staging
//! directory that is removed when the [`BundleArchive`] is dropped, whatever
//! happens upstream.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::PublishError;
use crate::utils::sha256_file;

/// Canonical manifest file name the deployment service reads
const MANIFEST_FILE: &str = "appspec.yml";

/// What to package
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    /// Directory whose contents become the bundle
    pub source_dir: PathBuf,

    /// Project name used in the archive file name
    pub project_name: String,

    /// Comma-separated include globs; empty means everything
    pub includes: String,

    /// Comma-separated exclude globs
    pub excludes: String,

    /// Pick appspec.<group>.yml over the plain manifest
    pub deployment_group_appspec: bool,

    /// Deployment group the manifest convention keys on
    pub deployment_group_name: String,

    /// File inside the source directory naming the build version
    pub version_file_name: String,
}

/// A packaged bundle, alive until dropped
///
/// The archive lives in its own staging directory; dropping this value
/// removes the directory and the archive with it.
pub struct BundleArchive {
    _staging: tempfile::TempDir,
    path: PathBuf,
    sha256: String,
}

impl BundleArchive {
    /// Path of the archive file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the archive
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// SHA256 digest of the archive contents
    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

/// Package the source directory into a zip bundle
pub async fn build_archive(request: ArchiveRequest) -> Result<BundleArchive, PublishError> {
    tokio::task::spawn_blocking(move || build_archive_sync(&request))
        .await
        .map_err(|e| PublishError::PackagingError(e.to_string()))?
}

fn build_archive_sync(request: &ArchiveRequest) -> Result<BundleArchive, PublishError> {
    if request.deployment_group_appspec {
        apply_group_manifest(&request.source_dir, &request.deployment_group_name)?;
    }

    let archive_name = archive_file_name(request);
    let includes = build_glob_set(&request.includes, "**")?;
    let excludes = build_glob_set(&request.excludes, "")?;

    let staging = tempfile::tempdir()?;
    let archive_path = staging.path().join(&archive_name);
    info!("Zipping files into {}", archive_path.display());

    let file = fs::File::create(&archive_path)?;
    let mut writer = ZipWriter::new(file);
    let mut count: u64 = 0;

    let walk = WalkDir::new(&request.source_dir).sort_by_file_name();
    for entry in walk {
        let entry = entry.map_err(|e| PublishError::PackagingError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&request.source_dir)
            .map_err(|e| PublishError::PackagingError(e.to_string()))?;
        if !includes.is_match(relative) || excludes.is_match(relative) {
            continue;
        }

        let entry_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(true);
        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            let metadata = entry
                .metadata()
                .map_err(|e| PublishError::PackagingError(e.to_string()))?;
            options.unix_permissions(metadata.permissions().mode())
        };

        writer
            .start_file(entry_name, options)
            .map_err(|e| PublishError::PackagingError(e.to_string()))?;
        let mut source = fs::File::open(entry.path())?;
        std::io::copy(&mut source, &mut writer)?;
        count += 1;
    }

    writer
        .finish()
        .map_err(|e| PublishError::PackagingError(e.to_string()))?;
    let sha256 = sha256_file(&archive_path)?;
    info!("Added {} files to {} (sha256 {})", count, archive_name, sha256);

    Ok(BundleArchive {
        _staging: staging,
        path: archive_path,
        sha256,
    })
}

/// Copy appspec.<group>.yml over the canonical manifest
///
/// The per-group manifest must exist when the convention is enabled; its
/// absence fails packaging before any archive file is created.
fn apply_group_manifest(source_dir: &Path, group: &str) -> Result<(), PublishError> {
    let manifest_name = format!("appspec.{}.yml", group);
    let manifest = source_dir.join(&manifest_name);
    if !manifest.is_file() {
        return Err(PublishError::ManifestMissing(manifest_name));
    }

    fs::copy(&manifest, source_dir.join(MANIFEST_FILE))?;
    info!("Using {}", manifest_name);
    Ok(())
}

/// Name the archive after the build version when a version file is readable,
/// falling back to a fresh UUID
fn archive_file_name(request: &ArchiveRequest) -> String {
    if !request.version_file_name.is_empty() {
        let version_file = request.source_dir.join(&request.version_file_name);
        match fs::read_to_string(&version_file) {
            Ok(version) if !version.trim().is_empty() => {
                return format!("{}-{}.zip", request.project_name, version.trim());
            }
            Ok(_) => debug!("Version file {} is empty", version_file.display()),
            Err(e) => debug!("Unable to read version file {}: {}", version_file.display(), e),
        }
    }

    format!("{}-{}.zip", request.project_name, uuid::Uuid::new_v4())
}

/// Parse a comma-separated glob list; `fallback` stands in for an empty list
fn build_glob_set(patterns: &str, fallback: &str) -> Result<GlobSet, PublishError> {
    let mut builder = GlobSetBuilder::new();
    let mut any = false;

    for pattern in patterns.split(',') {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }
        builder.add(
            Glob::new(pattern).map_err(|e| PublishError::PackagingError(e.to_string()))?,
        );
        any = true;
    }

    if !any && !fallback.is_empty() {
        builder.add(
            Glob::new(fallback).map_err(|e| PublishError::PackagingError(e.to_string()))?,
        );
    }

    builder
        .build()
        .map_err(|e| PublishError::PackagingError(e.to_string()))
}
