//! Built package discovery and installation.
//!
//! The package set is always taken from a fresh scan of the build-output
//! directory and never contains source packages. All base names are erased
//! in one call (tolerating "not installed"), then all package files are
//! installed in one package-manager transaction. Erasing together lets rpm
//! remove subpackages that depend on each other.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use vmprep_core::command::{CommandRunner, Invocation};
use vmprep_core::step::{FailurePolicy, StepExecutor};

use crate::error::ProvisionError;

/// Suffix of binary and source package files.
pub const RPM_SUFFIX: &str = ".rpm";
/// Suffix of source package files.
pub const SOURCE_SUFFIX: &str = ".src.rpm";

/// A binary package produced by the rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPackage {
    /// Path of the package file
    pub path: PathBuf,
    /// Package name without version, release and architecture
    pub name: String,
}

/// Binary packages found in a build-output directory, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    packages: Vec<BuiltPackage>,
}

impl PackageSet {
    /// Recursively scans `dir` for `*.rpm`, skipping `*.src.rpm`.
    pub async fn scan(dir: impl AsRef<Path>) -> Result<Self, ProvisionError> {
        let dir = dir.as_ref();
        let mut found = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current)
                .await
                .map_err(|e| ProvisionError::io(&current, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ProvisionError::io(&current, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| ProvisionError::io(&path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else {
                    found.push(path);
                }
            }
        }

        Self::from_paths(found)
    }

    /// Builds a set from candidate paths: non-rpm files and source packages are dropped.
    pub fn from_paths<I>(paths: I) -> Result<Self, ProvisionError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut packages = Vec::new();
        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(RPM_SUFFIX) {
                continue;
            }
            if file_name.ends_with(SOURCE_SUFFIX) {
                debug!(path = %path.display(), "skipping source package");
                continue;
            }
            let name = package_base_name(file_name)
                .ok_or_else(|| ProvisionError::MalformedPackageName {
                    file: file_name.to_owned(),
                })?
                .to_owned();
            packages.push(BuiltPackage { path, name });
        }
        packages.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { packages })
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuiltPackage> {
        self.packages.iter()
    }

    /// Base names, in set order.
    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    /// Package file paths, in set order.
    pub fn paths(&self) -> Vec<&Path> {
        self.packages.iter().map(|p| p.path.as_path()).collect()
    }
}

/// Name part of an `name-version-release.arch.rpm` file name.
///
/// ```
/// use vmprep_provision::packages::package_base_name;
///
/// assert_eq!(package_base_name("foo-1.2-3.x86_64.rpm"), Some("foo"));
/// assert_eq!(package_base_name("python3-foo-bar-0.1-1.fc40.noarch.rpm"), Some("python3-foo-bar"));
/// assert_eq!(package_base_name("foo.rpm"), None);
/// ```
pub fn package_base_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(RPM_SUFFIX)?;
    let (nvr, arch) = stem.rsplit_once('.')?;
    let (nv, release) = nvr.rsplit_once('-')?;
    let (name, version) = nv.rsplit_once('-')?;
    if [name, version, release, arch].iter().any(|part| part.is_empty()) {
        return None;
    }
    Some(name)
}

/// Erases all base names in one call (failure tolerated), then installs every file at once.
pub async fn reinstall<R: CommandRunner>(
    exec: &mut StepExecutor<R>,
    set: &PackageSet,
) -> Result<(), ProvisionError> {
    info!(count = set.len(), packages = ?set.names(), "installing built packages");

    exec.run(
        "erase",
        Invocation::new("rpm").arg("-e").args(set.names()),
        FailurePolicy::Ignorable,
    )
    .await?;

    exec.run(
        "install",
        Invocation::new("yum")
            .args(["install", "-y"])
            .args(set.paths().iter().map(|p| p.display().to_string())),
        FailurePolicy::Fatal,
    )
    .await?;
    Ok(())
}
