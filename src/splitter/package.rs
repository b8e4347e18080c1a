//! Output packages and module discovery.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{debug, trace};

use super::layout::{OutputLayout, CORE_PACKAGE};
use super::names::ModuleName;
use crate::error::{SplitError, SplitResult};

/// Directories under the source root that are never resource groups.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &["scripts", "types"];

/// A package root in the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPackage {
    name: String,
    path: PathBuf,
    depends_on_core: bool,
}

impl OutputPackage {
    pub fn core(output: &OutputLayout) -> Self {
        Self {
            name: CORE_PACKAGE.to_string(),
            path: output.core_dir(),
            depends_on_core: false,
        }
    }

    pub fn module(output: &OutputLayout, module: &str) -> Self {
        Self {
            name: module.to_string(),
            path: output.module_dir(module),
            depends_on_core: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn depends_on_core(&self) -> bool {
        self.depends_on_core
    }
}

/// Writes whatever metadata a package root needs (manifest, readme, ...).
///
/// Called once per emitted package root, after its files are in place.
pub trait PackageMetadata: Send + Sync {
    fn write(&self, package: &OutputPackage) -> SplitResult<()>;
}

/// Writes no metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipMetadata;

impl PackageMetadata for SkipMetadata {
    fn write(&self, package: &OutputPackage) -> SplitResult<()> {
        trace!(package = package.name(), "metadata skipped");
        Ok(())
    }
}

/// Resource groups under `source_root`: every directory not in `ignored`,
/// sorted by name.
pub fn discover_modules(source_root: &Path, ignored: &[String]) -> SplitResult<Vec<ModuleName>> {
    let entries = std::fs::read_dir(source_root).map_err(|e| SplitError::io(source_root, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SplitError::io(source_root, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| SplitError::io(entry.path(), e))?
            .is_dir();
        if !is_dir {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if ignored.iter().any(|skip| *skip == name) {
            continue;
        }
        names.push(name);
    }

    let modules = names.into_iter().sorted().map(ModuleName::new).collect_vec();
    debug!(root = %source_root.display(), count = modules.len(), "modules discovered");
    Ok(modules)
}

/// `core` followed by one package per discovered module.
pub fn list_output_packages(
    source_root: &Path,
    output: &OutputLayout,
    ignored: &[String],
) -> SplitResult<Vec<OutputPackage>> {
    let modules = discover_modules(source_root, ignored)?;
    Ok(std::iter::once(OutputPackage::core(output))
        .chain(
            modules
                .iter()
                .map(|module| OutputPackage::module(output, module.as_str())),
        )
        .collect())
}
