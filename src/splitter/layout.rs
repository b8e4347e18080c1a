//! Source and Output Tree Layout
//!
//! Where things live in the monolithic source tree and in the split output.
//!
//! Source root:
//! - `types/input.<ext>`, `types/output.<ext>` - declaration streams
//! - `types/enums/<module>[/<version>]/index.<ext>` - enum sources
//! - `<module>/` - implementation files, optionally `<module>/<version>/`
//! - `index.<ext>`, `utilities.<ext>`, `provider.<ext>` - core package sources
//!
//! Output root:
//! - `<module>/` and `<module>/types/`
//! - `<module>/<version>/types/` when versions are split
//! - `core/`

use std::path::{Path, PathBuf};

use super::names::Direction;

/// Directory holding the declaration streams and enum sources.
pub const TYPES_DIR: &str = "types";

/// Directory (under [`TYPES_DIR`]) holding enum sources.
pub const ENUMS_DIR: &str = "enums";

/// Output directory and package name of the shared core package.
pub const CORE_PACKAGE: &str = "core";

/// Paths inside the monolithic source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    root: PathBuf,
    extension: String,
}

impl SourceLayout {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `<stem>.<ext>`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension)
    }

    /// The `types/input.<ext>` or `types/output.<ext>` declaration file.
    pub fn declarations(&self, direction: Direction) -> PathBuf {
        self.root
            .join(TYPES_DIR)
            .join(self.file_name(direction.file_stem()))
    }

    pub fn enums_dir(&self) -> PathBuf {
        self.root.join(TYPES_DIR).join(ENUMS_DIR)
    }

    pub fn module_enums(&self, module: &str) -> PathBuf {
        self.enums_dir().join(module).join(self.file_name("index"))
    }

    pub fn version_enums(&self, module: &str, version: &str) -> PathBuf {
        self.enums_dir()
            .join(module)
            .join(version)
            .join(self.file_name("index"))
    }

    /// Implementation files of a resource group.
    pub fn module_dir(&self, module: &str) -> PathBuf {
        self.root.join(module)
    }

    /// A top-level file such as `index.<ext>` or `utilities.<ext>`.
    pub fn root_file(&self, stem: &str) -> PathBuf {
        self.root.join(self.file_name(stem))
    }
}

/// Paths inside the split output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_dir(&self, module: &str) -> PathBuf {
        self.root.join(module)
    }

    pub fn version_dir(&self, module: &str, version: &str) -> PathBuf {
        self.root.join(module).join(version)
    }

    pub fn core_dir(&self) -> PathBuf {
        self.root.join(CORE_PACKAGE)
    }

    /// The `types` directory below a package (or version) directory.
    pub fn types_dir(scope_dir: &Path) -> PathBuf {
        scope_dir.join(TYPES_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_paths() {
        let layout = SourceLayout::new("/sdk/nodejs", "ts");
        assert_eq!(
            layout.declarations(Direction::Inputs),
            PathBuf::from("/sdk/nodejs/types/input.ts")
        );
        assert_eq!(
            layout.declarations(Direction::Outputs),
            PathBuf::from("/sdk/nodejs/types/output.ts")
        );
        assert_eq!(
            layout.version_enums("web", "v20230101"),
            PathBuf::from("/sdk/nodejs/types/enums/web/v20230101/index.ts")
        );
        assert_eq!(layout.root_file("utilities"), PathBuf::from("/sdk/nodejs/utilities.ts"));
    }

    #[test]
    fn test_output_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.version_dir("web", "v1"), PathBuf::from("/out/web/v1"));
        assert_eq!(
            OutputLayout::types_dir(&layout.module_dir("web")),
            PathBuf::from("/out/web/types")
        );
        assert_eq!(layout.core_dir(), PathBuf::from("/out/core"));
    }
}
