//! Core package assembly.
//!
//! The core package carries the provider, the shared utilities and the root
//! index with the sub-module re-exports cut out, since those now live in
//! their own packages.

use std::borrow::Cow;

use tracing::info;

use super::layout::{OutputLayout, SourceLayout};
use super::package::OutputPackage;
use super::writer::write_file;
use crate::error::{SplitError, SplitResult};

/// Start of the sub-module re-export block in the root index.
pub const SUBMODULE_EXPORTS_MARKER: &str = "// Export sub-modules";

/// First statement after the re-export block.
pub const REGISTER_PACKAGE_MARKER: &str = "pulumi.runtime.registerResourcePackage";

const COPIED_VERBATIM: &[&str] = &["utilities", "provider"];

/// Remove everything from the sub-module marker up to the registration call.
/// Unchanged unless both markers are present and in order.
pub fn strip_submodule_exports(index: &str) -> Cow<'_, str> {
    let Some(start) = index.find(SUBMODULE_EXPORTS_MARKER) else {
        return Cow::Borrowed(index);
    };
    match index[start..].find(REGISTER_PACKAGE_MARKER) {
        Some(len) => Cow::Owned(format!("{}{}", &index[..start], &index[start + len..])),
        None => Cow::Borrowed(index),
    }
}

/// Write `core/` from the source root.
pub fn assemble_core(source: &SourceLayout, output: &OutputLayout) -> SplitResult<OutputPackage> {
    let package = OutputPackage::core(output);
    let core_dir = package.path();
    std::fs::create_dir_all(core_dir).map_err(|e| SplitError::io(core_dir, e))?;

    let index_path = source.root_file("index");
    let index = std::fs::read_to_string(&index_path).map_err(|e| SplitError::io(&index_path, e))?;
    write_file(
        &core_dir.join(source.file_name("index")),
        &strip_submodule_exports(&index),
    )?;

    for stem in COPIED_VERBATIM {
        let from = source.root_file(stem);
        let to = core_dir.join(source.file_name(stem));
        std::fs::copy(&from, &to).map_err(|e| SplitError::io(&from, e))?;
    }

    info!(dir = %core_dir.display(), "core package assembled");
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const INDEX: &str = r#"import * as pulumi from "@pulumi/pulumi";
export * from "./provider";

// Export sub-modules:
import * as storage from "./storage";
export { storage };

pulumi.runtime.registerResourcePackage("azure-native", {});
"#;

    #[test]
    fn test_strip_removes_block_between_markers() {
        let stripped = strip_submodule_exports(INDEX);
        assert!(!stripped.contains("./storage"));
        assert!(!stripped.contains(SUBMODULE_EXPORTS_MARKER));
        assert!(stripped.contains("export * from \"./provider\";\n\npulumi.runtime.registerResourcePackage"));
    }

    #[test]
    fn test_strip_without_markers_is_identity() {
        let text = "export * from \"./provider\";\n";
        assert!(matches!(strip_submodule_exports(text), Cow::Borrowed(_)));
        let only_start = "// Export sub-modules:\nimport * as a from \"./a\";\n";
        assert_eq!(strip_submodule_exports(only_start), only_start);
    }

    #[test]
    fn test_assemble_core_writes_three_files() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(src.path().join("index.ts"), INDEX).unwrap();
        fs::write(src.path().join("utilities.ts"), "export function a() {}\n").unwrap();
        fs::write(src.path().join("provider.ts"), "export class Provider {}\n").unwrap();

        let package = assemble_core(
            &SourceLayout::new(src.path(), "ts"),
            &OutputLayout::new(out.path()),
        )
        .unwrap();
        assert_eq!(package.name(), "core");

        let core = out.path().join("core");
        assert!(!fs::read_to_string(core.join("index.ts")).unwrap().contains("./storage"));
        assert_eq!(
            fs::read_to_string(core.join("utilities.ts")).unwrap(),
            "export function a() {}\n"
        );
        assert!(core.join("provider.ts").exists());
    }

    #[test]
    fn test_assemble_core_missing_provider_fails() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(src.path().join("index.ts"), INDEX).unwrap();
        fs::write(src.path().join("utilities.ts"), "").unwrap();

        let err = assemble_core(
            &SourceLayout::new(src.path(), "ts"),
            &OutputLayout::new(out.path()),
        )
        .unwrap_err();
        assert!(matches!(err, SplitError::Io { ref path, .. } if path.ends_with("provider.ts")));
    }
}
