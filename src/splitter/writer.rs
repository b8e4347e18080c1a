//! Slice Writer
//!
//! Emits the `types` directory of one module (or one version of a module):
//!
//! - `input.<ext>` / `output.<ext>` from the captured slices
//! - `enums.<ext>` from the enum source, when there is one
//! - `index.<ext>` re-exporting whatever was written as `enums`, `inputs`
//!   and `outputs`
//!
//! A missing enum source is normal. The enum export is left out of the index
//! and the enum import is not prepended to the slices.
//!
//! When versions stay inline in the module slice, their enum sources go to
//! `types/enums/<version>.<ext>` and `types/enums/index.<ext>` re-exports each
//! one under its version name, next to the module-level enums.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::layout::{OutputLayout, SourceLayout, ENUMS_DIR};
use super::slice::TypeSlice;
use crate::error::{SplitError, SplitResult};

/// Import added to input/output slices when the scope has enums.
pub const ENUM_IMPORT: &str = r#"import * as enums from "./enums";"#;

const ENUM_EXPORT: &str = r#"export * as enums from "./enums";"#;
const INPUT_EXPORT: &str = r#"export * as inputs from "./input";"#;
const OUTPUT_EXPORT: &str = r#"export * as outputs from "./output";"#;

/// Start of the first declaration in a version enum source; everything
/// before it is import preamble.
const ENUM_BODY_START: &str = "export const ";

/// Everything needed to emit one scope's `types` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypesUnit {
    pub inputs: Option<TypeSlice>,
    pub outputs: Option<TypeSlice>,
    pub enums: Option<String>,
    /// Version enum sources kept under the module's enums, by version name.
    pub version_enums: BTreeMap<String, String>,
}

/// What a call to [`write_types`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTypes {
    pub dir: PathBuf,
    pub has_inputs: bool,
    pub has_outputs: bool,
    pub has_enums: bool,
}

/// Write `unit` under `<scope_dir>/types`.
pub fn write_types(scope_dir: &Path, unit: TypesUnit, extension: &str) -> SplitResult<WrittenTypes> {
    let types_dir = OutputLayout::types_dir(scope_dir);
    std::fs::create_dir_all(&types_dir).map_err(|e| SplitError::io(&types_dir, e))?;

    let TypesUnit {
        mut inputs,
        mut outputs,
        enums,
        version_enums,
    } = unit;
    let mut index = Vec::with_capacity(3);

    let has_enums = enums.is_some() || !version_enums.is_empty();
    if !version_enums.is_empty() {
        write_enum_tree(&types_dir, enums.as_deref(), &version_enums, extension)?;
    } else if let Some(content) = &enums {
        write_file(&types_dir.join(format!("enums.{}", extension)), content)?;
    }

    if has_enums {
        index.push(ENUM_EXPORT);
        for slice in [inputs.as_mut(), outputs.as_mut()].into_iter().flatten() {
            slice.prepend(ENUM_IMPORT);
        }
    }

    if let Some(slice) = &inputs {
        write_file(&types_dir.join(format!("input.{}", extension)), &slice.render())?;
        index.push(INPUT_EXPORT);
    }

    if let Some(slice) = &outputs {
        write_file(&types_dir.join(format!("output.{}", extension)), &slice.render())?;
        index.push(OUTPUT_EXPORT);
    }

    write_file(&types_dir.join(format!("index.{}", extension)), &index.join("\n"))?;

    debug!(
        dir = %types_dir.display(),
        inputs = inputs.is_some(),
        outputs = outputs.is_some(),
        enums = has_enums,
        version_enums = version_enums.len(),
        "types written"
    );

    Ok(WrittenTypes {
        dir: types_dir,
        has_inputs: inputs.is_some(),
        has_outputs: outputs.is_some(),
        has_enums,
    })
}

/// `types/enums/index.<ext>` holding the module enums plus one namespace
/// re-export per version, and `types/enums/<version>.<ext>` per version.
fn write_enum_tree(
    types_dir: &Path,
    module_enums: Option<&str>,
    version_enums: &BTreeMap<String, String>,
    extension: &str,
) -> SplitResult<()> {
    let enums_dir = types_dir.join(ENUMS_DIR);
    std::fs::create_dir_all(&enums_dir).map_err(|e| SplitError::io(&enums_dir, e))?;

    let mut index = module_enums.unwrap_or_default().to_string();
    for (version, content) in version_enums {
        write_file(&enums_dir.join(format!("{}.{}", version, extension)), content)?;

        // Generated module enums usually import their versions already.
        if index.contains(&format!("from \"./{}\"", version)) {
            continue;
        }
        if !index.is_empty() && !index.ends_with('\n') {
            index.push('\n');
        }
        index.push_str(&format!(
            "import * as {v} from \"./{v}\";\nexport {{ {v} }};\n",
            v = version
        ));
    }

    write_file(&enums_dir.join(format!("index.{}", extension)), &index)
}

/// Module-level enum source, copied verbatim. `None` when there is none.
pub fn load_module_enums(source: &SourceLayout, module: &str) -> SplitResult<Option<String>> {
    read_optional(&source.module_enums(module))
}

/// Version-level enum source with its import preamble trimmed.
pub fn load_version_enums(
    source: &SourceLayout,
    module: &str,
    version: &str,
) -> SplitResult<Option<String>> {
    Ok(read_optional(&source.version_enums(module, version))?.map(|content| trim_enum_preamble(&content)))
}

/// Drop everything before the first `export const`.
pub fn trim_enum_preamble(content: &str) -> String {
    match content.find(ENUM_BODY_START) {
        Some(start) => content[start..].to_string(),
        None => content.to_string(),
    }
}

/// Trimmed enum sources of every version directory under the module's enum
/// directory. Empty when the module has none.
pub fn load_version_enum_sources(
    source: &SourceLayout,
    module: &str,
) -> SplitResult<BTreeMap<String, String>> {
    let dir = source.enums_dir().join(module);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(SplitError::io(&dir, e)),
    };

    let mut sources = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| SplitError::io(&dir, e))?;
        if !entry.file_type().map_err(|e| SplitError::io(entry.path(), e))?.is_dir() {
            continue;
        }
        let version = entry.file_name().to_string_lossy().into_owned();
        if let Some(content) = load_version_enums(source, module, &version)? {
            sources.insert(version, content);
        }
    }
    Ok(sources)
}

fn read_optional(path: &Path) -> SplitResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SplitError::io(path, e)),
    }
}

pub(crate) fn write_file(path: &Path, content: &str) -> SplitResult<()> {
    std::fs::write(path, content).map_err(|e| SplitError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn slice(lines: &[&str]) -> TypeSlice {
        let mut slice = TypeSlice::seeded(lines[0]);
        for line in &lines[1..] {
            slice.push(line.to_string());
        }
        slice
    }

    #[test]
    fn test_write_with_enums() {
        let dir = tempdir().unwrap();
        let unit = TypesUnit {
            inputs: Some(slice(&["header", "export interface A {}"])),
            outputs: Some(slice(&["header", "export interface B {}"])),
            enums: Some("export const Kind = {};".to_string()),
            ..TypesUnit::default()
        };

        let written = write_types(dir.path(), unit, "ts").unwrap();
        assert!(written.has_enums);

        let types = dir.path().join("types");
        assert_eq!(
            fs::read_to_string(types.join("index.ts")).unwrap(),
            "export * as enums from \"./enums\";\nexport * as inputs from \"./input\";\nexport * as outputs from \"./output\";"
        );
        assert_eq!(
            fs::read_to_string(types.join("input.ts")).unwrap(),
            "import * as enums from \"./enums\";\nheader\nexport interface A {}"
        );
        assert!(fs::read_to_string(types.join("output.ts"))
            .unwrap()
            .starts_with(ENUM_IMPORT));
        assert_eq!(
            fs::read_to_string(types.join("enums.ts")).unwrap(),
            "export const Kind = {};"
        );
    }

    #[test]
    fn test_write_without_enums_omits_export_and_import() {
        let dir = tempdir().unwrap();
        let unit = TypesUnit {
            inputs: Some(slice(&["header", "x"])),
            ..TypesUnit::default()
        };

        let written = write_types(dir.path(), unit, "ts").unwrap();
        assert!(!written.has_enums && !written.has_outputs);

        let types = dir.path().join("types");
        assert_eq!(
            fs::read_to_string(types.join("index.ts")).unwrap(),
            "export * as inputs from \"./input\";"
        );
        assert_eq!(fs::read_to_string(types.join("input.ts")).unwrap(), "header\nx");
        assert!(!types.join("enums.ts").exists());
        assert!(!types.join("output.ts").exists());
    }

    #[test]
    fn test_enum_only_module() {
        let dir = tempdir().unwrap();
        let unit = TypesUnit {
            enums: Some("export const E = {};".to_string()),
            ..TypesUnit::default()
        };
        write_types(dir.path(), unit, "ts").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("types/index.ts")).unwrap(),
            "export * as enums from \"./enums\";"
        );
    }

    #[test]
    fn test_inline_version_enums_written_as_tree() {
        let dir = tempdir().unwrap();
        let mut version_enums = BTreeMap::new();
        version_enums.insert("v1".to_string(), "export const Tier = {};".to_string());
        let unit = TypesUnit {
            inputs: Some(slice(&["header", "tier: enums.v1.Tier;"])),
            enums: Some("export const Kind = {};\n".to_string()),
            version_enums,
            ..TypesUnit::default()
        };

        let written = write_types(dir.path(), unit, "ts").unwrap();
        assert!(written.has_enums);

        let types = dir.path().join("types");
        assert!(!types.join("enums.ts").exists());
        assert_eq!(
            fs::read_to_string(types.join("enums/index.ts")).unwrap(),
            "export const Kind = {};\nimport * as v1 from \"./v1\";\nexport { v1 };\n"
        );
        assert_eq!(
            fs::read_to_string(types.join("enums/v1.ts")).unwrap(),
            "export const Tier = {};"
        );
        assert!(fs::read_to_string(types.join("input.ts"))
            .unwrap()
            .starts_with(ENUM_IMPORT));
        assert!(fs::read_to_string(types.join("index.ts"))
            .unwrap()
            .starts_with(ENUM_EXPORT));
    }

    #[test]
    fn test_inline_version_enums_reuse_existing_import() {
        let dir = tempdir().unwrap();
        let mut version_enums = BTreeMap::new();
        version_enums.insert("v1".to_string(), "export const Tier = {};".to_string());
        let module = "import * as v1 from \"./v1\";\nexport { v1 };\n";
        let unit = TypesUnit {
            enums: Some(module.to_string()),
            version_enums,
            ..TypesUnit::default()
        };

        write_types(dir.path(), unit, "ts").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("types/enums/index.ts")).unwrap(),
            module
        );
    }

    #[test]
    fn test_load_version_enum_sources() {
        let dir = tempdir().unwrap();
        let layout = SourceLayout::new(dir.path(), "ts");
        assert!(load_version_enum_sources(&layout, "web").unwrap().is_empty());

        for version in ["v2", "v1"] {
            let path = layout.version_enums("web", version);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("// banner\nexport const {} = {{}};", version)).unwrap();
        }
        fs::create_dir_all(layout.enums_dir().join("web/empty")).unwrap();
        fs::write(layout.module_enums("web"), "export const M = {};").unwrap();

        let sources = load_version_enum_sources(&layout, "web").unwrap();
        assert_eq!(sources.keys().collect::<Vec<_>>(), vec!["v1", "v2"]);
        assert_eq!(sources["v1"], "export const v1 = {};");
    }

    #[test]
    fn test_trim_enum_preamble() {
        let content = "import * as pulumi from \"@pulumi/pulumi\";\n\nexport const Kind = {\n} as const;\n";
        assert_eq!(trim_enum_preamble(content), "export const Kind = {\n} as const;\n");
        assert_eq!(trim_enum_preamble("no consts"), "no consts");
    }

    #[test]
    fn test_missing_enum_source_is_none() {
        let dir = tempdir().unwrap();
        let layout = SourceLayout::new(dir.path(), "ts");
        assert_eq!(load_module_enums(&layout, "storage").unwrap(), None);
        assert_eq!(load_version_enums(&layout, "storage", "v1").unwrap(), None);
    }

    #[test]
    fn test_version_enum_source_trimmed() {
        let dir = tempdir().unwrap();
        let layout = SourceLayout::new(dir.path(), "ts");
        let path = layout.version_enums("web", "v1");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "// banner\nexport const Tier = {};").unwrap();
        assert_eq!(
            load_version_enums(&layout, "web", "v1").unwrap().as_deref(),
            Some("export const Tier = {};")
        );
    }
}
