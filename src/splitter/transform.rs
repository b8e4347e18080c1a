//! Module File Transformer
//!
//! Rewrites the implementation files of one resource group so they compile
//! inside their own package:
//!
//! 1. foreign `import * as x from "...";` statements are dropped (anything
//!    reaching up with `../`, and the framework import which is re-added)
//! 2. generator banners (`// *** ... ***`) are dropped
//! 3. self-qualified references become `types.inputs.` / `types.outputs.` /
//!    `types.enums.`
//! 4. in the entry file, the re-export of the old nested enum path points at
//!    the local `types/enums`
//! 5. the framework and core-utilities imports are prepended, plus the local
//!    `types` import when step 3 left any `types.` reference behind
//!
//! Version subdirectories (one level) are walked with the version threaded
//! through as the rewrite scope.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::layout::{OutputLayout, SourceLayout, CORE_PACKAGE};
use super::rewrite::{RuleSet, Scope, ENUMS_ALIAS, TYPES_ALIAS};
use super::writer::write_file;
use crate::error::{SplitError, SplitResult};

static IMPORT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import \* as ([A-Za-z_$][\w$]*) from "([^"]+)";\s*$"#).unwrap()
});

static BANNER_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^// \*\*\* .* \*\*\*\s*$").unwrap());

static ENUM_REEXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^export \* from "(?:\.\./)+types/enums/([\w$]+)(?:/([\w$]+))?";\s*$"#).unwrap()
});

/// Stem of the entry file of a package or version directory.
const ENTRY_STEM: &str = "index";

/// Canonical imports prepended to every implementation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSet {
    framework_import: String,
    framework_path: Option<String>,
    core_import: String,
}

impl ImportSet {
    /// `package_prefix` is the published name prefix of the split packages;
    /// the core package is `<prefix>core`.
    pub fn new(framework_import: &str, package_prefix: &str) -> Self {
        let framework_path = IMPORT_STATEMENT
            .captures(framework_import)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str().to_string());
        Self {
            framework_import: framework_import.to_string(),
            framework_path,
            core_import: format!(
                r#"import * as utilities from "{}{}/utilities";"#,
                package_prefix, CORE_PACKAGE
            ),
        }
    }

    pub fn core_import(&self) -> &str {
        &self.core_import
    }

    fn is_foreign(&self, path: &str) -> bool {
        path.starts_with("../") || self.framework_path.as_deref() == Some(path)
    }
}

/// Where a file sits and what it may reference.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    pub scope: Scope<'a>,
    /// Whether this is the `index` file of its directory.
    pub entry: bool,
    /// Relative import path of the `types` module this file should use.
    pub types_path: &'a str,
    /// Version directory holding the file. Differs from the scope's
    /// submodule when versions stay inline in the module's types.
    pub version: Option<&'a str>,
}

/// Run steps 1-5 over one file's content.
pub fn transform_source(content: &str, ctx: &FileContext<'_>, imports: &ImportSet) -> String {
    let rules = RuleSet::for_implementation(ctx.scope);

    let mut body: Vec<String> = Vec::new();
    for line in content.lines() {
        if let Some(caps) = IMPORT_STATEMENT.captures(line) {
            if imports.is_foreign(&caps[2]) {
                trace!(line, "dropped foreign import");
                continue;
            }
        }
        if BANNER_COMMENT.is_match(line) {
            continue;
        }

        let rewritten = rules.apply(line);
        let rewritten = if ctx.entry {
            relocate_enum_reexport(&rewritten, ctx)
        } else {
            rewritten
        };
        body.push(rewritten);
    }

    let mut text = body.join("\n");
    if content.ends_with('\n') {
        text.push('\n');
    }

    let mut header = vec![imports.framework_import.clone(), imports.core_import.clone()];
    if uses_local_types(&text) {
        header.push(format!(
            r#"import * as {} from "{}";"#,
            TYPES_ALIAS, ctx.types_path
        ));
    }

    let mut out = header.join("\n");
    out.push('\n');
    out.push_str(&text);
    out
}

fn uses_local_types(text: &str) -> bool {
    ["inputs", "outputs", ENUMS_ALIAS]
        .iter()
        .any(|alias| text.contains(&format!("{}.{}.", TYPES_ALIAS, alias)))
}

fn relocate_enum_reexport(line: &str, ctx: &FileContext<'_>) -> String {
    let Some(caps) = ENUM_REEXPORT.captures(line) else {
        return line.to_string();
    };
    let reexported = caps.get(2).map(|m| m.as_str());
    if &caps[1] != ctx.scope.module || reexported != ctx.version {
        return line.to_string();
    }
    match (reexported, ctx.scope.submodule) {
        // Inline versions: the version's enums sit under the module's enums.
        (Some(version), None) => format!(
            r#"export * from "{}/{}/{}";"#,
            ctx.types_path, ENUMS_ALIAS, version
        ),
        _ => format!(r#"export * from "{}/{}";"#, ctx.types_path, ENUMS_ALIAS),
    }
}

/// Summary of one transformed module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformedModule {
    pub files: usize,
    pub versions: Vec<String>,
}

/// Walks a module's source directory and writes the rewritten files.
pub struct ModuleTransformer<'a> {
    source: &'a SourceLayout,
    output: &'a OutputLayout,
    imports: &'a ImportSet,
    split_versions: bool,
}

impl<'a> ModuleTransformer<'a> {
    pub fn new(
        source: &'a SourceLayout,
        output: &'a OutputLayout,
        imports: &'a ImportSet,
        split_versions: bool,
    ) -> Self {
        Self {
            source,
            output,
            imports,
            split_versions,
        }
    }

    /// Transform every file of `module` into the output tree.
    pub fn transform_module(&self, module: &str) -> SplitResult<TransformedModule> {
        let source_dir = self.source.module_dir(module);
        let output_dir = self.output.module_dir(module);
        create_dir(&output_dir)?;

        let mut summary = TransformedModule::default();
        for entry in sorted_entries(&source_dir)? {
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| SplitError::io(&path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_file() {
                let ctx = FileContext {
                    scope: Scope::module(module),
                    entry: self.is_entry(&name),
                    types_path: "./types",
                    version: None,
                };
                self.transform_file(&path, &output_dir.join(&name), &ctx)?;
                summary.files += 1;
            } else if file_type.is_dir() {
                summary.files += self.transform_version(module, &name)?;
                summary.versions.push(name);
            } else {
                return Err(SplitError::UnknownEntry { path });
            }
        }

        debug!(module, files = summary.files, versions = summary.versions.len(), "module transformed");
        Ok(summary)
    }

    fn transform_version(&self, module: &str, version: &str) -> SplitResult<usize> {
        let source_dir = self.source.module_dir(module).join(version);
        let output_dir = self.output.version_dir(module, version);
        create_dir(&output_dir)?;

        // Without split versions the version's types live in the parent's
        // `types`, still nested under the version namespace.
        let (scope, types_path) = if self.split_versions {
            (Scope::submodule(module, version), "./types")
        } else {
            (Scope::module(module), "../types")
        };

        let mut files = 0;
        for entry in sorted_entries(&source_dir)? {
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| SplitError::io(&path, e))?;
            if !file_type.is_file() {
                return Err(SplitError::UnknownEntry { path });
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let ctx = FileContext {
                scope,
                entry: self.is_entry(&name),
                types_path,
                version: Some(version),
            };
            self.transform_file(&path, &output_dir.join(&name), &ctx)?;
            files += 1;
        }
        Ok(files)
    }

    fn transform_file(&self, from: &Path, to: &Path, ctx: &FileContext<'_>) -> SplitResult<()> {
        let content = std::fs::read_to_string(from).map_err(|e| SplitError::io(from, e))?;
        let transformed = transform_source(&content, ctx, self.imports);
        write_file(to, &transformed)
    }

    fn is_entry(&self, file_name: &str) -> bool {
        file_name == self.source.file_name(ENTRY_STEM)
    }
}

fn create_dir(dir: &Path) -> SplitResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| SplitError::io(dir, e))
}

fn sorted_entries(dir: &Path) -> SplitResult<Vec<std::fs::DirEntry>> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| SplitError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SplitError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}
