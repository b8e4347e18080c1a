//! Source Splitting
//!
//! Turns one monolithic generated SDK tree into per-resource-group packages:
//! - `names` - `ModuleName`, `SubmoduleVersion`, stream `Direction`
//! - `rewrite` - ordered, boundary-aware reference rewrite rules
//! - `parser` - namespace stream parser producing a `ModuleIndex`
//! - `slice` - captured type slices and the per-stream index
//! - `writer` - emits a scope's `types` directory
//! - `transform` - rewrites implementation files of one module
//! - `core_package` - assembles the shared core package
//! - `package` - output packages, discovery and the metadata hook
//! - `pipeline` - concurrent build over all of the above

mod core_package;
mod layout;
mod names;
mod package;
mod parser;
mod pipeline;
mod rewrite;
mod slice;
mod transform;
mod writer;

pub use core_package::{assemble_core, strip_submodule_exports};
pub use layout::{OutputLayout, SourceLayout, CORE_PACKAGE, ENUMS_DIR, TYPES_DIR};
pub use names::{Direction, ModuleName, SubmoduleVersion};
pub use package::{
    discover_modules, list_output_packages, OutputPackage, PackageMetadata, SkipMetadata,
    DEFAULT_IGNORED_DIRS,
};
pub use parser::{
    parse_declarations, parse_file, parse_str, NamespaceParser, ParsedStream, ParserOptions,
    DEFAULT_FRAMEWORK_IMPORT,
};
pub use pipeline::{
    create_types, run_build, BuildReport, BuildSession, ModuleFailure, MODULES_PASS, TYPES_PASS,
};
pub use rewrite::{dedent, rewrite_line, RewriteRule, RuleSet, Scope};
pub use slice::{ModuleIndex, ModuleTypes, TypeSlice};
pub use transform::{transform_source, FileContext, ImportSet, ModuleTransformer, TransformedModule};
pub use writer::{
    load_module_enums, load_version_enum_sources, load_version_enums, trim_enum_preamble,
    write_types, TypesUnit, WrittenTypes,
};
