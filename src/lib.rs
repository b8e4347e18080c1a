//! sdksplit - SDK Splitting Library
//!
//! Restructures a monolithic generated TypeScript SDK (one namespaced
//! declaration module plus one directory per resource group) into many
//! self-contained packages, one per resource group, each depending on a
//! shared `core` package.
//!
//! # Architecture
//!
//! 1. **Namespace Stream Parser** (`splitter::NamespaceParser`)
//!    - Reads `types/input.ts` and `types/output.ts` line by line
//!    - Recovers module and API-version blocks from a fixed namespace grammar
//!    - Reports unclosed and reopened blocks instead of guessing
//!
//! 2. **Reference Rewriter** (`splitter::RuleSet`)
//!    - `inputs.storage.Foo` becomes `Foo` inside the storage slice
//!    - `inputs.storage.Foo` becomes `types.inputs.Foo` in storage's code
//!    - Longest pattern first, token-boundary aware
//!
//! 3. **Slice Writer** and **Module File Transformer**
//!    - Write `<module>/types/{input,output,enums,index}.ts`
//!    - Rewrite imports and references of implementation files
//!
//! 4. **Build pipeline** (`splitter::BuildSession`)
//!    - Types pass and implementation pass run concurrently on a rayon pool
//!    - Failures are collected per module, never abort the build
//!
//! # Example
//!
//! ```rust
//! use sdksplit::splitter::{parse_str, Direction, ParserOptions};
//!
//! let source = "export namespace storage {\n    a: inputs.storage.Sku;\n}\n";
//! let parsed = parse_str(source, Direction::Inputs, ParserOptions::default());
//!
//! let storage = parsed.index.get("storage").unwrap();
//! assert_eq!(storage.slice.lines()[1], "a: Sku;");
//! ```

pub mod config;
pub mod error;
pub mod splitter;

pub use config::BuildConfig;
pub use error::{ConfigError, IssueKind, ParseIssue, SplitError, SplitResult};
pub use splitter::{run_build, BuildReport, BuildSession, Direction, ModuleName, OutputPackage};

#[cfg(test)]
mod tests {
    use super::*;
    use splitter::*;

    #[test]
    fn test_parse_and_rewrite_end_to_end() {
        let source = r#"import * as inputs from "../types/input";
export namespace storage {
    export interface AccountArgs {
        sku?: pulumi.Input<inputs.storage.Sku>;
        network?: pulumi.Input<inputs.network.SubResource>;
    }
}
"#;
        let parsed = parse_str(source, Direction::Inputs, ParserOptions::default());
        assert!(parsed.is_clean());

        let rendered = parsed.index.get("storage").unwrap().slice.render();
        assert!(rendered.starts_with(DEFAULT_FRAMEWORK_IMPORT));
        assert!(rendered.contains("    sku?: pulumi.Input<Sku>;"));
        assert!(rendered.contains("inputs.network.SubResource"));
        assert!(!rendered.contains("inputs.storage."));
    }

    #[test]
    fn test_structural_issue_converts_to_error() {
        let parsed = parse_str(
            "export namespace storage {\n",
            Direction::Outputs,
            ParserOptions::default(),
        );
        let issue = parsed.issues.into_iter().next().unwrap();
        let err: SplitError = issue.into();
        assert!(err.to_string().contains("storage"));
    }

    #[test]
    fn test_default_config_matches_parser_defaults() {
        let config = BuildConfig::default();
        let options = config.parser_options();
        assert_eq!(options.header, ParserOptions::default().header);
        assert!(options.split_versions);
    }
}
