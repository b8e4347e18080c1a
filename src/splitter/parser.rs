//! Namespace Stream Parser
//!
//! Recovers module and version boundaries from a generated declaration file.
//! The file has no structure beyond a fixed shape of namespace lines:
//!
//! ```text
//! export namespace storage {            <- module open (column 0)
//!     export interface AccountArgs {     <- module content
//!     }                                  <- module content (4-space `}`)
//!     export namespace v20230101 {       <- version open (4 spaces, `v` prefix)
//!         export interface BlobArgs {    <- version content
//!         }
//!     }                                  <- version close
//! }                                      <- module close (column 0)
//! ```
//!
//! # State machine
//!
//! ```text
//!            module open                   version open
//! Outside ───────────────> InModule ───────────────────> InSubmodule
//!    ^                        │  ^                           │
//!    └──────── `}` ───────────┘  └────────── `    }` ────────┘
//! ```
//!
//! A `4-space }` seen while no version is open is ordinary module content
//! (it closes an interface body), so it is captured like any other line.
//!
//! Every captured line goes through the reference rewriter for its scope.
//! Each slice starts with the framework import line.
//!
//! # Structural issues
//!
//! The parser never fails; it reports. A block that is still open when the
//! next module opens or the stream ends is reported as unclosed and is not
//! committed. A module (or a version inside one module block) whose key was
//! already committed is reported as reopened, and the second block is
//! discarded instead of being merged into or overwriting the first.

use std::io::BufRead;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace, warn};

use super::names::{Direction, ModuleName, SubmoduleVersion};
use super::rewrite::{rewrite_declaration_line, RuleSet, Scope};
use super::slice::{ModuleIndex, ModuleTypes, TypeSlice};
use crate::error::{IssueKind, ParseIssue, SplitError, SplitResult};

/// Import line every emitted slice starts with, unless configured otherwise.
pub const DEFAULT_FRAMEWORK_IMPORT: &str = r#"import * as pulumi from "@pulumi/pulumi";"#;

/// Closes a module block.
pub const MODULE_CLOSE: &str = "}";

/// Closes a version block.
pub const SUBMODULE_CLOSE: &str = "    }";

static MODULE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^export namespace ([A-Za-z_$][\w$]*) \{\s*$").unwrap());

static SUBMODULE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^    export namespace (v[\w$]*) \{\s*$").unwrap());

/// Parser settings.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// First line of every slice.
    pub header: String,
    /// Split `v*` sub-namespaces into their own slices. When disabled they stay
    /// inline in the module slice.
    pub split_versions: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            header: DEFAULT_FRAMEWORK_IMPORT.to_string(),
            split_versions: true,
        }
    }
}

/// Result of parsing one declaration stream.
#[derive(Debug, Clone)]
pub struct ParsedStream {
    pub index: ModuleIndex,
    pub issues: Vec<ParseIssue>,
}

impl ParsedStream {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Structural issues concerning `module` (any of its versions included).
    pub fn issues_for<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a ParseIssue> {
        self.issues
            .iter()
            .filter(move |issue| issue.module.as_str() == module)
    }
}

struct OpenModule {
    name: ModuleName,
    types: ModuleTypes,
    rules: RuleSet,
}

struct OpenSubmodule {
    version: SubmoduleVersion,
    slice: TypeSlice,
    rules: RuleSet,
}

enum State {
    Outside,
    InModule(OpenModule),
    InSubmodule(OpenModule, OpenSubmodule),
    /// Inside a reopened module block; lines are dropped until `}`.
    SkippingModule,
    /// Inside a reopened version block; lines are dropped until `    }`.
    SkippingSubmodule(OpenModule),
}

/// Line-at-a-time parser for one declaration stream.
pub struct NamespaceParser {
    direction: Direction,
    options: ParserOptions,
    state: State,
    index: ModuleIndex,
    issues: Vec<ParseIssue>,
    line_no: usize,
}

impl NamespaceParser {
    pub fn new(direction: Direction, options: ParserOptions) -> Self {
        Self {
            direction,
            options,
            state: State::Outside,
            index: ModuleIndex::new(direction),
            issues: Vec::new(),
            line_no: 0,
        }
    }

    /// Process the next line of the stream.
    pub fn feed(&mut self, line: &str) {
        self.line_no += 1;
        let state = std::mem::replace(&mut self.state, State::Outside);

        self.state = match state {
            State::Outside => match module_open(line) {
                Some(name) => self.open_module(name),
                None => State::Outside,
            },

            State::SkippingModule => {
                if line == MODULE_CLOSE {
                    State::Outside
                } else if let Some(name) = module_open(line) {
                    self.open_module(name)
                } else {
                    State::SkippingModule
                }
            }

            State::InModule(mut module) => {
                if line == MODULE_CLOSE {
                    self.commit_module(module);
                    State::Outside
                } else if let Some(name) = module_open(line) {
                    self.report(&module.name, None, IssueKind::Unclosed);
                    self.open_module(name)
                } else if let Some(version) = self.submodule_open(line) {
                    self.open_submodule(module, version)
                } else {
                    module
                        .types
                        .slice
                        .push(rewrite_declaration_line(line, &module.rules));
                    State::InModule(module)
                }
            }

            State::InSubmodule(mut module, mut sub) => {
                if line == SUBMODULE_CLOSE {
                    trace!(module = %module.name, version = %sub.version, "version closed");
                    module.types.versions.insert(sub.version, sub.slice);
                    State::InModule(module)
                } else if line == MODULE_CLOSE {
                    self.report(&module.name, Some(&sub.version), IssueKind::Unclosed);
                    self.commit_module(module);
                    State::Outside
                } else if let Some(name) = module_open(line) {
                    self.report(&module.name, Some(&sub.version), IssueKind::Unclosed);
                    self.report(&module.name, None, IssueKind::Unclosed);
                    self.open_module(name)
                } else {
                    sub.slice.push(rewrite_declaration_line(line, &sub.rules));
                    State::InSubmodule(module, sub)
                }
            }

            State::SkippingSubmodule(module) => {
                if line == SUBMODULE_CLOSE {
                    State::InModule(module)
                } else if line == MODULE_CLOSE {
                    self.commit_module(module);
                    State::Outside
                } else if let Some(name) = module_open(line) {
                    self.report(&module.name, None, IssueKind::Unclosed);
                    self.open_module(name)
                } else {
                    State::SkippingSubmodule(module)
                }
            }
        };
    }

    /// End of stream: report anything still open and hand back the index.
    pub fn finish(mut self) -> ParsedStream {
        match std::mem::replace(&mut self.state, State::Outside) {
            State::Outside | State::SkippingModule => {}
            State::InModule(module) | State::SkippingSubmodule(module) => {
                self.report(&module.name, None, IssueKind::Unclosed);
            }
            State::InSubmodule(module, sub) => {
                self.report(&module.name, Some(&sub.version), IssueKind::Unclosed);
                self.report(&module.name, None, IssueKind::Unclosed);
            }
        }

        debug!(
            stream = %self.direction,
            modules = self.index.len(),
            issues = self.issues.len(),
            "declaration stream parsed"
        );

        ParsedStream {
            index: self.index,
            issues: self.issues,
        }
    }

    fn submodule_open<'l>(&self, line: &'l str) -> Option<&'l str> {
        if !self.options.split_versions {
            return None;
        }
        SUBMODULE_OPEN
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    fn open_module(&mut self, name: &str) -> State {
        let name = ModuleName::new(name);
        if self.index.contains(name.as_str()) {
            self.report(&name, None, IssueKind::Reopened { line: self.line_no });
            return State::SkippingModule;
        }

        trace!(module = %name, line = self.line_no, "module opened");
        let rules = RuleSet::for_type_slice(Scope::module(name.as_str()), self.direction);
        State::InModule(OpenModule {
            types: ModuleTypes::new(TypeSlice::seeded(&self.options.header)),
            name,
            rules,
        })
    }

    fn open_submodule(&mut self, module: OpenModule, version: &str) -> State {
        let version = SubmoduleVersion::new(version);
        if module.types.versions.contains_key(&version) {
            self.report(
                &module.name,
                Some(&version),
                IssueKind::Reopened { line: self.line_no },
            );
            return State::SkippingSubmodule(module);
        }

        trace!(module = %module.name, version = %version, line = self.line_no, "version opened");
        let rules = RuleSet::for_type_slice(
            Scope::submodule(module.name.as_str(), version.as_str()),
            self.direction,
        );
        let sub = OpenSubmodule {
            version,
            slice: TypeSlice::seeded(&self.options.header),
            rules,
        };
        State::InSubmodule(module, sub)
    }

    fn commit_module(&mut self, module: OpenModule) {
        debug!(
            stream = %self.direction,
            module = %module.name,
            lines = module.types.slice.len(),
            versions = module.types.versions.len(),
            "module captured"
        );
        self.index.insert(module.name, module.types);
    }

    fn report(&mut self, module: &ModuleName, submodule: Option<&SubmoduleVersion>, kind: IssueKind) {
        let issue = ParseIssue {
            module: module.clone(),
            submodule: submodule.cloned(),
            direction: self.direction,
            kind,
        };
        warn!("{}", issue);
        self.issues.push(issue);
    }
}

fn module_open(line: &str) -> Option<&str> {
    MODULE_OPEN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse a whole declaration stream from a reader.
pub fn parse_declarations<R: BufRead>(
    reader: R,
    direction: Direction,
    options: ParserOptions,
) -> std::io::Result<ParsedStream> {
    let mut parser = NamespaceParser::new(direction, options);
    for line in reader.lines() {
        parser.feed(&line?);
    }
    Ok(parser.finish())
}

/// Parse a declaration stream held in memory.
pub fn parse_str(source: &str, direction: Direction, options: ParserOptions) -> ParsedStream {
    let mut parser = NamespaceParser::new(direction, options);
    for line in source.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Parse a declaration file from disk.
pub fn parse_file(
    path: &Path,
    direction: Direction,
    options: ParserOptions,
) -> SplitResult<ParsedStream> {
    let file = std::fs::File::open(path).map_err(|e| SplitError::io(path, e))?;
    parse_declarations(std::io::BufReader::new(file), direction, options)
        .map_err(|e| SplitError::io(path, e))
}
