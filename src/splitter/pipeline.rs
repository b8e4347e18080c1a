//! Build orchestration
//!
//! ```text
//!                 prepare output root
//!                         │
//!          ┌──────────────┴──────────────┐
//!     types pass                  implementation pass
//!   parse inputs ║ outputs       core ║ modules (par)
//!   write types per module (par)  metadata hook per package
//!          └──────────────┬──────────────┘
//!                    BuildReport
//! ```
//!
//! Every unit writes a disjoint subtree of the output root. A unit's failure
//! is recorded against its module and never stops the other units. In a full
//! build a pass that cannot start is recorded against `types` or `modules`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use itertools::Itertools;
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::core_package::assemble_core;
use super::layout::{OutputLayout, SourceLayout, CORE_PACKAGE};
use super::names::{Direction, ModuleName, SubmoduleVersion};
use super::package::{discover_modules, list_output_packages, OutputPackage, PackageMetadata, SkipMetadata};
use super::parser::{parse_file, ParsedStream};
use super::transform::{ImportSet, ModuleTransformer};
use super::writer::{
    load_module_enums, load_version_enum_sources, load_version_enums, write_types, TypesUnit,
    WrittenTypes,
};
use crate::config::BuildConfig;
use crate::error::{SplitError, SplitResult};

/// Failure unit of a types pass that could not start.
pub const TYPES_PASS: &str = "types";
/// Failure unit of an implementation pass that could not start.
pub const MODULES_PASS: &str = "modules";

/// One unit that failed.
#[derive(Debug)]
pub struct ModuleFailure {
    pub module: String,
    pub error: SplitError,
}

/// Outcome of a build or types-only run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Packages whose implementation files were written, core first.
    pub packages: Vec<String>,
    /// Number of `types` directories written (modules and versions).
    pub types_written: usize,
    /// Failed modules, or a pass name when a whole pass failed.
    pub failures: Vec<ModuleFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Distinct module names with at least one failure.
    pub fn failed_modules(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|f| f.module.as_str())
            .dedup()
            .collect()
    }

    fn merge(&mut self, other: BuildReport) {
        self.packages.extend(other.packages);
        self.types_written += other.types_written;
        self.failures.extend(other.failures);
    }

    fn sort_failures(&mut self) {
        self.failures.sort_by(|a, b| a.module.cmp(&b.module));
    }
}

/// Per-unit result before it is folded into the report.
struct UnitOutcome {
    module: String,
    types_written: usize,
    built: bool,
    errors: Vec<SplitError>,
}

impl UnitOutcome {
    fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            types_written: 0,
            built: false,
            errors: Vec::new(),
        }
    }

    fn record_types(&mut self, result: SplitResult<WrittenTypes>) {
        match result {
            Ok(_) => self.types_written += 1,
            Err(error) => {
                warn!(module = %self.module, %error, "types scope failed");
                self.errors.push(error);
            }
        }
    }
}

fn fold_outcomes(outcomes: impl IntoIterator<Item = UnitOutcome>) -> BuildReport {
    let mut report = BuildReport::default();
    for outcome in outcomes {
        if outcome.built {
            report.packages.push(outcome.module.clone());
        }
        report.types_written += outcome.types_written;
        report.failures.extend(outcome.errors.into_iter().map(|error| ModuleFailure {
            module: outcome.module.clone(),
            error,
        }));
    }
    report
}

/// A build over one configuration. Parsed declaration streams are memoized
/// for the lifetime of the session.
pub struct BuildSession {
    config: BuildConfig,
    source: SourceLayout,
    output: OutputLayout,
    imports: ImportSet,
    metadata: Box<dyn PackageMetadata>,
    pool: rayon::ThreadPool,
    streams: Mutex<HashMap<Direction, Arc<ParsedStream>>>,
}

impl BuildSession {
    pub fn new(config: BuildConfig) -> SplitResult<Self> {
        let jobs = config.effective_jobs();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("sdksplit-worker-{}", i))
            .build()?;
        debug!(jobs, "worker pool ready");

        Ok(Self {
            source: config.source_layout(),
            output: config.output_layout(),
            imports: config.imports(),
            config,
            metadata: Box::new(SkipMetadata),
            pool,
            streams: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the metadata collaborator.
    pub fn with_metadata(mut self, metadata: impl PackageMetadata + 'static) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Parse a declaration stream, or return the memoized parse.
    pub fn parsed(&self, direction: Direction) -> SplitResult<Arc<ParsedStream>> {
        if let Some(parsed) = self.streams.lock().get(&direction) {
            return Ok(Arc::clone(parsed));
        }

        let path = self.source.declarations(direction);
        info!(stream = %direction, path = %path.display(), "parsing declarations");
        let parsed = Arc::new(parse_file(&path, direction, self.config.parser_options())?);

        // Two callers may race to parse; the first insert wins.
        let mut streams = self.streams.lock();
        Ok(Arc::clone(streams.entry(direction).or_insert(parsed)))
    }

    /// Parse both streams concurrently.
    pub fn parse_streams(&self) -> SplitResult<(Arc<ParsedStream>, Arc<ParsedStream>)> {
        let (inputs, outputs) = self.pool.install(|| {
            rayon::join(
                || self.parsed(Direction::Inputs),
                || self.parsed(Direction::Outputs),
            )
        });
        Ok((inputs?, outputs?))
    }

    /// Clean (when configured) and create the output root.
    pub fn prepare_output(&self) -> SplitResult<()> {
        let root = self.output.root();
        if self.config.clean && root.exists() {
            info!(root = %root.display(), "cleaning output");
            std::fs::remove_dir_all(root).map_err(|e| SplitError::io(root, e))?;
        }
        std::fs::create_dir_all(root).map_err(|e| SplitError::io(root, e))
    }

    /// Output packages: core first, then every discovered module.
    pub fn list_packages(&self) -> SplitResult<Vec<OutputPackage>> {
        list_output_packages(self.source.root(), &self.output, &self.config.ignored_dirs)
    }

    /// Types pass only.
    pub fn create_types(&self) -> SplitResult<BuildReport> {
        self.prepare_output()?;
        let mut report = self.types_pass()?;
        report.sort_failures();
        Ok(report)
    }

    /// Full build: types pass and implementation pass, concurrently.
    pub fn build(&self) -> SplitResult<BuildReport> {
        self.prepare_output()?;

        let (types, implementation) = self
            .pool
            .install(|| rayon::join(|| self.types_pass(), || self.implementation_pass()));

        let mut report = BuildReport::default();
        for (pass, result) in [(MODULES_PASS, implementation), (TYPES_PASS, types)] {
            match result {
                Ok(pass_report) => report.merge(pass_report),
                Err(error) => {
                    warn!(pass, %error, "pass failed");
                    report.failures.push(ModuleFailure {
                        module: pass.to_string(),
                        error,
                    });
                }
            }
        }
        report.sort_failures();

        info!(
            packages = report.packages.len(),
            types = report.types_written,
            failures = report.failures.len(),
            "build finished"
        );
        Ok(report)
    }

    fn types_pass(&self) -> SplitResult<BuildReport> {
        let (inputs, outputs) = self.parse_streams()?;
        let modules = self.types_modules(&inputs, &outputs)?;
        info!(modules = modules.len(), "writing types");

        let outcomes: Vec<UnitOutcome> = self.pool.install(|| {
            modules
                .par_iter()
                .map(|module| self.module_types(module, &inputs, &outputs))
                .collect()
        });
        Ok(fold_outcomes(outcomes))
    }

    /// Union of both index keys and the enum source directory names.
    fn types_modules(
        &self,
        inputs: &ParsedStream,
        outputs: &ParsedStream,
    ) -> SplitResult<Vec<ModuleName>> {
        let enum_modules = self.enum_modules()?;
        Ok(inputs
            .index
            .module_names()
            .chain(outputs.index.module_names())
            .cloned()
            .chain(enum_modules)
            .chain(
                inputs
                    .issues
                    .iter()
                    .chain(&outputs.issues)
                    .map(|issue| issue.module.clone()),
            )
            .sorted()
            .dedup()
            .collect())
    }

    fn enum_modules(&self) -> SplitResult<Vec<ModuleName>> {
        let dir = self.source.enums_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SplitError::io(&dir, e)),
        };

        let mut modules = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SplitError::io(&dir, e))?;
            if entry.file_type().map_err(|e| SplitError::io(entry.path(), e))?.is_dir() {
                modules.push(ModuleName::new(entry.file_name().to_string_lossy()));
            }
        }
        Ok(modules)
    }

    fn module_types(
        &self,
        module: &ModuleName,
        inputs: &ParsedStream,
        outputs: &ParsedStream,
    ) -> UnitOutcome {
        let mut outcome = UnitOutcome::new(module.as_str());

        let issues = inputs
            .issues_for(module.as_str())
            .chain(outputs.issues_for(module.as_str()))
            .cloned()
            .collect_vec();
        if !issues.is_empty() {
            warn!(module = %module, issues = issues.len(), "types not written");
            outcome.errors = issues.into_iter().map(SplitError::from).collect();
            return outcome;
        }

        self.write_module_types(module, inputs, outputs, &mut outcome);
        outcome
    }

    fn write_module_types(
        &self,
        module: &ModuleName,
        inputs: &ParsedStream,
        outputs: &ParsedStream,
        outcome: &mut UnitOutcome,
    ) {
        let name = module.as_str();
        let extension = self.source.extension();
        let input_types = inputs.index.get(name);
        let output_types = outputs.index.get(name);

        let module_scope = self.module_enums(name).and_then(|(enums, version_enums)| {
            let unit = TypesUnit {
                inputs: input_types.map(|t| t.slice.clone()),
                outputs: output_types.map(|t| t.slice.clone()),
                enums,
                version_enums,
            };
            write_types(&self.output.module_dir(name), unit, extension)
        });
        outcome.record_types(module_scope);

        let versions: BTreeSet<&SubmoduleVersion> = input_types
            .into_iter()
            .chain(output_types)
            .flat_map(|t| t.versions.keys())
            .collect();

        for version in versions {
            let version = version.as_str();
            let version_scope = load_version_enums(&self.source, name, version).and_then(|enums| {
                let unit = TypesUnit {
                    inputs: input_types.and_then(|t| t.version(version)).cloned(),
                    outputs: output_types.and_then(|t| t.version(version)).cloned(),
                    enums,
                    ..TypesUnit::default()
                };
                write_types(&self.output.version_dir(name, version), unit, extension)
            });
            outcome.record_types(version_scope);
        }

        debug!(
            module = name,
            scopes = outcome.types_written,
            failed = outcome.errors.len(),
            "module types written"
        );
    }

    /// Module enums, plus the version enums when versions stay inline.
    fn module_enums(
        &self,
        module: &str,
    ) -> SplitResult<(Option<String>, BTreeMap<String, String>)> {
        let enums = load_module_enums(&self.source, module)?;
        let version_enums = if self.config.split_versions {
            Default::default()
        } else {
            load_version_enum_sources(&self.source, module)?
        };
        Ok((enums, version_enums))
    }

    fn implementation_pass(&self) -> SplitResult<BuildReport> {
        let modules = discover_modules(self.source.root(), &self.config.ignored_dirs)?;
        info!(modules = modules.len(), "transforming modules");

        let transformer = ModuleTransformer::new(
            &self.source,
            &self.output,
            &self.imports,
            self.config.split_versions,
        );

        let (core, modules) = rayon::join(
            || self.core_unit(),
            || {
                modules
                    .par_iter()
                    .map(|module| self.module_unit(&transformer, module.as_str()))
                    .collect::<Vec<_>>()
            },
        );

        Ok(fold_outcomes(std::iter::once(core).chain(modules)))
    }

    fn core_unit(&self) -> UnitOutcome {
        let mut outcome = UnitOutcome::new(CORE_PACKAGE);
        let result = assemble_core(&self.source, &self.output)
            .and_then(|package| self.metadata.write(&package));
        match result {
            Ok(()) => outcome.built = true,
            Err(error) => outcome.errors.push(error),
        }
        outcome
    }

    fn module_unit(&self, transformer: &ModuleTransformer<'_>, module: &str) -> UnitOutcome {
        let mut outcome = UnitOutcome::new(module);
        let result = transformer
            .transform_module(module)
            .and_then(|_| self.metadata.write(&OutputPackage::module(&self.output, module)));
        match result {
            Ok(()) => outcome.built = true,
            Err(error) => {
                warn!(module, %error, "module failed");
                outcome.errors.push(error);
            }
        }
        outcome
    }
}

/// Run a full build for `config`.
pub fn run_build(config: BuildConfig) -> SplitResult<BuildReport> {
    BuildSession::new(config)?.build()
}

/// Run only the types pass for `config`.
pub fn create_types(config: BuildConfig) -> SplitResult<BuildReport> {
    BuildSession::new(config)?.create_types()
}
