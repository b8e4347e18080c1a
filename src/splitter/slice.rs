//! Captured type slices and the per-stream module index.

use std::collections::BTreeMap;

use super::names::{Direction, ModuleName, SubmoduleVersion};

/// Ordered lines captured from one (module) or (module, version) scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSlice {
    lines: Vec<String>,
}

impl TypeSlice {
    /// Create a slice that starts with `header`, so the emitted file is
    /// compilable on its own.
    pub fn seeded(header: &str) -> Self {
        Self {
            lines: vec![header.to_string()],
        }
    }

    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Insert a line before everything else (used for the enum import).
    pub fn prepend(&mut self, line: &str) {
        self.lines.insert(0, line.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join the lines into file content.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Everything one stream captured for a module: its module-level slice and
/// one slice per version sub-namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleTypes {
    pub slice: TypeSlice,
    pub versions: BTreeMap<SubmoduleVersion, TypeSlice>,
}

impl ModuleTypes {
    pub fn new(slice: TypeSlice) -> Self {
        Self {
            slice,
            versions: BTreeMap::new(),
        }
    }

    pub fn version(&self, version: &str) -> Option<&TypeSlice> {
        self.versions.get(version)
    }
}

/// Module name -> captured types, built by a single parse of one stream.
/// Iteration is in module name order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleIndex {
    direction: Direction,
    modules: BTreeMap<ModuleName, ModuleTypes>,
}

impl ModuleIndex {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            modules: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn get(&self, module: &str) -> Option<&ModuleTypes> {
        self.modules.get(module)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &ModuleName> {
        self.modules.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleName, &ModuleTypes)> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub(crate) fn insert(&mut self, module: ModuleName, types: ModuleTypes) {
        self.modules.insert(module, types);
    }
}
