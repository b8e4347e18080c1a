//! Identifiers for modules, versions and declaration streams.

use std::borrow::Borrow;

/// Name of a resource group, e.g. `storage`.
///
/// Used both as the namespace key in the declaration streams and as the
/// output directory name of the split package.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Name of a versioned sub-namespace inside a module, e.g. `v20230101`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmoduleVersion(String);

impl SubmoduleVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmoduleVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SubmoduleVersion {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubmoduleVersion {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Which declaration stream a line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Inputs,
    Outputs,
}

impl Direction {
    /// Namespace alias used in qualified references (`inputs` / `outputs`).
    pub fn alias(self) -> &'static str {
        match self {
            Direction::Inputs => "inputs",
            Direction::Outputs => "outputs",
        }
    }

    /// File stem of the declaration file (`input` / `output`).
    pub fn file_stem(self) -> &'static str {
        match self {
            Direction::Inputs => "input",
            Direction::Outputs => "output",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}
