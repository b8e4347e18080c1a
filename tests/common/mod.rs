//! Test utilities for the split pipeline integration tests
//!
//! This module provides shared helpers:
//! - Locating the fixture SDK tree
//! - Building a config pointed at a scratch output root
//! - Copying and snapshotting directory trees
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sdksplit::BuildConfig;

/// Root of the fixture SDK (`tests/fixtures/sdk`)
pub fn fixture_sdk() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sdk")
}

/// Config reading `source` and writing to `output`, two workers.
pub fn config_for(source: &Path, output: &Path) -> BuildConfig {
    BuildConfig {
        source_root: source.to_path_buf(),
        output_root: output.to_path_buf(),
        jobs: 2,
        ..BuildConfig::default()
    }
}

/// Read a file below `root`, panicking with the path on failure.
pub fn read(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
}

/// Write a file below `root`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Recursively copy `from` into `to`.
pub fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// Every file below `root` keyed by its relative path.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    let mut files = BTreeMap::new();
    collect(root, root, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            files.insert(rel, fs::read_to_string(&path).unwrap());
        }
    }
}
