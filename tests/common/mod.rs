#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use yt_mini_analytics::{
    config::AliasConfig,
    ingest::{self, IngestOutcome, ParseOptions, TableCache, Upload},
    working::WorkingTable,
};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

/// Ingests in-memory `(name, csv text)` uploads with default options.
pub fn ingest_texts(files: &[(&str, &str)]) -> IngestOutcome {
    let uploads = files
        .iter()
        .map(|(name, text)| Upload::new(*name, *text))
        .collect::<Vec<_>>();
    let mut cache = TableCache::new();
    ingest::ingest(&uploads, &ParseOptions::default(), &mut cache).expect("ingest uploads")
}

/// Builds a working table from one CSV text, without a mapping file.
pub fn working_from(text: &str) -> WorkingTable {
    let outcome = ingest_texts(&[("export.csv", text)]);
    WorkingTable::build(&outcome.table, None, &AliasConfig::default())
}

/// Builds a working table from a CSV text and a mapping CSV text.
pub fn working_with_mapping(text: &str, mapping: &str) -> WorkingTable {
    let outcome = ingest_texts(&[("export.csv", text)]);
    let mapping = ingest_texts(&[("mapping.csv", mapping)]);
    WorkingTable::build(
        &outcome.table,
        Some(&mapping.table),
        &AliasConfig::default(),
    )
}
