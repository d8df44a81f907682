//! Upload ingestion: read, decode, parse and concatenate exported CSV files.
//!
//! Each upload is parsed independently. A file that fails is recorded as a
//! [`FileFailure`] and skipped; the batch only fails when nothing parsed.
//! Parsed tables are cached by content hash so the same bytes are never
//! parsed twice within a run.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::{
    error::{AnalyticsError, AnalyticsResult, FileFailure},
    io_utils,
};

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> AnalyticsResult<Self> {
        let bytes = fs::read(path).map_err(|source| AnalyticsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Overrides extension-based detection when set.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl ParseOptions {
    fn delimiter_for(&self, name: &str) -> u8 {
        io_utils::resolve_input_delimiter(Path::new(name), self.delimiter)
    }
}

/// One parsed file: de-duplicated headers and rows padded to header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn parse_table(
    bytes: &[u8],
    delimiter: u8,
    encoding: &'static Encoding,
) -> AnalyticsResult<ParsedTable> {
    let text = io_utils::decode_bytes(bytes, encoding)?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let raw_headers = reader.headers()?.iter().map(str::to_string).collect::<Vec<_>>();
    if raw_headers.is_empty() || raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AnalyticsError::EmptyHeader);
    }
    let headers = dedupe_headers(&raw_headers);
    let width = headers.len();

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(AnalyticsError::RaggedRow {
                row: row_idx + 2,
                found: record.len(),
                expected: width,
            });
        }
        let mut cells = record.iter().map(str::to_string).collect::<Vec<_>>();
        cells.resize(width, String::new());
        rows.push(cells);
    }
    Ok(ParsedTable { headers, rows })
}

/// Blank headers become `Unnamed: <idx>`; repeats get `.1`, `.2`, ... suffixes.
fn dedupe_headers(raw: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (idx, name) in raw.iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.clone()
        };
        let mut candidate = base.clone();
        while let Some(count) = seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{base}.{count}");
        }
        seen.insert(candidate.clone(), 0);
        headers.push(candidate);
    }
    headers
}

/// Content-addressed parse cache.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<String, Arc<ParsedTable>>,
    hits: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(
        &mut self,
        upload: &Upload,
        options: &ParseOptions,
    ) -> AnalyticsResult<Arc<ParsedTable>> {
        let delimiter = options.delimiter_for(&upload.name);
        let key = format!(
            "{:x}|{}|{}",
            Sha256::digest(&upload.bytes),
            delimiter,
            options.encoding.name()
        );
        if let Some(table) = self.entries.get(&key) {
            self.hits += 1;
            debug!("Reusing parsed table for '{}'", upload.name);
            return Ok(Arc::clone(table));
        }
        let parsed = Arc::new(parse_table(&upload.bytes, delimiter, options.encoding)?);
        self.entries.insert(key, Arc::clone(&parsed));
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

/// A concatenated row with the name of the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub source: String,
    pub cells: Vec<String>,
}

/// All successfully parsed uploads, concatenated in upload order.
///
/// Headers are the union of every file's headers in first-seen order; a
/// file lacking a column contributes empty cells for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<ParsedTable>)>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut staged = Vec::new();
        for (source, table) in parts {
            let mapping = table
                .headers
                .iter()
                .map(|name| {
                    *positions.entry(name.clone()).or_insert_with(|| {
                        headers.push(name.clone());
                        headers.len() - 1
                    })
                })
                .collect::<Vec<_>>();
            staged.push((source, table, mapping));
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for (source, table, mapping) in staged {
            for row in &table.rows {
                let mut cells = vec![String::new(); width];
                for (cell, target) in row.iter().zip(&mapping) {
                    cells[*target] = cell.clone();
                }
                rows.push(RawRow {
                    source: source.clone(),
                    cells,
                });
            }
        }
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub table: RawTable,
    pub parsed_files: Vec<String>,
    pub failures: Vec<FileFailure>,
}

/// Parses every upload, skipping failures. Errors only when nothing parsed.
pub fn ingest(
    uploads: &[Upload],
    options: &ParseOptions,
    cache: &mut TableCache,
) -> AnalyticsResult<IngestOutcome> {
    ingest_with_failures(uploads, Vec::new(), options, cache)
}

/// Reads the files at `paths` and ingests them; unreadable files count as failures.
pub fn ingest_paths(
    paths: &[PathBuf],
    options: &ParseOptions,
    cache: &mut TableCache,
) -> AnalyticsResult<IngestOutcome> {
    let mut uploads = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for path in paths {
        match Upload::from_path(path) {
            Ok(upload) => uploads.push(upload),
            Err(err) => {
                warn!("Skipping file '{}': {err}", path.display());
                failures.push(FileFailure {
                    file: path.display().to_string(),
                    cause: err.to_string(),
                });
            }
        }
    }
    ingest_with_failures(&uploads, failures, options, cache)
}

fn ingest_with_failures(
    uploads: &[Upload],
    mut failures: Vec<FileFailure>,
    options: &ParseOptions,
    cache: &mut TableCache,
) -> AnalyticsResult<IngestOutcome> {
    let mut parts = Vec::with_capacity(uploads.len());
    for upload in uploads {
        match cache.get_or_parse(upload, options) {
            Ok(table) => {
                debug!(
                    "Parsed '{}': {} column(s), {} row(s)",
                    upload.name,
                    table.headers.len(),
                    table.rows.len()
                );
                parts.push((upload.name.clone(), table));
            }
            Err(err) => {
                warn!("Skipping file '{}': {err}", upload.name);
                failures.push(FileFailure {
                    file: upload.name.clone(),
                    cause: err.to_string(),
                });
            }
        }
    }

    if parts.is_empty() {
        return Err(AnalyticsError::NoValidUploads { failures });
    }

    let parsed_files = parts.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>();
    let table = RawTable::concat(parts);
    info!(
        "Loaded {} row(s) from {} file(s) ({} skipped)",
        table.len(),
        parsed_files.len(),
        failures.len()
    );
    Ok(IngestOutcome {
        table,
        parsed_files,
        failures,
    })
}
