//! Role resolution listing.
//!
//! Loads the given uploads and renders, per semantic role, the header it
//! resolved to, so header naming problems can be fixed with an alias file.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ColumnsArgs,
    data::PLACEHOLDER,
    ingest::{self, ParseOptions, TableCache},
    io_utils, report,
    roles::{self, DURATION_COLUMN, Resolution, Role, TYPE_COLUMN},
    table,
};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input.input_encoding.as_deref())?;
    let options = ParseOptions {
        delimiter: args.input.delimiter,
        encoding,
    };
    let aliases = report::load_aliases(args.aliases.as_deref())?;
    let mut cache = TableCache::new();
    let outcome = ingest::ingest_paths(&args.inputs, &options, &mut cache)
        .context("Loading uploaded reports")?;
    let headers = &outcome.table.headers;
    let resolution = Resolution::resolve(headers, &aliases);

    let mut rows = Role::ALL
        .iter()
        .map(|role| {
            vec![
                role.to_string(),
                resolution.get(*role).unwrap_or(PLACEHOLDER).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    for literal in [DURATION_COLUMN, TYPE_COLUMN] {
        let found = roles::find_exact(headers, literal).map_or(PLACEHOLDER, |_| literal);
        rows.push(vec![literal.to_string(), found.to_string()]);
    }

    table::print_table(&["role".to_string(), "column".to_string()], &rows);
    for failure in &outcome.failures {
        println!("! {}: {}", failure.file, failure.cause);
    }
    info!(
        "Resolved {} of {} role(s) across {} column(s)",
        resolution.iter().count(),
        Role::ALL.len(),
        headers.len()
    );
    Ok(())
}
