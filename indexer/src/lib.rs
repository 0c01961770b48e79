pub mod corpus;
pub mod html;
pub mod pdf;

use anyhow::{Context, Result};
use search_core::{store, IndexBuilder, IndexStats, InvertedIndex, TokenizerConfig};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub files: usize,
    pub stats: IndexStats,
    pub building_time_s: f64,
}

/// Index every corpus file under `input`, in path order.
pub fn build_from_path(input: &Path, config: TokenizerConfig) -> Result<(InvertedIndex, usize)> {
    let files = corpus::discover(input)?;
    tracing::info!(input = %input.display(), files = files.len(), "discovered corpus files");

    let mut builder = IndexBuilder::new(config);
    for file in &files {
        for doc in corpus::load_file(file)? {
            builder.add_document(doc);
        }
        tracing::debug!(file = %file.display(), num_docs = builder.len(), "ingested file");
    }
    let index = builder
        .finish()
        .with_context(|| format!("no documents found under {}", input.display()))?;
    Ok((index, files.len()))
}

/// Build the index for `input` and persist it at `output`.
pub fn build_index(input: &Path, output: &Path, config: TokenizerConfig) -> Result<BuildReport> {
    let start = Instant::now();
    let (index, files) = build_from_path(input, config)?;
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    store::save(&index, output)?;
    let report = BuildReport { files, stats: index.stats(), building_time_s: start.elapsed().as_secs_f64() };
    tracing::info!(
        output = %output.display(),
        num_docs = report.stats.num_docs,
        num_terms = report.stats.num_terms,
        building_time_s = report.building_time_s,
        "index written"
    );
    Ok(report)
}
