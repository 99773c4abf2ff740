//! Ingest command - walk, parse and split a directory

use crate::cli::output::{colors, format_bytes, format_duration, print_warning};
use crate::cli::progress::IndicatifProgress;
use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::loader::IngestPipeline;
use crate::core::types::{IngestOutput, IngestStats, MetadataIndex, SkippedFile};
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Directory (or single file) to ingest
    pub path: PathBuf,

    /// Characters per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overlap between chunks in characters
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Glob patterns to include (can be specified multiple times)
    #[arg(long, short = 'i')]
    pub include: Vec<String>,

    /// Glob patterns to exclude (can be specified multiple times)
    #[arg(long, short = 'e')]
    pub exclude: Vec<String>,

    /// Only load files with these extensions (e.g. ".py")
    #[arg(long, short = 's')]
    pub suffix: Vec<String>,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Number of worker threads
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Documents per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Fail on undecodable files instead of guessing an encoding
    #[arg(long)]
    pub no_detect_encoding: bool,

    /// Write chunks as JSON lines to this file
    #[arg(long, value_name = "FILE")]
    pub emit_chunks: Option<PathBuf>,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl IngestArgs {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(chunk_size) = self.chunk_size {
            config.splitting.chunk_size = chunk_size;
        }
        if let Some(overlap) = self.overlap {
            config.splitting.overlap = overlap;
        }
        if !self.include.is_empty() {
            config.walk.include_patterns = self.include.clone();
        }
        if !self.exclude.is_empty() {
            config.walk.exclude_patterns = self.exclude.clone();
        }
        if !self.suffix.is_empty() {
            config.walk.suffixes = self.suffix.clone();
        }
        if self.hidden {
            config.walk.load_hidden = true;
        }
        if let Some(workers) = self.workers {
            config.workers.max_workers = workers;
        }
        if let Some(batch_size) = self.batch_size {
            config.workers.batch_size = batch_size;
        }
        if self.no_detect_encoding {
            config.parsing.detect_encoding = false;
        }
    }
}

/// Ingestion result response
#[derive(Debug, Serialize)]
pub struct IngestResponse<'a> {
    pub root: String,
    pub stats: &'a IngestStats,
    pub files: &'a MetadataIndex,
    pub skipped: &'a [SkippedFile],
    pub chunks_file: Option<String>,
}

/// Execute the ingest command
pub fn execute(
    args: IngestArgs,
    mut config: Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    args.apply(&mut config);
    config.validate()?;
    config.log_config();

    let progress = if args.quiet || format == OutputFormat::Json {
        Arc::new(IndicatifProgress::hidden())
    } else {
        Arc::new(IndicatifProgress::new())
    };

    if !args.quiet && format == OutputFormat::Human {
        eprintln!(
            "Ingesting {}...",
            colors::file_path(&args.path.display().to_string())
        );
    }

    let pipeline = IngestPipeline::new(&config)?.with_progress(progress.clone());
    let output = pipeline.run(&args.path)?;
    progress.finish();

    if let Some(path) = &args.emit_chunks {
        write_chunks(&output, path)?;
    }

    match format {
        OutputFormat::Human => print_human(&output, args.emit_chunks.as_deref()),
        OutputFormat::Json => {
            let response = IngestResponse {
                root: output.root.to_string_lossy().into_owned(),
                stats: &output.stats,
                files: &output.metadata_index,
                skipped: &output.skipped,
                chunks_file: args
                    .emit_chunks
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Write one JSON object per chunk
fn write_chunks(output: &IngestOutput, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)
        .map_err(|e| format!("Cannot create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    for chunk in &output.chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn print_human(output: &IngestOutput, chunks_file: Option<&Path>) {
    let stats = &output.stats;
    let duration_secs = stats.duration_ms as f64 / 1000.0;
    let text_bytes: usize = output.chunks.iter().map(|c| c.text.len()).sum();

    let verb = if stats.cancelled {
        colors::warning("Cancelled after")
    } else {
        colors::success("Ingested")
    };
    println!(
        "{} {} files ({} documents, {} chunks, {}) in {}",
        verb,
        colors::number(&stats.files_parsed.to_string()),
        colors::number(&stats.documents.to_string()),
        colors::number(&stats.chunks_created.to_string()),
        colors::number(&format_bytes(text_bytes as u64)),
        colors::number(&format_duration(duration_secs))
    );

    if !stats.languages.is_empty() {
        let langs: Vec<String> = stats
            .languages
            .iter()
            .map(|(lang, count)| format!("{lang} ({count})"))
            .collect();
        println!("{} {}", colors::label("Languages:"), langs.join(", "));
    }

    if stats.batches_failed > 0 {
        print_warning(&format!(
            "{} of {} batches failed",
            stats.batches_failed, stats.batches
        ));
    }

    if !output.skipped.is_empty() {
        println!(
            "{} {}",
            colors::label("Skipped:"),
            colors::number(&stats.files_skipped.to_string())
        );
        for skip in &output.skipped {
            println!(
                "  {} {} {}",
                colors::file_path(skip.source.as_str()),
                colors::warning(skip.reason.as_str()),
                colors::dim(&skip.message)
            );
        }
    }

    if let Some(path) = chunks_file {
        println!(
            "Chunks written to {}",
            colors::file_path(&path.display().to_string())
        );
    }
}
