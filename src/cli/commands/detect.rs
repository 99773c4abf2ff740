//! Detect command - classify files without parsing them

use crate::cli::output::colors;
use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::loader::IngestPipeline;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Directory (or single file) to classify
    pub path: PathBuf,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Accept every classified file regardless of MIME type
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// One classified file
#[derive(Debug, Serialize)]
pub struct DetectedFile {
    pub source: String,
    pub lang: String,
    pub ext: Option<String>,
    pub mime: Option<String>,
    pub encoding: Option<String>,
}

/// Execute the detect command
pub fn execute(
    args: DetectArgs,
    mut config: Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.hidden {
        config.walk.load_hidden = true;
    }
    if args.all {
        config.walk.mime_prefixes.clear();
    }

    let pipeline = IngestPipeline::new(&config)?;
    let files: Vec<DetectedFile> = pipeline
        .detect_files(&args.path)?
        .into_iter()
        .map(|(source, info)| DetectedFile {
            source: source.to_string(),
            lang: info.lang,
            ext: info.ext,
            mime: info.mime,
            encoding: info.encoding,
        })
        .collect();

    match format {
        OutputFormat::Human => {
            if files.is_empty() {
                println!("No supported files found.");
                return Ok(());
            }

            let width = files.iter().map(|f| f.source.len()).max().unwrap_or(0);
            for file in &files {
                println!(
                    "{}  {:<12} {:<28} {}",
                    colors::file_path(&format!("{:<width$}", file.source)),
                    file.lang,
                    file.mime.as_deref().unwrap_or("-"),
                    colors::dim(file.encoding.as_deref().unwrap_or("-"))
                );
            }
            println!(
                "\n{} {} files",
                colors::label("Total:"),
                colors::number(&files.len().to_string())
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&files)?);
        }
    }

    Ok(())
}
