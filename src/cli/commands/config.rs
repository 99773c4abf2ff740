//! Config command - show current configuration

use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::xdg::XdgDirs;
use clap::Args;
use serde::Serialize;

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print the effective configuration as TOML
    #[arg(long)]
    pub toml: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse<'a> {
    pub config_file: String,
    pub config_file_exists: bool,
    #[serde(flatten)]
    pub config: &'a Config,
}

/// Execute the config command
pub fn execute(
    args: ConfigArgs,
    config: &Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_file = XdgDirs::new().config_file();

    if args.toml {
        print!("{}", toml::to_string_pretty(config)?);
        return Ok(());
    }

    let response = ConfigResponse {
        config_file: config_file.to_string_lossy().into_owned(),
        config_file_exists: config_file.exists(),
        config,
    };

    match format {
        OutputFormat::Human => {
            let exists = if response.config_file_exists {
                ""
            } else {
                " (not found)"
            };
            println!("Configuration:");
            println!("  config_file: {}{}", response.config_file, exists);
            println!("  walk:");
            println!("    include: {:?}", config.walk.include_patterns);
            println!("    exclude: {:?}", config.walk.exclude_patterns);
            println!("    suffixes: {:?}", config.walk.suffixes);
            println!("    load_hidden: {}", config.walk.load_hidden);
            println!("    max_file_size_mb: {}", config.walk.max_file_size_mb);
            println!("    mime_prefixes: {:?}", config.walk.mime_prefixes);
            println!("  parsing:");
            println!("    detect_encoding: {}", config.parsing.detect_encoding);
            println!(
                "    encoding_timeout_ms: {}",
                config.parsing.encoding_timeout_ms
            );
            println!("    probe_bytes: {}", config.parsing.probe_bytes);
            println!(
                "    segment_threshold: {}",
                config.parsing.segment_threshold
            );
            println!("  splitting:");
            println!("    chunk_size: {}", config.splitting.chunk_size);
            println!("    overlap: {}", config.splitting.overlap);
            println!("  workers:");
            println!("    max_workers: {}", config.workers.max_workers);
            println!("    batch_size: {}", config.workers.batch_size);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
