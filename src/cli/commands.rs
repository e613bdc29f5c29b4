use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, value_parser};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ENV_CHUNK_SIZE, ENV_MIN_CONFIDENCE, ExtractionMode, ParseOptions};
use crate::models::{ImportSummary, WatchRecord};
use crate::parsers::{ExtractionStats, TimestampEngine};
use crate::pipeline::{
    MigrationReport, OffloadExecutor, Scheduler, StreamingParser, generate_summary,
    reresolve_records,
};
use crate::utils::{format_path_with_tilde, open_document, read_document};

#[derive(Parser)]
#[command(name = "watch-history-parser")]
#[command(version = "0.1.0")]
#[command(about = "Extract watch records from a video watch-history export", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse an export and print its records as JSON
    Parse {
        file: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Run the parse on a worker thread
        #[arg(long, conflicts_with = "streaming")]
        offload: bool,

        /// Read the export incrementally instead of loading it whole
        #[arg(long)]
        streaming: bool,
    },
    /// Show an import summary for one or more exports
    Stats {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Re-resolve timestamps of stored records that have none
    Migrate {
        /// JSON array of records, as printed by `parse`
        records: PathBuf,

        #[arg(long)]
        pretty: bool,
    },
}

/// Flags that override the loaded parse options
#[derive(Args, Debug, Default)]
pub struct OptionArgs {
    /// JSON file with parse options
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimum confidence (0-100) for a timestamp to be accepted
    #[arg(long, global = true, env = ENV_MIN_CONFIDENCE, value_parser = value_parser!(u8).range(0..=100))]
    pub min_confidence: Option<u8>,

    /// Chunk size hint in bytes
    #[arg(long, global = true, env = ENV_CHUNK_SIZE)]
    pub chunk_size: Option<usize>,

    /// Recognize English timestamp formats only
    #[arg(long, global = true)]
    pub no_international: bool,

    /// Skip markup parsing and extract entries from text patterns
    #[arg(long, global = true)]
    pub pattern_only: bool,

    /// Latest year a timestamp may fall in (defaults to the current year)
    #[arg(long, global = true)]
    pub reference_year: Option<i32>,

    /// Largest export accepted, in bytes
    #[arg(long, global = true)]
    pub max_bytes: Option<u64>,
}

impl OptionArgs {
    /// Defaults, then the config file, then environment, then these flags
    pub fn resolve(&self) -> Result<ParseOptions> {
        let options = match &self.config {
            Some(path) => ParseOptions::from_file(path)?,
            None => ParseOptions::default(),
        };
        let mut options = options.with_env_overrides()?;

        if let Some(min_confidence) = self.min_confidence {
            options.min_confidence = min_confidence;
        }
        if let Some(chunk_size) = self.chunk_size {
            options.chunk_size_hint = Some(chunk_size);
        }
        if self.no_international {
            options.international_formats = false;
        }
        if self.pattern_only {
            options.extraction_mode = ExtractionMode::PatternOnly;
        }
        if let Some(year) = self.reference_year {
            options.reference_year = Some(year);
        }
        if let Some(max_bytes) = self.max_bytes {
            options.max_document_bytes = max_bytes;
        }
        Ok(options)
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Parse { file, pretty, offload, streaming }) => {
            let options = cli.options.resolve()?;
            let records = if *streaming {
                parse_streaming(file, &options)?
            } else if *offload {
                parse_offloaded(file, &options)?
            } else {
                let document = read_document(file, options.max_document_bytes)?;
                Scheduler::new(&options).run(&document).records
            };
            write_json(&records, *pretty)?;
        }
        Some(Commands::Stats { files }) => {
            let options = cli.options.resolve()?;
            show_stats(files, &options)?;
        }
        Some(Commands::Migrate { records, pretty }) => {
            let options = cli.options.resolve()?;
            migrate(records, &options, *pretty)?;
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn parse_streaming(path: &Path, options: &ParseOptions) -> Result<Vec<WatchRecord>> {
    let file = open_document(path, options.max_document_bytes)?;
    let mut parser = StreamingParser::new(file, options);
    let records = parser
        .parse_all()
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    info!(
        "Streamed {} records ({} advertisements, {} bytes discarded)",
        records.len(),
        parser.advertisements(),
        parser.discarded_bytes()
    );
    Ok(records)
}

fn parse_offloaded(path: &Path, options: &ParseOptions) -> Result<Vec<WatchRecord>> {
    let document = read_document(path, options.max_document_bytes)?;
    let handle = OffloadExecutor::spawn(document, options.clone())?;
    let (records, _) = handle.wait_with_progress(|progress| {
        debug!(
            "Chunk {}/{} ({:.0}%), {} records",
            progress.current_chunk,
            progress.total_chunks,
            progress.percentage,
            progress.processed_records
        );
    })?;
    Ok(records)
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = if pretty {
        serde_json::to_writer_pretty(&mut out, value)
    } else {
        serde_json::to_writer(&mut out, value)
    };
    written.context("Failed to write JSON output")?;
    writeln!(out).context("Failed to write JSON output")?;
    Ok(())
}

struct FileStats {
    summary: ImportSummary,
    advertisements: usize,
    discarded: usize,
}

fn collect_stats(path: &Path, options: &ParseOptions) -> Result<FileStats> {
    let document = read_document(path, options.max_document_bytes)?;
    let outcome = Scheduler::new(options).run(&document);
    Ok(FileStats {
        summary: generate_summary(&outcome.records),
        advertisements: outcome.advertisements,
        discarded: outcome.discarded,
    })
}

fn show_stats(files: &[PathBuf], options: &ParseOptions) -> Result<()> {
    // Each file gets its own pipeline; collect keeps argument order
    let results: Vec<_> = files.par_iter().map(|path| collect_stats(path, options)).collect();

    let mut failures = 0;
    for (index, (path, result)) in files.iter().zip(results).enumerate() {
        if index > 0 {
            println!();
        }
        match result {
            Ok(stats) => print_stats(path, &stats),
            Err(e) => {
                failures += 1;
                eprintln!("Error: {:#}", e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} files could not be summarized", failures, files.len());
    }
    Ok(())
}

fn print_stats(path: &Path, stats: &FileStats) {
    let summary = &stats.summary;

    println!("Watch History Statistics");
    println!("========================");
    println!("File: {}", format_path_with_tilde(path));
    println!("Total records: {}", summary.total_records);
    println!("  With timestamp: {}", summary.with_timestamp);
    println!("  Without timestamp: {}", summary.without_timestamp);
    println!("  Primary: {}", summary.products.primary);
    println!("  Music: {}", summary.products.music);
    println!("Distinct videos: {}", summary.distinct_videos);
    println!("Distinct channels: {}", summary.distinct_channels);
    println!("Advertisements skipped: {}", stats.advertisements);
    println!("Entries discarded: {}", stats.discarded);
    println!("Timestamp success rate: {:.1}%", summary.timestamp_success_rate * 100.0);
    if let Some(confidence) = summary.average_confidence {
        println!("Average confidence: {:.1}", confidence);
    }
    if let Some(earliest) = summary.earliest {
        println!("Earliest watch: {}", earliest.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(latest) = summary.latest {
        println!("Latest watch: {}", latest.format("%Y-%m-%d %H:%M:%S"));
    }
    for (year, count) in &summary.records_per_year {
        println!("  {}: {}", year, count);
    }
}

#[derive(Serialize)]
struct MigrationOutput {
    #[serde(flatten)]
    report: MigrationReport,
    records: Vec<WatchRecord>,
}

fn migrate(path: &Path, options: &ParseOptions, pretty: bool) -> Result<()> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    let mut records: Vec<WatchRecord> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))?;

    let engine = TimestampEngine::from_options(options);
    let mut stats = ExtractionStats::new();
    let report = reresolve_records(&mut records, &engine, &mut stats);

    write_json(&MigrationOutput { report, records }, pretty)
}
