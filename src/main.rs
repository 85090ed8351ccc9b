//! grfkit CLI - Command-line tool for inspecting and extracting GRF archives.
//!
//! This is the main entry point for the grfkit command-line application.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use grfkit::prelude::*;

/// grfkit - GRF game asset archive tool
#[derive(Parser)]
#[command(name = "grfkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of a GRF archive
    List {
        /// Path to the GRF file
        #[arg(short, long, env = "GRF_FILE")]
        grf: PathBuf,

        /// Filter pattern (glob, or substring when it has no wildcards)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show sizes and flags
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract files from a GRF archive
    Extract {
        /// Path to the GRF file
        #[arg(short, long, env = "GRF_FILE")]
        grf: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (glob, or substring when it has no wildcards)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Write one entry's contents to stdout
    Cat {
        /// Path to the GRF file
        #[arg(short, long, env = "GRF_FILE")]
        grf: PathBuf,

        /// Entry path (case-insensitive, either slash direction)
        path: String,
    },

    /// Show header fields and entry statistics
    Info {
        /// Path to the GRF file
        #[arg(short, long, env = "GRF_FILE")]
        grf: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List {
            grf,
            filter,
            detailed,
        } => {
            cmd_list(&grf, filter.as_deref(), detailed)?;
        }
        Commands::Extract {
            grf,
            output,
            filter,
        } => {
            cmd_extract(&grf, &output, filter.as_deref())?;
        }
        Commands::Cat { grf, path } => {
            cmd_cat(&grf, &path)?;
        }
        Commands::Info { grf } => {
            cmd_info(&grf)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_archive(path: &Path) -> Result<GrfArchive> {
    GrfArchive::open(path).with_context(|| format!("Failed to open GRF archive {}", path.display()))
}

fn cmd_list(grf_path: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = open_archive(grf_path)?;
    let filter = filter.map(NameFilter::new).transpose()?;

    let mut count = 0;
    for entry in archive.entries()? {
        let name = entry.display_name();
        if let Some(filter) = &filter {
            if !filter.matches(&name) {
                continue;
            }
        }

        if detailed {
            println!(
                "{:>12} {:>12} {} {}",
                entry.compressed_size(),
                entry.uncompressed_size(),
                if entry.is_encrypted() { "E" } else { " " },
                name
            );
        } else {
            println!("{}", name);
        }
        count += 1;
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn cmd_extract(grf_path: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening GRF archive: {}", grf_path.display());

    let start = Instant::now();
    let archive = open_archive(grf_path)?;

    println!(
        "Loaded {} entries in {:?}",
        archive.entry_count(),
        start.elapsed()
    );

    let filter = filter.map(NameFilter::new).transpose()?;
    let selected: Vec<&GrfEntry> = archive
        .entries()?
        .filter(|e| {
            filter
                .as_ref()
                .map_or(true, |f| f.matches(&e.display_name()))
        })
        .collect();

    println!("Extracting {} entries...", selected.len());

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut extracted = 0;
    let mut errors = 0;

    for entry in &selected {
        pb.inc(1);

        let Some(relative) = entry.output_path() else {
            warn!("Skipping entry with unsafe path: {}", entry.display_name());
            errors += 1;
            continue;
        };
        let output_path = output.join(relative);

        match archive.read(entry.name_bytes()) {
            Ok(data) => {
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&output_path, data)
                    .with_context(|| format!("Failed to write {}", output_path.display()))?;
                extracted += 1;
            }
            Err(e) => {
                pb.suspend(|| eprintln!("Error extracting {}: {}", entry.display_name(), e));
                errors += 1;
            }
        }
    }

    pb.finish_with_message("Done");
    println!(
        "Extracted {} entries in {:?} ({} errors)",
        extracted,
        start.elapsed(),
        errors
    );

    Ok(())
}

fn cmd_cat(grf_path: &Path, path: &str) -> Result<()> {
    let archive = open_archive(grf_path)?;
    let data = archive
        .read(path)
        .with_context(|| format!("Failed to read {}", path))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;

    Ok(())
}

fn cmd_info(grf_path: &Path) -> Result<()> {
    let archive = open_archive(grf_path)?;
    let header = archive.header();
    let records = archive.records()?;

    let (compressed, uncompressed, encrypted) =
        archive
            .entries()?
            .fold((0u64, 0u64, 0usize), |(c, u, enc), e| {
                (
                    c + u64::from(e.compressed_size()),
                    u + u64::from(e.uncompressed_size()),
                    enc + usize::from(e.is_encrypted()),
                )
            });

    println!("Archive:        {}", archive.name());
    print!("{}", header_summary(header));
    println!("Records:        {}", records.len());
    println!("Files:          {}", archive.entry_count());
    println!("Directories:    {}", records.len() - archive.entry_count());
    println!("Encrypted:      {}", encrypted);
    println!("Compressed:     {} bytes", compressed);
    println!("Uncompressed:   {} bytes", uncompressed);

    Ok(())
}

/// Header fields as printed by `info`.
///
/// The table offset is the raw header field, relative to the end of the
/// header; the position is where the table block starts in the file.
fn header_summary(header: &GrfHeader) -> String {
    format!(
        "Version:        {:#x}\n\
         Seed:           {}\n\
         Table offset:   {:#x}\n\
         Table position: {:#x}\n",
        header.version(),
        header.seed(),
        header.table_offset(),
        header.table_position()
    )
}

/// Entry name filter for `list` and `extract`.
///
/// Patterns with wildcards are matched as case-insensitive globs against
/// the whole name; plain text matches any name containing it.
enum NameFilter {
    Glob(Pattern),
    Contains(String),
}

impl NameFilter {
    const OPTIONS: MatchOptions = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.replace('\\', "/");

        if pattern.contains(['*', '?', '[']) {
            let glob = Pattern::new(&pattern)
                .with_context(|| format!("Invalid filter pattern: {}", pattern))?;
            Ok(Self::Glob(glob))
        } else {
            Ok(Self::Contains(pattern.to_lowercase()))
        }
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.replace('\\', "/");

        match self {
            Self::Glob(glob) => glob.matches_with(&name, Self::OPTIONS),
            Self::Contains(needle) => name.to_lowercase().contains(needle.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_glob_is_case_insensitive() {
        let filter = NameFilter::new("data/sprite/*.SPR").unwrap();

        assert!(filter.matches(r"data\sprite\npc\novice.spr"));
        assert!(!filter.matches(r"data\texture\a.bmp"));
    }

    #[test]
    fn test_filter_substring() {
        let filter = NameFilter::new(r"Texture\").unwrap();

        assert!(filter.matches(r"data\texture\a.bmp"));
        assert!(!filter.matches(r"data\sprite\a.spr"));
    }

    #[test]
    fn test_header_summary_separates_offset_and_position() {
        let mut data = GrfHeader::MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 15]);
        data.extend_from_slice(&0x100u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(4u32 + 7).to_le_bytes());
        data.extend_from_slice(&0x200u32.to_le_bytes());
        let header = GrfHeader::parse(&data).unwrap();

        let summary = header_summary(&header);

        assert!(summary.contains("Table offset:   0x100\n"));
        assert!(summary.contains("Table position: 0x12e\n"));
    }

    #[test]
    fn test_filter_rejects_bad_glob() {
        assert!(NameFilter::new("data/[.txt").is_err());
    }
}
