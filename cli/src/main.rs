use anyhow::Result;
use bestiary_core::config::ImporterConfig;
use bestiary_core::database::Database;
use bestiary_core::file_utils::{decode_statblock, find_files_with_extension, read_statblock_file};
use bestiary_core::processors::{
    ImportResult, ImportSummary, parse_statblock_files_with_progress, store_results,
};
use bestiary_core::{StatblockFormat, import_statblock, parse_statblock};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(
    name = "bestiary",
    version = "0.1.0",
    about = "CLI tool for importing creature statblocks",
    long_about = None
)]
struct Cli {
    /// Path to TOML config file
    #[arg(long, global = true, env = "BESTIARY_CONFIG")]
    config: Option<PathBuf>,

    /// Path to SQLite database file (overrides config)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/bestiary.log")]
    log_file: PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statblock and print the record as JSON
    Parse {
        /// Statblock file, or - for stdin
        file: PathBuf,
        /// Statblock grammar: native or alternate
        #[arg(long)]
        format: Option<StatblockFormat>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a statblock file and store it in the database
    Import {
        /// Statblock file
        file: PathBuf,
        /// Statblock grammar: native or alternate
        #[arg(long)]
        format: Option<StatblockFormat>,
    },

    /// Parse and store every statblock file in a directory
    ImportDir {
        /// Directory searched recursively
        dir: PathBuf,
        /// Statblock grammar: native or alternate
        #[arg(long)]
        format: Option<StatblockFormat>,
        /// File extension to look for (overrides config)
        #[arg(long)]
        extension: Option<String>,
        /// Parse only, store nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored creatures
    List,
}

fn setup_logging(verbose: u8, log_file: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("bestiary.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<ImporterConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            ImporterConfig::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => Ok(ImporterConfig::default()),
    }
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        return Ok(decode_statblock(&bytes));
    }
    if !file.exists() {
        anyhow::bail!("Statblock file not found: {:?}", file);
    }
    Ok(read_statblock_file(file)?)
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{bar:40}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    let config = load_config(cli.config.as_deref())?;
    let db_path = cli.database.clone().unwrap_or_else(|| config.database.clone());

    match cli.command {
        Commands::Parse { file, format, pretty } => {
            let format = format.unwrap_or(config.format);
            let text = read_input(&file)?;
            let record = parse_statblock(&text, format)?;
            let json = if pretty {
                serde_json::to_string_pretty(&record)?
            } else {
                serde_json::to_string(&record)?
            };
            println!("{}", json);
        }
        Commands::Import { file, format } => {
            let format = format.unwrap_or(config.format);
            let text = read_input(&file)?;
            let db = Database::new(&db_path)?;
            let id = import_statblock(&text, format, &db)?;
            println!("Imported {:?} as creature #{}", file, id);
        }
        Commands::ImportDir { dir, format, extension, dry_run } => {
            let format = format.unwrap_or(config.format);
            let extension = extension.unwrap_or_else(|| config.extension.clone());

            if !dir.is_dir() {
                anyhow::bail!("Statblock directory not found: {:?}", dir);
            }

            let files = find_files_with_extension(&dir, &extension)?;
            info!("Found {} .{} files in {:?}", files.len(), extension, dir);

            let pb = progress_bar(files.len())?;
            let parsed = parse_statblock_files_with_progress(&files, format, |_| pb.inc(1));
            pb.finish_and_clear();

            let results = if dry_run {
                parsed
            } else {
                let db = Database::new(&db_path)?;
                store_results(parsed, &db)
            };

            let mut summary = ImportSummary::new();
            for result in &results {
                summary.add_result(result);
                match result {
                    ImportResult::Stored { name, id, .. } => info!("Stored: {} (#{})", name, id),
                    ImportResult::Parsed { record, .. } => info!("Parsed: {}", record.name),
                    ImportResult::Failed { path, error } => {
                        tracing::warn!("Failed: {:?}: {}", path, error)
                    }
                }
            }

            println!("--- Summary ---");
            println!("Total files: {}", summary.total);
            println!("Parsed: {}", summary.parsed);
            println!("Stored: {}", summary.stored);
            println!("Failed: {}", summary.failed);
            if dry_run {
                println!("(DRY RUN - nothing was stored)");
            }
        }
        Commands::List => {
            let db = Database::new(&db_path)?;
            for creature in db.list_creatures()? {
                println!(
                    "{:>5}  {:<30}  level {:>2}  {}",
                    creature.id, creature.name, creature.level, creature.imported_at
                );
            }
        }
    }

    Ok(())
}
