use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgAction;
use clap::{Args, Parser, Subcommand, ValueEnum};
use konfetti_core::{
    default_scan_roots, explain_record, normalize_bytes, parse_file, render_records, run_scan,
    scan_bytes, write_sample_settings, NormalizedRecord, OutputFormat, ScanOptions,
    ScanOverrides, SettingsFile,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "konfetti",
    version,
    about = "Find, normalize and filter configuration files scattered across a filesystem."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan directories (or piped stdin) for config files.
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Summarize what a config file (or piped stdin) contains.
    Explain(ExplainArgs),
    /// Generate a sample settings file at ~/.konfetti.yaml.
    Init(InitArgs),
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
    Table,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(value: CliOutputFormat) -> Self {
        match value {
            CliOutputFormat::Text => OutputFormat::Text,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Table => OutputFormat::Table,
        }
    }
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Use a named profile from ~/.konfetti.yaml.
    #[arg(long)]
    profile: Option<String>,

    /// Root path(s) to scan. Defaults to the profile path or the current directory.
    #[arg(long = "path", short = 'p', value_name = "PATH", num_args = 1.., action = ArgAction::Append)]
    paths: Vec<PathBuf>,

    /// Keep only settings whose key contains this substring.
    #[arg(long)]
    key: Option<String>,

    /// Keep only settings whose value contains this substring.
    #[arg(long)]
    value: Option<String>,

    /// Keep only files whose path contains this substring.
    #[arg(long)]
    filter: Option<String>,

    /// Output format.
    #[arg(long)]
    output: Option<CliOutputFormat>,

    /// Suppress warnings for unreadable paths.
    #[arg(long)]
    no_warn: bool,

    /// Skip entries matching this glob, by relative path or name (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", num_args = 1.., action = ArgAction::Append)]
    exclude: Vec<String>,

    /// Maximum traversal depth (root is depth 0).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Also write the full JSON scan report to this file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    /// Config file to explain. Reads piped stdin when omitted.
    file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InitArgs {
    /// Overwrite an existing settings file.
    #[arg(long, short = 'f')]
    force: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan_command(args),
        Commands::Explain(args) => run_explain_command(args),
        Commands::Init(args) => run_init_command(args),
    }
}

fn run_scan_command(args: ScanArgs) -> Result<()> {
    let settings = load_settings();
    let overrides = ScanOverrides {
        path: None,
        output: args
            .output
            .map(|format| OutputFormat::from(format).to_string()),
        no_warn: args.no_warn.then_some(true),
        filter: args.filter,
        key: args.key,
        value: args.value,
    };
    let resolved = settings.resolve(args.profile.as_deref(), &overrides)?;
    let output: OutputFormat = resolved.output.parse()?;

    let mut roots = args.paths;
    if roots.is_empty() {
        roots.extend(resolved.path);
    }

    if roots.is_empty() {
        if let Some(bytes) = read_piped_stdin()? {
            let record = scan_bytes(&bytes, &resolved.criteria);
            print!("{}", render_records(&[record], output)?);
            return Ok(());
        }
        roots = match env::current_dir() {
            Ok(cwd) => vec![cwd],
            Err(err) => {
                warn!("current directory unavailable ({err}); using default scan paths");
                default_scan_roots()
            }
        };
    }

    let options = ScanOptions {
        paths: roots,
        max_depth: args.max_depth,
        excludes: args.exclude,
        criteria: resolved.criteria,
        ..ScanOptions::default()
    };
    let report = run_scan(&options)?;

    if let Some(report_path) = &args.report {
        let payload =
            serde_json::to_string_pretty(&report).context("failed to serialize scan report")?;
        fs::write(report_path, payload)
            .with_context(|| format!("failed to write report to {}", report_path.display()))?;
    }

    println!("Matched {} config files:", report.records.len());
    if !report.errors.is_empty() && !resolved.no_warn {
        println!("Encountered the following errors while scanning:");
        for err in &report.errors {
            println!("  [WARN] {err}");
        }
    }
    if report.records.is_empty() {
        println!("No matches found.");
        return Ok(());
    }

    print!("{}", render_records(&report.records, output)?);
    Ok(())
}

fn run_explain_command(args: ExplainArgs) -> Result<()> {
    let record: NormalizedRecord = match args.file {
        Some(path) => {
            let (settings, format) = parse_file(&path);
            NormalizedRecord::new(path.to_string_lossy(), format, settings)
        }
        None => match read_piped_stdin()? {
            Some(bytes) => normalize_bytes(&bytes),
            None => {
                println!("Usage: konfetti explain <file> OR cat file | konfetti explain");
                return Ok(());
            }
        },
    };

    let explanation = explain_record(&record);
    println!("Explaining {}", explanation.origin);
    println!(
        "Format: {} | Keys detected: {}",
        explanation.format, explanation.key_count
    );
    if explanation.notes.is_empty() {
        println!("Looks like a configuration file with typical settings.");
    }
    for note in &explanation.notes {
        println!("- {note}");
    }
    Ok(())
}

fn run_init_command(args: InitArgs) -> Result<()> {
    let path = SettingsFile::default_path()?;
    write_sample_settings(&path, args.force)?;

    println!("Created sample settings file at: {}", path.display());
    println!("Edit this file to customize your default settings and profiles.");
    println!("Use: konfetti scan --profile <name> to use a profile.");
    Ok(())
}

fn load_settings() -> SettingsFile {
    match SettingsFile::load() {
        Ok(settings) => settings,
        Err(err) => {
            warn!("could not load settings file: {err}");
            SettingsFile::builtin()
        }
    }
}

/// Piped stdin contents, or `None` for a terminal or an empty pipe.
fn read_piped_stdin() -> Result<Option<Vec<u8>>> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut bytes = Vec::new();
    stdin
        .read_to_end(&mut bytes)
        .context("failed to read stdin")?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(bytes))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
