//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::control;
use thiserror::Error;

use shipcheck::audit::walker::WalkSettings;
use shipcheck::audit::{self, AuditRequest, census, classes, deps};
use shipcheck::core::config::Config;
use shipcheck::report::jsonl::FindingsLog;
use shipcheck::report::text;

/// shipcheck — audits a built package for duplicate dependencies,
/// duplicate bundled classes, and code size.
#[derive(Debug, Parser)]
#[command(
    name = "shipcheck",
    author,
    version,
    about = "Pre-ship package auditor",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity (per-file census findings).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (findings log only, no text report).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the full audit: dependencies, duplicate classes, census.
    Check(CheckArgs),
    /// Scan one library directory for duplicate class entries.
    Classes(ClassesArgs),
    /// Group a resolved dependency list by artifact id.
    Deps(DepsArgs),
    /// Count real/filler lines over source and resource roots.
    Census(CensusArgs),
    /// View and validate configuration state.
    Config(ConfigArgs),
    /// Show version and optional build metadata.
    Version(VersionArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct CheckArgs {
    /// Project base directory (defaults to the current directory).
    #[arg(value_name = "DIR")]
    base_dir: Option<PathBuf>,
    /// Pre-resolved dependency list (JSON array of records).
    #[arg(long, value_name = "FILE")]
    deps: Option<PathBuf>,
    /// Library directory override (defaults to audit.lib_dir).
    #[arg(long, value_name = "DIR")]
    lib_dir: Option<PathBuf>,
    /// Skip every check (same as audit.skip / SHC_AUDIT_SKIP).
    #[arg(long)]
    skip: bool,
}

#[derive(Debug, Clone, Args)]
struct ClassesArgs {
    /// Directory holding the packaged archives.
    #[arg(value_name = "LIB_DIR")]
    lib_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct DepsArgs {
    /// Pre-resolved dependency list (JSON array of records).
    #[arg(value_name = "FILE")]
    input: PathBuf,
    /// Use base versions for identity lines.
    #[arg(long)]
    use_base_version: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct CensusArgs {
    /// Roots to census (falls back to the configured roots).
    #[arg(value_name = "DIR")]
    roots: Vec<PathBuf>,
    /// Base directory for display-path stripping and relative roots.
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args, Default)]
struct VersionArgs {
    /// Include additional build metadata fields.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Check(args) => run_check(cli, args),
        Command::Classes(args) => run_classes(cli, args),
        Command::Deps(args) => run_deps(cli, args),
        Command::Census(args) => run_census(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Version(args) => emit_version(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref()).map_err(|e| CliError::Runtime(e.to_string()))
}

fn run_check(cli: &Cli, args: &CheckArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;
    if args.skip {
        config.audit.skip = true;
    }

    let base_dir = args
        .base_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let request = AuditRequest {
        base_dir,
        deps_input: args.deps.clone(),
        lib_dir: args.lib_dir.clone(),
        verbose: cli.verbose,
    };

    let mut findings = FindingsLog::open(&config.paths.findings_log);
    let outcome = audit::run(&config, &request, &mut findings)
        .map_err(|e| CliError::Runtime(format!("duplicate or census check failed: {e}")))?;
    findings.flush();

    match output_mode(cli) {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputMode::Human => {
            if !cli.quiet {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                text::render(&outcome, config.audit.use_base_version, &mut out)?;
                out.flush()?;
            }
        }
    }
    Ok(())
}

fn run_classes(cli: &Cli, args: &ClassesArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut findings = FindingsLog::open(&config.paths.findings_log);
    let report = classes::scan_library(&args.lib_dir, config.scanner.parallelism, &mut findings)
        .map_err(|e| CliError::Runtime(format!("duplicate class check failed: {e}")))?;
    findings.flush();

    match output_mode(cli) {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputMode::Human => {
            if !cli.quiet {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                text::render_classes(&report, &mut out)?;
                out.flush()?;
            }
        }
    }
    Ok(())
}

fn run_deps(cli: &Cli, args: &DepsArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let use_base_version = args.use_base_version || config.audit.use_base_version;

    let records = deps::load_records(&args.input).map_err(|e| CliError::User(e.to_string()))?;
    let report = deps::DuplicateDependencyReport::group_by_artifact(&records);

    match output_mode(cli) {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputMode::Human => {
            if !cli.quiet {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                text::render_dependencies(&report, use_base_version, &mut out)?;
                out.flush()?;
            }
        }
    }
    Ok(())
}

fn run_census(cli: &Cli, args: &CensusArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let base_dir = args
        .base_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let roots = if args.roots.is_empty() {
        config.census.roots()
    } else {
        args.roots.clone()
    };

    let settings = WalkSettings::from_config(&config.scanner, config.census.suffix_set());
    let mut findings = FindingsLog::open(&config.paths.findings_log);
    let report = census::run_census(&roots, &base_dir, &settings, &mut findings, cli.verbose)
        .map_err(|e| CliError::Runtime(format!("unable to count lines of code: {e}")))?;
    findings.flush();

    match output_mode(cli) {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputMode::Human => {
            if !cli.quiet {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                text::render_census(&report, &mut out)?;
                out.flush()?;
            }
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command.as_ref().unwrap_or(&ConfigCommand::Show) {
        ConfigCommand::Path => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(cli)?;
            match output_mode(cli) {
                OutputMode::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                OutputMode::Human => {
                    let rendered = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(e.to_string()))?;
                    print!("{rendered}");
                }
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            let config = load_config(cli)?;
            println!("configuration ok: {}", config.paths.config_file.display());
            Ok(())
        }
    }
}

fn emit_version(cli: &Cli, args: &VersionArgs) -> Result<(), CliError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    match output_mode(cli) {
        OutputMode::Json => {
            let payload = serde_json::json!({
                "name": name,
                "version": version,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputMode::Human => {
            if args.verbose {
                println!("{name} {version} (edition 2024)");
            } else {
                println!("{name} {version}");
            }
        }
    }
    Ok(())
}
