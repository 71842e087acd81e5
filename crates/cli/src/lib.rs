use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use progress::ProgressPrinter;
use serde::Serialize;
use specguard_contracts::{diff, ContractExtractor, ContractSnapshot};
use specguard_graph::{run_classification, run_prune};
use specguard_guard::{GuardContext, GuardOrchestrator};
use specguard_indexer::{read_inventory, run_inventory};
use specguard_protocol::{
    write_text_atomic, SpecguardConfig, CLASSIFICATION_MD, FINAL_SUMMARY_MD,
};
use specguard_spec::{PathNormalizer, SpecParser};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

mod progress;
mod report;

/// Exit code when configuration cannot be loaded.
const EXIT_CONFIG: i32 = 3;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    print_stdout(&serde_json::to_string_pretty(value)?)
}

#[derive(Parser)]
#[command(name = "specguard")]
#[command(about = "Spec-to-code release gate for generated web applications", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root to operate on
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (default: <root>/specguard.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Print machine-readable JSON on stdout (implies --quiet)
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the project and write inventory.json
    #[command(name = "run-inventory")]
    RunInventory,

    /// Classify every API and UI file as required or removal candidate
    #[command(name = "run-classify")]
    RunClassify,

    /// Remove files the last classification marked as candidates
    Prune(PruneArgs),

    /// Run the full guard: validate, generate, heal, verify and decide
    #[command(name = "run-guard")]
    RunGuard(GuardArgs),

    /// Capture the contract snapshot of one unit version
    #[command(name = "snapshot-contracts")]
    SnapshotContracts(SnapshotArgs),

    /// Compare two contract snapshots
    #[command(name = "run-diff-contracts")]
    RunDiffContracts(DiffArgs),

    /// Show how one specification unit parses
    #[command(name = "parse-unit")]
    ParseUnit(ParseUnitArgs),
}

#[derive(Args)]
struct GuardArgs {
    /// Re-run phases even when their reports already exist
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct PruneArgs {
    /// Delete the candidates instead of only listing them
    #[arg(long)]
    execute: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Unit version to capture (positive integer)
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    version: u32,
}

#[derive(Args)]
struct DiffArgs {
    /// Baseline unit version
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    old: u32,

    /// Candidate unit version
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    new: u32,

    /// Also write contract_diff_<old>_<new>.json into the contracts directory
    #[arg(long)]
    save: bool,
}

#[derive(Args)]
struct ParseUnitArgs {
    /// Unit document to parse
    file: PathBuf,
}

/// Everything a command handler needs besides its own arguments.
struct Session {
    root: PathBuf,
    config: SpecguardConfig,
    json: bool,
    progress: ProgressPrinter,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Invalid project root: {}", cli.root.display()))?;
    let config = match SpecguardConfig::load(&root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    let session = Session {
        root,
        config,
        json: cli.json,
        progress: ProgressPrinter::start(!cli.quiet),
    };

    let code = match cli.command {
        Commands::RunInventory => run_inventory_cmd(&session)?,
        Commands::RunClassify => run_classify(&session)?,
        Commands::Prune(args) => run_prune_cmd(&session, args)?,
        Commands::RunGuard(args) => run_guard(&session, args).await?,
        Commands::SnapshotContracts(args) => run_snapshot(&session, args)?,
        Commands::RunDiffContracts(args) => run_diff(&session, args)?,
        Commands::ParseUnit(args) => run_parse_unit(&session, args)?,
    };

    session.progress.finish().await;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn run_inventory_cmd(session: &Session) -> Result<i32> {
    let report = run_inventory(&session.root, &session.config).context("Inventory failed")?;
    if session.json {
        print_json(&report.counts)?;
    } else {
        let c = &report.counts;
        print_stdout(&format!(
            "Inventory: {} api, {} ui, {} component, {} other, {} tests",
            c.api, c.ui, c.component, c.other, c.tests
        ))?;
    }
    Ok(0)
}

fn run_classify(session: &Session) -> Result<i32> {
    let inventory = read_inventory(&session.root, &session.config)?;
    let outcome = run_classification(
        &session.root,
        &session.config,
        &inventory,
        session.progress.sender(),
    )
    .context("Classification failed")?;

    let report = &outcome.classification;
    let md_path = session.config.report_path(&session.root, CLASSIFICATION_MD);
    write_text_atomic(&md_path, &report::render_classification_md(report))?;
    log::info!("Classification report written to {}", md_path.display());

    if session.json {
        print_json(&report.stats)?;
    } else {
        print_stdout(&report::render_classification_summary(report))?;
    }
    Ok(0)
}

fn run_prune_cmd(session: &Session, args: PruneArgs) -> Result<i32> {
    let summary =
        run_prune(&session.root, &session.config, args.execute).context("Prune failed")?;
    if session.json {
        print_json(&summary)?;
    } else {
        print_stdout(&report::render_prune_summary(&summary))?;
    }
    Ok(if summary.failed.is_empty() { 0 } else { 1 })
}

async fn run_guard(session: &Session, args: GuardArgs) -> Result<i32> {
    let mut ctx = GuardContext::new(&session.root, session.config.clone()).with_force(args.force);
    if let Some(tx) = session.progress.sender() {
        ctx = ctx.with_progress(tx.clone());
    }

    let report = match GuardOrchestrator::new(ctx).run().await {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Error: {err}");
            return Ok(i32::from(err.exit_code()));
        }
    };

    let summary = report::render_final_summary(&report);
    let path = session.config.report_path(&session.root, FINAL_SUMMARY_MD);
    write_text_atomic(&path, &summary)?;

    if session.json {
        print_json(&report)?;
    } else {
        print_stdout(&summary)?;
    }
    Ok(i32::from(report.exit_code()))
}

fn run_snapshot(session: &Session, args: SnapshotArgs) -> Result<i32> {
    let extractor = ContractExtractor::new(&session.config)?;
    let snapshot = extractor
        .capture(&session.root, args.version)
        .with_context(|| format!("Failed to capture contracts for unit {}", args.version))?;
    let path = snapshot.save(&session.config.contracts_dir(&session.root))?;

    if session.json {
        print_json(&snapshot)?;
    } else {
        print_stdout(&format!(
            "Unit {} snapshot: {} APIs, {} types, {} components -> {}",
            snapshot.unit_version,
            snapshot.apis.len(),
            snapshot.types.len(),
            snapshot.components.len(),
            path.display()
        ))?;
    }
    Ok(0)
}

fn run_diff(session: &Session, args: DiffArgs) -> Result<i32> {
    let dir = session.config.contracts_dir(&session.root);
    let old = ContractSnapshot::load(&dir, args.old)?;
    let new = ContractSnapshot::load(&dir, args.new)?;
    let result = diff(&old, &new);

    if args.save {
        let path = result.save(&dir)?;
        log::info!("Contract diff written to {}", path.display());
    }
    if session.json {
        print_json(&result)?;
    } else {
        print_stdout(&report::render_diff(&result))?;
    }
    Ok(i32::from(result.status.exit_code()))
}

fn run_parse_unit(session: &Session, args: ParseUnitArgs) -> Result<i32> {
    let path = resolve(&session.root, &args.file);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Unit not found: {}", path.display()))?;
    let normalizer = PathNormalizer::from_workspace(&session.config.workspace)?;
    let parsed = SpecParser::new(normalizer)?.parse(&text);
    for warning in &parsed.warnings {
        log::warn!("{}: {warning}", path.display());
    }

    if session.json {
        print_json(&parsed)?;
    } else {
        print_stdout(&report::render_parsed_unit(&parsed))?;
    }
    Ok(0)
}

/// Relative paths are taken from the working directory when they exist
/// there, otherwise from the project root.
fn resolve(root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() || file.exists() {
        file.to_path_buf()
    } else {
        root.join(file)
    }
}
