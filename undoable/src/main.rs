//! `undoable`: apply LLM-authored change sets to a project, and undo them.
//!
//! `apply` records the inverse of every mutation in `.undoable/revert.json`;
//! `revert` replays it. Results are printed one line per change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use undoable::apply::run_apply;
use undoable::core::selection::Selection;
use undoable::core::summary::BatchSummary;
use undoable::core::types::{ApplyResult, ApplyStatus};
use undoable::error::EngineError;
use undoable::exit_codes;
use undoable::io::applier::{PlannedChange, preview_change_set};
use undoable::io::change_set_store::{CHANGE_SET_SCHEMA, load_change_set};
use undoable::io::config::{ProjectConfig, load_config};
use undoable::io::init::{InitOptions, ProjectPaths, init_project};
use undoable::logging;
use undoable::revert::run_revert;

#[derive(Parser)]
#[command(
    name = "undoable",
    version,
    about = "Apply LLM-authored change sets to a project, reversibly"
)]
struct Cli {
    /// Project directory holding `.undoable/config.toml`.
    #[arg(short = 'C', long = "project", global = true, default_value = ".")]
    project: PathBuf,

    /// Debug-level tracing on stderr (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.undoable/config.toml` if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the change set JSON Schema.
    Schema,
    /// Check a change set file against the schema without applying it.
    Validate {
        /// Change set file (defaults to `apply.changes` from config).
        #[arg(long)]
        changes: Option<PathBuf>,
    },
    /// Apply a change set and record its inverse.
    Apply {
        /// Change set file (defaults to `apply.changes` from config).
        #[arg(long)]
        changes: Option<PathBuf>,
        #[command(flatten)]
        target: TargetArgs,
        /// Only report what would happen.
        #[arg(long)]
        dry_run: bool,
    },
    /// Undo the most recent apply.
    Revert {
        /// Revert only if the ledger holds this session.
        #[arg(long)]
        session: Option<String>,
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(clap::Args)]
struct TargetArgs {
    /// Directory the change paths are relative to (overrides config).
    #[arg(long = "output-dir")]
    output_dir: Option<PathBuf>,
    /// Select changes by path; repeatable. Combines with `--index`.
    #[arg(long = "only", value_name = "PATH")]
    only: Vec<String>,
    /// Select changes by zero-based position; repeatable.
    #[arg(long = "index", value_name = "N")]
    index: Vec<usize>,
    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

impl TargetArgs {
    fn selection(&self) -> Selection {
        Selection::from_filters(&self.index, &self.only)
    }

    fn output_dir(&self, project: &Path, cfg: &ProjectConfig) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| cfg.output_dir(project))
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::LedgerNotFound { .. }) => exit_codes::NOTHING_TO_REVERT,
        _ => exit_codes::INVALID,
    }
}

fn run(cli: Cli) -> Result<()> {
    let project = cli.project;
    match cli.command {
        Command::Init { force } => cmd_init(&project, force),
        Command::Schema => {
            print!("{CHANGE_SET_SCHEMA}");
            Ok(())
        }
        Command::Validate { changes } => cmd_validate(&project, changes),
        Command::Apply {
            changes,
            target,
            dry_run,
        } => cmd_apply(&project, changes, &target, dry_run),
        Command::Revert { session, target } => cmd_revert(&project, session.as_deref(), &target),
    }
}

fn cmd_init(project: &Path, force: bool) -> Result<()> {
    let paths = init_project(project, &InitOptions { force })?;
    println!("init: config={}", paths.config_path.display());
    Ok(())
}

fn project_config(project: &Path) -> Result<ProjectConfig> {
    let paths = ProjectPaths::new(project);
    load_config(&paths.config_path).context("load .undoable/config.toml")
}

fn cmd_validate(project: &Path, changes: Option<PathBuf>) -> Result<()> {
    let cfg = project_config(project)?;
    let changes_path = changes.unwrap_or_else(|| cfg.changes_path(project));
    let change_set = load_change_set(&changes_path)?;
    println!(
        "validate: {} change(s) in {}",
        change_set.len(),
        changes_path.display()
    );
    Ok(())
}

fn cmd_apply(
    project: &Path,
    changes: Option<PathBuf>,
    target: &TargetArgs,
    dry_run: bool,
) -> Result<()> {
    let cfg = project_config(project)?;
    let changes_path = changes.unwrap_or_else(|| cfg.changes_path(project));
    let output_dir = target.output_dir(project, &cfg);
    let change_set = load_change_set(&changes_path)?;
    let selection = target.selection();

    if let Some(summary) = change_set.summary.as_deref() {
        if !target.json {
            println!("summary: {summary}");
        }
    }

    if dry_run {
        let planned = preview_change_set(&output_dir, &change_set, &selection)?;
        print_plan(&planned, target.json)?;
        return Ok(());
    }

    let report = run_apply(&output_dir, &change_set, &selection)?;
    print_results(&report.results, &report.summary, target.json)?;
    if let Some(err) = report.ledger_error {
        eprintln!("revert data was not saved; undo these changes manually:");
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&report.inverse).context("serialize inverse")?
        );
        return Err(anyhow::Error::new(err).context("apply: save revert data"));
    }
    if !target.json {
        match report.session_id {
            Some(id) => println!(
                "apply: session={} revert entries={}",
                id,
                report.inverse.len()
            ),
            None => println!("apply: nothing changed; revert data left as it was"),
        }
    }
    Ok(())
}

fn cmd_revert(project: &Path, session: Option<&str>, target: &TargetArgs) -> Result<()> {
    let cfg = project_config(project)?;
    let output_dir = target.output_dir(project, &cfg);
    let report = run_revert(&output_dir, session, &target.selection())?;
    print_results(&report.results, &report.summary, target.json)?;
    if let Some(err) = report.ledger_error {
        return Err(anyhow::Error::new(err).context("revert: update revert data"));
    }
    if !target.json {
        if report.ledger_cleared() {
            println!("revert: session={} fully reverted", report.session_id);
        } else {
            println!(
                "revert: session={} {} entr(ies) still pending",
                report.session_id, report.remaining
            );
        }
    }
    Ok(())
}

fn print_results(results: &[ApplyResult], summary: &BatchSummary, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(results).context("serialize results")?
        );
        return Ok(());
    }
    for result in results {
        match &result.reason {
            Some(reason) => println!(
                "{:<8} {:<8} {} ({})",
                result.status, result.action, result.path, reason
            ),
            None => println!("{:<8} {:<8} {}", result.status, result.action, result.path),
        }
    }
    println!("result: {summary}");
    if !summary.is_clean() {
        println!("failures:");
        for result in results
            .iter()
            .filter(|r| r.status == ApplyStatus::Failure)
        {
            println!(
                "  - {}: {}",
                result.path,
                result.reason.as_deref().unwrap_or("unknown")
            );
        }
    }
    Ok(())
}

fn print_plan(planned: &[PlannedChange], json: bool) -> Result<()> {
    if json {
        let rows: Vec<serde_json::Value> = planned
            .iter()
            .map(|p| {
                serde_json::json!({
                    "index": p.index,
                    "filePath": p.path,
                    "action": p.action,
                    "selected": p.selected,
                    "exists": p.exists,
                    "violation": p.target.as_ref().err(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("serialize plan")?
        );
        return Ok(());
    }
    for p in planned {
        let marker = if p.selected { "*" } else { " " };
        match &p.target {
            Ok(target) => println!("{marker} [{}] {:<8} {}", p.index, p.action, target),
            Err(reason) => println!("{marker} [{}] {:<8} BLOCKED {}", p.index, p.action, reason),
        }
    }
    println!("dry run: no files were changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["undoable", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_apply_with_filters() {
        let cli = Cli::parse_from([
            "undoable",
            "-C",
            "proj",
            "apply",
            "--changes",
            "c.json",
            "--only",
            "a.txt",
            "--index",
            "2",
            "--dry-run",
        ]);
        assert_eq!(cli.project, PathBuf::from("proj"));
        match cli.command {
            Command::Apply {
                changes,
                target,
                dry_run,
            } => {
                assert_eq!(changes, Some(PathBuf::from("c.json")));
                assert!(dry_run);
                assert_eq!(target.only, vec!["a.txt".to_string()]);
                assert_eq!(target.index, vec![2]);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn parse_revert_defaults_to_all() {
        let cli = Cli::parse_from(["undoable", "revert"]);
        match cli.command {
            Command::Revert { session, target } => {
                assert_eq!(session, None);
                assert!(target.selection().is_all());
            }
            _ => panic!("expected revert"),
        }
    }

    #[test]
    fn ledger_not_found_maps_to_dedicated_exit_code() {
        let err = anyhow::Error::new(EngineError::LedgerNotFound {
            root: PathBuf::from("/p"),
        });
        assert_eq!(exit_code_for(&err), exit_codes::NOTHING_TO_REVERT);
        assert_eq!(
            exit_code_for(&anyhow::anyhow!("bad config")),
            exit_codes::INVALID
        );
    }
}
