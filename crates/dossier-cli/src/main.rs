//! `dossier` - replay case-file submissions against an in-memory store

mod fixture;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dossier_core::{BatchReport, DossierEngine, EngineConfig, ItemStatus, RequirementCatalog};
use dossier_store::MemoryStore;
use fixture::CaseFixture;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("dossier")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Document classification and completion engine for lease case files")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("replay")
                .about("Seed a fixture into a fresh store and apply its submission")
                .arg(
                    Arg::new("fixture")
                        .long("fixture")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON fixture: holder graph plus items"),
                )
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML requirement catalog"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML engine configuration"),
                )
                .arg(
                    Arg::new("times")
                        .long("times")
                        .default_value("1")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Submit the same batch this many times"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print reports as JSON"),
                ),
        )
        .subcommand(
            Command::new("check-catalog")
                .about("Validate a requirement catalog")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML requirement catalog"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let outcome = match matches.subcommand() {
        Some(("replay", args)) => replay(args),
        Some(("check-catalog", args)) => check_catalog(args),
        _ => Ok(true),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when a submission failed as a whole
fn replay(args: &ArgMatches) -> Result<bool> {
    let fixture_path = args.get_one::<PathBuf>("fixture").context("--fixture is required")?;
    let catalog_path = args.get_one::<PathBuf>("catalog").context("--catalog is required")?;
    let times = args.get_one::<u32>("times").copied().unwrap_or(1);
    let json = args.get_flag("json");

    let fixture = CaseFixture::from_path(fixture_path)?;
    let catalog = RequirementCatalog::from_path(catalog_path)?;
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let store = Arc::new(MemoryStore::new());
    let refs = fixture.seed(&store)?;
    let engine = DossierEngine::with_config(Arc::clone(&store), catalog, config)?;

    let mut reports = Vec::new();
    for round in 1..=times {
        match engine.apply_batch(&refs, &fixture.items) {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!(round, error = %err, "submission failed");
                eprintln!("round {round}: {err}");
                return Ok(false);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (round, report) in reports.iter().enumerate() {
            print_report(round + 1, report);
        }
        println!("Stored documents: {}", store.all_documents().len());
    }
    Ok(true)
}

fn print_report(round: usize, report: &BatchReport) {
    let short = report.fingerprint.get(..16).unwrap_or(&report.fingerprint);
    println!("Round {round} (fingerprint {short}, replays {})", report.replay_count);
    for outcome in &report.outcomes {
        let status = match outcome.status {
            ItemStatus::Created => "created",
            ItemStatus::Updated => "updated",
            ItemStatus::Failed => "FAILED ",
        };
        match &outcome.error {
            Some(error) => println!("  [{}] {status} {:<24} {error}", outcome.index, outcome.kind),
            None => println!(
                "  [{}] {status} {:<24} -> {}",
                outcome.index, outcome.kind, outcome.target_description
            ),
        }
    }
    for update in &report.statuses {
        println!(
            "  {} : {} -> {} ({}/{})",
            update.subject, update.previous, update.current, update.satisfied, update.total
        );
    }
    println!(
        "  created {}, updated {}, failed {}",
        report.created(),
        report.updated(),
        report.failed()
    );
    println!();
}

fn check_catalog(args: &ArgMatches) -> Result<bool> {
    let path = args.get_one::<PathBuf>("path").context("catalog path is required")?;
    match RequirementCatalog::from_path(path) {
        Ok(catalog) => {
            println!(
                "{}: ok ({} holder checklists, {} property requirements)",
                path.display(),
                catalog.holders.len(),
                catalog.property.fields.len() + catalog.property.documents.len()
            );
            Ok(true)
        }
        Err(err) => {
            println!("{}: {err}", path.display());
            Ok(false)
        }
    }
}
