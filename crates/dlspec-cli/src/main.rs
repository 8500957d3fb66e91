use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dlspec::{
    export_to_string, parse_multi_api_level, parse_multi_api_level_path, CompilationKind,
    MachineSpecification, MultiApiLevelSpecification, Origin, RuleCategory, SymbolTable,
};
use dlspec_config::{load_for_dir, DlspecConfig};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "dlspec",
    version,
    about = "Desugared library specification tools (resolve, canonicalize, check)"
)]
struct Cli {
    /// Path to a `dlspec.toml` (defaults to discovery in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the rules that apply to one compilation and count them per category
    Resolve(ResolveArgs),
    /// Re-export a specification document in canonical form
    Canonicalize(CanonicalizeArgs),
    /// Validate a document at every range boundary for both compilation kinds
    Check(CheckArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// Specification document
    file: PathBuf,
    /// Minimum API level of the compilation
    #[arg(long)]
    min_api: Option<u32>,
    /// Resolve for compiling the desugared library itself
    #[arg(long)]
    library: bool,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CanonicalizeArgs {
    /// Specification document
    file: PathBuf,
    /// Write the result here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Pretty-print the document
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Specification document
    file: PathBuf,
}

#[derive(Serialize)]
struct ResolveReport {
    identifier: String,
    min_api_level: u32,
    compilation: String,
    required_compilation_api_level: u32,
    categories: Vec<CategoryCount>,
}

#[derive(Serialize)]
struct CategoryCount {
    category: &'static str,
    entries: usize,
}

#[derive(Serialize)]
struct CheckReport {
    ranges: usize,
    resolutions: usize,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    dlspec_config::init_tracing(&config.logging);

    match cli.command {
        Command::Resolve(args) => {
            let min_api_level = args.min_api.unwrap_or(config.specification.min_api_level);
            let compilation = if args.library {
                CompilationKind::Library
            } else {
                config.specification.compilation_kind()
            };
            let mut table = SymbolTable::new();
            let specification =
                dlspec::parse_path(&mut table, &args.file, min_api_level, compilation)?;
            let report = resolve_report(&specification, min_api_level);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_resolve_report(&report);
            }
            Ok(0)
        }
        Command::Canonicalize(args) => {
            let mut table = SymbolTable::new();
            let specification = parse_multi_api_level_path(&mut table, &args.file)?;
            let pretty = args.pretty || config.specification.pretty;
            let mut rendered = export_to_string(&table, &specification, pretty)?;
            rendered.push('\n');
            match args.output {
                Some(output) => {
                    std::fs::write(&output, rendered)
                        .with_context(|| format!("failed to write {}", output.display()))?;
                    tracing::info!(
                        target: "dlspec.cli",
                        output = %output.display(),
                        "wrote canonical specification"
                    );
                }
                None => print!("{rendered}"),
            }
            Ok(0)
        }
        Command::Check(args) => {
            let report = check(&args.file)?;
            println!(
                "ok: {} ranges, {} resolutions",
                report.ranges, report.resolutions
            );
            Ok(0)
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<DlspecConfig> {
    Ok(match explicit {
        Some(path) => DlspecConfig::load_from_path(path)?,
        None => {
            let cwd = std::env::current_dir().context("failed to determine current directory")?;
            load_for_dir(&cwd)?.0
        }
    })
}

fn resolve_report(specification: &MachineSpecification, min_api_level: u32) -> ResolveReport {
    let flags = specification.rewriting_flags();
    ResolveReport {
        identifier: specification.identifier().to_string(),
        min_api_level,
        compilation: specification.compilation_kind().to_string(),
        required_compilation_api_level: specification.required_compilation_api_level(),
        categories: RuleCategory::ALL
            .into_iter()
            .map(|category| CategoryCount {
                category: category.key(),
                entries: flags.len(category),
            })
            .filter(|count| count.entries > 0)
            .collect(),
    }
}

fn print_resolve_report(report: &ResolveReport) {
    println!(
        "resolved: {} ({}, min API {})",
        report.identifier, report.compilation, report.min_api_level
    );
    if report.categories.is_empty() {
        println!("  no rules apply");
    }
    for count in &report.categories {
        println!("  {}: {}", count.category, count.entries);
    }
}

/// API levels where the set of matching ranges can change.
fn boundary_levels(specification: &MultiApiLevelSpecification) -> BTreeSet<u32> {
    let mut levels = BTreeSet::from([1]);
    for range in specification.ranges() {
        let max = range.api_level_below_or_equal();
        levels.insert(max);
        levels.insert(max.saturating_add(1));
        if let Some(min) = range.api_level_greater_or_equal() {
            levels.insert(min);
            levels.insert(min.saturating_sub(1));
        }
    }
    levels
}

fn check(path: &Path) -> Result<CheckReport> {
    let mut table = SymbolTable::new();
    let specification = parse_multi_api_level_path(&mut table, path)?;

    let mut resolutions = 0;
    for level in boundary_levels(&specification) {
        for compilation in [CompilationKind::Program, CompilationKind::Library] {
            specification
                .resolve(&table, level, compilation)
                .with_context(|| format!("resolving at API level {level} for {compilation}"))?;
            resolutions += 1;
        }
    }

    let canonical = export_to_string(&table, &specification, false)?;
    let reparsed = parse_multi_api_level(&mut table, &canonical, Origin::named("canonical form"))?;
    anyhow::ensure!(
        reparsed == specification,
        "{} does not survive a canonical round trip",
        path.display()
    );

    Ok(CheckReport {
        ranges: specification.ranges().len(),
        resolutions,
    })
}
