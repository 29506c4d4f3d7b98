use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use geo_metadata_harmonizer::app::{App, HarmonizeOptions, HarmonizeResult};
use geo_metadata_harmonizer::config::ConfigLoader;
use geo_metadata_harmonizer::error::HarmonizeError;
use geo_metadata_harmonizer::output::{JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "geo-mh")]
#[command(about = "Harmonize GEO series-matrix metadata into one sample-level condition table")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Harmonize one or more series-matrix files")]
    Harmonize(HarmonizeArgs),
    #[command(about = "Show the effective condition rule table")]
    Rules(RulesArgs),
}

#[derive(Args)]
struct HarmonizeArgs {
    #[arg(required = true)]
    inputs: Vec<Utf8PathBuf>,

    #[arg(long, short, default_value = "harmonized_metadata.csv")]
    output: Utf8PathBuf,

    #[arg(long)]
    diagnostics: Option<Utf8PathBuf>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    min_samples: Option<usize>,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct RulesArgs {
    #[arg(long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<HarmonizeError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarmonizeError) -> u8 {
    match error {
        HarmonizeError::ConfigRead(_)
        | HarmonizeError::ConfigParse(_)
        | HarmonizeError::EmptyRuleTable
        | HarmonizeError::InvalidRule(_) => 2,
        HarmonizeError::Write { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Harmonize(args) => run_harmonize(args, output_mode),
        Commands::Rules(args) => run_rules(args, output_mode),
    }
}

fn run_harmonize(args: HarmonizeArgs, output_mode: OutputMode) -> miette::Result<()> {
    let mut config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    if let Some(min_samples) = args.min_samples {
        config.policy.min_samples = min_samples;
    }

    let diagnostics = args
        .diagnostics
        .unwrap_or_else(|| args.output.with_extension("diagnostics.csv"));
    let options = HarmonizeOptions {
        dry_run: args.dry_run,
    };

    let app = App::new(config);
    let result = app
        .harmonize(&args.inputs, &args.output, &diagnostics, options, &JsonOutput)
        .into_diagnostic()?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_harmonize(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_harmonize_summary(&result);
            Ok(())
        }
    }
}

fn run_rules(args: RulesArgs, output_mode: OutputMode) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    let app = App::new(config);
    let result = app.rules(&JsonOutput);

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_rules(&result).into_diagnostic(),
        OutputMode::Interactive => {
            println!("rule table ({} rules, first match wins):", result.rules.len());
            for rule in &result.rules {
                println!("  {:<12} -> {}", rule.keyword, rule.label);
            }
            println!("minimum samples per study: {}", result.min_samples);
            Ok(())
        }
    }
}

fn print_harmonize_summary(result: &HarmonizeResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    let failed = result
        .studies
        .iter()
        .filter(|study| study.status == "failed")
        .count();

    println!("{cyan}GEO-MH summary{reset}");
    println!(
        "{green}harmonized studies: {}{reset}",
        result.studies.len() - failed
    );
    if failed > 0 {
        println!("{red}failed studies: {failed}{reset}");
    }

    for study in &result.studies {
        let id = study.study_id.as_deref().unwrap_or("?");
        match study.status.as_str() {
            "harmonized" => {
                println!(
                    "{green}+ {id}: {} samples ({} unknown, {} dropped){reset}",
                    study.samples, study.unknown, study.dropped
                );
            }
            _ => {
                let error = study.error.as_deref().unwrap_or("unknown error");
                println!("{red}x {id}: {error}{reset}");
            }
        }
    }

    if result.dry_run {
        println!("{yellow}dry run, nothing written{reset}");
    } else {
        println!("{cyan}table: {} ({} rows){reset}", result.table_path, result.rows_written);
        println!("{cyan}diagnostics: {}{reset}", result.diagnostics_path);
    }
}
