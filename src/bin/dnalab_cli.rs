use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use dnalab::{
    config::LabParameters,
    protocol::{Formula, SolveReport},
    satisfiability::{SatInstance, solve_formula},
    test_tube::TestTube,
};
use env_logger::Env;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dnalab_cli")]
#[command(about = "Solve 3-SAT formulas in a simulated DNA computing lab", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version and build information
    #[arg(short = 'V', long, action = ArgAction::SetTrue)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a formula, run the lab protocol and print the assignments
    Solve(SolveArgs),
    /// Print the supported tube operations as JSON
    Capabilities,
    /// Print the default lab parameters as JSON, or write them to a file
    DefaultConfig {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SolveArgs {
    /// Formula JSON file: {"variables": [...], "clauses": [["x", "y'"], ...]}
    #[arg(short, long, conflicts_with = "clauses")]
    formula: Option<PathBuf>,

    /// Inline clauses, e.g. "x,y,z; x',y"
    #[arg(long)]
    clauses: Option<String>,

    /// Variable order of the encoded graph (comma-separated)
    #[arg(long, value_delimiter = ',')]
    variables: Vec<String>,

    /// Lab parameter JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Copies of every seed strand (overrides the config file)
    #[arg(long)]
    copies: Option<usize>,

    /// PCR cycles (overrides the config file)
    #[arg(long)]
    pcr_cycles: Option<usize>,

    /// Print the solve report as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Write the satisfying assignments to a CSV file
    #[arg(long, value_name = "CSV")]
    csv: Option<PathBuf>,

    /// Render every surviving strand as a duplex
    #[arg(long, action = ArgAction::SetTrue)]
    show_tube: bool,

    /// Print vertex and edge sequences
    #[arg(long, action = ArgAction::SetTrue)]
    show_sequences: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

fn load_formula(args: &SolveArgs) -> Result<Formula> {
    let mut formula = match (&args.formula, &args.clauses) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read formula file '{}'", path.display()))?;
            Formula::from_json_str(&text).map_err(anyhow::Error::msg)?
        }
        (None, Some(clauses)) => Formula::parse_clauses(clauses).map_err(anyhow::Error::msg)?,
        (None, None) => bail!("Either --formula or --clauses is required"),
    };
    if !args.variables.is_empty() {
        formula = formula.with_variables(
            args.variables
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        );
    }
    Ok(formula)
}

fn load_parameters(args: &SolveArgs) -> Result<LabParameters> {
    let mut params = match &args.config {
        Some(path) => LabParameters::load_from_path(&path.to_string_lossy())?,
        None => LabParameters::default(),
    };
    if let Some(seed) = args.seed {
        params.seed = Some(seed);
    }
    if let Some(copies) = args.copies {
        params.copies = copies;
    }
    if let Some(cycles) = args.pcr_cycles {
        params.pcr_cycles = cycles;
    }
    Ok(params)
}

fn write_csv(path: &Path, variables: &[String], report: &SolveReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Could not create CSV file '{}'", path.display()))?;
    writer.write_record(variables)?;
    for assignment in &report.assignments {
        let row = variables
            .iter()
            .map(|v| match assignment.get(v) {
                Some(value) => value.to_string(),
                None => String::new(),
            })
            .collect::<Vec<_>>();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_sequences(report: &SolveReport) {
    for entry in &report.vertex_sequences {
        println!("{} {}", entry.name, entry.sequence);
    }
    println!();
    for edge in &report.edge_sequences {
        println!("{} ({}, {})", edge.sequence, edge.from, edge.to);
    }
    println!();
}

fn solve(args: SolveArgs) -> Result<()> {
    let formula = load_formula(&args)?;
    let params = load_parameters(&args)?;
    let variables = SatInstance::new(formula.clone())?.variables().to_vec();
    let run = solve_formula(&formula, &params).context("Solve failed")?;
    let report = &run.report;

    if let Some(path) = &args.csv {
        write_csv(path, &variables, report)?;
        log::info!("Wrote {} assignments to '{}'", report.assignments.len(), path.display());
    }
    if args.json {
        return print_json(report);
    }
    if args.show_sequences {
        print_sequences(report);
    }
    if args.show_tube {
        print!("{}", run.tube);
    }
    for assignment in &report.assignments {
        println!("{assignment}");
    }
    if !report.is_satisfiable() {
        println!("No satisfying assignment found");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if cli.version {
        println!("{}", dnalab::version_cli_text());
        return Ok(());
    }
    match cli.command {
        Some(Commands::Solve(args)) => solve(args),
        Some(Commands::Capabilities) => print_json(&TestTube::capabilities()),
        Some(Commands::DefaultConfig { output: Some(path) }) => {
            LabParameters::default().save_to_path(&path.to_string_lossy())?;
            println!("Wrote default parameters to '{}'", path.display());
            Ok(())
        }
        Some(Commands::DefaultConfig { output: None }) => print_json(&LabParameters::default()),
        None => bail!("Missing command, see --help"),
    }
}
