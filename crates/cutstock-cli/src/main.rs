use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use cutstock_core::{ColumnGenerationConfig, ColumnGenerationOutcome, CuttingPlan, ProblemData};
use log::{LevelFilter, info};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "cutstock")]
#[command(about = "Minimum-roll cutting plans by column generation", long_about = None)]
struct Cli {
    /// Input file: stock length, [part lengths], [demands]
    file: PathBuf,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// LP/MIP backend
    #[arg(short, long, default_value = "simplex")]
    backend: String,
    /// Stop once the reduced cost is above -TOLERANCE
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f64,
    /// Give up after this many column-generation iterations
    #[arg(long, default_value_t = 1000)]
    max_iterations: usize,
    /// Keep patterns that pricing rediscovers
    #[arg(long)]
    no_dedup: bool,
    /// Time budget for column generation, in seconds
    #[arg(long, value_parser = parse_seconds)]
    time_limit: Option<Duration>,
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{}", e))
}

impl Cli {
    fn config(&self) -> ColumnGenerationConfig {
        let mut config = ColumnGenerationConfig::new()
            .with_tolerance(self.tolerance)
            .with_max_iterations(self.max_iterations)
            .with_dedup_patterns(!self.no_dedup);
        if let Some(limit) = self.time_limit {
            config = config.with_time_limit(limit);
        }
        config
    }
}

#[derive(Serialize)]
struct Report<'a> {
    data: &'a ProblemData,
    column_generation: &'a ColumnGenerationOutcome,
    plan: &'a CuttingPlan,
    elapsed_seconds: f64,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let mut builder = env_logger::Builder::from_default_env();
    if verbose > 0 || std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level);
    }
    builder.init();
}

fn print_data(data: &ProblemData) {
    println!("material len is {}", data.stock_length());
    println!("part len is {:?}", data.part_lengths());
    println!("part demand is {:?}", data.demands());
}

fn print_plan(data: &ProblemData, outcome: &ColumnGenerationOutcome, plan: &CuttingPlan) {
    println!(
        "column generation: {} iterations, {} patterns ({} generated)",
        outcome.iterations,
        data.patterns().len(),
        outcome.patterns_added
    );
    if let Some(relaxed) = outcome.final_relaxation_value() {
        println!("relax value is {:.5}", relaxed);
    }
    println!("used roll num is {}", plan.total_rolls);
    println!("plan is:");
    for entry in &plan.entries {
        let cuts: Vec<String> = entry
            .pattern
            .iter()
            .map(|(part, count)| format!("{}*{}", data.part_lengths()[part], count))
            .collect();
        println!("{} {}", cuts.join(" "), entry.rolls);
    }
    println!("utilization is {:.2}%", plan.utilization * 100.0);
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    let mut data = match cutstock_core::parse_problem(&source) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let backend = match cutstock_solver::create_backend(&cli.backend) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    info!("using {} backend", backend.name());

    if cli.format == Format::Text {
        print_data(&data);
    }

    let start = Instant::now();
    let solved = match cutstock_core::solve(&mut data, backend.as_ref(), &cli.config()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed().as_secs_f64();

    match cli.format {
        Format::Text => {
            print_plan(&data, &solved.column_generation, &solved.plan);
            println!("time used is {:.5} s", elapsed);
        }
        Format::Json => {
            let report = Report {
                data: &data,
                column_generation: &solved.column_generation,
                plan: &solved.plan,
                elapsed_seconds: elapsed,
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing report: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
