use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use transship_model::input::InstanceFile;
use transship_model::{
    BuildOptions, FlowSolution, MissingCostPolicy, ModelError, NodeRole, PricingRule, SolutionStatus, Solver,
    TransshipmentProblem, balance_violation,
};

mod report;

#[derive(Parser)]
#[command(name = "transship")]
#[command(about = "Minimum-cost flow through a supply/intermediate/demand network", long_about = None)]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance file and print the optimal flows
    Solve {
        /// JSON instance file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Treat arcs without a cost as free instead of rejecting the instance
        #[arg(long)]
        allow_missing_costs: bool,
        /// Run the simplex even when total supply and demand differ
        #[arg(long)]
        no_balance_check: bool,
        /// Pivot budget across both simplex phases
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Entering variable rule
        #[arg(long, value_enum, default_value_t = Pricing::Bland)]
        pricing: Pricing,
    },
    /// Check an instance file for errors
    Check {
        /// JSON instance file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Pretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum Pricing {
    Bland,
    Dantzig,
}

impl From<Pricing> for PricingRule {
    fn from(p: Pricing) -> Self {
        match p {
            Pricing::Bland => PricingRule::Bland,
            Pricing::Dantzig => PricingRule::Dantzig,
        }
    }
}

fn setup_logger(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{:5} | {} | {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

/// Read and validate an instance, exiting with status 2 on client errors
fn load_problem(file: &Path) -> TransshipmentProblem {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(2);
        }
    };

    let instance: InstanceFile = match serde_json::from_str(&source) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(2);
        }
    };

    match instance.into_problem() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid instance: {}", e);
            std::process::exit(2);
        }
    }
}

fn print_pretty(solution: &FlowSolution) {
    match solution.status {
        SolutionStatus::Optimal => {
            println!("Status: OPTIMAL");
            println!("Total cost: {:.2}", solution.total_cost.unwrap_or_default());
            println!();
            println!("Flows:");
            for f in solution.nonzero_flows() {
                println!("  {:>12} {:10.2}  (unit cost {:.2})", f.arc().to_string(), f.flow, f.cost);
            }
            println!();
            println!("Node prices:");
            for p in &solution.prices {
                println!("  {:>5} {:12} {:10.4}", p.node, p.role.to_string(), p.price);
            }
        }
        SolutionStatus::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No flow satisfies all supply, demand and balance constraints.");
            for v in &solution.violations {
                println!("  - {}", v.description);
            }
        }
        SolutionStatus::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The problem has no finite optimal solution.");
        }
        SolutionStatus::IterationLimitExceeded => {
            println!("Status: ITERATION LIMIT EXCEEDED");
            println!("Stopped after {} pivots without a verdict.", solution.iterations);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logger(cli.verbose) {
        eprintln!("Error installing logger: {}", e);
    }

    match cli.command {
        Commands::Solve {
            file,
            format,
            allow_missing_costs,
            no_balance_check,
            max_iterations,
            pricing,
        } => {
            let problem = load_problem(&file);

            let missing_cost = if allow_missing_costs {
                MissingCostPolicy::Zero
            } else {
                MissingCostPolicy::Reject
            };
            let options = BuildOptions::new()
                .with_missing_cost(missing_cost)
                .with_balance_check(!no_balance_check);

            let mut solver = Solver::new().with_pricing(pricing.into());
            if let Some(max) = max_iterations {
                solver = solver.with_max_iterations(max);
            }

            let solution = match transship_model::solve(&problem, &options, &solver) {
                Ok(s) => s,
                Err(e @ ModelError::Solver(_)) => {
                    eprintln!("Solver error: {}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Invalid instance: {}", e);
                    std::process::exit(2);
                }
            };

            match format {
                Format::Json => match serde_json::to_string_pretty(&report::Report::new(&solution)) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error writing JSON: {}", e);
                        std::process::exit(1);
                    }
                },
                Format::Pretty => print_pretty(&solution),
            }

            if !solution.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let problem = load_problem(&file);
            let counts = problem.counts();
            let missing = problem.missing_costs();

            println!("✓ {} is valid", file.display());
            println!("  {} {} nodes", counts.supply, NodeRole::Supply);
            println!("  {} {} nodes", counts.intermediate, NodeRole::Intermediate);
            println!("  {} {} nodes", counts.demand, NodeRole::Demand);
            println!("  {} arcs ({} without cost)", counts.num_arcs(), missing.len());
            println!(
                "  total supply {}, total demand {}",
                problem.total_supply(),
                problem.total_demand()
            );
            if let Some(violation) = balance_violation(&problem, &Solver::new()) {
                println!("  warning: {}; the instance will be infeasible", violation.description);
            }
        }
    }
}
