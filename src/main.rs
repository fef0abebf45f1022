use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use aggloss::analysis::DistStats;
use aggloss::config::SimulationConfig;
use aggloss::report::{self, Histogram};
use aggloss::simulation::Simulation;
use aggloss::Result;

#[derive(Parser)]
#[command(name = "aggloss", version, about = "Monte Carlo aggregate annual loss simulator")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulated years
    #[arg(long)]
    trials: Option<u64>,

    /// Expected claims per year (Poisson mean)
    #[arg(long)]
    lambda: Option<f64>,

    /// Probability that a claim comes from the Gamma body rather than the Pareto tail
    #[arg(long)]
    weight: Option<f64>,

    /// VaR confidence level; repeat for several (default 0.95 and 0.99)
    #[arg(long = "confidence")]
    confidence: Vec<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Write per-trial records (simulation,num_claims,total_loss) to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Histogram bin count
    #[arg(long, default_value_t = Histogram::DEFAULT_BINS)]
    bins: usize,

    #[arg(long)]
    no_histogram: bool,

    /// Print the risk report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Only warnings and errors on stderr
    #[arg(long)]
    quiet: bool,
}

impl Cli {
    fn build_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)?,
            None => SimulationConfig::canonical(),
        };
        if let Some(n) = self.trials {
            config.trials = n;
        }
        if let Some(lambda) = self.lambda {
            config.frequency.lambda = lambda;
        }
        if let Some(w) = self.weight {
            config.severity.gamma_weight = w;
        }
        if !self.confidence.is_empty() {
            config.confidence_levels = self.confidence.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

fn init_logging(quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if quiet { "warn" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let sim = Simulation::from_config(cli.build_config()?)?;
    let dist = sim.run()?;
    let risk = sim.report(&dist)?;
    let losses = dist.losses();

    if let Some(path) = &cli.csv {
        let file = File::create(path)?;
        report::write_trials_csv(BufWriter::new(file), &dist)?;
        info!(path = %path.display(), rows = dist.len(), "per-trial records written");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&risk)?);
        return Ok(());
    }

    print!("{}", report::format_summary(&risk));
    print!("{}", report::format_stats(&DistStats::from_losses(&losses)?));

    if !cli.no_histogram
        && let Some(hist) = Histogram::from_losses(&losses, cli.bins)
    {
        println!();
        print!("{}", report::render_histogram(&hist, &risk, 50));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
