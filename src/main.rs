use anyhow::{bail, Context, Result};
use clap::Parser;
use dj_oracle::core::{DEFAULT_MAX_QUBITS, DEFAULT_REGISTER_SIZE};
use dj_oracle::{default_suite, telemetry, Harness, Simulator, SimulatorConfig};
use std::process::ExitCode;
use tracing::info;

/// Runs the Deutsch-Jozsa suite against the stock oracles and reports
/// per-case pass/fail. Exits 0 when every case passes, 1 otherwise.
#[derive(Parser, Debug)]
#[command(name = "dj-suite", version, about)]
struct Cli {
    /// Width of the input register for every case
    #[arg(short, long, default_value_t = DEFAULT_REGISTER_SIZE)]
    qubits: usize,

    /// Cap on simultaneously live qubits in the simulator (clamped to 30)
    #[arg(long, default_value_t = DEFAULT_MAX_QUBITS)]
    max_qubits: usize,

    /// Seed for measurement randomness; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter directive, e.g. `debug` or `dj_oracle=trace`; falls back to RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(cli.log_level.as_deref());

    if cli.qubits == 0 {
        bail!("--qubits must be at least 1");
    }

    let mut config = SimulatorConfig::new().with_max_qubits(cli.max_qubits);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    info!(qubits = cli.qubits, max_qubits = cli.max_qubits, seed = ?cli.seed, "starting suite");

    let cases = default_suite(cli.qubits).context("building the default suite")?;
    let mut simulator = Simulator::with_config(config);
    let report = Harness::new(&mut simulator)
        .run_suite(&cases)
        .context("suite aborted on an invariant violation")?;

    println!("{}", report);
    Ok(ExitCode::from(report.exit_code()))
}
