use clap::Parser;
use proxy_sieve::{
    engine::controller::{DEFAULT_INPUT, DEFAULT_PRECHECK_TIMEOUT_SECS},
    engine::report::DEFAULT_PROGRESS_EVERY,
    engine::store::{DEFAULT_JSON_OUTPUT, DEFAULT_PLAIN_OUTPUT},
    proxy::checker::{
        DEFAULT_CONCURRENCY, DEFAULT_CONSISTENCY_URL, DEFAULT_LIVENESS_URL, DEFAULT_PAUSE_MS,
        DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    },
    CheckerConfig, Endpoint, OutputPaths, Result, RunConfig, RunController,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Validate HTTP proxies with one liveness probe and two consistency probes
#[derive(Parser)]
#[command(name = "proxy-sieve")]
#[command(about = "Validate HTTP proxies with one liveness probe and two consistency probes")]
struct Cli {
    /// Input file with one host:port per line
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output file for accepted proxies (host:port per line)
    #[arg(short, long, default_value = DEFAULT_PLAIN_OUTPUT)]
    output: PathBuf,

    /// Output file for accepted proxies with latency details
    #[arg(long, default_value = DEFAULT_JSON_OUTPUT)]
    json_output: PathBuf,

    /// Number of concurrent validations
    #[arg(short = 'n', long, default_value_t = DEFAULT_CONCURRENCY)]
    threads: usize,

    /// Timeout per probe in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Pause between the two consistency probes in milliseconds
    #[arg(long, default_value_t = DEFAULT_PAUSE_MS)]
    pause_ms: u64,

    /// Liveness endpoint, probed once
    #[arg(long, default_value = DEFAULT_LIVENESS_URL)]
    liveness_url: String,

    /// Consistency endpoint, probed twice with redirects disabled
    #[arg(long, default_value = DEFAULT_CONSISTENCY_URL)]
    consistency_url: String,

    /// User-Agent header sent with every probe
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Skip the direct endpoint reachability check
    #[arg(long)]
    skip_precheck: bool,

    /// Print a progress line every N checked proxies
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    progress_every: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "proxy_sieve=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let timeout = Duration::from_secs(cli.timeout);
    let checker = CheckerConfig::new()
        .with_concurrency(cli.threads)
        .with_pause(Duration::from_millis(cli.pause_ms))
        .with_user_agent(cli.user_agent)
        .with_liveness(Endpoint::liveness().with_url(cli.liveness_url))
        .with_consistency(Endpoint::consistency().with_url(cli.consistency_url))
        .with_timeout(timeout);

    let precheck =
        (!cli.skip_precheck).then(|| Duration::from_secs(DEFAULT_PRECHECK_TIMEOUT_SECS));
    let config = RunConfig::new()
        .with_input(cli.input)
        .with_checker(checker)
        .with_outputs(OutputPaths::new(cli.output, cli.json_output))
        .with_precheck_timeout(precheck)
        .with_progress_every(cli.progress_every);

    let outcome = RunController::new(config).execute().await?;
    if let Some(outcome) = outcome.filter(|o| !o.is_interrupted()) {
        println!("\nDone: {} proxies passed all probes", outcome.summary().passed);
    }

    Ok(())
}
