use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use loadtrend_core::{lite_path, JobTrendConfig, LoadtrendConfig, LoggingConfig, StatisticKind};
use loadtrend_service::{metrics, FsBuildHistory, RefreshOutcome, TrendRefresher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "loadtrend")]
#[command(about = "Load-test trend graphs from archived XML reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Service configuration file, used instead of the layered lookup
    /// (`LOADTREND_CONFIG`, ./config, /etc and `LOADTREND__*` overrides)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild a job's trend images from its build history
    Refresh {
        /// Job directory containing builds/<number>/archive
        #[arg(long)]
        job_dir: PathBuf,

        /// Job trend configuration (YAML, TOML or JSON)
        #[arg(long)]
        job_config: Option<PathBuf>,

        /// Directory the images are written to (default: <job-dir>/trends)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Lock key identifying the job (default: the job directory)
        #[arg(long)]
        key: Option<String>,

        /// Print Prometheus metrics after the refresh
        #[arg(long)]
        metrics: bool,
    },

    /// Print the queries a custom graph curve expands to
    Queries {
        /// Statistic plotted by the graph: average, percentile, error or value
        #[arg(long, default_value = "value")]
        statistic: StatisticKind,

        /// Lite paths such as `UserPath>Actions>Login` or `host/Counter`
        #[arg(required = true)]
        lite_paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => LoadtrendConfig::from_file(path)?,
        None => LoadtrendConfig::load()?,
    };
    init_logging(&config.logging);

    match args.command {
        Command::Refresh {
            job_dir,
            job_config,
            output,
            key,
            metrics: print_metrics,
        } => {
            let job = match job_config {
                Some(path) => JobTrendConfig::from_file(path)?,
                None => JobTrendConfig::default(),
            };
            let output = output.unwrap_or_else(|| job_dir.join("trends"));
            let key = key.unwrap_or_else(|| job_dir.display().to_string());

            info!("Job: {}", job_dir.display());
            info!("Output: {}", output.display());

            let result = refresh(&config, key, job, job_dir, output).await;
            if print_metrics {
                print!("{}", metrics::export_prometheus());
            }
            result
        }
        Command::Queries {
            statistic,
            lite_paths,
        } => {
            for path in &lite_paths {
                println!("{path}");
                for query in lite_path::expand(path, statistic) {
                    println!("  {query}");
                }
            }
            Ok(())
        }
    }
}

async fn refresh(
    config: &LoadtrendConfig,
    key: String,
    job: JobTrendConfig,
    job_dir: PathBuf,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Refreshing trends...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let refresher = Arc::new(TrendRefresher::new(config));
    let history = Arc::new(FsBuildHistory::new(job_dir));
    let outcome = refresher
        .spawn_refresh(key, job, history, output)
        .await?;
    pb.finish_and_clear();

    match outcome {
        RefreshOutcome::Completed { charts } => {
            println!("\n✅ Trends refreshed!");
            if charts.is_empty() {
                println!("  No build has report data yet; no images written");
            }
            for chart in &charts {
                println!(
                    "  {} ({}x{}, {} points)",
                    chart.path.display(),
                    chart.width,
                    chart.height,
                    chart.plotted_points
                );
            }
            Ok(())
        }
        RefreshOutcome::AlreadyRunning => {
            println!("\nA refresh of this job is already running");
            Ok(())
        }
        RefreshOutcome::Abandoned { reason } => {
            eprintln!("\n❌ Refresh abandoned: {}", reason);
            Err(reason.into())
        }
    }
}

/// Initialize logging; `RUST_LOG` overrides the configured level
fn init_logging(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = fmt().with_env_filter(env_filter).with_target(false);
    if logging.format == "compact" {
        builder.compact().init();
    } else {
        builder.pretty().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_refresh() {
        let cli = Cli::try_parse_from([
            "loadtrend",
            "refresh",
            "--job-dir",
            "/jobs/nightly",
            "--key",
            "nightly",
        ])
        .unwrap();

        match cli.command {
            Command::Refresh {
                job_dir,
                output,
                key,
                metrics,
                ..
            } => {
                assert_eq!(job_dir, PathBuf::from("/jobs/nightly"));
                assert_eq!(output, None);
                assert_eq!(key.as_deref(), Some("nightly"));
                assert!(!metrics);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_queries() {
        let cli = Cli::try_parse_from([
            "loadtrend",
            "queries",
            "--statistic",
            "avg",
            "UserPath>Login",
            "lg1/CPU",
        ])
        .unwrap();

        match cli.command {
            Command::Queries {
                statistic,
                lite_paths,
            } => {
                assert_eq!(statistic, StatisticKind::Average);
                assert_eq!(lite_paths, ["UserPath>Login", "lg1/CPU"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_config_flag_leaves_env_lookup_to_loader() {
        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        assert_eq!(config.get_env(), None);

        let cli = Cli::try_parse_from(["loadtrend", "queries", "A>B"]).unwrap();
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_queries_needs_a_path() {
        assert!(Cli::try_parse_from(["loadtrend", "queries"]).is_err());
    }
}
